/*!
The uniform surface editor tools use to drive a node, whatever backend owns it.

A backend implements [`NodeWrapper`] for each of its node types, overriding the capabilities
it supports. Everything it leaves alone falls back to the stubs in [`crate::accessor`].
Note: methods dealing in [`NativeNode`] hand out or take the backend's own node handles.

Backends should override:
- `parent_node`, `set_parent_node`, `child_nodes`
- `position`, `rotation`, `scale` and their world counterparts
- `world_bounds`, `world_oriented_bounds`
- `create_node`, `on_before_serialize`

and may override `name`, the derived scalar accessors and the sibling index methods.
*/

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use glam::Vec2;
use tracing::{error, warn};

use crate::accessor::{self, not_implemented, PropertyInfo};
use crate::error::{AdapterError, AdapterResult};
use crate::math::{self, rect::OrientedBounds, rect::Rect};
use crate::node::NativeNode;
use crate::registry::WrapperRegistry;
use crate::scene::SceneOps;

/// Children of a node, borrowed straight from the backend's storage.
pub type Children<'a> = RefMut<'a, Vec<NativeNode>>;

/// Shared handle to a bound wrapper.
pub type WrapperRef = Rc<RefCell<dyn NodeWrapper>>;

pub trait AsAny: Any {
	fn as_any(&self) -> &dyn Any;
	fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
	fn as_any(&self) -> &dyn Any {
		self
	}

	fn as_any_mut(&mut self) -> &mut dyn Any {
		self
	}
}

/// Borrows a bound wrapper as its concrete type.
pub fn downcast_wrapper<W: NodeWrapper>(wrapper: &WrapperRef) -> Option<Ref<'_, W>> {
	Ref::filter_map(wrapper.borrow(), |wrapper| AsAny::as_any(wrapper).downcast_ref::<W>()).ok()
}

pub fn downcast_wrapper_mut<W: NodeWrapper>(wrapper: &WrapperRef) -> Option<RefMut<'_, W>> {
	RefMut::filter_map(wrapper.borrow_mut(), |wrapper| AsAny::as_any_mut(wrapper).downcast_mut::<W>()).ok()
}

/// Declares a wrapper type so it can be registered for a native node kind.
pub trait WrapperType: NodeWrapper + Sized {
	/// Must not be empty, registration is refused otherwise.
	const CLASS_NAME: &'static str;
	const IS_SCENE: bool = false;

	fn new(target: NativeNode) -> Self;
}

fn check_nan(value: f32, field: &'static str) -> AdapterResult<f32> {
	if value.is_nan() {
		error!("The {field} must not be NaN");
		return Err(AdapterError::NaN(field));
	}
	Ok(value)
}

pub trait NodeWrapper: AsAny {
	/// The node this wrapper is bound to.
	fn target(&self) -> &NativeNode;

	fn set_target(&mut self, target: NativeNode);

	fn is_scene(&self) -> bool {
		false
	}

	/// Scene only operations, `None` for ordinary nodes.
	fn as_scene_mut(&mut self) -> Option<&mut dyn SceneOps> {
		None
	}

	fn properties(&self) -> Vec<PropertyInfo> {
		accessor::node_properties()
	}

	// IDENTITY

	fn name(&self) -> AdapterResult<String> {
		Ok(accessor::NAME.default_value().to_owned())
	}

	fn set_name(&mut self, _name: &str) -> AdapterResult<()> {
		Ok(())
	}

	// HIERARCHY

	/// The parent of the node.
	///
	/// For a top most node this is the scene root, whose wrapper must be a scene wrapper.
	/// Changing the parent keeps the local position, rotation and scale,
	/// so the world ones change.
	fn parent_node(&self) -> AdapterResult<Option<NativeNode>> {
		accessor::PARENT_NODE.get()
	}

	fn set_parent_node(&mut self, parent: Option<NativeNode>) -> AdapterResult<()> {
		accessor::PARENT_NODE.set(parent)
	}

	/// The children, empty if there are none.
	/// This sequence may ONLY be modified by `set_sibling_index`.
	fn child_nodes(&self) -> AdapterResult<Children<'_>> {
		Err(accessor::CHILD_NODES.report())
	}

	// TRANSFORM

	/// Local position in the parent's coordinate system.
	fn position(&self) -> AdapterResult<Vec2> {
		accessor::POSITION.get()
	}

	fn set_position(&mut self, position: Vec2) -> AdapterResult<()> {
		accessor::POSITION.set(position)
	}

	/// Counterclockwise degrees relative to the parent.
	fn rotation(&self) -> AdapterResult<f32> {
		accessor::ROTATION.get()
	}

	fn set_rotation(&mut self, rotation: f32) -> AdapterResult<()> {
		accessor::ROTATION.set(rotation)
	}

	/// Local scale factor relative to the parent.
	fn scale(&self) -> AdapterResult<Vec2> {
		accessor::SCALE.get()
	}

	fn set_scale(&mut self, scale: Vec2) -> AdapterResult<()> {
		accessor::SCALE.set(scale)
	}

	fn world_position(&self) -> AdapterResult<Vec2> {
		accessor::WORLD_POSITION.get()
	}

	fn set_world_position(&mut self, position: Vec2) -> AdapterResult<()> {
		accessor::WORLD_POSITION.set(position)
	}

	fn world_rotation(&self) -> AdapterResult<f32> {
		accessor::WORLD_ROTATION.get()
	}

	fn set_world_rotation(&mut self, rotation: f32) -> AdapterResult<()> {
		accessor::WORLD_ROTATION.set(rotation)
	}

	/// Lossy scale in world space.
	fn world_scale(&self) -> AdapterResult<Vec2> {
		accessor::WORLD_SCALE.get()
	}

	fn x(&self) -> AdapterResult<f32> {
		Ok(self.position()?.x)
	}

	fn set_x(&mut self, x: f32) -> AdapterResult<()> {
		let x = check_nan(x, "new x")?;
		let mut position = self.position()?;
		position.x = x;
		self.set_position(position)
	}

	fn y(&self) -> AdapterResult<f32> {
		Ok(self.position()?.y)
	}

	fn set_y(&mut self, y: f32) -> AdapterResult<()> {
		let y = check_nan(y, "new y")?;
		let mut position = self.position()?;
		position.y = y;
		self.set_position(position)
	}

	fn world_x(&self) -> AdapterResult<f32> {
		Ok(self.world_position()?.x)
	}

	fn set_world_x(&mut self, x: f32) -> AdapterResult<()> {
		let x = check_nan(x, "new world_x")?;
		let mut position = self.world_position()?;
		position.x = x;
		self.set_world_position(position)
	}

	fn world_y(&self) -> AdapterResult<f32> {
		Ok(self.world_position()?.y)
	}

	fn set_world_y(&mut self, y: f32) -> AdapterResult<()> {
		let y = check_nan(y, "new world_y")?;
		let mut position = self.world_position()?;
		position.y = y;
		self.set_world_position(position)
	}

	fn scale_x(&self) -> AdapterResult<f32> {
		Ok(self.scale()?.x)
	}

	fn set_scale_x(&mut self, x: f32) -> AdapterResult<()> {
		let x = check_nan(x, "new scale_x")?;
		let mut scale = self.scale()?;
		scale.x = x;
		self.set_scale(scale)
	}

	fn scale_y(&self) -> AdapterResult<f32> {
		Ok(self.scale()?.y)
	}

	fn set_scale_y(&mut self, y: f32) -> AdapterResult<()> {
		let y = check_nan(y, "new scale_y")?;
		let mut scale = self.scale()?;
		scale.y = y;
		self.set_scale(scale)
	}

	/// Rotates the node about `point` in world space by `angle` degrees.
	fn rotate_around(&mut self, point: Vec2, angle: f32) -> AdapterResult<()> {
		let angle = check_nan(angle, "angle")?;
		let position = math::rotate_about(self.world_position()?, point, angle);
		self.set_world_position(position)?;
		let rotation = self.rotation()?;
		self.set_rotation(rotation + angle)
	}

	// RENDERER

	/// World axis aligned bounding box of the renderer.
	fn world_bounds(&self) -> AdapterResult<Rect> {
		Err(not_implemented("world_bounds"))
	}

	/// World oriented bounding box of the renderer.
	fn world_oriented_bounds(&self) -> AdapterResult<OrientedBounds> {
		Err(not_implemented("world_oriented_bounds"))
	}

	/// Like `world_bounds`, reusing `out`. Left untouched on error.
	fn world_bounds_into(&self, out: &mut Rect) -> AdapterResult<()> {
		*out = self.world_bounds()?;
		Ok(())
	}

	/// Writes bottom left, top left, top right, bottom right into `out`. Left untouched on error.
	fn world_oriented_bounds_into(&self, out: &mut [Vec2; 4]) -> AdapterResult<()> {
		*out = self.world_oriented_bounds()?.corners();
		Ok(())
	}

	// ORDER

	/// Zero based index among the parent's children.
	///
	/// -1 when the node has no parent, or its parent doesn't list it.
	fn sibling_index(&self, registry: &WrapperRegistry) -> i32 {
		let parent = match self.parent_node() {
			Ok(Some(parent)) => parent,
			Ok(None) | Err(_) => return -1,
		};
		let Ok(parent) = registry.get_wrapper(&parent) else {
			return -1;
		};
		let Ok(parent) = parent.try_borrow() else {
			warn!("Parent wrapper of {:?} is busy", self.target());
			return -1;
		};
		let Ok(siblings) = parent.child_nodes() else {
			return -1;
		};
		siblings
			.iter()
			.position(|sibling| sibling == self.target())
			.map_or(-1, |index| index as i32)
	}

	/// Moves the node to `index` among its siblings, -1 moving it last.
	///
	/// Lower indices render first. Indices past the end also move it last,
	/// other negative indices are refused.
	fn set_sibling_index(&mut self, registry: &WrapperRegistry, index: i32) -> AdapterResult<()> {
		if index < -1 {
			error!("Sibling index {index} is out of range for {:?}", self.target());
			return Err(AdapterError::Disallowed("sibling index below -1"));
		}
		let Some(parent) = self.parent_node()? else {
			error!("Can't reorder {:?}, it has no parent", self.target());
			return Err(AdapterError::Orphan);
		};
		let parent_wrapper = registry.get_wrapper(&parent)?;
		let parent_wrapper = parent_wrapper.try_borrow().map_err(|_| {
			error!("Parent wrapper of {:?} is busy", self.target());
			AdapterError::WrapperBusy
		})?;
		let mut siblings = parent_wrapper.child_nodes()?;

		let item = self.target().clone();
		let Some(old_index) = siblings.iter().position(|sibling| *sibling == item) else {
			error!("{item:?} is not a child of its parent {parent:?}");
			return Err(AdapterError::NotAChild);
		};
		let index = usize::try_from(index).unwrap_or(siblings.len() - 1);

		if index != old_index {
			siblings.remove(old_index);
			if index < siblings.len() {
				siblings.insert(index, item);
			} else {
				siblings.push(item);
			}
		}
		Ok(())
	}

	// SERIALIZATION

	/// Creates a node out of this wrapper's serializable state.
	///
	/// The new node gets no parent or children, and `target` is left alone.
	fn create_node(&mut self) -> AdapterResult<NativeNode> {
		Err(not_implemented("create_node"))
	}

	/// Called before the scene is saved, so native only state can be copied into
	/// the wrapper and restored by `create_node` later.
	fn on_before_serialize(&mut self) {}

	/// Creates a new node and retargets this wrapper to it.
	///
	/// Use [`WrapperRegistry::after_deserialize`] so the node gets bound to this wrapper too.
	fn on_after_deserialize(&mut self) -> AdapterResult<NativeNode> {
		let node = self.create_node()?;
		self.set_target(node.clone());
		Ok(node)
	}
}
