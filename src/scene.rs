/*!
Wrapper for the root node of the current stage.

The root has fixed hierarchy semantics (no parent, always sibling 0) that no backend can
change, so they live in [`SceneWrapper`] itself. A backend supplies the rest through
[`SceneBackend`], where it should override:
- `child_nodes`
- `create_node`
- `position`, `scale` (used to simulate panning and zooming the editor camera)

and may want to override `preload_assets`, so the scene can then load synchronously.
*/

use std::fmt;

use glam::Vec2;
use tracing::{debug, error};
use uuid::Uuid;

use crate::accessor::{self, not_implemented};
use crate::error::{AdapterError, AdapterResult, PreloadError};
use crate::math::rect::{OrientedBounds, Rect};
use crate::node::NativeNode;
use crate::registry::WrapperRegistry;
use crate::wrapper::{Children, NodeWrapper, WrapperType};

/// Serialized scene payload, waiting to be turned back into a root node.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneData(pub json::JsonValue);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetId(pub Uuid);

impl AssetId {
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for AssetId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for AssetId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// Called exactly once when preloading finishes, possibly on a later turn of the main loop.
pub type PreloadCallback = Box<dyn FnOnce(Result<(), PreloadError>)>;

/// What a backend provides for its root node type.
///
/// Every method receives the root node the wrapper is currently bound to.
pub trait SceneBackend: 'static {
	const CLASS_NAME: &'static str;

	fn name(&self, _target: &NativeNode) -> AdapterResult<String> {
		Ok(accessor::NAME.default_value().to_owned())
	}

	fn child_nodes<'a>(&'a self, _target: &'a NativeNode) -> AdapterResult<Children<'a>> {
		Err(accessor::CHILD_NODES.report())
	}

	fn position(&self, _target: &NativeNode) -> AdapterResult<Vec2> {
		accessor::POSITION.get()
	}

	fn set_position(&mut self, _target: &NativeNode, position: Vec2) -> AdapterResult<()> {
		accessor::POSITION.set(position)
	}

	fn rotation(&self, _target: &NativeNode) -> AdapterResult<f32> {
		accessor::ROTATION.get()
	}

	fn set_rotation(&mut self, _target: &NativeNode, rotation: f32) -> AdapterResult<()> {
		accessor::ROTATION.set(rotation)
	}

	fn scale(&self, _target: &NativeNode) -> AdapterResult<Vec2> {
		accessor::SCALE.get()
	}

	fn set_scale(&mut self, _target: &NativeNode, scale: Vec2) -> AdapterResult<()> {
		accessor::SCALE.set(scale)
	}

	fn world_bounds(&self, _target: &NativeNode) -> AdapterResult<Rect> {
		Err(not_implemented("world_bounds"))
	}

	fn world_oriented_bounds(&self, _target: &NativeNode) -> AdapterResult<OrientedBounds> {
		Err(not_implemented("world_oriented_bounds"))
	}

	/// Builds a new root node, from the staged scene data if there is any.
	fn create_node(&mut self, _data: Option<&SceneData>) -> AdapterResult<NativeNode> {
		Err(not_implemented("create_node"))
	}

	fn on_before_serialize(&mut self, _target: &NativeNode) {}

	/// Loads `assets` ahead of the scene. The default has nothing to do and reports success right away.
	fn preload_assets(&mut self, _assets: &[AssetId], callback: PreloadCallback) {
		callback(Ok(()));
	}
}

/// Scene only operations, reachable from any bound wrapper through `as_scene_mut`.
pub trait SceneOps {
	fn preload_assets(&mut self, assets: &[AssetId], callback: PreloadCallback);

	/// Keeps serialized data around until the next `create_node`.
	fn stage_scene_data(&mut self, data: SceneData);

	fn scene_data(&self) -> Option<&SceneData>;
}

/// Root node wrapper.
pub struct SceneWrapper<B: SceneBackend> {
	target: NativeNode,
	data_to_deserialize: Option<SceneData>,
	pub backend: B,
}

impl<B: SceneBackend> SceneWrapper<B> {
	pub fn with_backend(target: NativeNode, backend: B) -> Self {
		Self {
			target,
			data_to_deserialize: None,
			backend,
		}
	}
}

impl<B: SceneBackend + Default> WrapperType for SceneWrapper<B> {
	const CLASS_NAME: &'static str = B::CLASS_NAME;
	const IS_SCENE: bool = true;

	fn new(target: NativeNode) -> Self {
		Self::with_backend(target, B::default())
	}
}

impl<B: SceneBackend> SceneOps for SceneWrapper<B> {
	fn preload_assets(&mut self, assets: &[AssetId], callback: PreloadCallback) {
		debug!("Preloading {} assets for {}", assets.len(), B::CLASS_NAME);
		self.backend.preload_assets(assets, callback);
	}

	fn stage_scene_data(&mut self, data: SceneData) {
		self.data_to_deserialize = Some(data);
	}

	fn scene_data(&self) -> Option<&SceneData> {
		self.data_to_deserialize.as_ref()
	}
}

impl<B: SceneBackend> NodeWrapper for SceneWrapper<B> {
	fn target(&self) -> &NativeNode {
		&self.target
	}

	fn set_target(&mut self, target: NativeNode) {
		self.target = target;
	}

	fn is_scene(&self) -> bool {
		true
	}

	fn as_scene_mut(&mut self) -> Option<&mut dyn SceneOps> {
		Some(self)
	}

	fn name(&self) -> AdapterResult<String> {
		self.backend.name(&self.target)
	}

	fn parent_node(&self) -> AdapterResult<Option<NativeNode>> {
		Ok(None)
	}

	fn set_parent_node(&mut self, _parent: Option<NativeNode>) -> AdapterResult<()> {
		error!("Disallow to set scene's parent.");
		Err(AdapterError::Disallowed("cannot set the scene's parent"))
	}

	fn child_nodes(&self) -> AdapterResult<Children<'_>> {
		self.backend.child_nodes(&self.target)
	}

	fn position(&self) -> AdapterResult<Vec2> {
		self.backend.position(&self.target)
	}

	fn set_position(&mut self, position: Vec2) -> AdapterResult<()> {
		self.backend.set_position(&self.target, position)
	}

	fn rotation(&self) -> AdapterResult<f32> {
		self.backend.rotation(&self.target)
	}

	fn set_rotation(&mut self, rotation: f32) -> AdapterResult<()> {
		self.backend.set_rotation(&self.target, rotation)
	}

	fn scale(&self) -> AdapterResult<Vec2> {
		self.backend.scale(&self.target)
	}

	fn set_scale(&mut self, scale: Vec2) -> AdapterResult<()> {
		self.backend.set_scale(&self.target, scale)
	}

	// the root has no ancestors, world space is its local space

	fn world_position(&self) -> AdapterResult<Vec2> {
		self.position()
	}

	fn set_world_position(&mut self, position: Vec2) -> AdapterResult<()> {
		self.set_position(position)
	}

	fn world_rotation(&self) -> AdapterResult<f32> {
		self.rotation()
	}

	fn set_world_rotation(&mut self, rotation: f32) -> AdapterResult<()> {
		self.set_rotation(rotation)
	}

	fn world_scale(&self) -> AdapterResult<Vec2> {
		self.scale()
	}

	fn world_bounds(&self) -> AdapterResult<Rect> {
		self.backend.world_bounds(&self.target)
	}

	fn world_oriented_bounds(&self) -> AdapterResult<OrientedBounds> {
		self.backend.world_oriented_bounds(&self.target)
	}

	fn sibling_index(&self, _registry: &WrapperRegistry) -> i32 {
		0
	}

	fn set_sibling_index(&mut self, _registry: &WrapperRegistry, index: i32) -> AdapterResult<()> {
		if index != 0 {
			error!("Disallow to change scene's sibling index.");
			return Err(AdapterError::Disallowed("cannot change the scene's sibling index"));
		}
		Ok(())
	}

	fn create_node(&mut self) -> AdapterResult<NativeNode> {
		let node = self.backend.create_node(self.data_to_deserialize.as_ref())?;
		self.data_to_deserialize = None;
		Ok(node)
	}

	fn on_before_serialize(&mut self) {
		self.backend.on_before_serialize(&self.target);
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use glam::vec2;

	use super::*;
	use crate::testing::{self, TestStage, TestStageBackend};
	use crate::wrapper::downcast_wrapper_mut;

	#[test]
	fn root_hierarchy_is_fixed() {
		let (registry, scene) = testing::registry_with_scene();
		let child = testing::spawn("child");
		testing::attach(&scene, &child);

		let wrapper = registry.get_wrapper(&scene).unwrap();
		let mut wrapper = wrapper.borrow_mut();
		assert!(wrapper.is_scene());
		assert_eq!(wrapper.parent_node(), Ok(None));
		assert!(matches!(
			wrapper.set_parent_node(Some(child.clone())),
			Err(AdapterError::Disallowed(_))
		));
		assert_eq!(wrapper.parent_node(), Ok(None));

		assert_eq!(wrapper.sibling_index(&registry), 0);
		assert_eq!(wrapper.set_sibling_index(&registry, 0), Ok(()));
		assert!(matches!(
			wrapper.set_sibling_index(&registry, 2),
			Err(AdapterError::Disallowed(_))
		));
		assert_eq!(wrapper.sibling_index(&registry), 0);
	}

	#[test]
	fn nested_root_still_reports_index_zero() {
		// a stage parked under some other node is still a root as far as its wrapper is concerned
		let (registry, scene) = testing::registry_with_scene();
		let holder = testing::spawn("holder");
		testing::attach(&scene, &holder);
		let inner = testing::stage();
		testing::attach(&holder, &inner);

		let wrapper = registry.get_wrapper(&inner).unwrap();
		assert_eq!(wrapper.borrow().sibling_index(&registry), 0);
		assert_eq!(wrapper.borrow().parent_node(), Ok(None));
	}

	#[test]
	fn world_transform_is_local_transform() {
		let (registry, scene) = testing::registry_with_scene();
		let wrapper = registry.get_wrapper(&scene).unwrap();
		let mut wrapper = wrapper.borrow_mut();

		wrapper.set_world_position(vec2(12., -3.)).unwrap();
		wrapper.set_scale(vec2(2., 2.)).unwrap();

		assert_eq!(wrapper.position(), Ok(vec2(12., -3.)));
		assert_eq!(wrapper.world_scale(), Ok(vec2(2., 2.)));
		assert_eq!(wrapper.rotation(), Err(AdapterError::NotImplemented("rotation")));
	}

	/// Backend keeping every default.
	struct Plain;

	impl SceneBackend for Plain {
		const CLASS_NAME: &'static str = "PlainScene";
	}

	fn counting_callback(calls: &Rc<RefCell<Vec<Result<(), PreloadError>>>>) -> PreloadCallback {
		let calls = Rc::clone(calls);
		Box::new(move |result: Result<(), PreloadError>| calls.borrow_mut().push(result))
	}

	#[test]
	fn default_preload_calls_back_once() {
		let mut wrapper = SceneWrapper::with_backend(testing::stage(), Plain);
		let calls = Rc::new(RefCell::new(Vec::new()));

		wrapper.preload_assets(&[AssetId::new(), AssetId::new()], counting_callback(&calls));

		assert_eq!(*calls.borrow(), vec![Ok(())]);
	}

	#[test]
	fn backend_preload_may_fail_later() {
		let (registry, scene) = testing::registry_with_scene();
		let wrapper = registry.get_wrapper(&scene).unwrap();
		let calls = Rc::new(RefCell::new(Vec::new()));
		let missing = AssetId(Uuid::nil());

		wrapper
			.borrow_mut()
			.as_scene_mut()
			.unwrap()
			.preload_assets(&[AssetId::new(), missing], counting_callback(&calls));
		assert!(calls.borrow().is_empty());

		let mut stage = downcast_wrapper_mut::<SceneWrapper<TestStageBackend>>(&wrapper).unwrap();
		assert!(stage.backend.has_pending_preload());
		stage.backend.finish_preload();
		stage.backend.finish_preload();

		assert_eq!(
			*calls.borrow(),
			vec![Err(PreloadError::new(missing.to_string(), "no such asset"))]
		);
		assert!(!stage.backend.has_pending_preload());
	}

	#[test]
	fn deserialized_scene_is_rebound() {
		let (registry, scene) = testing::registry_with_scene();
		registry.set_current_scene(&scene).unwrap();
		let wrapper = registry.get_wrapper(&scene).unwrap();
		let data = SceneData(json::parse(r#"{ "name": "loaded", "children": ["x"] }"#).unwrap());
		wrapper.borrow_mut().as_scene_mut().unwrap().stage_scene_data(data);

		let root = registry.after_deserialize(&wrapper).unwrap();

		assert_ne!(root, scene);
		assert_eq!(wrapper.borrow().target(), &root);
		assert!(wrapper.borrow_mut().as_scene_mut().unwrap().scene_data().is_none());
		assert!(Rc::ptr_eq(&registry.get_wrapper(&root).unwrap(), &wrapper));
		assert!(registry.bound_wrapper(&scene).is_none());
		assert_eq!(registry.current_scene_node(), Some(root.clone()));

		let stage = root.downcast_ref::<TestStage>().unwrap();
		assert_eq!(stage.name(), "loaded");
		assert_eq!(wrapper.borrow().name(), Ok("loaded".to_owned()));
		assert_eq!(wrapper.borrow().child_nodes().unwrap().len(), 1);
	}

	#[test]
	fn staged_data_is_consumed_by_create_node() {
		let (registry, scene) = testing::registry_with_scene();
		let wrapper = registry.get_wrapper(&scene).unwrap();
		let mut wrapper = wrapper.borrow_mut();

		let data = SceneData(json::parse(r#"{ "name": "level 2", "children": ["a", "b"] }"#).unwrap());
		wrapper.as_scene_mut().unwrap().stage_scene_data(data.clone());
		assert_eq!(wrapper.as_scene_mut().unwrap().scene_data(), Some(&data));

		let node = wrapper.create_node().unwrap();
		let stage = node.downcast_ref::<TestStage>().unwrap();
		assert_eq!(stage.name(), "level 2");
		assert_eq!(stage.children().len(), 2);
		assert_eq!(wrapper.as_scene_mut().unwrap().scene_data(), None);
		// create_node doesn't retarget
		assert_eq!(wrapper.target(), &scene);
	}

	#[test]
	fn ordinary_wrappers_have_no_scene_ops() {
		let (registry, _scene) = testing::registry_with_scene();
		let node = testing::spawn("node");
		let wrapper = registry.get_wrapper(&node).unwrap();
		assert!(wrapper.borrow_mut().as_scene_mut().is_none());
		assert!(!wrapper.borrow().is_scene());
	}
}
