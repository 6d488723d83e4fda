/*!
Placeholder properties for capabilities a backend has not provided yet.

Every default method of [`NodeWrapper`](crate::wrapper::NodeWrapper) goes through one of these,
so an unimplemented capability shows up as a logged [`AdapterError::NotImplemented`]
instead of silently doing nothing.
*/

use glam::Vec2;
use tracing::error;

use crate::error::{AdapterError, AdapterResult};
use crate::node::NativeNode;

/// Editor facing attributes of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyAttrs {
	pub visible: bool,
	pub tooltip: Option<&'static str>,
	pub doc: Option<&'static str>,
}

impl PropertyAttrs {
	pub const DEFAULT: Self = Self {
		visible: true,
		tooltip: None,
		doc: None,
	};
}

impl Default for PropertyAttrs {
	fn default() -> Self {
		Self::DEFAULT
	}
}

/// What an inspector needs to know to display a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyInfo {
	pub name: &'static str,
	pub attrs: PropertyAttrs,
	/// No setter is exposed.
	pub read_only: bool,
}

impl PropertyInfo {
	pub const fn new(name: &'static str) -> Self {
		Self {
			name,
			attrs: PropertyAttrs::DEFAULT,
			read_only: false,
		}
	}

	pub const fn invisible(self) -> Self {
		Self {
			attrs: PropertyAttrs {
				visible: false,
				..self.attrs
			},
			..self
		}
	}

	pub const fn tooltip(self, tooltip: &'static str) -> Self {
		Self {
			attrs: PropertyAttrs {
				tooltip: Some(tooltip),
				..self.attrs
			},
			..self
		}
	}

	pub const fn read_only(self) -> Self {
		Self {
			read_only: true,
			..self
		}
	}
}

/// A property whose getter and setter are not implemented.
pub struct Accessor<T: 'static> {
	pub info: PropertyInfo,
	default: T,
}

impl<T: 'static> Accessor<T> {
	pub const fn new(info: PropertyInfo, default: T) -> Self {
		Self { info, default }
	}

	/// Merges extra descriptor attributes in.
	///
	/// `visible` always takes the new value. A tooltip or doc left as `None` keeps the current one.
	pub fn with_attrs(mut self, attrs: PropertyAttrs) -> Self {
		let current = self.info.attrs;
		self.info.attrs = PropertyAttrs {
			visible: attrs.visible,
			tooltip: attrs.tooltip.or(current.tooltip),
			doc: attrs.doc.or(current.doc),
		};
		self
	}

	pub fn name(&self) -> &'static str {
		self.info.name
	}

	/// Logs the missing capability and hands back the error to return.
	pub fn report(&self) -> AdapterError {
		not_implemented(self.info.name)
	}

	pub fn get(&self) -> AdapterResult<T> {
		Err(self.report())
	}

	pub fn set(&self, _value: T) -> AdapterResult<()> {
		if self.info.read_only {
			error!("{} is read only", self.info.name);
			return Err(AdapterError::Disallowed("property is read only"));
		}
		Err(self.report())
	}

	/// The value a caller should fall back to when the getter fails.
	pub fn default_value(&self) -> T
	where
		T: Clone,
	{
		self.default.clone()
	}
}

/// Logs that `capability` is missing from the backend and returns the matching error.
pub fn not_implemented(capability: &'static str) -> AdapterError {
	error!("{capability} is not yet implemented");
	AdapterError::NotImplemented(capability)
}

pub const NAME: Accessor<&'static str> = Accessor::new(PropertyInfo::new("name"), "");
pub const PARENT_NODE: Accessor<Option<NativeNode>> =
	Accessor::new(PropertyInfo::new("parent_node").invisible(), None);
pub const CHILD_NODES: Accessor<Vec<NativeNode>> =
	Accessor::new(PropertyInfo::new("child_nodes").invisible().read_only(), Vec::new());
pub const POSITION: Accessor<Vec2> = Accessor::new(PropertyInfo::new("position"), Vec2::ZERO);
pub const X: Accessor<f32> = Accessor::new(PropertyInfo::new("x").invisible(), 0.);
pub const Y: Accessor<f32> = Accessor::new(PropertyInfo::new("y").invisible(), 0.);
pub const WORLD_POSITION: Accessor<Vec2> = Accessor::new(PropertyInfo::new("world_position").invisible(), Vec2::ZERO);
pub const WORLD_X: Accessor<f32> = Accessor::new(PropertyInfo::new("world_x").invisible(), 0.);
pub const WORLD_Y: Accessor<f32> = Accessor::new(PropertyInfo::new("world_y").invisible(), 0.);
pub const ROTATION: Accessor<f32> = Accessor::new(
	PropertyInfo::new("rotation").tooltip("The counterclockwise degrees of rotation relative to the parent"),
	0.,
);
pub const WORLD_ROTATION: Accessor<f32> = Accessor::new(PropertyInfo::new("world_rotation").invisible(), 0.);
pub const SCALE: Accessor<Vec2> = Accessor::new(PropertyInfo::new("scale"), Vec2::ONE);
pub const SCALE_X: Accessor<f32> = Accessor::new(PropertyInfo::new("scale_x").invisible(), 1.);
pub const SCALE_Y: Accessor<f32> = Accessor::new(PropertyInfo::new("scale_y").invisible(), 1.);
pub const WORLD_SCALE: Accessor<Vec2> =
	Accessor::new(PropertyInfo::new("world_scale").invisible().read_only(), Vec2::ONE);

/// Property table every wrapper exposes unless it overrides it.
pub fn node_properties() -> Vec<PropertyInfo> {
	vec![
		NAME.info,
		PARENT_NODE.info,
		CHILD_NODES.info,
		POSITION.info,
		X.info,
		Y.info,
		WORLD_POSITION.info,
		WORLD_X.info,
		WORLD_Y.info,
		ROTATION.info,
		WORLD_ROTATION.info,
		SCALE.info,
		SCALE_X.info,
		SCALE_Y.info,
		WORLD_SCALE.info,
	]
}
