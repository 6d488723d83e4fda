use glam::{Affine2, Vec2};

/// Local 2D transform of a node, relative to its parent.
///
/// Backends that keep plain position/rotation/scale on their nodes can use this to
/// derive the world values the wrappers must report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalTransform {
	pub position: Vec2,
	/// Counterclockwise, in degrees
	pub rotation: f32,
	pub scale: Vec2,
}

impl Default for LocalTransform {
	fn default() -> Self {
		Self {
			position: Vec2::ZERO,
			rotation: 0.,
			scale: Vec2::ONE,
		}
	}
}

impl LocalTransform {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_position(mut self, position: Vec2) -> Self {
		self.position = position;
		self
	}

	pub fn with_rotation(mut self, rotation: f32) -> Self {
		self.rotation = rotation;
		self
	}

	pub fn with_scale(mut self, scale: Vec2) -> Self {
		self.scale = scale;
		self
	}

	pub fn to_affine(&self) -> Affine2 {
		Affine2::from_scale_angle_translation(self.scale, self.rotation.to_radians(), self.position)
	}
}

/// Accumulated transform of a node's ancestor chain, root first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTransform {
	pub matrix: Affine2,
	pub rotation: f32,
	pub scale: Vec2,
}

impl Default for WorldTransform {
	fn default() -> Self {
		Self {
			matrix: Affine2::IDENTITY,
			rotation: 0.,
			scale: Vec2::ONE,
		}
	}
}

impl WorldTransform {
	/// Applies a child's local transform on top of this one.
	pub fn then(&self, local: &LocalTransform) -> Self {
		Self {
			matrix: self.matrix * local.to_affine(),
			rotation: self.rotation + local.rotation,
			scale: self.scale * local.scale,
		}
	}

	pub fn position(&self) -> Vec2 {
		self.matrix.translation
	}

	/// Local position a child of this transform needs to end up at `world` position.
	pub fn to_local(&self, world: Vec2) -> Vec2 {
		self.matrix.inverse().transform_point2(world)
	}
}
