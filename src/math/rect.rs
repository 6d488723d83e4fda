use glam::Vec2;

/// Axis aligned rectangle, `position` being the bottom left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
	pub position: Vec2,
	pub size: Vec2,
}

impl Rect {
	pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
		Self {
			position: Vec2::new(x, y),
			size: Vec2::new(width, height),
		}
	}

	pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
		Self {
			position: min,
			size: max - min,
		}
	}

	/// Smallest rect containing every point. Empty input gives the default rect.
	pub fn from_points(points: &[Vec2]) -> Self {
		let Some((first, rest)) = points.split_first() else {
			return Self::default();
		};
		let (min, max) = rest
			.iter()
			.fold((*first, *first), |(min, max), p| (min.min(*p), max.max(*p)));
		Self::from_min_max(min, max)
	}

	pub fn min(&self) -> Vec2 {
		self.position
	}

	pub fn max(&self) -> Vec2 {
		self.position + self.size
	}

	pub fn center(&self) -> Vec2 {
		self.position + self.size * 0.5
	}

	pub fn contains(&self, point: Vec2) -> bool {
		let (min, max) = (self.min(), self.max());
		point.x >= min.x && point.y >= min.y && point.x <= max.x && point.y <= max.y
	}
}

/// World space oriented box of a renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrientedBounds {
	pub bottom_left: Vec2,
	pub top_left: Vec2,
	pub top_right: Vec2,
	pub bottom_right: Vec2,
}

impl OrientedBounds {
	/// Corners in bottom left, top left, top right, bottom right order.
	pub fn corners(&self) -> [Vec2; 4] {
		[self.bottom_left, self.top_left, self.top_right, self.bottom_right]
	}

	pub fn aabb(&self) -> Rect {
		Rect::from_points(&self.corners())
	}
}

impl From<[Vec2; 4]> for OrientedBounds {
	fn from([bottom_left, top_left, top_right, bottom_right]: [Vec2; 4]) -> Self {
		Self {
			bottom_left,
			top_left,
			top_right,
			bottom_right,
		}
	}
}
