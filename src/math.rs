pub mod rect;
pub mod transform;

use glam::Vec2;

/// Rotates `position` about `pivot` by `degrees`, counterclockwise.
///
/// The distance between `position` and `pivot` is kept, only the direction changes.
pub fn rotate_about(position: Vec2, pivot: Vec2, degrees: f32) -> Vec2 {
	let delta = position - pivot;
	pivot + Vec2::from_angle(degrees.to_radians()).rotate(delta)
}
