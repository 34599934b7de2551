use glam::{Quat, Vec3};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform {
	pub translation: Vec3,
	pub rotation: Quat,
	pub scale: Vec3,
}

impl Transform {
	pub const IDENTITY: Self = Self {
		translation: Vec3::ZERO,
		rotation: Quat::IDENTITY,
		scale: Vec3::ONE,
	};

	pub fn from_decomposed((translation, rotation, scale): ([f32; 3], [f32; 4], [f32; 3])) -> Self {
		Self {
			translation: Vec3::from(translation),
			rotation: Quat::from_array(rotation),
			scale: Vec3::from(scale),
		}
	}
}

impl Default for Transform {
	fn default() -> Self {
		Self::IDENTITY
	}
}
