use crate::arena::{Id, Named};
use crate::material::Material;
use glam::{Vec2, Vec3, Vec4};

#[derive(Clone, Debug, Default)]
pub struct MeshPrimitive {
	pub positions: Vec<Vec3>,
	pub normals: Vec<Vec3>,
	pub tex_coords: Vec<Vec2>,
	/// bone indices into the deforming armature
	pub joints: Vec<[u16; 4]>,
	pub weights: Vec<Vec4>,
	pub indices: Vec<u32>,
	pub material: Option<Id<Material>>,
}

impl MeshPrimitive {
	pub fn is_skinned(&self) -> bool {
		!self.joints.is_empty() && self.joints.len() == self.weights.len()
	}
}

#[derive(Clone, Debug, Default)]
pub struct Mesh {
	pub name: String,
	pub primitives: Vec<MeshPrimitive>,
}

impl Named for Mesh {
	fn name(&self) -> &str {
		&self.name
	}
}

impl Mesh {
	pub fn materials(&self) -> impl Iterator<Item = Id<Material>> + '_ {
		self.primitives.iter().filter_map(|p| p.material)
	}
}
