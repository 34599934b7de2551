use crate::animation::AnimationData;
use crate::arena::{Id, Named};
use crate::armature::Armature;
use crate::mesh::Mesh;
use crate::transform::Transform;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ObjectData {
	Armature(Id<Armature>),
	Mesh(Id<Mesh>),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ObjectKind {
	Armature,
	Mesh,
}

#[derive(Clone, Debug)]
pub struct Object {
	pub name: String,
	pub data: ObjectData,
	pub parent: Option<Id<Object>>,
	/// armature object deforming this mesh
	pub armature: Option<Id<Object>>,
	pub transform: Transform,
	pub animation_data: Option<AnimationData>,
}

impl Named for Object {
	fn name(&self) -> &str {
		&self.name
	}
}

impl Object {
	pub fn new(name: impl Into<String>, data: ObjectData) -> Self {
		Self {
			name: name.into(),
			data,
			parent: None,
			armature: None,
			transform: Transform::IDENTITY,
			animation_data: None,
		}
	}

	pub fn kind(&self) -> ObjectKind {
		match self.data {
			ObjectData::Armature(_) => ObjectKind::Armature,
			ObjectData::Mesh(_) => ObjectKind::Mesh,
		}
	}

	pub fn armature_data(&self) -> Option<Id<Armature>> {
		match self.data {
			ObjectData::Armature(id) => Some(id),
			_ => None,
		}
	}

	pub fn mesh_data(&self) -> Option<Id<Mesh>> {
		match self.data {
			ObjectData::Mesh(id) => Some(id),
			_ => None,
		}
	}

	pub fn animation_data_create(&mut self) -> &mut AnimationData {
		self.animation_data.get_or_insert_with(AnimationData::default)
	}
}
