use crate::animation::Action;
use crate::arena::{Arena, Id};
use crate::armature::Armature;
use crate::image::Image;
use crate::material::Material;
use crate::mesh::Mesh;
use crate::object::{Object, ObjectData, ObjectKind};
use crate::texture::Texture;

/// Mixamo exports are keyed at 30 frames per second.
pub const DEFAULT_FPS: f32 = 30.;

/// The data-block categories a scene holds besides its objects.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DataKind {
	Mesh,
	Armature,
	Action,
	Material,
	Texture,
	Image,
}

impl DataKind {
	pub const ALL: [DataKind; 6] = [
		DataKind::Mesh,
		DataKind::Armature,
		DataKind::Action,
		DataKind::Material,
		DataKind::Texture,
		DataKind::Image,
	];
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DataBlock {
	Mesh(Id<Mesh>),
	Armature(Id<Armature>),
	Action(Id<Action>),
	Material(Id<Material>),
	Texture(Id<Texture>),
	Image(Id<Image>),
}

impl DataBlock {
	pub fn kind(&self) -> DataKind {
		match self {
			DataBlock::Mesh(_) => DataKind::Mesh,
			DataBlock::Armature(_) => DataKind::Armature,
			DataBlock::Action(_) => DataKind::Action,
			DataBlock::Material(_) => DataKind::Material,
			DataBlock::Texture(_) => DataKind::Texture,
			DataBlock::Image(_) => DataKind::Image,
		}
	}
}

/// The working context all pipeline stages operate on: every object and data block of one
/// character, owned in one place.
#[derive(Clone, Debug)]
pub struct Scene {
	pub fps: f32,
	pub objects: Arena<Object>,
	pub meshes: Arena<Mesh>,
	pub armatures: Arena<Armature>,
	pub actions: Arena<Action>,
	pub materials: Arena<Material>,
	pub textures: Arena<Texture>,
	pub images: Arena<Image>,
}

impl Default for Scene {
	fn default() -> Self {
		Self::new(DEFAULT_FPS)
	}
}

macro_rules! add_named {
	($fn_name:ident, $field:ident, $ty:ty) => {
		/// Inserts the block, renaming it to `name.001`, `name.002`, ... if the name is taken.
		pub fn $fn_name(&mut self, mut value: $ty) -> Id<$ty> {
			value.name = self.$field.unique_name(&value.name);
			self.$field.insert(value)
		}
	};
}

impl Scene {
	pub fn new(fps: f32) -> Self {
		Self {
			fps,
			objects: Arena::new(),
			meshes: Arena::new(),
			armatures: Arena::new(),
			actions: Arena::new(),
			materials: Arena::new(),
			textures: Arena::new(),
			images: Arena::new(),
		}
	}

	/// Removes every object and every data block, keeping settings like `fps`.
	pub fn reset(&mut self) {
		self.objects.clear();
		self.meshes.clear();
		self.armatures.clear();
		self.actions.clear();
		self.materials.clear();
		self.textures.clear();
		self.images.clear();
	}

	pub fn is_empty(&self) -> bool {
		self.objects.is_empty() && DataKind::ALL.iter().all(|kind| self.data_blocks(*kind).is_empty())
	}

	add_named!(add_object, objects, Object);
	add_named!(add_mesh, meshes, Mesh);
	add_named!(add_armature, armatures, Armature);
	add_named!(add_action, actions, Action);
	add_named!(add_material, materials, Material);
	add_named!(add_texture, textures, Texture);
	add_named!(add_image, images, Image);

	/// Renames an action, keeping names unique. Returns the name actually assigned.
	pub fn rename_action(&mut self, id: Id<Action>, name: &str) -> Option<String> {
		if self.actions.get(id)?.name == name {
			return Some(name.to_string());
		}
		let name = self.actions.unique_name(name);
		self.actions.get_mut(id)?.name = name.clone();
		Some(name)
	}

	pub fn objects_of_kind(&self, kind: ObjectKind) -> impl Iterator<Item = (Id<Object>, &Object)> + '_ {
		self.objects.iter().filter(move |(_, o)| o.kind() == kind)
	}

	/// Unlinks and deletes an object. Its data blocks stay behind and become orphans if nothing
	/// else uses them.
	pub fn remove_object(&mut self, id: Id<Object>) -> Option<Object> {
		let object = self.objects.remove(id)?;
		for (_, other) in self.objects.iter_mut() {
			if other.parent == Some(id) {
				other.parent = None;
			}
			if other.armature == Some(id) {
				other.armature = None;
			}
		}
		Some(object)
	}

	pub fn data_blocks(&self, kind: DataKind) -> Vec<DataBlock> {
		match kind {
			DataKind::Mesh => self.meshes.ids().into_iter().map(DataBlock::Mesh).collect(),
			DataKind::Armature => self.armatures.ids().into_iter().map(DataBlock::Armature).collect(),
			DataKind::Action => self.actions.ids().into_iter().map(DataBlock::Action).collect(),
			DataKind::Material => self.materials.ids().into_iter().map(DataBlock::Material).collect(),
			DataKind::Texture => self.textures.ids().into_iter().map(DataBlock::Texture).collect(),
			DataKind::Image => self.images.ids().into_iter().map(DataBlock::Image).collect(),
		}
	}

	pub fn contains(&self, block: DataBlock) -> bool {
		match block {
			DataBlock::Mesh(id) => self.meshes.contains(id),
			DataBlock::Armature(id) => self.armatures.contains(id),
			DataBlock::Action(id) => self.actions.contains(id),
			DataBlock::Material(id) => self.materials.contains(id),
			DataBlock::Texture(id) => self.textures.contains(id),
			DataBlock::Image(id) => self.images.contains(id),
		}
	}

	/// Number of references to `block` held by objects, animation data, mesh primitives, node trees
	/// and textures. References held by orphaned blocks count as well.
	pub fn users(&self, block: DataBlock) -> usize {
		match block {
			DataBlock::Mesh(id) => self
				.objects
				.iter()
				.filter(|(_, o)| o.data == ObjectData::Mesh(id))
				.count(),
			DataBlock::Armature(id) => self
				.objects
				.iter()
				.filter(|(_, o)| o.data == ObjectData::Armature(id))
				.count(),
			DataBlock::Action(id) => self
				.objects
				.iter()
				.filter_map(|(_, o)| o.animation_data.as_ref())
				.flat_map(|a| a.actions())
				.filter(|a| *a == id)
				.count(),
			DataBlock::Material(id) => self
				.meshes
				.iter()
				.flat_map(|(_, m)| m.materials())
				.filter(|m| *m == id)
				.count(),
			DataBlock::Texture(id) => self
				.materials
				.iter()
				.filter_map(|(_, m)| m.node_tree.as_ref())
				.flat_map(|t| t.textures())
				.filter(|t| *t == id)
				.count(),
			DataBlock::Image(id) => self
				.textures
				.iter()
				.filter(|(_, t)| t.image == Some(id))
				.count(),
		}
	}

	/// Blocks of `kind` nothing refers to.
	pub fn orphans(&self, kind: DataKind) -> Vec<DataBlock> {
		self.data_blocks(kind)
			.into_iter()
			.filter(|block| self.users(*block) == 0)
			.collect()
	}

	/// Deletes a data block. References to it are not cleared, so callers only remove orphans.
	pub fn remove_data(&mut self, block: DataBlock) -> bool {
		match block {
			DataBlock::Mesh(id) => self.meshes.remove(id).is_some(),
			DataBlock::Armature(id) => self.armatures.remove(id).is_some(),
			DataBlock::Action(id) => self.actions.remove(id).is_some(),
			DataBlock::Material(id) => self.materials.remove(id).is_some(),
			DataBlock::Texture(id) => self.textures.remove(id).is_some(),
			DataBlock::Image(id) => self.images.remove(id).is_some(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::animation::{AnimationData, NlaStrip};
	use crate::image::ImageSource;
	use crate::material::{NodeKind, NodeTree, PrincipledBsdf};
	use crate::mesh::MeshPrimitive;

	fn skinned_character(scene: &mut Scene) -> (Id<Object>, Id<Object>) {
		let image = scene.add_image(Image::new("Skin", ImageSource::Packed, None));
		let texture = scene.add_texture(Texture::new("Skin", Some(image)));
		let mut tree = NodeTree::new();
		tree.add_node(NodeKind::PrincipledBsdf(PrincipledBsdf::default()));
		tree.add_node(NodeKind::TexImage(Some(texture)));
		let material = scene.add_material(Material::with_nodes("Body", tree));
		let mesh = scene.add_mesh(Mesh {
			name: "Body".to_string(),
			primitives: vec![MeshPrimitive {
				material: Some(material),
				..MeshPrimitive::default()
			}],
		});
		let armature = scene.add_armature(Armature::new("Armature"));
		let action = scene.add_action(Action::new("mixamo.com"));

		let mut armature_object = Object::new("Armature", ObjectData::Armature(armature));
		armature_object.animation_data = Some(AnimationData {
			action: Some(action),
			tracks: Vec::new(),
		});
		let armature_object = scene.add_object(armature_object);
		let mut mesh_object = Object::new("Body", ObjectData::Mesh(mesh));
		mesh_object.parent = Some(armature_object);
		mesh_object.armature = Some(armature_object);
		let mesh_object = scene.add_object(mesh_object);
		(armature_object, mesh_object)
	}

	#[test]
	fn test_users_follow_references() {
		let mut scene = Scene::default();
		let (armature_object, mesh_object) = skinned_character(&mut scene);
		for kind in DataKind::ALL {
			assert!(scene.orphans(kind).is_empty(), "{kind:?} has orphans");
		}

		scene.remove_object(mesh_object);
		assert_eq!(scene.orphans(DataKind::Mesh).len(), 1);
		// the material is still used by the orphaned mesh
		assert!(scene.orphans(DataKind::Material).is_empty());

		let action = scene.objects[armature_object].animation_data.as_ref().unwrap().action.unwrap();
		assert_eq!(scene.users(DataBlock::Action(action)), 1);
		let data = scene.objects[armature_object].animation_data.as_mut().unwrap();
		data.action = None;
		data.new_track("Correr").strips.push(NlaStrip {
			name: "Correr".to_string(),
			start: 1.,
			action,
		});
		assert_eq!(scene.users(DataBlock::Action(action)), 1);
	}

	#[test]
	fn test_remove_object_unlinks_dependents() {
		let mut scene = Scene::default();
		let (armature_object, mesh_object) = skinned_character(&mut scene);
		scene.remove_object(armature_object);
		let mesh = &scene.objects[mesh_object];
		assert_eq!(mesh.parent, None);
		assert_eq!(mesh.armature, None);
		assert_eq!(scene.orphans(DataKind::Armature).len(), 1);
		assert_eq!(scene.orphans(DataKind::Action).len(), 1);
	}

	#[test]
	fn test_reset_clears_everything() {
		let mut scene = Scene::new(24.);
		skinned_character(&mut scene);
		skinned_character(&mut scene);
		assert!(scene.objects.find("Armature.001").is_some());
		scene.reset();
		assert!(scene.is_empty());
		assert_eq!(scene.fps, 24.);
	}

	#[test]
	fn test_rename_action_keeps_names_unique() {
		let mut scene = Scene::default();
		let a = scene.add_action(Action::new("mixamo.com"));
		let b = scene.add_action(Action::new("mixamo.com"));
		assert_eq!(scene.actions[b].name, "mixamo.com.001");
		assert_eq!(scene.rename_action(a, "Correr").as_deref(), Some("Correr"));
		assert_eq!(scene.rename_action(b, "Correr").as_deref(), Some("Correr.001"));
		assert_eq!(scene.rename_action(a, "Correr").as_deref(), Some("Correr"));
	}
}
