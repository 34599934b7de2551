use anim_bundle_scene::{DataKind, Scene};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PurgeMode {
	/// repeat over every category until nothing is left to remove
	#[default]
	Recursive,
	/// one pass over images, textures and materials, in that order
	SinglePass,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct PurgeStats {
	pub removed: usize,
	pub passes: usize,
}

const SINGLE_PASS_ORDER: [DataKind; 3] = [DataKind::Image, DataKind::Texture, DataKind::Material];

/// Deletes data blocks nothing refers to.
#[profiling::function]
pub fn purge_orphans(scene: &mut Scene, mode: PurgeMode) -> PurgeStats {
	let mut stats = PurgeStats::default();
	match mode {
		PurgeMode::Recursive => loop {
			stats.passes += 1;
			let removed = purge_pass(scene, &DataKind::ALL);
			stats.removed += removed;
			if removed == 0 {
				break;
			}
		},
		PurgeMode::SinglePass => {
			stats.passes = 1;
			stats.removed = purge_pass(scene, &SINGLE_PASS_ORDER);
		}
	}
	stats
}

fn purge_pass(scene: &mut Scene, kinds: &[DataKind]) -> usize {
	let mut removed = 0;
	for kind in kinds {
		for block in scene.orphans(*kind) {
			if scene.remove_data(block) {
				removed += 1;
			}
		}
	}
	removed
}

#[cfg(test)]
mod tests {
	use super::*;
	use anim_bundle_scene::DataBlock;
	use anim_bundle_scene::image::{Image, ImageSource};
	use anim_bundle_scene::material::{Material, NodeKind, NodeTree};
	use anim_bundle_scene::mesh::{Mesh, MeshPrimitive};
	use anim_bundle_scene::object::{Object, ObjectData};
	use anim_bundle_scene::texture::Texture;

	/// An orphaned mesh holding the only reference to a material, whose texture holds an image.
	fn orphan_chain(scene: &mut Scene) {
		let image = scene.add_image(Image::new("Skin", ImageSource::Packed, None));
		let texture = scene.add_texture(Texture::new("Skin", Some(image)));
		let mut tree = NodeTree::new();
		tree.add_node(NodeKind::TexImage(Some(texture)));
		let material = scene.add_material(Material::with_nodes("Body", tree));
		scene.add_mesh(Mesh {
			name: "Body".to_string(),
			primitives: vec![MeshPrimitive {
				material: Some(material),
				..MeshPrimitive::default()
			}],
		});
	}

	#[test]
	fn test_single_pass_leaves_second_order_orphans() {
		let mut scene = Scene::default();
		orphan_chain(&mut scene);
		let stats = purge_orphans(&mut scene, PurgeMode::SinglePass);
		// only the mesh is an orphan at first and meshes are not part of the single pass
		assert_eq!(stats.removed, 0);
		assert_eq!(scene.meshes.len(), 1);
		assert_eq!(scene.images.len(), 1);
	}

	#[test]
	fn test_recursive_removes_chains() {
		let mut scene = Scene::default();
		orphan_chain(&mut scene);
		let stats = purge_orphans(&mut scene, PurgeMode::Recursive);
		assert_eq!(stats.removed, 4);
		assert!(scene.is_empty());
	}

	#[test]
	fn test_single_pass_order() {
		let mut scene = Scene::default();
		let image = scene.add_image(Image::new("Skin", ImageSource::Packed, None));
		scene.add_texture(Texture::new("Skin", Some(image)));
		scene.add_material(Material::new("Unused"));
		let stats = purge_orphans(&mut scene, PurgeMode::SinglePass);
		// the image is visited before its texture is removed
		assert_eq!(stats.removed, 2);
		assert!(scene.contains(DataBlock::Image(image)));
		assert_eq!(scene.users(DataBlock::Image(image)), 0);
	}

	#[test]
	fn test_keeps_used_blocks() {
		let mut scene = Scene::default();
		orphan_chain(&mut scene);
		let mesh = scene.meshes.find("Body").unwrap();
		scene.add_object(Object::new("Body", ObjectData::Mesh(mesh)));
		let stats = purge_orphans(&mut scene, PurgeMode::Recursive);
		assert_eq!(stats, PurgeStats { removed: 0, passes: 1 });
		assert_eq!(scene.images.len(), 1);
	}
}
