use anim_bundle_scene::Scene;
use anim_bundle_scene::material::{NodeTree, sockets};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct SlimStats {
	/// materials that had a principled node
	pub materials: usize,
	pub links_removed: usize,
	pub nodes_removed: usize,
}

/// Strips every material down to its base color: all inputs of the principled node except
/// `Base Color` are disconnected and texture nodes not feeding `Base Color` are deleted.
#[profiling::function]
pub fn keep_base_color_only(scene: &mut Scene) -> SlimStats {
	let mut stats = SlimStats::default();
	for (_, material) in scene.materials.iter_mut() {
		let Some(tree) = &mut material.node_tree else {
			continue;
		};
		let Some((links, nodes)) = slim_tree(tree) else {
			continue;
		};
		stats.materials += 1;
		stats.links_removed += links;
		stats.nodes_removed += nodes;
	}
	stats
}

fn slim_tree(tree: &mut NodeTree) -> Option<(usize, usize)> {
	let bsdf = tree.principled()?;
	let links = tree.remove_links(|l| l.to_node == bsdf && l.to_socket != sockets::BASE_COLOR);

	let keep = tree.ancestors(bsdf, sockets::BASE_COLOR);
	let unused = tree
		.nodes
		.iter()
		.filter(|(id, node)| node.kind.is_texture() && !keep.contains(id))
		.map(|(id, _)| id)
		.collect::<Vec<_>>();
	for id in &unused {
		tree.remove_node(*id);
	}
	Some((links, unused.len()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use anim_bundle_scene::material::sockets::*;
	use anim_bundle_scene::material::{Material, NodeKind, PrincipledBsdf};
	use anim_bundle_scene::texture::Texture;
	use anim_bundle_scene::{DataBlock, Id};

	/// A typical character material: diffuse with alpha, a normal map and metallic-roughness.
	fn full_material(scene: &mut Scene) -> Id<Material> {
		let diffuse = scene.add_texture(Texture::new("Diffuse", None));
		let normal = scene.add_texture(Texture::new("Normal", None));
		let mr = scene.add_texture(Texture::new("MetallicRoughness", None));

		let mut tree = NodeTree::new();
		let output = tree.add_node(NodeKind::MaterialOutput);
		let bsdf = tree.add_node(NodeKind::PrincipledBsdf(PrincipledBsdf::default()));
		tree.link(bsdf, BSDF, output, SURFACE);

		let diffuse_node = tree.add_node(NodeKind::TexImage(Some(diffuse)));
		tree.link(diffuse_node, COLOR, bsdf, BASE_COLOR);
		tree.link(diffuse_node, ALPHA, bsdf, ALPHA);

		let normal_node = tree.add_node(NodeKind::TexImage(Some(normal)));
		let normal_map = tree.add_node(NodeKind::NormalMap { strength: 1. });
		tree.link(normal_node, COLOR, normal_map, COLOR);
		tree.link(normal_map, NORMAL, bsdf, NORMAL);

		let mr_node = tree.add_node(NodeKind::TexImage(Some(mr)));
		let separate = tree.add_node(NodeKind::SeparateColor);
		tree.link(mr_node, COLOR, separate, COLOR);
		tree.link(separate, BLUE, bsdf, METALLIC);
		tree.link(separate, GREEN, bsdf, ROUGHNESS);
		scene.add_material(Material::with_nodes("Body", tree))
	}

	#[test]
	fn test_keeps_base_color_chain() {
		let mut scene = Scene::default();
		let material = full_material(&mut scene);
		let stats = keep_base_color_only(&mut scene);
		assert_eq!(
			stats,
			SlimStats {
				materials: 1,
				links_removed: 4,
				nodes_removed: 2,
			}
		);

		let tree = scene.materials[material].node_tree.as_ref().unwrap();
		let bsdf = tree.principled().unwrap();
		assert_eq!(tree.links_into(bsdf).count(), 1);
		assert!(tree.input_link(bsdf, BASE_COLOR).is_some());
		let diffuse = scene.textures.find("Diffuse").unwrap();
		assert_eq!(tree.textures().collect::<Vec<_>>(), vec![diffuse]);
		// surface output and the now disconnected helper nodes stay
		assert_eq!(tree.nodes.len(), 5);

		let normal = scene.textures.find("Normal").unwrap();
		assert_eq!(scene.users(DataBlock::Texture(normal)), 0);
	}

	#[test]
	fn test_idempotent() {
		let mut scene = Scene::default();
		full_material(&mut scene);
		keep_base_color_only(&mut scene);
		let stats = keep_base_color_only(&mut scene);
		assert_eq!(stats.links_removed, 0);
		assert_eq!(stats.nodes_removed, 0);
	}

	#[test]
	fn test_skips_materials_without_principled() {
		let mut scene = Scene::default();
		scene.add_material(Material::new("NoNodes"));
		let mut tree = NodeTree::new();
		let tex = tree.add_node(NodeKind::TexImage(None));
		let output = tree.add_node(NodeKind::MaterialOutput);
		tree.link(tex, COLOR, output, SURFACE);
		let unlit = scene.add_material(Material::with_nodes("Unlit", tree));

		assert_eq!(keep_base_color_only(&mut scene), SlimStats::default());
		let tree = scene.materials[unlit].node_tree.as_ref().unwrap();
		assert_eq!(tree.nodes.len(), 2);
		assert_eq!(tree.links.len(), 1);
	}
}
