use crate::arena::{Arena, Id, Named};
use crate::texture::Texture;
use glam::{Vec3, Vec4};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

pub mod sockets {
	pub const BASE_COLOR: &str = "Base Color";
	pub const METALLIC: &str = "Metallic";
	pub const ROUGHNESS: &str = "Roughness";
	pub const NORMAL: &str = "Normal";
	pub const EMISSION_COLOR: &str = "Emission Color";
	pub const ALPHA: &str = "Alpha";
	pub const OCCLUSION: &str = "Occlusion";
	pub const COLOR: &str = "Color";
	pub const GREEN: &str = "Green";
	pub const BLUE: &str = "Blue";
	pub const BSDF: &str = "BSDF";
	pub const SURFACE: &str = "Surface";
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PrincipledBsdf {
	pub base_color: Vec4,
	pub metallic: f32,
	pub roughness: f32,
	pub emission_color: Vec3,
	pub emission_strength: f32,
}

impl Default for PrincipledBsdf {
	fn default() -> Self {
		Self {
			base_color: Vec4::new(0.8, 0.8, 0.8, 1.),
			metallic: 0.,
			roughness: 0.5,
			emission_color: Vec3::ONE,
			emission_strength: 0.,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
	PrincipledBsdf(PrincipledBsdf),
	/// samples a texture, outputs `Color` and `Alpha`
	TexImage(Option<Id<Texture>>),
	NormalMap { strength: f32 },
	/// splits `Color` into `Red`, `Green`, `Blue`
	SeparateColor,
	/// opaque node group, identified by its name
	Group(String),
	MaterialOutput,
}

impl NodeKind {
	pub fn label(&self) -> &str {
		match self {
			NodeKind::PrincipledBsdf(_) => "Principled BSDF",
			NodeKind::TexImage(_) => "Image Texture",
			NodeKind::NormalMap { .. } => "Normal Map",
			NodeKind::SeparateColor => "Separate Color",
			NodeKind::Group(name) => name,
			NodeKind::MaterialOutput => "Material Output",
		}
	}

	pub fn is_texture(&self) -> bool {
		matches!(self, NodeKind::TexImage(_))
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	pub name: String,
	pub kind: NodeKind,
}

impl Named for Node {
	fn name(&self) -> &str {
		&self.name
	}
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Link {
	pub from_node: Id<Node>,
	pub from_socket: String,
	pub to_node: Id<Node>,
	pub to_socket: String,
}

#[derive(Clone, Debug, Default)]
pub struct NodeTree {
	pub nodes: Arena<Node>,
	pub links: Vec<Link>,
}

impl NodeTree {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_node(&mut self, kind: NodeKind) -> Id<Node> {
		let name = self.nodes.unique_name(kind.label());
		self.nodes.insert(Node { name, kind })
	}

	pub fn link(&mut self, from_node: Id<Node>, from_socket: &str, to_node: Id<Node>, to_socket: &str) {
		// an input socket accepts a single link
		self.links
			.retain(|l| !(l.to_node == to_node && l.to_socket == to_socket));
		self.links.push(Link {
			from_node,
			from_socket: from_socket.to_string(),
			to_node,
			to_socket: to_socket.to_string(),
		});
	}

	/// Removes the node together with every link touching it.
	pub fn remove_node(&mut self, id: Id<Node>) -> Option<Node> {
		let node = self.nodes.remove(id)?;
		self.links.retain(|l| l.from_node != id && l.to_node != id);
		Some(node)
	}

	/// Removes every link matching `f`, returning how many were removed.
	pub fn remove_links(&mut self, mut f: impl FnMut(&Link) -> bool) -> usize {
		let before = self.links.len();
		self.links.retain(|l| !f(l));
		before - self.links.len()
	}

	pub fn input_link(&self, node: Id<Node>, socket: &str) -> Option<&Link> {
		self.links.iter().find(|l| l.to_node == node && l.to_socket == socket)
	}

	pub fn links_into(&self, node: Id<Node>) -> impl Iterator<Item = &Link> + '_ {
		self.links.iter().filter(move |l| l.to_node == node)
	}

	/// The first principled shading node.
	pub fn principled(&self) -> Option<Id<Node>> {
		self.nodes
			.iter()
			.find(|(_, n)| matches!(n.kind, NodeKind::PrincipledBsdf(_)))
			.map(|(id, _)| id)
	}

	pub fn principled_settings(&self) -> Option<PrincipledBsdf> {
		self.nodes.iter().find_map(|(_, n)| match n.kind {
			NodeKind::PrincipledBsdf(bsdf) => Some(bsdf),
			_ => None,
		})
	}

	/// All nodes feeding, directly or indirectly, into the given input socket.
	pub fn ancestors(&self, node: Id<Node>, socket: &str) -> FxHashSet<Id<Node>> {
		let mut visited = FxHashSet::default();
		let mut stack = self
			.input_link(node, socket)
			.map(|l| l.from_node)
			.into_iter()
			.collect::<SmallVec<[_; 8]>>();
		while let Some(id) = stack.pop() {
			if visited.insert(id) {
				stack.extend(self.links_into(id).map(|l| l.from_node));
			}
		}
		visited
	}

	/// The closest texture sampled upstream of the given input socket.
	pub fn upstream_texture(&self, node: Id<Node>, socket: &str) -> Option<Id<Texture>> {
		let mut current = self.input_link(node, socket)?.from_node;
		let mut visited = FxHashSet::default();
		while visited.insert(current) {
			match self.nodes.get(current)?.kind {
				NodeKind::TexImage(texture) => return texture,
				_ => current = self.links_into(current).next()?.from_node,
			}
		}
		None
	}

	pub fn textures(&self) -> impl Iterator<Item = Id<Texture>> + '_ {
		self.nodes.iter().filter_map(|(_, n)| match n.kind {
			NodeKind::TexImage(texture) => texture,
			_ => None,
		})
	}
}

#[derive(Clone, Debug, Default)]
pub struct Material {
	pub name: String,
	/// `None` for materials not using a node graph
	pub node_tree: Option<NodeTree>,
}

impl Named for Material {
	fn name(&self) -> &str {
		&self.name
	}
}

impl Material {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			node_tree: None,
		}
	}

	pub fn with_nodes(name: impl Into<String>, node_tree: NodeTree) -> Self {
		Self {
			name: name.into(),
			node_tree: Some(node_tree),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::sockets::*;
	use super::*;

	#[test]
	fn test_remove_node_drops_its_links() {
		let mut tree = NodeTree::new();
		let bsdf = tree.add_node(NodeKind::PrincipledBsdf(PrincipledBsdf::default()));
		let tex = tree.add_node(NodeKind::TexImage(None));
		tree.link(tex, COLOR, bsdf, BASE_COLOR);
		tree.link(tex, ALPHA, bsdf, ALPHA);
		assert_eq!(tree.links.len(), 2);
		tree.remove_node(tex);
		assert!(tree.links.is_empty());
		assert_eq!(tree.principled(), Some(bsdf));
	}

	#[test]
	fn test_link_replaces_existing_input() {
		let mut tree = NodeTree::new();
		let bsdf = tree.add_node(NodeKind::PrincipledBsdf(PrincipledBsdf::default()));
		let a = tree.add_node(NodeKind::TexImage(None));
		let b = tree.add_node(NodeKind::TexImage(None));
		tree.link(a, COLOR, bsdf, BASE_COLOR);
		tree.link(b, COLOR, bsdf, BASE_COLOR);
		assert_eq!(tree.links.len(), 1);
		assert_eq!(tree.input_link(bsdf, BASE_COLOR).map(|l| l.from_node), Some(b));
		assert_eq!(tree.nodes[b].name, "Image Texture.001");
	}

	#[test]
	fn test_ancestors_follow_chains() {
		let mut tree = NodeTree::new();
		let bsdf = tree.add_node(NodeKind::PrincipledBsdf(PrincipledBsdf::default()));
		let tex = tree.add_node(NodeKind::TexImage(None));
		let normal_map = tree.add_node(NodeKind::NormalMap { strength: 1. });
		let other = tree.add_node(NodeKind::TexImage(None));
		tree.link(tex, COLOR, normal_map, COLOR);
		tree.link(normal_map, NORMAL, bsdf, NORMAL);
		tree.link(other, COLOR, bsdf, BASE_COLOR);

		let ancestors = tree.ancestors(bsdf, NORMAL);
		assert_eq!(ancestors.len(), 2);
		assert!(ancestors.contains(&tex) && ancestors.contains(&normal_map));
		assert!(tree.ancestors(bsdf, ROUGHNESS).is_empty());
	}
}
