use crate::asset_io::{ImportResult, Importer};
use crate::gltf::OCCLUSION_GROUP;
use crate::gltf::uri::ImageLocation;
use anim_bundle_scene::animation::{Action, Channel, ChannelTarget, ChannelValues, Interpolation};
use anim_bundle_scene::armature::{Armature, Bone};
use anim_bundle_scene::image::{Image, ImageSource};
use anim_bundle_scene::material::{Material, NodeKind, NodeTree, PrincipledBsdf, sockets};
use anim_bundle_scene::mesh::{Mesh, MeshPrimitive};
use anim_bundle_scene::object::{Object, ObjectData};
use anim_bundle_scene::texture::{Texture, WrapMode};
use anim_bundle_scene::transform::Transform;
use anim_bundle_scene::{Id, Scene};
use anyhow::Context;
use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use gltf::animation::util::ReadOutputs;
use gltf::buffer::Data;
use gltf::image::Source;
use gltf::material::AlphaMode;
use gltf::mesh::Mode;
use gltf::texture::WrappingMode;
use gltf::{Buffer, Document};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt::{Display, Formatter};
use std::io;
use std::ops::Deref;
use std::path::{Path, PathBuf};

pub struct Gltf {
	pub document: Document,
	pub base: PathBuf,
	pub buffers: SmallVec<[Data; 1]>,
}

impl Gltf {
	#[profiling::function]
	pub fn open(path: &Path) -> Result<Self, gltf::Error> {
		let base = path
			.parent()
			.map(Path::to_path_buf)
			.unwrap_or_else(|| PathBuf::from("./"));
		let gltf::Gltf { document, mut blob } = gltf::Gltf::open(path)?;
		let buffers = document
			.buffers()
			.map(|buffer| Data::from_source_and_blob(buffer.source(), Some(base.as_path()), &mut blob))
			.collect::<Result<_, _>>()?;
		Ok(Self {
			document,
			base,
			buffers,
		})
	}

	pub fn base(&self) -> &Path {
		self.base.as_path()
	}

	pub fn buffer(&self, buffer: Buffer) -> Option<&[u8]> {
		self.buffers.get(buffer.index()).map(|b| &b.0[..])
	}

	pub fn image_location<'a>(&'a self, image: gltf::Image<'a>) -> Result<ImageLocation<'a>, GltfImageError> {
		Ok(match image.source() {
			Source::View { view, .. } => {
				let buffer = self.buffer(view.buffer()).ok_or(GltfImageError::MissingBuffer)?;
				ImageLocation::BufferView(
					buffer
						.get(view.offset()..(view.offset() + view.length()))
						.ok_or(GltfImageError::BufferViewOutOfBounds)?,
				)
			}
			Source::Uri { uri, .. } => {
				ImageLocation::from_uri(uri, self.base()).ok_or(GltfImageError::UnsupportedUri)?
			}
		})
	}

	#[profiling::function]
	pub fn decode_image(&self, location: &ImageLocation) -> Result<::image::RgbaImage, GltfImageError> {
		let bytes = {
			profiling::scope!("read into memory");
			location.read()?
		};
		Ok(::image::load_from_memory(&bytes)?.into_rgba8())
	}
}

impl Deref for Gltf {
	type Target = Document;

	fn deref(&self) -> &Self::Target {
		&self.document
	}
}

#[derive(Debug)]
pub enum GltfImageError {
	MissingBuffer,
	BufferViewOutOfBounds,
	UnsupportedUri,
	Decode(::image::ImageError),
	IoError(io::Error),
}

impl Display for GltfImageError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			GltfImageError::MissingBuffer => f.write_str("Invalid buffer index"),
			GltfImageError::BufferViewOutOfBounds => f.write_str("Buffer view is out of bounds"),
			GltfImageError::UnsupportedUri => f.write_str("Image URI is unsupported or invalid"),
			GltfImageError::Decode(err) => Display::fmt(err, f),
			GltfImageError::IoError(err) => Display::fmt(err, f),
		}
	}
}

impl std::error::Error for GltfImageError {}

impl From<::image::ImageError> for GltfImageError {
	fn from(value: ::image::ImageError) -> Self {
		Self::Decode(value)
	}
}

impl From<io::Error> for GltfImageError {
	fn from(value: io::Error) -> Self {
		Self::IoError(value)
	}
}

#[derive(Debug)]
pub enum ImportError {
	UnsupportedFormat(PathBuf),
	PrimitiveMustBeTriangleList,
	NoVertexPositions,
}

impl Display for ImportError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			ImportError::UnsupportedFormat(path) => write!(f, "Unsupported source format: {}", path.display()),
			ImportError::PrimitiveMustBeTriangleList => f.write_str("All primitives must be triangle lists"),
			ImportError::NoVertexPositions => f.write_str("A mesh primitive exists with no vertex positions"),
		}
	}
}

impl std::error::Error for ImportError {}

/// Imports `.gltf` and `.glb` files.
#[derive(Debug, Default)]
pub struct GltfImporter;

impl GltfImporter {
	pub fn new() -> Self {
		Self
	}

	pub fn supports(path: &Path) -> bool {
		path.extension()
			.and_then(|e| e.to_str())
			.is_some_and(|e| e.eq_ignore_ascii_case("gltf") || e.eq_ignore_ascii_case("glb"))
	}
}

impl Importer for GltfImporter {
	#[profiling::function]
	fn import(&mut self, scene: &mut Scene, path: &Path) -> anyhow::Result<ImportResult> {
		if !Self::supports(path) {
			return Err(ImportError::UnsupportedFormat(path.to_path_buf()).into());
		}
		let gltf = Gltf::open(path).with_context(|| format!("opening gltf file failed {:?}", path))?;
		let mut import = DocumentImport::new(&gltf, scene);
		import.images();
		import.textures();
		import.materials();
		import.armatures();
		import
			.meshes()
			.with_context(|| format!("importing meshes failed {:?}", path))?;
		import.animations();
		Ok(ImportResult {
			objects: import.objects,
		})
	}
}

/// Maps glTF indices to the scene blocks created for them during one import.
struct DocumentImport<'a> {
	gltf: &'a Gltf,
	scene: &'a mut Scene,
	parents: Vec<Option<usize>>,
	images: Vec<Id<Image>>,
	textures: Vec<Id<Texture>>,
	materials: Vec<Id<Material>>,
	skins: Vec<SkinBinding>,
	/// joint node index to the first armature object claiming it and the bone name
	joints: FxHashMap<usize, (Id<Object>, String)>,
	objects: Vec<Id<Object>>,
}

/// The armature object a glTF skin deforms by, with the bone index of each of the skin's joints.
struct SkinBinding {
	object: Id<Object>,
	bones: Vec<u16>,
}

impl<'a> DocumentImport<'a> {
	fn new(gltf: &'a Gltf, scene: &'a mut Scene) -> Self {
		let mut parents = vec![None; gltf.nodes().len()];
		for node in gltf.nodes() {
			for child in node.children() {
				parents[child.index()] = Some(node.index());
			}
		}
		Self {
			gltf,
			scene,
			parents,
			images: Vec::new(),
			textures: Vec::new(),
			materials: Vec::new(),
			skins: Vec::new(),
			joints: FxHashMap::default(),
			objects: Vec::new(),
		}
	}

	#[profiling::function]
	fn images(&mut self) {
		for gltf_image in self.gltf.images() {
			let name = gltf_image
				.name()
				.map(str::to_string)
				.unwrap_or_else(|| format!("Image_{}", gltf_image.index()));
			let (source, pixels) = match self.gltf.image_location(gltf_image) {
				Ok(location) => {
					let source = location.image_source();
					match self.gltf.decode_image(&location) {
						Ok(pixels) => (source, Some(pixels)),
						Err(err) => {
							println!("     warning: image '{name}' could not be decoded: {err}");
							(source, None)
						}
					}
				}
				Err(err) => {
					println!("     warning: image '{name}' could not be read: {err}");
					(ImageSource::Packed, None)
				}
			};
			let id = self.scene.add_image(Image::new(name, source, pixels));
			self.images.push(id);
		}
	}

	fn textures(&mut self) {
		fn wrap(mode: WrappingMode) -> WrapMode {
			match mode {
				WrappingMode::ClampToEdge => WrapMode::ClampToEdge,
				WrappingMode::MirroredRepeat => WrapMode::MirroredRepeat,
				WrappingMode::Repeat => WrapMode::Repeat,
			}
		}

		for gltf_texture in self.gltf.textures() {
			let image = self.images.get(gltf_texture.source().index()).copied();
			let name = gltf_texture
				.name()
				.or(gltf_texture.source().name())
				.unwrap_or("Texture");
			let sampler = gltf_texture.sampler();
			let id = self.scene.add_texture(Texture {
				name: name.to_string(),
				image,
				wrap_s: wrap(sampler.wrap_s()),
				wrap_t: wrap(sampler.wrap_t()),
			});
			self.textures.push(id);
		}
	}

	#[profiling::function]
	fn materials(&mut self) {
		for gltf_material in self.gltf.materials() {
			let tree = self.material_tree(&gltf_material);
			let name = gltf_material.name().unwrap_or("Material");
			let id = self.scene.add_material(Material::with_nodes(name, tree));
			self.materials.push(id);
		}
	}

	/// Builds the node graph for a glTF PBR material, one texture node per used texture slot.
	fn material_tree(&self, material: &gltf::Material) -> NodeTree {
		use sockets::*;

		let pbr = material.pbr_metallic_roughness();
		let emissive = Vec3::from(material.emissive_factor());
		let mut tree = NodeTree::new();
		let output = tree.add_node(NodeKind::MaterialOutput);
		let bsdf = tree.add_node(NodeKind::PrincipledBsdf(PrincipledBsdf {
			base_color: Vec4::from(pbr.base_color_factor()),
			metallic: pbr.metallic_factor(),
			roughness: pbr.roughness_factor(),
			emission_color: emissive,
			emission_strength: if emissive == Vec3::ZERO { 0. } else { 1. },
		}));
		tree.link(bsdf, BSDF, output, SURFACE);

		let texture_node =
			|tree: &mut NodeTree, index: usize| tree.add_node(NodeKind::TexImage(self.textures.get(index).copied()));

		if let Some(info) = pbr.base_color_texture() {
			let tex = texture_node(&mut tree, info.texture().index());
			tree.link(tex, COLOR, bsdf, BASE_COLOR);
			if !matches!(material.alpha_mode(), AlphaMode::Opaque) {
				tree.link(tex, ALPHA, bsdf, ALPHA);
			}
		}
		if let Some(info) = pbr.metallic_roughness_texture() {
			let tex = texture_node(&mut tree, info.texture().index());
			let separate = tree.add_node(NodeKind::SeparateColor);
			tree.link(tex, COLOR, separate, COLOR);
			tree.link(separate, BLUE, bsdf, METALLIC);
			tree.link(separate, GREEN, bsdf, ROUGHNESS);
		}
		if let Some(normal) = material.normal_texture() {
			let tex = texture_node(&mut tree, normal.texture().index());
			let normal_map = tree.add_node(NodeKind::NormalMap {
				strength: normal.scale(),
			});
			tree.link(tex, COLOR, normal_map, COLOR);
			tree.link(normal_map, NORMAL, bsdf, NORMAL);
		}
		if let Some(info) = material.emissive_texture() {
			let tex = texture_node(&mut tree, info.texture().index());
			tree.link(tex, COLOR, bsdf, EMISSION_COLOR);
		}
		if let Some(occlusion) = material.occlusion_texture() {
			let tex = texture_node(&mut tree, occlusion.texture().index());
			let settings = tree.add_node(NodeKind::Group(OCCLUSION_GROUP.to_string()));
			tree.link(tex, COLOR, settings, OCCLUSION);
		}
		tree
	}

	#[profiling::function]
	fn armatures(&mut self) {
		// sorted joint set to its armature object and the joint order of its bones
		let mut by_joint_set = FxHashMap::<Vec<usize>, (Id<Object>, Vec<usize>)>::default();
		for skin in self.gltf.skins() {
			let joints = skin.joints().collect::<Vec<_>>();
			let joint_indices = joints.iter().map(|j| j.index()).collect::<Vec<_>>();
			let mut joint_set = joint_indices.clone();
			joint_set.sort_unstable();
			joint_set.dedup();

			// exporters writing one skin per mesh repeat the same joints, those share one armature
			if let Some((object, order)) = by_joint_set.get(&joint_set) {
				let bones = joint_indices
					.iter()
					.map(|j| order.iter().position(|o| o == j).unwrap_or(0) as u16)
					.collect();
				self.skins.push(SkinBinding { object: *object, bones });
				continue;
			}
			let inverse_binds = skin
				.reader(|b| self.gltf.buffer(b))
				.read_inverse_bind_matrices()
				.map(|it| it.map(|m| Mat4::from_cols_array_2d(&m)).collect::<Vec<_>>())
				.unwrap_or_default();

			let bones = joints
				.iter()
				.enumerate()
				.map(|(i, joint)| Bone {
					name: joint
						.name()
						.map(str::to_string)
						.unwrap_or_else(|| format!("Bone_{}", joint.index())),
					parent: self.parents[joint.index()].and_then(|p| joint_indices.iter().position(|j| *j == p)),
					rest: Transform::from_decomposed(joint.transform().decomposed()),
					inverse_bind: inverse_binds.get(i).copied().unwrap_or(Mat4::IDENTITY),
				})
				.collect::<Vec<_>>();

			// the non-joint node holding the root bones becomes the armature object
			let holder = joint_indices
				.iter()
				.filter_map(|j| self.parents[*j])
				.find(|p| !joint_indices.contains(p))
				.and_then(|p| self.gltf.nodes().nth(p));
			let name = holder
				.as_ref()
				.and_then(|n| n.name())
				.or(skin.name())
				.unwrap_or("Armature")
				.to_string();
			let transform = holder
				.as_ref()
				.map(|n| Transform::from_decomposed(n.transform().decomposed()))
				.unwrap_or_default();

			let bone_names = bones.iter().map(|b| b.name.clone()).collect::<Vec<_>>();
			let armature = self.scene.add_armature(Armature {
				name: name.clone(),
				bones,
			});
			let mut object = Object::new(name, ObjectData::Armature(armature));
			object.transform = transform;
			let object = self.scene.add_object(object);
			for (joint, bone) in joint_indices.iter().zip(bone_names) {
				self.joints.entry(*joint).or_insert((object, bone));
			}
			self.skins.push(SkinBinding {
				object,
				bones: (0..joint_indices.len() as u16).collect(),
			});
			by_joint_set.insert(joint_set, (object, joint_indices));
			self.objects.push(object);
		}
	}

	#[profiling::function]
	fn meshes(&mut self) -> Result<(), ImportError> {
		for node in self.gltf.nodes() {
			let Some(gltf_mesh) = node.mesh() else {
				continue;
			};
			let binding = node.skin().and_then(|s| self.skins.get(s.index()));
			let primitives = gltf_mesh
				.primitives()
				.map(|p| self.primitive(p, binding))
				.collect::<Result<Vec<_>, _>>()?;
			let armature = binding.map(|b| b.object);
			let mesh_name = gltf_mesh.name().or(node.name()).unwrap_or("Mesh");
			let mesh = self.scene.add_mesh(Mesh {
				name: mesh_name.to_string(),
				primitives,
			});

			let mut object = Object::new(node.name().unwrap_or(mesh_name), ObjectData::Mesh(mesh));
			object.transform = Transform::from_decomposed(node.transform().decomposed());
			object.parent = armature;
			object.armature = armature;
			let object = self.scene.add_object(object);
			self.objects.push(object);
		}
		Ok(())
	}

	fn primitive(&self, primitive: gltf::Primitive, skin: Option<&SkinBinding>) -> Result<MeshPrimitive, ImportError> {
		if primitive.mode() != Mode::Triangles {
			return Err(ImportError::PrimitiveMustBeTriangleList);
		}
		let reader = primitive.reader(|b| self.gltf.buffer(b));
		let positions = reader
			.read_positions()
			.ok_or(ImportError::NoVertexPositions)?
			.map(Vec3::from)
			.collect::<Vec<_>>();
		let indices = match reader.read_indices() {
			Some(indices) => indices.into_u32().collect(),
			None => (0..positions.len() as u32).collect(),
		};
		Ok(MeshPrimitive {
			normals: reader
				.read_normals()
				.map(|it| it.map(Vec3::from).collect())
				.unwrap_or_default(),
			tex_coords: reader
				.read_tex_coords(0)
				.map(|it| it.into_f32().map(Vec2::from).collect())
				.unwrap_or_default(),
			joints: reader
				.read_joints(0)
				.map(|it| {
					let bone = |slot: u16| skin.and_then(|s| s.bones.get(slot as usize).copied()).unwrap_or(slot);
					it.into_u16().map(|joints| joints.map(bone)).collect()
				})
				.unwrap_or_default(),
			weights: reader
				.read_weights(0)
				.map(|it| it.into_f32().map(Vec4::from).collect())
				.unwrap_or_default(),
			material: primitive
				.material()
				.index()
				.and_then(|i| self.materials.get(i).copied()),
			positions,
			indices,
		})
	}

	/// Every animation becomes an action. The first one animating an armature becomes its active
	/// action, the rest stay unassigned.
	#[profiling::function]
	fn animations(&mut self) {
		let fps = self.scene.fps;
		for animation in self.gltf.animations() {
			let mut action = Action::new(animation.name().unwrap_or("Action"));
			let mut owner = None;
			let mut dropped = 0;
			for channel in animation.channels() {
				let Some((object, bone)) = self.joints.get(&channel.target().node().index()) else {
					dropped += 1;
					continue;
				};
				let reader = channel.reader(|b| self.gltf.buffer(b));
				let Some(inputs) = reader.read_inputs() else {
					dropped += 1;
					continue;
				};
				let frames = inputs.map(|t| t * fps).collect::<Vec<_>>();
				let (target, values) = match reader.read_outputs() {
					Some(ReadOutputs::Translations(it)) => {
						(ChannelTarget::Translation, ChannelValues::Vec3(it.map(Vec3::from).collect()))
					}
					Some(ReadOutputs::Rotations(it)) => (
						ChannelTarget::Rotation,
						ChannelValues::Quat(it.into_f32().map(Quat::from_array).collect()),
					),
					Some(ReadOutputs::Scales(it)) => {
						(ChannelTarget::Scale, ChannelValues::Vec3(it.map(Vec3::from).collect()))
					}
					_ => {
						dropped += 1;
						continue;
					}
				};
				let (interpolation, values) = match channel.sampler().interpolation() {
					gltf::animation::Interpolation::Linear => (Interpolation::Linear, values),
					gltf::animation::Interpolation::Step => (Interpolation::Step, values),
					// keep the keyed values, drop the tangents
					gltf::animation::Interpolation::CubicSpline => (Interpolation::Linear, spline_values(values)),
				};
				owner.get_or_insert(*object);
				action.channels.push(Channel {
					bone: bone.clone(),
					target,
					interpolation,
					frames,
					values,
				});
			}
			if dropped > 0 {
				println!(
					"     warning: {dropped} channels of animation '{}' do not target bones",
					action.name
				);
			}

			let action = self.scene.add_action(action);
			if let Some(owner) = owner {
				let data = self.scene.objects[owner].animation_data_create();
				if data.action.is_none() {
					data.action = Some(action);
				}
			}
		}
	}
}

fn spline_values(values: ChannelValues) -> ChannelValues {
	fn middle<T: Copy>(v: Vec<T>) -> Vec<T> {
		v.chunks_exact(3).map(|c| c[1]).collect()
	}
	match values {
		ChannelValues::Vec3(v) => ChannelValues::Vec3(middle(v)),
		ChannelValues::Quat(v) => ChannelValues::Quat(middle(v)),
	}
}
