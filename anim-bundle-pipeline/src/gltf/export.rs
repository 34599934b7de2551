use crate::asset_io::{ExportError, ExportSettings, Exporter};
use crate::gltf::OCCLUSION_GROUP;
use crate::image::{EncodeSettings, encode_image};
use anim_bundle_scene::animation::{Action, ChannelTarget, ChannelValues, Interpolation, NlaStrip};
use anim_bundle_scene::image::Image;
use anim_bundle_scene::material::{Material, NodeKind, NodeTree, PrincipledBsdf, sockets};
use anim_bundle_scene::mesh::{Mesh, MeshPrimitive};
use anim_bundle_scene::texture::{Texture, WrapMode};
use anim_bundle_scene::transform::Transform;
use anim_bundle_scene::{Id, Scene};
use glam::Vec3;
use gltf::json;
use gltf::json::validation::{Checked, USize64};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F534A;
const CHUNK_BIN: u32 = 0x004E4942;

/// Writes binary glTF files.
#[derive(Clone, Debug)]
pub struct GlbExporter {
	pub generator: String,
}

impl Default for GlbExporter {
	fn default() -> Self {
		Self {
			generator: concat!("anim-bundle ", env!("CARGO_PKG_VERSION")).to_string(),
		}
	}
}

impl Exporter for GlbExporter {
	#[profiling::function]
	fn export(&mut self, scene: &Scene, path: &Path, settings: &ExportSettings) -> Result<(), ExportError> {
		let encode = EncodeSettings::from_config(&settings.config)?;
		if scene.objects.is_empty() {
			return Err(ExportError::NothingToExport);
		}

		let (root, buffer) = GlbBuilder::new(scene, settings, encode).build(&self.generator)?;
		let glb = write_glb(&serde_json::to_vec(&root)?, buffer);
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent)?;
		}
		fs::write(path, glb)?;
		Ok(())
	}
}

/// Frames the json and binary chunk into a GLB container.
fn write_glb(json: &[u8], mut bin: Vec<u8>) -> Vec<u8> {
	let mut json = json.to_vec();
	while json.len() % 4 != 0 {
		json.push(b' ');
	}
	while bin.len() % 4 != 0 {
		bin.push(0);
	}
	let has_bin = !bin.is_empty();
	let length = 12 + 8 + json.len() + if has_bin { 8 + bin.len() } else { 0 };

	let mut glb = Vec::with_capacity(length);
	glb.extend_from_slice(GLB_MAGIC);
	glb.extend_from_slice(&GLB_VERSION.to_le_bytes());
	glb.extend_from_slice(&(length as u32).to_le_bytes());
	glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
	glb.extend_from_slice(&CHUNK_JSON.to_le_bytes());
	glb.extend_from_slice(&json);
	if has_bin {
		glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
		glb.extend_from_slice(&CHUNK_BIN.to_le_bytes());
		glb.extend_from_slice(&bin);
	}
	glb
}

fn value_array(values: &[f32]) -> json::Value {
	json::Value::Array(values.iter().map(|v| json::Value::from(*v)).collect())
}

struct GlbBuilder<'a> {
	scene: &'a Scene,
	settings: &'a ExportSettings,
	encode: EncodeSettings,
	root: json::Root,
	buffer: Vec<u8>,
	images: FxHashMap<Id<Image>, json::Index<json::Image>>,
	textures: FxHashMap<Id<Texture>, Option<json::Index<json::Texture>>>,
	materials: FxHashMap<Id<Material>, json::Index<json::Material>>,
}

impl<'a> GlbBuilder<'a> {
	fn new(scene: &'a Scene, settings: &'a ExportSettings, encode: EncodeSettings) -> Self {
		Self {
			scene,
			settings,
			encode,
			root: json::Root::default(),
			buffer: Vec::new(),
			images: FxHashMap::default(),
			textures: FxHashMap::default(),
			materials: FxHashMap::default(),
		}
	}

	fn build(mut self, generator: &str) -> Result<(json::Root, Vec<u8>), ExportError> {
		self.images()?;
		self.materials();
		let roots = self.nodes();
		if self.settings.animations {
			self.animations();
		}

		self.root.asset = json::Asset {
			generator: Some(generator.to_string()),
			version: "2.0".to_string(),
			..Default::default()
		};
		if !self.buffer.is_empty() {
			while self.buffer.len() % 4 != 0 {
				self.buffer.push(0);
			}
			self.root.buffers.push(json::Buffer {
				byte_length: USize64::from(self.buffer.len()),
				uri: None,
				name: None,
				extensions: None,
				extras: Default::default(),
			});
		}
		self.root.scenes.push(json::Scene {
			nodes: roots,
			name: Some("Scene".to_string()),
			extensions: None,
			extras: Default::default(),
		});
		self.root.scene = Some(json::Index::new(0));
		Ok((self.root, self.buffer))
	}

	fn push_view(&mut self, bytes: &[u8], target: Option<json::buffer::Target>) -> json::Index<json::buffer::View> {
		while self.buffer.len() % 4 != 0 {
			self.buffer.push(0);
		}
		let offset = self.buffer.len();
		self.buffer.extend_from_slice(bytes);
		self.root.buffer_views.push(json::buffer::View {
			buffer: json::Index::new(0),
			byte_offset: Some(USize64::from(offset)),
			byte_length: USize64::from(bytes.len()),
			byte_stride: None,
			target: target.map(Checked::Valid),
			name: None,
			extensions: None,
			extras: Default::default(),
		});
		json::Index::new(self.root.buffer_views.len() as u32 - 1)
	}

	fn push_accessor(
		&mut self,
		bytes: &[u8],
		count: usize,
		component: json::accessor::ComponentType,
		type_: json::accessor::Type,
		target: Option<json::buffer::Target>,
		bounds: Option<(json::Value, json::Value)>,
	) -> json::Index<json::Accessor> {
		let view = self.push_view(bytes, target);
		let (min, max) = bounds.unzip();
		self.root.accessors.push(json::Accessor {
			buffer_view: Some(view),
			byte_offset: Some(USize64::from(0usize)),
			count: USize64::from(count),
			component_type: Checked::Valid(json::accessor::GenericComponentType(component)),
			type_: Checked::Valid(type_),
			min,
			max,
			name: None,
			normalized: false,
			sparse: None,
			extensions: None,
			extras: Default::default(),
		});
		json::Index::new(self.root.accessors.len() as u32 - 1)
	}

	/// Encodes every image a material still samples, in parallel.
	#[profiling::function]
	fn images(&mut self) -> Result<(), ExportError> {
		let scene = self.scene;
		let mut requested = Vec::new();
		for (_, material) in scene.materials.iter() {
			for texture in material_slots(material).into_iter().flatten() {
				let Some(image) = scene.textures.get(texture).and_then(|t| t.image) else {
					continue;
				};
				if !requested.contains(&image) && scene.images.get(image).is_some_and(|i| i.pixels.is_some()) {
					requested.push(image);
				}
			}
		}

		let encode = self.encode;
		let encoded = requested
			.par_iter()
			.filter_map(|id| scene.images[*id].pixels.as_ref().map(|pixels| (*id, pixels)))
			.map(|(id, pixels)| -> Result<_, ExportError> { Ok((id, encode_image(pixels, encode)?)) })
			.collect::<Result<Vec<_>, ExportError>>()?;

		for (id, bytes) in encoded {
			let view = self.push_view(&bytes, None);
			self.root.images.push(json::Image {
				buffer_view: Some(view),
				mime_type: Some(json::image::MimeType(encode.mime_type().to_string())),
				uri: None,
				name: Some(scene.images[id].name.clone()),
				extensions: None,
				extras: Default::default(),
			});
			self.images
				.insert(id, json::Index::new(self.root.images.len() as u32 - 1));
		}
		Ok(())
	}

	/// The glTF texture for a scene texture, `None` if its image was not exported.
	fn texture(&mut self, id: Id<Texture>) -> Option<json::Index<json::Texture>> {
		if let Some(index) = self.textures.get(&id) {
			return *index;
		}
		let scene = self.scene;
		let texture = scene.textures.get(id)?;
		let index = texture.image.and_then(|image| self.images.get(&image).copied()).map(|source| {
			self.root.samplers.push(json::texture::Sampler {
				mag_filter: Some(Checked::Valid(json::texture::MagFilter::Linear)),
				min_filter: Some(Checked::Valid(json::texture::MinFilter::LinearMipmapLinear)),
				wrap_s: wrap(texture.wrap_s),
				wrap_t: wrap(texture.wrap_t),
				name: None,
				extensions: None,
				extras: Default::default(),
			});
			self.root.textures.push(json::Texture {
				sampler: Some(json::Index::new(self.root.samplers.len() as u32 - 1)),
				source,
				name: Some(texture.name.clone()),
				extensions: None,
				extras: Default::default(),
			});
			json::Index::new(self.root.textures.len() as u32 - 1)
		});
		self.textures.insert(id, index);
		index
	}

	fn texture_info(&mut self, id: Option<Id<Texture>>) -> Option<json::texture::Info> {
		Some(json::texture::Info {
			index: self.texture(id?)?,
			tex_coord: 0,
			extensions: None,
			extras: Default::default(),
		})
	}

	#[profiling::function]
	fn materials(&mut self) {
		let scene = self.scene;
		for (id, material) in scene.materials.iter() {
			let slots = material_slots(material);
			let bsdf = material
				.node_tree
				.as_ref()
				.and_then(NodeTree::principled_settings)
				.unwrap_or_default();
			let alpha_linked = material
				.node_tree
				.as_ref()
				.and_then(|t| Some(t.input_link(t.principled()?, sockets::ALPHA).is_some()))
				.unwrap_or(false);

			let base_color_texture = self.texture_info(slots[Slot::BaseColor as usize]);
			let metallic_roughness_texture = self.texture_info(slots[Slot::MetallicRoughness as usize]);
			let normal_texture = self
				.texture_info(slots[Slot::Normal as usize])
				.map(|info| json::material::NormalTexture {
					index: info.index,
					scale: normal_strength(material),
					tex_coord: 0,
					extensions: None,
					extras: Default::default(),
				});
			let occlusion_texture = self
				.texture_info(slots[Slot::Occlusion as usize])
				.map(|info| json::material::OcclusionTexture {
					index: info.index,
					strength: json::material::StrengthFactor(1.),
					tex_coord: 0,
					extensions: None,
					extras: Default::default(),
				});
			let emissive_texture = self.texture_info(slots[Slot::Emission as usize]);
			let blend = alpha_linked || bsdf.base_color.w < 1.;

			self.root.materials.push(json::Material {
				name: Some(material.name.clone()),
				pbr_metallic_roughness: json::material::PbrMetallicRoughness {
					base_color_factor: json::material::PbrBaseColorFactor(bsdf.base_color.to_array()),
					base_color_texture,
					metallic_factor: json::material::StrengthFactor(bsdf.metallic),
					roughness_factor: json::material::StrengthFactor(bsdf.roughness),
					metallic_roughness_texture,
					extensions: None,
					extras: Default::default(),
				},
				alpha_mode: Checked::Valid(if blend {
					json::material::AlphaMode::Blend
				} else {
					json::material::AlphaMode::Opaque
				}),
				alpha_cutoff: None,
				double_sided: false,
				normal_texture,
				occlusion_texture,
				emissive_texture,
				emissive_factor: json::material::EmissiveFactor(emissive_factor(&bsdf).to_array()),
				extensions: None,
				extras: Default::default(),
			});
			self.materials
				.insert(id, json::Index::new(self.root.materials.len() as u32 - 1));
		}
	}

	/// Emits one node per object followed by one node per bone, returns the scene's root nodes.
	#[profiling::function]
	fn nodes(&mut self) -> Vec<json::Index<json::Node>> {
		let scene = self.scene;
		let objects = scene.objects.iter().collect::<Vec<_>>();
		let object_nodes = objects
			.iter()
			.enumerate()
			.map(|(i, (id, _))| (*id, i as u32))
			.collect::<FxHashMap<_, _>>();
		let mut bone_base = FxHashMap::default();
		let mut next = objects.len() as u32;
		for (id, object) in &objects {
			if let Some(armature) = object.armature_data().and_then(|a| scene.armatures.get(a)) {
				bone_base.insert(*id, next);
				next += armature.bones.len() as u32;
			}
		}

		let mut skins = FxHashMap::default();
		for (id, object) in &objects {
			let (Some(base), Some(armature)) = (
				bone_base.get(id),
				object.armature_data().and_then(|a| scene.armatures.get(a)),
			) else {
				continue;
			};
			let inverse_binds = armature.bones.iter().map(|b| b.inverse_bind).collect::<Vec<_>>();
			let inverse_binds = self.push_accessor(
				bytemuck::cast_slice(&inverse_binds),
				inverse_binds.len(),
				json::accessor::ComponentType::F32,
				json::accessor::Type::Mat4,
				None,
				None,
			);
			self.root.skins.push(json::Skin {
				inverse_bind_matrices: Some(inverse_binds),
				joints: (0..armature.bones.len() as u32)
					.map(|i| json::Index::new(base + i))
					.collect(),
				skeleton: None,
				name: Some(armature.name.clone()),
				extensions: None,
				extras: Default::default(),
			});
			skins.insert(*id, json::Index::new(self.root.skins.len() as u32 - 1));
		}

		let mut roots = Vec::new();
		let mut bone_nodes = Vec::new();
		for (id, object) in &objects {
			let mut children = objects
				.iter()
				.filter(|(_, o)| o.parent == Some(*id))
				.map(|(child, _)| json::Index::new(object_nodes[child]))
				.collect::<Vec<_>>();

			if let (Some(base), Some(armature)) = (
				bone_base.get(id).copied(),
				object.armature_data().and_then(|a| scene.armatures.get(a)),
			) {
				children.extend(armature.children(None).map(|b| json::Index::new(base + b as u32)));
				for (i, bone) in armature.bones.iter().enumerate() {
					let children = armature
						.children(Some(i))
						.map(|b| json::Index::new(base + b as u32))
						.collect::<Vec<_>>();
					bone_nodes.push(node(&bone.name, &bone.rest, children));
				}
			}

			let mut object_node = node(&object.name, &object.transform, children);
			if let Some(mesh) = object.mesh_data().and_then(|m| scene.meshes.get(m)) {
				object_node.mesh = self.mesh(mesh);
				if mesh.primitives.iter().any(MeshPrimitive::is_skinned) {
					object_node.skin = object.armature.and_then(|a| skins.get(&a).copied());
				}
			}
			self.root.nodes.push(object_node);

			if object.parent.is_none_or(|p| !object_nodes.contains_key(&p)) {
				roots.push(json::Index::new(object_nodes[id]));
			}
		}
		self.root.nodes.extend(bone_nodes);
		roots
	}

	fn mesh(&mut self, mesh: &Mesh) -> Option<json::Index<json::Mesh>> {
		use json::accessor::{ComponentType, Type};
		use json::buffer::Target;
		use json::mesh::Semantic;

		let mut primitives = Vec::new();
		for primitive in &mesh.primitives {
			let vertices = primitive.positions.len();
			if vertices == 0 {
				continue;
			}
			let (min, max) = primitive.positions.iter().fold(
				(Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
				|(min, max), p| (min.min(*p), max.max(*p)),
			);
			let mut attributes = BTreeMap::new();
			let positions = self.push_accessor(
				bytemuck::cast_slice(&primitive.positions),
				vertices,
				ComponentType::F32,
				Type::Vec3,
				Some(Target::ArrayBuffer),
				Some((value_array(&min.to_array()), value_array(&max.to_array()))),
			);
			attributes.insert(Checked::Valid(Semantic::Positions), positions);
			if primitive.normals.len() == vertices {
				let normals = self.push_accessor(
					bytemuck::cast_slice(&primitive.normals),
					vertices,
					ComponentType::F32,
					Type::Vec3,
					Some(Target::ArrayBuffer),
					None,
				);
				attributes.insert(Checked::Valid(Semantic::Normals), normals);
			}
			if primitive.tex_coords.len() == vertices {
				let tex_coords = self.push_accessor(
					bytemuck::cast_slice(&primitive.tex_coords),
					vertices,
					ComponentType::F32,
					Type::Vec2,
					Some(Target::ArrayBuffer),
					None,
				);
				attributes.insert(Checked::Valid(Semantic::TexCoords(0)), tex_coords);
			}
			if primitive.is_skinned() {
				let joints = self.push_accessor(
					bytemuck::cast_slice(&primitive.joints),
					vertices,
					ComponentType::U16,
					Type::Vec4,
					Some(Target::ArrayBuffer),
					None,
				);
				attributes.insert(Checked::Valid(Semantic::Joints(0)), joints);
				let weights = self.push_accessor(
					bytemuck::cast_slice(&primitive.weights),
					vertices,
					ComponentType::F32,
					Type::Vec4,
					Some(Target::ArrayBuffer),
					None,
				);
				attributes.insert(Checked::Valid(Semantic::Weights(0)), weights);
			}
			let indices = (!primitive.indices.is_empty()).then(|| {
				self.push_accessor(
					bytemuck::cast_slice(&primitive.indices),
					primitive.indices.len(),
					ComponentType::U32,
					Type::Scalar,
					Some(Target::ElementArrayBuffer),
					None,
				)
			});

			primitives.push(json::mesh::Primitive {
				attributes,
				indices,
				material: primitive.material.and_then(|m| self.materials.get(&m).copied()),
				mode: Checked::Valid(json::mesh::Mode::Triangles),
				targets: None,
				extensions: None,
				extras: Default::default(),
			});
		}
		if primitives.is_empty() {
			return None;
		}
		self.root.meshes.push(json::Mesh {
			primitives,
			name: Some(mesh.name.clone()),
			weights: None,
			extensions: None,
			extras: Default::default(),
		});
		Some(json::Index::new(self.root.meshes.len() as u32 - 1))
	}

	/// One animation per NLA track, then one for the active action.
	#[profiling::function]
	fn animations(&mut self) {
		let scene = self.scene;
		for (node_index, (_, object)) in scene.objects.iter().enumerate() {
			let (Some(data), Some(armature)) = (
				object.animation_data.as_ref(),
				object.armature_data().and_then(|a| scene.armatures.get(a)),
			) else {
				continue;
			};
			let bone_base = self.bone_base(node_index);
			let bones = armature
				.bones
				.iter()
				.enumerate()
				.map(|(i, b)| (b.name.as_str(), json::Index::new(bone_base + i as u32)))
				.collect::<FxHashMap<_, _>>();

			if self.settings.nla_strips {
				for track in &data.tracks {
					self.animation(&track.name, &bones, &track.strips);
				}
			}
			if let Some((id, action)) = data.action.and_then(|id| Some((id, scene.actions.get(id)?))) {
				let strip = NlaStrip {
					name: action.name.clone(),
					start: action.frame_range().map_or(0., |r| r.start),
					action: id,
				};
				self.animation(&action.name, &bones, &[strip]);
			}
		}
	}

	/// First bone node of the armature object emitted at `object_node`.
	fn bone_base(&self, object_node: usize) -> u32 {
		let scene = self.scene;
		let bones_before = scene
			.objects
			.iter()
			.take(object_node)
			.filter_map(|(_, o)| o.armature_data().and_then(|a| scene.armatures.get(a)))
			.map(|a| a.bones.len() as u32)
			.sum::<u32>();
		scene.objects.len() as u32 + bones_before
	}

	fn animation(&mut self, name: &str, bones: &FxHashMap<&str, json::Index<json::Node>>, strips: &[NlaStrip]) {
		use json::accessor::{ComponentType, Type};

		let fps = self.scene.fps;
		let channels = merge_strips(self.scene, strips);
		let mut samplers = Vec::new();
		let mut targets = Vec::new();
		for ((bone, target), channel) in channels {
			let Some(node) = bones.get(bone.as_str()).copied() else {
				continue;
			};
			if channel.frames.is_empty() || channel.frames.len() != channel.values.len() {
				continue;
			}
			let times = channel.frames.iter().map(|f| f / fps).collect::<Vec<_>>();
			let (min, max) = (times[0], times[times.len() - 1]);
			let input = self.push_accessor(
				bytemuck::cast_slice(&times),
				times.len(),
				ComponentType::F32,
				Type::Scalar,
				None,
				Some((value_array(&[min]), value_array(&[max]))),
			);
			let output = match &channel.values {
				ChannelValues::Vec3(values) => self.push_accessor(
					bytemuck::cast_slice(values),
					values.len(),
					ComponentType::F32,
					Type::Vec3,
					None,
					None,
				),
				ChannelValues::Quat(values) => self.push_accessor(
					bytemuck::cast_slice(values),
					values.len(),
					ComponentType::F32,
					Type::Vec4,
					None,
					None,
				),
			};
			samplers.push(json::animation::Sampler {
				input,
				output,
				interpolation: Checked::Valid(match channel.interpolation {
					Interpolation::Linear => json::animation::Interpolation::Linear,
					Interpolation::Step => json::animation::Interpolation::Step,
				}),
				extensions: None,
				extras: Default::default(),
			});
			targets.push(json::animation::Channel {
				sampler: json::Index::new(samplers.len() as u32 - 1),
				target: json::animation::Target {
					node,
					path: Checked::Valid(match target {
						ChannelTarget::Translation => json::animation::Property::Translation,
						ChannelTarget::Rotation => json::animation::Property::Rotation,
						ChannelTarget::Scale => json::animation::Property::Scale,
					}),
					extensions: None,
					extras: Default::default(),
				},
				extensions: None,
				extras: Default::default(),
			});
		}
		if targets.is_empty() {
			println!("     warning: animation '{name}' animates no exported bone");
			return;
		}
		self.root.animations.push(json::Animation {
			name: Some(name.to_string()),
			channels: targets,
			samplers,
			extensions: None,
			extras: Default::default(),
		});
	}
}

fn wrap(mode: WrapMode) -> Checked<json::texture::WrappingMode> {
	Checked::Valid(match mode {
		WrapMode::Repeat => json::texture::WrappingMode::Repeat,
		WrapMode::ClampToEdge => json::texture::WrappingMode::ClampToEdge,
		WrapMode::MirroredRepeat => json::texture::WrappingMode::MirroredRepeat,
	})
}

fn node(name: &str, transform: &Transform, children: Vec<json::Index<json::Node>>) -> json::Node {
	json::Node {
		name: Some(name.to_string()),
		translation: Some(transform.translation.to_array()),
		rotation: Some(json::scene::UnitQuaternion(transform.rotation.to_array())),
		scale: Some(transform.scale.to_array()),
		children: (!children.is_empty()).then_some(children),
		..Default::default()
	}
}

struct MergedChannel {
	interpolation: Interpolation,
	frames: Vec<f32>,
	values: ChannelValues,
}

/// Lays the strips of a track out one after another, keyed relative to the track's first strip.
fn merge_strips(scene: &Scene, strips: &[NlaStrip]) -> BTreeMap<(String, ChannelTarget), MergedChannel> {
	let mut strips = strips
		.iter()
		.filter_map(|s| scene.actions.get(s.action).map(|a| (s, a)))
		.collect::<Vec<(&NlaStrip, &Action)>>();
	strips.sort_by(|a, b| a.0.start.total_cmp(&b.0.start));
	let track_start = strips.first().map_or(0., |(s, _)| s.start);

	let mut merged = BTreeMap::<(String, ChannelTarget), MergedChannel>::new();
	for (strip, action) in strips {
		let action_start = action.frame_range().map_or(0., |r| r.start);
		let offset = strip.start - track_start - action_start;
		for channel in &action.channels {
			let frames = channel.frames.iter().map(|f| f + offset);
			match merged.get_mut(&(channel.bone.clone(), channel.target)) {
				None => {
					merged.insert(
						(channel.bone.clone(), channel.target),
						MergedChannel {
							interpolation: channel.interpolation,
							frames: frames.collect(),
							values: channel.values.clone(),
						},
					);
				}
				Some(existing) => match (&mut existing.values, &channel.values) {
					(ChannelValues::Vec3(a), ChannelValues::Vec3(b)) => {
						a.extend_from_slice(b);
						existing.frames.extend(frames);
					}
					(ChannelValues::Quat(a), ChannelValues::Quat(b)) => {
						a.extend_from_slice(b);
						existing.frames.extend(frames);
					}
					_ => {}
				},
			}
		}
	}
	merged
}

#[repr(usize)]
#[derive(Copy, Clone, Debug)]
enum Slot {
	BaseColor,
	MetallicRoughness,
	Normal,
	Emission,
	Occlusion,
}

/// Textures still connected to the glTF material slots, indexed by [`Slot`].
fn material_slots(material: &Material) -> [Option<Id<Texture>>; 5] {
	let mut slots = [None; 5];
	let Some(tree) = material.node_tree.as_ref() else {
		return slots;
	};
	if let Some(bsdf) = tree.principled() {
		slots[Slot::BaseColor as usize] = tree.upstream_texture(bsdf, sockets::BASE_COLOR);
		slots[Slot::MetallicRoughness as usize] = tree
			.upstream_texture(bsdf, sockets::METALLIC)
			.or_else(|| tree.upstream_texture(bsdf, sockets::ROUGHNESS));
		slots[Slot::Normal as usize] = tree.upstream_texture(bsdf, sockets::NORMAL);
		slots[Slot::Emission as usize] = tree.upstream_texture(bsdf, sockets::EMISSION_COLOR);
	}
	slots[Slot::Occlusion as usize] = tree
		.nodes
		.iter()
		.find(|(_, n)| matches!(&n.kind, NodeKind::Group(name) if name == OCCLUSION_GROUP))
		.and_then(|(group, _)| tree.upstream_texture(group, sockets::OCCLUSION));
	slots
}

fn normal_strength(material: &Material) -> f32 {
	material
		.node_tree
		.as_ref()
		.and_then(|tree| {
			let link = tree.input_link(tree.principled()?, sockets::NORMAL)?;
			match tree.nodes.get(link.from_node)?.kind {
				NodeKind::NormalMap { strength } => Some(strength),
				_ => None,
			}
		})
		.unwrap_or(1.)
}

fn emissive_factor(bsdf: &PrincipledBsdf) -> Vec3 {
	(bsdf.emission_color * bsdf.emission_strength).clamp(Vec3::ZERO, Vec3::ONE)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::asset_io::{ExportConfig, ImageFormat};
	use anim_bundle_scene::animation::Channel;

	fn action(scene: &mut Scene, name: &str, frames: &[f32]) -> Id<Action> {
		let mut action = Action::new(name);
		action.channels.push(Channel {
			bone: "Hips".to_string(),
			target: ChannelTarget::Translation,
			interpolation: Interpolation::Linear,
			frames: frames.to_vec(),
			values: ChannelValues::Vec3(vec![Vec3::ZERO; frames.len()]),
		});
		scene.add_action(action)
	}

	#[test]
	fn test_merge_strips_relative_to_track_start() {
		let mut scene = Scene::default();
		let walk = action(&mut scene, "Walk", &[10., 20.]);
		let run = action(&mut scene, "Run", &[1., 5.]);
		let strips = [
			NlaStrip {
				name: "Run".to_string(),
				start: 30.,
				action: run,
			},
			NlaStrip {
				name: "Walk".to_string(),
				start: 10.,
				action: walk,
			},
		];
		let merged = merge_strips(&scene, &strips);
		assert_eq!(merged.len(), 1);
		let channel = &merged[&("Hips".to_string(), ChannelTarget::Translation)];
		assert_eq!(channel.frames, vec![0., 10., 20., 24.]);
		assert_eq!(channel.values.len(), 4);
	}

	#[test]
	fn test_glb_framing() {
		let glb = write_glb(br#"{"a":1}"#, vec![1, 2, 3]);
		assert_eq!(&glb[0..4], b"glTF");
		assert_eq!(glb.len(), 40);
		assert_eq!(u32::from_le_bytes(glb[8..12].try_into().unwrap()) as usize, glb.len());
		assert_eq!(u32::from_le_bytes(glb[12..16].try_into().unwrap()), 8);
		assert_eq!(glb[27], b' ');
		assert_eq!(u32::from_le_bytes(glb[28..32].try_into().unwrap()), 4);
		assert_eq!(&glb[36..40], &[1, 2, 3, 0]);
	}

	#[test]
	fn test_rejects_before_writing() -> anyhow::Result<()> {
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("out").join("empty.glb");
		let scene = Scene::default();
		let settings = ExportSettings::new(ExportConfig::lossy(ImageFormat::Webp, 70));
		let result = GlbExporter::default().export(&scene, &path, &settings);
		assert!(matches!(result, Err(ExportError::UnsupportedParameter(_))));
		let result = GlbExporter::default().export(&scene, &path, &ExportSettings::new(ExportConfig::NO_OVERRIDE));
		assert!(matches!(result, Err(ExportError::NothingToExport)));
		assert!(!path.exists());
		Ok(())
	}
}
