use anim_bundle_scene::object::{Object, ObjectKind};
use anim_bundle_scene::{Id, Scene};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::io;
use std::path::Path;

/// The objects an import created, in creation order.
#[derive(Clone, Debug, Default)]
pub struct ImportResult {
	pub objects: Vec<Id<Object>>,
}

impl ImportResult {
	pub fn first_armature(&self, scene: &Scene) -> Option<Id<Object>> {
		self.objects
			.iter()
			.copied()
			.find(|id| scene.objects.get(*id).is_some_and(|o| o.kind() == ObjectKind::Armature))
	}
}

pub trait Importer {
	/// Imports the asset at `path` into `scene`, returning the objects it created.
	fn import(&mut self, scene: &mut Scene, path: &Path) -> anyhow::Result<ImportResult>;
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
	Jpeg,
	Webp,
}

impl Display for ImageFormat {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			ImageFormat::Jpeg => f.write_str("JPEG"),
			ImageFormat::Webp => f.write_str("WEBP"),
		}
	}
}

/// Image compression override applied while exporting.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ExportConfig {
	#[serde(default)]
	pub image_format: Option<ImageFormat>,
	#[serde(default)]
	pub quality: Option<u8>,
}

impl ExportConfig {
	pub const NO_OVERRIDE: Self = Self {
		image_format: None,
		quality: None,
	};

	pub const fn lossy(image_format: ImageFormat, quality: u8) -> Self {
		Self {
			image_format: Some(image_format),
			quality: Some(quality),
		}
	}
}

impl Display for ExportConfig {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match (self.image_format, self.quality) {
			(Some(format), Some(quality)) => write!(f, "{format} q{quality}"),
			(Some(format), None) => write!(f, "{format}"),
			(None, _) => f.write_str("no image override"),
		}
	}
}

pub const DEFAULT_EXPORT_PREFERENCES: [ExportConfig; 3] = [
	ExportConfig::lossy(ImageFormat::Jpeg, 70),
	ExportConfig::lossy(ImageFormat::Webp, 70),
	ExportConfig::NO_OVERRIDE,
];

#[derive(Copy, Clone, Debug)]
pub struct ExportSettings {
	pub config: ExportConfig,
	pub animations: bool,
	/// export every NLA track as its own animation
	pub nla_strips: bool,
}

impl ExportSettings {
	pub fn new(config: ExportConfig) -> Self {
		Self {
			config,
			animations: true,
			nla_strips: true,
		}
	}
}

#[derive(Debug)]
pub enum ExportError {
	/// The exporter does not accept a setting. Nothing was written.
	UnsupportedParameter(String),
	NothingToExport,
	Io(io::Error),
	Json(serde_json::Error),
	Gltf(gltf::Error),
	Image(image::ImageError),
}

impl Display for ExportError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			ExportError::UnsupportedParameter(param) => write!(f, "Unsupported export parameter: {param}"),
			ExportError::NothingToExport => f.write_str("Scene contains no objects to export"),
			ExportError::Io(err) => Display::fmt(err, f),
			ExportError::Json(err) => Display::fmt(err, f),
			ExportError::Gltf(err) => Display::fmt(err, f),
			ExportError::Image(err) => Display::fmt(err, f),
		}
	}
}

impl std::error::Error for ExportError {}

impl From<io::Error> for ExportError {
	fn from(value: io::Error) -> Self {
		Self::Io(value)
	}
}

impl From<serde_json::Error> for ExportError {
	fn from(value: serde_json::Error) -> Self {
		Self::Json(value)
	}
}

impl From<gltf::Error> for ExportError {
	fn from(value: gltf::Error) -> Self {
		match value {
			gltf::Error::Io(err) => Self::Io(err),
			err => Self::Gltf(err),
		}
	}
}

impl From<image::ImageError> for ExportError {
	fn from(value: image::ImageError) -> Self {
		Self::Image(value)
	}
}

pub trait Exporter {
	/// Writes `scene` to `path`. Must return [`ExportError::UnsupportedParameter`] without writing
	/// anything if a setting is not supported.
	fn export(&mut self, scene: &Scene, path: &Path, settings: &ExportSettings) -> Result<(), ExportError>;
}
