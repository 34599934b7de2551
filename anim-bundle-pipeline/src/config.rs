use crate::asset_io::{DEFAULT_EXPORT_PREFERENCES, ExportConfig};
use crate::image::DEFAULT_MAX_TEXTURE_SIZE;
use crate::purge::PurgeMode;
use anyhow::Context;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// One source file and the name its clip gets in the output.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ClipSource {
	pub source: PathBuf,
	pub label: String,
}

impl ClipSource {
	pub fn new(source: impl Into<PathBuf>, label: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			label: label.into(),
		}
	}
}

#[derive(Debug)]
pub struct ParseClipSourceError(String);

impl Display for ParseClipSourceError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "expected `<path>=<label>` or `<path>`, got {:?}", self.0)
	}
}

impl std::error::Error for ParseClipSourceError {}

/// Parses `path=Label`. Without a label the file stem is used.
impl FromStr for ClipSource {
	type Err = ParseClipSourceError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let err = || ParseClipSourceError(s.to_string());
		match s.rsplit_once('=') {
			Some((path, label)) if !path.is_empty() && !label.is_empty() => Ok(Self::new(path, label)),
			Some(_) => Err(err()),
			None => {
				let path = PathBuf::from(s);
				let label = path.file_stem().and_then(|s| s.to_str()).ok_or_else(err)?.to_string();
				Ok(Self::new(path, label))
			}
		}
	}
}

/// Everything needed to build one output file. The first clip provides mesh and skeleton.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CharacterJob {
	pub output: PathBuf,
	pub clips: Vec<ClipSource>,
}

/// What happens when a source file exists but fails to import.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportFailurePolicy {
	/// fail only the current job and continue with the next
	#[default]
	AbortJob,
	/// stop the whole run
	AbortRun,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PipelineSettings {
	pub max_texture_size: u32,
	pub purge: PurgeMode,
	pub on_import_error: ImportFailurePolicy,
	/// tried in order until the exporter accepts one
	pub export_preferences: Vec<ExportConfig>,
}

impl Default for PipelineSettings {
	fn default() -> Self {
		Self {
			max_texture_size: DEFAULT_MAX_TEXTURE_SIZE,
			purge: PurgeMode::default(),
			on_import_error: ImportFailurePolicy::default(),
			export_preferences: DEFAULT_EXPORT_PREFERENCES.to_vec(),
		}
	}
}

/// A json file listing jobs and optional settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
	#[serde(default)]
	pub out_dir: Option<PathBuf>,
	#[serde(default)]
	pub max_texture_size: Option<u32>,
	#[serde(default)]
	pub on_import_error: Option<ImportFailurePolicy>,
	#[serde(default)]
	pub purge: Option<PurgeMode>,
	#[serde(default)]
	pub export_preferences: Option<Vec<ExportConfig>>,
	#[serde(default)]
	pub fps: Option<f32>,
	pub jobs: Vec<CharacterJob>,
}

impl Manifest {
	/// Loads a manifest, resolving its relative paths against the manifest's directory.
	#[profiling::function]
	pub fn load(path: &Path) -> anyhow::Result<Self> {
		let json = fs::read_to_string(path).with_context(|| format!("reading manifest failed {:?}", path))?;
		let mut manifest = Self::from_json(&json).with_context(|| format!("parsing manifest failed {:?}", path))?;
		manifest.resolve(path.parent().unwrap_or(Path::new("")));
		Ok(manifest)
	}

	pub fn from_json(json: &str) -> anyhow::Result<Self> {
		Ok(serde_json::from_str(json)?)
	}

	/// Sources resolve against `base`, outputs against `out_dir`, which itself defaults to `base`.
	pub fn resolve(&mut self, base: &Path) {
		let out_dir = base.join(self.out_dir.as_deref().unwrap_or(Path::new("")));
		for job in &mut self.jobs {
			job.output = out_dir.join(&job.output);
			for clip in &mut job.clips {
				clip.source = base.join(&clip.source);
			}
		}
		self.out_dir = Some(out_dir);
	}

	pub fn apply(&self, settings: &mut PipelineSettings) {
		if let Some(max) = self.max_texture_size {
			settings.max_texture_size = max;
		}
		if let Some(policy) = self.on_import_error {
			settings.on_import_error = policy;
		}
		if let Some(purge) = self.purge {
			settings.purge = purge;
		}
		if let Some(preferences) = &self.export_preferences {
			settings.export_preferences = preferences.clone();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::asset_io::ImageFormat;

	#[test]
	fn test_parse_clip_source() {
		assert_eq!(
			"run.glb=Correr".parse::<ClipSource>().ok(),
			Some(ClipSource::new("run.glb", "Correr"))
		);
		assert_eq!(
			"a=b/run.glb=Correr".parse::<ClipSource>().ok(),
			Some(ClipSource::new("a=b/run.glb", "Correr"))
		);
		assert_eq!(
			"clips/Saltar.glb".parse::<ClipSource>().ok(),
			Some(ClipSource::new("clips/Saltar.glb", "Saltar"))
		);
		assert!("run.glb=".parse::<ClipSource>().is_err());
	}

	#[test]
	fn test_manifest() -> anyhow::Result<()> {
		let mut manifest = Manifest::from_json(
			r#"{
				"out_dir": "RECURSOS",
				"max_texture_size": 256,
				"on_import_error": "abort-run",
				"export_preferences": [{ "image_format": "webp", "quality": 70 }, {}],
				"jobs": [
					{
						"output": "protagonista.glb",
						"clips": [
							{ "source": "CORRER.glb", "label": "Correr" },
							{ "source": "/abs/SALTO.glb", "label": "Saltar" }
						]
					}
				]
			}"#,
		)?;
		manifest.resolve(Path::new("assets"));
		let job = &manifest.jobs[0];
		assert_eq!(job.output, Path::new("assets/RECURSOS/protagonista.glb"));
		assert_eq!(job.clips[0].source, Path::new("assets/CORRER.glb"));
		assert_eq!(job.clips[1].source, Path::new("/abs/SALTO.glb"));

		let mut settings = PipelineSettings::default();
		manifest.apply(&mut settings);
		assert_eq!(settings.max_texture_size, 256);
		assert_eq!(settings.on_import_error, ImportFailurePolicy::AbortRun);
		assert_eq!(settings.purge, PurgeMode::Recursive);
		assert_eq!(
			settings.export_preferences,
			vec![ExportConfig::lossy(ImageFormat::Webp, 70), ExportConfig::NO_OVERRIDE]
		);
		Ok(())
	}

	#[test]
	fn test_manifest_rejects_unknown_fields() {
		assert!(Manifest::from_json(r#"{ "jobs": [], "max_size": 3 }"#).is_err());
	}
}
