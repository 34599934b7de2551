use crate::asset_io::ExportConfig;
use crate::config::ClipSource;
use crate::image::ResizedImage;
use crate::material::SlimStats;
use crate::purge::PurgeStats;
use anim_bundle_scene::animation::FrameRange;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// What a single source file contributed to its job.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FileOutcome {
	/// its clip became a track, `frames` is `None` for a clip without keys
	Imported { frames: Option<FrameRange> },
	SkippedMissingFile,
	SkippedNoSkeleton,
	SkippedNoClip,
}

impl Display for FileOutcome {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			FileOutcome::Imported { frames: Some(r) } => write!(f, "imported, frames {}-{}", r.start, r.end),
			FileOutcome::Imported { frames: None } => f.write_str("imported, no keyframes"),
			FileOutcome::SkippedMissingFile => f.write_str("skipped, file not found"),
			FileOutcome::SkippedNoSkeleton => f.write_str("skipped, no armature"),
			FileOutcome::SkippedNoClip => f.write_str("skipped, no animation"),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct FileReport {
	pub source: PathBuf,
	pub label: String,
	pub outcome: FileOutcome,
}

impl FileReport {
	pub fn new(clip: &ClipSource, outcome: FileOutcome) -> Self {
		Self {
			source: clip.source.clone(),
			label: clip.label.clone(),
			outcome,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum JobStatus {
	Exported { config: ExportConfig, bytes: u64 },
	/// the exporter rejected every configuration
	ExportRejected,
	ExportFailed(String),
	/// the first file was missing or had no armature
	Abandoned,
	ImportFailed { source: PathBuf, error: String },
}

impl Display for JobStatus {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			JobStatus::Exported { config, bytes } => write!(f, "exported ({config}, {})", megabytes(*bytes)),
			JobStatus::ExportRejected => f.write_str("every export configuration was rejected"),
			JobStatus::ExportFailed(err) => write!(f, "export failed: {err}"),
			JobStatus::Abandoned => f.write_str("abandoned, the first file is missing or has no armature"),
			JobStatus::ImportFailed { source, error } => write!(f, "import of {} failed: {error}", source.display()),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct JobReport {
	pub output: PathBuf,
	pub files: Vec<FileReport>,
	/// track names on the retained armature, in creation order
	pub tracks: Vec<String>,
	pub slim: SlimStats,
	pub resized: Vec<ResizedImage>,
	pub purge: PurgeStats,
	pub status: JobStatus,
}

impl JobReport {
	pub fn new(output: &Path) -> Self {
		Self {
			output: output.to_path_buf(),
			files: Vec::new(),
			tracks: Vec::new(),
			slim: SlimStats::default(),
			resized: Vec::new(),
			purge: PurgeStats::default(),
			status: JobStatus::Abandoned,
		}
	}

	pub fn succeeded(&self) -> bool {
		matches!(self.status, JobStatus::Exported { .. })
	}

	pub fn output_name(&self) -> String {
		self.output
			.file_name()
			.map(|n| n.to_string_lossy().into_owned())
			.unwrap_or_else(|| self.output.display().to_string())
	}
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunReport {
	pub jobs: Vec<JobReport>,
}

impl RunReport {
	pub fn failed(&self) -> usize {
		self.jobs.iter().filter(|j| !j.succeeded()).count()
	}

	pub fn succeeded(&self) -> bool {
		self.failed() == 0
	}
}

impl Display for RunReport {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		writeln!(
			f,
			"=== {} of {} outputs written ===",
			self.jobs.len() - self.failed(),
			self.jobs.len()
		)?;
		for job in &self.jobs {
			let mark = if job.succeeded() { "✓" } else { "✗" };
			write!(f, "  {mark} {}: {}", job.output_name(), job.status)?;
			if !job.tracks.is_empty() {
				write!(f, ", tracks: {}", job.tracks.join(", "))?;
			}
			writeln!(f)?;
			for file in job.files.iter().filter(|file| !matches!(file.outcome, FileOutcome::Imported { .. })) {
				writeln!(f, "      {} ({}): {}", file.source.display(), file.label, file.outcome)?;
			}
		}
		Ok(())
	}
}

pub fn megabytes(bytes: u64) -> String {
	format!("{:.1} MB", bytes as f64 / 1024. / 1024.)
}
