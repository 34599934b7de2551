use crate::asset_io::{Exporter, Importer};
use crate::config::{CharacterJob, ImportFailurePolicy, PipelineSettings};
use crate::image::downscale_images;
use crate::material::keep_base_color_only;
use crate::merge::clip::{push_track, strip_start, take_active_clip, track_names};
use crate::merge::export::export_with_fallback;
use crate::merge::report::{FileOutcome, FileReport, JobReport, JobStatus, RunReport, megabytes};
use crate::purge::purge_orphans;
use anim_bundle_scene::Scene;
use anim_bundle_scene::object::Object;
use anim_bundle_scene::Id;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::PathBuf;

/// A source file that exists but could not be imported.
#[derive(Debug)]
pub struct JobError {
	pub output: PathBuf,
	pub source: PathBuf,
	pub error: anyhow::Error,
	/// outcomes of the files handled before the failure
	pub files: Vec<FileReport>,
}

impl Display for JobError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"importing {} for {} failed: {:#}",
			self.source.display(),
			self.output.display(),
			self.error
		)
	}
}

impl std::error::Error for JobError {}

impl From<JobError> for JobReport {
	fn from(err: JobError) -> Self {
		let mut report = JobReport::new(&err.output);
		report.status = JobStatus::ImportFailed {
			source: err.source,
			error: format!("{:#}", err.error),
		};
		report.files = err.files;
		report
	}
}

/// Runs character jobs one after another against a single scene.
pub struct MergePipeline<I, E> {
	pub importer: I,
	pub exporter: E,
	pub settings: PipelineSettings,
}

impl<I: Importer, E: Exporter> MergePipeline<I, E> {
	pub fn new(importer: I, exporter: E, settings: PipelineSettings) -> Self {
		Self {
			importer,
			exporter,
			settings,
		}
	}

	/// Runs every job. Import failures are handled according to the import failure policy.
	pub fn run_all(&mut self, scene: &mut Scene, jobs: &[CharacterJob]) -> anyhow::Result<RunReport> {
		let mut run = RunReport::default();
		for job in jobs {
			match self.run_job(scene, job) {
				Ok(report) => run.jobs.push(report),
				Err(err) => match self.settings.on_import_error {
					ImportFailurePolicy::AbortJob => {
						println!("  ERROR: {err}\n");
						run.jobs.push(err.into());
					}
					ImportFailurePolicy::AbortRun => return Err(err.into()),
				},
			}
		}
		Ok(run)
	}

	/// Builds and exports one output file. Fails only if an existing source cannot be imported.
	pub fn run_job(&mut self, scene: &mut Scene, job: &CharacterJob) -> Result<JobReport, JobError> {
		profiling::scope!("run_job", &job.output.display().to_string());
		println!("\n>>> {}", job.output.display());
		scene.reset();
		let mut report = JobReport::new(&job.output);

		let Some(retained) = self.merge_clips(scene, job, &mut report.files)? else {
			println!("  ERROR: could not build {}\n", report.output_name());
			report.status = JobStatus::Abandoned;
			return Ok(report);
		};
		report.tracks = track_names(scene, retained);

		report.slim = keep_base_color_only(scene);
		report.resized = downscale_images(scene, self.settings.max_texture_size);
		report.purge = purge_orphans(scene, self.settings.purge);

		report.status = match export_with_fallback(
			&mut self.exporter,
			scene,
			&job.output,
			&self.settings.export_preferences,
		) {
			Ok(Some(config)) => {
				let bytes = fs::metadata(&job.output).map(|m| m.len()).unwrap_or(0);
				println!("  ✓  {}  →  {}\n", report.output_name(), megabytes(bytes));
				JobStatus::Exported { config, bytes }
			}
			Ok(None) => {
				println!("  FAILED to export {}\n", report.output_name());
				JobStatus::ExportRejected
			}
			Err(err) => {
				println!("  FAILED to export {}: {err}\n", report.output_name());
				JobStatus::ExportFailed(err.to_string())
			}
		};
		Ok(report)
	}

	/// Imports every clip of the job, moving each clip onto the first file's armature. Returns the
	/// retained armature, or `None` if the first file yields none.
	fn merge_clips(
		&mut self,
		scene: &mut Scene,
		job: &CharacterJob,
		files: &mut Vec<FileReport>,
	) -> Result<Option<Id<Object>>, JobError> {
		let mut retained = None;
		for (i, clip) in job.clips.iter().enumerate() {
			if !clip.source.is_file() {
				println!("  [SKIP] not found: {}", clip.source.display());
				files.push(FileReport::new(clip, FileOutcome::SkippedMissingFile));
				if retained.is_none() {
					return Ok(None);
				}
				continue;
			}

			let size = fs::metadata(&clip.source).map(|m| m.len()).unwrap_or(0);
			let name = clip.source.file_name().unwrap_or(clip.source.as_os_str());
			println!("  [{}] {}  ({:.0} MB)", i + 1, name.to_string_lossy(), size as f64 / 1024. / 1024.);

			let imported = {
				profiling::scope!("import", &clip.source.display().to_string());
				self.importer.import(scene, &clip.source)
			};
			let imported = match imported {
				Ok(imported) => imported,
				Err(error) => {
					return Err(JobError {
						output: job.output.clone(),
						source: clip.source.clone(),
						error,
						files: std::mem::take(files),
					});
				}
			};

			let outcome = match imported.first_armature(scene) {
				None => {
					println!("  WARNING: no armature in {}", clip.source.display());
					FileOutcome::SkippedNoSkeleton
				}
				Some(armature) => {
					let taken = take_active_clip(scene, armature, &clip.label);
					let target = *retained.get_or_insert(armature);
					if let Some((action, frames)) = taken {
						push_track(scene, target, &clip.label, action, strip_start(frames));
					}
					if target == armature {
						if let Some(data) = scene.objects[armature].animation_data.as_mut() {
							data.action = None;
						}
					}
					match taken {
						Some((_, frames)) => FileOutcome::Imported { frames },
						None => {
							println!("  WARNING: no animation in {}", clip.source.display());
							FileOutcome::SkippedNoClip
						}
					}
				}
			};
			files.push(FileReport::new(clip, outcome));

			match retained {
				None => return Ok(None),
				Some(retained) if !imported.objects.contains(&retained) => {
					for object in imported.objects {
						scene.remove_object(object);
					}
				}
				Some(_) => {}
			}
		}
		Ok(retained)
	}
}
