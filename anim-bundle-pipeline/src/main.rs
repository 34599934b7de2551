use anim_bundle_pipeline::config::{CharacterJob, ClipSource, ImportFailurePolicy, Manifest, PipelineSettings};
use anim_bundle_pipeline::gltf::{GlbExporter, GltfImporter};
use anim_bundle_pipeline::merge::MergePipeline;
use anim_bundle_pipeline::purge::PurgeMode;
use anim_bundle_scene::Scene;
use anim_bundle_scene::scene::DEFAULT_FPS;
use clap::Parser;
use std::path::PathBuf;

/// Merges the animation clips of several skinned character files into one GLB per character.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
	/// A json manifest listing the characters to build
	#[arg(short, long, conflicts_with_all = ["out", "clips"])]
	manifest: Option<PathBuf>,

	/// The output file of a single character
	#[arg(short, long, requires = "clips")]
	out: Option<PathBuf>,

	/// Source files of a single character as `path=Label`, the first one provides mesh and skeleton
	clips: Vec<ClipSource>,

	/// Directory output files are written to, overrides the manifest's `out_dir`
	#[arg(long)]
	out_dir: Option<PathBuf>,

	/// Textures larger than this in either dimension are downscaled
	#[arg(long)]
	max_texture_size: Option<u32>,

	/// What to do when a source file fails to import
	#[arg(long, value_enum)]
	on_import_error: Option<ImportFailurePolicy>,

	/// How unused data is purged before export
	#[arg(long, value_enum)]
	purge: Option<PurgeMode>,

	/// Frame rate used to convert between seconds and frames
	#[arg(long)]
	fps: Option<f32>,

	/// The amount of threads to use
	#[arg(long, short = 'j')]
	threads: Option<usize>,
}

fn main() -> anyhow::Result<()> {
	#[cfg(feature = "profile-with-puffin")]
	let _puffin_server = {
		profiling::puffin::set_scopes_on(true);
		let server_addr = format!("127.0.0.1:{}", puffin_http::DEFAULT_PORT);
		puffin_http::Server::new(&server_addr)?
	};

	let result = inner_main();
	profiling::finish_frame!();
	result
}

#[profiling::function]
fn inner_main() -> anyhow::Result<()> {
	let args = Args::parse();
	rayon::ThreadPoolBuilder::new()
		.num_threads(args.threads.unwrap_or(0))
		.thread_name(|id| format!("Rayon-{}", id))
		.build_global()?;

	let mut settings = PipelineSettings::default();
	let (jobs, fps) = match &args.manifest {
		Some(path) => {
			let manifest = Manifest::load(path)?;
			manifest.apply(&mut settings);
			let mut jobs = manifest.jobs;
			if let Some(out_dir) = &args.out_dir {
				for job in &mut jobs {
					job.output = out_dir.join(job.output.file_name().unwrap_or(job.output.as_os_str()));
				}
			}
			(jobs, manifest.fps)
		}
		None => {
			let Some(out) = args.out else {
				anyhow::bail!("either --manifest or --out with at least one clip is required");
			};
			let output = match &args.out_dir {
				Some(out_dir) => out_dir.join(out),
				None => out,
			};
			let job = CharacterJob {
				output,
				clips: args.clips,
			};
			(vec![job], None)
		}
	};

	if let Some(max) = args.max_texture_size {
		settings.max_texture_size = max;
	}
	if let Some(policy) = args.on_import_error {
		settings.on_import_error = policy;
	}
	if let Some(purge) = args.purge {
		settings.purge = purge;
	}
	let fps = args.fps.or(fps).unwrap_or(DEFAULT_FPS);

	println!("=== anim-bundle: {} characters ===", jobs.len());
	let mut scene = Scene::new(fps);
	let mut pipeline = MergePipeline::new(GltfImporter::new(), GlbExporter::default(), settings);
	let report = pipeline.run_all(&mut scene, &jobs)?;
	print!("\n{report}");

	if !report.succeeded() {
		anyhow::bail!("{} of {} characters failed", report.failed(), report.jobs.len());
	}
	Ok(())
}
