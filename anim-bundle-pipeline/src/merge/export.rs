use crate::asset_io::{ExportConfig, ExportError, ExportSettings, Exporter};
use anim_bundle_scene::Scene;
use std::path::Path;

/// Exports with the first configuration the exporter accepts. Returns `Ok(None)` if every
/// configuration was rejected; any other error ends the attempt.
#[profiling::function]
pub fn export_with_fallback(
	exporter: &mut impl Exporter,
	scene: &Scene,
	path: &Path,
	preferences: &[ExportConfig],
) -> Result<Option<ExportConfig>, ExportError> {
	for config in preferences {
		match exporter.export(scene, path, &ExportSettings::new(*config)) {
			Ok(()) => return Ok(Some(*config)),
			Err(ExportError::UnsupportedParameter(param)) => {
				println!("     export: {config} rejected ({param})");
			}
			Err(err) => return Err(err),
		}
	}
	Ok(None)
}
