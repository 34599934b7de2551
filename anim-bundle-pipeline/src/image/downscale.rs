use anim_bundle_scene::Scene;
use anim_bundle_scene::image::Image;
use anim_bundle_scene::Id;
use std::fmt::{Display, Formatter};

pub const DEFAULT_MAX_TEXTURE_SIZE: u32 = 512;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResizedImage {
	pub image: Id<Image>,
	pub name: String,
	pub from: (u32, u32),
	pub to: (u32, u32),
}

impl Display for ResizedImage {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"texture: {}x{} -> {}x{}",
			self.from.0, self.from.1, self.to.0, self.to.1
		)
	}
}

/// The size `width` x `height` scales down to so that neither side exceeds `max`, keeping the
/// aspect ratio. `None` if it already fits or is empty.
pub fn fit_within(width: u32, height: u32, max: u32) -> Option<(u32, u32)> {
	let larger = width.max(height);
	if width == 0 || height == 0 || larger <= max {
		return None;
	}
	let scale = |side: u32| ((side as u64 * max as u64 / larger as u64) as u32).max(1);
	Some((scale(width), scale(height)))
}

/// Scales every loaded, non-generated image larger than `max` on either side down to fit.
#[profiling::function]
pub fn downscale_images(scene: &mut Scene, max: u32) -> Vec<ResizedImage> {
	let mut resized = Vec::new();
	for (id, image) in scene.images.iter_mut() {
		if image.is_generated() {
			continue;
		}
		let Some((width, height)) = image.size() else {
			continue;
		};
		let Some((new_width, new_height)) = fit_within(width, height, max) else {
			continue;
		};
		image.scale(new_width, new_height);
		let entry = ResizedImage {
			image: id,
			name: image.name.clone(),
			from: (width, height),
			to: (new_width, new_height),
		};
		println!("     {entry}");
		resized.push(entry);
	}
	resized
}
