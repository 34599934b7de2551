use crate::arena::Named;
use image::RgbaImage;
use image::imageops::FilterType;
use std::path::PathBuf;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ImageSource {
	/// loaded from an external file
	File(PathBuf),
	/// embedded in the source asset
	Packed,
	/// procedurally generated, never rescaled
	Generated,
}

#[derive(Clone, Debug)]
pub struct Image {
	pub name: String,
	pub source: ImageSource,
	/// decoded pixels, `None` when the source could not be decoded
	pub pixels: Option<RgbaImage>,
}

impl Named for Image {
	fn name(&self) -> &str {
		&self.name
	}
}

impl Image {
	pub fn new(name: impl Into<String>, source: ImageSource, pixels: Option<RgbaImage>) -> Self {
		Self {
			name: name.into(),
			source,
			pixels,
		}
	}

	/// Pixel dimensions, if known.
	pub fn size(&self) -> Option<(u32, u32)> {
		self.pixels.as_ref().map(|p| p.dimensions())
	}

	pub fn is_generated(&self) -> bool {
		self.source == ImageSource::Generated
	}

	/// Resamples the pixels to exactly `width` x `height`. Does nothing if no pixels are loaded.
	pub fn scale(&mut self, width: u32, height: u32) {
		profiling::function_scope!();
		if let Some(pixels) = &mut self.pixels {
			*pixels = image::imageops::resize(&*pixels, width, height, FilterType::Triangle);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_scale() {
		let mut image = Image::new("Skin", ImageSource::Packed, Some(RgbaImage::new(64, 32)));
		image.scale(16, 8);
		assert_eq!(image.size(), Some((16, 8)));

		let mut empty = Image::new("Missing", ImageSource::File("missing.png".into()), None);
		empty.scale(16, 8);
		assert_eq!(empty.size(), None);
	}
}
