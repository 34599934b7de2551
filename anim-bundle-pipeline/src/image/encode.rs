use crate::asset_io::{ExportConfig, ExportError, ImageFormat};
use ::image::codecs::jpeg::JpegEncoder;
use ::image::codecs::png::PngEncoder;
use ::image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageError, RgbaImage};

/// How images are stored inside an exported file.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EncodeSettings {
	/// lossless, keeps alpha
	Png,
	/// lossy, drops alpha
	Jpeg { quality: u8 },
}

impl EncodeSettings {
	pub const DEFAULT_JPEG_QUALITY: u8 = 75;

	/// Validates an export override. WebP has no place in a core glTF file and is rejected.
	pub fn from_config(config: &ExportConfig) -> Result<Self, ExportError> {
		if let Some(quality) = config.quality {
			if !(1..=100).contains(&quality) {
				return Err(ExportError::UnsupportedParameter(format!(
					"image quality {quality} outside of 1..=100"
				)));
			}
		}
		match config.image_format {
			None => Ok(Self::Png),
			Some(ImageFormat::Jpeg) => Ok(Self::Jpeg {
				quality: config.quality.unwrap_or(Self::DEFAULT_JPEG_QUALITY),
			}),
			Some(ImageFormat::Webp) => Err(ExportError::UnsupportedParameter(format!(
				"image format {}",
				config
			))),
		}
	}

	pub fn mime_type(&self) -> &'static str {
		match self {
			EncodeSettings::Png => "image/png",
			EncodeSettings::Jpeg { .. } => "image/jpeg",
		}
	}
}

#[profiling::function]
pub fn encode_image(pixels: &RgbaImage, settings: EncodeSettings) -> Result<Vec<u8>, ImageError> {
	let (width, height) = pixels.dimensions();
	let mut bytes = Vec::new();
	match settings {
		EncodeSettings::Png => {
			PngEncoder::new(&mut bytes).write_image(pixels.as_raw(), width, height, ExtendedColorType::Rgba8)?;
		}
		EncodeSettings::Jpeg { quality } => {
			let rgb = DynamicImage::ImageRgba8(pixels.clone()).into_rgb8();
			JpegEncoder::new_with_quality(&mut bytes, quality).write_image(
				rgb.as_raw(),
				width,
				height,
				ExtendedColorType::Rgb8,
			)?;
		}
	}
	Ok(bytes)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_settings_from_config() {
		assert_eq!(EncodeSettings::from_config(&ExportConfig::NO_OVERRIDE).ok(), Some(EncodeSettings::Png));
		assert_eq!(
			EncodeSettings::from_config(&ExportConfig::lossy(ImageFormat::Jpeg, 70)).ok(),
			Some(EncodeSettings::Jpeg { quality: 70 })
		);
		assert!(matches!(
			EncodeSettings::from_config(&ExportConfig::lossy(ImageFormat::Webp, 70)),
			Err(ExportError::UnsupportedParameter(_))
		));
		assert!(matches!(
			EncodeSettings::from_config(&ExportConfig::lossy(ImageFormat::Jpeg, 0)),
			Err(ExportError::UnsupportedParameter(_))
		));
	}

	#[test]
	fn test_encode_round_trip_dimensions() -> anyhow::Result<()> {
		let pixels = RgbaImage::from_pixel(12, 7, ::image::Rgba([200, 40, 10, 128]));
		for settings in [EncodeSettings::Png, EncodeSettings::Jpeg { quality: 70 }] {
			let bytes = encode_image(&pixels, settings)?;
			let decoded = ::image::load_from_memory(&bytes)?;
			assert_eq!((decoded.width(), decoded.height()), (12, 7), "{settings:?}");
		}
		Ok(())
	}
}
