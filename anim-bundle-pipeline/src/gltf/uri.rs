use anim_bundle_scene::image::ImageSource;
use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Where the encoded bytes of a glTF image are stored.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ImageLocation<'a> {
	/// a buffer view into one of the document's loaded buffers
	BufferView(&'a [u8]),
	/// payload of a `data:` uri, either base64 or percent-encoded
	DataUri { base64: bool, payload: &'a str },
	/// an external file, relative uris already joined onto the document's directory
	File(PathBuf),
}

impl<'a> ImageLocation<'a> {
	/// Interprets an image uri. Returns `None` for remote schemes and malformed uris.
	pub fn from_uri(uri: &'a str, base: &Path) -> Option<Self> {
		if let Some(rest) = uri.strip_prefix("data:") {
			let (header, payload) = rest.split_once(',')?;
			return Some(Self::DataUri {
				base64: header.ends_with(";base64"),
				payload,
			});
		}
		let (path, relative) = match uri.strip_prefix("file:") {
			Some(path) => (path.strip_prefix("//").unwrap_or(path), false),
			None if uri.contains(':') => return None,
			None => (uri, true),
		};
		let path = PathBuf::from(urlencoding::decode(path).ok()?.as_ref());
		Some(Self::File(if relative { base.join(path) } else { path }))
	}

	pub fn read(&self) -> io::Result<Cow<'a, [u8]>> {
		match self {
			Self::BufferView(bytes) => Ok(Cow::Borrowed(*bytes)),
			Self::DataUri { base64: true, payload } => BASE64_STANDARD
				.decode(payload.as_bytes())
				.map(Cow::Owned)
				.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
			Self::DataUri { base64: false, payload } => {
				Ok(Cow::Owned(urlencoding::decode_binary(payload.as_bytes()).into_owned()))
			}
			Self::File(path) => fs::read(path).map(Cow::Owned),
		}
	}

	/// How an image loaded from here is recorded in the scene.
	pub fn image_source(&self) -> ImageSource {
		match self {
			Self::File(path) => ImageSource::File(path.clone()),
			Self::BufferView(_) | Self::DataUri { .. } => ImageSource::Packed,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_from_uri() {
		let base = Path::new("assets/clips");
		assert_eq!(
			ImageLocation::from_uri("file:///tmp/skin.png", base),
			Some(ImageLocation::File(PathBuf::from("/tmp/skin.png")))
		);
		assert_eq!(
			ImageLocation::from_uri("textures/Ch03%201001_Diffuse.png", base),
			Some(ImageLocation::File(PathBuf::from("assets/clips/textures/Ch03 1001_Diffuse.png")))
		);
		assert_eq!(
			ImageLocation::from_uri("data:image/png;base64,AAAA", base),
			Some(ImageLocation::DataUri {
				base64: true,
				payload: "AAAA"
			})
		);
		assert_eq!(ImageLocation::from_uri("https://example.com/skin.png", base), None);
		assert_eq!(ImageLocation::from_uri("data:image/png;base64", base), None);
	}

	#[test]
	fn test_read_data_uris() -> io::Result<()> {
		let packed = ImageLocation::from_uri("data:application/octet-stream;base64,AQID", Path::new("")).unwrap();
		assert_eq!(&*packed.read()?, &[1, 2, 3]);
		assert_eq!(packed.image_source(), ImageSource::Packed);

		let encoded = ImageLocation::from_uri("data:text/plain,a%20b", Path::new("")).unwrap();
		assert_eq!(&*encoded.read()?, b"a b");
		Ok(())
	}

	#[test]
	fn test_read_file() -> anyhow::Result<()> {
		let dir = tempfile::tempdir()?;
		fs::write(dir.path().join("skin.png"), [7, 8])?;
		let location = ImageLocation::from_uri("skin.png", dir.path()).unwrap();
		assert_eq!(&*location.read()?, &[7, 8]);
		assert_eq!(location.image_source(), ImageSource::File(dir.path().join("skin.png")));
		Ok(())
	}
}
