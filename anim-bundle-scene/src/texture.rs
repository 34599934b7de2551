use crate::arena::{Id, Named};
use crate::image::Image;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum WrapMode {
	#[default]
	Repeat,
	ClampToEdge,
	MirroredRepeat,
}

#[derive(Clone, Debug, Default)]
pub struct Texture {
	pub name: String,
	pub image: Option<Id<Image>>,
	pub wrap_s: WrapMode,
	pub wrap_t: WrapMode,
}

impl Named for Texture {
	fn name(&self) -> &str {
		&self.name
	}
}

impl Texture {
	pub fn new(name: impl Into<String>, image: Option<Id<Image>>) -> Self {
		Self {
			name: name.into(),
			image,
			wrap_s: WrapMode::default(),
			wrap_t: WrapMode::default(),
		}
	}
}
