use crate::arena::{Id, Named};
use glam::{Quat, Vec3};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum ChannelTarget {
	Translation,
	Rotation,
	Scale,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Interpolation {
	#[default]
	Linear,
	Step,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ChannelValues {
	Vec3(Vec<Vec3>),
	Quat(Vec<Quat>),
}

impl ChannelValues {
	pub fn len(&self) -> usize {
		match self {
			ChannelValues::Vec3(v) => v.len(),
			ChannelValues::Quat(v) => v.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Keyframes of one bone property. Bones are addressed by name so a clip can move between
/// armatures sharing the same rig.
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
	pub bone: String,
	pub target: ChannelTarget,
	pub interpolation: Interpolation,
	pub frames: Vec<f32>,
	pub values: ChannelValues,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrameRange {
	pub start: f32,
	pub end: f32,
}

/// An animation clip.
#[derive(Clone, Debug, Default)]
pub struct Action {
	pub name: String,
	pub channels: Vec<Channel>,
}

impl Named for Action {
	fn name(&self) -> &str {
		&self.name
	}
}

impl Action {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			channels: Vec::new(),
		}
	}

	/// First and last keyed frame over all channels, `None` if nothing is keyed.
	pub fn frame_range(&self) -> Option<FrameRange> {
		self.channels
			.iter()
			.flat_map(|c| c.frames.iter().copied())
			.fold(None, |range, frame| {
				Some(match range {
					None => FrameRange {
						start: frame,
						end: frame,
					},
					Some(FrameRange { start, end }) => FrameRange {
						start: f32::min(start, frame),
						end: f32::max(end, frame),
					},
				})
			})
	}
}

/// Places an action on a track, starting at `start`.
#[derive(Clone, Debug)]
pub struct NlaStrip {
	pub name: String,
	pub start: f32,
	pub action: Id<Action>,
}

/// A named, non-blending timeline slot.
#[derive(Clone, Debug, Default)]
pub struct NlaTrack {
	pub name: String,
	pub strips: Vec<NlaStrip>,
}

#[derive(Clone, Debug, Default)]
pub struct AnimationData {
	/// the active clip, edited and played directly
	pub action: Option<Id<Action>>,
	pub tracks: Vec<NlaTrack>,
}

impl AnimationData {
	pub fn new_track(&mut self, name: impl Into<String>) -> &mut NlaTrack {
		self.tracks.push(NlaTrack {
			name: name.into(),
			strips: Vec::new(),
		});
		let last = self.tracks.len() - 1;
		&mut self.tracks[last]
	}

	pub fn actions(&self) -> impl Iterator<Item = Id<Action>> + '_ {
		self.action
			.into_iter()
			.chain(self.tracks.iter().flat_map(|t| t.strips.iter().map(|s| s.action)))
	}
}
