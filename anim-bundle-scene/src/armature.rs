use crate::arena::Named;
use crate::transform::Transform;
use glam::Mat4;

#[derive(Clone, Debug)]
pub struct Bone {
	pub name: String,
	/// index of the parent bone within the same armature
	pub parent: Option<usize>,
	/// rest pose relative to the parent bone, or to the armature object for root bones
	pub rest: Transform,
	pub inverse_bind: Mat4,
}

#[derive(Clone, Debug, Default)]
pub struct Armature {
	pub name: String,
	pub bones: Vec<Bone>,
}

impl Named for Armature {
	fn name(&self) -> &str {
		&self.name
	}
}

impl Armature {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			bones: Vec::new(),
		}
	}

	pub fn children(&self, parent: Option<usize>) -> impl Iterator<Item = usize> + '_ {
		self.bones
			.iter()
			.enumerate()
			.filter(move |(_, b)| b.parent == parent)
			.map(|(i, _)| i)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn bone(name: &str, parent: Option<usize>) -> Bone {
		Bone {
			name: name.to_string(),
			parent,
			rest: Transform::IDENTITY,
			inverse_bind: Mat4::IDENTITY,
		}
	}

	#[test]
	fn test_hierarchy_queries() {
		let mut armature = Armature::new("Armature");
		armature.bones = vec![
			bone("mixamorig:Hips", None),
			bone("mixamorig:Spine", Some(0)),
			bone("mixamorig:LeftUpLeg", Some(0)),
			bone("mixamorig:Spine1", Some(1)),
		];
		assert_eq!(armature.children(None).collect::<Vec<_>>(), vec![0]);
		assert_eq!(armature.children(Some(0)).collect::<Vec<_>>(), vec![1, 2]);
	}
}
