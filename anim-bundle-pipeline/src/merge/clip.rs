use anim_bundle_scene::animation::{Action, FrameRange, NlaStrip};
use anim_bundle_scene::object::Object;
use anim_bundle_scene::{Id, Scene};

/// Renames the active action of `armature` to `label` and returns it with its keyed frame range.
pub fn take_active_clip(
	scene: &mut Scene,
	armature: Id<Object>,
	label: &str,
) -> Option<(Id<Action>, Option<FrameRange>)> {
	let action = scene.objects.get(armature)?.animation_data.as_ref()?.action?;
	scene.rename_action(action, label)?;
	let frames = scene.actions[action].frame_range();
	match frames {
		Some(range) => println!("     action: '{label}'  frames {}–{}", range.start as i64, range.end as i64),
		None => println!("     action: '{label}'  no keyframes"),
	}
	Some((action, frames))
}

/// Appends a track named `label` to `armature`, holding one strip playing `action` from `start`.
pub fn push_track(scene: &mut Scene, armature: Id<Object>, label: &str, action: Id<Action>, start: f32) -> bool {
	let Some(object) = scene.objects.get_mut(armature) else {
		return false;
	};
	object.animation_data_create().new_track(label).strips.push(NlaStrip {
		name: label.to_string(),
		start,
		action,
	});
	true
}

/// Frame a clip's strip starts at: the first keyed frame, truncated to a whole frame.
pub fn strip_start(frames: Option<FrameRange>) -> f32 {
	frames.map_or(0., |r| r.start.trunc())
}

/// Track names of an object's animation data, in order.
pub fn track_names(scene: &Scene, object: Id<Object>) -> Vec<String> {
	scene
		.objects
		.get(object)
		.and_then(|o| o.animation_data.as_ref())
		.map(|data| data.tracks.iter().map(|t| t.name.clone()).collect())
		.unwrap_or_default()
}
