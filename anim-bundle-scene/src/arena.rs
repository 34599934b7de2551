use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Typed index into an [`Arena`]. Slots are never reused until the arena is cleared.
pub struct Id<T> {
	index: u32,
	_marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
	const fn new(index: u32) -> Self {
		Self {
			index,
			_marker: PhantomData,
		}
	}

	pub const fn index(&self) -> usize {
		self.index as usize
	}
}

impl<T> Copy for Id<T> {}

impl<T> Clone for Id<T> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<T> PartialEq for Id<T> {
	fn eq(&self, other: &Self) -> bool {
		self.index == other.index
	}
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		Some(self.cmp(other))
	}
}

impl<T> Ord for Id<T> {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		self.index.cmp(&other.index)
	}
}

impl<T> Hash for Id<T> {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.index.hash(state)
	}
}

impl<T> Debug for Id<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		let name = std::any::type_name::<T>();
		let name = name.rsplit("::").next().unwrap_or(name);
		write!(f, "Id<{}>({})", name, self.index)
	}
}

/// Anything stored in a scene collection carries a name, which is kept unique per collection.
pub trait Named {
	fn name(&self) -> &str;
}

pub struct Arena<T> {
	slots: Vec<Option<T>>,
}

impl<T> Default for Arena<T> {
	fn default() -> Self {
		Self { slots: Vec::new() }
	}
}

impl<T: Clone> Clone for Arena<T> {
	fn clone(&self) -> Self {
		Self {
			slots: self.slots.clone(),
		}
	}
}

impl<T: Debug> Debug for Arena<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_map().entries(self.iter()).finish()
	}
}

impl<T> Arena<T> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, value: T) -> Id<T> {
		let id = Id::new(self.slots.len() as u32);
		self.slots.push(Some(value));
		id
	}

	pub fn get(&self, id: Id<T>) -> Option<&T> {
		self.slots.get(id.index()).and_then(Option::as_ref)
	}

	pub fn get_mut(&mut self, id: Id<T>) -> Option<&mut T> {
		self.slots.get_mut(id.index()).and_then(Option::as_mut)
	}

	pub fn remove(&mut self, id: Id<T>) -> Option<T> {
		self.slots.get_mut(id.index()).and_then(Option::take)
	}

	pub fn contains(&self, id: Id<T>) -> bool {
		self.get(id).is_some()
	}

	pub fn clear(&mut self) {
		self.slots.clear();
	}

	pub fn len(&self) -> usize {
		self.slots.iter().filter(|s| s.is_some()).count()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn iter(&self) -> impl Iterator<Item = (Id<T>, &T)> + '_ {
		self.slots
			.iter()
			.enumerate()
			.filter_map(|(i, s)| s.as_ref().map(|v| (Id::new(i as u32), v)))
	}

	pub fn iter_mut(&mut self) -> impl Iterator<Item = (Id<T>, &mut T)> + '_ {
		self.slots
			.iter_mut()
			.enumerate()
			.filter_map(|(i, s)| s.as_mut().map(|v| (Id::new(i as u32), v)))
	}

	pub fn ids(&self) -> Vec<Id<T>> {
		self.iter().map(|(id, _)| id).collect()
	}
}

impl<T: Named> Arena<T> {
	pub fn find(&self, name: &str) -> Option<Id<T>> {
		self.iter().find(|(_, v)| v.name() == name).map(|(id, _)| id)
	}

	/// Returns `base` if unused, otherwise the first free `base.001`, `base.002`, ...
	pub fn unique_name(&self, base: &str) -> String {
		if self.find(base).is_none() {
			return base.to_string();
		}
		(1..)
			.map(|i| format!("{base}.{i:03}"))
			.find(|name| self.find(name).is_none())
			.unwrap_or_else(|| base.to_string())
	}
}

impl<T> std::ops::Index<Id<T>> for Arena<T> {
	type Output = T;

	fn index(&self, id: Id<T>) -> &Self::Output {
		self.get(id).expect("Id refers to a removed slot")
	}
}

impl<T> std::ops::IndexMut<Id<T>> for Arena<T> {
	fn index_mut(&mut self, id: Id<T>) -> &mut Self::Output {
		self.get_mut(id).expect("Id refers to a removed slot")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct Item(&'static str);

	impl Named for Item {
		fn name(&self) -> &str {
			self.0
		}
	}

	#[test]
	fn test_remove_keeps_other_ids_valid() {
		let mut arena = Arena::new();
		let a = arena.insert(Item("a"));
		let b = arena.insert(Item("b"));
		assert!(arena.remove(a).is_some());
		assert!(arena.remove(a).is_none());
		assert_eq!(arena[b].0, "b");
		assert_eq!(arena.len(), 1);
		assert_eq!(arena.ids(), vec![b]);
	}

	#[test]
	fn test_unique_name() {
		let mut arena = Arena::new();
		assert_eq!(arena.unique_name("Armature"), "Armature");
		arena.insert(Item("Armature"));
		assert_eq!(arena.unique_name("Armature"), "Armature.001");
		arena.insert(Item("Armature.001"));
		assert_eq!(arena.unique_name("Armature"), "Armature.002");
	}
}
