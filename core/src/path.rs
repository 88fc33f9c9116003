//! Virtual path decomposition.

use std::collections::BTreeSet;

pub const SEPARATOR: char = '/';

/// A request path split into its `/`-delimited components.
///
/// The root path has no components. Components borrow from the request
/// string, which is never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualPath<'a> {
	components: Vec<&'a str>,
}

impl<'a> VirtualPath<'a> {
	/// Splits an absolute virtual path. Empty components produced by a
	/// leading, trailing or doubled separator are dropped.
	#[must_use]
	pub fn parse(path: &'a str) -> Self {
		debug_assert!(
			path.starts_with(SEPARATOR),
			"virtual paths are absolute: <path='{path}'>"
		);

		Self {
			components: path
				.split(SEPARATOR)
				.filter(|component| !component.is_empty())
				.collect(),
		}
	}

	#[must_use]
	pub fn is_root(&self) -> bool {
		self.components.is_empty()
	}

	#[must_use]
	pub fn components(&self) -> &[&'a str] {
		&self.components
	}

	/// The last component and everything before it, `None` for the root.
	#[must_use]
	pub fn split_leaf(&self) -> Option<(&'a str, &[&'a str])> {
		self.components
			.split_last()
			.map(|(leaf, prefix)| (*leaf, prefix))
	}
}

/// An order-independent set of tag names.
///
/// Two permutations of the same components build equal sets, and a
/// component repeated in a path counts once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet<'a>(BTreeSet<&'a str>);

impl<'a> TagSet<'a> {
	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	#[must_use]
	pub fn contains(&self, name: &str) -> bool {
		self.0.contains(name)
	}

	pub fn iter(&self) -> impl Iterator<Item = &'a str> + '_ {
		self.0.iter().copied()
	}
}

impl<'a> From<&[&'a str]> for TagSet<'a> {
	fn from(components: &[&'a str]) -> Self {
		Self(components.iter().copied().collect())
	}
}

impl<'a> FromIterator<&'a str> for TagSet<'a> {
	fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn root_has_no_components() {
		let path = VirtualPath::parse("/");
		assert!(path.is_root());
		assert_eq!(path.split_leaf(), None);
	}

	#[test]
	fn splits_components_in_order() {
		let path = VirtualPath::parse("/2024/photo/img.jpg");
		assert_eq!(path.components(), ["2024", "photo", "img.jpg"]);

		let (leaf, prefix) = path.split_leaf().unwrap();
		assert_eq!(leaf, "img.jpg");
		assert_eq!(prefix, ["2024", "photo"]);
	}

	#[test]
	fn drops_trailing_and_doubled_separators() {
		assert_eq!(VirtualPath::parse("/work/").components(), ["work"]);
		assert_eq!(VirtualPath::parse("/a//b").components(), ["a", "b"]);
	}

	#[test]
	fn tag_sets_ignore_order_and_repeats() {
		let a = TagSet::from(VirtualPath::parse("/photo/2024").components());
		let b = TagSet::from(VirtualPath::parse("/2024/photo/2024").components());
		assert_eq!(a, b);
		assert_eq!(a.len(), 2);
		assert!(a.contains("photo"));
		assert!(!a.contains("img.jpg"));
	}
}
