//! Directory listings of tag intersections.

use crate::{
	attr::{EntryAttr, EntryKind},
	context::TagFs,
	error::CoreError,
	path::{TagSet, VirtualPath},
};

use tracing::{instrument, trace, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
	pub name: String,
	pub attr: EntryAttr,
}

impl DirEntry {
	#[must_use]
	pub const fn kind(&self) -> EntryKind {
		self.attr.kind
	}
}

impl TagFs {
	/// Lists the tag intersection at `path`: first the tags that narrow it
	/// without emptying it, then the files carrying every tag of the path.
	///
	/// Entries carry synthetic attributes. The listing fails as a whole if the
	/// store fails part way through; nothing is returned in that case.
	#[instrument(skip(self), level = "trace")]
	pub fn list(&self, path: &str) -> Result<Vec<DirEntry>, CoreError> {
		let path = VirtualPath::parse(path);
		self.require_tags(path.components())?;

		let tags = TagSet::from(path.components());

		let sub_tags = self.store.narrowing_tags(&tags).inspect_err(|e| {
			warn!(?tags, ?e, "Failed to list narrowing tags");
		})?;
		let files = self.store.member_files(&tags).inspect_err(|e| {
			warn!(?tags, ?e, "Failed to list member files");
		})?;

		trace!(sub_tags = sub_tags.len(), files = files.len(), "Listed tag directory");

		let directory = EntryAttr::synthetic_directory(self.owner);
		let file = EntryAttr::synthetic_file(self.owner);

		Ok(sub_tags
			.into_iter()
			.map(|name| DirEntry {
				name,
				attr: directory,
			})
			.chain(files.into_iter().map(|name| DirEntry { name, attr: file }))
			.collect())
	}
}
