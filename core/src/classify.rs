//! Path classification: what a virtual path denotes.

use crate::{
	attr::EntryAttr,
	context::TagFs,
	error::CoreError,
	path::{TagSet, VirtualPath},
};

use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification<'a> {
	RootDirectory,
	/// The intersection of every tag in the set
	TagDirectory(TagSet<'a>),
	/// A file that carries every tag before it in the path
	RegularFile { name: &'a str, attr: EntryAttr },
}

impl TagFs {
	/// Decides whether `path` denotes the root, a tag intersection or a file.
	///
	/// The leaf is tried as a file first, so a file name shadows a tag name.
	/// A file that exists but misses one of the path's tags is not found: it
	/// is not a member of the requested intersection.
	pub fn classify<'a>(&self, path: &VirtualPath<'a>) -> Result<Classification<'a>, CoreError> {
		let Some((leaf, prefix)) = path.split_leaf() else {
			return Ok(Classification::RootDirectory);
		};

		if self.resolve_file(leaf)?.is_some() {
			if !self.file_has_all_tags(leaf, &TagSet::from(prefix))? {
				debug!(file = %leaf, "File is not a member of the requested tags");
				return Err(CoreError::not_found(leaf));
			}

			let attr = self.content.stat(leaf).inspect_err(|e| {
				warn!(file = %leaf, ?e, "Failed to stat file content");
			})?;

			return Ok(Classification::RegularFile { name: leaf, attr });
		}

		self.require_tags(path.components())?;

		Ok(Classification::TagDirectory(TagSet::from(
			path.components(),
		)))
	}

	/// Attributes of the entry at `path`. Directories get synthetic
	/// attributes, files the real attributes of their content.
	#[instrument(skip(self), level = "trace")]
	pub fn attributes(&self, path: &str) -> Result<EntryAttr, CoreError> {
		Ok(match self.classify(&VirtualPath::parse(path))? {
			Classification::RootDirectory | Classification::TagDirectory(_) => {
				EntryAttr::synthetic_directory(self.owner)
			}
			Classification::RegularFile { attr, .. } => attr,
		})
	}
}
