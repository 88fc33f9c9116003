//! Creation of tags and files under a tag intersection.

use crate::{
	content::{Access, ContentHandle},
	context::TagFs,
	error::CoreError,
	path::{TagSet, VirtualPath},
	store::{Inserted, StoreError},
};

use tracing::{debug, instrument, warn};

impl TagFs {
	/// Creates the tag named by the leaf of `path`. Every other component
	/// must already be a tag.
	#[instrument(skip(self), level = "trace")]
	pub fn make_tag(&self, path: &str) -> Result<(), CoreError> {
		let path = VirtualPath::parse(path);
		let Some((leaf, prefix)) = path.split_leaf() else {
			return Err(CoreError::already_exists("/"));
		};

		self.require_tags(prefix)?;
		self.ensure_unclaimed(leaf)?;

		if self.resolve_file(leaf)?.is_some() {
			return Err(CoreError::already_exists(leaf));
		}

		match self.store.insert_tag(leaf)? {
			Inserted::Created(id) => {
				debug!(tag = %leaf, ?id, "Created tag");
				Ok(())
			}
			Inserted::NameTaken => Err(CoreError::already_exists(leaf)),
		}
	}

	/// Creates the file named by the leaf of `path`, tagged with every other
	/// component, and allocates its empty content. The file is only recorded
	/// if its content could be allocated.
	///
	/// A name already used by another file is reported as existing, even when
	/// that file is not a member of this path's tags.
	#[instrument(skip(self), level = "trace")]
	pub fn make_file(&self, path: &str) -> Result<ContentHandle, CoreError> {
		let virtual_path = VirtualPath::parse(path);
		let Some((leaf, prefix)) = virtual_path.split_leaf() else {
			return Err(CoreError::IsADirectory(path.into()));
		};

		self.require_tags(prefix)?;
		self.ensure_unclaimed(leaf)?;

		if self.resolve_tag(leaf)?.is_some() || self.resolve_file(leaf)?.is_some() {
			return Err(CoreError::already_exists(leaf));
		}

		let tags = TagSet::from(prefix);
		let mut handle = None;
		let inserted = self.store.insert_file(leaf, &tags, &mut || {
			handle = Some(self.content.create(leaf)?);
			Ok(())
		});

		match inserted {
			Ok(Inserted::Created(id)) => debug!(file = %leaf, ?id, ?tags, "Created file"),
			Ok(Inserted::NameTaken) => return Err(CoreError::already_exists(leaf)),
			Err(StoreError::Allocation(e)) => {
				warn!(file = %leaf, ?e, "Failed to allocate file content");
				return Err(e.into());
			}
			Err(e) => return Err(e.into()),
		}

		match handle {
			Some(handle) => Ok(handle),
			// The store committed without allocating; the content may still be there.
			None => self
				.content
				.open(leaf, Access::ReadWrite)
				.map_err(Into::into),
		}
	}

	fn ensure_unclaimed(&self, name: &str) -> Result<(), CoreError> {
		if self.content.is_reserved(name) {
			return Err(CoreError::already_exists(name));
		}

		Ok(())
	}
}
