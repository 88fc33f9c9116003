//! Name resolution against the shared tag/file namespace.

use crate::{
	context::TagFs,
	error::CoreError,
	path::TagSet,
	store::{FileId, StoreError, TagId},
};

use tracing::{trace, warn};

impl TagFs {
	pub fn resolve_tag(&self, name: &str) -> Result<Option<TagId>, StoreError> {
		self.store.tag_id(name).inspect_err(|e| {
			warn!(%name, ?e, "Failed to resolve tag");
		})
	}

	pub fn resolve_file(&self, name: &str) -> Result<Option<FileId>, StoreError> {
		self.store.file_id(name).inspect_err(|e| {
			warn!(%name, ?e, "Failed to resolve file");
		})
	}

	/// True iff `file` exists and carries every tag in `tags`.
	pub fn file_has_all_tags(&self, file: &str, tags: &TagSet<'_>) -> Result<bool, StoreError> {
		self.store.file_has_all_tags(file, tags).inspect_err(|e| {
			warn!(%file, ?e, "Failed to check file tags");
		})
	}

	/// Checks that every name is an existing tag, in order. The first missing
	/// one is reported as not found.
	pub(crate) fn require_tags(&self, names: &[&str]) -> Result<(), CoreError> {
		for name in names {
			if self.resolve_tag(name)?.is_none() {
				trace!(%name, "Path component is not a tag");
				return Err(CoreError::not_found(name));
			}
		}

		Ok(())
	}
}
