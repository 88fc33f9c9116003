use crate::{
	content::{Access, ContentHandle},
	context::TagFs,
	error::CoreError,
	path::{TagSet, VirtualPath},
};

use tracing::{instrument, warn};

impl TagFs {
	#[instrument(skip(self), level = "trace")]
	pub fn open_for_read(&self, path: &str) -> Result<ContentHandle, CoreError> {
		self.open_member(path, Access::Read)
	}

	#[instrument(skip(self), level = "trace")]
	pub fn open_for_write(&self, path: &str) -> Result<ContentHandle, CoreError> {
		self.open_member(path, Access::ReadWrite)
	}

	/// Resizes the content of the file at `path`.
	#[instrument(skip(self), level = "trace")]
	pub fn truncate(&self, path: &str, len: u64) -> Result<(), CoreError> {
		let name = self.member_name(path)?;
		self.content.truncate(name, len).map_err(|e| {
			warn!(file = %name, ?e, "Failed to truncate file content");
			e.into()
		})
	}

	fn open_member(&self, path: &str, access: Access) -> Result<ContentHandle, CoreError> {
		let name = self.member_name(path)?;
		self.content.open(name, access).map_err(|e| {
			warn!(file = %name, ?e, "Failed to open file content");
			e.into()
		})
	}

	/// The file named by the leaf of `path`, provided it carries every tag
	/// before it.
	fn member_name<'a>(&self, path: &'a str) -> Result<&'a str, CoreError> {
		let virtual_path = VirtualPath::parse(path);
		let Some((leaf, prefix)) = virtual_path.split_leaf() else {
			return Err(CoreError::IsADirectory(path.into()));
		};

		if self.file_has_all_tags(leaf, &TagSet::from(prefix))? {
			Ok(leaf)
		} else {
			Err(CoreError::not_found(leaf))
		}
	}
}
