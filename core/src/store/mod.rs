//! The relational tag store as seen by the resolution engine.
//!
//! Every query that filters by a tag set receives the whole set as one
//! argument; how the set reaches the storage engine (an array parameter,
//! a temporary table, repeated `OR` clauses) is the engine's business.

use crate::path::TagSet;

use tagfs_utils::error::FileIOError;

use thiserror::Error;

pub mod sqlite;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TagId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(pub i64);

/// Outcome of inserting a new name into the shared tag/file namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Inserted<Id> {
	Created(Id),
	/// A tag or a file already uses the name
	NameTaken,
}

#[derive(Error, Debug)]
pub enum StoreError {
	#[error("database error: {0}")]
	Sqlite(#[from] rusqlite::Error),
	#[error(
		"file would be left partially tagged: <file='{file}', expected={expected}, linked={linked}>"
	)]
	PartialTagging {
		file: Box<str>,
		expected: usize,
		linked: usize,
	},
	#[error(transparent)]
	Allocation(#[from] FileIOError),
}

pub trait TagStore: Send + Sync {
	fn tag_id(&self, name: &str) -> Result<Option<TagId>, StoreError>;

	fn file_id(&self, name: &str) -> Result<Option<FileId>, StoreError>;

	/// Whether the file exists and carries every tag in `tags`. An empty set
	/// is satisfied by any existing file.
	fn file_has_all_tags(&self, file: &str, tags: &TagSet<'_>) -> Result<bool, StoreError>;

	/// Tags outside `tags` that are assigned to at least one file carrying
	/// every tag in `tags`.
	fn narrowing_tags(&self, tags: &TagSet<'_>) -> Result<Vec<String>, StoreError>;

	/// Files carrying every tag in `tags`; every file when `tags` is empty.
	fn member_files(&self, tags: &TagSet<'_>) -> Result<Vec<String>, StoreError>;

	fn insert_tag(&self, name: &str) -> Result<Inserted<TagId>, StoreError>;

	/// Inserts the file and links it to every tag in `tags` as one atomic
	/// unit: either the file exists with its full tag set afterwards or
	/// nothing was written.
	///
	/// `allocate` runs once the row and its tags are in place but before
	/// they are committed. If it fails the insert is rolled back and its
	/// error comes back as [`StoreError::Allocation`]. It is not called when
	/// the name is taken.
	fn insert_file(
		&self,
		name: &str,
		tags: &TagSet<'_>,
		allocate: &mut dyn FnMut() -> Result<(), FileIOError>,
	) -> Result<Inserted<FileId>, StoreError>;
}
