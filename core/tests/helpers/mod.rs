//! Shared fixture for tag space integration tests

#![allow(dead_code)]

use std::{collections::BTreeSet, sync::Arc};

use rusqlite::ffi;
use tagfs_core::{
	CoreError, DataDir, DirEntry, EntryKind, ErrorKind, FileId, Inserted, Owner, StoreError,
	TagFs, TagId, TagSet, TagStore,
};
use tagfs_utils::error::FileIOError;
use tempfile::TempDir;

pub const OWNER: Owner = Owner {
	uid: 1000,
	gid: 1000,
};

/// A tag space over a fresh data directory that lives as long as the fixture
pub struct TagSpace {
	pub dir: TempDir,
	pub fs: TagFs,
}

impl TagSpace {
	pub fn new() -> Self {
		let dir = TempDir::new().unwrap();
		let fs = TagFs::open(dir.path(), Some(OWNER)).unwrap();
		Self { dir, fs }
	}

	/// Creates every tag at the root, then the file tagged with all of them
	pub fn with_tagged_file(tags: &[&str], file: &str) -> Self {
		let space = Self::new();
		for tag in tags {
			space.fs.make_tag(&format!("/{tag}")).unwrap();
		}
		space.fs.make_file(&path_of(tags, file)).unwrap();
		space
	}
}

/// A tag store whose every query fails as if the disk went away
#[derive(Debug)]
pub struct FailingStore;

fn io_failure() -> StoreError {
	StoreError::Sqlite(rusqlite::Error::SqliteFailure(
		ffi::Error::new(ffi::SQLITE_IOERR),
		None,
	))
}

impl TagStore for FailingStore {
	fn tag_id(&self, _name: &str) -> Result<Option<TagId>, StoreError> {
		Err(io_failure())
	}

	fn file_id(&self, _name: &str) -> Result<Option<FileId>, StoreError> {
		Err(io_failure())
	}

	fn file_has_all_tags(&self, _file: &str, _tags: &TagSet<'_>) -> Result<bool, StoreError> {
		Err(io_failure())
	}

	fn narrowing_tags(&self, _tags: &TagSet<'_>) -> Result<Vec<String>, StoreError> {
		Err(io_failure())
	}

	fn member_files(&self, _tags: &TagSet<'_>) -> Result<Vec<String>, StoreError> {
		Err(io_failure())
	}

	fn insert_tag(&self, _name: &str) -> Result<Inserted<TagId>, StoreError> {
		Err(io_failure())
	}

	fn insert_file(
		&self,
		_name: &str,
		_tags: &TagSet<'_>,
		_allocate: &mut dyn FnMut() -> Result<(), FileIOError>,
	) -> Result<Inserted<FileId>, StoreError> {
		Err(io_failure())
	}
}

/// A tag space over a fresh data directory whose store always fails
pub fn broken_space() -> (TempDir, TagFs) {
	let dir = TempDir::new().unwrap();
	let fs = TagFs::new(
		Arc::new(FailingStore),
		Arc::new(DataDir::new(dir.path())),
		OWNER,
	);
	(dir, fs)
}

pub fn path_of(components: &[&str], leaf: &str) -> String {
	components
		.iter()
		.chain(std::iter::once(&leaf))
		.fold(String::new(), |path, component| path + "/" + component)
}

pub fn dir_path(components: &[&str]) -> String {
	if components.is_empty() {
		String::from("/")
	} else {
		components
			.iter()
			.fold(String::new(), |path, component| path + "/" + component)
	}
}

pub fn names_of_kind(entries: &[DirEntry], kind: EntryKind) -> BTreeSet<String> {
	entries
		.iter()
		.filter(|entry| entry.kind() == kind)
		.map(|entry| entry.name.clone())
		.collect()
}

pub fn sub_tags(entries: &[DirEntry]) -> BTreeSet<String> {
	names_of_kind(entries, EntryKind::Directory)
}

pub fn files(entries: &[DirEntry]) -> BTreeSet<String> {
	names_of_kind(entries, EntryKind::RegularFile)
}

pub fn set(names: &[&str]) -> BTreeSet<String> {
	names.iter().map(ToString::to_string).collect()
}

pub fn kind_of<T: std::fmt::Debug>(res: Result<T, CoreError>) -> ErrorKind {
	res.unwrap_err().kind()
}

/// Every ordering of `items`
pub fn permutations<'a>(items: &[&'a str]) -> Vec<Vec<&'a str>> {
	if items.len() <= 1 {
		return vec![items.to_vec()];
	}

	let mut out = Vec::new();
	for (i, first) in items.iter().enumerate() {
		let mut rest = items.to_vec();
		rest.remove(i);
		for mut tail in permutations(&rest) {
			tail.insert(0, *first);
			out.push(tail);
		}
	}
	out
}
