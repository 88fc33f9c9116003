//! Real-file content store: the byte content and metadata behind each File,
//! keyed by the File's name.

use crate::attr::EntryAttr;

use tagfs_utils::{error::FileIOError, STATE_DIR_NAME};

use std::{
	fs::{self, File, Metadata, OpenOptions},
	io,
	os::unix::fs::{FileExt, OpenOptionsExt},
	path::{Path, PathBuf},
};

/// Mode of the backing file allocated by a create
const CONTENT_MODE: u32 = 0o644;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
	Read,
	ReadWrite,
}

pub trait ContentStore: Send + Sync {
	fn stat(&self, name: &str) -> Result<EntryAttr, FileIOError>;

	fn open(&self, name: &str, access: Access) -> Result<ContentHandle, FileIOError>;

	/// Creates the backing file, truncating any leftover content.
	fn create(&self, name: &str) -> Result<ContentHandle, FileIOError>;

	fn truncate(&self, name: &str, len: u64) -> Result<(), FileIOError>;

	/// Names the store uses for itself and which therefore cannot be given
	/// to a tag or a file.
	fn is_reserved(&self, name: &str) -> bool;
}

/// An open backing file.
#[derive(Debug)]
pub struct ContentHandle {
	file: File,
}

impl ContentHandle {
	#[must_use]
	pub const fn new(file: File) -> Self {
		Self { file }
	}

	pub fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
		self.file.read_at(buf, offset)
	}

	pub fn write_at(&self, buf: &[u8], offset: u64) -> io::Result<usize> {
		self.file.write_at(buf, offset)
	}

	pub fn set_len(&self, len: u64) -> io::Result<()> {
		self.file.set_len(len)
	}

	pub fn sync(&self, datasync: bool) -> io::Result<()> {
		if datasync {
			self.file.sync_data()
		} else {
			self.file.sync_all()
		}
	}

	pub fn attr(&self) -> io::Result<EntryAttr> {
		self.file.metadata().map(|metadata| EntryAttr::from_metadata(&metadata))
	}
}

/// Content store rooted at the data directory; each File is a plain file
/// named after it.
#[derive(Debug, Clone)]
pub struct DataDir {
	root: PathBuf,
}

impl DataDir {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	#[must_use]
	pub fn root(&self) -> &Path {
		&self.root
	}

	fn path_of(&self, name: &str) -> PathBuf {
		self.root.join(name)
	}
}

impl ContentStore for DataDir {
	fn stat(&self, name: &str) -> Result<EntryAttr, FileIOError> {
		let path = self.path_of(name);
		fs::metadata(&path)
			.and_then(regular_file)
			.map(|metadata| EntryAttr::from_metadata(&metadata))
			.map_err(|e| FileIOError::from_std_io_err_with_msg(path, e, "stat"))
	}

	fn open(&self, name: &str, access: Access) -> Result<ContentHandle, FileIOError> {
		let path = self.path_of(name);
		OpenOptions::new()
			.read(true)
			.write(access == Access::ReadWrite)
			.open(&path)
			.and_then(|file| {
				regular_file(file.metadata()?)?;
				Ok(ContentHandle::new(file))
			})
			.map_err(|e| FileIOError::from_std_io_err_with_msg(path, e, "open"))
	}

	fn create(&self, name: &str) -> Result<ContentHandle, FileIOError> {
		let path = self.path_of(name);
		OpenOptions::new()
			.read(true)
			.write(true)
			.create(true)
			.truncate(true)
			.mode(CONTENT_MODE)
			.open(&path)
			.map(ContentHandle::new)
			.map_err(|e| FileIOError::from_std_io_err_with_msg(path, e, "create"))
	}

	fn truncate(&self, name: &str, len: u64) -> Result<(), FileIOError> {
		let path = self.path_of(name);
		OpenOptions::new()
			.write(true)
			.open(&path)
			.and_then(|file| file.set_len(len))
			.map_err(|e| FileIOError::from_std_io_err_with_msg(path, e, "truncate"))
	}

	fn is_reserved(&self, name: &str) -> bool {
		name == STATE_DIR_NAME
	}
}

/// Content is always a plain file; anything else under a File's name was put
/// there behind the store's back.
fn regular_file(metadata: Metadata) -> io::Result<Metadata> {
	if metadata.is_file() {
		Ok(metadata)
	} else {
		Err(io::Error::other("backing entry is not a regular file"))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn create_truncates_and_round_trips_content() {
		let dir = tempfile::tempdir().unwrap();
		let store = DataDir::new(dir.path());
		fs::write(dir.path().join("report.txt"), b"stale content").unwrap();

		let handle = store.create("report.txt").unwrap();
		assert_eq!(handle.attr().unwrap().size, 0);

		assert_eq!(handle.write_at(b"fresh", 0).unwrap(), 5);
		handle.sync(true).unwrap();

		let reader = store.open("report.txt", Access::Read).unwrap();
		let mut buf = [0; 16];
		let read = reader.read_at(&mut buf, 0).unwrap();
		assert_eq!(&buf[..read], b"fresh");
		assert_eq!(store.stat("report.txt").unwrap().size, 5);
	}

	#[test]
	fn truncate_resizes_backing_file() {
		let dir = tempfile::tempdir().unwrap();
		let store = DataDir::new(dir.path());
		fs::write(dir.path().join("log.txt"), b"0123456789").unwrap();

		store.truncate("log.txt", 4).unwrap();
		assert_eq!(store.stat("log.txt").unwrap().size, 4);
	}

	#[test]
	fn missing_content_reports_os_error() {
		let dir = tempfile::tempdir().unwrap();
		let store = DataDir::new(dir.path());

		let err = store.stat("ghost").unwrap_err();
		assert_eq!(err.raw_os_error(), Some(libc::ENOENT));
		assert!(store.open("ghost", Access::Read).is_err());
	}

	#[test]
	fn state_directory_is_reserved() {
		let store = DataDir::new("/tmp");
		assert!(store.is_reserved(".tagfs"));
		assert!(!store.is_reserved("tagfs"));
	}

	#[test]
	fn directories_are_not_content() {
		let dir = tempfile::tempdir().unwrap();
		let store = DataDir::new(dir.path());
		fs::create_dir(dir.path().join("clash")).unwrap();

		assert!(store.stat("clash").is_err());
		assert!(store.open("clash", Access::Read).is_err());
		assert!(store.create("clash").is_err());
	}
}
