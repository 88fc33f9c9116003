use std::{
	fs::Metadata,
	os::unix::fs::MetadataExt,
	time::{Duration, SystemTime, UNIX_EPOCH},
};

/// Permission bits reported for every tag directory, including the root
pub const DIRECTORY_PERM: u16 = 0o755;
/// Permission bits reported for files in directory listings
pub const FILE_PERM: u16 = 0o644;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
	Directory,
	RegularFile,
}

/// Owner reported for entries that have no backing inode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
	pub uid: u32,
	pub gid: u32,
}

impl Owner {
	/// The owner of an existing path, usually the data directory.
	#[must_use]
	pub fn of(metadata: &Metadata) -> Self {
		Self {
			uid: metadata.uid(),
			gid: metadata.gid(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryAttr {
	pub kind: EntryKind,
	pub perm: u16,
	pub nlink: u32,
	pub size: u64,
	pub blocks: u64,
	pub uid: u32,
	pub gid: u32,
	pub atime: SystemTime,
	pub mtime: SystemTime,
	pub ctime: SystemTime,
}

impl EntryAttr {
	/// Attributes of the root and of every tag intersection. Tags have no
	/// backing inode, so nothing is stat'ed.
	#[must_use]
	pub const fn synthetic_directory(owner: Owner) -> Self {
		Self::synthetic(EntryKind::Directory, DIRECTORY_PERM, 2, owner)
	}

	/// Attributes used for files in directory listings, where stat'ing every
	/// member would be too slow.
	#[must_use]
	pub const fn synthetic_file(owner: Owner) -> Self {
		Self::synthetic(EntryKind::RegularFile, FILE_PERM, 1, owner)
	}

	const fn synthetic(kind: EntryKind, perm: u16, nlink: u32, owner: Owner) -> Self {
		Self {
			kind,
			perm,
			nlink,
			size: 0,
			blocks: 0,
			uid: owner.uid,
			gid: owner.gid,
			atime: UNIX_EPOCH,
			mtime: UNIX_EPOCH,
			ctime: UNIX_EPOCH,
		}
	}

	/// Real attributes of a file's backing content. Whatever backs it, a File
	/// is always reported as a regular file.
	#[must_use]
	#[allow(clippy::cast_possible_truncation)] // mode is masked to 12 bits
	pub fn from_metadata(metadata: &Metadata) -> Self {
		Self {
			kind: EntryKind::RegularFile,
			perm: (metadata.mode() & 0o7777) as u16,
			nlink: u32::try_from(metadata.nlink()).unwrap_or(u32::MAX),
			size: metadata.size(),
			blocks: metadata.blocks(),
			uid: metadata.uid(),
			gid: metadata.gid(),
			atime: timestamp(metadata.atime(), metadata.atime_nsec()),
			mtime: timestamp(metadata.mtime(), metadata.mtime_nsec()),
			ctime: timestamp(metadata.ctime(), metadata.ctime_nsec()),
		}
	}
}

fn timestamp(secs: i64, nsecs: i64) -> SystemTime {
	match (u64::try_from(secs), u32::try_from(nsecs)) {
		(Ok(secs), Ok(nsecs)) => UNIX_EPOCH + Duration::new(secs, nsecs),
		_ => UNIX_EPOCH,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn synthetic_entries_use_fixed_modes() {
		let owner = Owner { uid: 1000, gid: 100 };

		let dir = EntryAttr::synthetic_directory(owner);
		assert_eq!(dir.kind, EntryKind::Directory);
		assert_eq!((dir.perm, dir.nlink), (0o755, 2));

		let file = EntryAttr::synthetic_file(owner);
		assert_eq!(file.kind, EntryKind::RegularFile);
		assert_eq!((file.perm, file.nlink), (0o644, 1));
		assert_eq!((file.uid, file.gid), (1000, 100));
	}

	#[test]
	fn real_attributes_come_from_metadata() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("notes.txt");
		std::fs::write(&path, b"hello").unwrap();

		let attr = EntryAttr::from_metadata(&std::fs::metadata(&path).unwrap());
		assert_eq!(attr.kind, EntryKind::RegularFile);
		assert_eq!(attr.size, 5);
		assert_eq!(attr.nlink, 1);
		assert!(attr.mtime > UNIX_EPOCH);
	}
}
