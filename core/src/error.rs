use crate::store::StoreError;

use tagfs_utils::error::FileIOError;

use thiserror::Error;

/// The four outcomes a failed operation can be classified as, one per POSIX error code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	NotFound,
	AlreadyExists,
	IsADirectory,
	IoFailure,
}

#[derive(Error, Debug)]
pub enum CoreError {
	#[error("no such tag or file: <name='{0}'>")]
	NotFound(Box<str>),
	#[error("name already in use: <name='{0}'>")]
	AlreadyExists(Box<str>),
	#[error("operation targets a directory: <path='{0}'>")]
	IsADirectory(Box<str>),
	#[error("tag store failure: {0}")]
	Store(#[from] StoreError),
	#[error(transparent)]
	Content(#[from] FileIOError),
}

impl CoreError {
	pub(crate) fn not_found(name: &str) -> Self {
		Self::NotFound(name.into())
	}

	pub(crate) fn already_exists(name: &str) -> Self {
		Self::AlreadyExists(name.into())
	}

	#[must_use]
	pub const fn kind(&self) -> ErrorKind {
		match self {
			Self::NotFound(_) => ErrorKind::NotFound,
			Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
			Self::IsADirectory(_) => ErrorKind::IsADirectory,
			Self::Store(_) | Self::Content(_) => ErrorKind::IoFailure,
		}
	}

	/// The POSIX error code reported at the filesystem boundary
	#[must_use]
	pub const fn errno(&self) -> libc::c_int {
		match self.kind() {
			ErrorKind::NotFound => libc::ENOENT,
			ErrorKind::AlreadyExists => libc::EEXIST,
			ErrorKind::IsADirectory => libc::EISDIR,
			ErrorKind::IoFailure => libc::EIO,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn kinds_map_to_posix_codes() {
		assert_eq!(CoreError::not_found("a").errno(), libc::ENOENT);
		assert_eq!(CoreError::already_exists("a").errno(), libc::EEXIST);
		assert_eq!(CoreError::IsADirectory("/".into()).errno(), libc::EISDIR);

		let io = CoreError::from(FileIOError::from_std_io_err(
			"missing",
			std::io::Error::from_raw_os_error(libc::ENOSPC),
		));
		assert_eq!(io.kind(), ErrorKind::IoFailure);
		assert_eq!(io.errno(), libc::EIO);
	}
}
