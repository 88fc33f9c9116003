use crate::{
	attr::Owner,
	content::{ContentStore, DataDir},
	store::{sqlite::SqliteTagStore, TagStore},
};

use tagfs_utils::{db::MigrationError, error::FileIOError, DATABASE_FILE_NAME, STATE_DIR_NAME};

use std::{
	fs,
	path::{Path, PathBuf},
	sync::Arc,
};

use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum OpenError {
	#[error("data directory path exists but is not a directory: <path='{}'>", .0.display())]
	NotADirectory(Box<Path>),
	#[error(transparent)]
	FileIO(#[from] FileIOError),
	#[error(transparent)]
	Database(#[from] MigrationError),
}

/// Long-lived context threaded into every operation: the tag store, the
/// real-file store and the owner reported for synthetic entries.
///
/// Operations only take `&self`, so one `TagFs` can serve concurrent
/// requests; the stores do their own locking.
pub struct TagFs {
	pub(crate) store: Arc<dyn TagStore>,
	pub(crate) content: Arc<dyn ContentStore>,
	pub(crate) owner: Owner,
}

impl TagFs {
	pub fn new(store: Arc<dyn TagStore>, content: Arc<dyn ContentStore>, owner: Owner) -> Self {
		Self {
			store,
			content,
			owner,
		}
	}

	/// Opens the tag space kept in `data_dir`, creating the directory and the
	/// database on first use. Synthetic entries are reported as owned by the
	/// owner of `data_dir` unless `owner` says otherwise.
	pub fn open(data_dir: impl AsRef<Path>, owner: Option<Owner>) -> Result<Self, OpenError> {
		let data_dir = data_dir.as_ref();

		match fs::metadata(data_dir) {
			Ok(metadata) if !metadata.is_dir() => {
				return Err(OpenError::NotADirectory(data_dir.into()));
			}
			Ok(_) => {}
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				fs::create_dir_all(data_dir).map_err(|e| {
					FileIOError::from_std_io_err_with_msg(data_dir, e, "create data directory")
				})?;
				info!(path = %data_dir.display(), "Created data directory");
			}
			Err(e) => return Err(FileIOError::from_std_io_err(data_dir, e).into()),
		}

		let state_dir = Self::state_dir(data_dir);
		fs::create_dir_all(&state_dir).map_err(|e| {
			FileIOError::from_std_io_err_with_msg(&state_dir, e, "create state directory")
		})?;

		let owner = match owner {
			Some(owner) => owner,
			None => fs::metadata(data_dir)
				.map(|metadata| Owner::of(&metadata))
				.map_err(|e| FileIOError::from_std_io_err(data_dir, e))?,
		};

		let store = SqliteTagStore::open(state_dir.join(DATABASE_FILE_NAME))?;

		Ok(Self::new(
			Arc::new(store),
			Arc::new(DataDir::new(data_dir)),
			owner,
		))
	}

	/// Where the database, configuration and logs of `data_dir` live.
	#[must_use]
	pub fn state_dir(data_dir: &Path) -> PathBuf {
		data_dir.join(STATE_DIR_NAME)
	}

	#[must_use]
	pub const fn owner(&self) -> Owner {
		self.owner
	}
}
