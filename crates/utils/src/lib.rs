pub mod db;
pub mod error;

/// Name of the hidden directory, inside the data directory, that holds the
/// database, the persisted configuration and the logs.
pub const STATE_DIR_NAME: &str = ".tagfs";

/// File name of the tag database inside [`STATE_DIR_NAME`].
pub const DATABASE_FILE_NAME: &str = "tags.db";
