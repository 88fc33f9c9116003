use std::{path::Path, time::Duration};

use rusqlite::{vtab::array, Connection};
use thiserror::Error;
use tracing::debug;

/// How long a statement waits on a lock held by another connection before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
	CREATE TABLE IF NOT EXISTS tags (
		id   INTEGER PRIMARY KEY,
		name TEXT NOT NULL UNIQUE
	);

	CREATE TABLE IF NOT EXISTS files (
		id   INTEGER PRIMARY KEY,
		name TEXT NOT NULL UNIQUE
	);

	CREATE TABLE IF NOT EXISTS file_tags (
		file_id INTEGER NOT NULL REFERENCES files (id) ON DELETE CASCADE,
		tag_id  INTEGER NOT NULL REFERENCES tags (id) ON DELETE CASCADE,
		UNIQUE (file_id, tag_id)
	);

	CREATE INDEX IF NOT EXISTS file_tags_tag_id ON file_tags (tag_id);
";

/// MigrationError represents an error that occurred while opening and initialising the tag database.
#[derive(Error, Debug)]
pub enum MigrationError {
	#[error("an error occurred while opening the database: <path='{}'>: {source}", .path.display())]
	Open {
		path: Box<Path>,
		#[source]
		source: rusqlite::Error,
	},
	#[error("failed to configure the database connection: {0}")]
	Configure(#[source] rusqlite::Error),
	#[error("failed to load the rarray extension: {0}")]
	LoadArray(#[source] rusqlite::Error),
	#[error("an error occurred during migration: {0}")]
	MigrateFailed(#[source] rusqlite::Error),
}

/// open_and_migrate will open the database at the given path and create the tag schema if needed.
pub fn open_and_migrate(path: impl AsRef<Path>) -> Result<Connection, MigrationError> {
	let path = path.as_ref();
	let conn = Connection::open(path).map_err(|source| MigrationError::Open {
		path: path.into(),
		source,
	})?;

	debug!(path = %path.display(), "Opened tag database");

	migrate(conn)
}

/// Same as [`open_and_migrate`] but backed by a private in-memory database.
pub fn open_in_memory_and_migrate() -> Result<Connection, MigrationError> {
	let conn = Connection::open_in_memory().map_err(|source| MigrationError::Open {
		path: Path::new(":memory:").into(),
		source,
	})?;

	migrate(conn)
}

fn migrate(conn: Connection) -> Result<Connection, MigrationError> {
	conn.busy_timeout(BUSY_TIMEOUT)
		.map_err(MigrationError::Configure)?;
	conn.pragma_update(None, "foreign_keys", true)
		.map_err(MigrationError::Configure)?;
	conn.pragma_update(None, "recursive_triggers", true)
		.map_err(MigrationError::Configure)?;

	// In-memory databases report "memory" here, which is fine.
	let journal_mode: String = conn
		.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
		.map_err(MigrationError::Configure)?;
	debug!(%journal_mode, "Configured journal mode");

	array::load_module(&conn).map_err(MigrationError::LoadArray)?;

	conn.execute_batch(SCHEMA)
		.map_err(MigrationError::MigrateFailed)?;

	Ok(conn)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn table_names(conn: &Connection) -> Vec<String> {
		let mut stmt = conn
			.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
			.unwrap();
		stmt.query_map([], |row| row.get(0))
			.unwrap()
			.collect::<Result<_, _>>()
			.unwrap()
	}

	#[test]
	fn creates_schema_in_memory() {
		let conn = open_in_memory_and_migrate().unwrap();
		assert_eq!(table_names(&conn), ["file_tags", "files", "tags"]);
	}

	#[test]
	fn migration_is_idempotent() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("tags.db");

		{
			let conn = open_and_migrate(&path).unwrap();
			conn.execute("INSERT INTO tags (name) VALUES ('photo')", [])
				.unwrap();
		}

		let conn = open_and_migrate(&path).unwrap();
		let count: i64 = conn
			.query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))
			.unwrap();
		assert_eq!(count, 1);
	}

	#[test]
	fn rarray_is_available() {
		use rusqlite::types::Value;
		use std::rc::Rc;

		let conn = open_in_memory_and_migrate().unwrap();
		let values = Rc::new(vec![Value::from(String::from("a")), Value::from(String::from("b"))]);
		let count: i64 = conn
			.query_row("SELECT COUNT(*) FROM rarray(?1)", [values], |row| row.get(0))
			.unwrap();
		assert_eq!(count, 2);
	}
}
