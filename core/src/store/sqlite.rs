use super::{FileId, Inserted, StoreError, TagId, TagStore};
use crate::path::TagSet;

use tagfs_utils::{
	db::{self, MigrationError},
	error::FileIOError,
};

use std::{fmt, path::Path, rc::Rc};

use parking_lot::Mutex;
use rusqlite::{
	ffi, types::Value, vtab::array::Array, Connection, OptionalExtension, Params,
	TransactionBehavior,
};
use tracing::trace;

const GET_TAG: &str = "SELECT id FROM tags WHERE name = ?1";

const GET_FILE: &str = "SELECT id FROM files WHERE name = ?1";

const HAS_FILE_TAGS: &str = "
	SELECT EXISTS (
		SELECT 1 FROM files f
		WHERE f.name = ?1 AND (
			SELECT COUNT(*) FROM file_tags ft
			JOIN tags t ON t.id = ft.tag_id
			WHERE ft.file_id = f.id AND t.name IN rarray(?2)
		) = ?3
	)";

const GET_USED_TAGS: &str = "
	SELECT DISTINCT t.name FROM tags t
	JOIN file_tags ft ON ft.tag_id = t.id";

const GET_TAGS_NARROWING: &str = "
	SELECT DISTINCT t.name FROM tags t
	JOIN file_tags ft ON ft.tag_id = t.id
	WHERE t.name NOT IN rarray(?1) AND ft.file_id IN (
		SELECT m.file_id FROM file_tags m
		JOIN tags mt ON mt.id = m.tag_id
		WHERE mt.name IN rarray(?1)
		GROUP BY m.file_id
		HAVING COUNT(*) = ?2
	)";

const GET_FILES: &str = "SELECT name FROM files";

const GET_FILES_IN_TAGS: &str = "
	SELECT f.name FROM files f
	JOIN file_tags ft ON ft.file_id = f.id
	JOIN tags t ON t.id = ft.tag_id
	WHERE t.name IN rarray(?1)
	GROUP BY f.id
	HAVING COUNT(*) = ?2";

const NAME_IN_FILES: &str = "SELECT EXISTS (SELECT 1 FROM files WHERE name = ?1)";

const NAME_IN_TAGS: &str = "SELECT EXISTS (SELECT 1 FROM tags WHERE name = ?1)";

const INSERT_TAG: &str = "INSERT INTO tags (name) VALUES (?1)";

const INSERT_FILE: &str = "INSERT INTO files (name) VALUES (?1)";

const ADD_TAGS_TO_FILE: &str = "
	INSERT INTO file_tags (file_id, tag_id)
	SELECT ?1, id FROM tags WHERE name IN rarray(?2)";

/// [`TagStore`] backed by a single SQLite connection.
///
/// Tag sets are bound as one `rarray()` parameter. Statements come from the
/// connection's statement cache and are reset when they go out of scope, on
/// every exit path.
pub struct SqliteTagStore {
	conn: Mutex<Connection>,
}

impl fmt::Debug for SqliteTagStore {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SqliteTagStore").finish_non_exhaustive()
	}
}

impl SqliteTagStore {
	pub fn open(path: impl AsRef<Path>) -> Result<Self, MigrationError> {
		db::open_and_migrate(path).map(Self::from_connection)
	}

	pub fn open_in_memory() -> Result<Self, MigrationError> {
		db::open_in_memory_and_migrate().map(Self::from_connection)
	}

	/// Wraps a connection that already went through [`db::open_and_migrate`].
	#[must_use]
	pub fn from_connection(conn: Connection) -> Self {
		Self {
			conn: Mutex::new(conn),
		}
	}

	fn with_conn<T>(
		&self,
		f: impl FnOnce(&mut Connection) -> Result<T, StoreError>,
	) -> Result<T, StoreError> {
		f(&mut self.conn.lock())
	}

	fn lookup_id(&self, sql: &str, name: &str) -> Result<Option<i64>, StoreError> {
		self.with_conn(|conn| {
			conn.prepare_cached(sql)?
				.query_row([name], |row| row.get(0))
				.optional()
				.map_err(Into::into)
		})
	}

	fn names(&self, sql: &str, params: impl Params) -> Result<Vec<String>, StoreError> {
		self.with_conn(|conn| {
			let mut stmt = conn.prepare_cached(sql)?;
			let names = stmt
				.query_map(params, |row| row.get(0))?
				.collect::<Result<Vec<String>, _>>()?;
			Ok(names)
		})
	}
}

fn as_array(tags: &TagSet<'_>) -> Array {
	Rc::new(tags.iter().map(|tag| Value::from(tag.to_owned())).collect())
}

fn set_len(tags: &TagSet<'_>) -> i64 {
	i64::try_from(tags.len()).unwrap_or(i64::MAX)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
	err.sqlite_error().is_some_and(|e| {
		e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
			|| e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
	})
}

/// Inserts `name` into either table, unless one of them already holds it.
/// Both checks and the insert run inside one IMMEDIATE transaction, so two
/// writers racing on the same name cannot both succeed.
fn insert_unique(
	conn: &mut Connection,
	name: &str,
	insert: &str,
	then: impl FnOnce(&rusqlite::Transaction<'_>, i64) -> Result<(), StoreError>,
) -> Result<Inserted<i64>, StoreError> {
	let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

	for check in [NAME_IN_TAGS, NAME_IN_FILES] {
		let taken: bool = tx.prepare_cached(check)?.query_row([name], |row| row.get(0))?;
		if taken {
			return Ok(Inserted::NameTaken);
		}
	}

	match tx.prepare_cached(insert)?.execute([name]) {
		Ok(_) => {}
		Err(e) if is_unique_violation(&e) => return Ok(Inserted::NameTaken),
		Err(e) => return Err(e.into()),
	}

	let id = tx.last_insert_rowid();
	then(&tx, id)?;
	tx.commit()?;

	Ok(Inserted::Created(id))
}

impl TagStore for SqliteTagStore {
	fn tag_id(&self, name: &str) -> Result<Option<TagId>, StoreError> {
		self.lookup_id(GET_TAG, name).map(|id| id.map(TagId))
	}

	fn file_id(&self, name: &str) -> Result<Option<FileId>, StoreError> {
		self.lookup_id(GET_FILE, name).map(|id| id.map(FileId))
	}

	fn file_has_all_tags(&self, file: &str, tags: &TagSet<'_>) -> Result<bool, StoreError> {
		self.with_conn(|conn| {
			conn.prepare_cached(HAS_FILE_TAGS)?
				.query_row(
					(file, as_array(tags), set_len(tags)),
					|row| row.get(0),
				)
				.map_err(Into::into)
		})
	}

	fn narrowing_tags(&self, tags: &TagSet<'_>) -> Result<Vec<String>, StoreError> {
		if tags.is_empty() {
			self.names(GET_USED_TAGS, [])
		} else {
			self.names(GET_TAGS_NARROWING, (as_array(tags), set_len(tags)))
		}
	}

	fn member_files(&self, tags: &TagSet<'_>) -> Result<Vec<String>, StoreError> {
		if tags.is_empty() {
			self.names(GET_FILES, [])
		} else {
			self.names(GET_FILES_IN_TAGS, (as_array(tags), set_len(tags)))
		}
	}

	fn insert_tag(&self, name: &str) -> Result<Inserted<TagId>, StoreError> {
		let inserted = self.with_conn(|conn| insert_unique(conn, name, INSERT_TAG, |_, _| Ok(())))?;
		trace!(%name, ?inserted, "Inserted tag");

		Ok(match inserted {
			Inserted::Created(id) => Inserted::Created(TagId(id)),
			Inserted::NameTaken => Inserted::NameTaken,
		})
	}

	fn insert_file(
		&self,
		name: &str,
		tags: &TagSet<'_>,
		allocate: &mut dyn FnMut() -> Result<(), FileIOError>,
	) -> Result<Inserted<FileId>, StoreError> {
		let inserted = self.with_conn(|conn| {
			insert_unique(conn, name, INSERT_FILE, |tx, file_id| {
				let linked = tx
					.prepare_cached(ADD_TAGS_TO_FILE)?
					.execute((file_id, as_array(tags)))?;

				// Dropping the transaction rolls the file insert back.
				if linked != tags.len() {
					return Err(StoreError::PartialTagging {
						file: name.into(),
						expected: tags.len(),
						linked,
					});
				}

				allocate().map_err(Into::into)
			})
		})?;
		trace!(%name, ?inserted, tags = tags.len(), "Inserted file");

		Ok(match inserted {
			Inserted::Created(id) => Inserted::Created(FileId(id)),
			Inserted::NameTaken => Inserted::NameTaken,
		})
	}
}
