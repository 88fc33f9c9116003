#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::cast_lossless,
	clippy::cast_possible_truncation,
	clippy::cast_possible_wrap,
	clippy::cast_precision_loss,
	clippy::cast_sign_loss,
	clippy::dbg_macro,
	clippy::deprecated_cfg_attr,
	clippy::separated_literal_suffix,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

//! Tag-path resolution and query engine.
//!
//! A file is reachable under any path whose components are a subset of the
//! tags assigned to it, in any order. [`TagFs`] turns a virtual path into an
//! order-independent tag set, decides whether it names a directory (a tag
//! intersection) or a file, lists directories and validates the creation of
//! new tags and files.

pub mod attr;
pub mod classify;
pub mod content;
pub mod context;
pub mod error;
pub mod listing;
pub mod mutation;
pub mod open;
pub mod path;
pub mod resolve;
pub mod store;

pub use attr::{EntryAttr, EntryKind, Owner};
pub use classify::Classification;
pub use content::{Access, ContentHandle, ContentStore, DataDir};
pub use context::{OpenError, TagFs};
pub use error::{CoreError, ErrorKind};
pub use listing::DirEntry;
pub use path::{TagSet, VirtualPath};
pub use store::{sqlite::SqliteTagStore, FileId, Inserted, StoreError, TagId, TagStore};
