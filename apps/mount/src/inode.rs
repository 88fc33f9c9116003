//! Inode numbers for virtual paths.
//!
//! The kernel addresses entries by inode while the tag space is addressed by
//! path. Each distinct path gets its own inode, so two permutations of the
//! same tags are two inodes for one directory.

use std::collections::HashMap;

use fuser::FUSE_ROOT_ID;

#[derive(Debug)]
struct Node {
	path: String,
	lookups: u64,
}

#[derive(Debug)]
pub struct InodeTable {
	nodes: HashMap<u64, Node>,
	inos: HashMap<String, u64>,
	next_ino: u64,
}

impl Default for InodeTable {
	fn default() -> Self {
		Self::new()
	}
}

impl InodeTable {
	pub fn new() -> Self {
		let mut table = Self {
			nodes: HashMap::new(),
			inos: HashMap::new(),
			next_ino: FUSE_ROOT_ID + 1,
		};
		table.nodes.insert(
			FUSE_ROOT_ID,
			Node {
				path: String::from("/"),
				lookups: 1,
			},
		);
		table.inos.insert(String::from("/"), FUSE_ROOT_ID);
		table
	}

	pub fn path(&self, ino: u64) -> Option<&str> {
		self.nodes.get(&ino).map(|node| node.path.as_str())
	}

	/// The inode for `path`, allocating one if needed, without taking a
	/// kernel reference on it.
	pub fn assign(&mut self, path: String) -> u64 {
		if let Some(&ino) = self.inos.get(&path) {
			return ino;
		}

		let ino = self.next_ino;
		self.next_ino += 1;
		self.inos.insert(path.clone(), ino);
		self.nodes.insert(ino, Node { path, lookups: 0 });
		ino
	}

	/// Same as [`Self::assign`], counting one kernel reference on the inode.
	pub fn lookup(&mut self, path: String) -> u64 {
		let ino = self.assign(path);
		if let Some(node) = self.nodes.get_mut(&ino) {
			node.lookups += 1;
		}
		ino
	}

	/// Drops `nlookup` kernel references, freeing the inode once none remain.
	pub fn forget(&mut self, ino: u64, nlookup: u64) {
		if let Some(node) = self.nodes.get_mut(&ino) {
			node.lookups = node.lookups.saturating_sub(nlookup);
		}
		self.prune(ino);
	}

	/// Frees the inode if the kernel holds no reference on it.
	pub fn prune(&mut self, ino: u64) {
		if ino == FUSE_ROOT_ID {
			return;
		}

		if self.nodes.get(&ino).is_some_and(|node| node.lookups == 0) {
			if let Some(node) = self.nodes.remove(&ino) {
				self.inos.remove(&node.path);
			}
		}
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}
}

pub fn child_path(parent: &str, name: &str) -> String {
	if parent == "/" {
		format!("/{name}")
	} else {
		format!("{parent}/{name}")
	}
}

/// The path one component up, the root being its own parent.
pub fn parent_path(path: &str) -> &str {
	match path.rfind('/') {
		Some(0) | None => "/",
		Some(idx) => &path[..idx],
	}
}
