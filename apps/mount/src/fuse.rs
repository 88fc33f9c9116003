//! FUSE adapter: translates kernel requests on inodes into [`TagFs`]
//! operations on virtual paths.

use crate::inode::{child_path, parent_path, InodeTable};

use tagfs_core::{ContentHandle, CoreError, DirEntry, EntryAttr, EntryKind, Owner, TagFs};

use std::{collections::HashMap, ffi::OsStr, io, time::Duration};

use fuser::{
	consts::FOPEN_DIRECT_IO, FileAttr, FileType, Filesystem, KernelConfig, MountOption,
	ReplyAttr, ReplyCreate, ReplyData, ReplyDirectory, ReplyEmpty, ReplyEntry, ReplyOpen,
	ReplyWrite, Request, TimeOrNow,
};
use tracing::{debug, info, trace, warn};

const BLOCK_SIZE: u32 = 512;

/// Options mapped from `-o` arguments; anything unknown goes to the kernel as is.
pub fn mount_option(option: &str) -> MountOption {
	match option {
		"ro" => MountOption::RO,
		"rw" => MountOption::RW,
		"allow_other" => MountOption::AllowOther,
		"allow_root" => MountOption::AllowRoot,
		"auto_unmount" => MountOption::AutoUnmount,
		"default_permissions" => MountOption::DefaultPermissions,
		"dev" => MountOption::Dev,
		"nodev" => MountOption::NoDev,
		"suid" => MountOption::Suid,
		"nosuid" => MountOption::NoSuid,
		"exec" => MountOption::Exec,
		"noexec" => MountOption::NoExec,
		"atime" => MountOption::Atime,
		"noatime" => MountOption::NoAtime,
		"sync" => MountOption::Sync,
		"async" => MountOption::Async,
		other => MountOption::CUSTOM(other.to_string()),
	}
}

fn file_attr(ino: u64, attr: &EntryAttr) -> FileAttr {
	FileAttr {
		ino,
		size: attr.size,
		blocks: attr.blocks,
		atime: attr.atime,
		mtime: attr.mtime,
		ctime: attr.ctime,
		crtime: attr.ctime,
		kind: file_type(attr.kind),
		perm: attr.perm,
		nlink: attr.nlink,
		uid: attr.uid,
		gid: attr.gid,
		rdev: 0,
		blksize: BLOCK_SIZE,
		flags: 0,
	}
}

const fn file_type(kind: EntryKind) -> FileType {
	match kind {
		EntryKind::Directory => FileType::Directory,
		EntryKind::RegularFile => FileType::RegularFile,
	}
}

fn io_errno(e: &io::Error) -> libc::c_int {
	e.raw_os_error().unwrap_or(libc::EIO)
}

/// The file is already recorded by the time its attributes are read, so a
/// failed stat falls back to what a new, empty file looks like.
fn created_attr(attr: io::Result<EntryAttr>, owner: Owner) -> EntryAttr {
	attr.unwrap_or_else(|e| {
		warn!(?e, "Failed to stat created file, replying with synthetic attributes");
		EntryAttr::synthetic_file(owner)
	})
}

/// A directory listing taken at `opendir`, paged through by `readdir`
struct OpenDir {
	entries: Vec<(u64, FileType, String)>,
}

pub struct TagFsFuse {
	fs: TagFs,
	inodes: InodeTable,
	files: HashMap<u64, ContentHandle>,
	dirs: HashMap<u64, OpenDir>,
	next_fh: u64,
	ttl: Duration,
	open_flags: u32,
}

impl TagFsFuse {
	pub fn new(fs: TagFs, ttl: Duration, direct_io: bool) -> Self {
		Self {
			fs,
			inodes: InodeTable::new(),
			files: HashMap::new(),
			dirs: HashMap::new(),
			next_fh: 1,
			ttl,
			open_flags: if direct_io { FOPEN_DIRECT_IO } else { 0 },
		}
	}

	fn next_fh(&mut self) -> u64 {
		let fh = self.next_fh;
		self.next_fh += 1;
		fh
	}

	fn path(&self, ino: u64) -> Result<String, libc::c_int> {
		self.inodes
			.path(ino)
			.map(ToString::to_string)
			.ok_or(libc::ENOENT)
	}

	fn child(&self, parent: u64, name: &OsStr) -> Result<String, libc::c_int> {
		let name = name.to_str().ok_or(libc::EINVAL)?;
		self.path(parent).map(|parent| child_path(&parent, name))
	}

	fn reply_core_error(op: &str, path: &str, e: &CoreError) -> libc::c_int {
		match e {
			CoreError::NotFound(_) | CoreError::AlreadyExists(_) | CoreError::IsADirectory(_) => {
				trace!(%op, %path, %e, "Request rejected");
			}
			CoreError::Store(_) | CoreError::Content(_) => {
				warn!(%op, %path, %e, "Request failed");
			}
		}
		e.errno()
	}

	fn listing(&mut self, path: &str, entries: Vec<DirEntry>) -> OpenDir {
		let own = self.inodes.assign(path.to_string());
		let parent = self.inodes.assign(parent_path(path).to_string());

		let mut listed = Vec::with_capacity(entries.len() + 2);
		listed.push((own, FileType::Directory, String::from(".")));
		listed.push((parent, FileType::Directory, String::from("..")));
		for entry in entries {
			let ino = self.inodes.assign(child_path(path, &entry.name));
			listed.push((ino, file_type(entry.kind()), entry.name));
		}

		OpenDir { entries: listed }
	}
}

impl Filesystem for TagFsFuse {
	fn init(&mut self, _req: &Request<'_>, _config: &mut KernelConfig) -> Result<(), libc::c_int> {
		info!("Tag space mounted");
		Ok(())
	}

	fn destroy(&mut self) {
		info!(
			open_files = self.files.len(),
			inodes = self.inodes.len(),
			"Tag space unmounted"
		);
	}

	fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
		let path = match self.child(parent, name) {
			Ok(path) => path,
			Err(errno) => return reply.error(errno),
		};

		match self.fs.attributes(&path) {
			Ok(attr) => {
				let ino = self.inodes.lookup(path);
				reply.entry(&self.ttl, &file_attr(ino, &attr), 0);
			}
			Err(e) => reply.error(Self::reply_core_error("lookup", &path, &e)),
		}
	}

	fn forget(&mut self, _req: &Request<'_>, ino: u64, nlookup: u64) {
		self.inodes.forget(ino, nlookup);
	}

	fn getattr(&mut self, _req: &Request<'_>, ino: u64, fh: Option<u64>, reply: ReplyAttr) {
		if let Some(handle) = fh.and_then(|fh| self.files.get(&fh)) {
			return match handle.attr() {
				Ok(attr) => reply.attr(&self.ttl, &file_attr(ino, &attr)),
				Err(e) => reply.error(io_errno(&e)),
			};
		}

		let path = match self.path(ino) {
			Ok(path) => path,
			Err(errno) => return reply.error(errno),
		};

		match self.fs.attributes(&path) {
			Ok(attr) => reply.attr(&self.ttl, &file_attr(ino, &attr)),
			Err(e) => reply.error(Self::reply_core_error("getattr", &path, &e)),
		}
	}

	/// Only size changes are honoured; ownership, mode and times are fixed.
	fn setattr(
		&mut self,
		req: &Request<'_>,
		ino: u64,
		_mode: Option<u32>,
		_uid: Option<u32>,
		_gid: Option<u32>,
		size: Option<u64>,
		_atime: Option<TimeOrNow>,
		_mtime: Option<TimeOrNow>,
		_ctime: Option<std::time::SystemTime>,
		fh: Option<u64>,
		_crtime: Option<std::time::SystemTime>,
		_chgtime: Option<std::time::SystemTime>,
		_bkuptime: Option<std::time::SystemTime>,
		_flags: Option<u32>,
		reply: ReplyAttr,
	) {
		let path = match self.path(ino) {
			Ok(path) => path,
			Err(errno) => return reply.error(errno),
		};

		if let Some(size) = size {
			let resized = match fh.and_then(|fh| self.files.get(&fh)) {
				Some(handle) => handle.set_len(size).map_err(|e| io_errno(&e)),
				None => self
					.fs
					.truncate(&path, size)
					.map_err(|e| Self::reply_core_error("truncate", &path, &e)),
			};

			if let Err(errno) = resized {
				return reply.error(errno);
			}
			debug!(%path, size, "Resized file");
		}

		self.getattr(req, ino, fh, reply);
	}

	fn mkdir(
		&mut self,
		_req: &Request<'_>,
		parent: u64,
		name: &OsStr,
		_mode: u32,
		_umask: u32,
		reply: ReplyEntry,
	) {
		let path = match self.child(parent, name) {
			Ok(path) => path,
			Err(errno) => return reply.error(errno),
		};

		if let Err(e) = self.fs.make_tag(&path) {
			return reply.error(Self::reply_core_error("mkdir", &path, &e));
		}
		info!(%path, "Created tag");

		let attr = EntryAttr::synthetic_directory(self.fs.owner());
		let ino = self.inodes.lookup(path);
		reply.entry(&self.ttl, &file_attr(ino, &attr), 0);
	}

	fn create(
		&mut self,
		_req: &Request<'_>,
		parent: u64,
		name: &OsStr,
		_mode: u32,
		_umask: u32,
		_flags: i32,
		reply: ReplyCreate,
	) {
		let path = match self.child(parent, name) {
			Ok(path) => path,
			Err(errno) => return reply.error(errno),
		};

		let handle = match self.fs.make_file(&path) {
			Ok(handle) => handle,
			Err(e) => return reply.error(Self::reply_core_error("create", &path, &e)),
		};
		info!(%path, "Created file");

		let attr = created_attr(handle.attr(), self.fs.owner());

		let ino = self.inodes.lookup(path);
		let fh = self.next_fh();
		self.files.insert(fh, handle);
		reply.created(&self.ttl, &file_attr(ino, &attr), 0, fh, self.open_flags);
	}

	fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
		let path = match self.path(ino) {
			Ok(path) => path,
			Err(errno) => return reply.error(errno),
		};

		let opened = if flags & libc::O_ACCMODE == libc::O_RDONLY {
			self.fs.open_for_read(&path)
		} else {
			self.fs.open_for_write(&path)
		};

		match opened {
			Ok(handle) => {
				let fh = self.next_fh();
				self.files.insert(fh, handle);
				reply.opened(fh, self.open_flags);
			}
			Err(e) => reply.error(Self::reply_core_error("open", &path, &e)),
		}
	}

	fn read(
		&mut self,
		_req: &Request<'_>,
		_ino: u64,
		fh: u64,
		offset: i64,
		size: u32,
		_flags: i32,
		_lock_owner: Option<u64>,
		reply: ReplyData,
	) {
		let Some(handle) = self.files.get(&fh) else {
			return reply.error(libc::EBADF);
		};
		let Ok(offset) = u64::try_from(offset) else {
			return reply.error(libc::EINVAL);
		};

		let mut buf = vec![0; size as usize];
		match handle.read_at(&mut buf, offset) {
			Ok(read) => reply.data(&buf[..read]),
			Err(e) => {
				warn!(fh, ?e, "Failed to read file content");
				reply.error(io_errno(&e));
			}
		}
	}

	fn write(
		&mut self,
		_req: &Request<'_>,
		_ino: u64,
		fh: u64,
		offset: i64,
		data: &[u8],
		_write_flags: u32,
		_flags: i32,
		_lock_owner: Option<u64>,
		reply: ReplyWrite,
	) {
		let Some(handle) = self.files.get(&fh) else {
			return reply.error(libc::EBADF);
		};
		let Ok(offset) = u64::try_from(offset) else {
			return reply.error(libc::EINVAL);
		};

		match handle.write_at(data, offset) {
			Ok(written) => reply.written(u32::try_from(written).unwrap_or(u32::MAX)),
			Err(e) => {
				warn!(fh, ?e, "Failed to write file content");
				reply.error(io_errno(&e));
			}
		}
	}

	/// Writes go straight to the backing file, nothing is buffered here.
	fn flush(&mut self, _req: &Request<'_>, _ino: u64, fh: u64, _lock_owner: u64, reply: ReplyEmpty) {
		if self.files.contains_key(&fh) {
			reply.ok();
		} else {
			reply.error(libc::EBADF);
		}
	}

	fn fsync(&mut self, _req: &Request<'_>, _ino: u64, fh: u64, datasync: bool, reply: ReplyEmpty) {
		let Some(handle) = self.files.get(&fh) else {
			return reply.error(libc::EBADF);
		};

		match handle.sync(datasync) {
			Ok(()) => reply.ok(),
			Err(e) => {
				warn!(fh, ?e, "Failed to sync file content");
				reply.error(io_errno(&e));
			}
		}
	}

	fn release(
		&mut self,
		_req: &Request<'_>,
		_ino: u64,
		fh: u64,
		_flags: i32,
		_lock_owner: Option<u64>,
		_flush: bool,
		reply: ReplyEmpty,
	) {
		if self.files.remove(&fh).is_some() {
			reply.ok();
		} else {
			reply.error(libc::EBADF);
		}
	}

	fn opendir(&mut self, _req: &Request<'_>, ino: u64, _flags: i32, reply: ReplyOpen) {
		let path = match self.path(ino) {
			Ok(path) => path,
			Err(errno) => return reply.error(errno),
		};

		match self.fs.list(&path) {
			Ok(entries) => {
				let listing = self.listing(&path, entries);
				let fh = self.next_fh();
				trace!(%path, fh, entries = listing.entries.len(), "Opened directory");
				self.dirs.insert(fh, listing);
				reply.opened(fh, 0);
			}
			Err(e) => reply.error(Self::reply_core_error("opendir", &path, &e)),
		}
	}

	fn readdir(
		&mut self,
		_req: &Request<'_>,
		_ino: u64,
		fh: u64,
		offset: i64,
		mut reply: ReplyDirectory,
	) {
		let Some(listing) = self.dirs.get(&fh) else {
			return reply.error(libc::EBADF);
		};
		let Ok(skip) = usize::try_from(offset) else {
			return reply.error(libc::EINVAL);
		};

		for (idx, (ino, kind, name)) in listing.entries.iter().enumerate().skip(skip) {
			let next = i64::try_from(idx + 1).unwrap_or(i64::MAX);
			if reply.add(*ino, next, *kind, name) {
				break;
			}
		}
		reply.ok();
	}

	fn releasedir(&mut self, _req: &Request<'_>, _ino: u64, fh: u64, _flags: i32, reply: ReplyEmpty) {
		let Some(listing) = self.dirs.remove(&fh) else {
			return reply.error(libc::EBADF);
		};

		for (ino, _, _) in listing.entries {
			self.inodes.prune(ino);
		}
		reply.ok();
	}
}
