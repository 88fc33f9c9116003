//! Every operation that consults a failing tag store reports an I/O failure

mod helpers;

use helpers::{broken_space, kind_of};

use tagfs_core::{EntryKind, ErrorKind};

#[test]
fn attributes_of_a_tag_path_fail() {
	let (_dir, fs) = broken_space();
	assert_eq!(kind_of(fs.attributes("/photo")), ErrorKind::IoFailure);
	assert_eq!(kind_of(fs.attributes("/photo/img.jpg")), ErrorKind::IoFailure);
}

#[test]
fn root_attributes_need_no_store() {
	let (_dir, fs) = broken_space();
	assert_eq!(fs.attributes("/").unwrap().kind, EntryKind::Directory);
}

#[test]
fn listings_fail_as_a_whole() {
	let (_dir, fs) = broken_space();
	assert_eq!(kind_of(fs.list("/")), ErrorKind::IoFailure);
	assert_eq!(kind_of(fs.list("/photo")), ErrorKind::IoFailure);
}

#[test]
fn creations_fail_without_leaving_content() {
	let (dir, fs) = broken_space();
	assert_eq!(kind_of(fs.make_tag("/photo")), ErrorKind::IoFailure);
	assert_eq!(kind_of(fs.make_file("/img.jpg")), ErrorKind::IoFailure);
	assert!(!dir.path().join("img.jpg").exists());
}

#[test]
fn opens_fail() {
	let (dir, fs) = broken_space();
	std::fs::write(dir.path().join("img.jpg"), b"pixels").unwrap();

	assert_eq!(kind_of(fs.open_for_read("/img.jpg")), ErrorKind::IoFailure);
	assert_eq!(kind_of(fs.open_for_write("/img.jpg")), ErrorKind::IoFailure);
	assert_eq!(kind_of(fs.truncate("/img.jpg", 0)), ErrorKind::IoFailure);
}

#[test]
fn failures_map_to_eio() {
	let (_dir, fs) = broken_space();
	assert_eq!(fs.list("/").unwrap_err().errno(), libc::EIO);
}
