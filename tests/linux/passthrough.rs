use std::ffi::{OsStr, OsString};
use std::fs;
use std::os::unix::fs::symlink;
use std::path::Path;
use std::sync::Arc;

use fatmirror::passthrough::mount::build_filesystem;
use fatmirror::{MountConfig, Passthrough, SharedMapper};
use fuse3::FileType;

fn scratch_tree() -> tempfile::TempDir {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = temp.path();
    fs::write(root.join("b.txt"), b"plain").unwrap();
    fs::write(root.join("a?.txt"), b"question").unwrap();
    fs::write(root.join("a*.txt"), b"star").unwrap();
    fs::create_dir(root.join("dir:x")).unwrap();
    fs::write(root.join("dir:x").join("inner?.md"), b"nested").unwrap();
    symlink("a?.txt", root.join("link:")).unwrap();
    temp
}

fn mirror(root: &Path) -> Passthrough {
    Passthrough::new(root, Arc::new(SharedMapper::default()))
}

fn names(pt: &Passthrough, dir: &str) -> Vec<OsString> {
    pt.list_dir(OsStr::new(dir))
        .expect("list_dir")
        .into_iter()
        .map(|e| e.name)
        .collect()
}

#[test]
fn listing_is_sorted_and_translated() {
    let temp = scratch_tree();
    let pt = mirror(temp.path());
    let listed = pt.list_dir(OsStr::new("/")).unwrap();
    let originals: Vec<_> = listed.iter().map(|e| e.original.clone()).collect();
    assert_eq!(originals, ["a*.txt", "a?.txt", "b.txt", "dir:x", "link:"]);
    let translated: Vec<_> = listed.iter().map(|e| e.name.clone()).collect();
    assert_eq!(translated, ["a_.txt", "a_1.txt", "b.txt", "dir_x", "link_"]);
    assert_eq!(listed[3].kind, FileType::Directory);
    assert_eq!(listed[4].kind, FileType::Symlink);

    assert_eq!(names(&pt, "/"), translated);
}

#[test]
fn translated_paths_reach_original_files() {
    let temp = scratch_tree();
    let pt = mirror(temp.path());
    names(&pt, "/");
    assert_eq!(names(&pt, "/dir_x"), ["inner_.md"]);

    assert_eq!(pt.on_disk_path(OsStr::new("/a_1.txt")), temp.path().join("a?.txt"));
    assert_eq!(
        pt.on_disk_path(OsStr::new("/dir_x/inner_.md")),
        temp.path().join("dir:x").join("inner?.md")
    );
    assert_eq!(pt.on_disk_path(OsStr::new("/")), temp.path());

    let attr = pt.stat_path(OsStr::new("/dir_x/inner_.md")).unwrap();
    assert_eq!(attr.size, 6);
    assert_eq!(attr.kind, FileType::RegularFile);

    let link = pt.stat_path(OsStr::new("/link_")).unwrap();
    assert_eq!(link.kind, FileType::Symlink);
    assert_eq!(pt.read_link(OsStr::new("/link_")).unwrap(), "a?.txt");
}

#[test]
fn native_errors_pass_through() {
    let temp = scratch_tree();
    let pt = mirror(temp.path());
    let err = pt.stat_path(OsStr::new("/missing")).unwrap_err();
    assert_eq!(err.raw_os_error(), Some(libc::ENOENT));

    let err = pt.read_link(OsStr::new("/b.txt")).unwrap_err();
    assert_eq!(err.raw_os_error(), Some(libc::EINVAL));

    let err = pt.list_dir(OsStr::new("/b.txt")).unwrap_err();
    assert_eq!(err.raw_os_error(), Some(libc::ENOTDIR));
}

#[test]
fn open_read_flush_fsync_release() {
    let temp = scratch_tree();
    let pt = mirror(temp.path());
    names(&pt, "/");

    let fh = pt.open_file(OsStr::new("/a_.txt"), libc::O_RDONLY as u32).unwrap();
    assert_eq!(pt.open_handles(), 1);
    assert_eq!(pt.read_handle(fh, 0, 64).unwrap(), b"star");
    assert_eq!(pt.read_handle(fh, 2, 1).unwrap(), b"a");
    assert!(pt.read_handle(fh, 100, 8).unwrap().is_empty());
    assert_eq!(pt.handle_attr(fh).unwrap().size, 4);

    pt.flush_handle(fh).unwrap();
    pt.fsync_handle(fh, true).unwrap();
    pt.fsync_handle(fh, false).unwrap();

    pt.release_handle(fh).unwrap();
    assert_eq!(pt.open_handles(), 0);
    let err = pt.read_handle(fh, 0, 1).unwrap_err();
    assert_eq!(err.raw_os_error(), Some(libc::EBADF));
    assert!(pt.release_handle(fh).is_err());
}

#[test]
fn open_is_read_only() {
    let temp = scratch_tree();
    let pt = mirror(temp.path());
    for flags in [libc::O_WRONLY, libc::O_RDWR, libc::O_RDONLY | libc::O_TRUNC] {
        let err = pt.open_file(OsStr::new("/b.txt"), flags as u32).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EROFS));
    }
    assert_eq!(pt.open_handles(), 0);
    assert_eq!(fs::read(temp.path().join("b.txt")).unwrap(), b"plain");
}

#[test]
fn failed_open_leaves_no_handle() {
    let temp = scratch_tree();
    let pt = mirror(temp.path());
    let err = pt.open_file(OsStr::new("/nope"), libc::O_RDONLY as u32).unwrap_err();
    assert_eq!(err.raw_os_error(), Some(libc::ENOENT));
    assert_eq!(pt.open_handles(), 0);
}

#[test]
fn exhausted_entry_is_hidden_not_fatal() {
    let temp = tempfile::tempdir().unwrap();
    for a in ['?', '*', ':'] {
        for b in ['?', '*', ':'] {
            fs::write(temp.path().join(format!("n{a}{b}")), b"").unwrap();
        }
    }
    fs::write(temp.path().join("n_?"), b"").unwrap();
    fs::write(temp.path().join("n__"), b"").unwrap();
    fs::write(temp.path().join("ok.txt"), b"").unwrap();

    let pt = mirror(temp.path());
    let listed = names(&pt, "/");
    // n__ keeps its own name, nine originals take n__1..n__9, n_? is hidden.
    assert_eq!(listed.len(), 11);
    assert!(listed.contains(&OsString::from("n__")));
    assert!(listed.contains(&OsString::from("n__9")));
    assert_ne!(pt.mapper().resolve_original(OsStr::new("/n__9")), "/n_?");
    assert!(listed.contains(&OsString::from("ok.txt")));
    assert_eq!(pt.on_disk_path(OsStr::new("/n__")), temp.path().join("n__"));

    // Unchanged directory, unchanged listing.
    assert_eq!(names(&pt, "/"), listed);
}

#[test]
fn real_file_created_later_takes_back_its_name() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("a?.txt"), b"mapped").unwrap();
    let pt = mirror(temp.path());
    assert_eq!(names(&pt, "/"), ["a_.txt"]);

    fs::write(temp.path().join("a_.txt"), b"real").unwrap();
    let listed = names(&pt, "/");
    assert_eq!(listed, ["a_.txt"]);

    let fh = pt.open_file(OsStr::new("/a_.txt"), libc::O_RDONLY as u32).unwrap();
    assert_eq!(pt.read_handle(fh, 0, 16).unwrap(), b"real");
    pt.release_handle(fh).unwrap();

    // Removing the real file does not hand the name back to a?.txt.
    fs::remove_file(temp.path().join("a_.txt")).unwrap();
    assert!(names(&pt, "/").is_empty());
}

#[test]
fn lookup_only_resolves_names_already_listed() {
    let temp = scratch_tree();
    let pt = mirror(temp.path());
    // Names are handed out by listings; a lookup never creates a mapping.
    let err = pt.stat_path(OsStr::new("/dir_x")).unwrap_err();
    assert_eq!(err.raw_os_error(), Some(libc::ENOENT));
    assert!(pt.stat_path(OsStr::new("/dir:x")).is_ok());

    names(&pt, "/");
    assert!(pt.stat_path(OsStr::new("/dir_x")).is_ok());
}

#[test]
fn build_filesystem_uses_configured_table() {
    let root = scratch_tree();
    fs::write(root.path().join("x<y"), b"").unwrap();
    let mnt = tempfile::tempdir().unwrap();
    let config = MountConfig::builder(mnt.path())
        .root(root.path())
        .extra_illegal("<")
        .build()
        .unwrap();
    let pt = build_filesystem(&config);
    assert!(names(&pt, "/").contains(&OsString::from("x_y")));
    assert_eq!(pt.root(), root.path());
}
