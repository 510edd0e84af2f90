//! Read-only passthrough filesystem.
//!
//! Every client path is mapped back to its on-disk original before the native
//! call; directory listings are where translated names are handed out.
//! Native errors are returned to the kernel unchanged.

pub mod attr;
pub mod handles;
pub mod mount;
pub mod open_flags;

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::num::NonZeroU32;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use fuse3::path::prelude::*;
use fuse3::path::reply::{DirectoryEntry, DirectoryEntryPlus, FileAttr};
use fuse3::FileType;
use log::{debug, error};

use crate::error::MappingError;
use crate::mapper::PathMapper;
use crate::translate::parser::join;
use crate::translate::resolver::on_disk_path;

use attr::{file_attr_from_metadata, file_type_from_std};
use handles::{HandleTable, OpenFile};
use open_flags::open_options_from_flags;

const ATTR_TTL: Duration = Duration::from_secs(1);
const MAX_WRITE: u32 = 128 * 1024;

/// One visible entry of a directory listing.
#[derive(Debug, Clone)]
pub struct ListedEntry {
    pub name: OsString,
    pub original: OsString,
    pub kind: FileType,
}

pub struct Passthrough {
    root: PathBuf,
    mapper: Arc<dyn PathMapper>,
    handles: HandleTable,
}

impl Passthrough {
    pub fn new(root: impl Into<PathBuf>, mapper: Arc<dyn PathMapper>) -> Self {
        Self {
            root: root.into(),
            mapper,
            handles: HandleTable::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mapper(&self) -> &Arc<dyn PathMapper> {
        &self.mapper
    }

    pub fn open_handles(&self) -> usize {
        self.handles.len()
    }

    pub fn on_disk_path(&self, client_path: &OsStr) -> PathBuf {
        on_disk_path(&self.root, &self.mapper.resolve_original(client_path))
    }

    pub fn stat_path(&self, client_path: &OsStr) -> io::Result<FileAttr> {
        let path = self.on_disk_path(client_path);
        debug!("getattr {:?} -> {}", client_path, path.display());
        let meta = fs::symlink_metadata(&path)?;
        Ok(file_attr_from_metadata(&meta))
    }

    pub fn read_link(&self, client_path: &OsStr) -> io::Result<OsString> {
        let path = self.on_disk_path(client_path);
        Ok(fs::read_link(&path)?.into_os_string())
    }

    /// Entries of `client_dir` in original-name order, under their translated names.
    ///
    /// Entries whose names cannot be disambiguated, or whose earlier name now
    /// belongs to a real sibling, are left out; a broken mapping invariant fails
    /// the whole listing.
    pub fn list_dir(&self, client_dir: &OsStr) -> io::Result<Vec<ListedEntry>> {
        let dir = self.on_disk_path(client_dir);
        debug!("readdir {:?} -> {}", client_dir, dir.display());
        let mut kinds = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            kinds.push((entry.file_name(), file_type_from_std(entry.file_type()?)));
        }
        kinds.sort_by(|a, b| a.0.cmp(&b.0));
        let names = kinds.iter().map(|(name, _)| name.clone()).collect();

        let translated = self.mapper.translate_dir_entries(client_dir, names);
        let mut listed = Vec::with_capacity(translated.len());
        for (entry, (_, kind)) in translated.into_iter().zip(kinds) {
            match entry.result {
                Ok(name) => listed.push(ListedEntry {
                    name,
                    original: entry.original,
                    kind,
                }),
                Err(MappingError::CollisionExhausted { .. } | MappingError::ShadowsSibling { .. }) => {
                    continue;
                }
                Err(err) => {
                    error!("readdir {:?}: {}", client_dir, err);
                    return Err(io::Error::from_raw_os_error(err.errno()));
                }
            }
        }
        Ok(listed)
    }

    pub fn open_file(&self, client_path: &OsStr, flags: u32) -> io::Result<u64> {
        let options = open_options_from_flags(flags)?;
        let path = self.on_disk_path(client_path);
        debug!("open {:?} -> {}", client_path, path.display());
        let file = options.open(&path)?;
        Ok(self.handles.insert(OpenFile { file, path }))
    }

    fn handle(&self, fh: u64) -> io::Result<Arc<OpenFile>> {
        self.handles
            .get(fh)
            .ok_or_else(|| io::Error::from_raw_os_error(libc::EBADF))
    }

    pub fn read_handle(&self, fh: u64, offset: u64, size: u32) -> io::Result<Vec<u8>> {
        let handle = self.handle(fh)?;
        let mut buf = vec![0u8; size as usize];
        let mut filled = 0usize;
        while filled < buf.len() {
            match handle.file.read_at(&mut buf[filled..], offset + filled as u64) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
        buf.truncate(filled);
        Ok(buf)
    }

    /// Duplicate the descriptor and close the duplicate, as close(2) on a client fd would.
    pub fn flush_handle(&self, fh: u64) -> io::Result<()> {
        let handle = self.handle(fh)?;
        drop(handle.file.try_clone()?);
        Ok(())
    }

    pub fn fsync_handle(&self, fh: u64, datasync: bool) -> io::Result<()> {
        let handle = self.handle(fh)?;
        if datasync {
            handle.file.sync_data()
        } else {
            handle.file.sync_all()
        }
    }

    pub fn handle_attr(&self, fh: u64) -> io::Result<FileAttr> {
        let handle = self.handle(fh)?;
        Ok(file_attr_from_metadata(&handle.file.metadata()?))
    }

    pub fn release_handle(&self, fh: u64) -> io::Result<()> {
        match self.handles.remove(fh) {
            Some(handle) => {
                debug!("release {} ({})", fh, handle.path.display());
                Ok(())
            }
            None => Err(io::Error::from_raw_os_error(libc::EBADF)),
        }
    }
}

impl PathFilesystem for Passthrough {
    async fn init(&self, _req: Request) -> fuse3::Result<ReplyInit> {
        Ok(ReplyInit {
            max_write: NonZeroU32::new(MAX_WRITE).unwrap_or(NonZeroU32::MIN),
        })
    }

    async fn destroy(&self, _req: Request) {}

    async fn lookup(&self, _req: Request, parent: &OsStr, name: &OsStr) -> fuse3::Result<ReplyEntry> {
        let attr = self.stat_path(&join(parent, name))?;
        Ok(ReplyEntry {
            ttl: ATTR_TTL,
            attr,
        })
    }

    async fn getattr(
        &self,
        _req: Request,
        path: Option<&OsStr>,
        fh: Option<u64>,
        _flags: u32,
    ) -> fuse3::Result<ReplyAttr> {
        let attr = match (fh, path) {
            (Some(fh), _) if fh != 0 => self.handle_attr(fh)?,
            (_, Some(path)) => self.stat_path(path)?,
            _ => return Err(fuse3::Errno::new_not_exist()),
        };
        Ok(ReplyAttr {
            ttl: ATTR_TTL,
            attr,
        })
    }

    async fn readlink(&self, _req: Request, path: &OsStr) -> fuse3::Result<ReplyData> {
        use std::os::unix::ffi::OsStringExt;
        let target = self.read_link(path)?;
        Ok(Bytes::from(target.into_vec()).into())
    }

    async fn open(&self, _req: Request, path: &OsStr, flags: u32) -> fuse3::Result<ReplyOpen> {
        let fh = self.open_file(path, flags)?;
        Ok(ReplyOpen { fh, flags: 0 })
    }

    async fn read(
        &self,
        _req: Request,
        _path: Option<&OsStr>,
        fh: u64,
        offset: u64,
        size: u32,
    ) -> fuse3::Result<ReplyData> {
        let data = self.read_handle(fh, offset, size)?;
        Ok(Bytes::from(data).into())
    }

    async fn release(
        &self,
        _req: Request,
        _path: Option<&OsStr>,
        fh: u64,
        _flags: u32,
        _lock_owner: u64,
        _flush: bool,
    ) -> fuse3::Result<()> {
        Ok(self.release_handle(fh)?)
    }

    async fn flush(
        &self,
        _req: Request,
        _path: Option<&OsStr>,
        fh: u64,
        _lock_owner: u64,
    ) -> fuse3::Result<()> {
        Ok(self.flush_handle(fh)?)
    }

    async fn fsync(
        &self,
        _req: Request,
        _path: Option<&OsStr>,
        fh: u64,
        datasync: bool,
    ) -> fuse3::Result<()> {
        Ok(self.fsync_handle(fh, datasync)?)
    }

    async fn opendir(&self, _req: Request, path: &OsStr, _flags: u32) -> fuse3::Result<ReplyOpen> {
        let dir = self.on_disk_path(path);
        if !fs::metadata(&dir)?.is_dir() {
            return Err(fuse3::Errno::from(libc::ENOTDIR));
        }
        Ok(ReplyOpen { fh: 0, flags: 0 })
    }

    async fn releasedir(
        &self,
        _req: Request,
        _path: &OsStr,
        _fh: u64,
        _flags: u32,
    ) -> fuse3::Result<()> {
        Ok(())
    }

    type DirEntryStream<'a>
        = futures_util::stream::Iter<std::vec::IntoIter<fuse3::Result<DirectoryEntry>>>
    where
        Self: 'a;
    type DirEntryPlusStream<'a>
        = futures_util::stream::Iter<std::vec::IntoIter<fuse3::Result<DirectoryEntryPlus>>>
    where
        Self: 'a;

    async fn readdir<'a>(
        &'a self,
        _req: Request,
        path: &'a OsStr,
        _fh: u64,
        offset: i64,
    ) -> fuse3::Result<ReplyDirectory<Self::DirEntryStream<'a>>> {
        let listed = self.list_dir(path)?;
        let mut entries: Vec<fuse3::Result<DirectoryEntry>> = Vec::with_capacity(listed.len() + 2);
        entries.push(Ok(DirectoryEntry {
            kind: FileType::Directory,
            name: OsString::from("."),
            offset: 1,
        }));
        entries.push(Ok(DirectoryEntry {
            kind: FileType::Directory,
            name: OsString::from(".."),
            offset: 2,
        }));
        for (idx, entry) in listed.into_iter().enumerate() {
            entries.push(Ok(DirectoryEntry {
                kind: entry.kind,
                name: entry.name,
                offset: idx as i64 + 3,
            }));
        }

        let entries: Vec<_> = entries.into_iter().skip(offset.max(0) as usize).collect();
        Ok(ReplyDirectory {
            entries: futures_util::stream::iter(entries),
        })
    }

    async fn readdirplus<'a>(
        &'a self,
        _req: Request,
        parent: &'a OsStr,
        _fh: u64,
        offset: u64,
        _lock_owner: u64,
    ) -> fuse3::Result<ReplyDirectoryPlus<Self::DirEntryPlusStream<'a>>> {
        let listed = self.list_dir(parent)?;
        let dir = self.on_disk_path(parent);
        let dir_attr = file_attr_from_metadata(&fs::symlink_metadata(&dir)?);
        let mut entries: Vec<fuse3::Result<DirectoryEntryPlus>> =
            Vec::with_capacity(listed.len() + 2);
        for (idx, name) in [".", ".."].into_iter().enumerate() {
            entries.push(Ok(DirectoryEntryPlus {
                kind: FileType::Directory,
                name: OsString::from(name),
                offset: idx as i64 + 1,
                attr: dir_attr,
                entry_ttl: ATTR_TTL,
                attr_ttl: ATTR_TTL,
            }));
        }
        for (idx, entry) in listed.into_iter().enumerate() {
            let offset = idx as i64 + 3;
            match fs::symlink_metadata(dir.join(&entry.original)) {
                Ok(meta) => entries.push(Ok(DirectoryEntryPlus {
                    kind: entry.kind,
                    name: entry.name,
                    offset,
                    attr: file_attr_from_metadata(&meta),
                    entry_ttl: ATTR_TTL,
                    attr_ttl: ATTR_TTL,
                })),
                Err(err) => entries.push(Err(err.into())),
            }
        }

        let entries: Vec<_> = entries.into_iter().skip(offset as usize).collect();
        Ok(ReplyDirectoryPlus {
            entries: futures_util::stream::iter(entries),
        })
    }

    async fn statfs(&self, _req: Request, _path: &OsStr) -> fuse3::Result<ReplyStatFs> {
        let stats = nix::sys::statvfs::statvfs(self.root.as_path()).map_err(io::Error::from)?;
        Ok(ReplyStatFs {
            blocks: stats.blocks() as u64,
            bfree: stats.blocks_free() as u64,
            bavail: stats.blocks_available() as u64,
            files: stats.files() as u64,
            ffree: stats.files_free() as u64,
            bsize: stats.block_size() as u32,
            namelen: stats.name_max() as u32,
            frsize: stats.fragment_size() as u32,
        })
    }
}
