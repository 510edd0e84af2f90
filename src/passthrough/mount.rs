//! Mount helpers for starting/stopping the mirror.
//!
//! Thin wrappers over the fuse3 path-mode session. Unprivileged mounts go
//! through `fusermount3`, which must be in `PATH`.

use std::io;
use std::sync::Arc;

use fuse3::MountOptions;
use fuse3::path::Session;
use fuse3::raw::MountHandle;
use log::info;

use crate::config::MountConfig;
use crate::mapper::SharedMapper;
use crate::passthrough::Passthrough;

pub const FS_NAME: &str = "fatmirror";

pub fn mount_options(config: &MountConfig) -> MountOptions {
    let mut options = MountOptions::default();
    options
        .fs_name(FS_NAME)
        .read_only(true)
        .allow_other(config.allow_other)
        .uid(nix::unistd::getuid().as_raw())
        .gid(nix::unistd::getgid().as_raw());
    options
}

/// Build the filesystem for `config` with a fresh, empty mapping.
pub fn build_filesystem(config: &MountConfig) -> Passthrough {
    let mapper = Arc::new(SharedMapper::new(config.substitutions.clone()));
    Passthrough::new(config.root.clone(), mapper)
}

pub async fn mount(config: &MountConfig) -> io::Result<MountHandle> {
    let fs = build_filesystem(config);
    let session = Session::new(mount_options(config));
    info!(
        "mounting {} at {} (illegal chars {:?})",
        config.root.display(),
        config.mountpoint.display(),
        config.substitutions.illegal_chars()
    );
    if config.unprivileged {
        session.mount_with_unprivileged(fs, &config.mountpoint).await
    } else {
        session.mount(fs, &config.mountpoint).await
    }
}
