use std::fs::OpenOptions;
use std::io;
use std::os::unix::fs::OpenOptionsExt;

// Flags that would let an open modify the mirrored tree.
const WRITE_FLAGS: i32 = libc::O_CREAT | libc::O_TRUNC | libc::O_APPEND | libc::O_EXCL;

/// Translate FUSE open flags into read-only `OpenOptions`.
///
/// The mirror never writes: any access mode other than `O_RDONLY`, or a flag
/// that creates, truncates or appends, fails with `EROFS`.
pub fn open_options_from_flags(flags: u32) -> io::Result<OpenOptions> {
    let flags = flags as i32;
    if flags & libc::O_ACCMODE != libc::O_RDONLY || flags & WRITE_FLAGS != 0 {
        return Err(io::Error::from_raw_os_error(libc::EROFS));
    }
    let mut options = OpenOptions::new();
    options
        .read(true)
        .custom_flags(flags & !(libc::O_ACCMODE | libc::O_CLOEXEC));
    Ok(options)
}
