//! mkdir, rmdir and chdir.

use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use super::args;
use super::path::{self, EXEC, Lookup};
use crate::buffer::BoundedBuffer;
use crate::host::FileKind;

pub(super) fn signature_mkdir(buf: &mut BoundedBuffer, pathname: &Path, mode: u32) {
    args::begin(buf, "mkdir");
    args::arg(buf, true, "pathname");
    args::pathname(buf, pathname);
    args::arg(buf, false, "mode");
    args::mode(buf, mode);
    args::end(buf);
}

pub(super) fn cause_mkdir(buf: &mut BoundedBuffer, errnum: i32, pathname: &Path) -> bool {
    match errnum {
        libc::EEXIST => {
            buf.puts("the named file already exists");
            if let Ok(meta) = fs::symlink_metadata(pathname) {
                buf.puts(", it is a ");
                buf.puts(FileKind::of(&meta).describe());
            }
            true
        }
        libc::EMLINK => {
            buf.puts("the parent directory already has the maximum number of links");
            true
        }
        libc::ENOSPC | libc::EDQUOT => {
            buf.puts("there is no room on the file system, or the user's quota, for a new directory");
            true
        }
        _ => {
            let lookup = Lookup { modifies_parent: true, ..Lookup::default() };
            path::explain(buf, errnum, pathname, &lookup)
        }
    }
}

/// `Path::components` drops interior `.`, so look at the bytes.
fn ends_in_dot(pathname: &Path) -> bool {
    let raw = pathname.as_os_str().as_bytes();
    raw == b"." || raw.ends_with(b"/.")
}

pub(super) fn cause_rmdir(buf: &mut BoundedBuffer, errnum: i32, pathname: &Path) -> bool {
    match errnum {
        libc::ENOTEMPTY | libc::EEXIST => {
            buf.puts("the named directory is not empty");
            true
        }
        libc::EBUSY => {
            buf.puts("the named directory is in use as a mount point or as the root directory of some process");
            true
        }
        libc::EINVAL if ends_in_dot(pathname) => {
            buf.puts("the last component of the pathname is \".\"");
            true
        }
        _ => {
            let lookup = Lookup {
                modifies_parent: true,
                want_dir: true,
                no_follow: true,
                ..Lookup::default()
            };
            path::explain(buf, errnum, pathname, &lookup)
        }
    }
}

pub(super) fn cause_chdir(buf: &mut BoundedBuffer, errnum: i32, pathname: &Path) -> bool {
    let lookup = Lookup { access: EXEC, want_dir: true, ..Lookup::default() };
    path::explain(buf, errnum, pathname, &lookup)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mkdir_exists() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = [0u8; 256];
        let mut buf = BoundedBuffer::new(&mut storage);
        assert!(cause_mkdir(&mut buf, libc::EEXIST, dir.path()));
        assert_eq!(buf.as_str(), "the named file already exists, it is a directory");
    }

    #[test]
    fn test_chdir_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        fs::write(&file, b"").unwrap();
        let mut storage = [0u8; 256];
        let mut buf = BoundedBuffer::new(&mut storage);
        assert!(cause_chdir(&mut buf, libc::ENOTDIR, &file));
        assert_eq!(buf.as_str(), "the named file is a regular file, not a directory");
    }
}
