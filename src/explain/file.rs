//! Calls on a single named file: stat, lstat, access, unlink, chmod, chown.

use std::fs;
use std::mem::size_of;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use super::path::{self, Lookup};
use super::{args, explain_efault, privilege};
use crate::buffer::BoundedBuffer;
use crate::host::{self, Capability};
use crate::probe::ForeignPtr;
use crate::tables;

pub(super) fn signature_path(buf: &mut BoundedBuffer, name: &str, pathname: &Path) {
    args::begin(buf, name);
    args::arg(buf, true, "pathname");
    args::pathname(buf, pathname);
    args::end(buf);
}

pub(super) fn signature_stat(
    buf: &mut BoundedBuffer,
    name: &str,
    pathname: &Path,
    statbuf: ForeignPtr,
) {
    args::begin(buf, name);
    args::arg(buf, true, "pathname");
    args::pathname(buf, pathname);
    args::arg(buf, false, "buf");
    buf.put_ptr(statbuf.addr());
    args::end(buf);
}

pub(super) fn signature_access(buf: &mut BoundedBuffer, pathname: &Path, mode: i32) {
    args::begin(buf, "access");
    args::arg(buf, true, "pathname");
    args::pathname(buf, pathname);
    args::arg(buf, false, "mode");
    tables::print_access_mode(buf, mode);
    args::end(buf);
}

pub(super) fn signature_chmod(buf: &mut BoundedBuffer, pathname: &Path, mode: u32) {
    args::begin(buf, "chmod");
    args::arg(buf, true, "pathname");
    args::pathname(buf, pathname);
    args::arg(buf, false, "mode");
    args::mode(buf, mode);
    args::end(buf);
}

pub(super) fn signature_chown(buf: &mut BoundedBuffer, pathname: &Path, owner: u32, group: u32) {
    args::begin(buf, "chown");
    args::arg(buf, true, "pathname");
    args::pathname(buf, pathname);
    args::arg(buf, false, "owner");
    args::uid(buf, owner);
    args::arg(buf, false, "group");
    args::gid(buf, group);
    args::end(buf);
}

pub(super) fn cause_stat(
    buf: &mut BoundedBuffer,
    errnum: i32,
    pathname: &Path,
    statbuf: ForeignPtr,
    nofollow: bool,
) -> bool {
    match errnum {
        libc::EFAULT => explain_efault(buf, "buf", statbuf, size_of::<libc::stat>()),
        libc::EOVERFLOW => {
            buf.puts("the file size, inode number or number of blocks cannot be represented in the stat structure");
            true
        }
        _ => {
            let lookup = Lookup { no_follow: nofollow, ..Lookup::default() };
            path::explain(buf, errnum, pathname, &lookup)
        }
    }
}

pub(super) fn cause_access(
    buf: &mut BoundedBuffer,
    errnum: i32,
    pathname: &Path,
    mode: i32,
) -> bool {
    let known = libc::R_OK | libc::W_OK | libc::X_OK;
    match errnum {
        libc::EINVAL if mode & !known != 0 => {
            buf.puts("the mode argument holds bits other than F_OK, R_OK, W_OK and X_OK");
            true
        }
        libc::EROFS if mode & libc::W_OK != 0 => {
            buf.puts("write access was requested for a file on a read-only file system");
            true
        }
        libc::ETXTBSY => {
            buf.puts("write access was requested for an executable that is running");
            true
        }
        _ => {
            let lookup = Lookup { access: (mode & known) as u32, ..Lookup::default() };
            path::explain(buf, errnum, pathname, &lookup)
        }
    }
}

fn explain_sticky(buf: &mut BoundedBuffer, pathname: &Path) -> bool {
    let parent = match pathname.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let (Ok(dir), Ok(file)) = (fs::metadata(parent), fs::symlink_metadata(pathname)) else {
        return false;
    };
    let euid = host::effective_ids().0;
    if dir.mode() & libc::S_ISVTX as u32 == 0 || file.uid() == euid || dir.uid() == euid {
        return false;
    }
    if host::has_capability(Capability::Fowner) {
        return false;
    }
    buf.puts("the directory containing the named file has the sticky bit set, and the process owns neither the file nor the directory");
    true
}

pub(super) fn cause_unlink(buf: &mut BoundedBuffer, errnum: i32, pathname: &Path) -> bool {
    match errnum {
        libc::EISDIR => {
            buf.puts("the named file is a directory, use rmdir to remove it");
            true
        }
        libc::EPERM | libc::EACCES => {
            if fs::symlink_metadata(pathname).is_ok_and(|m| m.is_dir()) {
                buf.puts("the named file is a directory, use rmdir to remove it");
                return true;
            }
            if explain_sticky(buf, pathname) {
                return true;
            }
            let lookup = Lookup { modifies_parent: true, no_follow: true, ..Lookup::default() };
            path::explain_eacces(buf, pathname, &lookup)
        }
        libc::EBUSY => {
            buf.puts("the named file is in use by the system or another process");
            true
        }
        _ => {
            let lookup = Lookup { modifies_parent: true, no_follow: true, ..Lookup::default() };
            path::explain(buf, errnum, pathname, &lookup)
        }
    }
}

fn explain_not_owner(buf: &mut BoundedBuffer, pathname: &Path) -> bool {
    let Ok(meta) = fs::metadata(pathname) else {
        return false;
    };
    if meta.uid() == host::effective_ids().0 || host::has_capability(Capability::Fowner) {
        return false;
    }
    buf.puts("the process is not the owner of the named file (owner is ");
    args::uid(buf, meta.uid());
    buf.puts(") and does not have the CAP_FOWNER capability");
    true
}

pub(super) fn cause_chmod(buf: &mut BoundedBuffer, errnum: i32, pathname: &Path) -> bool {
    match errnum {
        libc::EPERM => explain_not_owner(buf, pathname),
        _ => path::explain(buf, errnum, pathname, &Lookup::default()),
    }
}

pub(super) fn cause_chown(
    buf: &mut BoundedBuffer,
    errnum: i32,
    pathname: &Path,
    owner: u32,
    group: u32,
) -> bool {
    if errnum != libc::EPERM {
        return path::explain(buf, errnum, pathname, &Lookup::default());
    }
    if host::has_capability(Capability::Chown) {
        return false;
    }
    let Ok(meta) = fs::metadata(pathname) else {
        return privilege::missing(buf, Capability::Chown);
    };
    let changes_owner = owner != u32::MAX && owner != meta.uid();
    if changes_owner {
        buf.puts("only a process with the CAP_CHOWN capability may change the owner of a file");
        return true;
    }
    if meta.uid() != host::effective_ids().0 {
        return explain_not_owner(buf, pathname) || privilege::missing(buf, Capability::Chown);
    }
    if group != u32::MAX && !host::in_group(group) {
        buf.puts("the process is not a member of group ");
        args::gid(buf, group);
        buf.puts(", and does not have the CAP_CHOWN capability");
        return true;
    }
    privilege::missing(buf, Capability::Chown)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut BoundedBuffer) -> bool) -> (bool, String) {
        let mut storage = [0u8; 512];
        let mut buf = BoundedBuffer::new(&mut storage);
        let hit = f(&mut buf);
        (hit, buf.as_str().to_string())
    }

    #[test]
    fn test_access_signature() {
        let mut storage = [0u8; 128];
        let mut buf = BoundedBuffer::new(&mut storage);
        signature_access(&mut buf, Path::new("/etc"), libc::R_OK | libc::W_OK);
        assert_eq!(buf.as_str(), "access(pathname = \"/etc\", mode = W_OK | R_OK)");
    }

    #[test]
    fn test_access_bad_mode() {
        let (hit, text) = render(|b| cause_access(b, libc::EINVAL, Path::new("/"), 0x40));
        assert!(hit);
        assert!(text.starts_with("the mode argument holds bits"));
    }

    #[test]
    fn test_unlink_directory() {
        let dir = tempfile::tempdir().unwrap();
        let (_, text) = render(|b| cause_unlink(b, libc::EISDIR, dir.path()));
        assert_eq!(text, "the named file is a directory, use rmdir to remove it");
    }

    #[test]
    fn test_stat_bad_buffer() {
        let (hit, text) =
            render(|b| cause_stat(b, libc::EFAULT, Path::new("/"), ForeignPtr::NULL, false));
        assert!(hit);
        assert_eq!(text, "the buf argument is the NULL pointer");
    }
}
