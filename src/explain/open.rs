use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use super::path::{self, Lookup, READ, WRITE};
use super::{args, fildes};
use crate::buffer::BoundedBuffer;
use crate::host::{self, Capability, FileKind};
use crate::tables;

fn creates(flags: i32) -> bool {
    flags & libc::O_CREAT != 0 || flags & libc::O_TMPFILE == libc::O_TMPFILE
}

pub(super) fn signature(buf: &mut BoundedBuffer, pathname: &Path, flags: i32, mode: u32) {
    args::begin(buf, "open");
    args::arg(buf, true, "pathname");
    args::pathname(buf, pathname);
    args::arg(buf, false, "flags");
    tables::print_open_flags(buf, flags);
    if creates(flags) {
        args::arg(buf, false, "mode");
        args::mode(buf, mode);
    }
    args::end(buf);
}

fn wanted_access(flags: i32) -> u32 {
    match flags & libc::O_ACCMODE {
        libc::O_RDONLY => READ,
        libc::O_WRONLY => WRITE,
        _ => READ | WRITE,
    }
}

fn writes(flags: i32) -> bool {
    flags & libc::O_ACCMODE != libc::O_RDONLY || flags & libc::O_TRUNC != 0
}

pub(super) fn cause(buf: &mut BoundedBuffer, errnum: i32, pathname: &Path, flags: i32) -> bool {
    let exists = fs::symlink_metadata(pathname).is_ok();
    let lookup = Lookup {
        access: if exists || !creates(flags) { wanted_access(flags) } else { 0 },
        modifies_parent: creates(flags) && !exists,
        want_dir: flags & libc::O_DIRECTORY != 0,
        no_follow: flags & libc::O_NOFOLLOW != 0,
    };
    match errnum {
        libc::EEXIST if flags & libc::O_EXCL != 0 => {
            buf.puts("the named file already exists, and O_CREAT and O_EXCL were both specified");
            true
        }
        libc::EISDIR => {
            buf.puts("the named file is a directory, and the access mode asks for writing");
            true
        }
        libc::EMFILE => {
            fildes::explain_emfile(buf);
            true
        }
        libc::ENFILE => {
            fildes::explain_enfile(buf);
            true
        }
        libc::ETXTBSY => {
            buf.puts("the named file is an executable that is running, and write access was requested");
            true
        }
        libc::EINVAL if flags & libc::O_TMPFILE == libc::O_TMPFILE && !writes(flags) => {
            buf.puts("O_TMPFILE was specified without O_WRONLY or O_RDWR");
            true
        }
        libc::EINVAL => {
            buf.puts("the flags argument holds an invalid combination of flags");
            true
        }
        libc::ENXIO => match fs::metadata(pathname).map(|m| FileKind::of(&m)) {
            Ok(FileKind::Fifo) => {
                buf.puts("the named file is a FIFO opened O_NONBLOCK | O_WRONLY, and no process has it open for reading");
                true
            }
            Ok(FileKind::CharDevice | FileKind::BlockDevice) => {
                buf.puts("the named file is a device special file and no corresponding device exists");
                true
            }
            Ok(FileKind::Socket) => {
                buf.puts("the named file is a UNIX domain socket, which cannot be opened");
                true
            }
            _ => false,
        },
        libc::EOVERFLOW | libc::EFBIG => {
            buf.puts("the named file is too large to be opened without O_LARGEFILE");
            true
        }
        libc::EPERM if flags & libc::O_NOATIME != 0 => {
            let owner = fs::metadata(pathname).map(|m| m.uid()).ok();
            if owner == Some(host::effective_ids().0) || host::has_capability(Capability::Fowner) {
                return false;
            }
            buf.puts("O_NOATIME was specified, and the process is neither the owner of the named file nor has the CAP_FOWNER capability");
            true
        }
        _ => path::explain(buf, errnum, pathname, &lookup),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_signature(path: &str, flags: i32, mode: u32) -> String {
        let mut storage = [0u8; 256];
        let mut buf = BoundedBuffer::new(&mut storage);
        signature(&mut buf, Path::new(path), flags, mode);
        buf.as_str().to_string()
    }

    #[test]
    fn test_mode_only_with_create() {
        assert_eq!(
            render_signature("/a", libc::O_RDONLY, 0o644),
            "open(pathname = \"/a\", flags = O_RDONLY)"
        );
        assert_eq!(
            render_signature("/a", libc::O_WRONLY | libc::O_CREAT, 0o644),
            "open(pathname = \"/a\", flags = O_WRONLY | O_CREAT, mode = 0644)"
        );
    }

    #[test]
    fn test_eexist() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = [0u8; 256];
        let mut buf = BoundedBuffer::new(&mut storage);
        assert!(cause(&mut buf, libc::EEXIST, dir.path(), libc::O_CREAT | libc::O_EXCL));
        assert!(buf.as_str().starts_with("the named file already exists"));
    }
}
