//! Causes that come down to the state of a file descriptor.

use crate::buffer::BoundedBuffer;
use crate::host::{self, ProcFs};

/// Which way a descriptor must be open for the call to work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Read,
    Write,
}

/// EBADF: `fd` is not an open descriptor.
pub fn explain_ebadf(buf: &mut BoundedBuffer, fd: i32, arg: &str) -> bool {
    if fd < 0 {
        buf.puts("the ");
        buf.puts(arg);
        buf.puts(" argument is negative, so it cannot be a file descriptor");
        return true;
    }
    if host::fd_is_open(fd) {
        return false;
    }
    buf.puts("the ");
    buf.puts(arg);
    buf.puts(" argument does not refer to an open file descriptor");
    true
}

/// EBADF for transfers: not open at all, or not open the right way.
pub fn explain_ebadf_mode(buf: &mut BoundedBuffer, fd: i32, arg: &str, mode: Mode) -> bool {
    if explain_ebadf(buf, fd, arg) {
        return true;
    }
    let Some(flags) = host::fd_status_flags(fd) else {
        return false;
    };
    if flags & libc::O_PATH != 0 {
        buf.puts("the ");
        buf.puts(arg);
        buf.puts(" argument was opened with O_PATH, which allows neither reading nor writing");
        return true;
    }
    let accmode = flags & libc::O_ACCMODE;
    let (allowed, word) = match mode {
        Mode::Read => (accmode != libc::O_WRONLY, "reading"),
        Mode::Write => (accmode != libc::O_RDONLY, "writing"),
    };
    if allowed {
        return false;
    }
    buf.puts("the ");
    buf.puts(arg);
    buf.puts(" argument refers to a file that is not open for ");
    buf.puts(word);
    true
}

/// EMFILE: this process is at its descriptor limit.
pub fn explain_emfile(buf: &mut BoundedBuffer) {
    buf.puts("the process already has the maximum number of file descriptors open");
    let open = ProcFs::system().and_then(|procfs| match procfs.open_fd_count() {
        Ok(n) => Some(n),
        Err(e) => {
            log::debug!("{e:#}");
            None
        }
    });
    match (open, host::open_file_limit()) {
        (Some(open), Some(limit)) => {
            buf.puts(" (");
            buf.put_uint(open as u64);
            buf.puts(" of ");
            buf.put_uint(limit);
            buf.puts(")");
        }
        (None, Some(limit)) => {
            buf.puts(" (");
            buf.put_uint(limit);
            buf.puts(")");
        }
        _ => {}
    }
}

/// ENFILE: the whole system is at its open file limit.
pub fn explain_enfile(buf: &mut BoundedBuffer) {
    buf.puts("the system-wide limit on the total number of open files has been reached");
    let counts = ProcFs::system().map(|procfs| procfs.file_nr());
    match counts {
        Some(Ok((allocated, max))) => {
            buf.puts(" (");
            buf.put_uint(allocated);
            buf.puts(" of ");
            buf.put_uint(max);
            buf.puts(")");
        }
        Some(Err(e)) => log::debug!("{e:#}"),
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::fd::AsRawFd;

    fn render(f: impl FnOnce(&mut BoundedBuffer) -> bool) -> (bool, String) {
        let mut storage = [0u8; 256];
        let mut buf = BoundedBuffer::new(&mut storage);
        let hit = f(&mut buf);
        (hit, buf.as_str().to_string())
    }

    #[test]
    fn test_closed_fd() {
        let (hit, text) = render(|b| explain_ebadf(b, 9999, "fildes"));
        assert!(hit);
        assert_eq!(text, "the fildes argument does not refer to an open file descriptor");
    }

    #[test]
    fn test_open_fd_is_not_ebadf() {
        let file = tempfile::tempfile().unwrap();
        assert!(!render(|b| explain_ebadf(b, file.as_raw_fd(), "fildes")).0);
    }

    #[test]
    fn test_read_only_fd_for_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ro");
        std::fs::write(&path, b"x").unwrap();
        let file = std::fs::File::open(&path).unwrap();
        let (hit, text) =
            render(|b| explain_ebadf_mode(b, file.as_raw_fd(), "fildes", Mode::Write));
        assert!(hit);
        assert!(text.ends_with("not open for writing"));
        assert!(!render(|b| explain_ebadf_mode(b, file.as_raw_fd(), "fildes", Mode::Read)).0);
    }

    #[test]
    fn test_emfile_always_says_something() {
        let (_, text) = render(|b| {
            explain_emfile(b);
            true
        });
        assert!(text.starts_with("the process already has the maximum number"));
    }
}
