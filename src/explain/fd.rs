//! Calls that take only file descriptors: close, read, write, dup, dup2.

use super::fildes::{self, Mode};
use super::{args, explain_efault};
use crate::buffer::BoundedBuffer;
use crate::host::{self, FileKind};
use crate::probe::ForeignPtr;

pub(super) fn signature_close(buf: &mut BoundedBuffer, fd: i32) {
    args::begin(buf, "close");
    args::arg(buf, true, "fildes");
    args::fildes(buf, fd);
    args::end(buf);
}

pub(super) fn signature_transfer(
    buf: &mut BoundedBuffer,
    name: &str,
    fd: i32,
    data: ForeignPtr,
    size: usize,
) {
    args::begin(buf, name);
    args::arg(buf, true, "fildes");
    args::fildes(buf, fd);
    args::arg(buf, false, "data");
    buf.put_ptr(data.addr());
    args::arg(buf, false, "data_size");
    buf.put_uint(size as u64);
    args::end(buf);
}

pub(super) fn signature_dup(buf: &mut BoundedBuffer, oldfd: i32) {
    args::begin(buf, "dup");
    args::arg(buf, true, "oldfd");
    args::fildes(buf, oldfd);
    args::end(buf);
}

pub(super) fn signature_dup2(buf: &mut BoundedBuffer, oldfd: i32, newfd: i32) {
    args::begin(buf, "dup2");
    args::arg(buf, true, "oldfd");
    args::fildes(buf, oldfd);
    args::arg(buf, false, "newfd");
    args::fildes(buf, newfd);
    args::end(buf);
}

pub(super) fn cause_close(buf: &mut BoundedBuffer, errnum: i32, fd: i32) -> bool {
    match errnum {
        libc::EBADF => fildes::explain_ebadf(buf, fd, "fildes"),
        libc::EINTR => {
            buf.puts("the close was interrupted by a signal, the state of the file descriptor is unspecified");
            true
        }
        libc::EIO => {
            buf.puts("an I/O error occurred while writing pending data to the underlying device");
            true
        }
        libc::ENOSPC | libc::EDQUOT => {
            buf.puts("pending data could not be written because the file system is out of space");
            true
        }
        _ => false,
    }
}

fn is_nonblocking(fd: i32) -> bool {
    host::fd_status_flags(fd).is_some_and(|flags| flags & libc::O_NONBLOCK != 0)
}

fn uses_direct_io(fd: i32) -> bool {
    host::fd_status_flags(fd).is_some_and(|flags| flags & libc::O_DIRECT != 0)
}

fn explain_einval(buf: &mut BoundedBuffer, fd: i32, mode: Mode) -> bool {
    if uses_direct_io(fd) {
        buf.puts("the file was opened with O_DIRECT, and the data address, data size or file offset is not suitably aligned");
        return true;
    }
    buf.puts("the fildes argument refers to an object that is not suitable for ");
    buf.puts(match mode {
        Mode::Read => "reading",
        Mode::Write => "writing",
    });
    if let Some(kind) = host::fd_kind(fd) {
        buf.puts(", it is a ");
        buf.puts(kind.describe());
    }
    true
}

pub(super) fn cause_read(
    buf: &mut BoundedBuffer,
    errnum: i32,
    fd: i32,
    data: ForeignPtr,
    size: usize,
) -> bool {
    match errnum {
        libc::EBADF => fildes::explain_ebadf_mode(buf, fd, "fildes", Mode::Read),
        libc::EFAULT => explain_efault(buf, "data", data, size),
        libc::EISDIR => {
            buf.puts("the fildes argument refers to a directory, and directories cannot be read with read");
            true
        }
        libc::EAGAIN if is_nonblocking(fd) => {
            buf.puts("the file descriptor is set non-blocking (O_NONBLOCK) and no data is available yet");
            true
        }
        libc::EINVAL => explain_einval(buf, fd, Mode::Read),
        libc::EIO => {
            buf.puts("a low-level I/O error occurred, or the process is in a background process group reading from its controlling terminal");
            true
        }
        _ => false,
    }
}

pub(super) fn cause_write(
    buf: &mut BoundedBuffer,
    errnum: i32,
    fd: i32,
    data: ForeignPtr,
    size: usize,
) -> bool {
    match errnum {
        libc::EBADF => fildes::explain_ebadf_mode(buf, fd, "fildes", Mode::Write),
        libc::EFAULT => explain_efault(buf, "data", data, size),
        libc::EAGAIN if is_nonblocking(fd) => {
            buf.puts("the file descriptor is set non-blocking (O_NONBLOCK) and the write would block");
            true
        }
        libc::EINVAL => explain_einval(buf, fd, Mode::Write),
        libc::EPIPE => {
            buf.puts("the fildes argument refers to a ");
            let kind = host::fd_kind(fd).unwrap_or(FileKind::Unknown);
            buf.puts(if kind == FileKind::Socket { "socket" } else { "pipe" });
            buf.puts(" whose reading end has been closed");
            true
        }
        libc::ENOSPC => {
            buf.puts("the file system holding the file has no room left for the data");
            true
        }
        libc::EFBIG => {
            buf.puts("the write would take the file past the maximum file size allowed for this process or file system");
            true
        }
        _ => false,
    }
}

pub(super) fn cause_dup(buf: &mut BoundedBuffer, errnum: i32, oldfd: i32) -> bool {
    match errnum {
        libc::EBADF => fildes::explain_ebadf(buf, oldfd, "oldfd"),
        libc::EMFILE => {
            fildes::explain_emfile(buf);
            true
        }
        _ => false,
    }
}

pub(super) fn cause_dup2(buf: &mut BoundedBuffer, errnum: i32, oldfd: i32, newfd: i32) -> bool {
    match errnum {
        libc::EBADF => {
            if fildes::explain_ebadf(buf, oldfd, "oldfd") {
                return true;
            }
            let limit = host::open_file_limit();
            if newfd < 0 || limit.is_some_and(|limit| newfd as u64 >= limit) {
                buf.puts("the newfd argument is outside the range of valid file descriptors");
                if let Some(limit) = limit {
                    buf.puts(" (0 to ");
                    buf.put_uint(limit.saturating_sub(1));
                    buf.puts(")");
                }
                return true;
            }
            false
        }
        libc::EBUSY => {
            buf.puts("the newfd argument was being opened by another thread at the same time");
            true
        }
        libc::EMFILE => {
            fildes::explain_emfile(buf);
            true
        }
        _ => false,
    }
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
    fn test_read_signature() {
        let mut storage = [0u8; 256];
        let mut buf = BoundedBuffer::new(&mut storage);
        signature_transfer(&mut buf, "read", 9999, ForeignPtr::new(0x1000), 16);
        assert_eq!(buf.as_str(), "read(fildes = 9999, data = 0x0000000000001000, data_size = 16)");
    }

    #[test]
    fn test_read_efault() {
        let (hit, text) = render(|b| cause_read(b, libc::EFAULT, 0, ForeignPtr::new(0x1), 8));
        assert!(hit);
        assert_eq!(text, "the data argument does not point to a valid address in the process's address space");
    }

    #[test]
    fn test_dup2_newfd_negative() {
        use std::os::fd::AsRawFd;
        let file = tempfile::tempfile().unwrap();
        let (hit, text) = render(|b| cause_dup2(b, libc::EBADF, file.as_raw_fd(), -3));
        assert!(hit);
        assert!(text.starts_with("the newfd argument is outside the range"));
    }
}
