//! Causes keyed only by error number, for when nothing more specific is
//! known about the call.

use crate::buffer::BoundedBuffer;
use crate::errno;

fn sentence(errnum: i32) -> Option<&'static str> {
    let text = match errnum {
        libc::EPERM => "the process does not have the privileges required for the operation",
        libc::ENOENT => "a named file or directory does not exist",
        libc::ESRCH => "the process or process group named does not exist",
        libc::EINTR => "the system call was interrupted by a signal before it could finish",
        libc::EIO => "a low-level input/output error occurred, probably in hardware",
        libc::ENXIO => "the device named does not exist, or is not ready",
        libc::E2BIG => "the argument list and environment are too large",
        libc::ENOEXEC => "the file is not in an executable format this system understands",
        libc::EBADF => "a file descriptor argument does not refer to an open file",
        libc::ECHILD => "the process has no child processes to wait for",
        libc::EAGAIN => "the operation would block, or a resource is temporarily exhausted",
        libc::ENOMEM => "the kernel could not allocate enough memory to complete the operation",
        libc::EACCES => "the process does not have permission to access a named file or directory",
        libc::EFAULT => "a pointer argument does not point into the process's accessible address space",
        libc::ENOTBLK => "a block special device was required",
        libc::EBUSY => "the device or resource is in use",
        libc::EEXIST => "a file that should not exist already does",
        libc::EXDEV => "the operation would cross a file system boundary",
        libc::ENODEV => "the device does not support the operation, or does not exist",
        libc::ENOTDIR => "a component used as a directory is not a directory",
        libc::EISDIR => "the named file is a directory, and the operation does not apply to directories",
        libc::EINVAL => "an argument has a value outside the range the call accepts",
        libc::ENFILE => "the system-wide limit on the total number of open files has been reached",
        libc::EMFILE => "the process has already reached its limit on open file descriptors",
        libc::ENOTTY => "the file descriptor does not support the requested device-control operation",
        libc::ETXTBSY => "the file is an executable that is currently running",
        libc::EFBIG => "the file would become larger than the maximum the system allows",
        libc::ENOSPC => "there is no room left on the file system",
        libc::ESPIPE => "the file descriptor refers to a pipe, socket or FIFO, which cannot seek",
        libc::EROFS => "the file system is mounted read-only",
        libc::EMLINK => "the file already has the maximum number of links",
        libc::EPIPE => "the reading end of the pipe or socket has been closed",
        libc::EDOM => "a numeric argument is outside the domain of the function",
        libc::ERANGE => "the result is too large to be represented",
        libc::EDEADLK => "the operation would have caused a deadlock",
        libc::ENAMETOOLONG => "a pathname, or a component of it, is too long",
        libc::ENOLCK => "the system has run out of file locks",
        libc::ENOSYS => "the system call is not implemented by this kernel",
        libc::ENOTEMPTY => "the directory is not empty",
        libc::ELOOP => "too many symbolic links were encountered while resolving a pathname",
        libc::ENODATA => "there is no data available",
        libc::ETIME => "the timer expired",
        libc::EOVERFLOW => "a value is too large to be stored in the data type the call uses",
        libc::EBADFD => "the file descriptor is in a bad state",
        libc::EILSEQ => "a byte sequence is not a valid character",
        libc::ENOTSOCK => "the file descriptor does not refer to a socket",
        libc::EDESTADDRREQ => "the socket is not connected and no destination address was given",
        libc::EMSGSIZE => "the message is too large to be sent in one piece",
        libc::EPROTOTYPE => "the protocol does not support the socket type",
        libc::ENOPROTOOPT => "the protocol option is not available",
        libc::EPROTONOSUPPORT => "the protocol is not supported",
        libc::EOPNOTSUPP => "the operation is not supported on this kind of object",
        libc::EAFNOSUPPORT => "the address family is not supported",
        libc::EADDRINUSE => "the address is already in use",
        libc::EADDRNOTAVAIL => "the address is not available on this machine",
        libc::ENETDOWN => "the network is down",
        libc::ENETUNREACH => "the network cannot be reached from this machine",
        libc::ECONNABORTED => "the connection was aborted",
        libc::ECONNRESET => "the connection was reset by the remote end",
        libc::ENOBUFS => "the system ran out of buffer space",
        libc::EISCONN => "the socket is already connected",
        libc::ENOTCONN => "the socket is not connected",
        libc::ETIMEDOUT => "the operation timed out",
        libc::ECONNREFUSED => "the remote end refused the connection",
        libc::EHOSTUNREACH => "there is no route to the remote host",
        libc::EALREADY => "an operation is already in progress on the object",
        libc::EINPROGRESS => "the operation is in progress and will complete later",
        libc::ESTALE => "the file handle refers to a file that no longer exists on the server",
        libc::EDQUOT => "the user's disk quota has been exhausted",
        libc::ENOMEDIUM => "there is no medium in the drive",
        libc::ECANCELED => "the operation was canceled",
        _ => return None,
    };
    Some(text)
}

/// A cause for `errnum` that holds for any call. Never writes nothing.
pub fn print(buf: &mut BoundedBuffer, errnum: i32) {
    if let Some(text) = sentence(errnum) {
        buf.puts(text);
        return;
    }
    match errno::lookup(errnum) {
        Some(info) => {
            buf.puts("the system reported the condition \"");
            buf.puts(info.description);
            buf.puts("\", and no more specific cause is known");
        }
        None => {
            buf.puts("the error number ");
            buf.put_int(errnum.into());
            buf.puts(" is not one this system defines");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(errnum: i32) -> String {
        let mut storage = [0u8; 256];
        let mut buf = BoundedBuffer::new(&mut storage);
        print(&mut buf, errnum);
        buf.as_str().to_string()
    }

    #[test]
    fn test_every_errno_has_a_cause() {
        for errnum in -5..=errno::ERRNO_MAX + 20 {
            assert!(!render(errnum).is_empty(), "errno {errnum}");
        }
    }

    #[test]
    fn test_specific_and_fallback() {
        assert_eq!(render(libc::EROFS), "the file system is mounted read-only");
        assert!(render(libc::EKEYREVOKED).contains("Key has been revoked"));
        assert_eq!(render(4000), "the error number 4000 is not one this system defines");
    }
}
