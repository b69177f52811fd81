//! Safe checks on pointers captured from somebody else's failed call.
//!
//! A [`ForeignPtr`] is just a number. The only way to look behind it is
//! [`ForeignPtr::read`], which has the kernel copy the bytes out and hands
//! back a [`Readable`] on success. Nothing in this crate dereferences a
//! foreign address directly, so a bad pointer costs an `EFAULT`, never a
//! fault.

use std::fmt;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use crate::host::ProcFs;
use crate::reader::DataReader;

/// Largest region copied out in one probe.
pub const PROBE_COPY_LIMIT: usize = 64 * 1024;

const PIPE_CHUNK: usize = 4096;

/// An address as it appeared in the arguments of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ForeignPtr(u64);

impl ForeignPtr {
    pub const NULL: ForeignPtr = ForeignPtr(0);

    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    pub fn from_ptr<T>(ptr: *const T) -> Self {
        Self(ptr as usize as u64)
    }

    pub const fn addr(self) -> u64 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Whether `len` bytes starting here can be read by this process.
    ///
    /// May report false for memory that is in fact readable; never the
    /// other way round.
    pub fn is_valid(self, len: usize) -> bool {
        if self.is_null() || self.end(len).is_none() {
            return false;
        }
        if len == 0 {
            return true;
        }
        if len <= PROBE_COPY_LIMIT {
            return self.read(len).is_some();
        }

        // Too big to copy: the mappings must cover it, and both ends must
        // still be readable now.
        let covered = ProcFs::system()
            .and_then(|procfs| procfs.readable_mappings().ok())
            .is_some_and(|maps| covers(&maps, self.0, self.0 + len as u64));
        let tail = ForeignPtr(self.0 + (len - PIPE_CHUNK) as u64);
        covered && self.read(PIPE_CHUNK).is_some() && tail.read(PIPE_CHUNK).is_some()
    }

    /// Copy `len` bytes from this address, if they are readable.
    pub fn read(self, len: usize) -> Option<Readable> {
        if self.is_null() || len > PROBE_COPY_LIMIT || self.end(len).is_none() {
            return None;
        }
        let mut bytes = vec![0u8; len];
        if len == 0 {
            return Some(Readable { addr: self, bytes });
        }

        match copy_via_vm_readv(self.0, &mut bytes) {
            Ok(()) => return Some(Readable { addr: self, bytes }),
            Err(e) if e.raw_os_error() == Some(libc::EFAULT) => return None,
            Err(e) => log::debug!("process_vm_readv unavailable ({e}), trying a pipe"),
        }

        match copy_via_pipe(self.0, &mut bytes) {
            Ok(()) => Some(Readable { addr: self, bytes }),
            Err(e) => {
                log::debug!("{self} is not readable: {e}");
                None
            }
        }
    }

    fn end(self, len: usize) -> Option<u64> {
        self.0.checked_add(len as u64)
    }
}

impl fmt::Display for ForeignPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            f.write_str("NULL")
        } else {
            write!(f, "0x{:016x}", self.0)
        }
    }
}

/// Bytes proven readable at a foreign address, already copied to safety.
#[derive(Debug, Clone)]
pub struct Readable {
    addr: ForeignPtr,
    bytes: Vec<u8>,
}

impl Readable {
    pub fn addr(&self) -> ForeignPtr {
        self.addr
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn reader(&self) -> DataReader<'_> {
        DataReader::new(&self.bytes, 0)
    }
}

fn covers(maps: &[std::ops::Range<u64>], start: u64, end: u64) -> bool {
    let mut sorted: Vec<_> = maps.to_vec();
    sorted.sort_by_key(|r| r.start);
    let mut pos = start;
    for r in sorted {
        if r.start > pos {
            return false;
        }
        if r.end > pos {
            pos = r.end;
        }
        if pos >= end {
            return true;
        }
    }
    pos >= end
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn copy_via_vm_readv(addr: u64, out: &mut [u8]) -> io::Result<()> {
    let local = libc::iovec { iov_base: out.as_mut_ptr().cast(), iov_len: out.len() };
    let remote = libc::iovec { iov_base: addr as usize as *mut libc::c_void, iov_len: out.len() };
    // SAFETY: the kernel validates `remote` and reports EFAULT instead of
    // faulting; `local` is a buffer we own of exactly `out.len()` bytes.
    let n = unsafe { libc::process_vm_readv(libc::getpid(), &local, 1, &remote, 1, 0) };
    if n < 0 {
        return Err(io::Error::last_os_error());
    }
    if n as usize != out.len() {
        return Err(io::Error::from_raw_os_error(libc::EFAULT));
    }
    Ok(())
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn copy_via_vm_readv(_addr: u64, _out: &mut [u8]) -> io::Result<()> {
    Err(io::Error::from_raw_os_error(libc::ENOSYS))
}

/// Push the bytes through a pipe: write(2) checks the source for us.
fn copy_via_pipe(addr: u64, out: &mut [u8]) -> io::Result<()> {
    let mut fds = [0 as libc::c_int; 2];
    // SAFETY: `fds` has room for the two descriptors pipe returns.
    if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: pipe just created both descriptors and nothing else owns them.
    let (rd, wr) = unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };

    for (i, chunk) in out.chunks_mut(PIPE_CHUNK).enumerate() {
        let src = (addr + (i * PIPE_CHUNK) as u64) as usize as *const libc::c_void;
        // SAFETY: the kernel copies from `src` and returns EFAULT if it is
        // not mapped; no user-space access to `src` happens.
        let n = unsafe { libc::write(wr.as_raw_fd(), src, chunk.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        if n as usize != chunk.len() {
            return Err(io::Error::from_raw_os_error(libc::EFAULT));
        }
        // SAFETY: `chunk` is ours and exactly as long as the data queued.
        let got = unsafe { libc::read(rd.as_raw_fd(), chunk.as_mut_ptr().cast(), chunk.len()) };
        if got < 0 || got as usize != chunk.len() {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}
