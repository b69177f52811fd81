//! Turning a failed call into one sentence.
//!
//! A [`Call`] carries the arguments as they were passed. Explaining it
//! renders the call again with symbolic names, works out a cause for the
//! error number by looking at the current state of the process and file
//! system, and joins the two into
//! `<signature> failed, <cause> (<ERRNO> <n>, <description>)`.

use std::path::Path;

use serde::Serialize;

use crate::buffer::BoundedBuffer;
use crate::errno;
use crate::ioctl::IoctlCall;
use crate::probe::ForeignPtr;

mod args;
mod dir;
mod fd;
pub mod fildes;
mod file;
pub mod generic;
mod ioctl;
mod open;
pub mod path;
pub mod privilege;
mod record;

pub use ioctl::returned as ioctl_returned;
pub use record::Record;

/// Capacity used by the `String`-returning entry points.
pub const DEFAULT_BUFFER_SIZE: usize = 3000;

/// A call, by kind, with the arguments it was given.
#[derive(Debug, Clone, Copy)]
pub enum Call<'a> {
    Open { pathname: &'a Path, flags: i32, mode: u32 },
    Close { fildes: i32 },
    Read { fildes: i32, data: ForeignPtr, data_size: usize },
    Write { fildes: i32, data: ForeignPtr, data_size: usize },
    Stat { pathname: &'a Path, buf: ForeignPtr },
    Lstat { pathname: &'a Path, buf: ForeignPtr },
    Access { pathname: &'a Path, mode: i32 },
    Unlink { pathname: &'a Path },
    Mkdir { pathname: &'a Path, mode: u32 },
    Rmdir { pathname: &'a Path },
    Chdir { pathname: &'a Path },
    Chmod { pathname: &'a Path, mode: u32 },
    Chown { pathname: &'a Path, owner: u32, group: u32 },
    Dup { oldfd: i32 },
    Dup2 { oldfd: i32, newfd: i32 },
    Ioctl(IoctlCall),
}

impl Call<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Call::Open { .. } => "open",
            Call::Close { .. } => "close",
            Call::Read { .. } => "read",
            Call::Write { .. } => "write",
            Call::Stat { .. } => "stat",
            Call::Lstat { .. } => "lstat",
            Call::Access { .. } => "access",
            Call::Unlink { .. } => "unlink",
            Call::Mkdir { .. } => "mkdir",
            Call::Rmdir { .. } => "rmdir",
            Call::Chdir { .. } => "chdir",
            Call::Chmod { .. } => "chmod",
            Call::Chown { .. } => "chown",
            Call::Dup { .. } => "dup",
            Call::Dup2 { .. } => "dup2",
            Call::Ioctl(_) => "ioctl",
        }
    }

    /// The call as it would be written in C, with symbols for numbers.
    pub fn render_signature(&self, buf: &mut BoundedBuffer) {
        match *self {
            Call::Open { pathname, flags, mode } => open::signature(buf, pathname, flags, mode),
            Call::Close { fildes } => fd::signature_close(buf, fildes),
            Call::Read { fildes, data, data_size } => {
                fd::signature_transfer(buf, "read", fildes, data, data_size)
            }
            Call::Write { fildes, data, data_size } => {
                fd::signature_transfer(buf, "write", fildes, data, data_size)
            }
            Call::Stat { pathname, buf: statbuf } => {
                file::signature_stat(buf, "stat", pathname, statbuf)
            }
            Call::Lstat { pathname, buf: statbuf } => {
                file::signature_stat(buf, "lstat", pathname, statbuf)
            }
            Call::Access { pathname, mode } => file::signature_access(buf, pathname, mode),
            Call::Unlink { pathname } => file::signature_path(buf, "unlink", pathname),
            Call::Mkdir { pathname, mode } => dir::signature_mkdir(buf, pathname, mode),
            Call::Rmdir { pathname } => file::signature_path(buf, "rmdir", pathname),
            Call::Chdir { pathname } => file::signature_path(buf, "chdir", pathname),
            Call::Chmod { pathname, mode } => file::signature_chmod(buf, pathname, mode),
            Call::Chown { pathname, owner, group } => {
                file::signature_chown(buf, pathname, owner, group)
            }
            Call::Dup { oldfd } => fd::signature_dup(buf, oldfd),
            Call::Dup2 { oldfd, newfd } => fd::signature_dup2(buf, oldfd, newfd),
            Call::Ioctl(ref call) => ioctl::signature(buf, call),
        }
    }

    /// Why the call failed with `errnum`. Always writes something.
    pub fn render_cause(&self, buf: &mut BoundedBuffer, errnum: i32) {
        let specific = match *self {
            Call::Open { pathname, flags, .. } => open::cause(buf, errnum, pathname, flags),
            Call::Close { fildes } => fd::cause_close(buf, errnum, fildes),
            Call::Read { fildes, data, data_size } => {
                fd::cause_read(buf, errnum, fildes, data, data_size)
            }
            Call::Write { fildes, data, data_size } => {
                fd::cause_write(buf, errnum, fildes, data, data_size)
            }
            Call::Stat { pathname, buf: statbuf } => {
                file::cause_stat(buf, errnum, pathname, statbuf, false)
            }
            Call::Lstat { pathname, buf: statbuf } => {
                file::cause_stat(buf, errnum, pathname, statbuf, true)
            }
            Call::Access { pathname, mode } => file::cause_access(buf, errnum, pathname, mode),
            Call::Unlink { pathname } => file::cause_unlink(buf, errnum, pathname),
            Call::Mkdir { pathname, .. } => dir::cause_mkdir(buf, errnum, pathname),
            Call::Rmdir { pathname } => dir::cause_rmdir(buf, errnum, pathname),
            Call::Chdir { pathname } => dir::cause_chdir(buf, errnum, pathname),
            Call::Chmod { pathname, .. } => file::cause_chmod(buf, errnum, pathname),
            Call::Chown { pathname, owner, group } => {
                file::cause_chown(buf, errnum, pathname, owner, group)
            }
            Call::Dup { oldfd } => fd::cause_dup(buf, errnum, oldfd),
            Call::Dup2 { oldfd, newfd } => fd::cause_dup2(buf, errnum, oldfd, newfd),
            Call::Ioctl(ref call) => {
                ioctl::cause(buf, errnum, call);
                true
            }
        };
        if !specific || buf.is_empty() {
            buf.clear();
            generic::print(buf, errnum);
        }
    }
}

/// EFAULT for a buffer argument: say so if `ptr` cannot be read for `len`
/// bytes.
pub fn explain_efault(buf: &mut BoundedBuffer, arg: &str, ptr: ForeignPtr, len: usize) -> bool {
    if ptr.is_null() {
        buf.puts("the ");
        buf.puts(arg);
        buf.puts(" argument is the NULL pointer");
        return true;
    }
    if ptr.is_valid(len.max(1)) {
        return false;
    }
    buf.puts("the ");
    buf.puts(arg);
    buf.puts(" argument does not point to a valid address in the process's address space");
    true
}

/// Write the whole explanation of `call` failing with `errnum` into `out`.
pub fn message(out: &mut BoundedBuffer, errnum: i32, call: &Call) {
    let size = out.capacity().max(1);
    let mut signature = vec![0u8; size];
    let mut cause = vec![0u8; size];
    let mut record = Record::new(errnum, &mut signature, &mut cause);
    call.render_signature(&mut record.signature);
    call.render_cause(&mut record.cause, errnum);
    record.assemble(out);
}

/// Like [`message`], for the error this thread saw last.
pub fn message_errno(out: &mut BoundedBuffer, call: &Call) {
    let errnum = errno::last();
    message(out, errnum, call);
}

pub fn explain(errnum: i32, call: &Call) -> String {
    let mut storage = vec![0u8; DEFAULT_BUFFER_SIZE];
    let mut out = BoundedBuffer::new(&mut storage);
    message(&mut out, errnum, call);
    out.as_str().to_string()
}

pub fn explain_errno(call: &Call) -> String {
    let errnum = errno::last();
    explain(errnum, call)
}

/// An explanation with its parts kept apart, for structured output.
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub call: String,
    pub cause: String,
    pub errno: i32,
    pub errno_name: Option<&'static str>,
    pub description: String,
    pub message: String,
}

impl Explanation {
    pub fn new(errnum: i32, call: &Call, capacity: usize) -> Self {
        let size = capacity.max(1);
        let mut signature = vec![0u8; size];
        let mut cause = vec![0u8; size];
        let mut record = Record::new(errnum, &mut signature, &mut cause);
        call.render_signature(&mut record.signature);
        call.render_cause(&mut record.cause, errnum);

        let mut storage = vec![0u8; size];
        let mut out = BoundedBuffer::new(&mut storage);
        record.assemble(&mut out);

        Self {
            call: record.signature.as_str().to_string(),
            cause: record.cause.as_str().to_string(),
            errno: errnum,
            errno_name: errno::name(errnum),
            description: errno::description(errnum),
            message: out.as_str().to_string(),
        }
    }
}
