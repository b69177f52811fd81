//! Explain why a system call failed.
//!
//! Given the call, the arguments it was passed and the error number it
//! returned, [`explain::explain`] produces one sentence of the form
//! `<call> failed, <cause> (<ERRNO> <n>, <description>)`, looking at the
//! current state of the process and file system to pick the most likely
//! cause.

pub mod buffer;
pub mod codec;
pub mod errno;
pub mod explain;
pub mod host;
pub mod ioctl;
pub mod probe;
pub mod reader;
pub mod tables;

pub use buffer::BoundedBuffer;
pub use explain::{Call, Explanation, explain, explain_errno, message, message_errno};
pub use probe::ForeignPtr;
