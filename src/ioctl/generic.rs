//! Causes that apply to any request, used when a descriptor has nothing
//! more specific to say.

use super::{DataSize, Descriptor, IoctlCall};
use crate::buffer::BoundedBuffer;
use crate::explain::{self, fildes};
use crate::host;

pub fn explain(buf: &mut BoundedBuffer, errnum: i32, desc: &Descriptor, call: &IoctlCall) -> bool {
    match errnum {
        libc::EBADF => fildes::explain_ebadf(buf, call.fildes, "fildes"),
        libc::EFAULT => explain_efault(buf, desc, call),
        libc::EINVAL => {
            if desc.name.is_none() {
                buf.puts("the request argument is not a valid request for this file descriptor");
            } else {
                buf.puts("the data argument is not a valid value for the ");
                desc.render_name(buf, call);
                buf.puts(" request");
            }
            true
        }
        libc::ENOTTY => {
            buf.puts("the ");
            desc.render_name(buf, call);
            buf.puts(" request does not apply to the kind of object the fildes argument refers to");
            if let Some(kind) = host::fd_kind(call.fildes) {
                buf.puts(", it is a ");
                buf.puts(kind.describe());
            }
            true
        }
        _ => false,
    }
}

fn explain_efault(buf: &mut BoundedBuffer, desc: &Descriptor, call: &IoctlCall) -> bool {
    if desc.data_size == DataSize::NotPointer && desc.name.is_some() {
        return false;
    }
    explain::explain_efault(buf, "data", call.data, desc.byte_size().unwrap_or(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ForeignPtr;
    use std::os::fd::AsRawFd;

    static INT_OUT: Descriptor = Descriptor::new("INT_OUT", 0x10).output(4, "int *");

    fn render(f: impl FnOnce(&mut BoundedBuffer) -> bool) -> (bool, String) {
        let mut storage = [0u8; 512];
        let mut buf = BoundedBuffer::new(&mut storage);
        let hit = f(&mut buf);
        (hit, buf.as_str().to_string())
    }

    #[test]
    fn test_efault_bad_pointer() {
        let call = IoctlCall::new(0, 0x10, ForeignPtr::new(0x1));
        let (hit, text) = render(|b| explain(b, libc::EFAULT, &INT_OUT, &call));
        assert!(hit);
        assert!(text.contains("does not point to a valid address"));
    }

    #[test]
    fn test_efault_good_pointer_is_not_explained() {
        let value: i32 = 0;
        let call = IoctlCall::new(0, 0x10, ForeignPtr::from_ptr(&value));
        assert!(!render(|b| explain(b, libc::EFAULT, &INT_OUT, &call)).0);
    }

    #[test]
    fn test_enotty_names_the_file_kind() {
        let file = tempfile::tempfile().unwrap();
        let call = IoctlCall::new(file.as_raw_fd(), 0x10, ForeignPtr::NULL);
        let (hit, text) = render(|b| explain(b, libc::ENOTTY, &INT_OUT, &call));
        assert!(hit);
        assert!(text.starts_with("the INT_OUT request"));
        assert!(text.ends_with("it is a regular file"), "{text}");
    }

    #[test]
    fn test_einval_unknown_request() {
        let call = IoctlCall::new(0, 0x7777, ForeignPtr::NULL);
        let (_, text) = render(|b| explain(b, libc::EINVAL, &crate::ioctl::UNKNOWN, &call));
        assert_eq!(text, "the request argument is not a valid request for this file descriptor");
    }
}
