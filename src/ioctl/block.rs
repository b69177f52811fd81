//! Block device requests from `<linux/fs.h>`.

use std::mem::size_of;

use super::number::{SUPPORTED, io, ior};
use super::{Descriptor, DescriptorFlags, IoctlCall, data};
use crate::buffer::BoundedBuffer;
use crate::explain::privilege;
use crate::host::{self, Capability, FileKind};

const SIZE_T: usize = size_of::<usize>();

fn not_a_block_device(buf: &mut BoundedBuffer, errnum: i32, call: &IoctlCall) -> bool {
    if errnum != libc::ENOTTY {
        return false;
    }
    match host::fd_kind(call.fildes) {
        Some(FileKind::BlockDevice) | None => false,
        Some(kind) => {
            buf.puts("the fildes argument refers to a ");
            buf.puts(kind.describe());
            buf.puts(", not a block special device");
            true
        }
    }
}

fn explain_block(
    buf: &mut BoundedBuffer,
    errnum: i32,
    _desc: &Descriptor,
    call: &IoctlCall,
) -> bool {
    not_a_block_device(buf, errnum, call)
}

/// Requests that change the device need CAP_SYS_ADMIN.
fn explain_admin(
    buf: &mut BoundedBuffer,
    errnum: i32,
    _desc: &Descriptor,
    call: &IoctlCall,
) -> bool {
    match errnum {
        libc::EPERM | libc::EACCES => privilege::missing(buf, Capability::SysAdmin),
        _ => not_a_block_device(buf, errnum, call),
    }
}

fn explain_rrpart(
    buf: &mut BoundedBuffer,
    errnum: i32,
    desc: &Descriptor,
    call: &IoctlCall,
) -> bool {
    if errnum == libc::EBUSY {
        buf.puts("a partition of the device is still in use");
        return true;
    }
    explain_admin(buf, errnum, desc, call)
}

fn explain_roset(
    buf: &mut BoundedBuffer,
    errnum: i32,
    desc: &Descriptor,
    call: &IoctlCall,
) -> bool {
    if errnum == libc::EACCES && host::has_capability(Capability::SysAdmin) {
        buf.puts("the device is read-only in hardware and cannot be made writable");
        return true;
    }
    explain_admin(buf, errnum, desc, call)
}

fn print_range_in(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    buf.put_ptr(call.data.addr());
    data::append_braced(buf, call.data, 16, |b, r| {
        let (Some(start), Some(len)) = (r.read_u64(), r.read_u64()) else {
            return;
        };
        b.puts("start = ");
        b.put_uint(start);
        b.puts(", length = ");
        b.put_uint(len);
    });
}

pub static DESCRIPTORS: &[Descriptor] = &[
    Descriptor::new("BLKROSET", io(0x12, 93))
        .only_if(SUPPORTED)
        .input(4, "const int *")
        .with_print_data(data::int_in)
        .with_explanation(explain_roset),
    Descriptor::new("BLKROGET", io(0x12, 94))
        .only_if(SUPPORTED)
        .output(4, "int *")
        .with_print_returned(data::int_out)
        .with_explanation(explain_block),
    Descriptor::new("BLKRRPART", io(0x12, 95))
        .only_if(SUPPORTED)
        .with_explanation(explain_rrpart),
    Descriptor::new("BLKGETSIZE", io(0x12, 96))
        .only_if(SUPPORTED)
        .output(size_of::<libc::c_ulong>(), "unsigned long *")
        .with_print_returned(data::long_out)
        .with_explanation(explain_block),
    Descriptor::new("BLKFLSBUF", io(0x12, 97))
        .only_if(SUPPORTED)
        .with_explanation(explain_admin),
    Descriptor::new("BLKRASET", io(0x12, 98))
        .only_if(SUPPORTED)
        .immediate("unsigned long")
        .with_explanation(explain_admin),
    Descriptor::new("BLKRAGET", io(0x12, 99))
        .only_if(SUPPORTED)
        .output(size_of::<libc::c_long>(), "long *")
        .with_print_returned(data::long_out)
        .with_explanation(explain_block),
    Descriptor::new("BLKSSZGET", io(0x12, 104))
        .only_if(SUPPORTED)
        .output(4, "int *")
        .with_print_returned(data::int_out)
        .with_explanation(explain_block),
    Descriptor::new("BLKBSZGET", ior(0x12, 112, SIZE_T))
        .only_if(SUPPORTED)
        .output(4, "int *")
        .with_flags(DescriptorFlags::BAD_SIZE)
        .with_print_returned(data::int_out)
        .with_explanation(explain_block),
    Descriptor::new("BLKGETSIZE64", ior(0x12, 114, SIZE_T))
        .only_if(SUPPORTED)
        .output(8, "uint64_t *")
        .with_flags(DescriptorFlags::BAD_SIZE)
        .with_print_returned(data::u64_out)
        .with_explanation(explain_block),
    Descriptor::new("BLKDISCARD", io(0x12, 119))
        .only_if(SUPPORTED)
        .input(16, "const uint64_t[2]")
        .with_flags(DescriptorFlags::BAD_SIZE)
        .with_print_data(print_range_in)
        .with_explanation(explain_admin),
];
