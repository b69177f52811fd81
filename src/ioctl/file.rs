//! Requests any open file may receive.

use std::mem::size_of;

use super::number::{ASM_GENERIC, SUPPORTED, ior, iow};
use super::{DataSize, Descriptor, DescriptorFlags, IoctlCall, data};
use crate::buffer::BoundedBuffer;
use crate::explain::privilege;
use crate::host::{self, Capability};
use crate::tables::{INODE_FLAGS, INODE_FLAGS_PRIVILEGED};

const LONG: usize = size_of::<libc::c_long>();

fn print_inode_flags_in(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    data::int_bits_in(buf, call, INODE_FLAGS);
}

fn print_inode_flags_out(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    data::int_bits_out(buf, call, INODE_FLAGS);
}

fn explain_fibmap(
    buf: &mut BoundedBuffer,
    errnum: i32,
    _desc: &Descriptor,
    _call: &IoctlCall,
) -> bool {
    errnum == libc::EPERM && privilege::missing(buf, Capability::SysRawio)
}

fn explain_setflags(
    buf: &mut BoundedBuffer,
    errnum: i32,
    _desc: &Descriptor,
    call: &IoctlCall,
) -> bool {
    if errnum != libc::EPERM {
        return false;
    }
    if let Some(st) = host::fstat(call.fildes) {
        if st.st_uid != host::effective_ids().0 && !host::has_capability(Capability::Fowner) {
            buf.puts("the process is not the owner of the file and does not have the CAP_FOWNER capability");
            return true;
        }
    }
    let wanted = call.data.read(4).and_then(|r| r.reader().read_i32());
    match wanted {
        Some(flags) if (flags as u32 as u64) & INODE_FLAGS_PRIVILEGED != 0 => {
            if host::has_capability(Capability::LinuxImmutable) {
                return false;
            }
            buf.puts("setting or clearing FS_IMMUTABLE_FL or FS_APPEND_FL requires the CAP_LINUX_IMMUTABLE capability");
            true
        }
        _ => false,
    }
}

fn explain_no_inode_flags(
    buf: &mut BoundedBuffer,
    errnum: i32,
    _desc: &Descriptor,
    call: &IoctlCall,
) -> bool {
    if errnum != libc::ENOTTY || !host::fd_is_open(call.fildes) {
        return false;
    }
    buf.puts("the file system holding the file does not support inode flags");
    true
}

pub static DESCRIPTORS: &[Descriptor] = &[
    Descriptor::new("FIONREAD", 0x541B)
        .only_if(ASM_GENERIC)
        .output(4, "int *")
        .with_print_returned(data::int_out),
    Descriptor::new("FIONBIO", 0x5421)
        .only_if(ASM_GENERIC)
        .input(4, "const int *")
        .with_print_data(data::int_in),
    Descriptor::new("FIOASYNC", 0x5452)
        .only_if(ASM_GENERIC)
        .input(4, "const int *")
        .with_print_data(data::int_in),
    Descriptor::new("FIOCLEX", 0x5451).only_if(ASM_GENERIC),
    Descriptor::new("FIONCLEX", 0x5450).only_if(ASM_GENERIC),
    Descriptor::new("FIOQSIZE", 0x5460)
        .only_if(ASM_GENERIC)
        .output(8, "loff_t *")
        .with_print_returned(data::u64_out),
    Descriptor::new("FIBMAP", 1)
        .only_if(SUPPORTED)
        .in_out(DataSize::Bytes(4), "int *")
        .with_flags(DescriptorFlags::BAD_SIZE)
        .with_print_data(data::int_in)
        .with_print_returned(data::int_out)
        .with_explanation(explain_fibmap),
    Descriptor::new("FIGETBSZ", 2)
        .only_if(SUPPORTED)
        .output(4, "int *")
        .with_flags(DescriptorFlags::BAD_SIZE)
        .with_print_returned(data::int_out),
    Descriptor::new("FS_IOC_GETFLAGS", ior(b'f', 1, LONG))
        .only_if(SUPPORTED)
        .output(4, "int *")
        .with_flags(DescriptorFlags::BAD_SIZE)
        .with_print_returned(print_inode_flags_out)
        .with_explanation(explain_no_inode_flags),
    Descriptor::new("FS_IOC_SETFLAGS", iow(b'f', 2, LONG))
        .only_if(SUPPORTED)
        .input(4, "const int *")
        .with_flags(DescriptorFlags::BAD_SIZE)
        .with_print_data(print_inode_flags_in)
        .with_explanation(explain_setflags),
    Descriptor::new("FS_IOC_GETVERSION", ior(b'v', 1, LONG))
        .only_if(SUPPORTED)
        .output(4, "int *")
        .with_flags(DescriptorFlags::BAD_SIZE)
        .with_print_returned(data::int_out),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ForeignPtr;

    fn find(name: &str) -> &'static Descriptor {
        DESCRIPTORS.iter().find(|d| d.name == Some(name)).unwrap()
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_getflags_reads_int_not_long() {
        let flags: i32 = 0x10 | 0x80;
        let call = IoctlCall::new(0, 0, ForeignPtr::from_ptr(&flags));
        let mut storage = [0u8; 128];
        let mut buf = BoundedBuffer::new(&mut storage);
        assert!(find("FS_IOC_GETFLAGS").render_returned(&mut buf, 0, &call));
        assert_eq!(buf.as_str(), "{ FS_IMMUTABLE_FL | FS_NOATIME_FL }");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_setflags_renders_symbols() {
        let flags: i32 = 0x20;
        let call = IoctlCall::new(0, 0, ForeignPtr::from_ptr(&flags));
        let mut storage = [0u8; 128];
        let mut buf = BoundedBuffer::new(&mut storage);
        find("FS_IOC_SETFLAGS").render_data(&mut buf, &call);
        assert!(buf.as_str().ends_with(" { FS_APPEND_FL }"));
    }
}
