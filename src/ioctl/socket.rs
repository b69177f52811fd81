//! Socket and network-interface requests.

use std::mem::size_of;

use super::disambiguate::is_socket;
use super::number::{ASM_GENERIC, SUPPORTED};
use super::{DataSize, Descriptor, IoctlCall, data};
use crate::buffer::BoundedBuffer;
use crate::codec;
use crate::explain::privilege;
use crate::host::{self, Capability};
use crate::reader::DataReader;
use crate::tables::INTERFACE_FLAGS;

const IFNAMSIZ: usize = 16;
/// `struct ifreq`: the name, then a union as large as `struct ifmap`.
const IFREQ_SIZE: usize = IFNAMSIZ + 2 * size_of::<usize>() + 8;
/// `struct ifconf`: an `int` length padded to a pointer, then the pointer.
const IFCONF_SIZE: usize = 2 * size_of::<usize>();
const TIMEVAL_SIZE: usize = 2 * size_of::<libc::c_long>();

fn ifr_name(buf: &mut BoundedBuffer, reader: &mut DataReader) {
    buf.puts("ifr_name = ");
    match reader.read_bytes(IFNAMSIZ) {
        Some(name) => buf.put_quoted_n(name, IFNAMSIZ),
        None => buf.puts("?"),
    }
}

fn ifr_field(
    buf: &mut BoundedBuffer,
    reader: &mut DataReader,
    field: &str,
    f: impl FnOnce(&mut BoundedBuffer, &mut DataReader),
) {
    ifr_name(buf, reader);
    buf.puts(", ");
    buf.puts(field);
    buf.puts(" = ");
    f(buf, reader);
}

fn ifr_flags(buf: &mut BoundedBuffer, reader: &mut DataReader) {
    ifr_field(buf, reader, "ifr_flags", |b, r| match r.read_u16() {
        Some(flags) => codec::print_bits(b, flags.into(), INTERFACE_FLAGS),
        None => b.puts("?"),
    });
}

fn ifr_int(buf: &mut BoundedBuffer, reader: &mut DataReader, field: &str) {
    ifr_field(buf, reader, field, |b, r| match r.read_i32() {
        Some(v) => b.put_int(v.into()),
        None => b.puts("?"),
    });
}

fn print_ifreq_name_in(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    buf.put_ptr(call.data.addr());
    data::append_braced(buf, call.data, IFREQ_SIZE, ifr_name);
}

fn print_ifreq_index_in(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    buf.put_ptr(call.data.addr());
    data::append_braced(buf, call.data, IFREQ_SIZE, |b, r| {
        r.skip(IFNAMSIZ);
        b.puts("ifr_ifindex = ");
        match r.read_i32() {
            Some(v) => b.put_int(v.into()),
            None => b.puts("?"),
        }
    });
}

fn print_ifreq_name_out(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    data::braced(buf, call.data, IFREQ_SIZE, ifr_name);
}

fn print_flags_in(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    buf.put_ptr(call.data.addr());
    data::append_braced(buf, call.data, IFREQ_SIZE, ifr_flags);
}

fn print_flags_out(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    data::braced(buf, call.data, IFREQ_SIZE, ifr_flags);
}

fn print_mtu_in(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    buf.put_ptr(call.data.addr());
    data::append_braced(buf, call.data, IFREQ_SIZE, |b, r| ifr_int(b, r, "ifr_mtu"));
}

fn print_mtu_out(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    data::braced(buf, call.data, IFREQ_SIZE, |b, r| ifr_int(b, r, "ifr_mtu"));
}

fn print_index_out(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    data::braced(buf, call.data, IFREQ_SIZE, |b, r| ifr_int(b, r, "ifr_ifindex"));
}

fn ifconf(buf: &mut BoundedBuffer, reader: &mut DataReader) {
    buf.puts("ifc_len = ");
    match reader.read_i32() {
        Some(len) => buf.put_int(len.into()),
        None => buf.puts("?"),
    }
    reader.skip(IFCONF_SIZE / 2 - 4);
    buf.puts(", ifc_buf = ");
    match reader.read_long() {
        Some(addr) => buf.put_ptr(addr as u64),
        None => buf.puts("?"),
    }
}

fn print_ifconf_in(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    buf.put_ptr(call.data.addr());
    data::append_braced(buf, call.data, IFCONF_SIZE, ifconf);
}

fn print_ifconf_out(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    data::braced(buf, call.data, IFCONF_SIZE, ifconf);
}

fn print_timeval_out(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    data::braced(buf, call.data, TIMEVAL_SIZE, |b, r| {
        let (Some(sec), Some(usec)) = (r.read_long(), r.read_long()) else {
            return;
        };
        b.puts("tv_sec = ");
        b.put_int(sec);
        b.puts(", tv_usec = ");
        b.put_int(usec);
    });
}

fn not_a_socket(buf: &mut BoundedBuffer, errnum: i32, call: &IoctlCall) -> bool {
    if errnum != libc::ENOTTY || !host::fd_is_open(call.fildes) {
        return false;
    }
    if host::fd_kind(call.fildes) == Some(host::FileKind::Socket) {
        return false;
    }
    buf.puts("the fildes argument does not refer to a socket");
    true
}

fn explain_socket(
    buf: &mut BoundedBuffer,
    errnum: i32,
    _desc: &Descriptor,
    call: &IoctlCall,
) -> bool {
    not_a_socket(buf, errnum, call)
}

fn explain_stamp(
    buf: &mut BoundedBuffer,
    errnum: i32,
    _desc: &Descriptor,
    call: &IoctlCall,
) -> bool {
    if errnum == libc::ENOENT {
        buf.puts("no packet has been received on the socket yet");
        return true;
    }
    not_a_socket(buf, errnum, call)
}

/// Interface requests name the interface in the first field of `ifreq`.
fn explain_interface(
    buf: &mut BoundedBuffer,
    errnum: i32,
    desc: &Descriptor,
    call: &IoctlCall,
) -> bool {
    match errnum {
        libc::ENODEV | libc::ENXIO => {
            let Some(name) = call.data.read(IFNAMSIZ) else {
                return false;
            };
            let raw = name.bytes();
            let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
            if host::interface_exists(&raw[..end]) {
                return false;
            }
            buf.puts("there is no network interface named ");
            buf.put_quoted_n(raw, IFNAMSIZ);
            true
        }
        libc::EPERM if desc.direction.is_input() => privilege::missing(buf, Capability::NetAdmin),
        _ => not_a_socket(buf, errnum, call),
    }
}

pub static DESCRIPTORS: &[Descriptor] = &[
    Descriptor::new("SIOCINQ", 0x541B)
        .only_if(ASM_GENERIC)
        .output(4, "int *")
        .with_disambiguate(is_socket)
        .with_print_returned(data::int_out)
        .with_explanation(explain_socket),
    Descriptor::new("SIOCOUTQ", 0x5411)
        .only_if(ASM_GENERIC)
        .output(4, "int *")
        .with_disambiguate(is_socket)
        .with_print_returned(data::int_out)
        .with_explanation(explain_socket),
    Descriptor::new("FIOSETOWN", 0x8901)
        .only_if(ASM_GENERIC)
        .input(4, "const int *")
        .with_print_data(data::int_in)
        .with_explanation(explain_socket),
    Descriptor::new("SIOCSPGRP", 0x8902)
        .only_if(ASM_GENERIC)
        .input(4, "const int *")
        .with_print_data(data::int_in)
        .with_explanation(explain_socket),
    Descriptor::new("FIOGETOWN", 0x8903)
        .only_if(ASM_GENERIC)
        .output(4, "int *")
        .with_print_returned(data::int_out)
        .with_explanation(explain_socket),
    Descriptor::new("SIOCGPGRP", 0x8904)
        .only_if(ASM_GENERIC)
        .output(4, "int *")
        .with_print_returned(data::int_out)
        .with_explanation(explain_socket),
    Descriptor::new("SIOCATMARK", 0x8905)
        .only_if(ASM_GENERIC)
        .output(4, "int *")
        .with_print_returned(data::int_out)
        .with_explanation(explain_socket),
    Descriptor::new("SIOCGSTAMP", 0x8906)
        .only_if(ASM_GENERIC)
        .output(TIMEVAL_SIZE, "struct timeval *")
        .with_print_returned(print_timeval_out)
        .with_explanation(explain_stamp),
    Descriptor::new("SIOCGIFNAME", 0x8910)
        .only_if(SUPPORTED)
        .in_out(DataSize::Bytes(IFREQ_SIZE), "struct ifreq *")
        .with_print_data(print_ifreq_index_in)
        .with_print_returned(print_ifreq_name_out)
        .with_explanation(explain_socket),
    Descriptor::new("SIOCGIFCONF", 0x8912)
        .only_if(SUPPORTED)
        .in_out(DataSize::Bytes(IFCONF_SIZE), "struct ifconf *")
        .with_print_data(print_ifconf_in)
        .with_print_returned(print_ifconf_out)
        .with_explanation(explain_socket),
    Descriptor::new("SIOCGIFFLAGS", 0x8913)
        .only_if(SUPPORTED)
        .in_out(DataSize::Bytes(IFREQ_SIZE), "struct ifreq *")
        .with_print_data(print_ifreq_name_in)
        .with_print_returned(print_flags_out)
        .with_explanation(explain_interface),
    Descriptor::new("SIOCSIFFLAGS", 0x8914)
        .only_if(SUPPORTED)
        .input(IFREQ_SIZE, "const struct ifreq *")
        .with_print_data(print_flags_in)
        .with_explanation(explain_interface),
    Descriptor::new("SIOCGIFMTU", 0x8921)
        .only_if(SUPPORTED)
        .in_out(DataSize::Bytes(IFREQ_SIZE), "struct ifreq *")
        .with_print_data(print_ifreq_name_in)
        .with_print_returned(print_mtu_out)
        .with_explanation(explain_interface),
    Descriptor::new("SIOCSIFMTU", 0x8922)
        .only_if(SUPPORTED)
        .input(IFREQ_SIZE, "const struct ifreq *")
        .with_print_data(print_mtu_in)
        .with_explanation(explain_interface),
    Descriptor::new("SIOCGIFINDEX", 0x8933)
        .only_if(SUPPORTED)
        .in_out(DataSize::Bytes(IFREQ_SIZE), "struct ifreq *")
        .with_print_data(print_ifreq_name_in)
        .with_print_returned(print_index_out)
        .with_explanation(explain_interface),
];
