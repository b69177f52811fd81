//! Shared renderers for the things `data` commonly points at.

use std::fmt::Write;

use super::{Descriptor, IoctlCall};
use crate::buffer::BoundedBuffer;
use crate::codec::{self, Symbol};
use crate::probe::ForeignPtr;
use crate::reader::DataReader;

pub fn print_raw_request(buf: &mut BoundedBuffer, request: u64) {
    write!(buf, "{request:#X}").ok();
}

/// `{ ... }` around whatever `f` makes of the bytes at `ptr`.
///
/// Prints nothing and returns false when the bytes are not readable.
pub fn braced(
    buf: &mut BoundedBuffer,
    ptr: ForeignPtr,
    size: usize,
    f: impl FnOnce(&mut BoundedBuffer, &mut DataReader),
) -> bool {
    let Some(readable) = ptr.read(size) else {
        return false;
    };
    buf.puts("{ ");
    f(buf, &mut readable.reader());
    buf.puts(" }");
    true
}

/// Like [`braced`], after a separating space.
pub fn append_braced(
    buf: &mut BoundedBuffer,
    ptr: ForeignPtr,
    size: usize,
    f: impl FnOnce(&mut BoundedBuffer, &mut DataReader),
) -> bool {
    let Some(readable) = ptr.read(size) else {
        return false;
    };
    buf.puts(" { ");
    f(buf, &mut readable.reader());
    buf.puts(" }");
    true
}

pub fn hex(buf: &mut BoundedBuffer, reader: &mut DataReader) {
    let n = reader.remaining();
    if let Some(bytes) = reader.read_bytes(n) {
        buf.put_hex_dump(bytes);
    }
}

fn int(buf: &mut BoundedBuffer, reader: &mut DataReader) {
    match reader.read_i32() {
        Some(v) => buf.put_int(v.into()),
        None => buf.puts("?"),
    }
}

fn long(buf: &mut BoundedBuffer, reader: &mut DataReader) {
    match reader.read_long() {
        Some(v) => buf.put_int(v),
        None => buf.puts("?"),
    }
}

fn u64_value(buf: &mut BoundedBuffer, reader: &mut DataReader) {
    match reader.read_u64() {
        Some(v) => buf.put_uint(v),
        None => buf.puts("?"),
    }
}

fn int_bits(buf: &mut BoundedBuffer, reader: &mut DataReader, table: &[Symbol]) {
    match reader.read_i32() {
        Some(v) => codec::print_bits(buf, v as u32 as u64, table),
        None => buf.puts("?"),
    }
}

fn int_value(buf: &mut BoundedBuffer, reader: &mut DataReader, table: &[Symbol]) {
    match reader.read_i32() {
        Some(v) => codec::print_int(buf, v.into(), table),
        None => buf.puts("?"),
    }
}

/// Pointer to an `int` the kernel reads.
pub fn int_in(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    buf.put_ptr(call.data.addr());
    append_braced(buf, call.data, 4, int);
}

/// An `int` the kernel wrote.
pub fn int_out(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    braced(buf, call.data, 4, int);
}

pub fn long_out(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    braced(buf, call.data, std::mem::size_of::<libc::c_long>(), long);
}

pub fn u64_out(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    braced(buf, call.data, 8, u64_value);
}

pub fn int_bits_in(buf: &mut BoundedBuffer, call: &IoctlCall, table: &[Symbol]) {
    buf.put_ptr(call.data.addr());
    append_braced(buf, call.data, 4, |b, r| int_bits(b, r, table));
}

pub fn int_bits_out(buf: &mut BoundedBuffer, call: &IoctlCall, table: &[Symbol]) {
    braced(buf, call.data, 4, |b, r| int_bits(b, r, table));
}

pub fn int_value_in(buf: &mut BoundedBuffer, call: &IoctlCall, table: &[Symbol]) {
    buf.put_ptr(call.data.addr());
    append_braced(buf, call.data, 4, |b, r| int_value(b, r, table));
}

pub fn int_value_out(buf: &mut BoundedBuffer, call: &IoctlCall, table: &[Symbol]) {
    braced(buf, call.data, 4, |b, r| int_value(b, r, table));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut BoundedBuffer)) -> String {
        let mut storage = [0u8; 256];
        let mut buf = BoundedBuffer::new(&mut storage);
        f(&mut buf);
        buf.as_str().to_string()
    }

    #[test]
    fn test_raw_request() {
        assert_eq!(render(|b| print_raw_request(b, 0x541b)), "0x541B");
    }

    #[test]
    fn test_int_out() {
        let value: i32 = -12;
        let call = IoctlCall::new(0, 0, ForeignPtr::from_ptr(&value));
        let desc = Descriptor::new("X", 0);
        assert_eq!(render(|b| int_out(b, &desc, &call)), "{ -12 }");
    }

    #[test]
    fn test_int_in_unreadable() {
        let call = IoctlCall::new(0, 0, ForeignPtr::new(0x8));
        let desc = Descriptor::new("X", 0);
        assert_eq!(render(|b| int_in(b, &desc, &call)), "0x0000000000000008");
    }

    #[test]
    fn test_bits_in() {
        let value: i32 = libc::TIOCM_DTR | libc::TIOCM_RTS;
        let call = IoctlCall::new(0, 0, ForeignPtr::from_ptr(&value));
        let text = render(|b| int_bits_in(b, &call, crate::tables::MODEM_LINES));
        assert!(text.ends_with(" { TIOCM_DTR | TIOCM_RTS }"), "{text}");
    }
}
