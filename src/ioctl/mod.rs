//! Device-control request catalogue and resolution.
//!
//! Request numbers are not unique: `0x541B` is `FIONREAD`, `TIOCINQ` and
//! `SIOCINQ` at once. Every known request has a [`Descriptor`]; several may
//! share a number, and [`resolve`] picks the one that fits the descriptor
//! the call was made on. Descriptors carry optional rendering hooks and fall
//! back to shared defaults when a hook is absent.

use std::sync::LazyLock;

use bitflags::bitflags;

use crate::buffer::BoundedBuffer;
use crate::codec::{self, Symbol};
use crate::probe::ForeignPtr;

mod block;
mod catalogue;
mod data;
pub mod disambiguate;
mod file;
mod generic;
pub mod number;
mod resolve;
mod socket;
mod terminal;

pub use catalogue::catalogue;
pub use resolve::{Outcome, Resolved, UNKNOWN, resolve, resolve_in};

/// The arguments of one `ioctl(fildes, request, data)` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoctlCall {
    pub fildes: i32,
    pub request: u64,
    pub data: ForeignPtr,
}

impl IoctlCall {
    pub fn new(fildes: i32, request: u64, data: ForeignPtr) -> Self {
        Self { fildes, request, data }
    }

    /// `data` read as the integer it is for requests that take one.
    pub fn immediate(&self) -> i64 {
        self.data.addr() as i64
    }
}

/// A disambiguation predicate's verdict on one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disambiguation {
    Use,
    DoNotUse,
    Undecided,
}

/// How big the object behind `data` is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSize {
    /// `data` is an integer, not an address.
    NotPointer,
    Bytes(usize),
}

/// Which way the pointed-to data travels, seen from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    None,
    In,
    Out,
    InOut,
}

impl Direction {
    pub fn is_input(self) -> bool {
        matches!(self, Direction::In | Direction::InOut)
    }

    pub fn is_output(self) -> bool {
        matches!(self, Direction::Out | Direction::InOut)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DescriptorFlags: u32 {
        /// The size encoded in the request number is not what the kernel
        /// actually transfers.
        const BAD_SIZE = 1 << 0;
        /// `data` is not a description of anything; don't guess at it.
        const NOT_META_DATA = 1 << 1;
    }
}

pub type Disambiguator = fn(&Descriptor, &IoctlCall) -> Disambiguation;
pub type Printer = fn(&mut BoundedBuffer, &Descriptor, &IoctlCall);
/// Writes a cause for `errnum`, returning false if it has nothing specific.
pub type Explainer = fn(&mut BoundedBuffer, i32, &Descriptor, &IoctlCall) -> bool;

/// One known device-control operation.
#[derive(Debug, Clone, Copy)]
pub struct Descriptor {
    /// Absent for requests that do not exist on this platform.
    pub name: Option<&'static str>,
    pub number: u64,
    pub disambiguate: Option<Disambiguator>,
    pub print_name: Option<Printer>,
    pub print_data: Option<Printer>,
    pub print_explanation: Option<Explainer>,
    pub print_data_returned: Option<Printer>,
    pub data_size: DataSize,
    pub direction: Direction,
    /// C type of `data`, for listings.
    pub data_type: &'static str,
    pub flags: DescriptorFlags,
    /// Errors after which the output was still written.
    pub output_errnos: &'static [i32],
}

impl Descriptor {
    pub const fn new(name: &'static str, number: u64) -> Self {
        Self {
            name: Some(name),
            number,
            disambiguate: None,
            print_name: None,
            print_data: None,
            print_explanation: None,
            print_data_returned: None,
            data_size: DataSize::NotPointer,
            direction: Direction::None,
            data_type: "void",
            flags: DescriptorFlags::empty(),
            output_errnos: &[],
        }
    }

    /// Keep the entry only where `available` holds.
    pub const fn only_if(mut self, available: bool) -> Self {
        if !available {
            self.name = None;
        }
        self
    }

    pub const fn input(mut self, size: usize, data_type: &'static str) -> Self {
        self.data_size = DataSize::Bytes(size);
        self.direction = Direction::In;
        self.data_type = data_type;
        self
    }

    pub const fn output(mut self, size: usize, data_type: &'static str) -> Self {
        self.data_size = DataSize::Bytes(size);
        self.direction = Direction::Out;
        self.data_type = data_type;
        self
    }

    pub const fn in_out(mut self, size: DataSize, data_type: &'static str) -> Self {
        self.data_size = size;
        self.direction = Direction::InOut;
        self.data_type = data_type;
        self
    }

    /// `data` is passed by value.
    pub const fn immediate(mut self, data_type: &'static str) -> Self {
        self.data_size = DataSize::NotPointer;
        self.direction = Direction::In;
        self.data_type = data_type;
        self.flags = self.flags.union(DescriptorFlags::NOT_META_DATA);
        self
    }

    pub const fn with_flags(mut self, flags: DescriptorFlags) -> Self {
        self.flags = self.flags.union(flags);
        self
    }

    pub const fn with_disambiguate(mut self, f: Disambiguator) -> Self {
        self.disambiguate = Some(f);
        self
    }

    pub const fn with_print_name(mut self, f: Printer) -> Self {
        self.print_name = Some(f);
        self
    }

    pub const fn with_print_data(mut self, f: Printer) -> Self {
        self.print_data = Some(f);
        self
    }

    pub const fn with_explanation(mut self, f: Explainer) -> Self {
        self.print_explanation = Some(f);
        self
    }

    pub const fn with_print_returned(mut self, f: Printer) -> Self {
        self.print_data_returned = Some(f);
        self
    }

    pub const fn with_output_errnos(mut self, errnos: &'static [i32]) -> Self {
        self.output_errnos = errnos;
        self
    }

    /// Bytes behind `data`, if it is a pointer of known size.
    pub fn byte_size(&self) -> Option<usize> {
        match self.data_size {
            DataSize::Bytes(n) => Some(n),
            _ => None,
        }
    }

    /// Whether the size field of the request number disagrees with
    /// [`byte_size`](Self::byte_size) on an entry not marked `BAD_SIZE`.
    ///
    /// Legacy numbers with no size field never disagree.
    pub fn size_mismatch(&self) -> bool {
        let encoded = number::decode(self.number).size;
        match self.byte_size() {
            Some(n) if encoded != 0 => {
                encoded != n && !self.flags.contains(DescriptorFlags::BAD_SIZE)
            }
            _ => false,
        }
    }

    pub fn render_name(&self, buf: &mut BoundedBuffer, call: &IoctlCall) {
        if let Some(print) = self.print_name {
            print(buf, self, call);
            return;
        }
        match self.name {
            Some(name) => buf.puts(name),
            None => data::print_raw_request(buf, call.request),
        }
    }

    /// The `data` argument, as the caller passed it.
    pub fn render_data(&self, buf: &mut BoundedBuffer, call: &IoctlCall) {
        if let Some(print) = self.print_data {
            print(buf, self, call);
            return;
        }
        if self.data_size == DataSize::NotPointer && self.direction != Direction::None {
            buf.put_int(call.immediate());
            return;
        }
        buf.put_ptr(call.data.addr());
        if self.direction.is_input() && !self.flags.contains(DescriptorFlags::NOT_META_DATA) {
            if let Some(size) = self.byte_size() {
                data::append_braced(buf, call.data, size, data::hex);
            }
        }
    }

    /// A cause for `errnum`, never empty.
    pub fn render_explanation(&self, buf: &mut BoundedBuffer, errnum: i32, call: &IoctlCall) {
        if let Some(explain) = self.print_explanation {
            if explain(buf, errnum, self, call) {
                return;
            }
        }
        if generic::explain(buf, errnum, self, call) {
            return;
        }
        crate::explain::generic::print(buf, errnum);
    }

    /// What the kernel wrote back through `data`.
    ///
    /// Only tried after success, or after an error this request still
    /// writes its output on. Returns whether anything was printed.
    pub fn render_returned(&self, buf: &mut BoundedBuffer, errnum: i32, call: &IoctlCall) -> bool {
        if errnum != 0 && !self.output_errnos.contains(&errnum) {
            return false;
        }
        if !self.direction.is_output() || self.data_size == DataSize::NotPointer {
            return false;
        }
        let before = buf.len();
        if let Some(print) = self.print_data_returned {
            print(buf, self, call);
        } else if !self.flags.contains(DescriptorFlags::NOT_META_DATA) {
            if let Some(size) = self.byte_size() {
                data::braced(buf, call.data, size, data::hex);
            }
        }
        buf.len() > before
    }
}

/// Request names as a codec table, for parsing.
pub static REQUEST_SYMBOLS: LazyLock<Vec<Symbol>> = LazyLock::new(|| {
    catalogue()
        .iter()
        .filter_map(|d| d.name.map(|name| Symbol::new(name, d.number)))
        .collect()
});

/// Parse a request given by name or number.
pub fn parse_request(text: &str) -> Result<u64, codec::ParseError> {
    codec::parse_bits(text, &REQUEST_SYMBOLS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut BoundedBuffer)) -> String {
        let mut storage = [0u8; 512];
        let mut buf = BoundedBuffer::new(&mut storage);
        f(&mut buf);
        buf.as_str().to_string()
    }

    static PLAIN: Descriptor = Descriptor::new("PLAIN", 0x1234).input(4, "const int *");

    #[test]
    fn test_default_data_reads_input() {
        let value: i32 = 1;
        let call = IoctlCall::new(0, 0x1234, ForeignPtr::from_ptr(&value));
        let text = render(|b| PLAIN.render_data(b, &call));
        assert!(text.starts_with("0x"));
        let hex: Vec<String> = value.to_ne_bytes().iter().map(|b| format!("{b:02x}")).collect();
        assert!(text.ends_with(&format!("{{ {} }}", hex.join(" "))));
    }

    #[test]
    fn test_default_data_bad_pointer() {
        let call = IoctlCall::new(0, 0x1234, ForeignPtr::new(0x1));
        assert_eq!(render(|b| PLAIN.render_data(b, &call)), "0x0000000000000001");
    }

    #[test]
    fn test_immediate_data() {
        static IMM: Descriptor = Descriptor::new("IMM", 0x1).immediate("int");
        let call = IoctlCall::new(0, 0x1, ForeignPtr::new(7));
        assert_eq!(render(|b| IMM.render_data(b, &call)), "7");
    }

    #[test]
    fn test_returned_needs_success() {
        static OUT: Descriptor =
            Descriptor::new("OUT", 0x2).output(4, "int *").with_output_errnos(&[libc::EINTR]);
        let value: i32 = 0x01020304;
        let call = IoctlCall::new(0, 0x2, ForeignPtr::from_ptr(&value));
        assert_eq!(render(|b| assert!(!OUT.render_returned(b, libc::EINVAL, &call))), "");
        assert!(!render(|b| assert!(OUT.render_returned(b, 0, &call))).is_empty());
        assert!(!render(|b| assert!(OUT.render_returned(b, libc::EINTR, &call))).is_empty());
    }

    #[test]
    fn test_explanation_falls_back_to_generic() {
        let call = IoctlCall::new(0, 0x1234, ForeignPtr::NULL);
        let text = render(|b| PLAIN.render_explanation(b, libc::ENOMEM, &call));
        assert!(!text.is_empty());
    }

    #[test]
    fn test_size_field_checked_unless_bad_size() {
        let wide = number::iow(b'x', 1, 8);
        assert!(Descriptor::new("NARROW", wide).input(4, "const int *").size_mismatch());
        assert!(
            !Descriptor::new("NARROW", wide)
                .input(4, "const int *")
                .with_flags(DescriptorFlags::BAD_SIZE)
                .size_mismatch()
        );
        assert!(!Descriptor::new("EXACT", wide).input(8, "const long *").size_mismatch());
        assert!(!Descriptor::new("LEGACY", 0x5401).output(36, "struct termios *").size_mismatch());
    }

    #[test]
    fn test_placeholder_has_no_name() {
        let d = Descriptor::new("GONE", 0x99).only_if(false);
        assert_eq!(d.name, None);
    }
}
