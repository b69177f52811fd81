//! Linux `_IOC` request encoding.

/// Whether the request numbers below mean anything on this target.
pub const SUPPORTED: bool = cfg!(any(target_os = "linux", target_os = "android"));

/// Terminal and legacy file requests use the asm-generic numbers everywhere
/// except these architectures, which keep their own.
pub const ASM_GENERIC: bool = SUPPORTED
    && !cfg!(any(
        target_arch = "powerpc",
        target_arch = "powerpc64",
        target_arch = "mips",
        target_arch = "mips64",
        target_arch = "sparc",
        target_arch = "sparc64"
    ));

#[cfg(not(any(
    target_arch = "powerpc",
    target_arch = "powerpc64",
    target_arch = "mips",
    target_arch = "mips64",
    target_arch = "sparc",
    target_arch = "sparc64"
)))]
mod layout {
    pub const SIZEBITS: u32 = 14;
    pub const DIRBITS: u32 = 2;
    pub const NONE: u64 = 0;
    pub const WRITE: u64 = 1;
    pub const READ: u64 = 2;
}

#[cfg(any(
    target_arch = "powerpc",
    target_arch = "powerpc64",
    target_arch = "mips",
    target_arch = "mips64",
    target_arch = "sparc",
    target_arch = "sparc64"
))]
mod layout {
    pub const SIZEBITS: u32 = 13;
    pub const DIRBITS: u32 = 3;
    pub const NONE: u64 = 1;
    pub const READ: u64 = 2;
    pub const WRITE: u64 = 4;
}

pub use layout::{NONE as IOC_NONE, READ as IOC_READ, WRITE as IOC_WRITE};

const NRBITS: u32 = 8;
const TYPEBITS: u32 = 8;
const NRSHIFT: u32 = 0;
const TYPESHIFT: u32 = NRSHIFT + NRBITS;
const SIZESHIFT: u32 = TYPESHIFT + TYPEBITS;
const DIRSHIFT: u32 = SIZESHIFT + layout::SIZEBITS;

pub const fn ioc(dir: u64, ty: u8, nr: u8, size: usize) -> u64 {
    (dir << DIRSHIFT)
        | ((ty as u64) << TYPESHIFT)
        | ((nr as u64) << NRSHIFT)
        | ((size as u64) << SIZESHIFT)
}

pub const fn io(ty: u8, nr: u8) -> u64 {
    ioc(IOC_NONE, ty, nr, 0)
}

pub const fn ior(ty: u8, nr: u8, size: usize) -> u64 {
    ioc(IOC_READ, ty, nr, size)
}

pub const fn iow(ty: u8, nr: u8, size: usize) -> u64 {
    ioc(IOC_WRITE, ty, nr, size)
}

pub const fn iowr(ty: u8, nr: u8, size: usize) -> u64 {
    ioc(IOC_READ | IOC_WRITE, ty, nr, size)
}

/// The fields of an encoded request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub dir: u64,
    pub ty: u8,
    pub nr: u8,
    pub size: usize,
}

pub fn decode(request: u64) -> Decoded {
    let mask = |bits: u32| (1u64 << bits) - 1;
    Decoded {
        dir: (request >> DIRSHIFT) & mask(layout::DIRBITS),
        ty: ((request >> TYPESHIFT) & mask(TYPEBITS)) as u8,
        nr: ((request >> NRSHIFT) & mask(NRBITS)) as u8,
        size: ((request >> SIZESHIFT) & mask(layout::SIZEBITS)) as usize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_known_encodings() {
        assert_eq!(ior(b'T', 0x30, 4), 0x8004_5430);
        assert_eq!(iow(b'T', 0x31, 4), 0x4004_5431);
        assert_eq!(ior(b'f', 1, 8), 0x8008_6601);
        assert_eq!(io(0x12, 93), 0x125d);
    }

    #[test]
    fn test_decode_inverts_encode() {
        let request = iowr(b'i', 0x20, 40);
        let expected = Decoded { dir: IOC_READ | IOC_WRITE, ty: b'i', nr: 0x20, size: 40 };
        assert_eq!(decode(request), expected);
    }
}
