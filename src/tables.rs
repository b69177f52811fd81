//! Name tables for the flag and enum arguments the explanations render.

use crate::buffer::BoundedBuffer;
use crate::codec::{self, Symbol};
use crate::libc_symbols;

pub const OPEN_ACCESS_MODES: &[Symbol] = libc_symbols![O_RDONLY, O_WRONLY, O_RDWR];

pub const OPEN_FLAGS: &[Symbol] = libc_symbols![
    O_CREAT,
    O_EXCL,
    O_NOCTTY,
    O_TRUNC,
    O_APPEND,
    O_NONBLOCK,
    O_DSYNC,
    O_ASYNC,
    O_DIRECT,
    O_DIRECTORY,
    O_NOFOLLOW,
    O_NOATIME,
    O_CLOEXEC,
    O_PATH,
];

/// Flags spanning several bits, named whole before the single bits are.
pub const OPEN_COMPOUND_FLAGS: &[Symbol] = libc_symbols![O_SYNC, O_TMPFILE];

/// Everything `open` accepts, for parsing.
pub const OPEN_FLAG_NAMES: &[Symbol] = libc_symbols![
    O_RDONLY,
    O_WRONLY,
    O_RDWR,
    O_CREAT,
    O_EXCL,
    O_NOCTTY,
    O_TRUNC,
    O_APPEND,
    O_NONBLOCK,
    O_DSYNC,
    O_ASYNC,
    O_DIRECT,
    O_DIRECTORY,
    O_NOFOLLOW,
    O_NOATIME,
    O_CLOEXEC,
    O_SYNC,
    O_PATH,
    O_TMPFILE,
    O_NDELAY,
];

pub const ACCESS_MODES: &[Symbol] = libc_symbols![F_OK, R_OK, W_OK, X_OK];

pub const TERMIOS_IFLAGS: &[Symbol] = libc_symbols![
    IGNBRK, BRKINT, IGNPAR, PARMRK, INPCK, ISTRIP, INLCR, IGNCR, ICRNL, IXON, IXANY, IXOFF, IMAXBEL,
    IUTF8,
];

pub const TERMIOS_OFLAGS: &[Symbol] =
    libc_symbols![OPOST, ONLCR, OCRNL, ONOCR, ONLRET, OFILL, OFDEL];

pub const TERMIOS_CFLAGS: &[Symbol] =
    libc_symbols![CSTOPB, CREAD, PARENB, PARODD, HUPCL, CLOCAL, CRTSCTS];

pub const TERMIOS_LFLAGS: &[Symbol] = libc_symbols![
    ISIG, ICANON, ECHO, ECHOE, ECHOK, ECHONL, NOFLSH, TOSTOP, ECHOCTL, ECHOPRT, ECHOKE, FLUSHO,
    PENDIN, IEXTEN,
];

pub const MODEM_LINES: &[Symbol] = libc_symbols![
    TIOCM_LE, TIOCM_DTR, TIOCM_RTS, TIOCM_ST, TIOCM_SR, TIOCM_CTS, TIOCM_CAR, TIOCM_RNG, TIOCM_DSR,
];

pub const FLUSH_QUEUES: &[Symbol] = libc_symbols![TCIFLUSH, TCOFLUSH, TCIOFLUSH];

pub const FLOW_ACTIONS: &[Symbol] = libc_symbols![TCOOFF, TCOON, TCIOFF, TCION];

pub const LINE_DISCIPLINES: &[Symbol] = &[
    Symbol::new("N_TTY", 0),
    Symbol::new("N_SLIP", 1),
    Symbol::new("N_MOUSE", 2),
    Symbol::new("N_PPP", 3),
    Symbol::new("N_STRIP", 4),
    Symbol::new("N_AX25", 5),
    Symbol::new("N_X25", 6),
    Symbol::new("N_6PACK", 7),
    Symbol::new("N_MASC", 8),
    Symbol::new("N_R3964", 9),
    Symbol::new("N_PROFIBUS_FDL", 10),
    Symbol::new("N_IRDA", 11),
    Symbol::new("N_SMSBLOCK", 12),
    Symbol::new("N_HDLC", 13),
    Symbol::new("N_SYNC_PPP", 14),
    Symbol::new("N_HCI", 15),
];

pub const INODE_FLAGS: &[Symbol] = &[
    Symbol::new("FS_SECRM_FL", 0x1),
    Symbol::new("FS_UNRM_FL", 0x2),
    Symbol::new("FS_COMPR_FL", 0x4),
    Symbol::new("FS_SYNC_FL", 0x8),
    Symbol::new("FS_IMMUTABLE_FL", 0x10),
    Symbol::new("FS_APPEND_FL", 0x20),
    Symbol::new("FS_NODUMP_FL", 0x40),
    Symbol::new("FS_NOATIME_FL", 0x80),
    Symbol::new("FS_INDEX_FL", 0x1000),
    Symbol::new("FS_JOURNAL_DATA_FL", 0x4000),
    Symbol::new("FS_NOTAIL_FL", 0x8000),
    Symbol::new("FS_DIRSYNC_FL", 0x10000),
    Symbol::new("FS_TOPDIR_FL", 0x20000),
    Symbol::new("FS_EXTENT_FL", 0x80000),
    Symbol::new("FS_NOCOW_FL", 0x800000),
    Symbol::new("FS_PROJINHERIT_FL", 0x20000000),
];

/// Inode flags only a privileged process may change.
pub const INODE_FLAGS_PRIVILEGED: u64 = 0x10 | 0x20;

pub const INTERFACE_FLAGS: &[Symbol] = libc_symbols![
    IFF_UP,
    IFF_BROADCAST,
    IFF_DEBUG,
    IFF_LOOPBACK,
    IFF_POINTOPOINT,
    IFF_NOTRAILERS,
    IFF_RUNNING,
    IFF_NOARP,
    IFF_PROMISC,
    IFF_ALLMULTI,
    IFF_MASTER,
    IFF_SLAVE,
    IFF_MULTICAST,
    IFF_PORTSEL,
    IFF_AUTOMEDIA,
    IFF_DYNAMIC,
];

/// `flags` as `open(2)` reads it: one access mode, then the rest.
pub fn print_open_flags(buf: &mut BoundedBuffer, flags: i32) {
    let flags = flags as u32 as u64;
    let accmode = libc::O_ACCMODE as u64;
    codec::print_value(buf, flags & accmode, OPEN_ACCESS_MODES);
    let mut rest = flags & !accmode;
    for sym in OPEN_COMPOUND_FLAGS {
        if rest & sym.value == sym.value {
            buf.puts(" | ");
            buf.puts(sym.name);
            rest &= !sym.value;
        }
    }
    if rest != 0 {
        buf.puts(" | ");
        codec::print_bits(buf, rest, OPEN_FLAGS);
    }
}

pub fn print_access_mode(buf: &mut BoundedBuffer, mode: i32) {
    codec::print_bits(buf, mode as u32 as u64, ACCESS_MODES);
}
