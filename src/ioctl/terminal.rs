//! Terminal requests, `tty_ioctl(4)`.

use super::disambiguate::is_char_device;
use super::number::{ASM_GENERIC, SUPPORTED, ior, iow};
use super::{Descriptor, IoctlCall, data};
use crate::buffer::BoundedBuffer;
use crate::codec::{self, Symbol};
use crate::explain::privilege;
use crate::host::{self, Capability};
use crate::reader::DataReader;
use crate::tables::{
    FLOW_ACTIONS, FLUSH_QUEUES, LINE_DISCIPLINES, MODEM_LINES, TERMIOS_CFLAGS, TERMIOS_IFLAGS,
    TERMIOS_LFLAGS, TERMIOS_OFLAGS,
};

/// The kernel's `struct termios`, which lacks the libc speed fields.
const TERMIOS_SIZE: usize = 36;
const WINSIZE_SIZE: usize = 8;

fn termios(buf: &mut BoundedBuffer, reader: &mut DataReader) {
    let fields: [(&str, &[Symbol]); 4] = [
        ("c_iflag", TERMIOS_IFLAGS),
        ("c_oflag", TERMIOS_OFLAGS),
        ("c_cflag", TERMIOS_CFLAGS),
        ("c_lflag", TERMIOS_LFLAGS),
    ];
    for (i, (name, table)) in fields.into_iter().enumerate() {
        let Some(value) = reader.read_u32() else {
            return;
        };
        if i > 0 {
            buf.puts(", ");
        }
        buf.puts(name);
        buf.puts(" = ");
        codec::print_bits(buf, value.into(), table);
    }
    if let Some(line) = reader.read_u8() {
        buf.puts(", c_line = ");
        codec::print_value(buf, line.into(), LINE_DISCIPLINES);
    }
}

fn winsize(buf: &mut BoundedBuffer, reader: &mut DataReader) {
    let names = ["ws_row", "ws_col", "ws_xpixel", "ws_ypixel"];
    for (i, name) in names.into_iter().enumerate() {
        let Some(value) = reader.read_u16() else {
            return;
        };
        if i > 0 {
            buf.puts(", ");
        }
        buf.puts(name);
        buf.puts(" = ");
        buf.put_uint(value.into());
    }
}

fn print_termios_in(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    buf.put_ptr(call.data.addr());
    data::append_braced(buf, call.data, TERMIOS_SIZE, termios);
}

fn print_termios_out(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    data::braced(buf, call.data, TERMIOS_SIZE, termios);
}

fn print_winsize_in(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    buf.put_ptr(call.data.addr());
    data::append_braced(buf, call.data, WINSIZE_SIZE, winsize);
}

fn print_winsize_out(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    data::braced(buf, call.data, WINSIZE_SIZE, winsize);
}

fn print_modem_in(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    data::int_bits_in(buf, call, MODEM_LINES);
}

fn print_modem_out(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    data::int_bits_out(buf, call, MODEM_LINES);
}

fn print_discipline_in(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    data::int_value_in(buf, call, LINE_DISCIPLINES);
}

fn print_discipline_out(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    data::int_value_out(buf, call, LINE_DISCIPLINES);
}

fn print_flow_action(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    codec::print_int(buf, call.immediate(), FLOW_ACTIONS);
}

fn print_flush_queue(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    codec::print_int(buf, call.immediate(), FLUSH_QUEUES);
}

fn print_char_in(buf: &mut BoundedBuffer, _desc: &Descriptor, call: &IoctlCall) {
    buf.put_ptr(call.data.addr());
    data::append_braced(buf, call.data, 1, |b, r| {
        if let Some(c) = r.read_bytes(1) {
            b.put_quoted_n(c, 1);
        }
    });
}

/// Shared by every terminal request: ENOTTY means the descriptor isn't one.
fn explain_not_a_terminal(buf: &mut BoundedBuffer, errnum: i32, call: &IoctlCall) -> bool {
    if errnum != libc::ENOTTY || !host::fd_is_open(call.fildes) || host::is_tty(call.fildes) {
        return false;
    }
    buf.puts("the fildes argument does not refer to a terminal");
    if let Some(kind) = host::fd_kind(call.fildes) {
        buf.puts(", it refers to a ");
        buf.puts(kind.describe());
    }
    true
}

fn explain_terminal(
    buf: &mut BoundedBuffer,
    errnum: i32,
    _desc: &Descriptor,
    call: &IoctlCall,
) -> bool {
    explain_not_a_terminal(buf, errnum, call)
}

fn explain_tcsets(
    buf: &mut BoundedBuffer,
    errnum: i32,
    _desc: &Descriptor,
    call: &IoctlCall,
) -> bool {
    if errnum == libc::EINVAL {
        buf.puts("the termios structure pointed to by the data argument holds a setting the terminal does not support");
        return true;
    }
    explain_not_a_terminal(buf, errnum, call)
}

fn explain_sctty(
    buf: &mut BoundedBuffer,
    errnum: i32,
    _desc: &Descriptor,
    call: &IoctlCall,
) -> bool {
    if errnum != libc::EPERM {
        return explain_not_a_terminal(buf, errnum, call);
    }
    if !host::is_session_leader() {
        buf.puts("the process is not a session leader");
        return true;
    }
    buf.puts("the terminal is already the controlling terminal of another session");
    if call.immediate() == 1 && !host::has_capability(Capability::SysAdmin) {
        buf.puts(", and the process does not have the CAP_SYS_ADMIN capability required to steal it");
    }
    true
}

fn explain_not_controlling(
    buf: &mut BoundedBuffer,
    errnum: i32,
    _desc: &Descriptor,
    call: &IoctlCall,
) -> bool {
    if errnum == libc::ENOTTY && host::is_tty(call.fildes) {
        buf.puts("the terminal is not the controlling terminal of the calling process");
        return true;
    }
    explain_not_a_terminal(buf, errnum, call)
}

fn explain_spgrp(
    buf: &mut BoundedBuffer,
    errnum: i32,
    desc: &Descriptor,
    call: &IoctlCall,
) -> bool {
    match errnum {
        libc::EPERM => {
            buf.puts("the process group is in a different session than the calling process");
            true
        }
        libc::ESRCH | libc::EINVAL => {
            buf.puts("the data argument does not name an existing process group");
            true
        }
        _ => explain_not_controlling(buf, errnum, desc, call),
    }
}

fn explain_sti(buf: &mut BoundedBuffer, errnum: i32, _desc: &Descriptor, call: &IoctlCall) -> bool {
    if errnum == libc::EPERM {
        if !privilege::missing(buf, Capability::SysAdmin) {
            return false;
        }
        buf.puts(", and the terminal is not the controlling terminal of the calling process");
        return true;
    }
    explain_not_a_terminal(buf, errnum, call)
}

fn explain_cons(
    buf: &mut BoundedBuffer,
    errnum: i32,
    _desc: &Descriptor,
    call: &IoctlCall,
) -> bool {
    if errnum == libc::EPERM {
        return privilege::missing(buf, Capability::SysAdmin);
    }
    if errnum == libc::EBUSY {
        buf.puts("console output is already redirected to another terminal");
        return true;
    }
    explain_not_a_terminal(buf, errnum, call)
}

fn explain_setd(
    buf: &mut BoundedBuffer,
    errnum: i32,
    _desc: &Descriptor,
    call: &IoctlCall,
) -> bool {
    if errnum == libc::EINVAL {
        buf.puts("the data argument does not name a known line discipline");
        return true;
    }
    explain_not_a_terminal(buf, errnum, call)
}

fn explain_ptmx(
    buf: &mut BoundedBuffer,
    errnum: i32,
    _desc: &Descriptor,
    call: &IoctlCall,
) -> bool {
    if (errnum != libc::ENOTTY && errnum != libc::EINVAL) || !host::fd_is_open(call.fildes) {
        return false;
    }
    buf.puts("the fildes argument does not refer to a pseudo-terminal master");
    true
}

const TERMIOS: &str = "struct termios *";

pub static DESCRIPTORS: &[Descriptor] = &[
    Descriptor::new("TCGETS", 0x5401)
        .only_if(ASM_GENERIC)
        .output(TERMIOS_SIZE, TERMIOS)
        .with_print_returned(print_termios_out)
        .with_explanation(explain_terminal),
    Descriptor::new("TCSETS", 0x5402)
        .only_if(ASM_GENERIC)
        .input(TERMIOS_SIZE, "const struct termios *")
        .with_print_data(print_termios_in)
        .with_explanation(explain_tcsets),
    Descriptor::new("TCSETSW", 0x5403)
        .only_if(ASM_GENERIC)
        .input(TERMIOS_SIZE, "const struct termios *")
        .with_print_data(print_termios_in)
        .with_explanation(explain_tcsets),
    Descriptor::new("TCSETSF", 0x5404)
        .only_if(ASM_GENERIC)
        .input(TERMIOS_SIZE, "const struct termios *")
        .with_print_data(print_termios_in)
        .with_explanation(explain_tcsets),
    Descriptor::new("TCSBRK", 0x5409)
        .only_if(ASM_GENERIC)
        .immediate("int")
        .with_explanation(explain_terminal),
    Descriptor::new("TCXONC", 0x540A)
        .only_if(ASM_GENERIC)
        .immediate("int")
        .with_print_data(print_flow_action)
        .with_explanation(explain_terminal),
    Descriptor::new("TCFLSH", 0x540B)
        .only_if(ASM_GENERIC)
        .immediate("int")
        .with_print_data(print_flush_queue)
        .with_explanation(explain_terminal),
    Descriptor::new("TIOCEXCL", 0x540C)
        .only_if(ASM_GENERIC)
        .with_explanation(explain_terminal),
    Descriptor::new("TIOCNXCL", 0x540D)
        .only_if(ASM_GENERIC)
        .with_explanation(explain_terminal),
    Descriptor::new("TIOCSCTTY", 0x540E)
        .only_if(ASM_GENERIC)
        .immediate("int")
        .with_explanation(explain_sctty),
    Descriptor::new("TIOCGPGRP", 0x540F)
        .only_if(ASM_GENERIC)
        .output(4, "pid_t *")
        .with_print_returned(data::int_out)
        .with_explanation(explain_not_controlling),
    Descriptor::new("TIOCSPGRP", 0x5410)
        .only_if(ASM_GENERIC)
        .input(4, "const pid_t *")
        .with_print_data(data::int_in)
        .with_explanation(explain_spgrp),
    Descriptor::new("TIOCOUTQ", 0x5411)
        .only_if(ASM_GENERIC)
        .output(4, "int *")
        .with_disambiguate(is_char_device)
        .with_print_returned(data::int_out)
        .with_explanation(explain_terminal),
    Descriptor::new("TIOCSTI", 0x5412)
        .only_if(ASM_GENERIC)
        .input(1, "const char *")
        .with_print_data(print_char_in)
        .with_explanation(explain_sti),
    Descriptor::new("TIOCGWINSZ", 0x5413)
        .only_if(ASM_GENERIC)
        .output(WINSIZE_SIZE, "struct winsize *")
        .with_print_returned(print_winsize_out)
        .with_explanation(explain_terminal),
    Descriptor::new("TIOCSWINSZ", 0x5414)
        .only_if(ASM_GENERIC)
        .input(WINSIZE_SIZE, "const struct winsize *")
        .with_print_data(print_winsize_in)
        .with_explanation(explain_terminal),
    Descriptor::new("TIOCMGET", 0x5415)
        .only_if(ASM_GENERIC)
        .output(4, "int *")
        .with_print_returned(print_modem_out)
        .with_explanation(explain_terminal),
    Descriptor::new("TIOCMBIS", 0x5416)
        .only_if(ASM_GENERIC)
        .input(4, "const int *")
        .with_print_data(print_modem_in)
        .with_explanation(explain_terminal),
    Descriptor::new("TIOCMBIC", 0x5417)
        .only_if(ASM_GENERIC)
        .input(4, "const int *")
        .with_print_data(print_modem_in)
        .with_explanation(explain_terminal),
    Descriptor::new("TIOCMSET", 0x5418)
        .only_if(ASM_GENERIC)
        .input(4, "const int *")
        .with_print_data(print_modem_in)
        .with_explanation(explain_terminal),
    Descriptor::new("TIOCGSOFTCAR", 0x5419)
        .only_if(ASM_GENERIC)
        .output(4, "int *")
        .with_print_returned(data::int_out)
        .with_explanation(explain_terminal),
    Descriptor::new("TIOCSSOFTCAR", 0x541A)
        .only_if(ASM_GENERIC)
        .input(4, "const int *")
        .with_print_data(data::int_in)
        .with_explanation(explain_terminal),
    Descriptor::new("TIOCINQ", 0x541B)
        .only_if(ASM_GENERIC)
        .output(4, "int *")
        .with_disambiguate(is_char_device)
        .with_print_returned(data::int_out)
        .with_explanation(explain_terminal),
    Descriptor::new("TIOCCONS", 0x541D)
        .only_if(ASM_GENERIC)
        .with_explanation(explain_cons),
    Descriptor::new("TIOCPKT", 0x5420)
        .only_if(ASM_GENERIC)
        .input(4, "const int *")
        .with_print_data(data::int_in)
        .with_explanation(explain_terminal),
    Descriptor::new("TIOCNOTTY", 0x5422)
        .only_if(ASM_GENERIC)
        .with_explanation(explain_not_controlling),
    Descriptor::new("TIOCSETD", 0x5423)
        .only_if(ASM_GENERIC)
        .input(4, "const int *")
        .with_print_data(print_discipline_in)
        .with_explanation(explain_setd),
    Descriptor::new("TIOCGETD", 0x5424)
        .only_if(ASM_GENERIC)
        .output(4, "int *")
        .with_print_returned(print_discipline_out)
        .with_explanation(explain_terminal),
    Descriptor::new("TCSBRKP", 0x5425)
        .only_if(ASM_GENERIC)
        .immediate("int")
        .with_explanation(explain_terminal),
    Descriptor::new("TIOCSBRK", 0x5427)
        .only_if(ASM_GENERIC)
        .with_explanation(explain_terminal),
    Descriptor::new("TIOCCBRK", 0x5428)
        .only_if(ASM_GENERIC)
        .with_explanation(explain_terminal),
    Descriptor::new("TIOCGSID", 0x5429)
        .only_if(ASM_GENERIC)
        .output(4, "pid_t *")
        .with_print_returned(data::int_out)
        .with_explanation(explain_not_controlling),
    Descriptor::new("TIOCGPTN", ior(b'T', 0x30, 4))
        .only_if(SUPPORTED)
        .output(4, "unsigned int *")
        .with_print_returned(data::int_out)
        .with_explanation(explain_ptmx),
    Descriptor::new("TIOCSPTLCK", iow(b'T', 0x31, 4))
        .only_if(SUPPORTED)
        .input(4, "const int *")
        .with_print_data(data::int_in)
        .with_explanation(explain_ptmx),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ForeignPtr;

    fn find(name: &str) -> &'static Descriptor {
        DESCRIPTORS.iter().find(|d| d.name == Some(name)).unwrap()
    }

    fn render(f: impl FnOnce(&mut BoundedBuffer)) -> String {
        let mut storage = [0u8; 512];
        let mut buf = BoundedBuffer::new(&mut storage);
        f(&mut buf);
        buf.as_str().to_string()
    }

    #[cfg(all(target_os = "linux", any(target_arch = "x86_64", target_arch = "aarch64")))]
    #[test]
    fn test_winsize_returned() {
        let ws: [u16; 4] = [24, 80, 0, 0];
        let call = IoctlCall::new(0, 0x5413, ForeignPtr::from_ptr(&ws));
        let text = render(|b| {
            find("TIOCGWINSZ").render_returned(b, 0, &call);
        });
        assert_eq!(text, "{ ws_row = 24, ws_col = 80, ws_xpixel = 0, ws_ypixel = 0 }");
    }

    #[cfg(all(target_os = "linux", any(target_arch = "x86_64", target_arch = "aarch64")))]
    #[test]
    fn test_termios_flags() {
        let mut raw = [0u8; TERMIOS_SIZE];
        raw[0..4].copy_from_slice(&(libc::ICRNL as u32).to_ne_bytes());
        raw[12..16].copy_from_slice(&(libc::ICANON as u32 | libc::ECHO as u32).to_ne_bytes());
        let call = IoctlCall::new(0, 0x5401, ForeignPtr::from_ptr(raw.as_ptr()));
        let text = render(|b| {
            find("TCGETS").render_returned(b, 0, &call);
        });
        assert!(text.starts_with("{ c_iflag = ICRNL, c_oflag = 0"), "{text}");
        assert!(text.contains("c_lflag = ICANON | ECHO"), "{text}");
        assert!(text.ends_with("c_line = N_TTY }"), "{text}");
    }

    #[cfg(all(target_os = "linux", any(target_arch = "x86_64", target_arch = "aarch64")))]
    #[test]
    fn test_flush_queue_immediate() {
        let call = IoctlCall::new(0, 0x540B, ForeignPtr::new(libc::TCIOFLUSH as u64));
        assert_eq!(render(|b| find("TCFLSH").render_data(b, &call)), "TCIOFLUSH");
    }

    #[test]
    fn test_not_a_terminal() {
        let file = tempfile::tempfile().unwrap();
        use std::os::fd::AsRawFd;
        let call = IoctlCall::new(file.as_raw_fd(), 0x5401, ForeignPtr::NULL);
        let text = render(|b| {
            assert!(explain_not_a_terminal(b, libc::ENOTTY, &call));
        });
        assert_eq!(text, "the fildes argument does not refer to a terminal, it refers to a regular file");
    }
}
