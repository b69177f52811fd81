//! Renderers for argument values in a call signature.

use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::buffer::BoundedBuffer;
use crate::codec;
use crate::host;

/// Opens a signature: `name(`.
pub fn begin(buf: &mut BoundedBuffer, name: &str) {
    buf.puts(name);
    buf.putc('(');
}

/// `name = ` with a separator before every argument after the first.
pub fn arg(buf: &mut BoundedBuffer, first: bool, name: &str) {
    if !first {
        buf.puts(", ");
    }
    buf.puts(name);
    buf.puts(" = ");
}

pub fn end(buf: &mut BoundedBuffer) {
    buf.putc(')');
}

pub fn pathname(buf: &mut BoundedBuffer, path: &Path) {
    buf.put_quoted(path.as_os_str().as_bytes());
}

/// The descriptor number, followed by the file it is open on when known.
pub fn fildes(buf: &mut BoundedBuffer, fd: i32) {
    buf.put_int(fd.into());
    if let Some(path) = host::fd_path(fd) {
        buf.putc(' ');
        pathname(buf, &path);
    }
}

fn id(buf: &mut BoundedBuffer, id: u32, name: Option<String>) {
    if id == u32::MAX {
        buf.puts("-1");
        return;
    }
    buf.put_uint(id.into());
    if let Some(name) = name {
        buf.putc(' ');
        buf.put_quoted(name.as_bytes());
    }
}

pub fn uid(buf: &mut BoundedBuffer, uid: u32) {
    id(buf, uid, host::user_name(uid));
}

pub fn gid(buf: &mut BoundedBuffer, gid: u32) {
    id(buf, gid, host::group_name(gid));
}

/// Permission bits in C octal.
pub fn mode(buf: &mut BoundedBuffer, mode: u32) {
    codec::print_octal(buf, mode.into());
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
    fn test_signature_pieces() {
        let text = render(|b| {
            begin(b, "mkdir");
            arg(b, true, "pathname");
            pathname(b, Path::new("/tmp/x"));
            arg(b, false, "mode");
            mode(b, 0o755);
            end(b);
        });
        assert_eq!(text, "mkdir(pathname = \"/tmp/x\", mode = 0755)");
    }

    #[test]
    fn test_root_ids() {
        assert_eq!(render(|b| uid(b, 0)), "0 \"root\"");
        assert_eq!(render(|b| gid(b, u32::MAX)), "-1");
    }

    #[test]
    fn test_closed_fildes_is_bare() {
        assert_eq!(render(|b| fildes(b, 9999)), "9999");
    }
}
