use crate::buffer::BoundedBuffer;
use crate::errno;

/// The two halves of one explanation, before they are joined.
pub struct Record<'s> {
    pub errnum: i32,
    pub signature: BoundedBuffer<'s>,
    pub cause: BoundedBuffer<'s>,
}

impl<'s> Record<'s> {
    pub fn new(errnum: i32, signature: &'s mut [u8], cause: &'s mut [u8]) -> Self {
        Self {
            errnum,
            signature: BoundedBuffer::new(signature),
            cause: BoundedBuffer::new(cause),
        }
    }

    /// `<signature> failed, <cause> (<ERRNO> <n>, <description>)`
    ///
    /// However small `out` is, the text ends with the closing parenthesis
    /// if there was room for anything at all.
    pub fn assemble(&self, out: &mut BoundedBuffer) {
        let closing = out.reserve(1);
        out.puts(self.signature.as_str());
        out.puts(" failed, ");
        out.puts(self.cause.as_str());
        out.puts(" (");
        if let Some(name) = errno::name(self.errnum) {
            out.puts(name);
            out.putc(' ');
        }
        out.put_int(self.errnum.into());
        out.puts(", ");
        out.puts(&errno::description(self.errnum));
        if closing {
            out.release(1);
            out.putc(')');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_text(capacity: usize) -> String {
        let mut sig = [0u8; 64];
        let mut cause = [0u8; 256];
        let mut record = Record::new(libc::ENOENT, &mut sig, &mut cause);
        record.signature.puts("open(pathname = \"/x\")");
        record.cause.puts(&"z".repeat(200));
        let mut storage = vec![0u8; capacity];
        let mut out = BoundedBuffer::new(&mut storage);
        record.assemble(&mut out);
        out.as_str().to_string()
    }

    #[test]
    fn test_shape() {
        let mut sig = [0u8; 64];
        let mut cause = [0u8; 64];
        let mut record = Record::new(libc::EROFS, &mut sig, &mut cause);
        record.signature.puts("mkdir(pathname = \"/x\", mode = 0755)");
        record.cause.puts("the file system is mounted read-only");
        let mut storage = [0u8; 256];
        let mut out = BoundedBuffer::new(&mut storage);
        record.assemble(&mut out);
        assert_eq!(
            out.as_str(),
            "mkdir(pathname = \"/x\", mode = 0755) failed, the file system is mounted read-only (EROFS 30, Read-only file system)"
        );
    }

    #[test]
    fn test_truncated_keeps_closing_paren() {
        let text = record_text(16);
        assert_eq!(text.len(), 15);
        assert!(text.ends_with(')'));
        for capacity in 2..300 {
            assert!(record_text(capacity).ends_with(')'), "capacity {capacity}");
        }
    }

    #[test]
    fn test_tiny_buffers() {
        assert_eq!(record_text(0), "");
        assert_eq!(record_text(1), "");
    }

    #[test]
    fn test_unknown_errno() {
        let mut sig = [0u8; 16];
        let mut cause = [0u8; 16];
        let mut record = Record::new(9999, &mut sig, &mut cause);
        record.signature.puts("close(fildes = 3)");
        record.cause.puts("x");
        let mut storage = [0u8; 128];
        let mut out = BoundedBuffer::new(&mut storage);
        record.assemble(&mut out);
        assert!(out.as_str().ends_with("(9999, Unknown error 9999)"));
    }
}
