//! Fixed-capacity text sink.
//!
//! A [`BoundedBuffer`] writes into a region supplied by the caller and never
//! touches a byte outside of it. Everything that does not fit is dropped.
//! One byte is always kept back for a NUL terminator, so the region can be
//! handed to C code unchanged.

use std::fmt;

/// Append-only text buffer over a caller-owned byte region.
pub struct BoundedBuffer<'a> {
    data: &'a mut [u8],
    len: usize,
    reserved: usize,
}

impl<'a> BoundedBuffer<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        if let Some(first) = data.first_mut() {
            *first = 0;
        }
        Self { data, len: 0, reserved: 0 }
    }

    /// Size of the backing region, terminator included.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True once nothing more can be appended.
    pub fn is_full(&self) -> bool {
        self.room() == 0
    }

    pub fn as_str(&self) -> &str {
        // Only whole UTF-8 sequences are ever stored.
        std::str::from_utf8(&self.data[..self.len]).unwrap_or_default()
    }

    /// Text followed by its terminator.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        let end = (self.len + 1).min(self.data.len());
        &self.data[..end]
    }

    pub fn clear(&mut self) {
        self.len = 0;
        self.terminate();
    }

    fn limit(&self) -> usize {
        self.data.len().saturating_sub(1 + self.reserved)
    }

    fn room(&self) -> usize {
        self.limit().saturating_sub(self.len)
    }

    fn terminate(&mut self) {
        if let Some(slot) = self.data.get_mut(self.len) {
            *slot = 0;
        }
    }

    fn push_slice(&mut self, bytes: &[u8]) {
        self.data[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        self.terminate();
    }

    /// Keep `n` trailing bytes free until the matching [`release`](Self::release).
    ///
    /// Returns false, and reserves nothing, when fewer than `n` bytes remain.
    pub fn reserve(&mut self, n: usize) -> bool {
        if self.room() < n {
            return false;
        }
        self.reserved += n;
        true
    }

    pub fn release(&mut self, n: usize) {
        self.reserved = self.reserved.saturating_sub(n);
    }

    /// Append text, cutting it at the last character boundary that fits.
    pub fn puts(&mut self, s: &str) {
        let room = self.room();
        let mut cut = s.len().min(room);
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        self.push_slice(&s.as_bytes()[..cut]);
    }

    /// Append text only if all of it fits.
    pub fn puts_whole(&mut self, s: &str) -> bool {
        if s.len() > self.room() {
            return false;
        }
        self.push_slice(s.as_bytes());
        true
    }

    pub fn putc(&mut self, c: char) {
        let mut tmp = [0u8; 4];
        self.puts_whole(c.encode_utf8(&mut tmp));
    }

    pub fn put_int(&mut self, value: i64) {
        fmt::Write::write_fmt(self, format_args!("{value}")).ok();
    }

    pub fn put_uint(&mut self, value: u64) {
        fmt::Write::write_fmt(self, format_args!("{value}")).ok();
    }

    /// `NULL`, or the address as 16 hex digits.
    pub fn put_ptr(&mut self, addr: u64) {
        if addr == 0 {
            self.puts("NULL");
        } else {
            fmt::Write::write_fmt(self, format_args!("0x{addr:016x}")).ok();
        }
    }

    /// Append a C string in double quotes, stopping at the first NUL.
    pub fn put_quoted(&mut self, s: &[u8]) {
        self.put_quoted_n(s, s.len());
    }

    /// Append at most `n` bytes of `s` in double quotes.
    ///
    /// Meant for fixed-size character arrays that need not be NUL
    /// terminated. The closing quote is written even when the contents are
    /// cut short, and escape sequences are never split.
    pub fn put_quoted_n(&mut self, s: &[u8], n: usize) {
        if self.room() < 2 {
            return;
        }
        self.push_slice(b"\"");
        self.reserved += 1;
        let mut esc = [0u8; 4];
        for &c in s.iter().take(n).take_while(|&&c| c != 0) {
            let len = escape(c, &mut esc);
            if len > self.room() {
                break;
            }
            self.push_slice(&esc[..len]);
        }
        self.reserved -= 1;
        self.push_slice(b"\"");
    }

    /// Space separated pairs of hex digits.
    pub fn put_hex_dump(&mut self, bytes: &[u8]) {
        for (i, b) in bytes.iter().enumerate() {
            let mut tmp = [b' ', 0, 0];
            let pair = hex_pair(*b);
            tmp[1] = pair[0];
            tmp[2] = pair[1];
            let chunk = if i == 0 { &tmp[1..] } else { &tmp[..] };
            if chunk.len() > self.room() {
                break;
            }
            self.push_slice(chunk);
        }
    }
}

impl fmt::Write for BoundedBuffer<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.puts(s);
        Ok(())
    }
}

impl fmt::Debug for BoundedBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedBuffer")
            .field("text", &self.as_str())
            .field("capacity", &self.capacity())
            .finish()
    }
}

fn hex_pair(b: u8) -> [u8; 2] {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    [DIGITS[(b >> 4) as usize], DIGITS[(b & 0xf) as usize]]
}

/// Writes the escaped form of `c` into `out`, returning its length.
fn escape(c: u8, out: &mut [u8; 4]) -> usize {
    let short = match c {
        b'"' => Some(b'"'),
        b'\\' => Some(b'\\'),
        0x07 => Some(b'a'),
        0x08 => Some(b'b'),
        0x0c => Some(b'f'),
        b'\n' => Some(b'n'),
        b'\r' => Some(b'r'),
        b'\t' => Some(b't'),
        0x0b => Some(b'v'),
        _ => None,
    };
    if let Some(s) = short {
        out[0] = b'\\';
        out[1] = s;
        return 2;
    }
    if (0x20..0x7f).contains(&c) {
        out[0] = c;
        return 1;
    }
    out[0] = b'\\';
    out[1] = b'0' + (c >> 6);
    out[2] = b'0' + ((c >> 3) & 7);
    out[3] = b'0' + (c & 7);
    4
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write;

    fn unquote(text: &str) -> Vec<u8> {
        let inner = text.as_bytes();
        assert_eq!(inner.first(), Some(&b'"'));
        assert_eq!(inner.last(), Some(&b'"'));
        let inner = &inner[1..inner.len() - 1];
        let mut out = Vec::new();
        let mut i = 0;
        while i < inner.len() {
            if inner[i] != b'\\' {
                out.push(inner[i]);
                i += 1;
                continue;
            }
            let c = inner[i + 1];
            let decoded = match c {
                b'a' => 0x07,
                b'b' => 0x08,
                b'f' => 0x0c,
                b'n' => b'\n',
                b'r' => b'\r',
                b't' => b'\t',
                b'v' => 0x0b,
                b'0'..=b'7' => {
                    let digit = |k: usize| inner[i + k] - b'0';
                    let v = digit(1) * 64 + digit(2) * 8 + digit(3);
                    out.push(v);
                    i += 4;
                    continue;
                }
                other => other,
            };
            out.push(decoded);
            i += 2;
        }
        out
    }

    #[test]
    fn test_quote_embedded_quote() {
        let mut storage = [0u8; 64];
        let mut buf = BoundedBuffer::new(&mut storage);
        buf.put_quoted_n(b"ab\"c", 10);
        assert_eq!(buf.as_str(), r#""ab\"c""#);
    }

    #[test]
    fn test_quote_round_trip() {
        let input: Vec<u8> = (0u8..=255).collect();
        for bound in [0usize, 1, 7, 31, 200, 256] {
            let mut storage = [0u8; 2048];
            let mut buf = BoundedBuffer::new(&mut storage);
            // NUL stops a C string, so start past it
            buf.put_quoted_n(&input[1..], bound);
            let expected: Vec<u8> = input[1..].iter().copied().take(bound).collect();
            assert_eq!(unquote(buf.as_str()), expected, "bound {bound}");
        }
    }

    #[test]
    fn test_quote_keeps_closing_quote_when_truncated() {
        let mut storage = [0u8; 8];
        let mut buf = BoundedBuffer::new(&mut storage);
        buf.put_quoted(b"abcdefghijkl");
        assert_eq!(buf.as_str(), "\"abcde\"");
        assert_eq!(storage[7], 0);
    }

    #[test]
    fn test_quote_does_not_split_escapes() {
        let mut storage = [0u8; 6];
        let mut buf = BoundedBuffer::new(&mut storage);
        buf.put_quoted(b"a\n\n");
        assert_eq!(buf.as_str(), "\"a\\n\"");
    }

    #[test]
    fn test_quote_stops_at_nul() {
        let mut storage = [0u8; 32];
        let mut buf = BoundedBuffer::new(&mut storage);
        buf.put_quoted_n(b"eth0\0garbage", 16);
        assert_eq!(buf.as_str(), "\"eth0\"");
    }

    #[test]
    fn test_pointer_rendering() {
        let mut storage = [0u8; 64];
        let mut buf = BoundedBuffer::new(&mut storage);
        buf.put_ptr(0);
        buf.puts(" ");
        buf.put_ptr(0x1);
        assert_eq!(buf.as_str(), "NULL 0x0000000000000001");
    }

    #[test]
    fn test_hex_dump() {
        let mut storage = [0u8; 64];
        let mut buf = BoundedBuffer::new(&mut storage);
        buf.put_hex_dump(&[0x00, 0x1f, 0xab]);
        assert_eq!(buf.as_str(), "00 1f ab");
    }

    #[test]
    fn test_truncation_is_prefix_for_every_capacity() {
        let text = "open(pathname = \"/nonexistent\", flags = O_RDONLY) failed";
        for cap in 1..=text.len() + 4 {
            let mut storage = vec![0xffu8; cap];
            let mut buf = BoundedBuffer::new(&mut storage);
            for _ in 0..3 {
                buf.puts(text);
            }
            write!(buf, "{}", 12345).unwrap();
            let got = buf.as_str().to_string();
            let full = format!("{text}{text}{text}12345");
            assert!(full.starts_with(&got));
            assert_eq!(got.len(), (cap - 1).min(full.len()));
            assert_eq!(storage[got.len()], 0);
        }
    }

    #[test]
    fn test_multibyte_not_split() {
        let mut storage = [0u8; 4];
        let mut buf = BoundedBuffer::new(&mut storage);
        buf.puts("aé€");
        assert_eq!(buf.as_str(), "aé");
    }

    #[test]
    fn test_reserve_and_release() {
        let mut storage = [0u8; 6];
        let mut buf = BoundedBuffer::new(&mut storage);
        assert!(buf.reserve(1));
        buf.puts("abcdefgh");
        assert_eq!(buf.as_str(), "abcd");
        buf.release(1);
        buf.puts(")");
        assert_eq!(buf.as_str(), "abcd)");
        assert!(buf.is_full());
        assert!(!buf.reserve(1));
    }

    #[test]
    fn test_zero_capacity() {
        let mut storage: [u8; 0] = [];
        let mut buf = BoundedBuffer::new(&mut storage);
        buf.puts("anything");
        buf.put_quoted(b"x");
        assert_eq!(buf.as_str(), "");
        assert_eq!(buf.as_bytes_with_nul(), b"");
    }
}
