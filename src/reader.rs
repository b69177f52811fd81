//! Cursor over bytes copied out of a foreign buffer.
//!
//! Values are decoded in native byte order: the bytes came from memory of
//! this machine, laid out by the same ABI.

pub struct DataReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> DataReader<'a> {
    pub fn new(data: &'a [u8], offset: usize) -> Self {
        Self { data, pos: offset }
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn read_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        if end <= self.data.len() {
            let bytes = &self.data[self.pos..end];
            self.pos = end;
            Some(bytes)
        } else {
            None
        }
    }

    fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        self.read_bytes(N)?.try_into().ok()
    }

    pub fn read_u8(&mut self) -> Option<u8> {
        let bytes = self.read_bytes(1)?;
        Some(bytes[0])
    }

    pub fn read_u16(&mut self) -> Option<u16> {
        self.read_array().map(u16::from_ne_bytes)
    }

    pub fn read_u32(&mut self) -> Option<u32> {
        self.read_array().map(u32::from_ne_bytes)
    }

    pub fn read_i32(&mut self) -> Option<i32> {
        self.read_array().map(i32::from_ne_bytes)
    }

    pub fn read_u64(&mut self) -> Option<u64> {
        self.read_array().map(u64::from_ne_bytes)
    }

    pub fn read_i64(&mut self) -> Option<i64> {
        self.read_array().map(i64::from_ne_bytes)
    }

    /// A C `long`, whatever its width on this target.
    pub fn read_long(&mut self) -> Option<i64> {
        if cfg!(target_pointer_width = "64") {
            self.read_i64()
        } else {
            self.read_i32().map(i64::from)
        }
    }

    pub fn skip(&mut self, len: usize) {
        self.pos = self.pos.saturating_add(len).min(self.data.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_native_order() {
        let mut data = Vec::new();
        data.extend_from_slice(&24u16.to_ne_bytes());
        data.extend_from_slice(&80u16.to_ne_bytes());
        data.extend_from_slice(&(-7i32).to_ne_bytes());
        data.extend_from_slice(&u64::MAX.to_ne_bytes());

        let mut reader = DataReader::new(&data, 0);
        assert_eq!(reader.read_u16(), Some(24));
        assert_eq!(reader.read_u16(), Some(80));
        assert_eq!(reader.read_i32(), Some(-7));
        assert_eq!(reader.read_u64(), Some(u64::MAX));
        assert_eq!(reader.remaining(), 0);
        assert_eq!(reader.read_u8(), None);
    }

    #[test]
    fn test_short_read_does_not_advance() {
        let data = [1u8, 2, 3];
        let mut reader = DataReader::new(&data, 0);
        assert_eq!(reader.read_u32(), None);
        assert_eq!(reader.read_u8(), Some(1));
        reader.skip(100);
        assert_eq!(reader.remaining(), 0);
    }
}
