use crate::error::*;
use crate::leb128::*;

/// Cursor over a module binary.
#[derive(Clone, Copy)]
pub struct ByteIter<'a> {
    pub bytes: &'a [u8],
    pub idx: usize,
}

impl<'a> ByteIter<'a> {
    #[inline]
    pub fn new(bytes: &'a [u8], idx: usize) -> Self { Self { bytes, idx } }
    #[inline]
    pub fn empty(&self) -> bool { self.idx >= self.bytes.len() }
    #[inline]
    pub fn has_n_left(&self, n: usize) -> bool { self.idx.checked_add(n).is_some_and(|end| end <= self.bytes.len()) }
    #[inline]
    pub fn cur(&self) -> usize { self.idx }
    #[inline]
    pub fn advance(&mut self, n: usize) -> Result<(), Error> {
        if !self.has_n_left(n) { return Err(Error::malformed(UNEXPECTED_END)); }
        self.idx += n;
        Ok(())
    }
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, Error> {
        let b = self.peek_u8()?;
        self.idx += 1;
        Ok(b)
    }
    #[inline]
    pub fn peek_u8(&self) -> Result<u8, Error> {
        self.bytes.get(self.idx).copied().ok_or(Error::malformed(UNEXPECTED_END))
    }
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32, Error> { read_leb128(self.bytes, &mut self.idx, 32) }
    #[inline]
    pub fn read_i32(&mut self) -> Result<i32, Error> { read_sleb128(self.bytes, &mut self.idx, 32) }
    #[inline]
    pub fn read_i64(&mut self) -> Result<i64, Error> { read_sleb128(self.bytes, &mut self.idx, 64) }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], Error> {
        let start = self.idx;
        self.advance(len)?;
        Ok(&self.bytes[start..self.idx])
    }

    pub fn read_f64(&mut self) -> Result<f64, Error> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.read_bytes(8)?);
        Ok(f64::from_le_bytes(raw))
    }

    /// Length-prefixed UTF-8 name.
    pub fn read_name(&mut self) -> Result<String, Error> {
        let len = self.read_u32()? as usize;
        let raw = self.read_bytes(len)?;
        std::str::from_utf8(raw).map(str::to_string).map_err(|_| Error::malformed(INVALID_UTF8))
    }
}
