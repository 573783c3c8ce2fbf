use crate::error::*;

macro_rules! impl_access {
    ($type:ty, $size:literal, $load_name:ident, $store_name:ident) => {
        #[inline(always)]
        pub fn $load_name(&self, addr: i64) -> Result<$type, Error> {
            let start = self.bounds(addr, $size)?;
            let mut raw = [0u8; $size];
            raw.copy_from_slice(&self.data[start..start + $size]);
            Ok(<$type>::from_le_bytes(raw))
        }
        #[inline(always)]
        pub fn $store_name(&mut self, addr: i64, v: $type) -> Result<(), Error> {
            let start = self.bounds(addr, $size)?;
            self.data[start..start + $size].copy_from_slice(&v.to_le_bytes());
            Ok(())
        }
    };
}

/// Fixed-size, zero-initialized linear memory.
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    pub const PAGE_SIZE: usize = 65536;

    pub fn new(size: usize) -> Self {
        Self { data: vec![0; size] }
    }

    pub fn with_pages(pages: u32) -> Self {
        Self::new(pages as usize * Self::PAGE_SIZE)
    }

    pub fn size(&self) -> usize { self.data.len() }

    #[inline(always)]
    fn bounds(&self, addr: i64, len: usize) -> Result<usize, Error> {
        if addr < 0 { return Err(Error::trap(OOB_MEMORY_ACCESS)); }
        let start = usize::try_from(addr).map_err(|_| Error::trap(OOB_MEMORY_ACCESS))?;
        let end = start.checked_add(len).ok_or(Error::trap(OOB_MEMORY_ACCESS))?;
        if end > self.data.len() { return Err(Error::trap(OOB_MEMORY_ACCESS)); }
        Ok(start)
    }

    impl_access!(i32, 4, load_i32, store_i32);
    impl_access!(f64, 8, load_f64, store_f64);

    /// Reads the little-endian double at `addr`.
    #[inline(always)]
    pub fn load(&self, addr: i64) -> Result<f64, Error> { self.load_f64(addr) }

    #[inline(always)]
    pub fn store(&mut self, addr: i64, value: f64) -> Result<(), Error> { self.store_f64(addr, value) }

    pub fn write_bytes(&mut self, offset: usize, bytes: &[u8]) -> Result<(), Error> {
        let end = offset.checked_add(bytes.len()).ok_or(Error::trap(OOB_MEMORY_ACCESS))?;
        if end > self.data.len() { return Err(Error::trap(OOB_MEMORY_ACCESS)); }
        self.data[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    pub fn read_bytes(&self, offset: usize, len: usize) -> Result<&[u8], Error> {
        let end = offset.checked_add(len).ok_or(Error::trap(OOB_MEMORY_ACCESS))?;
        if end > self.data.len() { return Err(Error::trap(OOB_MEMORY_ACCESS)); }
        Ok(&self.data[offset..end])
    }
}
