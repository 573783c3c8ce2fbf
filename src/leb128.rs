use crate::error::*;

/// Reads an unsigned LEB128 integer of at most `bits` significant bits,
/// advancing `pc` past it only on success.
#[inline]
pub fn read_leb128<T>(bytes: &[u8], pc: &mut usize, bits: u32) -> Result<T, Error>
where T: TryFrom<u64> {
    let max_len = bits.div_ceil(7) as usize;
    let mut result: u64 = 0;
    let mut shift: u32 = 0;
    let mut end = *pc;
    loop {
        let byte = *bytes.get(end).ok_or(Error::malformed(UNEXPECTED_END))?;
        end += 1;
        if end - *pc > max_len { return Err(Error::malformed(INT_TOO_LONG)); }
        if shift < 64 {
            result |= ((byte & 0x7f) as u64) << shift;
        }
        if byte & 0x80 == 0 { break; }
        shift += 7;
    }
    if bits < 64 && result >> bits != 0 { return Err(Error::malformed(INT_TOO_LARGE)); }
    *pc = end;
    T::try_from(result).map_err(|_| Error::malformed(INT_TOO_LARGE))
}

/// Signed counterpart of [`read_leb128`]; `bits` is 32, 33 or 64.
#[inline]
pub fn read_sleb128<T>(bytes: &[u8], pc: &mut usize, bits: u32) -> Result<T, Error>
where T: TryFrom<i64> {
    let max_len = bits.div_ceil(7) as usize;
    let mut result: i64 = 0;
    let mut shift: u32 = 0;
    let mut end = *pc;
    let mut byte: u8;
    loop {
        byte = *bytes.get(end).ok_or(Error::malformed(UNEXPECTED_END))?;
        end += 1;
        if end - *pc > max_len { return Err(Error::malformed(INT_TOO_LONG)); }
        if shift < 64 {
            result |= ((byte & 0x7f) as i64) << shift;
        }
        shift += 7;
        if byte & 0x80 == 0 { break; }
    }
    if shift < 64 && byte & 0x40 != 0 {
        result |= -1i64 << shift;
    }
    if bits < 64 {
        let min = -(1i64 << (bits - 1));
        let max = (1i64 << (bits - 1)) - 1;
        if result < min || result > max { return Err(Error::malformed(INT_TOO_LARGE)); }
    }
    *pc = end;
    T::try_from(result).map_err(|_| Error::malformed(INT_TOO_LARGE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned() {
        let mut pc = 0;
        let v: u32 = read_leb128(&[0xe5, 0x8e, 0x26], &mut pc, 32).unwrap();
        assert_eq!((v, pc), (624485, 3));
    }

    #[test]
    fn signed() {
        let mut pc = 0;
        let v: i32 = read_sleb128(&[0xc0, 0xbb, 0x78], &mut pc, 32).unwrap();
        assert_eq!((v, pc), (-123456, 3));
        pc = 0;
        let v: i32 = read_sleb128(&[0x7f], &mut pc, 32).unwrap();
        assert_eq!(v, -1);
    }

    #[test]
    fn too_long_and_truncated() {
        let mut pc = 0;
        let r: Result<u32, _> = read_leb128(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x00], &mut pc, 32);
        assert_eq!(r, Err(Error::Malformed(INT_TOO_LONG)));
        assert_eq!(pc, 0);
        let r: Result<u32, _> = read_leb128(&[0x80, 0x80], &mut pc, 32);
        assert_eq!(r, Err(Error::Malformed(UNEXPECTED_END)));
    }

    #[test]
    fn too_large() {
        let mut pc = 0;
        let r: Result<u32, _> = read_leb128(&[0xff, 0xff, 0xff, 0xff, 0x7f], &mut pc, 32);
        assert_eq!(r, Err(Error::Malformed(INT_TOO_LARGE)));
    }
}
