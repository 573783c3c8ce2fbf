use crate::byte_iter::ByteIter;
use crate::error::*;
use crate::value::{val_type_from_byte, ValType};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<ValType>,
    pub result: Option<ValType>,
}

impl Signature {
    /// Reads one `0x60 params results` entry of the type section.
    pub fn read(it: &mut ByteIter) -> Result<Signature, Error> {
        if it.read_u8()? != 0x60 { return Err(Error::malformed(INVALID_VALUE_TYPE)); }

        let n_params = it.read_u32()?;
        let mut sig = Signature::default();
        for _ in 0..n_params {
            sig.params.push(read_val_type(it)?);
        }

        match it.read_u32()? {
            0 => {}
            1 => sig.result = Some(read_val_type(it)?),
            _ => return Err(Error::malformed(INVALID_RESULT_ARITY)),
        }
        Ok(sig)
    }
}

pub fn read_val_type(it: &mut ByteIter) -> Result<ValType, Error> {
    val_type_from_byte(it.read_u8()?).ok_or(Error::malformed(INVALID_VALUE_TYPE))
}

/// Consumes a structured instruction's block type. Block results are not
/// tracked, so only the encoding is checked.
pub fn skip_block_type(it: &mut ByteIter, n_types: usize) -> Result<(), Error> {
    const VOID: u8 = 0x40;
    let byte = it.peek_u8()?;
    if byte == VOID || val_type_from_byte(byte).is_some() {
        it.read_u8()?;
        return Ok(());
    }
    let n: i64 = crate::leb128::read_sleb128(it.bytes, &mut it.idx, 33)?;
    if n < 0 || n as usize >= n_types {
        return Err(Error::malformed(UNKNOWN_FUNC_TYPE));
    }
    Ok(())
}
