use crate::byte_iter::ByteIter;
use crate::error::*;
use crate::instruction::Instruction;
use crate::signature::skip_block_type;
use crate::value::Value;

/// A binary control frame. `width` is how many engine constructs it becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Function,
    Block,
    Loop,
    If,
}

impl Frame {
    fn width(self) -> u32 {
        match self {
            Frame::Function => 0,
            Frame::Block | Frame::If => 1,
            Frame::Loop => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminator {
    End,
    Else,
}

struct Translator<'a, 'b> {
    it: &'b mut ByteIter<'a>,
    frames: Vec<Frame>,
    n_types: usize,
    n_funcs: u32,
}

/// Decodes an expression up to and including its final `end`.
///
/// `n_types` and `n_funcs` bound block type and call indices.
pub fn translate_expr(it: &mut ByteIter, n_types: usize, n_funcs: u32) -> Result<Vec<Instruction>, Error> {
    let mut t = Translator { it, frames: vec![Frame::Function], n_types, n_funcs };
    let (code, terminator) = t.sequence()?;
    if terminator != Terminator::End { return Err(Error::malformed(ELSE_MUST_CLOSE_IF)); }
    Ok(code)
}

impl Translator<'_, '_> {
    fn nested(&mut self, frame: Frame) -> Result<Vec<Instruction>, Error> {
        skip_block_type(self.it, self.n_types)?;
        self.frames.push(frame);
        let (body, terminator) = self.sequence()?;
        self.frames.pop();
        if terminator != Terminator::End { return Err(Error::malformed(ELSE_MUST_CLOSE_IF)); }
        Ok(body)
    }

    fn if_else(&mut self) -> Result<Instruction, Error> {
        skip_block_type(self.it, self.n_types)?;
        self.frames.push(Frame::If);
        let (then_body, terminator) = self.sequence()?;
        let else_body = match terminator {
            Terminator::End => Vec::new(),
            Terminator::Else => {
                let (body, terminator) = self.sequence()?;
                if terminator != Terminator::End { return Err(Error::malformed(ELSE_MUST_CLOSE_IF)); }
                body
            }
        };
        self.frames.pop();
        Ok(Instruction::If { then_body, else_body })
    }

    /// Translates a binary label depth into an engine branch.
    fn branch(&self, depth: u32, conditional: bool) -> Result<Instruction, Error> {
        let depth = depth as usize;
        if depth >= self.frames.len() { return Err(Error::malformed(UNKNOWN_LABEL)); }

        if self.frames[self.frames.len() - 1 - depth] == Frame::Function {
            return Ok(if conditional {
                Instruction::If { then_body: vec![Instruction::Return], else_body: Vec::new() }
            } else {
                Instruction::Return
            });
        }

        let level = self.frames.iter().rev().take(depth).map(|f| f.width()).sum();
        Ok(if conditional { Instruction::BrIf { level } } else { Instruction::Br { level } })
    }

    fn sequence(&mut self) -> Result<(Vec<Instruction>, Terminator), Error> {
        use Instruction::*;

        let mut code = Vec::new();
        loop {
            let op = self.it.read_u8()?;
            let inst = match op {
                0x00 => Unreachable,
                0x01 => Nop,
                0x02 => Block { body: self.nested(Frame::Block)? },
                0x03 => {
                    // A binary loop repeats only when branched to; the engine's repeats until
                    // branched out of.
                    let mut body = self.nested(Frame::Loop)?;
                    body.push(Br { level: 1 });
                    Loop { body: vec![Block { body }] }
                }
                0x04 => self.if_else()?,
                0x05 => {
                    if self.frames.last() != Some(&Frame::If) { return Err(Error::malformed(ELSE_MUST_CLOSE_IF)); }
                    return Ok((code, Terminator::Else));
                }
                0x0b => return Ok((code, Terminator::End)),
                0x0c => {
                    let depth = self.it.read_u32()?;
                    self.branch(depth, false)?
                }
                0x0d => {
                    let depth = self.it.read_u32()?;
                    self.branch(depth, true)?
                }
                0x0e => {
                    let n = self.it.read_u32()?;
                    for _ in 0..=n {
                        self.it.read_u32()?;
                    }
                    Unsupported { opcode: op }
                }
                0x0f => Return,
                0x10 => {
                    let func = self.it.read_u32()?;
                    if func >= self.n_funcs { return Err(Error::malformed(UNKNOWN_FUNC)); }
                    Call { func }
                }
                0x11 => {
                    self.it.read_u32()?;
                    self.it.read_u32()?;
                    Unsupported { opcode: op }
                }
                0x1a => Drop,
                0x1b => Unsupported { opcode: op },
                0x1c => {
                    let n = self.it.read_u32()?;
                    self.it.advance(n as usize)?;
                    Unsupported { opcode: op }
                }
                0x20 => LocalGet { index: self.it.read_u32()? },
                0x21 => LocalSet { index: self.it.read_u32()? },
                0x22 => LocalTee { index: self.it.read_u32()? },
                0x23..=0x26 => {
                    self.it.read_u32()?;
                    Unsupported { opcode: op }
                }
                0x28..=0x3e => {
                    let _align = self.it.read_u32()?;
                    let offset = self.it.read_u32()?;
                    match op {
                        0x28 => LoadI32 { offset },
                        0x2b => Load { offset },
                        0x36 => StoreI32 { offset },
                        0x39 => Store { offset },
                        _ => Unsupported { opcode: op },
                    }
                }
                0x3f | 0x40 => {
                    self.it.read_u8()?;
                    Unsupported { opcode: op }
                }
                0x41 => Const { value: Value::I32(self.it.read_i32()?) },
                0x42 => {
                    self.it.read_i64()?;
                    Unsupported { opcode: op }
                }
                0x43 => {
                    self.it.advance(4)?;
                    Unsupported { opcode: op }
                }
                0x44 => Const { value: Value::F64(self.it.read_f64()?) },
                0x45 => Eqz,
                0x46 | 0x61 => Eq,
                0x47 | 0x62 => Ne,
                0x48 | 0x63 => Lt,
                0x4a | 0x64 => Gt,
                0x4c | 0x65 => Le,
                0x4e | 0x66 => Ge,
                0x6a | 0xa0 => Add,
                0x6b | 0xa1 => Sub,
                0x6c | 0xa2 => Mul,
                0x6d | 0xa3 => Div,
                0x9a => Neg,
                0xaa => TruncF64ToI32,
                0xb7 => ConvertI32ToF64,
                0x45..=0xc4 => Unsupported { opcode: op },
                0xd0 => {
                    self.it.read_u8()?;
                    Unsupported { opcode: op }
                }
                0xd1 => Unsupported { opcode: op },
                0xd2 => {
                    self.it.read_u32()?;
                    Unsupported { opcode: op }
                }
                0xfc => {
                    self.skip_prefixed()?;
                    Unsupported { opcode: op }
                }
                _ => return Err(Error::malformed(ILLEGAL_OP)),
            };
            code.push(inst);
        }
    }

    /// Consumes the sub-opcode and immediates of a `0xfc` instruction.
    fn skip_prefixed(&mut self) -> Result<(), Error> {
        match self.it.read_u32()? {
            0..=7 => {}
            8 => {
                self.it.read_u32()?;
                self.it.read_u8()?;
            }
            9 | 13 | 15..=17 => { self.it.read_u32()?; }
            10 => {
                self.it.read_u8()?;
                self.it.read_u8()?;
            }
            11 => { self.it.read_u8()?; }
            12 | 14 => {
                self.it.read_u32()?;
                self.it.read_u32()?;
            }
            _ => return Err(Error::malformed(ILLEGAL_OP)),
        }
        Ok(())
    }
}
