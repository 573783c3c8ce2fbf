use crate::byte_iter::*;
use crate::error::*;
use crate::instruction::Instruction;
use crate::signature::*;
use crate::translate::translate_expr;
use crate::value::ValType;
use log::debug;

pub const MAGIC_HEADER: &[u8; 4] = b"\0asm";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternKind {
    Func = 0,
    Table = 1,
    Mem = 2,
    Global = 3,
}

impl ExternKind {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(ExternKind::Func),
            1 => Some(ExternKind::Table),
            2 => Some(ExternKind::Mem),
            3 => Some(ExternKind::Global),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub module: String,
    pub field: String,
    pub type_idx: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub name: String,
    pub kind: ExternKind,
    pub index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryLimits {
    pub min: u32,
    pub max: Option<u32>,
}

/// A translated function body and its declared (non-parameter) locals.
#[derive(Debug, Clone, PartialEq)]
pub struct Code {
    pub locals: Vec<ValType>,
    pub body: Vec<Instruction>,
}

/// An active data segment: `bytes` are copied to the address computed by `offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSegment {
    pub offset: Vec<Instruction>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Module {
    pub types: Vec<Signature>,
    pub imports: Vec<Import>,
    /// Type index of each defined function.
    pub functions: Vec<u32>,
    pub code: Vec<Code>,
    pub memory: Option<MemoryLimits>,
    pub exports: Vec<Export>,
    pub start: Option<u32>,
    pub data: Vec<DataSegment>,
}

impl Module {
    pub const MAX_PAGES: u32 = 65536;
    pub const MAX_LOCALS: usize = 50000;

    pub fn compile(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < 4 { return Err(Error::malformed(UNEXPECTED_END)); }
        if &bytes[0..4] != MAGIC_HEADER { return Err(Error::malformed(NO_MAGIC_HEADER)); }
        if bytes.len() < 8 { return Err(Error::malformed(UNEXPECTED_END)); }
        if bytes[4..8] != [1, 0, 0, 0] { return Err(Error::malformed(UNKNOWN_BINARY_VERSION)); }

        let mut m = Module::default();
        let mut it = ByteIter::new(bytes, 8);
        while !it.empty() {
            let id = it.read_u8()?;
            let size = it.read_u32()? as usize;
            if !it.has_n_left(size) { return Err(Error::malformed(UNEXPECTED_END)); }
            let mut section = ByteIter::new(&bytes[..it.cur() + size], it.cur());

            match id {
                0 | 4 | 6 | 9 | 12 => {
                    debug!("skipping section {} ({} bytes)", id, size);
                    section.advance(size)?;
                }
                1 => m.parse_type_section(&mut section)?,
                2 => m.parse_import_section(&mut section)?,
                3 => m.parse_function_section(&mut section)?,
                5 => m.parse_memory_section(&mut section)?,
                7 => m.parse_export_section(&mut section)?,
                8 => m.parse_start_section(&mut section)?,
                10 => m.parse_code_section(&mut section)?,
                11 => m.parse_data_section(&mut section)?,
                _ => return Err(Error::malformed(INVALID_SECTION_ID)),
            }

            if !section.empty() { return Err(Error::malformed(SECTION_SIZE_MISMATCH)); }
            it.advance(size)?;
        }

        if m.functions.len() != m.code.len() { return Err(Error::malformed(FUNC_CODE_INCONSISTENT)); }
        debug!(
            "compiled module: {} types, {} imports, {} functions, {} exports",
            m.types.len(), m.imports.len(), m.functions.len(), m.exports.len()
        );
        Ok(m)
    }

    pub fn func_type(&self, type_idx: u32) -> Result<&Signature, Error> {
        self.types.get(type_idx as usize).ok_or(Error::malformed(UNKNOWN_FUNC_TYPE))
    }

    /// Number of entries in the function table: imports, then defined functions.
    pub fn n_funcs(&self) -> u32 { (self.imports.len() + self.functions.len()) as u32 }

    pub fn export(&self, name: &str) -> Option<&Export> {
        self.exports.iter().find(|e| e.name == name)
    }

    fn parse_type_section(&mut self, it: &mut ByteIter) -> Result<(), Error> {
        let n_types = it.read_u32()?;
        for _ in 0..n_types {
            self.types.push(Signature::read(it)?);
        }
        Ok(())
    }

    fn parse_import_section(&mut self, it: &mut ByteIter) -> Result<(), Error> {
        let n_imports = it.read_u32()?;
        for _ in 0..n_imports {
            let module = it.read_name()?;
            let field = it.read_name()?;
            match ExternKind::from_byte(it.read_u8()?) {
                Some(ExternKind::Func) => {
                    let type_idx = it.read_u32()?;
                    self.func_type(type_idx)?;
                    self.imports.push(Import { module, field, type_idx });
                }
                Some(_) => return Err(Error::malformed(UNSUPPORTED_IMPORT_KIND)),
                None => return Err(Error::malformed(INVALID_EXPORT_DESC)),
            }
        }
        Ok(())
    }

    fn parse_function_section(&mut self, it: &mut ByteIter) -> Result<(), Error> {
        let n_functions = it.read_u32()?;
        for _ in 0..n_functions {
            let type_idx = it.read_u32()?;
            self.func_type(type_idx)?;
            self.functions.push(type_idx);
        }
        Ok(())
    }

    fn parse_memory_section(&mut self, it: &mut ByteIter) -> Result<(), Error> {
        let n_memories = it.read_u32()?;
        if n_memories > 1 || (n_memories == 1 && self.memory.is_some()) {
            return Err(Error::malformed(MULTIPLE_MEMORIES));
        }
        if n_memories == 1 {
            let limits = match it.read_u8()? {
                0 => MemoryLimits { min: it.read_u32()?, max: None },
                1 => MemoryLimits { min: it.read_u32()?, max: Some(it.read_u32()?) },
                _ => return Err(Error::malformed(INT_TOO_LARGE)),
            };
            if limits.min > Self::MAX_PAGES { return Err(Error::malformed(INT_TOO_LARGE)); }
            self.memory = Some(limits);
        }
        Ok(())
    }

    fn parse_export_section(&mut self, it: &mut ByteIter) -> Result<(), Error> {
        let n_exports = it.read_u32()?;
        for _ in 0..n_exports {
            let name = it.read_name()?;
            let kind = ExternKind::from_byte(it.read_u8()?).ok_or(Error::malformed(INVALID_EXPORT_DESC))?;
            let index = it.read_u32()?;

            if self.export(&name).is_some() { return Err(Error::malformed(DUPLICATE_EXPORT_NAME)); }
            match kind {
                ExternKind::Func if index >= self.n_funcs() => return Err(Error::malformed(UNKNOWN_FUNC)),
                ExternKind::Mem if index != 0 || self.memory.is_none() => return Err(Error::malformed(UNKNOWN_MEMORY)),
                _ => {}
            }
            self.exports.push(Export { name, kind, index });
        }
        Ok(())
    }

    fn parse_start_section(&mut self, it: &mut ByteIter) -> Result<(), Error> {
        let start = it.read_u32()?;
        if start >= self.n_funcs() { return Err(Error::malformed(UNKNOWN_FUNC)); }
        self.start = Some(start);
        Ok(())
    }

    fn parse_code_section(&mut self, it: &mut ByteIter) -> Result<(), Error> {
        let n_bodies = it.read_u32()?;
        if n_bodies as usize != self.functions.len() { return Err(Error::malformed(FUNC_CODE_INCONSISTENT)); }

        for (i, type_idx) in self.functions.iter().enumerate() {
            let n_params = self.func_type(*type_idx)?.params.len();
            let body_size = it.read_u32()? as usize;
            if !it.has_n_left(body_size) { return Err(Error::malformed(UNEXPECTED_END)); }
            let end = it.cur() + body_size;
            let mut body = ByteIter::new(&it.bytes[..end], it.cur());

            let mut locals = Vec::new();
            let n_local_decls = body.read_u32()?;
            for _ in 0..n_local_decls {
                let n = body.read_u32()? as usize;
                let ty = read_val_type(&mut body)?;
                if n_params + locals.len() + n > Self::MAX_LOCALS { return Err(Error::malformed(TOO_MANY_LOCALS)); }
                locals.extend(std::iter::repeat(ty).take(n));
            }

            let code = translate_expr(&mut body, self.types.len(), self.n_funcs())?;
            if !body.empty() { return Err(Error::malformed(SECTION_SIZE_MISMATCH)); }
            debug!("function {}: {} locals, {} instructions", i, locals.len(), Instruction::count(&code));
            self.code.push(Code { locals, body: code });
            it.advance(body_size)?;
        }
        Ok(())
    }

    fn parse_data_section(&mut self, it: &mut ByteIter) -> Result<(), Error> {
        let n_segments = it.read_u32()?;
        for _ in 0..n_segments {
            let active = match it.read_u32()? {
                0 => true,
                1 => false,
                2 => {
                    if it.read_u32()? != 0 { return Err(Error::malformed(UNKNOWN_MEMORY)); }
                    true
                }
                _ => return Err(Error::malformed(INVALID_DATA_SEG_FLAG)),
            };
            let offset = if active { translate_expr(it, self.types.len(), self.n_funcs())? } else { Vec::new() };
            let len = it.read_u32()? as usize;
            let bytes = it.read_bytes(len)?.to_vec();
            if active {
                self.data.push(DataSegment { offset, bytes });
            }
        }
        Ok(())
    }
}
