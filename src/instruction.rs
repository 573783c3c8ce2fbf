use crate::value::Value;
use serde::{Deserialize, Serialize};

/// One engine operation. `Block`, `Loop` and `If` own their nested bodies.
///
/// Branch levels count enclosing `block`/`loop`/`if` constructs from the
/// innermost (level 0) outward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    Nop,
    Unreachable,
    Const { value: Value },
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Eqz,
    Neg,
    #[serde(rename = "f64.convert_i32_s")]
    ConvertI32ToF64,
    #[serde(rename = "i32.trunc_f64_s")]
    TruncF64ToI32,
    Drop,
    #[serde(rename = "f64.load")]
    Load { #[serde(default)] offset: u32 },
    #[serde(rename = "f64.store")]
    Store { #[serde(default)] offset: u32 },
    #[serde(rename = "i32.load")]
    LoadI32 { #[serde(default)] offset: u32 },
    #[serde(rename = "i32.store")]
    StoreI32 { #[serde(default)] offset: u32 },
    #[serde(rename = "local.get")]
    LocalGet { index: u32 },
    #[serde(rename = "local.set")]
    LocalSet { index: u32 },
    #[serde(rename = "local.tee")]
    LocalTee { index: u32 },
    Call { func: u32 },
    Block { body: Vec<Instruction> },
    /// Falling off the end of `body` runs it again; a branch to level 0 leaves
    /// the loop.
    Loop { body: Vec<Instruction> },
    If {
        then_body: Vec<Instruction>,
        #[serde(default)]
        else_body: Vec<Instruction>,
    },
    Br { level: u32 },
    BrIf { level: u32 },
    Return,
    /// A decoded operation with no engine counterpart. Fails when executed.
    Unsupported { opcode: u8 },
}

impl Instruction {
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::Nop => "nop",
            Instruction::Unreachable => "unreachable",
            Instruction::Const { .. } => "const",
            Instruction::Add => "add",
            Instruction::Sub => "sub",
            Instruction::Mul => "mul",
            Instruction::Div => "div",
            Instruction::Eq => "eq",
            Instruction::Ne => "ne",
            Instruction::Lt => "lt",
            Instruction::Le => "le",
            Instruction::Gt => "gt",
            Instruction::Ge => "ge",
            Instruction::Eqz => "eqz",
            Instruction::Neg => "neg",
            Instruction::ConvertI32ToF64 => "f64.convert_i32_s",
            Instruction::TruncF64ToI32 => "i32.trunc_f64_s",
            Instruction::Drop => "drop",
            Instruction::Load { .. } => "f64.load",
            Instruction::Store { .. } => "f64.store",
            Instruction::LoadI32 { .. } => "i32.load",
            Instruction::StoreI32 { .. } => "i32.store",
            Instruction::LocalGet { .. } => "local.get",
            Instruction::LocalSet { .. } => "local.set",
            Instruction::LocalTee { .. } => "local.tee",
            Instruction::Call { .. } => "call",
            Instruction::Block { .. } => "block",
            Instruction::Loop { .. } => "loop",
            Instruction::If { .. } => "if",
            Instruction::Br { .. } => "br",
            Instruction::BrIf { .. } => "br_if",
            Instruction::Return => "return",
            Instruction::Unsupported { .. } => "unsupported",
        }
    }

    /// Total instruction count including nested bodies.
    pub fn count(code: &[Instruction]) -> usize {
        code.iter()
            .map(|inst| 1 + match inst {
                Instruction::Block { body } | Instruction::Loop { body } => Instruction::count(body),
                Instruction::If { then_body, else_body } => Instruction::count(then_body) + Instruction::count(else_body),
                _ => 0,
            })
            .sum()
    }
}
