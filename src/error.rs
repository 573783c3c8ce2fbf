use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    Malformed(&'static str),
    Link(&'static str),
    Trap(&'static str),
    Uninstantiable(&'static str),
}

impl Error {
    #[inline(always)]
    pub fn malformed(msg: &'static str) -> Self { Error::Malformed(msg) }
    #[inline(always)]
    pub fn link(msg: &'static str) -> Self { Error::Link(msg) }
    #[inline(always)]
    pub fn trap(msg: &'static str) -> Self { Error::Trap(msg) }
    #[inline(always)]
    pub fn uninstantiable(msg: &'static str) -> Self { Error::Uninstantiable(msg) }

    pub fn message(&self) -> &'static str {
        match self {
            Error::Malformed(s) | Error::Link(s) | Error::Trap(s) | Error::Uninstantiable(s) => s,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for Error {}

// Malformed errors
pub const FUNC_CODE_INCONSISTENT: &str = "function and code section have inconsistent lengths";
pub const ILLEGAL_OP: &str = "illegal opcode";
pub const INT_TOO_LARGE: &str = "integer too large";
pub const INT_TOO_LONG: &str = "integer representation too long";
pub const INVALID_DATA_SEG_FLAG: &str = "invalid data segment flag";
pub const INVALID_SECTION_ID: &str = "invalid section id";
pub const INVALID_UTF8: &str = "invalid UTF-8 encoding";
pub const INVALID_VALUE_TYPE: &str = "invalid value type";
pub const INVALID_RESULT_ARITY: &str = "invalid result arity";
pub const NO_MAGIC_HEADER: &str = "magic header not detected";
pub const SECTION_SIZE_MISMATCH: &str = "section size mismatch";
pub const TOO_MANY_LOCALS: &str = "too many locals";
pub const UNEXPECTED_END: &str = "unexpected end";
pub const UNKNOWN_BINARY_VERSION: &str = "unknown binary version";
pub const UNKNOWN_FUNC_TYPE: &str = "unknown type";
pub const UNKNOWN_LABEL: &str = "unknown label";
pub const UNSUPPORTED_IMPORT_KIND: &str = "unsupported import kind";
pub const ELSE_MUST_CLOSE_IF: &str = "else must close an if";
pub const DUPLICATE_EXPORT_NAME: &str = "duplicate export name";
pub const INVALID_EXPORT_DESC: &str = "malformed export kind";
pub const MULTIPLE_MEMORIES: &str = "multiple memories";
pub const UNKNOWN_MEMORY: &str = "unknown memory";
// Link errors
pub const DATA_SEG_DNF: &str = "data segment does not fit";
pub const INCOMPATIBLE_IMPORT: &str = "incompatible import type";
pub const UNKNOWN_IMPORT: &str = "unknown import";
// Trap errors
pub const DIVIDE_BY_ZERO: &str = "integer divide by zero";
pub const HOST_RESULT_MISMATCH: &str = "host function result mismatch";
pub const INTEGER_OVERFLOW: &str = "integer overflow";
pub const INVALID_BRANCH_LEVEL: &str = "invalid branch level";
pub const INVALID_CONV_TO_INT: &str = "invalid conversion to integer";
pub const INVALID_NUM_ARG: &str = "invalid number of arguments";
pub const OOB_MEMORY_ACCESS: &str = "out of bounds memory access";
pub const STACK_EXHAUSTED: &str = "call stack exhausted";
pub const STACK_UNDERFLOW: &str = "stack underflow";
pub const TYPE_MISMATCH: &str = "type mismatch";
pub const UNDEFINED_LOCAL: &str = "undefined local";
pub const UNKNOWN_EXPORT: &str = "unknown export";
pub const UNKNOWN_FUNC: &str = "unknown function";
pub const UNKNOWN_OPERATION: &str = "unknown operation";
pub const UNREACHABLE: &str = "unreachable";
