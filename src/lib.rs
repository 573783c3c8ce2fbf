#![deny(unsafe_code)]

mod byte_iter;
mod leb128;
mod signature;
mod translate;

pub mod config;
pub mod error;
pub mod function;
pub mod host;
pub mod imports;
pub mod instruction;
pub mod machine;
pub mod memory;
pub mod module;
pub mod stack;
pub mod value;

pub use config::MachineConfig;
pub use error::Error;
pub use function::{Func, Function, ImportFunction};
pub use imports::Imports;
pub use instruction::Instruction;
pub use machine::{Flow, Machine};
pub use memory::Memory;
pub use module::Module;
pub use signature::Signature;
pub use stack::Stack;
pub use value::{ValType, Value};
