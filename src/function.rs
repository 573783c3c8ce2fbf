use crate::instruction::Instruction;
use crate::value::{ValType, Value};
use std::fmt;
use std::rc::Rc;

/// A function whose body is engine bytecode.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub nparams: usize,
    pub returns: bool,
    /// Declared non-parameter locals, zeroed at each activation.
    pub locals: Vec<ValType>,
    pub code: Vec<Instruction>,
}

impl Function {
    pub fn new(nparams: usize, returns: bool, code: Vec<Instruction>) -> Self {
        Self { nparams, returns, locals: Vec::new(), code }
    }

    pub fn with_locals(mut self, locals: Vec<ValType>) -> Self {
        self.locals = locals;
        self
    }
}

pub type HostCallback<H> = Rc<dyn Fn(&mut H, &[Value]) -> Option<Value>>;

/// A function satisfied by the host. The callable receives the machine's host
/// context and the arguments in call order.
pub struct ImportFunction<H> {
    pub nparams: usize,
    pub returns: bool,
    pub callback: HostCallback<H>,
}

impl<H> ImportFunction<H> {
    pub fn new(
        nparams: usize,
        returns: bool,
        callback: impl Fn(&mut H, &[Value]) -> Option<Value> + 'static,
    ) -> Self {
        Self { nparams, returns, callback: Rc::new(callback) }
    }
}

impl<H> Clone for ImportFunction<H> {
    fn clone(&self) -> Self {
        Self { nparams: self.nparams, returns: self.returns, callback: Rc::clone(&self.callback) }
    }
}

impl<H> fmt::Debug for ImportFunction<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportFunction")
            .field("nparams", &self.nparams)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

/// One entry of the function table: imports come first, then defined functions.
pub enum Func<H> {
    Import(ImportFunction<H>),
    Defined(Function),
}

impl<H> Func<H> {
    pub fn nparams(&self) -> usize {
        match self {
            Func::Import(f) => f.nparams,
            Func::Defined(f) => f.nparams,
        }
    }

    pub fn returns(&self) -> bool {
        match self {
            Func::Import(f) => f.returns,
            Func::Defined(f) => f.returns,
        }
    }
}

impl<H> Clone for Func<H> {
    fn clone(&self) -> Self {
        match self {
            Func::Import(f) => Func::Import(f.clone()),
            Func::Defined(f) => Func::Defined(f.clone()),
        }
    }
}

impl<H> fmt::Debug for Func<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Func::Import(func) => fmt::Debug::fmt(func, f),
            Func::Defined(func) => fmt::Debug::fmt(func, f),
        }
    }
}

impl<H> From<Function> for Func<H> {
    fn from(f: Function) -> Self { Func::Defined(f) }
}

impl<H> From<ImportFunction<H>> for Func<H> {
    fn from(f: ImportFunction<H>) -> Self { Func::Import(f) }
}
