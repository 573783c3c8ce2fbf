use crate::config::MachineConfig;
use crate::error::*;
use crate::function::{Func, Function, ImportFunction};
use crate::imports::Imports;
use crate::instruction::Instruction;
use crate::memory::Memory;
use crate::module::{ExternKind, Module};
use crate::stack::Stack;
use crate::value::Value;
use log::{debug, trace, warn};
use nohash_hasher::IntMap;
use paste::paste;
use std::collections::HashMap;
use std::rc::Rc;

/// Per-activation local variables.
pub type Locals = IntMap<u32, Value>;

/// How an instruction sequence finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Ran off the end of the sequence.
    Normal,
    /// Leaving `n` more enclosing constructs; 0 is the innermost.
    Branch(u32),
    /// Unwinding to the current call boundary.
    Return,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    /// The code handed to `execute`.
    Entry,
    /// A defined-function body entered by `call`.
    Call { returns: bool },
    /// A `block` body or the taken arm of an `if`.
    Block,
    Loop,
}

/// One entry of the control stack: a body being executed and how to leave it.
struct ControlFrame<'a> {
    code: &'a [Instruction],
    pc: usize,
    /// Constructs enclosing `code` within its activation.
    nesting: u32,
    kind: FrameKind,
}

impl<'a> ControlFrame<'a> {
    fn nested(code: &'a [Instruction], nesting: u32, kind: FrameKind) -> Self {
        Self { code, pc: 0, nesting: nesting + 1, kind }
    }
}

impl Flow {
    /// Applies a finished `block`/`loop`/`if` body's result to the construct
    /// that owned it.
    #[inline]
    fn leave(self) -> Flow {
        match self {
            Flow::Branch(0) => Flow::Normal,
            Flow::Branch(level) => Flow::Branch(level - 1),
            other => other,
        }
    }
}

/// A function table, one operand stack, one linear memory and the host
/// context handed to imports.
pub struct Machine<H = ()> {
    functions: Rc<[Func<H>]>,
    exports: HashMap<String, u32>,
    pub stack: Stack,
    pub memory: Memory,
    host: H,
    max_call_depth: usize,
    depth: usize,
}

impl<H> Machine<H> {
    pub fn new(functions: Vec<Func<H>>, memsize: usize, host: H) -> Self {
        Self {
            functions: Rc::from(functions),
            exports: HashMap::new(),
            stack: Stack::new(),
            memory: Memory::new(memsize),
            host,
            max_call_depth: MachineConfig::default().max_call_depth,
            depth: 0,
        }
    }

    pub fn with_config(mut self, config: &MachineConfig) -> Self {
        self.max_call_depth = config.max_call_depth;
        self
    }

    pub fn with_exports(mut self, exports: HashMap<String, u32>) -> Self {
        self.exports = exports;
        self
    }

    pub fn instantiate(module: &Module, imports: &Imports<H>, host: H, config: &MachineConfig) -> Result<Self, Error> {
        let mut functions: Vec<Func<H>> = Vec::with_capacity(module.imports.len() + module.functions.len());

        for import in &module.imports {
            let ty = module.func_type(import.type_idx)?;
            let func = imports.resolve(&import.module, &import.field, ty.params.len(), ty.result.is_some())?;
            debug!("linked {}.{} as function {}", import.module, import.field, functions.len());
            functions.push(Func::Import(func));
        }

        for (type_idx, code) in module.functions.iter().zip(&module.code) {
            let ty = module.func_type(*type_idx)?;
            let function = Function::new(ty.params.len(), ty.result.is_some(), code.body.clone())
                .with_locals(code.locals.clone());
            functions.push(Func::Defined(function));
        }

        let pages = config.memory_pages_for(module.memory.map(|m| m.min));
        let exports = module.exports.iter()
            .filter(|e| e.kind == ExternKind::Func)
            .map(|e| (e.name.clone(), e.index))
            .collect();
        debug!("instantiating {} functions, {} pages of memory", functions.len(), pages);

        let mut machine = Machine::new(functions, pages as usize * Memory::PAGE_SIZE, host)
            .with_config(config)
            .with_exports(exports);

        for (i, segment) in module.data.iter().enumerate() {
            let offset = machine.evaluate(&segment.offset)?.as_i32()?;
            let offset = usize::try_from(offset).map_err(|_| Error::link(DATA_SEG_DNF))?;
            machine.memory.write_bytes(offset, &segment.bytes).map_err(|_| Error::link(DATA_SEG_DNF))?;
            debug!("data segment {}: {} bytes at {}", i, segment.bytes.len(), offset);
        }

        if let Some(start) = module.start {
            machine.call(start, &[]).map_err(|e| Error::uninstantiable(e.message()))?;
        }

        Ok(machine)
    }

    pub fn functions(&self) -> &[Func<H>] { &self.functions }

    pub fn export(&self, name: &str) -> Option<u32> { self.exports.get(name).copied() }

    pub fn exports(&self) -> impl Iterator<Item = (&str, u32)> {
        self.exports.iter().map(|(name, idx)| (name.as_str(), *idx))
    }

    pub fn host(&self) -> &H { &self.host }
    pub fn host_mut(&mut self) -> &mut H { &mut self.host }
    pub fn into_host(self) -> H { self.host }

    /// Calls an exported function by name.
    pub fn invoke(&mut self, name: &str, args: &[Value]) -> Result<Option<Value>, Error> {
        let idx = self.export(name).ok_or(Error::trap(UNKNOWN_EXPORT))?;
        self.call(idx, args)
    }

    /// Calls function `idx` of the table. A failed call leaves the stack empty.
    pub fn call(&mut self, idx: u32, args: &[Value]) -> Result<Option<Value>, Error> {
        let functions = Rc::clone(&self.functions);
        let func = functions.get(idx as usize).ok_or(Error::trap(UNKNOWN_FUNC))?;
        if func.nparams() != args.len() { return Err(Error::trap(INVALID_NUM_ARG)); }

        self.depth = 0;
        let result = self.call_function(&functions, idx, func, args.to_vec());
        if let Err(e) = &result {
            warn!("call to function {} aborted: {}", idx, e);
            self.stack.clear();
            self.depth = 0;
        }
        result
    }

    /// Executes `code` outside any call against the given locals. Branches are
    /// checked against the constructs inside `code` only.
    pub fn run(&mut self, code: &[Instruction], locals: &mut Locals) -> Result<Flow, Error> {
        let functions = Rc::clone(&self.functions);
        self.execute(&functions, code, locals)
    }

    /// Runs `code` in an empty scope and pops its single result.
    pub fn evaluate(&mut self, code: &[Instruction]) -> Result<Value, Error> {
        let mut locals = Locals::default();
        let flow = self.run(code, &mut locals)?;
        debug_assert!(!matches!(flow, Flow::Branch(_)), "branch escaped {:?}", flow);
        self.stack.pop()
    }

    fn call_function(&mut self, functions: &[Func<H>], idx: u32, func: &Func<H>, args: Vec<Value>) -> Result<Option<Value>, Error> {
        trace!("call {} {:?}", idx, args);
        match func {
            Func::Import(import) => self.call_import(import, &args),
            Func::Defined(function) => {
                let mut locals = self.enter(function, args)?;
                let flow = self.execute(functions, &function.code, &mut locals);
                self.depth -= 1;
                let flow = flow?;
                debug_assert!(!matches!(flow, Flow::Branch(_)), "branch escaped function {}", idx);
                if function.returns { Ok(Some(self.stack.pop()?)) } else { Ok(None) }
            }
        }
    }

    fn call_import(&mut self, import: &ImportFunction<H>, args: &[Value]) -> Result<Option<Value>, Error> {
        match (import.returns, (import.callback)(&mut self.host, args)) {
            (true, Some(v)) => Ok(Some(v)),
            (false, None) => Ok(None),
            _ => Err(Error::trap(HOST_RESULT_MISMATCH)),
        }
    }

    /// Opens an activation of `function`: binds `args`, zeroes declared locals
    /// and counts it against the call-depth limit.
    fn enter(&mut self, function: &Function, args: Vec<Value>) -> Result<Locals, Error> {
        if self.depth >= self.max_call_depth { return Err(Error::trap(STACK_EXHAUSTED)); }

        let mut locals = Locals::default();
        for (i, arg) in args.into_iter().enumerate() {
            locals.insert(i as u32, arg);
        }
        for (i, ty) in function.locals.iter().enumerate() {
            locals.insert((function.nparams + i) as u32, Value::zero(*ty)?);
        }
        self.depth += 1;
        Ok(locals)
    }

    #[inline]
    fn address(value: Value, offset: u32) -> Result<i64, Error> {
        let addr = value.as_i32()?;
        if addr < 0 { return Err(Error::trap(OOB_MEMORY_ACCESS)); }
        Ok(addr as i64 + offset as i64)
    }

    /// Executes `code` with `locals` as the outermost activation. Nested
    /// constructs and defined-function calls are kept on an explicit control
    /// stack, so guest recursion never grows the native one.
    fn execute<'a>(&mut self, functions: &'a [Func<H>], code: &'a [Instruction], locals: &mut Locals) -> Result<Flow, Error> {
        let depth = self.depth;
        let result = self.dispatch(functions, code, locals);
        // activations opened inside a failed dispatch are abandoned
        self.depth = depth;
        result
    }

    fn dispatch<'a>(&mut self, functions: &'a [Func<H>], code: &'a [Instruction], locals: &mut Locals) -> Result<Flow, Error> {
        let mut control = vec![ControlFrame { code, pc: 0, nesting: 0, kind: FrameKind::Entry }];
        let mut activations: Vec<Locals> = Vec::new();

        macro_rules! pop_val { () => { self.stack.pop()? } }
        macro_rules! binary {
            ($method:ident) => {{
                let right = pop_val!();
                let left = pop_val!();
                self.stack.push(left.$method(right)?);
            }};
        }
        macro_rules! compare {
            ($op:ident) => {{
                paste! {
                    let right = pop_val!();
                    let left = pop_val!();
                    self.stack.push(left.[<compare_ $op>](right)?);
                }
            }};
        }
        macro_rules! locals {
            () => { match activations.last_mut() { Some(l) => l, None => &mut *locals } };
        }
        macro_rules! unwind {
            ($flow:expr) => {
                if let Some(flow) = self.unwind(&mut control, &mut activations, $flow)? { return Ok(flow); }
            };
        }
        macro_rules! check_level {
            ($level:expr, $nesting:expr) => {
                if $level >= $nesting { return Err(Error::trap(INVALID_BRANCH_LEVEL)); }
            };
        }

        loop {
            let frame = match control.last_mut() {
                Some(frame) => frame,
                None => return Ok(Flow::Normal),
            };
            if frame.pc == frame.code.len() {
                unwind!(Flow::Normal);
                continue;
            }
            let code = frame.code;
            let inst = &code[frame.pc];
            let nesting = frame.nesting;
            frame.pc += 1;

            trace!("{} {:?}", inst.name(), self.stack.as_slice());
            match inst {
                Instruction::Nop => {}
                Instruction::Unreachable => return Err(Error::trap(UNREACHABLE)),
                Instruction::Const { value } => self.stack.push(*value),
                Instruction::Add => binary!(add),
                Instruction::Sub => binary!(sub),
                Instruction::Mul => binary!(mul),
                Instruction::Div => binary!(div),
                Instruction::Eq => compare!(eq),
                Instruction::Ne => compare!(ne),
                Instruction::Lt => compare!(lt),
                Instruction::Le => compare!(le),
                Instruction::Gt => compare!(gt),
                Instruction::Ge => compare!(ge),
                Instruction::Eqz => {
                    let v = pop_val!().as_i32()?;
                    self.stack.push(Value::from(v == 0));
                }
                Instruction::Neg => {
                    let v = pop_val!().as_f64()?;
                    self.stack.push(Value::F64(-v));
                }
                Instruction::ConvertI32ToF64 => {
                    let v = pop_val!().as_i32()?;
                    self.stack.push(Value::F64(v as f64));
                }
                Instruction::TruncF64ToI32 => {
                    let x = pop_val!().as_f64()?;
                    if x.is_nan() { return Err(Error::trap(INVALID_CONV_TO_INT)); }
                    if x <= -2147483649.0 || x >= 2147483648.0 { return Err(Error::trap(INTEGER_OVERFLOW)); }
                    self.stack.push(Value::I32(x as i32));
                }
                Instruction::Drop => { pop_val!(); }
                Instruction::Load { offset } => {
                    let addr = Self::address(pop_val!(), *offset)?;
                    let v = self.memory.load(addr)?;
                    self.stack.push(Value::F64(v));
                }
                Instruction::Store { offset } => {
                    let v = pop_val!().as_f64()?;
                    let addr = Self::address(pop_val!(), *offset)?;
                    self.memory.store(addr, v)?;
                }
                Instruction::LoadI32 { offset } => {
                    let addr = Self::address(pop_val!(), *offset)?;
                    let v = self.memory.load_i32(addr)?;
                    self.stack.push(Value::I32(v));
                }
                Instruction::StoreI32 { offset } => {
                    let v = pop_val!().as_i32()?;
                    let addr = Self::address(pop_val!(), *offset)?;
                    self.memory.store_i32(addr, v)?;
                }
                Instruction::LocalGet { index } => {
                    let v = *locals!().get(index).ok_or(Error::trap(UNDEFINED_LOCAL))?;
                    self.stack.push(v);
                }
                Instruction::LocalSet { index } => {
                    let v = pop_val!();
                    locals!().insert(*index, v);
                }
                Instruction::LocalTee { index } => {
                    let v = self.stack.peek().ok_or(Error::trap(STACK_UNDERFLOW))?;
                    locals!().insert(*index, v);
                }
                Instruction::Call { func } => {
                    let callee = functions.get(*func as usize).ok_or(Error::trap(UNKNOWN_FUNC))?;
                    let args = self.stack.pop_n(callee.nparams())?;
                    trace!("call {} {:?}", func, args);
                    match callee {
                        Func::Import(import) => {
                            if let Some(result) = self.call_import(import, &args)? {
                                self.stack.push(result);
                            }
                        }
                        Func::Defined(function) => {
                            activations.push(self.enter(function, args)?);
                            control.push(ControlFrame {
                                code: &function.code,
                                pc: 0,
                                nesting: 0,
                                kind: FrameKind::Call { returns: function.returns },
                            });
                        }
                    }
                }
                Instruction::Block { body } => control.push(ControlFrame::nested(body, nesting, FrameKind::Block)),
                Instruction::Loop { body } => control.push(ControlFrame::nested(body, nesting, FrameKind::Loop)),
                Instruction::If { then_body, else_body } => {
                    let taken = if pop_val!().is_truthy() { then_body } else { else_body };
                    control.push(ControlFrame::nested(taken, nesting, FrameKind::Block));
                }
                Instruction::Br { level } => {
                    check_level!(*level, nesting);
                    unwind!(Flow::Branch(*level));
                }
                Instruction::BrIf { level } => {
                    check_level!(*level, nesting);
                    if pop_val!().is_truthy() { unwind!(Flow::Branch(*level)); }
                }
                Instruction::Return => unwind!(Flow::Return),
                Instruction::Unsupported { opcode } => {
                    debug!("unsupported opcode {:#04x}", opcode);
                    return Err(Error::trap(UNKNOWN_OPERATION));
                }
            }
        }
    }

    /// Pops control frames until `flow` is absorbed. Returns the flow leaving
    /// the entry frame, if it got that far.
    fn unwind(&mut self, control: &mut Vec<ControlFrame>, activations: &mut Vec<Locals>, mut flow: Flow) -> Result<Option<Flow>, Error> {
        while let Some(frame) = control.last_mut() {
            match (frame.kind, flow) {
                (FrameKind::Loop, Flow::Normal) => {
                    frame.pc = 0;
                    return Ok(None);
                }
                (FrameKind::Entry, _) => {
                    control.pop();
                    return Ok(Some(flow));
                }
                (FrameKind::Call { returns }, _) => {
                    debug_assert!(!matches!(flow, Flow::Branch(_)), "branch escaped a function body");
                    control.pop();
                    activations.pop();
                    self.depth -= 1;
                    if returns {
                        let result = self.stack.pop()?;
                        self.stack.push(result);
                    }
                    return Ok(None);
                }
                (FrameKind::Block | FrameKind::Loop, Flow::Return) => {
                    control.pop();
                }
                (FrameKind::Block | FrameKind::Loop, _) => {
                    control.pop();
                    flow = flow.leave();
                    if flow == Flow::Normal { return Ok(None); }
                }
            }
        }
        Ok(Some(flow))
    }
}
