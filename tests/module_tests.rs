use minivm::error::*;
use minivm::module::ExternKind;
use minivm::{Imports, Instruction, Machine, MachineConfig, Memory, Module, Value};

fn compile(src: &str) -> Module {
    let bytes = wat::parse_str(src).unwrap();
    Module::compile(&bytes).unwrap()
}

fn instantiate(src: &str) -> Result<Machine, Error> {
    Machine::instantiate(&compile(src), &Imports::new(), (), &MachineConfig::default())
}

#[test]
fn header_errors() {
    assert_eq!(Module::compile(b"\0as"), Err(Error::Malformed(UNEXPECTED_END)));
    assert_eq!(Module::compile(b"wasm\x01\0\0\0"), Err(Error::Malformed(NO_MAGIC_HEADER)));
    assert_eq!(Module::compile(b"\0asm\x02\0\0\0"), Err(Error::Malformed(UNKNOWN_BINARY_VERSION)));
    assert!(Module::compile(b"\0asm\x01\0\0\0").is_ok());
}

#[test]
fn section_errors() {
    // type section claiming 5 bytes with only 1 present
    assert_eq!(Module::compile(b"\0asm\x01\0\0\0\x01\x05\x00"), Err(Error::Malformed(UNEXPECTED_END)));
    // type section with a trailing byte it does not consume
    assert_eq!(Module::compile(b"\0asm\x01\0\0\0\x01\x02\x00\x00"), Err(Error::Malformed(SECTION_SIZE_MISMATCH)));
    assert_eq!(Module::compile(b"\0asm\x01\0\0\0\x0d\x00"), Err(Error::Malformed(INVALID_SECTION_ID)));
    // function section without a code section
    assert_eq!(
        Module::compile(b"\0asm\x01\0\0\0\x01\x04\x01\x60\x00\x00\x03\x02\x01\x00"),
        Err(Error::Malformed(FUNC_CODE_INCONSISTENT))
    );
}

#[test]
fn custom_sections_are_skipped() {
    let bytes = b"\0asm\x01\0\0\0\x00\x05\x03abc\xff";
    assert_eq!(Module::compile(bytes), Ok(Module::default()));
}

#[test]
fn decodes_module_structure() {
    let m = compile(r#"
        (module
          (import "env" "sin" (func $sin (param f64) (result f64)))
          (memory 2)
          (func $twice (export "twice") (param f64) (result f64)
            (local i32 f64)
            local.get 0
            call $sin
            f64.const 2
            f64.mul)
          (data (i32.const 8) "\01\02"))
    "#);
    assert_eq!(m.imports.len(), 1);
    assert_eq!((m.imports[0].module.as_str(), m.imports[0].field.as_str()), ("env", "sin"));
    assert_eq!(m.memory.map(|l| l.min), Some(2));
    let export = m.export("twice").unwrap();
    assert_eq!((export.kind, export.index), (ExternKind::Func, 1));
    assert_eq!(m.code[0].locals, vec![minivm::ValType::I32, minivm::ValType::F64]);
    assert_eq!(m.code[0].body, vec![
        Instruction::LocalGet { index: 0 },
        Instruction::Call { func: 0 },
        Instruction::Const { value: Value::F64(2.0) },
        Instruction::Mul,
    ]);
    assert_eq!(m.data[0].offset, vec![Instruction::Const { value: Value::I32(8) }]);
    assert_eq!(m.data[0].bytes, vec![1, 2]);
}

#[test]
fn factorial() {
    let mut m = instantiate(r#"
        (module
          (func $fac (export "fac") (param i32) (result i32)
            local.get 0
            i32.const 2
            i32.lt_s
            if (result i32)
              i32.const 1
            else
              local.get 0
              local.get 0
              i32.const 1
              i32.sub
              call $fac
              i32.mul
            end))
    "#).unwrap();
    assert_eq!(m.invoke("fac", &[Value::I32(5)]), Ok(Some(Value::I32(120))));
    assert_eq!(m.invoke("fac", &[Value::I32(10)]), Ok(Some(Value::I32(3628800))));
}

#[test]
fn binary_loop_repeats_only_when_branched_to() {
    let mut m = instantiate(r#"
        (module
          (func (export "sum") (param $n i32) (result i32)
            (local $acc i32)
            block $done
              loop $again
                local.get $n
                i32.eqz
                br_if $done
                local.get $acc
                local.get $n
                i32.add
                local.set $acc
                local.get $n
                i32.const 1
                i32.sub
                local.set $n
                br $again
              end
            end
            local.get $acc)
          (func (export "once") (result i32)
            (local $i i32)
            loop
              local.get $i
              i32.const 1
              i32.add
              local.set $i
            end
            local.get $i))
    "#).unwrap();
    assert_eq!(m.invoke("sum", &[Value::I32(100)]), Ok(Some(Value::I32(5050))));
    assert_eq!(m.invoke("once", &[]), Ok(Some(Value::I32(1))));
}

#[test]
fn branch_to_function_returns() {
    let mut m = instantiate(r#"
        (module
          (func (export "clamp") (param f64) (result f64)
            f64.const 0
            local.get 0
            f64.const 0
            f64.lt
            br_if 0
            drop
            local.get 0))
    "#).unwrap();
    assert_eq!(m.invoke("clamp", &[Value::F64(-4.0)]), Ok(Some(Value::F64(0.0))));
    assert_eq!(m.invoke("clamp", &[Value::F64(4.0)]), Ok(Some(Value::F64(4.0))));
}

#[test]
fn data_segments_initialize_memory() {
    let m = instantiate(r#"
        (module
          (memory 1)
          (data (i32.const 16) "\00\00\00\00\00\00\f8\3f"))
    "#).unwrap();
    assert_eq!(m.memory.load(16), Ok(1.5));
    assert_eq!(m.memory.size(), Memory::PAGE_SIZE);
}

#[test]
fn memory_defaults_and_overrides() {
    let module = compile("(module)");
    let m = Machine::instantiate(&module, &Imports::new(), (), &MachineConfig::default()).unwrap();
    assert_eq!(m.memory.size(), 20 * Memory::PAGE_SIZE);

    let config = MachineConfig { memory_pages: Some(1), ..MachineConfig::default() };
    let m = Machine::instantiate(&compile("(module (memory 3))"), &Imports::new(), (), &config).unwrap();
    assert_eq!(m.memory.size(), Memory::PAGE_SIZE);
}

#[test]
fn data_segment_must_fit() {
    let r = instantiate(r#"(module (memory 1) (data (i32.const 65535) "\01\02"))"#);
    assert_eq!(r.err(), Some(Error::Link(DATA_SEG_DNF)));
}

#[test]
fn start_function_runs_and_can_fail() {
    let m = instantiate(r#"
        (module
          (memory 1)
          (func $init i32.const 0 f64.const 9 f64.store)
          (start $init))
    "#).unwrap();
    assert_eq!(m.memory.load(0), Ok(9.0));

    let r = instantiate("(module (func $boom unreachable) (start $boom))");
    assert_eq!(r.err(), Some(Error::Uninstantiable(UNREACHABLE)));
}

#[test]
fn imports_link_by_name_and_arity() {
    let src = r#"(module (import "env" "tick" (func (param i32))))"#;
    let module = compile(src);

    let none: Imports<()> = Imports::new();
    let r = Machine::instantiate(&module, &none, (), &MachineConfig::default());
    assert_eq!(r.err(), Some(Error::Link(UNKNOWN_IMPORT)));

    let mut wrong = Imports::new();
    wrong.func("env", "tick", 2, false, |_: &mut (), _: &[Value]| None);
    let r = Machine::instantiate(&module, &wrong, (), &MachineConfig::default());
    assert_eq!(r.err(), Some(Error::Link(INCOMPATIBLE_IMPORT)));

    let mut right = Imports::new();
    right.func("env", "tick", 1, false, |_: &mut (), _: &[Value]| None);
    assert!(Machine::instantiate(&module, &right, (), &MachineConfig::default()).is_ok());
}

#[test]
fn unsupported_operations_trap_only_when_executed() {
    let mut m = instantiate(r#"
        (module
          (global $g (mut i32) (i32.const 0))
          (func (export "ok") (result i32) i32.const 1)
          (func (export "bad") (result i32) global.get $g))
    "#).unwrap();
    assert_eq!(m.invoke("ok", &[]), Ok(Some(Value::I32(1))));
    assert_eq!(m.invoke("bad", &[]), Err(Error::Trap(UNKNOWN_OPERATION)));
}

#[test]
fn memory_access_from_binary() {
    let mut m = instantiate(r#"
        (module
          (memory 1)
          (func (export "roundtrip") (param i32 f64) (result f64)
            local.get 0
            local.get 1
            f64.store offset=8
            local.get 0
            f64.load offset=8)
          (func (export "counter") (result i32)
            i32.const 4
            i32.const 4
            i32.load
            i32.const 1
            i32.add
            i32.store
            i32.const 4
            i32.load))
    "#).unwrap();
    assert_eq!(m.invoke("roundtrip", &[Value::I32(100), Value::F64(-1.25)]), Ok(Some(Value::F64(-1.25))));
    assert_eq!(m.invoke("roundtrip", &[Value::I32(65530), Value::F64(1.0)]), Err(Error::Trap(OOB_MEMORY_ACCESS)));
    assert_eq!(m.invoke("counter", &[]), Ok(Some(Value::I32(1))));
    assert_eq!(m.invoke("counter", &[]), Ok(Some(Value::I32(2))));
}
