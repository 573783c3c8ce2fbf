use std::f64::consts::FRAC_PI_4;

use minivm::error::*;
use minivm::host::{game_imports, Canvas, DrawCommand, ErrorPolicy, FrameDriver};
use minivm::{Func, Function, Instruction, Machine, MachineConfig, Module, Value};

const GAME: &str = r#"
(module
  (import "env" "clear_screen" (func $clear))
  (import "env" "draw_player" (func $player (param f64 f64 f64)))
  (import "env" "draw_score" (func $score (param f64)))
  (import "env" "sin" (func $sin (param f64) (result f64)))
  (memory 1)
  ;; 0: width  8: height  16: x  24: score  32: shooting
  (func (export "resize") (param f64 f64)
    i32.const 0 local.get 0 f64.store
    i32.const 8 local.get 1 f64.store)
  (func (export "update") (param $dt f64)
    i32.const 16
    i32.const 16 f64.load
    local.get $dt f64.const 60 f64.mul
    f64.add
    f64.store
    i32.const 16 f64.load f64.const 1000 f64.gt
    if unreachable end
    i32.const 32 i32.load
    if
      i32.const 24
      i32.const 24 f64.load f64.const 1 f64.add
      f64.store
    end)
  (func (export "draw")
    call $clear
    i32.const 16 f64.load
    i32.const 8 f64.load f64.const 2 f64.div
    f64.const 0 call $sin
    call $player
    i32.const 24 f64.load
    call $score)
  (func (export "toggle_shoot") (param i32)
    i32.const 32 local.get 0 i32.store))
"#;

fn load(src: &str) -> Result<Machine<Canvas>, Error> {
    let module = Module::compile(&wat::parse_str(src).unwrap())?;
    Machine::instantiate(&module, &game_imports(), Canvas::new(), &MachineConfig::default())
}

fn driver(policy: ErrorPolicy) -> FrameDriver {
    let mut driver = FrameDriver::new(load(GAME).unwrap()).with_policy(policy);
    driver.resize(800.0, 600.0).unwrap();
    driver
}

#[test]
fn frame_returns_draw_commands() {
    let mut d = driver(ErrorPolicy::Abort);
    let commands = d.frame(1.0).unwrap();
    assert_eq!(commands, vec![
        DrawCommand::Clear,
        DrawCommand::Player { x: 60.0, y: 300.0, z: 0.0 },
        DrawCommand::Score(0.0),
    ]);
    let commands = d.frame(0.5).unwrap();
    assert_eq!(commands[1], DrawCommand::Player { x: 90.0, y: 300.0, z: 0.0 });
    assert!(d.machine().host().commands.is_empty());
}

#[test]
fn toggle_switches_input() {
    let mut d = driver(ErrorPolicy::Abort);
    d.toggle("toggle_shoot", true).unwrap();
    d.frame(0.1).unwrap();
    let commands = d.frame(0.1).unwrap();
    assert_eq!(commands.last(), Some(&DrawCommand::Score(2.0)));

    d.toggle("toggle_shoot", false).unwrap();
    let commands = d.frame(0.1).unwrap();
    assert_eq!(commands.last(), Some(&DrawCommand::Score(2.0)));

    assert_eq!(d.toggle("toggle_fire", true), Err(Error::Trap(UNKNOWN_EXPORT)));
}

#[test]
fn abort_policy_propagates_failure() {
    let mut d = driver(ErrorPolicy::Abort);
    assert_eq!(d.frame(20.0), Err(Error::Trap(UNREACHABLE)));
    assert!(d.machine().stack.is_empty());
}

#[test]
fn skip_policy_keeps_running() {
    let mut d = driver(ErrorPolicy::SkipFrame);
    assert_eq!(d.frame(20.0), Ok(vec![]));
    // position stays past the limit, so every later update fails too
    assert_eq!(d.frame(0.0), Ok(vec![]));
    assert_eq!(d.machine_mut().memory.load(16), Ok(1200.0));
}

#[test]
fn math_imports() {
    let mut m = load(r#"
        (module
          (import "env" "Math_atan" (func $atan (param f64) (result f64)))
          (import "env" "cos" (func $cos (param f64) (result f64)))
          (func (export "atan") (param f64) (result f64) local.get 0 call $atan)
          (func (export "cos") (param f64) (result f64) local.get 0 call $cos))
    "#).unwrap();
    let v = m.invoke("atan", &[Value::F64(1.0)]).unwrap().unwrap().as_f64().unwrap();
    assert!((v - FRAC_PI_4).abs() < 1e-12);
    assert_eq!(m.invoke("cos", &[Value::F64(0.0)]), Ok(Some(Value::F64(1.0))));
}

#[test]
fn draw_imports_record_in_order() {
    let mut m = load(r#"
        (module
          (import "env" "draw_bullet" (func $bullet (param f64 f64)))
          (import "env" "draw_enemy" (func $enemy (param f64 f64)))
          (import "env" "draw_particle" (func $particle (param f64 f64 f64)))
          (func (export "draw")
            f64.const 1 f64.const 2 call $bullet
            f64.const 3 f64.const 4 call $enemy
            f64.const 5 f64.const 6 f64.const 7 call $particle))
    "#).unwrap();
    m.invoke("draw", &[]).unwrap();
    assert_eq!(m.host_mut().take(), vec![
        DrawCommand::Bullet { x: 1.0, y: 2.0 },
        DrawCommand::Enemy { x: 3.0, y: 4.0 },
        DrawCommand::Particle { x: 5.0, y: 6.0, z: 7.0 },
    ]);
}

#[test]
fn game_import_signatures_are_checked() {
    let r = load(r#"(module (import "env" "sin" (func (param f64 f64) (result f64))))"#);
    assert_eq!(r.err(), Some(Error::Link(INCOMPATIBLE_IMPORT)));
    let r = load(r#"(module (import "env" "tan" (func (param f64) (result f64))))"#);
    assert_eq!(r.err(), Some(Error::Link(UNKNOWN_IMPORT)));
}

#[test]
fn draw_commands_serialize() {
    let json = serde_json::to_string(&vec![DrawCommand::Clear, DrawCommand::Score(3.0)]).unwrap();
    assert_eq!(json, r#"["clear",{"score":3.0}]"#);
}

#[test]
fn integer_arguments_are_widened() {
    let score = game_imports().resolve("env", "draw_score", 1, false).unwrap();
    let caller = Function::new(0, false, vec![
        Instruction::Const { value: Value::I32(3) },
        Instruction::Call { func: 0 },
    ]);
    let mut m = Machine::new(vec![Func::Import(score), Func::Defined(caller)], 0, Canvas::new());
    assert_eq!(m.call(1, &[]), Ok(None));
    assert_eq!(m.host_mut().take(), vec![DrawCommand::Score(3.0)]);
}
