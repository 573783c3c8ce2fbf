//! Host side of the rocket game: the nine `env` imports and a frame loop
//! that drives the module's `resize`, `update`, `draw` and toggle exports.

use crate::error::*;
use crate::imports::Imports;
use crate::machine::Machine;
use crate::value::Value;
use log::{trace, warn};
use serde::{Deserialize, Serialize};

/// One drawing call made by the guest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawCommand {
    Clear,
    Bullet { x: f64, y: f64 },
    Enemy { x: f64, y: f64 },
    Particle { x: f64, y: f64, z: f64 },
    Player { x: f64, y: f64, z: f64 },
    Score(f64),
}

/// Records draw calls instead of rendering them.
#[derive(Debug, Default, Clone)]
pub struct Canvas {
    pub commands: Vec<DrawCommand>,
}

impl Canvas {
    pub fn new() -> Self { Self::default() }

    pub fn take(&mut self) -> Vec<DrawCommand> { std::mem::take(&mut self.commands) }

    fn record(&mut self, command: DrawCommand) {
        trace!("{:?}", command);
        self.commands.push(command);
    }
}

/// Argument `i` as a double. Arity is fixed when the import is linked, so the
/// slice always holds every declared parameter. The game only passes doubles;
/// an `I32` from a hand-built table is widened rather than rejected.
fn arg(args: &[Value], i: usize) -> f64 {
    match args[i] {
        Value::F64(v) => v,
        Value::I32(v) => v as f64,
    }
}

/// The imports the rocket module expects, all under module `env`.
pub fn game_imports() -> Imports<Canvas> {
    let mut imports: Imports<Canvas> = Imports::new();
    imports
        .func("env", "Math_atan", 1, true, |_, args| Some(Value::F64(arg(args, 0).atan())))
        .func("env", "clear_screen", 0, false, |canvas, _| {
            canvas.record(DrawCommand::Clear);
            None
        })
        .func("env", "cos", 1, true, |_, args| Some(Value::F64(arg(args, 0).cos())))
        .func("env", "draw_bullet", 2, false, |canvas, args| {
            canvas.record(DrawCommand::Bullet { x: arg(args, 0), y: arg(args, 1) });
            None
        })
        .func("env", "draw_enemy", 2, false, |canvas, args| {
            canvas.record(DrawCommand::Enemy { x: arg(args, 0), y: arg(args, 1) });
            None
        })
        .func("env", "draw_particle", 3, false, |canvas, args| {
            canvas.record(DrawCommand::Particle { x: arg(args, 0), y: arg(args, 1), z: arg(args, 2) });
            None
        })
        .func("env", "draw_player", 3, false, |canvas, args| {
            canvas.record(DrawCommand::Player { x: arg(args, 0), y: arg(args, 1), z: arg(args, 2) });
            None
        })
        .func("env", "draw_score", 1, false, |canvas, args| {
            canvas.record(DrawCommand::Score(arg(args, 0)));
            None
        })
        .func("env", "sin", 1, true, |_, args| Some(Value::F64(arg(args, 0).sin())));
    imports
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// A failing frame is returned to the caller.
    #[default]
    Abort,
    /// A failing frame is logged and yields whatever was drawn before the failure.
    SkipFrame,
}

pub struct FrameDriver {
    machine: Machine<Canvas>,
    policy: ErrorPolicy,
}

impl FrameDriver {
    pub fn new(machine: Machine<Canvas>) -> Self {
        Self { machine, policy: ErrorPolicy::default() }
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn machine(&self) -> &Machine<Canvas> { &self.machine }
    pub fn machine_mut(&mut self) -> &mut Machine<Canvas> { &mut self.machine }

    pub fn resize(&mut self, width: f64, height: f64) -> Result<(), Error> {
        self.machine.invoke("resize", &[Value::F64(width), Value::F64(height)])?;
        Ok(())
    }

    /// Advances the game by `dt` seconds and returns the commands drawn.
    pub fn frame(&mut self, dt: f64) -> Result<Vec<DrawCommand>, Error> {
        let result = self.step(dt);
        let commands = self.machine.host_mut().take();
        match (result, self.policy) {
            (Ok(()), _) => Ok(commands),
            (Err(e), ErrorPolicy::SkipFrame) => {
                warn!("skipping frame: {}", e);
                Ok(commands)
            }
            (Err(e), ErrorPolicy::Abort) => Err(e),
        }
    }

    fn step(&mut self, dt: f64) -> Result<(), Error> {
        self.machine.invoke("update", &[Value::F64(dt)])?;
        self.machine.invoke("draw", &[])?;
        Ok(())
    }

    /// Calls a one-argument input export such as `toggle_shoot`.
    pub fn toggle(&mut self, export: &str, on: bool) -> Result<(), Error> {
        self.machine.invoke(export, &[Value::from(on)])?;
        Ok(())
    }
}
