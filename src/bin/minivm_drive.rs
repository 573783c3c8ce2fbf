use clap::Parser;
use log::info;
use minivm::host::{game_imports, Canvas, ErrorPolicy, FrameDriver};
use minivm::Machine;
use std::path::PathBuf;

mod utils;
use utils::{init_logger, load_config, load_module};

#[derive(Parser, Debug)]
#[command(name = "minivm-drive")]
#[command(about = "Run the rocket game headless and print each frame's draw calls")]
#[command(long_about = "
minivm drive - headless frame loop for the rocket game module

Resizes the game, then for every frame calls update(dt) and draw() and prints
the draw commands the guest issued, one JSON array per frame.

Examples:
  minivm-drive program.wasm --frames 60
  minivm-drive program.wasm --frames 10 --toggle toggle_shoot --skip-errors
")]
struct Args {
    /// Path to the game module (.wasm, or .wat text)
    wasm_file: PathBuf,

    #[arg(long, default_value_t = 1)]
    frames: u32,

    /// Seconds per frame
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f64,

    #[arg(long, default_value_t = 800.0)]
    width: f64,

    #[arg(long, default_value_t = 600.0)]
    height: f64,

    /// Input exports to switch on before the first frame (e.g. toggle_shoot)
    #[arg(long)]
    toggle: Vec<String>,

    /// Log and skip frames that fail instead of stopping
    #[arg(long)]
    skip_errors: bool,

    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    memory_pages: Option<u32>,

    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logger(args.debug);

    let module = load_module(&args.wasm_file)?;
    let config = load_config(args.config.as_deref(), args.memory_pages, None)?;
    let machine = Machine::instantiate(&module, &game_imports(), Canvas::new(), &config)
        .map_err(|e| format!("Failed to instantiate module: {}", e))?;

    let policy = if args.skip_errors { ErrorPolicy::SkipFrame } else { ErrorPolicy::Abort };
    let mut driver = FrameDriver::new(machine).with_policy(policy);

    driver.resize(args.width, args.height)?;
    for export in &args.toggle {
        driver.toggle(export, true)?;
    }

    for frame in 0..args.frames {
        let commands = driver.frame(args.dt)?;
        info!("frame {}: {} draw commands", frame, commands.len());
        println!("{}", serde_json::to_string(&commands)?);
    }

    Ok(())
}
