use clap::Parser;
use log::debug;
use minivm::host::{game_imports, Canvas};
use minivm::{Machine, Value};
use std::path::PathBuf;

mod utils;
use utils::{init_logger, load_config, load_module};

#[derive(Parser, Debug)]
#[command(name = "minivm-run")]
#[command(about = "Execute WebAssembly modules on the minivm stack machine")]
#[command(long_about = "
minivm run - invoke exported functions from the command line

The module is linked against the rocket game's `env` imports; anything the
guest draws while running is printed after the result.

Examples:
  # Invoke a function with no arguments
  minivm-run module.wasm --invoke main

  # Invoke a function with arguments (i32 and f64 supported)
  minivm-run module.wasm --invoke add --args 10:i32 20:i32
  minivm-run program.wasm --invoke resize --args 800:f64 600:f64

  # Enable debug logging (RUST_LOG=trace shows every instruction)
  minivm-run module.wat --invoke factorial --args 5:i32 --debug
")]
struct Args {
    /// Path to the module (.wasm, or .wat text)
    wasm_file: PathBuf,

    /// Function to invoke (defaults to _start if available)
    #[arg(short, long)]
    invoke: Option<String>,

    /// Arguments to pass to the function (format: value:type, e.g. 42:i32, 3.5:f64)
    #[arg(short, long, value_delimiter = ' ', num_args = 0..)]
    args: Vec<String>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// List all exports instead of running
    #[arg(short, long)]
    list_exports: bool,

    /// JSON machine configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Linear memory size in 64KiB pages
    #[arg(long)]
    memory_pages: Option<u32>,

    #[arg(long)]
    max_call_depth: Option<usize>,
}

fn parse_value(arg: &str) -> Result<Value, String> {
    let (value_str, type_str) = arg.split_once(':')
        .ok_or_else(|| format!("Invalid argument format '{}'. Expected format: value:type (e.g., 42:i32)", arg))?;

    match type_str {
        "i32" => value_str.parse::<i32>()
            .map(Value::I32)
            .map_err(|_| format!("Failed to parse '{}' as i32", value_str)),
        "f64" => value_str.parse::<f64>()
            .map(Value::F64)
            .map_err(|_| format!("Failed to parse '{}' as f64", value_str)),
        _ => Err(format!("Unknown type '{}'. Supported types: i32, f64", type_str)),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logger(args.debug);

    let module = load_module(&args.wasm_file)?;
    let config = load_config(args.config.as_deref(), args.memory_pages, args.max_call_depth)?;
    let mut machine = Machine::instantiate(&module, &game_imports(), Canvas::new(), &config)
        .map_err(|e| format!("Failed to instantiate module: {}", e))?;

    if args.list_exports {
        println!("Exported functions:");
        let mut exports: Vec<_> = machine.exports().collect();
        exports.sort();
        for (name, idx) in exports {
            let func = &machine.functions()[idx as usize];
            let params = (0..func.nparams()).map(|i| format!("param{}", i)).collect::<Vec<_>>().join(", ");
            let result = if func.returns() { " -> result" } else { "" };
            println!("  {} ({}){}", name, params, result);
        }
        return Ok(());
    }

    let func_name = args.invoke.as_deref().unwrap_or("_start");
    let wasm_args = args.args.iter().map(|a| parse_value(a)).collect::<Result<Vec<_>, _>>()?;
    debug!("invoking {} with {:?}", func_name, wasm_args);

    let result = machine.invoke(func_name, &wasm_args)
        .map_err(|e| format!("Execution failed: {}", e))?;

    match result {
        Some(value) => println!("Result: {}", value),
        None => debug!("function completed (no return value)"),
    }
    for command in machine.host_mut().take() {
        println!("{:?}", command);
    }

    Ok(())
}
