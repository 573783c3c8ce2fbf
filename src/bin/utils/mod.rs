use log::debug;
use minivm::{MachineConfig, Module};
use std::fs;
use std::path::Path;

pub fn init_logger(debug: bool) {
    let mut logger = env_logger::Builder::from_default_env();
    if debug {
        logger.filter_level(log::LevelFilter::Debug);
    }
    let _ = logger.try_init();
}

/// Reads a `.wasm` binary, or a `.wat` text module which is assembled first.
pub fn load_module(path: &Path) -> Result<Module, Box<dyn std::error::Error>> {
    let bytes = if path.extension().and_then(|s| s.to_str()) == Some("wat") {
        wat::parse_file(path).map_err(|e| format!("Failed to assemble WAT file: {}", e))?
    } else {
        fs::read(path).map_err(|e| format!("Failed to read WASM file: {}", e))?
    };
    debug!("loaded {} bytes from {}", bytes.len(), path.display());
    let module = Module::compile(&bytes).map_err(|e| format!("Failed to compile module: {}", e))?;
    Ok(module)
}

/// JSON config file if given, with command-line overrides applied on top.
#[allow(dead_code)]
pub fn load_config(
    path: Option<&Path>,
    memory_pages: Option<u32>,
    max_call_depth: Option<usize>,
) -> Result<MachineConfig, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| format!("Failed to read config: {}", e))?;
            MachineConfig::from_json(&text).map_err(|e| format!("Invalid config: {}", e))?
        }
        None => MachineConfig::default(),
    };
    if memory_pages.is_some() {
        config.memory_pages = memory_pages;
    }
    if let Some(depth) = max_call_depth {
        config.max_call_depth = depth;
    }
    debug!("{:?}", config);
    Ok(config)
}
