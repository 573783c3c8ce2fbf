use clap::Parser;
use minivm::module::ExternKind;
use minivm::{Instruction, Module, ValType};
use std::path::PathBuf;

mod utils;
use utils::{init_logger, load_module};

#[derive(Parser, Debug)]
#[command(name = "minivm-inspect")]
#[command(about = "Inspect WebAssembly modules as the minivm loader sees them")]
struct Args {
    /// Path to the module (.wasm, or .wat text)
    wasm_file: PathBuf,

    /// Show only exports
    #[arg(long)]
    exports_only: bool,

    /// Show only imports
    #[arg(long)]
    imports_only: bool,

    /// Dump each translated function body as JSON
    #[arg(short, long)]
    verbose: bool,

    #[arg(short, long)]
    debug: bool,
}

fn format_signature(params: &[ValType], result: Option<ValType>) -> String {
    let params_str = params.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", ");
    match result {
        Some(r) => format!("({}) -> {}", params_str, r),
        None => format!("({})", params_str),
    }
}

fn print_imports(module: &Module) -> Result<(), Box<dyn std::error::Error>> {
    println!("Imports ({}):", module.imports.len());
    for (i, import) in module.imports.iter().enumerate() {
        let ty = module.func_type(import.type_idx)?;
        println!("  [{}] {}.{} {}", i, import.module, import.field, format_signature(&ty.params, ty.result));
    }
    Ok(())
}

fn print_exports(module: &Module) {
    println!("Exports ({}):", module.exports.len());
    for export in &module.exports {
        let kind = match export.kind {
            ExternKind::Func => "func",
            ExternKind::Table => "table",
            ExternKind::Mem => "memory",
            ExternKind::Global => "global",
        };
        println!("  {} {} {}", kind, export.index, export.name);
    }
}

fn unsupported(code: &[Instruction], out: &mut Vec<u8>) {
    for inst in code {
        match inst {
            Instruction::Unsupported { opcode } => out.push(*opcode),
            Instruction::Block { body } | Instruction::Loop { body } => unsupported(body, out),
            Instruction::If { then_body, else_body } => {
                unsupported(then_body, out);
                unsupported(else_body, out);
            }
            _ => {}
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logger(args.debug);

    let module = load_module(&args.wasm_file)?;
    println!("Module: {}", args.wasm_file.display());

    if args.imports_only {
        return print_imports(&module);
    }
    if args.exports_only {
        print_exports(&module);
        return Ok(());
    }

    match module.memory {
        Some(mem) => println!("Memory: {} pages (max {:?})", mem.min, mem.max),
        None => println!("Memory: none declared"),
    }
    if let Some(start) = module.start {
        println!("Start: function {}", start);
    }
    println!("Data segments: {}", module.data.len());
    println!();
    print_imports(&module)?;
    println!();
    print_exports(&module);
    println!();

    let base = module.imports.len();
    println!("Functions ({}):", module.functions.len());
    for (i, (type_idx, code)) in module.functions.iter().zip(&module.code).enumerate() {
        let ty = module.func_type(*type_idx)?;
        let mut missing = Vec::new();
        unsupported(&code.body, &mut missing);
        missing.sort_unstable();
        missing.dedup();
        print!(
            "  [{}] {} locals={} instructions={}",
            base + i,
            format_signature(&ty.params, ty.result),
            code.locals.len(),
            Instruction::count(&code.body)
        );
        if !missing.is_empty() {
            let ops = missing.iter().map(|op| format!("{:#04x}", op)).collect::<Vec<_>>().join(" ");
            print!(" unsupported=[{}]", ops);
        }
        println!();
        if args.verbose {
            println!("{}", serde_json::to_string_pretty(&code.body)?);
        }
    }

    Ok(())
}
