//! Command-line compiler and runner for tape programs.

mod telemetry;

use anyhow::{Context, Result};
use bfwasm_core::{CompilerConfig, Config, EofBehavior, PassConfig, PhaseTimings};
use bfwasm_ir::compile_source;
use bfwasm_runtime::Runtime;
use clap::{Parser, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "bfwasm")]
#[command(about = "An optimizing brainfuck to WebAssembly compiler")]
struct Args {
    /// Path to the program source
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Input bytes for `,`
    #[arg(short, long, conflicts_with = "input_file")]
    input: Option<String>,

    /// Read input bytes from a file
    #[arg(long, value_name = "PATH")]
    input_file: Option<PathBuf>,

    /// Number of cells in the memory tape
    #[arg(short, long)]
    memory_size: Option<u32>,

    /// What `,` does once input is exhausted
    #[arg(long, value_enum)]
    eof: Option<EofArg>,

    /// Skip every optimization pass
    #[arg(long, action = clap::ArgAction::SetTrue)]
    no_optimize: bool,

    /// Run the program, or print one of its compiled forms
    #[arg(long, value_enum, default_value_t = Emit::Run)]
    emit: Emit,

    /// Write emitted output here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// JSON configuration file; flags override it
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Stop execution after this much fuel
    #[arg(long)]
    fuel: Option<u64>,

    /// Print per-phase timings to stderr
    #[arg(long, action = clap::ArgAction::SetTrue)]
    timings: bool,

    /// Print the first N memory cells to stderr after running
    #[arg(long, value_name = "N")]
    dump_memory: Option<usize>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EofArg {
    Unchanged,
    Zero,
    AllOnes,
}

impl From<EofArg> for EofBehavior {
    fn from(arg: EofArg) -> Self {
        match arg {
            EofArg::Unchanged => EofBehavior::Unchanged,
            EofArg::Zero => EofBehavior::Zero,
            EofArg::AllOnes => EofBehavior::AllOnes,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Emit {
    Run,
    Ir,
    Wasm,
    Tree,
}

fn main() -> Result<()> {
    let args = Args::parse();
    telemetry::init_telemetry()?;

    let config = load_config(&args)?;
    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    match args.emit {
        Emit::Run => run(&args, &source, config),
        Emit::Ir => {
            let artifact = compile_source(&source, &config.compiler)?;
            write_output(&args, artifact.program.to_string().as_bytes())?;
            report_timings(&args, &artifact.timings);
            Ok(())
        }
        Emit::Tree => {
            let artifact = compile_source(&source, &config.compiler)?;
            write_output(&args, format!("{}\n", artifact.tree).as_bytes())?;
            report_timings(&args, &artifact.timings);
            Ok(())
        }
        Emit::Wasm => {
            let artifact = compile_source(&source, &config.compiler)?;
            write_output(&args, &artifact.wasm)?;
            report_timings(&args, &artifact.timings);
            Ok(())
        }
    }
}

/// Merge the config file (if any) with command-line overrides
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    let mut compiler: CompilerConfig = config.compiler;
    if let Some(memory_size) = args.memory_size {
        compiler = compiler.with_memory_size(memory_size);
    }
    if let Some(eof) = args.eof {
        compiler = compiler.with_eof_behavior(eof.into());
    }
    if args.no_optimize {
        compiler = compiler.with_passes(PassConfig::none());
    }
    compiler.validate()?;
    config.compiler = compiler;

    if args.fuel.is_some() {
        config.runtime.max_fuel = args.fuel;
    }
    config.runtime.record_timings = config.runtime.record_timings || args.timings;

    Ok(config)
}

fn run(args: &Args, source: &str, config: Config) -> Result<()> {
    let input = match (&args.input, &args.input_file) {
        (Some(text), _) => text.clone().into_bytes(),
        (None, Some(path)) => std::fs::read(path)
            .with_context(|| format!("Failed to read input {}", path.display()))?,
        (None, None) => Vec::new(),
    };

    let runtime = Runtime::new(config.runtime)?;
    let program = runtime.compile(source, config.compiler)?;
    let result = program.execute(&input)?;

    info!(
        output_len = result.output.len(),
        pointer = result.pointer,
        "program finished"
    );
    write_output(args, &result.output)?;

    if let Some(count) = args.dump_memory {
        let cells = &result.memory[..count.min(result.memory.len())];
        eprintln!("pointer: {}", result.pointer);
        for (row, chunk) in cells.chunks(16).enumerate() {
            let line: Vec<String> = chunk.iter().map(|cell| format!("{:3}", cell)).collect();
            eprintln!("{:6}: {}", row * 16, line.join(" "));
        }
    }

    if let Some(timings) = &result.timings {
        report_timings(args, timings);
    }
    Ok(())
}

fn write_output(args: &Args, bytes: &[u8]) -> Result<()> {
    match &args.output {
        Some(path) => std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn report_timings(args: &Args, timings: &PhaseTimings) {
    if !args.timings {
        return;
    }
    let phases = [
        ("parse", timings.parse),
        ("lower", timings.lower),
        ("contract", timings.contract),
        ("multiply-loops", timings.multiply_loops),
        ("coalesce-offsets", timings.coalesce_offsets),
        ("codegen", timings.codegen),
        ("validate", timings.validate),
        ("load", timings.load),
        ("instantiate", timings.instantiate),
        ("execute", timings.execute),
    ];
    for (name, duration) in phases {
        eprintln!("{:>18}: {:?}", name, duration);
    }
    eprintln!("{:>18}: {:?}", "total", timings.total());
}
