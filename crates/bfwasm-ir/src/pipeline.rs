//! End-to-end compilation from source text to validated module bytes.

use crate::compiler::Compiler;
use crate::lower::lower;
use crate::passes::optimize;
use crate::program::Program;
use crate::validation::{validate_module, validate_program};
use bfwasm_core::{CompilerConfig, PhaseTimings, Result};
use bfwasm_syntax::SyntaxTree;
use std::time::Instant;

/// Everything produced while compiling one source string
#[derive(Debug, Clone)]
pub struct Artifact {
    pub tree: SyntaxTree,
    /// The optimized IR the module was generated from
    pub program: Program,
    pub wasm: Vec<u8>,
    pub timings: PhaseTimings,
}

/// Parse, lower, optimize, generate and validate.
///
/// A syntax error aborts before any IR exists. Failures after parsing are
/// compiler defects and surface as `Error::Internal`.
pub fn compile_source(source: &str, config: &CompilerConfig) -> Result<Artifact> {
    config.validate()?;
    let mut timings = PhaseTimings::default();

    let start = Instant::now();
    let tree = bfwasm_syntax::parse(source)?;
    timings.parse = start.elapsed();

    let start = Instant::now();
    let program = lower(&tree);
    timings.lower = start.elapsed();

    let program = optimize(program, config, &mut timings);

    let start = Instant::now();
    let (wasm, stats) = Compiler::new(config.clone()).emit(&program)?;
    timings.codegen = start.elapsed();

    let start = Instant::now();
    validate_program(&program)?;
    validate_module(&wasm)?;
    timings.validate = start.elapsed();

    tracing::info!(
        source_len = source.len(),
        instructions = program.instruction_count(),
        loops = stats.loops,
        wasm_bytes = wasm.len(),
        elapsed_us = timings.compile_total().as_micros() as u64,
        "compiled program"
    );

    Ok(Artifact {
        tree,
        program,
        wasm,
        timings,
    })
}
