//! Semantics-preserving IR rewrites.
//!
//! Every pass consumes a `Program` and returns a new one. The pipeline order
//! is fixed: contraction, then multiplication loops, then offset coalescing.
//! Coalescing depends on the offset-bearing `Mul`/`Clear` shapes the
//! multiplication pass introduces, so it always runs last.

pub mod contract;
pub mod multiloop;
pub mod offset;

pub use contract::contract;
pub use multiloop::{multiply_loops, MultiplicationLoop};
pub use offset::coalesce_offsets;

use crate::program::Program;
use bfwasm_core::{CompilerConfig, PassConfig, PhaseTimings};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    Contract,
    MultiplyLoops,
    CoalesceOffsets,
}

impl Pass {
    /// All passes in pipeline order
    pub const ALL: [Pass; 3] = [Pass::Contract, Pass::MultiplyLoops, Pass::CoalesceOffsets];

    pub fn name(self) -> &'static str {
        match self {
            Pass::Contract => "contract",
            Pass::MultiplyLoops => "multiply-loops",
            Pass::CoalesceOffsets => "coalesce-offsets",
        }
    }

    pub fn is_enabled(self, config: &PassConfig) -> bool {
        match self {
            Pass::Contract => config.contract,
            Pass::MultiplyLoops => config.multiply_loops,
            Pass::CoalesceOffsets => config.coalesce_offsets,
        }
    }

    /// Apply this pass. Passes that reason about cell aliasing read the
    /// tape size from `config`.
    pub fn run(self, program: Program, config: &CompilerConfig) -> Program {
        match self {
            Pass::Contract => contract(program),
            Pass::MultiplyLoops => multiply_loops(program, config.memory_size),
            Pass::CoalesceOffsets => coalesce_offsets(program),
        }
    }

    fn record(self, timings: &mut PhaseTimings, elapsed: std::time::Duration) {
        match self {
            Pass::Contract => timings.contract = elapsed,
            Pass::MultiplyLoops => timings.multiply_loops = elapsed,
            Pass::CoalesceOffsets => timings.coalesce_offsets = elapsed,
        }
    }
}

/// Run the passes enabled in `config.passes` in pipeline order, recording
/// how long each took.
pub fn optimize(
    program: Program,
    config: &CompilerConfig,
    timings: &mut PhaseTimings,
) -> Program {
    let mut program = program;
    for pass in Pass::ALL {
        if !pass.is_enabled(&config.passes) {
            continue;
        }
        let before = program.instruction_count();
        let start = Instant::now();
        program = pass.run(program, config);
        pass.record(timings, start.elapsed());
        tracing::debug!(
            pass = pass.name(),
            before,
            after = program.instruction_count(),
            "ran optimization pass"
        );
    }
    program
}
