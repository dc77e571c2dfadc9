//! Core type definitions shared across the pipeline.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

/// Location of a character in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourcePosition {
    /// Byte offset from the start of the source
    pub offset: usize,
    /// 1-based line number
    pub line: usize,
    /// 1-based column, counted in characters
    pub column: usize,
}

impl SourcePosition {
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}, column {} (offset {})",
            self.line, self.column, self.offset
        )
    }
}

/// Wall-clock time spent in each pipeline phase.
///
/// Instrumentation only; phases that did not run stay at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseTimings {
    pub parse: Duration,
    pub lower: Duration,
    pub contract: Duration,
    pub multiply_loops: Duration,
    pub coalesce_offsets: Duration,
    pub codegen: Duration,
    pub validate: Duration,
    pub load: Duration,
    pub instantiate: Duration,
    pub execute: Duration,
}

impl PhaseTimings {
    pub fn total(&self) -> Duration {
        self.compile_total() + self.load + self.instantiate + self.execute
    }

    /// Time spent between source text and validated module bytes
    pub fn compile_total(&self) -> Duration {
        self.parse
            + self.lower
            + self.contract
            + self.multiply_loops
            + self.coalesce_offsets
            + self.codegen
            + self.validate
    }
}

/// Outcome of a single run of a compiled program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Final pointer position, always within `[0, memory_size)`
    pub pointer: u32,
    /// Snapshot of the tape, exactly `memory_size` bytes
    pub memory: Vec<u8>,
    /// Bytes emitted by the program, in order
    pub output: Vec<u8>,
    pub timings: Option<PhaseTimings>,
}

impl ExecutionResult {
    /// Output decoded as text; invalid UTF-8 sequences are replaced.
    pub fn output_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.output)
    }

    /// Value of the cell under the final pointer
    pub fn current_cell(&self) -> u8 {
        self.memory
            .get(self.pointer as usize)
            .copied()
            .unwrap_or_default()
    }
}
