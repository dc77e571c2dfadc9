//! Configuration types for compilation and execution.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default tape length in cells
pub const DEFAULT_MEMORY_SIZE: u32 = 30_000;

/// Largest tape the code generator can address without overflowing
/// the 32-bit pointer arithmetic.
pub const MAX_MEMORY_SIZE: u32 = 1 << 31;

/// Deepest loop nesting the parser accepts. Every stage after parsing
/// walks loops recursively, so this bounds their native stack use.
pub const MAX_NESTING_DEPTH: usize = 512;

/// What an input instruction does once the input stream is exhausted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EofBehavior {
    /// Leave the cell untouched
    #[default]
    Unchanged,
    /// Store `0x00`
    Zero,
    /// Store `0xff`
    AllOnes,
}

impl EofBehavior {
    /// Byte written to the cell on end of input, if any
    pub fn fill_byte(self) -> Option<u8> {
        match self {
            EofBehavior::Unchanged => None,
            EofBehavior::Zero => Some(0x00),
            EofBehavior::AllOnes => Some(0xff),
        }
    }
}

/// Which optimization passes run over the IR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassConfig {
    /// Merge runs of identical moves and cell updates
    pub contract: bool,
    /// Rewrite clear-and-distribute loops into multiplications
    pub multiply_loops: bool,
    /// Fold pointer moves into instruction offsets
    pub coalesce_offsets: bool,
}

impl PassConfig {
    pub fn none() -> Self {
        Self {
            contract: false,
            multiply_loops: false,
            coalesce_offsets: false,
        }
    }
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            contract: true,
            multiply_loops: true,
            coalesce_offsets: true,
        }
    }
}

/// Compiler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Number of cells on the tape
    pub memory_size: u32,
    pub eof_behavior: EofBehavior,
    pub passes: PassConfig,
}

impl CompilerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.memory_size == 0 {
            return Err(Error::Config("memory_size must be positive".to_string()));
        }
        if self.memory_size > MAX_MEMORY_SIZE {
            return Err(Error::Config(format!(
                "memory_size {} exceeds the maximum of {}",
                self.memory_size, MAX_MEMORY_SIZE
            )));
        }
        Ok(())
    }

    pub fn with_memory_size(mut self, memory_size: u32) -> Self {
        self.memory_size = memory_size;
        self
    }

    pub fn with_eof_behavior(mut self, eof_behavior: EofBehavior) -> Self {
        self.eof_behavior = eof_behavior;
        self
    }

    pub fn with_passes(mut self, passes: PassConfig) -> Self {
        self.passes = passes;
        self
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            eof_behavior: EofBehavior::Unchanged,
            passes: PassConfig::default(),
        }
    }
}

/// Execution limits for compiled modules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Fuel budget per run; `None` lets a program loop forever
    pub max_fuel: Option<u64>,
    /// Maximum native stack for wasm code (bytes)
    pub max_wasm_stack: usize,
    /// Record per-phase timings in each result
    pub record_timings: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_fuel: None,
            max_wasm_stack: 512 * 1024,
            record_timings: true,
        }
    }
}

/// Top-level configuration, loadable from JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub compiler: CompilerConfig,
    pub runtime: RuntimeConfig,
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.compiler.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
