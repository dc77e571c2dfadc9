//! WASM runtime for executing compiled tape programs.
//!
//! This module provides the execution environment, including:
//! - Host I/O imports backed by per-run byte buffers
//! - Fresh memory and pointer state for every run
//! - Optional fuel-based execution limits

pub mod context;
pub mod host_functions;
pub mod instance;
pub mod program;

pub use context::IoContext;
pub use host_functions::HostFunctions;
pub use instance::ProgramInstance;
pub use program::{BrainfuckProgram, CompiledModule};

pub use bfwasm_core::{
    CompilerConfig, EofBehavior, Error, ExecutionResult, PassConfig, PhaseTimings, Result,
    RuntimeConfig,
};

use bfwasm_ir::compile_source;
use std::time::Instant;
use wasmtime::*;

/// The WASM runtime manager
pub struct Runtime {
    engine: Engine,
    config: RuntimeConfig,
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let mut wasm_config = Config::new();
        wasm_config.consume_fuel(config.max_fuel.is_some());
        wasm_config.max_wasm_stack(config.max_wasm_stack);

        let engine = Engine::new(&wasm_config)
            .map_err(|e| Error::Wasm(format!("Failed to create engine: {}", e)))?;

        Ok(Self { engine, config })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Load generated module bytes for a tape of `memory_size` cells
    pub fn load(&self, wasm_bytes: &[u8], memory_size: u32) -> Result<CompiledModule> {
        CompiledModule::new(&self.engine, wasm_bytes, memory_size, self.config.clone())
    }

    /// Compile source text all the way to a loaded, runnable program
    pub fn compile(&self, source: &str, config: CompilerConfig) -> Result<BrainfuckProgram> {
        let mut artifact = compile_source(source, &config)?;

        let start = Instant::now();
        let module = self.load(&artifact.wasm, config.memory_size)?;
        artifact.timings.load = start.elapsed();

        Ok(BrainfuckProgram::new(artifact, module, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_runtime() {
        assert!(Runtime::new(RuntimeConfig::default()).is_ok());

        let metered = RuntimeConfig {
            max_fuel: Some(1_000),
            ..RuntimeConfig::default()
        };
        assert!(Runtime::new(metered).is_ok());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let runtime = Runtime::new(RuntimeConfig::default()).unwrap();
        let err = runtime.load(b"not wasm", 30_000).err().unwrap();
        assert!(matches!(err, Error::Wasm(_)));
    }

    #[test]
    fn test_compile_reports_syntax_errors() {
        let runtime = Runtime::new(RuntimeConfig::default()).unwrap();
        let err = runtime.compile("]", CompilerConfig::default()).err().unwrap();
        assert!(err.is_syntax());
    }
}
