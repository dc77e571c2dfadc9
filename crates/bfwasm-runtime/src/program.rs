//! Compiled programs: reusable modules and the source-level facade.

use crate::host_functions::HostFunctions;
use crate::instance::ProgramInstance;
use bfwasm_core::{CompilerConfig, Error, ExecutionResult, PhaseTimings, Result, RuntimeConfig};
use bfwasm_ir::{Artifact, Program};
use bfwasm_syntax::SyntaxTree;
use std::time::Instant;
use wasmtime::{Engine, InstancePre, Linker, Module};

/// A loaded module, instantiated afresh for every execution
pub struct CompiledModule {
    engine: Engine,
    instance_pre: InstancePre<HostFunctions>,
    memory_size: u32,
    config: RuntimeConfig,
}

impl CompiledModule {
    pub fn new(
        engine: &Engine,
        wasm_bytes: &[u8],
        memory_size: u32,
        config: RuntimeConfig,
    ) -> Result<Self> {
        let module = Module::new(engine, wasm_bytes)
            .map_err(|e| Error::Wasm(format!("Failed to compile module: {}", e)))?;

        let mut linker = Linker::new(engine);
        HostFunctions::add_to_linker(&mut linker)
            .map_err(|e| Error::Wasm(format!("Failed to add host functions: {}", e)))?;

        let instance_pre = linker
            .instantiate_pre(&module)
            .map_err(|e| Error::Wasm(format!("Failed to link module: {}", e)))?;

        Ok(Self {
            engine: engine.clone(),
            instance_pre,
            memory_size,
            config,
        })
    }

    pub fn memory_size(&self) -> u32 {
        self.memory_size
    }

    /// Run once against `input` with fresh memory and pointer
    pub fn execute(&self, input: &[u8]) -> Result<ExecutionResult> {
        let start = Instant::now();
        let instance = ProgramInstance::new(
            &self.engine,
            &self.instance_pre,
            input,
            self.memory_size,
            self.config.clone(),
        )?;
        let instantiate = start.elapsed();

        let start = Instant::now();
        let mut result = instance.run()?;
        let execute = start.elapsed();

        if self.config.record_timings {
            result.timings = Some(PhaseTimings {
                instantiate,
                execute,
                ..PhaseTimings::default()
            });
        }

        tracing::debug!(
            input_len = input.len(),
            output_len = result.output.len(),
            pointer = result.pointer,
            "executed module"
        );
        Ok(result)
    }
}

/// A source program compiled to a ready-to-run module
pub struct BrainfuckProgram {
    artifact: Artifact,
    module: CompiledModule,
    config: CompilerConfig,
}

impl BrainfuckProgram {
    pub(crate) fn new(artifact: Artifact, module: CompiledModule, config: CompilerConfig) -> Self {
        Self {
            artifact,
            module,
            config,
        }
    }

    /// Compile with a default runtime
    pub fn compile(source: &str, config: CompilerConfig) -> Result<Self> {
        crate::Runtime::new(RuntimeConfig::default())?.compile(source, config)
    }

    /// Execute with the given input bytes. Every call starts from a zeroed
    /// tape and pointer 0.
    pub fn execute(&self, input: &[u8]) -> Result<ExecutionResult> {
        let mut result = self.module.execute(input)?;
        if let Some(timings) = result.timings.as_mut() {
            let compile = &self.artifact.timings;
            timings.parse = compile.parse;
            timings.lower = compile.lower;
            timings.contract = compile.contract;
            timings.multiply_loops = compile.multiply_loops;
            timings.coalesce_offsets = compile.coalesce_offsets;
            timings.codegen = compile.codegen;
            timings.validate = compile.validate;
            timings.load = compile.load;
        }
        Ok(result)
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.artifact.tree
    }

    /// The optimized IR
    pub fn program(&self) -> &Program {
        &self.artifact.program
    }

    pub fn wasm(&self) -> &[u8] {
        &self.artifact.wasm
    }

    pub fn compile_timings(&self) -> &PhaseTimings {
        &self.artifact.timings
    }

    pub fn module(&self) -> &CompiledModule {
        &self.module
    }
}
