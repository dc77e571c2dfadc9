//! A single instantiation of a compiled module.

use crate::context::IoContext;
use crate::host_functions::HostFunctions;
use bfwasm_core::{Error, ExecutionResult, Result, RuntimeConfig};
use bfwasm_ir::compiler::{ENTRY_EXPORT, MEMORY_EXPORT};
use wasmtime::*;

/// A freshly instantiated program with its own memory and pointer.
///
/// Instances are single-use: `run` consumes the instance, so no state ever
/// leaks from one execution into the next.
pub struct ProgramInstance {
    store: Store<HostFunctions>,
    entry_func: TypedFunc<(), i32>,
    memory: Memory,
    memory_size: u32,
    config: RuntimeConfig,
}

impl ProgramInstance {
    pub fn new(
        engine: &Engine,
        instance_pre: &InstancePre<HostFunctions>,
        input: &[u8],
        memory_size: u32,
        config: RuntimeConfig,
    ) -> Result<Self> {
        let mut store = Store::new(engine, HostFunctions::new(IoContext::new(input)));
        if let Some(fuel) = config.max_fuel {
            store
                .set_fuel(fuel)
                .map_err(|e| Error::Wasm(format!("Failed to set fuel: {}", e)))?;
        }

        let instance = instance_pre
            .instantiate(&mut store)
            .map_err(|e| Error::Wasm(format!("Failed to instantiate: {}", e)))?;

        let entry_func = instance
            .get_typed_func::<(), i32>(&mut store, ENTRY_EXPORT)
            .map_err(|e| Error::Wasm(format!("Failed to get entry function: {}", e)))?;

        let memory = instance
            .get_memory(&mut store, MEMORY_EXPORT)
            .ok_or_else(|| Error::Wasm(format!("Module does not export '{}'", MEMORY_EXPORT)))?;

        if memory.data_size(&store) < memory_size as usize {
            return Err(Error::Wasm(format!(
                "Module memory holds {} bytes, tape needs {}",
                memory.data_size(&store),
                memory_size
            )));
        }

        Ok(Self {
            store,
            entry_func,
            memory,
            memory_size,
            config,
        })
    }

    /// Execute the program to completion
    pub fn run(mut self) -> Result<ExecutionResult> {
        let pointer = self.entry_func.call(&mut self.store, ()).map_err(|e| {
            // Check if we ran out of fuel
            if let Some(trap) = e.downcast_ref::<Trap>() {
                if matches!(trap, Trap::OutOfFuel) {
                    tracing::warn!(
                        max_fuel = self.config.max_fuel,
                        "execution ran out of fuel"
                    );
                    return Error::ResourceExhausted("Out of fuel".to_string());
                }
            }
            Error::Wasm(format!("Entry function failed: {}", e))
        })?;

        if self.config.max_fuel.is_some() {
            tracing::debug!("Run consumed {} fuel", self.fuel_consumed());
        }

        let memory = self.memory.data(&self.store)[..self.memory_size as usize].to_vec();
        let context = self.store.into_data().context;
        tracing::debug!(
            unread_input = context.remaining_input(),
            pointer,
            "run finished"
        );
        let output = context.into_output();

        Ok(ExecutionResult {
            pointer: pointer as u32,
            memory,
            output,
            timings: None,
        })
    }

    /// Fuel consumed so far; 0 when fuel metering is off
    pub fn fuel_consumed(&self) -> u64 {
        match self.config.max_fuel {
            Some(max_fuel) => max_fuel.saturating_sub(self.store.get_fuel().unwrap_or(0)),
            None => 0,
        }
    }
}
