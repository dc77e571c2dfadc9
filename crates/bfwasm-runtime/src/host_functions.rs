//! Host function implementations for the module's I/O imports.

use crate::context::IoContext;
use bfwasm_ir::compiler::{IMPORT_MODULE, INPUT_IMPORT, OUTPUT_IMPORT};
use wasmtime::*;

/// Store data for one execution
#[derive(Debug, Default)]
pub struct HostFunctions {
    pub context: IoContext,
}

impl HostFunctions {
    pub fn new(context: IoContext) -> Self {
        Self { context }
    }

    /// Add the host I/O imports to a linker
    pub fn add_to_linker(linker: &mut Linker<Self>) -> Result<(), anyhow::Error> {
        // output: (byte: i32) -> ()
        linker.func_wrap(
            IMPORT_MODULE,
            OUTPUT_IMPORT,
            |mut caller: Caller<'_, Self>, byte: i32| {
                caller.data_mut().context.write(byte as u8);
            },
        )?;

        // input: () -> i32, negative on end of input
        linker.func_wrap(
            IMPORT_MODULE,
            INPUT_IMPORT,
            |mut caller: Caller<'_, Self>| -> i32 { caller.data_mut().context.read() },
        )?;

        Ok(())
    }
}
