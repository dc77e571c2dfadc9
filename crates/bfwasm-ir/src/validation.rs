//! Validation for optimized IR and generated modules.
//!
//! Both checks guard against compiler defects, so both report
//! `Error::Internal`.

use crate::instruction::Instruction;
use crate::program::Program;
use bfwasm_core::{Error, Result};

/// Check the invariants every pass preserves.
pub fn validate_program(program: &Program) -> Result<()> {
    validate_block(&program.instructions, &mut Vec::new())
}

fn validate_block(block: &[Instruction], path: &mut Vec<usize>) -> Result<()> {
    for (idx, inst) in block.iter().enumerate() {
        path.push(idx);
        validate_instruction(inst, path)?;
        path.pop();
    }
    Ok(())
}

fn validate_instruction(inst: &Instruction, path: &mut Vec<usize>) -> Result<()> {
    let defect = |what: &str| {
        Error::Internal(format!(
            "{} at instruction path {:?}: {}",
            what, path, inst
        ))
    };

    match inst {
        Instruction::MoveRight(0) | Instruction::MoveLeft(0) => Err(defect("zero-length move")),
        Instruction::Add { amount: 0, .. } | Instruction::Sub { amount: 0, .. } => {
            Err(defect("zero-amount cell update"))
        }
        Instruction::Mul { factor: 0, .. } => Err(defect("zero-factor multiplication")),
        Instruction::Mul {
            dest_offset,
            src_offset,
            ..
        } if dest_offset == src_offset => Err(defect("multiplication into its own source")),
        Instruction::Loop(body) => validate_block(body, path),
        _ => Ok(()),
    }
}

/// Run the backend validator over emitted module bytes.
pub fn validate_module(bytes: &[u8]) -> Result<()> {
    wasmparser::Validator::new()
        .validate_all(bytes)
        .map(|_| ())
        .map_err(|e| Error::Internal(format!("generated module failed validation: {}", e)))
}
