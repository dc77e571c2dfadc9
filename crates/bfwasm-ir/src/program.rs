//! Program structure: the top-level instruction sequence.

use crate::instruction::Instruction;
use bfwasm_core::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A complete program.
///
/// Passes take a `Program` by value and return a new one, so no two stages
/// of the pipeline ever share an instruction sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub instructions: Vec<Instruction>,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    pub fn into_instructions(self) -> Vec<Instruction> {
        self.instructions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    /// Number of top-level instructions
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Count total instructions in the program, including loop bodies
    pub fn instruction_count(&self) -> usize {
        self.instructions.iter().map(Instruction::instruction_count).sum()
    }

    /// Deepest loop nesting
    pub fn max_depth(&self) -> usize {
        self.instructions.iter().map(Instruction::depth).max().unwrap_or(0)
    }

    /// Serialize the program to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a program from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        bincode::deserialize(bytes).map_err(|e| Error::Serialization(e.to_string()))
    }
}

impl From<Vec<Instruction>> for Program {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self::new(instructions)
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

fn write_block(f: &mut fmt::Formatter<'_>, block: &[Instruction], indent: usize) -> fmt::Result {
    for inst in block {
        match inst {
            Instruction::Loop(body) => {
                writeln!(f, "{:indent$}loop {{", "", indent = indent)?;
                write_block(f, body, indent + 2)?;
                writeln!(f, "{:indent$}}}", "", indent = indent)?;
            }
            other => writeln!(f, "{:indent$}{}", "", other, indent = indent)?,
        }
    }
    Ok(())
}

/// One instruction per line, loop bodies indented.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_block(f, &self.instructions, 0)
    }
}
