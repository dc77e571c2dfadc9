//! Instruction set for the tape IR.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single IR instruction.
///
/// Offsets are relative to the pointer. Before offset coalescing they are
/// always 0; afterwards they are relative to the pointer position at entry
/// to the enclosing loop (or program start).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instruction {
    /// Advance the pointer, wrapping at the end of the tape
    MoveRight(u32),
    /// Retreat the pointer, wrapping at the start of the tape
    MoveLeft(u32),
    Add {
        amount: u32,
        offset: i32,
    },
    Sub {
        amount: u32,
        offset: i32,
    },
    /// `cell[dest_offset] += cell[src_offset] * factor`
    Mul {
        dest_offset: i32,
        factor: i32,
        src_offset: i32,
    },
    Clear {
        offset: i32,
    },
    Output {
        offset: i32,
    },
    Input {
        offset: i32,
    },
    /// Repeat the body while the cell under the pointer is non-zero
    Loop(Vec<Instruction>),
}

impl Instruction {
    pub fn add(amount: u32) -> Self {
        Instruction::Add { amount, offset: 0 }
    }

    pub fn sub(amount: u32) -> Self {
        Instruction::Sub { amount, offset: 0 }
    }

    pub fn output() -> Self {
        Instruction::Output { offset: 0 }
    }

    pub fn input() -> Self {
        Instruction::Input { offset: 0 }
    }

    pub fn clear() -> Self {
        Instruction::Clear { offset: 0 }
    }

    pub fn mul(dest_offset: i32, factor: i32, src_offset: i32) -> Self {
        Instruction::Mul {
            dest_offset,
            factor,
            src_offset,
        }
    }

    /// Set the offset of a single-cell instruction; moves and loops are
    /// returned unchanged.
    pub fn at(self, offset: i32) -> Self {
        match self {
            Instruction::Add { amount, .. } => Instruction::Add { amount, offset },
            Instruction::Sub { amount, .. } => Instruction::Sub { amount, offset },
            Instruction::Clear { .. } => Instruction::Clear { offset },
            Instruction::Output { .. } => Instruction::Output { offset },
            Instruction::Input { .. } => Instruction::Input { offset },
            other => other,
        }
    }

    /// Shift every offset this instruction carries by `delta`, or `None`
    /// if any shifted offset would leave the `i32` range.
    pub fn checked_shifted(self, delta: i32) -> Option<Self> {
        Some(match self {
            Instruction::Add { amount, offset } => Instruction::Add {
                amount,
                offset: offset.checked_add(delta)?,
            },
            Instruction::Sub { amount, offset } => Instruction::Sub {
                amount,
                offset: offset.checked_add(delta)?,
            },
            Instruction::Mul {
                dest_offset,
                factor,
                src_offset,
            } => Instruction::Mul {
                dest_offset: dest_offset.checked_add(delta)?,
                factor,
                src_offset: src_offset.checked_add(delta)?,
            },
            Instruction::Clear { offset } => Instruction::Clear {
                offset: offset.checked_add(delta)?,
            },
            Instruction::Output { offset } => Instruction::Output {
                offset: offset.checked_add(delta)?,
            },
            Instruction::Input { offset } => Instruction::Input {
                offset: offset.checked_add(delta)?,
            },
            other @ (Instruction::MoveRight(_)
            | Instruction::MoveLeft(_)
            | Instruction::Loop(_)) => other,
        })
    }

    /// Number of instructions in this subtree, counting itself
    pub fn instruction_count(&self) -> usize {
        match self {
            Instruction::Loop(body) => {
                1 + body
                    .iter()
                    .map(Instruction::instruction_count)
                    .sum::<usize>()
            }
            _ => 1,
        }
    }

    /// Loop nesting depth of this subtree; 0 for non-loops
    pub fn depth(&self) -> usize {
        match self {
            Instruction::Loop(body) => 1 + body.iter().map(Instruction::depth).max().unwrap_or(0),
            _ => 0,
        }
    }
}

struct Offset(i32);

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            write!(f, "[p{}]", self.0)
        } else {
            write!(f, "[p+{}]", self.0)
        }
    }
}

/// Single-line assembly-like rendering; a loop prints only its header.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::MoveRight(count) => write!(f, "right {}", count),
            Instruction::MoveLeft(count) => write!(f, "left {}", count),
            Instruction::Add { amount, offset } => write!(f, "add {} {}", Offset(*offset), amount),
            Instruction::Sub { amount, offset } => write!(f, "sub {} {}", Offset(*offset), amount),
            Instruction::Mul {
                dest_offset,
                factor,
                src_offset,
            } => write!(
                f,
                "mul {} {} * {}",
                Offset(*dest_offset),
                Offset(*src_offset),
                factor
            ),
            Instruction::Clear { offset } => write!(f, "clear {}", Offset(*offset)),
            Instruction::Output { offset } => write!(f, "output {}", Offset(*offset)),
            Instruction::Input { offset } => write!(f, "input {}", Offset(*offset)),
            Instruction::Loop(body) => write!(f, "loop ({} instructions)", body.len()),
        }
    }
}
