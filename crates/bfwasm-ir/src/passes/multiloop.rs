//! Strength reduction of clear-and-distribute loops.
//!
//! A loop whose body only moves the pointer and adds to cells, returns the
//! pointer to where it started, and decrements the starting cell by exactly
//! one per iteration runs `n` times for a starting value `n`. Every other
//! cell it touches therefore receives `n * delta`, which is what `Mul`
//! computes in one step.
//!
//! Offsets wrap around the tape, so on a narrow tape a far offset can land
//! on the counter itself. Such a loop no longer counts down by one and is
//! left alone.

use crate::instruction::Instruction;
use crate::program::Program;
use std::collections::BTreeMap;

/// The net effect of a recognised loop body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiplicationLoop {
    /// Destination offset to factor, ascending by offset, zero factors dropped
    pub factors: BTreeMap<i32, i32>,
}

impl MultiplicationLoop {
    /// Test a loop body for the idiom.
    ///
    /// The body must contain only moves and `Add`/`Sub`; each cell update
    /// lands at the running pointer position plus its own offset. No
    /// touched offset other than 0 may address the counter cell on a tape
    /// of `memory_size` cells.
    pub fn detect(body: &[Instruction], memory_size: u32) -> Option<Self> {
        let mut position: i64 = 0;
        let mut deltas: BTreeMap<i64, i64> = BTreeMap::new();

        for inst in body {
            match inst {
                Instruction::MoveRight(count) => position += i64::from(*count),
                Instruction::MoveLeft(count) => position -= i64::from(*count),
                Instruction::Add { amount, offset } => {
                    let target = position + i64::from(*offset);
                    *deltas.entry(target).or_default() += i64::from(*amount);
                }
                Instruction::Sub { amount, offset } => {
                    let target = position + i64::from(*offset);
                    *deltas.entry(target).or_default() -= i64::from(*amount);
                }
                Instruction::Mul { .. }
                | Instruction::Clear { .. }
                | Instruction::Output { .. }
                | Instruction::Input { .. }
                | Instruction::Loop(_) => return None,
            }
        }

        if position != 0 || deltas.get(&0).copied().unwrap_or(0) != -1 {
            return None;
        }

        let size = i64::from(memory_size);
        if deltas
            .keys()
            .any(|&offset| offset != 0 && offset.checked_rem_euclid(size) == Some(0))
        {
            return None;
        }

        let factors = deltas
            .into_iter()
            .filter(|&(offset, delta)| offset != 0 && delta != 0)
            .map(|(offset, delta)| {
                Some((i32::try_from(offset).ok()?, i32::try_from(delta).ok()?))
            })
            .collect::<Option<BTreeMap<i32, i32>>>()?;

        Some(Self { factors })
    }

    /// One `Mul` per destination in ascending offset order, then `Clear`.
    pub fn into_instructions(self) -> Vec<Instruction> {
        self.factors
            .into_iter()
            .map(|(dest_offset, factor)| Instruction::mul(dest_offset, factor, 0))
            .chain(std::iter::once(Instruction::clear()))
            .collect()
    }
}

/// Rewrite every multiplication loop; other loops keep their shape with
/// their bodies rewritten recursively.
pub fn multiply_loops(program: Program, memory_size: u32) -> Program {
    Program::new(rewrite_block(program.into_instructions(), memory_size))
}

fn rewrite_block(instructions: Vec<Instruction>, memory_size: u32) -> Vec<Instruction> {
    let mut rewritten = Vec::with_capacity(instructions.len());

    for inst in instructions {
        match inst {
            Instruction::Loop(body) => match MultiplicationLoop::detect(&body, memory_size) {
                Some(multiplication) => {
                    tracing::trace!(
                        destinations = multiplication.factors.len(),
                        "rewrote multiplication loop"
                    );
                    rewritten.extend(multiplication.into_instructions());
                }
                None => rewritten.push(Instruction::Loop(rewrite_block(body, memory_size))),
            },
            other => rewritten.push(other),
        }
    }

    rewritten
}
