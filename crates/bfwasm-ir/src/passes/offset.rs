//! Offset coalescing: fold pointer moves into instruction offsets.

use crate::instruction::Instruction;
use crate::program::Program;

/// Replace pointer moves inside each basic block with per-instruction
/// offsets. Pending motion is flushed as a single move before every loop
/// and at the end of every block, so a loop always tests the cell its
/// source position implies and bodies start with a zero offset.
///
/// Offsets are never wrapped: motion that would push the accumulator or a
/// shifted offset outside the `i32` range is flushed as an explicit move
/// first.
pub fn coalesce_offsets(program: Program) -> Program {
    Program::new(coalesce_block(program.into_instructions()))
}

fn coalesce_block(instructions: Vec<Instruction>) -> Vec<Instruction> {
    let mut coalesced = Vec::with_capacity(instructions.len());
    let mut pending: i32 = 0;

    for inst in instructions {
        match inst {
            Instruction::MoveRight(count) => {
                accumulate(&mut coalesced, &mut pending, i64::from(count))
            }
            Instruction::MoveLeft(count) => {
                accumulate(&mut coalesced, &mut pending, -i64::from(count))
            }
            Instruction::Loop(body) => {
                flush(&mut coalesced, &mut pending);
                coalesced.push(Instruction::Loop(coalesce_block(body)));
            }
            other => match other.clone().checked_shifted(pending) {
                Some(shifted) => coalesced.push(shifted),
                None => {
                    flush(&mut coalesced, &mut pending);
                    coalesced.push(other);
                }
            },
        }
    }

    flush(&mut coalesced, &mut pending);
    coalesced
}

fn accumulate(coalesced: &mut Vec<Instruction>, pending: &mut i32, delta: i64) {
    if let Ok(sum) = i32::try_from(i64::from(*pending) + delta) {
        *pending = sum;
        return;
    }
    flush(coalesced, pending);
    match i32::try_from(delta) {
        Ok(delta) => *pending = delta,
        Err(_) => coalesced.push(motion(delta)),
    }
}

fn flush(coalesced: &mut Vec<Instruction>, pending: &mut i32) {
    if *pending != 0 {
        coalesced.push(motion(i64::from(*pending)));
    }
    *pending = 0;
}

/// A single move by `delta`, which must fit in a `u32` magnitude.
fn motion(delta: i64) -> Instruction {
    let count = delta.unsigned_abs() as u32;
    if delta > 0 {
        Instruction::MoveRight(count)
    } else {
        Instruction::MoveLeft(count)
    }
}
