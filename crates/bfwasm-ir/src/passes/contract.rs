//! Run-length contraction of moves and cell updates.

use crate::instruction::Instruction;
use crate::program::Program;

/// Merge consecutive identical moves and same-offset `Add`/`Sub`
/// instructions into one weighted instruction. Loop bodies are contracted
/// independently; merges never cross a loop boundary.
pub fn contract(program: Program) -> Program {
    Program::new(contract_block(program.into_instructions()))
}

fn contract_block(instructions: Vec<Instruction>) -> Vec<Instruction> {
    let mut contracted: Vec<Instruction> = Vec::with_capacity(instructions.len());

    for inst in instructions {
        if let Instruction::Loop(body) = inst {
            contracted.push(Instruction::Loop(contract_block(body)));
            continue;
        }

        if let Some(previous) = contracted.last_mut() {
            if merge_into(previous, &inst) {
                continue;
            }
        }
        contracted.push(inst);
    }

    contracted
}

/// Fold `next` into `previous` if both are the same mergeable variant.
fn merge_into(previous: &mut Instruction, next: &Instruction) -> bool {
    match (previous, next) {
        (Instruction::MoveRight(total), Instruction::MoveRight(count))
        | (Instruction::MoveLeft(total), Instruction::MoveLeft(count)) => add_count(total, *count),
        (
            Instruction::Add {
                amount: total,
                offset: a,
            },
            Instruction::Add { amount, offset: b },
        )
        | (
            Instruction::Sub {
                amount: total,
                offset: a,
            },
            Instruction::Sub { amount, offset: b },
        ) if *a == *b => add_count(total, *amount),
        _ => false,
    }
}

fn add_count(total: &mut u32, count: u32) -> bool {
    match total.checked_add(count) {
        Some(sum) => {
            *total = sum;
            true
        }
        None => false,
    }
}
