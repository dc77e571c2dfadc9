//! Lowering from the syntax tree to IR.

use crate::instruction::Instruction;
use crate::program::Program;
use bfwasm_syntax::{Command, Node, SyntaxTree};

/// Map every command node to its single-instruction equivalent and every
/// loop node to a `Loop` over its lowered children. No optimization happens
/// here.
pub fn lower(tree: &SyntaxTree) -> Program {
    let program = Program::new(lower_nodes(&tree.nodes));
    tracing::debug!(
        instructions = program.instruction_count(),
        depth = program.max_depth(),
        "lowered syntax tree"
    );
    program
}

fn lower_nodes(nodes: &[Node]) -> Vec<Instruction> {
    nodes.iter().map(lower_node).collect()
}

fn lower_node(node: &Node) -> Instruction {
    match node {
        Node::Command { command, .. } => lower_command(*command),
        Node::Loop { body, .. } => Instruction::Loop(lower_nodes(body)),
    }
}

fn lower_command(command: Command) -> Instruction {
    match command {
        Command::Right => Instruction::MoveRight(1),
        Command::Left => Instruction::MoveLeft(1),
        Command::Increment => Instruction::add(1),
        Command::Decrement => Instruction::sub(1),
        Command::Output => Instruction::output(),
        Command::Input => Instruction::input(),
    }
}
