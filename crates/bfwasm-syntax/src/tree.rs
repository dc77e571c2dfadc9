//! Syntax tree produced by the parser.

use bfwasm_core::SourcePosition;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-bracket command character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    Right,
    Left,
    Increment,
    Decrement,
    Output,
    Input,
}

impl Command {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '>' => Some(Command::Right),
            '<' => Some(Command::Left),
            '+' => Some(Command::Increment),
            '-' => Some(Command::Decrement),
            '.' => Some(Command::Output),
            ',' => Some(Command::Input),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Command::Right => '>',
            Command::Left => '<',
            Command::Increment => '+',
            Command::Decrement => '-',
            Command::Output => '.',
            Command::Input => ',',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    Command {
        command: Command,
        position: SourcePosition,
    },
    /// A bracket-delimited loop; `open` is the position of its `[`
    Loop {
        open: SourcePosition,
        body: Vec<Node>,
    },
}

impl Node {
    /// Number of nodes in this subtree, counting itself
    pub fn len(&self) -> usize {
        match self {
            Node::Command { .. } => 1,
            Node::Loop { body, .. } => 1 + body.iter().map(Node::len).sum::<usize>(),
        }
    }
}

/// Root of a parsed program
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxTree {
    pub nodes: Vec<Node>,
}

impl SyntaxTree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total number of nodes at every depth
    pub fn node_count(&self) -> usize {
        self.nodes.iter().map(Node::len).sum()
    }
}

fn write_nodes(f: &mut fmt::Formatter<'_>, nodes: &[Node]) -> fmt::Result {
    for node in nodes {
        match node {
            Node::Command { command, .. } => write!(f, "{}", command.as_char())?,
            Node::Loop { body, .. } => {
                f.write_str("[")?;
                write_nodes(f, body)?;
                f.write_str("]")?;
            }
        }
    }
    Ok(())
}

/// Prints the canonical source: command characters only, comments dropped.
impl fmt::Display for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_nodes(f, &self.nodes)
    }
}
