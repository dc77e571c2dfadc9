//! Bracket-matching parser.

use crate::tree::{Command, Node, SyntaxTree};
use bfwasm_core::{SourcePosition, SyntaxError, MAX_NESTING_DEPTH};

/// Parse source text into a syntax tree.
///
/// Nesting is tracked on an explicit stack, so parsing itself never
/// recurses. The stages that consume the tree do, which is why a loop
/// nested more than [`MAX_NESTING_DEPTH`] levels deep is rejected here.
pub fn parse(source: &str) -> Result<SyntaxTree, SyntaxError> {
    // Each frame holds the `[` that opened it and the nodes collected so far.
    let mut frames: Vec<(SourcePosition, Vec<Node>)> = Vec::new();
    let mut current: Vec<Node> = Vec::new();

    let mut line = 1;
    let mut column = 1;

    for (offset, c) in source.char_indices() {
        let position = SourcePosition::new(offset, line, column);

        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }

        match c {
            '[' => {
                if frames.len() == MAX_NESTING_DEPTH {
                    return Err(SyntaxError::NestingTooDeep {
                        position,
                        limit: MAX_NESTING_DEPTH,
                    });
                }
                frames.push((position, std::mem::take(&mut current)));
            }
            ']' => {
                let (open, parent) = frames
                    .pop()
                    .ok_or(SyntaxError::UnmatchedClose { position })?;
                let body = std::mem::replace(&mut current, parent);
                current.push(Node::Loop { open, body });
            }
            _ => {
                if let Some(command) = Command::from_char(c) {
                    current.push(Node::Command { command, position });
                }
            }
        }
    }

    // Report the innermost unclosed bracket.
    if let Some((position, _)) = frames.pop() {
        return Err(SyntaxError::UnmatchedOpen { position });
    }

    tracing::debug!(nodes = current.len(), "parsed source");
    Ok(SyntaxTree::new(current))
}
