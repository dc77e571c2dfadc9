//! Intermediate Representation (IR) for tape programs.
//!
//! The IR is a single closed instruction type whose loops nest by ownership.
//! It is:
//! - Produced by lowering a syntax tree one command at a time
//! - Rewritten by semantics-preserving passes (contraction, multiplication
//!   loops, offset coalescing), each consuming and producing a `Program`
//! - Compiled deterministically to a WebAssembly module
//! - Executable directly by a reference interpreter

pub mod instruction;
pub mod program;
pub mod lower;
pub mod passes;
pub mod compiler;
pub mod interpreter;
pub mod validation;
pub mod pipeline;

pub use instruction::Instruction;
pub use program::Program;
pub use lower::lower;
pub use passes::{optimize, Pass};
pub use compiler::Compiler;
pub use interpreter::Interpreter;
pub use validation::{validate_module, validate_program};
pub use pipeline::{compile_source, Artifact};
