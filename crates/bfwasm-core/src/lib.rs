//! Core types shared by the bfwasm compiler and runtime crates.

pub mod types;
pub mod config;
pub mod error;

pub use error::{Error, Result, SyntaxError};
pub use types::*;
pub use config::*;
