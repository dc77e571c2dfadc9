//! Per-run I/O buffers shared between the host and the module.

use std::collections::VecDeque;

/// Value `input` returns once the buffer is exhausted
pub const EOF: i32 = -1;

/// Input queue and output sink for one execution
#[derive(Debug, Clone, Default)]
pub struct IoContext {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

impl IoContext {
    /// Input is taken as raw bytes, so multi-byte characters are delivered
    /// one byte per read.
    pub fn new(input: &[u8]) -> Self {
        Self {
            input: input.iter().copied().collect(),
            output: Vec::new(),
        }
    }

    /// Pop the next input byte, or `EOF`
    pub fn read(&mut self) -> i32 {
        self.input.pop_front().map_or(EOF, i32::from)
    }

    pub fn write(&mut self, byte: u8) {
        self.output.push(byte);
    }

    pub fn remaining_input(&self) -> usize {
        self.input.len()
    }

    pub fn into_output(self) -> Vec<u8> {
        self.output
    }
}
