//! Reference interpreter for the IR.
//!
//! Executes a `Program` directly with the same wraparound and end-of-input
//! rules as the generated WebAssembly, so either side can check the other.

use crate::instruction::Instruction;
use crate::program::Program;
use bfwasm_core::{CompilerConfig, EofBehavior, Error, ExecutionResult, Result};

#[derive(Debug, Clone)]
pub struct Interpreter {
    memory_size: u32,
    eof_behavior: EofBehavior,
    max_steps: Option<u64>,
}

impl Interpreter {
    pub fn new(config: &CompilerConfig) -> Self {
        Self {
            memory_size: config.memory_size,
            eof_behavior: config.eof_behavior,
            max_steps: None,
        }
    }

    /// Abort with `ResourceExhausted` after this many executed instructions
    /// (each loop test counts as one).
    pub fn with_step_limit(mut self, max_steps: u64) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    pub fn run(&self, program: &Program, input: &[u8]) -> Result<ExecutionResult> {
        if self.memory_size == 0 {
            return Err(Error::Config("memory_size must be positive".to_string()));
        }

        let mut machine = Machine {
            memory: vec![0; self.memory_size as usize],
            size: u64::from(self.memory_size),
            pointer: 0,
            input: input.iter(),
            output: Vec::new(),
            eof_fill: self.eof_behavior.fill_byte(),
            steps: 0,
            max_steps: self.max_steps,
        };
        machine.run_block(&program.instructions)?;

        Ok(ExecutionResult {
            pointer: machine.pointer as u32,
            memory: machine.memory,
            output: machine.output,
            timings: None,
        })
    }
}

struct Machine<'a> {
    memory: Vec<u8>,
    size: u64,
    pointer: u64,
    input: std::slice::Iter<'a, u8>,
    output: Vec<u8>,
    eof_fill: Option<u8>,
    steps: u64,
    max_steps: Option<u64>,
}

impl Machine<'_> {
    fn tick(&mut self) -> Result<()> {
        self.steps += 1;
        match self.max_steps {
            Some(limit) if self.steps > limit => Err(Error::ResourceExhausted(format!(
                "step limit of {} exceeded",
                limit
            ))),
            _ => Ok(()),
        }
    }

    fn address(&self, offset: i32) -> usize {
        let size = self.size as i64;
        (self.pointer as i64 + i64::from(offset)).rem_euclid(size) as usize
    }

    fn run_block(&mut self, block: &[Instruction]) -> Result<()> {
        for inst in block {
            self.tick()?;
            match inst {
                Instruction::MoveRight(count) => {
                    self.pointer = (self.pointer + u64::from(*count) % self.size) % self.size;
                }
                Instruction::MoveLeft(count) => {
                    self.pointer =
                        (self.pointer + self.size - u64::from(*count) % self.size) % self.size;
                }
                Instruction::Add { amount, offset } => {
                    let addr = self.address(*offset);
                    self.memory[addr] = self.memory[addr].wrapping_add(*amount as u8);
                }
                Instruction::Sub { amount, offset } => {
                    let addr = self.address(*offset);
                    self.memory[addr] = self.memory[addr].wrapping_sub(*amount as u8);
                }
                Instruction::Mul {
                    dest_offset,
                    factor,
                    src_offset,
                } => {
                    let src = self.memory[self.address(*src_offset)];
                    let dest = self.address(*dest_offset);
                    let product = src.wrapping_mul(*factor as u8);
                    self.memory[dest] = self.memory[dest].wrapping_add(product);
                }
                Instruction::Clear { offset } => {
                    let addr = self.address(*offset);
                    self.memory[addr] = 0;
                }
                Instruction::Output { offset } => {
                    self.output.push(self.memory[self.address(*offset)]);
                }
                Instruction::Input { offset } => {
                    let addr = self.address(*offset);
                    match self.input.next() {
                        Some(byte) => self.memory[addr] = *byte,
                        None => {
                            if let Some(fill) = self.eof_fill {
                                self.memory[addr] = fill;
                            }
                        }
                    }
                }
                Instruction::Loop(body) => {
                    while self.memory[self.pointer as usize] != 0 {
                        self.run_block(body)?;
                        self.tick()?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lower::lower;
    use crate::passes::optimize;
    use bfwasm_core::{PassConfig, PhaseTimings};
    use bfwasm_syntax::parse;

    const HELLO: &str = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";

    fn run(source: &str, config: &CompilerConfig, input: &[u8]) -> ExecutionResult {
        let program = optimize(
            lower(&parse(source).unwrap()),
            config,
            &mut PhaseTimings::default(),
        );
        Interpreter::new(config).run(&program, input).unwrap()
    }

    #[test]
    fn test_hello_world() {
        for passes in [PassConfig::none(), PassConfig::default()] {
            let config = CompilerConfig::default().with_passes(passes);
            assert_eq!(run(HELLO, &config, b"").output_text(), "Hello World!\n");
        }
    }

    #[test]
    fn test_cell_wraparound() {
        let config = CompilerConfig::default();
        let result = run("-", &config, b"");
        assert_eq!(result.memory[0], 255);
        let result = run("-+", &config, b"");
        assert_eq!(result.memory[0], 0);

        let program = Program::new(vec![Instruction::add(255), Instruction::add(1)]);
        let result = Interpreter::new(&config).run(&program, b"").unwrap();
        assert_eq!(result.memory[0], 0);
    }

    #[test]
    fn test_pointer_wraparound() {
        let config = CompilerConfig::default().with_memory_size(10);
        let result = run("<+", &config, b"");
        assert_eq!(result.pointer, 9);
        assert_eq!(result.memory[9], 1);

        let program = Program::new(vec![Instruction::MoveRight(25), Instruction::add(1).at(-7)]);
        let result = Interpreter::new(&config).run(&program, b"").unwrap();
        assert_eq!(result.pointer, 5);
        assert_eq!(result.memory[8], 1);
    }

    #[test]
    fn test_eof_policies() {
        let source = ",>,";
        let cases = [
            (EofBehavior::Unchanged, 0),
            (EofBehavior::Zero, 0),
            (EofBehavior::AllOnes, 255),
        ];
        for (eof, expected) in cases {
            let config = CompilerConfig::default().with_eof_behavior(eof);
            let result = run(source, &config, b"A");
            assert_eq!(result.memory[0], b'A');
            assert_eq!(result.memory[1], expected);
        }

        // Unchanged keeps whatever the cell held before the read.
        let config = CompilerConfig::default();
        assert_eq!(run("+++,", &config, b"").memory[0], 3);
        let config = config.with_eof_behavior(EofBehavior::Zero);
        assert_eq!(run("+++,", &config, b"").memory[0], 0);
    }

    #[test]
    fn test_multiplication_semantics() {
        let config = CompilerConfig::default();
        let program = Program::new(vec![
            Instruction::add(200),
            Instruction::mul(1, 3, 0),
            Instruction::mul(2, -1, 0),
            Instruction::clear(),
        ]);
        let result = Interpreter::new(&config).run(&program, b"").unwrap();
        assert_eq!(&result.memory[..3], &[0, (600 % 256) as u8, 56]);
    }

    #[test]
    fn test_step_limit() {
        let config = CompilerConfig::default();
        let program = lower(&parse("+[]").unwrap());
        let err = Interpreter::new(&config)
            .with_step_limit(1_000)
            .run(&program, b"")
            .unwrap_err();
        assert!(matches!(err, Error::ResourceExhausted(_)));
    }
}
