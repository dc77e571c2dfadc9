//! Compiler from IR to WebAssembly.
//!
//! Module layout:
//! - imports `imports.output: (i32) -> ()` and `imports.input: () -> i32`
//!   (a negative result means end of input)
//! - one linear memory, exported as `memory`, sized to hold the tape
//! - one mutable `i32` global holding the pointer
//! - `execute: () -> i32`, which runs the program and returns the pointer

use crate::instruction::Instruction as IR;
use crate::program::Program;
use crate::validation::validate_module;
use bfwasm_core::{CompilerConfig, Result};
use wasm_encoder::*;

pub const IMPORT_MODULE: &str = "imports";
pub const OUTPUT_IMPORT: &str = "output";
pub const INPUT_IMPORT: &str = "input";
pub const MEMORY_EXPORT: &str = "memory";
pub const ENTRY_EXPORT: &str = "execute";

pub const WASM_PAGE_SIZE: u64 = 65_536;

// Type indices
const OUTPUT_TYPE: u32 = 0;
const NULLARY_I32_TYPE: u32 = 1;

// Function indices; imports come first
const OUTPUT_FUNC: u32 = 0;
const INPUT_FUNC: u32 = 1;
const ENTRY_FUNC: u32 = 2;

const POINTER_GLOBAL: u32 = 0;

// Scratch locals of the entry function
const ADDRESS_LOCAL: u32 = 0;
const INPUT_LOCAL: u32 = 1;

const BYTE: MemArg = MemArg {
    offset: 0,
    align: 0,
    memory_index: 0,
};

/// Counters gathered while emitting one module
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodegenStats {
    pub instructions: usize,
    pub loops: u32,
    pub max_loop_depth: u32,
}

pub struct Compiler {
    config: CompilerConfig,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    /// Emit a module and check it with the backend validator.
    ///
    /// A validation failure is reported as `Error::Internal`: it can only
    /// mean the code generator is wrong.
    pub fn compile(&self, program: &Program) -> Result<Vec<u8>> {
        let (bytes, _) = self.emit(program)?;
        validate_module(&bytes)?;
        Ok(bytes)
    }

    /// Emit module bytes without validating them.
    pub fn emit(&self, program: &Program) -> Result<(Vec<u8>, CodegenStats)> {
        self.config.validate()?;

        let mut module = Module::new();

        // Type section: define function signatures
        let mut types = TypeSection::new();
        // output: (i32) -> ()
        types.ty().function([ValType::I32], []);
        // input and execute: () -> i32
        types.ty().function([], [ValType::I32]);
        module.section(&types);

        // Import section: host I/O
        let mut imports = ImportSection::new();
        imports.import(IMPORT_MODULE, OUTPUT_IMPORT, EntityType::Function(OUTPUT_TYPE));
        imports.import(IMPORT_MODULE, INPUT_IMPORT, EntityType::Function(NULLARY_I32_TYPE));
        module.section(&imports);

        let mut functions = FunctionSection::new();
        functions.function(NULLARY_I32_TYPE);
        module.section(&functions);

        // Memory section
        let pages = self.memory_pages();
        let mut memories = MemorySection::new();
        memories.memory(MemoryType {
            minimum: pages,
            maximum: Some(pages),
            memory64: false,
            shared: false,
            page_size_log2: None,
        });
        module.section(&memories);

        let mut globals = GlobalSection::new();
        globals.global(
            GlobalType {
                val_type: ValType::I32,
                mutable: true,
                shared: false,
            },
            &ConstExpr::i32_const(0),
        );
        module.section(&globals);

        let mut exports = ExportSection::new();
        exports.export(ENTRY_EXPORT, ExportKind::Func, ENTRY_FUNC);
        exports.export(MEMORY_EXPORT, ExportKind::Memory, 0);
        module.section(&exports);

        // Code section: the single entry function
        let mut emitter = Emitter::new(&self.config);
        emitter.emit_block(&program.instructions);
        let (body, stats) = emitter.finish();

        let mut code = CodeSection::new();
        code.function(&body);
        module.section(&code);

        let bytes = module.finish();
        tracing::debug!(
            bytes = bytes.len(),
            pages,
            loops = stats.loops,
            max_loop_depth = stats.max_loop_depth,
            "emitted module"
        );
        Ok((bytes, stats))
    }

    /// Pages needed to hold the tape, rounded up
    pub fn memory_pages(&self) -> u64 {
        u64::from(self.config.memory_size).div_ceil(WASM_PAGE_SIZE)
    }
}

/// Per-compilation emission state.
///
/// The loop counter lives here rather than in any global, so two
/// compilations never share numbering.
struct Emitter<'a> {
    config: &'a CompilerConfig,
    func: Function,
    next_loop_id: u32,
    depth: u32,
    stats: CodegenStats,
}

impl<'a> Emitter<'a> {
    fn new(config: &'a CompilerConfig) -> Self {
        Self {
            config,
            func: Function::new(vec![(2, ValType::I32)]),
            next_loop_id: 0,
            depth: 0,
            stats: CodegenStats::default(),
        }
    }

    fn finish(mut self) -> (Function, CodegenStats) {
        self.func.instruction(&Instruction::GlobalGet(POINTER_GLOBAL));
        self.func.instruction(&Instruction::End);
        (self.func, self.stats)
    }

    fn size(&self) -> u32 {
        self.config.memory_size
    }

    /// `i32.const` of an unsigned value; the bit pattern is what matters.
    fn const_u32(&mut self, value: u32) {
        self.func.instruction(&Instruction::I32Const(value as i32));
    }

    /// Push `(pointer + delta) rem_u size`, with `delta < size`.
    fn push_wrapped_pointer(&mut self, delta: u32) {
        self.func.instruction(&Instruction::GlobalGet(POINTER_GLOBAL));
        if delta != 0 {
            self.const_u32(delta);
            self.func.instruction(&Instruction::I32Add);
            self.const_u32(self.size());
            self.func.instruction(&Instruction::I32RemU);
        }
    }

    /// Push the address of `pointer + offset`.
    fn push_address(&mut self, offset: i32) {
        let delta = i64::from(offset).rem_euclid(i64::from(self.size())) as u32;
        self.push_wrapped_pointer(delta);
    }

    fn load_cell(&mut self, offset: i32) {
        self.push_address(offset);
        self.func.instruction(&Instruction::I32Load8U(BYTE));
    }

    fn move_pointer(&mut self, delta: u32) {
        if delta == 0 {
            return;
        }
        self.push_wrapped_pointer(delta);
        self.func.instruction(&Instruction::GlobalSet(POINTER_GLOBAL));
    }

    /// Read-modify-write of one cell; `op` combines the old value with
    /// `operand`.
    fn update_cell(&mut self, offset: i32, operand: i32, op: Instruction<'static>) {
        self.push_address(offset);
        self.func.instruction(&Instruction::LocalTee(ADDRESS_LOCAL));
        self.func.instruction(&Instruction::LocalGet(ADDRESS_LOCAL));
        self.func.instruction(&Instruction::I32Load8U(BYTE));
        self.func.instruction(&Instruction::I32Const(operand));
        self.func.instruction(&op);
        self.func.instruction(&Instruction::I32Store8(BYTE));
    }

    fn store_const(&mut self, offset: i32, value: u8) {
        self.push_address(offset);
        self.func.instruction(&Instruction::I32Const(i32::from(value)));
        self.func.instruction(&Instruction::I32Store8(BYTE));
    }

    fn emit_block(&mut self, block: &[IR]) {
        for inst in block {
            self.emit(inst);
        }
    }

    fn emit(&mut self, inst: &IR) {
        self.stats.instructions += 1;
        let size = self.size();

        match inst {
            IR::MoveRight(count) => self.move_pointer(count % size),
            IR::MoveLeft(count) => self.move_pointer((size - count % size) % size),
            IR::Add { amount, offset } => {
                self.update_cell(*offset, (amount % 256) as i32, Instruction::I32Add)
            }
            IR::Sub { amount, offset } => {
                self.update_cell(*offset, (amount % 256) as i32, Instruction::I32Sub)
            }
            IR::Mul {
                dest_offset,
                factor,
                src_offset,
            } => {
                // [dest_addr, dest_val]
                self.push_address(*dest_offset);
                self.func.instruction(&Instruction::LocalTee(ADDRESS_LOCAL));
                self.func.instruction(&Instruction::LocalGet(ADDRESS_LOCAL));
                self.func.instruction(&Instruction::I32Load8U(BYTE));
                // src_val * factor
                self.load_cell(*src_offset);
                self.func.instruction(&Instruction::I32Const(*factor));
                self.func.instruction(&Instruction::I32Mul);
                self.func.instruction(&Instruction::I32Add);
                self.func.instruction(&Instruction::I32Store8(BYTE));
            }
            IR::Clear { offset } => self.store_const(*offset, 0),
            IR::Output { offset } => {
                self.load_cell(*offset);
                self.func.instruction(&Instruction::Call(OUTPUT_FUNC));
            }
            IR::Input { offset } => self.emit_input(*offset),
            IR::Loop(body) => self.emit_loop(body),
        }
    }

    fn emit_input(&mut self, offset: i32) {
        self.func.instruction(&Instruction::Call(INPUT_FUNC));
        self.func.instruction(&Instruction::LocalSet(INPUT_LOCAL));

        // A non-negative result is a byte; anything else is end of input.
        self.func.instruction(&Instruction::LocalGet(INPUT_LOCAL));
        self.func.instruction(&Instruction::I32Const(0));
        self.func.instruction(&Instruction::I32GeS);
        self.func.instruction(&Instruction::If(BlockType::Empty));
        self.push_address(offset);
        self.func.instruction(&Instruction::LocalGet(INPUT_LOCAL));
        self.func.instruction(&Instruction::I32Store8(BYTE));
        if let Some(fill) = self.config.eof_behavior.fill_byte() {
            self.func.instruction(&Instruction::Else);
            self.store_const(offset, fill);
        }
        self.func.instruction(&Instruction::End);
    }

    /// Pre-test loop: a `loop` wrapping a breakable `block`.
    ///
    /// ```text
    /// loop            ;; continue target
    ///   block         ;; break target
    ///     br_if 0 (cell[pointer] == 0)
    ///     <body>
    ///     br 1
    ///   end
    /// end
    /// ```
    fn emit_loop(&mut self, body: &[IR]) {
        let loop_id = self.next_loop_id;
        self.next_loop_id += 1;
        self.depth += 1;
        self.stats.loops += 1;
        self.stats.max_loop_depth = self.stats.max_loop_depth.max(self.depth);
        tracing::trace!(loop_id, depth = self.depth, body = body.len(), "emitting loop");

        self.func.instruction(&Instruction::Loop(BlockType::Empty));
        self.func.instruction(&Instruction::Block(BlockType::Empty));

        self.load_cell(0);
        self.func.instruction(&Instruction::I32Eqz);
        self.func.instruction(&Instruction::BrIf(0));

        self.emit_block(body);

        self.func.instruction(&Instruction::Br(1));
        self.func.instruction(&Instruction::End);
        self.func.instruction(&Instruction::End);

        self.depth -= 1;
    }
}
