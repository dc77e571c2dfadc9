//! Compile-and-run tests against the wasmtime backend.

use bfwasm_core::{
    CompilerConfig, EofBehavior, Error, PassConfig, RuntimeConfig, SyntaxError, MAX_NESTING_DEPTH,
};
use bfwasm_ir::{compile_source, lower, Interpreter};
use bfwasm_runtime::{BrainfuckProgram, Runtime};
use proptest::prelude::*;

const HELLO: &str = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";

const COMPLEX_HELLO: &str = "
    >++++++++[-<+++++++++>]<.>>+>-[+]++>++>+++[>[->+++<<+++>]<<]>-----.>->
    +++..+++.>-.<<+[>[+>+]>>]<--------------.>>.+++.------.--------.>+.>+.
";

const EOF_PROBE: &str = ">,>+++++++++,>+++++++++++[<++++++<++++++<+>>>-]<<.>.<<-.>.>.<<.";

const MEMORY_PROBE: &str = "++++[>++++++<-]>[>+++++>+++++++<<-]>>++++<[[>[[>>+<<-]<]>>>-]>-[>+>+<<-]>]+++++[>+++++++<<++>-]>.<<.";

const OBSCURE: &str = "[]++++++++++[>>+>+>++++++[<<+<+++>>>-]<<<<-]\"A*$\";?@![#>>+<<]>[>>]<<<<[>++<[-]]>.>.";

const ROT13: &str = "
    ,
    [>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-
    [>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-
    [>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-
    [>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-
    [>++++++++++++++<-
    [>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-
    [>>+++++[<----->-]<<-
    [>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-
    [>++++++++++++++<-
    [>+<-[>+<-[>+<-[>+<-[>+<-
    [>++++++++++++++<-
    [>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-
    [>>+++++[<----->-]<<-
    [>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-[>+<-
    [>++++++++++++++<-
    [>+<-]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]
    ]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]]>.[-]<,]
";

fn run(source: &str, config: CompilerConfig, input: &[u8]) -> Vec<u8> {
    BrainfuckProgram::compile(source, config)
        .unwrap()
        .execute(input)
        .unwrap()
        .output
}

fn run_both_ways(source: &str, config: CompilerConfig, input: &[u8]) -> Vec<u8> {
    let optimized = run(source, config.clone(), input);
    let plain = run(source, config.with_passes(PassConfig::none()), input);
    assert_eq!(optimized, plain, "optimization changed output of {:?}", source);
    optimized
}

#[test]
fn test_hello_world() {
    let output = run_both_ways(HELLO, CompilerConfig::default(), b"");
    assert_eq!(output, b"Hello World!\n");
}

#[test]
fn test_complex_hello_world() {
    let output = run_both_ways(COMPLEX_HELLO, CompilerConfig::default(), b"");
    assert_eq!(output, b"Hello World!\n");
}

#[test]
fn test_eof_policies() {
    let cases = [
        (EofBehavior::Unchanged, "LK\nLK\n"),
        (EofBehavior::Zero, "LB\nLB\n"),
        (EofBehavior::AllOnes, "LA\nLA\n"),
    ];
    for (eof, expected) in cases {
        let config = CompilerConfig::default().with_eof_behavior(eof);
        let output = run_both_ways(EOF_PROBE, config, b"\n");
        assert_eq!(String::from_utf8(output).unwrap(), expected, "{:?}", eof);
    }
}

#[test]
fn test_sufficient_memory() {
    let output = run_both_ways(MEMORY_PROBE, CompilerConfig::default(), b"");
    assert_eq!(output, b"#\n");
}

#[test]
fn test_no_obscure_issues() {
    let output = run_both_ways(OBSCURE, CompilerConfig::default(), b"");
    assert_eq!(output, b"H\n");
}

#[test]
fn test_rot13() {
    let output = run_both_ways(ROT13, CompilerConfig::default(), b"~mlk zyx");
    assert_eq!(output, b"~zyx mlk");
}

#[test]
fn test_pointer_wraps_left_of_zero() {
    let config = CompilerConfig::default().with_memory_size(10);
    let result = BrainfuckProgram::compile("<+<<++", config)
        .unwrap()
        .execute(b"")
        .unwrap();
    assert_eq!(result.pointer, 7);
    assert_eq!(result.memory.len(), 10);
    assert_eq!(result.memory[9], 1);
    assert_eq!(result.memory[7], 2);
}

#[test]
fn test_pointer_wraps_right_of_end() {
    let config = CompilerConfig::default().with_memory_size(4);
    let result = BrainfuckProgram::compile(">>>>>+", config)
        .unwrap()
        .execute(b"")
        .unwrap();
    assert_eq!(result.pointer, 1);
    assert_eq!(result.memory, vec![0, 1, 0, 0]);
}

#[test]
fn test_narrow_tape_keeps_counter_aliasing() {
    // Offset 4 is the loop counter on a four-cell tape.
    let source = "++[->+>>>++<<<<]";
    for passes in [PassConfig::default(), PassConfig::none()] {
        let config = CompilerConfig::default()
            .with_memory_size(4)
            .with_passes(passes);
        let result = BrainfuckProgram::compile(source, config)
            .unwrap()
            .execute(b"")
            .unwrap();
        assert_eq!(result.memory, vec![0, 254, 0, 0], "{:?}", passes);
        assert_eq!(result.pointer, 0);
    }
}

#[test]
fn test_narrow_tapes_match_unoptimized() {
    let corpus = [
        "++[->+>>>++<<<<]",
        "+++[->>+<<]>>[-<+>>>+<<]",
        "+++++[-<<<+>>>>+<]",
        "-[->+<<<<<<<+>>>>>>]",
    ];
    for memory_size in 1..=8 {
        let config = CompilerConfig::default().with_memory_size(memory_size);
        for source in corpus {
            let artifact = compile_source(source, &config).unwrap();
            let Ok(expected) = Interpreter::new(&config)
                .with_step_limit(100_000)
                .run(&lower(&artifact.tree), b"")
            else {
                continue;
            };
            let actual = BrainfuckProgram::compile(source, config.clone())
                .unwrap()
                .execute(b"")
                .unwrap();
            assert_eq!(actual.memory, expected.memory, "{} on {} cells", source, memory_size);
            assert_eq!(actual.pointer, expected.pointer, "{} on {} cells", source, memory_size);
        }
    }
}

#[test]
fn test_cell_wraps() {
    let result = BrainfuckProgram::compile("->+[+]", CompilerConfig::default())
        .unwrap()
        .execute(b"")
        .unwrap();
    assert_eq!(result.memory[0], 255);
    assert_eq!(result.memory[1], 0);
    assert_eq!(result.current_cell(), 0);
}

#[test]
fn test_memory_snapshot_length() {
    let result = BrainfuckProgram::compile("+", CompilerConfig::default())
        .unwrap()
        .execute(b"")
        .unwrap();
    assert_eq!(result.memory.len(), 30_000);
    assert_eq!(result.memory[0], 1);
    assert!(result.memory[1..].iter().all(|&cell| cell == 0));
}

#[test]
fn test_unmatched_brackets_fail_to_compile() {
    let open = BrainfuckProgram::compile("+++++[>+++++++>++<<-]>.>.[", CompilerConfig::default());
    assert!(open.err().unwrap().is_syntax());

    let close = BrainfuckProgram::compile("+++++[>+++++++>++<<-]>.>.][", CompilerConfig::default());
    assert!(close.err().unwrap().is_syntax());
}

#[test]
fn test_deep_nesting() {
    let nested = |depth: usize| format!("+{}-{}", "[".repeat(depth), "]".repeat(depth));

    let result = BrainfuckProgram::compile(&nested(MAX_NESTING_DEPTH), CompilerConfig::default())
        .unwrap()
        .execute(b"")
        .unwrap();
    assert_eq!(result.memory[0], 0);

    for depth in [100_000, 200_000] {
        let err = BrainfuckProgram::compile(&nested(depth), CompilerConfig::default())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            Error::Syntax(SyntaxError::NestingTooDeep { .. })
        ));
    }
}

#[test]
fn test_fuel_exhaustion() {
    let runtime = Runtime::new(RuntimeConfig {
        max_fuel: Some(100_000),
        ..RuntimeConfig::default()
    })
    .unwrap();
    let program = runtime.compile("+[]", CompilerConfig::default()).unwrap();

    let err = program.execute(b"").err().unwrap();
    assert!(matches!(err, Error::ResourceExhausted(_)));
}

#[test]
fn test_fuel_is_enough_for_short_programs() {
    let runtime = Runtime::new(RuntimeConfig {
        max_fuel: Some(1_000_000),
        ..RuntimeConfig::default()
    })
    .unwrap();
    let program = runtime.compile(HELLO, CompilerConfig::default()).unwrap();
    assert_eq!(program.execute(b"").unwrap().output, b"Hello World!\n");
}

#[test]
fn test_module_reuse() {
    let runtime = Runtime::new(RuntimeConfig::default()).unwrap();
    let config = CompilerConfig::default().with_eof_behavior(EofBehavior::Zero);
    let artifact = compile_source(",[.,]", &config).unwrap();
    let module = runtime.load(&artifact.wasm, config.memory_size).unwrap();

    assert_eq!(module.execute(b"first").unwrap().output, b"first");
    assert_eq!(module.execute(b"second").unwrap().output, b"second");
    assert_eq!(module.execute(b"").unwrap().output, b"");
}

#[test]
fn test_matches_interpreter() {
    let config = CompilerConfig::default();
    for (source, input) in [
        (HELLO, &b""[..]),
        (COMPLEX_HELLO, b""),
        (MEMORY_PROBE, b""),
        (OBSCURE, b""),
        (ROT13, b"Hello, World"),
    ] {
        let artifact = compile_source(source, &config).unwrap();
        let expected = Interpreter::new(&config).run(&artifact.program, input).unwrap();
        let actual = BrainfuckProgram::compile(source, config.clone())
            .unwrap()
            .execute(input)
            .unwrap();
        assert_eq!(actual.output, expected.output);
        assert_eq!(actual.memory, expected.memory);
        assert_eq!(actual.pointer, expected.pointer);
    }
}

fn source() -> impl Strategy<Value = String> {
    let leaf = prop::collection::vec(
        prop::sample::select(vec!['+', '-', '<', '>', '.', ',']),
        0..12,
    )
    .prop_map(|chars| chars.into_iter().collect::<String>());
    leaf.prop_recursive(3, 48, 4, |inner| {
        prop::collection::vec(inner, 1..4).prop_map(|parts| {
            let (head, rest) = parts.split_at(1);
            format!("{}[{}]", head[0], rest.concat())
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn compiled_matches_interpreter(
        src in source(),
        input in prop::collection::vec(any::<u8>(), 0..8),
        memory_size in prop_oneof![1u32..=8, 9u32..=400],
    ) {
        let config = CompilerConfig::default().with_memory_size(memory_size);
        let artifact = compile_source(&src, &config).unwrap();
        // The reference runs the unoptimized program.
        let expected = Interpreter::new(&config)
            .with_step_limit(20_000)
            .run(&lower(&artifact.tree), &input);
        prop_assume!(expected.is_ok());
        let expected = expected.unwrap();

        let runtime = Runtime::new(RuntimeConfig::default()).unwrap();
        let module = runtime.load(&artifact.wasm, config.memory_size).unwrap();
        let actual = module.execute(&input).unwrap();
        prop_assert_eq!(actual.output, expected.output);
        prop_assert_eq!(actual.memory, expected.memory);
        prop_assert_eq!(actual.pointer, expected.pointer);
    }
}
