//! Shared test helpers for interpreter integration tests.

use ironplc_il::{Interpreter, MemoryImage};

/// Upper bound on executed lines so that a looping program cannot hang a test.
const MAX_STEPS: usize = 10_000;

/// Executes `program` from line 0 until the line counter leaves the
/// program and returns the interpreter for inspection.
pub fn run_program(program: &[(&str, u16)]) -> Interpreter<MemoryImage> {
    let mut vm = Interpreter::new(MemoryImage::new());
    run_on(&mut vm, program);
    vm
}

/// Executes `program` from line 0 on an existing interpreter. Returns the
/// lines visited, in order.
pub fn run_on(vm: &mut Interpreter<MemoryImage>, program: &[(&str, u16)]) -> Vec<u16> {
    let mut visited = Vec::new();
    let mut line: u16 = 0;
    while (line as usize) < program.len() {
        assert!(visited.len() < MAX_STEPS, "program did not finish");
        visited.push(line);
        let (token, operand) = program[line as usize];
        line = vm.execute(Interpreter::<MemoryImage>::parse(token), operand, line);
    }
    visited
}
