//! The execution engine.
//!
//! Executes one encoded instruction at a time against an accumulator, an
//! evaluation stack for `{ ... }` groups, a call stack for CALL/RET, and
//! caller-supplied [`Memory`].

use log::{debug, trace, warn};

use crate::error::Trap;
use crate::instruction::{Instruction, Opcode};
use crate::memory::Memory;
use crate::stack::{CallStack, DeferredOp, EvalStack, CALL_STACK_DEPTH, EVAL_STACK_DEPTH};

/// Line returned by RET when there is no caller to return to.
///
/// The value is outside any program, so a driver treats it as the end of
/// the scan.
pub const END_OF_PROGRAM: u16 = 65535;

/// Applies a binary operator to `a` and `b`.
///
/// When `negate` is set, `b` is bitwise complemented first, for every
/// operator including the comparisons. Arithmetic wraps at 16 bits and
/// comparisons yield 1 or 0. Opcodes that are not binary operators yield 0.
pub fn apply(opcode: Opcode, a: u16, b: u16, negate: bool) -> Result<u16, Trap> {
    let b = if negate { !b } else { b };
    let result = match opcode {
        Opcode::And => a & b,
        Opcode::Or => a | b,
        Opcode::Xor => a ^ b,
        Opcode::Add => a.wrapping_add(b),
        Opcode::Sub => a.wrapping_sub(b),
        Opcode::Mul => a.wrapping_mul(b),
        Opcode::Div => a.checked_div(b).ok_or(Trap::DivideByZero)?,
        Opcode::Gt => (a > b) as u16,
        Opcode::Ge => (a >= b) as u16,
        Opcode::Eq => (a == b) as u16,
        Opcode::Ne => (a != b) as u16,
        Opcode::Le => (a <= b) as u16,
        Opcode::Lt => (a < b) as u16,
        _ => 0,
    };
    Ok(result)
}

/// Interpreter state for one program.
pub struct Interpreter<M: Memory> {
    memory: M,
    accumulator: u16,
    eval_stack: EvalStack,
    call_stack: CallStack,
    // Open groups whose `{` was rejected because the evaluation stack was
    // full. Instructions are skipped until all of them are closed.
    discarded_groups: usize,
}

impl<M: Memory> Interpreter<M> {
    /// Creates an interpreter bound to `memory` with a zero accumulator
    /// and empty stacks.
    pub fn new(memory: M) -> Self {
        Interpreter {
            memory,
            accumulator: 0,
            eval_stack: EvalStack::new(EVAL_STACK_DEPTH),
            call_stack: CallStack::new(CALL_STACK_DEPTH),
            discarded_groups: 0,
        }
    }

    /// Encodes a mnemonic token. See [`Instruction::parse`].
    pub fn parse(token: &str) -> Instruction {
        Instruction::parse(token)
    }

    /// Returns the accumulator.
    pub fn accumulator(&self) -> u16 {
        self.accumulator
    }

    /// Returns the number of open `{` groups.
    pub fn eval_depth(&self) -> usize {
        self.eval_stack.depth()
    }

    /// Returns the number of active CALLs.
    pub fn call_depth(&self) -> usize {
        self.call_stack.depth()
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    pub fn into_memory(self) -> M {
        self.memory
    }

    /// Ends skipping of groups discarded by an evaluation stack overflow.
    ///
    /// A discarded group that is still open when the scan ends would
    /// otherwise swallow every instruction of every later scan. Open
    /// groups on the evaluation stack are kept.
    pub fn end_scan(&mut self) {
        if self.discarded_groups > 0 {
            warn!(
                "{} discarded group(s) still open at end of scan, resuming execution",
                self.discarded_groups
            );
            self.discarded_groups = 0;
        }
    }

    /// Zeroes the accumulator and empties both stacks. Memory is untouched.
    pub fn reset(&mut self) {
        self.accumulator = 0;
        self.eval_stack.clear();
        self.call_stack.clear();
        self.discarded_groups = 0;
    }

    /// Executes one instruction at `line` and returns the next line.
    ///
    /// The next line is `line + 1` unless a JUMP, CALL or RET branches.
    /// RET with an empty call stack returns [`END_OF_PROGRAM`].
    pub fn execute(&mut self, instruction: Instruction, operand: u16, line: u16) -> u16 {
        let next = line.wrapping_add(1);
        let opcode = instruction.opcode();

        if self.discarded_groups > 0 {
            self.skip_discarded(instruction, operand, line);
            return next;
        }

        trace!(
            "{line}: {instruction} {operand} (accum {})",
            self.accumulator
        );

        match opcode {
            Opcode::Nop => next,
            Opcode::Set | Opcode::Rst => {
                if (self.accumulator != 0) ^ instruction.is_negated() {
                    let value = (opcode == Opcode::Set) as u16;
                    self.memory.set(operand, value, false);
                }
                next
            }
            Opcode::Jump if self.branch_taken(instruction) => operand,
            Opcode::Call if self.branch_taken(instruction) => self.call(operand, next),
            Opcode::Ret if self.branch_taken(instruction) => self.ret(line),
            Opcode::Jump | Opcode::Call | Opcode::Ret => next,
            Opcode::Load | Opcode::Stor if instruction.begins_group() => {
                self.open_group(instruction, operand);
                next
            }
            Opcode::Load => {
                self.accumulator = if instruction.is_immediate() {
                    operand
                } else {
                    self.memory.get(operand, instruction.is_negated())
                };
                next
            }
            Opcode::Stor => {
                self.memory
                    .set(operand, self.accumulator, instruction.is_negated());
                next
            }
            Opcode::And
            | Opcode::Or
            | Opcode::Xor
            | Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Gt
            | Opcode::Ge
            | Opcode::Eq
            | Opcode::Ne
            | Opcode::Le
            | Opcode::Lt => {
                let value = if instruction.is_immediate() {
                    operand
                } else {
                    self.memory.get(operand, false)
                };
                if instruction.begins_group() {
                    self.open_group(instruction, value);
                } else {
                    self.accumulator =
                        self.evaluate(opcode, self.accumulator, value, instruction.is_negated());
                }
                next
            }
            Opcode::CloseGroup => {
                self.close_group(line);
                next
            }
        }
    }

    /// A conditional branch is taken when the accumulator is nonzero, or
    /// zero when negated. Unconditional branches are always taken.
    fn branch_taken(&self, instruction: Instruction) -> bool {
        !instruction.is_conditional() || ((self.accumulator != 0) != instruction.is_negated())
    }

    fn call(&mut self, target: u16, return_line: u16) -> u16 {
        match self.call_stack.push(return_line) {
            Ok(()) => target,
            Err(trap) => {
                warn!(
                    "CALL {target} at line {}: call {trap} (depth {CALL_STACK_DEPTH}), continuing",
                    return_line.wrapping_sub(1)
                );
                return_line
            }
        }
    }

    fn ret(&mut self, line: u16) -> u16 {
        match self.call_stack.pop() {
            Ok(return_line) => return_line,
            Err(_) => {
                debug!("RET at line {line} with no caller, end of program");
                END_OF_PROGRAM
            }
        }
    }

    fn open_group(&mut self, instruction: Instruction, value: u16) {
        let deferred = DeferredOp {
            instruction,
            accumulator: self.accumulator,
        };
        match self.eval_stack.push(deferred) {
            Ok(()) => self.accumulator = value,
            Err(trap) => {
                warn!(
                    "{instruction}: evaluation {trap} (depth {EVAL_STACK_DEPTH}), group discarded"
                );
                self.discarded_groups += 1;
            }
        }
    }

    fn close_group(&mut self, line: u16) {
        let Ok(deferred) = self.eval_stack.pop() else {
            debug!("Unmatched }} at line {line} ignored");
            return;
        };
        let negate = deferred.instruction.is_negated();
        match deferred.instruction.opcode() {
            Opcode::Load => {
                self.accumulator = self.memory.get(self.accumulator, negate);
            }
            Opcode::Stor => {
                self.memory
                    .set(self.accumulator, deferred.accumulator, negate);
                self.accumulator = deferred.accumulator;
            }
            op => {
                self.accumulator = self.evaluate(op, deferred.accumulator, self.accumulator, negate);
            }
        }
    }

    fn skip_discarded(&mut self, instruction: Instruction, operand: u16, line: u16) {
        let opcode = instruction.opcode();
        if instruction.begins_group() && opcode.can_group() {
            self.discarded_groups += 1;
        } else if opcode == Opcode::CloseGroup {
            self.discarded_groups -= 1;
        }
        trace!("{line}: {instruction} {operand} skipped in discarded group");
    }

    fn evaluate(&self, opcode: Opcode, a: u16, b: u16, negate: bool) -> u16 {
        apply(opcode, a, b, negate).unwrap_or_else(|trap| {
            warn!("{} {a} {b}: {trap}, result is 0", opcode.mnemonic());
            0
        })
    }
}
