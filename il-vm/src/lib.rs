//! An Instruction List interpreter for PLC-style bit and word memory.
//!
//! A program is a sequence of `(mnemonic, operand)` lines. Each mnemonic
//! is encoded once with [`Instruction::parse`] and then executed with
//! [`Interpreter::execute`], which returns the next line to execute.
//! [`scan::ScanDriver`] runs whole programs in fixed-period scans.

pub mod address;
pub mod cli;
pub mod error;
pub mod instruction;
mod interpreter;
pub mod logger;
pub mod memory;
pub mod program;
pub mod scan;
pub(crate) mod stack;

pub use address::Region;
pub use instruction::{Instruction, Opcode};
pub use interpreter::{apply, Interpreter, END_OF_PROGRAM};
pub use memory::{Memory, MemoryImage};
pub use program::{Line, Program};
pub use stack::{CALL_STACK_DEPTH, EVAL_STACK_DEPTH};
