use std::fmt;
use std::io;

/// Runtime conditions raised while executing an instruction.
///
/// None of these halt the interpreter. The engine recovers from each one
/// locally and logs it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Trap {
    DivideByZero,
    StackOverflow,
    StackUnderflow,
}

impl fmt::Display for Trap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trap::DivideByZero => write!(f, "divide by zero"),
            Trap::StackOverflow => write!(f, "stack overflow"),
            Trap::StackUnderflow => write!(f, "stack underflow"),
        }
    }
}

impl std::error::Error for Trap {}

/// Errors produced while loading program text.
#[derive(Debug)]
pub enum ProgramError {
    /// An I/O error occurred while reading the program.
    Io(io::Error),
    /// The operand of a line is not a decimal number in `0..=65535`.
    InvalidOperand { line: usize, text: String },
    /// A line has more than a mnemonic and an operand.
    UnexpectedToken { line: usize, text: String },
    /// The program has more lines than a 16-bit line counter can address.
    TooManyLines(usize),
}

impl fmt::Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramError::Io(e) => write!(f, "I/O error: {e}"),
            ProgramError::InvalidOperand { line, text } => {
                write!(f, "line {line}: invalid operand '{text}'")
            }
            ProgramError::UnexpectedToken { line, text } => {
                write!(f, "line {line}: unexpected token '{text}'")
            }
            ProgramError::TooManyLines(n) => {
                write!(f, "program has {n} lines but at most 65535 are supported")
            }
        }
    }
}

impl std::error::Error for ProgramError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProgramError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ProgramError {
    fn from(e: io::Error) -> Self {
        ProgramError::Io(e)
    }
}
