//! Program storage and the program text format.
//!
//! Each physical line of program text is one program line:
//!
//! ```text
//! LOAD_I 5      # comment
//! ADD_I  3
//! STOR   40001  // also a comment
//! ```
//!
//! The operand is a decimal number and defaults to 0. Blank and
//! comment-only lines become empty program lines that do nothing.

use std::io::Read;

use log::debug;

use crate::error::ProgramError;
use crate::instruction::Instruction;

/// Number of lines in a standard program sheet.
pub const DEFAULT_PROGRAM_LINES: usize = 31;

/// Most lines a program can have. Line 65535 is reserved for
/// [`END_OF_PROGRAM`](crate::END_OF_PROGRAM).
pub const MAX_PROGRAM_LINES: usize = u16::MAX as usize;

/// A mnemonic and its operand.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Line {
    pub mnemonic: String,
    pub operand: u16,
}

impl Line {
    pub fn new(mnemonic: impl Into<String>, operand: u16) -> Self {
        Line {
            mnemonic: mnemonic.into(),
            operand,
        }
    }

    /// Returns true if the line has no mnemonic.
    pub fn is_empty(&self) -> bool {
        self.mnemonic.is_empty()
    }

    /// Encodes the mnemonic.
    pub fn instruction(&self) -> Instruction {
        Instruction::parse(&self.mnemonic)
    }
}

/// An ordered sequence of lines. Line numbers are 0-based positions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    lines: Vec<Line>,
}

impl Program {
    pub fn new(lines: Vec<Line>) -> Result<Self, ProgramError> {
        if lines.len() > MAX_PROGRAM_LINES {
            return Err(ProgramError::TooManyLines(lines.len()));
        }
        Ok(Program { lines })
    }

    /// Builds a program from `(mnemonic, operand)` pairs.
    pub fn from_pairs<S: Into<String>>(
        pairs: impl IntoIterator<Item = (S, u16)>,
    ) -> Result<Self, ProgramError> {
        Program::new(
            pairs
                .into_iter()
                .map(|(mnemonic, operand)| Line::new(mnemonic, operand))
                .collect(),
        )
    }

    /// Parses program text.
    pub fn parse(text: &str) -> Result<Self, ProgramError> {
        let lines = text
            .lines()
            .enumerate()
            .map(|(index, text)| parse_line(index + 1, text))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Parsed program with {} lines", lines.len());
        Program::new(lines)
    }

    /// Reads and parses program text.
    pub fn read_from(r: &mut impl Read) -> Result<Self, ProgramError> {
        let mut text = String::new();
        r.read_to_string(&mut text)?;
        Program::parse(&text)
    }

    /// Appends empty lines until the program has `len` lines.
    pub fn pad_to(&mut self, len: usize) {
        let len = len.min(MAX_PROGRAM_LINES);
        if self.lines.len() < len {
            self.lines.resize_with(len, Line::default);
        }
    }

    pub fn get(&self, line: u16) -> Option<&Line> {
        self.lines.get(line as usize)
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn strip_comment(text: &str) -> &str {
    let end = [text.find('#'), text.find("//")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(text.len());
    &text[..end]
}

fn parse_line(number: usize, text: &str) -> Result<Line, ProgramError> {
    let mut tokens = strip_comment(text).split_whitespace();
    let Some(mnemonic) = tokens.next() else {
        return Ok(Line::default());
    };
    let operand = match tokens.next() {
        Some(token) => token
            .parse::<u16>()
            .map_err(|_| ProgramError::InvalidOperand {
                line: number,
                text: token.to_string(),
            })?,
        None => 0,
    };
    if let Some(extra) = tokens.next() {
        return Err(ProgramError::UnexpectedToken {
            line: number,
            text: extra.to_string(),
        });
    }
    Ok(Line::new(mnemonic, operand))
}
