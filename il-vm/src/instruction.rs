//! Instruction encoding shared between the program loader and the interpreter.
//!
//! An encoded instruction is a 16-bit word. Bits 0-7 hold the opcode and
//! bits 12-15 hold independent flags. The two ranges never overlap.

use std::fmt;

/// Mask selecting the opcode byte of an encoded instruction.
pub const OPCODE_MASK: u16 = 0x00FF;

/// `I` - the operand is the value itself rather than an address.
pub const FLAG_IMMEDIATE: u16 = 0x1000;

/// `N` - invert the loaded or stored value, or invert a branch condition.
pub const FLAG_NEGATE: u16 = 0x2000;

/// `C` - branch only when the accumulator satisfies the condition.
pub const FLAG_CONDITIONAL: u16 = 0x4000;

/// `{` - defer the operation until the matching `}`.
pub const FLAG_BEGIN_GROUP: u16 = 0x8000;

/// Mask selecting all flag bits of an encoded instruction.
pub const FLAG_MASK: u16 = FLAG_IMMEDIATE | FLAG_NEGATE | FLAG_CONDITIONAL | FLAG_BEGIN_GROUP;

/// Instruction opcodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Nop = 0,
    Load = 1,
    Stor = 2,
    Set = 3,
    Rst = 4,
    And = 5,
    Or = 6,
    Xor = 7,
    Add = 8,
    Sub = 9,
    Mul = 10,
    Div = 11,
    Gt = 12,
    Ge = 13,
    Eq = 14,
    Ne = 15,
    Le = 16,
    Lt = 17,
    Jump = 18,
    Call = 19,
    Ret = 20,
    /// `}` - closes a group opened with the `{` flag.
    CloseGroup = 21,
}

/// Mnemonic prefixes in match order. The first prefix that matches wins.
const MNEMONICS: [(&str, Opcode); 21] = [
    ("LOAD", Opcode::Load),
    ("STOR", Opcode::Stor),
    ("SET", Opcode::Set),
    ("RST", Opcode::Rst),
    ("AND", Opcode::And),
    ("OR", Opcode::Or),
    ("XOR", Opcode::Xor),
    ("ADD", Opcode::Add),
    ("SUB", Opcode::Sub),
    ("MUL", Opcode::Mul),
    ("DIV", Opcode::Div),
    ("GT", Opcode::Gt),
    ("GE", Opcode::Ge),
    ("EQ", Opcode::Eq),
    ("NE", Opcode::Ne),
    ("LE", Opcode::Le),
    ("LT", Opcode::Lt),
    ("JUMP", Opcode::Jump),
    ("CALL", Opcode::Call),
    ("RET", Opcode::Ret),
    ("}", Opcode::CloseGroup),
];

/// Flag characters in the order they are rendered.
const FLAG_CHARS: [(char, u16); 4] = [
    ('C', FLAG_CONDITIONAL),
    ('N', FLAG_NEGATE),
    ('I', FLAG_IMMEDIATE),
    ('{', FLAG_BEGIN_GROUP),
];

impl Opcode {
    /// Converts an opcode byte. Returns `None` for undefined opcodes.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Opcode::Nop),
            _ => MNEMONICS
                .iter()
                .map(|(_, op)| *op)
                .find(|op| *op as u8 == v),
        }
    }

    /// Returns the mnemonic for this opcode.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Nop => "NOP",
            op => MNEMONICS
                .iter()
                .find(|(_, candidate)| candidate == op)
                .map(|(text, _)| *text)
                .unwrap_or("NOP"),
        }
    }

    /// Returns true for the operators that combine the accumulator with
    /// a second value.
    pub fn is_binary(&self) -> bool {
        matches!(
            self,
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
                | Opcode::Lt
        )
    }

    /// Returns true for the opcodes that honour the `{` flag.
    pub fn can_group(&self) -> bool {
        matches!(self, Opcode::Load | Opcode::Stor) || self.is_binary()
    }
}

/// An encoded instruction: opcode plus flags packed in 16 bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Instruction(u16);

impl Instruction {
    /// Creates an instruction from an opcode and flag bits. Bits outside
    /// [`FLAG_MASK`] are ignored.
    pub fn new(opcode: Opcode, flags: u16) -> Self {
        Instruction(opcode as u16 | (flags & FLAG_MASK))
    }

    /// Parses a mnemonic token such as `LOAD_N{` or `JUMP_CN`.
    ///
    /// The opcode is the first mnemonic that prefixes the token; a token
    /// matching none encodes as NOP. Each flag character is recognized
    /// anywhere after the first `_`, independently of the opcode.
    pub fn parse(token: &str) -> Self {
        let opcode = MNEMONICS
            .iter()
            .find(|(prefix, _)| token.starts_with(prefix))
            .map(|(_, op)| *op)
            .unwrap_or(Opcode::Nop);

        let flags = match token.find('_') {
            Some(pos) => {
                let suffix = &token[pos..];
                FLAG_CHARS
                    .iter()
                    .filter(|(ch, _)| suffix.contains(*ch))
                    .fold(0, |acc, (_, flag)| acc | flag)
            }
            None => 0,
        };

        Instruction::new(opcode, flags)
    }

    /// Wraps an already encoded word.
    pub fn from_bits(bits: u16) -> Self {
        Instruction(bits)
    }

    /// Returns the encoded word.
    pub fn bits(self) -> u16 {
        self.0
    }

    /// Returns the opcode. Undefined opcode bytes decode as NOP.
    pub fn opcode(self) -> Opcode {
        Opcode::from_u8((self.0 & OPCODE_MASK) as u8).unwrap_or(Opcode::Nop)
    }

    pub fn flags(self) -> u16 {
        self.0 & FLAG_MASK
    }

    pub fn is_immediate(self) -> bool {
        self.0 & FLAG_IMMEDIATE != 0
    }

    pub fn is_negated(self) -> bool {
        self.0 & FLAG_NEGATE != 0
    }

    pub fn is_conditional(self) -> bool {
        self.0 & FLAG_CONDITIONAL != 0
    }

    pub fn begins_group(self) -> bool {
        self.0 & FLAG_BEGIN_GROUP != 0
    }
}

impl From<Opcode> for Instruction {
    fn from(opcode: Opcode) -> Self {
        Instruction::new(opcode, 0)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode().mnemonic())?;
        if self.flags() != 0 {
            write!(f, "_")?;
            for (ch, flag) in FLAG_CHARS {
                if self.0 & flag != 0 {
                    write!(f, "{ch}")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_when_plain_mnemonic_then_opcode_without_flags() {
        let instr = Instruction::parse("LOAD");
        assert_eq!(instr.opcode(), Opcode::Load);
        assert_eq!(instr.flags(), 0);
        assert_eq!(instr.bits(), 1);
    }

    #[test]
    fn parse_when_or_then_or_not_xor() {
        assert_eq!(Instruction::parse("OR").opcode(), Opcode::Or);
        assert_eq!(Instruction::parse("XOR").opcode(), Opcode::Xor);
    }

    #[test]
    fn parse_when_rst_then_rst_not_ret() {
        assert_eq!(Instruction::parse("RST").opcode(), Opcode::Rst);
        assert_eq!(Instruction::parse("RET").opcode(), Opcode::Ret);
    }

    #[test]
    fn parse_when_comparisons_then_each_distinct() {
        assert_eq!(Instruction::parse("GT").opcode(), Opcode::Gt);
        assert_eq!(Instruction::parse("GE").opcode(), Opcode::Ge);
        assert_eq!(Instruction::parse("EQ").opcode(), Opcode::Eq);
        assert_eq!(Instruction::parse("NE").opcode(), Opcode::Ne);
        assert_eq!(Instruction::parse("LE").opcode(), Opcode::Le);
        assert_eq!(Instruction::parse("LT").opcode(), Opcode::Lt);
    }

    #[test]
    fn parse_when_close_brace_then_close_group() {
        let instr = Instruction::parse("}");
        assert_eq!(instr.opcode(), Opcode::CloseGroup);
        assert_eq!(instr.bits(), 21);
    }

    #[test]
    fn parse_when_immediate_suffix_then_immediate_flag() {
        let instr = Instruction::parse("ADD_I");
        assert_eq!(instr.opcode(), Opcode::Add);
        assert!(instr.is_immediate());
        assert!(!instr.is_negated());
        assert_eq!(instr.bits(), 0x1008);
    }

    #[test]
    fn parse_when_negated_group_then_both_flags() {
        let instr = Instruction::parse("LOAD_N{");
        assert_eq!(instr.opcode(), Opcode::Load);
        assert!(instr.is_negated());
        assert!(instr.begins_group());
        assert!(!instr.is_immediate());
        assert_eq!(instr.bits(), 0xA001);
    }

    #[test]
    fn parse_when_conditional_negated_jump_then_flags_set() {
        let instr = Instruction::parse("JUMP_CN");
        assert_eq!(instr.opcode(), Opcode::Jump);
        assert!(instr.is_conditional());
        assert!(instr.is_negated());
        assert_eq!(instr.bits(), 0x6012);
    }

    #[test]
    fn parse_when_flag_letters_before_separator_then_ignored() {
        // The N of AND and the C of CALL are not flags.
        assert_eq!(Instruction::parse("AND").flags(), 0);
        assert_eq!(Instruction::parse("CALL").flags(), 0);
    }

    #[test]
    fn parse_when_text_before_flags_then_flags_found_after_first_separator() {
        let instr = Instruction::parse("LOAD_X_N");
        assert_eq!(instr.opcode(), Opcode::Load);
        assert_eq!(instr.flags(), FLAG_NEGATE);

        let instr = Instruction::parse("JUMPX_C");
        assert_eq!(instr.opcode(), Opcode::Jump);
        assert_eq!(instr.flags(), FLAG_CONDITIONAL);

        // Flag letters before the first `_` do not count.
        assert_eq!(Instruction::parse("LOADIN_C").flags(), FLAG_CONDITIONAL);
    }

    #[test]
    fn parse_when_unknown_token_then_nop() {
        assert_eq!(Instruction::parse("FOO").opcode(), Opcode::Nop);
        assert_eq!(Instruction::parse("").bits(), 0);
        assert_eq!(Instruction::parse("load").opcode(), Opcode::Nop);
    }

    #[test]
    fn parse_when_unknown_token_with_flags_then_flags_kept() {
        let instr = Instruction::parse("FOO_I");
        assert_eq!(instr.opcode(), Opcode::Nop);
        assert!(instr.is_immediate());
    }

    #[test]
    fn opcode_when_undefined_byte_then_nop() {
        assert_eq!(Instruction::from_bits(0x00FF).opcode(), Opcode::Nop);
        assert_eq!(Instruction::from_bits(22).opcode(), Opcode::Nop);
    }

    #[test]
    fn opcode_from_u8_when_all_defined_then_roundtrips() {
        for v in 0..=21u8 {
            let op = Opcode::from_u8(v).unwrap();
            assert_eq!(op as u8, v);
        }
        assert_eq!(Opcode::from_u8(22), None);
    }

    #[test]
    fn display_when_flags_then_canonical_suffix() {
        assert_eq!(Instruction::parse("LOAD_N{").to_string(), "LOAD_N{");
        assert_eq!(Instruction::parse("JUMP_CN").to_string(), "JUMP_CN");
        assert_eq!(Instruction::parse("STOR").to_string(), "STOR");
        assert_eq!(Instruction::parse("}").to_string(), "}");
        assert_eq!(Instruction::default().to_string(), "NOP");
    }

    #[test]
    fn can_group_when_jump_then_false() {
        assert!(Opcode::Load.can_group());
        assert!(Opcode::Stor.can_group());
        assert!(Opcode::Lt.can_group());
        assert!(!Opcode::Jump.can_group());
        assert!(!Opcode::Set.can_group());
        assert!(!Opcode::CloseGroup.can_group());
    }

    proptest! {
        #[test]
        fn parse_is_idempotent(token in "[A-Z_{}ICN]{0,8}") {
            prop_assert_eq!(Instruction::parse(&token), Instruction::parse(&token));
        }

        #[test]
        fn parse_keeps_opcode_and_flags_disjoint(token in "\\PC{0,10}") {
            let instr = Instruction::parse(&token);
            prop_assert_eq!(instr.bits() & !(OPCODE_MASK | FLAG_MASK), 0);
            prop_assert!((instr.bits() & OPCODE_MASK) <= Opcode::CloseGroup as u16);
        }

        #[test]
        fn display_then_parse_roundtrips(op in 0u8..=21, flags in 0u16..16) {
            let opcode = Opcode::from_u8(op).unwrap();
            prop_assume!(opcode != Opcode::Nop);
            let instr = Instruction::new(opcode, flags << 12);
            prop_assert_eq!(Instruction::parse(&instr.to_string()), instr);
        }
    }
}
