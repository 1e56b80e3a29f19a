use std::{fmt, str::FromStr};

use crate::plat::{Fl, Opcode};

use super::{registers::Word, EmuError};

/// The operations the ALU can carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AluOp {
    /// `regA <- regA + regB`
    Add,
    /// `regA <- regA * regB`
    Mul,
    /// `FL.Equal <- regA == regB`
    Cmp,
}

impl FromStr for AluOp {
    type Err = EmuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADD" => Ok(Self::Add),
            "MUL" => Ok(Self::Mul),
            "CMP" => Ok(Self::Cmp),
            _ => Err(EmuError::UnsupportedAluOp(s.to_owned())),
        }
    }
}

impl TryFrom<Opcode> for AluOp {
    type Error = EmuError;

    fn try_from(op: Opcode) -> Result<Self, Self::Error> {
        op.mnemonic().parse()
    }
}

impl fmt::Display for AluOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => f.write_str("ADD"),
            Self::Mul => f.write_str("MUL"),
            Self::Cmp => f.write_str("CMP"),
        }
    }
}

/// What an ALU operation changes once applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluEffect {
    /// New value for the destination register (`regA`).
    Register(Word),
    /// New value for the flags register.
    Flags(Fl),
}

/// Applies `op` to the values of `regA` and `regB`.
///
/// Arithmetic wraps on overflow.
pub fn apply(op: AluOp, a: Word, b: Word) -> AluEffect {
    match op {
        AluOp::Add => AluEffect::Register(a.wrapping_add(b)),
        AluOp::Mul => AluEffect::Register(a.wrapping_mul(b)),
        AluOp::Cmp => {
            let mut fl = Fl::empty();
            fl.set(Fl::EQUAL, a == b);
            AluEffect::Flags(fl)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arith() {
        assert_eq!(apply(AluOp::Add, 2, 3), AluEffect::Register(5));
        assert_eq!(apply(AluOp::Mul, 6, 7), AluEffect::Register(42));
        assert_eq!(apply(AluOp::Mul, 7, 6), AluEffect::Register(42));
        assert_eq!(apply(AluOp::Add, Word::MAX, 1), AluEffect::Register(0));
    }

    #[test]
    fn test_cmp() {
        for (a, b) in [(0, 0), (1, 1), (255, 255), (1000, 1000)] {
            assert_eq!(apply(AluOp::Cmp, a, b), AluEffect::Flags(Fl::EQUAL));
        }
        for (a, b) in [(0, 1), (1, 0), (255, 254), (256, 0)] {
            assert_eq!(apply(AluOp::Cmp, a, b), AluEffect::Flags(Fl::empty()));
        }
        assert_eq!(Fl::EQUAL.bits(), 1);
    }

    #[test]
    fn test_parse_op() {
        assert_eq!("ADD".parse::<AluOp>(), Ok(AluOp::Add));
        assert_eq!("mul".parse::<AluOp>(), Ok(AluOp::Mul));
        assert_eq!("CMP".parse::<AluOp>(), Ok(AluOp::Cmp));
        assert_eq!(
            "DIV".parse::<AluOp>(),
            Err(EmuError::UnsupportedAluOp("DIV".to_owned()))
        );
    }

    #[test]
    fn test_from_opcode() {
        assert_eq!(AluOp::try_from(Opcode::Mul), Ok(AluOp::Mul));
        assert_eq!(AluOp::try_from(Opcode::Cmp), Ok(AluOp::Cmp));
        assert_eq!(
            AluOp::try_from(Opcode::Ldi),
            Err(EmuError::UnsupportedAluOp("LDI".to_owned()))
        );
    }
}
