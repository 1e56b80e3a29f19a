use std::io::Write;

use anyhow::Result;

use crate::plat::{Fl, Instruction, Opcode};

use super::{
    alu::{self, AluEffect, AluOp},
    registers::{Registers, Word},
    EResult,
};

/// When a jump handler replaces PC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JumpCondition {
    Always,
    /// `FL.Equal == 1`
    Equal,
    /// `FL.Equal == 0`
    NotEqual,
}

impl JumpCondition {
    pub fn holds(self, fl: Fl) -> bool {
        match self {
            Self::Always => true,
            Self::Equal => fl.contains(Fl::EQUAL),
            Self::NotEqual => !fl.contains(Fl::EQUAL),
        }
    }
}

/// The logic run for an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handler {
    Halt,
    LoadImmediate,
    PrintRegister,
    Alu(AluOp),
    Jump(JumpCondition),
}

/// What the emulator should do once a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Halt,
}

impl Handler {
    /// Looks up the handler for `op`.
    ///
    /// # Errors
    ///
    /// This function will return an error if `op` is routed to the ALU but the ALU doesn't support it.
    pub fn for_opcode(op: Opcode) -> EResult<Self> {
        let handler = match op {
            Opcode::Hlt => Self::Halt,
            Opcode::Ldi => Self::LoadImmediate,
            Opcode::Prn => Self::PrintRegister,
            Opcode::Mul | Opcode::Cmp => Self::Alu(AluOp::try_from(op)?),
            Opcode::Jmp => Self::Jump(JumpCondition::Always),
            Opcode::Jeq => Self::Jump(JumpCondition::Equal),
            Opcode::Jne => Self::Jump(JumpCondition::NotEqual),
        };
        Ok(handler)
    }

    /// Executes `instr`, updating registers and PC. `PRN` output goes to `out`.
    ///
    /// PC is left untouched on [`Flow::Halt`].
    ///
    /// # Errors
    ///
    /// This function will return an error if an operand names a register that doesn't exist,
    /// or if writing to `out` fails.
    pub fn run<W: Write>(
        self,
        instr: Instruction,
        regs: &mut Registers,
        out: &mut W,
    ) -> Result<Flow> {
        let [a, b] = instr.operands;
        match self {
            Self::Halt => return Ok(Flow::Halt),
            Self::LoadImmediate => regs.write(a, b as Word)?,
            Self::PrintRegister => writeln!(out, "{}", regs.read(a)?)?,
            Self::Alu(op) => {
                let (left, right) = (regs.read(a)?, regs.read(b)?);
                match alu::apply(op, left, right) {
                    AluEffect::Register(value) => regs.write(a, value)?,
                    AluEffect::Flags(fl) => {
                        log::trace!("FL <- {:?}", fl);
                        regs.fl = fl;
                    }
                }
            }
            Self::Jump(cond) => {
                if cond.holds(regs.fl) {
                    let target = regs.read(a)? as usize;
                    log::trace!("jump {:02X} -> {:02X}", regs.pc, target);
                    regs.pc = target;
                    return Ok(Flow::Continue);
                }
            }
        }
        regs.pc += instr.width();
        Ok(Flow::Continue)
    }
}
