use crate::plat::{Fl, NUM_REGISTERS};

use super::{EResult, EmuError};

/// The value held by a general purpose register.
///
/// Wider than a memory cell; results of arithmetic are not truncated to a byte.
pub type Word = u32;

/// The full set of registers in the emulator.
///
/// `r0` - `r7` are only reachable through [`read`](Registers::read) and [`write`](Registers::write),
/// which check the register index. `pc` and `fl` are driven by the emulator directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    gp: [Word; NUM_REGISTERS],
    /// Program counter: address of the next instruction to fetch.
    pub pc: usize,
    /// Status flags.
    pub fl: Fl,
}

impl Registers {
    pub fn new() -> Self {
        Self {
            gp: [0; NUM_REGISTERS],
            pc: 0,
            fl: Fl::empty(),
        }
    }

    /// Reads general purpose register `index`.
    ///
    /// # Errors
    ///
    /// This function will return an error if `index` doesn't name one of `r0` - `r7`.
    pub fn read(&self, index: u8) -> EResult<Word> {
        self.gp
            .get(index as usize)
            .copied()
            .ok_or(EmuError::InvalidRegister { index })
    }

    /// Writes `value` to general purpose register `index`.
    ///
    /// # Errors
    ///
    /// This function will return an error if `index` doesn't name one of `r0` - `r7`.
    pub fn write(&mut self, index: u8, value: Word) -> EResult<()> {
        let reg = self
            .gp
            .get_mut(index as usize)
            .ok_or(EmuError::InvalidRegister { index })?;
        *reg = value;
        Ok(())
    }

    /// All general purpose registers, `r0` first.
    pub fn gp(&self) -> &[Word] {
        &self.gp
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
