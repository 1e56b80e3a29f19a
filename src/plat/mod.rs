//! Common platform code between the LS-8's other modules.

use std::fmt;

use thiserror::Error;

/// Number of addressable memory cells.
pub const MEMORY_SIZE: usize = 256;

/// Number of general purpose registers (`r0` - `r7`).
pub const NUM_REGISTERS: usize = 8;

/// An error for the core platform of the LS-8.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformError {
    #[error("invalid opcode {opcode:#010b} ({opcode:#04X})")]
    InvalidOpcode { opcode: u8 },
}

/// Type alias for Result<T, [PlatformError]>.
pub type PResult<T> = Result<T, PlatformError>;

bitflags::bitflags! {
    /// The CPU status flags register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Fl: u8 {
        /// Set if the two registers given to the last [CMP](Opcode::Cmp) held equal values.
        const EQUAL = 1 << 0;
    }
}

/// The opcodes understood by the LS-8.
///
/// Opcode bytes follow the layout `AABCDDDD`:
///
/// - `AA` is the number of operand bytes following the opcode.
/// - `B` is set for instructions that go through the ALU.
/// - `C` is set for instructions that set [PC](crate::emu::registers::Registers::pc) themselves.
/// - `DDDD` identifies the instruction.
///
/// The emulator never derives behaviour from these bits; widths are declared per opcode in [`Opcode::width`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /* Control */
    /// Stops the CPU.
    Hlt = 0b0000_0001,

    /* Registers */
    /// `regA <- (immediate value)`
    Ldi = 0b1000_0010,
    /// Prints the decimal value of `regA`.
    Prn = 0b0100_0111,

    /* ALU */
    /// `regA <- regA * regB`
    Mul = 0b1010_0010,
    /// `FL.Equal <- regA == regB`
    Cmp = 0b1010_0111,

    /* Branching */
    /// `PC <- regA`
    Jmp = 0b0101_0100,
    /// "Jump if Equal"
    /// ```text
    /// if FL.Equal == 1 {
    ///     PC <- regA
    /// }
    /// ```
    Jeq = 0b0101_0101,
    /// "Jump if Not Equal"
    /// ```text
    /// if FL.Equal == 0 {
    ///     PC <- regA
    /// }
    /// ```
    Jne = 0b0101_0110,
}

impl TryFrom<u8> for Opcode {
    type Error = PlatformError;

    fn try_from(value: u8) -> Result<Self, PlatformError> {
        match value {
            0b0000_0001 => Ok(Self::Hlt),
            0b1000_0010 => Ok(Self::Ldi),
            0b0100_0111 => Ok(Self::Prn),
            0b1010_0010 => Ok(Self::Mul),
            0b1010_0111 => Ok(Self::Cmp),
            0b0101_0100 => Ok(Self::Jmp),
            0b0101_0101 => Ok(Self::Jeq),
            0b0101_0110 => Ok(Self::Jne),
            opcode => Err(PlatformError::InvalidOpcode { opcode }),
        }
    }
}

impl Opcode {
    /// Every opcode in the instruction set.
    pub const ALL: [Opcode; 8] = [
        Self::Hlt,
        Self::Ldi,
        Self::Prn,
        Self::Mul,
        Self::Cmp,
        Self::Jmp,
        Self::Jeq,
        Self::Jne,
    ];

    /// Total size of the instruction in bytes, opcode included.
    pub fn width(self) -> usize {
        match self {
            Self::Hlt => 1,
            Self::Prn | Self::Jmp | Self::Jeq | Self::Jne => 2,
            Self::Ldi | Self::Mul | Self::Cmp => 3,
        }
    }

    /// Number of operand bytes following the opcode.
    pub fn operand_count(self) -> usize {
        self.width() - 1
    }

    /// Whether the instruction is carried out by the ALU.
    pub fn uses_alu(self) -> bool {
        matches!(self, Self::Mul | Self::Cmp)
    }

    /// Whether the instruction may overwrite PC instead of advancing it.
    pub fn sets_pc(self) -> bool {
        matches!(self, Self::Jmp | Self::Jeq | Self::Jne)
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Hlt => "HLT",
            Self::Ldi => "LDI",
            Self::Prn => "PRN",
            Self::Mul => "MUL",
            Self::Cmp => "CMP",
            Self::Jmp => "JMP",
            Self::Jeq => "JEQ",
            Self::Jne => "JNE",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A decoded instruction: its opcode and the two bytes that follow it in memory.
///
/// Both operand bytes are always present, even for instructions narrower than 3 bytes.
/// Bytes past [`Opcode::width`] are carried along but never used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub op: Opcode,
    pub operands: [u8; 2],
}

impl Instruction {
    /// Decodes the 3-byte fetch window `[opcode, operand_a, operand_b]`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the opcode byte is not part of the instruction set.
    pub fn from_bytes(bytes: [u8; 3]) -> PResult<Self> {
        let op = Opcode::try_from(bytes[0])?;
        Ok(Self {
            op,
            operands: [bytes[1], bytes[2]],
        })
    }

    /// Encodes the instruction, emitting only the bytes covered by its width.
    pub fn to_bytes(self) -> Vec<u8> {
        let mut out = vec![self.op as u8];
        out.extend_from_slice(&self.operands[..self.op.operand_count()]);
        out
    }

    pub fn width(self) -> usize {
        self.op.width()
    }

    pub fn operand_a(self) -> u8 {
        self.operands[0]
    }

    pub fn operand_b(self) -> u8 {
        self.operands[1]
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b] = self.operands;
        match self.op {
            Opcode::Hlt => write!(f, "{}", self.op),
            Opcode::Ldi => write!(f, "{} r{}, {}", self.op, a, b),
            Opcode::Prn | Opcode::Jmp | Opcode::Jeq | Opcode::Jne => {
                write!(f, "{} r{}", self.op, a)
            }
            Opcode::Mul | Opcode::Cmp => write!(f, "{} r{}, r{}", self.op, a, b),
        }
    }
}

/// Walks a program from address 0, decoding one instruction at a time.
///
/// Bytes that don't decode are reported as errors and skipped one at a time.
/// Operand bytes past the end of the program read as 0.
pub fn disassemble(program: &[u8]) -> Vec<(usize, PResult<Instruction>)> {
    let byte_at = |addr: usize| program.get(addr).copied().unwrap_or(0);
    let mut out = vec![];
    let mut addr = 0;
    while addr < program.len() {
        let instr = Instruction::from_bytes([program[addr], byte_at(addr + 1), byte_at(addr + 2)]);
        let step = match instr {
            Ok(instr) => instr.width(),
            Err(_) => 1,
        };
        out.push((addr, instr));
        addr += step;
    }
    out
}
