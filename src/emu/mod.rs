//! The emulator/debugger module for the LS-8.

use thiserror::Error;

use crate::plat::{MEMORY_SIZE, NUM_REGISTERS};

pub mod alu;
pub mod debugger;
pub mod dispatch;
pub mod emulator;
pub mod ram;
pub mod registers;

/// An error raised by the CPU while executing a program.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmuError {
    #[error("memory address {address:#04X} out of range (memory is {} bytes)", MEMORY_SIZE)]
    AddressOutOfRange { address: usize },
    #[error("invalid register r{index} (there are {} registers)", NUM_REGISTERS)]
    InvalidRegister { index: u8 },
    #[error("unsupported ALU operation: {0}")]
    UnsupportedAluOp(String),
}

/// Type alias for Result<T, [EmuError]>.
pub type EResult<T> = Result<T, EmuError>;
