use crate::plat::MEMORY_SIZE;

use super::{EResult, EmuError};

/// The LS-8's main memory: a flat array of [MEMORY_SIZE] bytes.
pub struct Ram {
    memory: Box<[u8]>,
}

impl Ram {
    /// Creates a new [`Ram`] instance, allocating and initializing its memory to [0u8; 256].
    pub fn new() -> Self {
        Self {
            memory: vec![0u8; MEMORY_SIZE].into_boxed_slice(),
        }
    }

    /// Reads the byte at `address`.
    ///
    /// # Errors
    ///
    /// This function will return an error if `address` is outside of memory.
    pub fn read(&self, address: usize) -> EResult<u8> {
        self.get(address)
            .ok_or(EmuError::AddressOutOfRange { address })
    }

    /// Writes `value` to `address`.
    ///
    /// # Errors
    ///
    /// This function will return an error if `address` is outside of memory.
    pub fn write(&mut self, address: usize, value: u8) -> EResult<()> {
        let cell = self
            .memory
            .get_mut(address)
            .ok_or(EmuError::AddressOutOfRange { address })?;
        *cell = value;
        Ok(())
    }

    /// Reads the byte at `address`, if there is one.
    pub fn get(&self, address: usize) -> Option<u8> {
        self.memory.get(address).copied()
    }

    /// Copies `program` into memory, starting at address 0.
    ///
    /// # Errors
    ///
    /// This function will return an error if the program doesn't fit. Memory is left untouched in that case.
    pub fn load(&mut self, program: &[u8]) -> EResult<()> {
        if program.len() > MEMORY_SIZE {
            return Err(EmuError::AddressOutOfRange {
                address: program.len() - 1,
            });
        }
        for (address, byte) in program.iter().enumerate() {
            self.write(address, *byte)?;
        }
        Ok(())
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }
}

impl Default for Ram {
    fn default() -> Self {
        Self::new()
    }
}
