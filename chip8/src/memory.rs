use std::fmt::Display;

use crate::error::{Chip8Error, Result};
use crate::{MEM_SIZE, ROM_ADDR};

pub struct Memory {
    pub(crate) data: [u8; MEM_SIZE],
}

impl Memory {
    /// Create a zeroed instance of the Memory struct
    pub fn new() -> Self {
        Self {
            data: [0; MEM_SIZE],
        }
    }

    fn check(&self, addr: usize) -> Result<usize> {
        if addr < self.data.len() {
            Ok(addr)
        } else {
            Err(Chip8Error::AddressOutOfBounds { address: addr })
        }
    }

    pub fn get(&self, addr: usize) -> Result<u8> {
        Ok(self.data[self.check(addr)?])
    }

    pub fn set(&mut self, addr: usize, value: u8) -> Result<()> {
        let addr = self.check(addr)?;
        self.data[addr] = value;
        Ok(())
    }

    /// Read a big-endian word from `addr` and `addr + 1`
    pub fn get_short(&self, addr: usize) -> Result<u16> {
        let hi = self.get(addr)? as u16;
        let lo = self.get(addr + 1)? as u16;
        Ok(hi << 8 | lo)
    }

    /// Borrow `len` bytes starting at `addr`
    pub fn slice(&self, addr: usize, len: usize) -> Result<&[u8]> {
        let end = addr + len;
        if end > self.data.len() {
            return Err(Chip8Error::AddressOutOfBounds {
                address: end.saturating_sub(1).max(addr),
            });
        }
        Ok(&self.data[addr..end])
    }

    /// Write `data` into memory starting at `addr`
    pub fn write(&mut self, addr: usize, data: &[u8]) -> Result<()> {
        self.check(addr)?;
        if data.len() > self.data.len() - addr {
            return Err(Chip8Error::AddressOutOfBounds {
                address: addr + data.len() - 1,
            });
        }
        self.data[addr..addr + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Copy a program to the load address. The program must leave at least one byte free at the top of memory.
    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        if ROM_ADDR + program.len() >= self.data.len() {
            return Err(Chip8Error::ProgramTooLarge {
                size: program.len(),
                max_size: self.data.len() - ROM_ADDR - 1,
            });
        }
        self.write(ROM_ADDR, program)
    }
}

impl Display for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const BYTES_PER_LINE: usize = 16;
        for (line, chunk) in self.data.chunks(BYTES_PER_LINE).enumerate() {
            write!(f, "{:04X}: ", line * BYTES_PER_LINE)?;
            for byte in chunk {
                write!(f, "{:02X} ", byte)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
