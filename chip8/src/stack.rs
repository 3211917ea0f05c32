use crate::error::{Chip8Error, Result};
use crate::STACK_SIZE;

/// Return address stack. Slot 0 is the empty sentinel, so `STACK_SIZE - 1` calls can be nested.
pub struct Stack {
    slots: [u16; STACK_SIZE],
    /// Index of the most recently pushed slot, 0 when empty
    pub(crate) sp: u8,
}

impl Stack {
    pub fn new() -> Self {
        Self {
            slots: [0; STACK_SIZE],
            sp: 0,
        }
    }

    pub fn push(&mut self, value: u16) -> Result<()> {
        let sp = self.sp as usize + 1;
        if sp >= STACK_SIZE {
            return Err(Chip8Error::StackOverflow);
        }
        self.sp = sp as u8;
        self.slots[sp] = value;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16> {
        if self.sp == 0 {
            return Err(Chip8Error::StackUnderflow);
        }
        let value = self.slots[self.sp as usize];
        self.sp -= 1;
        Ok(value)
    }

    pub fn depth(&self) -> usize {
        self.sp as usize
    }
}
