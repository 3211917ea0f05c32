use std::ops::{Index, IndexMut};

use crate::REGISTER_COUNT;

/// One of the general-purpose registers V0 through VF
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register(pub u8);

impl Register {
    pub const V0: Register = Register(0x0);
    /// Carry, borrow and collision flag
    pub const VF: Register = Register(0xF);
}

pub struct Registers {
    /// 16 8-bit general-purpose variable registers numbered 0 through F hexadecimal
    v: [u8; REGISTER_COUNT],
    /// The index register is used to point at locations in memory
    pub(crate) i: u16,
    /// The program counter points to the current instruction in memory
    pub(crate) pc: u16,
    /// The delay timer is decremented at a rate of 60 Hz until it reaches 0
    pub(crate) dt: u8,
    /// The sound timer is decremented at a rate of 60 Hz until it reaches 0, and plays a tone as long as it's not 0
    pub(crate) st: u8,
}

impl Index<Register> for Registers {
    type Output = u8;

    fn index(&self, register: Register) -> &Self::Output {
        &self.v[register.0 as usize & 0xF]
    }
}

impl IndexMut<Register> for Registers {
    fn index_mut(&mut self, register: Register) -> &mut Self::Output {
        &mut self.v[register.0 as usize & 0xF]
    }
}

impl Registers {
    pub fn new() -> Self {
        Self {
            v: [0; REGISTER_COUNT],
            i: 0,
            pc: 0,
            dt: 0,
            st: 0,
        }
    }

    /// Registers V0 through Vx inclusive
    pub fn up_to(&self, x: Register) -> &[u8] {
        &self.v[..=x.0 as usize & 0xF]
    }

    pub fn up_to_mut(&mut self, x: Register) -> &mut [u8] {
        &mut self.v[..=x.0 as usize & 0xF]
    }
}
