mod display;
mod error;
mod keypad;
mod memory;
mod registers;
mod stack;

use std::fmt::Display as FmtDisplay;

use log::{debug, trace};
use rand::Rng;

use crate::display::Display;
use crate::keypad::Keypad;
use crate::memory::Memory;
use crate::stack::Stack;

pub use crate::display::FrameBuffer;
pub use crate::error::{Chip8Error, Result};
pub use crate::keypad::{KeyMap, LABEL_MAP, SCANCODE_MAP};
pub use crate::registers::{Register, Registers};

pub const FONT_CHAR_LENGTH: usize = 5;

pub const FONT_DATA: [u8; FONT_CHAR_LENGTH * 0x10] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

pub const FONT_ADDR: usize = 0x000;

pub const MEM_SIZE: usize = 0x1000;
pub const ROM_ADDR: usize = 0x200;
pub const STACK_SIZE: usize = 0x10;
pub const REGISTER_COUNT: usize = 0x10;
pub const KEY_COUNT: usize = 0x10;

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;

struct Opcode {
    raw: u16,
    c: u8,
    x: Register,
    y: Register,
    n: u8,
    nn: u8,
    nnn: u16,
}

impl Opcode {
    fn decode(opcode: u16) -> Self {
        Opcode {
            raw: opcode,
            c: ((opcode & 0xF000) >> 12) as u8,
            x: Register(((opcode & 0x0F00) >> 8) as u8),
            y: Register(((opcode & 0x00F0) >> 4) as u8),
            n: (opcode & 0x000F) as u8,
            nn: (opcode & 0x00FF) as u8,
            nnn: opcode & 0x0FFF,
        }
    }
}

impl FmtDisplay for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04X}", self.raw)
    }
}

/// Behaviour switches for instructions that differ between interpreters.
/// With everything off the machine follows the original COSMAC VIP table.
#[derive(Debug, Clone, Copy, Default)]
struct Quirks {
    legacy_shift: bool,
    jump_add_offset: bool,
    memory_increment_i: bool,
}

struct Chip8Config {
    quirks: Quirks,
    ops_per_cycle: usize,
}

impl Chip8Config {
    pub fn new() -> Self {
        Self {
            quirks: Quirks::default(),
            ops_per_cycle: 11,
        }
    }
}

/// Whether the interpreter can make progress on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecState {
    Running,
    /// Suspended on FX0A until the next key press, which is stored in the register
    AwaitingKey(Register),
}

pub struct Chip8 {
    config: Chip8Config,
    /// RAM that stores font data, ROMs, and is fully writeable
    memory: Memory,
    /// A frame buffer containing binary pixel states
    display: Display,
    /// A hexadecimal keypad containing 16 key states labelled 0 through F
    keypad: Keypad,
    /// A stack for 16-bit addresses, which is used to call subroutines/functions and return from them
    stack: Stack,
    regs: Registers,
    state: ExecState,
}

fn font_memory() -> Result<Memory> {
    let mut memory = Memory::new();
    memory.write(FONT_ADDR, &FONT_DATA)?;
    Ok(memory)
}

impl Chip8 {
    pub fn new() -> Result<Self> {
        let mut regs = Registers::new();
        regs.pc = ROM_ADDR as u16;

        Ok(Chip8 {
            config: Chip8Config::new(),
            memory: font_memory()?,
            display: Display::new(),
            keypad: Keypad::new(),
            stack: Stack::new(),
            regs,
            state: ExecState::Running,
        })
    }

    /* Config builder functions */
    pub fn legacy_shift(mut self, value: bool) -> Self {
        self.config.quirks.legacy_shift = value;
        self
    }

    pub fn jump_add_offset(mut self, value: bool) -> Self {
        self.config.quirks.jump_add_offset = value;
        self
    }

    pub fn memory_increment_i(mut self, value: bool) -> Self {
        self.config.quirks.memory_increment_i = value;
        self
    }

    pub fn ops_per_cycle(mut self, value: usize) -> Self {
        self.config.ops_per_cycle = value;
        self
    }

    /// Zero memory, screen, stack, registers and key states and reinstall the font.
    /// Configuration and the key mapping are kept.
    pub fn reset(&mut self) -> Result<()> {
        self.memory = font_memory()?;
        self.display = Display::new();
        self.stack = Stack::new();
        self.regs = Registers::new();
        self.regs.pc = ROM_ADDR as u16;
        self.keypad.keys = [false; KEY_COUNT];
        self.state = ExecState::Running;
        Ok(())
    }

    pub fn load_rom(&mut self, rom: &[u8]) -> Result<()> {
        self.memory.load_program(rom)?;
        self.regs.pc = ROM_ADDR as u16;
        debug!("loaded {} byte program at {:#05x}", rom.len(), ROM_ADDR);
        Ok(())
    }

    /* Display */
    pub fn is_fb_dirty(&self) -> bool {
        self.display.dirty
    }

    pub fn fb(&mut self) -> FrameBuffer {
        self.display.fb()
    }

    /// Switch on a pixel without wrapping; coordinates off the screen are an error
    pub fn set_pixel(&mut self, x: usize, y: usize) -> Result<()> {
        self.display.set(x, y)
    }

    pub fn is_pixel_set(&self, x: usize, y: usize) -> bool {
        self.display.is_set(x, y)
    }

    /* Keypad */
    pub fn set_key_mapping(&mut self, map: KeyMap) {
        self.keypad.set_mapping(map);
    }

    pub fn map_symbol(&self, symbol: u32) -> Option<u8> {
        self.keypad.map_symbol(symbol)
    }

    /// Press a key. If the machine is waiting on FX0A, the key is stored and execution resumes.
    pub fn key_down(&mut self, key: usize) -> Result<()> {
        self.keypad.keydown(key)?;
        if let ExecState::AwaitingKey(x) = self.state {
            debug!("key {:#x} resumes wait into V{:X}", key, x.0);
            self.regs[x] = key as u8;
            self.state = ExecState::Running;
        }
        Ok(())
    }

    pub fn key_up(&mut self, key: usize) -> Result<()> {
        self.keypad.keyup(key)
    }

    pub fn is_key_down(&self, key: usize) -> Result<bool> {
        self.keypad.is_key_down(key)
    }

    /// Press the key bound to a host symbol; unmapped symbols are ignored
    pub fn key_down_symbol(&mut self, symbol: u32) -> Result<()> {
        match self.keypad.map_symbol(symbol) {
            Some(key) => self.key_down(key as usize),
            None => Ok(()),
        }
    }

    pub fn key_up_symbol(&mut self, symbol: u32) -> Result<()> {
        match self.keypad.map_symbol(symbol) {
            Some(key) => self.key_up(key as usize),
            None => Ok(()),
        }
    }

    /* Inspection */
    pub fn state(&self) -> ExecState {
        self.state
    }

    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    pub fn v(&self, x: u8) -> u8 {
        self.regs[Register(x)]
    }

    pub fn pc(&self) -> u16 {
        self.regs.pc
    }

    pub fn i(&self) -> u16 {
        self.regs.i
    }

    pub fn delay_timer(&self) -> u8 {
        self.regs.dt
    }

    pub fn sound_timer(&self) -> u8 {
        self.regs.st
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn read_memory(&self, addr: usize) -> Result<u8> {
        self.memory.get(addr)
    }

    pub fn is_sound_playing(&self) -> bool {
        self.regs.st > 0
    }

    /* Execution */

    /// Count both timers down by one. Returns true when the sound timer was running, meaning a beep for this tick.
    pub fn tick_timers(&mut self) -> bool {
        self.regs.dt = self.regs.dt.saturating_sub(1);
        if self.regs.st > 0 {
            self.regs.st -= 1;
            return true;
        }
        false
    }

    /// One 60 Hz frame: tick the timers, then run up to `ops_per_cycle` instructions.
    /// Returns the beep signal of the tick.
    pub fn cycle(&mut self) -> Result<bool> {
        let beep = self.tick_timers();
        for _ in 0..self.config.ops_per_cycle {
            if self.state != ExecState::Running {
                break;
            }
            self.step()?;
        }
        Ok(beep)
    }

    /// Execute a single instruction. Does nothing while awaiting a key.
    pub fn step(&mut self) -> Result<ExecState> {
        if self.state != ExecState::Running {
            return Ok(self.state);
        }
        let opcode = self.fetch()?;
        let opcode = Opcode::decode(opcode);
        self.execute(opcode)?;
        Ok(self.state)
    }

    fn fetch(&mut self) -> Result<u16> {
        let opcode = self.memory.get_short(self.regs.pc as usize)?;
        self.regs.pc = self.regs.pc.wrapping_add(2);
        Ok(opcode)
    }

    fn execute(&mut self, opcode: Opcode) -> Result<()> {
        match opcode.c {
            0x0 => match opcode.nnn {
                0x0E0 => self.op_cls(),
                0x0EE => self.op_sub_return()?,
                _ => self.skip_unknown_op(opcode),
            },
            0x1 => self.op_jump(opcode.nnn),
            0x2 => self.op_sub_call(opcode.nnn)?,
            0x3 => self.op_skip_eq(opcode.x, opcode.nn),
            0x4 => self.op_skip_ne(opcode.x, opcode.nn),
            0x5 if opcode.n == 0 => self.op_skip_reg_eq(opcode.x, opcode.y),
            0x6 => self.op_set(opcode.x, opcode.nn),
            0x7 => self.op_add(opcode.x, opcode.nn),
            0x8 => match opcode.n {
                0x0 => self.op_reg_set(opcode.x, opcode.y),
                0x1 => self.op_reg_or(opcode.x, opcode.y),
                0x2 => self.op_reg_and(opcode.x, opcode.y),
                0x3 => self.op_reg_xor(opcode.x, opcode.y),
                0x4 => self.op_reg_add(opcode.x, opcode.y),
                0x5 => self.op_reg_sub_right(opcode.x, opcode.y),
                0x6 => self.op_reg_shift_right(opcode.x, opcode.y),
                0x7 => self.op_reg_sub_left(opcode.x, opcode.y),
                0xE => self.op_reg_shift_left(opcode.x, opcode.y),
                _ => self.skip_unknown_op(opcode),
            },
            0x9 if opcode.n == 0 => self.op_skip_reg_ne(opcode.x, opcode.y),
            0xA => self.op_set_index(opcode.nnn),
            0xB => self.op_jump_with_offset(opcode.nnn, opcode.x),
            0xC => self.op_random(opcode.x, opcode.nn),
            0xD => self.op_display(opcode.x, opcode.y, opcode.n)?,
            0xE => match opcode.nn {
                0x9E => self.op_skip_if_key_down(opcode.x)?,
                0xA1 => self.op_skip_if_key_up(opcode.x)?,
                _ => self.skip_unknown_op(opcode),
            },
            0xF => match opcode.nn {
                0x07 => self.op_dt_get(opcode.x),
                0x0A => self.op_get_key(opcode.x),
                0x15 => self.op_dt_set(opcode.x),
                0x18 => self.op_st_set(opcode.x),
                0x1E => self.op_add_to_index(opcode.x),
                0x29 => self.op_font_character(opcode.x),
                0x33 => self.op_convert_to_decimal(opcode.x)?,
                0x55 => self.op_memory_store(opcode.x)?,
                0x65 => self.op_memory_load(opcode.x)?,
                _ => self.skip_unknown_op(opcode),
            },
            _ => self.skip_unknown_op(opcode),
        }
        Ok(())
    }

    fn skip_unknown_op(&self, opcode: Opcode) {
        debug!(
            "ignoring unknown opcode {} at {:#05x}",
            opcode,
            self.regs.pc.wrapping_sub(2)
        );
    }

    fn skip_next_if(&mut self, condition: bool) {
        if condition {
            self.regs.pc = self.regs.pc.wrapping_add(2);
        }
    }

    /* Operations */

    /// 0x00E0
    fn op_cls(&mut self) {
        trace!("op_cls(00E0)");
        self.display.clear();
    }

    /// 0x00EE
    fn op_sub_return(&mut self) -> Result<()> {
        trace!("op_sub_return(00EE)");
        self.regs.pc = self.stack.pop()?;
        Ok(())
    }

    /// 0x1NNN
    fn op_jump(&mut self, nnn: u16) {
        trace!("op_jump(1NNN) {:#05x}", nnn);
        self.regs.pc = nnn;
    }

    /// 0x2NNN
    fn op_sub_call(&mut self, nnn: u16) -> Result<()> {
        trace!("op_sub_call(2NNN) {:#05x}", nnn);
        self.stack.push(self.regs.pc)?;
        self.regs.pc = nnn;
        Ok(())
    }

    /// 0x3XNN
    fn op_skip_eq(&mut self, x: Register, nn: u8) {
        trace!("op_skip_eq(3XNN) V{:X} {:#04x}", x.0, nn);
        self.skip_next_if(self.regs[x] == nn);
    }

    /// 0x4XNN
    fn op_skip_ne(&mut self, x: Register, nn: u8) {
        trace!("op_skip_ne(4XNN) V{:X} {:#04x}", x.0, nn);
        self.skip_next_if(self.regs[x] != nn);
    }

    /// 0x5XY0
    fn op_skip_reg_eq(&mut self, x: Register, y: Register) {
        trace!("op_skip_reg_eq(5XY0) V{:X} V{:X}", x.0, y.0);
        self.skip_next_if(self.regs[x] == self.regs[y]);
    }

    /// 0x6XNN
    fn op_set(&mut self, x: Register, nn: u8) {
        trace!("op_set(6XNN) V{:X} {:#04x}", x.0, nn);
        self.regs[x] = nn;
    }

    /// 0x7XNN
    fn op_add(&mut self, x: Register, nn: u8) {
        trace!("op_add(7XNN) V{:X} {:#04x}", x.0, nn);
        self.regs[x] = self.regs[x].wrapping_add(nn);
    }

    /// 0x8XY0
    fn op_reg_set(&mut self, x: Register, y: Register) {
        trace!("op_reg_set(8XY0) V{:X} V{:X}", x.0, y.0);
        self.regs[x] = self.regs[y];
    }

    /// 0x8XY1
    fn op_reg_or(&mut self, x: Register, y: Register) {
        trace!("op_reg_or(8XY1) V{:X} V{:X}", x.0, y.0);
        self.regs[x] |= self.regs[y];
    }

    /// 0x8XY2
    fn op_reg_and(&mut self, x: Register, y: Register) {
        trace!("op_reg_and(8XY2) V{:X} V{:X}", x.0, y.0);
        self.regs[x] &= self.regs[y];
    }

    /// 0x8XY3
    fn op_reg_xor(&mut self, x: Register, y: Register) {
        trace!("op_reg_xor(8XY3) V{:X} V{:X}", x.0, y.0);
        self.regs[x] ^= self.regs[y];
    }

    /// 0x8XY4
    fn op_reg_add(&mut self, x: Register, y: Register) {
        trace!("op_reg_add(8XY4) V{:X} V{:X}", x.0, y.0);
        let (sum, carry) = self.regs[x].overflowing_add(self.regs[y]);
        self.regs[Register::VF] = carry as u8;
        self.regs[x] = sum;
    }

    /// 0x8XY5
    fn op_reg_sub_right(&mut self, x: Register, y: Register) {
        trace!("op_reg_sub_right(8XY5) V{:X} V{:X}", x.0, y.0);
        // the flag is written first and feeds the difference when x or y is F
        self.regs[Register::VF] = (self.regs[x] > self.regs[y]) as u8;
        self.regs[x] = self.regs[x].wrapping_sub(self.regs[y]);
    }

    /// 0x8XY6
    fn op_reg_shift_right(&mut self, x: Register, y: Register) {
        trace!("op_reg_shift_right(8XY6) V{:X} V{:X}", x.0, y.0);
        if self.config.quirks.legacy_shift {
            self.regs[x] = self.regs[y];
        }
        self.regs[Register::VF] = self.regs[x] & 0x1;
        self.regs[x] >>= 1;
    }

    /// 0x8XY7
    fn op_reg_sub_left(&mut self, x: Register, y: Register) {
        trace!("op_reg_sub_left(8XY7) V{:X} V{:X}", x.0, y.0);
        self.regs[Register::VF] = (self.regs[y] > self.regs[x]) as u8;
        self.regs[x] = self.regs[y].wrapping_sub(self.regs[x]);
    }

    /// 0x8XYE
    fn op_reg_shift_left(&mut self, x: Register, y: Register) {
        trace!("op_reg_shift_left(8XYE) V{:X} V{:X}", x.0, y.0);
        if self.config.quirks.legacy_shift {
            self.regs[x] = self.regs[y];
        }
        self.regs[Register::VF] = (self.regs[x] >> 7) & 0x1;
        self.regs[x] <<= 1;
    }

    /// 0x9XY0
    fn op_skip_reg_ne(&mut self, x: Register, y: Register) {
        trace!("op_skip_reg_ne(9XY0) V{:X} V{:X}", x.0, y.0);
        self.skip_next_if(self.regs[x] != self.regs[y]);
    }

    /// 0xANNN
    fn op_set_index(&mut self, nnn: u16) {
        trace!("op_set_index(ANNN) {:#05x}", nnn);
        self.regs.i = nnn;
    }

    /// 0xBNNN
    fn op_jump_with_offset(&mut self, nnn: u16, x: Register) {
        trace!("op_jump_with_offset(BNNN) {:#05x}", nnn);
        let offset = if self.config.quirks.jump_add_offset {
            x
        } else {
            Register::V0
        };
        self.regs.pc = nnn + self.regs[offset] as u16;
    }

    /// 0xCXNN
    fn op_random(&mut self, x: Register, nn: u8) {
        trace!("op_random(CXNN) V{:X} {:#04x}", x.0, nn);
        self.regs[x] = nn & rand::rng().random::<u8>();
    }

    /// 0xDXYN
    fn op_display(&mut self, x: Register, y: Register, n: u8) -> Result<()> {
        trace!("op_display(DXYN) V{:X} V{:X} {:#x}", x.0, y.0, n);
        let sprite = self.memory.slice(self.regs.i as usize, n as usize)?;
        let collided = self.display.draw_sprite(
            self.regs[x] as usize,
            self.regs[y] as usize,
            sprite,
            n as usize,
        );
        self.regs[Register::VF] = collided as u8;
        Ok(())
    }

    /// 0xEX9E
    fn op_skip_if_key_down(&mut self, x: Register) -> Result<()> {
        trace!("op_skip_if_key_down(EX9E) V{:X}", x.0);
        let down = self.keypad.is_key_down(self.regs[x] as usize)?;
        self.skip_next_if(down);
        Ok(())
    }

    /// 0xEXA1
    fn op_skip_if_key_up(&mut self, x: Register) -> Result<()> {
        trace!("op_skip_if_key_up(EXA1) V{:X}", x.0);
        let down = self.keypad.is_key_down(self.regs[x] as usize)?;
        self.skip_next_if(!down);
        Ok(())
    }

    /// 0xFX07
    fn op_dt_get(&mut self, x: Register) {
        trace!("op_dt_get(FX07) V{:X}", x.0);
        self.regs[x] = self.regs.dt;
    }

    /// 0xFX0A
    fn op_get_key(&mut self, x: Register) {
        trace!("op_get_key(FX0A) V{:X}", x.0);
        debug!("awaiting key press for V{:X}", x.0);
        self.state = ExecState::AwaitingKey(x);
    }

    /// 0xFX15
    fn op_dt_set(&mut self, x: Register) {
        trace!("op_dt_set(FX15) V{:X}", x.0);
        self.regs.dt = self.regs[x];
    }

    /// 0xFX18
    fn op_st_set(&mut self, x: Register) {
        trace!("op_st_set(FX18) V{:X}", x.0);
        self.regs.st = self.regs[x];
    }

    /// 0xFX1E
    fn op_add_to_index(&mut self, x: Register) {
        trace!("op_add_to_index(FX1E) V{:X}", x.0);
        self.regs.i = self.regs.i.wrapping_add(self.regs[x] as u16);
    }

    /// 0xFX29
    fn op_font_character(&mut self, x: Register) {
        trace!("op_font_character(FX29) V{:X}", x.0);
        self.regs.i = (FONT_ADDR + FONT_CHAR_LENGTH * self.regs[x] as usize) as u16;
    }

    /// 0xFX33
    fn op_convert_to_decimal(&mut self, x: Register) -> Result<()> {
        trace!("op_convert_to_decimal(FX33) V{:X}", x.0);
        let n = self.regs[x];
        let i = self.regs.i as usize;
        self.memory.set(i, n / 100)?;
        self.memory.set(i + 1, n / 10 % 10)?;
        self.memory.set(i + 2, n % 10)?;
        Ok(())
    }

    /// 0xFX55
    fn op_memory_store(&mut self, x: Register) -> Result<()> {
        trace!("op_memory_store(FX55) V{:X}", x.0);
        self.memory
            .write(self.regs.i as usize, self.regs.up_to(x))?;
        if self.config.quirks.memory_increment_i {
            self.regs.i += x.0 as u16 + 1;
        }
        Ok(())
    }

    /// 0xFX65
    fn op_memory_load(&mut self, x: Register) -> Result<()> {
        trace!("op_memory_load(FX65) V{:X}", x.0);
        let values = self.memory.slice(self.regs.i as usize, x.0 as usize + 1)?;
        self.regs.up_to_mut(x).copy_from_slice(values);
        if self.config.quirks.memory_increment_i {
            self.regs.i += x.0 as u16 + 1;
        }
        Ok(())
    }
}

impl FmtDisplay for Chip8 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "=== Memory ===\n{}", self.memory)?;
        write!(f, "=== Screen ===\n{}", self.display)
    }
}
