use std::fmt::Display as FmtDisplay;

use crate::error::{Chip8Error, Result};
use crate::{SCREEN_HEIGHT, SCREEN_WIDTH};

pub type FrameBuffer = [[bool; SCREEN_WIDTH]; SCREEN_HEIGHT];

pub struct Display {
    /// Monochrome pixel grid indexed as `fb[y][x]`, where each cell is either on (true) or off (false)
    pub(crate) fb: FrameBuffer,
    pub(crate) dirty: bool,
}

impl Display {
    pub fn new() -> Self {
        Self {
            fb: [[false; SCREEN_WIDTH]; SCREEN_HEIGHT],
            dirty: false,
        }
    }

    pub fn fb(&mut self) -> FrameBuffer {
        self.dirty = false;
        self.fb
    }

    /// Clear the display contents by switching every pixel off
    /// This function marks the display as dirty, causing it to be re-rendered on the next update
    pub fn clear(&mut self) {
        self.dirty = true;
        for row in self.fb.iter_mut() {
            row.fill(false);
        }
    }

    /// Switch on the pixel at the coordinates, which must lie on the screen
    pub fn set(&mut self, x: usize, y: usize) -> Result<()> {
        if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
            return Err(Chip8Error::PixelOutOfBounds { x, y });
        }
        self.dirty = true;
        self.fb[y][x] = true;
        Ok(())
    }

    /// Coordinates wrap around both edges of the screen
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        self.fb[y % SCREEN_HEIGHT][x % SCREEN_WIDTH]
    }

    /// Toggle the pixel at the wrapped coordinates and return true if it was already on
    fn toggle(&mut self, x: usize, y: usize) -> bool {
        let pixel = &mut self.fb[y % SCREEN_HEIGHT][x % SCREEN_WIDTH];
        let prev = *pixel;
        *pixel = !prev;
        prev
    }

    /// XOR the first `rows` bytes of `sprite` onto the screen with the top-left corner at (x, y).
    /// Returns true if any lit pixel was switched off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, sprite: &[u8], rows: usize) -> bool {
        self.dirty = true;
        let mut collided = false;
        for (row, byte) in sprite.iter().take(rows).enumerate() {
            for col in 0..8 {
                if (byte >> (7 - col)) & 0x1 == 0 {
                    continue;
                }
                if self.toggle(x + col, y + row) {
                    collided = true;
                }
            }
        }
        collided
    }
}

impl FmtDisplay for Display {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.fb.iter() {
            for &pixel in row.iter() {
                write!(f, "{}", pixel as u8)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
