/// Faults raised by the virtual machine. All of them are fatal for the running program.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Chip8Error {
    #[error("memory access out of bounds at address {address:#06x}")]
    AddressOutOfBounds { address: usize },

    #[error("pixel ({x}, {y}) is outside the screen")]
    PixelOutOfBounds { x: usize, y: usize },

    #[error("key index {key:#x} is outside the keypad")]
    KeyOutOfBounds { key: usize },

    #[error("call stack overflow")]
    StackOverflow,

    #[error("return with empty call stack")]
    StackUnderflow,

    #[error("program is too large ({size} bytes), max size is {max_size} bytes")]
    ProgramTooLarge { size: usize, max_size: usize },
}

pub type Result<T> = std::result::Result<T, Chip8Error>;
