extern crate chip8;
use chip8::{Chip8, Chip8Error, ExecState, Register, SCREEN_HEIGHT, SCREEN_WIDTH};

fn load(rom: &[u8]) -> Chip8 {
    let mut chip8 = Chip8::new().unwrap();
    chip8.load_rom(rom).unwrap();
    chip8
}

fn run(chip8: &mut Chip8, steps: usize) {
    for _ in 0..steps {
        chip8.step().unwrap();
    }
}

#[test]
fn test_call_and_return() {
    #[rustfmt::skip]
    let mut chip8 = load(&[
        0x22, 0x06, // 200: call 206
        0x61, 0x07, // 202: V1 = 7
        0x12, 0x04, // 204: jump 204
        0x60, 0x05, // 206: V0 = 5
        0x00, 0xEE, // 208: return
    ]);

    chip8.step().unwrap();
    assert_eq!(chip8.pc(), 0x206);
    assert_eq!(chip8.stack_depth(), 1);

    run(&mut chip8, 2);
    assert_eq!(chip8.pc(), 0x202);
    assert_eq!(chip8.stack_depth(), 0);
    assert_eq!(chip8.v(0), 5);

    run(&mut chip8, 3);
    assert_eq!(chip8.v(1), 7);
    assert_eq!(chip8.pc(), 0x204);
}

#[test]
fn test_draw_font_glyph() {
    #[rustfmt::skip]
    let mut chip8 = load(&[
        0x60, 0x00, // V0 = 0
        0xF0, 0x29, // I = glyph for V0
        0xD0, 0x05, // draw 5 rows at (V0, V0)
    ]);
    run(&mut chip8, 3);

    let expected = ["####", "#..#", "#..#", "#..#", "####"];
    for (y, row) in expected.iter().enumerate() {
        for (x, c) in row.chars().enumerate() {
            assert_eq!(chip8.is_pixel_set(x, y), c == '#', "pixel ({}, {})", x, y);
        }
    }
    assert_eq!(chip8.v(0xF), 0);

    let fb = chip8.fb();
    assert!(fb[0][0]);
    assert!(!chip8.is_fb_dirty());
}

#[test]
fn test_clear_after_draw() {
    #[rustfmt::skip]
    let mut chip8 = load(&[
        0xA0, 0x00, // I = 0
        0xD0, 0x0F, // draw 15 rows of font data
        0x00, 0xE0, // clear
    ]);
    run(&mut chip8, 3);
    for y in 0..SCREEN_HEIGHT {
        for x in 0..SCREEN_WIDTH {
            assert!(!chip8.is_pixel_set(x, y));
        }
    }
}

#[test]
fn test_bcd_through_memory() {
    #[rustfmt::skip]
    let mut chip8 = load(&[
        0x6A, 0xEA, // VA = 234
        0xA3, 0x00, // I = 300
        0xFA, 0x33, // BCD of VA
        0xF2, 0x65, // V0..V2 = memory[I..]
    ]);
    run(&mut chip8, 4);
    assert_eq!(chip8.read_memory(0x300), Ok(2));
    assert_eq!(chip8.read_memory(0x301), Ok(3));
    assert_eq!(chip8.read_memory(0x302), Ok(4));
    assert_eq!((chip8.v(0), chip8.v(1), chip8.v(2)), (2, 3, 4));
}

#[test]
fn test_wait_for_key_symbol() {
    #[rustfmt::skip]
    let mut chip8 = load(&[
        0xF5, 0x0A, // V5 = next key
        0xE5, 0x9E, // skip if key V5 is down
        0x60, 0x01, // V0 = 1
        0x61, 0x01, // V1 = 1
    ]);

    assert_eq!(chip8.step(), Ok(ExecState::AwaitingKey(Register(5))));
    assert_eq!(chip8.step(), Ok(ExecState::AwaitingKey(Register(5))));

    // unmapped symbol does not resume
    chip8.key_down_symbol('p' as u32).unwrap();
    assert_eq!(chip8.state(), ExecState::AwaitingKey(Register(5)));

    chip8.key_down_symbol('e' as u32).unwrap();
    assert_eq!(chip8.state(), ExecState::Running);
    assert_eq!(chip8.v(5), 0x6);

    run(&mut chip8, 2);
    assert_eq!(chip8.v(0), 0);
    assert_eq!(chip8.v(1), 1);
}

#[test]
fn test_timers_run_independently_of_steps() {
    #[rustfmt::skip]
    let mut chip8 = load(&[
        0x60, 0x03, // V0 = 3
        0xF0, 0x15, // delay = V0
        0xF0, 0x18, // sound = V0
        0xF1, 0x07, // V1 = delay
    ]);
    run(&mut chip8, 3);

    let beeps: Vec<bool> = (0..4).map(|_| chip8.tick_timers()).collect();
    assert_eq!(beeps, [true, true, true, false]);

    chip8.step().unwrap();
    assert_eq!(chip8.v(1), 0);
}

#[test]
fn test_errors_stop_execution() {
    let mut chip8 = Chip8::new().unwrap();
    assert!(matches!(
        chip8.load_rom(&vec![0; 0xE00]),
        Err(Chip8Error::ProgramTooLarge {
            size: 0xE00,
            max_size: 0xDFF
        })
    ));

    assert_eq!(
        chip8.key_down(0x10),
        Err(Chip8Error::KeyOutOfBounds { key: 0x10 })
    );

    // jump to the last byte, where the next fetch runs off the end of memory
    let mut chip8 = load(&[0x1F, 0xFF]);
    chip8.step().unwrap();
    let err = chip8.step().unwrap_err();
    assert_eq!(err, Chip8Error::AddressOutOfBounds { address: 0x1000 });
    assert_eq!(
        err.to_string(),
        "memory access out of bounds at address 0x1000"
    );
}
