use std::collections::HashMap;
use std::io::{self, Write};
use std::{path::PathBuf, time};

use anyhow::Context;
use chip8::{Chip8, ExecState, FrameBuffer};
use clap::Parser;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue, style, terminal,
};
use log::{debug, info};

const FRAME_INTERVAL: time::Duration = time::Duration::new(0, 1_000_000_000u32 / 60);
/// Terminals report presses but not releases, so keys are let go after this many frames
const KEY_HOLD_FRAMES: u32 = 6;

/// Render the frame buffer two pixel rows per text line
fn render_lines(fb: &FrameBuffer) -> Vec<String> {
    fb.chunks(2)
        .map(|rows| {
            (0..chip8::SCREEN_WIDTH)
                .map(|x| match (rows[0][x], rows.get(1).is_some_and(|row| row[x])) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                })
                .collect()
        })
        .collect()
}

/// Restores the terminal when dropped, including on error paths
struct RawTerminal;

impl RawTerminal {
    fn enter() -> anyhow::Result<Self> {
        terminal::enable_raw_mode().context("enable raw mode")?;
        execute!(io::stdout(), terminal::EnterAlternateScreen, cursor::Hide)
            .context("enter alternate screen")?;
        Ok(Self)
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// Keys pressed in the terminal, with the frames left before they are released
struct HeldKeys(HashMap<u32, u32>);

impl HeldKeys {
    fn press(&mut self, chip8: &mut Chip8, symbol: u32) -> anyhow::Result<()> {
        let newly_pressed = self.0.insert(symbol, KEY_HOLD_FRAMES).is_none();
        // a held key still resumes a wait that started after it went down
        let awaiting = matches!(chip8.state(), ExecState::AwaitingKey(_));
        if newly_pressed || awaiting {
            chip8.key_down_symbol(symbol).context("key down")?;
        }
        Ok(())
    }

    fn tick(&mut self, chip8: &mut Chip8) -> anyhow::Result<()> {
        let mut released = Vec::new();
        for (&symbol, frames) in self.0.iter_mut() {
            *frames -= 1;
            if *frames == 0 {
                released.push(symbol);
            }
        }
        for symbol in released {
            self.0.remove(&symbol);
            chip8.key_up_symbol(symbol).context("key up")?;
        }
        Ok(())
    }
}

struct App {
    args: Args,
    chip8: Chip8,
}

impl App {
    pub fn new(args: Args) -> anyhow::Result<Self> {
        let rom = std::fs::read(&args.load)
            .with_context(|| format!("read rom file {}", args.load.display()))?;

        let mut chip8 = Chip8::new()
            .context("construct new chip8 instance")?
            .legacy_shift(args.legacy_shift)
            .jump_add_offset(args.jump_add_offset)
            .memory_increment_i(args.memory_increment_i)
            .ops_per_cycle(args.ops_per_cycle);
        chip8.load_rom(&rom).context("load rom")?;
        info!("loaded {} ({} bytes)", args.load.display(), rom.len());
        debug!("\n{}", chip8);

        Ok(Self { args, chip8 })
    }

    fn frame_limit_reached(&self, frame: u64) -> bool {
        self.args.max_frames.is_some_and(|max| frame >= max)
    }

    pub fn run_headless(&mut self) -> anyhow::Result<()> {
        let mut frame = 0;
        while !self.frame_limit_reached(frame) {
            self.chip8.cycle().context("run cycle")?;
            frame += 1;
        }
        info!("stopped after {} frames", frame);
        for line in render_lines(&self.chip8.fb()) {
            println!("{}", line.trim_end());
        }
        Ok(())
    }

    pub fn run_interactive(&mut self) -> anyhow::Result<()> {
        let _terminal = RawTerminal::enter()?;
        let mut out = io::stdout();
        let mut held = HeldKeys(HashMap::new());
        let mut frame = 0;

        'frames: while !self.frame_limit_reached(frame) {
            while event::poll(time::Duration::ZERO).context("poll terminal events")? {
                if let Event::Key(KeyEvent {
                    code,
                    modifiers,
                    kind: KeyEventKind::Press,
                    ..
                }) = event::read().context("read terminal event")?
                {
                    match code {
                        KeyCode::Esc => break 'frames,
                        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                            break 'frames
                        }
                        KeyCode::Char(c) => {
                            held.press(&mut self.chip8, c.to_ascii_lowercase() as u32)?
                        }
                        _ => (),
                    }
                }
            }

            let beep = self.chip8.cycle().context("run cycle")?;
            held.tick(&mut self.chip8)?;

            if beep {
                queue!(out, style::Print('\x07'))?;
            }
            if self.chip8.is_fb_dirty() {
                for (row, line) in render_lines(&self.chip8.fb()).iter().enumerate() {
                    queue!(out, cursor::MoveTo(0, row as u16), style::Print(line))?;
                }
            }
            out.flush().context("flush terminal")?;

            frame += 1;
            std::thread::sleep(FRAME_INTERVAL);
        }

        info!("exiting after {} frames", frame);
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(value_name = "PATH", help = "ROM to load into memory", value_hint = clap::ValueHint::FilePath)]
    load: PathBuf,
    #[arg(long, help = "Toggle shift operation modes")]
    legacy_shift: bool,
    #[arg(long, help = "Toggle jump operation modes")]
    jump_add_offset: bool,
    #[arg(long, help = "Toggle memory read/write operation modes")]
    memory_increment_i: bool,
    #[arg(long, default_value_t = 11, help = "Instructions executed per 60 Hz frame")]
    ops_per_cycle: usize,
    #[arg(long, help = "Stop after this many frames")]
    max_frames: Option<u64>,
    #[arg(long, requires = "max_frames", help = "Run without a terminal UI and print the final screen")]
    headless: bool,
}

fn main() -> std::process::ExitCode {
    env_logger::init();

    let args = Args::parse();
    let headless = args.headless;

    let result = App::new(args).and_then(|mut app| {
        if headless {
            app.run_headless()
        } else {
            app.run_interactive()
        }
    });

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:?}", e);
            std::process::ExitCode::FAILURE
        }
    }
}
