use std::{path::PathBuf, sync::Arc, time::Instant};

use anyhow::Context;
use clap::Parser;
use log::{error, info, warn};
use pixels::{Pixels, SurfaceTexture};
use rodio::{OutputStream, OutputStreamBuilder, Sink, Source, source::SquareWave};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use chip8_vm::{
    config::MachineArgs,
    emu::{DISPLAY_X, DISPLAY_Y, Framebuffer, Runner, Vm},
    u4,
};

const TITLE: &str = "chip8-vm";
const SCALE: u32 = 10;
/// Brightness lost per second by an unlit pixel.
const PHOSPHOR_DECAY: f32 = 10.0;
const BEEP_HZ: f32 = 440.0;

/// Hex keypad value for a physical key, using the usual 4x4 block under 1-4.
fn keypad_value(code: KeyCode) -> Option<u8> {
    let value = match code {
        KeyCode::Digit1 => 0x1,
        KeyCode::Digit2 => 0x2,
        KeyCode::Digit3 => 0x3,
        KeyCode::Digit4 => 0xC,
        KeyCode::KeyQ => 0x4,
        KeyCode::KeyW => 0x5,
        KeyCode::KeyE => 0x6,
        KeyCode::KeyR => 0xD,
        KeyCode::KeyA => 0x7,
        KeyCode::KeyS => 0x8,
        KeyCode::KeyD => 0x9,
        KeyCode::KeyF => 0xE,
        KeyCode::KeyZ => 0xA,
        KeyCode::KeyX => 0x0,
        KeyCode::KeyC => 0xB,
        KeyCode::KeyV => 0xF,
        _ => return None,
    };
    Some(value)
}

/// RGBA surface with a slow fade on pixels that go dark.
struct Screen {
    pixels: Pixels<'static>,
    brightness: Vec<f32>,
}

impl Screen {
    fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width, size.height, window);
        let pixels = Pixels::new(DISPLAY_X as u32, DISPLAY_Y as u32, surface)
            .context("Failed to create pixels surface")?;

        Ok(Self {
            pixels,
            brightness: vec![0.0; DISPLAY_X * DISPLAY_Y],
        })
    }

    fn resize(&mut self, width: u32, height: u32) -> anyhow::Result<()> {
        self.pixels
            .resize_surface(width, height)
            .context("Failed to resize pixels surface")
    }

    fn draw(&mut self, framebuffer: &Framebuffer, dt: f32) -> anyhow::Result<()> {
        let cells = framebuffer.as_bytes().iter().zip(self.brightness.iter_mut());

        for (rgba, (&lit, level)) in self.pixels.frame_mut().chunks_exact_mut(4).zip(cells) {
            *level = if lit != 0 {
                1.0
            } else {
                (*level - PHOSPHOR_DECAY * dt).max(0.0)
            };
            rgba.copy_from_slice(&[0x20, 0xff, 0x40, (*level * 255.0) as u8]);
        }

        self.pixels.render().context("Pixels render error")
    }
}

/// Square wave that plays while the machine's sound timer runs.
struct Beeper {
    // Dropping the stream silences the sink
    _stream: OutputStream,
    sink: Sink,
}

impl Beeper {
    fn open() -> anyhow::Result<Self> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .context("Failed to open audio output stream")?;
        stream.log_on_drop(false);

        let sink = Sink::connect_new(stream.mixer());
        sink.pause();
        sink.append(SquareWave::new(BEEP_HZ).amplify(0.3));

        Ok(Self {
            _stream: stream,
            sink,
        })
    }

    fn set(&self, on: bool) {
        match (on, self.sink.is_paused()) {
            (true, true) => self.sink.play(),
            (false, false) => self.sink.pause(),
            _ => {}
        }
    }
}

struct App {
    runner: Runner,
    program: Vec<u8>,
    beeper: Beeper,

    window: Option<Arc<Window>>,
    screen: Option<Screen>,
    last_frame: Instant,

    paused: bool,
    /// Set once the machine hits a fatal error; it stays on screen until reset.
    halted: bool,

    exit_result: anyhow::Result<()>,
}

impl App {
    fn new(program: Vec<u8>, machine: &MachineArgs) -> anyhow::Result<Self> {
        let runner = machine
            .build_runner(&program)
            .context("Failed to load program into memory")?;

        Ok(Self {
            runner,
            program,
            beeper: Beeper::open()?,
            window: None,
            screen: None,
            last_frame: Instant::now(),
            paused: false,
            halted: false,
            exit_result: Ok(()),
        })
    }

    fn update_title(&self) {
        let Some(window) = &self.window else {
            return;
        };

        let state = if self.halted {
            " (halted, F5 to reset)"
        } else if self.paused {
            " (paused)"
        } else {
            ""
        };
        window.set_title(&format!("{TITLE}{state}"));
    }

    fn reset(&mut self) -> anyhow::Result<()> {
        let mut vm = Vm::with_quirks(self.runner.vm().quirks());
        vm.load(&self.program).context("Failed to reload program")?;
        self.runner.replace_vm(vm);

        self.halted = false;
        info!("Machine reset");
        self.update_title();
        Ok(())
    }

    fn frame(&mut self) -> anyhow::Result<()> {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        if !self.paused && !self.halted {
            if let Err(e) = self.runner.update(dt) {
                error!("Machine halted: {e}");
                self.halted = true;
                self.update_title();
            }
            if let Some((address, word)) = self.runner.take_unknown_opcode() {
                warn!("Program reached unknown word {word:04X} at {address:03X}");
            }
        }

        self.beeper
            .set(self.runner.should_beep() && !self.paused && !self.halted);

        self.screen
            .as_mut()
            .context("Screen not initialized")?
            .draw(self.runner.vm().framebuffer(), dt)
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, event: KeyEvent) -> anyhow::Result<()> {
        let PhysicalKey::Code(code) = event.physical_key else {
            return Ok(());
        };
        let pressed = event.state == ElementState::Pressed;

        if let Some(value) = keypad_value(code) {
            self.runner.set_key(u4::from_low_bits(value), pressed);
            return Ok(());
        }

        if !pressed || event.repeat {
            return Ok(());
        }

        match code {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::KeyP => {
                self.paused = !self.paused;
                self.update_title();
            }
            KeyCode::F5 => self.reset()?,
            _ => {}
        }
        Ok(())
    }

    fn try_resumed(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let attributes = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(LogicalSize::new(
                DISPLAY_X as u32 * SCALE,
                DISPLAY_Y as u32 * SCALE,
            ))
            .with_min_inner_size(LogicalSize::new(DISPLAY_X as u32, DISPLAY_Y as u32));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("Failed to create window")?,
        );

        self.screen = Some(Screen::new(window.clone())?);
        window.request_redraw();
        self.window = Some(window);

        // The first frame should not run the time spent opening the window
        self.last_frame = Instant::now();
        Ok(())
    }

    fn try_window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        event: WindowEvent,
    ) -> anyhow::Result<()> {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(screen) = self.screen.as_mut() {
                    screen.resize(size.width, size.height)?;
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.on_key(event_loop, event)?,
            WindowEvent::RedrawRequested => {
                self.frame()?;
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(e) = self.try_resumed(event_loop) {
            self.exit_result = Err(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Err(e) = self.try_window_event(event_loop, event) {
            self.exit_result = Err(e);
            event_loop.exit();
        }
    }
}

/// Windowed front-end for the CHIP-8 virtual machine.
///
/// Keys 1-4, Q-R, A-F and Z-V form the hex keypad. P pauses, F5 reloads the
/// program and Escape quits.
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    /// Path to the program image
    program_path: PathBuf,

    #[command(flatten)]
    machine: MachineArgs,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let program = std::fs::read(&args.program_path).context("Failed to read program file")?;
    let mut app = App::new(program, &args.machine).context("Failed to initialize application")?;

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop
        .run_app(&mut app)
        .context("Error occurred during event loop execution")?;

    app.exit_result
}
