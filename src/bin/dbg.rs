use std::{
    collections::VecDeque,
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::Context;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
};

use chip8_vm::{
    config::MachineArgs,
    debugger::{Cli, Command, CommandResult, Executor, mnemonic},
    emu::{DISPLAY_X, DISPLAY_Y, RunnerResult, STACK_DEPTH},
    u4,
};

/// Hex keypad value for each terminal key, same layout as the windowed front-end.
#[rustfmt::skip]
const KEYS: [(char, u8); 16] = [
    ('1', 0x1), ('2', 0x2), ('3', 0x3), ('4', 0xC),
    ('q', 0x4), ('w', 0x5), ('e', 0x6), ('r', 0xD),
    ('a', 0x7), ('s', 0x8), ('d', 0x9), ('f', 0xE),
    ('z', 0xA), ('x', 0x0), ('c', 0xB), ('v', 0xF),
];

/// Most terminals never send key releases, so a key is let go this long after its last press.
const KEY_HOLD: Duration = Duration::from_millis(50);
const FRAME: Duration = Duration::from_millis(16);
const LOG_CAPACITY: usize = 256;

// Two framebuffer rows per terminal row
const SCREEN_ROWS: u16 = DISPLAY_Y as u16 / 2;
const MIN_WIDTH: u16 = DISPLAY_X as u16 + 2 + 28;
const MIN_HEIGHT: u16 = SCREEN_ROWS + 2 + 8 + 3 + 3;

struct App {
    executor: Executor,
    input: String,
    log: VecDeque<String>,
    last_command: Option<Command>,
    held_since: [Option<Instant>; 16],
    quit: bool,
}

impl App {
    fn new(program: Vec<u8>, machine: &MachineArgs) -> anyhow::Result<Self> {
        let runner = machine
            .build_runner(&program)
            .context("Failed to load program into memory")?;

        let mut app = Self {
            executor: Executor::new(runner, program),
            input: String::new(),
            log: VecDeque::with_capacity(LOG_CAPACITY),
            last_command: None,
            held_since: [None; 16],
            quit: false,
        };
        app.push_log("Commands: run, step [n], breakpoint set <addr>, set <reg> <value>, mem, disasm, reset, quit");
        Ok(app)
    }

    fn run(mut self, terminal: &mut DefaultTerminal) -> anyhow::Result<()> {
        let mut last_frame = Instant::now();

        while !self.quit {
            let now = Instant::now();
            self.advance(now.duration_since(last_frame).as_secs_f32());
            last_frame = now;
            self.release_held_keys(now);

            terminal.draw(|frame| self.render(frame))?;

            if event::poll(FRAME)?
                && let Event::Key(key) = event::read()?
            {
                self.on_key(key);
            }
        }

        Ok(())
    }

    fn push_log(&mut self, text: impl Into<String>) {
        for line in text.into().lines() {
            if self.log.len() == LOG_CAPACITY {
                self.log.pop_front();
            }
            self.log.push_back(line.to_string());
        }
    }

    /// Runs the machine while in run mode and reports anything worth stopping for.
    fn advance(&mut self, dt: f32) {
        match self.executor.poll(dt) {
            Ok(RunnerResult::HitBreakpoint) => {
                let pc = self.executor.vm().program_counter();
                self.push_log(format!("Breakpoint hit at {pc:03X}"));
            }
            Ok(RunnerResult::Ok) => {}
            Err(e) => self.push_log(format!("Halted: {e}")),
        }

        if let Some((address, word)) = self.executor.runner_mut().take_unknown_opcode() {
            self.push_log(format!("Skipped unknown word {word:04X} at {address:03X}"));
        }
    }

    fn release_held_keys(&mut self, now: Instant) {
        for (key, since) in self.held_since.iter_mut().enumerate() {
            if since.is_some_and(|t| now.duration_since(t) > KEY_HOLD) {
                *since = None;
                self.executor
                    .runner_mut()
                    .set_key(u4::from_low_bits(key as u8), false);
            }
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit = true;
            return;
        }

        if self.executor.is_running() {
            self.on_key_running(key);
        } else if key.kind == KeyEventKind::Press {
            self.on_key_paused(key);
        }
    }

    /// Esc pauses, everything else goes to the machine's keypad.
    fn on_key_running(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.executor.pause();
                self.push_log("Paused");
            }
            KeyCode::Char(c) => {
                if let Some(&(_, value)) = KEYS.iter().find(|(k, _)| *k == c.to_ascii_lowercase()) {
                    let key = u4::from_low_bits(value);
                    self.executor.runner_mut().set_key(key, true);
                    self.held_since[usize::from(key)] = Some(Instant::now());
                }
            }
            _ => {}
        }
    }

    fn on_key_paused(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.quit = true,
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
    }

    /// An empty line repeats the previous command.
    fn submit(&mut self) {
        let line = std::mem::take(&mut self.input);

        let command = if line.trim().is_empty() {
            self.last_command.clone()
        } else {
            self.push_log(format!("> {line}"));
            match Cli::try_parse_from(line.split_whitespace()) {
                Ok(cli) => Some(cli.command),
                Err(e) => {
                    self.push_log(e.to_string());
                    None
                }
            }
        };

        if let Some(command) = command {
            self.last_command = Some(command.clone());
            self.execute(command);
        }
    }

    fn execute(&mut self, command: Command) {
        match self.executor.execute(command) {
            Ok(result) => self.report(result),
            Err(e) => self.push_log(e.to_string()),
        }
    }

    fn report(&mut self, result: CommandResult) {
        match result {
            CommandResult::Ok => {}
            CommandResult::Quit => self.quit = true,
            CommandResult::Stepped { unknown_opcodes } => {
                for (address, word) in unknown_opcodes {
                    self.push_log(format!("Skipped unknown word {word:04X} at {address:03X}"));
                }
                let pc = self.executor.vm().program_counter();
                self.push_log(format!("PC = {pc:03X}"));
            }
            CommandResult::Breakpoints(addresses) if addresses.is_empty() => {
                self.push_log("No breakpoints");
            }
            CommandResult::Breakpoints(addresses) => {
                let list: Vec<String> = addresses.iter().map(|a| format!("{a:03X}")).collect();
                self.push_log(format!("Breakpoints: {}", list.join(" ")));
            }
            CommandResult::MemDump { data, offset } => {
                for (row, chunk) in data.chunks(8).enumerate() {
                    let bytes: Vec<String> = chunk.iter().map(|b| format!("{b:02X}")).collect();
                    let address = usize::from(offset) + row * 8;
                    self.push_log(format!("{address:03X}  {}", bytes.join(" ")));
                }
            }
            CommandResult::Disasm { instructions } => {
                let quirks = self.executor.vm().quirks();
                for ins in instructions {
                    self.push_log(format!(
                        "{:03X}  {:04X}  {}",
                        ins.address,
                        ins.word,
                        mnemonic(ins.opcode(), quirks)
                    ));
                }
            }
        }
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
            frame.render_widget(
                Paragraph::new(format!("Need at least {MIN_WIDTH}x{MIN_HEIGHT} cells"))
                    .style(Style::default().fg(Color::Red)),
                area,
            );
            return;
        }

        let [top, machine, log, input] = Layout::vertical([
            Constraint::Length(SCREEN_ROWS + 2),
            Constraint::Length(8),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .areas(area);

        let [screen, disasm] =
            Layout::horizontal([Constraint::Length(DISPLAY_X as u16 + 2), Constraint::Min(28)])
                .areas(top);

        let [registers, stack, quirks, keypad] = Layout::horizontal([
            Constraint::Length(27),
            Constraint::Length(12),
            Constraint::Length(24),
            Constraint::Min(13),
        ])
        .areas(machine);

        self.render_screen(frame, screen);
        self.render_disasm(frame, disasm);
        self.render_registers(frame, registers);
        self.render_stack(frame, stack);
        self.render_quirks(frame, quirks);
        self.render_keypad(frame, keypad);
        self.render_log(frame, log);
        self.render_input(frame, input);
    }

    fn render_screen(&self, frame: &mut Frame, area: Rect) {
        let rows: Vec<&[u8]> = self.executor.framebuffer().rows().collect();
        let lines: Vec<Line> = rows
            .chunks_exact(2)
            .map(|pair| {
                let text: String = pair[0]
                    .iter()
                    .zip(pair[1])
                    .map(|(&top, &bottom)| match (top != 0, bottom != 0) {
                        (true, true) => '█',
                        (true, false) => '▀',
                        (false, true) => '▄',
                        (false, false) => ' ',
                    })
                    .collect();
                Line::styled(text, Style::default().fg(Color::Green))
            })
            .collect();

        frame.render_widget(
            Paragraph::new(lines).block(Block::bordered().title(" Screen ")),
            area,
        );
    }

    /// Instructions around the program counter, with breakpoints marked.
    fn render_disasm(&self, frame: &mut Frame, area: Rect) {
        let vm = self.executor.vm();
        let quirks = vm.quirks();
        let pc = vm.program_counter();

        let visible = usize::from(area.height.saturating_sub(2));
        let before = (visible / 4) as u16;
        let start = pc.saturating_sub(before * 2);

        let lines: Vec<Line> = vm
            .instructions_at(start, visible)
            .into_iter()
            .map(|ins| {
                let marker = if self.executor.breakpoints().contains(&ins.address) {
                    '●'
                } else {
                    ' '
                };
                let text = format!(
                    "{marker}{:03X}  {:04X}  {}",
                    ins.address,
                    ins.word,
                    mnemonic(ins.opcode(), quirks)
                );

                if ins.address == pc {
                    Line::styled(text, Style::default().add_modifier(Modifier::REVERSED))
                } else {
                    Line::raw(text)
                }
            })
            .collect();

        frame.render_widget(
            Paragraph::new(lines).block(Block::bordered().title(" Code ")),
            area,
        );
    }

    fn render_registers(&self, frame: &mut Frame, area: Rect) {
        let vm = self.executor.vm();
        let regs = self.executor.registers();

        let beep = if vm.sound_active() {
            Span::styled(" BEEP", Style::default().fg(Color::Yellow))
        } else {
            Span::raw("")
        };

        let mut lines = vec![
            Line::raw(format!("PC {:03X}   I {:03X}", regs.pc, regs.i)),
            Line::from(vec![
                Span::raw(format!("DT {:02X}    ST {:02X}", regs.delay_timer, regs.sound_timer)),
                beep,
            ]),
        ];
        lines.extend(regs.v.chunks(4).enumerate().map(|(row, values)| {
            let cells: Vec<String> = values
                .iter()
                .enumerate()
                .map(|(col, value)| format!("V{:X} {value:02X}", row * 4 + col))
                .collect();
            Line::raw(cells.join(" "))
        }));

        frame.render_widget(
            Paragraph::new(lines).block(Block::bordered().title(" Registers ")),
            area,
        );
    }

    /// Innermost call first.
    fn render_stack(&self, frame: &mut Frame, area: Rect) {
        let regs = self.executor.registers();
        let calls = regs.call_stack();

        let lines: Vec<Line> = calls
            .iter()
            .rev()
            .take(usize::from(area.height.saturating_sub(2)))
            .map(|address| Line::raw(format!("{address:03X}")))
            .collect();

        let title = format!(" Stack {}/{STACK_DEPTH} ", calls.len());
        frame.render_widget(
            Paragraph::new(lines).block(Block::bordered().title(title)),
            area,
        );
    }

    fn render_quirks(&self, frame: &mut Frame, area: Rect) {
        let quirks = self.executor.vm().quirks();
        let flags = [
            ("shift reads Vx", quirks.shift_uses_vx),
            ("logic clears VF", quirks.logic_resets_vf),
            ("Fx55/65 move I", quirks.load_store_increments_i),
            ("Bnnn adds Vx", quirks.jump_uses_vx),
            ("display wait", quirks.display_wait),
        ];

        let mut lines: Vec<Line> = flags
            .iter()
            .map(|&(name, on)| {
                let (state, color) = if on {
                    ("on ", Color::Green)
                } else {
                    ("off", Color::DarkGray)
                };
                Line::from(vec![
                    Span::styled(state, Style::default().fg(color)),
                    Span::raw(format!(" {name}")),
                ])
            })
            .collect();
        lines.push(Line::raw(format!("{:.0} Hz", self.executor.runner().cpu_hz())));

        frame.render_widget(
            Paragraph::new(lines).block(Block::bordered().title(" Quirks ")),
            area,
        );
    }

    fn render_keypad(&self, frame: &mut Frame, area: Rect) {
        let keypad = self.executor.keypad();

        let lines: Vec<Line> = KEYS
            .chunks(4)
            .map(|row| {
                let spans: Vec<Span> = row
                    .iter()
                    .map(|&(_, value)| {
                        let style = if keypad.is_pressed(u4::from_low_bits(value)) {
                            Style::default().add_modifier(Modifier::REVERSED)
                        } else {
                            Style::default()
                        };
                        Span::styled(format!(" {value:X} "), style)
                    })
                    .collect();
                Line::from(spans)
            })
            .collect();

        frame.render_widget(
            Paragraph::new(lines).block(Block::bordered().title(" Keys ")),
            area,
        );
    }

    fn render_log(&self, frame: &mut Frame, area: Rect) {
        let visible = usize::from(area.height.saturating_sub(2));
        let skip = self.log.len().saturating_sub(visible);
        let lines: Vec<Line> = self.log.iter().skip(skip).map(|l| Line::raw(l.as_str())).collect();

        frame.render_widget(
            Paragraph::new(lines).block(Block::bordered().title(" Log ")),
            area,
        );
    }

    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let (title, color) = if self.executor.is_running() {
            (" Running (Esc to pause) ", Color::Green)
        } else {
            (" Paused ", Color::Yellow)
        };

        frame.render_widget(
            Paragraph::new(format!("> {}_", self.input)).block(
                Block::bordered()
                    .title(title)
                    .border_style(Style::default().fg(color)),
            ),
            area,
        );
    }
}

/// Terminal debugger for the CHIP-8 virtual machine
#[derive(Parser)]
struct Args {
    /// Path to the program image to load
    program_path: PathBuf,

    #[command(flatten)]
    machine: MachineArgs,
}

fn main() -> anyhow::Result<()> {
    // Anything below error level would scribble over the terminal UI
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();
    let args = Args::parse();

    let program = std::fs::read(&args.program_path).context("Failed to read program file")?;
    let app = App::new(program, &args.machine).context("Failed to initialize application")?;

    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal);
    ratatui::restore();

    result
}
