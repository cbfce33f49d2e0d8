//! The main loop: terminal input, backend replies and surface events all
//! funnel into one [`AppState`] owned by this thread.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::clipboard::{self, ClipboardSink, CommandClipboard};
use crate::config::AppConfig;
use crate::coordinator;
use crate::request::{Backend, BackendError, FormInput, HttpBackend, Language, ProcessResponse, Tone};
use crate::state::AppState;
use crate::surface::{Surface, SurfaceEvent, TerminalSurface};
use crate::variants::OptionSlot;
use crate::view::Control;
use crate::x11::X11Surface;

const TICK: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    Submit(FormInput),
    Copy(OptionSlot),
    Quit,
}

type Reply = Result<ProcessResponse, BackendError>;

pub struct App {
    state: AppState,
    backend: Arc<dyn Backend>,
    surface: Box<dyn Surface>,
    fallback: Box<dyn ClipboardSink>,
    feedback: Duration,
    replies_tx: Sender<Reply>,
    replies_rx: Receiver<Reply>,
    presented: Option<u64>,
}

impl App {
    pub fn new(
        backend: Arc<dyn Backend>,
        surface: Box<dyn Surface>,
        fallback: Box<dyn ClipboardSink>,
        feedback: Duration,
    ) -> Self {
        let (replies_tx, replies_rx) = mpsc::channel();
        Self {
            state: AppState::new(),
            backend,
            surface,
            fallback,
            feedback,
            replies_tx,
            replies_rx,
            presented: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Returns `false` once the user asked to quit.
    pub fn handle_input(&mut self, input: UserInput) -> bool {
        match input {
            UserInput::Submit(form) => self.submit(&form),
            UserInput::Copy(slot) => self.copy(slot),
            UserInput::Quit => return false,
        }
        true
    }

    fn submit(&mut self, form: &FormInput) {
        let Ok(request) = coordinator::begin_submission(&mut self.state, form) else {
            return;
        };
        let backend = Arc::clone(&self.backend);
        let replies = self.replies_tx.clone();
        thread::spawn(move || {
            let reply = backend.process(&request);
            if replies.send(reply).is_err() {
                debug!("app exited before the backend answered");
            }
        });
    }

    fn copy(&mut self, slot: OptionSlot) {
        let now = Instant::now();
        let primary = self.surface.clipboard();
        clipboard::copy_output(&mut self.state, slot, primary, self.fallback.as_mut(), self.feedback, now);
    }

    /// One loop iteration without sleeping. Returns `false` when the surface was closed.
    pub fn tick(&mut self) -> Result<bool> {
        while let Ok(reply) = self.replies_rx.try_recv() {
            coordinator::complete_submission(&mut self.state, reply);
        }

        let mut keep_running = true;
        for event in self.surface.poll_events()? {
            match event {
                SurfaceEvent::Control(Control::Copy(slot)) => self.copy(slot),
                SurfaceEvent::Control(Control::DismissAlert) => {
                    self.state.dismiss_alert();
                }
                SurfaceEvent::CloseRequested => keep_running = false,
            }
        }

        self.state.expire_feedback(Instant::now());
        self.present()?;

        if !self.surface.modal_alerts() && self.state.dismiss_alert() {
            self.present()?;
        }
        Ok(keep_running)
    }

    fn present(&mut self) -> Result<()> {
        let frame = self.state.frame();
        if self.presented != Some(frame) {
            self.surface.present(&self.state)?;
            self.presented = Some(frame);
        }
        Ok(())
    }

    /// Blocks until the in-flight request, if any, has been applied.
    pub fn finish(&mut self) -> Result<()> {
        while self.state.is_busy() {
            let reply = self
                .replies_rx
                .recv()
                .context("backend worker vanished with a request in flight")?;
            coordinator::complete_submission(&mut self.state, reply);
        }
        self.present()
    }

    pub fn run(&mut self, inputs: Receiver<UserInput>) -> Result<()> {
        self.present()?;
        loop {
            match inputs.try_recv() {
                Ok(input) => {
                    if !self.handle_input(input) {
                        break;
                    }
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    debug!("input closed");
                    break;
                }
            }
            if !self.tick()? {
                info!("window closed");
                break;
            }
            thread::sleep(TICK);
        }
        self.finish()
    }
}

/// Reads forms and commands from `input`, prompting on `prompt`, until EOF or `:quit`.
/// A paragraph line ending in `\` continues on the next line.
pub fn read_inputs<R: BufRead, W: Write>(input: R, mut prompt: W, tx: Sender<UserInput>) -> io::Result<()> {
    let mut lines = input.lines();
    let mut ask = |prompt: &mut W, label: &str| -> io::Result<Option<String>> {
        write!(prompt, "{label}>> ")?;
        prompt.flush()?;
        lines.next().transpose()
    };

    while let Some(line) = ask(&mut prompt, "paragraph")? {
        let trimmed = line.trim();
        if let Some(command) = trimmed.strip_prefix(':') {
            match parse_command(command) {
                Some(UserInput::Quit) => {
                    let _ = tx.send(UserInput::Quit);
                    return Ok(());
                }
                Some(input) => {
                    if tx.send(input).is_err() {
                        return Ok(());
                    }
                }
                None => writeln!(prompt, "未知指令：:{command}（可用 :copy 1-3、:quit）")?,
            }
            continue;
        }
        if trimmed.is_empty() {
            continue;
        }

        let mut paragraph = line;
        while let Some(head) = paragraph.trim_end().strip_suffix('\\').map(str::to_string) {
            let Some(next) = ask(&mut prompt, "...")? else { return Ok(()) };
            paragraph = format!("{head}\n{next}");
        }

        writeln!(prompt, "語調：{}", Tone::ALL.map(Tone::label).join(" / "))?;
        let Some(tone) = ask(&mut prompt, "tone")? else { break };
        writeln!(prompt, "語言：{}", Language::ALL.map(Language::label).join(" / "))?;
        let Some(language) = ask(&mut prompt, "language")? else { break };

        let form = FormInput::new(paragraph, tone.trim(), language.trim());
        if tx.send(UserInput::Submit(form)).is_err() {
            break;
        }
    }
    Ok(())
}

fn parse_command(command: &str) -> Option<UserInput> {
    let mut parts = command.split_whitespace();
    match parts.next()? {
        "quit" | "q" => Some(UserInput::Quit),
        "copy" => {
            let number = parts.next()?.parse().ok()?;
            OptionSlot::from_number(number).map(UserInput::Copy)
        }
        _ => None,
    }
}

fn open_surface(config: &AppConfig) -> Box<dyn Surface> {
    if config.ui.headless {
        info!("headless mode, using terminal output");
        return Box::new(TerminalSurface::stdio());
    }
    if std::env::var_os("DISPLAY").is_none() {
        warn!("DISPLAY is not set, using terminal output");
        return Box::new(TerminalSurface::stdio());
    }
    match X11Surface::open(&config.ui, config.debug) {
        Ok(surface) => Box::new(surface),
        Err(err) => {
            warn!(%err, "cannot open window, using terminal output");
            Box::new(TerminalSurface::stdio())
        }
    }
}

pub fn run(config: &AppConfig) -> Result<()> {
    let backend = HttpBackend::new(&config.backend).context("failed to build http client")?;
    info!(endpoint = backend.endpoint(), "tone toner ready");

    let surface = open_surface(config);
    let fallback = CommandClipboard::new(config.clipboard.commands.clone());
    let mut app = App::new(
        Arc::new(backend),
        surface,
        Box::new(fallback),
        Duration::from_millis(config.clipboard.feedback_ms),
    );

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        if let Err(err) = read_inputs(stdin.lock(), io::stdout(), tx) {
            warn!(%err, "stopped reading input");
        }
    });

    app.run(rx)
}
