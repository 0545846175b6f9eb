//! Keyboard control for a load run
//!
//! - `s` stops issuing new calls; in-flight calls are still awaited
//! - `Ctrl-C` exits immediately, whatever is still in flight
//!
//! When stdin is not a terminal the listener falls back to SIGINT: the
//! first interrupt stops calling, the second exits.
//!
//! Raw mode also disables the terminal's output processing, so a bare `\n`
//! no longer returns to column 0. Log output goes through [`TerminalWriter`],
//! which emits `\r\n` while raw mode is on.

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Exit status for a forced quit (128 + SIGINT)
pub const FORCE_QUIT_EXIT_CODE: i32 = 130;

/// How often the blocking key reader checks whether it should stop
const KEY_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Action bound to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// Stop calling, keep waiting for responses
    Stop,
    /// Exit the process now
    ForceQuit,
}

/// Map a key event to its command
pub fn classify(key: &KeyEvent) -> Option<KeyCommand> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') | KeyCode::Char('C') if ctrl => Some(KeyCommand::ForceQuit),
        KeyCode::Char('s') | KeyCode::Char('S') if !ctrl => Some(KeyCommand::Stop),
        _ => None,
    }
}

/// Writer that translates `\n` to `\r\n` when `crlf` is set
pub struct TerminalWriter<W> {
    inner: W,
    crlf: bool,
}

impl TerminalWriter<io::Stderr> {
    /// Stderr, translating line endings only while raw mode is enabled
    pub fn stderr() -> Self {
        let crlf = terminal::is_raw_mode_enabled().unwrap_or(false);
        Self::new(io::stderr(), crlf)
    }
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(inner: W, crlf: bool) -> Self {
        Self { inner, crlf }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for TerminalWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.crlf {
            return self.inner.write(buf);
        }

        let mut translated = Vec::with_capacity(buf.len() + 4);
        let mut prev = None;
        for &byte in buf {
            if byte == b'\n' && prev != Some(b'\r') {
                translated.push(b'\r');
            }
            translated.push(byte);
            prev = Some(byte);
        }
        self.inner.write_all(&translated)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Running keyboard listener
///
/// Dropping the handle stops the listener and restores the terminal.
pub struct ControlHandle {
    stop: Arc<AtomicBool>,
    raw_mode: bool,
    task: Option<JoinHandle<()>>,
}

impl ControlHandle {
    /// Stop listening and wait for the reader to exit
    pub async fn shutdown(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(task) = self.task.take() {
            if self.raw_mode {
                // Blocking reader notices the flag within one poll interval
                let _ = task.await;
            } else {
                task.abort();
            }
        }
    }
}

impl Drop for ControlHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if self.raw_mode
            && let Err(e) = terminal::disable_raw_mode()
        {
            warn!("Failed to restore terminal mode: {}", e);
        }
    }
}

/// Start listening for control keys, cancelling `cancel` on stop
pub fn spawn_listener(cancel: CancellationToken) -> ControlHandle {
    if std::io::stdin().is_terminal() {
        match terminal::enable_raw_mode() {
            Ok(()) => return spawn_key_listener(cancel),
            Err(e) => warn!("Failed to enable raw mode ({}), falling back to Ctrl-C", e),
        }
    } else {
        info!("stdin is not a terminal: press Ctrl-C to stop calling, twice to quit");
    }
    spawn_signal_listener(cancel)
}

fn spawn_key_listener(cancel: CancellationToken) -> ControlHandle {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);

    let task = tokio::task::spawn_blocking(move || {
        while !flag.load(Ordering::Relaxed) {
            match event::poll(KEY_POLL_INTERVAL) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    warn!("Keyboard input failed: {}", e);
                    return;
                }
            }

            let key = match event::read() {
                Ok(Event::Key(key)) => key,
                Ok(_) => continue,
                Err(e) => {
                    warn!("Keyboard input failed: {}", e);
                    return;
                }
            };

            debug!("got keypress {:?}", key);
            match classify(&key) {
                Some(KeyCommand::ForceQuit) => force_quit(),
                Some(KeyCommand::Stop) => request_stop(&cancel),
                None => {}
            }
        }
    });

    ControlHandle {
        stop,
        raw_mode: true,
        task: Some(task),
    }
}

fn spawn_signal_listener(cancel: CancellationToken) -> ControlHandle {
    let task = tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if cancel.is_cancelled() {
                force_quit();
            }
            request_stop(&cancel);
        }
    });

    ControlHandle {
        stop: Arc::new(AtomicBool::new(false)),
        raw_mode: false,
        task: Some(task),
    }
}

fn request_stop(cancel: &CancellationToken) {
    if !cancel.is_cancelled() {
        info!("stopping calling");
        cancel.cancel();
    }
}

fn force_quit() -> ! {
    let _ = terminal::disable_raw_mode();
    std::process::exit(FORCE_QUIT_EXIT_CODE);
}
