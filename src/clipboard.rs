//! Copying text out of the terminal.
//!
//! OSC 52 asks the terminal itself to set the clipboard, which also works over
//! SSH. When stdout is not a terminal the platform copy command is tried.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use crossterm::execute;
use crossterm::style::Print;
use std::io::{IsTerminal, Write};
use std::process::{Command, Stdio};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("stdout is not a terminal")]
    NotATerminal,
    #[error("no clipboard command available")]
    NoCommand,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Copies may block on a child process; call them off the async runtime.
pub trait ClipboardProvider: Send + Sync {
    fn copy(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Run `clipboard.copy` on the blocking pool.
pub async fn copy_off_thread(
    clipboard: Arc<dyn ClipboardProvider>,
    text: String,
) -> Result<(), ClipboardError> {
    tokio::task::spawn_blocking(move || clipboard.copy(&text))
        .await
        .unwrap_or_else(|e| {
            Err(ClipboardError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                e.to_string(),
            )))
        })
}

pub fn osc52_sequence(text: &str) -> String {
    let encoded = STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x07")
}

/// Terminal clipboard via the OSC 52 escape
#[derive(Clone, Copy, Debug, Default)]
pub struct Osc52Clipboard;

impl ClipboardProvider for Osc52Clipboard {
    fn copy(&self, text: &str) -> Result<(), ClipboardError> {
        let mut stdout = std::io::stdout();
        if !stdout.is_terminal() {
            return Err(ClipboardError::NotATerminal);
        }
        execute!(stdout, Print(osc52_sequence(text)))?;
        stdout.flush()?;
        Ok(())
    }
}

/// Pipes text into the first copy command that runs successfully.
#[derive(Clone, Debug)]
pub struct CommandClipboard {
    candidates: Vec<(&'static str, Vec<&'static str>)>,
}

impl Default for CommandClipboard {
    fn default() -> Self {
        CommandClipboard {
            candidates: vec![
                ("pbcopy", vec![]),
                ("wl-copy", vec![]),
                ("xclip", vec!["-selection", "clipboard"]),
            ],
        }
    }
}

impl CommandClipboard {
    fn run(program: &str, args: &[&str], text: &str) -> Result<bool, ClipboardError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
        }
        Ok(child.wait()?.success())
    }
}

impl ClipboardProvider for CommandClipboard {
    fn copy(&self, text: &str) -> Result<(), ClipboardError> {
        for (program, args) in &self.candidates {
            match Self::run(program, args, text) {
                Ok(true) => return Ok(()),
                Ok(false) => tracing::debug!(program, "Clipboard command exited with failure"),
                Err(e) => tracing::debug!(program, error = %e, "Clipboard command unavailable"),
            }
        }
        Err(ClipboardError::NoCommand)
    }
}

/// Tries `primary`, then `fallback`.
pub struct FallbackClipboard {
    primary: Box<dyn ClipboardProvider>,
    fallback: Box<dyn ClipboardProvider>,
}

impl FallbackClipboard {
    pub fn new(primary: Box<dyn ClipboardProvider>, fallback: Box<dyn ClipboardProvider>) -> Self {
        FallbackClipboard { primary, fallback }
    }
}

impl Default for FallbackClipboard {
    fn default() -> Self {
        FallbackClipboard::new(Box::new(Osc52Clipboard), Box::new(CommandClipboard::default()))
    }
}

impl ClipboardProvider for FallbackClipboard {
    fn copy(&self, text: &str) -> Result<(), ClipboardError> {
        match self.primary.copy(text) {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::debug!(error = %e, "Primary clipboard failed, trying fallback");
                self.fallback.copy(text)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records copied text; optionally fails every copy.
    #[derive(Clone, Default)]
    pub struct RecordingClipboard {
        pub copied: Arc<Mutex<Vec<String>>>,
        pub fail: bool,
    }

    impl ClipboardProvider for RecordingClipboard {
        fn copy(&self, text: &str) -> Result<(), ClipboardError> {
            if self.fail {
                return Err(ClipboardError::NoCommand);
            }
            self.copied.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }
}
