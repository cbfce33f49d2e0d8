use std::io::Write;
use std::process::{Child, Command, ExitStatus, Stdio};

use tracing::debug;

use crate::clipboard::{ClipboardError, ClipboardSink};

/// Copies by piping text into the first external command that accepts it.
pub struct CommandClipboard {
    commands: Vec<String>,
}

impl CommandClipboard {
    pub fn new(commands: Vec<String>) -> Self {
        Self { commands }
    }

    fn run(command_line: &str, text: &str) -> Result<(), ClipboardError> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next().ok_or_else(|| ClipboardError::Command {
            command: command_line.to_string(),
            reason: "empty command".to_string(),
        })?;

        let child = Command::new(program)
            .args(parts)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        let status = ScopedChild::new(child).feed_and_wait(text)?;
        if status.success() {
            Ok(())
        } else {
            Err(ClipboardError::Command {
                command: command_line.to_string(),
                reason: format!("exited with {status}"),
            })
        }
    }
}

impl ClipboardSink for CommandClipboard {
    fn name(&self) -> &str {
        "copy-command"
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut last_error = None;
        for command_line in &self.commands {
            match Self::run(command_line, text) {
                Ok(()) => {
                    debug!(command = %command_line, "copied through external command");
                    return Ok(());
                }
                Err(err) => {
                    debug!(command = %command_line, %err, "copy command unavailable");
                    last_error = Some(err);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| ClipboardError::Unavailable("no copy command configured".to_string())))
    }
}

/// A copy process that is killed and reaped on every exit path that did not wait for it.
struct ScopedChild {
    child: Child,
    reaped: bool,
}

impl ScopedChild {
    fn new(child: Child) -> Self {
        Self { child, reaped: false }
    }

    fn feed_and_wait(mut self, text: &str) -> std::io::Result<ExitStatus> {
        {
            let mut stdin = self
                .child
                .stdin
                .take()
                .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::BrokenPipe, "copy command has no stdin"))?;
            // A tool that exits early closes the pipe; its exit status says whether it worked.
            if let Err(err) = stdin.write_all(text.as_bytes()) {
                if err.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(err);
                }
            }
        }
        let status = self.child.wait()?;
        self.reaped = true;
        Ok(status)
    }
}

impl Drop for ScopedChild {
    fn drop(&mut self) {
        if !self.reaped {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
