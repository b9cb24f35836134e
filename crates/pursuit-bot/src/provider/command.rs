use super::{ProviderError, ReasoningProvider};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{Level, event};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandProviderOptions {
    pub command: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    /// Environment variable holding the provider's credential.
    pub credential_env: Option<String>,
    pub timeout: Duration,
}

/// Runs an executable per decision: the prompt goes to stdin, the decision
/// is read from stdout.
pub struct CommandProvider {
    name: String,
    options: CommandProviderOptions,
}

impl CommandProvider {
    pub fn new(name: impl Into<String>, options: CommandProviderOptions) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }

    pub fn options(&self) -> &CommandProviderOptions {
        &self.options
    }

    fn credential_present(&self) -> bool {
        match &self.options.credential_env {
            Some(key) => std::env::var(key)
                .map(|value| !value.trim().is_empty())
                .unwrap_or(false),
            None => true,
        }
    }

    fn timed_out(&self) -> ProviderError {
        ProviderError::Timeout(self.options.timeout.as_millis() as u64)
    }

    fn wait_with_deadline(&self, child: &mut Child, deadline: Instant) -> Result<(), ProviderError> {
        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => return Ok(()),
                Ok(Some(status)) => return Err(ProviderError::Status(status.to_string())),
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(self.timed_out());
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(err) => return Err(ProviderError::Io(err.to_string())),
            }
        }
    }
}

impl ReasoningProvider for CommandProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_configured(&self) -> bool {
        !self.options.command.trim().is_empty() && self.credential_present()
    }

    fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured(self.name.clone()));
        }

        let mut cmd = Command::new(&self.options.command);
        cmd.args(&self.options.args);
        if let Some(dir) = &self.options.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        let start = Instant::now();
        let deadline = start + self.options.timeout;
        let mut child = cmd
            .spawn()
            .map_err(|err| ProviderError::Spawn(err.to_string()))?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProviderError::Io("stdout".into()))?;
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buffer = String::new();
            let _ = tx.send(stdout.read_to_string(&mut buffer).map(|_| buffer));
        });

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ProviderError::Io("stdin".into()))?;
        let input = format!("{prompt}\n");
        // A process that exits without reading its input is judged by its output.
        thread::spawn(move || {
            let _ = stdin.write_all(input.as_bytes());
        });

        self.wait_with_deadline(&mut child, deadline)?;

        // Descendants of the command may keep stdout open after it exits.
        let remaining = deadline.saturating_duration_since(Instant::now());
        let output = match rx.recv_timeout(remaining) {
            Ok(read) => read.map_err(|err| ProviderError::Io(err.to_string()))?,
            Err(RecvTimeoutError::Timeout) => return Err(self.timed_out()),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(ProviderError::Io("stdout reader stopped".into()));
            }
        };

        event!(
            target: "pursuit_bot::provider",
            Level::DEBUG,
            provider = %self.name,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            bytes = output.len(),
            "provider responded"
        );
        Ok(output)
    }
}
