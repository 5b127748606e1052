use rondel_core::{HostExecutor, Macro};
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("command is empty")]
    Empty,
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runs macros through a shell without waiting for them.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: String,
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new("sh")
    }
}

impl ShellExecutor {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    /// Returns the pid of the detached child.
    pub fn spawn(&self, script: &str) -> Result<u32, ExecError> {
        let script = script.trim();
        if script.is_empty() {
            return Err(ExecError::Empty);
        }

        let child = Command::new(&self.shell)
            .arg("-c")
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ExecError::Spawn {
                command: script.to_string(),
                source,
            })?;
        Ok(child.id())
    }
}

impl HostExecutor for ShellExecutor {
    fn invoke(&self, command: &Macro) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let pid = self.spawn(&command.script)?;
        log::debug!("Spawned '{}' as pid {}", command.script, pid);
        Ok(())
    }
}
