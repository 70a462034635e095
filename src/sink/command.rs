use crate::error::{JanitorError, Result};
use crate::sink::DeletionSink;
use std::process::{Command, Stdio};
use tracing::{debug, info};

const ID_PLACEHOLDER: &str = "{id}";

/// Deletes by running an external program, e.g.
/// `gcloud storage rm gs://bucket/a.zip --quiet`.
#[derive(Debug, Clone)]
pub struct CommandSink {
    program: String,
    args: Vec<String>,
}

impl CommandSink {
    pub fn new<P: Into<String>>(program: P, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn render_args(&self, identifier: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace(ID_PLACEHOLDER, identifier))
            .collect()
    }

    pub fn command_line(&self, identifier: &str) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.render_args(identifier));
        parts.join(" ")
    }
}

impl DeletionSink for CommandSink {
    fn delete(&self, identifier: &str) -> Result<()> {
        debug!(command = %self.command_line(identifier), "running deletion command");

        let output = Command::new(&self.program)
            .args(self.render_args(identifier))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| JanitorError::ExternalCall {
                identifier: identifier.to_string(),
                message: format!("failed to start {}: {}", self.program, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("")
                .trim();
            return Err(JanitorError::ExternalCall {
                identifier: identifier.to_string(),
                message: if detail.is_empty() {
                    format!("{} exited with {}", self.program, output.status)
                } else {
                    format!("{} exited with {}: {}", self.program, output.status, detail)
                },
            });
        }

        Ok(())
    }

    fn describe(&self) -> String {
        self.program.clone()
    }
}

/// Reports what would be deleted without touching anything.
#[derive(Debug, Clone, Default)]
pub struct DryRunSink;

impl DeletionSink for DryRunSink {
    fn delete(&self, identifier: &str) -> Result<()> {
        info!(identifier, "dry run, skipping deletion");
        Ok(())
    }

    fn describe(&self) -> String {
        "dry-run".to_string()
    }
}
