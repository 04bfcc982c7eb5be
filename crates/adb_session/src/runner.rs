//! Subprocess runner for the adb binary
//!
//! Commands are built as explicit argument lists; nothing is ever joined
//! into a shell string and re-split, so space-containing arguments (text
//! payloads, file paths) keep their boundaries.

use crate::error::{AdbError, Result};
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Outcome of one adb invocation
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl CommandResult {
    /// stdout and stderr concatenated, for callers that match markers
    /// regardless of which stream adb printed them to.
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// Invokes the adb binary, optionally targeting one device serial
#[derive(Debug, Clone)]
pub struct AdbRunner {
    adb_path: String,
    serial: Option<String>,
}

impl AdbRunner {
    pub fn new(serial: Option<String>) -> Self {
        Self {
            adb_path: "adb".to_string(),
            serial,
        }
    }

    pub fn with_path(adb_path: String, serial: Option<String>) -> Self {
        Self { adb_path, serial }
    }

    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    /// Final argument list: `-s <serial>` is injected ahead of the
    /// subcommand when a serial is configured.
    pub fn build_args(&self, args: &[&str]) -> Vec<String> {
        let mut full = Vec::with_capacity(args.len() + 2);
        if let Some(serial) = &self.serial {
            full.push("-s".to_string());
            full.push(serial.clone());
        }
        full.extend(args.iter().map(|a| a.to_string()));
        full
    }

    /// Run adb with the given arguments, capturing output. A non-zero exit
    /// is reported in the result, not as an error; launch failures map to
    /// `Io` and an expired timeout to `Timeout`.
    pub async fn run(&self, args: &[&str], timeout: Option<Duration>) -> Result<CommandResult> {
        self.execute(self.build_args(args), timeout).await
    }

    /// Run adb without the `-s` selector. Server-level subcommands such as
    /// `connect` address the adb server, not a device.
    pub async fn run_global(&self, args: &[&str], timeout: Option<Duration>) -> Result<CommandResult> {
        self.execute(args.iter().map(|a| a.to_string()).collect(), timeout)
            .await
    }

    async fn execute(&self, full_args: Vec<String>, timeout: Option<Duration>) -> Result<CommandResult> {
        debug!("adb {}", full_args.join(" "));

        let mut cmd = Command::new(&self.adb_path);
        cmd.args(&full_args);

        let started = Instant::now();
        let output = match timeout {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .map_err(|_| {
                    AdbError::Timeout(format!(
                        "`{} {}` exceeded {:?}",
                        self.adb_path,
                        full_args.join(" "),
                        limit
                    ))
                })?
                .map_err(AdbError::Io)?,
            None => cmd.output().await.map_err(AdbError::Io)?,
        };

        Ok(CommandResult {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            elapsed: started.elapsed(),
        })
    }

    /// Like [`run`](Self::run) but a non-zero exit is an error.
    pub async fn run_checked(
        &self,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<CommandResult> {
        let result = self.run(args, timeout).await?;
        if !result.success {
            return Err(AdbError::Process {
                args: args.join(" "),
                code: result.code,
                stderr: result.stderr.trim().to_string(),
            });
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_injection() {
        let runner = AdbRunner::new(Some("localhost:5555".to_string()));
        let args = runner.build_args(&["shell", "input", "tap", "20", "30"]);
        assert_eq!(
            args,
            vec!["-s", "localhost:5555", "shell", "input", "tap", "20", "30"]
        );
    }

    #[test]
    fn test_no_serial_no_injection() {
        let runner = AdbRunner::new(None);
        let args = runner.build_args(&["connect", "localhost:5555"]);
        assert_eq!(args, vec!["connect", "localhost:5555"]);
    }

    #[test]
    fn test_argument_boundaries_preserved() {
        let runner = AdbRunner::new(Some("localhost:5555".to_string()));
        let args = runner.build_args(&["shell", "input", "text", "hello\\ big\\ world"]);
        // The payload must stay one argument no matter what it contains
        assert_eq!(args[5], "hello\\ big\\ world");
        assert_eq!(args.len(), 6);
    }

    #[tokio::test]
    async fn test_run_captures_output() {
        let runner = AdbRunner::with_path("echo".to_string(), None);
        let result = runner.run(&["hello world"], None).await.unwrap();
        assert!(result.success);
        assert_eq!(result.stdout.trim(), "hello world");
    }

    #[tokio::test]
    async fn test_run_checked_rejects_nonzero_exit() {
        let runner = AdbRunner::with_path("false".to_string(), None);
        let err = runner.run_checked(&[], None).await.unwrap_err();
        assert!(matches!(err, AdbError::Process { .. }));
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let runner = AdbRunner::with_path("sleep".to_string(), None);
        let err = runner
            .run(&["5"], Some(Duration::from_millis(50)))
            .await
            .unwrap_err();
        assert!(matches!(err, AdbError::Timeout(_)));
    }
}
