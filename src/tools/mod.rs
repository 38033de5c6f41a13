//! External tool invocation.
//!
//! All subprocess use goes through [`ToolRunner`]: argument-vector spawning
//! (never a shell string), a per-invocation timeout, and a semaphore bounding
//! how many child processes run at once across all requests.

mod ffmpeg;
mod ytdlp;

pub use ffmpeg::{pitch_filter, Ffmpeg};
pub use ytdlp::{DownloadMetadata, TrackCandidate, YtDlp};

use crate::config::ToolSettings;
use crate::error::{Result, SalvadorError};
use std::process::Output;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::debug;

/// Shared subprocess runner.
#[derive(Debug)]
pub struct ToolRunner {
    ytdlp_bin: String,
    ffmpeg_bin: String,
    timeout: Duration,
    permits: Semaphore,
}

impl ToolRunner {
    pub fn new(settings: &ToolSettings) -> Arc<Self> {
        Arc::new(Self {
            ytdlp_bin: settings.ytdlp_bin.clone(),
            ffmpeg_bin: settings.ffmpeg_bin.clone(),
            timeout: Duration::from_secs(settings.tool_timeout_seconds),
            permits: Semaphore::new(settings.max_concurrent_tools.max(1)),
        })
    }

    pub fn ytdlp_bin(&self) -> &str {
        &self.ytdlp_bin
    }

    pub fn ffmpeg_bin(&self) -> &str {
        &self.ffmpeg_bin
    }

    /// Run a command to completion, capturing stdout and stderr.
    ///
    /// Non-zero exit becomes a [`SalvadorError::Tool`] carrying stderr; a
    /// missing binary becomes [`SalvadorError::ToolNotFound`]; exceeding the
    /// configured timeout kills the child and becomes a `Tool` error.
    pub async fn run(&self, tool: &str, mut cmd: Command) -> Result<Output> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| SalvadorError::Tool(format!("{tool}: runner shut down")))?;

        debug!("Running {:?}", cmd.as_std());
        cmd.kill_on_drop(true);

        let result = tokio::time::timeout(self.timeout, cmd.output()).await;

        let output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SalvadorError::ToolNotFound(tool.to_string()));
            }
            Ok(Err(e)) => {
                return Err(SalvadorError::Tool(format!("{tool} execution failed: {e}")));
            }
            Err(_) => {
                return Err(SalvadorError::Tool(format!(
                    "{tool} timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SalvadorError::Tool(format!("{tool} failed: {stderr}")));
        }

        Ok(output)
    }

    /// Run a command that reads its input from stdin.
    ///
    /// The whole input is written before waiting; same exit-status and
    /// timeout handling as [`run`](Self::run).
    pub async fn run_with_stdin(
        &self,
        tool: &str,
        mut cmd: Command,
        input: &[u8],
    ) -> Result<Output> {
        use tokio::io::AsyncWriteExt;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| SalvadorError::Tool(format!("{tool}: runner shut down")))?;

        debug!("Running {:?} with {} bytes on stdin", cmd.as_std(), input.len());
        cmd.stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);

        let spawned = cmd.spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SalvadorError::ToolNotFound(tool.to_string()));
            }
            Err(e) => {
                return Err(SalvadorError::Tool(format!("{tool} spawn failed: {e}")));
            }
        };

        let wait = async {
            // The child must write its output to a file, not stdout: the
            // whole input is written before either pipe is drained, and a
            // child filling the stdout pipe meanwhile would stall until the
            // timeout fires.
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(input).await?;
                stdin.shutdown().await?;
                drop(stdin);
            }
            child.wait_with_output().await
        };

        let output = match tokio::time::timeout(self.timeout, wait).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(SalvadorError::Tool(format!("{tool} execution failed: {e}")));
            }
            Err(_) => {
                return Err(SalvadorError::Tool(format!(
                    "{tool} timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SalvadorError::Tool(format!("{tool} failed: {stderr}")));
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolSettings;

    fn runner_with_timeout(secs: u64) -> Arc<ToolRunner> {
        let settings = ToolSettings {
            tool_timeout_seconds: secs,
            ..ToolSettings::default()
        };
        ToolRunner::new(&settings)
    }

    #[tokio::test]
    async fn test_missing_binary_is_tool_not_found() {
        let runner = runner_with_timeout(5);
        let cmd = Command::new("salvador-no-such-binary");
        let err = runner.run("salvador-no-such-binary", cmd).await.unwrap_err();
        assert!(matches!(err, SalvadorError::ToolNotFound(_)));
    }

    #[tokio::test]
    async fn test_nonzero_exit_carries_stderr() {
        let runner = runner_with_timeout(5);
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo boom >&2; exit 3");
        let err = runner.run("sh", cmd).await.unwrap_err();
        match err {
            SalvadorError::Tool(msg) => assert!(msg.contains("boom")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_tool_error() {
        let runner = runner_with_timeout(1);
        let mut cmd = Command::new("sleep");
        cmd.arg("10");
        let err = runner.run("sleep", cmd).await.unwrap_err();
        match err {
            SalvadorError::Tool(msg) => assert!(msg.contains("timed out")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stdin_round_trip() {
        let runner = runner_with_timeout(5);
        let cmd = Command::new("cat");
        let output = runner.run_with_stdin("cat", cmd, b"hello").await.unwrap();
        assert_eq!(output.stdout, b"hello");
    }
}
