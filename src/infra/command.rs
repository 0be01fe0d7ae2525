//! # Command Execution Module / 命令执行模块
//!
//! Spawns a child process and captures its output streams.
//!
//! 派生子进程并捕获其输出流。

use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tracing::warn;

/// Everything a finished (or failed) child process printed.
/// 已结束（或失败）的子进程输出的所有内容。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Spawns a command and captures its stdout and stderr.
/// Both streams are read concurrently, as raw bytes, each into its own buffer.
///
/// # Arguments
/// * `cmd` - The `tokio::process::Command` to execute.
///
/// # Returns
/// A tuple containing:
/// - The `ExitStatus` of the process wrapped in an `io::Result`.
/// - Whatever was captured before the process exited, even if waiting failed.
///
/// 派生一个命令，捕获其 stdout 和 stderr。
/// 两个流以原始字节被并发读取，各自写入独立的缓冲区。
pub async fn spawn_and_capture(
    mut cmd: tokio::process::Command,
) -> (std::io::Result<ExitStatus>, CapturedOutput) {
    let mut child = match cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => return (Err(e), CapturedOutput::default()),
    };

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return (
            Err(std::io::Error::other("failed to capture the output streams")),
            CapturedOutput::default(),
        );
    };

    let stdout_handle = read_to_end(stdout);
    let stderr_handle = read_to_end(stderr);

    let status = child.wait().await;

    // Drain both readers so nothing printed right before exit is lost.
    let output = CapturedOutput {
        stdout: join_reader(stdout_handle, "stdout").await,
        stderr: join_reader(stderr_handle, "stderr").await,
    };
    (status, output)
}

/// Reads `stream` until it closes. Bytes are kept exactly as written; only
/// invalid UTF-8 is replaced when the buffer is decoded.
fn read_to_end<R>(mut stream: R) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buffer = Vec::new();
        if let Err(e) = stream.read_to_end(&mut buffer).await {
            warn!(error = %e, captured = buffer.len(), "output stream ended with an error");
        }
        buffer
    })
}

async fn join_reader(handle: JoinHandle<Vec<u8>>, stream: &str) -> String {
    match handle.await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!(error = %e, stream, "failed to join output reader");
            String::new()
        }
    }
}
