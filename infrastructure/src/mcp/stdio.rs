//! Stdio transport: the MCP server runs as a child process.
//!
//! Messages are newline-delimited JSON on the child's stdin/stdout; the
//! child's stderr is inherited so server diagnostics reach the terminal.

use crate::config::StdioSettings;
use crate::mcp::error::{McpError, Result};
use crate::mcp::protocol::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use crate::mcp::transport::{McpTransport, PendingResponses};
use async_trait::async_trait;
use serde::Serialize;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

type SharedWriter = Arc<Mutex<BufWriter<ChildStdin>>>;

/// Child-process MCP connection
pub struct StdioTransport {
    writer: SharedWriter,
    pending: PendingResponses,
    reader_handle: JoinHandle<()>,
    /// Killed on close and on Drop to prevent orphans.
    child: std::sync::Mutex<Child>,
    open: Arc<AtomicBool>,
    read_timeout: Duration,
}

impl StdioTransport {
    /// Spawn the server process and start the background reader.
    pub async fn spawn(settings: &StdioSettings, read_timeout: Duration) -> Result<Self> {
        debug!(
            "Spawning MCP server: {} {}",
            settings.command,
            settings.args.join(" ")
        );

        let mut cmd = Command::new(&settings.command);
        cmd.args(&settings.args)
            .envs(&settings.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        // Linux: request kernel to send SIGTERM to child when parent dies.
        // This catches cases where Drop doesn't run (SIGKILL, OOM kill).
        #[cfg(target_os = "linux")]
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        let mut child = cmd.spawn().map_err(McpError::Spawn)?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.start_kill();
                return Err(McpError::Spawn(std::io::Error::other(
                    "Failed to capture child stdio",
                )));
            }
        };

        let writer: SharedWriter = Arc::new(Mutex::new(BufWriter::new(stdin)));
        let pending = PendingResponses::default();
        let open = Arc::new(AtomicBool::new(true));

        let reader_handle = tokio::spawn(Self::reader_loop(
            stdout,
            pending.clone(),
            Arc::clone(&writer),
            Arc::clone(&open),
        ));

        info!("MCP server process started (pid {:?})", child.id());

        Ok(Self {
            writer,
            pending,
            reader_handle,
            child: std::sync::Mutex::new(child),
            open,
            read_timeout,
        })
    }

    /// Background reader loop: single owner of the child's stdout.
    async fn reader_loop(
        stdout: ChildStdout,
        pending: PendingResponses,
        writer: SharedWriter,
        open: Arc<AtomicBool>,
    ) {
        let mut lines = BufReader::new(stdout).lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if let Some(reply) = pending.route(line)
                        && let Err(e) = write_line(&writer, &reply).await
                    {
                        warn!("MCP stdio: failed to answer server request: {}", e);
                    }
                }
                Ok(None) => {
                    info!("MCP stdio: server closed its output");
                    break;
                }
                Err(e) => {
                    warn!("MCP stdio: read error: {}", e);
                    break;
                }
            }
        }

        // Reader ended: drop all senders so waiting requests fail fast
        open.store(false, Ordering::SeqCst);
        pending.close();
    }
}

async fn write_line<T: Serialize>(writer: &SharedWriter, message: &T) -> Result<()> {
    let mut json = serde_json::to_string(message)?;
    trace!("MCP sending: {}", json);
    json.push('\n');

    let mut writer = writer.lock().await;
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

#[async_trait]
impl McpTransport for StdioTransport {
    async fn request(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
        if !self.is_open() {
            return Err(McpError::TransportClosed);
        }

        let id = request.id;
        let rx = self.pending.register(id)?;
        if let Err(e) = write_line(&self.writer, &request).await {
            self.pending.remove(id);
            return Err(e);
        }

        self.pending.wait(id, rx, self.read_timeout).await
    }

    async fn notify(&self, notification: JsonRpcNotification) -> Result<()> {
        if !self.is_open() {
            return Err(McpError::TransportClosed);
        }
        write_line(&self.writer, &notification).await
    }

    async fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
        self.reader_handle.abort();
        self.pending.close();

        let mut child = self.child.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = child.start_kill() {
            debug!("MCP stdio: kill failed (process already exited?): {}", e);
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

impl Drop for StdioTransport {
    fn drop(&mut self) {
        self.reader_handle.abort();
        let child = self.child.get_mut().unwrap_or_else(|e| e.into_inner());
        let _ = child.start_kill();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::mcp::protocol::JsonRpcRequest;
    use std::collections::BTreeMap;

    fn shell(script: &str) -> StdioSettings {
        StdioSettings {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            env: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_request_round_trip_through_child() {
        // Echo server: answers every request line with an empty result for its id.
        let script = r#"while read line; do
            id=$(echo "$line" | sed -n 's/.*"id":\([0-9]*\).*/\1/p')
            echo "{\"jsonrpc\":\"2.0\",\"id\":$id,\"result\":{\"ok\":true}}"
        done"#;
        let transport = StdioTransport::spawn(&shell(script), Duration::from_secs(5))
            .await
            .unwrap();

        let response = transport
            .request(JsonRpcRequest::new("tools/list", None))
            .await
            .unwrap();
        assert_eq!(response.result.unwrap()["ok"], true);

        transport.close().await;
        assert!(!transport.is_open());
    }

    #[tokio::test]
    async fn test_child_exit_closes_transport() {
        let transport = StdioTransport::spawn(&shell("exit 0"), Duration::from_secs(5))
            .await
            .unwrap();

        let result = transport
            .request(JsonRpcRequest::new("initialize", None))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_command_fails_to_spawn() {
        let settings = StdioSettings {
            command: "definitely-not-a-real-mcp-server".to_string(),
            args: Vec::new(),
            env: BTreeMap::new(),
        };
        let err = StdioTransport::spawn(&settings, Duration::from_secs(1))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, McpError::Spawn(_)));
    }
}
