//! Shared integration-test harness for running `folio` as a child process.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

/// Default timeout for reading a single message from the process.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Path to the compiled `folio` binary.
#[must_use]
pub fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_folio")
}

/// Returns the path to a test fixture.
#[must_use]
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Runs `folio` with `args` to completion and captures its output.
#[allow(clippy::missing_panics_doc)]
pub fn spawn_command(args: &[&str]) -> Output {
    std::process::Command::new(bin())
        .args(args)
        .env_remove("FOLIO_CONFIG")
        .env_remove("FOLIO_BIND")
        .stdin(Stdio::null())
        .output()
        .expect("failed to run folio")
}

// ============================================================================
// Stdio session
// ============================================================================

/// A running `folio session` process with helpers for NDJSON I/O.
///
/// The child process is killed on drop via `kill_on_drop(true)`.
pub struct SessionProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    reader: BufReader<ChildStdout>,
}

impl SessionProcess {
    /// Spawns `folio session` on the given site file.
    #[allow(clippy::missing_panics_doc)]
    pub fn spawn(config: &str, typewriter: bool) -> Self {
        let config = fixture_path(config);
        let mut args = vec![
            "--quiet".to_string(),
            "session".to_string(),
            "--config".to_string(),
            config.display().to_string(),
        ];
        if !typewriter {
            args.push("--no-typewriter".to_string());
        }

        let mut child = Command::new(bin())
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .expect("failed to spawn folio");

        let stdin = child.stdin.take().expect("stdin not captured");
        let stdout = child.stdout.take().expect("stdout not captured");

        Self {
            child,
            stdin: Some(stdin),
            reader: BufReader::new(stdout),
        }
    }

    /// Writes one raw line to the session's stdin.
    #[allow(clippy::missing_panics_doc)]
    pub async fn send_line(&mut self, line: &str) {
        let stdin = self.stdin.as_mut().expect("stdin already closed");
        let mut buf = line.to_string();
        buf.push('\n');
        stdin
            .write_all(buf.as_bytes())
            .await
            .expect("failed to write to stdin");
        stdin.flush().await.expect("failed to flush stdin");
    }

    /// Serializes and sends one client message.
    pub async fn send(&mut self, message: &Value) {
        self.send_line(&message.to_string()).await;
    }

    /// Reads one NDJSON message from stdout.
    ///
    /// Panics on EOF, I/O error, or if no message arrives within `timeout`.
    #[allow(clippy::missing_panics_doc)]
    pub async fn read_message(&mut self, timeout: Duration) -> Value {
        let mut line = String::new();
        let result = tokio::time::timeout(timeout, async {
            loop {
                line.clear();
                let n = self
                    .reader
                    .read_line(&mut line)
                    .await
                    .expect("read_line I/O error");
                assert!(n > 0, "unexpected EOF from session");
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    return serde_json::from_str::<Value>(trimmed).unwrap_or_else(|e| {
                        panic!("invalid JSON from session: {e}\nline: {line}")
                    });
                }
            }
        })
        .await;
        result.expect("timed out waiting for message from session")
    }

    /// Reads messages until one with the given `type` arrives, skipping
    /// others.
    pub async fn expect_type(&mut self, kind: &str) -> Value {
        loop {
            let msg = self.read_message(DEFAULT_TIMEOUT).await;
            if msg["type"] == kind {
                return msg;
            }
        }
    }

    /// Sends a message and returns the next `state` reply.
    pub async fn send_and_expect_state(&mut self, message: &Value) -> Value {
        self.send(message).await;
        self.expect_type("state").await
    }

    /// Closes stdin to signal EOF.
    pub fn close_stdin(&mut self) {
        self.stdin = None;
    }

    /// Waits for the process to exit and returns its exit code.
    #[allow(clippy::missing_panics_doc)]
    pub async fn wait(mut self) -> Option<i32> {
        // Drain remaining output so the child never blocks on a full pipe.
        let mut rest = Vec::new();
        let _ = tokio::time::timeout(DEFAULT_TIMEOUT, self.reader.read_to_end(&mut rest)).await;
        let status = tokio::time::timeout(DEFAULT_TIMEOUT, self.child.wait())
            .await
            .expect("session did not exit in time")
            .expect("failed to wait for session");
        status.code()
    }
}

// ============================================================================
// HTTP server
// ============================================================================

/// A running `folio serve` process on an ephemeral port.
pub struct ServeProcess {
    child: Child,
    /// Base URL, e.g. `http://127.0.0.1:41234`.
    pub base_url: String,
    /// Client for requests against the server.
    pub client: reqwest::Client,
}

impl ServeProcess {
    /// Spawns `folio serve` on the given site file.
    ///
    /// Reads stderr until the "serving ... on http://ADDR" line to discover
    /// the port, then keeps draining stderr in the background.
    #[allow(clippy::missing_panics_doc)]
    pub async fn start(config: &str) -> Self {
        let config = fixture_path(config);
        let mut child = Command::new(bin())
            .args([
                "--quiet",
                "serve",
                "--config",
                config.to_str().expect("non-UTF-8 config path"),
                "--bind",
                "127.0.0.1:0",
            ])
            .env_remove("FOLIO_EVENTS_FILE")
            .env_remove("FOLIO_METRICS_PORT")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .expect("failed to spawn folio");

        let stderr = child.stderr.take().expect("stderr not captured");
        let mut reader = BufReader::new(stderr);
        let mut line = String::new();

        let base_url = loop {
            line.clear();
            let n = tokio::time::timeout(Duration::from_secs(10), reader.read_line(&mut line))
                .await
                .expect("timed out waiting for HTTP server startup")
                .expect("failed to read stderr");
            assert!(n > 0, "server exited before printing its address");

            if let Some(start) = line.find("http://") {
                break line[start..].trim().to_string();
            }
        };

        tokio::spawn(async move {
            let mut sink = Vec::new();
            let _ = reader.read_to_end(&mut sink).await;
        });

        Self {
            child,
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Joins `path` onto the base URL.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Kills the server.
    pub async fn shutdown(mut self) {
        let _ = self.child.kill().await;
    }
}
