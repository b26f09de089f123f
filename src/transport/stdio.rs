//! NDJSON transport over stdin/stdout.
//!
//! One JSON object per line in each direction. The transport is generic
//! over its reader and writer so tests can drive it with in-memory I/O.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::Mutex;

use super::{
    ClientMessage, DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_STDIO_BUFFER_SIZE, Result, ServerMessage,
    Transport, TransportType, env_or, sanitize_for_log,
};
use crate::error::TransportError;

/// Configuration for the stdio transport.
#[derive(Debug, Clone, Copy)]
pub struct StdioConfig {
    /// Maximum line length in bytes.
    pub max_message_size: usize,
    /// Read/write buffer size in bytes.
    pub buffer_size: usize,
}

impl StdioConfig {
    /// Loads configuration from environment variables with defaults.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `FOLIO_MAX_MESSAGE_SIZE` | 64 KB |
    /// | `FOLIO_STDIO_BUFFER_SIZE` | 16 KB |
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            max_message_size: env_or("FOLIO_MAX_MESSAGE_SIZE", DEFAULT_MAX_MESSAGE_SIZE),
            buffer_size: env_or("FOLIO_STDIO_BUFFER_SIZE", DEFAULT_STDIO_BUFFER_SIZE),
        }
    }
}

impl Default for StdioConfig {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            buffer_size: DEFAULT_STDIO_BUFFER_SIZE,
        }
    }
}

/// NDJSON transport.
///
/// Reader and writer sit behind separate async mutexes so receiving and
/// sending can overlap.
pub struct StdioTransport<R = tokio::io::Stdin, W = tokio::io::Stdout> {
    reader: Mutex<BufReader<R>>,
    writer: Mutex<BufWriter<W>>,
    config: StdioConfig,
}

impl StdioTransport {
    /// Creates a transport on the process stdin/stdout, configured from the
    /// environment.
    #[must_use]
    pub fn new() -> Self {
        Self::with_io(tokio::io::stdin(), tokio::io::stdout(), StdioConfig::from_env())
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, W> StdioTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Creates a transport over arbitrary async I/O.
    #[must_use]
    pub fn with_io(reader: R, writer: W, config: StdioConfig) -> Self {
        Self {
            reader: Mutex::new(BufReader::with_capacity(config.buffer_size, reader)),
            writer: Mutex::new(BufWriter::with_capacity(config.buffer_size, writer)),
            config,
        }
    }

    /// Reads one line of at most `max_message_size` bytes.
    ///
    /// Returns `Ok(None)` on EOF. An oversized line is drained up to its
    /// newline and reported as [`TransportError::MessageTooLarge`].
    #[allow(clippy::significant_drop_tightening)]
    async fn read_line(&self) -> Result<Option<Vec<u8>>> {
        let mut reader = self.reader.lock().await;
        let limit = self.config.max_message_size;
        let mut buf: Vec<u8> = Vec::new();
        let mut total = 0usize;

        loop {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                if total == 0 {
                    return Ok(None);
                }
                break;
            }

            let (chunk, consumed, done) = match available.iter().position(|&b| b == b'\n') {
                Some(pos) => (&available[..pos], pos + 1, true),
                None => (available, available.len(), false),
            };
            total += chunk.len();
            if total <= limit {
                buf.extend_from_slice(chunk);
            }
            reader.consume(consumed);
            if done {
                break;
            }
        }

        if total > limit {
            return Err(TransportError::MessageTooLarge { size: total, limit });
        }
        Ok(Some(buf))
    }
}

impl<R, W> std::fmt::Debug for StdioTransport<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdioTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl<R, W> Transport for StdioTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn send_message(&self, message: &ServerMessage) -> Result<()> {
        let serialized = serde_json::to_string(message)?;
        let mut writer = self.writer.lock().await;
        writer.write_all(serialized.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        drop(writer);
        Ok(())
    }

    async fn receive_message(&self) -> Result<Option<ClientMessage>> {
        loop {
            let Some(bytes) = self.read_line().await? else {
                return Ok(None);
            };
            let line = std::str::from_utf8(&bytes)
                .map_err(|e| TransportError::Protocol(format!("invalid UTF-8: {e}")))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            return serde_json::from_str::<ClientMessage>(trimmed)
                .map(Some)
                .map_err(|e| {
                    tracing::warn!(
                        error = %e,
                        line = %sanitize_for_log(trimmed, 200),
                        "invalid client message"
                    );
                    TransportError::Protocol(e.to_string())
                });
        }
    }

    fn transport_type(&self) -> TransportType {
        TransportType::Stdio
    }
}
