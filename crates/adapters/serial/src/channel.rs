//! Newline framing over any async byte stream.

use std::collections::VecDeque;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use roomwatch_app::ports::LinkConnection;
use roomwatch_domain::error::LinkError;

use crate::error::SerialError;

/// Longest accepted line, delimiter excluded.
pub const MAX_LINE_BYTES: usize = 4096;

/// A line-oriented connection over a byte stream.
///
/// Partial lines survive a cancelled [`read_line`](LinkConnection::read_line):
/// bytes already read stay in the internal buffer.
pub struct LineChannel<S> {
    stream: BufReader<S>,
    partial: Vec<u8>,
    ready: VecDeque<Vec<u8>>,
}

impl<S> LineChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream: BufReader::new(stream),
            partial: Vec::new(),
            ready: VecDeque::new(),
        }
    }

    /// Send a request and wait for the first non-empty reply line.
    ///
    /// The reply is kept and handed out by the next `read_line`.
    pub(crate) async fn handshake(&mut self, request: &[u8]) -> Result<(), LinkError> {
        self.write_all(request).await?;
        let reply = self.next_line().await?;
        tracing::debug!(reply = %String::from_utf8_lossy(&reply), "device answered handshake");
        self.ready.push_back(reply);
        Ok(())
    }

    async fn next_line(&mut self) -> Result<Vec<u8>, SerialError> {
        loop {
            let available = self.stream.fill_buf().await.map_err(SerialError::Io)?;
            if available.is_empty() {
                return Err(SerialError::Closed);
            }
            let (chunk, complete) = match available.iter().position(|byte| *byte == b'\n') {
                Some(at) => (&available[..=at], true),
                None => (available, false),
            };
            let taken = chunk.len();
            let overflow = self.partial.len() + taken - usize::from(complete) > MAX_LINE_BYTES;
            if !overflow {
                self.partial.extend_from_slice(chunk);
            }
            self.stream.consume(taken);
            if overflow {
                self.partial.clear();
                return Err(SerialError::LineTooLong {
                    limit: MAX_LINE_BYTES,
                });
            }
            if !complete {
                continue;
            }

            let mut line = std::mem::take(&mut self.partial);
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if !line.trim_ascii().is_empty() {
                return Ok(line);
            }
        }
    }

    async fn write_all(&mut self, line: &[u8]) -> Result<(), SerialError> {
        let stream = self.stream.get_mut();
        stream.write_all(line).await.map_err(SerialError::Io)?;
        stream.flush().await.map_err(SerialError::Io)
    }
}

impl<S> LinkConnection for LineChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn read_line(&mut self) -> Result<Vec<u8>, LinkError> {
        if let Some(line) = self.ready.pop_front() {
            return Ok(line);
        }
        Ok(self.next_line().await?)
    }

    async fn write_line(&mut self, line: &[u8]) -> Result<(), LinkError> {
        Ok(self.write_all(line).await?)
    }
}
