use crate::config::CONFIG;
use crate::error::SerialError;

use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};

const CHUNK_SIZE: usize = 256;

/// Reassembles newline-delimited records from a raw byte stream.
///
/// Partial lines at buffer boundaries are carried over, never emitted
/// truncated. Invalid byte sequences are replaced, not fatal.
pub struct LineReader<R> {
    reader: R,
    buffer: Vec<u8>,
    timeout: Duration,
}

impl<R> LineReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self::with_timeout(reader, CONFIG.read_timeout())
    }

    pub fn with_timeout(reader: R, timeout: Duration) -> Self {
        LineReader {
            reader,
            buffer: Vec::new(),
            timeout,
        }
    }

    /// `Ok(None)` means no byte arrived within the read timeout, which lets
    /// the caller re-evaluate liveness instead of blocking forever.
    pub async fn next_line(&mut self) -> Result<Option<String>, SerialError> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
                let mut raw: Vec<u8> = self.buffer.drain(..=pos).collect();
                raw.pop();
                if raw.last() == Some(&b'\r') {
                    raw.pop();
                }
                return Ok(Some(String::from_utf8_lossy(&raw).into_owned()));
            }

            let mut chunk = [0u8; CHUNK_SIZE];
            match tokio::time::timeout(self.timeout, self.reader.read(&mut chunk)).await {
                Err(_) => return Ok(None),
                Ok(Ok(0)) => return Err(SerialError::Eof),
                Ok(Ok(n)) => self.buffer.extend_from_slice(&chunk[..n]),
                Ok(Err(e)) => return Err(SerialError::Io(e)),
            }
        }
    }
}
