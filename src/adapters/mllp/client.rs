//! MLLP sender
//!
//! Acks are returned exactly as received, start and end bytes included. A
//! trailing CR that arrives in a later read than its end byte is still
//! waited for, up to [`TRAILER_GRACE`].

use super::codec::{frame, scan_frame, FrameScan, CARRIAGE_RETURN, DEFAULT_MAX_FRAME_BYTES};
use crate::domain::{MllpError, Result};
use bytes::{Buf, BytesMut};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// How long to wait for a CR that did not arrive with the end byte
pub const TRAILER_GRACE: Duration = Duration::from_millis(200);

/// Client for one remote MLLP listener
#[derive(Debug, Clone)]
pub struct MllpClient {
    address: String,
    connect_timeout: Duration,
    read_timeout: Duration,
    max_frame_bytes: usize,
}

impl MllpClient {
    /// Client for `host:port` with 10 s connect and 30 s read timeouts
    pub fn new(host: impl AsRef<str>, port: u16) -> Self {
        Self {
            address: format!("{}:{}", host.as_ref(), port),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }

    /// Override the connect and read timeouts
    pub fn with_timeouts(mut self, connect: Duration, read: Duration) -> Self {
        self.connect_timeout = connect;
        self.read_timeout = read;
        self
    }

    /// Override the maximum ack size
    pub fn with_max_frame_bytes(mut self, max_frame_bytes: usize) -> Self {
        self.max_frame_bytes = max_frame_bytes;
        self
    }

    /// Remote address
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Open a connection that can carry several messages
    pub async fn connect(&self) -> Result<MllpConnection> {
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.address))
            .await
            .map_err(|_| MllpError::Timeout(format!("connecting to {}", self.address)))?
            .map_err(|e| MllpError::ConnectionFailed(format!("{}: {}", self.address, e)))?;

        tracing::debug!(address = %self.address, "MLLP connection opened");
        Ok(MllpConnection {
            stream,
            buffer: BytesMut::with_capacity(4096),
            read_timeout: self.read_timeout,
            max_frame_bytes: self.max_frame_bytes,
        })
    }

    /// Send one message on a fresh connection and return the raw ack
    ///
    /// # Example
    ///
    /// ```no_run
    /// use hl7bridge::adapters::mllp::MllpClient;
    ///
    /// # async fn example() -> hl7bridge::domain::Result<()> {
    /// let client = MllpClient::new("127.0.0.1", 2575);
    /// let ack = client.send(b"MSH|^~\\&|APP|FAC|||20250130||ADT^A01|1|P|2.5\r").await?;
    /// println!("{}", String::from_utf8_lossy(&ack));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn send(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let mut connection = self.connect().await?;
        connection.send(payload).await
    }

    /// Send several messages over one connection, returning acks in order
    ///
    /// Stops at the first failure.
    pub async fn send_batch<S: AsRef<[u8]>>(&self, messages: &[S]) -> Result<Vec<Vec<u8>>> {
        let mut connection = self.connect().await?;
        let mut acks = Vec::with_capacity(messages.len());
        for message in messages {
            acks.push(connection.send(message.as_ref()).await?);
        }
        Ok(acks)
    }
}

/// Open client connection
#[derive(Debug)]
pub struct MllpConnection {
    stream: TcpStream,
    buffer: BytesMut,
    read_timeout: Duration,
    max_frame_bytes: usize,
}

impl MllpConnection {
    /// Send one framed message and wait for one reply frame
    pub async fn send(&mut self, payload: &[u8]) -> Result<Vec<u8>> {
        self.stream
            .write_all(&frame(payload))
            .await
            .map_err(MllpError::from)?;
        self.stream.flush().await.map_err(MllpError::from)?;
        self.read_reply().await
    }

    async fn read_reply(&mut self) -> Result<Vec<u8>> {
        loop {
            match scan_frame(&self.buffer) {
                FrameScan::Complete {
                    start,
                    end,
                    consumed,
                } => {
                    if consumed == end + 1
                        && consumed == self.buffer.len()
                        && self.read_trailer().await
                    {
                        continue;
                    }
                    let raw = self.buffer[start..consumed].to_vec();
                    self.buffer.advance(consumed);
                    return Ok(raw);
                }
                FrameScan::Partial { start } => {
                    self.buffer.advance(start);
                    if self.buffer.len() > self.max_frame_bytes + 1 {
                        return Err(MllpError::FrameTooLarge {
                            limit: self.max_frame_bytes,
                        }
                        .into());
                    }
                }
                FrameScan::NoStart => self.buffer.clear(),
            }

            let read = tokio::time::timeout(self.read_timeout, self.stream.read_buf(&mut self.buffer))
                .await
                .map_err(|_| MllpError::Timeout("waiting for acknowledgment".to_string()))?
                .map_err(MllpError::from)?;
            if read == 0 {
                return Err(MllpError::UnexpectedEof.into());
            }
        }
    }

    /// Briefly wait for the CR after an end byte; true when anything was read
    async fn read_trailer(&mut self) -> bool {
        match tokio::time::timeout(TRAILER_GRACE, self.stream.read_buf(&mut self.buffer)).await {
            Ok(Ok(read)) if read > 0 => {
                tracing::trace!(
                    trailer = self.buffer.last() == Some(&CARRIAGE_RETURN),
                    "Read after end byte"
                );
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn one_shot_server(reply: &'static [u8]) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 1024];
            let _ = socket.read(&mut buf).await.unwrap();
            // Reply in two writes to exercise reassembly
            let (head, tail) = reply.split_at(reply.len() / 2);
            socket.write_all(head).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            socket.write_all(tail).await.unwrap();
        });
        port
    }

    #[tokio::test]
    async fn test_send_returns_raw_ack() {
        let port = one_shot_server(b"\x0bMSH|^~\\&\rMSA|AA|1\r\x1c\r").await;
        let ack = MllpClient::new("127.0.0.1", port)
            .send(b"MSH|^~\\&|A\r")
            .await
            .unwrap();
        assert_eq!(ack, b"\x0bMSH|^~\\&\rMSA|AA|1\r\x1c\r".to_vec());
    }

    async fn chunked_server(chunks: &'static [&'static [u8]]) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 1024];
            let _ = socket.read(&mut buf).await.unwrap();
            for chunk in chunks {
                socket.write_all(chunk).await.unwrap();
                socket.flush().await.unwrap();
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        });
        port
    }

    #[tokio::test]
    async fn test_send_keeps_cr_split_from_end_byte() {
        let port = chunked_server(&[b"\x0bMSA|AA|1\r\x1c", b"\r"]).await;
        let ack = MllpClient::new("127.0.0.1", port)
            .send(b"MSH|^~\\&|A\r")
            .await
            .unwrap();
        assert_eq!(ack, b"\x0bMSA|AA|1\r\x1c\r".to_vec());
    }

    #[tokio::test]
    async fn test_send_accepts_frame_without_cr() {
        let port = chunked_server(&[b"\x0bMSA|AA|1\r\x1c"]).await;
        let ack = MllpClient::new("127.0.0.1", port)
            .send(b"MSH|^~\\&|A\r")
            .await
            .unwrap();
        assert_eq!(ack, b"\x0bMSA|AA|1\r\x1c".to_vec());
    }

    #[tokio::test]
    async fn test_send_times_out_without_reply() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
        });

        let client = MllpClient::new("127.0.0.1", port)
            .with_timeouts(Duration::from_secs(1), Duration::from_millis(100));
        let result = client.send(b"MSH|^~\\&|A\r").await;
        assert!(matches!(
            result,
            Err(crate::domain::BridgeError::Mllp(MllpError::Timeout(_)))
        ));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = MllpClient::new("127.0.0.1", port).send(b"x").await;
        assert!(matches!(
            result,
            Err(crate::domain::BridgeError::Mllp(MllpError::ConnectionFailed(_)))
        ));
    }
}
