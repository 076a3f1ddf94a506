//! MySQL packet framing and the transport seam used during authentication.
//!
//! Every packet is `[length:3 LE][sequence:1][payload]`. A payload of
//! exactly 0xFFFFFF bytes continues in the next packet; the logical payload
//! ends with the first shorter packet.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::protocol::constants::{MAX_PACKET_PAYLOAD, PACKET_HEADER_SIZE};

/// Packet-level transport consumed by authentication plugins.
///
/// One call reads or writes one logical payload; framing and sequence ids
/// are the implementation's concern.
#[async_trait]
pub trait PacketChannel: Send {
    /// Read the next logical packet payload.
    async fn read_packet(&mut self) -> Result<Bytes>;

    /// Write one logical packet payload and flush it.
    async fn write_packet(&mut self, payload: &[u8]) -> Result<()>;

    /// Whether the link is encrypted (TLS or a local socket), allowing
    /// cleartext password exchange.
    fn is_secure(&self) -> bool {
        false
    }
}

/// Packet reader/writer over any tokio byte stream.
pub struct PacketStream<S> {
    stream: S,
    /// Sequence id expected on the next packet, read or written.
    sequence: u8,
    secure: bool,
    /// Partial buffer for incomplete packets.
    partial_buf: BytesMut,
}

impl<S> PacketStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Create a new packet stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            sequence: 0,
            secure: false,
            partial_buf: BytesMut::new(),
        }
    }

    /// Mark the stream as encrypted or local.
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Restart sequence numbering for a new command.
    pub fn reset_sequence(&mut self) {
        self.sequence = 0;
    }

    pub fn sequence(&self) -> u8 {
        self.sequence
    }

    /// Get a mutable reference to the underlying stream.
    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    async fn fill(&mut self, needed: usize) -> Result<()> {
        while self.partial_buf.len() < needed {
            let mut buf = [0u8; 4096];
            let n = self.stream.read(&mut buf).await?;
            if n == 0 {
                return Err(Error::ConnectionClosed);
            }
            self.partial_buf.extend_from_slice(&buf[..n]);
        }
        Ok(())
    }

    /// Read one physical packet, returning its payload.
    async fn read_frame(&mut self) -> Result<Bytes> {
        self.fill(PACKET_HEADER_SIZE).await?;
        let len = u32::from_le_bytes([
            self.partial_buf[0],
            self.partial_buf[1],
            self.partial_buf[2],
            0,
        ]) as usize;
        let seq = self.partial_buf[3];
        if seq != self.sequence {
            return Err(Error::protocol(format!(
                "Packet sequence mismatch: expected {}, got {}",
                self.sequence, seq
            )));
        }
        self.sequence = seq.wrapping_add(1);
        self.fill(PACKET_HEADER_SIZE + len).await?;
        let mut frame = self.partial_buf.split_to(PACKET_HEADER_SIZE + len);
        let payload = frame.split_off(PACKET_HEADER_SIZE).freeze();
        tracing::trace!(seq, len, "read packet");
        Ok(payload)
    }
}

#[async_trait]
impl<S> PacketChannel for PacketStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read_packet(&mut self) -> Result<Bytes> {
        let first = self.read_frame().await?;
        if first.len() < MAX_PACKET_PAYLOAD {
            return Ok(first);
        }
        let mut payload = BytesMut::from(&first[..]);
        loop {
            let next = self.read_frame().await?;
            payload.extend_from_slice(&next);
            if next.len() < MAX_PACKET_PAYLOAD {
                return Ok(payload.freeze());
            }
        }
    }

    async fn write_packet(&mut self, payload: &[u8]) -> Result<()> {
        let mut buf = Vec::with_capacity(payload.len() + PACKET_HEADER_SIZE);
        let mut chunks = payload.chunks(MAX_PACKET_PAYLOAD).peekable();
        if chunks.peek().is_none() {
            buf.extend_from_slice(&[0, 0, 0, self.sequence]);
            tracing::trace!(seq = self.sequence, len = 0, "write packet");
            self.sequence = self.sequence.wrapping_add(1);
        }
        while let Some(chunk) = chunks.next() {
            buf.extend_from_slice(&(chunk.len() as u32).to_le_bytes()[..3]);
            buf.push(self.sequence);
            buf.extend_from_slice(chunk);
            tracing::trace!(seq = self.sequence, len = chunk.len(), "write packet");
            self.sequence = self.sequence.wrapping_add(1);
            // a full-size final chunk is followed by an empty terminator
            if chunks.peek().is_none() && chunk.len() == MAX_PACKET_PAYLOAD {
                buf.extend_from_slice(&[0, 0, 0, self.sequence]);
                self.sequence = self.sequence.wrapping_add(1);
            }
        }
        self.stream.write_all(&buf).await?;
        self.stream.flush().await?;
        Ok(())
    }

    fn is_secure(&self) -> bool {
        self.secure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_read_and_write_track_sequence() {
        let mock = Builder::new()
            .read(&[3, 0, 0, 0, b'a', b'b', b'c'])
            .write(&[2, 0, 0, 1, b'o', b'k'])
            .build();
        let mut stream = PacketStream::new(mock);
        assert_eq!(&stream.read_packet().await.unwrap()[..], b"abc");
        stream.write_packet(b"ok").await.unwrap();
        assert_eq!(stream.sequence(), 2);
        assert!(!stream.is_secure());
    }

    #[tokio::test]
    async fn test_split_header_reads() {
        let mock = Builder::new()
            .read(&[1, 0])
            .read(&[0, 0])
            .read(&[0x2a])
            .build();
        let mut stream = PacketStream::new(mock);
        assert_eq!(&stream.read_packet().await.unwrap()[..], &[0x2a]);
    }

    #[tokio::test]
    async fn test_sequence_mismatch() {
        let mock = Builder::new().read(&[1, 0, 0, 5, 0]).build();
        let mut stream = PacketStream::new(mock);
        assert!(stream.read_packet().await.is_err());
    }

    #[tokio::test]
    async fn test_closed_stream() {
        let mock = Builder::new().read(&[1, 0]).build();
        let mut stream = PacketStream::new(mock);
        assert!(matches!(stream.read_packet().await, Err(Error::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_empty_payload() {
        let mock = Builder::new().write(&[0, 0, 0, 0]).build();
        let mut stream = PacketStream::new(mock).with_secure(true);
        stream.write_packet(&[]).await.unwrap();
        assert!(stream.is_secure());
    }
}
