//! IPC transport implementations

use async_trait::async_trait;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::error::IpcError;
use crate::protocol::{MessageEnvelope, IPC_PROTOCOL_VERSION};

/// IPC transport trait for different communication mechanisms
#[async_trait]
pub trait IpcTransport: Send + Sync {
    /// Send a message to the other end
    async fn send<T: Serialize + Send + Sync>(
        &mut self,
        message: &MessageEnvelope<T>,
    ) -> Result<(), IpcError>;

    /// Receive a message from the other end
    async fn receive<T: for<'de> Deserialize<'de> + Send>(
        &mut self,
    ) -> Result<MessageEnvelope<T>, IpcError>;

    /// Close the transport
    async fn close(&mut self) -> Result<(), IpcError>;
}

/// Serialise an envelope as one newline-terminated JSON line
pub fn encode_line<T: Serialize>(message: &MessageEnvelope<T>) -> Result<String, IpcError> {
    let json =
        serde_json::to_string(message).map_err(|e| IpcError::SerializationError(e.to_string()))?;
    Ok(format!("{}\n", json))
}

/// Decode one received line, rejecting incompatible protocol versions
pub fn decode_line<T: for<'de> Deserialize<'de>>(
    line: &str,
) -> Result<MessageEnvelope<T>, IpcError> {
    let envelope: MessageEnvelope<T> = serde_json::from_str(line.trim_end())
        .map_err(|e| IpcError::DeserializationError(e.to_string()))?;

    if envelope.protocol_version != IPC_PROTOCOL_VERSION {
        return Err(IpcError::ProtocolVersionMismatch {
            expected: IPC_PROTOCOL_VERSION,
            actual: envelope.protocol_version,
        });
    }

    Ok(envelope)
}

/// Newline-delimited JSON over a TCP connection.
///
/// The read half keeps its buffer across calls so that several messages
/// arriving in one segment are delivered one at a time.
pub struct TcpTransport {
    peer: SocketAddr,
    reader: BufReader<OwnedReadHalf>,
    writer: Option<OwnedWriteHalf>,
}

impl TcpTransport {
    /// Wrap an established stream
    pub fn new(stream: TcpStream) -> Result<Self, IpcError> {
        let peer = stream.peer_addr()?;
        stream.set_nodelay(true)?;
        let (read_half, write_half) = stream.into_split();

        Ok(Self {
            peer,
            reader: BufReader::new(read_half),
            writer: Some(write_half),
        })
    }

    /// Open a connection to a remote endpoint
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, IpcError> {
        let stream = TcpStream::connect(addr).await?;
        let transport = Self::new(stream)?;
        debug!("Connected to {}", transport.peer);
        Ok(transport)
    }

    /// Address of the remote end
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

#[async_trait]
impl IpcTransport for TcpTransport {
    async fn send<T: Serialize + Send + Sync>(
        &mut self,
        message: &MessageEnvelope<T>,
    ) -> Result<(), IpcError> {
        let writer = self.writer.as_mut().ok_or(IpcError::NotConnected)?;
        let line = encode_line(message)?;

        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| IpcError::IoError(e.to_string()))?;
        writer
            .flush()
            .await
            .map_err(|e| IpcError::IoError(e.to_string()))?;

        trace!("Sent {} bytes to {}", line.len(), self.peer);
        Ok(())
    }

    async fn receive<T: for<'de> Deserialize<'de> + Send>(
        &mut self,
    ) -> Result<MessageEnvelope<T>, IpcError> {
        let mut line = String::new();

        self.reader
            .read_line(&mut line)
            .await
            .map_err(|e| IpcError::IoError(e.to_string()))?;

        if line.is_empty() {
            return Err(IpcError::ConnectionClosed);
        }

        trace!("Received {} bytes from {}", line.len(), self.peer);
        decode_line(&line)
    }

    async fn close(&mut self) -> Result<(), IpcError> {
        if let Some(mut writer) = self.writer.take() {
            writer.shutdown().await?;
        }
        Ok(())
    }
}
