//! Transport abstraction for the event channel
//!
//! Frame layout: 1-byte event tag, 16-byte request id, 4-byte LE
//! payload length, JSON payload.

use async_trait::async_trait;
use rustls_pki_types::ServerName;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, Mutex};
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use uuid::Uuid;

use super::ChannelError;
use shared::events::{ChannelMessage, EventName};

/// Transport abstraction for event channel communication
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn read_message(&self) -> Result<ChannelMessage, ChannelError>;
    async fn write_message(&self, msg: &ChannelMessage) -> Result<(), ChannelError>;
    async fn close(&self) -> Result<(), ChannelError>;
}

async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<ChannelMessage, ChannelError> {
    let mut tag_buf = [0u8; 1];
    reader.read_exact(&mut tag_buf).await.map_err(ChannelError::Io)?;

    let event = EventName::try_from(tag_buf[0])
        .map_err(|_| ChannelError::InvalidMessage(format!("unknown event tag {}", tag_buf[0])))?;

    let mut uuid_buf = [0u8; 16];
    reader.read_exact(&mut uuid_buf).await.map_err(ChannelError::Io)?;
    let request_id = Uuid::from_bytes(uuid_buf);

    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await.map_err(ChannelError::Io)?;
    let len = u32::from_le_bytes(len_buf) as usize;

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await.map_err(ChannelError::Io)?;

    Ok(ChannelMessage {
        request_id,
        event,
        payload,
    })
}

async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    msg: &ChannelMessage,
) -> Result<(), ChannelError> {
    let mut data = Vec::with_capacity(21 + msg.payload.len());
    data.push(msg.event as u8);
    data.extend_from_slice(msg.request_id.as_bytes());
    data.extend_from_slice(&(msg.payload.len() as u32).to_le_bytes());
    data.extend_from_slice(&msg.payload);

    writer.write_all(&data).await.map_err(ChannelError::Io)?;
    Ok(())
}

/// TCP Transport Implementation
#[derive(Debug, Clone)]
pub struct TcpTransport {
    reader: Arc<Mutex<OwnedReadHalf>>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

impl TcpTransport {
    pub async fn connect(addr: &str) -> Result<Self, ChannelError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| ChannelError::Connection(e.to_string()))?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: Arc::new(Mutex::new(reader)),
            writer: Arc::new(Mutex::new(writer)),
        })
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn read_message(&self) -> Result<ChannelMessage, ChannelError> {
        let mut reader = self.reader.lock().await;
        read_frame(&mut *reader).await
    }

    async fn write_message(&self, msg: &ChannelMessage) -> Result<(), ChannelError> {
        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, msg).await
    }

    async fn close(&self) -> Result<(), ChannelError> {
        let mut writer = self.writer.lock().await;
        writer.shutdown().await.map_err(ChannelError::Io)
    }
}

/// TLS Transport Implementation
#[derive(Debug, Clone)]
pub struct TlsTransport {
    reader: Arc<Mutex<tokio::io::ReadHalf<TlsStream<TcpStream>>>>,
    writer: Arc<Mutex<tokio::io::WriteHalf<TlsStream<TcpStream>>>>,
}

impl TlsTransport {
    /// Connect with the platform webpki root store.
    pub async fn connect(addr: &str, domain: &str) -> Result<Self, ChannelError> {
        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let connector = TlsConnector::from(Arc::new(config));
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| ChannelError::Connection(e.to_string()))?;

        let domain = ServerName::try_from(domain)
            .map_err(|e| ChannelError::Connection(format!("Invalid domain: {}", e)))?
            .to_owned();

        let stream = connector
            .connect(domain, stream)
            .await
            .map_err(|e| ChannelError::Connection(format!("TLS handshake failed: {}", e)))?;

        let (reader, writer) = tokio::io::split(stream);

        Ok(Self {
            reader: Arc::new(Mutex::new(reader)),
            writer: Arc::new(Mutex::new(writer)),
        })
    }
}

#[async_trait]
impl Transport for TlsTransport {
    async fn read_message(&self) -> Result<ChannelMessage, ChannelError> {
        let mut reader = self.reader.lock().await;
        read_frame(&mut *reader).await
    }

    async fn write_message(&self, msg: &ChannelMessage) -> Result<(), ChannelError> {
        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, msg).await
    }

    async fn close(&self) -> Result<(), ChannelError> {
        let mut writer = self.writer.lock().await;
        writer.shutdown().await.map_err(ChannelError::Io)
    }
}

/// Memory Transport Implementation (in-process, for tests)
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    /// Receiver for messages FROM the server (broadcasts)
    rx: Arc<Mutex<broadcast::Receiver<ChannelMessage>>>,
    /// Sender for messages TO the server
    tx: broadcast::Sender<ChannelMessage>,
}

impl MemoryTransport {
    /// Create a new memory transport.
    ///
    /// # Arguments
    /// * `server_broadcast_tx` - the server's broadcast sender (to subscribe to pushes)
    /// * `client_to_server_tx` - the channel carrying messages to the server
    pub fn new(
        server_broadcast_tx: &broadcast::Sender<ChannelMessage>,
        client_to_server_tx: &broadcast::Sender<ChannelMessage>,
    ) -> Self {
        Self {
            rx: Arc::new(Mutex::new(server_broadcast_tx.subscribe())),
            tx: client_to_server_tx.clone(),
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn read_message(&self) -> Result<ChannelMessage, ChannelError> {
        let mut rx = self.rx.lock().await;
        rx.recv()
            .await
            .map_err(|e| ChannelError::Connection(format!("Memory channel error: {}", e)))
    }

    async fn write_message(&self, msg: &ChannelMessage) -> Result<(), ChannelError> {
        self.tx
            .send(msg.clone())
            .map_err(|e| ChannelError::Connection(format!("Failed to send to server: {}", e)))?;
        Ok(())
    }

    async fn close(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}
