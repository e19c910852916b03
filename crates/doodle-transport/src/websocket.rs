//! [`Transport`] over WebSocket, via `tokio-tungstenite`.

use std::net::SocketAddr;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::{Connection, ConnectionId, Frame, Transport, TransportError};

type Sink = SplitSink<WebSocketStream<TcpStream>, Message>;
type Source = SplitStream<WebSocketStream<TcpStream>>;

/// Listens on a TCP address and upgrades every accepted stream.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::BindFailed)?;
        tracing::info!(addr, "listening for websocket clients");
        Ok(Self { listener })
    }

    /// The bound address. Useful after binding port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<WebSocketConnection, TransportError> {
        let (tcp, peer) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let upgraded = tokio_tungstenite::accept_async(tcp)
            .await
            .map_err(|e| TransportError::HandshakeFailed(format!("{peer}: {e}")))?;

        let conn = WebSocketConnection::new(upgraded, peer);
        tracing::debug!(id = %conn.id, %peer, "websocket upgraded");
        Ok(conn)
    }
}

/// One upgraded socket, split into halves that lock independently.
pub struct WebSocketConnection {
    id: ConnectionId,
    peer: SocketAddr,
    sink: Mutex<Sink>,
    source: Mutex<Source>,
}

impl WebSocketConnection {
    fn new(ws: WebSocketStream<TcpStream>, peer: SocketAddr) -> Self {
        let (sink, source) = ws.split();
        Self {
            id: ConnectionId::next(),
            peer,
            sink: Mutex::new(sink),
            source: Mutex::new(source),
        }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    async fn write(&self, msg: Message) -> Result<(), TransportError> {
        let mut sink = self.sink.lock().await;
        sink.send(msg)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send_text(&self, text: &str) -> Result<(), TransportError> {
        self.write(Message::text(text)).await
    }

    async fn send_binary(&self, data: &[u8]) -> Result<(), TransportError> {
        self.write(Message::binary(data.to_vec())).await
    }

    async fn recv(&self) -> Result<Option<Frame>, TransportError> {
        let mut source = self.source.lock().await;
        while let Some(msg) = source.next().await {
            let msg = msg.map_err(|e| TransportError::ReceiveFailed(e.to_string()))?;
            let frame = match msg {
                Message::Text(text) => Frame::Text(text.as_str().to_owned()),
                Message::Binary(data) => Frame::Binary(data.to_vec()),
                Message::Close(_) => return Ok(None),
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            };
            return Ok(Some(frame));
        }
        Ok(None)
    }

    async fn close(&self) -> Result<(), TransportError> {
        let mut sink = self.sink.lock().await;
        sink.close()
            .await
            .map_err(|e| TransportError::ConnectionClosed(e.to_string()))
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
