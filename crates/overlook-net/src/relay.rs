//! Relay server
//!
//! Each WebSocket connection gets a fresh [`UserId`] and an outbound channel
//! in the peer table. Inbound frames are decoded on the connection task and
//! fanned out to every other peer's channel. The relay keeps no history: a
//! viewer that connects late only sees updates sent after it joined.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use overlook_core::UserId;
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, info, warn};

use crate::error::RelayError;
use crate::protocol::{ClientEvent, ServerEvent, UserPayload};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
/// Outbound frames buffered per peer before new ones are dropped
pub const PEER_QUEUE_CAPACITY: usize = 256;

/// Where the relay listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl RelayConfig {
    /// Defaults overridden by `OVERLOOK_RELAY_HOST` and `PORT`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(host) = lookup("OVERLOOK_RELAY_HOST").filter(|h| !h.is_empty()) {
            config.host = host;
        }
        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(port) => config.port = port,
                Err(_) => warn!(%port, "Invalid PORT, using {}", DEFAULT_PORT),
            }
        }
        config
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

type PeerMap = Arc<Mutex<HashMap<UserId, mpsc::Sender<Message>>>>;

/// Accepts viewers and relays their events to each other
pub struct RelayServer {
    listener: TcpListener,
    peers: PeerMap,
}

impl RelayServer {
    pub async fn bind(config: &RelayConfig) -> Result<Self, RelayError> {
        let listener = TcpListener::bind(config.addr()).await?;
        Ok(Self::from_listener(listener))
    }

    pub fn from_listener(listener: TcpListener) -> Self {
        Self {
            listener,
            peers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr, RelayError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the listener fails
    pub async fn run(self) -> Result<(), RelayError> {
        loop {
            let (stream, addr) = self.listener.accept().await?;
            let peers = Arc::clone(&self.peers);
            tokio::spawn(async move {
                handle_connection(peers, stream, addr).await;
            });
        }
    }
}

async fn handle_connection(peers: PeerMap, stream: TcpStream, addr: SocketAddr) {
    let socket = match tokio_tungstenite::accept_async(stream).await {
        Ok(socket) => socket,
        Err(e) => {
            warn!(%addr, error = %e, "relay: websocket handshake failed");
            return;
        }
    };

    let id = UserId::new();
    let (mut write, mut read) = socket.split();
    let (tx, mut rx) = mpsc::channel(PEER_QUEUE_CAPACITY);

    send_to(id, &tx, &ServerEvent::SessionAssigned(UserPayload { id }));
    peers.lock().insert(id, tx);
    broadcast(&peers, id, &ServerEvent::UserConnected(UserPayload { id }));
    info!(%id, %addr, "relay: client connected");

    loop {
        tokio::select! {
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => handle_text(&peers, id, &text),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(%id, error = %e, "relay: receive failed");
                    break;
                }
            },
            Some(out) = rx.recv() => {
                if let Err(e) = write.send(out).await {
                    warn!(%id, error = %e, "relay: send failed");
                    break;
                }
            }
        }
    }

    peers.lock().remove(&id);
    broadcast(&peers, id, &ServerEvent::UserDisconnected(UserPayload { id }));
    info!(%id, "relay: client disconnected");
}

fn handle_text(peers: &PeerMap, sender: UserId, text: &str) {
    match ClientEvent::from_text(text) {
        Ok(ClientEvent::NewUser(payload)) => {
            debug!(%sender, announced = %payload.id, "relay: newUser");
        }
        Ok(ClientEvent::UpdatePosition(payload)) => {
            broadcast(peers, sender, &ServerEvent::PositionUpdated(payload));
        }
        Err(e) => {
            warn!(%sender, error = %e, "relay: dropping undecodable frame");
        }
    }
}

fn send_to(id: UserId, tx: &mpsc::Sender<Message>, event: &ServerEvent) {
    match event.to_text() {
        Ok(text) => enqueue(id, tx, Message::Text(text)),
        Err(e) => warn!(error = %e, "relay: failed to encode event"),
    }
}

/// Queue a frame for one peer, dropping it if that peer has fallen behind
fn enqueue(id: UserId, tx: &mpsc::Sender<Message>, message: Message) {
    match tx.try_send(message) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => debug!(%id, "relay: peer queue full, dropping frame"),
        // Peer is already tearing down
        Err(TrySendError::Closed(_)) => {}
    }
}

/// Send `event` to every peer except `sender`
fn broadcast(peers: &PeerMap, sender: UserId, event: &ServerEvent) {
    let text = match event.to_text() {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "relay: failed to encode event");
            return;
        }
    };
    let peers = peers.lock();
    for (id, tx) in peers.iter().filter(|(id, _)| **id != sender) {
        enqueue(*id, tx, Message::Text(text.clone()));
    }
}
