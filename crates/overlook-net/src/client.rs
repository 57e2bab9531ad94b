use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use overlook_core::UserId;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, info, warn};

use crate::error::RelayError;
use crate::protocol::{ClientEvent, PoseUpdate, ServerEvent, UserPayload};

/// Outbound events buffered while the socket is busy
pub const OUTBOUND_QUEUE_CAPACITY: usize = 64;

/// Non-blocking relay connection for the render thread.
///
/// Owns a background tokio runtime that runs the socket. The render thread
/// only ever pushes into or drains channels, so a slow or dead relay never
/// stalls a frame.
pub struct RelayClient {
    /// Taken on drop
    runtime: Option<tokio::runtime::Runtime>,
    outbound: mpsc::Sender<ClientEvent>,
    inbound: std_mpsc::Receiver<ServerEvent>,
    connected: Arc<AtomicBool>,
    local_id: Arc<Mutex<Option<UserId>>>,
}

impl RelayClient {
    /// Start connecting to `url` in the background.
    ///
    /// Only a malformed URL or a runtime failure is reported here; an
    /// unreachable relay shows up as `is_connected() == false`.
    pub fn connect(url: &str) -> Result<Self, RelayError> {
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(RelayError::InvalidAddress(url.to_string()));
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("overlook-relay-client")
            .enable_all()
            .build()?;

        let (outbound, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let (inbound_tx, inbound) = std_mpsc::channel();
        let connected = Arc::new(AtomicBool::new(false));
        let local_id = Arc::new(Mutex::new(None));

        let task = ConnectionTask {
            url: url.to_string(),
            outbound: outbound_rx,
            inbound: inbound_tx,
            connected: Arc::clone(&connected),
            local_id: Arc::clone(&local_id),
        };
        runtime.spawn(task.run());

        Ok(Self {
            runtime: Some(runtime),
            outbound,
            inbound,
            connected,
            local_id,
        })
    }

    /// Publish the local pose. Dropped silently while disconnected.
    pub fn send_pose(&self, update: &PoseUpdate) {
        if !self.is_connected() {
            return;
        }
        match ClientEvent::update_position(update) {
            Ok(event) => enqueue(&self.outbound, event),
            Err(e) => warn!(error = %e, "Failed to encode pose update"),
        }
    }

    /// Every event received since the last call, oldest first
    pub fn drain(&self) -> Vec<ServerEvent> {
        self.inbound.try_iter().collect()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Id the relay assigned to this connection, once known
    pub fn local_id(&self) -> Option<UserId> {
        *self.local_id.lock()
    }
}

/// Queue an event for the socket task, dropping it if the socket has fallen behind
fn enqueue(outbound: &mpsc::Sender<ClientEvent>, event: ClientEvent) {
    match outbound.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => debug!("Relay send queue full, dropping pose"),
        // Socket task has exited
        Err(TrySendError::Closed(_)) => {}
    }
}

impl Drop for RelayClient {
    fn drop(&mut self) {
        // Never block the render thread on socket teardown
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

struct ConnectionTask {
    url: String,
    outbound: mpsc::Receiver<ClientEvent>,
    inbound: std_mpsc::Sender<ServerEvent>,
    connected: Arc<AtomicBool>,
    local_id: Arc<Mutex<Option<UserId>>>,
}

impl ConnectionTask {
    async fn run(mut self) {
        if let Err(e) = self.session().await {
            warn!(url = %self.url, error = %e, "Relay connection ended");
        }
        self.connected.store(false, Ordering::Relaxed);
    }

    async fn session(&mut self) -> Result<(), RelayError> {
        let (socket, _response) = tokio_tungstenite::connect_async(self.url.as_str()).await?;
        info!(url = %self.url, "Connected to relay");
        self.connected.store(true, Ordering::Relaxed);

        let (mut write, mut read) = socket.split();

        loop {
            tokio::select! {
                msg = read.next() => {
                    let Some(msg) = msg else {
                        return Err(RelayError::Closed);
                    };
                    match msg? {
                        Message::Text(text) => {
                            if let Some(reply) = self.receive(&text) {
                                write.send(Message::Text(reply.to_text()?)).await?;
                            }
                        }
                        Message::Close(_) => return Err(RelayError::Closed),
                        _ => {}
                    }
                }
                event = self.outbound.recv() => {
                    // The owning RelayClient was dropped
                    let Some(event) = event else {
                        let _ = write.send(Message::Close(None)).await;
                        return Ok(());
                    };
                    write.send(Message::Text(event.to_text()?)).await?;
                }
            }
        }
    }

    /// Forward one inbound frame to the render thread; returns a reply to send
    fn receive(&mut self, text: &str) -> Option<ClientEvent> {
        let event = match ServerEvent::from_text(text) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Dropping undecodable relay frame");
                return None;
            }
        };

        let reply = match &event {
            ServerEvent::SessionAssigned(UserPayload { id }) => {
                debug!(%id, "Relay assigned session id");
                *self.local_id.lock() = Some(*id);
                Some(ClientEvent::NewUser(UserPayload { id: *id }))
            }
            _ => None,
        };

        let _ = self.inbound.send(event);
        reply
    }
}
