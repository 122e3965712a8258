//! Server builder and accept loop.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use volley_protocol::{Codec, JsonCodec};
use volley_room::{PlayerSender, RoomConfig, RoomManager};
use volley_transport::{Transport, TransportError, WebSocketTransport};

use crate::VolleyError;
use crate::handler::handle_connection;

/// State shared by every connection task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) rooms: RoomManager,
    pub(crate) codec: C,
    /// Capacity of each connection's outbound queue.
    pub(crate) outbound_queue_size: usize,
}

/// Configures and binds a [`VolleyServer`].
pub struct VolleyServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    outbound_queue_size: usize,
}

impl VolleyServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            room_config: RoomConfig::default(),
            outbound_queue_size: PlayerSender::DEFAULT_CAPACITY,
        }
    }

    /// Address to listen on. Use port 0 for an OS-assigned port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Messages buffered per client before snapshots are dropped.
    pub fn outbound_queue_size(mut self, size: usize) -> Self {
        self.outbound_queue_size = size;
        self
    }

    /// Binds the listener, speaking JSON.
    pub async fn build(self) -> Result<VolleyServer<JsonCodec>, VolleyError> {
        self.build_with_codec(JsonCodec).await
    }

    /// Binds the listener with a custom wire codec.
    pub async fn build_with_codec<C: Codec>(
        self,
        codec: C,
    ) -> Result<VolleyServer<C>, VolleyError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let state = Arc::new(ServerState {
            rooms: RoomManager::with_config(self.room_config),
            codec,
            outbound_queue_size: self.outbound_queue_size,
        });
        Ok(VolleyServer { transport, state })
    }
}

impl Default for VolleyServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound server, ready to [`run`](VolleyServer::run).
pub struct VolleyServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl VolleyServer<JsonCodec> {
    pub fn builder() -> VolleyServerBuilder {
        VolleyServerBuilder::new()
    }
}

impl<C: Codec> VolleyServer<C> {
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Accepts connections until the process stops, one task per
    /// connection.
    pub async fn run(self) -> Result<(), VolleyError> {
        self.run_until(std::future::pending()).await
    }

    /// Like [`run`](Self::run), but shuts the transport down and returns
    /// once `shutdown` completes. Connections already accepted keep
    /// running.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<(), VolleyError>
    where
        F: Future<Output = ()>,
    {
        tracing::info!("volley server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    self.transport.shutdown().await?;
                    tracing::info!("volley server stopped accepting");
                    return Ok(());
                }
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    // A failed handshake only loses that one client.
                    Err(TransportError::AcceptFailed(e)) => {
                        tracing::warn!(error = %e, "accept failed");
                    }
                    Err(e) => return Err(e.into()),
                },
            }
        }
    }
}
