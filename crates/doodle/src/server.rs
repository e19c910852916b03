//! `DoodleServer` builder and server loop.
//!
//! This is the entry point for running a Doodle server. It ties together
//! the layers: transport → protocol → room registry.

use std::future::Future;
use std::sync::Arc;

use doodle_clue::ClueCorpus;
use doodle_protocol::{Codec, JsonCodec};
use doodle_room::{NoopTelemetry, RoomRegistry, Telemetry};
use doodle_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::{DoodleError, ServerConfig};

/// The registry as shared between connection tasks and admin callers.
pub type SharedRegistry<T> = Arc<Mutex<RoomRegistry<T>>>;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<T: Telemetry, C: Codec> {
    pub(crate) rooms: SharedRegistry<T>,
    pub(crate) codec: C,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting a Doodle server.
///
/// # Example
///
/// ```rust,ignore
/// use doodle::prelude::*;
///
/// let config = ServerConfig::from_env();
/// let corpus = ClueCorpus::load(&config.clue_dir, &config.locale)?;
/// let server = DoodleServer::builder()
///     .config(config)
///     .build(Arc::new(corpus))
///     .await?;
/// server.run().await
/// ```
pub struct DoodleServerBuilder<T: Telemetry = NoopTelemetry> {
    config: ServerConfig,
    telemetry: T,
}

impl DoodleServerBuilder<NoopTelemetry> {
    /// Creates a new builder with default settings and no telemetry.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            telemetry: NoopTelemetry,
        }
    }
}

impl Default for DoodleServerBuilder<NoopTelemetry> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Telemetry> DoodleServerBuilder<T> {
    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets where rooms report roster changes and timeouts.
    pub fn telemetry<U: Telemetry>(self, telemetry: U) -> DoodleServerBuilder<U> {
        DoodleServerBuilder {
            config: self.config,
            telemetry,
        }
    }

    /// Binds the listener, creates the registry and the configured rooms.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self, corpus: Arc<ClueCorpus>) -> Result<DoodleServer<T, JsonCodec>, DoodleError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let mut registry =
            RoomRegistry::with_telemetry(self.config.room.clone(), corpus, Arc::new(self.telemetry))
                .with_auto_create(self.config.auto_create_rooms);
        for room_id in &self.config.rooms {
            registry.create_room(room_id.clone())?;
        }

        let state = Arc::new(ServerState {
            rooms: Arc::new(Mutex::new(registry)),
            codec: JsonCodec,
            config: self.config,
        });

        Ok(DoodleServer { transport, state })
    }
}

/// A bound Doodle server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct DoodleServer<T: Telemetry, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<T, C>>,
}

impl DoodleServer<NoopTelemetry, JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> DoodleServerBuilder<NoopTelemetry> {
        DoodleServerBuilder::new()
    }
}

impl<T, C> DoodleServer<T, C>
where
    T: Telemetry,
    C: Codec,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The room registry, for admin operations while the server runs.
    pub fn registry(&self) -> SharedRegistry<T> {
        Arc::clone(&self.state.rooms)
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), DoodleError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes, then deletes every
    /// room so that all connections are closed.
    pub async fn run_until(mut self, shutdown: impl Future<Output = ()>) -> Result<(), DoodleError> {
        tracing::info!(
            addr = %self.config_addr(),
            rooms = self.state.config.rooms.len(),
            auto_create = self.state.config.auto_create_rooms,
            "Doodle server running"
        );
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        tracing::info!("Doodle server shutting down");
        self.state.rooms.lock().await.shutdown().await;
        Ok(())
    }

    fn config_addr(&self) -> String {
        self.local_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| self.state.config.bind_addr.clone())
    }
}
