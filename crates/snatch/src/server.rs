//! `SnatchServer` builder and accept loop.
//!
//! This is the entry point for running a Snatch server. It ties together
//! all the layers: transport → protocol → session registry → room actors.

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use snatch_protocol::{Codec, JsonCodec};
use snatch_room::{Dictionary, GameConfig, WordList};
use snatch_session::SessionRegistry;
use snatch_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::{ServerConfig, SnatchError};

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    /// Every room lookup, creation and removal goes through this lock.
    pub(crate) registry: Mutex<SessionRegistry>,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Duration,
}

/// Builder for configuring and starting a Snatch server.
///
/// ```rust,no_run
/// # async fn run() -> Result<(), snatch::SnatchError> {
/// use snatch::SnatchServer;
///
/// let server = SnatchServer::builder()
///     .bind("0.0.0.0:8080")
///     .dictionary_path("/usr/share/dict/words")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct SnatchServerBuilder {
    config: ServerConfig,
    dictionary: Option<Arc<dyn Dictionary>>,
}

impl SnatchServerBuilder {
    pub fn new() -> Self {
        Self::from_config(ServerConfig::default())
    }

    /// Starts from a complete configuration.
    pub fn from_config(config: ServerConfig) -> Self {
        Self {
            config,
            dictionary: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the settings every room is created with.
    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.config.game = config;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Word list file to load at build time.
    pub fn dictionary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.dictionary_path = path.into();
        self
    }

    /// Uses `dictionary` instead of loading one from disk.
    pub fn dictionary(mut self, dictionary: Arc<dyn Dictionary>) -> Self {
        self.dictionary = Some(dictionary);
        self
    }

    /// Loads the dictionary (unless one was given) and binds the listener.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<SnatchServer<JsonCodec>, SnatchError> {
        let dictionary = match self.dictionary {
            Some(dictionary) => dictionary,
            None => {
                let path = &self.config.dictionary_path;
                Arc::new(WordList::load(path).await?)
            }
        };

        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: Mutex::new(SessionRegistry::new(
                self.config.game.clone(),
                dictionary,
            )),
            codec: JsonCodec,
            idle_timeout: self.config.idle_timeout,
        });

        Ok(SnatchServer { transport, state })
    }
}

impl Default for SnatchServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Snatch server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct SnatchServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl SnatchServer<JsonCodec> {
    pub fn builder() -> SnatchServerBuilder {
        SnatchServerBuilder::new()
    }
}

impl<C: Codec> SnatchServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, SnatchError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), SnatchError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` resolves, then shuts every
    /// room down.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), SnatchError> {
        let addr = self.local_addr()?;
        tracing::info!(%addr, "Snatch server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            let result = handle_connection(conn, state).await;
                            if let Err(e) = result {
                                tracing::debug!(
                                    error = %e, "connection ended with error"
                                );
                            }
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "accept failed"),
                },
                () = &mut shutdown => break,
            }
        }

        self.state.registry.lock().await.shutdown().await;
        tracing::info!("Snatch server stopped");
        Ok(())
    }
}
