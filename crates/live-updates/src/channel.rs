//! WebSocket push client.

use crate::error::{LiveUpdateError, LiveUpdateResult};
use crate::message::PushMessage;
use crate::sink::ExternalUpdateSink;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

/// Push channel configuration.
#[derive(Debug, Clone)]
pub struct LiveUpdateConfig {
    /// Push endpoint URL (e.g., ws://localhost:3000/ws).
    pub url: String,
    /// Base reconnect delay in milliseconds.
    pub reconnect_base_delay_ms: u64,
    /// Maximum reconnect delay in milliseconds.
    pub reconnect_max_delay_ms: u64,
    /// Consecutive failed connects before giving up.
    pub max_reconnect_attempts: u32,
}

impl Default for LiveUpdateConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:3000/ws".to_string(),
            reconnect_base_delay_ms: 2_000,
            reconnect_max_delay_ms: 30_000,
            max_reconnect_attempts: 10,
        }
    }
}

impl LiveUpdateConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Delay before reconnect attempt `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let delay = self
            .reconnect_base_delay_ms
            .saturating_mul(2u64.pow(exponent));
        Duration::from_millis(std::cmp::min(delay, self.reconnect_max_delay_ms))
    }
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Shut down or out of reconnect attempts. Terminal.
    Stopped,
}

/// Best-effort push channel.
///
/// Every well-formed `users:update` is handed to the sink. Malformed
/// messages are dropped. Connection failures are retried with exponential
/// backoff and otherwise ignored: the channel never reports an error to its
/// owner, because push is a liveness aid and not a source of truth.
pub struct LiveUpdateChannel {
    config: LiveUpdateConfig,
    sink: Arc<dyn ExternalUpdateSink>,
    state: Arc<RwLock<ConnectionState>>,
    reconnect_attempts: Arc<RwLock<u32>>,
}

impl LiveUpdateChannel {
    pub fn new(config: LiveUpdateConfig, sink: Arc<dyn ExternalUpdateSink>) -> Self {
        Self {
            config,
            sink,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            reconnect_attempts: Arc::new(RwLock::new(0)),
        }
    }

    /// Get the current connection state.
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    pub async fn is_connected(&self) -> bool {
        *self.state.read().await == ConnectionState::Connected
    }

    /// Apply one text frame. Returns whether it reached the sink.
    pub fn handle_text(&self, text: &str) -> bool {
        match PushMessage::from_json(text) {
            Ok(PushMessage::UsersUpdate(records)) => {
                debug!(count = records.len(), "Received pushed record set");
                self.sink.apply_external_update(records);
                true
            }
            Err(e) => {
                debug!(error = %e, "Dropping malformed push message");
                false
            }
        }
    }

    /// Run the channel on a background task.
    pub fn spawn(self) -> LiveUpdateHandle {
        let channel = Arc::new(self);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(channel.clone().run(shutdown_rx));
        LiveUpdateHandle {
            channel,
            shutdown_tx,
            task,
        }
    }

    /// Connect, read, and reconnect until shut down or out of attempts.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        loop {
            if shutdown_requested(&shutdown) {
                break;
            }

            match self.connect_and_read(&mut shutdown).await {
                Ok(()) => {}
                Err(e) => debug!(error = %e, url = %self.config.url, "Push connection ended"),
            }
            *self.state.write().await = ConnectionState::Disconnected;

            if shutdown_requested(&shutdown) {
                break;
            }

            let Some(delay) = self.next_backoff().await else {
                warn!(url = %self.config.url, "Max reconnect attempts reached, push updates disabled");
                break;
            };
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => {}
            }
        }

        *self.state.write().await = ConnectionState::Stopped;
        info!("Push channel stopped");
    }

    async fn next_backoff(&self) -> Option<Duration> {
        let mut attempts = self.reconnect_attempts.write().await;
        *attempts += 1;
        if *attempts > self.config.max_reconnect_attempts {
            return None;
        }
        let delay = self.config.backoff(*attempts);
        debug!(attempt = *attempts, delay_ms = delay.as_millis() as u64, "Scheduling push reconnect");
        Some(delay)
    }

    async fn connect_and_read(&self, shutdown: &mut watch::Receiver<bool>) -> LiveUpdateResult<()> {
        *self.state.write().await = ConnectionState::Connecting;
        debug!(url = %self.config.url, "Connecting to push channel");

        let (mut ws, _) = connect_async(self.config.url.as_str()).await?;

        *self.state.write().await = ConnectionState::Connected;
        *self.reconnect_attempts.write().await = 0;
        info!(url = %self.config.url, "Push channel connected");

        loop {
            let frame = tokio::select! {
                frame = ws.next() => frame,
                _ = shutdown.changed() => {
                    let _ = ws.close(None).await;
                    return Ok(());
                }
            };

            match frame {
                Some(Ok(Message::Text(text))) => {
                    self.handle_text(&text);
                }
                Some(Ok(Message::Ping(data))) => {
                    ws.send(Message::Pong(data)).await?;
                }
                Some(Ok(Message::Close(_))) | None => return Err(LiveUpdateError::Closed),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }
}

/// Set, or the handle is gone.
fn shutdown_requested(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow() || shutdown.has_changed().is_err()
}

impl std::fmt::Debug for LiveUpdateChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveUpdateChannel")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Owner's handle on a spawned channel.
pub struct LiveUpdateHandle {
    channel: Arc<LiveUpdateChannel>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl LiveUpdateHandle {
    pub async fn state(&self) -> ConnectionState {
        self.channel.state().await
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the channel and wait for it to wind down.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Push channel task failed");
        }
    }
}
