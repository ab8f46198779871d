//! Background consumer for the push-style event stream.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures::StreamExt;
use log::{debug, error, info};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use serde_json::Value;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;

use super::sse::SseParser;
use crate::config::{random_user_agent, ACCEPT_EVENT_STREAM, STREAM_RECONNECT_PAUSE, TELEMETRY_EVENT};
use crate::error_handling::{CollectionStats, EventKind};
use crate::lookup::CountryDirectory;
use crate::models::AttackRecord;
use crate::sources::map_checkpoint_event;

/// Lifecycle of the consumer and of its current connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Stopped,
    Connecting,
    Streaming,
    ReconnectWait,
}

#[derive(Debug, Clone)]
pub struct StreamSettings {
    pub url: String,
    /// How long one connection is listened to before reconnecting.
    pub window: Duration,
    /// Pause after a failed connection.
    pub cooldown: Duration,
}

/// Handle to a running consumer task.
///
/// Records are handed to the owning session through a bounded channel; when
/// the session falls behind, new records are dropped and counted rather than
/// buffered without limit.
pub struct StreamConsumer {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    state: watch::Receiver<StreamState>,
}

impl StreamConsumer {
    /// Spawns the consumer on the current runtime.
    pub fn start(
        client: reqwest::Client,
        settings: StreamSettings,
        countries: Arc<dyn CountryDirectory>,
        sender: mpsc::Sender<AttackRecord>,
        stats: Arc<CollectionStats>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(StreamState::Connecting);
        let worker = Worker {
            client,
            settings,
            countries,
            sender,
            stats,
            state: state_tx,
        };
        let task = tokio::spawn(worker.run(cancel.clone()));
        Self {
            cancel,
            task: Some(task),
            state: state_rx,
        }
    }

    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    /// Receiver that observes every state transition.
    pub fn watch_state(&self) -> watch::Receiver<StreamState> {
        self.state.clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Cancels the task, including any in-flight connection, and waits for
    /// it to finish. Calling it again is a no-op.
    pub async fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if e.is_panic() {
                    error!("checkpoint: stream consumer panicked: {}", e);
                }
            }
        }
    }
}

impl Drop for StreamConsumer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[derive(Debug, Default)]
struct Window {
    forwarded: usize,
    receiver_gone: bool,
}

struct Worker {
    client: reqwest::Client,
    settings: StreamSettings,
    countries: Arc<dyn CountryDirectory>,
    sender: mpsc::Sender<AttackRecord>,
    stats: Arc<CollectionStats>,
    state: watch::Sender<StreamState>,
}

impl Worker {
    async fn run(self, cancel: CancellationToken) {
        info!("checkpoint: stream consumer started");
        loop {
            self.state.send_replace(StreamState::Connecting);
            let outcome = tokio::select! {
                _ = cancel.cancelled() => break,
                outcome = self.listen() => outcome,
            };
            let pause = match outcome {
                Ok(window) if window.receiver_gone => {
                    debug!("checkpoint: handoff closed, stopping");
                    break;
                }
                Ok(window) => {
                    debug!("checkpoint: forwarded {} events this window", window.forwarded);
                    STREAM_RECONNECT_PAUSE
                }
                Err(e) => {
                    error!("checkpoint: stream error: {:#}", e);
                    self.stats.increment(EventKind::StreamReconnect);
                    self.state.send_replace(StreamState::ReconnectWait);
                    self.settings.cooldown
                }
            };
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }
        self.state.send_replace(StreamState::Stopped);
        info!("checkpoint: stream consumer stopped");
    }

    /// Listens to one connection until the window closes or the server ends
    /// the stream.
    async fn listen(&self) -> Result<Window> {
        let deadline = Instant::now() + self.settings.window;
        let request = self
            .client
            .get(&self.settings.url)
            .header(ACCEPT, ACCEPT_EVENT_STREAM)
            .header(USER_AGENT, random_user_agent());
        let response = match timeout_at(deadline, request.send()).await {
            Ok(response) => response.context("connect failed")?,
            Err(_) => bail!("no response within the listen window"),
        };
        if response.status() != StatusCode::OK {
            bail!("unexpected status {}", response.status());
        }
        self.state.send_replace(StreamState::Streaming);

        let mut body = response.bytes_stream();
        let mut parser = SseParser::new();
        let mut window = Window::default();
        loop {
            let chunk = match timeout_at(deadline, body.next()).await {
                Err(_) | Ok(None) => break,
                Ok(Some(chunk)) => chunk.context("stream read failed")?,
            };
            for event in parser.push(&chunk) {
                if event.event.as_deref() != Some(TELEMETRY_EVENT) {
                    continue;
                }
                let value: Value = match serde_json::from_str(&event.data) {
                    Ok(value) => value,
                    Err(e) => {
                        debug!("checkpoint: ignoring undecodable event data: {}", e);
                        self.stats.increment(EventKind::MalformedItem);
                        continue;
                    }
                };
                let Some(record) = map_checkpoint_event(&value, self.countries.as_ref()) else {
                    continue;
                };
                match self.sender.try_send(record) {
                    Ok(()) => window.forwarded += 1,
                    Err(TrySendError::Full(_)) => {
                        self.stats.increment(EventKind::StreamBufferOverflow)
                    }
                    Err(TrySendError::Closed(_)) => {
                        window.receiver_gone = true;
                        return Ok(window);
                    }
                }
            }
        }
        Ok(window)
    }
}
