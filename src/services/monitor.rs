//! The monitoring loop task and the handle used to talk to it.
//!
//! The loop owns the [`Engine`] and multiplexes three sources: commands from
//! [`EngineHandle`] clones, events from subscription tasks, and the tick
//! interval (only present while monitoring).

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::constants;
use crate::engine::Engine;
use crate::error::SignalError;
use crate::services::price_feed::{FeedEventReceiver, SnapshotFetcher};
use crate::signals::types::{DashboardStats, Signal, SignalDraft, SignalStatus, ValidatedDraft};

enum Command {
    CreateSignal {
        draft: ValidatedDraft,
        snapshot: Option<f64>,
        reply: oneshot::Sender<Signal>,
    },
    DeleteSignal {
        id: String,
        reply: oneshot::Sender<bool>,
    },
    ListSignals {
        filter: Option<SignalStatus>,
        reply: oneshot::Sender<Vec<Signal>>,
    },
    Stats {
        reply: oneshot::Sender<DashboardStats>,
    },
    StartMonitoring {
        reply: oneshot::Sender<bool>,
    },
    StopMonitoring {
        reply: oneshot::Sender<bool>,
    },
    Shutdown,
}

/// Cloneable front door to the monitoring loop.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Command>,
    snapshot: SnapshotFetcher,
}

impl EngineHandle {
    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T, SignalError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| SignalError::EngineUnavailable)?;
        rx.await.map_err(|_| SignalError::EngineUnavailable)
    }

    /// Validate, fetch a snapshot price for the symbol, then create.
    pub async fn create_signal(&self, draft: SignalDraft) -> Result<Signal, SignalError> {
        let draft = draft.validate().inspect_err(|e| warn!("⚠️ [MONITOR] Rejected signal: {}", e))?;
        let snapshot = self.snapshot.fetch_snapshot(&draft.symbol).await;
        self.request(|reply| Command::CreateSignal { draft, snapshot, reply })
            .await
    }

    pub async fn delete_signal(&self, id: &str) -> Result<bool, SignalError> {
        let id = id.to_string();
        self.request(|reply| Command::DeleteSignal { id, reply }).await
    }

    pub async fn list_signals(&self, filter: Option<SignalStatus>) -> Result<Vec<Signal>, SignalError> {
        self.request(|reply| Command::ListSignals { filter, reply }).await
    }

    pub async fn stats(&self) -> Result<DashboardStats, SignalError> {
        self.request(|reply| Command::Stats { reply }).await
    }

    /// Ok(false) when monitoring was already running.
    pub async fn start_monitoring(&self) -> Result<bool, SignalError> {
        self.request(|reply| Command::StartMonitoring { reply }).await
    }

    /// Ok(false) when monitoring was not running.
    pub async fn stop_monitoring(&self) -> Result<bool, SignalError> {
        self.request(|reply| Command::StopMonitoring { reply }).await
    }

    pub async fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown).await;
    }
}

pub struct MonitoringLoop {
    engine: Engine,
    commands: mpsc::Receiver<Command>,
    feed_events: FeedEventReceiver,
    tick_every: Duration,
    ticker: Option<Interval>,
}

impl MonitoringLoop {
    /// Spawn the loop task. The engine is moved into it.
    pub fn spawn(
        engine: Engine,
        feed_events: FeedEventReceiver,
        snapshot: SnapshotFetcher,
        tick_every: Duration,
    ) -> (EngineHandle, JoinHandle<()>) {
        let (tx, commands) = mpsc::channel(constants::monitor::COMMAND_QUEUE_SIZE);
        let monitor = Self {
            engine,
            commands,
            feed_events,
            tick_every,
            ticker: None,
        };
        let task = tokio::spawn(monitor.run());
        (EngineHandle { tx, snapshot }, task)
    }

    async fn run(mut self) {
        info!("🔁 [MONITOR] Monitoring loop started (tick every {:?})", self.tick_every);

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(Command::Shutdown) | None => break,
                        Some(command) => self.handle_command(command),
                    }
                }
                Some(event) = self.feed_events.recv() => {
                    self.engine.handle_feed_event(event);
                }
                _ = next_tick(&mut self.ticker) => {
                    self.engine.tick();
                }
            }
        }

        self.engine.shutdown();
        info!("🔁 [MONITOR] Monitoring loop stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::CreateSignal { draft, snapshot, reply } => {
                let _ = reply.send(self.engine.create_signal(draft, snapshot));
            }
            Command::DeleteSignal { id, reply } => {
                let _ = reply.send(self.engine.delete_signal(&id));
            }
            Command::ListSignals { filter, reply } => {
                let _ = reply.send(self.engine.signals(filter));
            }
            Command::Stats { reply } => {
                let _ = reply.send(self.engine.stats());
            }
            Command::StartMonitoring { reply } => {
                let started = self.engine.start_monitoring();
                if started {
                    let mut ticker = interval_at(Instant::now() + self.tick_every, self.tick_every);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    self.ticker = Some(ticker);
                }
                let _ = reply.send(started);
            }
            Command::StopMonitoring { reply } => {
                let stopped = self.engine.stop_monitoring();
                if stopped {
                    self.ticker = None;
                }
                let _ = reply.send(stopped);
            }
            Command::Shutdown => {}
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
