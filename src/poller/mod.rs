// src/poller/mod.rs
pub mod client;

pub use client::{ ProxyClient, SnapshotSource };

use chrono::{ DateTime, Utc };
use log::{ debug, error, info, warn };
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{ JoinHandle, JoinSet };
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::models::status::ServerStatusSnapshot;
use crate::utils::FetchError;

/// What widgets render: the latest snapshot plus whether a fetch is running.
#[derive(Debug, Clone, PartialEq)]
pub struct PresenterState {
    pub snapshot: Arc<ServerStatusSnapshot>,
    pub loading: bool,
    /// When `snapshot` was last replaced by a fetched one. `None` for the placeholder.
    pub updated_at: Option<DateTime<Utc>>,
}

impl PresenterState {
    pub fn initial() -> Self {
        Self {
            snapshot: Arc::new(ServerStatusSnapshot::placeholder()),
            loading: false,
            updated_at: None,
        }
    }
}

const MIN_PERIOD: Duration = Duration::from_secs(1);

pub struct StatusPoller;

impl StatusPoller {
    /// Starts polling `source` right away and then every `period`.
    ///
    /// Must be called from within a tokio runtime. Periods under one second are
    /// raised to one second.
    pub fn spawn<S>(source: S, period: Duration) -> PollerHandle
        where S: SnapshotSource + Send + Sync + 'static
    {
        let period = if period < MIN_PERIOD {
            warn!("Poll period {:?} too short, using {:?}", period, MIN_PERIOD);
            MIN_PERIOD
        } else {
            period
        };
        let (state_tx, state_rx) = watch::channel(PresenterState::initial());
        let cancel_token = CancellationToken::new();

        info!("Starting status poller (every {}s)", period.as_secs());
        let task = tokio::spawn(poll_loop(Arc::new(source), period, state_tx, cancel_token.clone()));

        PollerHandle {
            state_rx,
            cancel_token,
            task: Some(task),
        }
    }
}

/// Owner of a running poller. Dropping it stops the poller.
pub struct PollerHandle {
    state_rx: watch::Receiver<PresenterState>,
    cancel_token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn subscribe(&self) -> watch::Receiver<PresenterState> {
        self.state_rx.clone()
    }

    pub fn current(&self) -> PresenterState {
        self.state_rx.borrow().clone()
    }

    /// Cancels the timer and any fetch still in flight, then waits for the task.
    pub async fn shutdown(mut self) {
        self.cancel_token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Status poller task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

type FetchOutcome = (u64, Result<ServerStatusSnapshot, FetchError>);

async fn poll_loop<S>(
    source: Arc<S>,
    period: Duration,
    state_tx: watch::Sender<PresenterState>,
    cancel_token: CancellationToken
)
    where S: SnapshotSource + Send + Sync + 'static
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut in_flight: JoinSet<FetchOutcome> = JoinSet::new();
    let mut issued: u64 = 0;
    let mut applied: Option<u64> = None;

    loop {
        tokio::select! {
            biased;

            _ = cancel_token.cancelled() => {
                info!("Status poller stopped ({} fetches abandoned)", in_flight.len());
                break;
            }

            _ = ticker.tick() => {
                issued += 1;
                let seq = issued;
                let source = source.clone();

                debug!("Issuing status fetch #{}", seq);
                set_loading(&state_tx, true);
                in_flight.spawn(async move { (seq, source.fetch_snapshot().await) });
            }

            Some(joined) = in_flight.join_next() => {
                let loading = !in_flight.is_empty();

                match joined {
                    // Responses are ordered by issue sequence, not arrival.
                    Ok((seq, Ok(snapshot))) if applied.map_or(true, |last| seq > last) => {
                        applied = Some(seq);
                        state_tx.send_modify(|state| {
                            state.snapshot = Arc::new(snapshot);
                            state.updated_at = Some(Utc::now());
                            state.loading = loading;
                        });
                    }
                    Ok((seq, Ok(_))) => {
                        debug!("Discarding status fetch #{}, newer snapshot already shown", seq);
                        set_loading(&state_tx, loading);
                    }
                    Ok((seq, Err(e))) => {
                        error!("Failed to fetch server status (#{}): {}", seq, e);
                        set_loading(&state_tx, loading);
                    }
                    Err(e) => {
                        error!("Status fetch task failed: {}", e);
                        set_loading(&state_tx, loading);
                    }
                }
            }
        }
    }

    in_flight.abort_all();
}

fn set_loading(state_tx: &watch::Sender<PresenterState>, loading: bool) {
    state_tx.send_if_modified(|state| {
        let changed = state.loading != loading;
        state.loading = loading;
        changed
    });
}
