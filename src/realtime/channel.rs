//! Live results channel.
//!
//! # Responsibilities
//! - Hold at most one live connection for one poll results view
//! - Apply inbound deltas to the view's tally in delivery order
//! - Reconnect with exponential backoff; abandon after the attempt ceiling
//! - Publish tally and state to readers through a `watch` channel
//!
//! # Concurrency
//! Each `open` spawns one session task that drives the state machine. Every
//! session carries a generation number; `close` bumps the shared generation
//! while holding the view lock, and sessions only publish while their
//! generation is current. A session that lost the race with `close` (or with
//! a newer `open`) can therefore never touch the tally again.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use url::Url;

use crate::api::Poll;
use crate::config::ClientConfig;
use crate::net::connection::ConnectionTracker;
use crate::net::endpoint::{EndpointResolver, InvalidHost, PageScheme};
use crate::net::transport::{Connection, Connector, WsConnector};
use crate::observability::metrics;
use crate::realtime::messages::VoteDelta;
use crate::realtime::state::{ChannelState, CloseReason};
use crate::realtime::tally::{ApplyOutcome, Tally};
use crate::resilience::ReconnectPolicy;

/// What a results view renders: the tally plus channel health.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultsView {
    /// Poll the tally belongs to; `None` until the first `open`.
    pub poll_id: Option<String>,
    pub tally: Tally,
    pub state: ChannelState,
}

impl ResultsView {
    /// A view of a fetched snapshot, not attached to any channel.
    pub fn from_poll(poll: &Poll) -> Self {
        Self {
            poll_id: Some(poll.id.clone()),
            tally: seed_tally(poll),
            state: ChannelState::Idle,
        }
    }

    /// Live updates stopped for good; counts are last known values.
    pub fn is_stale(&self) -> bool {
        self.state.is_abandoned()
    }
}

fn seed_tally(poll: &Poll) -> Tally {
    Tally::fixed(poll.options.iter().map(|o| (o.id.clone(), o.score)))
}

/// State shared between the channel handle and its session task.
#[derive(Debug)]
struct Shared {
    generation: AtomicU64,
    view: watch::Sender<ResultsView>,
}

impl Shared {
    fn new() -> Self {
        let (view, _) = watch::channel(ResultsView::default());
        Self {
            generation: AtomicU64::new(0),
            view,
        }
    }

    /// Start a new generation for `poll_id`. Replaces the tally when one is given.
    fn begin(&self, poll_id: &str, tally: Option<Tally>) -> u64 {
        let mut generation = 0;
        self.view.send_modify(|view| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(tally) = tally {
                view.tally = tally;
            }
            view.poll_id = Some(poll_id.to_string());
            view.state = ChannelState::Connecting;
        });
        generation
    }

    /// Retire the current generation and go idle. The tally is kept.
    fn retire(&self) {
        self.view.send_modify(|view| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            view.state = ChannelState::Idle;
        });
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Publish `state` on behalf of `generation`. False if the generation is stale.
    fn set_state(&self, generation: u64, state: ChannelState) -> bool {
        let mut current = false;
        self.view.send_if_modified(|view| {
            current = self.is_current(generation);
            if current && view.state != state {
                view.state = state;
                return true;
            }
            false
        });
        current
    }

    /// Apply `delta` on behalf of `generation`. `None` if the generation is stale.
    fn apply_delta(&self, generation: u64, delta: &VoteDelta) -> Option<ApplyOutcome> {
        let mut outcome = None;
        self.view.send_if_modified(|view| {
            if !self.is_current(generation) {
                return false;
            }
            let applied = view.tally.apply(delta);
            outcome = Some(applied);
            matches!(applied, ApplyOutcome::Updated { previous } if previous != Some(delta.votes))
        });
        outcome
    }
}

/// Handle on the running session task.
#[derive(Debug)]
struct ActiveSession {
    poll_id: String,
    generation: u64,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Keeps one poll's local tally in sync with the server's live results feed.
///
/// Dropping the channel closes it.
pub struct LiveResultsChannel<C: Connector = WsConnector> {
    connector: Arc<C>,
    resolver: EndpointResolver,
    scheme: PageScheme,
    policy: ReconnectPolicy,
    tracker: ConnectionTracker,
    shared: Arc<Shared>,
    session: Option<ActiveSession>,
}

impl LiveResultsChannel<WsConnector> {
    /// WebSocket-backed channel configured from `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, InvalidHost> {
        let resolver = EndpointResolver::new(&config.server.host)?;
        let connector = WsConnector::new(std::time::Duration::from_secs(
            config.reconnect.connect_timeout_secs,
        ));
        Ok(Self::new(
            connector,
            resolver,
            config.server.page_scheme,
            ReconnectPolicy::from(&config.reconnect),
        ))
    }
}

impl<C: Connector> LiveResultsChannel<C> {
    pub fn new(
        connector: C,
        resolver: EndpointResolver,
        scheme: PageScheme,
        policy: ReconnectPolicy,
    ) -> Self {
        Self {
            connector: Arc::new(connector),
            resolver,
            scheme,
            policy,
            tracker: ConnectionTracker::new(),
            shared: Arc::new(Shared::new()),
            session: None,
        }
    }

    /// Start following `poll_id`.
    ///
    /// No-op while a session is running. Reopening the same poll after a
    /// close or abandonment keeps the tally; a different poll starts from an
    /// empty tally that learns options from the deltas.
    pub fn open(&mut self, poll_id: &str) {
        if self.is_running(poll_id) {
            return;
        }

        let same_poll = self.shared.view.borrow().poll_id.as_deref() == Some(poll_id);
        let tally = if same_poll { None } else { Some(Tally::open()) };
        self.start(poll_id, tally);
    }

    /// Start following a fetched poll, seeding the tally with its options
    /// and scores. Deltas for options outside the snapshot are ignored.
    pub fn open_seeded(&mut self, poll: &Poll) {
        if self.is_running(&poll.id) {
            return;
        }
        self.start(&poll.id, Some(seed_tally(poll)));
    }

    fn is_running(&self, poll_id: &str) -> bool {
        let Some(session) = &self.session else {
            return false;
        };
        // An abandoned session may still be winding down; it no longer counts.
        if session.task.is_finished() || self.shared.view.borrow().state.is_abandoned() {
            return false;
        }

        if session.poll_id == poll_id {
            tracing::debug!(poll_id = %poll_id, "Channel already open");
        } else {
            tracing::warn!(
                open_poll = %session.poll_id,
                requested_poll = %poll_id,
                "Channel is following another poll, close it first"
            );
        }
        true
    }

    fn start(&mut self, poll_id: &str, tally: Option<Tally>) {
        // Handle of a finished (abandoned) session, if any.
        self.session = None;

        let url = self.resolver.resolve(self.scheme, poll_id);
        let generation = self.shared.begin(poll_id, tally);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let session = Session {
            connector: Arc::clone(&self.connector),
            url,
            poll_id: poll_id.to_string(),
            generation,
            policy: self.policy.clone(),
            tracker: self.tracker.clone(),
            shared: Arc::clone(&self.shared),
        };

        tracing::info!(poll_id = %poll_id, generation, "Opening live results channel");

        self.session = Some(ActiveSession {
            poll_id: poll_id.to_string(),
            generation,
            shutdown: shutdown_tx,
            task: tokio::spawn(session.run(shutdown_rx)),
        });
    }

    /// Stop following. Releases the connection and cancels any pending
    /// reconnect; the tally stays as last seen.
    pub fn close(&mut self) {
        let _ = self.detach();
    }

    /// [`close`](Self::close), then wait for the session task to finish.
    pub async fn close_and_wait(&mut self) {
        if let Some(task) = self.detach() {
            let _ = task.await;
        }
    }

    fn detach(&mut self) -> Option<JoinHandle<()>> {
        let session = self.session.take()?;
        self.shared.retire();
        let _ = session.shutdown.send(());
        tracing::info!(
            poll_id = %session.poll_id,
            generation = session.generation,
            "Live results channel closed"
        );
        Some(session.task)
    }

    /// Receiver notified on every tally or state change.
    pub fn subscribe(&self) -> watch::Receiver<ResultsView> {
        self.shared.view.subscribe()
    }

    /// Snapshot of the current view.
    pub fn view(&self) -> ResultsView {
        self.shared.view.borrow().clone()
    }

    pub fn state(&self) -> ChannelState {
        self.shared.view.borrow().state.clone()
    }

    /// Live connections currently held; never more than one.
    pub fn active_connections(&self) -> u64 {
        self.tracker.active_count()
    }
}

impl<C: Connector> Drop for LiveResultsChannel<C> {
    fn drop(&mut self) {
        self.close();
    }
}

/// One open..close span of a channel, run as a task.
struct Session<C: Connector> {
    connector: Arc<C>,
    url: Url,
    poll_id: String,
    generation: u64,
    policy: ReconnectPolicy,
    tracker: ConnectionTracker,
    shared: Arc<Shared>,
}

/// How a connected stretch of a session ended.
enum Ended {
    Closed(CloseReason),
    /// Shutdown requested or generation superseded; the session must stop.
    Stop,
}

impl<C: Connector> Session<C> {
    async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        loop {
            if !self.transition(ChannelState::Connecting) {
                return;
            }
            metrics::record_connect_attempt();

            let connected = tokio::select! {
                result = self.connector.connect(&self.url) => Some(result),
                _ = &mut shutdown => None,
            };

            let reason = match connected {
                None => return,
                Some(Ok(conn)) => match self.pump(conn, &mut shutdown).await {
                    Ended::Closed(reason) => reason,
                    Ended::Stop => return,
                },
                Some(Err(e)) => CloseReason::ConnectFailed(e.to_string()),
            };

            tracing::warn!(
                poll_id = %self.poll_id,
                reason = %reason,
                attempt = self.policy.attempt(),
                "Live results connection ended"
            );
            if !self.transition(ChannelState::Closed(reason)) {
                return;
            }

            // The only place a reconnection is triggered.
            let Some(delay) = self.policy.next_delay() else {
                self.transition(ChannelState::Abandoned);
                metrics::record_channel_abandoned();
                tracing::warn!(
                    poll_id = %self.poll_id,
                    max_attempts = self.policy.max_attempts(),
                    "Reconnection attempts exhausted, results may be out of date"
                );
                return;
            };

            let attempt = self.policy.attempt();
            if !self.transition(ChannelState::Reconnecting { attempt, delay }) {
                return;
            }
            metrics::record_reconnect_scheduled();
            tracing::info!(
                poll_id = %self.poll_id,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Scheduling reconnection"
            );

            let woke = tokio::select! {
                _ = tokio::time::sleep(delay) => true,
                _ = &mut shutdown => false,
            };
            if !woke {
                return;
            }
        }
    }

    /// Read frames until the connection ends or the session is told to stop.
    async fn pump(
        &mut self,
        mut conn: C::Connection,
        shutdown: &mut oneshot::Receiver<()>,
    ) -> Ended {
        let guard = self.tracker.track();
        self.policy.reset();

        if !self.transition(ChannelState::Open) {
            conn.close().await;
            return Ended::Stop;
        }
        tracing::info!(
            poll_id = %self.poll_id,
            connection_id = %guard.id(),
            "Live results connection open"
        );

        loop {
            let frame = tokio::select! {
                frame = conn.next_text() => Some(frame),
                _ = &mut *shutdown => None,
            };

            match frame {
                None => {
                    conn.close().await;
                    return Ended::Stop;
                }
                Some(Some(Ok(text))) => {
                    if !self.on_frame(&text) {
                        conn.close().await;
                        return Ended::Stop;
                    }
                }
                Some(Some(Err(e))) => return Ended::Closed(CloseReason::TransportError(e.to_string())),
                Some(None) => return Ended::Closed(CloseReason::ServerClosed),
            }
        }
    }

    /// Apply one inbound frame. False if this session has been superseded.
    fn on_frame(&self, text: &str) -> bool {
        let delta = match VoteDelta::parse(text) {
            Ok(delta) => delta,
            Err(e) => {
                tracing::debug!(poll_id = %self.poll_id, error = %e, "Discarding malformed delta");
                metrics::record_message_discarded("malformed");
                return true;
            }
        };

        match self.shared.apply_delta(self.generation, &delta) {
            None => false,
            Some(ApplyOutcome::UnknownOption) => {
                tracing::debug!(
                    poll_id = %self.poll_id,
                    option_id = %delta.poll_option_id,
                    "Discarding delta for unknown option"
                );
                metrics::record_message_discarded("unknown_option");
                true
            }
            Some(ApplyOutcome::Updated { .. }) => {
                metrics::record_delta_applied();
                tracing::trace!(
                    poll_id = %self.poll_id,
                    option_id = %delta.poll_option_id,
                    votes = delta.votes,
                    "Delta applied"
                );
                true
            }
        }
    }

    fn transition(&self, state: ChannelState) -> bool {
        let label = state.label();
        let current = self.shared.set_state(self.generation, state);
        if current {
            tracing::debug!(poll_id = %self.poll_id, state = label, "Channel state changed");
        }
        current
    }
}
