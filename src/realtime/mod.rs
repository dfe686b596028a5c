//! Live poll results subsystem.
//!
//! # Data Flow
//! ```text
//! LiveResultsChannel::open(poll_id)
//!     → net::endpoint (ws/wss URL)
//!     → session task: connect → Open
//!         → text frame → messages.rs (VoteDelta) → tally.rs (last write wins)
//!         → watch::Sender<ResultsView> notifies readers
//!     → connection ended → Closed → resilience (delay) → Reconnecting → Connecting
//!     → attempts exhausted → Abandoned (view flagged stale)
//! LiveResultsChannel::close() / drop
//!     → generation bumped, shutdown signalled, state Idle, tally kept
//! ```
//!
//! # Design Decisions
//! - One session task per open; the handle never touches the socket
//! - Stale sessions are fenced off by generation, not by timing
//! - Errors are logged and reflected in state, never returned to `open`

pub mod channel;
pub mod messages;
pub mod state;
pub mod tally;

pub use channel::{LiveResultsChannel, ResultsView};
pub use messages::{DeltaError, VoteDelta};
pub use state::{ChannelState, CloseReason};
pub use tally::{ApplyOutcome, PollOptionTally, Tally};
