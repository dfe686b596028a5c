//! Live results channel state machine.
//!
//! # State Transitions
//! ```text
//! Idle → Connecting: open()
//! Connecting → Open: connection established (attempt counter reset)
//! Connecting → Closed: connect failed
//! Open → Closed: server closed or transport error
//! Closed → Reconnecting → Connecting: attempts left, after backoff delay
//! Closed → Abandoned: attempts exhausted (terminal)
//! any → Idle: close()
//! ```
//!
//! Every ended connection, including a failed connect, is reported as
//! `Closed` before the attempt budget is checked. `Connecting → Abandoned`
//! therefore always passes through `Closed`.

use std::fmt;
use std::time::Duration;

/// Why a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Peer closed the connection.
    ServerClosed,
    /// The established connection broke.
    TransportError(String),
    /// The connection could not be established.
    ConnectFailed(String),
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServerClosed => write!(f, "server closed"),
            Self::TransportError(e) => write!(f, "transport error: {}", e),
            Self::ConnectFailed(e) => write!(f, "connect failed: {}", e),
        }
    }
}

/// Lifecycle state of a live results channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChannelState {
    #[default]
    Idle,
    Connecting,
    Open,
    Closed(CloseReason),
    /// Waiting `delay` before reconnection attempt number `attempt` (1-based).
    Reconnecting { attempt: u32, delay: Duration },
    /// Reconnection attempts exhausted; no further automatic reconnects.
    Abandoned,
}

impl ChannelState {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    pub fn is_abandoned(&self) -> bool {
        matches!(self, Self::Abandoned)
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed(_) => "closed",
            Self::Reconnecting { .. } => "reconnecting",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed(reason) => write!(f, "closed ({})", reason),
            Self::Reconnecting { attempt, delay } => {
                write!(f, "reconnecting (attempt {} in {}ms)", attempt, delay.as_millis())
            }
            other => f.write_str(other.label()),
        }
    }
}
