//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Live connection ended:
//!     → reconnect.rs (attempt budget left? count it)
//!     → backoff.rs (base * 2^attempt)
//!     → channel sleeps, then reconnects; or abandons when exhausted
//! ```
//!
//! # Design Decisions
//! - One ended connection is one attempt, whatever signalled it
//! - No jitter
//! - Successful open resets the budget

pub mod backoff;
pub mod reconnect;

pub use reconnect::ReconnectPolicy;
