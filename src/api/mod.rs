//! Polls REST API subsystem.
//!
//! # Data Flow
//! ```text
//! results view opened
//!     → client.rs fetch_poll (GET /polls/{id})
//!     → Poll (title, options, scores)
//!     → seeds the live channel's tally and option set
//! ```
//!
//! The API is a collaborator this crate consumes; only the calls needed to
//! seed and vote are modelled.

pub mod client;
pub mod types;

pub use client::PollsClient;
pub use types::{ApiError, ApiResult, Poll, PollOption};
