//! Inbound live results messages.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The current vote count for one poll option, as asserted by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteDelta {
    pub poll_option_id: String,
    pub votes: u64,
}

/// Why an inbound frame was not a usable delta.
#[derive(Debug, Error)]
pub enum DeltaError {
    #[error("malformed delta: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("delta names an empty option id")]
    EmptyOptionId,
}

impl VoteDelta {
    /// Parse a JSON text frame.
    pub fn parse(text: &str) -> Result<Self, DeltaError> {
        let delta: VoteDelta = serde_json::from_str(text)?;
        if delta.poll_option_id.is_empty() {
            return Err(DeltaError::EmptyOptionId);
        }
        Ok(delta)
    }
}

impl FromStr for VoteDelta {
    type Err = DeltaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
