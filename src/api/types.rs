//! Polls API types and error definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One selectable option of a poll.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PollOption {
    pub id: String,
    pub title: String,
    /// Votes at the time of the fetch.
    #[serde(default)]
    pub score: u64,
}

/// Poll metadata as returned by `GET /polls/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Poll {
    pub id: String,
    pub title: String,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub options: Vec<PollOption>,
}

impl Poll {
    /// Title of option `option_id`, if the poll has it.
    pub fn option_title(&self, option_id: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.id == option_id)
            .map(|o| o.title.as_str())
    }
}

/// Envelope around a single poll.
#[derive(Debug, Deserialize)]
pub(crate) struct PollEnvelope {
    pub poll: Poll,
}

/// Body of a vote submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VoteRequest<'a> {
    pub poll_option_id: &'a str,
}

/// Errors that can occur talking to the polls API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Base URL cannot be used to build request URLs.
    #[error("invalid API base URL '{0}'")]
    InvalidBaseUrl(String),

    /// Request could not be sent or the response not read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("polls API returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body is not what the API documents.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result type for polls API calls.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_envelope() {
        let body = r#"{
            "poll": {
                "id": "p1",
                "title": "Best language?",
                "createdAt": "2024-05-01T12:00:00Z",
                "options": [
                    { "id": "o1", "title": "Rust", "score": 3 },
                    { "id": "o2", "title": "Other" }
                ]
            }
        }"#;

        let envelope: PollEnvelope = serde_json::from_str(body).unwrap();
        let poll = envelope.poll;
        assert_eq!(poll.id, "p1");
        assert!(poll.created_at.is_some());
        assert_eq!(poll.options.len(), 2);
        assert_eq!(poll.options[0].score, 3);
        assert_eq!(poll.options[1].score, 0);
        assert_eq!(poll.option_title("o2"), Some("Other"));
        assert_eq!(poll.option_title("o3"), None);
    }

    #[test]
    fn test_vote_request_shape() {
        let body = serde_json::to_string(&VoteRequest { poll_option_id: "o1" }).unwrap();
        assert_eq!(body, r#"{"pollOptionId":"o1"}"#);
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::Status {
            status: 404,
            body: "Poll not found.".to_string(),
        };
        assert_eq!(err.to_string(), "polls API returned status 404: Poll not found.");
    }
}
