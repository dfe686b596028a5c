//! REST client for the polls API.
//!
//! # Responsibilities
//! - Fetch a poll snapshot used to seed a results view
//! - Submit votes
//! - Map transport, status and decoding failures to [`ApiError`]

use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::api::types::{ApiError, ApiResult, Poll, PollEnvelope, VoteRequest};
use crate::config::ClientConfig;

/// Polls API client.
#[derive(Debug, Clone)]
pub struct PollsClient {
    client: Client,
    base_url: Url,
}

impl PollsClient {
    /// Create a client for the API rooted at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let base_url: Url = base_url
            .parse()
            .map_err(|_| ApiError::InvalidBaseUrl(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ClientConfig) -> ApiResult<Self> {
        Self::new(
            &config.server.api_base_url,
            Duration::from_secs(config.api.timeout_secs),
        )
    }

    /// `GET /polls/{id}`.
    pub async fn fetch_poll(&self, poll_id: &str) -> ApiResult<Poll> {
        let url = self.poll_url(poll_id, None);
        tracing::debug!(url = %url, "Fetching poll");

        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: PollEnvelope = serde_json::from_str(&text)?;
        tracing::info!(
            poll_id = %envelope.poll.id,
            options = envelope.poll.options.len(),
            "Poll fetched"
        );
        Ok(envelope.poll)
    }

    /// `POST /polls/{id}/votes`.
    pub async fn cast_vote(&self, poll_id: &str, option_id: &str) -> ApiResult<()> {
        let url = self.poll_url(poll_id, Some("votes"));

        let resp = self
            .client
            .post(url)
            .json(&VoteRequest {
                poll_option_id: option_id,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(poll_id = %poll_id, option_id = %option_id, "Vote submitted");
        Ok(())
    }

    fn poll_url(&self, poll_id: &str, tail: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in new()
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("polls").push(poll_id);
            if let Some(tail) = tail {
                segments.push(tail);
            }
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_urls() {
        let client = PollsClient::new("http://localhost:3333", Duration::from_secs(1)).unwrap();
        assert_eq!(client.poll_url("p1", None).as_str(), "http://localhost:3333/polls/p1");
        assert_eq!(
            client.poll_url("p1", Some("votes")).as_str(),
            "http://localhost:3333/polls/p1/votes"
        );
    }

    #[test]
    fn test_base_path_preserved() {
        let client = PollsClient::new("https://example.com/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.poll_url("a b", None).as_str(),
            "https://example.com/api/polls/a%20b"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            PollsClient::new("not a url", Duration::from_secs(1)),
            Err(ApiError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            PollsClient::new("mailto:someone@example.com", Duration::from_secs(1)),
            Err(ApiError::InvalidBaseUrl(_))
        ));
    }
}
