//! Outbound Slack Web API access.
//!
//! The runtime only needs "send/update/delete this payload"; everything
//! is behind [`SlackApiClient`] so tests and embedders can substitute
//! their own transport. [`HttpApiClient`] is the production
//! implementation over `reqwest` with bearer auth.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use blocks_kit::{Block, View};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("api request failed: {0}")]
    Transport(String),
    #[error("slack rejected the call: {0}")]
    Slack(String),
    #[error("api response was not valid JSON: {0}")]
    Decode(String),
}

#[async_trait]
pub trait SlackApiClient: Send + Sync {
    async fn views_open(&self, trigger_id: &str, view: &View) -> Result<(), ApiError>;
    async fn views_update(&self, view_id: &str, view: &View) -> Result<(), ApiError>;
    async fn views_push(&self, trigger_id: &str, view: &View) -> Result<(), ApiError>;
    /// Posts a message; returns its timestamp.
    async fn post_message(
        &self,
        channel: &str,
        fallback: &str,
        blocks: &[Block],
    ) -> Result<String, ApiError>;
    async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        fallback: &str,
        blocks: &[Block],
    ) -> Result<(), ApiError>;
    async fn delete_message(&self, channel: &str, ts: &str) -> Result<(), ApiError>;
    /// Posts a raw payload to an interaction's `response_url`.
    async fn respond(&self, response_url: &str, payload: &Value) -> Result<(), ApiError>;
}

/// Swallows every call. The default for tests and dry runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopApiClient;

#[async_trait]
impl SlackApiClient for NoopApiClient {
    async fn views_open(&self, trigger_id: &str, _view: &View) -> Result<(), ApiError> {
        debug!(trigger_id, "noop views.open");
        Ok(())
    }

    async fn views_update(&self, view_id: &str, _view: &View) -> Result<(), ApiError> {
        debug!(view_id, "noop views.update");
        Ok(())
    }

    async fn views_push(&self, trigger_id: &str, _view: &View) -> Result<(), ApiError> {
        debug!(trigger_id, "noop views.push");
        Ok(())
    }

    async fn post_message(
        &self,
        channel: &str,
        _fallback: &str,
        _blocks: &[Block],
    ) -> Result<String, ApiError> {
        debug!(channel, "noop chat.postMessage");
        Ok("0000000000.000000".to_owned())
    }

    async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        _fallback: &str,
        _blocks: &[Block],
    ) -> Result<(), ApiError> {
        debug!(channel, ts, "noop chat.update");
        Ok(())
    }

    async fn delete_message(&self, channel: &str, ts: &str) -> Result<(), ApiError> {
        debug!(channel, ts, "noop chat.delete");
        Ok(())
    }

    async fn respond(&self, response_url: &str, _payload: &Value) -> Result<(), ApiError> {
        debug!(response_url, "noop response_url post");
        Ok(())
    }
}

pub struct HttpApiClient {
    http: reqwest::Client,
    bot_token: SecretString,
    base_url: String,
}

impl HttpApiClient {
    pub fn new(bot_token: SecretString) -> Self {
        Self::with_base_url(bot_token, "https://slack.com/api")
    }

    pub fn with_base_url(bot_token: SecretString, base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), bot_token, base_url: base_url.into() }
    }

    async fn call(&self, method: &str, payload: Value) -> Result<Value, ApiError> {
        let url = format!("{}/{method}", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.bot_token.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|source| ApiError::Transport(source.to_string()))?;
        let body: Value = response
            .json()
            .await
            .map_err(|source| ApiError::Decode(source.to_string()))?;

        if body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
            Ok(body)
        } else {
            let error = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown_error")
                .to_owned();
            Err(ApiError::Slack(error))
        }
    }
}

#[async_trait]
impl SlackApiClient for HttpApiClient {
    async fn views_open(&self, trigger_id: &str, view: &View) -> Result<(), ApiError> {
        self.call("views.open", json!({"trigger_id": trigger_id, "view": view})).await?;
        Ok(())
    }

    async fn views_update(&self, view_id: &str, view: &View) -> Result<(), ApiError> {
        self.call("views.update", json!({"view_id": view_id, "view": view})).await?;
        Ok(())
    }

    async fn views_push(&self, trigger_id: &str, view: &View) -> Result<(), ApiError> {
        self.call("views.push", json!({"trigger_id": trigger_id, "view": view})).await?;
        Ok(())
    }

    async fn post_message(
        &self,
        channel: &str,
        fallback: &str,
        blocks: &[Block],
    ) -> Result<String, ApiError> {
        let body = self
            .call(
                "chat.postMessage",
                json!({"channel": channel, "text": fallback, "blocks": blocks}),
            )
            .await?;
        body.get("ts")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| ApiError::Decode("chat.postMessage response without ts".to_owned()))
    }

    async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        fallback: &str,
        blocks: &[Block],
    ) -> Result<(), ApiError> {
        self.call(
            "chat.update",
            json!({"channel": channel, "ts": ts, "text": fallback, "blocks": blocks}),
        )
        .await?;
        Ok(())
    }

    async fn delete_message(&self, channel: &str, ts: &str) -> Result<(), ApiError> {
        self.call("chat.delete", json!({"channel": channel, "ts": ts})).await?;
        Ok(())
    }

    async fn respond(&self, response_url: &str, payload: &Value) -> Result<(), ApiError> {
        let response = self
            .http
            .post(response_url)
            .json(payload)
            .send()
            .await
            .map_err(|source| ApiError::Transport(source.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ApiError::Slack(format!("response_url status {}", response.status())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NoopApiClient, SlackApiClient};

    #[tokio::test]
    async fn noop_client_acknowledges_every_call() {
        let client = NoopApiClient;
        let ts = client.post_message("C1", "fallback", &[]).await.expect("post");
        assert!(!ts.is_empty());
        client.delete_message("C1", &ts).await.expect("delete");
    }
}
