use futures::TryStreamExt as _;
use tracing::debug;

use crate::board::StoryboardResult;
use crate::config::ClientConfig;
use crate::errors::{ClientError, ServiceError};
use crate::event::Frame;
use crate::session::{self, ByteStream, SessionStream};

/// Minimum prompt length after trimming, enforced before any network call.
pub const MIN_PROMPT_CHARS: usize = 10;

/// Client for the storyboard generation service.
pub struct StoryboardClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl StoryboardClient {
    /// Creates a client from explicit configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        if config.base_url.trim().is_empty() {
            return Err(ClientError::Config("base_url must not be empty".into()));
        }
        if config.placeholder_count == 0 {
            return Err(ClientError::Config(
                "placeholder_count must be greater than 0".into(),
            ));
        }
        if config.update_buffer_capacity == 0 {
            return Err(ClientError::Config(
                "update_buffer_capacity must be greater than 0".into(),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Starts one streaming generation session.
    ///
    /// The prompt is validated locally first; nothing goes on the wire for an
    /// empty or too-short idea. On success the returned handle delivers
    /// `SessionUpdate`s as frames arrive and exactly one terminal update.
    pub async fn start_session(&self, prompt: &str) -> Result<SessionStream, ClientError> {
        let prompt = validate_prompt(prompt)?;
        debug!(chars = prompt.chars().count(), "starting streaming generation");

        let response = self
            .http
            .post(self.config.stream_url())
            .json(&serde_json::json!({ "prompt": prompt }))
            .send()
            .await
            .map_err(|e| ServiceError::transport(format!("failed to open generation stream: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ServiceError::service(
                format!("generation stream request failed with status {status}: {body}"),
                Some(status.as_u16()),
            )
            .into());
        }

        let byte_stream: ByteStream = Box::pin(
            response
                .bytes_stream()
                .map_err(|e| ServiceError::transport(format!("stream read failed: {e}"))),
        );
        Ok(session::spawn(
            byte_stream,
            self.config.placeholder_count,
            self.config.update_buffer_capacity,
        ))
    }

    /// One-shot generation without streaming.
    ///
    /// The reconciliation machinery is not exercised here; the service
    /// returns the whole storyboard in a single JSON payload.
    pub async fn generate(&self, prompt: &str) -> Result<StoryboardResult, ClientError> {
        let prompt = validate_prompt(prompt)?;
        let response = self
            .http
            .post(self.config.generate_url())
            .json(&serde_json::json!({ "prompt": prompt }))
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("generation request failed: {e}")))?;
        let status = response.status();
        let payload: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Transport(format!("invalid generation response: {e}")))?;
        if !status.is_success() || !payload.success {
            let message = payload
                .error
                .unwrap_or_else(|| format!("generation request failed with status {status}"));
            return Err(ClientError::Generation(message));
        }
        Ok(StoryboardResult {
            frames: payload.storyboard,
            narrative: payload.metadata.aldar_story,
        })
    }

    /// Probes the service health endpoint.
    pub async fn health(&self) -> Result<Health, ClientError> {
        let response = self
            .http
            .get(self.config.health_url())
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("health request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Transport(format!(
                "health request failed with status {status}"
            )));
        }
        response
            .json()
            .await
            .map_err(|e| ClientError::Transport(format!("invalid health response: {e}")))
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }
}

/// Service health report.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, serde::Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    storyboard: Vec<Frame>,
    #[serde(default)]
    metadata: GenerateMetadata,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct GenerateMetadata {
    #[serde(default)]
    aldar_story: String,
}

fn validate_prompt(prompt: &str) -> Result<&str, ClientError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(ClientError::Validation("story idea must not be empty".into()));
    }
    if prompt.chars().count() < MIN_PROMPT_CHARS {
        return Err(ClientError::Validation(format!(
            "story idea must be at least {MIN_PROMPT_CHARS} characters"
        )));
    }
    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_prompt_is_rejected_before_any_network_call() {
        let err = validate_prompt("   ").expect_err("empty prompt");
        assert!(matches!(err, ClientError::Validation(msg) if msg.contains("empty")));
    }

    #[test]
    fn short_prompt_is_rejected() {
        let err = validate_prompt("too short").expect_err("short prompt");
        assert!(matches!(err, ClientError::Validation(msg) if msg.contains("10")));
    }

    #[test]
    fn prompt_is_trimmed_before_length_check() {
        assert_eq!(
            validate_prompt("  Aldar Köse and the bai  ").expect("valid prompt"),
            "Aldar Köse and the bai"
        );
    }

    #[test]
    fn client_rejects_zero_placeholder_config() {
        let err = StoryboardClient::new(ClientConfig::default().placeholder_count(0))
            .err()
            .expect("config error");
        assert!(matches!(err, ClientError::Config(msg) if msg.contains("placeholder_count")));
    }

    #[test]
    fn client_rejects_empty_base_url() {
        let err = StoryboardClient::new(ClientConfig::new(""))
            .err()
            .expect("config error");
        assert!(matches!(err, ClientError::Config(msg) if msg.contains("base_url")));
    }

    #[test]
    fn generate_response_parses_service_envelope() {
        let payload: GenerateResponse = serde_json::from_str(
            r#"{"success":true,"storyboard":[{"frame_number":1,"image_url":"/static/generated/f1.png","rhyme":"r","description":"d","moral":"wisdom","shot_type":"wide"}],"metadata":{"aldar_story":"Once..."}}"#,
        )
        .expect("envelope parses");
        assert!(payload.success);
        assert_eq!(payload.storyboard.len(), 1);
        assert_eq!(payload.metadata.aldar_story, "Once...");
    }

    #[test]
    fn generate_failure_envelope_carries_error_message() {
        let payload: GenerateResponse =
            serde_json::from_str(r#"{"success":false,"error":"Prompt cannot be empty"}"#)
                .expect("envelope parses");
        assert!(!payload.success);
        assert_eq!(payload.error.as_deref(), Some("Prompt cannot be empty"));
    }

    #[test]
    fn short_prompt_is_counted_in_chars_not_bytes() {
        // Ten Cyrillic characters are more than ten bytes.
        assert!(validate_prompt("Алдар Көсе").is_ok());
    }
}
