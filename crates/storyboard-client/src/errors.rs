/// Failures raised while talking to the storyboard service, before they are
/// normalized for the session update stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// Service returned an application-level failure (HTTP status, etc.).
    #[error("service error: {message}")]
    Service {
        message: String,
        status_code: Option<u16>,
    },
    /// Transport or stream I/O failed.
    #[error("transport error: {message}")]
    Transport { message: String },
}

impl ServiceError {
    /// Creates a service-level error.
    pub fn service(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self::Service {
            message: message.into(),
            status_code,
        }
    }

    /// Creates a transport-level error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Returns the human-readable message for this error.
    pub fn message(&self) -> &str {
        match self {
            Self::Service { message, .. } | Self::Transport { message } => message,
        }
    }
}

/// Terminal session failure sent through `SessionUpdate::Failed`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum SessionFailure {
    /// The stream delivered an explicit error event.
    #[error("generation failed: {message}")]
    Generation { message: String },
    /// Network/stream transport failed mid-session.
    #[error("transport failure: {message}")]
    Transport { message: String },
    /// The stream ended or misbehaved without a terminal event.
    #[error("protocol failure: {message}")]
    Protocol { message: String },
}

/// Top-level error type for the public client API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Invalid user input, rejected before any network activity.
    #[error("validation error: {0}")]
    Validation(String),
    /// Transport error surfaced outside a running session.
    #[error("transport error: {0}")]
    Transport(String),
    /// The one-shot generation endpoint reported a failure.
    #[error("generation failed: {0}")]
    Generation(String),
    /// A downstream export call failed.
    #[error("export error: {0}")]
    Export(String),
    /// Service request error before the session stream is established.
    #[error(transparent)]
    Service(#[from] ServiceError),
    /// Terminal failure returned from a started session.
    #[error(transparent)]
    SessionFailed(#[from] SessionFailure),
    /// Internal protocol misuse or invariant violation.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl ClientError {
    pub(crate) fn protocol_msg(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}

pub(crate) fn session_failure_from_service_error(err: &ServiceError) -> SessionFailure {
    match err {
        ServiceError::Service { message, .. } => SessionFailure::Generation {
            message: message.clone(),
        },
        ServiceError::Transport { message } => SessionFailure::Transport {
            message: message.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_maps_onto_session_failure() {
        let transport = ServiceError::transport("read reset");
        assert_eq!(
            session_failure_from_service_error(&transport),
            SessionFailure::Transport {
                message: "read reset".into()
            }
        );
        assert_eq!(transport.message(), "read reset");
    }

    #[test]
    fn session_failure_converts_into_client_error() {
        let err: ClientError = SessionFailure::Generation {
            message: "model offline".into(),
        }
        .into();
        assert!(matches!(err, ClientError::SessionFailed(_)));
        assert_eq!(err.to_string(), "generation failed: model offline");
    }
}
