//! Provider errors and their mapping onto gRPC status codes.

use thiserror::Error;

use crate::client::ApiError;

/// Anything that can make a provider request fail.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The object does not exist on the server.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// The config or state does not satisfy the schema.
    #[error("Invalid configuration: {0}")]
    Validation(String),

    /// A bug or an unexpected server reply.
    #[error("Internal error: {0}")]
    Internal(String),

    /// The provider block is invalid or `Configure` has not run.
    #[error("Provider configuration error: {0}")]
    Configuration(String),

    /// No resource or data source has this type name.
    #[error("Unknown type: {0}")]
    UnknownResource(String),

    /// The configuration API rejected a request or could not be reached.
    #[error("{summary}: {detail}")]
    Api {
        /// What the provider was trying to do.
        summary: String,
        /// HTTP status, absent when no response arrived.
        status: Option<u16>,
        /// Server or client error text.
        detail: String,
    },

    /// State or config bytes were not valid JSON.
    #[error("Malformed JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The gRPC server failed.
    #[error("gRPC transport: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// The type does not support this RPC.
    #[error("Not supported: {0}")]
    Unimplemented(String),

    /// The host sent something unusable, such as a malformed import ID.
    #[error("Bad request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// An [`ApiError`] raised while doing `summary`.
    pub fn api(summary: impl Into<String>, err: ApiError) -> Self {
        Self::Api {
            summary: summary.into(),
            status: err.status(),
            detail: err.detail(),
        }
    }

    /// The message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(m)
            | Self::Validation(m)
            | Self::Internal(m)
            | Self::Configuration(m)
            | Self::UnknownResource(m)
            | Self::Unimplemented(m)
            | Self::InvalidRequest(m) => m,
            Self::Api { detail, .. } => detail,
            Self::Serialization(_) => "malformed JSON",
            Self::Transport(_) => "gRPC transport failure",
        }
    }

    /// Diagnostic summary.
    pub fn summary(&self) -> String {
        match self {
            Self::Api { summary, .. } => summary.clone(),
            other => other.to_string(),
        }
    }

    /// Diagnostic detail; only API failures carry one.
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Api { detail, .. } => Some(format!("Error response: {}", detail)),
            _ => None,
        }
    }

    /// The remote object is missing, whether we noticed or the server said so.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::Api { status: Some(404), .. }
        )
    }

    fn code(&self) -> tonic::Code {
        use tonic::Code;
        match self {
            Self::NotFound(_) | Self::UnknownResource(_) => Code::NotFound,
            Self::Validation(_) | Self::InvalidRequest(_) | Self::Serialization(_) => {
                Code::InvalidArgument
            },
            Self::Configuration(_) => Code::FailedPrecondition,
            Self::Internal(_) => Code::Internal,
            Self::Unimplemented(_) => Code::Unimplemented,
            Self::Transport(_) => Code::Unavailable,
            Self::Api { status, .. } => match status {
                None => Code::Unavailable,
                Some(400) => Code::InvalidArgument,
                Some(401) => Code::Unauthenticated,
                Some(403) => Code::PermissionDenied,
                Some(404) => Code::NotFound,
                Some(409) => Code::AlreadyExists,
                Some(_) => Code::Internal,
            },
        }
    }
}

impl From<ProviderError> for tonic::Status {
    fn from(err: ProviderError) -> Self {
        let message = match &err {
            ProviderError::Api { summary, detail, .. } => format!("{}: {}", summary, detail),
            ProviderError::Serialization(_) | ProviderError::Transport(_) => err.to_string(),
            other => other.message().to_string(),
        };
        tonic::Status::new(err.code(), message)
    }
}
