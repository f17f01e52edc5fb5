//! Cloud API error types

use thiserror::Error;

/// Code reported for transport failures (connection refused, TLS, reset, ...)
pub const NETWORK_ERROR_CODE: &str = "ClientError.NetworkError";

/// Code reported when the endpoint answers with a non-2xx HTTP status
pub const HTTP_STATUS_ERROR_CODE: &str = "ClientError.HttpStatusCodeError";

/// Codes that are retried when they match exactly
const RETRYABLE_CODES: &[&str] = &[
    NETWORK_ERROR_CODE,
    HTTP_STATUS_ERROR_CODE,
    "InvalidKeyPair.NotSupported",
    "InvalidParameterValue.KeyPairNotSupported",
    "InvalidInstance.NotSupported",
    "OperationDenied.InstanceOperationInProgress",
];

/// Codes that are retried when they appear anywhere in the error code
const RETRYABLE_FRAGMENTS: &[&str] = &[
    "RequestLimitExceeded",
    "InternalError",
    "ResourceInUse",
    "ResourceBusy",
];

/// Cloud API errors
#[derive(Error, Debug)]
pub enum CloudError {
    /// Structured error returned by the provider
    #[error("[TencentCloudSDKError] Code={code}, Message={message}, RequestId={request_id}")]
    Api {
        code: String,
        message: String,
        request_id: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    /// Build a provider error from a code and message
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        CloudError::Api {
            code: code.into(),
            message: message.into(),
            request_id: String::new(),
        }
    }

    /// The provider-style classification code, if this error has one
    pub fn code(&self) -> Option<&str> {
        match self {
            CloudError::Api { code, .. } => Some(code),
            CloudError::Network(_) => Some(NETWORK_ERROR_CODE),
            CloudError::HttpStatus { .. } => Some(HTTP_STATUS_ERROR_CODE),
            _ => None,
        }
    }

    /// Whether the same call may succeed when issued again
    pub fn is_retryable(&self) -> bool {
        self.code().is_some_and(is_retryable_code)
    }
}

/// Classify a provider error code
pub fn is_retryable_code(code: &str) -> bool {
    RETRYABLE_CODES.contains(&code) || RETRYABLE_FRAGMENTS.iter().any(|f| code.contains(f))
}

pub type Result<T> = std::result::Result<T, CloudError>;
