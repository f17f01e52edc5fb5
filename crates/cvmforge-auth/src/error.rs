use cvmforge_cloud::CloudError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error(
        "{0} not found, parameter secret_id and secret_key must be set \
         (directly, via TENCENTCLOUD_SECRET_ID / TENCENTCLOUD_SECRET_KEY, or in a shared credential profile)"
    )]
    MissingField(&'static str),

    #[error("parameter region must be set")]
    MissingRegion,

    #[error("parameter zone must be set")]
    MissingZone,

    #[error("unknown zone: {0}")]
    UnknownZone(String),

    #[error("parameter cvm_endpoint and vpc_endpoint must be set simultaneously")]
    EndpointMismatch,

    #[error("failed to parse {}: {source}", .path.display())]
    ProfileParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid assume role session duration: {0}")]
    InvalidSessionDuration(String),

    #[error("credential from {0} has expired")]
    CredentialExpired(String),

    #[error("Oauth authentication information is not configured correctly")]
    OauthNotConfigured,

    #[error("{endpoint}: {message}")]
    Federation { endpoint: String, message: String },

    #[error("home directory not found")]
    HomeDirNotFound,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<AuthError> for CloudError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Cloud(e) => e,
            other => CloudError::AuthenticationFailed(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
