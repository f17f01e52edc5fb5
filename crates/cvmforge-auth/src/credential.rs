//! Credential and role-assumption types

use crate::error::{AuthError, Result};
use chrono::{DateTime, Duration, Utc};
use cvmforge_cloud::TemporaryCredential;

/// Temporary credentials are treated as expired this long before their
/// reported expiry
pub const EXPIRY_MARGIN_SECS: i64 = 30;

/// Session duration used when none is configured
pub const DEFAULT_SESSION_DURATION: u64 = 7200;

/// Longest session the provider accepts
pub const MAX_SESSION_DURATION: u64 = 43200;

/// Where the effective secret id came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Explicit,
    Environment,
    Profile(String),
    Federated(String),
    AssumedRole(String),
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::Explicit => write!(f, "explicit configuration"),
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Profile(name) => write!(f, "profile '{}'", name),
            CredentialSource::Federated(name) => write!(f, "oauth federation (profile '{}')", name),
            CredentialSource::AssumedRole(arn) => write!(f, "assumed role {}", arn),
        }
    }
}

/// Credential triple plus optional expiry
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub secret_id: String,
    pub secret_key: String,
    pub token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// Long-lived credential without expiry
    pub fn new(secret_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
            secret_key: secret_key.into(),
            token: None,
            expires_at: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.is_empty()).then_some(token);
        self
    }

    pub fn with_expiry(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }

    /// Static credentials never expire; temporary ones expire
    /// [`EXPIRY_MARGIN_SECS`] before their reported expiry.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|at| now >= at - Duration::seconds(EXPIRY_MARGIN_SECS))
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl From<TemporaryCredential> for Credential {
    fn from(tmp: TemporaryCredential) -> Self {
        Credential::new(tmp.secret_id, tmp.secret_key)
            .with_token(tmp.token)
            .with_expiry(tmp.expires_at)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"<redacted>")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Role to assume before any service client is built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssumeRoleSpec {
    pub role_arn: String,
    pub session_name: String,
    pub session_duration: u64,
}

impl AssumeRoleSpec {
    /// Validate the duration; `0` selects [`DEFAULT_SESSION_DURATION`]
    pub fn new(
        role_arn: impl Into<String>,
        session_name: impl Into<String>,
        session_duration: u64,
    ) -> Result<Self> {
        if session_duration > MAX_SESSION_DURATION {
            return Err(AuthError::InvalidSessionDuration(format!(
                "{} is outside 0..={}",
                session_duration, MAX_SESSION_DURATION
            )));
        }
        Ok(Self {
            role_arn: role_arn.into(),
            session_name: session_name.into(),
            session_duration: if session_duration == 0 {
                DEFAULT_SESSION_DURATION
            } else {
                session_duration
            },
        })
    }
}
