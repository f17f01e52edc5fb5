//! OAuth federation for `oauth` profiles
//!
//! An `oauth` profile carries a refresh token instead of a static secret.
//! [`federate`] refreshes the access token when it is about to expire and then
//! exchanges it for a temporary credential.

use crate::credential::{Credential, EXPIRY_MARGIN_SECS};
use crate::error::{AuthError, Result};
use crate::profile::{OauthBlock, unix_time};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Federation service base URL
pub const DEFAULT_FEDERATION_ENDPOINT: &str = "https://cli.cloud.tencent.com";

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Fresh access token returned by the refresh call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshedToken {
    pub access_token: String,
    /// Unix seconds, 0 when not reported
    pub expires_at: i64,
}

/// The two federation calls
#[async_trait]
pub trait FederationClient: Send + Sync {
    async fn refresh_user_token(
        &self,
        refresh_token: &str,
        open_id: &str,
        site: &str,
    ) -> Result<RefreshedToken>;

    async fn get_temp_cred(&self, access_token: &str, site: &str) -> Result<Credential>;
}

/// Refresh if needed, then exchange the access token for a temporary credential
pub async fn federate(
    oauth: &OauthBlock,
    client: &dyn FederationClient,
    now: DateTime<Utc>,
) -> Result<Credential> {
    if oauth.open_id.is_empty() || oauth.refresh_token.is_empty() {
        return Err(AuthError::OauthNotConfigured);
    }

    let mut access_token = oauth.access_token.clone();
    let expiring = oauth
        .expiry()
        .is_some_and(|at| now + Duration::seconds(EXPIRY_MARGIN_SECS) > at);

    if expiring {
        tracing::debug!("oauth access token expires soon, refreshing");
        let refreshed = client
            .refresh_user_token(&oauth.refresh_token, &oauth.open_id, &oauth.site)
            .await?;
        if !refreshed.access_token.is_empty() {
            access_token = refreshed.access_token;
        }
    }

    client.get_temp_cred(&access_token, &oauth.site).await
}

/// reqwest-backed [`FederationClient`]
pub struct HttpFederationClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpFederationClient {
    pub fn new() -> Result<Self> {
        Self::with_endpoint(DEFAULT_FEDERATION_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post<B, R>(&self, route: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de> + FederationResponse,
    {
        let url = format!("{}/{}", self.endpoint, route);
        tracing::debug!("POST {}", url);

        let response: R = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await?
            .json()
            .await?;

        match response.error() {
            Some(message) => Err(AuthError::Federation {
                endpoint: route.to_string(),
                message: message.to_string(),
            }),
            None => Ok(response),
        }
    }
}

#[async_trait]
impl FederationClient for HttpFederationClient {
    async fn refresh_user_token(
        &self,
        refresh_token: &str,
        open_id: &str,
        site: &str,
    ) -> Result<RefreshedToken> {
        let body = RefreshTokenRequest {
            trace_id: trace_id(),
            refresh_token,
            open_id,
            site,
        };
        let response: RefreshTokenResponse = self.post("refresh_user_token", &body).await?;
        Ok(RefreshedToken {
            access_token: response.access_token,
            expires_at: response.expires_at,
        })
    }

    async fn get_temp_cred(&self, access_token: &str, site: &str) -> Result<Credential> {
        let body = TempCredRequest {
            trace_id: trace_id(),
            access_token,
            site,
        };
        let response: TempCredResponse = self.post("get_temp_cred", &body).await?;
        Ok(Credential::new(response.secret_id, response.secret_key)
            .with_token(response.token)
            .with_expiry(unix_time(response.expires_at)))
    }
}

fn trace_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

trait FederationResponse {
    fn error(&self) -> Option<&str>;
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct RefreshTokenRequest<'a> {
    trace_id: String,
    refresh_token: &'a str,
    open_id: &'a str,
    site: &'a str,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct RefreshTokenResponse {
    access_token: String,
    expires_at: i64,
    error: String,
}

impl FederationResponse for RefreshTokenResponse {
    fn error(&self) -> Option<&str> {
        Some(self.error.as_str()).filter(|e| !e.is_empty())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct TempCredRequest<'a> {
    trace_id: String,
    access_token: &'a str,
    site: &'a str,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct TempCredResponse {
    secret_id: String,
    secret_key: String,
    token: String,
    expires_at: i64,
    error: String,
}

impl FederationResponse for TempCredResponse {
    fn error(&self) -> Option<&str> {
        Some(self.error.as_str()).filter(|e| !e.is_empty())
    }
}
