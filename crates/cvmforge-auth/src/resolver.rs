//! Credential resolution chain
//!
//! Each field is taken from the first layer that provides it:
//!
//! 1. the build file's `access` section
//! 2. `TENCENTCLOUD_*` environment variables
//! 3. the shared profile (`<dir>/<profile>.credential` / `.configure`),
//!    federated through OAuth when the profile type is `oauth`
//!
//! The profile is only read when an earlier layer left something unset.

use crate::access::{AccessConfig, Endpoints, non_empty};
use crate::credential::{AssumeRoleSpec, Credential, CredentialSource};
use crate::env::{self, Environment};
use crate::error::{AuthError, Result};
use crate::federation::{FederationClient, HttpFederationClient, federate};
use crate::profile::{ProfileCredential, ProfileLocation};
use chrono::Utc;
use std::sync::Arc;

/// Everything needed to open a session
#[derive(Debug, Clone)]
pub struct ResolvedAccess {
    pub credential: Credential,
    pub source: CredentialSource,
    pub region: String,
    pub zone: Option<String>,
    pub endpoints: Endpoints,
    pub assume_role: Option<AssumeRoleSpec>,
    pub skip_region_validation: bool,
}

/// Turns an [`AccessConfig`] into a [`ResolvedAccess`]
pub struct CredentialResolver {
    env: Environment,
    federation: Arc<dyn FederationClient>,
}

impl CredentialResolver {
    pub fn new(env: Environment, federation: Arc<dyn FederationClient>) -> Self {
        Self { env, federation }
    }

    /// Resolver over the process environment and the public federation endpoint
    pub fn from_process() -> Result<Self> {
        Ok(Self::new(
            Environment::from_process(),
            Arc::new(HttpFederationClient::new()?),
        ))
    }

    pub async fn resolve(&self, access: &AccessConfig) -> Result<ResolvedAccess> {
        access.validate()?;

        let mut secret_id = self.layered(&access.secret_id, env::SECRET_ID);
        let mut secret_key = self.layered(&access.secret_key, env::SECRET_KEY);
        let mut token = self
            .layered(&access.security_token, env::SECURITY_TOKEN)
            .map(|(v, _)| v);
        let mut expires_at = None;
        let mut source = secret_id
            .as_ref()
            .map(|(_, s)| s.clone())
            .unwrap_or(CredentialSource::Explicit);

        let mut role_arn = self.layered(&access.assume_role.role_arn, env::ASSUME_ROLE_ARN);
        let mut session_name = self.layered(
            &access.assume_role.session_name,
            env::ASSUME_ROLE_SESSION_NAME,
        );
        let explicit_duration = access.assume_role.session_duration.filter(|d| *d > 0);
        let mut profile_duration = None;
        let mut region = self.layered(&access.region, env::REGION).map(|(v, _)| v);

        let location = ProfileLocation::new(
            non_empty(&access.profile).or(self.env.get(env::PROFILE)),
            non_empty(&access.shared_credentials_dir).or(self.env.get(env::SHARED_CREDENTIALS_DIR)),
        )?;

        let need_secret = secret_id.is_none() || secret_key.is_none();
        let need_role = role_arn.is_none() || session_name.is_none();

        if need_secret || need_role {
            let profile = location.load_credential()?;
            if need_secret {
                if let Some(profile) = &profile {
                    let layer = self.profile_secret(&location, profile).await?;
                    if secret_id.is_none() && !layer.secret_id.is_empty() {
                        source = layer_source(&location, profile);
                        secret_id = Some((layer.secret_id, source.clone()));
                        // token and expiry travel with the secret id they belong to
                        if token.is_none() {
                            token = layer.token;
                        }
                        expires_at = layer.expires_at;
                    }
                    if secret_key.is_none() && !layer.secret_key.is_empty() {
                        secret_key = Some((layer.secret_key, layer_source(&location, profile)));
                    }
                } else {
                    tracing::debug!(
                        "no credential file at {}",
                        location.credential_path().display()
                    );
                }
            }
            if let Some(profile) = &profile {
                let from_profile = CredentialSource::Profile(location.name.clone());
                if role_arn.is_none() && !profile.role_arn.is_empty() {
                    role_arn = Some((profile.role_arn.clone(), from_profile.clone()));
                }
                if session_name.is_none() && !profile.role_session_name.is_empty() {
                    session_name = Some((profile.role_session_name.clone(), from_profile));
                }
                if profile.role_session_duration > 0 {
                    profile_duration = Some(profile.role_session_duration);
                }
            }
        }

        let (secret_id, _) = secret_id.ok_or(AuthError::MissingField("secret_id"))?;
        let (secret_key, _) = secret_key.ok_or(AuthError::MissingField("secret_key"))?;

        if region.is_none() {
            region = location.load_region()?;
        }
        let region = region.ok_or(AuthError::MissingRegion)?;

        let assume_role = match (role_arn, session_name) {
            (Some((arn, _)), Some((name, _))) => {
                let duration = match explicit_duration {
                    Some(d) => Some(d),
                    None => self.env_duration()?,
                };
                let duration = duration.or(profile_duration).unwrap_or(0);
                Some(AssumeRoleSpec::new(arn, name, duration)?)
            }
            _ => None,
        };

        let mut credential = Credential::new(secret_id, secret_key).with_expiry(expires_at);
        if let Some(token) = token {
            credential = credential.with_token(token);
        }
        if credential.is_expired() {
            return Err(AuthError::CredentialExpired(source.to_string()));
        }

        tracing::debug!("credential resolved from {}", source);

        Ok(ResolvedAccess {
            credential,
            source,
            region,
            zone: non_empty(&access.zone).map(str::to_string),
            endpoints: access.endpoints(),
            assume_role,
            skip_region_validation: access.skip_region_validation,
        })
    }

    /// Explicit value, else the environment variable
    fn layered(&self, explicit: &Option<String>, var: &str) -> Option<(String, CredentialSource)> {
        if let Some(value) = non_empty(explicit) {
            return Some((value.to_string(), CredentialSource::Explicit));
        }
        self.env
            .get(var)
            .map(|value| (value.to_string(), CredentialSource::Environment))
    }

    fn env_duration(&self) -> Result<Option<u64>> {
        let Some(raw) = self.env.get(env::ASSUME_ROLE_SESSION_DURATION) else {
            return Ok(None);
        };
        raw.parse::<u64>()
            .map(|d| (d > 0).then_some(d))
            .map_err(|_| {
                AuthError::InvalidSessionDuration(format!(
                    "{}={} is not a number of seconds",
                    env::ASSUME_ROLE_SESSION_DURATION,
                    raw
                ))
            })
    }

    /// Secret material provided by the profile, federating if required
    async fn profile_secret(
        &self,
        location: &ProfileLocation,
        profile: &ProfileCredential,
    ) -> Result<Credential> {
        if !profile.is_oauth() {
            let credential = Credential::new(&profile.secret_id, &profile.secret_key)
                .with_expiry(profile.expiry());
            return Ok(if profile.token.is_empty() {
                credential
            } else {
                credential.with_token(&profile.token)
            });
        }

        tracing::info!("federating oauth profile '{}'", location.name);
        let oauth = profile.oauth.as_ref().ok_or(AuthError::OauthNotConfigured)?;
        federate(oauth, self.federation.as_ref(), Utc::now()).await
    }
}

fn layer_source(location: &ProfileLocation, profile: &ProfileCredential) -> CredentialSource {
    if profile.is_oauth() {
        CredentialSource::Federated(location.name.clone())
    } else {
        CredentialSource::Profile(location.name.clone())
    }
}
