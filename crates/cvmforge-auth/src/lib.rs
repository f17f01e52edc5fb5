//! cvmforge credential and session layer
//!
//! [`CredentialResolver`] merges the build file's `access` section, the
//! `TENCENTCLOUD_*` environment and the shared `tccli` profile into one
//! [`ResolvedAccess`]. [`SessionFactory::connect`] turns that into an
//! authorized [`cvmforge_cloud::ClientProvider`].

pub mod access;
pub mod credential;
pub mod env;
pub mod error;
pub mod federation;
pub mod profile;
pub mod resolver;
pub mod session;

pub use access::{AccessConfig, AssumeRoleConfig, Endpoints};
pub use credential::{
    AssumeRoleSpec, Credential, CredentialSource, DEFAULT_SESSION_DURATION, EXPIRY_MARGIN_SECS,
    MAX_SESSION_DURATION,
};
pub use env::Environment;
pub use error::{AuthError, Result};
pub use federation::{
    DEFAULT_FEDERATION_ENDPOINT, FederationClient, HttpFederationClient, RefreshedToken, federate,
};
pub use profile::{DEFAULT_PROFILE, OauthBlock, ProfileCredential, ProfileLocation};
pub use resolver::{CredentialResolver, ResolvedAccess};
pub use session::{ServiceConnector, ServiceTarget, SessionFactory};
