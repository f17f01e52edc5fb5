pub mod build;
pub mod image;
pub mod validate;
pub mod whoami;

use anyhow::Context;
use cvmforge_auth::{AccessConfig, CredentialResolver, SessionFactory};
use cvmforge_builder::BuildConfig;
use cvmforge_tencent::HttpConnector;
use std::path::Path;
use std::sync::Arc;

/// Load a build file and apply defaults, failing on any problem
pub fn load_config(file: &Path) -> anyhow::Result<BuildConfig> {
    let mut config = BuildConfig::load(file)
        .with_context(|| format!("failed to load {}", file.display()))?;
    config.prepare()?;
    Ok(config)
}

/// Resolve credentials and open a session over the signed HTTP transport
pub async fn connect(access: &AccessConfig) -> anyhow::Result<Arc<SessionFactory>> {
    let resolver = CredentialResolver::from_process()?;
    let resolved = resolver
        .resolve(access)
        .await
        .context("failed to resolve credentials")?;
    let session = SessionFactory::connect(resolved, Arc::new(HttpConnector))
        .await
        .context("failed to open a session")?;
    Ok(Arc::new(session))
}
