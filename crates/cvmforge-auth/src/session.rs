//! Authorized, memoized service clients for one build

use crate::credential::{AssumeRoleSpec, Credential};
use crate::error::{AuthError, Result};
use crate::resolver::ResolvedAccess;
use async_trait::async_trait;
use cvmforge_cloud::{
    CamApi, ClientProvider, CvmApi, OrgApi, RetryPolicy, StsApi, VpcApi, validate_region,
};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Credential, region and optional endpoint for one service client
#[derive(Debug, Clone, Copy)]
pub struct ServiceTarget<'a> {
    pub credential: &'a Credential,
    pub region: &'a str,
    pub endpoint: Option<&'a str>,
}

/// Builds concrete service clients (the HTTP transport in production,
/// fakes in tests)
pub trait ServiceConnector: Send + Sync {
    fn cvm(&self, target: ServiceTarget<'_>) -> cvmforge_cloud::Result<Arc<dyn CvmApi>>;
    fn vpc(&self, target: ServiceTarget<'_>) -> cvmforge_cloud::Result<Arc<dyn VpcApi>>;
    fn sts(&self, target: ServiceTarget<'_>) -> cvmforge_cloud::Result<Arc<dyn StsApi>>;
    fn cam(&self, target: ServiceTarget<'_>) -> cvmforge_cloud::Result<Arc<dyn CamApi>>;
    fn org(&self, target: ServiceTarget<'_>) -> cvmforge_cloud::Result<Arc<dyn OrgApi>>;
}

#[derive(Default)]
struct Clients {
    cvm: Option<Arc<dyn CvmApi>>,
    vpc: Option<Arc<dyn VpcApi>>,
    cam: Option<Arc<dyn CamApi>>,
    org: Option<Arc<dyn OrgApi>>,
}

struct SessionState {
    credential: Credential,
    clients: Clients,
}

/// Session over one region.
///
/// Clients are built on first use and reused afterwards. When the working
/// credential came from role assumption and is about to expire, the role is
/// assumed again and every memoized client is dropped. Any other expiring
/// credential fails with [`AuthError::CredentialExpired`].
pub struct SessionFactory {
    access: ResolvedAccess,
    zone: String,
    connector: Arc<dyn ServiceConnector>,
    retry: RetryPolicy,
    state: Mutex<SessionState>,
}

impl SessionFactory {
    /// Validate region and zone, assume the configured role, and confirm the
    /// zone exists in the region
    pub async fn connect(
        access: ResolvedAccess,
        connector: Arc<dyn ServiceConnector>,
    ) -> Result<Self> {
        Self::connect_with_retry(access, connector, RetryPolicy::default()).await
    }

    pub async fn connect_with_retry(
        access: ResolvedAccess,
        connector: Arc<dyn ServiceConnector>,
        retry: RetryPolicy,
    ) -> Result<Self> {
        if !access.skip_region_validation && access.endpoints.cvm.is_none() {
            validate_region(&access.region)?;
        }

        let zone = access
            .zone
            .clone()
            .filter(|z| !z.trim().is_empty())
            .ok_or(AuthError::MissingZone)?;

        if access.credential.is_expired() {
            return Err(AuthError::CredentialExpired(access.source.to_string()));
        }

        let credential = match &access.assume_role {
            Some(spec) => assume_role(&access, connector.as_ref(), &retry, spec).await?,
            None => access.credential.clone(),
        };

        let factory = Self {
            access,
            zone,
            connector,
            retry,
            state: Mutex::new(SessionState {
                credential,
                clients: Clients::default(),
            }),
        };

        let cvm = factory.cvm().await?;
        let cvm = cvm.as_ref();
        let zones = factory.retry.run(move || cvm.describe_zones()).await?;
        if !zones.iter().any(|z| z.zone == factory.zone) {
            return Err(AuthError::UnknownZone(factory.zone.clone()));
        }

        tracing::info!(
            "connected to {} ({}) as {}",
            factory.access.region,
            factory.zone,
            factory.access.source
        );
        Ok(factory)
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    pub fn access(&self) -> &ResolvedAccess {
        &self.access
    }

    /// The credential currently used to sign requests
    pub async fn credential(&self) -> Result<Credential> {
        let mut state = self.state.lock().await;
        self.refresh(&mut state).await?;
        Ok(state.credential.clone())
    }

    async fn refresh(&self, state: &mut SessionState) -> Result<()> {
        if !state.credential.is_expired() {
            return Ok(());
        }
        // only an assumed role can be renewed from inside the session
        let Some(spec) = &self.access.assume_role else {
            return Err(AuthError::CredentialExpired(self.access.source.to_string()));
        };

        tracing::info!("session credential expired, assuming {} again", spec.role_arn);
        state.credential =
            assume_role(&self.access, self.connector.as_ref(), &self.retry, spec).await?;
        state.clients = Clients::default();
        Ok(())
    }

    async fn memoized<T, P, B>(&self, pick: P, build: B) -> cvmforge_cloud::Result<Arc<T>>
    where
        T: ?Sized,
        P: Fn(&mut Clients) -> &mut Option<Arc<T>>,
        B: Fn(&dyn ServiceConnector, ServiceTarget<'_>) -> cvmforge_cloud::Result<Arc<T>>,
    {
        let mut state = self.state.lock().await;
        self.refresh(&mut state).await?;

        if let Some(client) = pick(&mut state.clients) {
            return Ok(client.clone());
        }

        let target = ServiceTarget {
            credential: &state.credential,
            region: &self.access.region,
            endpoint: None,
        };
        let client = build(self.connector.as_ref(), target)?;
        *pick(&mut state.clients) = Some(client.clone());
        Ok(client)
    }
}

async fn assume_role(
    access: &ResolvedAccess,
    connector: &dyn ServiceConnector,
    retry: &RetryPolicy,
    spec: &AssumeRoleSpec,
) -> Result<Credential> {
    let sts = connector.sts(ServiceTarget {
        credential: &access.credential,
        region: &access.region,
        endpoint: access.endpoints.sts.as_deref(),
    })?;
    let sts = sts.as_ref();

    tracing::debug!(
        "assuming role {} for {}s",
        spec.role_arn,
        spec.session_duration
    );
    let temporary = retry
        .run(move || sts.assume_role(&spec.role_arn, &spec.session_name, spec.session_duration))
        .await?;
    Ok(temporary.into())
}

#[async_trait]
impl ClientProvider for SessionFactory {
    fn region(&self) -> &str {
        &self.access.region
    }

    async fn cvm(&self) -> cvmforge_cloud::Result<Arc<dyn CvmApi>> {
        let endpoint = self.access.endpoints.cvm.as_deref();
        self.memoized(
            |c| &mut c.cvm,
            |conn, target| conn.cvm(ServiceTarget { endpoint, ..target }),
        )
        .await
    }

    async fn cvm_in_region(&self, region: &str) -> cvmforge_cloud::Result<Arc<dyn CvmApi>> {
        let mut state = self.state.lock().await;
        self.refresh(&mut state).await?;
        self.connector.cvm(ServiceTarget {
            credential: &state.credential,
            region,
            endpoint: self.access.endpoints.cvm.as_deref(),
        })
    }

    async fn vpc(&self) -> cvmforge_cloud::Result<Arc<dyn VpcApi>> {
        let endpoint = self.access.endpoints.vpc.as_deref();
        self.memoized(
            |c| &mut c.vpc,
            |conn, target| conn.vpc(ServiceTarget { endpoint, ..target }),
        )
        .await
    }

    async fn cam(&self) -> cvmforge_cloud::Result<Arc<dyn CamApi>> {
        let endpoint = self.access.endpoints.cam.as_deref();
        self.memoized(
            |c| &mut c.cam,
            |conn, target| conn.cam(ServiceTarget { endpoint, ..target }),
        )
        .await
    }

    async fn org(&self) -> cvmforge_cloud::Result<Arc<dyn OrgApi>> {
        let endpoint = self.access.endpoints.org.as_deref();
        self.memoized(
            |c| &mut c.org,
            |conn, target| conn.org(ServiceTarget { endpoint, ..target }),
        )
        .await
    }
}
