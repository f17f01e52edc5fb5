use crate::cvm::CvmClient;
use crate::identity::{CamClient, OrgClient, StsClient};
use crate::vpc::VpcClient;
use cvmforge_auth::{ServiceConnector, ServiceTarget};
use cvmforge_cloud::{CamApi, CvmApi, OrgApi, Result, StsApi, VpcApi};
use std::sync::Arc;

/// [`ServiceConnector`] producing signed HTTP clients
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpConnector;

impl ServiceConnector for HttpConnector {
    fn cvm(&self, target: ServiceTarget<'_>) -> Result<Arc<dyn CvmApi>> {
        Ok(Arc::new(CvmClient::new(target)?))
    }

    fn vpc(&self, target: ServiceTarget<'_>) -> Result<Arc<dyn VpcApi>> {
        Ok(Arc::new(VpcClient::new(target)?))
    }

    fn sts(&self, target: ServiceTarget<'_>) -> Result<Arc<dyn StsApi>> {
        Ok(Arc::new(StsClient::new(target)?))
    }

    fn cam(&self, target: ServiceTarget<'_>) -> Result<Arc<dyn CamApi>> {
        Ok(Arc::new(CamClient::new(target)?))
    }

    fn org(&self, target: ServiceTarget<'_>) -> Result<Arc<dyn OrgApi>> {
        Ok(Arc::new(OrgClient::new(target)?))
    }
}
