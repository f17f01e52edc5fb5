//! Tencent Cloud HTTP transport for cvmforge
//!
//! Every request is a JSON `POST` to `https://<service>.tencentcloudapi.com/`
//! (or a custom endpoint) signed with TC3-HMAC-SHA256. Provider errors in the
//! `Response.Error` envelope become [`cvmforge_cloud::CloudError::Api`].

pub mod client;
mod connector;
pub mod cvm;
pub mod identity;
pub mod sign;
pub mod vpc;

pub use client::{REQUEST_TIMEOUT, Service, TencentClient};
pub use connector::HttpConnector;
pub use cvm::CvmClient;
pub use identity::{CamClient, OrgClient, StsClient};
pub use vpc::VpcClient;
