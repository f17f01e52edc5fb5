//! cvmforge cloud layer
//!
//! Everything the build engine needs from the provider, minus the transport:
//!
//! - service traits ([`CvmApi`], [`VpcApi`], [`StsApi`], [`CamApi`], [`OrgApi`])
//!   and the [`ClientProvider`] that hands them out
//! - request/response models
//! - the structured [`CloudError`] with its retryable classification
//! - the [`RetryPolicy`] wrapped around every remote call
//! - the [`wait_for`] poller and its instance/image uses
//! - region allow-list and resource id checks
//!
//! ```text
//!   build steps ──▶ RetryPolicy ──▶ CvmApi / VpcApi / ... ──▶ transport
//!        │                                ▲
//!        └──────▶ wait_for ───────────────┘
//! ```

pub mod api;
pub mod error;
pub mod model;
pub mod region;
pub mod retry;
pub mod wait;

// Re-exports
pub use api::{CamApi, ClientProvider, CvmApi, OrgApi, StsApi, VpcApi};
pub use error::{CloudError, HTTP_STATUS_ERROR_CODE, NETWORK_ERROR_CODE, Result, is_retryable_code};
pub use model::{
    CreateImageRequest, DataDisk, Filter, Image, Instance, InternetAccessible, LoginSettings,
    OrgMember, Placement, RunInstancesRequest, SecurityGroup, SharePermission, Snapshot, Subnet,
    SystemDisk, Tag, TagSpecification, TemporaryCredential, VirtualPrivateCloud, Vpc, ZoneInfo,
    bool_flag,
};
pub use region::{VALID_REGIONS, check_resource_id, validate_region};
pub use retry::{RetryPolicy, retry};
pub use wait::{
    DEFAULT_WAIT_INTERVAL, DEFAULT_WAIT_TIMEOUT, IMAGE_READY, INSTANCE_RUNNING, WaitOptions,
    get_image_by_name, wait_for, wait_for_image_ready, wait_for_instance,
};
