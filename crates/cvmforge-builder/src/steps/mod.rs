//! Build steps, in the order [`build_steps`] runs them
//!
//! | step | cleanup |
//! |------|---------|
//! | [`PreValidate`] | none |
//! | [`CheckSourceImage`] | none |
//! | [`ConfigVpc`] / [`ConfigSubnet`] / [`ConfigSecurityGroup`] | delete what it created |
//! | [`RunInstance`] | terminate the instance |
//! | [`CreateImage`] | delete the image on failed builds |
//! | [`ShareImage`] | revoke explicit accounts on failed builds |
//! | [`CopyImage`] | none |

mod copy;
mod image;
mod instance;
mod network;
mod share;
mod source;

pub use copy::CopyImage;
pub use image::{CreateImage, PreValidate};
pub use instance::{RunInstance, launch_request};
pub use network::{ConfigSecurityGroup, ConfigSubnet, ConfigVpc};
pub use share::{ORG_MEMBER_PAGE_SIZE, ShareImage, org_accounts};
pub use source::CheckSourceImage;

use crate::error::StepError;
use crate::runner::{Step, StepAction};
use cvmforge_cloud::CloudError;

/// The full pipeline for one build
pub fn build_steps() -> Vec<Box<dyn Step>> {
    vec![
        Box::new(PreValidate),
        Box::new(CheckSourceImage),
        Box::new(ConfigVpc::default()),
        Box::new(ConfigSubnet::default()),
        Box::new(ConfigSecurityGroup::default()),
        Box::new(RunInstance),
        Box::new(CreateImage),
        Box::new(ShareImage),
        Box::new(CopyImage),
    ]
}

/// Map a step's primary result to the runner's action
pub(crate) fn conclude(result: Result<(), StepError>) -> StepAction {
    match result {
        Ok(()) => StepAction::Continue,
        Err(err) => StepAction::Halt(err),
    }
}

/// Tag a cloud failure with the stage it happened in
pub(crate) trait StageExt<T> {
    fn stage(self, stage: &str) -> Result<T, StepError>;
}

impl<T> StageExt<T> for cvmforge_cloud::Result<T> {
    fn stage(self, stage: &str) -> Result<T, StepError> {
        self.map_err(|err| StepError::new(stage, err))
    }
}

/// Log a cleanup failure; cleanups never propagate errors
pub(crate) fn report_cleanup(what: &str, result: cvmforge_cloud::Result<()>) {
    if let Err(err) = result {
        tracing::error!("failed to delete {}, please delete it manually: {}", what, err);
    }
}

pub(crate) fn not_found(what: impl std::fmt::Display) -> CloudError {
    CloudError::ResourceNotFound(what.to_string())
}
