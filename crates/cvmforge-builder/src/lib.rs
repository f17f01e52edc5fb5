//! cvmforge build engine
//!
//! A build is a fixed pipeline of [`Step`]s run by a [`Runner`] over one
//! [`BuildContext`]:
//!
//! ```text
//!   pre-validate → source image → vpc → subnet → security group
//!     → instance → image → share → copy
//! ```
//!
//! Every executed step is unwound in reverse once the pipeline stops, so the
//! temporary instance and network never outlive the build.

pub mod build;
pub mod config;
pub mod context;
pub mod error;
pub mod lookup;
pub mod runner;
pub mod steps;

pub use build::{Artifact, run_build};
pub use config::{BuildConfig, DataDiskConfig, ImageConfig, LoginConfig, RunConfig};
pub use context::{BuildContext, CancelHandle, Slot};
pub use error::{BuildError, Result, StepError};
pub use lookup::{ImageQuery, find_image, most_recent};
pub use runner::{BuildOutcome, Runner, Step, StepAction};
