use crate::context::BuildContext;
use crate::error::{BuildError, Result};
use crate::runner::{BuildOutcome, Runner};
use crate::steps::build_steps;
use std::collections::BTreeMap;

/// What a completed build produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub source_region: String,
    /// Image id per region, source region included
    pub images: BTreeMap<String, String>,
}

impl Artifact {
    pub fn source_image(&self) -> Option<&str> {
        self.images.get(&self.source_region).map(String::as_str)
    }
}

/// Run the full step pipeline over a prepared context
pub async fn run_build(ctx: &mut BuildContext) -> Result<Artifact> {
    let mut runner = Runner::new(build_steps());
    tracing::debug!("steps: {}", runner.step_names().join(" -> "));

    match runner.run(ctx).await {
        BuildOutcome::Completed => Ok(Artifact {
            source_region: ctx.region().to_string(),
            images: ctx.images.clone(),
        }),
        BuildOutcome::Halted(err) => Err(BuildError::Halted(err)),
        BuildOutcome::Cancelled => Err(BuildError::Cancelled),
    }
}
