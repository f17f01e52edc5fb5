//! Ordered step execution with reverse-order cleanup

use crate::context::BuildContext;
use crate::error::StepError;
use async_trait::async_trait;

/// What a step tells the runner after its forward action
#[derive(Debug)]
pub enum StepAction {
    Continue,
    Halt(StepError),
}

/// A unit of work with a compensating cleanup.
///
/// `cleanup` must be a no-op when the step never recorded the resource it
/// owns; it may run after a partial `run`.
#[async_trait]
pub trait Step: Send {
    fn name(&self) -> &'static str;

    async fn run(&mut self, ctx: &mut BuildContext) -> StepAction;

    async fn cleanup(&mut self, ctx: &BuildContext);
}

/// Terminal state of a build
#[derive(Debug)]
pub enum BuildOutcome {
    Completed,
    Halted(StepError),
    Cancelled,
}

impl BuildOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, BuildOutcome::Completed)
    }
}

pub struct Runner {
    steps: Vec<Box<dyn Step>>,
}

impl Runner {
    pub fn new(steps: Vec<Box<dyn Step>>) -> Self {
        Self { steps }
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step in order, then unwind the executed ones in reverse.
    ///
    /// The cancellation flag is checked before each step. A halting step is
    /// itself cleaned up; steps never reached are not.
    pub async fn run(&mut self, ctx: &mut BuildContext) -> BuildOutcome {
        let mut executed = 0;
        let mut outcome = BuildOutcome::Completed;

        for step in self.steps.iter_mut() {
            if ctx.is_cancelled() {
                tracing::warn!("build cancelled before {}", step.name());
                outcome = BuildOutcome::Cancelled;
                break;
            }

            tracing::info!("step {}", step.name());
            executed += 1;
            match step.run(ctx).await {
                StepAction::Continue => {}
                StepAction::Halt(err) => {
                    tracing::error!("step {} halted: {}", step.name(), err);
                    ctx.halt();
                    outcome = BuildOutcome::Halted(err);
                    break;
                }
            }
        }

        // a cancel that lands during the last step still counts
        if outcome.is_completed() && ctx.is_cancelled() {
            outcome = BuildOutcome::Cancelled;
        }

        for step in self.steps[..executed].iter_mut().rev() {
            tracing::debug!("cleanup {}", step.name());
            step.cleanup(ctx).await;
        }

        outcome
    }
}
