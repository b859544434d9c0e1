//! Presentation hooks for the lifecycle workflow
//!
//! The workflow calls these at fixed points; the CLI prints progress lines,
//! library callers can log or ignore them.
//!
//! ```rust,ignore
//! struct ConsoleHooks;
//!
//! impl LifecycleHooks for ConsoleHooks {
//!     fn on_step_complete(&self, _step: Step, outcome: &StepOutcome) {
//!         println!("{}", outcome.summary());
//!     }
//! }
//!
//! run_lifecycle(&client, &plan, &ConsoleHooks).await?;
//! ```

use super::workflow::{CleanupOutcome, Step, StepOutcome};
use crate::error::CoreError;
use tracing::{error, info, warn};

pub trait LifecycleHooks: Send + Sync {
    fn on_step_start(&self, _step: Step) {}

    fn on_step_complete(&self, _step: Step, _outcome: &StepOutcome) {}

    fn on_step_failed(&self, _step: Step, _error: &CoreError) {}

    /// Called once after a failed step, with the result of deleting the group
    fn on_cleanup(&self, _resource_group: &str, _outcome: &CleanupOutcome) {}
}

/// Ignores every event
pub struct NoopHooks;

impl LifecycleHooks for NoopHooks {}

/// Sends every event to `tracing`
pub struct LoggingHooks;

impl LifecycleHooks for LoggingHooks {
    fn on_step_start(&self, step: Step) {
        info!("Step {}/{}: {}", step.number(), Step::COUNT, step);
    }

    fn on_step_complete(&self, _step: Step, outcome: &StepOutcome) {
        info!("{}", outcome.summary());
    }

    fn on_step_failed(&self, step: Step, error: &CoreError) {
        error!("Step {} ({}) failed: {}", step.number(), step, error);
    }

    fn on_cleanup(&self, resource_group: &str, outcome: &CleanupOutcome) {
        match outcome {
            CleanupOutcome::Deleted => info!("Cleanup deleted resource group {}", resource_group),
            CleanupOutcome::Failed(e) => {
                warn!("Cleanup of resource group {} failed: {}", resource_group, e)
            }
        }
    }
}
