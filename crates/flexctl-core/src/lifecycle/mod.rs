//! Provision, configure and tear down a flexible server
//!
//! [`run_lifecycle`] walks the thirteen [`Step`]s in order against any
//! [`crate::ResourceClient`]. The first failure stops the run and the
//! resource group is deleted as a compensating action; the outcome of that
//! delete travels in [`LifecycleError::StepFailed`].

mod hooks;
mod plan;
mod workflow;

pub use hooks::{LifecycleHooks, LoggingHooks, NoopHooks};
pub use plan::{
    ConfigurationChange, DEFAULT_ADMIN_LOGIN, DEFAULT_CONFIGURATION, DEFAULT_CONFIGURATION_SOURCE,
    DEFAULT_CONFIGURATION_VALUE, DEFAULT_ENGINE_VERSION, DEFAULT_FIREWALL_RULE,
    DEFAULT_NAME_LENGTH, DEFAULT_REGION, DEFAULT_RESOURCE_GROUP_PREFIX, DEFAULT_SERVER_PREFIX,
    DEFAULT_SKU_NAME, DEFAULT_SKU_TIER, DEFAULT_STORAGE_MB, DEFAULT_UPDATED_STORAGE_MB,
    GENERATED_PASSWORD_LENGTH, IpRange, LifecyclePlan,
};
pub use workflow::{
    CleanupOutcome, LifecycleError, LifecycleReport, Step, StepOutcome, run_lifecycle,
};
