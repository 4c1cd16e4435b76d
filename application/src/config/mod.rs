//! Application-level configuration.
//!
//! - [`BehaviorConfig`]: LLM call timeouts
//! - [`HarvestPolicy`]: pacing of citation harvesting

pub mod behavior;
pub mod harvest_policy;

pub use behavior::BehaviorConfig;
pub use harvest_policy::HarvestPolicy;
