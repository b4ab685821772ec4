pub mod lifecycle_policy;
pub mod severity;
pub mod thresholds;

pub use lifecycle_policy::{LifecyclePolicy, WindowLimits};
pub use severity::Severity;
pub use thresholds::DetectorThresholds;
