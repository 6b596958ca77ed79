pub mod core;

pub use crate::core::detector::Detector;
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub use crate::core::detector::detect_best_tier;
pub use crate::core::hardware::{CapabilityQuery, FeatureBits};
pub use crate::core::policy::DetectionPolicy;
pub use crate::core::tier::CapabilityTier;
