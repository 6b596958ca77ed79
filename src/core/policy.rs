//! Detection Policy
//! Two detector variants are in circulation. They differ in whether SSE4.2 is
//! a checked tier and in the text printed when nothing is recognised.

use crate::core::tier::CapabilityTier;
use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DetectionPolicy {
    pub check_sse4_2: bool,
    pub fallback_label: &'static str,
}

impl DetectionPolicy {
    /// SSE4.2 checked, fallback `NONE`.
    pub const STANDARD: Self = Self {
        check_sse4_2: true,
        fallback_label: "NONE",
    };

    /// SSE4.2 skipped (SSE2 is still checked), fallback `nope`.
    pub const LEGACY: Self = Self {
        check_sse4_2: false,
        fallback_label: "nope",
    };

    /// Label printed for `tier` under this policy.
    pub fn label(&self, tier: CapabilityTier) -> &'static str {
        match tier {
            CapabilityTier::None => self.fallback_label,
            other => other.label(),
        }
    }
}

impl Default for DetectionPolicy {
    fn default() -> Self {
        Self::STANDARD
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum PolicyPreset {
    #[default]
    Standard,
    Legacy,
}

impl From<PolicyPreset> for DetectionPolicy {
    fn from(preset: PolicyPreset) -> Self {
        match preset {
            PolicyPreset::Standard => DetectionPolicy::STANDARD,
            PolicyPreset::Legacy => DetectionPolicy::LEGACY,
        }
    }
}
