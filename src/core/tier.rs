//! SIMD Capability Tiers
//! Ordered instruction-set levels, lowest to highest.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown SIMD tier label: {0:?}")]
pub struct ParseTierError(pub String);

/// Declaration order is capability order, so the derived `Ord` is the tier ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CapabilityTier {
    None,
    Sse2,
    Sse4_2,
    Avx,
    Avx2,
    Avx512,
}

impl CapabilityTier {
    pub const ALL: [CapabilityTier; 6] = [
        CapabilityTier::None,
        CapabilityTier::Sse2,
        CapabilityTier::Sse4_2,
        CapabilityTier::Avx,
        CapabilityTier::Avx2,
        CapabilityTier::Avx512,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Sse2 => "SSE2",
            Self::Sse4_2 => "SSE4.2",
            Self::Avx => "AVX",
            Self::Avx2 => "AVX2",
            Self::Avx512 => "AVX512",
        }
    }

    /// MSVC `/arch:` switch enabling this tier. `None` has no switch.
    pub fn msvc_arch_flag(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Sse2 => Some("/arch:SSE2"),
            Self::Sse4_2 => Some("/arch:SSE4.2"),
            Self::Avx => Some("/arch:AVX"),
            Self::Avx2 => Some("/arch:AVX2"),
            Self::Avx512 => Some("/arch:AVX512"),
        }
    }

    /// rustc target features implied by this tier, cumulative from SSE2 upwards.
    pub fn target_features(&self) -> Vec<&'static str> {
        let mut features = Vec::new();
        if *self >= Self::Sse2 {
            features.push("sse2");
        }
        if *self >= Self::Sse4_2 {
            features.extend(["sse3", "ssse3", "sse4.1", "sse4.2"]);
        }
        if *self >= Self::Avx {
            features.push("avx");
        }
        if *self >= Self::Avx2 {
            features.push("avx2");
        }
        if *self >= Self::Avx512 {
            features.push("avx512f");
        }
        features
    }

    /// `-C target-feature=...` argument for rustc, or `None` when there is nothing to enable.
    pub fn rustflags(&self) -> Option<String> {
        let features = self.target_features();
        if features.is_empty() {
            return None;
        }
        let list: Vec<String> = features.iter().map(|f| format!("+{}", f)).collect();
        Some(format!("-C target-feature={}", list.join(",")))
    }

    /// Widest register in bytes.
    pub fn vector_width_bytes(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Sse2 | Self::Sse4_2 => 16,
            Self::Avx | Self::Avx2 => 32,
            Self::Avx512 => 64,
        }
    }
}

impl fmt::Display for CapabilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CapabilityTier {
    type Err = ParseTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AVX512" => Ok(Self::Avx512),
            "AVX2" => Ok(Self::Avx2),
            "AVX" => Ok(Self::Avx),
            "SSE4.2" | "SSE4_2" => Ok(Self::Sse4_2),
            "SSE2" => Ok(Self::Sse2),
            // "nope" is the fallback text of the legacy detector
            "NONE" | "NOPE" => Ok(Self::None),
            _ => Err(ParseTierError(s.to_string())),
        }
    }
}

impl Serialize for CapabilityTier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}
