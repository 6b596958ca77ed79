//! SIMD Tier Detector
//! Picks the highest instruction-set tier the processor reports.
//! Checks run from the top tier down and the first match wins.

use crate::core::hardware::{
    CapabilityQuery, FeatureBits, Leaf1Ecx, Leaf1Edx, Leaf7Ebx, LEAF_EXTENDED_FEATURES, LEAF_FEATURES,
};
use crate::core::policy::DetectionPolicy;
use crate::core::tier::CapabilityTier;

pub struct Detector<Q> {
    query: Q,
    policy: DetectionPolicy,
}

impl<Q: CapabilityQuery> Detector<Q> {
    pub fn new(query: Q, policy: DetectionPolicy) -> Self {
        Self { query, policy }
    }

    /// Never fails: a processor with none of the recognised bits yields `CapabilityTier::None`.
    pub fn detect(&self) -> CapabilityTier {
        let leaf7 = self.load(LEAF_EXTENDED_FEATURES, 0);
        if Leaf7Ebx::from_bits_truncate(leaf7.ebx).contains(Leaf7Ebx::AVX512F) {
            return self.found(CapabilityTier::Avx512);
        }

        // Fresh read; nothing from the first leaf-7 buffer carries over.
        let leaf7 = self.load(LEAF_EXTENDED_FEATURES, 0);
        if Leaf7Ebx::from_bits_truncate(leaf7.ebx).contains(Leaf7Ebx::AVX2) {
            return self.found(CapabilityTier::Avx2);
        }

        let leaf1 = self.load(LEAF_FEATURES, 0);
        let ecx = Leaf1Ecx::from_bits_truncate(leaf1.ecx);
        if ecx.contains(Leaf1Ecx::AVX) {
            return self.found(CapabilityTier::Avx);
        }
        if self.policy.check_sse4_2 && ecx.contains(Leaf1Ecx::SSE4_2) {
            return self.found(CapabilityTier::Sse4_2);
        }
        if Leaf1Edx::from_bits_truncate(leaf1.edx).contains(Leaf1Edx::SSE2) {
            return self.found(CapabilityTier::Sse2);
        }

        self.found(CapabilityTier::None)
    }

    /// Detected tier rendered with the policy's labels.
    pub fn detect_label(&self) -> &'static str {
        self.policy.label(self.detect())
    }

    fn load(&self, leaf: u32, sub_leaf: u32) -> FeatureBits {
        let bits = self.query.query(leaf, sub_leaf);
        tracing::trace!(leaf, sub_leaf, registers = ?bits.registers(), "capability query");
        bits
    }

    fn found(&self, tier: CapabilityTier) -> CapabilityTier {
        tracing::debug!(tier = %tier, label = self.policy.label(tier), "detected SIMD tier");
        tier
    }
}

/// Highest SIMD tier of the host processor, using the standard policy.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub fn detect_best_tier() -> CapabilityTier {
    Detector::new(crate::core::hardware::HostCpuid::new(), DetectionPolicy::STANDARD).detect()
}
