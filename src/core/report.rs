use crate::core::detector::Detector;
use crate::core::hardware::{vendor_id, CapabilityQuery, CpuFeatures};
use crate::core::policy::DetectionPolicy;
use crate::core::tier::CapabilityTier;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionReport {
    pub tier: CapabilityTier,
    pub label: &'static str,
    pub vendor: String,
    pub msvc_flag: Option<&'static str>,
    pub target_features: Vec<&'static str>,
    pub vector_width_bytes: usize,
    pub features: CpuFeatures,
    pub policy: DetectionPolicy,
}

impl DetectionReport {
    /// Runs detection and gathers everything derived from the detected tier.
    pub fn collect<Q: CapabilityQuery>(query: Q, policy: DetectionPolicy) -> Self {
        let vendor = vendor_id(&query);
        let features = CpuFeatures::from_query(&query);
        let tier = Detector::new(query, policy).detect();

        Self {
            tier,
            label: policy.label(tier),
            vendor,
            msvc_flag: tier.msvc_arch_flag(),
            target_features: tier.target_features(),
            vector_width_bytes: tier.vector_width_bytes(),
            features,
            policy,
        }
    }
}
