//! Hardware Detection Module
//! Queries CPU capability registers at runtime, through a swappable query source.

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};
use raw_cpuid::{CpuId, CpuIdReader, CpuIdResult};
use serde::Serialize;

/// Leaf 0: highest basic leaf in eax, vendor string in ebx/edx/ecx.
pub const LEAF_VENDOR: u32 = 0;
/// Leaf 1: processor info and feature bits (ecx, edx).
pub const LEAF_FEATURES: u32 = 1;
/// Leaf 7: structured extended feature flags, sub-leaf 0.
pub const LEAF_EXTENDED_FEATURES: u32 = 7;

const EXTENDED_LEAF_BASE: u32 = 0x8000_0000;

/// The four registers returned by a single capability query, in register order.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Pod, Zeroable, Serialize)]
pub struct FeatureBits {
    pub eax: u32,
    pub ebx: u32,
    pub ecx: u32,
    pub edx: u32,
}

const _: () = assert!(std::mem::size_of::<FeatureBits>() == 16);

impl FeatureBits {
    pub fn zeroed() -> Self {
        <Self as Zeroable>::zeroed()
    }

    /// `[eax, ebx, ecx, edx]`
    pub fn registers(&self) -> [u32; 4] {
        bytemuck::cast(*self)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Leaf7Ebx: u32 {
        const AVX2 = 1 << 5;
        const AVX512F = 1 << 16;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Leaf1Ecx: u32 {
        const SSE4_2 = 1 << 20;
        const AVX = 1 << 28;
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Leaf1Edx: u32 {
        const SSE2 = 1 << 26;
    }
}

/// A source of processor capability bits, keyed by (leaf, sub-leaf).
///
/// Implementations must be pure reads: the same arguments yield the same bits.
/// Any `Fn(u32, u32) -> FeatureBits` qualifies, which is how tests simulate registers.
pub trait CapabilityQuery {
    fn query(&self, leaf: u32, sub_leaf: u32) -> FeatureBits;
}

impl<F> CapabilityQuery for F
where
    F: Fn(u32, u32) -> FeatureBits,
{
    fn query(&self, leaf: u32, sub_leaf: u32) -> FeatureBits {
        self(leaf, sub_leaf)
    }
}

/// The host processor's `cpuid` instruction.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[derive(Debug, Clone, Copy)]
pub struct HostCpuid {
    max_leaf: u32,
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl HostCpuid {
    pub fn new() -> Self {
        Self {
            max_leaf: raw_cpuid(LEAF_VENDOR, 0).eax,
        }
    }

    /// Highest basic leaf the processor reports.
    pub fn max_leaf(&self) -> u32 {
        self.max_leaf
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl Default for HostCpuid {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl CapabilityQuery for HostCpuid {
    fn query(&self, leaf: u32, sub_leaf: u32) -> FeatureBits {
        // Out-of-range basic leaves echo the highest leaf's data on Intel parts.
        if leaf < EXTENDED_LEAF_BASE && leaf > self.max_leaf {
            tracing::trace!(leaf, max_leaf = self.max_leaf, "leaf not supported, reporting zero bits");
            return FeatureBits::zeroed();
        }
        raw_cpuid(leaf, sub_leaf)
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn raw_cpuid(leaf: u32, sub_leaf: u32) -> FeatureBits {
    #[cfg(target_arch = "x86")]
    use std::arch::x86::__cpuid_count;
    #[cfg(target_arch = "x86_64")]
    use std::arch::x86_64::__cpuid_count;

    // SAFETY: cpuid exists on every processor these targets run on.
    #[allow(unused_unsafe)]
    let result = unsafe { __cpuid_count(leaf, sub_leaf) };

    FeatureBits {
        eax: result.eax,
        ebx: result.ebx,
        ecx: result.ecx,
        edx: result.edx,
    }
}

/// Adapts any query source to `raw_cpuid`, so its decoders run on simulated registers as well.
struct QueryReader<'a, Q>(&'a Q);

impl<Q> Clone for QueryReader<'_, Q> {
    fn clone(&self) -> Self {
        QueryReader(self.0)
    }
}

impl<Q: CapabilityQuery> CpuIdReader for QueryReader<'_, Q> {
    fn cpuid2(&self, eax: u32, ecx: u32) -> CpuIdResult {
        let bits = self.0.query(eax, ecx);
        CpuIdResult {
            eax: bits.eax,
            ebx: bits.ebx,
            ecx: bits.ecx,
            edx: bits.edx,
        }
    }
}

/// Vendor string from leaf 0, e.g. `GenuineIntel` or `AuthenticAMD`. Empty when leaf 0 is blank.
pub fn vendor_id<Q: CapabilityQuery>(query: &Q) -> String {
    CpuId::with_cpuid_reader(QueryReader(query))
        .get_vendor_info()
        .map(|info| info.as_str().trim_end_matches('\0').to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CpuFeatures {
    pub sse2: bool,
    pub sse4_2: bool,
    pub avx: bool,
    pub avx2: bool,
    pub avx512f: bool,
}

impl CpuFeatures {
    /// Every recognised feature flag, decoded from leaves 1 and 7.
    pub fn from_query<Q: CapabilityQuery>(query: &Q) -> Self {
        let leaf7 = Leaf7Ebx::from_bits_truncate(query.query(LEAF_EXTENDED_FEATURES, 0).ebx);
        let leaf1 = query.query(LEAF_FEATURES, 0);
        let ecx = Leaf1Ecx::from_bits_truncate(leaf1.ecx);
        let edx = Leaf1Edx::from_bits_truncate(leaf1.edx);

        Self {
            sse2: edx.contains(Leaf1Edx::SSE2),
            sse4_2: ecx.contains(Leaf1Ecx::SSE4_2),
            avx: ecx.contains(Leaf1Ecx::AVX),
            avx2: leaf7.contains(Leaf7Ebx::AVX2),
            avx512f: leaf7.contains(Leaf7Ebx::AVX512F),
        }
    }
}
