#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
compile_error!("simd_tier reads cpuid and only builds for x86 and x86_64 targets");

use clap::{Parser, ValueEnum};
use simd_tier::core::detector::Detector;
use simd_tier::core::hardware::{CapabilityQuery, HostCpuid};
use simd_tier::core::policy::{DetectionPolicy, PolicyPreset};
use simd_tier::core::report::DetectionReport;
use std::io::Write;
use tracing::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Tier label, no trailing newline
    Label,
    /// MSVC `/arch:` switch
    Msvc,
    /// rustc `-C target-feature=` argument
    Rustflags,
    /// Full detection report
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Prints the highest SIMD tier this CPU supports", long_about = None)]
struct Args {
    #[arg(short, long, value_enum, default_value_t = PolicyPreset::Standard)]
    policy: PolicyPreset,

    #[arg(short, long, value_enum, default_value_t = Format::Label)]
    format: Format,

    #[arg(short, long)]
    verbose: bool,
}

/// Exactly what goes to stdout for `format`. Only the JSON report ends with a newline.
fn render<Q: CapabilityQuery>(query: Q, format: Format, policy: DetectionPolicy) -> Result<String, serde_json::Error> {
    let rendered = match format {
        Format::Label => Detector::new(query, policy).detect_label().to_string(),
        Format::Msvc => Detector::new(query, policy)
            .detect()
            .msvc_arch_flag()
            .unwrap_or_default()
            .to_string(),
        Format::Rustflags => Detector::new(query, policy).detect().rustflags().unwrap_or_default(),
        Format::Json => {
            let mut json = serde_json::to_string_pretty(&DetectionReport::collect(query, policy))?;
            json.push('\n');
            json
        }
    };
    Ok(rendered)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries only the result.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let policy = DetectionPolicy::from(args.policy);
    let mut out = std::io::stdout().lock();

    out.write_all(render(HostCpuid::default(), args.format, policy)?.as_bytes())?;
    out.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use simd_tier::core::hardware::{FeatureBits, Leaf1Ecx, Leaf1Edx, Leaf7Ebx, LEAF_EXTENDED_FEATURES, LEAF_FEATURES};

    fn blank(_leaf: u32, _sub: u32) -> FeatureBits {
        FeatureBits::zeroed()
    }

    fn avx512(leaf: u32, _sub: u32) -> FeatureBits {
        match leaf {
            LEAF_EXTENDED_FEATURES => FeatureBits {
                ebx: (Leaf7Ebx::AVX512F | Leaf7Ebx::AVX2).bits(),
                ..FeatureBits::zeroed()
            },
            LEAF_FEATURES => FeatureBits {
                ecx: (Leaf1Ecx::AVX | Leaf1Ecx::SSE4_2).bits(),
                edx: Leaf1Edx::SSE2.bits(),
                ..FeatureBits::zeroed()
            },
            _ => FeatureBits::zeroed(),
        }
    }

    #[test]
    fn test_label_is_bare() {
        let out = render(avx512, Format::Label, DetectionPolicy::STANDARD).unwrap();
        assert_eq!(out, "AVX512");

        let out = render(blank, Format::Label, DetectionPolicy::STANDARD).unwrap();
        assert_eq!(out, "NONE");
    }

    #[test]
    fn test_legacy_prints_nope() {
        let policy = DetectionPolicy::from(PolicyPreset::Legacy);
        assert_eq!(render(blank, Format::Label, policy).unwrap(), "nope");
    }

    #[test]
    fn test_flags_empty_without_simd() {
        for policy in [DetectionPolicy::STANDARD, DetectionPolicy::LEGACY] {
            assert_eq!(render(blank, Format::Msvc, policy).unwrap(), "");
            assert_eq!(render(blank, Format::Rustflags, policy).unwrap(), "");
        }
    }

    #[test]
    fn test_flags_for_avx512() {
        let policy = DetectionPolicy::STANDARD;
        assert_eq!(render(avx512, Format::Msvc, policy).unwrap(), "/arch:AVX512");

        let flags = render(avx512, Format::Rustflags, policy).unwrap();
        assert!(flags.starts_with("-C target-feature=+sse2,"));
        assert!(flags.ends_with(",+avx512f"));
        assert!(!flags.ends_with('\n'));
    }

    #[test]
    fn test_json_ends_with_newline() {
        let out = render(avx512, Format::Json, DetectionPolicy::STANDARD).unwrap();
        assert!(out.ends_with("}\n"));

        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["tier"], "AVX512");
        assert_eq!(value["msvc_flag"], "/arch:AVX512");
    }
}
