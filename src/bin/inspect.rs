#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
compile_error!("inspect reads cpuid and only builds for x86 and x86_64 targets");

use serde::Serialize;
use simd_tier::core::hardware::{
    vendor_id, CapabilityQuery, CpuFeatures, FeatureBits, HostCpuid, LEAF_EXTENDED_FEATURES, LEAF_FEATURES,
    LEAF_VENDOR,
};
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Serialize)]
struct CpuidExport {
    vendor: String,
    max_leaf: u32,
    leaves: Vec<LeafExport>,
    features: CpuFeatures,
}

#[derive(Serialize)]
struct LeafExport {
    leaf: u32,
    sub_leaf: u32,
    registers: FeatureBits,
}

fn collect<Q: CapabilityQuery>(query: &Q, max_leaf: u32) -> CpuidExport {
    let leaves = [(LEAF_VENDOR, 0), (LEAF_FEATURES, 0), (LEAF_EXTENDED_FEATURES, 0)]
        .into_iter()
        .map(|(leaf, sub_leaf)| LeafExport {
            leaf,
            sub_leaf,
            registers: query.query(leaf, sub_leaf),
        })
        .collect();

    CpuidExport {
        vendor: vendor_id(query),
        max_leaf,
        leaves,
        features: CpuFeatures::from_query(query),
    }
}

fn write_export<W: Write>(mut out: W, export: &CpuidExport) -> Result<(), Box<dyn std::error::Error>> {
    serde_json::to_writer_pretty(&mut out, export)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 2 {
        eprintln!("Usage: {} [output_path]", args[0]);
        std::process::exit(1);
    }

    let host = HostCpuid::default();
    let export = collect(&host, host.max_leaf());

    match args.get(1) {
        Some(path) => {
            let path = Path::new(path);
            write_export(File::create(path)?, &export)?;
            tracing::info!(?path, "exported cpuid registers");
        }
        None => write_export(std::io::stdout().lock(), &export)?,
    }

    Ok(())
}
