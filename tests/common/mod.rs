use kbucket::{Config, Id, RoutingTable, U256};
use tracing_subscriber::{fmt, EnvFilter};

#[allow(dead_code)]
pub fn enable_tracing() {
    fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

/// A table over a small identifier space, split into the supplied contiguous ranges.
#[allow(dead_code)]
pub fn small_table(bits: u32, bucket_size: usize, boundaries: &[u64]) -> RoutingTable {
    let config = Config::default()
        .with_bucket_size(bucket_size)
        .with_id_bits(bits);
    let boundaries: Vec<_> = boundaries.iter().copied().map(U256::from).collect();

    RoutingTable::with_boundaries(config, &boundaries).unwrap()
}

/// The identifier ranges of the table's buckets, in table order.
#[allow(dead_code)]
pub fn ranges(rt: &RoutingTable) -> Vec<(u64, u64)> {
    rt.buckets()
        .iter()
        .map(|bucket| {
            let range = bucket.range();
            (range.min().low_u64(), range.max().low_u64())
        })
        .collect()
}

/// The members of a bucket, in insertion order.
#[allow(dead_code)]
pub fn members(rt: &RoutingTable, bucket: usize) -> Vec<u64> {
    rt.buckets()[bucket]
        .peers()
        .iter()
        .map(|peer| peer.id().value().low_u64())
        .collect()
}

/// Left-pads a short hex identifier to the canonical 160-bit form.
#[allow(dead_code)]
pub fn canonical(short: &str) -> Id {
    format!("{short:0>40}").parse().unwrap()
}
