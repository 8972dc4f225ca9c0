use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use hidewatch::props::area::{find_values_in, PROP_VALUE_MAX};

/// A data segment the size of a real bootloader_prop area, filled with
/// `prop_info` records and one target near the end.
fn synthetic_segment(records: usize) -> Vec<u8> {
    let mut out = Vec::new();
    let mut push = |name: &str, value: &str| {
        out.extend_from_slice(&0u32.to_ne_bytes());
        let mut slot = [0u8; PROP_VALUE_MAX];
        slot[..value.len()].copy_from_slice(value.as_bytes());
        out.extend_from_slice(&slot);
        out.extend_from_slice(name.as_bytes());
        out.push(0);
    };
    for i in 0..records {
        push(&format!("ro.vendor.filler.prop{i}"), "value");
    }
    push("ro.boot.verifiedbootstate", "green");
    out
}

fn bench_find_values(c: &mut Criterion) {
    let mut group = c.benchmark_group("region-scan");
    for records in [64usize, 1024] {
        let data = synthetic_segment(records);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_function(format!("find_values/{records}"), |b| {
            b.iter(|| find_values_in(&data, b"ro.boot.verifiedbootstate"))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_find_values);
criterion_main!(benches);
