extern crate alloc;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::argb::bin_index;
use crate::pnn::Bin;

/// Per-bin channel sums and count, accumulated in f64 before normalization.
#[derive(Debug, Clone, Default)]
struct Accum {
    a: f64,
    r: f64,
    g: f64,
    b: f64,
    cnt: u32,
}

/// Build the aggregated bin list for the merge engine.
///
/// Every source pixel (including fully transparent ones) is accumulated
/// into its reduced-color-space bin. Sums are then normalized to channel
/// means, and populated bins are compacted in ascending key order. That
/// order fixes the initial linked-list layout, which makes tied-cost merge
/// resolution deterministic.
///
/// With `sqrt_population` the count is compressed to `floor(sqrt(cnt))`,
/// damping the pull of very large flat-color regions on merge costs.
pub(crate) fn build_bins(
    pixels: &[rgb::RGBA<u8>],
    has_semi_transparency: bool,
    sqrt_population: bool,
) -> Vec<Bin> {
    let mut buckets: BTreeMap<u16, Accum> = BTreeMap::new();

    for &p in pixels {
        let key = bin_index(p, has_semi_transparency);
        let e = buckets.entry(key).or_default();
        e.a += p.a as f64;
        e.r += p.r as f64;
        e.g += p.g as f64;
        e.b += p.b as f64;
        e.cnt += 1;
    }

    buckets
        .into_values()
        .map(|e| {
            let d = 1.0 / e.cnt as f64;
            let cnt = if sqrt_population {
                (e.cnt as f64).sqrt() as u32
            } else {
                e.cnt
            };
            Bin::new(e.a * d, e.r * d, e.g * d, e.b * d, cnt)
        })
        .collect()
}
