//! Palette-index search strategies.
//!
//! Two interchangeable strategies map a pixel to a palette index: an exact
//! nearest-color scan with branch-and-bound pruning, and a probabilistic
//! closest-color lookup that caches the two best candidates per exact pixel
//! value and breaks near-ties with a weighted coin flip. The cache and RNG
//! live in a [`SearchContext`] scoped to a single quantization run, so
//! concurrent runs stay isolated.

extern crate alloc;
use alloc::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rgb::RGBA;

use crate::argb::to_argb8888;

/// Strategy selected by run policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SearchStrategy {
    /// Exact nearest color, squared ARGB distance.
    Nearest,
    /// Cached two-best Manhattan lookup with randomized tie-breaking.
    Closest,
}

/// Two best candidates for one exact pixel value.
#[derive(Debug, Clone, Copy)]
struct Closest {
    first: u16,
    second: u16,
    first_dist: u16,
    second_dist: u16,
}

/// Run-scoped search state: the closest-color cache and the RNG.
#[derive(Debug)]
pub(crate) struct SearchContext {
    cache: BTreeMap<u32, Closest>,
    rng: SmallRng,
}

impl SearchContext {
    pub(crate) fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            #[cfg(feature = "std")]
            None => SmallRng::from_entropy(),
            #[cfg(not(feature = "std"))]
            None => SmallRng::seed_from_u64(0x9E3779B97F4A7C15),
        };
        Self {
            cache: BTreeMap::new(),
            rng,
        }
    }

    pub(crate) fn index_of(
        &mut self,
        strategy: SearchStrategy,
        palette: &[RGBA<u8>],
        pixel: RGBA<u8>,
    ) -> u16 {
        match strategy {
            SearchStrategy::Nearest => nearest_index(palette, pixel),
            SearchStrategy::Closest => self.closest_index(palette, pixel),
        }
    }

    /// Probabilistic closest color. The two smallest Manhattan-distance
    /// entries are cached per exact pixel value; the pick between them is
    /// weighted by the opposite distance, which trades a bounded amount of
    /// color error for reduced contouring.
    pub(crate) fn closest_index(&mut self, palette: &[RGBA<u8>], pixel: RGBA<u8>) -> u16 {
        let key = to_argb8888(pixel);
        let closest = match self.cache.get(&key) {
            Some(c) => *c,
            None => {
                let c = two_closest(palette, pixel);
                self.cache.insert(key, c);
                c
            }
        };

        if closest.first_dist == 0 {
            return closest.first;
        }
        let span = closest.second_dist as u32 + closest.first_dist as u32;
        if self.rng.gen_range(0..0x7FFFu32) % span <= closest.second_dist as u32 {
            closest.first
        } else {
            closest.second
        }
    }
}

fn two_closest(palette: &[RGBA<u8>], pixel: RGBA<u8>) -> Closest {
    let mut c = Closest {
        first: 0,
        second: 0,
        first_dist: u16::MAX,
        second_dist: u16::MAX,
    };

    for (k, p) in palette.iter().enumerate() {
        let dist = pixel.a.abs_diff(p.a) as u16
            + pixel.r.abs_diff(p.r) as u16
            + pixel.g.abs_diff(p.g) as u16
            + pixel.b.abs_diff(p.b) as u16;
        if dist < c.first_dist {
            c.second = c.first;
            c.second_dist = c.first_dist;
            c.first = k as u16;
            c.first_dist = dist;
        } else if dist < c.second_dist {
            c.second = k as u16;
            c.second_dist = dist;
        }
    }

    // No meaningful runner-up: always answer with the first.
    if c.second_dist == u16::MAX {
        c.first_dist = 0;
    }
    c
}

/// Exact nearest palette index by squared ARGB distance.
///
/// The partial sum is accumulated channel by channel in A, R, G, B order
/// and the scan of an entry aborts as soon as it exceeds the current best;
/// this prunes without approximating. Ties resolve to the later entry.
pub(crate) fn nearest_index(palette: &[RGBA<u8>], pixel: RGBA<u8>) -> u16 {
    let mut best = 0u16;
    let mut mindist = u32::MAX;

    for (i, p) in palette.iter().enumerate() {
        let da = pixel.a.abs_diff(p.a) as u32;
        let mut curdist = da * da;
        if curdist > mindist {
            continue;
        }

        let dr = pixel.r.abs_diff(p.r) as u32;
        curdist += dr * dr;
        if curdist > mindist {
            continue;
        }

        let dg = pixel.g.abs_diff(p.g) as u32;
        curdist += dg * dg;
        if curdist > mindist {
            continue;
        }

        let db = pixel.b.abs_diff(p.b) as u32;
        curdist += db * db;
        if curdist > mindist {
            continue;
        }

        mindist = curdist;
        best = i as u16;
    }
    best
}
