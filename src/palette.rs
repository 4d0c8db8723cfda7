extern crate alloc;
use alloc::vec::Vec;

use rgb::RGBA;

use crate::argb::{BLACK, WHITE};
use crate::pnn::Bin;

/// The quantized color palette, in surviving-bin list order.
///
/// Length is the surviving bin count, at most the requested color count.
/// When transparency is present and the palette is small, slot 0 holds the
/// transparent color.
#[derive(Debug, Clone)]
pub struct Palette {
    entries: Vec<RGBA<u8>>,
    transparent_index: Option<u16>,
}

#[inline]
fn channel(mean: f64) -> u8 {
    mean.round().clamp(0.0, 255.0) as u8
}

impl Palette {
    /// Walk the alive bin chain from index 0 into palette entries.
    ///
    /// If a transparent pixel was recorded upstream and a produced entry
    /// equals the recorded transparent color, it is swapped into slot 0
    /// (the slot-0 transparency convention of downstream writers).
    pub(crate) fn from_bins(bins: &[Bin], transparent: Option<RGBA<u8>>) -> Self {
        let mut entries = Vec::new();
        if !bins.is_empty() {
            let mut i = 0;
            loop {
                let bin = &bins[i];
                entries.push(RGBA {
                    r: channel(bin.rc),
                    g: channel(bin.gc),
                    b: channel(bin.bc),
                    a: channel(bin.ac),
                });
                if let Some(t) = transparent {
                    let k = entries.len() - 1;
                    if entries[k] == t {
                        entries.swap(0, k);
                    }
                }
                i = bin.fw;
                if i == 0 {
                    break;
                }
            }
        }
        Self {
            entries,
            transparent_index: None,
        }
    }

    /// Fixed two-color palette for the degenerate `max_colors <= 2` case:
    /// `{transparent, black}` when a transparent pixel was detected,
    /// `{black, white}` otherwise.
    pub(crate) fn monochrome(transparent: Option<RGBA<u8>>) -> Self {
        let entries = match transparent {
            Some(t) => alloc::vec![t, BLACK],
            None => alloc::vec![BLACK, WHITE],
        };
        Self {
            entries,
            transparent_index: None,
        }
    }

    /// ARGB palette entries.
    pub fn entries(&self) -> &[RGBA<u8>] {
        &self.entries
    }

    /// Number of palette entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the palette is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the entry holding the transparent color, if any.
    pub fn transparent_index(&self) -> Option<u16> {
        self.transparent_index
    }

    pub(crate) fn set_entry(&mut self, index: usize, color: RGBA<u8>) {
        self.entries[index] = color;
    }

    pub(crate) fn swap_entries(&mut self, a: usize, b: usize) {
        self.entries.swap(a, b);
    }

    pub(crate) fn set_transparent_index(&mut self, index: u16) {
        self.transparent_index = Some(index);
    }
}
