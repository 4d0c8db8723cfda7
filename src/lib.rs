#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

//! Pairwise-nearest-neighbor (PNN) palette quantization.
//!
//! Reduces a full-color image to a bounded palette by histogramming pixels
//! into a reduced ARGB color space, greedily merging the cheapest bin pairs
//! until the target palette size is reached, then remapping every pixel,
//! optionally through a row-serpentine error-diffusion dither. Distance is
//! measured directly on gamma-encoded channels; no perceptual color space
//! is involved.

extern crate alloc;

mod argb;
pub mod bitmap;
mod dither;
pub mod error;
mod histogram;
pub mod palette;
mod pnn;
mod search;

pub use bitmap::Bitmap;
pub use error::QuantizeError;
pub use palette::Palette;

use alloc::vec::Vec;

use rgb::RGBA;

use search::{SearchContext, SearchStrategy};

/// Dithering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DitherMode {
    /// No dithering, per-pixel palette search only.
    None,
    /// Serpentine error diffusion.
    ErrorDiffusion,
}

/// Interpretation of the output code array.
///
/// Palettes of more than 256 colors have no indexed format downstream, so
/// the ditherer emits packed direct-color codes instead of indices; the
/// variant is chosen from the image's transparency profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEncoding {
    /// Palette indices in `[0, max_colors)`.
    Indexed,
    /// 16-bit 5-6-5 RGB codes (no transparency present).
    Rgb565,
    /// 16-bit 1-5-5-5 ARGB codes (binary transparency only).
    Argb1555,
    /// 32-bit ARGB codes (semi-transparency present).
    Argb8888,
}

/// Configuration for palette quantization.
#[derive(Debug, Clone)]
pub struct QuantizeConfig {
    /// Maximum number of palette colors (2..=65536).
    pub max_colors: u32,
    /// Dithering mode. Forced on for palettes above 256 colors.
    pub dither: DitherMode,
    /// Compress bin populations to `floor(sqrt(count))` before merging,
    /// damping the dominance of large flat-color regions.
    pub sqrt_population: bool,
    /// Seed for the probabilistic closest-color search. `None` draws a
    /// fresh seed per run; a fixed seed makes runs reproducible.
    pub seed: Option<u64>,
}

impl Default for QuantizeConfig {
    fn default() -> Self {
        Self {
            max_colors: 256,
            dither: DitherMode::ErrorDiffusion,
            sqrt_population: true,
            seed: None,
        }
    }
}

impl QuantizeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_colors(mut self, n: u32) -> Self {
        self.max_colors = n;
        self
    }

    pub fn dither(mut self, mode: DitherMode) -> Self {
        self.dither = mode;
        self
    }

    pub fn sqrt_population(mut self, enabled: bool) -> Self {
        self.sqrt_population = enabled;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Quantization result.
#[derive(Debug)]
pub struct QuantizeResult {
    palette: Palette,
    codes: Vec<u32>,
    encoding: OutputEncoding,
}

impl QuantizeResult {
    /// ARGB palette entries, in merge-survivor order. May be shorter than
    /// the requested color count when the image has fewer occupied bins.
    pub fn palette(&self) -> &[RGBA<u8>] {
        self.palette.entries()
    }

    /// Number of palette entries.
    pub fn palette_len(&self) -> usize {
        self.palette.len()
    }

    /// Index of the palette slot holding the transparent color, if any.
    pub fn transparent_index(&self) -> Option<u16> {
        self.palette.transparent_index()
    }

    /// One code per pixel, row-major: palette indices for [`OutputEncoding::Indexed`],
    /// packed direct-color values otherwise.
    pub fn codes(&self) -> &[u32] {
        &self.codes
    }

    pub fn encoding(&self) -> OutputEncoding {
        self.encoding
    }

    /// Narrow indexed codes to bytes. `None` unless the output is indexed
    /// with at most 256 palette entries.
    pub fn indices_u8(&self) -> Option<Vec<u8>> {
        if self.encoding != OutputEncoding::Indexed || self.palette.len() > 256 {
            return None;
        }
        Some(self.codes.iter().map(|&c| c as u8).collect())
    }
}

/// Transparency summary from pixel ingestion.
#[derive(Debug, Clone, Copy, Default)]
struct PixelScan {
    /// Any alpha strictly between 0 and 255.
    has_semi_transparency: bool,
    /// Last fully transparent pixel in row-major order, with its color.
    transparent: Option<(usize, RGBA<u8>)>,
}

impl PixelScan {
    fn scan_row(row_start: usize, row: &[RGBA<u8>]) -> Self {
        let mut out = Self::default();
        for (i, &p) in row.iter().enumerate() {
            if p.a == 0 {
                out.transparent = Some((row_start + i, p));
            } else if p.a < 255 {
                out.has_semi_transparency = true;
            }
        }
        out
    }

    // Associative; the later row-major transparent pixel wins, so the
    // parallel reduction agrees with the sequential scan.
    fn combine(self, other: Self) -> Self {
        Self {
            has_semi_transparency: self.has_semi_transparency || other.has_semi_transparency,
            transparent: match (self.transparent, other.transparent) {
                (Some(a), Some(b)) => Some(if b.0 >= a.0 { b } else { a }),
                (a, b) => b.or(a),
            },
        }
    }
}

#[cfg(not(feature = "threads"))]
fn scan_pixels(pixels: &[RGBA<u8>], width: usize) -> PixelScan {
    pixels
        .chunks(width.max(1))
        .enumerate()
        .map(|(row, chunk)| PixelScan::scan_row(row * width, chunk))
        .fold(PixelScan::default(), PixelScan::combine)
}

#[cfg(feature = "threads")]
fn scan_pixels(pixels: &[RGBA<u8>], width: usize) -> PixelScan {
    use rayon::prelude::*;
    pixels
        .par_chunks(width.max(1))
        .enumerate()
        .map(|(row, chunk)| PixelScan::scan_row(row * width, chunk))
        .reduce(PixelScan::default, PixelScan::combine)
}

/// Quantize an RGB image to a palette. Pixels are treated as fully opaque.
pub fn quantize(
    pixels: &[rgb::RGB<u8>],
    width: usize,
    height: usize,
    config: &QuantizeConfig,
) -> Result<QuantizeResult, QuantizeError> {
    let rgba: Vec<RGBA<u8>> = pixels
        .iter()
        .map(|p| RGBA {
            r: p.r,
            g: p.g,
            b: p.b,
            a: 255,
        })
        .collect();
    quantize_rgba(&rgba, width, height, config)
}

/// Quantize an RGBA image to a palette.
///
/// Fully transparent pixels claim a palette slot holding their recorded
/// color; semi-transparency switches binning and dithering to four-channel
/// mode. The engine always produces a result; there is no algorithmic
/// failure path, only input-contract validation.
pub fn quantize_rgba(
    pixels: &[RGBA<u8>],
    width: usize,
    height: usize,
    config: &QuantizeConfig,
) -> Result<QuantizeResult, QuantizeError> {
    validate_inputs(pixels.len(), width, height, config)?;

    let scan = scan_pixels(pixels, width);
    let max_colors = config.max_colors as usize;
    let transparent_color = scan.transparent.map(|(_, c)| c);

    let mut palette = if max_colors > 2 {
        let mut bins = histogram::build_bins(
            pixels,
            scan.has_semi_transparency,
            config.sqrt_population,
        );
        log::debug!(
            "histogram: {} occupied bins for {} pixels",
            bins.len(),
            pixels.len()
        );
        pnn::merge(&mut bins, max_colors);
        Palette::from_bins(&bins, transparent_color)
    } else {
        Palette::monochrome(transparent_color)
    };

    let mut dither = config.dither == DitherMode::ErrorDiffusion;
    if max_colors > 256 && !dither {
        // Large palettes band visibly without diffusion
        log::debug!("palette of {max_colors} colors forces dithering on");
        dither = true;
    }

    let encoding = if max_colors <= 256 {
        OutputEncoding::Indexed
    } else if scan.has_semi_transparency {
        OutputEncoding::Argb8888
    } else if scan.transparent.is_some() {
        OutputEncoding::Argb1555
    } else {
        OutputEncoding::Rgb565
    };

    let codes = if dither {
        dither::diffuse_image(
            pixels,
            width,
            height,
            &palette,
            scan.has_semi_transparency,
            encoding,
        )
    } else {
        let strategy = if scan.transparent.is_some() || max_colors < 64 {
            SearchStrategy::Nearest
        } else {
            SearchStrategy::Closest
        };
        let mut ctx = SearchContext::new(config.seed);
        dither::remap_image(pixels, &palette, &mut ctx, strategy)
    };

    // Keep the transparent pixel's slot holding its exact color. Only
    // meaningful for indexed output, where codes are palette indices.
    if encoding == OutputEncoding::Indexed {
        if let Some((t_index, t_color)) = scan.transparent {
            let k = codes[t_index] as usize;
            if max_colors > 2 {
                palette.set_entry(k, t_color);
            } else if palette.entries()[k] != t_color {
                palette.swap_entries(0, 1);
            }
            palette.set_transparent_index(k as u16);
        }
    }

    Ok(QuantizeResult {
        palette,
        codes,
        encoding,
    })
}

/// Quantize and pack into a destination bitmap of the given bit depth.
///
/// When `2^bits_per_pixel` cannot hold `max_colors` the operation is
/// skipped: a blank (zeroed) bitmap is returned with `None` in place of the
/// quantization result. Direct-color output (palettes above 256 entries)
/// ignores the requested depth and packs at 16 or 32 bpp as the encoding
/// dictates.
pub fn quantize_rgba_to_bitmap(
    pixels: &[RGBA<u8>],
    width: usize,
    height: usize,
    bits_per_pixel: u8,
    config: &QuantizeConfig,
) -> Result<(Bitmap, Option<QuantizeResult>), QuantizeError> {
    if !matches!(bits_per_pixel, 1 | 4 | 8 | 16 | 32) {
        return Err(QuantizeError::UnsupportedBitDepth(bits_per_pixel));
    }
    if (1u64 << bits_per_pixel) < config.max_colors as u64 {
        log::warn!(
            "bit depth {bits_per_pixel} cannot hold {} colors, skipping",
            config.max_colors
        );
        return Ok((Bitmap::new(width, height, bits_per_pixel)?, None));
    }

    let result = quantize_rgba(pixels, width, height, config)?;
    let depth = match result.encoding() {
        OutputEncoding::Indexed => bits_per_pixel,
        OutputEncoding::Rgb565 | OutputEncoding::Argb1555 => 16,
        OutputEncoding::Argb8888 => 32,
    };
    let mut bmp = Bitmap::new(width, height, depth)?;
    bmp.fill_from(result.codes());
    Ok((bmp, Some(result)))
}

fn validate_inputs(
    pixel_count: usize,
    width: usize,
    height: usize,
    config: &QuantizeConfig,
) -> Result<(), QuantizeError> {
    if width == 0 || height == 0 {
        return Err(QuantizeError::ZeroDimension);
    }
    if pixel_count != width * height {
        return Err(QuantizeError::DimensionMismatch {
            len: pixel_count,
            width,
            height,
        });
    }
    if config.max_colors < 2 || config.max_colors > 65536 {
        return Err(QuantizeError::InvalidMaxColors(config.max_colors));
    }
    Ok(())
}
