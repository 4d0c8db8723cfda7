extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

use rgb::RGBA;

use crate::argb::{to_argb1555, to_argb8888, to_rgb565};
use crate::palette::Palette;
use crate::search::{self, SearchContext, SearchStrategy};
use crate::OutputEncoding;

/// Channels per error cell (R, G, B, A).
const DJ: usize = 4;

/// Residual clamp bound per channel per pixel.
const DITHER_MAX: i32 = 20;

#[inline]
fn encode(palette: &Palette, index: u16, encoding: OutputEncoding) -> u32 {
    match encoding {
        OutputEncoding::Indexed => index as u32,
        OutputEncoding::Rgb565 => to_rgb565(palette.entries()[index as usize]) as u32,
        OutputEncoding::Argb1555 => to_argb1555(palette.entries()[index as usize]) as u32,
        OutputEncoding::Argb8888 => to_argb8888(palette.entries()[index as usize]),
    }
}

#[inline]
fn clamp_channel(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

#[inline]
fn clamp_residual(v: i32) -> i32 {
    v.clamp(-DITHER_MAX, DITHER_MAX)
}

/// Row-serpentine error-diffusion pass.
///
/// Scan direction alternates per row. Accumulated error is read back from
/// the current-row buffer with a bias-rounded shift (the stored values carry
/// the 16x kernel weighting), the adjusted pixel is quantized with the exact
/// nearest search, and the clamped residual is spread over four neighbors
/// with 1/3/5/7 weights. The next-row buffer becomes the current-row buffer
/// at each scanline swap, a genuine row-to-row data dependency.
///
/// Alpha error diffuses only when the image has semi-transparency; otherwise
/// source alpha passes straight through.
pub(crate) fn diffuse_image(
    pixels: &[RGBA<u8>],
    width: usize,
    height: usize,
    palette: &Palette,
    has_semi_transparency: bool,
    encoding: OutputEncoding,
) -> Vec<u32> {
    let err_len = (width + 2) * DJ;
    let mut row0 = vec![0i16; err_len];
    let mut row1 = vec![0i16; err_len];
    let mut codes = vec![0u32; pixels.len()];
    let mut forward = true;

    for y in 0..height {
        let mut cursor0 = DJ;
        let mut cursor1 = width * DJ;
        row1[cursor1..cursor1 + DJ].fill(0);

        for step in 0..width {
            let x = if forward { step } else { width - 1 - step };
            let idx = y * width + x;
            let c = pixels[idx];

            // Error readback. Semi-transparent images diffuse all four
            // channels at 1/16; opaque images halve the strength on R/B
            // and quarter it on G, with alpha untouched.
            let adjusted = if has_semi_transparency {
                RGBA {
                    r: clamp_channel(c.r as i32 + ((row0[cursor0] as i32 + 8) >> 4)),
                    g: clamp_channel(c.g as i32 + ((row0[cursor0 + 1] as i32 + 8) >> 4)),
                    b: clamp_channel(c.b as i32 + ((row0[cursor0 + 2] as i32 + 8) >> 4)),
                    a: clamp_channel(c.a as i32 + ((row0[cursor0 + 3] as i32 + 8) >> 4)),
                }
            } else {
                RGBA {
                    r: clamp_channel(c.r as i32 + ((row0[cursor0] as i32 + 16) >> 5)),
                    g: clamp_channel(c.g as i32 + ((row0[cursor0 + 1] as i32 + 32) >> 6)),
                    b: clamp_channel(c.b as i32 + ((row0[cursor0 + 2] as i32 + 16) >> 5)),
                    a: c.a,
                }
            };

            let k = search::nearest_index(palette.entries(), adjusted);
            codes[idx] = encode(palette, k, encoding);
            let chosen = palette.entries()[k as usize];

            let residual = [
                clamp_residual(adjusted.r as i32 - chosen.r as i32),
                clamp_residual(adjusted.g as i32 - chosen.g as i32),
                clamp_residual(adjusted.b as i32 - chosen.b as i32),
                clamp_residual(adjusted.a as i32 - chosen.a as i32),
            ];

            // The next-row cursor runs opposite to the current-row cursor,
            // mirroring the reversed scan of the row below. The plain
            // assignment seeds the cell one ahead of the next-row cursor
            // before later pixels accumulate into it.
            for (ch, &e) in residual.iter().enumerate() {
                let mut e = e;
                let twice = e * 2;
                row1[cursor1 - DJ + ch] = e as i16;
                e += twice;
                row1[cursor1 + DJ + ch] += e as i16;
                e += twice;
                row1[cursor1 + ch] += e as i16;
                e += twice;
                row0[cursor0 + DJ + ch] += e as i16;
            }

            cursor0 += DJ;
            cursor1 -= DJ;
        }

        forward = !forward;
        core::mem::swap(&mut row0, &mut row1);
    }

    codes
}

/// Plain per-pixel remap without diffusion. Always produces indexed codes
/// (the direct-color encodings only arise on the forced-dither path).
pub(crate) fn remap_image(
    pixels: &[RGBA<u8>],
    palette: &Palette,
    ctx: &mut SearchContext,
    strategy: SearchStrategy,
) -> Vec<u32> {
    pixels
        .iter()
        .map(|&p| ctx.index_of(strategy, palette.entries(), p) as u32)
        .collect()
}
