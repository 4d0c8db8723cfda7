//! End-to-end properties of the quantization pipeline.

use zenpnn::{DitherMode, OutputEncoding, QuantizeConfig};

const BLACK: rgb::RGBA<u8> = rgb::RGBA {
    r: 0,
    g: 0,
    b: 0,
    a: 255,
};
const WHITE: rgb::RGBA<u8> = rgb::RGBA {
    r: 255,
    g: 255,
    b: 255,
    a: 255,
};

fn opaque(r: u8, g: u8, b: u8) -> rgb::RGBA<u8> {
    rgb::RGBA { r, g, b, a: 255 }
}

/// Deterministic pseudo-random colors via Knuth's multiplicative hash.
fn noisy_image(len: usize) -> Vec<rgb::RGBA<u8>> {
    (0..len)
        .map(|i| {
            let h = (i as u32).wrapping_mul(2654435761);
            opaque(h as u8, (h >> 8) as u8, (h >> 16) as u8)
        })
        .collect()
}

fn pack565(c: rgb::RGBA<u8>) -> u32 {
    (((c.r as u32 & 0xF8) << 8) | ((c.g as u32 & 0xFC) << 3) | (c.b as u32 >> 3)) as u32
}

fn pack1555(c: rgb::RGBA<u8>) -> u32 {
    ((c.a as u32 & 0x80) << 8) | ((c.r as u32 & 0xF8) << 7) | ((c.g as u32 & 0xF8) << 2)
        | (c.b as u32 >> 3)
}

#[test]
fn two_colors_without_transparency_is_black_and_white() {
    let pixels = noisy_image(64);
    let config = QuantizeConfig::new().max_colors(2).dither(DitherMode::None);
    let result = zenpnn::quantize_rgba(&pixels, 8, 8, &config).unwrap();

    assert_eq!(result.palette(), &[BLACK, WHITE]);
    assert!(result.transparent_index().is_none());
}

#[test]
fn two_colors_with_transparency_is_transparent_and_black() {
    let t = rgb::RGBA {
        r: 40,
        g: 50,
        b: 60,
        a: 0,
    };
    let mut pixels = noisy_image(64);
    pixels[10] = t;
    pixels[20] = t;

    let config = QuantizeConfig::new().max_colors(2).dither(DitherMode::None);
    let result = zenpnn::quantize_rgba(&pixels, 8, 8, &config).unwrap();

    assert_eq!(result.palette(), &[t, BLACK]);
    assert_eq!(result.transparent_index(), Some(0));
    assert_eq!(result.codes()[10], 0);
    assert_eq!(result.codes()[20], 0);
}

#[test]
fn two_pixel_image_degenerate_palette() {
    // 2x1 image, max_colors = 2: the fixed-palette path assigns dark to
    // black and light to white.
    let pixels = vec![opaque(10, 10, 10), opaque(250, 250, 250)];
    let config = QuantizeConfig::new().max_colors(2).dither(DitherMode::None);
    let result = zenpnn::quantize_rgba(&pixels, 2, 1, &config).unwrap();

    assert_eq!(result.codes(), &[0, 1]);
    assert_eq!(result.palette(), &[BLACK, WHITE]);
}

#[test]
fn two_pixel_image_merge_path_keeps_exact_colors() {
    // With room for both bins no merge happens and the palette reproduces
    // the source colors exactly.
    let pixels = vec![opaque(10, 10, 10), opaque(250, 250, 250)];
    let config = QuantizeConfig::new().max_colors(3).dither(DitherMode::None);
    let result = zenpnn::quantize_rgba(&pixels, 2, 1, &config).unwrap();

    assert_eq!(result.palette(), &[opaque(10, 10, 10), opaque(250, 250, 250)]);
    assert_eq!(result.codes(), &[0, 1]);
}

#[test]
fn indices_stay_below_max_colors() {
    let pixels = noisy_image(256);
    for max_colors in [2u32, 8, 64, 200, 256] {
        for dither in [DitherMode::None, DitherMode::ErrorDiffusion] {
            let config = QuantizeConfig::new()
                .max_colors(max_colors)
                .dither(dither)
                .seed(11);
            let result = zenpnn::quantize_rgba(&pixels, 16, 16, &config).unwrap();
            assert_eq!(result.encoding(), OutputEncoding::Indexed);
            for &code in result.codes() {
                assert!(
                    code < max_colors,
                    "code {code} >= {max_colors} with {dither:?}"
                );
            }
        }
    }
}

#[test]
fn exact_search_path_is_deterministic() {
    let pixels = noisy_image(400);
    // max_colors below 64 selects the exact nearest search; no RNG in play
    let config = QuantizeConfig::new().max_colors(32).dither(DitherMode::None);

    let a = zenpnn::quantize_rgba(&pixels, 20, 20, &config).unwrap();
    let b = zenpnn::quantize_rgba(&pixels, 20, 20, &config).unwrap();

    assert_eq!(a.codes(), b.codes());
    assert_eq!(a.palette(), b.palette());
}

#[test]
fn dithered_output_is_deterministic() {
    let pixels = noisy_image(400);
    let config = QuantizeConfig::new()
        .max_colors(100)
        .dither(DitherMode::ErrorDiffusion);

    let a = zenpnn::quantize_rgba(&pixels, 20, 20, &config).unwrap();
    let b = zenpnn::quantize_rgba(&pixels, 20, 20, &config).unwrap();

    assert_eq!(a.codes(), b.codes());
}

#[test]
fn seeded_probabilistic_search_reproduces() {
    let pixels = noisy_image(400);
    // 64+ colors without transparency selects the cached closest search
    let config = QuantizeConfig::new()
        .max_colors(128)
        .dither(DitherMode::None)
        .seed(1234);

    let a = zenpnn::quantize_rgba(&pixels, 20, 20, &config).unwrap();
    let b = zenpnn::quantize_rgba(&pixels, 20, 20, &config).unwrap();

    assert_eq!(a.codes(), b.codes());
}

#[test]
fn few_distinct_colors_reproduce_exactly() {
    // Four colors in distinct reduced-space cells; enough palette room
    // means no merging, so the palette equals the source color set.
    let colors = [
        opaque(16, 16, 16),
        opaque(80, 80, 80),
        opaque(160, 160, 160),
        opaque(240, 240, 240),
    ];
    let pixels: Vec<rgb::RGBA<u8>> = (0..64).map(|i| colors[i % 4]).collect();

    let config = QuantizeConfig::new().max_colors(16).dither(DitherMode::None);
    let result = zenpnn::quantize_rgba(&pixels, 8, 8, &config).unwrap();

    let mut palette: Vec<_> = result.palette().to_vec();
    palette.sort_by_key(|c| (c.r, c.g, c.b, c.a));
    let mut expected = colors.to_vec();
    expected.sort_by_key(|c| (c.r, c.g, c.b, c.a));
    assert_eq!(palette, expected);

    // And every pixel maps back to its own color
    for (i, &code) in result.codes().iter().enumerate() {
        assert_eq!(result.palette()[code as usize], colors[i % 4]);
    }
}

#[test]
fn single_color_image_collapses_to_one_entry() {
    let color = opaque(37, 99, 200);
    let pixels = vec![color; 100];

    for dither in [DitherMode::None, DitherMode::ErrorDiffusion] {
        let config = QuantizeConfig::new().max_colors(8).dither(dither);
        let result = zenpnn::quantize_rgba(&pixels, 10, 10, &config).unwrap();

        assert_eq!(result.palette_len(), 1);
        assert_eq!(result.palette()[0], color);
        assert!(result.codes().iter().all(|&c| c == 0));
    }
}

#[test]
fn large_palette_emits_rgb565_codes() {
    let pixels = noisy_image(1024);
    // Above 256 colors there is no indexed format; dithering is forced and
    // codes carry packed palette colors.
    let config = QuantizeConfig::new().max_colors(512).dither(DitherMode::None);
    let result = zenpnn::quantize_rgba(&pixels, 32, 32, &config).unwrap();

    assert_eq!(result.encoding(), OutputEncoding::Rgb565);
    assert!(result.indices_u8().is_none());

    let valid: std::collections::BTreeSet<u32> =
        result.palette().iter().map(|&c| pack565(c)).collect();
    for &code in result.codes() {
        assert!(code <= 0xFFFF);
        assert!(valid.contains(&code), "code {code:#x} not a palette color");
    }
}

#[test]
fn large_palette_with_binary_transparency_emits_argb1555() {
    let mut pixels = noisy_image(1024);
    pixels[0] = rgb::RGBA {
        r: 1,
        g: 2,
        b: 3,
        a: 0,
    };
    let config = QuantizeConfig::new().max_colors(512);
    let result = zenpnn::quantize_rgba(&pixels, 32, 32, &config).unwrap();

    assert_eq!(result.encoding(), OutputEncoding::Argb1555);
    let valid: std::collections::BTreeSet<u32> =
        result.palette().iter().map(|&c| pack1555(c)).collect();
    for &code in result.codes() {
        assert!(code <= 0xFFFF);
        assert!(valid.contains(&code), "code {code:#x} not a palette color");
    }
}

#[test]
fn large_palette_with_semi_transparency_emits_argb8888() {
    let mut pixels = noisy_image(1024);
    for p in pixels.iter_mut().take(100) {
        p.a = 128;
    }
    let config = QuantizeConfig::new().max_colors(512);
    let result = zenpnn::quantize_rgba(&pixels, 32, 32, &config).unwrap();

    assert_eq!(result.encoding(), OutputEncoding::Argb8888);
    let valid: std::collections::BTreeSet<u32> = result
        .palette()
        .iter()
        .map(|&c| {
            ((c.a as u32) << 24) | ((c.r as u32) << 16) | ((c.g as u32) << 8) | c.b as u32
        })
        .collect();
    for &code in result.codes() {
        assert!(valid.contains(&code), "code {code:#x} not a palette color");
    }
}

#[test]
fn semi_transparent_pixels_round_trip_alpha() {
    // Semi-transparency switches to 4-channel binning, so alpha levels
    // survive into the palette.
    let mut pixels = Vec::new();
    for i in 0..64 {
        let a = if i % 2 == 0 { 255 } else { 96 };
        pixels.push(rgb::RGBA {
            r: 200,
            g: 40,
            b: 40,
            a,
        });
    }

    let config = QuantizeConfig::new().max_colors(8).dither(DitherMode::None);
    let result = zenpnn::quantize_rgba(&pixels, 8, 8, &config).unwrap();

    let alphas: std::collections::BTreeSet<u8> =
        result.palette().iter().map(|c| c.a).collect();
    assert!(alphas.contains(&255));
    assert!(alphas.contains(&96));
}
