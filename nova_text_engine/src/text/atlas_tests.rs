//! Unit tests for atlas.rs

use crate::error::Error;
use crate::text::{build_atlas, GlyphBitmap, ATLAS_PADDING_PX};

/// A solid-coverage glyph for testing
fn solid_glyph(codepoint: char, width: u32, height: u32, advance: i32) -> GlyphBitmap {
    GlyphBitmap {
        codepoint,
        width,
        height,
        bearing_x: 0,
        bearing_y: height as i32,
        advance,
        pixels: vec![0xFF; (width * height) as usize],
    }
}

// ============================================================================
// PACKING
// ============================================================================

#[test]
fn test_single_glyph_placed_at_padding() {
    let atlas = build_atlas(&[solid_glyph('A', 8, 10, 9)], 12, -3, 1).unwrap();

    assert_eq!(atlas.glyph_count(), 1);
    let info = atlas.glyph_exact('A').unwrap();

    let pad = ATLAS_PADDING_PX as f32;
    assert_eq!(info.u0, pad / atlas.width as f32);
    assert_eq!(info.v0, pad / atlas.height as f32);
    assert_eq!(info.width, 8);
    assert_eq!(info.height, 10);
    assert_eq!(info.advance, 9);
}

#[test]
fn test_glyphs_do_not_overlap() {
    let glyphs: Vec<GlyphBitmap> = (0..16)
        .map(|i| solid_glyph(char::from(b'A' + i), 12, 14, 13))
        .collect();
    let atlas = build_atlas(&glyphs, 14, -4, 0).unwrap();

    // Every glyph wrote solid coverage; if two overlapped, the total lit
    // texels would be less than the sum of the glyph areas
    let lit = atlas.pixels.iter().filter(|&&p| p != 0).count();
    assert_eq!(lit, 16 * 12 * 14);
}

#[test]
fn test_pixels_land_at_recorded_uvs() {
    let mut g = solid_glyph('B', 4, 4, 5);
    g.pixels = vec![
        1, 2, 3, 4, //
        5, 6, 7, 8, //
        9, 10, 11, 12, //
        13, 14, 15, 16,
    ];
    let atlas = build_atlas(&[g], 10, -2, 0).unwrap();

    let info = *atlas.glyph_exact('B').unwrap();
    let x0 = (info.u0 * atlas.width as f32) as usize;
    let y0 = (info.v0 * atlas.height as f32) as usize;

    // Corner texels round-trip through the atlas
    assert_eq!(atlas.pixels[x0 + y0 * atlas.width as usize], 1);
    assert_eq!(atlas.pixels[(x0 + 3) + y0 * atlas.width as usize], 4);
    assert_eq!(atlas.pixels[x0 + (y0 + 3) * atlas.width as usize], 13);
    assert_eq!(atlas.pixels[(x0 + 3) + (y0 + 3) * atlas.width as usize], 16);
}

#[test]
fn test_rows_wrap_when_width_exceeded() {
    // 40 glyphs of 60x20 cannot fit one row of a <=2048 wide atlas
    let glyphs: Vec<GlyphBitmap> = (0..40)
        .map(|i| solid_glyph(char::from_u32(0x100 + i).unwrap(), 60, 20, 61))
        .collect();
    let atlas = build_atlas(&glyphs, 22, -5, 0).unwrap();

    let first = atlas.glyph_exact(char::from_u32(0x100).unwrap()).unwrap();
    let last = atlas.glyph_exact(char::from_u32(0x100 + 39).unwrap()).unwrap();
    // Later rows sit strictly below earlier ones
    assert!(last.v0 > first.v0);
}

#[test]
fn test_atlas_dimensions_are_pow2_and_clamped() {
    let atlas = build_atlas(&[solid_glyph('A', 2, 2, 3)], 4, -1, 0).unwrap();
    assert!(atlas.width.is_power_of_two());
    assert!(atlas.height.is_power_of_two());
    assert!(atlas.width >= 256 && atlas.width <= 2048);
    assert!(atlas.height >= 32 && atlas.height <= 4096);
}

#[test]
fn test_zero_size_glyph_keeps_metrics() {
    // Space: no bitmap, but the advance must survive
    let space = GlyphBitmap {
        codepoint: ' ',
        width: 0,
        height: 0,
        bearing_x: 0,
        bearing_y: 0,
        advance: 6,
        pixels: Vec::new(),
    };
    let atlas = build_atlas(&[space, solid_glyph('A', 8, 10, 9)], 12, -3, 1).unwrap();

    let info = atlas.glyph_exact(' ').unwrap();
    assert_eq!(info.width, 0);
    assert_eq!(info.height, 0);
    assert_eq!(info.advance, 6);
}

// ============================================================================
// VALIDATION
// ============================================================================

#[test]
fn test_mismatched_payload_rejected() {
    let bad = GlyphBitmap {
        codepoint: 'X',
        width: 4,
        height: 4,
        bearing_x: 0,
        bearing_y: 4,
        advance: 5,
        pixels: vec![0xFF; 15], // one byte short
    };
    let result = build_atlas(&[bad], 10, -2, 0);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_empty_glyph_set_still_builds() {
    // Degenerate but not an error; the backend rejects empty uploads
    let atlas = build_atlas(&[], 10, -2, 0).unwrap();
    assert_eq!(atlas.glyph_count(), 0);
    assert!(atlas.width >= 256);
}

// ============================================================================
// LOOKUP
// ============================================================================

#[test]
fn test_glyph_fallback_to_question_mark() {
    let atlas = build_atlas(
        &[solid_glyph('?', 6, 8, 7), solid_glyph('A', 8, 10, 9)],
        12,
        -3,
        1,
    )
    .unwrap();

    // Present codepoint resolves to itself
    assert_eq!(atlas.glyph('A').unwrap().advance, 9);
    // Missing codepoint falls back to '?'
    assert_eq!(atlas.glyph('\u{4E16}').unwrap().advance, 7);
    // Exact lookup does not fall back
    assert!(atlas.glyph_exact('\u{4E16}').is_none());
}

#[test]
fn test_glyph_none_when_fallback_missing() {
    let atlas = build_atlas(&[solid_glyph('A', 8, 10, 9)], 12, -3, 1).unwrap();
    assert!(atlas.glyph('Z').is_none());
}

// ============================================================================
// METRICS
// ============================================================================

#[test]
fn test_line_height() {
    let atlas = build_atlas(&[solid_glyph('A', 8, 10, 9)], 12, -3, 2).unwrap();
    assert_eq!(atlas.line_height_px(), 12 + 3 + 2);
}
