//! Unit tests for layout.rs

use glam::Vec2;

use crate::text::{build_atlas, layout_line, measure_text_x_px, FontAtlas, GlyphBitmap, TriInstance};

fn glyph(codepoint: char, width: u32, height: u32, bearing_x: i32, bearing_y: i32, advance: i32) -> GlyphBitmap {
    GlyphBitmap {
        codepoint,
        width,
        height,
        bearing_x,
        bearing_y,
        advance,
        pixels: vec![0xFF; (width * height) as usize],
    }
}

fn test_atlas() -> FontAtlas {
    build_atlas(
        &[
            glyph('A', 8, 10, 1, 10, 9),
            glyph('B', 7, 10, 1, 10, 8),
            glyph('?', 6, 8, 0, 8, 7),
            glyph(' ', 0, 0, 0, 0, 5),
        ],
        12,
        -3,
        1,
    )
    .unwrap()
}

// ============================================================================
// TRI INSTANCE LAYOUT
// ============================================================================

#[test]
fn test_tri_instance_is_32_bytes() {
    assert_eq!(std::mem::size_of::<TriInstance>(), 32);
}

#[test]
fn test_tri_instance_is_pod() {
    let tris = vec![TriInstance {
        screen_base: Vec2::new(0.0, 0.0),
        screen_side: Vec2::new(0.5, 0.5),
        uv_base: Vec2::new(0.0, 0.0),
        uv_side: Vec2::new(1.0, 1.0),
    }];
    let bytes: &[u8] = bytemuck::cast_slice(&tris);
    assert_eq!(bytes.len(), 32);
}

#[test]
fn test_two_triangles_per_visible_glyph() {
    let atlas = test_atlas();
    let tris = layout_line(&atlas, "AB", Vec2::ZERO, Vec2::new(0.01, -0.01));
    assert_eq!(tris.len(), 4);
}

#[test]
fn test_whitespace_advances_without_triangles() {
    let atlas = test_atlas();
    let with_space = layout_line(&atlas, "A B", Vec2::ZERO, Vec2::new(0.01, -0.01));
    assert_eq!(with_space.len(), 4);

    // The space still moved the pen: B starts further right than in "AB"
    let without_space = layout_line(&atlas, "AB", Vec2::ZERO, Vec2::new(0.01, -0.01));
    let b_with = with_space[2].screen_base.x;
    let b_without = without_space[2].screen_base.x;
    assert!(b_with > b_without);
}

#[test]
fn test_triangle_pair_covers_quad() {
    let atlas = test_atlas();
    let scale = Vec2::new(0.01, -0.01);
    let tris = layout_line(&atlas, "A", Vec2::new(-0.5, 0.2), scale);
    assert_eq!(tris.len(), 2);

    let lower = &tris[0];
    let upper = &tris[1];

    // Second triangle starts at the opposite corner with negated sides
    assert_eq!(upper.screen_base, lower.screen_base + lower.screen_side);
    assert_eq!(upper.screen_side, -lower.screen_side);
    assert_eq!(upper.uv_base, lower.uv_base + lower.uv_side);
    assert_eq!(upper.uv_side, -lower.uv_side);
}

#[test]
fn test_glyph_placement_uses_bearings() {
    let atlas = test_atlas();
    let origin = Vec2::new(0.0, 0.0);
    let scale = Vec2::new(0.01, -0.01);
    let tris = layout_line(&atlas, "A", origin, scale);

    let info = atlas.glyph_exact('A').unwrap();
    let base = tris[0].screen_base;
    // x shifted right by bearing_x, y lifted above the baseline by bearing_y
    assert!((base.x - (origin.x + info.bearing_x as f32 * scale.x)).abs() < 1e-6);
    assert!((base.y - (origin.y - info.bearing_y as f32 * scale.y)).abs() < 1e-6);
}

#[test]
fn test_pen_advances_per_glyph() {
    let atlas = test_atlas();
    let scale = Vec2::new(0.01, -0.01);
    let tris = layout_line(&atlas, "AA", Vec2::ZERO, scale);

    let first = tris[0].screen_base.x;
    let second = tris[2].screen_base.x;
    let advance = atlas.glyph_exact('A').unwrap().advance as f32 * scale.x;
    assert!((second - first - advance).abs() < 1e-6);
}

#[test]
fn test_missing_glyph_renders_fallback() {
    let atlas = test_atlas();
    let tris = layout_line(&atlas, "\u{4E16}", Vec2::ZERO, Vec2::new(0.01, -0.01));
    assert_eq!(tris.len(), 2);

    let q = atlas.glyph_exact('?').unwrap();
    assert_eq!(tris[0].uv_base, Vec2::new(q.u0, q.v0));
}

#[test]
fn test_uv_side_matches_glyph_rect() {
    let atlas = test_atlas();
    let tris = layout_line(&atlas, "B", Vec2::ZERO, Vec2::new(0.01, -0.01));

    let info = atlas.glyph_exact('B').unwrap();
    assert_eq!(tris[0].uv_side, Vec2::new(info.u1 - info.u0, info.v1 - info.v0));
}

// ============================================================================
// MEASUREMENT
// ============================================================================

#[test]
fn test_measure_sums_advances() {
    let atlas = test_atlas();
    // A(9) + space(5) + B(8)
    assert_eq!(measure_text_x_px(&atlas, "A B"), 22);
}

#[test]
fn test_measure_uses_fallback_advance() {
    let atlas = test_atlas();
    // Missing codepoint measures as '?' (7)
    assert_eq!(measure_text_x_px(&atlas, "\u{4E16}"), 7);
}

#[test]
fn test_measure_empty_is_zero() {
    let atlas = test_atlas();
    assert_eq!(measure_text_x_px(&atlas, ""), 0);
}
