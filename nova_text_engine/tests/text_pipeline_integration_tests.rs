//! Integration tests for the CPU side of the text pipeline
//!
//! Exercises the full path a frame takes before touching the GPU:
//! pack an atlas, lay out a line, cast the instances to bytes, and
//! reserve space for them in the streaming arena bookkeeping.
//!
//! No GPU required.
//!
//! Run with: cargo test --test text_pipeline_integration_tests

use glam::Vec2;
use nova_text_engine::novatext::text::{
    build_atlas, layout_line, measure_text_x_px, FontAtlas, GlyphBitmap, TriInstance,
};
use nova_text_engine::novatext::utils::BumpLayout;
use nova_text_engine::novatext::Error;

// ============================================================================
// TEST ATLAS
// ============================================================================

/// Build a small synthetic ASCII atlas (no font rasterizer needed)
fn synthetic_ascii_atlas() -> FontAtlas {
    let mut glyphs = Vec::new();
    for cp in 32u32..=126 {
        let c = char::from_u32(cp).unwrap();
        let (w, h) = if c == ' ' { (0, 0) } else { (8, 12) };
        glyphs.push(GlyphBitmap {
            codepoint: c,
            width: w,
            height: h,
            bearing_x: 1,
            bearing_y: 11,
            advance: 9,
            pixels: vec![0x80; (w * h) as usize],
        });
    }
    build_atlas(&glyphs, 12, -3, 1).unwrap()
}

// ============================================================================
// ATLAS -> LAYOUT -> ARENA
// ============================================================================

#[test]
fn test_integration_line_to_arena_bytes() {
    let atlas = synthetic_ascii_atlas();

    // Screen of 800x600, pixel-to-clip-space scale as the render loop uses
    let (screen_w, screen_h) = (800.0f32, 600.0f32);
    let scale = Vec2::new(2.0 / screen_w, -2.0 / screen_h);

    let msg = "Hello, world!";
    let text_w_px = measure_text_x_px(&atlas, msg);
    let origin_px = Vec2::new(
        0.5 * (screen_w - text_w_px as f32),
        0.5 * screen_h + 0.35 * atlas.line_height_px() as f32,
    );
    let origin = Vec2::new(-1.0 + scale.x * origin_px.x, 1.0 + scale.y * origin_px.y);

    let tris = layout_line(&atlas, msg, origin, scale);

    // 13 chars, one of them a space: 12 visible glyphs, 24 triangles
    assert_eq!(tris.len(), 24);

    // Every emitted corner stays inside clip space for a centered line
    for t in &tris {
        let far = t.screen_base + t.screen_side;
        for p in [t.screen_base, far] {
            assert!(p.x >= -1.0 && p.x <= 1.0, "x out of clip space: {}", p.x);
            assert!(p.y >= -1.0 && p.y <= 1.0, "y out of clip space: {}", p.y);
        }
    }

    // Cast to bytes and reserve arena space the way the backend does
    let bytes: &[u8] = bytemuck::cast_slice(&tris);
    assert_eq!(bytes.len(), tris.len() * 32);

    let mut arena = BumpLayout::new(1 << 20, 64, true);
    let slice = arena
        .allocate(bytes.len() as u64, std::mem::align_of::<TriInstance>() as u64)
        .unwrap();
    assert_eq!(slice.offset, 0);
    assert_eq!(slice.size, bytes.len() as u64);
}

#[test]
fn test_integration_arena_exhaustion_recovers_after_grow() {
    let atlas = synthetic_ascii_atlas();
    let scale = Vec2::new(2.0 / 800.0, -2.0 / 600.0);

    let long_line: String = std::iter::repeat('W').take(64).collect();
    let tris = layout_line(&atlas, &long_line, Vec2::new(-1.0, 0.0), scale);
    let needed = (tris.len() * 32) as u64;

    // Arena too small for the batch
    let mut arena = BumpLayout::new(needed / 2, 64, true);
    let result = arena.allocate(needed, 16);
    assert!(matches!(result, Err(Error::CapacityExhausted { .. })));

    // Grow to the doubled size the backend would pick, then retry
    let mut grown = BumpLayout::new(needed * 2, 64, arena.is_coherent());
    let slice = grown.allocate(needed, 16).unwrap();
    assert_eq!(slice.offset, 0);
}

#[test]
fn test_integration_multiple_frames_reuse_arena() {
    let atlas = synthetic_ascii_atlas();
    let scale = Vec2::new(2.0 / 800.0, -2.0 / 600.0);
    let mut arena = BumpLayout::new(1 << 16, 64, false);

    for frame in 0..3 {
        let msg = format!("frame {}", frame);
        let tris = layout_line(&atlas, &msg, Vec2::new(-0.9, 0.0), scale);
        assert!(!tris.is_empty());

        let bytes: &[u8] = bytemuck::cast_slice(&tris);
        let slice = arena.allocate(bytes.len() as u64, 16).unwrap();

        // Same offsets every frame once the arena is rewound
        assert_eq!(slice.offset, 0);
        // Non-coherent arena always reports a flush range
        let (fstart, fsize) = slice.flush.unwrap();
        assert!(fstart <= slice.offset);
        assert!(fstart + fsize >= slice.offset + slice.size);

        arena.reset();
    }
}
