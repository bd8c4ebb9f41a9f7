//! Glyph line layout
//!
//! Converts a string into per-triangle instance data for the text pipeline.
//! Each glyph quad is emitted as two right triangles described by a base
//! corner and a signed side vector; the vertex shader reconstructs the three
//! corners from `gl_VertexIndex`.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::text::FontAtlas;

/// Per-instance vertex payload (one instance == one right triangle)
///
/// Matches the vertex input layout of the text pipeline: four `vec2`
/// attributes at locations 0..3, 32 bytes per instance.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TriInstance {
    /// Base corner in clip space
    pub screen_base: Vec2,
    /// Signed extent of the triangle's two axis-aligned sides
    pub screen_side: Vec2,
    /// Base corner in atlas UV space
    pub uv_base: Vec2,
    /// Signed UV extent
    pub uv_side: Vec2,
}

const _: () = assert!(std::mem::size_of::<TriInstance>() == 32);

/// Width of `text` in font pixels (sum of advances, with `'?'` substituted
/// for missing glyphs)
pub fn measure_text_x_px(atlas: &FontAtlas, text: &str) -> i32 {
    text.chars()
        .filter_map(|c| atlas.glyph(c))
        .map(|g| g.advance)
        .sum()
}

/// Lay out one line of text as triangle instances.
///
/// * `origin` - pen origin (baseline) in clip space
/// * `scale` - pixel-to-clip-space scale; `scale.y` is typically negative
///   because pixel y grows downward while clip-space y grows upward
///
/// Glyphs missing from the atlas render as `'?'`; codepoints without even
/// the fallback are skipped. Whitespace advances the pen without emitting
/// triangles, so the result holds at most two instances per character.
pub fn layout_line(
    atlas: &FontAtlas,
    text: &str,
    origin: Vec2,
    scale: Vec2,
) -> Vec<TriInstance> {
    let mut out = Vec::with_capacity(text.len() * 2);
    let mut pen_x = origin.x;

    for c in text.chars() {
        let Some(g) = atlas.glyph(c) else { continue };

        if g.width > 0 && g.height > 0 {
            let base = Vec2::new(
                pen_x + g.bearing_x as f32 * scale.x,
                origin.y - g.bearing_y as f32 * scale.y,
            );
            let side = Vec2::new(g.width as f32 * scale.x, g.height as f32 * scale.y);
            let uv_base = Vec2::new(g.u0, g.v0);
            let uv_side = Vec2::new(g.u1 - g.u0, g.v1 - g.v0);

            // Lower-left triangle from the quad's origin corner
            out.push(TriInstance {
                screen_base: base,
                screen_side: side,
                uv_base,
                uv_side,
            });
            // Upper-right triangle from the opposite corner, sides negated
            out.push(TriInstance {
                screen_base: base + side,
                screen_side: -side,
                uv_base: uv_base + uv_side,
                uv_side: -uv_side,
            });
        }

        pen_x += g.advance as f32 * scale.x;
    }

    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
