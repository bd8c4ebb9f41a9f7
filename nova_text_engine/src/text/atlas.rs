//! Font atlas packing
//!
//! Packs pre-rasterized glyph bitmaps (one byte per texel coverage) into a
//! single-channel atlas using row-based shelf packing with one texel of
//! padding between glyphs. The padding keeps linear filtering from bleeding
//! between neighbors.

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};

/// Padding in texels between packed glyphs (and around the atlas border)
pub const ATLAS_PADDING_PX: u32 = 1;

/// Placement and metrics of one glyph inside the atlas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphInfo {
    /// Normalized UV rectangle inside the atlas
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
    /// Bitmap size in pixels
    pub width: i32,
    pub height: i32,
    /// Offset from the pen to the bitmap's top-left, in pixels
    pub bearing_x: i32,
    pub bearing_y: i32,
    /// Horizontal pen advance in pixels
    pub advance: i32,
}

/// One rasterized glyph handed to the packer
#[derive(Debug, Clone)]
pub struct GlyphBitmap {
    pub codepoint: char,
    /// Bitmap size in pixels (may be 0x0 for whitespace)
    pub width: u32,
    pub height: u32,
    pub bearing_x: i32,
    pub bearing_y: i32,
    pub advance: i32,
    /// Coverage, row-major, `width * height` bytes
    pub pixels: Vec<u8>,
}

/// A packed CPU font atlas ready for upload
#[derive(Debug, Clone)]
pub struct FontAtlas {
    /// Single-channel coverage, row-major, `width * height` bytes
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Vertical font metrics in pixels
    pub ascent: i32,
    pub descent: i32,
    pub line_gap: i32,
    glyphs: FxHashMap<char, GlyphInfo>,
}

impl FontAtlas {
    /// Look up a glyph, substituting `'?'` for codepoints outside the atlas.
    ///
    /// Returns `None` only when the fallback itself is missing.
    pub fn glyph(&self, codepoint: char) -> Option<&GlyphInfo> {
        self.glyphs
            .get(&codepoint)
            .or_else(|| self.glyphs.get(&'?'))
    }

    /// Glyph lookup without the fallback
    pub fn glyph_exact(&self, codepoint: char) -> Option<&GlyphInfo> {
        self.glyphs.get(&codepoint)
    }

    /// Number of packed glyphs
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Advance from one baseline to the next, in pixels
    pub fn line_height_px(&self) -> i32 {
        self.ascent - self.descent + self.line_gap
    }
}

fn next_pow2(v: u32) -> u32 {
    v.max(1).next_power_of_two()
}

/// Pack rasterized glyphs into a single-channel atlas.
///
/// The atlas width is estimated from the total glyph area plus 12.5% slack,
/// rounded to a power of two and clamped to `[256, 2048]`. The height is
/// whatever the shelf packing needs, rounded to a power of two and clamped
/// to `[32, 4096]`.
///
/// # Errors
///
/// `Error::InvalidResource` when a glyph's pixel payload does not match its
/// declared dimensions.
pub fn build_atlas(
    glyphs: &[GlyphBitmap],
    ascent: i32,
    descent: i32,
    line_gap: i32,
) -> Result<FontAtlas> {
    let pad = ATLAS_PADDING_PX as i32;

    let mut total_px: u64 = 0;
    for g in glyphs {
        if g.pixels.len() != (g.width * g.height) as usize {
            return Err(Error::InvalidResource(format!(
                "glyph '{}' declares {}x{} but carries {} bytes",
                g.codepoint,
                g.width,
                g.height,
                g.pixels.len()
            )));
        }
        total_px += u64::from(g.width.max(1)) * u64::from(g.height.max(1));
    }

    let target_area = total_px + total_px / 8;
    let est_side = next_pow2((target_area as f64).sqrt().ceil() as u32);
    let atlas_w = est_side.clamp(256, 2048);

    // Dry run to find the packed height
    let mut pen_x = pad;
    let mut pen_y = pad;
    let mut row_h = 0i32;
    for g in glyphs {
        let (w, h) = (g.width as i32, g.height as i32);
        if pen_x + w + pad > atlas_w as i32 {
            pen_x = pad;
            pen_y += row_h + pad;
            row_h = 0;
        }
        row_h = row_h.max(h);
        pen_x += w + pad;
    }
    let atlas_h = next_pow2((pen_y + row_h + pad) as u32).clamp(32, 4096);

    let mut atlas = FontAtlas {
        pixels: vec![0u8; (atlas_w * atlas_h) as usize],
        width: atlas_w,
        height: atlas_h,
        ascent,
        descent,
        line_gap,
        glyphs: FxHashMap::default(),
    };

    // Second pass: blit and record placements
    pen_x = pad;
    pen_y = pad;
    row_h = 0;
    for g in glyphs {
        let (w, h) = (g.width as i32, g.height as i32);
        if pen_x + w + pad > atlas_w as i32 {
            pen_x = pad;
            pen_y += row_h + pad;
            row_h = 0;
        }

        if w > 0 && h > 0 {
            for y in 0..h {
                let dst = (pen_x + (pen_y + y) * atlas_w as i32) as usize;
                let src = (y * w) as usize;
                atlas.pixels[dst..dst + w as usize]
                    .copy_from_slice(&g.pixels[src..src + w as usize]);
            }
            row_h = row_h.max(h);
        }

        let info = GlyphInfo {
            u0: pen_x as f32 / atlas_w as f32,
            v0: pen_y as f32 / atlas_h as f32,
            u1: (pen_x + w) as f32 / atlas_w as f32,
            v1: (pen_y + h) as f32 / atlas_h as f32,
            width: w,
            height: h,
            bearing_x: g.bearing_x,
            bearing_y: g.bearing_y,
            advance: g.advance,
        };
        atlas.glyphs.insert(g.codepoint, info);

        pen_x += w + pad;
    }

    Ok(atlas)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "atlas_tests.rs"]
mod tests;
