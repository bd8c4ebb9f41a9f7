//! CPU-side text data: font atlas packing and glyph line layout
//!
//! Everything in this module is GPU-free. The backend consumes the packed
//! atlas pixels (single-channel, one byte per texel) and the per-triangle
//! instance stream produced here.

mod atlas;
mod layout;

pub use atlas::{build_atlas, FontAtlas, GlyphBitmap, GlyphInfo, ATLAS_PADDING_PX};
pub use layout::{layout_line, measure_text_x_px, TriInstance};
