//! Small self-contained utilities

mod bump_layout;

pub use bump_layout::{align_down, align_up, BumpLayout, BumpSlice};
