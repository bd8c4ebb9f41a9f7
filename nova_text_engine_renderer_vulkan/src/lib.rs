/*!
# NovaText - Vulkan Renderer Backend

Vulkan implementation of the NovaText rendering engine.

This crate provides the GPU side of the text engine using the Ash library
for Vulkan bindings and gpu-allocator for memory management: a shared
`GpuContext`, a streaming `MemoryArena` for per-frame instance data, the
one-shot atlas upload path, the swapchain plus frame triad
(`FrameTargets` / `FrameCommands` / `FrameSync`) and the instanced
`TextPipeline` that `VulkanRenderer` composes into a frame loop.
*/

mod debug;
mod vulkan_arena;
mod vulkan_context;
mod vulkan_frame_commands;
mod vulkan_frame_flow;
mod vulkan_frame_sync;
mod vulkan_frame_targets;
mod vulkan_renderer;
mod vulkan_swapchain;
mod vulkan_text_pipeline;
mod vulkan_upload;

pub use vulkan_arena::{MemoryArena, UploadAllocation};
pub use vulkan_context::GpuContext;
pub use vulkan_frame_commands::FrameCommands;
pub use vulkan_frame_flow::{AcquireOutcome, FrameAction, FrameFlow, PresentOutcome};
pub use vulkan_frame_sync::FrameSync;
pub use vulkan_frame_targets::{FrameTargets, TargetsDesc};
pub use vulkan_renderer::{TextDraw, VulkanRenderer, CLEAR_COLOR};
pub use vulkan_swapchain::Swapchain;
pub use vulkan_text_pipeline::{TextPipeline, INSTANCE_STRIDE, TEXT_FRAG_GLSL, TEXT_VERT_GLSL};
pub use vulkan_upload::{upload_image, FontAtlasTexture};

// Re-export the wrapped crates an application needs alongside the renderer
pub use ash;
pub use ash::vk;
