/// VulkanRenderer - frame loop over the context, swapchain and frame triad
///
/// Wires the pieces together for the common case: clear the screen, draw
/// text lines, present. One frame in flight; the per-frame instance data
/// streams through a host-visible arena that is rewound after the in-flight
/// fence signals.
///
/// Swapchain staleness never surfaces as an error from `render_frame`; the
/// renderer rebuilds its swapchain-dependent objects and drops the frame.

use ash::vk;
use std::sync::Arc;

use nova_text_engine::glam::Vec2;
use nova_text_engine::novatext::text::{layout_line, FontAtlas, TriInstance};
use nova_text_engine::novatext::{RendererConfig, Result};
use nova_text_engine::{engine_bail, engine_err, engine_info};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::vulkan_arena::MemoryArena;
use crate::vulkan_context::GpuContext;
use crate::vulkan_frame_commands::FrameCommands;
use crate::vulkan_frame_flow::{FrameAction, FrameFlow};
use crate::vulkan_frame_sync::FrameSync;
use crate::vulkan_frame_targets::{FrameTargets, TargetsDesc};
use crate::vulkan_swapchain::Swapchain;
use crate::vulkan_text_pipeline::TextPipeline;
use crate::vulkan_upload::{upload_image, FontAtlasTexture};

/// Default clear color behind the text
pub const CLEAR_COLOR: [f32; 4] = [0.06, 0.06, 0.09, 1.0];

/// One line of text to draw this frame
#[derive(Debug, Clone, Copy)]
pub struct TextDraw<'a> {
    pub text: &'a str,
    /// Baseline origin in window pixels, top-left origin
    pub origin_px: Vec2,
    /// RGBA, non-premultiplied
    pub color: [f32; 4],
}

pub struct VulkanRenderer {
    // Field order doubles as drop order; context must go last
    pipeline: Option<TextPipeline>,
    atlas_texture: Option<FontAtlasTexture>,
    atlas: Option<FontAtlas>,
    arena: MemoryArena,
    sync: FrameSync,
    commands: FrameCommands,
    targets: FrameTargets,
    swapchain: Swapchain,
    flow: FrameFlow,
    window_size: (u32, u32),
    context: Arc<GpuContext>,
}

impl VulkanRenderer {
    /// Bring up the full stack against `window`.
    ///
    /// Text drawing needs a later `set_text_atlas` call; until then
    /// `render_frame` just clears and presents.
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(
        window: &W,
        width: u32,
        height: u32,
        config: &RendererConfig,
    ) -> Result<Self> {
        let (context, surface, surface_loader) = GpuContext::new(window, config)?;

        let swapchain = Swapchain::new(
            Arc::clone(&context),
            surface,
            surface_loader,
            width,
            height,
        )?;

        let mut targets = FrameTargets::new(Arc::clone(&context));
        targets.build(
            swapchain.format(),
            swapchain.extent(),
            swapchain.image_views(),
            TargetsDesc::default(),
        )?;

        let mut commands = FrameCommands::new(Arc::clone(&context));
        commands.build(
            context.graphics_queue_family,
            swapchain.image_count(),
            vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
            vk::CommandBufferLevel::PRIMARY,
        )?;

        let mut sync = FrameSync::new(Arc::clone(&context));
        sync.build()?;

        let arena = MemoryArena::new(
            Arc::clone(&context),
            config.arena_capacity,
            vk::BufferUsageFlags::VERTEX_BUFFER,
            config.prefer_coherent,
        )?;

        engine_info!("novatext::vulkan::renderer", "Renderer ready ({}x{})", width, height);

        Ok(Self {
            pipeline: None,
            atlas_texture: None,
            atlas: None,
            arena,
            sync,
            commands,
            targets,
            swapchain,
            flow: FrameFlow::new(),
            window_size: (width, height),
            context,
        })
    }

    /// Upload `atlas` to the GPU and build the text pipeline.
    ///
    /// Replaces any previous atlas/pipeline pair; the device is drained
    /// first so the old atlas is safe to destroy.
    pub fn set_text_atlas(
        &mut self,
        atlas: FontAtlas,
        vert_spirv: &[u8],
        frag_spirv: &[u8],
        filter: vk::Filter,
    ) -> Result<()> {
        self.context.wait_idle();
        self.pipeline = None;
        self.atlas_texture = None;

        let texture = upload_image(
            Arc::clone(&self.context),
            vk::Format::R8_UNORM,
            atlas.width,
            atlas.height,
            &atlas.pixels,
        )?;

        let pipeline = TextPipeline::new(
            Arc::clone(&self.context),
            self.targets.render_pass(),
            &texture,
            vert_spirv,
            frag_spirv,
            filter,
        )?;

        self.atlas_texture = Some(texture);
        self.pipeline = Some(pipeline);
        self.atlas = Some(atlas);
        Ok(())
    }

    /// Note a window resize; the swapchain is rebuilt on the next frame
    /// that observes staleness.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
    }

    pub fn context(&self) -> &Arc<GpuContext> {
        &self.context
    }

    pub fn frames_presented(&self) -> u64 {
        self.flow.frames_presented()
    }

    /// Record, submit and present one frame of text.
    ///
    /// Returns `Ok(())` even when the frame is dropped for a swapchain
    /// rebuild; callers just keep looping.
    pub fn render_frame(&mut self, draws: &[TextDraw]) -> Result<()> {
        self.sync.wait_in_flight()?;

        let image_index = match self.flow.on_acquire(self.swapchain.acquire(self.sync.image_available())?) {
            FrameAction::Record(index) => index,
            FrameAction::Rebuild => {
                self.rebuild()?;
                return Ok(());
            }
        };

        // The fence wait above retired the previous frame's arena contents
        self.arena.reset();
        let instances = self.layout_draws(draws);
        let needed: u64 = instances
            .iter()
            .map(|(tris, _)| std::mem::size_of_val(tris.as_slice()) as u64)
            .sum();
        if needed > self.arena.capacity() {
            // Growth replaces the backing buffer; safe here, nothing in flight
            self.arena.grow_if_needed(needed.next_power_of_two())?;
        }

        self.record(image_index, &instances)?;

        // Fence is only reset now that this frame is certain to submit; a
        // recording failure above leaves it signaled for the next wait
        self.sync.reset_in_flight()?;

        self.sync.submit_one(
            self.context.graphics_queue,
            image_index,
            &self.commands,
            None,
            None,
        )?;

        let outcome = self.sync.present_one(
            self.context.present_queue,
            self.swapchain.loader(),
            self.swapchain.handle(),
            image_index,
        )?;

        if self.flow.on_present(outcome) {
            self.rebuild()?;
        }
        Ok(())
    }

    /// Lay out each draw into triangle instances in clip space
    fn layout_draws(&self, draws: &[TextDraw]) -> Vec<(Vec<TriInstance>, [f32; 4])> {
        let atlas = match &self.atlas {
            Some(a) => a,
            None => return Vec::new(),
        };

        let extent = self.swapchain.extent();
        let sx = 2.0 / extent.width.max(1) as f32;
        let sy = -2.0 / extent.height.max(1) as f32;

        draws
            .iter()
            .map(|draw| {
                let origin = Vec2::new(
                    -1.0 + draw.origin_px.x * sx,
                    1.0 + draw.origin_px.y * sy,
                );
                let tris = layout_line(atlas, draw.text, origin, Vec2::new(sx, sy));
                (tris, draw.color)
            })
            .collect()
    }

    fn record(
        &mut self,
        image_index: u32,
        instances: &[(Vec<TriInstance>, [f32; 4])],
    ) -> Result<()> {
        let cb = match self.commands.buffer(image_index) {
            Some(cb) => cb,
            None => engine_bail!(
                "novatext::vulkan::renderer",
                "No command buffer for image {}",
                image_index
            ),
        };
        let framebuffer = match self.targets.framebuffer(image_index) {
            Some(fb) => fb,
            None => engine_bail!(
                "novatext::vulkan::renderer",
                "No framebuffer for image {}",
                image_index
            ),
        };

        let extent = self.targets.extent();

        unsafe {
            let device = &self.context.device;

            device
                .reset_command_buffer(cb, vk::CommandBufferResetFlags::empty())
                .map_err(|e| engine_err!("novatext::vulkan::renderer", "Failed to reset command buffer: {:?}", e))?;

            let begin_info = vk::CommandBufferBeginInfo::default();
            device
                .begin_command_buffer(cb, &begin_info)
                .map_err(|e| engine_err!("novatext::vulkan::renderer", "Failed to begin command buffer: {:?}", e))?;

            let clear_values = [vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: CLEAR_COLOR,
                },
            }];
            let pass_begin = vk::RenderPassBeginInfo::default()
                .render_pass(self.targets.render_pass())
                .framebuffer(framebuffer)
                .render_area(vk::Rect2D::default().extent(extent))
                .clear_values(&clear_values);

            device.cmd_begin_render_pass(cb, &pass_begin, vk::SubpassContents::INLINE);

            if let Some(pipeline) = &self.pipeline {
                for (tris, color) in instances {
                    if tris.is_empty() {
                        continue;
                    }
                    let bytes: &[u8] = bytemuck::cast_slice(tris.as_slice());
                    let allocation = self.arena.allocate_and_write(bytes, 4)?;
                    pipeline.record_draw(
                        cb,
                        extent,
                        allocation.buffer,
                        allocation.offset,
                        tris.len() as u32,
                        *color,
                    );
                }
            }

            device.cmd_end_render_pass(cb);
            device
                .end_command_buffer(cb)
                .map_err(|e| engine_err!("novatext::vulkan::renderer", "Failed to end command buffer: {:?}", e))?;
        }

        Ok(())
    }

    /// Rebuild everything that depends on the swapchain
    fn rebuild(&mut self) -> Result<()> {
        self.context.wait_idle();

        let (width, height) = self.window_size;
        self.swapchain.recreate(width, height)?;
        self.targets.build(
            self.swapchain.format(),
            self.swapchain.extent(),
            self.swapchain.image_views(),
            TargetsDesc::default(),
        )?;
        self.commands.build(
            self.context.graphics_queue_family,
            self.swapchain.image_count(),
            vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
            vk::CommandBufferLevel::PRIMARY,
        )?;
        self.sync.build()?;
        Ok(())
    }
}

impl Drop for VulkanRenderer {
    fn drop(&mut self) {
        // Components destroy their own handles; just drain the GPU first
        self.context.wait_idle();
    }
}
