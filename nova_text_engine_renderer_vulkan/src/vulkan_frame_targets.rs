/// FrameTargets - render pass plus one framebuffer per swapchain image
///
/// Owns the attachment description of a single-color-attachment pass and the
/// framebuffers binding each swapchain view to it. Rebuilt wholesale on
/// swapchain recreation: `build` tears down any previous pass/framebuffers
/// first, so calling it again after a resize is the expected path.

use ash::vk;
use std::sync::Arc;

use nova_text_engine::novatext::Result;
use nova_text_engine::{engine_debug, engine_err};

use crate::vulkan_context::GpuContext;

/// Render pass and framebuffers for a set of swapchain image views
pub struct FrameTargets {
    context: Arc<GpuContext>,
    render_pass: vk::RenderPass,
    framebuffers: Vec<vk::Framebuffer>,
    extent: vk::Extent2D,
}

/// Attachment behavior for `FrameTargets::build`.
///
/// The defaults describe the common present path: clear on load, store on
/// end, transition from UNDEFINED to PRESENT_SRC.
#[derive(Debug, Clone, Copy)]
pub struct TargetsDesc {
    pub load_op: vk::AttachmentLoadOp,
    pub store_op: vk::AttachmentStoreOp,
    pub initial_layout: vk::ImageLayout,
    pub final_layout: vk::ImageLayout,
}

impl Default for TargetsDesc {
    fn default() -> Self {
        Self {
            load_op: vk::AttachmentLoadOp::CLEAR,
            store_op: vk::AttachmentStoreOp::STORE,
            initial_layout: vk::ImageLayout::UNDEFINED,
            final_layout: vk::ImageLayout::PRESENT_SRC_KHR,
        }
    }
}

impl FrameTargets {
    /// Create empty targets; call `build` before recording
    pub fn new(context: Arc<GpuContext>) -> Self {
        Self {
            context,
            render_pass: vk::RenderPass::null(),
            framebuffers: Vec::new(),
            extent: vk::Extent2D::default(),
        }
    }

    /// (Re)create the render pass and one framebuffer per view.
    ///
    /// Any previously built pass and framebuffers are destroyed first. The
    /// caller must guarantee the GPU is no longer using them (wait on the
    /// in-flight fence or the device before rebuilding).
    pub fn build(
        &mut self,
        format: vk::Format,
        extent: vk::Extent2D,
        image_views: &[vk::ImageView],
        desc: TargetsDesc,
    ) -> Result<()> {
        self.destroy();

        unsafe {
            let device = &self.context.device;

            let attachment = vk::AttachmentDescription::default()
                .format(format)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(desc.load_op)
                .store_op(desc.store_op)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(desc.initial_layout)
                .final_layout(desc.final_layout);

            let color_ref = vk::AttachmentReference::default()
                .attachment(0)
                .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);

            let color_refs = [color_ref];
            let subpass = vk::SubpassDescription::default()
                .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                .color_attachments(&color_refs);

            // Make the pass wait for the acquire semaphore's stage
            let dependency = vk::SubpassDependency::default()
                .src_subpass(vk::SUBPASS_EXTERNAL)
                .dst_subpass(0)
                .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
                .src_access_mask(vk::AccessFlags::empty())
                .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
                .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE);

            let attachments = [attachment];
            let subpasses = [subpass];
            let dependencies = [dependency];
            let pass_info = vk::RenderPassCreateInfo::default()
                .attachments(&attachments)
                .subpasses(&subpasses)
                .dependencies(&dependencies);

            self.render_pass = device
                .create_render_pass(&pass_info, None)
                .map_err(|e| engine_err!("novatext::vulkan::targets", "Failed to create render pass: {:?}", e))?;

            self.framebuffers.reserve(image_views.len());
            let mut failure = None;
            for &view in image_views {
                let views = [view];
                let fb_info = vk::FramebufferCreateInfo::default()
                    .render_pass(self.render_pass)
                    .attachments(&views)
                    .width(extent.width)
                    .height(extent.height)
                    .layers(1);

                match device.create_framebuffer(&fb_info, None) {
                    Ok(framebuffer) => self.framebuffers.push(framebuffer),
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }

            // Keep self consistent: drop whatever was built so far
            if let Some(e) = failure {
                let err = engine_err!("novatext::vulkan::targets", "Failed to create framebuffer: {:?}", e);
                self.destroy();
                return Err(err);
            }

            self.extent = extent;
        }

        engine_debug!(
            "novatext::vulkan::targets",
            "Built frame targets: {} framebuffers, {}x{}",
            self.framebuffers.len(),
            extent.width,
            extent.height
        );
        Ok(())
    }

    /// True when a pass and at least one framebuffer exist
    pub fn valid(&self) -> bool {
        self.render_pass != vk::RenderPass::null() && !self.framebuffers.is_empty()
    }

    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass
    }

    pub fn framebuffer(&self, image_index: u32) -> Option<vk::Framebuffer> {
        self.framebuffers.get(image_index as usize).copied()
    }

    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Destroy the pass and framebuffers. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        unsafe {
            let device = &self.context.device;
            for framebuffer in self.framebuffers.drain(..) {
                device.destroy_framebuffer(framebuffer, None);
            }
            if self.render_pass != vk::RenderPass::null() {
                device.destroy_render_pass(self.render_pass, None);
                self.render_pass = vk::RenderPass::null();
            }
            self.extent = vk::Extent2D::default();
        }
    }
}

impl Drop for FrameTargets {
    fn drop(&mut self) {
        self.destroy();
    }
}
