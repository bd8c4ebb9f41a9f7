/// FrameSync - semaphores and fence for one frame in flight
///
/// Two binary semaphores order the GPU (acquire -> render -> present) and a
/// fence orders the CPU against its own previous frame. The fence starts
/// signaled so the very first `wait_in_flight` returns immediately.
///
/// Present staleness (out of date / suboptimal) comes back as
/// `PresentOutcome::Stale`, never as an `Err`.

use ash::vk;
use std::sync::Arc;

use nova_text_engine::novatext::Result;
use nova_text_engine::{engine_bail, engine_err};

use crate::vulkan_context::GpuContext;
use crate::vulkan_frame_commands::FrameCommands;
use crate::vulkan_frame_flow::PresentOutcome;

pub struct FrameSync {
    context: Arc<GpuContext>,
    image_available: vk::Semaphore,
    render_finished: vk::Semaphore,
    in_flight_fence: vk::Fence,
}

impl FrameSync {
    /// Create empty sync objects; call `build` before the first frame
    pub fn new(context: Arc<GpuContext>) -> Self {
        Self {
            context,
            image_available: vk::Semaphore::null(),
            render_finished: vk::Semaphore::null(),
            in_flight_fence: vk::Fence::null(),
        }
    }

    /// (Re)create the semaphore pair and the signaled in-flight fence
    pub fn build(&mut self) -> Result<()> {
        self.destroy();

        unsafe {
            let device = &self.context.device;
            let semaphore_info = vk::SemaphoreCreateInfo::default();
            // Signaled so the first frame does not deadlock on the wait
            let fence_info =
                vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);

            self.image_available = device
                .create_semaphore(&semaphore_info, None)
                .map_err(|e| engine_err!("novatext::vulkan::sync", "Failed to create acquire semaphore: {:?}", e))?;

            match device.create_semaphore(&semaphore_info, None) {
                Ok(s) => self.render_finished = s,
                Err(e) => {
                    let err = engine_err!("novatext::vulkan::sync", "Failed to create render semaphore: {:?}", e);
                    self.destroy();
                    return Err(err);
                }
            }

            match device.create_fence(&fence_info, None) {
                Ok(f) => self.in_flight_fence = f,
                Err(e) => {
                    let err = engine_err!("novatext::vulkan::sync", "Failed to create in-flight fence: {:?}", e);
                    self.destroy();
                    return Err(err);
                }
            }
        }

        Ok(())
    }

    /// True when all three sync objects exist
    pub fn valid(&self) -> bool {
        self.image_available != vk::Semaphore::null()
            && self.render_finished != vk::Semaphore::null()
            && self.in_flight_fence != vk::Fence::null()
    }

    pub fn image_available(&self) -> vk::Semaphore {
        self.image_available
    }

    pub fn render_finished(&self) -> vk::Semaphore {
        self.render_finished
    }

    pub fn in_flight_fence(&self) -> vk::Fence {
        self.in_flight_fence
    }

    /// Block until the previous frame's submit has retired
    pub fn wait_in_flight(&self) -> Result<()> {
        unsafe {
            self.context
                .device
                .wait_for_fences(&[self.in_flight_fence], true, u64::MAX)
                .map_err(|e| engine_err!("novatext::vulkan::sync", "Failed to wait for in-flight fence: {:?}", e))
        }
    }

    /// Unsignal the in-flight fence before the next submit.
    ///
    /// Only call once this frame is certain to submit; resetting and then
    /// skipping the submit would deadlock the next wait.
    pub fn reset_in_flight(&self) -> Result<()> {
        unsafe {
            self.context
                .device
                .reset_fences(&[self.in_flight_fence])
                .map_err(|e| engine_err!("novatext::vulkan::sync", "Failed to reset in-flight fence: {:?}", e))
        }
    }

    /// Submit the command buffer for `image_index` on `queue`.
    ///
    /// Waits on the acquire semaphore at `wait_stage` (pass `None` for the
    /// color-attachment-output default), signals the render semaphore, and
    /// signals `fence` on completion (`None` uses the in-flight fence).
    pub fn submit_one(
        &self,
        queue: vk::Queue,
        image_index: u32,
        commands: &FrameCommands,
        wait_stage: Option<vk::PipelineStageFlags>,
        fence: Option<vk::Fence>,
    ) -> Result<()> {
        let buffer = match commands.buffer(image_index) {
            Some(b) => b,
            None => engine_bail!(
                "novatext::vulkan::sync",
                "No command buffer for image index {}",
                image_index
            ),
        };

        let wait_semaphores = [self.image_available];
        let wait_stages =
            [wait_stage.unwrap_or(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)];
        let buffers = [buffer];
        let signal_semaphores = [self.render_finished];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.context
                .device
                .queue_submit(queue, &[submit_info], fence.unwrap_or(self.in_flight_fence))
                .map_err(|e| engine_err!("novatext::vulkan::sync", "Failed to submit frame: {:?}", e))
        }
    }

    /// Present `image_index`, waiting on the render semaphore.
    ///
    /// A stale swapchain (out of date or suboptimal) is reported as
    /// `PresentOutcome::Stale`; only genuine device failures return `Err`.
    pub fn present_one(
        &self,
        present_queue: vk::Queue,
        swapchain_loader: &ash::khr::swapchain::Device,
        swapchain: vk::SwapchainKHR,
        image_index: u32,
    ) -> Result<PresentOutcome> {
        let wait_semaphores = [self.render_finished];
        let swapchains = [swapchain];
        let indices = [image_index];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&indices);

        unsafe {
            match swapchain_loader.queue_present(present_queue, &present_info) {
                Ok(false) => Ok(PresentOutcome::Presented),
                Ok(true) => Ok(PresentOutcome::Stale),
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentOutcome::Stale),
                Err(e) => Err(engine_err!(
                    "novatext::vulkan::sync",
                    "Failed to present frame: {:?}",
                    e
                )),
            }
        }
    }

    /// Destroy the sync objects. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        unsafe {
            let device = &self.context.device;
            if self.image_available != vk::Semaphore::null() {
                device.destroy_semaphore(self.image_available, None);
                self.image_available = vk::Semaphore::null();
            }
            if self.render_finished != vk::Semaphore::null() {
                device.destroy_semaphore(self.render_finished, None);
                self.render_finished = vk::Semaphore::null();
            }
            if self.in_flight_fence != vk::Fence::null() {
                device.destroy_fence(self.in_flight_fence, None);
                self.in_flight_fence = vk::Fence::null();
            }
        }
    }
}

impl Drop for FrameSync {
    fn drop(&mut self) {
        self.destroy();
    }
}
