/// FrameCommands - command pool and per-image command buffers
///
/// One resettable pool on the graphics family, with the frame's command
/// buffers batch-allocated from it. Buffers are indexed by swapchain image
/// index; with RESET_COMMAND_BUFFER set, each is reset and re-recorded
/// individually every frame.

use ash::vk;
use std::sync::Arc;

use nova_text_engine::novatext::Result;
use nova_text_engine::{engine_debug, engine_err};

use crate::vulkan_context::GpuContext;

pub struct FrameCommands {
    context: Arc<GpuContext>,
    pool: vk::CommandPool,
    buffers: Vec<vk::CommandBuffer>,
}

impl FrameCommands {
    /// Create empty commands; call `build` before recording
    pub fn new(context: Arc<GpuContext>) -> Self {
        Self {
            context,
            pool: vk::CommandPool::null(),
            buffers: Vec::new(),
        }
    }

    /// (Re)create the pool on `queue_family` and allocate `count` command
    /// buffers.
    ///
    /// Tears down any previous pool first; the caller must ensure the GPU
    /// is done with the old buffers before rebuilding.
    pub fn build(
        &mut self,
        queue_family: u32,
        count: u32,
        pool_flags: vk::CommandPoolCreateFlags,
        level: vk::CommandBufferLevel,
    ) -> Result<()> {
        self.destroy();

        unsafe {
            let device = &self.context.device;

            let pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(queue_family)
                .flags(pool_flags);

            self.pool = device
                .create_command_pool(&pool_info, None)
                .map_err(|e| engine_err!("novatext::vulkan::commands", "Failed to create command pool: {:?}", e))?;

            let alloc_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(self.pool)
                .level(level)
                .command_buffer_count(count);

            match device.allocate_command_buffers(&alloc_info) {
                Ok(buffers) => self.buffers = buffers,
                Err(e) => {
                    let err = engine_err!("novatext::vulkan::commands", "Failed to allocate command buffers: {:?}", e);
                    self.destroy();
                    return Err(err);
                }
            }
        }

        engine_debug!(
            "novatext::vulkan::commands",
            "Built frame commands: {} buffers",
            count
        );
        Ok(())
    }

    /// True when the pool and at least one buffer exist
    pub fn valid(&self) -> bool {
        self.pool != vk::CommandPool::null() && !self.buffers.is_empty()
    }

    pub fn buffer(&self, image_index: u32) -> Option<vk::CommandBuffer> {
        self.buffers.get(image_index as usize).copied()
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Free the buffers and destroy the pool. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        unsafe {
            let device = &self.context.device;
            if self.pool != vk::CommandPool::null() {
                // Buffers must be released before their pool goes away
                if !self.buffers.is_empty() {
                    device.free_command_buffers(self.pool, &self.buffers);
                }
                device.destroy_command_pool(self.pool, None);
                self.pool = vk::CommandPool::null();
            }
            self.buffers.clear();
        }
    }
}

impl Drop for FrameCommands {
    fn drop(&mut self) {
        self.destroy();
    }
}
