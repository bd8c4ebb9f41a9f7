/// UploadTransfer - one-shot CPU to GPU image upload
///
/// Materializes an immutable sampled image (the glyph atlas) from a CPU pixel
/// buffer: device-local image + view, staging buffer, one-time command buffer
/// with the two layout transitions, blocking submit on a dedicated fence.
/// Intentionally not pipelined; this runs once at startup.
///
/// Every transient resource lives in a guard that releases it on drop, so
/// failure at any step leaves nothing bound. The destination image itself is
/// held in the same guarded form until the upload has fully succeeded.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

use nova_text_engine::novatext::{Error, Result};
use nova_text_engine::{engine_err, engine_info};

use crate::vulkan_context::GpuContext;

/// An immutable sampled GPU image produced by `upload_image`
pub struct FontAtlasTexture {
    context: Arc<GpuContext>,

    pub image: vk::Image,
    pub view: vk::ImageView,
    pub format: vk::Format,
    pub width: u32,
    pub height: u32,

    allocation: Option<Allocation>,
}

impl Drop for FontAtlasTexture {
    fn drop(&mut self) {
        unsafe {
            let device = &self.context.device;
            if self.view != vk::ImageView::null() {
                device.destroy_image_view(self.view, None);
                self.view = vk::ImageView::null();
            }
            if self.image != vk::Image::null() {
                device.destroy_image(self.image, None);
                self.image = vk::Image::null();
            }
            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.context.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }
        }
    }
}

/// Staging buffer guard: buffer + CpuToGpu allocation, freed on drop
struct StagingBuffer {
    context: Arc<GpuContext>,
    buffer: vk::Buffer,
    allocation: Option<Allocation>,
}

impl StagingBuffer {
    fn new(context: Arc<GpuContext>, data: &[u8]) -> Result<Self> {
        unsafe {
            let device = &context.device;
            let buffer_info = vk::BufferCreateInfo::default()
                .size(data.len() as u64)
                .usage(vk::BufferUsageFlags::TRANSFER_SRC)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = device
                .create_buffer(&buffer_info, None)
                .map_err(|e| engine_err!("novatext::vulkan::upload", "Failed to create staging buffer: {:?}", e))?;

            let requirements = device.get_buffer_memory_requirements(buffer);
            let allocation = context
                .allocator
                .lock()
                .map_err(|_| engine_err!("novatext::vulkan::upload", "Allocator lock poisoned"))?
                .allocate(&AllocationCreateDesc {
                    name: "atlas_staging_buffer",
                    requirements,
                    location: MemoryLocation::CpuToGpu,
                    linear: true,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|_e| {
                    device.destroy_buffer(buffer, None);
                    Error::OutOfMemory
                })?;

            // From here on the guard owns both handles; early returns clean up
            let guard = Self {
                context: Arc::clone(&context),
                buffer,
                allocation: Some(allocation),
            };

            let allocation = guard
                .allocation
                .as_ref()
                .ok_or_else(|| engine_err!("novatext::vulkan::upload", "Staging allocation missing"))?;
            guard
                .context
                .device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
                .map_err(|e| engine_err!("novatext::vulkan::upload", "Failed to bind staging memory: {:?}", e))?;

            let mapped_ptr = allocation
                .mapped_ptr()
                .ok_or_else(|| engine_err!("novatext::vulkan::upload", "Staging buffer is not mapped"))?
                .as_ptr() as *mut u8;
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped_ptr, data.len());
            // CpuToGpu allocations are host-coherent; no flush needed
            Ok(guard)
        }
    }
}

impl Drop for StagingBuffer {
    fn drop(&mut self) {
        unsafe {
            if self.buffer != vk::Buffer::null() {
                self.context.device.destroy_buffer(self.buffer, None);
            }
            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.context.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }
        }
    }
}

/// Transient command pool + one-time command buffer + fence, destroyed on drop
struct TransientCommands {
    context: Arc<GpuContext>,
    pool: vk::CommandPool,
    buffer: vk::CommandBuffer,
    fence: vk::Fence,
}

impl TransientCommands {
    fn new(context: Arc<GpuContext>) -> Result<Self> {
        unsafe {
            let device = &context.device;
            let pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(context.graphics_queue_family)
                .flags(
                    vk::CommandPoolCreateFlags::TRANSIENT
                        | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
                );

            let pool = device
                .create_command_pool(&pool_info, None)
                .map_err(|e| engine_err!("novatext::vulkan::upload", "Failed to create transient pool: {:?}", e))?;

            let alloc_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let buffer = match device.allocate_command_buffers(&alloc_info) {
                Ok(buffers) => buffers[0],
                Err(e) => {
                    device.destroy_command_pool(pool, None);
                    return Err(engine_err!("novatext::vulkan::upload", "Failed to allocate upload command buffer: {:?}", e));
                }
            };

            let fence = match device.create_fence(&vk::FenceCreateInfo::default(), None) {
                Ok(f) => f,
                Err(e) => {
                    device.destroy_command_pool(pool, None);
                    return Err(engine_err!("novatext::vulkan::upload", "Failed to create upload fence: {:?}", e));
                }
            };

            Ok(Self {
                context,
                pool,
                buffer,
                fence,
            })
        }
    }

    /// Submit the recorded buffer and block until the fence signals
    fn submit_and_wait(&self) -> Result<()> {
        unsafe {
            let device = &self.context.device;
            let buffers = [self.buffer];
            let submit_info = vk::SubmitInfo::default().command_buffers(&buffers);

            device
                .queue_submit(self.context.graphics_queue, &[submit_info], self.fence)
                .map_err(|e| engine_err!("novatext::vulkan::upload", "Failed to submit upload: {:?}", e))?;
            device
                .wait_for_fences(&[self.fence], true, u64::MAX)
                .map_err(|e| engine_err!("novatext::vulkan::upload", "Failed to wait for upload fence: {:?}", e))?;
            Ok(())
        }
    }
}

impl Drop for TransientCommands {
    fn drop(&mut self) {
        unsafe {
            let device = &self.context.device;
            device.destroy_fence(self.fence, None);
            device.destroy_command_pool(self.pool, None);
        }
    }
}

/// Bytes per texel for the formats the atlas upload accepts
fn bytes_per_texel(format: vk::Format) -> Option<u64> {
    match format {
        vk::Format::R8_UNORM | vk::Format::R8_SRGB => Some(1),
        vk::Format::R8G8_UNORM => Some(2),
        vk::Format::R8G8B8A8_UNORM | vk::Format::R8G8B8A8_SRGB => Some(4),
        _ => None,
    }
}

/// Upload a CPU pixel buffer into a new device-local sampled image.
///
/// The image is left in SHADER_READ_ONLY_OPTIMAL; the call returns only
/// after the GPU copy has completed (blocking fence wait). Layout
/// transitions use synchronization2 when the context supports it, classic
/// pipeline barriers otherwise.
///
/// # Errors
///
/// * `InitializationFailed` - empty or zero-sized pixel source (checked
///   before any GPU allocation)
/// * `InvalidResource` - payload size does not match `width * height` texels
///   of `format`, or the format is not supported for atlas upload
/// * `OutOfMemory` - no suitable memory for the image or staging buffer
pub fn upload_image(
    context: Arc<GpuContext>,
    format: vk::Format,
    width: u32,
    height: u32,
    pixels: &[u8],
) -> Result<FontAtlasTexture> {
    if width == 0 || height == 0 || pixels.is_empty() {
        return Err(Error::InitializationFailed(
            "Atlas pixel source is empty or zero-sized".to_string(),
        ));
    }

    let texel_size = bytes_per_texel(format).ok_or_else(|| {
        Error::InvalidResource(format!("Unsupported atlas format: {:?}", format))
    })?;
    let expected = u64::from(width) * u64::from(height) * texel_size;
    if pixels.len() as u64 != expected {
        return Err(Error::InvalidResource(format!(
            "Atlas payload is {} bytes, expected {} for {}x{} {:?}",
            pixels.len(),
            expected,
            width,
            height,
            format
        )));
    }

    unsafe {
        let device = &context.device;

        // --- destination image + view (guarded: dropped on any later failure) ---
        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D {
                width,
                height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = device
            .create_image(&image_info, None)
            .map_err(|e| engine_err!("novatext::vulkan::upload", "Failed to create atlas image: {:?}", e))?;

        let mut texture = FontAtlasTexture {
            context: Arc::clone(&context),
            image,
            view: vk::ImageView::null(),
            format,
            width,
            height,
            allocation: None,
        };

        let requirements = device.get_image_memory_requirements(image);
        let allocation = context
            .allocator
            .lock()
            .map_err(|_| engine_err!("novatext::vulkan::upload", "Allocator lock poisoned"))?
            .allocate(&AllocationCreateDesc {
                name: "font_atlas",
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|_e| Error::OutOfMemory)?;

        // The texture guard owns the allocation before the fallible bind,
        // so an error frees it along with the image
        texture.allocation = Some(allocation);
        {
            let allocation = texture
                .allocation
                .as_ref()
                .ok_or_else(|| engine_err!("novatext::vulkan::upload", "Atlas allocation missing"))?;
            device
                .bind_image_memory(image, allocation.memory(), allocation.offset())
                .map_err(|e| engine_err!("novatext::vulkan::upload", "Failed to bind atlas image memory: {:?}", e))?;
        }

        let view_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            })
            .subresource_range(color_subresource_range());

        texture.view = device
            .create_image_view(&view_info, None)
            .map_err(|e| engine_err!("novatext::vulkan::upload", "Failed to create atlas view: {:?}", e))?;

        // --- staging + transient commands ---
        let staging = StagingBuffer::new(Arc::clone(&context), pixels)?;
        let commands = TransientCommands::new(Arc::clone(&context))?;

        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        device
            .begin_command_buffer(commands.buffer, &begin_info)
            .map_err(|e| engine_err!("novatext::vulkan::upload", "Failed to begin upload command buffer: {:?}", e))?;

        // UNDEFINED -> TRANSFER_DST
        record_transition(
            &context,
            commands.buffer,
            image,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        );

        let region = vk::BufferImageCopy::default()
            .buffer_offset(0)
            .buffer_row_length(0)
            .buffer_image_height(0)
            .image_subresource(vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            })
            .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
            .image_extent(vk::Extent3D {
                width,
                height,
                depth: 1,
            });

        device.cmd_copy_buffer_to_image(
            commands.buffer,
            staging.buffer,
            image,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            &[region],
        );

        // TRANSFER_DST -> SHADER_READ_ONLY
        record_transition(
            &context,
            commands.buffer,
            image,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        );

        device
            .end_command_buffer(commands.buffer)
            .map_err(|e| engine_err!("novatext::vulkan::upload", "Failed to end upload command buffer: {:?}", e))?;

        commands.submit_and_wait()?;
        // staging + commands guards release their resources here

        engine_info!(
            "novatext::vulkan::upload",
            "Uploaded {}x{} atlas ({} bytes, {:?})",
            width,
            height,
            pixels.len(),
            format
        );

        Ok(texture)
    }
}

fn color_subresource_range() -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask: vk::ImageAspectFlags::COLOR,
        base_mip_level: 0,
        level_count: 1,
        base_array_layer: 0,
        layer_count: 1,
    }
}

/// Record the upload layout transition, sync2 when available.
///
/// Only the two transitions the upload needs are supported:
/// UNDEFINED -> TRANSFER_DST and TRANSFER_DST -> SHADER_READ_ONLY.
fn record_transition(
    context: &GpuContext,
    cb: vk::CommandBuffer,
    image: vk::Image,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
) {
    let to_shader_read = old_layout == vk::ImageLayout::TRANSFER_DST_OPTIMAL
        && new_layout == vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL;

    unsafe {
        if context.supports_sync2 {
            let staged = if to_shader_read {
                vk::ImageMemoryBarrier2::default()
                    .src_stage_mask(vk::PipelineStageFlags2::TRANSFER)
                    .src_access_mask(vk::AccessFlags2::TRANSFER_WRITE)
                    .dst_stage_mask(vk::PipelineStageFlags2::FRAGMENT_SHADER)
                    .dst_access_mask(vk::AccessFlags2::SHADER_SAMPLED_READ)
            } else {
                vk::ImageMemoryBarrier2::default()
                    .src_stage_mask(vk::PipelineStageFlags2::TOP_OF_PIPE)
                    .src_access_mask(vk::AccessFlags2::empty())
                    .dst_stage_mask(vk::PipelineStageFlags2::TRANSFER)
                    .dst_access_mask(vk::AccessFlags2::TRANSFER_WRITE)
            };
            let barrier = staged
                .old_layout(old_layout)
                .new_layout(new_layout)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(image)
                .subresource_range(color_subresource_range());

            let barriers = [barrier];
            let dependency = vk::DependencyInfo::default().image_memory_barriers(&barriers);
            context.device.cmd_pipeline_barrier2(cb, &dependency);
        } else {
            let (src_stage, dst_stage, src_access, dst_access) = if to_shader_read {
                (
                    vk::PipelineStageFlags::TRANSFER,
                    vk::PipelineStageFlags::FRAGMENT_SHADER,
                    vk::AccessFlags::TRANSFER_WRITE,
                    vk::AccessFlags::SHADER_READ,
                )
            } else {
                (
                    vk::PipelineStageFlags::TOP_OF_PIPE,
                    vk::PipelineStageFlags::TRANSFER,
                    vk::AccessFlags::empty(),
                    vk::AccessFlags::TRANSFER_WRITE,
                )
            };

            let barrier = vk::ImageMemoryBarrier::default()
                .old_layout(old_layout)
                .new_layout(new_layout)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(image)
                .subresource_range(color_subresource_range())
                .src_access_mask(src_access)
                .dst_access_mask(dst_access);

            context.device.cmd_pipeline_barrier(
                cb,
                src_stage,
                dst_stage,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[barrier],
            );
        }
    }
}
