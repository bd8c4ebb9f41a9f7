/// Swapchain - surface presentation images and their views
///
/// Owns the surface handed over by context creation, the swapchain itself
/// and one image view per swapchain image. Prefers an sRGB format and FIFO
/// presentation; recreation chains through `old_swapchain` after a resize.
///
/// Acquire staleness comes back as `AcquireOutcome::OutOfDate`, not an error.

use ash::vk;
use std::sync::Arc;

use nova_text_engine::novatext::{Error, Result};
use nova_text_engine::{engine_err, engine_info};

use crate::vulkan_context::GpuContext;
use crate::vulkan_frame_flow::AcquireOutcome;

pub struct Swapchain {
    context: Arc<GpuContext>,

    surface: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,
    swapchain_loader: ash::khr::swapchain::Device,

    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    format: vk::Format,
    extent: vk::Extent2D,
}

impl Swapchain {
    /// Create a swapchain for `surface`, taking ownership of its destruction.
    ///
    /// `width`/`height` are the framebuffer size hint used when the surface
    /// does not pin the extent itself.
    pub fn new(
        context: Arc<GpuContext>,
        surface: vk::SurfaceKHR,
        surface_loader: ash::khr::surface::Instance,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let swapchain_loader =
            ash::khr::swapchain::Device::new(&context.instance, &context.device);

        let mut this = Self {
            context,
            surface,
            surface_loader,
            swapchain_loader,
            swapchain: vk::SwapchainKHR::null(),
            images: Vec::new(),
            image_views: Vec::new(),
            format: vk::Format::UNDEFINED,
            extent: vk::Extent2D::default(),
        };
        this.create_swapchain(width, height, vk::SwapchainKHR::null())?;

        engine_info!(
            "novatext::vulkan::swapchain",
            "Created swapchain: {} images, {:?}, {}x{}",
            this.images.len(),
            this.format,
            this.extent.width,
            this.extent.height
        );
        Ok(this)
    }

    fn create_swapchain(
        &mut self,
        width: u32,
        height: u32,
        old_swapchain: vk::SwapchainKHR,
    ) -> Result<()> {
        unsafe {
            let capabilities = self
                .surface_loader
                .get_physical_device_surface_capabilities(
                    self.context.physical_device,
                    self.surface,
                )
                .map_err(|e| engine_err!("novatext::vulkan::swapchain", "Failed to query surface capabilities: {:?}", e))?;

            let formats = self
                .surface_loader
                .get_physical_device_surface_formats(self.context.physical_device, self.surface)
                .map_err(|e| engine_err!("novatext::vulkan::swapchain", "Failed to query surface formats: {:?}", e))?;

            if formats.is_empty() {
                return Err(Error::InitializationFailed(
                    "Surface reports no formats".to_string(),
                ));
            }

            // Prefer sRGB so the fixed-function blend works in linear space
            let surface_format = formats
                .iter()
                .find(|f| {
                    (f.format == vk::Format::B8G8R8A8_SRGB
                        || f.format == vk::Format::R8G8B8A8_SRGB)
                        && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
                })
                .copied()
                .unwrap_or(formats[0]);

            // FIFO is always available and caps the loop at vsync
            let present_mode = vk::PresentModeKHR::FIFO;

            let extent = if capabilities.current_extent.width != u32::MAX {
                capabilities.current_extent
            } else {
                vk::Extent2D {
                    width: width.clamp(
                        capabilities.min_image_extent.width,
                        capabilities.max_image_extent.width,
                    ),
                    height: height.clamp(
                        capabilities.min_image_extent.height,
                        capabilities.max_image_extent.height,
                    ),
                }
            };

            let mut image_count = capabilities.min_image_count + 1;
            if capabilities.max_image_count > 0 && image_count > capabilities.max_image_count {
                image_count = capabilities.max_image_count;
            }

            let graphics_family = self.context.graphics_queue_family;
            let present_family = self.context.present_queue_family;
            let family_indices = [graphics_family, present_family];

            let mut create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(self.surface)
                .min_image_count(image_count)
                .image_format(surface_format.format)
                .image_color_space(surface_format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
                .pre_transform(capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(present_mode)
                .clipped(true)
                .old_swapchain(old_swapchain);

            create_info = if graphics_family != present_family {
                create_info
                    .image_sharing_mode(vk::SharingMode::CONCURRENT)
                    .queue_family_indices(&family_indices)
            } else {
                create_info.image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            };

            let swapchain = self
                .swapchain_loader
                .create_swapchain(&create_info, None)
                .map_err(|e| engine_err!("novatext::vulkan::swapchain", "Failed to create swapchain: {:?}", e))?;

            self.swapchain = swapchain;
            self.format = surface_format.format;
            self.extent = extent;

            self.images = self
                .swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(|e| engine_err!("novatext::vulkan::swapchain", "Failed to get swapchain images: {:?}", e))?;

            let mut failure = None;
            for &image in &self.images {
                let view_info = vk::ImageViewCreateInfo::default()
                    .image(image)
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .format(surface_format.format)
                    .components(vk::ComponentMapping::default())
                    .subresource_range(vk::ImageSubresourceRange {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        base_mip_level: 0,
                        level_count: 1,
                        base_array_layer: 0,
                        layer_count: 1,
                    });

                match self.context.device.create_image_view(&view_info, None) {
                    Ok(view) => self.image_views.push(view),
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }

            if let Some(e) = failure {
                let err = engine_err!("novatext::vulkan::swapchain", "Failed to create swapchain view: {:?}", e);
                self.destroy_views_and_swapchain();
                return Err(err);
            }

            Ok(())
        }
    }

    /// Acquire the next image, signaling `semaphore` when it is ready.
    ///
    /// Out-of-date swapchains are control flow (`AcquireOutcome::OutOfDate`);
    /// other failures are errors.
    pub fn acquire(&self, semaphore: vk::Semaphore) -> Result<AcquireOutcome> {
        unsafe {
            match self.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                semaphore,
                vk::Fence::null(),
            ) {
                Ok((index, suboptimal)) => Ok(AcquireOutcome::Acquired { index, suboptimal }),
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireOutcome::OutOfDate),
                Err(e) => Err(engine_err!(
                    "novatext::vulkan::swapchain",
                    "Failed to acquire swapchain image: {:?}",
                    e
                )),
            }
        }
    }

    /// Recreate the swapchain at the new framebuffer size.
    ///
    /// Waits for the device to go idle, destroys the old views, and chains
    /// the new swapchain through `old_swapchain`.
    pub fn recreate(&mut self, width: u32, height: u32) -> Result<()> {
        self.context.wait_idle();

        unsafe {
            for view in self.image_views.drain(..) {
                self.context.device.destroy_image_view(view, None);
            }
        }
        self.images.clear();

        let old = self.swapchain;
        self.swapchain = vk::SwapchainKHR::null();
        let result = self.create_swapchain(width, height, old);

        // The old handle is retired either way (the device is idle); release
        // it even when creation failed partway
        if old != vk::SwapchainKHR::null() {
            unsafe {
                self.swapchain_loader.destroy_swapchain(old, None);
            }
        }
        result?;

        engine_info!(
            "novatext::vulkan::swapchain",
            "Recreated swapchain: {}x{}",
            self.extent.width,
            self.extent.height
        );
        Ok(())
    }

    // --- Accessors ---

    pub fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    pub fn loader(&self) -> &ash::khr::swapchain::Device {
        &self.swapchain_loader
    }

    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }

    pub fn image_count(&self) -> u32 {
        self.images.len() as u32
    }

    pub fn format(&self) -> vk::Format {
        self.format
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    fn destroy_views_and_swapchain(&mut self) {
        unsafe {
            for view in self.image_views.drain(..) {
                self.context.device.destroy_image_view(view, None);
            }
            self.images.clear();
            if self.swapchain != vk::SwapchainKHR::null() {
                self.swapchain_loader.destroy_swapchain(self.swapchain, None);
                self.swapchain = vk::SwapchainKHR::null();
            }
        }
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        self.destroy_views_and_swapchain();
        unsafe {
            if self.surface != vk::SurfaceKHR::null() {
                self.surface_loader.destroy_surface(self.surface, None);
                self.surface = vk::SurfaceKHR::null();
            }
        }
    }
}
