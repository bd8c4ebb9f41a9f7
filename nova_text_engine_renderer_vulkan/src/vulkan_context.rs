/// GpuContext - Shared GPU resources for all Vulkan objects
///
/// Contains everything needed for GPU operations:
/// - Entry/instance/device for Vulkan API calls
/// - Allocator for device-local and staging memory
/// - Graphics and present queues
/// - Cached device limits (memory properties, flush atom, sync2 support)
///
/// Components hold this via `Arc<GpuContext>`; there are no hidden statics,
/// so multiple independent contexts can coexist in one process.

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};

use nova_text_engine::novatext::{DebugSeverity, Error, RendererConfig, Result};
use nova_text_engine::{engine_error, engine_info};

/// Shared GPU context for all Vulkan resources.
///
/// This struct is shared (via `Arc`) by the arena, upload path, frame triad
/// and pipeline to avoid duplicating device/allocator/queue references in
/// each component. The last `Arc` owner's drop waits for the device to go
/// idle and destroys allocator, debug messenger, device and instance in
/// dependency order.
pub struct GpuContext {
    /// Vulkan entry point (must outlive instance)
    _entry: ash::Entry,

    /// Vulkan instance
    pub instance: ash::Instance,

    /// Physical device
    pub physical_device: vk::PhysicalDevice,

    /// Vulkan logical device
    pub device: ash::Device,

    /// GPU memory allocator (shared, requires mutex for thread safety)
    /// Wrapped in ManuallyDrop to ensure it's dropped BEFORE the device is destroyed
    pub allocator: ManuallyDrop<Arc<Mutex<Allocator>>>,

    /// Graphics queue for command submission
    pub graphics_queue: vk::Queue,
    pub graphics_queue_family: u32,

    /// Present queue (may be the same as graphics)
    pub present_queue: vk::Queue,
    pub present_queue_family: u32,

    /// Cached physical device memory properties (for manual memory-type picks)
    memory_properties: vk::PhysicalDeviceMemoryProperties,

    /// nonCoherentAtomSize device limit (minimum flush granularity)
    pub non_coherent_atom_size: u64,

    /// Whether synchronization2 barriers are available.
    ///
    /// Probed once at creation (device API version 1.3+); the upload path
    /// selects its barrier form from this flag instead of re-probing.
    pub supports_sync2: bool,

    /// Debug utils loader (for validation layers)
    debug_utils_loader: Option<ash::ext::debug_utils::Instance>,

    /// Debug messenger handle
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl GpuContext {
    /// Create a GPU context plus the window surface the swapchain will use.
    ///
    /// Brings up entry, instance, optional debug messenger, surface,
    /// physical device, queues, logical device and allocator. The surface
    /// and its loader are returned separately because the swapchain owns
    /// their destruction.
    ///
    /// # Arguments
    ///
    /// * `window` - Window for surface creation
    /// * `config` - Renderer configuration
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(
        window: &W,
        config: &RendererConfig,
    ) -> Result<(Arc<Self>, vk::SurfaceKHR, ash::khr::surface::Instance)> {
        unsafe {
            let entry = ash::Entry::load().map_err(|e| {
                engine_error!("novatext::vulkan", "Failed to load Vulkan library: {:?}", e);
                Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
            })?;

            let app_name = std::ffi::CString::new(config.app_name.as_str())
                .unwrap_or_else(|_| std::ffi::CString::new("NovaText Application").unwrap());
            let (maj, min, pat) = config.app_version;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, maj, min, pat))
                .engine_name(c"NovaText")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            let display_handle = window.display_handle().map_err(|e| {
                engine_error!("novatext::vulkan", "Failed to get display handle: {}", e);
                Error::InitializationFailed(format!("Failed to get display handle: {}", e))
            })?;
            let mut extension_names =
                ash_window::enumerate_required_extensions(display_handle.as_raw())
                    .map_err(|e| {
                        engine_error!("novatext::vulkan", "Failed to get required extensions: {}", e);
                        Error::InitializationFailed(format!(
                            "Failed to get required extensions: {}",
                            e
                        ))
                    })?
                    .to_vec();

            if config.enable_validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            let layer_names = if config.enable_validation {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry.create_instance(&create_info, None).map_err(|e| {
                engine_error!("novatext::vulkan", "Failed to create Vulkan instance: {:?}", e);
                Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
            })?;

            // Setup debug messenger if validation is enabled
            let (debug_utils_loader, debug_messenger) = if config.enable_validation {
                let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);

                crate::debug::init_debug_config(crate::debug::Config {
                    severity: config.debug_severity,
                });

                let severity_flags = match config.debug_severity {
                    DebugSeverity::ErrorsOnly => vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
                    DebugSeverity::ErrorsAndWarnings => {
                        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                            | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    }
                    DebugSeverity::All => {
                        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                            | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                            | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                            | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
                    }
                };

                let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                    .message_severity(severity_flags)
                    .message_type(
                        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
                    )
                    .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

                let messenger = debug_utils
                    .create_debug_utils_messenger(&debug_info, None)
                    .map_err(|e| {
                        engine_error!("novatext::vulkan", "Failed to create debug messenger: {:?}", e);
                        Error::InitializationFailed(format!(
                            "Failed to create debug messenger: {:?}",
                            e
                        ))
                    })?;

                (Some(debug_utils), Some(messenger))
            } else {
                (None, None)
            };

            // Create surface (the swapchain takes ownership of its destruction)
            let window_handle = window.window_handle().map_err(|e| {
                engine_error!("novatext::vulkan", "Failed to get window handle: {}", e);
                Error::InitializationFailed(format!("Failed to get window handle: {}", e))
            })?;
            let surface = ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| {
                engine_error!("novatext::vulkan", "Failed to create surface: {:?}", e);
                Error::InitializationFailed(format!("Failed to create surface: {:?}", e))
            })?;

            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            // Pick physical device (first suitable)
            let physical_devices = instance.enumerate_physical_devices().map_err(|e| {
                engine_error!("novatext::vulkan", "Failed to enumerate physical devices: {:?}", e);
                Error::InitializationFailed(format!(
                    "Failed to enumerate physical devices: {:?}",
                    e
                ))
            })?;

            let physical_device = physical_devices.into_iter().next().ok_or_else(|| {
                engine_error!("novatext::vulkan", "No Vulkan-capable GPU found");
                Error::InitializationFailed("No Vulkan-capable GPU found".to_string())
            })?;

            // Find queue families
            let queue_families =
                instance.get_physical_device_queue_family_properties(physical_device);

            let graphics_family_index = queue_families
                .iter()
                .enumerate()
                .find(|(_, qf)| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                .map(|(i, _)| i as u32)
                .ok_or_else(|| {
                    engine_error!("novatext::vulkan", "No graphics queue family found");
                    Error::InitializationFailed("No graphics queue family found".to_string())
                })?;

            let present_family_index = (0..queue_families.len() as u32)
                .find(|&i| {
                    surface_loader
                        .get_physical_device_surface_support(physical_device, i, surface)
                        .unwrap_or(false)
                })
                .ok_or_else(|| {
                    engine_error!("novatext::vulkan", "No present queue family found");
                    Error::InitializationFailed("No present queue family found".to_string())
                })?;

            // Create logical device
            let queue_priorities = [1.0];
            let queue_create_infos = if graphics_family_index == present_family_index {
                vec![vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(graphics_family_index)
                    .queue_priorities(&queue_priorities)]
            } else {
                vec![
                    vk::DeviceQueueCreateInfo::default()
                        .queue_family_index(graphics_family_index)
                        .queue_priorities(&queue_priorities),
                    vk::DeviceQueueCreateInfo::default()
                        .queue_family_index(present_family_index)
                        .queue_priorities(&queue_priorities),
                ]
            };

            let device_extension_names = vec![ash::khr::swapchain::NAME.as_ptr()];

            // sync2 is core in 1.3; enable it through the feature chain
            let mut sync2_features =
                vk::PhysicalDeviceSynchronization2Features::default().synchronization2(true);

            let device_properties = instance.get_physical_device_properties(physical_device);
            let supports_sync2 = device_properties.api_version >= vk::API_VERSION_1_3;

            let mut device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names);
            if supports_sync2 {
                device_create_info = device_create_info.push_next(&mut sync2_features);
            }

            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| {
                    engine_error!("novatext::vulkan", "Failed to create logical device: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create device: {:?}", e))
                })?;

            let graphics_queue = device.get_device_queue(graphics_family_index, 0);
            let present_queue = device.get_device_queue(present_family_index, 0);

            // Create GPU allocator
            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| {
                engine_error!("novatext::vulkan", "Failed to create GPU allocator: {:?}", e);
                Error::InitializationFailed(format!("Failed to create allocator: {:?}", e))
            })?;

            let memory_properties =
                instance.get_physical_device_memory_properties(physical_device);
            let non_coherent_atom_size =
                device_properties.limits.non_coherent_atom_size.max(1);

            engine_info!(
                "novatext::vulkan",
                "GPU context created (graphics family {}, present family {}, sync2: {})",
                graphics_family_index,
                present_family_index,
                supports_sync2
            );

            let context = Arc::new(Self {
                _entry: entry,
                instance,
                physical_device,
                device,
                allocator: ManuallyDrop::new(Arc::new(Mutex::new(allocator))),
                graphics_queue,
                graphics_queue_family: graphics_family_index,
                present_queue,
                present_queue_family: present_family_index,
                memory_properties,
                non_coherent_atom_size,
                supports_sync2,
                debug_utils_loader,
                debug_messenger,
            });

            Ok((context, surface, surface_loader))
        }
    }

    /// Find a memory type matching `type_bits` with all of `flags` set.
    ///
    /// Returns `None` when no such type exists; callers decide whether to
    /// fall back to weaker flags or fail.
    pub fn find_memory_type(
        &self,
        type_bits: u32,
        flags: vk::MemoryPropertyFlags,
    ) -> Option<u32> {
        (0..self.memory_properties.memory_type_count).find(|&i| {
            (type_bits & (1 << i)) != 0
                && self.memory_properties.memory_types[i as usize]
                    .property_flags
                    .contains(flags)
        })
    }

    /// Block until the device has finished all submitted work
    pub fn wait_idle(&self) {
        unsafe {
            self.device.device_wait_idle().ok();
        }
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            // Free allocator pages BEFORE destroying the device
            ManuallyDrop::drop(&mut self.allocator);

            // Silence callbacks during destruction, then drop the messenger
            crate::debug::cleanup_debug_config();
            if let (Some(debug_utils), Some(messenger)) =
                (&self.debug_utils_loader, &self.debug_messenger)
            {
                debug_utils.destroy_debug_utils_messenger(*messenger, None);
            }

            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}
