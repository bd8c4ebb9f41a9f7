/// MemoryArena - persistently mapped streaming buffer for per-frame data
///
/// A bump allocator over a single host-visible Vulkan buffer. The CPU writes
/// instance data into it during recording; the GPU reads it during the
/// subsequent submit. The owner rewinds it once per frame after the in-flight
/// fence has signaled.
///
/// Memory-type selection is done by hand rather than through the shared
/// allocator: the arena needs the coherent/non-coherent fallback and explicit
/// flush control over the raw `vk::DeviceMemory`.

use ash::vk;
use std::sync::Arc;

use nova_text_engine::novatext::utils::BumpLayout;
use nova_text_engine::novatext::{Error, Result};
use nova_text_engine::{engine_bail, engine_debug, engine_err, engine_info};

use crate::vulkan_context::GpuContext;

/// A successful arena allocation, valid until the next `reset` or growth.
///
/// No independent lifetime: the caller binds `buffer`+`offset` into the
/// current frame's command buffer and must not hold it across frames.
#[derive(Debug, Clone, Copy)]
pub struct UploadAllocation {
    /// Arena backing buffer (bind this with `offset`)
    pub buffer: vk::Buffer,
    /// Byte offset of the allocation inside the buffer
    pub offset: u64,
    /// Host pointer to the written bytes
    pub ptr: *mut u8,
    /// Allocation size in bytes
    pub size: u64,
}

/// Persistently mapped linear arena over host-visible memory
pub struct MemoryArena {
    context: Arc<GpuContext>,

    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    mapped: *mut u8,

    layout: BumpLayout,
    usage: vk::BufferUsageFlags,
    prefer_coherent: bool,
}

// The mapped pointer is only written from the recording thread; the handle
// itself is safe to move across threads.
unsafe impl Send for MemoryArena {}

impl MemoryArena {
    /// Create an arena of `capacity` bytes with the given buffer usage.
    ///
    /// Host-coherent memory is used when `prefer_coherent` is set and the
    /// device offers it; otherwise the arena falls back to plain host-visible
    /// memory and flushes every write explicitly. Fails with
    /// `Error::OutOfMemory` when no host-visible memory type exists at all.
    pub fn new(
        context: Arc<GpuContext>,
        capacity: u64,
        usage: vk::BufferUsageFlags,
        prefer_coherent: bool,
    ) -> Result<Self> {
        let (buffer, memory, mapped, coherent) =
            Self::create_backing(&context, capacity, usage, prefer_coherent)?;

        engine_info!(
            "novatext::vulkan::arena",
            "Created streaming arena: {} bytes, coherent: {}",
            capacity,
            coherent
        );

        Ok(Self {
            layout: BumpLayout::new(capacity, context.non_coherent_atom_size, coherent),
            context,
            buffer,
            memory,
            mapped,
            usage,
            prefer_coherent,
        })
    }

    fn create_backing(
        context: &GpuContext,
        capacity: u64,
        usage: vk::BufferUsageFlags,
        prefer_coherent: bool,
    ) -> Result<(vk::Buffer, vk::DeviceMemory, *mut u8, bool)> {
        let device = &context.device;
        unsafe {
            let buffer_info = vk::BufferCreateInfo::default()
                .size(capacity)
                .usage(usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = device
                .create_buffer(&buffer_info, None)
                .map_err(|e| engine_err!("novatext::vulkan::arena", "Failed to create arena buffer: {:?}", e))?;

            let requirements = device.get_buffer_memory_requirements(buffer);

            // Try HOST_VISIBLE|HOST_COHERENT first, fall back to HOST_VISIBLE alone
            let mut wanted = vk::MemoryPropertyFlags::HOST_VISIBLE;
            if prefer_coherent {
                wanted |= vk::MemoryPropertyFlags::HOST_COHERENT;
            }

            let (type_index, coherent) =
                match context.find_memory_type(requirements.memory_type_bits, wanted) {
                    Some(i) => (i, wanted.contains(vk::MemoryPropertyFlags::HOST_COHERENT)),
                    None => {
                        let fallback = vk::MemoryPropertyFlags::HOST_VISIBLE;
                        match context.find_memory_type(requirements.memory_type_bits, fallback) {
                            Some(i) => (i, false),
                            None => {
                                device.destroy_buffer(buffer, None);
                                return Err(Error::OutOfMemory);
                            }
                        }
                    }
                };

            let alloc_info = vk::MemoryAllocateInfo::default()
                .allocation_size(requirements.size)
                .memory_type_index(type_index);

            let memory = device.allocate_memory(&alloc_info, None).map_err(|e| {
                device.destroy_buffer(buffer, None);
                engine_err!("novatext::vulkan::arena", "Failed to allocate arena memory: {:?}", e)
            })?;

            if let Err(e) = device.bind_buffer_memory(buffer, memory, 0) {
                device.free_memory(memory, None);
                device.destroy_buffer(buffer, None);
                return Err(engine_err!("novatext::vulkan::arena", "Failed to bind arena memory: {:?}", e));
            }

            // Map once for the arena's entire lifetime
            let mapped = match device.map_memory(memory, 0, vk::WHOLE_SIZE, vk::MemoryMapFlags::empty()) {
                Ok(p) => p as *mut u8,
                Err(e) => {
                    device.free_memory(memory, None);
                    device.destroy_buffer(buffer, None);
                    return Err(engine_err!("novatext::vulkan::arena", "Failed to map arena memory: {:?}", e));
                }
            };

            Ok((buffer, memory, mapped, coherent))
        }
    }

    /// Copy `src` into the arena at the next `align`-aligned offset.
    ///
    /// Fails with `Error::CapacityExhausted` when the write would overrun
    /// the arena; the caller may `grow_if_needed` and retry. For
    /// non-coherent memory the written range is flushed before returning.
    pub fn allocate_and_write(&mut self, src: &[u8], align: u64) -> Result<UploadAllocation> {
        let slice = self.layout.allocate(src.len() as u64, align)?;

        unsafe {
            let dst = self.mapped.add(slice.offset as usize);
            if !src.is_empty() {
                std::ptr::copy_nonoverlapping(src.as_ptr(), dst, src.len());
            }

            if let Some((flush_offset, flush_size)) = slice.flush {
                let range = vk::MappedMemoryRange::default()
                    .memory(self.memory)
                    .offset(flush_offset)
                    .size(flush_size);
                self.context
                    .device
                    .flush_mapped_memory_ranges(&[range])
                    .map_err(|e| engine_err!("novatext::vulkan::arena", "Failed to flush arena range: {:?}", e))?;
            }

            Ok(UploadAllocation {
                buffer: self.buffer,
                offset: slice.offset,
                ptr: dst,
                size: slice.size,
            })
        }
    }

    /// Rewind the arena for a new frame.
    ///
    /// Precondition: the GPU has finished consuming every allocation handed
    /// out since the last reset (the owner waits on the in-flight fence
    /// first). The arena performs no such check itself.
    pub fn reset(&mut self) {
        self.layout.reset();
    }

    /// Grow the arena to at least `new_capacity` bytes.
    ///
    /// No-op when the current capacity already suffices. Growth destroys and
    /// recreates the backing buffer, so every previously returned
    /// `UploadAllocation` becomes invalid; the caller must only grow between
    /// frames, after the in-flight fence has signaled.
    pub fn grow_if_needed(&mut self, new_capacity: u64) -> Result<()> {
        if new_capacity <= self.layout.capacity() {
            return Ok(());
        }

        engine_debug!(
            "novatext::vulkan::arena",
            "Growing arena: {} -> {} bytes",
            self.layout.capacity(),
            new_capacity
        );

        self.destroy_backing();
        let (buffer, memory, mapped, coherent) = Self::create_backing(
            &self.context,
            new_capacity,
            self.usage,
            self.prefer_coherent,
        )?;

        self.buffer = buffer;
        self.memory = memory;
        self.mapped = mapped;
        self.layout = BumpLayout::new(new_capacity, self.context.non_coherent_atom_size, coherent);
        Ok(())
    }

    fn destroy_backing(&mut self) {
        unsafe {
            let device = &self.context.device;
            if !self.mapped.is_null() {
                device.unmap_memory(self.memory);
                self.mapped = std::ptr::null_mut();
            }
            if self.memory != vk::DeviceMemory::null() {
                device.free_memory(self.memory, None);
                self.memory = vk::DeviceMemory::null();
            }
            if self.buffer != vk::Buffer::null() {
                device.destroy_buffer(self.buffer, None);
                self.buffer = vk::Buffer::null();
            }
        }
    }

    /// Assert the arena was created with at least the given usage bits
    pub fn assert_usage(&self, need: vk::BufferUsageFlags) -> Result<()> {
        if !self.usage.contains(need) {
            engine_bail!(
                "novatext::vulkan::arena",
                "Arena usage {:?} does not cover required {:?}",
                self.usage,
                need
            );
        }
        Ok(())
    }

    // --- Accessors ---

    pub fn buffer(&self) -> vk::Buffer {
        self.buffer
    }

    pub fn capacity(&self) -> u64 {
        self.layout.capacity()
    }

    pub fn used(&self) -> u64 {
        self.layout.head()
    }

    pub fn is_coherent(&self) -> bool {
        self.layout.is_coherent()
    }

    pub fn atom_size(&self) -> u64 {
        self.layout.atom()
    }

    pub fn usage(&self) -> vk::BufferUsageFlags {
        self.usage
    }
}

impl Drop for MemoryArena {
    fn drop(&mut self) {
        // Safe on an already-destroyed arena (handles nulled by destroy_backing)
        self.destroy_backing();
    }
}
