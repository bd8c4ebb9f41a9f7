/// Bump-allocation bookkeeping for a persistently mapped GPU arena.
///
/// Tracks offsets only; the actual memory block and the memcpy live in the
/// backend. Offsets advance monotonically from the start of the arena and
/// never wrap around. When a request does not fit in the remaining space the
/// allocation fails and the caller decides whether to grow a fresh arena.
///
/// # Example
///
/// ```
/// use nova_text_engine::novatext::utils::BumpLayout;
///
/// let mut layout = BumpLayout::new(1024, 64, true);
/// let a = layout.allocate(600, 16).unwrap();   // offset 0
/// let b = layout.allocate(100, 16).unwrap();   // offset 608 (aligned up)
/// assert_eq!(a.offset, 0);
/// assert_eq!(b.offset, 608);
/// layout.reset();
/// assert_eq!(layout.head(), 0);
/// ```
use crate::error::{Error, Result};

/// Round `value` up to the next multiple of `align` (power of two)
#[inline]
pub fn align_up(value: u64, align: u64) -> u64 {
    debug_assert!(align.is_power_of_two(), "alignment must be a power of two");
    (value + align - 1) & !(align - 1)
}

/// Round `value` down to the previous multiple of `align` (power of two)
#[inline]
pub fn align_down(value: u64, align: u64) -> u64 {
    debug_assert!(align.is_power_of_two(), "alignment must be a power of two");
    value & !(align - 1)
}

/// A successful bump allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BumpSlice {
    /// Offset of the allocation from the start of the arena, in bytes
    pub offset: u64,
    /// Size of the allocation, in bytes (zero-byte requests become one byte)
    pub size: u64,
    /// Range `(offset, size)` that must be flushed for non-coherent memory.
    ///
    /// `None` for coherent memory. Both ends are expanded to the platform's
    /// flush-atom granularity; the end may point past the arena capacity
    /// because the driver rounds mappable allocations up to the atom anyway.
    pub flush: Option<(u64, u64)>,
}

/// Offset bookkeeping for a bump arena
#[derive(Debug, Clone)]
pub struct BumpLayout {
    capacity: u64,
    head: u64,
    atom: u64,
    coherent: bool,
}

impl BumpLayout {
    /// Create bookkeeping for an arena of `capacity` bytes.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Arena size in bytes
    /// * `atom` - Platform flush-atom granularity (nonCoherentAtomSize),
    ///   must be a power of two
    /// * `coherent` - Whether the backing memory is host-coherent
    pub fn new(capacity: u64, atom: u64, coherent: bool) -> Self {
        debug_assert!(atom.is_power_of_two(), "flush atom must be a power of two");
        Self {
            capacity,
            head: 0,
            atom,
            coherent,
        }
    }

    /// Reserve `size` bytes aligned to `align`.
    ///
    /// Zero-byte requests are coerced to one byte so every allocation has a
    /// distinct offset. Fails with `Error::CapacityExhausted` when the aligned
    /// request does not fit in the remaining space; the head is left unchanged
    /// so the caller can grow and retry.
    pub fn allocate(&mut self, size: u64, align: u64) -> Result<BumpSlice> {
        debug_assert!(align.is_power_of_two(), "alignment must be a power of two");

        let size = size.max(1);
        let offset = align_up(self.head, align);

        if offset + size > self.capacity {
            return Err(Error::CapacityExhausted {
                requested: size,
                capacity: self.capacity,
            });
        }

        self.head = offset + size;

        let flush = if self.coherent {
            None
        } else {
            let start = align_down(offset, self.atom);
            let end = align_up(offset + size, self.atom);
            Some((start, end - start))
        };

        Ok(BumpSlice { offset, size, flush })
    }

    /// Rewind the head to the start of the arena.
    ///
    /// The caller must guarantee the GPU no longer reads any previously
    /// allocated range (the in-flight fence has been waited on).
    pub fn reset(&mut self) {
        self.head = 0;
    }

    /// Arena capacity in bytes
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Current head offset (next unaligned free byte)
    pub fn head(&self) -> u64 {
        self.head
    }

    /// Whether the backing memory is host-coherent
    pub fn is_coherent(&self) -> bool {
        self.coherent
    }

    /// Platform flush-atom granularity
    pub fn atom(&self) -> u64 {
        self.atom
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "bump_layout_tests.rs"]
mod tests;
