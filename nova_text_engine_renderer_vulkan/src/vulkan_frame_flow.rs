/// Frame-loop outcomes and the decisions driven by them
///
/// Swapchain staleness is control flow, not an error: acquire and present
/// report it through these enums and the caller rebuilds. Kept free of
/// Vulkan handles so the decision logic is testable on its own.

/// Result of acquiring the next swapchain image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// An image is available for recording.
    ///
    /// `suboptimal` means the swapchain still works but no longer matches
    /// the surface; the frame proceeds and the rebuild happens after present.
    Acquired { index: u32, suboptimal: bool },
    /// The swapchain is out of date; nothing was acquired
    OutOfDate,
}

/// Result of presenting a finished frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    /// The image was queued for presentation and the swapchain still matches
    Presented,
    /// Presented or rejected with a stale swapchain; rebuild before the next frame
    Stale,
}

/// What the frame loop should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameAction {
    /// Record and submit into the given swapchain image
    Record(u32),
    /// Skip this frame and rebuild the swapchain-dependent objects
    Rebuild,
}

/// Per-loop frame accounting and staleness decisions
#[derive(Debug, Default)]
pub struct FrameFlow {
    frames_presented: u64,
    rebuilds: u64,
}

impl FrameFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide what to do with an acquire outcome.
    ///
    /// Out-of-date means the image index is unusable, so the frame is
    /// dropped entirely. A suboptimal acquire still records; the swapchain
    /// gets rebuilt after present reports `Stale`.
    pub fn on_acquire(&mut self, outcome: AcquireOutcome) -> FrameAction {
        match outcome {
            AcquireOutcome::Acquired { index, .. } => FrameAction::Record(index),
            AcquireOutcome::OutOfDate => {
                self.rebuilds += 1;
                FrameAction::Rebuild
            }
        }
    }

    /// Record a present outcome; returns true when a rebuild is due.
    ///
    /// Only clean presents are counted: `Stale` also covers out-of-date
    /// rejections where no image reached the screen.
    pub fn on_present(&mut self, outcome: PresentOutcome) -> bool {
        match outcome {
            PresentOutcome::Presented => {
                self.frames_presented += 1;
                false
            }
            PresentOutcome::Stale => {
                self.rebuilds += 1;
                true
            }
        }
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }
}

#[cfg(test)]
#[path = "vulkan_frame_flow_tests.rs"]
mod tests;
