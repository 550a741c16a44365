//! Render-target sizing and creation.

use crate::backend::{RenderBackend, TargetDesc};
use crate::error::AllocationError;
use crate::pipeline::RenderTarget;

/// Combined color+depth precision requested for scene targets.
pub const TARGET_DEPTH_BITS: u32 = 32;

/// Scales `base` by `factor_percent / 100` with integer truncation.
///
/// Saturates at `u32::MAX`; oversized results are rejected by allocation.
pub fn size_for(base: (u32, u32), factor_percent: u32) -> (u32, u32) {
    let scale = |v: u32| {
        let scaled = u64::from(v) * u64::from(factor_percent) / 100;
        u32::try_from(scaled).unwrap_or(u32::MAX)
    };
    (scale(base.0), scale(base.1))
}

/// Creates render targets for the current scene.
#[derive(Debug, Default)]
pub struct TargetAllocator {
    created: u64,
}

impl TargetAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Targets created over the allocator's lifetime.
    pub fn created(&self) -> u64 {
        self.created
    }

    /// Rejects zero-area sizes and sizes beyond `limit`.
    pub fn validate(width: u32, height: u32, limit: u32) -> Result<(), AllocationError> {
        if width == 0 || height == 0 {
            return Err(AllocationError::InvalidSize { width, height });
        }
        if width > limit || height > limit {
            return Err(AllocationError::ExceedsDeviceLimit { width, height, limit });
        }
        Ok(())
    }

    pub fn allocate<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        label: &'static str,
        (width, height): (u32, u32),
    ) -> Result<RenderTarget<B::Target>, AllocationError> {
        Self::validate(width, height, backend.max_target_dimension())?;

        let desc = TargetDesc {
            label,
            width,
            height,
            depth_bits: TARGET_DEPTH_BITS,
        };
        let handle = backend.create_target(&desc)?;
        self.created += 1;

        Ok(RenderTarget { width, height, handle })
    }

    /// Fills `slot` unless it already holds a target for this scene.
    ///
    /// Returns `true` when a new target was created.
    pub fn ensure<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        slot: &mut Option<RenderTarget<B::Target>>,
        label: &'static str,
        size: (u32, u32),
    ) -> Result<bool, AllocationError> {
        if slot.is_some() {
            log::debug!("{label}: reusing target already allocated for this scene");
            return Ok(false);
        }
        *slot = Some(self.allocate(backend, label, size)?);
        Ok(true)
    }
}
