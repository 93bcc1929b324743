//! Compute device running kernels on the calling thread

use crate::compute::{ComputeDevice, ComputeKernel, DeviceStats, DispatchContext, MemoryTracker};
use crate::core::{BakeError, BakeResult};

/// Synchronous CPU device
///
/// Kernels run to completion inside `dispatch`. The device still counts
/// unsynchronized dispatches and, when a watchdog limit is set, fails with
/// [`BakeError::DeviceLost`] once more than `limit` dispatches are pending,
/// the way a driver watchdog resets a GPU that was never given a break.
#[derive(Debug, Default)]
pub struct CpuDevice {
    watchdog_limit: Option<usize>,
    pending: usize,
    stats: DeviceStats,
    memory: MemoryTracker,
}

impl CpuDevice {
    /// Device without a watchdog
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: abort once more than `limit` dispatches are pending
    pub fn with_watchdog(mut self, limit: Option<usize>) -> Self {
        self.watchdog_limit = limit;
        self
    }

    /// Configured watchdog limit
    pub fn watchdog_limit(&self) -> Option<usize> {
        self.watchdog_limit
    }
}

impl ComputeDevice for CpuDevice {
    fn name(&self) -> &str {
        "cpu"
    }

    fn dispatch(&mut self, kernel: &dyn ComputeKernel, ctx: &mut DispatchContext<'_>) -> BakeResult<()> {
        if let Some(limit) = self.watchdog_limit {
            if self.pending >= limit {
                log::error!(
                    "Device watchdog fired: {} dispatches pending (limit {}) before '{}'",
                    self.pending,
                    limit,
                    kernel.name()
                );
                return Err(BakeError::DeviceLost {
                    pending: self.pending + 1,
                    limit,
                });
            }
        }

        log::trace!("Dispatch '{}'", kernel.name());
        kernel.execute(ctx)?;
        self.pending += 1;
        self.stats.dispatches += 1;
        self.stats.max_pending = self.stats.max_pending.max(self.pending);
        Ok(())
    }

    fn synchronize(&mut self) -> BakeResult<()> {
        log::trace!("Synchronize after {} dispatches", self.pending);
        self.pending = 0;
        self.stats.synchronizations += 1;
        Ok(())
    }

    fn pending(&self) -> usize {
        self.pending
    }

    fn stats(&self) -> DeviceStats {
        DeviceStats {
            memory: self.memory.stats(),
            ..self.stats
        }
    }

    fn memory(&self) -> &MemoryTracker {
        &self.memory
    }
}
