//! Compute device abstraction

use crate::compute::{ComputeKernel, DispatchContext, MemoryStats, MemoryTracker};
use crate::core::BakeResult;

/// Counters kept by a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceStats {
    /// Dispatches executed
    pub dispatches: usize,
    /// Blocking synchronizations performed
    pub synchronizations: usize,
    /// Most dispatches ever pending between two synchronizations
    pub max_pending: usize,
    /// Buffer accounting
    pub memory: MemoryStats,
}

/// Executes kernels in strict submission order
///
/// Work submitted with [`ComputeDevice::dispatch`] may still be in flight
/// until [`ComputeDevice::synchronize`] returns; results read after that are
/// stable.
pub trait ComputeDevice {
    /// Device name for logs
    fn name(&self) -> &str;

    /// Submit one dispatch
    fn dispatch(&mut self, kernel: &dyn ComputeKernel, ctx: &mut DispatchContext<'_>) -> BakeResult<()>;

    /// Block until all submitted work has retired
    fn synchronize(&mut self) -> BakeResult<()>;

    /// Dispatches submitted since the last synchronization
    fn pending(&self) -> usize;

    /// Counters
    fn stats(&self) -> DeviceStats;

    /// Buffer accounting for this device
    fn memory(&self) -> &MemoryTracker;
}
