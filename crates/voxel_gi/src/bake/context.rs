//! Shared dispatch state of the bake stages

use std::sync::Arc;

use crate::bake::{BakeObserver, LogObserver};
use crate::compute::{
    ComputeDevice, ComputeKernel, CpuDevice, DeviceStats, DispatchContext, DispatchScheduler, KernelLibrary,
    MemoryTracker,
};
use crate::core::{BakeResult, BakeStage, DeviceSettings};

/// Device, throttle, kernels and progress sink used by every stage
///
/// All dispatches of a bake go through [`BakeContext::submit`], so the
/// in-flight window holds across stages.
pub struct BakeContext {
    device: Box<dyn ComputeDevice>,
    scheduler: DispatchScheduler,
    library: KernelLibrary,
    observer: Box<dyn BakeObserver>,
}

impl BakeContext {
    /// Context around an explicit device and kernel library
    pub fn new(device: Box<dyn ComputeDevice>, library: KernelLibrary, readback_limit: usize) -> Self {
        Self {
            device,
            scheduler: DispatchScheduler::new(readback_limit),
            library,
            observer: Box::new(LogObserver::new()),
        }
    }

    /// CPU device and built-in kernels configured from device settings
    pub fn from_settings(settings: &DeviceSettings) -> Self {
        let device = CpuDevice::new().with_watchdog(settings.watchdog_limit);
        Self::new(Box::new(device), KernelLibrary::builtin(), settings.gpu_readback_limit)
    }

    /// Replace the progress observer
    pub fn set_observer(&mut self, observer: Box<dyn BakeObserver>) {
        self.observer = observer;
    }

    /// Replace the kernel library
    pub fn set_library(&mut self, library: KernelLibrary) {
        self.library = library;
    }

    /// Look up a kernel, failing with `KernelNotFound`
    pub fn kernel(&self, name: &str) -> BakeResult<Arc<dyn ComputeKernel>> {
        self.library.get(name)
    }

    /// Submit one dispatch through the throttle
    pub fn submit(&mut self, kernel: &dyn ComputeKernel, ctx: &mut DispatchContext<'_>) -> BakeResult<()> {
        self.scheduler.submit(self.device.as_mut(), kernel, ctx)
    }

    /// Block until every submitted dispatch has retired
    pub fn drain(&mut self) -> BakeResult<()> {
        self.scheduler.drain(self.device.as_mut())
    }

    /// Buffer accounting of the device
    pub fn memory(&self) -> &MemoryTracker {
        self.device.memory()
    }

    /// Device counters
    pub fn device_stats(&self) -> DeviceStats {
        self.device.stats()
    }

    /// Throttle state
    pub fn scheduler(&self) -> &DispatchScheduler {
        &self.scheduler
    }

    /// Device name
    pub fn device_name(&self) -> &str {
        self.device.name()
    }

    pub(crate) fn started(&mut self, stage: BakeStage) {
        self.observer.stage_started(stage);
    }

    pub(crate) fn progress(&mut self, stage: BakeStage, completed: usize, total: usize) {
        self.observer.progress(stage, completed, total);
    }

    pub(crate) fn finished(&mut self, stage: BakeStage, elapsed: std::time::Duration) {
        self.observer.stage_finished(stage, elapsed);
    }
}

impl std::fmt::Debug for BakeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BakeContext")
            .field("device", &self.device.name())
            .field("scheduler", &self.scheduler)
            .field("library", &self.library)
            .finish()
    }
}
