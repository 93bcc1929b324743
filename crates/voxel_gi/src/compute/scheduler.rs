//! Bounded in-flight dispatch window

use crate::compute::{ComputeDevice, ComputeKernel, DispatchContext};
use crate::core::BakeResult;

/// Throttles dispatches against a device
///
/// At most `window` dispatches are submitted between two blocking
/// synchronizations. Once the window is full the scheduler drains it before
/// returning, so long multi-sample passes never pile up unbounded work.
#[derive(Debug, Clone)]
pub struct DispatchScheduler {
    window: usize,
    in_flight: usize,
    submitted: usize,
    drains: usize,
}

impl DispatchScheduler {
    /// Scheduler with a window of `window` dispatches (at least one)
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            in_flight: 0,
            submitted: 0,
            drains: 0,
        }
    }

    /// Window size
    pub fn window(&self) -> usize {
        self.window
    }

    /// Dispatches submitted since the last drain
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Dispatches submitted in total
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Drains performed in total
    pub fn drains(&self) -> usize {
        self.drains
    }

    /// Submit a dispatch, draining when the window fills
    pub fn submit(
        &mut self,
        device: &mut dyn ComputeDevice,
        kernel: &dyn ComputeKernel,
        ctx: &mut DispatchContext<'_>,
    ) -> BakeResult<()> {
        device.dispatch(kernel, ctx)?;
        self.in_flight += 1;
        self.submitted += 1;
        if self.in_flight >= self.window {
            log::trace!("Dispatch window full ({}), draining", self.window);
            self.drain(device)?;
        }
        Ok(())
    }

    /// Block until every submitted dispatch has retired
    pub fn drain(&mut self, device: &mut dyn ComputeDevice) -> BakeResult<()> {
        if self.in_flight == 0 {
            return Ok(());
        }
        device.synchronize()?;
        self.in_flight = 0;
        self.drains += 1;
        Ok(())
    }
}
