//! Progress reporting

use std::time::Duration;

use crate::core::BakeStage;

/// Receives progress of a bake
///
/// Every method has an empty default so observers only implement what they
/// display.
pub trait BakeObserver {
    /// A stage begins
    fn stage_started(&mut self, _stage: BakeStage) {}

    /// `completed` of `total` work units of a stage are done
    fn progress(&mut self, _stage: BakeStage, _completed: usize, _total: usize) {}

    /// A stage completed successfully
    fn stage_finished(&mut self, _stage: BakeStage, _elapsed: Duration) {}
}

/// Reports through the `log` facade
///
/// Progress is logged at debug level and throttled to roughly every tenth of
/// a stage.
#[derive(Debug, Default)]
pub struct LogObserver {
    last_decile: Option<(BakeStage, usize)>,
}

impl LogObserver {
    /// Create a log observer
    pub fn new() -> Self {
        Self::default()
    }
}

impl BakeObserver for LogObserver {
    fn stage_started(&mut self, stage: BakeStage) {
        log::info!("Baking {}...", stage);
        self.last_decile = None;
    }

    fn progress(&mut self, stage: BakeStage, completed: usize, total: usize) {
        if total == 0 {
            return;
        }
        let decile = completed * 10 / total;
        if self.last_decile == Some((stage, decile)) {
            return;
        }
        self.last_decile = Some((stage, decile));
        log::debug!("{}: {}/{} ({}%)", stage, completed, total, completed * 100 / total);
    }

    fn stage_finished(&mut self, stage: BakeStage, elapsed: Duration) {
        log::info!("Finished {} in {:.1} ms", stage, elapsed.as_secs_f32() * 1000.0);
    }
}

/// Discards every report
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl BakeObserver for NullObserver {}
