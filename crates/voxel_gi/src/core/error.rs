//! Bake error taxonomy

use crate::config::ConfigError;
use crate::lighting::LightEncodeError;
use crate::scene::SceneError;
use crate::volume::VolumeError;

/// Pipeline stage names, used in errors and progress reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BakeStage {
    /// Six-axis scene capture
    Voxelize,
    /// Direct light solve
    Direct,
    /// Environment light solve
    Environment,
    /// Multi-bounce solve
    Bounce,
    /// Buffer combination
    Combine,
    /// Writing volumes to disk
    Persist,
}

impl BakeStage {
    /// Human readable stage name
    pub fn name(self) -> &'static str {
        match self {
            Self::Voxelize => "voxelize",
            Self::Direct => "direct light",
            Self::Environment => "environment light",
            Self::Bounce => "bounce light",
            Self::Combine => "combine",
            Self::Persist => "persist",
        }
    }
}

impl std::fmt::Display for BakeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors that abort a bake stage
///
/// Objects that contribute nothing (no meta data, no UV1 set) never surface
/// here; they are skipped where they are found.
#[derive(thiserror::Error, Debug)]
pub enum BakeError {
    /// A required compute kernel is not registered
    #[error("Compute kernel '{name}' not found")]
    KernelNotFound {
        /// Kernel name
        name: String,
    },

    /// Output location or bake name is unusable; raised before any dispatch
    #[error("Invalid bake destination: {0}")]
    InvalidDestination(String),

    /// The device aborted after too much unsynchronized work
    #[error("Compute device lost: {pending} dispatches pending, watchdog limit {limit}")]
    DeviceLost {
        /// Dispatches issued since the last synchronization
        pending: usize,
        /// Watchdog limit of the device
        limit: usize,
    },

    /// A stage ran before the stage producing its input
    #[error("Stage '{stage}' is missing the output of '{requires}'")]
    MissingStageInput {
        /// Stage that was invoked
        stage: BakeStage,
        /// Stage that must run first
        requires: BakeStage,
    },

    /// A kernel was dispatched without one of its volume bindings
    #[error("Kernel '{kernel}' is missing binding '{binding}'")]
    MissingBinding {
        /// Kernel name
        kernel: &'static str,
        /// Binding name
        binding: &'static str,
    },

    /// Settings failed validation
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Volume error
    #[error(transparent)]
    Volume(#[from] VolumeError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Light encoding error
    #[error(transparent)]
    LightEncode(#[from] LightEncodeError),

    /// Scene error
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for bake operations
pub type BakeResult<T> = Result<T, BakeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = BakeError::KernelNotFound {
            name: "CombineAdd".to_string(),
        };
        assert_eq!(err.to_string(), "Compute kernel 'CombineAdd' not found");

        let err = BakeError::MissingStageInput {
            stage: BakeStage::Bounce,
            requires: BakeStage::Direct,
        };
        assert_eq!(err.to_string(), "Stage 'bounce light' is missing the output of 'direct light'");
    }
}
