// src/error.rs
//
// Error types for buffer/engine setup and engine calls.

use thiserror::Error;

/// Fatal misconfiguration.
///
/// Raised during setup only. A correctly configured processor never sees
/// one of these once it is running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("{what} must be non-zero")]
    ZeroSize { what: &'static str },

    #[error("push of {requested} samples exceeds ring capacity {capacity}")]
    PushExceedsCapacity { requested: usize, capacity: usize },

    #[error("configured frame size {configured} does not match engine frame size {engine}")]
    FrameSizeMismatch { configured: usize, engine: usize },

    #[error("ring capacity {capacity} is below the required {required} samples")]
    CapacityTooSmall { capacity: usize, required: usize },

    #[error("{jitter_frames} jitter frames exceeds the maximum of {max}")]
    JitterTooLarge { jitter_frames: usize, max: usize },

    #[error("linear memory exhausted: requested {requested} samples, {free} free")]
    OutOfMemory { requested: usize, free: usize },

    #[error("cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Failure reported by a suppression module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("engine instance could not be created: {0}")]
    CreateFailed(String),

    #[error("unknown engine handle {0}")]
    InvalidHandle(u32),

    #[error("region at byte offset {offset} ({len} samples) is outside linear memory")]
    InvalidRegion { offset: u32, len: usize },
}

pub type ConfigResult<T> = Result<T, ConfigurationError>;
pub type EngineResult<T> = Result<T, EngineError>;
