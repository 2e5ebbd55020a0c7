// src/lib.rs
//
// Library entry point for native (FFI) and web (wasm) consumers.

mod bridge;
mod callback;
mod command;
mod config;
mod engine;
mod error;
mod frame_processor;
mod memory;
mod modules;
mod ring_buffer;

#[cfg(feature = "ios")]
pub mod ffi;
#[cfg(feature = "web")]
pub mod wasm;

// Re-export key types for Rust consumers
pub use bridge::{ControlHandle, DIAGNOSTIC_QUEUE_LEN, ProcessorHandle, create_bridge};
pub use callback::{AudioCallback, render_offline};
pub use command::{BufferKind, Command, Diagnostic, DiagnosticSink, ProcessorState, Readback};
pub use config::{
    DEFAULT_FRAME_SIZE, DEFAULT_JITTER_FRAMES, DEFAULT_QUANTUM_SIZE, DEFAULT_SAMPLE_RATE,
    MAX_JITTER_FRAMES, ProcessorConfig,
};
pub use engine::{EngineHandle, SuppressionModule};
pub use error::{ConfigResult, ConfigurationError, EngineError, EngineResult};
pub use frame_processor::FrameProcessor;
pub use memory::{LinearMemory, Region, SAMPLE_BYTES};
#[cfg(feature = "rnnoise")]
pub use modules::RnnoiseModule;
pub use modules::{ARENA_FRAMES, IdentityModule, create_default_module};
pub use ring_buffer::{BufferStats, RingBuffer};
