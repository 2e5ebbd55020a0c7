//! WebAssembly bindings via wasm-bindgen for AudioWorklet integration.
//!
//! This module is only compiled when the `web` feature is enabled.
//!
//! # Usage
//!
//! Build with wasm-pack:
//! ```bash
//! wasm-pack build --target web --features web
//! ```
//!
//! # JavaScript Example
//!
//! ```javascript
//! import init, { denoise_init, NoiseSuppressorWorklet } from './denoise_worklet.js';
//!
//! class NoiseSuppressor extends AudioWorkletProcessor {
//!     constructor() {
//!         super();
//!         denoise_init();
//!         this.inner = new NoiseSuppressorWorklet(128);
//!         this.port.onmessage = (e) => this.inner.post_message(JSON.stringify(e.data));
//!     }
//!
//!     process(inputs, outputs) {
//!         const keepAlive = this.inner.process(inputs[0][0], outputs[0][0]);
//!         for (const msg of this.inner.poll_diagnostics()) this.port.postMessage(msg);
//!         return keepAlive;
//!     }
//! }
//! ```

use wasm_bindgen::prelude::*;

use crate::bridge::{ControlHandle, ProcessorHandle, create_bridge};
use crate::callback::AudioCallback;
use crate::config::ProcessorConfig;
use crate::engine::SuppressionModule;
use crate::frame_processor::FrameProcessor;
use crate::modules::create_default_module;

// ═══════════════════════════════════════════════════════════════════════════
// Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the wasm module. Call this once before using any other functions.
/// Sets up panic hooks and console logging.
#[wasm_bindgen]
pub fn denoise_init() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).ok();
}

// ═══════════════════════════════════════════════════════════════════════════
// Worklet
// ═══════════════════════════════════════════════════════════════════════════

/// Noise suppressor driven by an AudioWorkletProcessor.
///
/// The worklet's message port and `process` run on the same thread, so both
/// bridge handles live in one object.
#[wasm_bindgen]
pub struct NoiseSuppressorWorklet {
    control: ControlHandle,
    audio: ProcessorHandle<Box<dyn SuppressionModule>>,
}

#[wasm_bindgen]
impl NoiseSuppressorWorklet {
    /// Create and start a suppressor for the given render quantum.
    #[wasm_bindgen(constructor)]
    pub fn new(quantum_size: u32) -> Result<NoiseSuppressorWorklet, JsError> {
        let module = create_default_module();
        let config = ProcessorConfig::new(quantum_size as usize, module.frame_size());
        let processor = FrameProcessor::started(config, module)
            .map_err(|e| JsError::new(&e.to_string()))?;

        let (control, audio) = create_bridge(processor);
        Ok(Self { control, audio })
    }

    /// Process one render quantum. Returns `false` once stopped.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) -> bool {
        self.audio.process(input, output)
    }

    /// Handle a port message such as `{"cmd":"pause"}`.
    pub fn post_message(&self, message: &str) -> Result<(), JsError> {
        self.control
            .post_message(message)
            .map(|_| ())
            .map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn stop(&self) {
        self.control.stop();
    }

    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    /// Drain diagnostics as JSON strings for `port.postMessage`.
    pub fn poll_diagnostics(&self) -> Vec<String> {
        self.control
            .poll_diagnostics()
            .iter()
            .map(|d| d.to_json())
            .collect()
    }

    /// Voice activity probability of the last processed frame.
    pub fn vad(&self) -> f32 {
        self.control.readback().vad
    }

    /// Current state: created, running, paused, bypassed or stopped.
    pub fn state(&self) -> String {
        self.control.readback().state.as_str().to_string()
    }

    /// Input-to-output delay in samples.
    pub fn latency_samples(&self) -> u32 {
        self.audio.processor().config().latency_samples() as u32
    }
}
