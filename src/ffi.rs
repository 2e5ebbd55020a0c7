// C-compatible FFI bindings for native hosts (iOS audio units).
//
// Safety requirements:
// - All pointers must be non-null unless documented otherwise
// - All handles must be created by this module and not fabricated
// - `denoise_process` must only be called from the audio thread
// - Caller must call the corresponding _destroy function for each _create

use std::ffi::{CStr, c_char};

use crate::bridge::{ControlHandle, ProcessorHandle, create_bridge};
use crate::callback::AudioCallback;
use crate::command::{Command, ProcessorState, Readback};
use crate::config::{DEFAULT_JITTER_FRAMES, DEFAULT_QUANTUM_SIZE, DEFAULT_SAMPLE_RATE, ProcessorConfig};
use crate::engine::SuppressionModule;
use crate::frame_processor::FrameProcessor;
use crate::modules::create_default_module;

use log::{LevelFilter, error};
use oslog::OsLogger;

// Logger subsystem identifier
const LOG_SUBSYSTEM: &str = "com.denoise.worklet";

// ═══════════════════════════════════════════════════════════════════════════
// Logger Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the oslog logger.
///
/// Call once at application startup before using any other FFI functions.
#[unsafe(no_mangle)]
pub extern "C" fn denoise_init_logger() {
    OsLogger::new(LOG_SUBSYSTEM)
        .level_filter(LevelFilter::Debug)
        .init()
        .ok();
}

// ═══════════════════════════════════════════════════════════════════════════
// Opaque Handle Types
// ═══════════════════════════════════════════════════════════════════════════

/// Opaque handle to the control side.
pub struct DenoiseControl {
    inner: ControlHandle,
}

/// Opaque handle to the audio side.
pub struct DenoiseProcessor {
    inner: ProcessorHandle<Box<dyn SuppressionModule>>,
}

// ═══════════════════════════════════════════════════════════════════════════
// FFI Types
// ═══════════════════════════════════════════════════════════════════════════

/// Processor sizing. The frame size always comes from the engine.
#[repr(C)]
pub struct DenoiseConfig {
    pub sample_rate: u32,
    pub quantum_size: u32,
    pub jitter_frames: u32,
}

impl Default for DenoiseConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            quantum_size: DEFAULT_QUANTUM_SIZE as u32,
            jitter_frames: DEFAULT_JITTER_FRAMES as u32,
        }
    }
}

/// Readback data for UI displays.
#[repr(C)]
pub struct DenoiseReadback {
    /// 0 created, 1 running, 2 paused, 3 bypassed, 4 stopped
    pub state: u8,
    pub callbacks: u64,
    pub frames_processed: u64,
    pub overflows: u64,
    pub underflows: u64,
    pub vad: f32,
}

impl From<Readback> for DenoiseReadback {
    fn from(r: Readback) -> Self {
        Self {
            state: r.state as u8,
            callbacks: r.callbacks,
            frames_processed: r.frames_processed,
            overflows: r.overflows,
            underflows: r.underflows,
            vad: r.vad,
        }
    }
}

/// Command codes for `denoise_control_send`.
pub const DENOISE_CMD_STOP: u32 = 0;
pub const DENOISE_CMD_PAUSE: u32 = 1;
pub const DENOISE_CMD_RESUME: u32 = 2;

// ═══════════════════════════════════════════════════════════════════════════
// Lifecycle
// ═══════════════════════════════════════════════════════════════════════════

/// Get the default configuration values.
#[unsafe(no_mangle)]
pub extern "C" fn denoise_default_config() -> DenoiseConfig {
    DenoiseConfig::default()
}

/// Create and start a processor.
///
/// Returns the control handle; the audio handle is returned via
/// `out_processor`. Returns NULL (and leaves `out_processor` untouched) if
/// the configuration is inconsistent.
///
/// # Safety
/// - `config` must be a valid pointer or NULL for defaults
/// - `out_processor` must be a valid pointer to store the processor handle
#[unsafe(no_mangle)]
pub unsafe extern "C" fn denoise_create(
    config: *const DenoiseConfig,
    out_processor: *mut *mut DenoiseProcessor,
) -> *mut DenoiseControl {
    if out_processor.is_null() {
        return std::ptr::null_mut();
    }

    let cfg = if config.is_null() {
        DenoiseConfig::default()
    } else {
        unsafe { std::ptr::read(config) }
    };

    let module = create_default_module();
    let config = ProcessorConfig::new(cfg.quantum_size as usize, module.frame_size())
        .with_sample_rate(cfg.sample_rate)
        .with_jitter_frames(cfg.jitter_frames as usize);

    let processor = match FrameProcessor::started(config, module) {
        Ok(processor) => processor,
        Err(e) => {
            error!("denoise_create: {e}");
            return std::ptr::null_mut();
        }
    };

    let (control, audio) = create_bridge(processor);
    unsafe {
        *out_processor = Box::into_raw(Box::new(DenoiseProcessor { inner: audio }));
    }
    Box::into_raw(Box::new(DenoiseControl { inner: control }))
}

/// Destroy a control handle.
///
/// # Safety
/// `control` must be a valid pointer returned by `denoise_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn denoise_control_destroy(control: *mut DenoiseControl) {
    if !control.is_null() {
        unsafe { drop(Box::from_raw(control)) };
    }
}

/// Destroy a processor handle, releasing the engine.
///
/// # Safety
/// `processor` must be a valid pointer returned via `denoise_create` and
/// must not be in use on the audio thread.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn denoise_processor_destroy(processor: *mut DenoiseProcessor) {
    if !processor.is_null() {
        unsafe { drop(Box::from_raw(processor)) };
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Audio Thread
// ═══════════════════════════════════════════════════════════════════════════

/// Process one quantum of mono audio.
///
/// Returns `false` once the processor has stopped; the host should stop
/// calling it.
///
/// # Safety
/// `input` and `output` must each point to `frames` valid samples and must
/// not overlap.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn denoise_process(
    processor: *mut DenoiseProcessor,
    input: *const f32,
    output: *mut f32,
    frames: usize,
) -> bool {
    if processor.is_null() || input.is_null() || output.is_null() {
        return false;
    }

    let input = unsafe { std::slice::from_raw_parts(input, frames) };
    let output = unsafe { std::slice::from_raw_parts_mut(output, frames) };
    unsafe { (*processor).inner.process(input, output) }
}

// ═══════════════════════════════════════════════════════════════════════════
// Control Thread
// ═══════════════════════════════════════════════════════════════════════════

/// Send a command (`DENOISE_CMD_*`). Returns `false` for unknown codes or
/// if the processor is gone.
///
/// # Safety
/// `control` must be a valid pointer returned by `denoise_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn denoise_control_send(control: *const DenoiseControl, command: u32) -> bool {
    if control.is_null() {
        return false;
    }
    let command = match command {
        DENOISE_CMD_STOP => Command::Stop,
        DENOISE_CMD_PAUSE => Command::Pause,
        DENOISE_CMD_RESUME => Command::Resume,
        _ => return false,
    };
    unsafe { (*control).inner.send(command) }
}

/// Send a JSON control message such as `{"cmd":"pause"}`.
///
/// # Safety
/// - `control` must be a valid pointer returned by `denoise_create`
/// - `message` must be a valid null-terminated UTF-8 string
#[unsafe(no_mangle)]
pub unsafe extern "C" fn denoise_control_post_message(
    control: *const DenoiseControl,
    message: *const c_char,
) -> bool {
    if control.is_null() || message.is_null() {
        return false;
    }
    let Ok(message) = (unsafe { CStr::from_ptr(message) }).to_str() else {
        return false;
    };
    match unsafe { (*control).inner.post_message(message) } {
        Ok(sent) => sent,
        Err(e) => {
            error!("denoise_control_post_message: {e}");
            false
        }
    }
}

/// Drain and log pending diagnostics. Returns how many were drained.
///
/// # Safety
/// `control` must be a valid pointer returned by `denoise_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn denoise_control_poll(control: *const DenoiseControl) -> u32 {
    if control.is_null() {
        return 0;
    }
    unsafe { (*control).inner.poll_diagnostics().len() as u32 }
}

/// Get the current readback state.
///
/// # Safety
/// `control` must be a valid pointer returned by `denoise_create` or NULL.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn denoise_control_readback(control: *const DenoiseControl) -> DenoiseReadback {
    if control.is_null() {
        return DenoiseReadback {
            state: ProcessorState::Stopped as u8,
            callbacks: 0,
            frames_processed: 0,
            overflows: 0,
            underflows: 0,
            vad: 0.0,
        };
    }
    unsafe { (*control).inner.readback().into() }
}
