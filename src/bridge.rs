//! Thread-safe bridge between the control context and the audio thread.
//!
//! # Architecture
//!
//! - **Control thread** owns [`ControlHandle`]: sends commands, drains and
//!   logs diagnostics, reads back processor state
//! - **Audio thread** owns [`ProcessorHandle`] with the [`FrameProcessor`]
//! - Commands use an MPSC channel drained with `try_recv` once per callback;
//!   diagnostics use a bounded channel written with `try_send`; readback uses
//!   atomics. The audio thread never blocks or takes a lock.
//!
//! # Usage
//!
//! ```ignore
//! let processor = FrameProcessor::started(config, module)?;
//! let (control, mut audio) = create_bridge(processor);
//!
//! // Audio thread: once per quantum
//! let keep_going = audio.process(&input, &mut output);
//!
//! // Control thread
//! control.pause();
//! for diagnostic in control.poll_diagnostics() { /* ... */ }
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicU8, AtomicU32, AtomicU64, Ordering},
    mpsc::{self, Receiver, Sender, SyncSender, TryRecvError},
};

use crate::callback::AudioCallback;
use crate::command::{Command, Diagnostic, DiagnosticSink, ProcessorState, Readback};
use crate::engine::SuppressionModule;
use crate::frame_processor::FrameProcessor;

/// Diagnostics buffered between control-thread polls. Extra ones are dropped.
pub const DIAGNOSTIC_QUEUE_LEN: usize = 256;

/// Handle for the control thread.
pub struct ControlHandle {
    /// Channel to send commands to the audio thread.
    command_tx: Sender<Command>,

    /// Channel to receive diagnostics from the audio thread.
    diagnostic_rx: Receiver<Diagnostic>,

    /// Shared readback state (updated by audio thread, read here).
    readback: Arc<SharedReadback>,
}

/// Handle for the audio thread. Owns the processor.
pub struct ProcessorHandle<M: SuppressionModule> {
    processor: FrameProcessor<M>,

    /// Channel to receive commands from the control thread.
    command_rx: Receiver<Command>,

    /// Channel to send diagnostics to the control thread.
    diagnostic_tx: SyncSender<Diagnostic>,

    /// Shared readback state (written by audio thread).
    readback: Arc<SharedReadback>,
}

/// Lock-free shared state for audio thread -> control readback.
struct SharedReadback {
    state: AtomicU8,
    callbacks: AtomicU64,
    frames_processed: AtomicU64,
    overflows: AtomicU64,
    underflows: AtomicU64,
    /// VAD probability stored as f32 bits
    vad_bits: AtomicU32,
    dropped_diagnostics: AtomicU64,
}

impl SharedReadback {
    fn new(state: ProcessorState) -> Self {
        Self {
            state: AtomicU8::new(state as u8),
            callbacks: AtomicU64::new(0),
            frames_processed: AtomicU64::new(0),
            overflows: AtomicU64::new(0),
            underflows: AtomicU64::new(0),
            vad_bits: AtomicU32::new(0.0_f32.to_bits()),
            dropped_diagnostics: AtomicU64::new(0),
        }
    }
}

/// Create a linked pair of handles around a processor.
///
/// The processor is usually already started; if so a
/// [`Diagnostic::Started`] is queued for the control side.
pub fn create_bridge<M: SuppressionModule>(
    processor: FrameProcessor<M>,
) -> (ControlHandle, ProcessorHandle<M>) {
    let (command_tx, command_rx) = mpsc::channel();
    let (diagnostic_tx, diagnostic_rx) = mpsc::sync_channel(DIAGNOSTIC_QUEUE_LEN);
    let readback = Arc::new(SharedReadback::new(processor.state()));

    if processor.state().is_running() {
        let config = processor.config();
        diagnostic_tx
            .try_send(Diagnostic::Started {
                quantum_size: config.quantum_size,
                frame_size: config.frame_size,
                latency_samples: config.latency_samples(),
            })
            .ok();
    }

    let control = ControlHandle {
        command_tx,
        diagnostic_rx,
        readback: Arc::clone(&readback),
    };

    let audio = ProcessorHandle {
        processor,
        command_rx,
        diagnostic_tx,
        readback,
    };

    (control, audio)
}

// ═══════════════════════════════════════════════════════════════════
// ControlHandle - Control Thread API
// ═══════════════════════════════════════════════════════════════════

impl ControlHandle {
    /// Queue a command for the audio thread.
    ///
    /// Takes effect no later than the next callback. Returns `false` if the
    /// audio side is gone.
    pub fn send(&self, command: Command) -> bool {
        self.command_tx.send(command).is_ok()
    }

    /// Handle a structured message such as `{"cmd":"pause"}`.
    pub fn post_message(&self, message: &str) -> serde_json::Result<bool> {
        let command = Command::from_json(message)?;
        Ok(self.send(command))
    }

    pub fn stop(&self) -> bool {
        self.send(Command::Stop)
    }

    pub fn pause(&self) -> bool {
        self.send(Command::Pause)
    }

    pub fn resume(&self) -> bool {
        self.send(Command::Resume)
    }

    /// Drain pending diagnostics, logging each one.
    pub fn poll_diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        loop {
            match self.diagnostic_rx.try_recv() {
                Ok(diagnostic) => {
                    diagnostic.log();
                    diagnostics.push(diagnostic);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break,
            }
        }

        let dropped = self.readback.dropped_diagnostics.swap(0, Ordering::Relaxed);
        if dropped > 0 {
            log::warn!("{dropped} diagnostics dropped, queue full");
        }

        diagnostics
    }

    /// Get the current audio-thread state.
    pub fn readback(&self) -> Readback {
        let rb = &self.readback;
        Readback {
            state: ProcessorState::from_u8(rb.state.load(Ordering::Acquire)),
            callbacks: rb.callbacks.load(Ordering::Relaxed),
            frames_processed: rb.frames_processed.load(Ordering::Relaxed),
            overflows: rb.overflows.load(Ordering::Relaxed),
            underflows: rb.underflows.load(Ordering::Relaxed),
            vad: f32::from_bits(rb.vad_bits.load(Ordering::Relaxed)),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// ProcessorHandle - Audio Thread API
// ═══════════════════════════════════════════════════════════════════

impl<M: SuppressionModule> ProcessorHandle<M> {
    /// Apply all pending commands. Call at the start of each callback.
    pub fn process_commands(&mut self) {
        let mut sink = QueueSink {
            tx: &self.diagnostic_tx,
            readback: &self.readback,
        };

        while let Ok(command) = self.command_rx.try_recv() {
            self.processor.apply(command, &mut sink);
        }
    }

    pub fn processor(&self) -> &FrameProcessor<M> {
        &self.processor
    }

    pub fn processor_mut(&mut self) -> &mut FrameProcessor<M> {
        &mut self.processor
    }

    /// Publish processor state for the control thread.
    fn sync_readback(&self) {
        let rb = &self.readback;
        rb.callbacks
            .store(self.processor.callbacks(), Ordering::Relaxed);
        rb.frames_processed
            .store(self.processor.frames_processed(), Ordering::Relaxed);
        rb.vad_bits
            .store(self.processor.vad().to_bits(), Ordering::Relaxed);
        rb.state
            .store(self.processor.state() as u8, Ordering::Release);
    }
}

impl<M: SuppressionModule> AudioCallback for ProcessorHandle<M> {
    fn process(&mut self, input: &[f32], output: &mut [f32]) -> bool {
        self.process_commands();

        let mut sink = QueueSink {
            tx: &self.diagnostic_tx,
            readback: &self.readback,
        };
        let keep_going = self.processor.process_quantum(input, output, &mut sink);

        self.sync_readback();
        keep_going
    }
}

/// Forwards diagnostics to the control thread without blocking.
struct QueueSink<'a> {
    tx: &'a SyncSender<Diagnostic>,
    readback: &'a SharedReadback,
}

impl DiagnosticSink for QueueSink<'_> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::Overflow { .. } => {
                self.readback.overflows.fetch_add(1, Ordering::Relaxed);
            }
            Diagnostic::Underflow { .. } => {
                self.readback.underflows.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }

        if self.tx.try_send(diagnostic).is_err() {
            self.readback
                .dropped_diagnostics
                .fetch_add(1, Ordering::Relaxed);
        }
    }
}
