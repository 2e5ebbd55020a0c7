// src/frame_processor.rs
//
// Adapts the host's quantum cadence to the engine's frame cadence.
//
// Per callback:
//   input quantum -> input ring -> (whole frames) -> engine -> output ring
//   -> output quantum
//
// Everything is allocated in `start` and released when the processor stops.
// The per-callback path does not allocate, block, or log; diagnostics go to
// the caller's sink.

use crate::callback::AudioCallback;
use crate::command::{BufferKind, Command, Diagnostic, DiagnosticSink, ProcessorState};
use crate::config::ProcessorConfig;
use crate::engine::{EngineHandle, SuppressionModule};
use crate::error::{ConfigResult, ConfigurationError};
use crate::memory::Region;
use crate::ring_buffer::{BufferStats, RingBuffer};

/// Buffers and engine resources that exist only between start and stop.
struct Resources {
    input: RingBuffer,
    output: RingBuffer,
    handle: EngineHandle,
    input_region: Region,
    output_region: Region,
}

/// Frame-batching processor in front of a suppression module.
pub struct FrameProcessor<M: SuppressionModule> {
    config: ProcessorConfig,
    module: M,
    state: ProcessorState,
    resources: Option<Resources>,

    /// Callbacks of silence left before output starts.
    warmup_remaining: usize,

    callbacks: u64,
    frames_processed: u64,
    vad: f32,
}

impl<M: SuppressionModule> FrameProcessor<M> {
    /// Create an idle processor. Nothing is allocated until [`start`](Self::start).
    pub fn new(config: ProcessorConfig, module: M) -> Self {
        Self {
            config,
            module,
            state: ProcessorState::Created,
            resources: None,
            warmup_remaining: 0,
            callbacks: 0,
            frames_processed: 0,
            vad: 0.0,
        }
    }

    /// Create and start in one step.
    pub fn started(config: ProcessorConfig, module: M) -> ConfigResult<Self> {
        let mut processor = Self::new(config, module);
        processor.start()?;
        Ok(processor)
    }

    /// Allocate both ring buffers and frame regions, create the engine
    /// instance, and enter `Running`.
    ///
    /// Any failure leaves the processor in `Created` with nothing allocated.
    pub fn start(&mut self) -> ConfigResult<()> {
        if self.state != ProcessorState::Created {
            return Err(ConfigurationError::InvalidState {
                action: "start",
                state: self.state.as_str(),
            });
        }

        let frame_size = self.module.frame_size();
        self.config.validate(frame_size)?;

        let capacity = self.config.ring_capacity();
        let input = RingBuffer::new(capacity)?;
        let output = RingBuffer::new(capacity)?;

        let memory = self.module.memory_mut();
        let input_region = memory.alloc(frame_size)?;
        let output_region = match memory.alloc(frame_size) {
            Ok(region) => region,
            Err(e) => {
                memory.free(input_region).ok();
                return Err(e);
            }
        };

        let handle = match self.module.create() {
            Ok(handle) => handle,
            Err(e) => {
                let memory = self.module.memory_mut();
                memory.free(input_region).ok();
                memory.free(output_region).ok();
                return Err(e.into());
            }
        };

        self.resources = Some(Resources {
            input,
            output,
            handle,
            input_region,
            output_region,
        });
        self.warmup_remaining = self.config.warmup_quanta();
        self.state = ProcessorState::Running;

        log::info!(
            "frame processor started ({}): quantum {}, frame {}, ring {} samples, latency {} samples",
            self.module.name(),
            self.config.quantum_size,
            frame_size,
            capacity,
            self.config.latency_samples(),
        );

        Ok(())
    }

    /// Apply a control command.
    ///
    /// Invalid transitions are ignored. Returns `true` if the state changed.
    pub fn apply(&mut self, command: Command, sink: &mut impl DiagnosticSink) -> bool {
        let next = match (command, self.state) {
            (Command::Pause, ProcessorState::Running) => ProcessorState::Paused,
            (Command::Resume, ProcessorState::Paused) => ProcessorState::Running,
            (Command::Stop, state) if state != ProcessorState::Stopped => ProcessorState::Stopped,
            _ => return false,
        };

        if next == ProcessorState::Stopped {
            self.release();
        }
        self.state = next;
        sink.emit(Diagnostic::StateChanged { state: next });
        true
    }

    /// Stop processing and release the engine instance and all buffers.
    pub fn stop(&mut self) {
        self.apply(Command::Stop, &mut ());
    }

    /// Handle one host callback.
    ///
    /// Returns `false` once the processor has stopped.
    pub fn process_quantum(
        &mut self,
        input: &[f32],
        output: &mut [f32],
        sink: &mut impl DiagnosticSink,
    ) -> bool {
        self.callbacks += 1;

        match self.state {
            ProcessorState::Running => {}
            ProcessorState::Stopped => {
                bypass(input, output);
                return false;
            }
            _ => {
                bypass(input, output);
                return true;
            }
        }

        if let Err(error) = self.run(input, output, sink) {
            self.fail(error, sink);
            bypass(input, output);
        }

        true
    }

    fn run(
        &mut self,
        input: &[f32],
        output: &mut [f32],
        sink: &mut impl DiagnosticSink,
    ) -> ConfigResult<()> {
        let Some(res) = self.resources.as_mut() else {
            bypass(input, output);
            return Ok(());
        };

        let frame_size = self.module.frame_size();

        if input.is_empty() {
            sink.emit(Diagnostic::EmptyPush {
                buffer: BufferKind::Input,
            });
        }
        let before = res.input.stats();
        res.input.push(input)?;
        report_overflow(before, res.input.stats(), BufferKind::Input, sink);

        while res.input.available_frames() >= frame_size {
            let frame = self
                .module
                .memory_mut()
                .slice_mut(res.input_region.byte_offset(), frame_size)?;
            res.input.pull(frame);

            self.vad = self.module.process_frame(
                res.handle,
                res.output_region.byte_offset(),
                res.input_region.byte_offset(),
            )?;

            let processed = self
                .module
                .memory()
                .slice(res.output_region.byte_offset(), frame_size)?;
            let before = res.output.stats();
            // Capacity is validated to exceed one frame.
            res.output.push(processed).ok();
            report_overflow(before, res.output.stats(), BufferKind::Output, sink);

            self.frames_processed += 1;
        }

        if self.warmup_remaining > 0 {
            self.warmup_remaining -= 1;
            output.fill(0.0);
        } else if res.output.pull(output) == 0 && !output.is_empty() {
            output.fill(0.0);
            sink.emit(Diagnostic::Underflow {
                buffer: BufferKind::Output,
            });
        }

        Ok(())
    }

    /// Latch into passthrough after an engine error or a host quantum the
    /// ring cannot hold.
    fn fail(&mut self, error: ConfigurationError, sink: &mut impl DiagnosticSink) {
        if let Some(res) = self.resources.as_mut() {
            res.input.clear();
            res.output.clear();
        }
        self.state = ProcessorState::Bypassed;
        sink.emit(match error {
            ConfigurationError::Engine(error) => Diagnostic::EngineFailure { error },
            error => Diagnostic::Misconfigured { error },
        });
        sink.emit(Diagnostic::StateChanged {
            state: ProcessorState::Bypassed,
        });
    }

    fn release(&mut self) {
        if let Some(res) = self.resources.take() {
            self.module.destroy(res.handle);
            let memory = self.module.memory_mut();
            memory.free(res.input_region).ok();
            memory.free(res.output_region).ok();
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Queries
    // ───────────────────────────────────────────────────────────────

    #[inline]
    pub fn state(&self) -> ProcessorState {
        self.state
    }

    #[inline]
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn module(&self) -> &M {
        &self.module
    }

    pub fn callbacks(&self) -> u64 {
        self.callbacks
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Voice activity probability of the last processed frame.
    pub fn vad(&self) -> f32 {
        self.vad
    }

    /// Samples waiting in the (input, output) rings.
    pub fn buffered(&self) -> Option<(usize, usize)> {
        self.resources
            .as_ref()
            .map(|r| (r.input.available_frames(), r.output.available_frames()))
    }

    /// Counters of the (input, output) rings.
    pub fn buffer_stats(&self) -> Option<(BufferStats, BufferStats)> {
        self.resources
            .as_ref()
            .map(|r| (r.input.stats(), r.output.stats()))
    }
}

impl<M: SuppressionModule> AudioCallback for FrameProcessor<M> {
    fn process(&mut self, input: &[f32], output: &mut [f32]) -> bool {
        self.process_quantum(input, output, &mut ())
    }
}

impl<M: SuppressionModule> Drop for FrameProcessor<M> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Copy input to output, zero-filling any excess output.
#[inline]
fn bypass(input: &[f32], output: &mut [f32]) {
    let n = input.len().min(output.len());
    output[..n].copy_from_slice(&input[..n]);
    output[n..].fill(0.0);
}

#[inline]
fn report_overflow(
    before: BufferStats,
    after: BufferStats,
    buffer: BufferKind,
    sink: &mut impl DiagnosticSink,
) {
    if after.overflows > before.overflows {
        sink.emit(Diagnostic::Overflow {
            buffer,
            evicted: after.evicted - before.evicted,
        });
    }
}
