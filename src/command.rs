// src/command.rs
//
// Messages crossing the control boundary.
//
// Commands flow from the control thread to the audio thread. Diagnostics
// flow back and carry no control semantics.

use std::fmt::Display;

use log::Level;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{ConfigurationError, EngineError};

/// A control command, wire shape `{ "cmd": "stop" | "pause" | "resume" }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "lowercase")]
pub enum Command {
    /// Release the engine and stop for good.
    Stop,
    /// Bypass processing, keep buffered samples.
    Pause,
    /// Continue processing from the buffered samples.
    Resume,
}

impl Command {
    /// Parse a JSON control message.
    pub fn from_json(message: &str) -> serde_json::Result<Self> {
        serde_json::from_str(message)
    }
}

/// Lifecycle of a frame processor.
///
/// `Created -> Running <-> Paused -> Stopped`. `Bypassed` is entered
/// from `Running` when the engine fails and behaves like a permanent pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ProcessorState {
    Created = 0,
    Running = 1,
    Paused = 2,
    Bypassed = 3,
    Stopped = 4,
}

impl ProcessorState {
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessorState::Created => "created",
            ProcessorState::Running => "running",
            ProcessorState::Paused => "paused",
            ProcessorState::Bypassed => "bypassed",
            ProcessorState::Stopped => "stopped",
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => ProcessorState::Running,
            2 => ProcessorState::Paused,
            3 => ProcessorState::Bypassed,
            4 => ProcessorState::Stopped,
            _ => ProcessorState::Created,
        }
    }

    /// Whether frames are being sent through the engine.
    #[inline]
    pub fn is_running(self) -> bool {
        self == ProcessorState::Running
    }
}

/// Which of the processor's two ring buffers an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferKind {
    Input,
    Output,
}

/// Observability event emitted by the audio thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Diagnostic {
    Started {
        quantum_size: usize,
        frame_size: usize,
        latency_samples: usize,
    },
    StateChanged {
        state: ProcessorState,
    },
    /// Old samples were evicted to make room.
    Overflow {
        buffer: BufferKind,
        evicted: u64,
    },
    /// A pull found too few samples and read nothing.
    Underflow {
        buffer: BufferKind,
    },
    /// A push carried no samples.
    EmptyPush {
        buffer: BufferKind,
    },
    /// The engine failed; the processor now passes audio through.
    EngineFailure {
        #[serde(serialize_with = "display")]
        error: EngineError,
    },
    /// The processor hit a setup-level error while running (a host quantum
    /// larger than the ring) and now passes audio through.
    Misconfigured {
        #[serde(serialize_with = "display")]
        error: ConfigurationError,
    },
}

impl Diagnostic {
    /// Encode for a message port.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Log through the `log` facade. Never call this on the audio thread.
    pub fn log(&self) {
        if let Some((level, message)) = self.log_record() {
            log::log!(level, "{message}");
        }
    }

    /// Level and message for [`log`](Self::log). `Started` is already logged
    /// by [`FrameProcessor::start`](crate::frame_processor::FrameProcessor::start).
    fn log_record(&self) -> Option<(Level, String)> {
        let record = match self {
            Diagnostic::Started { .. } => return None,
            Diagnostic::StateChanged { state } => {
                (Level::Debug, format!("frame processor {}", state.as_str()))
            }
            Diagnostic::Overflow { buffer, evicted } => (
                Level::Warn,
                format!("{buffer:?} ring buffer overflow: evicted {evicted} samples"),
            ),
            Diagnostic::Underflow { buffer } => {
                (Level::Warn, format!("{buffer:?} ring buffer underflow"))
            }
            Diagnostic::EmptyPush { buffer } => (
                Level::Debug,
                format!("{buffer:?} ring buffer received an empty push"),
            ),
            Diagnostic::EngineFailure { error } => (
                Level::Error,
                format!("suppression engine failed, passing audio through: {error}"),
            ),
            Diagnostic::Misconfigured { error } => (
                Level::Error,
                format!("frame processor misconfigured, passing audio through: {error}"),
            ),
        };
        Some(record)
    }
}

/// Receiver for diagnostics raised while processing.
///
/// Implementations used on the audio thread must not block or allocate.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic);
}

/// Discards everything.
impl DiagnosticSink for () {
    fn emit(&mut self, _diagnostic: Diagnostic) {}
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

fn display<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Snapshot of the audio thread's state for the UI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readback {
    pub state: ProcessorState,
    /// Host callbacks handled.
    pub callbacks: u64,
    /// Engine frames processed.
    pub frames_processed: u64,
    pub overflows: u64,
    pub underflows: u64,
    /// Voice activity probability of the last processed frame.
    pub vad: f32,
}
