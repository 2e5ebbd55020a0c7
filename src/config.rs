// src/config.rs
//
// Processor sizing and its consistency checks.

use crate::error::{ConfigResult, ConfigurationError};

pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;
/// Web Audio render quantum.
pub const DEFAULT_QUANTUM_SIZE: usize = 128;
/// RNNoise frame (10ms at 48kHz).
pub const DEFAULT_FRAME_SIZE: usize = 480;
/// Extra frames of ring capacity to absorb scheduling jitter.
pub const DEFAULT_JITTER_FRAMES: usize = 3;
/// Upper bound on `jitter_frames` (about a third of a second of RNNoise audio).
pub const MAX_JITTER_FRAMES: usize = 32;

/// Sizing for a [`FrameProcessor`](crate::frame_processor::FrameProcessor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Sample rate in Hz. Informational; no resampling is done.
    pub sample_rate: u32,
    /// Samples per host callback.
    pub quantum_size: usize,
    /// Samples per engine frame.
    pub frame_size: usize,
    /// Ring capacity beyond one frame, in frames.
    pub jitter_frames: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            quantum_size: DEFAULT_QUANTUM_SIZE,
            frame_size: DEFAULT_FRAME_SIZE,
            jitter_frames: DEFAULT_JITTER_FRAMES,
        }
    }
}

impl ProcessorConfig {
    pub fn new(quantum_size: usize, frame_size: usize) -> Self {
        Self {
            quantum_size,
            frame_size,
            ..Self::default()
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_jitter_frames(mut self, jitter_frames: usize) -> Self {
        self.jitter_frames = jitter_frames;
        self
    }

    /// Capacity of each ring buffer, in samples.
    pub fn ring_capacity(&self) -> usize {
        self.frame_size
            .saturating_mul(self.jitter_frames.saturating_add(1))
    }

    /// Callbacks of silence delivered after start before output begins.
    ///
    /// Output produced by the engine lags input by up to
    /// `frame_size - gcd(frame_size, quantum_size)` samples. Delaying the
    /// first pull by that much, rounded up to whole quanta, means every
    /// later pull finds a full quantum waiting.
    ///
    /// Zero when either size is zero; such a config fails [`validate`](Self::validate).
    pub fn warmup_quanta(&self) -> usize {
        if self.frame_size == 0 || self.quantum_size == 0 {
            return 0;
        }
        let lag = self.frame_size - gcd(self.frame_size, self.quantum_size);
        lag.div_ceil(self.quantum_size)
    }

    /// Fixed input-to-output delay in samples once output has started.
    pub fn latency_samples(&self) -> usize {
        self.warmup_quanta() * self.quantum_size
    }

    /// Check the sizes against each other and against the engine's frame.
    pub fn validate(&self, engine_frame_size: usize) -> ConfigResult<()> {
        if self.sample_rate == 0 {
            return Err(ConfigurationError::ZeroSize {
                what: "sample rate",
            });
        }
        if self.quantum_size == 0 {
            return Err(ConfigurationError::ZeroSize {
                what: "quantum size",
            });
        }
        if self.frame_size == 0 {
            return Err(ConfigurationError::ZeroSize { what: "frame size" });
        }

        if self.frame_size != engine_frame_size {
            return Err(ConfigurationError::FrameSizeMismatch {
                configured: self.frame_size,
                engine: engine_frame_size,
            });
        }

        if self.jitter_frames > MAX_JITTER_FRAMES {
            return Err(ConfigurationError::JitterTooLarge {
                jitter_frames: self.jitter_frames,
                max: MAX_JITTER_FRAMES,
            });
        }

        // Input must hold a partial frame plus one more quantum; output must
        // hold the warm-up backlog plus one quantum.
        let required = self
            .frame_size
            .saturating_add(self.quantum_size)
            .max((self.warmup_quanta() + 1).saturating_mul(self.quantum_size));
        let capacity = self.ring_capacity();
        if capacity < required {
            return Err(ConfigurationError::CapacityTooSmall { capacity, required });
        }

        Ok(())
    }
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_web_audio_rnnoise() {
        let config = ProcessorConfig::default();
        assert_eq!(config.ring_capacity(), 1920);
        assert_eq!(config.warmup_quanta(), 4);
        assert_eq!(config.latency_samples(), 512);
        assert!(config.validate(480).is_ok());
    }

    #[test]
    fn test_warmup_for_aligned_sizes() {
        assert_eq!(ProcessorConfig::new(128, 128).warmup_quanta(), 0);
        assert_eq!(ProcessorConfig::new(128, 512).warmup_quanta(), 3);
        assert_eq!(ProcessorConfig::new(128, 64).warmup_quanta(), 0);
        assert_eq!(ProcessorConfig::new(256, 480).warmup_quanta(), 2);
    }

    #[test]
    fn test_rejects_zero_sizes() {
        let config = ProcessorConfig::new(0, 480);
        assert_eq!(
            config.validate(480),
            Err(ConfigurationError::ZeroSize {
                what: "quantum size"
            })
        );
        assert!(ProcessorConfig::default()
            .with_sample_rate(0)
            .validate(480)
            .is_err());
    }

    #[test]
    fn test_unvalidated_zero_sizes_have_no_latency() {
        assert_eq!(ProcessorConfig::new(0, 480).warmup_quanta(), 0);
        assert_eq!(ProcessorConfig::new(128, 0).latency_samples(), 0);
        assert_eq!(ProcessorConfig::new(0, 0).latency_samples(), 0);
    }

    #[test]
    fn test_rejects_huge_jitter() {
        let config = ProcessorConfig::default().with_jitter_frames(u32::MAX as usize);
        assert_eq!(
            config.validate(480),
            Err(ConfigurationError::JitterTooLarge {
                jitter_frames: u32::MAX as usize,
                max: MAX_JITTER_FRAMES
            })
        );
        assert!(ProcessorConfig::default()
            .with_jitter_frames(MAX_JITTER_FRAMES)
            .validate(480)
            .is_ok());
    }

    #[test]
    fn test_rejects_frame_mismatch() {
        assert_eq!(
            ProcessorConfig::default().validate(512),
            Err(ConfigurationError::FrameSizeMismatch {
                configured: 480,
                engine: 512
            })
        );
    }

    #[test]
    fn test_rejects_small_capacity() {
        let config = ProcessorConfig::default().with_jitter_frames(0);
        assert_eq!(
            config.validate(480),
            Err(ConfigurationError::CapacityTooSmall {
                capacity: 480,
                required: 640
            })
        );
    }
}
