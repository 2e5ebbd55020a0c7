// src/modules/rnnoise.rs
//
// RNNoise suppression via the nnnoiseless crate (pure Rust).

use nnnoiseless::DenoiseState;

use crate::engine::{EngineHandle, SuppressionModule};
use crate::error::{EngineError, EngineResult};
use crate::memory::LinearMemory;

use super::ARENA_FRAMES;

/// RNNoise works on the i16 range, hosts deliver [-1, 1].
const PCM_SCALE: f32 = 32_767.0;

/// RNNoise module: 480-sample frames (10ms at 48kHz).
pub struct RnnoiseModule {
    memory: LinearMemory,
    instances: Vec<Option<Box<DenoiseState<'static>>>>,
    /// Scaled copy of the input frame.
    scratch: Box<[f32]>,
}

impl RnnoiseModule {
    pub const FRAME_SIZE: usize = DenoiseState::<'static>::FRAME_SIZE;

    pub fn new() -> Self {
        Self {
            memory: LinearMemory::new(Self::FRAME_SIZE * ARENA_FRAMES),
            instances: Vec::new(),
            scratch: vec![0.0; Self::FRAME_SIZE].into_boxed_slice(),
        }
    }
}

impl Default for RnnoiseModule {
    fn default() -> Self {
        Self::new()
    }
}

impl SuppressionModule for RnnoiseModule {
    fn frame_size(&self) -> usize {
        Self::FRAME_SIZE
    }

    fn memory(&self) -> &LinearMemory {
        &self.memory
    }

    fn memory_mut(&mut self) -> &mut LinearMemory {
        &mut self.memory
    }

    fn create(&mut self) -> EngineResult<EngineHandle> {
        let state = DenoiseState::new();
        let id = match self.instances.iter().position(Option::is_none) {
            Some(free) => {
                self.instances[free] = Some(state);
                free
            }
            None => {
                self.instances.push(Some(state));
                self.instances.len() - 1
            }
        };
        Ok(EngineHandle(id as u32))
    }

    fn destroy(&mut self, handle: EngineHandle) {
        if let Some(slot) = self.instances.get_mut(handle.0 as usize) {
            *slot = None;
        }
    }

    fn process_frame(
        &mut self,
        handle: EngineHandle,
        output_offset: u32,
        input_offset: u32,
    ) -> EngineResult<f32> {
        let state = self
            .instances
            .get_mut(handle.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(EngineError::InvalidHandle(handle.0))?;

        let (output, input) = self
            .memory
            .split_io(output_offset, input_offset, Self::FRAME_SIZE)?;

        for (dst, src) in self.scratch.iter_mut().zip(input) {
            *dst = src * PCM_SCALE;
        }

        let vad = state.process_frame(output, &self.scratch);

        for sample in output.iter_mut() {
            *sample /= PCM_SCALE;
        }

        Ok(vad)
    }

    fn name(&self) -> &str {
        "rnnoise"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_size_is_10ms_at_48k() {
        assert_eq!(RnnoiseModule::FRAME_SIZE, 480);
        assert_eq!(RnnoiseModule::new().frame_size(), 480);
    }

    #[test]
    fn test_process_silence() {
        let mut module = RnnoiseModule::new();
        let handle = module.create().unwrap();
        let out = module.memory_mut().alloc(480).unwrap();
        let inp = module.memory_mut().alloc(480).unwrap();

        let vad = module
            .process_frame(handle, out.byte_offset(), inp.byte_offset())
            .unwrap();

        assert!((0.0..=1.0).contains(&vad));
        let output = module.memory().slice(out.byte_offset(), 480).unwrap();
        assert!(output.iter().all(|s| s.is_finite() && s.abs() <= 1.0));
    }

    #[test]
    fn test_unknown_handle() {
        let mut module = RnnoiseModule::new();
        assert_eq!(
            module.process_frame(EngineHandle(3), 0, 1920),
            Err(EngineError::InvalidHandle(3))
        );
    }
}
