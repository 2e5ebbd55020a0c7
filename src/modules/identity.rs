// src/modules/identity.rs

use crate::engine::{EngineHandle, SuppressionModule};
use crate::error::{EngineError, EngineResult};
use crate::memory::LinearMemory;

use super::ARENA_FRAMES;

/// Module that copies each frame through unchanged.
///
/// Reports full voice activity for any frame with a non-zero sample.
/// Used as a deterministic stand-in for a real denoiser.
pub struct IdentityModule {
    frame_size: usize,
    memory: LinearMemory,
    instances: Vec<bool>,
}

impl IdentityModule {
    pub fn new(frame_size: usize) -> Self {
        Self::with_memory(frame_size, frame_size * ARENA_FRAMES)
    }

    /// Create with an explicit arena size, in samples.
    pub fn with_memory(frame_size: usize, memory_samples: usize) -> Self {
        Self {
            frame_size,
            memory: LinearMemory::new(memory_samples),
            instances: Vec::new(),
        }
    }

    /// Number of live instances.
    pub fn live_instances(&self) -> usize {
        self.instances.iter().filter(|live| **live).count()
    }
}

impl SuppressionModule for IdentityModule {
    fn frame_size(&self) -> usize {
        self.frame_size
    }

    fn memory(&self) -> &LinearMemory {
        &self.memory
    }

    fn memory_mut(&mut self) -> &mut LinearMemory {
        &mut self.memory
    }

    fn create(&mut self) -> EngineResult<EngineHandle> {
        let id = match self.instances.iter().position(|live| !live) {
            Some(free) => {
                self.instances[free] = true;
                free
            }
            None => {
                self.instances.push(true);
                self.instances.len() - 1
            }
        };
        Ok(EngineHandle(id as u32))
    }

    fn destroy(&mut self, handle: EngineHandle) {
        if let Some(live) = self.instances.get_mut(handle.0 as usize) {
            *live = false;
        }
    }

    fn process_frame(
        &mut self,
        handle: EngineHandle,
        output_offset: u32,
        input_offset: u32,
    ) -> EngineResult<f32> {
        if !self.instances.get(handle.0 as usize).copied().unwrap_or(false) {
            return Err(EngineError::InvalidHandle(handle.0));
        }

        let (output, input) = self
            .memory
            .split_io(output_offset, input_offset, self.frame_size)?;
        output.copy_from_slice(input);

        let voiced = input.iter().any(|s| *s != 0.0);
        Ok(if voiced { 1.0 } else { 0.0 })
    }

    fn name(&self) -> &str {
        "identity"
    }
}
