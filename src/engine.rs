// src/engine.rs
//
// Boundary to the noise-suppression engine.
//
// An engine is an opaque module with its own linear memory. Callers create
// instances, hand frames to it by byte offset, and destroy the instances
// when done. All filter state lives inside the instance.

use crate::error::EngineResult;
use crate::memory::LinearMemory;

/// Opaque identifier for one engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineHandle(pub(crate) u32);

impl EngineHandle {
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// A frame-based suppression module.
///
/// `process_frame` runs on the audio thread and must not allocate,
/// block, or log.
pub trait SuppressionModule: Send {
    /// Samples per frame the module requires.
    fn frame_size(&self) -> usize;

    fn memory(&self) -> &LinearMemory;

    fn memory_mut(&mut self) -> &mut LinearMemory;

    /// Create a new instance with fresh filter state.
    fn create(&mut self) -> EngineResult<EngineHandle>;

    /// Destroy an instance. Unknown handles are ignored.
    fn destroy(&mut self, handle: EngineHandle);

    /// Denoise one frame from `input_offset` into `output_offset`.
    ///
    /// Both offsets are byte offsets into [`memory`](Self::memory) and each
    /// covers `frame_size()` samples. Returns the voice activity probability
    /// for the frame in `[0, 1]`.
    fn process_frame(
        &mut self,
        handle: EngineHandle,
        output_offset: u32,
        input_offset: u32,
    ) -> EngineResult<f32>;

    fn name(&self) -> &str {
        ""
    }
}

impl<T: SuppressionModule + ?Sized> SuppressionModule for Box<T> {
    fn frame_size(&self) -> usize {
        (**self).frame_size()
    }

    fn memory(&self) -> &LinearMemory {
        (**self).memory()
    }

    fn memory_mut(&mut self) -> &mut LinearMemory {
        (**self).memory_mut()
    }

    fn create(&mut self) -> EngineResult<EngineHandle> {
        (**self).create()
    }

    fn destroy(&mut self, handle: EngineHandle) {
        (**self).destroy(handle)
    }

    fn process_frame(
        &mut self,
        handle: EngineHandle,
        output_offset: u32,
        input_offset: u32,
    ) -> EngineResult<f32> {
        (**self).process_frame(handle, output_offset, input_offset)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
