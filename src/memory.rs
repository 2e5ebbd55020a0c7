// src/memory.rs
//
// Linear memory arena shared between a frame processor and its
// suppression module.
//
// Modules address memory by byte offset, the way a compiled DSP module
// addresses its heap. The processor allocates its two frame regions once
// at startup and frees them once at shutdown; nothing on the audio thread
// allocates.

use crate::error::{ConfigResult, ConfigurationError, EngineError, EngineResult};

/// Size of one sample in linear memory.
pub const SAMPLE_BYTES: u32 = std::mem::size_of::<f32>() as u32;

/// A block of samples inside [`LinearMemory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    byte_offset: u32,
    len: usize,
}

impl Region {
    /// Offset of the first sample, in bytes.
    #[inline]
    pub fn byte_offset(&self) -> u32 {
        self.byte_offset
    }

    /// Length in samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn start(&self) -> usize {
        (self.byte_offset / SAMPLE_BYTES) as usize
    }

    #[inline]
    fn end(&self) -> usize {
        self.start() + self.len
    }
}

/// Fixed-size arena of `f32` samples with first-fit allocation.
#[derive(Debug)]
pub struct LinearMemory {
    words: Box<[f32]>,
    /// Live allocations, sorted by offset.
    allocated: Vec<Region>,
}

impl LinearMemory {
    /// Create an arena holding `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            words: vec![0.0; capacity].into_boxed_slice(),
            allocated: Vec::new(),
        }
    }

    /// Total size in samples.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.words.len()
    }

    /// Samples not covered by any live allocation.
    pub fn free_samples(&self) -> usize {
        self.capacity() - self.allocated.iter().map(Region::len).sum::<usize>()
    }

    /// Number of live allocations.
    pub fn live_regions(&self) -> usize {
        self.allocated.len()
    }

    /// Reserve `len` zeroed samples.
    pub fn alloc(&mut self, len: usize) -> ConfigResult<Region> {
        if len == 0 {
            return Err(ConfigurationError::ZeroSize {
                what: "memory region",
            });
        }

        let mut cursor = 0;
        let mut slot = self.allocated.len();
        for (i, region) in self.allocated.iter().enumerate() {
            if region.start() - cursor >= len {
                slot = i;
                break;
            }
            cursor = region.end();
        }

        if slot == self.allocated.len() && self.capacity() - cursor < len {
            return Err(ConfigurationError::OutOfMemory {
                requested: len,
                free: self.free_samples(),
            });
        }

        let region = Region {
            byte_offset: cursor as u32 * SAMPLE_BYTES,
            len,
        };
        self.words[cursor..cursor + len].fill(0.0);
        self.allocated.insert(slot, region);
        Ok(region)
    }

    /// Release a region previously returned by [`alloc`](Self::alloc).
    pub fn free(&mut self, region: Region) -> EngineResult<()> {
        match self.allocated.iter().position(|r| *r == region) {
            Some(i) => {
                self.allocated.remove(i);
                Ok(())
            }
            None => Err(invalid(region.byte_offset, region.len)),
        }
    }

    /// Borrow `len` samples starting at `byte_offset`.
    pub fn slice(&self, byte_offset: u32, len: usize) -> EngineResult<&[f32]> {
        let range = self.range(byte_offset, len)?;
        Ok(&self.words[range])
    }

    /// Mutably borrow `len` samples starting at `byte_offset`.
    pub fn slice_mut(&mut self, byte_offset: u32, len: usize) -> EngineResult<&mut [f32]> {
        let range = self.range(byte_offset, len)?;
        Ok(&mut self.words[range])
    }

    /// Borrow a disjoint output/input pair of `len` samples each.
    pub fn split_io(
        &mut self,
        output: u32,
        input: u32,
        len: usize,
    ) -> EngineResult<(&mut [f32], &[f32])> {
        let out = self.range(output, len)?;
        let inp = self.range(input, len)?;

        if out.start < inp.end && inp.start < out.end {
            return Err(invalid(output, len));
        }

        if out.start < inp.start {
            let (head, tail) = self.words.split_at_mut(inp.start);
            Ok((&mut head[out], &tail[..len]))
        } else {
            let (head, tail) = self.words.split_at_mut(out.start);
            Ok((&mut tail[..len], &head[inp]))
        }
    }

    fn range(&self, byte_offset: u32, len: usize) -> EngineResult<std::ops::Range<usize>> {
        if byte_offset % SAMPLE_BYTES != 0 {
            return Err(invalid(byte_offset, len));
        }

        let start = (byte_offset / SAMPLE_BYTES) as usize;
        match start.checked_add(len) {
            Some(end) if end <= self.capacity() => Ok(start..end),
            _ => Err(invalid(byte_offset, len)),
        }
    }
}

fn invalid(offset: u32, len: usize) -> EngineError {
    EngineError::InvalidRegion { offset, len }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_is_contiguous_and_byte_addressed() {
        let mut mem = LinearMemory::new(1024);
        let a = mem.alloc(480).unwrap();
        let b = mem.alloc(480).unwrap();

        assert_eq!(a.byte_offset(), 0);
        assert_eq!(b.byte_offset(), 480 * SAMPLE_BYTES);
        assert_eq!(mem.free_samples(), 64);
        assert_eq!(mem.live_regions(), 2);
    }

    #[test]
    fn test_out_of_memory() {
        let mut mem = LinearMemory::new(100);
        mem.alloc(60).unwrap();
        assert_eq!(
            mem.alloc(60).unwrap_err(),
            ConfigurationError::OutOfMemory {
                requested: 60,
                free: 40
            }
        );
    }

    #[test]
    fn test_free_reuses_gap() {
        let mut mem = LinearMemory::new(30);
        let a = mem.alloc(10).unwrap();
        let _b = mem.alloc(10).unwrap();
        mem.free(a).unwrap();

        let c = mem.alloc(8).unwrap();
        assert_eq!(c.byte_offset(), 0);
        assert_eq!(mem.free_samples(), 12);
    }

    #[test]
    fn test_double_free_rejected() {
        let mut mem = LinearMemory::new(16);
        let a = mem.alloc(4).unwrap();
        mem.free(a).unwrap();
        assert!(mem.free(a).is_err());
    }

    #[test]
    fn test_split_io_disjoint() {
        let mut mem = LinearMemory::new(8);
        let out = mem.alloc(4).unwrap();
        let inp = mem.alloc(4).unwrap();
        mem.slice_mut(inp.byte_offset(), 4)
            .unwrap()
            .copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);

        let (o, i) = mem.split_io(out.byte_offset(), inp.byte_offset(), 4).unwrap();
        o.copy_from_slice(i);
        assert_eq!(mem.slice(out.byte_offset(), 4).unwrap(), &[1.0, 2.0, 3.0, 4.0]);

        // Order of the two regions does not matter.
        let (o, i) = mem.split_io(inp.byte_offset(), out.byte_offset(), 4).unwrap();
        assert_eq!(o.len(), 4);
        assert_eq!(i, &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_split_io_rejects_overlap_and_misalignment() {
        let mut mem = LinearMemory::new(8);
        assert!(mem.split_io(0, 2 * SAMPLE_BYTES, 4).is_err());
        assert!(mem.split_io(1, 4 * SAMPLE_BYTES, 4).is_err());
        assert!(mem.slice(6 * SAMPLE_BYTES, 4).is_err());
    }
}
