// src/callback.rs
//
// Host audio boundary.

/// A periodic real-time audio callback.
///
/// The host calls `process` once per quantum with equally sized mono
/// input and output blocks. Returning `false` asks the host to stop calling.
pub trait AudioCallback {
    fn process(&mut self, input: &[f32], output: &mut [f32]) -> bool;
}

impl<T: AudioCallback + ?Sized> AudioCallback for Box<T> {
    fn process(&mut self, input: &[f32], output: &mut [f32]) -> bool {
        (**self).process(input, output)
    }
}

/// Drive a callback over a whole signal, one quantum at a time.
///
/// Stands in for a live host: a trailing partial quantum is zero-padded and
/// rendering ends early if the callback deregisters. Returns everything the
/// callback produced.
pub fn render_offline<C: AudioCallback + ?Sized>(
    callback: &mut C,
    signal: &[f32],
    quantum_size: usize,
) -> Vec<f32> {
    let mut rendered = Vec::with_capacity(signal.len());
    if quantum_size == 0 {
        return rendered;
    }

    let mut input = vec![0.0; quantum_size];
    let mut output = vec![0.0; quantum_size];

    for chunk in signal.chunks(quantum_size) {
        input[..chunk.len()].copy_from_slice(chunk);
        input[chunk.len()..].fill(0.0);

        let keep_going = callback.process(&input, &mut output);
        rendered.extend_from_slice(&output);

        if !keep_going {
            break;
        }
    }

    rendered
}
