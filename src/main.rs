// src/main.rs
//
// Offline sanity run: a noisy tone through the default suppressor, driven
// quantum by quantum the way an audio host would.

use denoise_worklet::{
    AudioCallback, Command, DEFAULT_QUANTUM_SIZE, FrameProcessor, ProcessorConfig,
    SuppressionModule, create_bridge, create_default_module,
};

fn main() {
    let seconds = 2;

    // --------------------------------
    // Processor + bridge
    // --------------------------------

    let module = create_default_module();
    let config = ProcessorConfig::new(DEFAULT_QUANTUM_SIZE, module.frame_size());

    let processor = match FrameProcessor::started(config, module) {
        Ok(processor) => processor,
        Err(e) => {
            eprintln!("Failed to start processor: {e}");
            std::process::exit(1);
        }
    };
    let (control, mut audio) = create_bridge(processor);

    // --------------------------------
    // Input: 440 Hz tone plus white noise
    // --------------------------------

    let sample_rate = config.sample_rate as f32;
    let total = config.sample_rate as usize * seconds;
    let mut seed: u32 = 0x1234_5678;
    let signal: Vec<f32> = (0..total)
        .map(|n| {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let noise = (seed >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0;
            let tone = (std::f32::consts::TAU * 440.0 * n as f32 / sample_rate).sin();
            0.3 * tone + 0.05 * noise
        })
        .collect();

    // --------------------------------
    // Run, pausing for a quarter second in the middle
    // --------------------------------

    println!(
        "Running {seconds}s through {} quanta of {} samples (latency {} samples)…",
        total / config.quantum_size,
        config.quantum_size,
        config.latency_samples()
    );

    let quanta = total / config.quantum_size;
    let pause_at = quanta / 2;
    let resume_at = pause_at + quanta / 8;

    let mut output = vec![0.0; config.quantum_size];
    let mut energy_in = 0.0f64;
    let mut energy_out = 0.0f64;

    for (index, input) in signal.chunks_exact(config.quantum_size).enumerate() {
        if index == pause_at {
            control.send(Command::Pause);
        } else if index == resume_at {
            control.send(Command::Resume);
        }

        if !audio.process(input, &mut output) {
            break;
        }

        energy_in += input.iter().map(|s| (*s as f64).powi(2)).sum::<f64>();
        energy_out += output.iter().map(|s| (*s as f64).powi(2)).sum::<f64>();

        if index % 100 == 0 {
            let rb = control.readback();
            println!(
                "--- quantum {index}: {} | frames {} | vad {:.2}",
                rb.state.as_str(),
                rb.frames_processed,
                rb.vad
            );
        }
    }

    control.stop();
    audio.process(&signal[..config.quantum_size], &mut output);

    for diagnostic in control.poll_diagnostics() {
        println!("{}", diagnostic.to_json());
    }

    let rb = control.readback();
    println!(
        "Done: {} callbacks, {} frames, {} overflows, {} underflows, energy out/in {:.3}",
        rb.callbacks,
        rb.frames_processed,
        rb.overflows,
        rb.underflows,
        energy_out / energy_in.max(f64::EPSILON)
    );
}
