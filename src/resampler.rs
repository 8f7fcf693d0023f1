use alloc::{boxed::Box, sync::Arc, vec};

use crate::{
    ResamplingMode, SrcError, interpolate, lanczos::LanczosResampler, table::LanczosTable,
};

fn valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

/// Up/down resampler pair for the windowed-sinc mode, one instance per
/// direction.
struct LanczosPair {
    up: LanczosResampler,
    down: LanczosResampler,
}

/// Dual-direction sample-rate conversion orchestrator.
///
/// Converts each incoming stereo block from the external input rate to a
/// fixed internal rendering rate, hands the converted block to a caller
/// supplied processing function, then converts the result back to the
/// external rate. The returned block always has the same frame count as the
/// input block.
///
/// All buffers are sized in [`reset`](Self::reset); per-block processing
/// performs no allocation.
pub struct NonIntegerResampler {
    rendering_rate: f64,
    input_rate: f64,
    block_size: usize,
    up_ratio: f64,
    down_ratio: f64,
    mode: ResamplingMode,
    table: Arc<LanczosTable>,
    /// Both scratch channels back to back, `scratch_capacity` samples each.
    /// Holds the block at the rendering rate between the two conversion
    /// stages and is never exposed outside a single `process_block` call.
    scratch: Box<[f32]>,
    scratch_capacity: usize,
    lanczos: Option<LanczosPair>,
    ready: bool,
}

impl NonIntegerResampler {
    /// Create a new [`NonIntegerResampler`] with a fixed internal rendering
    /// rate. [`reset`](Self::reset) must be called before the first block.
    pub fn new(rendering_rate: f64, mode: ResamplingMode) -> Result<Self, SrcError> {
        if !valid_rate(rendering_rate) {
            return Err(SrcError::InvalidSampleRate);
        }

        Ok(NonIntegerResampler {
            rendering_rate,
            input_rate: 0.0,
            block_size: 0,
            up_ratio: 0.0,
            down_ratio: 0.0,
            mode,
            table: LanczosTable::shared(),
            scratch: Box::new([]),
            scratch_capacity: 0,
            lanczos: None,
            ready: false,
        })
    }

    pub fn resampling_mode(&self) -> ResamplingMode {
        self.mode
    }

    pub fn rendering_rate(&self) -> f64 {
        self.rendering_rate
    }

    /// Switch the conversion algorithm. Once configured this performs a full
    /// [`reset`](Self::reset): buffers are cleared, phases zeroed and the
    /// Lanczos pair reconstructed.
    pub fn set_resampling_mode(&mut self, mode: ResamplingMode) -> Result<(), SrcError> {
        self.mode = mode;
        match self.ready {
            true => self.reset(self.input_rate, self.block_size),
            false => Ok(()),
        }
    }

    /// Configure for a new external sample rate and maximum block size,
    /// clearing all conversion state.
    pub fn reset(&mut self, input_rate: f64, block_size: usize) -> Result<(), SrcError> {
        if !valid_rate(input_rate) {
            return Err(SrcError::InvalidSampleRate);
        }
        if block_size == 0 {
            return Err(SrcError::InvalidBlockSize);
        }

        self.input_rate = input_rate;
        self.block_size = block_size;
        self.up_ratio = input_rate / self.rendering_rate;
        self.down_ratio = self.rendering_rate / input_rate;

        // Worst-case upsampled block length per channel; covers rendering
        // rates up to twice the input rate.
        self.scratch_capacity = block_size * 2;
        self.scratch = vec![0.0; self.scratch_capacity * 2].into_boxed_slice();

        self.lanczos = None;
        if self.mode == ResamplingMode::Lanczos {
            let mut up = LanczosResampler::new(
                Arc::clone(&self.table),
                input_rate,
                self.rendering_rate,
            )?;
            let down = LanczosResampler::new(
                Arc::clone(&self.table),
                self.rendering_rate,
                input_rate,
            )?;

            // Pre-feed the upsampler with silence so its history window is
            // full before the first real block.
            let warmup = up.inputs_required_to_generate_outputs(1) * 2;
            for _ in 0..warmup {
                up.push(0.0, 0.0);
            }

            self.lanczos = Some(LanczosPair { up, down });
        }

        self.ready = true;
        Ok(())
    }

    /// Resample one block: upsample `inputs` to the rendering rate, run
    /// `process` on the converted data in place, downsample back into
    /// `outputs`.
    ///
    /// All four slices must have the same length, at most the block size
    /// given to [`reset`](Self::reset). `process` receives the left and
    /// right scratch slices trimmed to the exact frame count at the
    /// rendering rate and must not retain them beyond the call.
    ///
    /// The output block is always fully populated; while the windowed-sinc
    /// pipeline still lacks history the tail is padded with silence.
    pub fn process_block<F>(
        &mut self,
        inputs: [&[f32]; 2],
        outputs: [&mut [f32]; 2],
        mut process: F,
    ) -> Result<(), SrcError>
    where
        F: FnMut(&mut [f32], &mut [f32]),
    {
        if !self.ready {
            return Err(SrcError::NotReady);
        }

        let n_frames = inputs[0].len();
        let [out_left, out_right] = outputs;
        if inputs[1].len() != n_frames
            || out_left.len() != n_frames
            || out_right.len() != n_frames
            || n_frames > self.block_size
        {
            return Err(SrcError::BufferSize);
        }
        if n_frames == 0 {
            return Ok(());
        }

        match self.mode {
            ResamplingMode::Linear | ResamplingMode::Cubic => {
                let interp: fn([&[f32]; 2], [&mut [f32]; 2], f64) -> usize = match self.mode {
                    ResamplingMode::Linear => interpolate::linear,
                    _ => interpolate::cubic,
                };

                let (scratch_left, scratch_right) =
                    self.scratch.split_at_mut(self.scratch_capacity);

                let up_len = interp(
                    inputs,
                    [&mut *scratch_left, &mut *scratch_right],
                    self.up_ratio,
                );
                process(&mut scratch_left[..up_len], &mut scratch_right[..up_len]);
                let produced = interp(
                    [&scratch_left[..up_len], &scratch_right[..up_len]],
                    [&mut *out_left, &mut *out_right],
                    self.down_ratio,
                );

                out_left[produced..].fill(0.0);
                out_right[produced..].fill(0.0);
            }
            ResamplingMode::Lanczos => {
                let pair = self.lanczos.as_mut().ok_or(SrcError::NotReady)?;
                let (scratch_left, scratch_right) =
                    self.scratch.split_at_mut(self.scratch_capacity);

                for i in 0..n_frames {
                    pair.up.push(inputs[0][i], inputs[1][i]);
                }

                #[cfg(not(feature = "no_std"))]
                let ideal = (n_frames as f64 / self.up_ratio).ceil();
                #[cfg(feature = "no_std")]
                let ideal = libm::ceil(n_frames as f64 / self.up_ratio);
                let output_len = (ideal as usize).min(self.scratch_capacity);

                // The up:down frame-count relationship is not exactly 1:1
                // per block under non-integer ratios, so this may run 0, 1
                // or more times depending on accumulated phase.
                while pair.up.inputs_required_to_generate_outputs(output_len) == 0 {
                    let produced =
                        pair.up.populate_next(scratch_left, scratch_right, output_len);
                    if produced == 0 {
                        break;
                    }

                    process(&mut scratch_left[..produced], &mut scratch_right[..produced]);

                    for i in 0..produced {
                        pair.down.push(scratch_left[i], scratch_right[i]);
                    }
                }

                let produced = pair.down.populate_next(out_left, out_right, n_frames);
                out_left[produced..].fill(0.0);
                out_right[produced..].fill(0.0);

                pair.up.renormalize_phases();
                pair.down.renormalize_phases();
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::{vec, vec::Vec};
    use core::f64::consts::TAU;

    use super::*;

    fn identity(_left: &mut [f32], _right: &mut [f32]) {}

    /// Continuous sine generator so consecutive blocks stay phase-aligned.
    fn sine_block(frequency: f64, sample_rate: f64, amplitude: f32, start: usize, len: usize) -> Vec<f32> {
        (start..start + len)
            .map(|i| amplitude * (TAU * frequency * i as f64 / sample_rate).sin() as f32)
            .collect()
    }

    fn rms(samples: &[f32]) -> f32 {
        let sum: f32 = samples.iter().map(|s| s * s).sum();
        (sum / samples.len() as f32).sqrt()
    }

    #[test]
    fn process_before_reset_is_rejected() {
        let mut src = NonIntegerResampler::new(48000.0, ResamplingMode::Linear).unwrap();
        let input = [0.0f32; 16];
        let mut out_left = [0.0f32; 16];
        let mut out_right = [0.0f32; 16];

        let result = src.process_block(
            [&input, &input],
            [&mut out_left, &mut out_right],
            identity,
        );
        assert_eq!(result, Err(SrcError::NotReady));
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        assert!(NonIntegerResampler::new(0.0, ResamplingMode::Linear).is_err());
        assert!(NonIntegerResampler::new(f64::INFINITY, ResamplingMode::Linear).is_err());

        let mut src = NonIntegerResampler::new(48000.0, ResamplingMode::Linear).unwrap();
        assert_eq!(src.reset(-44100.0, 512), Err(SrcError::InvalidSampleRate));
        assert_eq!(src.reset(44100.0, 0), Err(SrcError::InvalidBlockSize));
    }

    #[test]
    fn mismatched_buffer_lengths_are_rejected() {
        let mut src = NonIntegerResampler::new(48000.0, ResamplingMode::Linear).unwrap();
        src.reset(44100.0, 64).unwrap();

        let input = [0.0f32; 64];
        let input_short = [0.0f32; 32];
        let mut out_left = [0.0f32; 64];
        let mut out_right = [0.0f32; 64];

        let result = src.process_block(
            [&input, &input_short],
            [&mut out_left, &mut out_right],
            identity,
        );
        assert_eq!(result, Err(SrcError::BufferSize));

        // Oversized blocks are rejected as well.
        let big = [0.0f32; 128];
        let mut big_left = [0.0f32; 128];
        let mut big_right = [0.0f32; 128];
        let result = src.process_block(
            [&big, &big],
            [&mut big_left, &mut big_right],
            identity,
        );
        assert_eq!(result, Err(SrcError::BufferSize));
    }

    #[test]
    fn linear_roundtrip_sine_within_one_percent_rms() {
        let mut src = NonIntegerResampler::new(48000.0, ResamplingMode::Linear).unwrap();
        src.reset(44100.0, 512).unwrap();

        let input = sine_block(1000.0, 44100.0, 1.0, 0, 512);
        let mut out_left = vec![0.0f32; 512];
        let mut out_right = vec![0.0f32; 512];

        src.process_block(
            [&input, &input],
            [&mut out_left, &mut out_right],
            identity,
        )
        .unwrap();

        let error: Vec<f32> = out_left
            .iter()
            .zip(&input)
            .map(|(o, i)| o - i)
            .collect();
        let relative = rms(&error) / rms(&input);
        assert!(relative < 0.01, "relative RMS error {relative}");
        assert_eq!(out_left, out_right);
    }

    #[test]
    fn cubic_roundtrip_beats_one_percent_too() {
        let mut src = NonIntegerResampler::new(48000.0, ResamplingMode::Cubic).unwrap();
        src.reset(44100.0, 512).unwrap();

        let input = sine_block(1000.0, 44100.0, 1.0, 0, 512);
        let mut out_left = vec![0.0f32; 512];
        let mut out_right = vec![0.0f32; 512];

        src.process_block(
            [&input, &input],
            [&mut out_left, &mut out_right],
            identity,
        )
        .unwrap();

        let error: Vec<f32> = out_left
            .iter()
            .zip(&input)
            .map(|(o, i)| o - i)
            .collect();
        assert!(rms(&error) / rms(&input) < 0.01);
    }

    #[test]
    fn callback_runs_at_the_rendering_rate() {
        let mut src = NonIntegerResampler::new(48000.0, ResamplingMode::Linear).unwrap();
        src.reset(44100.0, 512).unwrap();

        let input = [0.0f32; 512];
        let mut out_left = [0.0f32; 512];
        let mut out_right = [0.0f32; 512];
        let mut seen_frames = 0;

        src.process_block(
            [&input, &input],
            [&mut out_left, &mut out_right],
            |left, right| {
                assert_eq!(left.len(), right.len());
                seen_frames = left.len();
            },
        )
        .unwrap();

        // ceil(512 / (44100 / 48000)) frames at 48 kHz.
        assert_eq!(seen_frames, 558);
    }

    #[test]
    fn callback_output_is_heard_downstream() {
        let mut src = NonIntegerResampler::new(48000.0, ResamplingMode::Linear).unwrap();
        src.reset(48000.0, 256).unwrap();

        let input = [0.5f32; 256];
        let mut out_left = [0.0f32; 256];
        let mut out_right = [0.0f32; 256];

        src.process_block(
            [&input, &input],
            [&mut out_left, &mut out_right],
            |left, right| {
                for sample in left.iter_mut().chain(right.iter_mut()) {
                    *sample *= 0.5;
                }
            },
        )
        .unwrap();

        for &sample in &out_left {
            assert!((sample - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn mode_switch_resets_to_silence() {
        let mut src = NonIntegerResampler::new(48000.0, ResamplingMode::Linear).unwrap();
        src.reset(44100.0, 512).unwrap();

        // Run some signal through first so stale state would be detectable.
        let noise = sine_block(997.0, 44100.0, 1.0, 0, 512);
        let mut out_left = vec![0.0f32; 512];
        let mut out_right = vec![0.0f32; 512];
        src.process_block(
            [&noise, &noise],
            [&mut out_left, &mut out_right],
            identity,
        )
        .unwrap();

        src.set_resampling_mode(ResamplingMode::Lanczos).unwrap();
        assert_eq!(src.resampling_mode(), ResamplingMode::Lanczos);

        let silence = vec![0.0f32; 512];
        out_left.fill(9.9);
        out_right.fill(9.9);
        src.process_block(
            [&silence, &silence],
            [&mut out_left, &mut out_right],
            identity,
        )
        .unwrap();

        assert!(out_left.iter().all(|&s| s == 0.0));
        assert!(out_right.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn lanczos_block_is_always_fully_populated() {
        let mut src = NonIntegerResampler::new(48000.0, ResamplingMode::Lanczos).unwrap();
        src.reset(44100.0, 512).unwrap();

        let input = sine_block(440.0, 44100.0, 0.8, 0, 512);
        let mut out_left = vec![9.9f32; 512];
        let mut out_right = vec![9.9f32; 512];

        src.process_block(
            [&input, &input],
            [&mut out_left, &mut out_right],
            identity,
        )
        .unwrap();

        // Every frame was written: either real signal or warm-up padding,
        // never the sentinel.
        assert!(out_left.iter().chain(out_right.iter()).all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn lanczos_roundtrip_preserves_sine_energy() {
        let mut src = NonIntegerResampler::new(48000.0, ResamplingMode::Lanczos).unwrap();
        src.reset(44100.0, 512).unwrap();

        let amplitude = 0.8f32;
        let mut out_left = vec![0.0f32; 512];
        let mut out_right = vec![0.0f32; 512];
        let mut steady = Vec::new();

        for block in 0..8 {
            let input = sine_block(200.0, 44100.0, amplitude, block * 512, 512);
            src.process_block(
                [&input, &input],
                [&mut out_left, &mut out_right],
                identity,
            )
            .unwrap();

            // Skip the warm-up blocks where the pipeline is still filling.
            if block >= 2 {
                steady.extend_from_slice(&out_left);
            }
        }

        let expected = amplitude / core::f32::consts::SQRT_2;
        let measured = rms(&steady);
        let deviation = (measured - expected).abs() / expected;
        assert!(
            deviation < 0.05,
            "RMS {measured} deviates {deviation} from {expected}"
        );
    }

    #[test]
    fn identity_rate_lanczos_reconstructs_the_sine() {
        let mut src = NonIntegerResampler::new(48000.0, ResamplingMode::Lanczos).unwrap();
        src.reset(48000.0, 256).unwrap();

        let mut out_left = vec![0.0f32; 256];
        let mut out_right = vec![0.0f32; 256];
        let mut steady = Vec::new();

        for block in 0..6 {
            let input = sine_block(200.0, 48000.0, 0.5, block * 256, 256);
            src.process_block(
                [&input, &input],
                [&mut out_left, &mut out_right],
                identity,
            )
            .unwrap();
            if block >= 2 {
                steady.extend_from_slice(&out_left);
            }
        }

        let expected = 0.5 / core::f32::consts::SQRT_2;
        assert!((rms(&steady) - expected).abs() / expected < 0.03);
    }
}
