use alloc::{boxed::Box, sync::Arc, vec};

use wide::f32x8;

use crate::{
    SrcError,
    table::{FILTER_WIDTH, KERNEL_HALF_WIDTH, LanczosTable},
};

/// Logical ring capacity in frames. Must be a power of two so the write
/// pointer can wrap with a bit-mask.
const RING_CAPACITY: usize = 4096;

/// Physical per-channel storage. Every frame is written twice, `RING_CAPACITY`
/// apart, so any contiguous read of up to `RING_CAPACITY` frames starting
/// anywhere in `[0, 2 * RING_CAPACITY)` is valid without per-sample modulo.
const RING_STORAGE: usize = RING_CAPACITY * 2;

/// Stereo windowed-sinc resampler between two fixed sample rates.
///
/// Input samples are pushed into per-channel circular history buffers;
/// output samples are produced by convolving [`FILTER_WIDTH`] kernel taps
/// from the shared [`LanczosTable`] against the history at a fractional read
/// position. Two phase accumulators track the input and output timelines in
/// units of input samples.
pub struct LanczosResampler {
    table: Arc<LanczosTable>,
    /// Both channels back to back, `RING_STORAGE` samples per channel.
    buffers: Box<[f32]>,
    write_position: usize,
    phase_in: f64,
    phase_out: f64,
    d_phase_in: f64,
    d_phase_out: f64,
}

fn valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

impl LanczosResampler {
    /// Create a new [`LanczosResampler`] converting from `input_rate` to
    /// `output_rate`, reading kernel weights from `table`.
    pub fn new(
        table: Arc<LanczosTable>,
        input_rate: f64,
        output_rate: f64,
    ) -> Result<Self, SrcError> {
        if !valid_rate(input_rate) || !valid_rate(output_rate) {
            return Err(SrcError::InvalidSampleRate);
        }

        Ok(LanczosResampler {
            table,
            buffers: vec![0.0; 2 * RING_STORAGE].into_boxed_slice(),
            write_position: 0,
            phase_in: 0.0,
            phase_out: 0.0,
            d_phase_in: 1.0,
            d_phase_out: input_rate / output_rate,
        })
    }

    /// Write one stereo frame into the history buffers and advance the input
    /// phase by one input sample.
    #[inline]
    pub fn push(&mut self, left: f32, right: f32) {
        let wp = self.write_position;
        self.buffers[wp] = left;
        self.buffers[wp + RING_CAPACITY] = left;
        self.buffers[RING_STORAGE + wp] = right;
        self.buffers[RING_STORAGE + wp + RING_CAPACITY] = right;
        self.write_position = (wp + 1) & (RING_CAPACITY - 1);
        self.phase_in += self.d_phase_in;
    }

    /// Convolve both channels at `x_back` input samples behind the write
    /// pointer.
    fn read(&self, x_back: f64) -> (f32, f32) {
        let p0 = self.write_position as f64 - x_back;

        #[cfg(not(feature = "no_std"))]
        let p0_floor = p0.floor();
        #[cfg(feature = "no_std")]
        let p0_floor = libm::floor(p0);

        let off0 = 1.0 - (p0 - p0_floor);

        let mut idx0 = ((p0_floor as isize + RING_CAPACITY as isize) as usize)
            & (RING_CAPACITY - 1);
        // Keep the window left edge inside the duplicated storage.
        if idx0 <= KERNEL_HALF_WIDTH {
            idx0 += RING_CAPACITY;
        }
        let start = idx0 - KERNEL_HALF_WIDTH;

        let weights = self.table.weights(off0);
        let (left, right) = self.buffers.split_at(RING_STORAGE);

        let mut window = [0.0f32; FILTER_WIDTH];
        window.copy_from_slice(&left[start..start + FILTER_WIDTH]);
        let out_left = (weights * f32x8::from(window)).reduce_add();

        window.copy_from_slice(&right[start..start + FILTER_WIDTH]);
        let out_right = (weights * f32x8::from(window)).reduce_add();

        (out_left, out_right)
    }

    /// Minimum number of additional [`push`](Self::push) calls needed before
    /// `desired_outputs` more output samples can be produced.
    ///
    /// The `k`-th of those reads happens with the output phase advanced by
    /// `k · d_phase_out` and requires the history window to stay strictly
    /// above `KERNEL_HALF_WIDTH + 1` input samples, so the binding constraint
    /// is the last read:
    ///
    /// `phase_in + r - (phase_out + (n-1) · d_phase_out) > A + 1`
    pub fn inputs_required_to_generate_outputs(&self, desired_outputs: usize) -> usize {
        if desired_outputs == 0 {
            return 0;
        }

        let deficit = (KERNEL_HALF_WIDTH + 1) as f64
            - (self.phase_in - self.phase_out - (desired_outputs - 1) as f64 * self.d_phase_out);

        if deficit < 0.0 {
            return 0;
        }

        #[cfg(not(feature = "no_std"))]
        let whole = deficit.floor();
        #[cfg(feature = "no_std")]
        let whole = libm::floor(deficit);

        whole as usize + 1
    }

    /// Produce up to `max` output frames into `out_left`/`out_right`.
    ///
    /// Returns the number of frames actually produced. A shortfall means the
    /// history window is exhausted and more input must be pushed first; it is
    /// an ordinary termination condition, not a fault.
    pub fn populate_next(
        &mut self,
        out_left: &mut [f32],
        out_right: &mut [f32],
        max: usize,
    ) -> usize {
        let max = max.min(out_left.len()).min(out_right.len());
        let limit = (KERNEL_HALF_WIDTH + 1) as f64;

        let mut populated = 0;
        while populated < max && (self.phase_in - self.phase_out) > limit {
            let (left, right) = self.read(self.phase_in - self.phase_out);
            out_left[populated] = left;
            out_right[populated] = right;
            self.phase_out += self.d_phase_out;
            populated += 1;
        }
        populated
    }

    /// Advance the output phase by `n` output samples without reading.
    pub fn advance_read_pointer(&mut self, n: usize) {
        self.phase_out += n as f64 * self.d_phase_out;
    }

    /// Re-base both phases so `phase_out` is zero again, preserving their
    /// difference. Called once per processed block to bound floating-point
    /// phase growth.
    pub fn renormalize_phases(&mut self) {
        self.phase_in -= self.phase_out;
        self.phase_out = 0.0;
    }

    /// Hard-reset both phases to zero. Only meaningful on a full reset, not
    /// mid-stream.
    pub fn snap_out_to_in(&mut self) {
        self.phase_in = 0.0;
        self.phase_out = 0.0;
    }
}
