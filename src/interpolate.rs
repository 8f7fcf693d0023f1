//! Stateless single-pass stereo interpolators.
//!
//! Both functions map output index `w` to the fractional input position
//! `ratio * w` where `ratio` is `input_rate / output_rate`. They keep no
//! state between calls, so every block is computed independently.

/// Output frame count for one pass, clamped to the destination capacity.
#[inline]
fn output_len(input_len: usize, ratio: f64, max_output_len: usize) -> usize {
    #[cfg(not(feature = "no_std"))]
    let ideal = (input_len as f64 / ratio).ceil();
    #[cfg(feature = "no_std")]
    let ideal = libm::ceil(input_len as f64 / ratio);

    (ideal as usize).min(max_output_len)
}

/// Resample both channels with 2-point linear interpolation.
///
/// `inputs` slices must have equal lengths, as must `outputs`; the shorter
/// pair member bounds the pass. Returns the number of output frames written,
/// `min(ceil(input_len / ratio), output_capacity)`.
pub fn linear(inputs: [&[f32]; 2], outputs: [&mut [f32]; 2], ratio: f64) -> usize {
    let input_len = inputs[0].len().min(inputs[1].len());
    let max_output_len = outputs[0].len().min(outputs[1].len());
    if input_len == 0 {
        return 0;
    }

    let output_len = output_len(input_len, ratio, max_output_len);
    let [out_left, out_right] = outputs;

    for write_pos in 0..output_len {
        let read_pos = ratio * write_pos as f64;

        #[cfg(not(feature = "no_std"))]
        let read_trunc = read_pos.floor();
        #[cfg(feature = "no_std")]
        let read_trunc = libm::floor(read_pos);

        let read_index = (read_trunc as usize).min(input_len - 1);
        let y = (read_pos - read_trunc) as f32;

        for (channel, out) in [&mut *out_left, &mut *out_right].into_iter().enumerate() {
            let x = inputs[channel];
            let x0 = x[read_index];
            // Edge clamp by reflection to the other neighbor, not zero-padding.
            let x1 = if read_index + 1 < input_len {
                x[read_index + 1]
            } else {
                x[read_index.saturating_sub(1)]
            };
            out[write_pos] = (1.0 - y) * x0 + y * x1;
        }
    }

    output_len
}

/// Resample both channels with 4-point Catmull-Rom-style Hermite
/// interpolation.
///
/// Boundary handling: `x₋₁` is zero at the very start, `x₁`/`x₂` replicate
/// the last valid sample past the end. Same length contract and return value
/// as [`linear`].
pub fn cubic(inputs: [&[f32]; 2], outputs: [&mut [f32]; 2], ratio: f64) -> usize {
    let input_len = inputs[0].len().min(inputs[1].len());
    let max_output_len = outputs[0].len().min(outputs[1].len());
    if input_len == 0 {
        return 0;
    }

    let output_len = output_len(input_len, ratio, max_output_len);
    let [out_left, out_right] = outputs;

    for write_pos in 0..output_len {
        let read_pos = ratio * write_pos as f64;

        #[cfg(not(feature = "no_std"))]
        let read_trunc = read_pos.floor();
        #[cfg(feature = "no_std")]
        let read_trunc = libm::floor(read_pos);

        let read_index = (read_trunc as usize).min(input_len - 1);
        let y = (read_pos - read_trunc) as f32;

        for (channel, out) in [&mut *out_left, &mut *out_right].into_iter().enumerate() {
            let x = inputs[channel];
            let xm1 = if read_index == 0 { 0.0 } else { x[read_index - 1] };
            let x0 = x[read_index];
            let x1 = x[(read_index + 1).min(input_len - 1)];
            let x2 = x[(read_index + 2).min(input_len - 1)];

            let c = (x1 - xm1) * 0.5;
            let v = x0 - x1;
            let w = c + v;
            let a = w + v + (x2 - x0) * 0.5;
            let b = w + a;

            out[write_pos] = ((a * y - b) * y + c) * y + x0;
        }
    }

    output_len
}
