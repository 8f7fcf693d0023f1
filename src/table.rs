use alloc::{boxed::Box, sync::Arc, vec};
use core::f64::consts::PI;
#[cfg(not(feature = "no_std"))]
use std::sync::LazyLock;

use wide::f32x8;

/// Half-width of the Lanczos kernel in input samples.
pub(crate) const KERNEL_HALF_WIDTH: usize = 4;

/// Number of filter taps per convolution (both kernel lobes).
pub(crate) const FILTER_WIDTH: usize = KERNEL_HALF_WIDTH * 2;

/// Number of table steps covering one unit of sub-sample phase.
pub(crate) const TABLE_RESOLUTION: usize = 8192;

#[cfg(not(feature = "no_std"))]
static SHARED_TABLE: LazyLock<Arc<LanczosTable>> =
    LazyLock::new(|| Arc::new(LanczosTable::new()));

/// Precomputed fractional-delay table of windowed-sinc kernel values.
///
/// For each of `TABLE_RESOLUTION + 1` sub-sample phase steps the table stores
/// the `FILTER_WIDTH` kernel taps plus their forward differences to the next
/// step, so a weight lookup at an arbitrary phase only needs one fused
/// multiply-add per tap instead of recomputing the kernel.
///
/// The table is immutable after construction and is shared by all
/// [`LanczosResampler`](crate::LanczosResampler) instances.
pub struct LanczosTable {
    values: Box<[[f32; FILTER_WIDTH]]>,
    deltas: Box<[[f32; FILTER_WIDTH]]>,
}

/// Normalized Lanczos kernel: `A·sin(πx)·sin(πx/A) / (π²x²)`.
fn kernel(x: f64) -> f64 {
    let a = KERNEL_HALF_WIDTH as f64;

    #[cfg(not(feature = "no_std"))]
    let x_abs = x.abs();
    #[cfg(feature = "no_std")]
    let x_abs = libm::fabs(x);

    // Near zero the quotient degenerates into division noise.
    if x_abs < 1e-7 {
        return 1.0;
    }

    #[cfg(not(feature = "no_std"))]
    let (sin_x, sin_x_a) = ((PI * x).sin(), (PI * x / a).sin());
    #[cfg(feature = "no_std")]
    let (sin_x, sin_x_a) = (libm::sin(PI * x), libm::sin(PI * x / a));

    a * sin_x * sin_x_a / (PI * PI * x * x)
}

impl LanczosTable {
    /// Build the kernel and forward-difference tables.
    pub fn new() -> Self {
        let step = 1.0 / TABLE_RESOLUTION as f64;

        let mut values = vec![[0.0f32; FILTER_WIDTH]; TABLE_RESOLUTION + 1];
        for (t, row) in values.iter_mut().enumerate() {
            let x0 = step * t as f64;
            for (i, value) in row.iter_mut().enumerate() {
                let x = x0 + i as f64 - KERNEL_HALF_WIDTH as f64;
                *value = kernel(x) as f32;
            }
        }

        let mut deltas = vec![[0.0f32; FILTER_WIDTH]; TABLE_RESOLUTION + 1];
        for t in 0..TABLE_RESOLUTION {
            for i in 0..FILTER_WIDTH {
                deltas[t][i] = values[t + 1][i] - values[t][i];
            }
        }
        // Wrap at the end - the derivative is the same.
        deltas[TABLE_RESOLUTION] = deltas[0];

        LanczosTable {
            values: values.into_boxed_slice(),
            deltas: deltas.into_boxed_slice(),
        }
    }

    /// Returns the process-wide shared table, building it on first use.
    #[cfg(not(feature = "no_std"))]
    pub fn shared() -> Arc<LanczosTable> {
        Arc::clone(&SHARED_TABLE)
    }

    /// Without `std` there is no process-wide cache, so every call builds a
    /// fresh table.
    #[cfg(feature = "no_std")]
    pub fn shared() -> Arc<LanczosTable> {
        Arc::new(LanczosTable::new())
    }

    /// Interpolated tap weights for a sub-sample phase in `[0, 1]`.
    #[inline]
    pub(crate) fn weights(&self, phase: f64) -> f32x8 {
        let scaled = phase * TABLE_RESOLUTION as f64;
        let index = scaled as usize;
        let frac = (scaled - index as f64) as f32;

        let values = f32x8::from(self.values[index]);
        let deltas = f32x8::from(self.deltas[index]);
        deltas.mul_add(f32x8::splat(frac), values)
    }
}

impl Default for LanczosTable {
    fn default() -> Self {
        Self::new()
    }
}
