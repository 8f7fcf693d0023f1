#![cfg_attr(feature = "no_std", no_std)]

extern crate alloc;

mod error;
pub mod interpolate;
mod lanczos;
mod resampler;
mod table;

pub use error::SrcError;
pub use lanczos::LanczosResampler;
pub use resampler::NonIntegerResampler;
pub use table::LanczosTable;

/// Conversion algorithm the [`NonIntegerResampler`] runs.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResamplingMode {
    /// 2-point linear interpolation. Cheapest, audible aliasing on rich
    /// material.
    #[default]
    Linear,
    /// 4-point Hermite interpolation.
    Cubic,
    /// Windowed-sinc convolution against a precomputed fractional-delay
    /// table. Highest quality, adds a few samples of latency.
    Lanczos,
}
