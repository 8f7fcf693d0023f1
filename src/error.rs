/// Errors the resampler configuration and processing functions can throw.
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum SrcError {
    /// Sample rate is zero, negative or not finite.
    InvalidSampleRate,
    /// Block size is zero.
    InvalidBlockSize,
    /// Input/output buffer sizes don't match or exceed the configured block size.
    BufferSize,
    /// Processing was attempted before the first reset.
    NotReady,
}

impl core::fmt::Display for SrcError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidSampleRate => "Sample rate is zero, negative or not finite".fmt(f),
            Self::InvalidBlockSize => "Block size is zero".fmt(f),
            Self::BufferSize => {
                "Input/output buffer sizes don't match or exceed the configured block size".fmt(f)
            }
            Self::NotReady => "Processing was attempted before the first reset".fmt(f),
        }
    }
}

impl core::fmt::Debug for SrcError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self, f)
    }
}

#[cfg(not(feature = "no_std"))]
impl std::error::Error for SrcError {}
