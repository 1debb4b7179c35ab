use thiserror::Error;

/// Errors the core reports to its callers.
///
/// Unit variants with explicit discriminants, in the style of the wider
/// codec: stable numeric identity survives refactors, and every variant
/// is `Clone + Copy` since none carries an allocation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jp2kError {
    #[error("code-block shape does not match coefficient buffer length")]
    ShapeMismatch = 1,
    #[error("code-block exceeds the maximum 64x64 sample size")]
    CodeBlockTooLarge = 2,
    #[error("code-block width or height is zero")]
    EmptyCodeBlock = 3,
    #[error("bit depth must be in [1, 32]")]
    InvalidBitDepth = 4,
    #[error("1-D DWT input signal is shorter than 2 samples")]
    SignalTooShort = 5,
    #[error("2-D DWT input image is smaller than 2x2")]
    ImageTooSmall = 6,
    #[error("inverse DWT lowpass/highpass length difference exceeds 1")]
    IncompatibleSubbandSizes = 7,
    #[error("decomposition level count must be at least 1")]
    InvalidLevelCount = 8,
    #[error("predictable termination requires passSegLens")]
    MissingPassSegmentLengths = 9,
    #[error("passSegLens total does not match the byte stream length")]
    PassSegmentLengthMismatch = 10,
    #[error("declared passCount/zeroBitPlanes would read past the byte stream")]
    TruncatedStream = 11,
    #[error("maxPasses exceeds the number of passes implied by bitDepth")]
    InvalidMaxPasses = 12,
}

pub type Result<T> = core::result::Result<T, Jp2kError>;
