//! Subband identity and the code-block packaging contract.

use crate::error::{Jp2kError, Result};

/// Orientation of a 2-D wavelet subband. Routes context-model table
/// selection in the bit-plane coder; the coder otherwise never branches
/// on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubbandOrientation {
    #[default]
    LL,
    HL,
    LH,
    HH,
}

/// Maximum code-block edge length, per the JPEG 2000 standard.
pub const MAX_CODE_BLOCK_EDGE: usize = 64;

/// The atomic unit of Tier-1 coding: a rectangular tile of quantised
/// wavelet coefficients, plus the metadata an encode pass produces.
#[derive(Debug, Clone, Default)]
pub struct CodeBlock {
    pub width: usize,
    pub height: usize,
    pub subband: SubbandOrientation,
    /// The opaque Tier-1 byte stream (absent until encoded).
    pub compressed_data: Vec<u8>,
    /// Number of coding passes actually emitted.
    pub pass_count: u32,
    /// Count of all-zero most-significant bit-planes above the first
    /// significant one.
    pub zero_bit_planes: u8,
    /// Per-pass segment byte lengths, present only under predictable
    /// termination.
    pub pass_segment_lengths: Option<Vec<u32>>,
}

impl CodeBlock {
    pub fn new(width: usize, height: usize, subband: SubbandOrientation) -> Result<Self> {
        validate_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            subband,
            ..Default::default()
        })
    }
}

/// Validates the code-block size invariants from §3: both dimensions
/// positive, neither exceeding [`MAX_CODE_BLOCK_EDGE`].
pub fn validate_dimensions(width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Jp2kError::EmptyCodeBlock);
    }
    if width > MAX_CODE_BLOCK_EDGE || height > MAX_CODE_BLOCK_EDGE {
        return Err(Jp2kError::CodeBlockTooLarge);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_oversized_block() {
        assert_eq!(
            validate_dimensions(65, 10).unwrap_err(),
            Jp2kError::CodeBlockTooLarge
        );
    }

    #[test]
    fn rejects_empty_block() {
        assert_eq!(validate_dimensions(0, 10).unwrap_err(), Jp2kError::EmptyCodeBlock);
    }

    #[test]
    fn accepts_max_size() {
        assert!(validate_dimensions(64, 64).is_ok());
    }
}
