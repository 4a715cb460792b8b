//! 256-bit difficulty target
//!
//! Digests are read as little-endian 256-bit integers: byte 31 is the most
//! significant. Target words are stored most significant first.

use core::fmt;

use crate::error::{Error, Result};
use crate::params::DIGEST_SIZE;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target([u32; 8]);

impl Target {
    /// Every digest passes
    pub const MAX: Target = Target([u32::MAX; 8]);

    /// Cheap target for hash-rate benchmarks
    pub const BENCHMARK: Target = Target([0x0cff, 0, 0, 0, 0, 0, 0, 0]);

    /// Words, most significant first
    pub const fn from_words(words: [u32; 8]) -> Self {
        Self(words)
    }

    pub const fn words(&self) -> &[u32; 8] {
        &self.0
    }

    /// Most significant word, used for the fast pre-check
    pub const fn high_word(&self) -> u32 {
        self.0[0]
    }

    /// Parse 64 hex characters, most significant byte first
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.trim_start_matches("0x");
        if s.len() != 64 || !s.is_ascii() {
            return Err(Error::InvalidTarget(format!(
                "expected 64 hex characters, got {}",
                s.len()
            )));
        }
        let mut words = [0u32; 8];
        for (word, chunk) in words.iter_mut().zip(s.as_bytes().chunks(8)) {
            let text = core::str::from_utf8(chunk)
                .map_err(|_| Error::InvalidTarget(s.to_string()))?;
            *word = u32::from_str_radix(text, 16)
                .map_err(|e| Error::InvalidTarget(format!("{text:?}: {e}")))?;
        }
        Ok(Self(words))
    }

    /// Expand compact `nBits` (mantissa * 256^(exponent - 3))
    pub fn from_compact(bits: u32) -> Result<Self> {
        let exponent = (bits >> 24) as usize;
        let mantissa = bits & 0x007f_ffff;
        if bits & 0x0080_0000 != 0 && mantissa != 0 {
            return Err(Error::InvalidTarget(format!("negative compact {bits:#010x}")));
        }

        let mut value = [0u8; 32];
        if exponent <= 3 {
            let shifted = mantissa >> (8 * (3 - exponent));
            value[28..].copy_from_slice(&shifted.to_be_bytes());
            return Ok(Self::from_be_bytes(&value));
        }

        // mantissa bytes occupy big-endian positions 32-exponent..35-exponent
        for (i, byte) in mantissa.to_be_bytes()[1..].iter().enumerate() {
            let pos = 32 + i as isize - exponent as isize;
            if pos < 0 {
                if *byte != 0 {
                    return Err(Error::InvalidTarget(format!(
                        "compact {bits:#010x} overflows"
                    )));
                }
            } else {
                value[pos as usize] = *byte;
            }
        }
        Ok(Self::from_be_bytes(&value))
    }

    /// Target that accepts digests with at least `zeros` leading zero bits
    pub fn from_leading_zeros(zeros: u32) -> Self {
        let mut words = [u32::MAX; 8];
        let mut remaining = zeros.min(256);
        for word in words.iter_mut() {
            if remaining >= 32 {
                *word = 0;
                remaining -= 32;
            } else {
                *word = u32::MAX >> remaining;
                break;
            }
        }
        Self(words)
    }

    fn from_be_bytes(bytes: &[u8; 32]) -> Self {
        let mut words = [0u32; 8];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Self(words)
    }

    /// Big-endian byte representation
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for (chunk, word) in out.chunks_exact_mut(4).zip(self.0) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        out
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::MAX
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for word in self.0 {
            write!(f, "{word:08x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target({self})")
    }
}

/// Digest as eight words, most significant first
#[inline(always)]
pub fn digest_words(digest: &[u8; DIGEST_SIZE]) -> [u32; 8] {
    let mut words = [0u32; 8];
    for (i, word) in words.iter_mut().enumerate() {
        let at = DIGEST_SIZE - 4 * (i + 1);
        *word = u32::from_le_bytes([digest[at], digest[at + 1], digest[at + 2], digest[at + 3]]);
    }
    words
}

/// Full multi-word comparison: `digest <= target`
#[inline(always)]
pub fn fulltest(digest: &[u8; DIGEST_SIZE], target: &Target) -> bool {
    digest_words(digest) <= target.0
}

/// Pre-check on the most significant word, then the full comparison
#[inline(always)]
pub fn meets_target(digest: &[u8; DIGEST_SIZE], target: &Target) -> bool {
    let high = u32::from_le_bytes([digest[28], digest[29], digest[30], digest[31]]);
    high <= target.high_word() && fulltest(digest, target)
}
