//! Block header template

use core::fmt;

use crate::error::{Error, Result};
use crate::params::*;

/// Fixed 80-byte block header being searched over.
///
/// The length is checked once on construction so the scan loop can index
/// fields without re-validating.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct HeaderTemplate {
    bytes: [u8; HEADER_SIZE],
}

impl HeaderTemplate {
    /// Wrap an already sized header
    pub const fn new(bytes: [u8; HEADER_SIZE]) -> Self {
        Self { bytes }
    }

    /// Validate and copy a header from an arbitrary slice
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; HEADER_SIZE] =
            bytes.try_into().map_err(|_| Error::InvalidHeaderLength {
                expected: HEADER_SIZE,
                actual: bytes.len(),
            })?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; HEADER_SIZE] {
        &self.bytes
    }

    pub fn version(&self) -> u32 {
        self.word(VERSION_OFFSET)
    }

    pub fn prev_hash(&self) -> &[u8] {
        &self.bytes[PREV_HASH_OFFSET..PREV_HASH_OFFSET + 32]
    }

    pub fn merkle_root(&self) -> &[u8] {
        &self.bytes[MERKLE_ROOT_OFFSET..MERKLE_ROOT_OFFSET + 32]
    }

    pub fn time(&self) -> u32 {
        self.word(TIME_OFFSET)
    }

    /// Compact difficulty bits
    pub fn bits(&self) -> u32 {
        self.word(BITS_OFFSET)
    }

    pub fn nonce(&self) -> u32 {
        self.word(NONCE_OFFSET)
    }

    /// Copy of this header with a different nonce
    pub fn with_nonce(&self, nonce: u32) -> Self {
        let mut bytes = self.bytes;
        bytes[NONCE_OFFSET..NONCE_OFFSET + 4].copy_from_slice(&nonce.to_le_bytes());
        Self { bytes }
    }

    /// The two words that seed the order derivation, byte-swapped into
    /// their big-endian canonical form.
    pub fn order_seed(&self) -> [u8; 8] {
        let mut seed = [0u8; 8];
        for (chunk, offset) in seed.chunks_exact_mut(4).zip(ORDER_SEED_OFFSETS) {
            chunk.copy_from_slice(&self.word(offset).to_be_bytes());
        }
        seed
    }

    #[inline(always)]
    fn word(&self, offset: usize) -> u32 {
        u32::from_le_bytes([
            self.bytes[offset],
            self.bytes[offset + 1],
            self.bytes[offset + 2],
            self.bytes[offset + 3],
        ])
    }
}

impl Default for HeaderTemplate {
    fn default() -> Self {
        Self::new([0u8; HEADER_SIZE])
    }
}

impl fmt::Debug for HeaderTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderTemplate")
            .field("version", &format_args!("{:#010x}", self.version()))
            .field("time", &format_args!("{:#010x}", self.time()))
            .field("bits", &format_args!("{:#010x}", self.bits()))
            .field("nonce", &self.nonce())
            .finish_non_exhaustive()
    }
}

impl From<[u8; HEADER_SIZE]> for HeaderTemplate {
    fn from(bytes: [u8; HEADER_SIZE]) -> Self {
        Self::new(bytes)
    }
}

impl TryFrom<&[u8]> for HeaderTemplate {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}
