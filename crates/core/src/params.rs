//! Chain and header parameters
//!
//! Byte offsets follow the 80-byte block header layout. All integer fields
//! are little-endian.

/// Number of chained primitives (and length of an order string)
pub const CHAIN_LENGTH: usize = 16;

/// Header template size in bytes
pub const HEADER_SIZE: usize = 80;

/// Offset of the version field
pub const VERSION_OFFSET: usize = 0;

/// Offset of the previous block hash
pub const PREV_HASH_OFFSET: usize = 4;

/// Offset of the merkle root
pub const MERKLE_ROOT_OFFSET: usize = 36;

/// Offset of the time field
pub const TIME_OFFSET: usize = 68;

/// Offset of the compact difficulty bits
pub const BITS_OFFSET: usize = 72;

/// Offset of the nonce field
pub const NONCE_OFFSET: usize = 76;

/// Offsets of the two 32-bit words that seed the order derivation
pub const ORDER_SEED_OFFSETS: [usize; 2] = [PREV_HASH_OFFSET, PREV_HASH_OFFSET + 4];

/// Size of the reported digest (leading 256 bits of the last stage)
pub const DIGEST_SIZE: usize = 32;

/// Largest native digest a primitive may produce
pub const MAX_STAGE_DIGEST: usize = 64;

/// Supported scanner batch widths
pub const BATCH_WIDTHS: [usize; 5] = [1, 2, 4, 8, 16];

/// Widest supported batch
pub const MAX_LANES: usize = 16;

/// Algorithm version
pub const VERSION: u8 = 1;
