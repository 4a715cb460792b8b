//! # X16R Core
//!
//! Execution core of an X16R-style chained proof-of-work: sixteen hash
//! primitives applied in a header-dependent order, run over batches of nonce
//! lanes and compared against a 256-bit target.
//!
//! ## Pipeline
//!
//! ```text
//! header ──> order cache ──> chain ──> lane packer ──> primitive ─┐
//!              (per worker)    ^                                  │
//!                              └──────────── 16 stages ───────────┘
//!                                  ──> 32-byte digest per lane ──> target
//! ```
//!
//! - The **order string** comes from SHA-512 over two byte-swapped words of
//!   the previous-block hash; the low nibble of each of the first 16 output
//!   bytes picks a slot.
//! - **Primitives** are bound to slots by a [`PrimitiveSet`]. The bundled
//!   [`DigestSuite`] uses RustCrypto and BLAKE3 digests; a network-specific
//!   set plugs in the same way.
//! - **Lanes** of a batch are interleaved at 32 or 64 bits for primitives
//!   that hash several lanes at once, and repacked only when the layout
//!   changes between stages.
//!
//! Digests are little-endian 256-bit integers; a digest solves a [`Target`]
//! when it is numerically `<=` it.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex, atomic::AtomicBool};
//! use x16r_core::{DigestSuite, HeaderTemplate, Scanner, Solution, Target, hash_header};
//!
//! let header = HeaderTemplate::default();
//! let mut scanner = Scanner::new(Arc::new(DigestSuite), 4).unwrap();
//!
//! let found = Mutex::new(Vec::<Solution>::new());
//! let cancel = AtomicBool::new(false);
//! let summary = scanner.scan(&header, 0..=15, &Target::MAX, &cancel, &found);
//! assert_eq!(summary.attempted, 16);
//!
//! // every lane agrees with the one-shot path
//! let first = found.lock().unwrap()[0];
//! assert_eq!(first.digest, hash_header(&DigestSuite, &header.with_nonce(first.nonce)).unwrap());
//! ```

mod chain;
mod error;
mod header;
pub mod lanes;
mod order;
mod params;
pub mod primitives;
mod scanner;
mod target;

pub use chain::{Chain, hash_header, hash_with_order};
pub use error::{Error, Result};
pub use header::HeaderTemplate;
pub use order::{OrderCache, OrderString, derive_order};
pub use params::*;
pub use primitives::{Algorithm, DigestSuite, PrimitiveSet};
pub use scanner::{ScanSummary, Scanner, Solution, SolutionSink};
pub use target::{Target, digest_words, fulltest, meets_target};
