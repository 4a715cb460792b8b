//! X16R Prover Library
//!
//! Drives the [`x16r_core`] scanner across all CPU cores.
//!
//! # Overview
//!
//! - [`work`]: header template + target, loaded from JSON, and the
//!   [`WorkContext`] every worker reports solutions to
//! - [`config`]: miner settings with a JSON file under `~/.x16r`
//! - [`cpu`]: picks the batch width from the CPU's vector unit
//! - [`miner`]: rayon worker pool over disjoint nonce slices
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use x16r::algorithm::{DigestSuite, HeaderTemplate, Target};
//! use x16r::{MinerConfig, Work, mine};
//!
//! let work = Work::new(HeaderTemplate::default(), Target::from_leading_zeros(4));
//! let config = MinerConfig {
//!     threads: Some(2),
//!     lanes: Some(4),
//!     nonce_end: 255,
//!     ..MinerConfig::default()
//! };
//!
//! let report = mine(Arc::new(DigestSuite), work, &config).unwrap();
//! for solution in &report.solutions {
//!     println!("nonce {} -> {}", solution.nonce, hex::encode(solution.digest));
//! }
//! ```

// Re-export the core algorithm
pub use x16r_core as algorithm;

pub mod config;
pub mod cpu;
pub mod miner;
pub mod work;

// Convenience re-exports
pub use config::{ConfigError, MinerConfig};
pub use cpu::detect_batch_width;
pub use miner::{MineReport, Miner, MinerError, mine};
pub use work::{Work, WorkContext, WorkError, WorkFile};
