//! Construction-time errors
//!
//! The scan loop itself never fails; everything here is raised while a
//! header, target, order string or scanner is being built.

use thiserror::Error;

use crate::primitives::Algorithm;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("header template must be {expected} bytes, got {actual}")]
    InvalidHeaderLength { expected: usize, actual: usize },

    #[error("batch width {0} is not supported (expected 1, 2, 4, 8 or 16)")]
    UnsupportedBatchWidth(usize),

    #[error("primitive {algorithm} is unusable: {reason}")]
    InvalidPrimitive {
        algorithm: Algorithm,
        reason: String,
    },

    #[error("invalid order string: {0}")]
    InvalidOrder(String),

    #[error("invalid target: {0}")]
    InvalidTarget(String),
}

pub type Result<T> = core::result::Result<T, Error>;
