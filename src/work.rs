//! Work context
//!
//! A unit of work is a header template plus a target, read from JSON:
//!
//! ```json
//! {
//!   "header": "<160 hex chars>",
//!   "target": "<64 hex chars, most significant byte first>",
//!   "bits": "1d00ffff",
//!   "difficulty": 16
//! }
//! ```
//!
//! Only `header` is required. The target comes from the first of `target`,
//! `bits`, `difficulty` that is present, falling back to the header's own
//! compact bits.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use x16r_core::{
    HeaderTemplate, PrimitiveSet, Solution, SolutionSink, Target, hash_header, meets_target,
};

#[derive(Error, Debug)]
pub enum WorkError {
    #[error("File I/O error: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Invalid work file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid hex in {field}: {source}")]
    Hex {
        field: &'static str,
        source: hex::FromHexError,
    },

    #[error(transparent)]
    Core(#[from] x16r_core::Error),
}

/// On-disk work description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkFile {
    pub header: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bits: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u32>,
}

/// Header template and target, validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Work {
    pub header: HeaderTemplate,
    pub target: Target,
}

impl Work {
    pub fn new(header: HeaderTemplate, target: Target) -> Self {
        Self { header, target }
    }

    pub fn from_json(json: &str) -> Result<Self, WorkError> {
        let file: WorkFile = serde_json::from_str(json)?;
        Self::try_from(file)
    }

    pub fn load(path: &Path) -> Result<Self, WorkError> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

impl TryFrom<WorkFile> for Work {
    type Error = WorkError;

    fn try_from(file: WorkFile) -> Result<Self, WorkError> {
        let bytes = hex::decode(file.header.trim()).map_err(|source| WorkError::Hex {
            field: "header",
            source,
        })?;
        let header = HeaderTemplate::from_bytes(&bytes)?;

        let target = if let Some(target) = &file.target {
            Target::from_hex(target.trim())?
        } else if let Some(bits) = &file.bits {
            Target::from_compact(parse_bits(bits)?)?
        } else if let Some(zeros) = file.difficulty {
            Target::from_leading_zeros(zeros)
        } else {
            Target::from_compact(header.bits())?
        };

        Ok(Self { header, target })
    }
}

/// Compact bits as 8 hex characters, with or without `0x`
pub fn parse_bits(text: &str) -> Result<u32, WorkError> {
    let text = text.trim().trim_start_matches("0x");
    let mut bytes = [0u8; 4];
    hex::decode_to_slice(text, &mut bytes).map_err(|source| WorkError::Hex {
        field: "bits",
        source,
    })?;
    Ok(u32::from_be_bytes(bytes))
}

/// Shared state of one search: the work itself, the cancel flag every
/// worker polls, and the solutions reported so far.
#[derive(Debug)]
pub struct WorkContext {
    work: Work,
    cancel: AtomicBool,
    stop_on_first: bool,
    /// Hits are dropped instead of submitted
    benchmark: bool,
    solutions: Mutex<Vec<Solution>>,
}

impl WorkContext {
    pub fn new(work: Work, stop_on_first: bool) -> Self {
        Self {
            work,
            cancel: AtomicBool::new(false),
            stop_on_first,
            benchmark: false,
            solutions: Mutex::new(Vec::new()),
        }
    }

    /// Context for hash-rate measurement: hits are neither logged, kept nor
    /// allowed to stop the search
    pub fn benchmark(work: Work) -> Self {
        Self {
            benchmark: true,
            ..Self::new(work, false)
        }
    }

    pub fn is_benchmark(&self) -> bool {
        self.benchmark
    }

    pub fn header(&self) -> &HeaderTemplate {
        &self.work.header
    }

    pub fn target(&self) -> &Target {
        &self.work.target
    }

    /// Flag the scanners poll once per batch
    pub fn cancel_flag(&self) -> &AtomicBool {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    pub fn solutions(&self) -> Vec<Solution> {
        self.solutions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recompute a solution one lane at a time and check it against the target
    pub fn verify<S: PrimitiveSet + ?Sized>(
        &self,
        set: &S,
        solution: &Solution,
    ) -> Result<bool, WorkError> {
        let digest = hash_header(set, &self.work.header.with_nonce(solution.nonce))?;
        Ok(digest == solution.digest && meets_target(&digest, &self.work.target))
    }
}

impl SolutionSink for WorkContext {
    fn submit_solution(&self, solution: Solution) {
        if self.benchmark {
            return;
        }
        tracing::info!(
            nonce = solution.nonce,
            lane = solution.lane,
            digest = %hex::encode(solution.digest),
            "solution submitted"
        );
        self.solutions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(solution);
        if self.stop_on_first {
            self.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "00000020000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f808182838485868788898a8b8c8d8e8f909192939495969798999a9b9c9d9e9f00105e5fffff001d00000000";

    #[test]
    fn test_target_falls_back_to_header_bits() {
        let work = Work::from_json(&format!(r#"{{ "header": "{HEADER}" }}"#)).unwrap();
        assert_eq!(work.target, Target::from_compact(0x1d00_ffff).unwrap());
        assert_eq!(work.header.time(), 0x5f5e_1000);
    }

    #[test]
    fn test_target_precedence() {
        let explicit = "00000000000000000000000000000000000000000000000000000000000000ff";
        let json = format!(
            r#"{{ "header": "{HEADER}", "target": "{explicit}", "bits": "1c00ffff", "difficulty": 8 }}"#
        );
        assert_eq!(Work::from_json(&json).unwrap().target, Target::from_hex(explicit).unwrap());

        let json = format!(r#"{{ "header": "{HEADER}", "bits": "0x1c00ffff", "difficulty": 8 }}"#);
        assert_eq!(
            Work::from_json(&json).unwrap().target,
            Target::from_compact(0x1c00_ffff).unwrap()
        );

        let json = format!(r#"{{ "header": "{HEADER}", "difficulty": 8 }}"#);
        assert_eq!(Work::from_json(&json).unwrap().target, Target::from_leading_zeros(8));
    }

    #[test]
    fn test_short_header_is_rejected() {
        let err = Work::from_json(r#"{ "header": "00ff" }"#).unwrap_err();
        assert!(matches!(
            err,
            WorkError::Core(x16r_core::Error::InvalidHeaderLength { actual: 2, .. })
        ));

        let err = Work::from_json(r#"{ "header": "xyz" }"#).unwrap_err();
        assert!(matches!(err, WorkError::Hex { field: "header", .. }));
    }

    #[test]
    fn test_stop_on_first_cancels() {
        let work = Work::new(HeaderTemplate::default(), Target::MAX);
        let context = WorkContext::new(work, true);
        assert!(!context.is_cancelled());

        context.submit_solution(Solution {
            nonce: 7,
            lane: 3,
            digest: [0u8; 32],
        });

        assert!(context.is_cancelled());
        assert_eq!(context.solutions().len(), 1);
    }

    #[test]
    fn test_benchmark_context_drops_solutions() {
        let work = Work::new(HeaderTemplate::default(), Target::MAX);
        let context = WorkContext::benchmark(work);
        assert!(context.is_benchmark());

        for nonce in 0..4 {
            context.submit_solution(Solution {
                nonce,
                lane: nonce as usize,
                digest: [0u8; 32],
            });
        }

        assert!(!context.is_cancelled());
        assert!(context.solutions().is_empty());
    }
}
