//! Multi-threaded miner
//!
//! Splits the nonce range into one contiguous slice per worker and runs the
//! workers on a rayon pool. Every worker owns its own [`Scanner`] (and so its
//! own order cache); they share only the [`WorkContext`]: header, target,
//! cancel flag and solution list.

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use thiserror::Error;
use x16r_core::{PrimitiveSet, ScanSummary, Scanner, Solution};

use crate::config::MinerConfig;
use crate::work::{Work, WorkContext};

/// How often the monitor wakes up to check whether workers are done
const MONITOR_TICK: Duration = Duration::from_millis(50);

#[derive(Error, Debug)]
pub enum MinerError {
    #[error(transparent)]
    Core(#[from] x16r_core::Error),

    #[error("Failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("A mining thread panicked")]
    WorkerPanicked,
}

/// Outcome of one [`Miner::mine`] call
#[derive(Debug, Clone)]
pub struct MineReport {
    pub attempted: u64,
    pub solutions: Vec<Solution>,
    pub elapsed: Duration,
    pub cancelled: bool,
}

impl MineReport {
    pub fn hashrate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.attempted as f64 / secs
        } else {
            0.0
        }
    }
}

/// Split `range` into at most `parts` disjoint, contiguous, non-empty slices
pub fn split_range(range: RangeInclusive<u32>, parts: usize) -> Vec<RangeInclusive<u32>> {
    if range.is_empty() || parts == 0 {
        return Vec::new();
    }
    let (start, end) = range.into_inner();
    let total = u64::from(end - start) + 1;
    let parts = (parts as u64).min(total);
    let base = total / parts;
    let extra = total % parts;

    let mut slices = Vec::with_capacity(parts as usize);
    let mut next = u64::from(start);
    for i in 0..parts {
        let len = base + u64::from(i < extra);
        let last = next + len - 1;
        // both ends lie inside the input u32 range
        slices.push(next as u32..=last as u32);
        next = last + 1;
    }
    slices
}

pub struct Miner<S: ?Sized> {
    set: Arc<S>,
    threads: usize,
    lanes: usize,
    chunk_size: u32,
    report_interval: Duration,
}

impl<S: PrimitiveSet + ?Sized> Miner<S> {
    /// Build a miner; fails when the primitive set rejects the batch width
    pub fn new(set: Arc<S>, config: &MinerConfig) -> Result<Self, MinerError> {
        let lanes = config.resolved_lanes();
        // surface width and primitive errors before any thread starts
        Scanner::new(Arc::clone(&set), lanes)?;

        Ok(Self {
            set,
            threads: config.resolved_threads().max(1),
            lanes,
            chunk_size: config.chunk_size.max(1),
            report_interval: Duration::from_secs(config.report_interval_secs.max(1)),
        })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn lanes(&self) -> usize {
        self.lanes
    }

    /// Search `nonces` for solutions of `context`'s work
    pub fn mine(
        &self,
        context: &WorkContext,
        nonces: RangeInclusive<u32>,
    ) -> Result<MineReport, MinerError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|i| format!("x16r-worker-{i}"))
            .build()?;

        let slices = split_range(nonces, self.threads);
        let progress = AtomicU64::new(0);
        let start = Instant::now();

        tracing::info!(
            threads = self.threads,
            lanes = self.lanes,
            slices = slices.len(),
            target_hex = %context.target(),
            "mining started"
        );

        let summary = std::thread::scope(|s| {
            let workers = s.spawn(|| {
                pool.install(|| {
                    slices
                        .par_iter()
                        .map(|slice| self.scan_slice(context, slice.clone(), &progress))
                        .try_reduce(ScanSummary::default, |mut acc, part| {
                            acc.merge(part);
                            Ok(acc)
                        })
                })
            });

            let mut last_report = Instant::now();
            while !workers.is_finished() {
                std::thread::sleep(MONITOR_TICK);
                if last_report.elapsed() >= self.report_interval {
                    let hashes = progress.load(Ordering::Relaxed);
                    let elapsed = start.elapsed().as_secs_f64();
                    tracing::info!(
                        hashrate = (hashes as f64 / elapsed).round(),
                        hashes,
                        solutions = context.solutions().len(),
                        "progress"
                    );
                    last_report = Instant::now();
                }
            }

            workers.join().map_err(|_| MinerError::WorkerPanicked)?
        })?;

        let report = MineReport {
            attempted: summary.attempted,
            solutions: context.solutions(),
            elapsed: start.elapsed(),
            cancelled: context.is_cancelled(),
        };
        tracing::info!(
            attempted = report.attempted,
            solutions = report.solutions.len(),
            hashrate = report.hashrate().round(),
            "mining finished"
        );
        Ok(report)
    }

    /// One worker: scan `slice` chunk by chunk, publishing progress
    fn scan_slice(
        &self,
        context: &WorkContext,
        slice: RangeInclusive<u32>,
        progress: &AtomicU64,
    ) -> Result<ScanSummary, MinerError> {
        let mut scanner = Scanner::new(Arc::clone(&self.set), self.lanes)?;
        let mut summary = ScanSummary::default();
        let (first, last) = slice.into_inner();
        tracing::debug!(first, last, "worker started");

        let mut base = first;
        loop {
            if context.is_cancelled() {
                break;
            }
            let end = base.saturating_add(self.chunk_size - 1).min(last);
            let part = scanner.scan(
                context.header(),
                base..=end,
                context.target(),
                context.cancel_flag(),
                context,
            );
            progress.fetch_add(part.attempted, Ordering::Relaxed);
            summary.merge(part);

            match end.checked_add(1) {
                Some(next) if end < last => base = next,
                _ => break,
            }
        }

        tracing::debug!(first, last, attempted = summary.attempted, "worker finished");
        Ok(summary)
    }
}

/// Mine `work` with the settings in `config` over its configured nonce range
pub fn mine<S: PrimitiveSet + ?Sized>(
    set: Arc<S>,
    work: Work,
    config: &MinerConfig,
) -> Result<MineReport, MinerError> {
    let miner = Miner::new(set, config)?;
    let context = WorkContext::new(work, config.stop_on_first);
    miner.mine(&context, config.nonce_start..=config.nonce_end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_range_covers_everything_once() {
        let slices = split_range(10..=109, 3);
        assert_eq!(slices, vec![10..=43, 44..=76, 77..=109]);

        let full = split_range(0..=u32::MAX, 7);
        assert_eq!(*full[0].start(), 0);
        assert_eq!(*full[6].end(), u32::MAX);
        for pair in full.windows(2) {
            assert_eq!(*pair[0].end() + 1, *pair[1].start());
        }
    }

    #[test]
    #[allow(clippy::reversed_empty_ranges)]
    fn test_split_range_never_makes_empty_slices() {
        assert_eq!(split_range(5..=7, 8), vec![5..=5, 6..=6, 7..=7]);
        assert!(split_range(1..=0, 4).is_empty());
    }

    #[test]
    fn test_hashrate_of_empty_report() {
        let report = MineReport {
            attempted: 0,
            solutions: Vec::new(),
            elapsed: Duration::ZERO,
            cancelled: false,
        };
        assert_eq!(report.hashrate(), 0.0);
    }
}
