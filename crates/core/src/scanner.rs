//! Nonce scanner
//!
//! The outer search loop. Each batch writes `lanes` consecutive nonces into
//! the pre-packed header copies, runs the chain once and tests every lane
//! against the target.

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, mpsc};

use crate::chain::Chain;
use crate::error::Result;
use crate::header::HeaderTemplate;
use crate::lanes::LaneBuffer;
use crate::order::OrderCache;
use crate::params::*;
use crate::primitives::PrimitiveSet;
use crate::target::{Target, meets_target};

/// A nonce whose chained digest does not exceed the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Solution {
    pub nonce: u32,
    /// Lane of the batch the nonce was hashed in
    pub lane: usize,
    pub digest: [u8; DIGEST_SIZE],
}

/// Receiver of solutions, shared by every worker of a search
pub trait SolutionSink: Sync {
    fn submit_solution(&self, solution: Solution);
}

impl SolutionSink for Mutex<Vec<Solution>> {
    fn submit_solution(&self, solution: Solution) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(solution);
    }
}

impl SolutionSink for mpsc::Sender<Solution> {
    fn submit_solution(&self, solution: Solution) {
        if self.send(solution).is_err() {
            tracing::warn!(nonce = solution.nonce, "solution receiver dropped");
        }
    }
}

impl<T: SolutionSink + ?Sized> SolutionSink for &T {
    fn submit_solution(&self, solution: Solution) {
        (**self).submit_solution(solution)
    }
}

impl<T: SolutionSink + ?Sized + Send> SolutionSink for Arc<T> {
    fn submit_solution(&self, solution: Solution) {
        (**self).submit_solution(solution)
    }
}

/// Work done by one [`Scanner::scan`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// In-range nonces hashed, including those of a cancelled run
    pub attempted: u64,
    pub solutions: u64,
}

impl ScanSummary {
    pub fn merge(&mut self, other: ScanSummary) {
        self.attempted += other.attempted;
        self.solutions += other.solutions;
    }
}

/// Per-worker search state: chain buffers, order cache and the packed
/// stage-0 headers.
pub struct Scanner<S: ?Sized> {
    chain: Chain<S>,
    orders: OrderCache,
    headers: LaneBuffer,
    digests: Vec<[u8; DIGEST_SIZE]>,
}

impl<S: PrimitiveSet + ?Sized> Scanner<S> {
    /// Build a scanner for a fixed batch width
    pub fn new(set: Arc<S>, lanes: usize) -> Result<Self> {
        let chain = Chain::new(set, lanes)?;
        Ok(Self {
            chain,
            orders: OrderCache::new(),
            headers: LaneBuffer::new(lanes, HEADER_SIZE),
            digests: vec![[0u8; DIGEST_SIZE]; lanes],
        })
    }

    pub fn lanes(&self) -> usize {
        self.chain.lanes()
    }

    pub fn order_cache(&self) -> &OrderCache {
        &self.orders
    }

    /// Search `nonces` for digests `<= target`.
    ///
    /// `cancel` is polled once per batch, so at most one batch runs after it
    /// is raised. Lanes that fall past the end of the range are hashed but
    /// neither counted nor reported.
    pub fn scan(
        &mut self,
        header: &HeaderTemplate,
        nonces: RangeInclusive<u32>,
        target: &Target,
        cancel: &AtomicBool,
        sink: &dyn SolutionSink,
    ) -> ScanSummary {
        let mut summary = ScanSummary::default();
        if nonces.is_empty() {
            return summary;
        }
        let (first, last) = nonces.into_inner();
        let lanes = self.lanes();

        let order = self.orders.resolve(header);
        let packing = self.chain.entry_packing(&order);
        self.headers.fill(header.as_bytes(), packing);

        let mut base = first;
        loop {
            if cancel.load(Ordering::Relaxed) {
                tracing::debug!(base, attempted = summary.attempted, "scan cancelled");
                break;
            }

            self.headers.embed_nonces(NONCE_OFFSET, base);
            self.chain.run(&order, &self.headers, &mut self.digests);

            let in_range = (u64::from(last - base) + 1).min(lanes as u64) as usize;
            for (lane, digest) in self.digests[..in_range].iter().enumerate() {
                if meets_target(digest, target) {
                    let nonce = base + lane as u32;
                    tracing::debug!(nonce, lane, "solution found");
                    sink.submit_solution(Solution {
                        nonce,
                        lane,
                        digest: *digest,
                    });
                    summary.solutions += 1;
                }
            }
            summary.attempted += in_range as u64;

            match base.checked_add(lanes as u32) {
                Some(next) if next <= last => base = next,
                _ => break,
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::DigestSuite;

    #[test]
    fn last_batch_only_counts_lanes_inside_the_range() {
        let mut scanner = Scanner::new(Arc::new(DigestSuite), 4).unwrap();
        let cancel = AtomicBool::new(false);
        let found = Mutex::new(Vec::<Solution>::new());

        let summary = scanner.scan(
            &HeaderTemplate::default(),
            10..=15,
            &Target::MAX,
            &cancel,
            &found,
        );

        assert_eq!(summary.attempted, 6);
        assert_eq!(summary.solutions, 6);
        let nonces: Vec<u32> = found.into_inner().unwrap().iter().map(|s| s.nonce).collect();
        assert_eq!(nonces, vec![10, 11, 12, 13, 14, 15]);
    }

    #[test]
    fn range_ending_at_u32_max_stops_without_wrapping() {
        let mut scanner = Scanner::new(Arc::new(DigestSuite), 8).unwrap();
        let cancel = AtomicBool::new(false);
        let found = Mutex::new(Vec::<Solution>::new());

        let summary = scanner.scan(
            &HeaderTemplate::default(),
            u32::MAX - 2..=u32::MAX,
            &Target::MAX,
            &cancel,
            &found,
        );

        assert_eq!(summary.attempted, 3);
        let found = found.into_inner().unwrap();
        assert!(found.iter().all(|s| s.nonce >= u32::MAX - 2));
    }

    #[test]
    fn empty_range_does_nothing() {
        let mut scanner = Scanner::new(Arc::new(DigestSuite), 2).unwrap();
        let cancel = AtomicBool::new(false);
        let found = Mutex::new(Vec::<Solution>::new());
        #[allow(clippy::reversed_empty_ranges)]
        let summary = scanner.scan(
            &HeaderTemplate::default(),
            5..=4,
            &Target::MAX,
            &cancel,
            &found,
        );
        assert_eq!(summary, ScanSummary::default());
    }

    #[test]
    fn channel_sink_delivers_solutions() {
        let (tx, rx) = mpsc::channel::<Solution>();
        let mut scanner = Scanner::new(Arc::new(DigestSuite), 1).unwrap();
        let cancel = AtomicBool::new(false);

        scanner.scan(&HeaderTemplate::default(), 0..=2, &Target::MAX, &cancel, &tx);
        drop(tx);

        let nonces: Vec<u32> = rx.iter().map(|s| s.nonce).collect();
        assert_eq!(nonces, vec![0, 1, 2]);
    }
}
