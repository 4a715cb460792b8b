//! Algorithm chain
//!
//! Runs the sixteen stages of one order over a batch of lanes:
//!
//! ```text
//! derive-order -> stage[0] -> stage[1] -> ... -> stage[15] -> done
//! ```
//!
//! Stage 0 hashes the per-lane headers, every later stage hashes the full
//! native digest of the stage before it. Between stages the batch is only
//! repacked when the next primitive wants a different layout or group size.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::header::HeaderTemplate;
use crate::lanes::{LaneBuffer, Layout, Packing};
use crate::order::{OrderString, derive_order};
use crate::params::*;
use crate::primitives::{Algorithm, Descriptor, PrimitiveSet};

/// Longest message any stage consumes
const MAX_LANE_LEN: usize = if HEADER_SIZE > MAX_STAGE_DIGEST {
    HEADER_SIZE
} else {
    MAX_STAGE_DIGEST
};

/// Check one bound primitive against what the chain can carry
fn validate(set: &(impl PrimitiveSet + ?Sized), algorithm: Algorithm) -> Result<Descriptor> {
    let descriptor = set.descriptor(algorithm);
    let len = descriptor.digest_len;
    if !(DIGEST_SIZE..=MAX_STAGE_DIGEST).contains(&len) || len % 8 != 0 {
        return Err(Error::InvalidPrimitive {
            algorithm,
            reason: format!("digest of {} bits not supported", len * 8),
        });
    }
    if let Layout::Interleaved(width) = descriptor.layout {
        if HEADER_SIZE % width.bytes() != 0 {
            return Err(Error::InvalidPrimitive {
                algorithm,
                reason: format!("{}-bit interleave cannot carry the header", width.bits()),
            });
        }
    }
    Ok(descriptor)
}

/// Sixteen-stage executor for a fixed batch width.
///
/// Buffers are sized once in [`Chain::new`]; running the chain never
/// allocates.
pub struct Chain<S: ?Sized> {
    set: Arc<S>,
    lanes: usize,
    descriptors: [Descriptor; CHAIN_LENGTH],
    buffers: [LaneBuffer; 2],
}

impl<S: PrimitiveSet + ?Sized> Chain<S> {
    pub fn new(set: Arc<S>, lanes: usize) -> Result<Self> {
        if !BATCH_WIDTHS.contains(&lanes) || !set.supports_batch_width(lanes) {
            return Err(Error::UnsupportedBatchWidth(lanes));
        }

        let mut descriptors = [set.descriptor(Algorithm::Sha512); CHAIN_LENGTH];
        for (slot, algorithm) in descriptors.iter_mut().zip(Algorithm::ALL) {
            *slot = validate(set.as_ref(), algorithm)?;
        }

        Ok(Self {
            set,
            lanes,
            descriptors,
            buffers: [
                LaneBuffer::new(lanes, MAX_LANE_LEN),
                LaneBuffer::new(lanes, MAX_LANE_LEN),
            ],
        })
    }

    pub fn lanes(&self) -> usize {
        self.lanes
    }

    /// Packing `algorithm` consumes at this batch width
    pub fn packing(&self, algorithm: Algorithm) -> Packing {
        let descriptor = &self.descriptors[algorithm.index()];
        Packing::new(descriptor.layout, descriptor.native_lanes.group(self.lanes))
    }

    /// Packing stage 0 expects its headers in
    pub fn entry_packing(&self, order: &OrderString) -> Packing {
        self.packing(order.first())
    }

    /// Run all stages over `input` and write one 32-byte digest per lane.
    ///
    /// `input` may be in any packing; it is repacked when it does not match
    /// the first primitive. `out` must hold at least `lanes` digests.
    pub fn run(
        &mut self,
        order: &OrderString,
        input: &LaneBuffer,
        out: &mut [[u8; DIGEST_SIZE]],
    ) {
        debug_assert_eq!(input.lanes(), self.lanes);
        debug_assert!(out.len() >= self.lanes);

        let set = self.set.as_ref();
        let [a, b] = &mut self.buffers;
        let (mut current, mut spare) = (a, b);

        for (stage, algorithm) in order.iter().enumerate() {
            let descriptor = &self.descriptors[algorithm.index()];
            let group = descriptor.native_lanes.group(self.lanes);
            let packing = Packing::new(descriptor.layout, group);

            let source: &LaneBuffer = if stage == 0 {
                if input.packing() == packing {
                    input
                } else {
                    input.repack_into(packing, spare);
                    core::mem::swap(&mut current, &mut spare);
                    &*current
                }
            } else {
                if current.packing() != packing {
                    current.repack_into(packing, spare);
                    core::mem::swap(&mut current, &mut spare);
                }
                &*current
            };

            let digest_len = descriptor.digest_len;
            let dst = spare.reshape(digest_len, packing);
            for (message, digest) in source
                .groups(group)
                .zip(dst.chunks_exact_mut(group * digest_len))
            {
                set.digest(algorithm, group, message, digest);
            }

            core::mem::swap(&mut current, &mut spare);
        }

        for (lane, digest) in out[..self.lanes].iter_mut().enumerate() {
            current.read_lane(lane, digest);
        }
    }

    /// Hash one header per lane, each with its own nonce already in place
    pub fn hash_headers(
        &mut self,
        order: &OrderString,
        headers: &[HeaderTemplate],
        out: &mut [[u8; DIGEST_SIZE]],
    ) {
        debug_assert_eq!(headers.len(), self.lanes);
        let scalar: Vec<u8> = headers
            .iter()
            .flat_map(|header| header.as_bytes().iter().copied())
            .collect();
        let mut input = LaneBuffer::new(self.lanes, HEADER_SIZE);
        input.load_scalar(&scalar, HEADER_SIZE);
        self.run(order, &input, out);
    }
}

/// Hash one header through `order`, one lane at a time
pub fn hash_with_order(
    set: &(impl PrimitiveSet + ?Sized),
    order: &OrderString,
    header: &HeaderTemplate,
) -> Result<[u8; DIGEST_SIZE]> {
    let mut message = [0u8; MAX_LANE_LEN];
    message[..HEADER_SIZE].copy_from_slice(header.as_bytes());
    let mut len = HEADER_SIZE;
    let mut digest = [0u8; MAX_STAGE_DIGEST];

    for algorithm in order.iter() {
        let descriptor = validate(set, algorithm)?;
        set.digest(algorithm, 1, &message[..len], &mut digest[..descriptor.digest_len]);
        len = descriptor.digest_len;
        message[..len].copy_from_slice(&digest[..len]);
    }

    let mut result = [0u8; DIGEST_SIZE];
    result.copy_from_slice(&message[..DIGEST_SIZE]);
    Ok(result)
}

/// Chained digest of a single header
pub fn hash_header(
    set: &(impl PrimitiveSet + ?Sized),
    header: &HeaderTemplate,
) -> Result<[u8; DIGEST_SIZE]> {
    hash_with_order(set, &derive_order(header), header)
}
