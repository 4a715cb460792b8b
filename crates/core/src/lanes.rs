//! Lane packing
//!
//! A batch of `lanes` messages can live in two shapes:
//!
//! ```text
//! scalar:       | lane 0 bytes | lane 1 bytes | ... | lane n-1 bytes |
//! interleaved:  | l0 w0 | l1 w0 | ... | ln w0 | l0 w1 | l1 w1 | ...    |
//! ```
//!
//! where `wk` is the k-th 32- or 64-bit word of a lane. Primitives that hash
//! several lanes at once consume the interleaved shape, scalar primitives the
//! other one. [`LaneBuffer`] tracks which shape a batch is currently in so
//! the chain only reformats when two consecutive primitives disagree.

use crate::params::MAX_LANES;

/// Word size used when interleaving lanes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementWidth {
    W32,
    W64,
}

impl ElementWidth {
    pub const fn bytes(self) -> usize {
        match self {
            ElementWidth::W32 => 4,
            ElementWidth::W64 => 8,
        }
    }

    pub const fn bits(self) -> usize {
        self.bytes() * 8
    }
}

/// Byte layout a primitive expects its lanes in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// One contiguous buffer per lane
    Scalar,
    /// Lanes packed word by word
    Interleaved(ElementWidth),
}

/// Layout of a whole batch: consecutive groups of `group` lanes, each group
/// laid out according to `layout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Packing {
    pub layout: Layout,
    pub group: usize,
}

impl Packing {
    pub const SCALAR: Packing = Packing {
        layout: Layout::Scalar,
        group: 1,
    };

    pub fn new(layout: Layout, group: usize) -> Self {
        match layout {
            // group size is meaningless without interleaving
            Layout::Scalar => Self::SCALAR,
            Layout::Interleaved(_) if group <= 1 => Self::SCALAR,
            Layout::Interleaved(_) => Self { layout, group },
        }
    }

    /// Position of byte `offset` of `lane` inside a buffer of this packing
    #[inline(always)]
    pub fn position(&self, lane: usize, offset: usize, lane_len: usize) -> usize {
        match self.layout {
            Layout::Scalar => lane * lane_len + offset,
            Layout::Interleaved(width) => {
                let w = width.bytes();
                let group_base = (lane / self.group) * self.group * lane_len;
                let slot = (offset / w) * self.group + lane % self.group;
                group_base + slot * w + offset % w
            }
        }
    }
}

/// Interleave `lanes` contiguous buffers of `lane_len` bytes into `packed`.
///
/// `lane_len` must be a multiple of the element width.
pub fn interleave(
    scalar: &[u8],
    lane_len: usize,
    lanes: usize,
    width: ElementWidth,
    packed: &mut [u8],
) {
    let w = width.bytes();
    debug_assert_eq!(lane_len % w, 0);
    debug_assert!(scalar.len() >= lanes * lane_len && packed.len() >= lanes * lane_len);

    for (k, slot) in packed[..lanes * lane_len].chunks_exact_mut(w * lanes).enumerate() {
        for (lane, word) in slot.chunks_exact_mut(w).enumerate() {
            let src = lane * lane_len + k * w;
            word.copy_from_slice(&scalar[src..src + w]);
        }
    }
}

/// Exact inverse of [`interleave`]
pub fn deinterleave(
    packed: &[u8],
    lane_len: usize,
    lanes: usize,
    width: ElementWidth,
    scalar: &mut [u8],
) {
    let w = width.bytes();
    debug_assert_eq!(lane_len % w, 0);
    debug_assert!(scalar.len() >= lanes * lane_len && packed.len() >= lanes * lane_len);

    for (k, slot) in packed[..lanes * lane_len].chunks_exact(w * lanes).enumerate() {
        for (lane, word) in slot.chunks_exact(w).enumerate() {
            let dst = lane * lane_len + k * w;
            scalar[dst..dst + w].copy_from_slice(word);
        }
    }
}

/// A batch of equally sized lane messages together with their packing.
///
/// Storage is allocated once for the largest message the owner will ever
/// hold; stages only change `lane_len` and `packing`.
#[derive(Debug, Clone)]
pub struct LaneBuffer {
    data: Vec<u8>,
    lanes: usize,
    lane_len: usize,
    packing: Packing,
}

impl LaneBuffer {
    pub fn new(lanes: usize, max_lane_len: usize) -> Self {
        debug_assert!(lanes >= 1 && lanes <= MAX_LANES);
        Self {
            data: vec![0u8; lanes * max_lane_len],
            lanes,
            lane_len: 0,
            packing: Packing::SCALAR,
        }
    }

    pub fn lanes(&self) -> usize {
        self.lanes
    }

    pub fn lane_len(&self) -> usize {
        self.lane_len
    }

    pub fn packing(&self) -> Packing {
        self.packing
    }

    /// Bytes of the whole batch in the current packing
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.lanes * self.lane_len]
    }

    /// Reset the shape and expose the storage for `lane_len`-byte lanes
    pub(crate) fn reshape(&mut self, lane_len: usize, packing: Packing) -> &mut [u8] {
        self.lane_len = lane_len;
        self.packing = packing;
        &mut self.data[..self.lanes * lane_len]
    }

    /// Split the storage into `group`-lane chunks for the current shape
    pub(crate) fn groups(&self, group: usize) -> core::slice::ChunksExact<'_, u8> {
        self.as_bytes().chunks_exact(group * self.lane_len)
    }

    /// Broadcast one message into every lane, using `packing`
    pub fn fill(&mut self, message: &[u8], packing: Packing) {
        let len = message.len();
        let lanes = self.lanes;
        let out = self.reshape(len, packing);
        for lane in 0..lanes {
            for (offset, byte) in message.iter().enumerate() {
                out[packing.position(lane, offset, len)] = *byte;
            }
        }
    }

    /// Load per-lane messages laid out contiguously
    pub fn load_scalar(&mut self, scalar: &[u8], lane_len: usize) {
        let lanes = self.lanes;
        self.reshape(lane_len, Packing::SCALAR)
            .copy_from_slice(&scalar[..lanes * lane_len]);
    }

    /// Overwrite this buffer with `other`'s contents and shape
    pub fn copy_from(&mut self, other: &LaneBuffer) {
        debug_assert_eq!(self.lanes, other.lanes);
        self.reshape(other.lane_len, other.packing)
            .copy_from_slice(other.as_bytes());
    }

    /// Reformat into `dst` using `packing`
    pub fn repack_into(&self, packing: Packing, dst: &mut LaneBuffer) {
        debug_assert_eq!(self.lanes, dst.lanes);
        let lane_len = self.lane_len;

        if packing == self.packing {
            dst.copy_from(self);
            return;
        }

        // interleaved -> interleaved goes through per-lane gathers so both
        // sides may use different widths or group sizes
        let from = self.packing;
        let src = self.as_bytes();
        let out = dst.reshape(lane_len, packing);
        match (from.layout, packing.layout) {
            (Layout::Interleaved(width), Layout::Scalar) => {
                let group_len = from.group * lane_len;
                for (packed, scalar) in src
                    .chunks_exact(group_len)
                    .zip(out.chunks_exact_mut(group_len))
                {
                    deinterleave(packed, lane_len, from.group, width, scalar);
                }
            }
            (Layout::Scalar, Layout::Interleaved(width)) => {
                let group_len = packing.group * lane_len;
                for (scalar, packed) in src
                    .chunks_exact(group_len)
                    .zip(out.chunks_exact_mut(group_len))
                {
                    interleave(scalar, lane_len, packing.group, width, packed);
                }
            }
            _ => {
                let w = match packing.layout {
                    Layout::Interleaved(width) => width.bytes(),
                    Layout::Scalar => lane_len,
                };
                for lane in 0..self.lanes {
                    for offset in (0..lane_len).step_by(w) {
                        let to = packing.position(lane, offset, lane_len);
                        for b in 0..w {
                            out[to + b] = src[from.position(lane, offset + b, lane_len)];
                        }
                    }
                }
            }
        }
    }

    /// Gather `out.len()` leading bytes of `lane`
    pub fn read_lane(&self, lane: usize, out: &mut [u8]) {
        debug_assert!(out.len() <= self.lane_len);
        let src = self.as_bytes();
        for (offset, byte) in out.iter_mut().enumerate() {
            *byte = src[self.packing.position(lane, offset, self.lane_len)];
        }
    }

    /// Write `bytes` at `offset` of `lane` in the current packing
    pub fn write_lane(&mut self, lane: usize, offset: usize, bytes: &[u8]) {
        let packing = self.packing;
        let lane_len = self.lane_len;
        for (i, byte) in bytes.iter().enumerate() {
            let pos = packing.position(lane, offset + i, lane_len);
            self.data[pos] = *byte;
        }
    }

    /// Write the little-endian nonce `base + lane` into every lane at `offset`
    pub fn embed_nonces(&mut self, offset: usize, base: u32) {
        for lane in 0..self.lanes {
            let nonce = base.wrapping_add(lane as u32);
            self.write_lane(lane, offset, &nonce.to_le_bytes());
        }
    }
}
