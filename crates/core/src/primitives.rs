//! Hash primitives for the sixteen chain stages
//!
//! Every primitive exposes the same init/update/close lifecycle through
//! [`HashPrimitive`]. Scalar primitives hash one lane per invocation; the
//! lane-native engines consume several lanes at once straight out of an
//! interleaved buffer, the way multi-way SIMD kernels do.
//!
//! A [`PrimitiveSet`] binds the sixteen [`Algorithm`] slots to concrete
//! primitives through an exhaustive `match`, so the chain dispatches without
//! trait objects.

use core::fmt;
use core::marker::PhantomData;

use digest::{Digest, ExtendableOutput, Update};
use sha2::digest::generic_array::GenericArray;

use crate::lanes::{ElementWidth, Layout};
use crate::params::*;

/// Identifier of one of the sixteen chain slots.
///
/// The discriminant is the order-string symbol (`0`-`9`, `A`-`F`). Variant
/// names describe the primitive [`DigestSuite`] binds to each slot; other
/// sets may bind different primitives. Groestl, Keccak, Shabal, Whirlpool
/// and SHA-512 sit in their X16R slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Algorithm {
    Blake2b = 0,
    Blake3 = 1,
    Groestl = 2,
    Streebog = 3,
    Keccak = 4,
    Sha3 = 5,
    Shake256 = 6,
    Ripemd320 = 7,
    Blake2s = 8,
    Sha256 = 9,
    Shake128 = 10,
    Sha384 = 11,
    Sm3 = 12,
    Shabal = 13,
    Whirlpool = 14,
    Sha512 = 15,
}

impl Algorithm {
    pub const ALL: [Algorithm; CHAIN_LENGTH] = [
        Algorithm::Blake2b,
        Algorithm::Blake3,
        Algorithm::Groestl,
        Algorithm::Streebog,
        Algorithm::Keccak,
        Algorithm::Sha3,
        Algorithm::Shake256,
        Algorithm::Ripemd320,
        Algorithm::Blake2s,
        Algorithm::Sha256,
        Algorithm::Shake128,
        Algorithm::Sha384,
        Algorithm::Sm3,
        Algorithm::Shabal,
        Algorithm::Whirlpool,
        Algorithm::Sha512,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Map an order-string symbol to its slot
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '0'..='9' => Self::from_index(symbol as u8 - b'0'),
            'A'..='F' => Self::from_index(symbol as u8 - b'A' + 10),
            _ => None,
        }
    }

    pub const fn symbol(self) -> char {
        b"0123456789ABCDEF"[self as usize] as char
    }

    pub const fn name(self) -> &'static str {
        match self {
            Algorithm::Sha512 => "sha512",
            Algorithm::Blake2b => "blake2b",
            Algorithm::Groestl => "groestl",
            Algorithm::Blake3 => "blake3",
            Algorithm::Streebog => "streebog",
            Algorithm::Keccak => "keccak",
            Algorithm::Sha3 => "sha3",
            Algorithm::Shake256 => "shake256",
            Algorithm::Ripemd320 => "ripemd320",
            Algorithm::Blake2s => "blake2s",
            Algorithm::Sha256 => "sha256",
            Algorithm::Shake128 => "shake128",
            Algorithm::Sha384 => "sha384",
            Algorithm::Shabal => "shabal",
            Algorithm::Whirlpool => "whirlpool",
            Algorithm::Sm3 => "sm3",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How many lanes a primitive hashes per invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeLanes {
    One,
    Two,
    Four,
    /// Whatever the scanner's batch width is
    Batch,
}

impl NativeLanes {
    /// Lanes per invocation for a given batch width
    pub const fn group(self, batch: usize) -> usize {
        let native = match self {
            NativeLanes::One => 1,
            NativeLanes::Two => 2,
            NativeLanes::Four => 4,
            NativeLanes::Batch => batch,
        };
        if native < batch { native } else { batch }
    }
}

/// Static facts the chain needs about a bound primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub algorithm: Algorithm,
    pub layout: Layout,
    pub native_lanes: NativeLanes,
    /// Native digest size in bytes
    pub digest_len: usize,
}

/// Uniform init/update/close lifecycle.
///
/// `update` receives `lanes` messages in [`HashPrimitive::layout`] and
/// `close` writes `lanes` digests in the same layout. The state lives only
/// for one invocation.
pub trait HashPrimitive {
    type State;

    fn layout(&self) -> Layout;

    fn native_lanes(&self) -> NativeLanes;

    fn digest_bits(&self) -> usize;

    fn init(&self, lanes: usize, digest_bits: usize) -> Self::State;

    fn update(&self, state: &mut Self::State, data: &[u8]);

    fn close(&self, state: Self::State, out: &mut [u8]);

    /// Full lifecycle over one group of lanes
    fn digest(&self, lanes: usize, input: &[u8], out: &mut [u8]) {
        let mut state = self.init(lanes, self.digest_bits());
        self.update(&mut state, input);
        self.close(state, out);
    }

    fn describe(&self, algorithm: Algorithm) -> Descriptor {
        Descriptor {
            algorithm,
            layout: self.layout(),
            native_lanes: self.native_lanes(),
            digest_len: self.digest_bits() / 8,
        }
    }
}

/// Any fixed-output RustCrypto digest, one lane at a time
pub struct Scalar<D>(PhantomData<fn() -> D>);

impl<D> Scalar<D> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<D> Default for Scalar<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Digest> HashPrimitive for Scalar<D> {
    type State = D;

    fn layout(&self) -> Layout {
        Layout::Scalar
    }

    fn native_lanes(&self) -> NativeLanes {
        NativeLanes::One
    }

    fn digest_bits(&self) -> usize {
        <D as Digest>::output_size() * 8
    }

    fn init(&self, lanes: usize, digest_bits: usize) -> D {
        debug_assert_eq!(lanes, 1);
        debug_assert_eq!(digest_bits, self.digest_bits());
        D::new()
    }

    fn update(&self, state: &mut D, data: &[u8]) {
        Digest::update(state, data);
    }

    fn close(&self, state: D, out: &mut [u8]) {
        out.copy_from_slice(&state.finalize());
    }
}

/// Extendable-output function truncated to a fixed digest size
pub struct Xof<X> {
    bits: usize,
    _xof: PhantomData<fn() -> X>,
}

impl<X> Xof<X> {
    pub const fn new(bits: usize) -> Self {
        Self {
            bits,
            _xof: PhantomData,
        }
    }
}

impl<X: Default + Update + ExtendableOutput> HashPrimitive for Xof<X> {
    type State = X;

    fn layout(&self) -> Layout {
        Layout::Scalar
    }

    fn native_lanes(&self) -> NativeLanes {
        NativeLanes::One
    }

    fn digest_bits(&self) -> usize {
        self.bits
    }

    fn init(&self, lanes: usize, _digest_bits: usize) -> X {
        debug_assert_eq!(lanes, 1);
        X::default()
    }

    fn update(&self, state: &mut X, data: &[u8]) {
        Update::update(state, data);
    }

    fn close(&self, state: X, out: &mut [u8]) {
        state.finalize_xof_into(out);
    }
}

/// BLAKE3 in extendable-output mode
pub struct Blake3Xof {
    bits: usize,
}

impl Blake3Xof {
    pub const fn new(bits: usize) -> Self {
        Self { bits }
    }
}

impl HashPrimitive for Blake3Xof {
    type State = blake3::Hasher;

    fn layout(&self) -> Layout {
        Layout::Scalar
    }

    fn native_lanes(&self) -> NativeLanes {
        NativeLanes::One
    }

    fn digest_bits(&self) -> usize {
        self.bits
    }

    fn init(&self, lanes: usize, _digest_bits: usize) -> blake3::Hasher {
        debug_assert_eq!(lanes, 1);
        blake3::Hasher::new()
    }

    fn update(&self, state: &mut blake3::Hasher, data: &[u8]) {
        state.update(data);
    }

    fn close(&self, state: blake3::Hasher, out: &mut [u8]) {
        state.finalize_xof().fill(out);
    }
}

/// Block-oriented hash that can run over interleaved lanes.
///
/// Each lane keeps its own chaining value; message words are gathered from
/// the interleaved input into per-lane blocks, so no scalar copy of the
/// batch is ever made.
pub trait BlockEngine {
    /// Word size the lanes are interleaved at
    const WIDTH: ElementWidth;
    /// Block (or sponge rate) in bytes, a multiple of `WIDTH`
    const BLOCK: usize;
    /// Digest size in bytes, a multiple of `WIDTH`
    const DIGEST: usize;

    type Chaining: Copy;

    fn iv() -> Self::Chaining;

    fn compress(state: &mut Self::Chaining, block: &[u8]);

    /// Pad `tail`, absorb it and write the digest
    fn finalize(state: &mut Self::Chaining, tail: &[u8], total: u64, out: &mut [u8]);
}

const MAX_BLOCK: usize = 128;

/// Per-invocation state of an [`Interleaved`] primitive
pub struct LaneState<E: BlockEngine> {
    lanes: usize,
    chaining: [E::Chaining; MAX_LANES],
    pending: [[u8; MAX_BLOCK]; MAX_LANES],
    filled: usize,
    total: u64,
}

/// Lane-native primitive driving a [`BlockEngine`]
pub struct Interleaved<E> {
    lanes: NativeLanes,
    _engine: PhantomData<fn() -> E>,
}

impl<E> Interleaved<E> {
    pub const fn new(lanes: NativeLanes) -> Self {
        Self {
            lanes,
            _engine: PhantomData,
        }
    }
}

impl<E: BlockEngine> HashPrimitive for Interleaved<E> {
    type State = LaneState<E>;

    fn layout(&self) -> Layout {
        Layout::Interleaved(E::WIDTH)
    }

    fn native_lanes(&self) -> NativeLanes {
        self.lanes
    }

    fn digest_bits(&self) -> usize {
        E::DIGEST * 8
    }

    fn init(&self, lanes: usize, digest_bits: usize) -> LaneState<E> {
        debug_assert!(lanes >= 1 && lanes <= MAX_LANES);
        debug_assert_eq!(digest_bits, self.digest_bits());
        LaneState {
            lanes,
            chaining: [E::iv(); MAX_LANES],
            pending: [[0u8; MAX_BLOCK]; MAX_LANES],
            filled: 0,
            total: 0,
        }
    }

    fn update(&self, state: &mut LaneState<E>, data: &[u8]) {
        let w = E::WIDTH.bytes();
        let lanes = state.lanes;
        debug_assert_eq!(data.len() % (w * lanes), 0);

        for slot in data.chunks_exact(w * lanes) {
            let at = state.filled;
            for (pending, word) in state.pending.iter_mut().zip(slot.chunks_exact(w)) {
                pending[at..at + w].copy_from_slice(word);
            }
            state.filled += w;

            if state.filled == E::BLOCK {
                for (chaining, pending) in state.chaining[..lanes].iter_mut().zip(&state.pending) {
                    E::compress(chaining, &pending[..E::BLOCK]);
                }
                state.filled = 0;
            }
        }
        state.total += (data.len() / lanes) as u64;
    }

    fn close(&self, mut state: LaneState<E>, out: &mut [u8]) {
        let w = E::WIDTH.bytes();
        let lanes = state.lanes;
        let mut digest = [0u8; MAX_STAGE_DIGEST];

        for lane in 0..lanes {
            E::finalize(
                &mut state.chaining[lane],
                &state.pending[lane][..state.filled],
                state.total,
                &mut digest[..E::DIGEST],
            );
            for (k, word) in digest[..E::DIGEST].chunks_exact(w).enumerate() {
                let at = (k * lanes + lane) * w;
                out[at..at + w].copy_from_slice(word);
            }
        }
    }
}

#[inline(always)]
fn le64(bytes: &[u8]) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(bytes);
    u64::from_le_bytes(word)
}

/// Merkle-Damgard padding: 0x80, zeros, big-endian bit length of `LEN` bytes
fn md_pad<const LEN: usize>(tail: &[u8], total: u64, block: usize, buf: &mut [u8]) -> usize {
    buf[..tail.len()].copy_from_slice(tail);
    buf[tail.len()] = 0x80;
    let blocks = if tail.len() + 1 + LEN > block { 2 } else { 1 };
    let end = blocks * block;
    buf[tail.len() + 1..end].fill(0);
    let bits = (total as u128) * 8;
    buf[end - LEN..end].copy_from_slice(&bits.to_be_bytes()[16 - LEN..]);
    end
}

/// SHA-512 over the `sha2` compression function
pub struct Sha512Engine;

const SHA512_IV: [u64; 8] = [
    0x6a09e667f3bcc908,
    0xbb67ae8584caa73b,
    0x3c6ef372fe94f82b,
    0xa54ff53a5f1d36f1,
    0x510e527fade682d1,
    0x9b05688c2b3e6c1f,
    0x1f83d9abfb41bd6b,
    0x5be0cd19137e2179,
];

impl BlockEngine for Sha512Engine {
    const WIDTH: ElementWidth = ElementWidth::W64;
    const BLOCK: usize = 128;
    const DIGEST: usize = 64;

    type Chaining = [u64; 8];

    fn iv() -> [u64; 8] {
        SHA512_IV
    }

    fn compress(state: &mut [u64; 8], block: &[u8]) {
        sha2::compress512(state, &[GenericArray::clone_from_slice(block)]);
    }

    fn finalize(state: &mut [u64; 8], tail: &[u8], total: u64, out: &mut [u8]) {
        let mut buf = [0u8; 2 * 128];
        let end = md_pad::<16>(tail, total, Self::BLOCK, &mut buf);
        for block in buf[..end].chunks_exact(Self::BLOCK) {
            Self::compress(state, block);
        }
        for (chunk, word) in out.chunks_exact_mut(8).zip(state.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
    }
}

/// SHA-256 over the `sha2` compression function
pub struct Sha256Engine;

const SHA256_IV: [u32; 8] = [
    0x6a09e667, 0xbb67ae85, 0x3c6ef372, 0xa54ff53a, 0x510e527f, 0x9b05688c, 0x1f83d9ab, 0x5be0cd19,
];

impl BlockEngine for Sha256Engine {
    const WIDTH: ElementWidth = ElementWidth::W32;
    const BLOCK: usize = 64;
    const DIGEST: usize = 32;

    type Chaining = [u32; 8];

    fn iv() -> [u32; 8] {
        SHA256_IV
    }

    fn compress(state: &mut [u32; 8], block: &[u8]) {
        sha2::compress256(state, &[GenericArray::clone_from_slice(block)]);
    }

    fn finalize(state: &mut [u32; 8], tail: &[u8], total: u64, out: &mut [u8]) {
        let mut buf = [0u8; 2 * 64];
        let end = md_pad::<8>(tail, total, Self::BLOCK, &mut buf);
        for block in buf[..end].chunks_exact(Self::BLOCK) {
            Self::compress(state, block);
        }
        for (chunk, word) in out.chunks_exact_mut(4).zip(state.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
    }
}

/// Keccak-512 (pre-standard 0x01 padding) over `keccak::f1600`
pub struct Keccak512Engine;

impl BlockEngine for Keccak512Engine {
    const WIDTH: ElementWidth = ElementWidth::W64;
    // rate = 1600 - 2 * 512 bits
    const BLOCK: usize = 72;
    const DIGEST: usize = 64;

    type Chaining = [u64; 25];

    fn iv() -> [u64; 25] {
        [0u64; 25]
    }

    fn compress(state: &mut [u64; 25], block: &[u8]) {
        for (lane, word) in state.iter_mut().zip(block.chunks_exact(8)) {
            *lane ^= le64(word);
        }
        keccak::f1600(state);
    }

    fn finalize(state: &mut [u64; 25], tail: &[u8], _total: u64, out: &mut [u8]) {
        let mut block = [0u8; 72];
        block[..tail.len()].copy_from_slice(tail);
        block[tail.len()] ^= 0x01;
        block[Self::BLOCK - 1] ^= 0x80;
        Self::compress(state, &block);
        for (chunk, word) in out.chunks_exact_mut(8).zip(state.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
    }
}

/// Binding of the sixteen slots to primitives
pub trait PrimitiveSet: Send + Sync {
    fn descriptor(&self, algorithm: Algorithm) -> Descriptor;

    /// Hash one group of `lanes` messages packed in the descriptor's layout
    fn digest(&self, algorithm: Algorithm, lanes: usize, input: &[u8], output: &mut [u8]);

    fn supports_batch_width(&self, lanes: usize) -> bool {
        BATCH_WIDTHS.contains(&lanes)
    }
}

const SHA512: Interleaved<Sha512Engine> = Interleaved::new(NativeLanes::Batch);
const BLAKE2B: Scalar<blake2::Blake2b512> = Scalar::new();
const GROESTL: Scalar<groestl::Groestl512> = Scalar::new();
const BLAKE3: Blake3Xof = Blake3Xof::new(512);
const STREEBOG: Scalar<streebog::Streebog512> = Scalar::new();
const KECCAK: Interleaved<Keccak512Engine> = Interleaved::new(NativeLanes::Two);
const SHA3: Scalar<sha3::Sha3_512> = Scalar::new();
const SHAKE256: Xof<sha3::Shake256> = Xof::new(512);
const RIPEMD320: Scalar<ripemd::Ripemd320> = Scalar::new();
const BLAKE2S: Scalar<blake2::Blake2s256> = Scalar::new();
const SHA256: Interleaved<Sha256Engine> = Interleaved::new(NativeLanes::Four);
const SHAKE128: Xof<sha3::Shake128> = Xof::new(512);
const SHA384: Scalar<sha2::Sha384> = Scalar::new();
const SHABAL: Scalar<shabal::Shabal512> = Scalar::new();
const WHIRLPOOL: Scalar<whirlpool::Whirlpool> = Scalar::new();
const SM3: Scalar<sm3::Sm3> = Scalar::new();

/// Built-in set of sixteen RustCrypto / BLAKE3 primitives
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestSuite;

impl PrimitiveSet for DigestSuite {
    fn descriptor(&self, algorithm: Algorithm) -> Descriptor {
        match algorithm {
            Algorithm::Sha512 => SHA512.describe(algorithm),
            Algorithm::Blake2b => BLAKE2B.describe(algorithm),
            Algorithm::Groestl => GROESTL.describe(algorithm),
            Algorithm::Blake3 => BLAKE3.describe(algorithm),
            Algorithm::Streebog => STREEBOG.describe(algorithm),
            Algorithm::Keccak => KECCAK.describe(algorithm),
            Algorithm::Sha3 => SHA3.describe(algorithm),
            Algorithm::Shake256 => SHAKE256.describe(algorithm),
            Algorithm::Ripemd320 => RIPEMD320.describe(algorithm),
            Algorithm::Blake2s => BLAKE2S.describe(algorithm),
            Algorithm::Sha256 => SHA256.describe(algorithm),
            Algorithm::Shake128 => SHAKE128.describe(algorithm),
            Algorithm::Sha384 => SHA384.describe(algorithm),
            Algorithm::Shabal => SHABAL.describe(algorithm),
            Algorithm::Whirlpool => WHIRLPOOL.describe(algorithm),
            Algorithm::Sm3 => SM3.describe(algorithm),
        }
    }

    fn digest(&self, algorithm: Algorithm, lanes: usize, input: &[u8], output: &mut [u8]) {
        match algorithm {
            Algorithm::Sha512 => SHA512.digest(lanes, input, output),
            Algorithm::Blake2b => BLAKE2B.digest(lanes, input, output),
            Algorithm::Groestl => GROESTL.digest(lanes, input, output),
            Algorithm::Blake3 => BLAKE3.digest(lanes, input, output),
            Algorithm::Streebog => STREEBOG.digest(lanes, input, output),
            Algorithm::Keccak => KECCAK.digest(lanes, input, output),
            Algorithm::Sha3 => SHA3.digest(lanes, input, output),
            Algorithm::Shake256 => SHAKE256.digest(lanes, input, output),
            Algorithm::Ripemd320 => RIPEMD320.digest(lanes, input, output),
            Algorithm::Blake2s => BLAKE2S.digest(lanes, input, output),
            Algorithm::Sha256 => SHA256.digest(lanes, input, output),
            Algorithm::Shake128 => SHAKE128.digest(lanes, input, output),
            Algorithm::Sha384 => SHA384.digest(lanes, input, output),
            Algorithm::Shabal => SHABAL.digest(lanes, input, output),
            Algorithm::Whirlpool => WHIRLPOOL.digest(lanes, input, output),
            Algorithm::Sm3 => SM3.digest(lanes, input, output),
        }
    }
}
