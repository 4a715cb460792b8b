//! Order string derivation and the per-worker order cache
//!
//! The stage order depends only on header fields that stay fixed during a
//! nonce search:
//!
//! ```text
//! seed   = bswap32(header[4..8]) || bswap32(header[8..12])
//! digest = SHA-512(seed)
//! order  = hex(low nibble of digest[i]) for i in 0..16
//! ```

use core::fmt;
use core::str::FromStr;

use sha2::{Digest, Sha512};

use crate::error::Error;
use crate::header::HeaderTemplate;
use crate::params::CHAIN_LENGTH;
use crate::primitives::Algorithm;

/// Sixteen slot identifiers in stage order
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderString([Algorithm; CHAIN_LENGTH]);

impl OrderString {
    pub const fn new(stages: [Algorithm; CHAIN_LENGTH]) -> Self {
        Self(stages)
    }

    pub fn stages(&self) -> &[Algorithm; CHAIN_LENGTH] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = Algorithm> + '_ {
        self.0.iter().copied()
    }

    pub fn first(&self) -> Algorithm {
        self.0[0]
    }
}

impl fmt::Display for OrderString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for algorithm in &self.0 {
            write!(f, "{}", algorithm.symbol())?;
        }
        Ok(())
    }
}

impl fmt::Debug for OrderString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OrderString({self})")
    }
}

impl FromStr for OrderString {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        if s.chars().count() != CHAIN_LENGTH {
            return Err(Error::InvalidOrder(format!(
                "expected {CHAIN_LENGTH} symbols, got {:?}",
                s
            )));
        }
        let mut stages = [Algorithm::Sha512; CHAIN_LENGTH];
        for (stage, symbol) in stages.iter_mut().zip(s.chars()) {
            *stage = Algorithm::from_symbol(symbol.to_ascii_uppercase())
                .ok_or_else(|| Error::InvalidOrder(format!("bad symbol {symbol:?} in {s:?}")))?;
        }
        Ok(Self(stages))
    }
}

/// Derive the stage order for a header.
///
/// Independent of the nonce and of the primitive set in use.
pub fn derive_order(header: &HeaderTemplate) -> OrderString {
    let digest = Sha512::digest(header.order_seed());
    let mut stages = [Algorithm::Sha512; CHAIN_LENGTH];
    for (stage, byte) in stages.iter_mut().zip(digest.iter()) {
        // low nibble is always < 16
        *stage = Algorithm::ALL[(byte & 0x0F) as usize];
    }
    OrderString(stages)
}

/// Last derived order, keyed by the header time and seed words.
///
/// Owned by one scanner, never shared.
#[derive(Debug, Default)]
pub struct OrderCache {
    entry: Option<CacheEntry>,
    derivations: u64,
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    time: u32,
    seed: [u8; 8],
    order: OrderString,
}

impl OrderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached order for `header`, deriving it when the key changed
    pub fn resolve(&mut self, header: &HeaderTemplate) -> OrderString {
        let time = header.time();
        let seed = header.order_seed();

        if let Some(entry) = &self.entry {
            if entry.time == time && entry.seed == seed {
                return entry.order;
            }
        }

        let order = derive_order(header);
        self.derivations += 1;
        tracing::debug!(%order, time = %format!("{time:08x}"), "hash order");
        self.entry = Some(CacheEntry { time, seed, order });
        order
    }

    /// How many times the order had to be derived
    pub fn derivations(&self) -> u64 {
        self.derivations
    }
}
