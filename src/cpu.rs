//! Vector capability detection
//!
//! Picks the scanner batch width once at startup. The width only changes
//! throughput; digests are identical for every width.

/// Vector extension the batch width is derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorUnit {
    /// AVX-512, 16 lanes
    Avx512,
    /// AVX2, 8 lanes
    Avx2,
    /// SSE4.1, 4 lanes
    Sse41,
    /// NEON, 4 lanes
    Neon,
    /// No usable vector unit
    Scalar,
}

impl VectorUnit {
    pub const fn lanes(self) -> usize {
        match self {
            VectorUnit::Avx512 => 16,
            VectorUnit::Avx2 => 8,
            VectorUnit::Sse41 | VectorUnit::Neon => 4,
            VectorUnit::Scalar => 1,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            VectorUnit::Avx512 => "avx512",
            VectorUnit::Avx2 => "avx2",
            VectorUnit::Sse41 => "sse4.1",
            VectorUnit::Neon => "neon",
            VectorUnit::Scalar => "scalar",
        }
    }

    /// Best unit available on this CPU
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            if is_x86_feature_detected!("avx512f") && is_x86_feature_detected!("avx512bw") {
                return VectorUnit::Avx512;
            }
            if is_x86_feature_detected!("avx2") {
                return VectorUnit::Avx2;
            }
            if is_x86_feature_detected!("sse4.1") {
                return VectorUnit::Sse41;
            }
        }

        // NEON is mandatory on aarch64
        if cfg!(target_arch = "aarch64") {
            VectorUnit::Neon
        } else {
            VectorUnit::Scalar
        }
    }
}

/// Batch width for this machine
pub fn detect_batch_width() -> usize {
    let unit = VectorUnit::detect();
    tracing::debug!(unit = unit.name(), lanes = unit.lanes(), "detected vector unit");
    unit.lanes()
}
