//! Parallel processing calibration and CTR work dispatch.

pub(crate) mod ctr;

use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, Result};

/// Default per-core L1 data cache assumption when the size can not be
/// probed.
const L1_CACHE_PER_CORE: usize = 32 * 1024;
/// Fallback data-cache budget per thread for user-defined profiles.
const DEF_DATA_CACHE: usize = 16 * 1024;

/// The widest SIMD instruction set detected on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SimdProfile {
    /// No wide vector support.
    None,
    /// 128-bit lanes (AVX).
    Avx,
    /// 256-bit lanes (AVX2).
    Avx2,
    /// 512-bit lanes (AVX-512F).
    Avx512,
}

impl SimdProfile {
    /// Probe the host CPU.
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            if is_x86_feature_detected!("avx512f") {
                return Self::Avx512;
            }
            if is_x86_feature_detected!("avx2") {
                return Self::Avx2;
            }
            if is_x86_feature_detected!("avx") {
                return Self::Avx;
            }
            Self::None
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            Self::None
        }
    }

    /// The number of 128-bit cipher blocks a staggered batch covers.
    pub fn lane_count(self) -> usize {
        match self {
            Self::Avx512 => 16,
            Self::Avx2 => 8,
            Self::Avx => 4,
            Self::None => 1,
        }
    }
}

/// System parallel-processing capabilities and the derived work geometry
/// for one algorithm instance.
///
/// The invariants maintained by every recalculation:
/// `parallel_min_size = max_degree * block_size * simd_lanes` (lanes only
/// when the SIMD multiplier is enabled), and `parallel_block_size` is a
/// non-zero whole multiple of `parallel_min_size`.
#[derive(Debug, Clone)]
pub struct ParallelOptions {
    block_size: usize,
    is_parallel: bool,
    l1_cache_reserved: usize,
    l1_cache_total: usize,
    override_max_degree: bool,
    parallel_block_size: usize,
    parallel_max_degree: usize,
    parallel_min_size: usize,
    physical_cores: usize,
    processor_count: usize,
    simd_profile: SimdProfile,
    simd_multiply: bool,
    split_channel: bool,
    default_params: (bool, usize, usize),
}

impl ParallelOptions {
    /// Auto-calibrated options.
    ///
    /// * `block_size` — the algorithm's base block in bytes; must be a
    ///   positive even number.
    /// * `simd_multiply` — widen the minimum parallel size by the SIMD
    ///   lane count.
    /// * `reserved_cache` — bytes of L1 to reserve for the caller's tables
    ///   and working state.
    /// * `split_channel` — halve the cache budget for dual-channel
    ///   (input+output) algorithms.
    pub fn new(
        block_size: usize,
        simd_multiply: bool,
        reserved_cache: usize,
        split_channel: bool,
    ) -> Result<Self> {
        Self::with_degree(block_size, simd_multiply, reserved_cache, split_channel, 0)
    }

    /// Auto-calibrated options with an explicit starting degree; a degree
    /// of zero selects the processor count.
    pub fn with_degree(
        block_size: usize,
        simd_multiply: bool,
        reserved_cache: usize,
        split_channel: bool,
        max_degree: usize,
    ) -> Result<Self> {
        if block_size == 0 || block_size % 2 != 0 {
            return Err(CryptoError::IllegalOperation(
                "the block size must be a positive even number",
            ));
        }

        let mut options = Self {
            block_size,
            is_parallel: false,
            l1_cache_reserved: reserved_cache,
            l1_cache_total: 0,
            override_max_degree: false,
            parallel_block_size: 0,
            parallel_max_degree: max_degree,
            parallel_min_size: 0,
            physical_cores: 0,
            processor_count: 0,
            simd_profile: SimdProfile::None,
            simd_multiply,
            split_channel,
            default_params: (false, 0, 0),
        };
        options.detect();
        options.calculate_auto();
        options.default_params = (
            options.is_parallel,
            options.parallel_max_degree,
            options.parallel_block_size,
        );
        Ok(options)
    }

    fn detect(&mut self) {
        self.physical_cores = num_cpus::get_physical().max(1);
        let virtual_cores = num_cpus::get().max(1);
        self.processor_count = virtual_cores.max(self.physical_cores);

        // keep the degree even so chunks pair across cores
        if self.processor_count > 1 && self.processor_count % 2 != 0 {
            self.processor_count -= 1;
        }
        if self.parallel_max_degree > self.processor_count || self.parallel_max_degree == 0 {
            self.parallel_max_degree = self.processor_count;
        }

        self.is_parallel = self.processor_count > 1;
        self.simd_profile = SimdProfile::detect();
        self.l1_cache_total = L1_CACHE_PER_CORE * self.physical_cores;
    }

    fn recalc_min_size(&mut self) {
        self.parallel_min_size = self.parallel_max_degree * self.block_size;
        if self.simd_multiply {
            self.parallel_min_size *= self.simd_profile.lane_count();
        }
    }

    fn calculate_auto(&mut self) {
        self.recalc_min_size();

        let mut pbs = self.l1_cache_total.saturating_sub(self.l1_cache_reserved);
        if self.split_channel {
            pbs /= 2;
        }
        self.parallel_block_size = self.round_block_size(pbs);
    }

    /// Round to a whole non-zero multiple of the minimum size.
    fn round_block_size(&self, requested: usize) -> usize {
        let min = self.parallel_min_size.max(1);
        let rounded = requested - (requested % min);
        if rounded == 0 {
            min
        } else {
            rounded
        }
    }

    /// Recalibrate with user-selected settings; zero keeps the current
    /// value. Parallel processing stays off on single-core hosts.
    pub fn calculate(
        &mut self,
        parallel: bool,
        parallel_block_size: usize,
        max_degree: usize,
    ) -> Result<()> {
        self.is_parallel = parallel && self.processor_count > 1;
        if max_degree != 0 {
            if max_degree % 2 != 0 || max_degree > self.processor_count {
                return Err(CryptoError::IllegalOperation(
                    "the max degree must be even and no more than the processor count",
                ));
            }
            self.parallel_max_degree = max_degree;
        }
        self.recalc_min_size();

        let requested = if parallel_block_size != 0 {
            parallel_block_size
        } else if self.parallel_block_size != 0 {
            self.parallel_block_size
        } else {
            DEF_DATA_CACHE * self.parallel_max_degree
        };
        self.parallel_block_size = self.round_block_size(requested.max(self.parallel_min_size));
        Ok(())
    }

    /// Set the maximum thread count used by parallel generation.
    ///
    /// `degree` must be even, greater than zero and no more than the
    /// processor count.
    pub fn set_max_degree(&mut self, degree: usize) -> Result<()> {
        if degree == 0 || degree % 2 != 0 || degree > self.processor_count {
            return Err(CryptoError::IllegalOperation(
                "the max degree must be a positive even number within the processor count",
            ));
        }
        self.override_max_degree = true;
        self.parallel_max_degree = degree;
        self.recalc_min_size();
        self.parallel_block_size = self.round_block_size(
            self.parallel_block_size.max(self.parallel_min_size),
        );
        Ok(())
    }

    /// Whether the profile still carries the auto-calibrated values.
    pub fn is_default(&self) -> bool {
        self.default_params
            == (
                self.is_parallel,
                self.parallel_max_degree,
                self.parallel_block_size,
            )
    }

    /// Base block size in bytes.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Whether parallel processing is enabled.
    pub fn is_parallel(&self) -> bool {
        self.is_parallel
    }

    /// Enable or disable parallel processing; stays off on single-core
    /// hosts.
    pub fn set_parallel(&mut self, parallel: bool) {
        self.is_parallel = parallel && self.processor_count > 1;
    }

    /// Preferred bytes per parallel call; a whole multiple of
    /// [`ParallelOptions::parallel_min_size`], never zero.
    pub fn parallel_block_size(&self) -> usize {
        self.parallel_block_size
    }

    /// The smallest valid parallel block size.
    pub fn parallel_min_size(&self) -> usize {
        self.parallel_min_size
    }

    /// The maximum number of threads used by parallel generation.
    pub fn parallel_max_degree(&self) -> usize {
        self.parallel_max_degree
    }

    /// Physical core count.
    pub fn physical_cores(&self) -> usize {
        self.physical_cores
    }

    /// Usable processor count (trimmed to even above one).
    pub fn processor_count(&self) -> usize {
        self.processor_count
    }

    /// The widest SIMD profile detected.
    pub fn simd_profile(&self) -> SimdProfile {
        self.simd_profile
    }

    /// Total L1 data cache assumed for calibration, in bytes.
    pub fn l1_cache_total(&self) -> usize {
        self.l1_cache_total
    }

    /// L1 bytes reserved for the caller's working state.
    pub fn l1_cache_reserved(&self) -> usize {
        self.l1_cache_reserved
    }
}
