//! BCG: block-cipher counter generator.
//!
//! A CTR-mode DRBG over a 128-bit block cipher. The seed is interpreted as
//! `counter(16) || key`; generation encrypts monotonically increasing
//! counter blocks, fanning large requests out across worker threads with
//! per-thread counter offsets. With an entropy provider attached the
//! generator periodically re-derives its seed through a KDF2 extraction.

use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

use crate::cipher::{BlockCipher, Rhx};
use crate::enums::{BlockCipherExtensions, BlockCiphers, Drbgs, Providers, Sha2Digests};
use crate::error::{CryptoError, Result};
use crate::kdf::{Kdf, Kdf2};
use crate::key::{SymmetricKey, SymmetricKeySize};
use crate::parallel::{ctr, ParallelOptions};
use crate::provider::{Csp, EntropyProvider};

use super::Drbg;

/// Cipher block and counter size in bytes.
const BLOCK_SIZE: usize = 16;
/// Default cumulative-output threshold that triggers a reseed, in bytes.
const DEF_RESEED_THRESHOLD: usize = 10 * 1024 * 1024;
/// Maximum reseed requests before the generator must be re-initialized.
const MAX_RESEED: usize = 100_000;
/// Hard ceiling on total output per initialization.
const MAX_OUTPUT: u64 = 1 << 63;
/// Largest single generate request.
const MAX_REQUEST: usize = 32 * 1024 * 1024;
/// Bytes of generator output drawn as the extraction key during a reseed.
const RESEED_STATE_SIZE: usize = 32;

/// The block-cipher counter generator.
pub struct Bcg {
    cipher: Box<dyn BlockCipher>,
    cipher_type: BlockCiphers,
    counter: [u8; BLOCK_SIZE],
    dist_code: Vec<u8>,
    dist_code_max: usize,
    is_initialized: bool,
    is_poisoned: bool,
    parallel_profile: ParallelOptions,
    provider: Option<Box<dyn EntropyProvider>>,
    provider_type: Providers,
    bytes_total: u64,
    reseed_counter: usize,
    reseed_requests: usize,
    reseed_threshold: usize,
    sec_strength: usize,
    seed_size: usize,
}

impl Bcg {
    /// A generator over a cipher chosen by enumeration.
    ///
    /// `provider_type` of [`Providers::None`] disables prediction
    /// resistance (no automatic reseeding). `parallel` enables the
    /// multi-threaded generation path.
    pub fn new(
        cipher_type: BlockCiphers,
        extension: BlockCipherExtensions,
        provider_type: Providers,
        parallel: bool,
    ) -> Result<Self> {
        let cipher: Box<dyn BlockCipher> = match cipher_type {
            BlockCiphers::None => {
                return Err(CryptoError::IllegalOperation(
                    "the cipher type can not be none",
                ))
            }
            BlockCiphers::Rijndael => Box::new(Rhx::new()),
            BlockCiphers::Rhx => {
                if extension == BlockCipherExtensions::None {
                    return Err(CryptoError::IllegalOperation(
                        "an extended cipher requires a kdf extension",
                    ));
                }
                Box::new(Rhx::with_extension(extension))
            }
            _ => {
                return Err(CryptoError::IllegalOperation(
                    "the cipher type is not supported",
                ))
            }
        };
        let provider: Option<Box<dyn EntropyProvider>> = match provider_type {
            Providers::None => None,
            Providers::Csp => Some(Box::new(Csp::new())),
        };
        Self::with_cipher(cipher, provider, parallel)
    }

    /// A generator over a caller-supplied cipher instance, consumed by
    /// exclusive ownership.
    pub fn with_cipher(
        cipher: Box<dyn BlockCipher>,
        provider: Option<Box<dyn EntropyProvider>>,
        parallel: bool,
    ) -> Result<Self> {
        let mut parallel_profile =
            ParallelOptions::new(BLOCK_SIZE, true, cipher.state_cache_size(), false)?;
        parallel_profile.set_parallel(parallel);

        Ok(Self {
            cipher_type: cipher.enumeral(),
            dist_code: Vec::new(),
            dist_code_max: cipher.distribution_code_max(),
            provider_type: provider
                .as_ref()
                .map_or(Providers::None, |p| p.enumeral()),
            cipher,
            counter: [0u8; BLOCK_SIZE],
            is_initialized: false,
            is_poisoned: false,
            parallel_profile,
            provider,
            bytes_total: 0,
            reseed_counter: 0,
            reseed_requests: 0,
            reseed_threshold: DEF_RESEED_THRESHOLD,
            sec_strength: 0,
            seed_size: 0,
        })
    }

    /// The distribution code forwarded to an extended cipher's schedule.
    pub fn distribution_code(&self) -> &[u8] {
        &self.dist_code
    }

    /// Maximum accepted distribution-code length.
    pub fn distribution_code_max(&self) -> usize {
        self.dist_code_max
    }

    /// Whether the parallel generation path is enabled.
    pub fn is_parallel(&self) -> bool {
        self.parallel_profile.is_parallel()
    }

    /// Hard ceiling on total output per initialization.
    pub fn max_output(&self) -> u64 {
        MAX_OUTPUT
    }

    /// Largest single generate request in bytes.
    pub fn max_request(&self) -> usize {
        MAX_REQUEST
    }

    /// Maximum reseed requests before re-initialization is required.
    pub fn max_reseed_count(&self) -> usize {
        MAX_RESEED
    }

    /// The counter (nonce) length in bytes.
    pub fn nonce_size(&self) -> usize {
        BLOCK_SIZE
    }

    /// Bytes processed per parallel dispatch window.
    pub fn parallel_block_size(&self) -> usize {
        self.parallel_profile.parallel_block_size()
    }

    /// The parallel calibration profile.
    pub fn parallel_profile(&self) -> &ParallelOptions {
        &self.parallel_profile
    }

    /// Mutable access to the parallel calibration profile.
    pub fn parallel_profile_mut(&mut self) -> &mut ParallelOptions {
        &mut self.parallel_profile
    }

    /// Restrict the parallel degree; must be even, non-zero and within
    /// the processor count.
    pub fn set_max_degree(&mut self, degree: usize) -> Result<()> {
        self.parallel_profile.set_max_degree(degree)
    }

    /// The attached provider's tag.
    pub fn provider_type(&self) -> Providers {
        self.provider_type
    }

    /// Reseed requests served since initialization.
    pub fn reseed_requests(&self) -> usize {
        self.reseed_requests
    }

    /// The cumulative-output threshold that triggers a reseed.
    pub fn reseed_threshold(&self) -> usize {
        self.reseed_threshold
    }

    /// Change the reseed threshold.
    pub fn set_reseed_threshold(&mut self, threshold: usize) {
        self.reseed_threshold = threshold;
    }

    /// Effective security strength in bits for the current seed.
    pub fn security_strength(&self) -> usize {
        self.sec_strength
    }

    /// Seed with raw bytes: the leftmost 16 bytes become the counter, the
    /// remainder the cipher key.
    pub fn initialize_seed(&mut self, seed: &[u8]) -> Result<()> {
        if self.is_poisoned {
            return Err(CryptoError::Poisoned(
                "the generator must be reset before re-initialization",
            ));
        }
        self.load_seed(seed)
    }

    fn load_seed(&mut self, seed: &[u8]) -> Result<()> {
        if seed.len() < BLOCK_SIZE {
            return Err(CryptoError::InvalidKey(
                "the seed is shorter than the counter",
            ));
        }
        let key_len = seed.len() - BLOCK_SIZE;
        if !SymmetricKeySize::contains_with_nonce(
            self.cipher.legal_key_sizes(),
            key_len,
            BLOCK_SIZE,
        ) {
            return Err(CryptoError::InvalidKey(
                "the seed size is invalid; check legal key sizes for accepted values",
            ));
        }

        self.seed_size = seed.len();
        // counter is always the left-most bytes
        self.counter.copy_from_slice(&seed[..BLOCK_SIZE]);
        // upper bound is 256, could be more depending on cipher configuration
        self.sec_strength = if key_len >= 32 { 256 } else { key_len * 8 };
        self.cipher
            .initialize(true, &SymmetricKey::new(seed[BLOCK_SIZE..].to_vec()))?;
        self.bytes_total = 0;
        self.is_initialized = true;
        Ok(())
    }

    fn generate_block(&mut self, output: &mut [u8]) -> Result<()> {
        let profile = &self.parallel_profile;
        let pbs = profile.parallel_block_size();
        let degree = profile.parallel_max_degree();
        let simd = profile.simd_profile();

        if !profile.is_parallel() || output.len() < pbs || degree < 2 {
            ctr::fill_keystream(self.cipher.as_ref(), &mut self.counter, output, simd);
            return Ok(());
        }

        let mut offset = 0;
        while output.len() - offset >= pbs {
            let window = &mut output[offset..offset + pbs];
            if let Err(err) =
                ctr::dispatch(self.cipher.as_ref(), &mut self.counter, window, degree, simd)
            {
                self.is_poisoned = true;
                return Err(err);
            }
            offset += pbs;
        }
        if offset < output.len() {
            ctr::fill_keystream(
                self.cipher.as_ref(),
                &mut self.counter,
                &mut output[offset..],
                simd,
            );
        }
        Ok(())
    }

    /// Draw generator output and provider entropy, extract through
    /// KDF2(SHA2-256), and re-key atomically.
    fn derive(&mut self) -> Result<()> {
        let mut state = Zeroizing::new(vec![0u8; RESEED_STATE_SIZE]);
        self.generate_block(&mut state)?;

        let mut kdf = Kdf2::new(Sha2Digests::Sha256)?;
        // size the salt to the kdf's second recommended key size
        let salt_len = kdf.legal_key_sizes()[1].key_size();
        let mut salt = Zeroizing::new(vec![0u8; salt_len]);
        match self.provider.as_mut() {
            Some(provider) => provider.generate(&mut salt)?,
            None => {
                return Err(CryptoError::ProviderFailure(
                    "no entropy provider is attached",
                ))
            }
        }

        kdf.initialize(&SymmetricKey::with_nonce(state.to_vec(), salt.to_vec()))?;
        let mut seed = Zeroizing::new(vec![0u8; self.seed_size]);
        kdf.generate(&mut seed)?;
        self.load_seed(&seed)
    }
}

impl Drbg for Bcg {
    fn enumeral(&self) -> Drbgs {
        Drbgs::Bcg
    }

    fn name(&self) -> String {
        format!("BCG-{}", self.cipher.name())
    }

    fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    fn legal_key_sizes(&self) -> &[SymmetricKeySize] {
        self.cipher.legal_key_sizes()
    }

    fn initialize(&mut self, params: &SymmetricKey) -> Result<()> {
        if self.is_poisoned {
            return Err(CryptoError::Poisoned(
                "the generator must be reset before re-initialization",
            ));
        }

        if params.nonce().is_empty() {
            return self.load_seed(params.key());
        }

        if !params.info().is_empty() && self.cipher_type != BlockCiphers::Rijndael {
            // extended cipher: info becomes the schedule's distribution
            // code; oversized input is sized to the optimal maximum
            let take = params.info().len().min(self.dist_code_max);
            self.dist_code = params.info()[..take].to_vec();
            self.cipher.set_distribution_code(&self.dist_code);
        }

        let mut seed = Zeroizing::new(Vec::with_capacity(
            params.nonce().len() + params.key().len(),
        ));
        seed.extend_from_slice(params.nonce());
        seed.extend_from_slice(params.key());
        self.load_seed(&seed)
    }

    fn generate(&mut self, output: &mut [u8]) -> Result<usize> {
        if self.is_poisoned {
            return Err(CryptoError::Poisoned(
                "a prior worker failure corrupted the generator state",
            ));
        }
        if !self.is_initialized {
            return Err(CryptoError::NotInitialized(
                "the generator must be initialized before use",
            ));
        }
        if output.is_empty() {
            return Ok(0);
        }
        if output.len() > MAX_REQUEST {
            return Err(CryptoError::MaxExceeded(
                "the request exceeds the maximum request size",
            ));
        }
        if self.bytes_total.saturating_add(output.len() as u64) > MAX_OUTPUT {
            return Err(CryptoError::MaxExceeded(
                "the generator output ceiling has been reached",
            ));
        }

        self.generate_block(output)?;
        self.bytes_total += output.len() as u64;

        if self.provider.is_some() {
            self.reseed_counter += output.len();
            if self.reseed_counter >= self.reseed_threshold {
                self.reseed_requests += 1;
                if self.reseed_requests > MAX_RESEED {
                    return Err(CryptoError::MaxExceeded(
                        "the maximum reseed requests have been exceeded; re-initialize the generator",
                    ));
                }
                debug!(
                    requests = self.reseed_requests,
                    "reseed threshold reached, re-deriving seed"
                );
                self.derive()?;
                self.reseed_counter = 0;
            }
        }

        Ok(output.len())
    }

    fn update(&mut self, seed: &[u8]) -> Result<()> {
        if seed.len() != self.seed_size {
            return Err(CryptoError::InvalidKey(
                "the update seed must equal the seed length used to initialize",
            ));
        }
        self.initialize_seed(seed)
    }

    fn reset(&mut self) {
        self.counter.zeroize();
        self.dist_code.zeroize();
        self.dist_code = Vec::new();
        self.bytes_total = 0;
        self.reseed_counter = 0;
        self.reseed_requests = 0;
        self.sec_strength = 0;
        self.seed_size = 0;
        self.is_initialized = false;
        self.is_poisoned = false;
    }
}

impl Drop for Bcg {
    fn drop(&mut self) {
        self.counter.zeroize();
        self.dist_code.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A provider that fills with a fixed byte, for deterministic reseed
    /// tests.
    struct FixedProvider(u8);

    impl EntropyProvider for FixedProvider {
        fn enumeral(&self) -> Providers {
            Providers::Csp
        }

        fn generate(&mut self, output: &mut [u8]) -> Result<()> {
            output.fill(self.0);
            Ok(())
        }
    }

    /// A provider that always fails.
    struct BrokenProvider;

    impl EntropyProvider for BrokenProvider {
        fn enumeral(&self) -> Providers {
            Providers::Csp
        }

        fn generate(&mut self, _output: &mut [u8]) -> Result<()> {
            Err(CryptoError::ProviderFailure("broken by construction"))
        }
    }

    fn seed48() -> Vec<u8> {
        (0u8..48).collect()
    }

    fn serial_bcg(seed: &[u8]) -> Bcg {
        let mut gen = Bcg::new(
            BlockCiphers::Rijndael,
            BlockCipherExtensions::None,
            Providers::None,
            false,
        )
        .unwrap();
        gen.initialize(&SymmetricKey::new(seed.to_vec())).unwrap();
        gen
    }

    #[test]
    fn deterministic_for_a_fixed_seed() {
        let mut a = serial_bcg(&seed48());
        let mut b = serial_bcg(&seed48());
        let mut out_a = vec![0u8; 512];
        let mut out_b = vec![0u8; 512];
        a.generate(&mut out_a).unwrap();
        b.generate(&mut out_b).unwrap();
        assert_eq!(out_a, out_b);
        assert!(out_a.iter().any(|&x| x != 0));
    }

    #[test]
    fn partitioned_generation_concatenates() {
        let mut whole_gen = serial_bcg(&seed48());
        let mut whole = vec![0u8; 1000];
        whole_gen.generate(&mut whole).unwrap();

        let mut parts_gen = serial_bcg(&seed48());
        let mut parts = vec![0u8; 1000];
        parts_gen.generate(&mut parts[..1]).unwrap();
        parts_gen.generate(&mut parts[1..17]).unwrap();
        parts_gen.generate(&mut parts[17..600]).unwrap();
        parts_gen.generate(&mut parts[600..]).unwrap();
        assert_eq!(whole, parts);
    }

    #[test]
    fn serial_and_parallel_streams_are_identical() {
        const LEN: usize = 10_000;
        let mut serial = serial_bcg(&seed48());
        let mut expected = vec![0u8; LEN];
        serial.generate(&mut expected).unwrap();

        let mut parallel_gen = Bcg::new(
            BlockCiphers::Rijndael,
            BlockCipherExtensions::None,
            Providers::None,
            true,
        )
        .unwrap();
        {
            let profile = parallel_gen.parallel_profile_mut();
            let degree = if profile.processor_count() >= 4 { 4 } else { 2 };
            if profile.processor_count() >= 2 {
                profile.calculate(true, LEN, degree).unwrap();
            }
        }
        parallel_gen
            .initialize(&SymmetricKey::new(seed48()))
            .unwrap();
        let mut actual = vec![0u8; LEN];
        parallel_gen.generate(&mut actual).unwrap();
        assert_eq!(expected, actual);

        // the streams stay aligned after the parallel call
        let mut tail_serial = vec![0u8; 64];
        let mut tail_parallel = vec![0u8; 64];
        serial.generate(&mut tail_serial).unwrap();
        parallel_gen.generate(&mut tail_parallel).unwrap();
        assert_eq!(tail_serial, tail_parallel);
    }

    #[test]
    fn requests_straddling_the_parallel_block_size_agree() {
        let mut parallel_gen = Bcg::new(
            BlockCiphers::Rijndael,
            BlockCipherExtensions::None,
            Providers::None,
            true,
        )
        .unwrap();
        parallel_gen
            .initialize(&SymmetricKey::new(seed48()))
            .unwrap();
        let pbs = parallel_gen.parallel_block_size();

        for len in [pbs - 1, pbs, pbs + 1] {
            let mut reference_gen = serial_bcg(&seed48());
            let mut expected = vec![0u8; len];
            reference_gen.generate(&mut expected).unwrap();

            let mut fresh = Bcg::new(
                BlockCiphers::Rijndael,
                BlockCipherExtensions::None,
                Providers::None,
                true,
            )
            .unwrap();
            fresh.initialize(&SymmetricKey::new(seed48())).unwrap();
            let mut actual = vec![0u8; len];
            fresh.generate(&mut actual).unwrap();
            assert_eq!(expected, actual, "length {len} diverged");
        }
    }

    #[test]
    fn key_nonce_initialization_matches_flat_seed() {
        let seed = seed48();
        let mut flat = serial_bcg(&seed);
        let mut expected = vec![0u8; 256];
        flat.generate(&mut expected).unwrap();

        // nonce carries the counter, key the cipher key
        let mut split = Bcg::new(
            BlockCiphers::Rijndael,
            BlockCipherExtensions::None,
            Providers::None,
            false,
        )
        .unwrap();
        split
            .initialize(&SymmetricKey::with_nonce(
                seed[16..].to_vec(),
                seed[..16].to_vec(),
            ))
            .unwrap();
        let mut actual = vec![0u8; 256];
        split.generate(&mut actual).unwrap();
        assert_eq!(expected, actual);
    }

    #[test]
    fn distribution_code_separates_extended_streams() {
        let make = |info: &[u8]| {
            let mut gen = Bcg::new(
                BlockCiphers::Rhx,
                BlockCipherExtensions::Hkdf256,
                Providers::None,
                false,
            )
            .unwrap();
            gen.initialize(&SymmetricKey::with_info(
                vec![7u8; 32],
                vec![1u8; 16],
                info.to_vec(),
            ))
            .unwrap();
            let mut out = vec![0u8; 128];
            gen.generate(&mut out).unwrap();
            out
        };
        assert_ne!(make(b"domain-a"), make(b"domain-b"));
    }

    #[test]
    fn reseed_fires_exactly_at_the_threshold() {
        let mut gen = Bcg::with_cipher(
            Box::new(Rhx::new()),
            Some(Box::new(FixedProvider(0x5A))),
            false,
        )
        .unwrap();
        gen.set_reseed_threshold(256);
        gen.initialize(&SymmetricKey::new(seed48())).unwrap();

        let mut out = vec![0u8; 255];
        gen.generate(&mut out).unwrap();
        assert_eq!(gen.reseed_requests(), 0);

        // one more byte reaches the threshold
        let mut byte = [0u8; 1];
        gen.generate(&mut byte).unwrap();
        assert_eq!(gen.reseed_requests(), 1);
    }

    #[test]
    fn reseed_changes_the_stream() {
        let mut plain = serial_bcg(&seed48());
        let mut expected = vec![0u8; 1024];
        plain.generate(&mut expected).unwrap();

        let mut reseeding = Bcg::with_cipher(
            Box::new(Rhx::new()),
            Some(Box::new(FixedProvider(0x5A))),
            false,
        )
        .unwrap();
        reseeding.set_reseed_threshold(256);
        reseeding.initialize(&SymmetricKey::new(seed48())).unwrap();
        let mut actual = vec![0u8; 1024];
        for chunk in actual.chunks_mut(256) {
            reseeding.generate(chunk).unwrap();
        }
        assert!(reseeding.reseed_requests() >= 1);
        assert_ne!(expected, actual);
    }

    #[test]
    fn provider_failure_surfaces() {
        let mut gen =
            Bcg::with_cipher(Box::new(Rhx::new()), Some(Box::new(BrokenProvider)), false)
                .unwrap();
        gen.set_reseed_threshold(64);
        gen.initialize(&SymmetricKey::new(seed48())).unwrap();

        let mut out = vec![0u8; 128];
        assert!(matches!(
            gen.generate(&mut out),
            Err(CryptoError::ProviderFailure(_))
        ));
    }

    #[test]
    fn update_requires_the_original_seed_length() {
        let mut gen = serial_bcg(&seed48());
        assert!(matches!(
            gen.update(&vec![1u8; 32]),
            Err(CryptoError::InvalidKey(_))
        ));
        gen.update(&vec![1u8; 48]).unwrap();
    }

    #[test]
    fn reset_then_reinitialize_reproduces_outputs() {
        let mut gen = serial_bcg(&seed48());
        let mut first = vec![0u8; 333];
        gen.generate(&mut first).unwrap();

        gen.reset();
        let mut out = vec![0u8; 1];
        assert!(matches!(
            gen.generate(&mut out),
            Err(CryptoError::NotInitialized(_))
        ));

        gen.initialize(&SymmetricKey::new(seed48())).unwrap();
        let mut second = vec![0u8; 333];
        gen.generate(&mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn guards() {
        let mut gen = Bcg::new(
            BlockCiphers::Rijndael,
            BlockCipherExtensions::None,
            Providers::None,
            false,
        )
        .unwrap();

        // unseeded
        let mut out = vec![0u8; 16];
        assert!(matches!(
            gen.generate(&mut out),
            Err(CryptoError::NotInitialized(_))
        ));

        // short and illegal seeds
        assert!(matches!(
            gen.initialize(&SymmetricKey::new(vec![1u8; 8])),
            Err(CryptoError::InvalidKey(_))
        ));
        assert!(matches!(
            gen.initialize(&SymmetricKey::new(vec![1u8; 33])),
            Err(CryptoError::InvalidKey(_))
        ));

        // zero-length generate is a no-op success
        gen.initialize(&SymmetricKey::new(seed48())).unwrap();
        assert_eq!(gen.generate(&mut []).unwrap(), 0);

        // extended cipher construction demands an extension
        assert!(Bcg::new(
            BlockCiphers::Rhx,
            BlockCipherExtensions::None,
            Providers::None,
            false
        )
        .is_err());
    }

    #[test]
    fn security_strength_tracks_the_key_length() {
        let mut gen = Bcg::new(
            BlockCiphers::Rijndael,
            BlockCipherExtensions::None,
            Providers::None,
            false,
        )
        .unwrap();
        gen.initialize(&SymmetricKey::new((0u8..32).collect::<Vec<u8>>()))
            .unwrap();
        assert_eq!(gen.security_strength(), 128);

        gen.initialize(&SymmetricKey::new(seed48())).unwrap();
        assert_eq!(gen.security_strength(), 256);

        assert_eq!(gen.name(), "BCG-Rijndael");
        assert_eq!(gen.enumeral(), Drbgs::Bcg);
    }
}
