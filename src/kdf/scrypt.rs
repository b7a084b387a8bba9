//! SCRYPT (RFC 7914): sequential memory-hard password-based derivation.

use rayon::prelude::*;
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

use crate::enums::{Kdfs, Sha2Digests};
use crate::error::{CryptoError, Result};
use crate::key::{SymmetricKey, SymmetricKeySize};

use super::{Kdf, Pbkdf2};

/// Block-mix factor `r`; fixed at 8 (1 KiB mix blocks).
const MEM_COST: usize = 8;
/// One ROMix lane in 32-bit words: `2 * r * 16`.
const LANE_WORDS: usize = 2 * MEM_COST * 16;
/// Minimum accepted password length in bytes.
const MIN_PASS_LEN: usize = 4;
/// Minimum accepted salt length in bytes.
const MIN_SALT_LEN: usize = 4;

/// The RFC 7914 SCRYPT generator.
///
/// `PBKDF2(c=1)` prelude, `p` independent ROMix lanes over the Salsa20/8
/// core, `PBKDF2(c=1)` postlude. Lanes are dispatched across the rayon
/// pool; lane independence keeps the output identical at every thread
/// count.
pub struct Scrypt {
    digest_type: Sha2Digests,
    key: Zeroizing<Vec<u8>>,
    salt: Zeroizing<Vec<u8>>,
    cpu_cost: usize,
    parallelization: usize,
    legal_key_sizes: Vec<SymmetricKeySize>,
    is_initialized: bool,
}

impl Scrypt {
    /// A SCRYPT generator.
    ///
    /// `cpu_cost` (N) must be a power of two no smaller than 1024;
    /// `parallelization` (p) must be at least 1.
    pub fn new(digest_type: Sha2Digests, cpu_cost: usize, parallelization: usize) -> Result<Self> {
        if digest_type == Sha2Digests::None {
            return Err(CryptoError::IllegalOperation(
                "the digest type can not be none",
            ));
        }
        if !cpu_cost.is_power_of_two() || cpu_cost < 1024 {
            return Err(CryptoError::IllegalOperation(
                "the cpu cost must be a power of two of at least 1024",
            ));
        }
        if parallelization == 0 {
            return Err(CryptoError::IllegalOperation(
                "the parallelization factor can not be zero",
            ));
        }

        let (ds, bs) = match digest_type {
            Sha2Digests::Sha512 => (64, 128),
            _ => (32, 64),
        };
        let legal_key_sizes = vec![
            SymmetricKeySize::new(ds, 0, 0),
            SymmetricKeySize::new(bs, ds, 0),
            SymmetricKeySize::new(bs, bs, 0),
        ];
        Ok(Self {
            digest_type,
            key: Zeroizing::new(Vec::new()),
            salt: Zeroizing::new(Vec::new()),
            cpu_cost,
            parallelization,
            legal_key_sizes,
            is_initialized: false,
        })
    }

    /// The CPU/memory cost parameter N.
    pub fn cpu_cost(&self) -> usize {
        self.cpu_cost
    }

    /// The parallelization parameter p.
    pub fn parallelization(&self) -> usize {
        self.parallelization
    }

    /// `PBKDF2-HMAC(key, salt, 1, output.len())`.
    fn extract(&self, key: &[u8], salt: &[u8], output: &mut [u8]) -> Result<()> {
        let mut kdf = Pbkdf2::new(self.digest_type, 1)?;
        kdf.initialize(&SymmetricKey::with_nonce(key.to_vec(), salt.to_vec()))?;
        kdf.generate(output)?;
        Ok(())
    }

    fn expand(&self, output: &mut [u8]) -> Result<()> {
        let lane_bytes = MEM_COST * 128;
        let mut mixed = Zeroizing::new(vec![0u8; self.parallelization * lane_bytes]);
        self.extract(&self.key, &self.salt, &mut mixed)?;

        // lanes as little-endian 32-bit words
        let mut state = Zeroizing::new(vec![0u32; self.parallelization * LANE_WORDS]);
        for (word, chunk) in state.iter_mut().zip(mixed.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        let n = self.cpu_cost;
        if self.parallelization > 1 {
            debug!(
                lanes = self.parallelization,
                cpu_cost = n,
                "dispatching scrypt lanes"
            );
            state
                .par_chunks_exact_mut(LANE_WORDS)
                .for_each(|lane| smix(lane, n));
        } else {
            smix(&mut state, n);
        }

        for (word, chunk) in state.iter().zip(mixed.chunks_exact_mut(4)) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }

        self.extract(&self.key, &mixed, output)
    }
}

impl Kdf for Scrypt {
    fn enumeral(&self) -> Kdfs {
        Kdfs::Scrypt256
    }

    fn name(&self) -> String {
        format!("SCRYPT-{}", self.digest_type.name())
    }

    fn legal_key_sizes(&self) -> &[SymmetricKeySize] {
        &self.legal_key_sizes
    }

    fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    fn initialize(&mut self, params: &SymmetricKey) -> Result<()> {
        if params.key().len() < MIN_PASS_LEN {
            return Err(CryptoError::InvalidKey(
                "the password must be at least 4 bytes",
            ));
        }
        if !params.nonce().is_empty()
            && params.nonce().len() + params.info().len() < MIN_SALT_LEN
        {
            return Err(CryptoError::InvalidSalt(
                "the salt must be at least 4 bytes",
            ));
        }
        if self.is_initialized {
            self.reset();
        }

        self.key = Zeroizing::new(params.key().to_vec());
        let mut salt = Vec::with_capacity(params.nonce().len() + params.info().len());
        salt.extend_from_slice(params.nonce());
        salt.extend_from_slice(params.info());
        self.salt = Zeroizing::new(salt);
        self.is_initialized = true;
        Ok(())
    }

    fn generate(&mut self, output: &mut [u8]) -> Result<usize> {
        if !self.is_initialized {
            return Err(CryptoError::NotInitialized(
                "the generator must be initialized before use",
            ));
        }
        if output.is_empty() {
            return Ok(0);
        }
        let ds: usize = match self.digest_type {
            Sha2Digests::Sha512 => 64,
            _ => 32,
        };
        if output.len().div_ceil(ds) as u64 > u64::from(u32::MAX) {
            return Err(CryptoError::MaxExceeded(
                "the request exceeds the maximum allowed output",
            ));
        }

        self.expand(output)?;
        Ok(output.len())
    }

    fn reset(&mut self) {
        self.key.zeroize();
        self.key = Zeroizing::new(Vec::new());
        self.salt.zeroize();
        self.salt = Zeroizing::new(Vec::new());
        self.is_initialized = false;
    }
}

/// ROMix over one lane: `N` fill steps, then `N` indexed gather steps.
fn smix(lane: &mut [u32], n: usize) {
    let words = lane.len();
    let mut x = Zeroizing::new(lane.to_vec());
    let mut y = Zeroizing::new(vec![0u32; words]);
    let mut v = Zeroizing::new(vec![0u32; n * words]);

    for i in 0..n {
        v[i * words..(i + 1) * words].copy_from_slice(&x);
        block_mix(&mut x, &mut y);
    }

    let mask = (n - 1) as u32;
    for _ in 0..n {
        let j = (x[words - 16] & mask) as usize;
        for (xw, vw) in x.iter_mut().zip(&v[j * words..(j + 1) * words]) {
            *xw ^= vw;
        }
        block_mix(&mut x, &mut y);
    }

    lane.copy_from_slice(&x);
}

/// Alternate Salsa20/8 calls across the 2r 64-byte sub-blocks, ping-pong
/// XOR against the running 16-word state; even results land in the first
/// half of the scratch, odd results in the second.
fn block_mix(state: &mut [u32], scratch: &mut [u32]) {
    let mut x = [0u32; 16];
    x.copy_from_slice(&state[state.len() - 16..]);

    for i in (0..2 * MEM_COST).step_by(2) {
        for (xw, sw) in x.iter_mut().zip(&state[i * 16..i * 16 + 16]) {
            *xw ^= sw;
        }
        salsa20_8(&mut x);
        let even = (i / 2) * 16;
        scratch[even..even + 16].copy_from_slice(&x);

        for (xw, sw) in x.iter_mut().zip(&state[i * 16 + 16..i * 16 + 32]) {
            *xw ^= sw;
        }
        salsa20_8(&mut x);
        let odd = (i / 2) * 16 + MEM_COST * 16;
        scratch[odd..odd + 16].copy_from_slice(&x);
    }

    state.copy_from_slice(scratch);
    x.zeroize();
}

/// The Salsa20/8 core permutation over a 16-word state.
fn salsa20_8(state: &mut [u32; 16]) {
    let input = *state;
    let [mut x0, mut x1, mut x2, mut x3, mut x4, mut x5, mut x6, mut x7, mut x8, mut x9, mut x10, mut x11, mut x12, mut x13, mut x14, mut x15] =
        input;

    for _ in 0..4 {
        // column round
        x4 ^= x0.wrapping_add(x12).rotate_left(7);
        x8 ^= x4.wrapping_add(x0).rotate_left(9);
        x12 ^= x8.wrapping_add(x4).rotate_left(13);
        x0 ^= x12.wrapping_add(x8).rotate_left(18);
        x9 ^= x5.wrapping_add(x1).rotate_left(7);
        x13 ^= x9.wrapping_add(x5).rotate_left(9);
        x1 ^= x13.wrapping_add(x9).rotate_left(13);
        x5 ^= x1.wrapping_add(x13).rotate_left(18);
        x14 ^= x10.wrapping_add(x6).rotate_left(7);
        x2 ^= x14.wrapping_add(x10).rotate_left(9);
        x6 ^= x2.wrapping_add(x14).rotate_left(13);
        x10 ^= x6.wrapping_add(x2).rotate_left(18);
        x3 ^= x15.wrapping_add(x11).rotate_left(7);
        x7 ^= x3.wrapping_add(x15).rotate_left(9);
        x11 ^= x7.wrapping_add(x3).rotate_left(13);
        x15 ^= x11.wrapping_add(x7).rotate_left(18);
        // row round
        x1 ^= x0.wrapping_add(x3).rotate_left(7);
        x2 ^= x1.wrapping_add(x0).rotate_left(9);
        x3 ^= x2.wrapping_add(x1).rotate_left(13);
        x0 ^= x3.wrapping_add(x2).rotate_left(18);
        x6 ^= x5.wrapping_add(x4).rotate_left(7);
        x7 ^= x6.wrapping_add(x5).rotate_left(9);
        x4 ^= x7.wrapping_add(x6).rotate_left(13);
        x5 ^= x4.wrapping_add(x7).rotate_left(18);
        x11 ^= x10.wrapping_add(x9).rotate_left(7);
        x8 ^= x11.wrapping_add(x10).rotate_left(9);
        x9 ^= x8.wrapping_add(x11).rotate_left(13);
        x10 ^= x9.wrapping_add(x8).rotate_left(18);
        x12 ^= x15.wrapping_add(x14).rotate_left(7);
        x13 ^= x12.wrapping_add(x15).rotate_left(9);
        x14 ^= x13.wrapping_add(x12).rotate_left(13);
        x15 ^= x14.wrapping_add(x13).rotate_left(18);
    }

    let mixed = [
        x0, x1, x2, x3, x4, x5, x6, x7, x8, x9, x10, x11, x12, x13, x14, x15,
    ];
    for (s, (i, m)) in state.iter_mut().zip(input.iter().zip(mixed.iter())) {
        *s = i.wrapping_add(*m);
    }
}
