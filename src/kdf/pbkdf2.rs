//! PBKDF2 (RFC 2898): iterated-HMAC password-based derivation.

use zeroize::{Zeroize, Zeroizing};

use crate::digest::{self, Digest};
use crate::enums::{Kdfs, Sha2Digests};
use crate::error::{CryptoError, Result};
use crate::key::{SymmetricKey, SymmetricKeySize};
use crate::mac::{Hmac, Mac};

use super::Kdf;

/// Minimum accepted password length in bytes.
const MIN_PASS_LEN: usize = 4;

/// The RFC 2898 PBKDF2-HMAC generator.
///
/// Block `i` is `U(1) ^ U(2) ^ .. ^ U(c)` with
/// `U(1) = HMAC(pw, salt || BE32(i))` and `U(j) = HMAC(pw, U(j-1))`.
/// `generate` continues the block stream positionally across calls.
pub struct Pbkdf2 {
    hmac: Hmac,
    salt: Zeroizing<Vec<u8>>,
    iterations: usize,
    block_counter: u32,
    carry: Zeroizing<Vec<u8>>,
    legal_key_sizes: Vec<SymmetricKeySize>,
    is_initialized: bool,
}

impl Pbkdf2 {
    /// A PBKDF2 generator over the given SHA2 digest.
    ///
    /// The iteration count must be at least 1; 1000 or more is recommended
    /// for password hardening.
    pub fn new(digest_type: Sha2Digests, iterations: usize) -> Result<Self> {
        if digest_type == Sha2Digests::None {
            return Err(CryptoError::IllegalOperation(
                "the digest type can not be none",
            ));
        }
        Self::with_digest(digest::from_tag(digest_type.into())?, iterations)
    }

    /// A PBKDF2 generator over an arbitrary digest instance.
    pub fn with_digest(digest: Box<dyn Digest>, iterations: usize) -> Result<Self> {
        if iterations == 0 {
            return Err(CryptoError::IllegalOperation(
                "the iteration count can not be zero",
            ));
        }
        let ds = digest.digest_size();
        let bs = digest.block_size();
        let legal_key_sizes = vec![
            SymmetricKeySize::new(ds, 0, 0),
            SymmetricKeySize::new(bs, 0, ds),
            SymmetricKeySize::new(bs, bs, ds),
        ];
        Ok(Self {
            hmac: Hmac::new(digest),
            salt: Zeroizing::new(Vec::new()),
            iterations,
            block_counter: 1,
            carry: Zeroizing::new(Vec::new()),
            legal_key_sizes,
            is_initialized: false,
        })
    }

    /// The configured iteration count.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Replace the iteration count; takes effect at the next block.
    pub fn set_iterations(&mut self, iterations: usize) -> Result<()> {
        if iterations == 0 {
            return Err(CryptoError::IllegalOperation(
                "the iteration count can not be zero",
            ));
        }
        self.iterations = iterations;
        Ok(())
    }

    /// Compute block `index` into `block`.
    fn process_block(&mut self, index: u32, block: &mut [u8]) -> Result<()> {
        let hash = self.hmac.mac_size();
        let mut u = Zeroizing::new(vec![0u8; hash]);

        self.hmac.update(&self.salt);
        self.hmac.update(&index.to_be_bytes());
        self.hmac.finalize_into(&mut u)?;
        block.copy_from_slice(&u);

        for _ in 1..self.iterations {
            self.hmac.update(&u);
            self.hmac.finalize_into(&mut u)?;
            for (acc, byte) in block.iter_mut().zip(u.iter()) {
                *acc ^= byte;
            }
        }
        Ok(())
    }
}

impl Kdf for Pbkdf2 {
    fn enumeral(&self) -> Kdfs {
        if self.hmac.mac_size() == 64 {
            Kdfs::Pbkdf2512
        } else {
            Kdfs::Pbkdf2256
        }
    }

    fn name(&self) -> String {
        self.enumeral().name().to_string()
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
        if self.is_initialized {
            self.reset();
        }

        self.hmac.initialize(params.key())?;
        let mut salt = Vec::with_capacity(params.nonce().len() + params.info().len());
        salt.extend_from_slice(params.nonce());
        salt.extend_from_slice(params.info());
        self.salt = Zeroizing::new(salt);
        self.block_counter = 1;
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

        let hash = self.hmac.mac_size();
        let carried = self.carry.len();
        let needed = output.len().saturating_sub(carried);
        let blocks = needed.div_ceil(hash) as u64;
        if u64::from(self.block_counter) + blocks > u64::from(u32::MAX) {
            return Err(CryptoError::MaxExceeded(
                "the request exceeds the maximum allowed output",
            ));
        }

        let mut offset = 0;

        // unconsumed tail of the previous block first
        if carried > 0 {
            let take = carried.min(output.len());
            output[..take].copy_from_slice(&self.carry[..take]);
            self.carry = Zeroizing::new(self.carry[take..].to_vec());
            offset += take;
        }

        let mut block = Zeroizing::new(vec![0u8; hash]);
        while offset < output.len() {
            let index = self.block_counter;
            self.process_block(index, &mut block)?;
            self.block_counter += 1;

            let take = hash.min(output.len() - offset);
            output[offset..offset + take].copy_from_slice(&block[..take]);
            if take < hash {
                self.carry = Zeroizing::new(block[take..].to_vec());
            }
            offset += take;
        }
        Ok(output.len())
    }

    fn reset(&mut self) {
        self.hmac.reset();
        self.salt.zeroize();
        self.salt = Zeroizing::new(Vec::new());
        self.carry.zeroize();
        self.carry = Zeroizing::new(Vec::new());
        self.block_counter = 1;
        self.is_initialized = false;
    }
}
