//! KDF2 (ISO-18033-2): hash-counter key expansion.

use zeroize::{Zeroize, Zeroizing};

use crate::digest::{self, Digest};
use crate::enums::{Kdfs, Sha2Digests};
use crate::error::{CryptoError, Result};
use crate::key::{SymmetricKey, SymmetricKeySize};

use super::Kdf;

/// Maximum number of hash blocks a single keying may produce.
const MAX_GEN_REQUESTS: u32 = 255;
/// Minimum salt length in bytes.
const MIN_SALT_LEN: usize = 4;

/// The ISO-18033-2 KDF2 expansion function.
///
/// Output is the concatenation of `Hash(state || BE32(counter) || salt)`
/// with the counter starting at 1. The key-only initialisation uses the
/// ISO-18033 convention: a key no longer than one hash block is zero-padded
/// to a full block; a longer key is split into a block-sized state with the
/// remainder carried as salt.
pub struct Kdf2 {
    digest: Box<dyn Digest>,
    counter: [u8; 4],
    salt: Zeroizing<Vec<u8>>,
    state: Zeroizing<Vec<u8>>,
    legal_key_sizes: Vec<SymmetricKeySize>,
    is_initialized: bool,
}

impl Kdf2 {
    /// A KDF2 generator over the given SHA2 digest.
    pub fn new(digest_type: Sha2Digests) -> Result<Self> {
        if digest_type == Sha2Digests::None {
            return Err(CryptoError::IllegalOperation(
                "the digest type can not be none",
            ));
        }
        Self::with_digest(digest::from_tag(digest_type.into())?)
    }

    /// A KDF2 generator over an arbitrary digest instance.
    pub fn with_digest(digest: Box<dyn Digest>) -> Result<Self> {
        let ds = digest.digest_size();
        let bs = digest.block_size();
        let legal_key_sizes = vec![
            SymmetricKeySize::new(ds, 0, 0),
            SymmetricKeySize::new(bs, 0, ds),
            SymmetricKeySize::new(bs, bs, ds),
        ];
        Ok(Self {
            digest,
            counter: [0, 0, 0, 1],
            salt: Zeroizing::new(Vec::new()),
            state: Zeroizing::new(Vec::new()),
            legal_key_sizes,
            is_initialized: false,
        })
    }

    /// Minimum accepted key length in bytes.
    pub fn min_key_size(&self) -> usize {
        self.digest.digest_size()
    }

    fn expand(&mut self, output: &mut [u8]) -> Result<()> {
        let ds = self.digest.digest_size();
        let mut block = Zeroizing::new(vec![0u8; ds]);
        let mut offset = 0;

        while offset < output.len() {
            self.digest.update(&self.state);
            self.digest.update(&self.counter);
            if !self.salt.is_empty() {
                self.digest.update(&self.salt);
            }
            self.digest.finalize_into(&mut block)?;

            // big-endian ripple over the 4 counter bytes
            let next = u32::from_be_bytes(self.counter).wrapping_add(1);
            self.counter = next.to_be_bytes();

            let take = ds.min(output.len() - offset);
            output[offset..offset + take].copy_from_slice(&block[..take]);
            offset += take;
        }
        Ok(())
    }
}

impl Kdf for Kdf2 {
    fn enumeral(&self) -> Kdfs {
        if self.digest.digest_size() == 64 {
            Kdfs::Kdf2512
        } else {
            Kdfs::Kdf2256
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
        if params.key().len() < self.min_key_size() {
            return Err(CryptoError::InvalidKey(
                "the key must be at least the digest output size",
            ));
        }
        if self.is_initialized {
            self.reset();
        }

        if !params.nonce().is_empty() {
            if params.nonce().len() + params.info().len() < MIN_SALT_LEN {
                return Err(CryptoError::InvalidSalt(
                    "the salt must be at least 4 bytes",
                ));
            }
            self.state = Zeroizing::new(params.key().to_vec());
            let mut salt = Vec::with_capacity(params.nonce().len() + params.info().len());
            salt.extend_from_slice(params.nonce());
            salt.extend_from_slice(params.info());
            self.salt = Zeroizing::new(salt);
        } else {
            let block = self.digest.block_size();
            if params.key().len() <= block {
                // pad the key to one block
                let mut state = vec![0u8; block];
                state[..params.key().len()].copy_from_slice(params.key());
                self.state = Zeroizing::new(state);
            } else {
                // split the key between state and salt
                self.state = Zeroizing::new(params.key()[..block].to_vec());
                let mut salt = params.key()[block..].to_vec();
                salt.extend_from_slice(params.info());
                self.salt = Zeroizing::new(salt);
            }
        }

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
        let ds = self.digest.digest_size() as u32;
        let blocks = (output.len() as u32).div_ceil(ds);
        if u32::from_be_bytes(self.counter).saturating_add(blocks) > MAX_GEN_REQUESTS + 1 {
            return Err(CryptoError::MaxExceeded(
                "the request exceeds the maximum allowed output",
            ));
        }

        self.expand(output)?;
        Ok(output.len())
    }

    fn reset(&mut self) {
        self.digest.reset();
        self.counter = [0, 0, 0, 1];
        self.salt.zeroize();
        self.salt = Zeroizing::new(Vec::new());
        self.state.zeroize();
        self.state = Zeroizing::new(Vec::new());
        self.is_initialized = false;
    }
}
