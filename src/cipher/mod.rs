//! Block ciphers.

mod rhx;
pub(crate) mod tables;

pub use rhx::Rhx;

use crate::enums::{BlockCipherExtensions, BlockCiphers};
use crate::error::Result;
use crate::key::{SymmetricKey, SymmetricKeySize};

/// A 128-bit block cipher.
///
/// Round keys are computed once by `initialize` and immutable until the
/// next call, so a cipher can be shared read-only across worker threads
/// during parallel keystream generation.
pub trait BlockCipher: Send + Sync {
    /// The cipher's enumeration tag.
    fn enumeral(&self) -> BlockCiphers;

    /// The key-schedule extension engine, or `None` for the standard
    /// schedule.
    fn cipher_extension(&self) -> BlockCipherExtensions;

    /// The cipher's stable name.
    fn name(&self) -> String;

    /// Block size in bytes (always 16).
    fn block_size(&self) -> usize;

    /// Whether `initialize` has been called.
    fn is_initialized(&self) -> bool;

    /// Whether the cipher was initialized for encryption.
    fn is_encryption(&self) -> bool;

    /// Legal key/nonce/info size triples.
    fn legal_key_sizes(&self) -> &[SymmetricKeySize];

    /// The number of transformation rounds for the current key.
    fn rounds(&self) -> usize;

    /// The current distribution code (KDF info string).
    fn distribution_code(&self) -> &[u8];

    /// Maximum distribution-code length for the configured extension.
    fn distribution_code_max(&self) -> usize;

    /// Replace the distribution code ahead of the next `initialize`;
    /// oversized input is truncated to [`BlockCipher::distribution_code_max`].
    fn set_distribution_code(&mut self, code: &[u8]);

    /// Size in bytes of the cipher's working state; callers reserving L1
    /// cache use this to budget the parallel block size.
    fn state_cache_size(&self) -> usize;

    /// Expand the key schedule for encryption or decryption.
    fn initialize(&mut self, encryption: bool, params: &SymmetricKey) -> Result<()>;

    /// Encrypt one 16-byte block.
    fn encrypt_block(&self, input: &[u8], output: &mut [u8]);

    /// Decrypt one 16-byte block.
    fn decrypt_block(&self, input: &[u8], output: &mut [u8]);

    /// Transform one block in the direction chosen at initialization.
    fn transform(&self, input: &[u8], output: &mut [u8]);

    /// Transform 4 independent blocks (64 bytes); the dispatch target of
    /// 128-bit-wide staggered counter batches.
    fn transform_512(&self, input: &[u8], output: &mut [u8]);

    /// Transform 8 independent blocks (128 bytes); the dispatch target of
    /// 256-bit-wide staggered counter batches.
    fn transform_1024(&self, input: &[u8], output: &mut [u8]);

    /// Transform 16 independent blocks (256 bytes); the dispatch target of
    /// 512-bit-wide staggered counter batches.
    fn transform_2048(&self, input: &[u8], output: &mut [u8]);
}
