//! A rand-ecosystem PRNG facade over the block-cipher generator.

use rand_core::{CryptoRng, Error as RandError, RngCore};
use zeroize::{Zeroize, Zeroizing};

use crate::drbg::{Bcg, Drbg};
use crate::enums::{BlockCipherExtensions, BlockCiphers, Providers};
use crate::error::Result;
use crate::key::SymmetricKey;
use crate::provider::{Csp, EntropyProvider};

/// Internal refill granularity in bytes.
const BUFFER_SIZE: usize = 1024;
/// Seed length: 16-byte counter plus a 256-bit cipher key.
const SEED_SIZE: usize = 48;

/// A buffered pseudo-random number generator backed by a [`Bcg`].
///
/// Seeded from the system entropy provider (or deterministically from a
/// caller seed), it exposes the `rand_core` traits so derived keys, nonces
/// and test data can be drawn through the standard `RngCore` interface.
pub struct BlockPrng {
    drbg: Bcg,
    buffer: Zeroizing<Vec<u8>>,
    position: usize,
}

impl BlockPrng {
    /// A generator seeded from the operating-system entropy provider.
    pub fn new() -> Result<Self> {
        let mut seed = Zeroizing::new(vec![0u8; SEED_SIZE]);
        Csp::new().generate(&mut seed)?;
        Self::from_seed(&seed)
    }

    /// A deterministic generator from a 48-byte seed
    /// (`counter(16) || key(32)`).
    pub fn from_seed(seed: &[u8]) -> Result<Self> {
        let mut drbg = Bcg::new(
            BlockCiphers::Rijndael,
            BlockCipherExtensions::None,
            Providers::None,
            false,
        )?;
        drbg.initialize(&SymmetricKey::new(seed.to_vec()))?;
        Ok(Self {
            drbg,
            buffer: Zeroizing::new(vec![0u8; BUFFER_SIZE]),
            position: BUFFER_SIZE,
        })
    }

    /// Discard buffered output; the next read draws fresh generator
    /// blocks.
    pub fn clear_buffer(&mut self) {
        self.buffer.zeroize();
        self.position = BUFFER_SIZE;
    }

    fn refill(&mut self) -> Result<()> {
        self.drbg.generate(&mut self.buffer)?;
        self.position = 0;
        Ok(())
    }
}

impl RngCore for BlockPrng {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        self.fill_bytes(&mut bytes);
        u32::from_le_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        self.fill_bytes(&mut bytes);
        u64::from_le_bytes(bytes)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.try_fill_bytes(dest)
            .expect("block generator failure while filling a prng request");
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> core::result::Result<(), RandError> {
        let mut offset = 0;
        while offset < dest.len() {
            if self.position == self.buffer.len() {
                self.refill()
                    .map_err(|err| RandError::new(Box::new(err)))?;
            }
            let take = (self.buffer.len() - self.position).min(dest.len() - offset);
            dest[offset..offset + take]
                .copy_from_slice(&self.buffer[self.position..self.position + take]);
            self.position += take;
            offset += take;
        }
        Ok(())
    }
}

impl CryptoRng for BlockPrng {}
