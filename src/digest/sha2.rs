//! SHA2 family adapters.

use sha2::Digest as _;

use crate::enums::Digests;
use crate::error::{CryptoError, Result};

use super::Digest;

/// SHA2-256 (FIPS 180-4): 64-byte block, 32-byte digest.
#[derive(Default, Clone)]
pub struct Sha2256 {
    inner: sha2::Sha256,
}

impl Sha2256 {
    /// A fresh instance.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Digest for Sha2256 {
    fn enumeral(&self) -> Digests {
        Digests::Sha2256
    }

    fn block_size(&self) -> usize {
        64
    }

    fn digest_size(&self) -> usize {
        32
    }

    fn update(&mut self, input: &[u8]) {
        sha2::Digest::update(&mut self.inner, input);
    }

    fn finalize_into(&mut self, output: &mut [u8]) -> Result<()> {
        if output.len() < self.digest_size() {
            return Err(CryptoError::InvalidSize(
                "digest output buffer is smaller than the digest size",
            ));
        }
        let hash = self.inner.finalize_reset();
        output[..32].copy_from_slice(&hash);
        Ok(())
    }

    fn reset(&mut self) {
        sha2::Digest::reset(&mut self.inner);
    }
}

/// SHA2-512 (FIPS 180-4): 128-byte block, 64-byte digest.
#[derive(Default, Clone)]
pub struct Sha2512 {
    inner: sha2::Sha512,
}

impl Sha2512 {
    /// A fresh instance.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Digest for Sha2512 {
    fn enumeral(&self) -> Digests {
        Digests::Sha2512
    }

    fn block_size(&self) -> usize {
        128
    }

    fn digest_size(&self) -> usize {
        64
    }

    fn update(&mut self, input: &[u8]) {
        sha2::Digest::update(&mut self.inner, input);
    }

    fn finalize_into(&mut self, output: &mut [u8]) -> Result<()> {
        if output.len() < self.digest_size() {
            return Err(CryptoError::InvalidSize(
                "digest output buffer is smaller than the digest size",
            ));
        }
        let hash = self.inner.finalize_reset();
        output[..64].copy_from_slice(&hash);
        Ok(())
    }

    fn reset(&mut self) {
        sha2::Digest::reset(&mut self.inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_abc_kat() {
        let mut d = Sha2256::new();
        d.update(b"abc");
        let mut out = [0u8; 32];
        d.finalize_into(&mut out).unwrap();
        assert_eq!(
            hex::encode(out),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sha512_abc_kat() {
        let mut d = Sha2512::new();
        d.update(b"abc");
        let mut out = [0u8; 64];
        d.finalize_into(&mut out).unwrap();
        assert_eq!(
            hex::encode(out),
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
             2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
        );
    }

    #[test]
    fn finalize_resets_state() {
        let mut d = Sha2256::new();
        d.update(b"first message");
        let mut first = [0u8; 32];
        d.finalize_into(&mut first).unwrap();

        d.update(b"first message");
        let mut second = [0u8; 32];
        d.finalize_into(&mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn short_output_buffer_is_rejected() {
        let mut d = Sha2256::new();
        let mut out = [0u8; 16];
        assert!(d.finalize_into(&mut out).is_err());
    }
}
