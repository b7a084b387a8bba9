//! SHA3 (Keccak) family adapters.

use sha3::Digest as _;

use crate::enums::Digests;
use crate::error::{CryptoError, Result};

use super::Digest;

/// SHA3-256 (FIPS 202): 136-byte rate, 32-byte digest.
#[derive(Default, Clone)]
pub struct Sha3256 {
    inner: sha3::Sha3_256,
}

impl Sha3256 {
    /// A fresh instance.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Digest for Sha3256 {
    fn enumeral(&self) -> Digests {
        Digests::Sha3256
    }

    fn block_size(&self) -> usize {
        136
    }

    fn digest_size(&self) -> usize {
        32
    }

    fn update(&mut self, input: &[u8]) {
        sha3::Digest::update(&mut self.inner, input);
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
        sha3::Digest::reset(&mut self.inner);
    }
}

/// SHA3-512 (FIPS 202): 72-byte rate, 64-byte digest.
#[derive(Default, Clone)]
pub struct Sha3512 {
    inner: sha3::Sha3_512,
}

impl Sha3512 {
    /// A fresh instance.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Digest for Sha3512 {
    fn enumeral(&self) -> Digests {
        Digests::Sha3512
    }

    fn block_size(&self) -> usize {
        72
    }

    fn digest_size(&self) -> usize {
        64
    }

    fn update(&mut self, input: &[u8]) {
        sha3::Digest::update(&mut self.inner, input);
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
        sha3::Digest::reset(&mut self.inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha3_256_empty_kat() {
        let mut d = Sha3256::new();
        let mut out = [0u8; 32];
        d.finalize_into(&mut out).unwrap();
        assert_eq!(
            hex::encode_upper(out),
            "A7FFC6F8BF1ED76651C14756A061D662F580FF4DE43B49FA82D80A4B80F8434A"
        );
    }

    #[test]
    fn sha3_512_empty_kat() {
        let mut d = Sha3512::new();
        let mut out = [0u8; 64];
        d.finalize_into(&mut out).unwrap();
        assert_eq!(
            hex::encode(out),
            "a69f73cca23a9ac5c8b567dc185a756e97c982164fe25859e0d1dcc1475c80a6\
             15b2123af1f5f94c11e3e9402c3ac558f500199d95b6d3e301758586281dcd26"
        );
    }

    #[test]
    fn reset_discards_input() {
        let mut d = Sha3256::new();
        d.update(b"discarded");
        d.reset();
        let mut out = [0u8; 32];
        d.finalize_into(&mut out).unwrap();
        assert_eq!(
            hex::encode_upper(out),
            "A7FFC6F8BF1ED76651C14756A061D662F580FF4DE43B49FA82D80A4B80F8434A"
        );
    }
}
