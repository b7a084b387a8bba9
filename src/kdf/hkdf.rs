//! HKDF (RFC 5869): HMAC-based extract-then-expand.

use zeroize::{Zeroize, Zeroizing};

use crate::digest::{self, Digest};
use crate::enums::{Kdfs, Sha2Digests};
use crate::error::{CryptoError, Result};
use crate::key::{SymmetricKey, SymmetricKeySize};
use crate::mac::{Hmac, Mac};

use super::Kdf;

/// Minimum accepted input keying material length in bytes.
const MIN_KEY_LEN: usize = 16;

/// The RFC 5869 HKDF generator.
///
/// Initialised key-only it runs in expand-only mode with the key used as
/// the PRK directly; with a nonce present the nonce is the extract salt.
/// `generate` continues the `T(i)` stream positionally across calls, up to
/// the 255-block ceiling.
pub struct Hkdf {
    hmac: Hmac,
    current_t: Zeroizing<Vec<u8>>,
    info: Zeroizing<Vec<u8>>,
    generated_bytes: usize,
    legal_key_sizes: Vec<SymmetricKeySize>,
    is_initialized: bool,
}

impl Hkdf {
    /// An HKDF generator over the given SHA2 digest.
    pub fn new(digest_type: Sha2Digests) -> Result<Self> {
        if digest_type == Sha2Digests::None {
            return Err(CryptoError::IllegalOperation(
                "the digest type can not be none",
            ));
        }
        Self::with_digest(digest::from_tag(digest_type.into())?)
    }

    /// An HKDF generator over an arbitrary digest instance.
    pub fn with_digest(digest: Box<dyn Digest>) -> Result<Self> {
        let ds = digest.digest_size();
        let bs = digest.block_size();
        let legal_key_sizes = vec![
            SymmetricKeySize::new(ds, 0, 0),
            SymmetricKeySize::new(bs, 0, ds),
            SymmetricKeySize::new(bs, bs, ds),
        ];
        Ok(Self {
            hmac: Hmac::new(digest),
            current_t: Zeroizing::new(Vec::new()),
            info: Zeroizing::new(Vec::new()),
            generated_bytes: 0,
            legal_key_sizes,
            is_initialized: false,
        })
    }

    /// Maximum total output for one keying: 255 hash blocks.
    pub fn max_output(&self) -> usize {
        255 * self.hmac.mac_size()
    }

    /// `PRK = HMAC(salt, IKM)`; an absent salt keys the extraction with a
    /// hash-length block of zeros.
    fn extract(&mut self, salt: &[u8], ikm: &[u8], prk: &mut [u8]) -> Result<()> {
        if salt.is_empty() {
            let zeros = vec![0u8; self.hmac.mac_size()];
            self.hmac.initialize(&zeros)?;
        } else {
            self.hmac.initialize(salt)?;
        }
        self.hmac.update(ikm);
        self.hmac.finalize_into(prk)?;
        Ok(())
    }
}

impl Kdf for Hkdf {
    fn enumeral(&self) -> Kdfs {
        if self.hmac.mac_size() == 64 {
            Kdfs::Hkdf512
        } else {
            Kdfs::Hkdf256
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
        if params.key().len() < MIN_KEY_LEN {
            return Err(CryptoError::InvalidKey(
                "the input keying material must be at least 16 bytes",
            ));
        }
        if self.is_initialized {
            self.reset();
        }

        let hash = self.hmac.mac_size();
        if params.nonce().is_empty() {
            // expand-only: the key is the PRK
            self.hmac.initialize(params.key())?;
        } else {
            let mut prk = Zeroizing::new(vec![0u8; hash]);
            self.extract(params.nonce(), params.key(), &mut prk)?;
            self.hmac.initialize(&prk)?;
        }

        self.info = Zeroizing::new(params.info().to_vec());
        self.current_t = Zeroizing::new(vec![0u8; hash]);
        self.generated_bytes = 0;
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
        if self.generated_bytes + output.len() > self.max_output() {
            return Err(CryptoError::MaxExceeded(
                "hkdf may only be used for 255 hash blocks of output",
            ));
        }

        let hash = self.hmac.mac_size();
        let mut offset = 0;

        // resume mid-block from the previous call
        let pos = self.generated_bytes % hash;
        if pos != 0 {
            let take = (hash - pos).min(output.len());
            output[..take].copy_from_slice(&self.current_t[pos..pos + take]);
            self.generated_bytes += take;
            offset += take;
        }

        // T(n) = HMAC(PRK, T(n-1) || info || byte(n))
        while offset < output.len() {
            let n = self.generated_bytes / hash + 1;
            if self.generated_bytes != 0 {
                self.hmac.update(&self.current_t);
            }
            if !self.info.is_empty() {
                self.hmac.update(&self.info);
            }
            self.hmac.update(&[n as u8]);
            let mut next = Zeroizing::new(vec![0u8; hash]);
            self.hmac.finalize_into(&mut next)?;
            self.current_t = next;

            let take = hash.min(output.len() - offset);
            output[offset..offset + take].copy_from_slice(&self.current_t[..take]);
            self.generated_bytes += take;
            offset += take;
        }
        Ok(output.len())
    }

    fn reset(&mut self) {
        self.hmac.reset();
        self.current_t.zeroize();
        self.current_t = Zeroizing::new(Vec::new());
        self.info.zeroize();
        self.info = Zeroizing::new(Vec::new());
        self.generated_bytes = 0;
        self.is_initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kat(digest: Sha2Digests, key: &str, salt: &str, info: &str, expected: &str) {
        let expected = hex::decode(expected).unwrap();
        let mut gen = Hkdf::new(digest).unwrap();
        let params = if salt.is_empty() {
            SymmetricKey::with_info(
                hex::decode(key).unwrap(),
                Vec::new(),
                hex::decode(info).unwrap(),
            )
        } else {
            SymmetricKey::with_info(
                hex::decode(key).unwrap(),
                hex::decode(salt).unwrap(),
                hex::decode(info).unwrap(),
            )
        };
        gen.initialize(&params).unwrap();
        let mut output = vec![0u8; expected.len()];
        gen.generate(&mut output).unwrap();
        assert_eq!(output, expected);
    }

    const IKM_SHORT: &str = "0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B";
    const SALT_SHORT: &str = "000102030405060708090A0B0C";
    const INFO_SHORT: &str = "F0F1F2F3F4F5F6F7F8F9";

    #[test]
    fn rfc5869_sha256_extract_and_expand() {
        // official RFC 5869 test case 1
        kat(
            Sha2Digests::Sha256,
            IKM_SHORT,
            SALT_SHORT,
            INFO_SHORT,
            "3CB25F25FAACD57A90434F64D0362F2A2D2D0A90CF1A5A4C5DB02D56ECC4C5BF\
             34007208D5B887185865",
        );
    }

    #[test]
    fn expand_only_sha256() {
        kat(
            Sha2Digests::Sha256,
            IKM_SHORT,
            "",
            INFO_SHORT,
            "D03C9AB82C884B1DCFD3F4CFFD0E4AD1501915E5D72DF0E6D846D59F6CF78047\
             39958B5DF06BDE49DB6D",
        );
    }

    #[test]
    fn expand_only_sha512() {
        kat(
            Sha2Digests::Sha512,
            IKM_SHORT,
            "",
            INFO_SHORT,
            "7CE212EEB2A92270C4460A4728944B9B0EE9E060DE13C197853D37A20CE7184F\
             94390EAEA4C18CEF989D",
        );
    }

    #[test]
    fn extract_and_expand_sha512() {
        kat(
            Sha2Digests::Sha512,
            IKM_SHORT,
            SALT_SHORT,
            INFO_SHORT,
            "832390086CDA71FB47625BB5CEB168E4C8E26A1A16ED34D9FC7FE92C14815793\
             38DA362CB8D9F925D7CB",
        );
    }

    #[test]
    fn generation_is_positional_across_calls() {
        let ikm = hex::decode(IKM_SHORT).unwrap();
        let info = hex::decode(INFO_SHORT).unwrap();

        let mut gen = Hkdf::new(Sha2Digests::Sha256).unwrap();
        gen.initialize(&SymmetricKey::with_info(ikm.clone(), Vec::new(), info.clone()))
            .unwrap();
        let mut whole = vec![0u8; 90];
        gen.generate(&mut whole).unwrap();

        let mut gen = Hkdf::new(Sha2Digests::Sha256).unwrap();
        gen.initialize(&SymmetricKey::with_info(ikm, Vec::new(), info))
            .unwrap();
        let mut parts = vec![0u8; 90];
        gen.generate(&mut parts[..10]).unwrap();
        gen.generate(&mut parts[10..47]).unwrap();
        gen.generate(&mut parts[47..]).unwrap();
        assert_eq!(whole, parts);
    }

    #[test]
    fn output_ceiling_is_enforced() {
        let mut gen = Hkdf::new(Sha2Digests::Sha256).unwrap();
        gen.initialize(&SymmetricKey::new(vec![5u8; 32])).unwrap();
        let mut almost = vec![0u8; 255 * 32 - 1];
        gen.generate(&mut almost).unwrap();
        let mut last = vec![0u8; 1];
        gen.generate(&mut last).unwrap();
        let mut over = vec![0u8; 1];
        assert!(matches!(
            gen.generate(&mut over),
            Err(CryptoError::MaxExceeded(_))
        ));
    }

    #[test]
    fn short_key_is_rejected() {
        let mut gen = Hkdf::new(Sha2Digests::Sha256).unwrap();
        assert!(matches!(
            gen.initialize(&SymmetricKey::new(vec![1u8; 1])),
            Err(CryptoError::InvalidKey(_))
        ));
    }
}
