//! Message digest interface and adapters.
//!
//! The keystream core consumes hashes as opaque collaborators through the
//! [`Digest`] trait; the concrete implementations are the RustCrypto `sha2`
//! and `sha3` crates wrapped in thin adapters.

mod params;
mod sha2;
mod sha3;

pub use params::{KeccakParams, Sha2Params};
pub use sha2::{Sha2256, Sha2512};
pub use sha3::{Sha3256, Sha3512};

use crate::enums::Digests;
use crate::error::{CryptoError, Result};

/// A streaming message digest.
///
/// `finalize_into` writes exactly `digest_size` bytes and resets the
/// internal state, so an instance can be reused for the next message.
pub trait Digest: Send {
    /// The digest's enumeration tag.
    fn enumeral(&self) -> Digests;

    /// Internal block (rate) size in bytes.
    fn block_size(&self) -> usize;

    /// Output size in bytes.
    fn digest_size(&self) -> usize;

    /// Absorb input bytes.
    fn update(&mut self, input: &[u8]);

    /// Write the digest of everything absorbed since the last reset into
    /// `output` and reset the state.
    fn finalize_into(&mut self, output: &mut [u8]) -> Result<()>;

    /// Discard all absorbed input.
    fn reset(&mut self);

    /// The digest's stable name.
    fn name(&self) -> &'static str {
        self.enumeral().name()
    }
}

/// Construct a boxed digest instance from its tag.
pub fn from_tag(digest: Digests) -> Result<Box<dyn Digest>> {
    match digest {
        Digests::Sha2256 => Ok(Box::new(Sha2256::new())),
        Digests::Sha2512 => Ok(Box::new(Sha2512::new())),
        Digests::Sha3256 => Ok(Box::new(Sha3256::new())),
        Digests::Sha3512 => Ok(Box::new(Sha3512::new())),
        Digests::None => Err(CryptoError::IllegalOperation(
            "the digest type can not be none",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_tag_rejects_none() {
        assert!(from_tag(Digests::None).is_err());
        assert!(from_tag(Digests::Sha2256).is_ok());
    }

    #[test]
    fn boxed_digests_report_geometry() {
        let cases: [(Digests, usize, usize); 4] = [
            (Digests::Sha2256, 64, 32),
            (Digests::Sha2512, 128, 64),
            (Digests::Sha3256, 136, 32),
            (Digests::Sha3512, 72, 64),
        ];
        for (tag, block, out) in cases {
            let d = from_tag(tag).unwrap();
            assert_eq!(d.block_size(), block, "{}", tag.name());
            assert_eq!(d.digest_size(), out, "{}", tag.name());
        }
    }
}
