//! Symmetric keystream and keying engines.
//!
//! - BCG: a CTR-mode deterministic byte generator over a 128-bit block
//!   cipher, with staggered wide-block batching, multi-threaded dispatch
//!   and KDF-extracted reseeding from an entropy provider
//! - RHX: Rijndael with the standard schedule (AES) or a KDF-driven
//!   extended schedule (HKDF/SHAKE) for up to 38 rounds
//! - KDF suite: KDF2 (ISO 18033-2), HKDF (RFC 5869), PBKDF2 (RFC 2898)
//!   and SCRYPT (RFC 7914, Salsa20/8 core)
//! - HMAC over pluggable digests, OS entropy providers, and a `rand_core`
//!   PRNG facade
//!
//! Sensitive material (keys, round keys, counters, salts, intermediate
//! KDF state) is zeroized on drop. All recoverable failures surface as
//! [`CryptoError`]; nothing panics on user input.
//!
//! # Example
//!
//! ```
//! use keystream::{Bcg, BlockCiphers, BlockCipherExtensions, Drbg, Providers, SymmetricKey};
//!
//! let mut generator = Bcg::new(
//!     BlockCiphers::Rijndael,
//!     BlockCipherExtensions::None,
//!     Providers::None,
//!     false,
//! )?;
//! // seed = counter(16) || key(32)
//! let seed: Vec<u8> = (0u8..48).collect();
//! generator.initialize(&SymmetricKey::new(seed))?;
//!
//! let mut keystream = vec![0u8; 1024];
//! generator.generate(&mut keystream)?;
//! # Ok::<(), keystream::CryptoError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cipher;
pub mod digest;
pub mod drbg;
pub mod enums;
pub mod error;
pub mod kdf;
pub mod key;
pub mod mac;
pub mod parallel;
pub mod prng;
pub mod provider;

pub use cipher::{BlockCipher, Rhx};
pub use digest::{Digest, KeccakParams, Sha2Params, Sha2256, Sha2512, Sha3256, Sha3512};
pub use drbg::{Bcg, Drbg};
pub use enums::{
    BlockCipherExtensions, BlockCiphers, CipherModes, Digests, Drbgs, Kdfs, Macs, PaddingModes,
    Providers, Sha2Digests, StreamCiphers,
};
pub use error::{CryptoError, Result};
pub use kdf::{Hkdf, Kdf, Kdf2, Pbkdf2, Scrypt, ShakeKdf};
pub use key::{SymmetricKey, SymmetricKeySize};
pub use mac::{Hmac, Mac};
pub use parallel::{ParallelOptions, SimdProfile};
pub use prng::BlockPrng;
pub use provider::{Csp, EntropyProvider};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
