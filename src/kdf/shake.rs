//! SHAKE extendable-output expansion as a KDF.
//!
//! Used by the extended cipher's secure key schedule; absorbs
//! `key || salt || info` and squeezes an unbounded keystream.

use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::{Shake128, Shake128Reader, Shake256, Shake256Reader};

use crate::enums::Kdfs;
use crate::error::{CryptoError, Result};
use crate::key::{SymmetricKey, SymmetricKeySize};

use super::Kdf;

/// Minimum accepted key length in bytes.
const MIN_KEY_LEN: usize = 16;

enum Hasher {
    Shake128(Shake128),
    Shake256(Shake256),
}

enum Reader {
    Shake128(Box<Shake128Reader>),
    Shake256(Box<Shake256Reader>),
}

enum State {
    Idle,
    Absorbed(Hasher),
    Squeezing(Reader),
}

/// SHAKE-128 or SHAKE-256 as a streaming key derivation function.
pub struct ShakeKdf {
    kind: Kdfs,
    rate: usize,
    state: State,
    legal_key_sizes: Vec<SymmetricKeySize>,
}

impl ShakeKdf {
    /// A SHAKE KDF; `kind` must be [`Kdfs::Shake128`] or [`Kdfs::Shake256`].
    pub fn new(kind: Kdfs) -> Result<Self> {
        let rate = match kind {
            Kdfs::Shake128 => 168,
            Kdfs::Shake256 => 136,
            _ => {
                return Err(CryptoError::IllegalOperation(
                    "the kdf type must be a shake variant",
                ))
            }
        };
        let legal_key_sizes = vec![
            SymmetricKeySize::new(32, 0, 0),
            SymmetricKeySize::new(64, 0, rate),
            SymmetricKeySize::new(rate, rate, rate),
        ];
        Ok(Self {
            kind,
            rate,
            state: State::Idle,
            legal_key_sizes,
        })
    }

    /// The sponge rate (block size) in bytes.
    pub fn rate(&self) -> usize {
        self.rate
    }
}

impl Kdf for ShakeKdf {
    fn enumeral(&self) -> Kdfs {
        self.kind
    }

    fn name(&self) -> String {
        self.kind.name().to_string()
    }

    fn legal_key_sizes(&self) -> &[SymmetricKeySize] {
        &self.legal_key_sizes
    }

    fn is_initialized(&self) -> bool {
        !matches!(self.state, State::Idle)
    }

    fn initialize(&mut self, params: &SymmetricKey) -> Result<()> {
        if params.key().len() < MIN_KEY_LEN {
            return Err(CryptoError::InvalidKey(
                "the key must be at least 16 bytes",
            ));
        }

        let mut hasher = match self.kind {
            Kdfs::Shake128 => Hasher::Shake128(Shake128::default()),
            _ => Hasher::Shake256(Shake256::default()),
        };
        let absorb = |h: &mut Hasher, data: &[u8]| match h {
            Hasher::Shake128(inner) => Update::update(inner, data),
            Hasher::Shake256(inner) => Update::update(inner, data),
        };
        absorb(&mut hasher, params.key());
        if !params.nonce().is_empty() {
            absorb(&mut hasher, params.nonce());
        }
        if !params.info().is_empty() {
            absorb(&mut hasher, params.info());
        }

        self.state = State::Absorbed(hasher);
        Ok(())
    }

    fn generate(&mut self, output: &mut [u8]) -> Result<usize> {
        // move to the squeezing phase on the first read
        if let State::Absorbed(_) = self.state {
            let absorbed = core::mem::replace(&mut self.state, State::Idle);
            let reader = match absorbed {
                State::Absorbed(Hasher::Shake128(h)) => {
                    Reader::Shake128(Box::new(h.finalize_xof()))
                }
                State::Absorbed(Hasher::Shake256(h)) => {
                    Reader::Shake256(Box::new(h.finalize_xof()))
                }
                _ => unreachable!(),
            };
            self.state = State::Squeezing(reader);
        }

        match &mut self.state {
            State::Squeezing(Reader::Shake128(reader)) => reader.read(output),
            State::Squeezing(Reader::Shake256(reader)) => reader.read(output),
            _ => {
                return Err(CryptoError::NotInitialized(
                    "the generator must be initialized before use",
                ))
            }
        }
        Ok(output.len())
    }

    fn reset(&mut self) {
        self.state = State::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_for_a_fixed_key() {
        let key = SymmetricKey::new(vec![0x42u8; 32]);

        let mut a = ShakeKdf::new(Kdfs::Shake256).unwrap();
        a.initialize(&key).unwrap();
        let mut out_a = vec![0u8; 200];
        a.generate(&mut out_a).unwrap();

        let mut b = ShakeKdf::new(Kdfs::Shake256).unwrap();
        b.initialize(&key).unwrap();
        let mut out_b = vec![0u8; 200];
        b.generate(&mut out_b).unwrap();
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn squeezing_is_positional_across_calls() {
        let key = SymmetricKey::new(vec![0x42u8; 32]);

        let mut whole_kdf = ShakeKdf::new(Kdfs::Shake128).unwrap();
        whole_kdf.initialize(&key).unwrap();
        let mut whole = vec![0u8; 96];
        whole_kdf.generate(&mut whole).unwrap();

        let mut parts_kdf = ShakeKdf::new(Kdfs::Shake128).unwrap();
        parts_kdf.initialize(&key).unwrap();
        let mut parts = vec![0u8; 96];
        parts_kdf.generate(&mut parts[..33]).unwrap();
        parts_kdf.generate(&mut parts[33..]).unwrap();
        assert_eq!(whole, parts);
    }

    #[test]
    fn info_separates_streams() {
        let mut a = ShakeKdf::new(Kdfs::Shake256).unwrap();
        a.initialize(&SymmetricKey::with_info(vec![1u8; 32], Vec::new(), b"A".to_vec()))
            .unwrap();
        let mut out_a = vec![0u8; 64];
        a.generate(&mut out_a).unwrap();

        let mut b = ShakeKdf::new(Kdfs::Shake256).unwrap();
        b.initialize(&SymmetricKey::with_info(vec![1u8; 32], Vec::new(), b"B".to_vec()))
            .unwrap();
        let mut out_b = vec![0u8; 64];
        b.generate(&mut out_b).unwrap();
        assert_ne!(out_a, out_b);
    }

    #[test]
    fn guards() {
        assert!(ShakeKdf::new(Kdfs::Kdf2256).is_err());

        let mut gen = ShakeKdf::new(Kdfs::Shake256).unwrap();
        let mut out = vec![0u8; 32];
        assert!(matches!(
            gen.generate(&mut out),
            Err(CryptoError::NotInitialized(_))
        ));
        assert!(matches!(
            gen.initialize(&SymmetricKey::new(vec![1u8; 4])),
            Err(CryptoError::InvalidKey(_))
        ));
    }
}
