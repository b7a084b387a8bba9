//! Symmetric key container and legal-size descriptors.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A symmetric keying parameter set: a required key plus optional nonce and
/// info (distribution code) fields.
///
/// Primitives dispatch on which fields are present: key-only, key+nonce, or
/// key+nonce+info. All three buffers are owned and zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    key: Vec<u8>,
    nonce: Vec<u8>,
    info: Vec<u8>,
}

impl SymmetricKey {
    /// Key-only parameter set.
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            nonce: Vec::new(),
            info: Vec::new(),
        }
    }

    /// Key and nonce parameter set.
    pub fn with_nonce(key: impl Into<Vec<u8>>, nonce: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            nonce: nonce.into(),
            info: Vec::new(),
        }
    }

    /// Key, nonce and info parameter set.
    pub fn with_info(
        key: impl Into<Vec<u8>>,
        nonce: impl Into<Vec<u8>>,
        info: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            key: key.into(),
            nonce: nonce.into(),
            info: info.into(),
        }
    }

    /// The primary key bytes.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// The nonce bytes; empty when absent.
    pub fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    /// The info (distribution code) bytes; empty when absent.
    pub fn info(&self) -> &[u8] {
        &self.info
    }
}

impl core::fmt::Debug for SymmetricKey {
    // never print key material
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("key_len", &self.key.len())
            .field("nonce_len", &self.nonce.len())
            .field("info_len", &self.info.len())
            .finish()
    }
}

/// A legal `{key, nonce, info}` size triple advertised by a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymmetricKeySize {
    key_size: usize,
    nonce_size: usize,
    info_size: usize,
}

impl SymmetricKeySize {
    /// A new size descriptor.
    pub const fn new(key_size: usize, nonce_size: usize, info_size: usize) -> Self {
        Self {
            key_size,
            nonce_size,
            info_size,
        }
    }

    /// Key length in bytes.
    pub const fn key_size(&self) -> usize {
        self.key_size
    }

    /// Nonce length in bytes.
    pub const fn nonce_size(&self) -> usize {
        self.nonce_size
    }

    /// Maximum info length in bytes.
    pub const fn info_size(&self) -> usize {
        self.info_size
    }

    /// Whether `sizes` contains an entry matching the given key length.
    pub fn contains(sizes: &[SymmetricKeySize], key_size: usize) -> bool {
        sizes.iter().any(|ks| ks.key_size == key_size)
    }

    /// Whether `sizes` contains an entry matching the given key and nonce
    /// lengths.
    pub fn contains_with_nonce(
        sizes: &[SymmetricKeySize],
        key_size: usize,
        nonce_size: usize,
    ) -> bool {
        sizes
            .iter()
            .any(|ks| ks.key_size == key_size && ks.nonce_size == nonce_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_fields() {
        let kp = SymmetricKey::with_info(vec![1u8; 32], vec![2u8; 16], vec![3u8; 8]);
        assert_eq!(kp.key().len(), 32);
        assert_eq!(kp.nonce().len(), 16);
        assert_eq!(kp.info().len(), 8);

        let kp = SymmetricKey::new(vec![1u8; 32]);
        assert!(kp.nonce().is_empty());
        assert!(kp.info().is_empty());
    }

    #[test]
    fn membership() {
        let sizes = [
            SymmetricKeySize::new(16, 16, 0),
            SymmetricKeySize::new(32, 16, 0),
        ];
        assert!(SymmetricKeySize::contains(&sizes, 32));
        assert!(!SymmetricKeySize::contains(&sizes, 24));
        assert!(SymmetricKeySize::contains_with_nonce(&sizes, 16, 16));
        assert!(!SymmetricKeySize::contains_with_nonce(&sizes, 16, 12));
    }

    #[test]
    fn debug_does_not_leak_key_bytes() {
        let kp = SymmetricKey::new(vec![0xAB; 32]);
        let printed = format!("{kp:?}");
        assert!(!printed.contains("171")); // 0xAB
        assert!(printed.contains("key_len"));
    }
}
