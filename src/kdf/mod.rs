//! Key derivation functions.
//!
//! Every KDF follows the same lifecycle: construct, `initialize` with a
//! [`SymmetricKey`], one or more `generate` calls, then `reset` before any
//! re-initialisation.

mod hkdf;
mod kdf2;
mod pbkdf2;
mod scrypt;
mod shake;

pub use hkdf::Hkdf;
pub use kdf2::Kdf2;
pub use pbkdf2::Pbkdf2;
pub use scrypt::Scrypt;
pub use shake::ShakeKdf;

use crate::enums::Kdfs;
use crate::error::Result;
use crate::key::{SymmetricKey, SymmetricKeySize};

/// A deterministic key derivation function.
pub trait Kdf: Send {
    /// The KDF's enumeration tag.
    fn enumeral(&self) -> Kdfs;

    /// The KDF's stable name.
    fn name(&self) -> String;

    /// Recommended key/salt/info size combinations.
    fn legal_key_sizes(&self) -> &[SymmetricKeySize];

    /// Whether the KDF has been keyed.
    fn is_initialized(&self) -> bool;

    /// Load keying material. The key field is required; nonce and info are
    /// interpreted per KDF (usually salt and salt-extension).
    fn initialize(&mut self, params: &SymmetricKey) -> Result<()>;

    /// Fill `output` with derived bytes, continuing the internal stream.
    /// Returns the number of bytes written.
    fn generate(&mut self, output: &mut [u8]) -> Result<usize>;

    /// Clear the keyed state; `initialize` must be called again before the
    /// next `generate`.
    fn reset(&mut self);
}
