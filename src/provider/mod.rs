//! Entropy providers.

mod csp;

pub use csp::Csp;

use crate::enums::Providers;
use crate::error::Result;

/// A source of cryptographically strong seed material.
///
/// `generate` either fills the whole buffer or returns
/// [`crate::CryptoError::ProviderFailure`]; partial fills are never
/// surfaced.
pub trait EntropyProvider: Send {
    /// The provider's enumeration tag.
    fn enumeral(&self) -> Providers;

    /// The provider's stable name.
    fn name(&self) -> &'static str {
        self.enumeral().name()
    }

    /// Fill `output` with entropy.
    fn generate(&mut self, output: &mut [u8]) -> Result<()>;
}
