//! Deterministic random bit generators.

mod bcg;

pub use bcg::Bcg;

use crate::enums::Drbgs;
use crate::error::Result;
use crate::key::{SymmetricKey, SymmetricKeySize};

/// A seeded deterministic byte generator.
pub trait Drbg: Send {
    /// The generator's enumeration tag.
    fn enumeral(&self) -> Drbgs;

    /// The generator's stable name.
    fn name(&self) -> String;

    /// Whether the generator has been seeded.
    fn is_initialized(&self) -> bool;

    /// Legal key-size triples of the underlying engine.
    fn legal_key_sizes(&self) -> &[SymmetricKeySize];

    /// Seed the generator; dispatches on which key fields are present.
    fn initialize(&mut self, params: &SymmetricKey) -> Result<()>;

    /// Fill `output` with pseudo-random bytes; returns the count written.
    fn generate(&mut self, output: &mut [u8]) -> Result<usize>;

    /// Re-key with fresh seed material of the original seed length.
    fn update(&mut self, seed: &[u8]) -> Result<()>;

    /// Clear all keying material; the generator must be re-initialized.
    fn reset(&mut self);
}
