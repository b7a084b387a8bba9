//! Operating-system entropy.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::enums::Providers;
use crate::error::{CryptoError, Result};

use super::EntropyProvider;

/// The system cryptographic service provider, backed by the operating
/// system's entropy source.
#[derive(Debug, Default, Clone, Copy)]
pub struct Csp;

impl Csp {
    /// A new provider handle.
    pub fn new() -> Self {
        Self
    }
}

impl EntropyProvider for Csp {
    fn enumeral(&self) -> Providers {
        Providers::Csp
    }

    fn generate(&mut self, output: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(output)
            .map_err(|_| CryptoError::ProviderFailure("the system entropy source failed"))
    }
}
