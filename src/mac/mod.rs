//! Message authentication codes.

mod hmac;

pub use hmac::Hmac;

use crate::enums::Macs;
use crate::error::Result;

/// A streaming keyed message authentication code.
pub trait Mac: Send {
    /// The MAC's enumeration tag.
    fn enumeral(&self) -> Macs;

    /// Internal block size of the underlying primitive in bytes.
    fn block_size(&self) -> usize;

    /// Output tag size in bytes.
    fn mac_size(&self) -> usize;

    /// Whether a key has been loaded.
    fn is_initialized(&self) -> bool;

    /// Key the MAC, replacing any previous keying.
    fn initialize(&mut self, key: &[u8]) -> Result<()>;

    /// Absorb message bytes.
    fn update(&mut self, input: &[u8]);

    /// Write the tag over everything absorbed since the last reset into
    /// `output`, then restart the keyed state for the next message.
    /// Returns the number of tag bytes written.
    fn finalize_into(&mut self, output: &mut [u8]) -> Result<usize>;

    /// Restart the keyed state, discarding absorbed input.
    fn reset(&mut self);

    /// The MAC's stable name.
    fn name(&self) -> String;
}
