//! HMAC (RFC 2104) over any [`Digest`].

use zeroize::Zeroizing;

use crate::digest::Digest;
use crate::enums::{Digests, Macs};
use crate::error::{CryptoError, Result};

use super::Mac;

const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5C;

/// A keyed hash polymorphic over the message digest.
///
/// Stores the two block-sized pads derived from the key; `finalize_into`
/// computes `H(opad || H(ipad || message))` and re-absorbs the inner pad so
/// the instance is immediately ready for the next message.
pub struct Hmac {
    digest: Box<dyn Digest>,
    ipad: Zeroizing<Vec<u8>>,
    opad: Zeroizing<Vec<u8>>,
    is_initialized: bool,
}

impl Hmac {
    /// An HMAC over the given digest instance; key it with
    /// [`Mac::initialize`] before use.
    pub fn new(digest: Box<dyn Digest>) -> Self {
        let block = digest.block_size();
        Self {
            digest,
            ipad: Zeroizing::new(vec![0u8; block]),
            opad: Zeroizing::new(vec![0u8; block]),
            is_initialized: false,
        }
    }

    /// Convenience: key the MAC at construction.
    pub fn with_key(digest: Box<dyn Digest>, key: &[u8]) -> Result<Self> {
        let mut mac = Self::new(digest);
        mac.initialize(key)?;
        Ok(mac)
    }

    /// One-shot tag computation.
    pub fn compute_into(&mut self, message: &[u8], output: &mut [u8]) -> Result<usize> {
        if !self.is_initialized {
            return Err(CryptoError::NotInitialized(
                "the mac must be keyed before use",
            ));
        }
        self.update(message);
        self.finalize_into(output)
    }
}

impl Mac for Hmac {
    fn enumeral(&self) -> Macs {
        match self.digest.enumeral() {
            Digests::Sha2512 | Digests::Sha3512 => Macs::HmacSha512,
            _ => Macs::HmacSha256,
        }
    }

    fn block_size(&self) -> usize {
        self.digest.block_size()
    }

    fn mac_size(&self) -> usize {
        self.digest.digest_size()
    }

    fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    fn initialize(&mut self, key: &[u8]) -> Result<()> {
        let block = self.digest.block_size();
        let hash = self.digest.digest_size();

        // key' = key if |key| <= B else H(key), right-padded with zeros
        let mut padded = Zeroizing::new(vec![0u8; block]);
        if key.len() <= block {
            padded[..key.len()].copy_from_slice(key);
        } else {
            self.digest.reset();
            self.digest.update(key);
            self.digest.finalize_into(&mut padded[..hash])?;
        }

        for i in 0..block {
            self.ipad[i] = padded[i] ^ IPAD;
            self.opad[i] = padded[i] ^ OPAD;
        }

        self.digest.reset();
        self.digest.update(&self.ipad);
        self.is_initialized = true;
        Ok(())
    }

    fn update(&mut self, input: &[u8]) {
        self.digest.update(input);
    }

    fn finalize_into(&mut self, output: &mut [u8]) -> Result<usize> {
        if !self.is_initialized {
            return Err(CryptoError::NotInitialized(
                "the mac must be keyed before use",
            ));
        }
        let hash = self.digest.digest_size();
        if output.len() < hash {
            return Err(CryptoError::InvalidSize(
                "mac output buffer is smaller than the tag size",
            ));
        }

        let mut inner = Zeroizing::new(vec![0u8; hash]);
        self.digest.finalize_into(&mut inner)?;
        self.digest.update(&self.opad);
        self.digest.update(&inner);
        self.digest.finalize_into(&mut output[..hash])?;

        // ready for the next message
        self.digest.update(&self.ipad);
        Ok(hash)
    }

    fn reset(&mut self) {
        self.digest.reset();
        if self.is_initialized {
            self.digest.update(&self.ipad);
        }
    }

    fn name(&self) -> String {
        format!("HMAC-{}", self.digest.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::{Sha2256, Sha2512};

    fn tag256(key: &[u8], message: &[u8]) -> Vec<u8> {
        let mut mac = Hmac::with_key(Box::new(Sha2256::new()), key).unwrap();
        let mut out = vec![0u8; mac.mac_size()];
        mac.compute_into(message, &mut out).unwrap();
        out
    }

    fn tag512(key: &[u8], message: &[u8]) -> Vec<u8> {
        let mut mac = Hmac::with_key(Box::new(Sha2512::new()), key).unwrap();
        let mut out = vec![0u8; mac.mac_size()];
        mac.compute_into(message, &mut out).unwrap();
        out
    }

    // RFC 4231 test cases 1, 2, 3, 6 and 7.
    #[test]
    fn rfc4231_sha256() {
        let cases: [(&str, &str, &str); 5] = [
            (
                "0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B",
                "4869205468657265",
                "B0344C61D8DB38535CA8AFCEAF0BF12B881DC200C9833DA726E9376C2E32CFF7",
            ),
            (
                "4A656665",
                "7768617420646F2079612077616E7420666F72206E6F7468696E673F",
                "5BDCC146BF60754E6A042426089575C75A003F089D2739839DEC58B964EC3843",
            ),
            (
                "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
                "DDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDD\
                 DDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDD",
                "773EA91E36800E46854DB8EBD09181A72959098B3EF8C122D9635514CED565FE",
            ),
            (
                "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA\
                 AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA\
                 AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA\
                 AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA\
                 AAAAAA",
                "54657374205573696E67204C6172676572205468616E20426C6F636B2D53697A\
                 65204B6579202D2048617368204B6579204669727374",
                "60E431591EE0B67F0D8A26AACBF5B77F8E0BC6213728C5140546040F0EE37F54",
            ),
            (
                "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA\
                 AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA\
                 AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA\
                 AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA\
                 AAAAAA",
                "5468697320697320612074657374207573696E672061206C6172676572207468\
                 616E20626C6F636B2D73697A65206B657920616E642061206C61726765722074\
                 68616E20626C6F636B2D73697A6520646174612E20546865206B6579206E6565\
                 647320746F20626520686173686564206265666F7265206265696E6720757365\
                 642062792074686520484D414320616C676F726974686D2E",
                "9B09FFA71B942FCB27635FBCD5B0E944BFDC63644F0713938A7F51535C3A35E2",
            ),
        ];

        for (key, message, expected) in cases {
            let tag = tag256(&hex::decode(key).unwrap(), &hex::decode(message).unwrap());
            assert_eq!(hex::encode_upper(tag), expected);
        }
    }

    #[test]
    fn rfc4231_sha512() {
        let tag = tag512(
            &hex::decode("0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B0B").unwrap(),
            &hex::decode("4869205468657265").unwrap(),
        );
        assert_eq!(
            hex::encode_upper(tag),
            "87AA7CDEA5EF619D4FF0B4241A1D6CB02379F4E2CE4EC2787AD0B30545E17CDE\
             DAA833B7D6B8A702038B274EAEA3F4E4BE9D914EEB61F1702E696C203A126854"
        );

        let tag = tag512(
            &hex::decode("4A656665").unwrap(),
            &hex::decode("7768617420646F2079612077616E7420666F72206E6F7468696E673F").unwrap(),
        );
        assert_eq!(
            hex::encode_upper(tag),
            "164B7A7BFCF819E2E395FBE73B56E0A387BD64222E831FD610270CD7EA250554\
             9758BF75C05A994A6D034F65F8F0E6FDCAEAB1A34D4A6B4B636E070A38BCE737"
        );
    }

    #[test]
    fn streaming_matches_one_shot() {
        let key = [0x0Bu8; 20];
        let one_shot = tag256(&key, b"Hi There");

        let mut mac = Hmac::with_key(Box::new(Sha2256::new()), &key).unwrap();
        mac.update(b"Hi ");
        mac.update(b"There");
        let mut streamed = vec![0u8; mac.mac_size()];
        mac.finalize_into(&mut streamed).unwrap();
        assert_eq!(one_shot, streamed);
    }

    #[test]
    fn finalize_restarts_the_keyed_state() {
        let key = [0x0Bu8; 20];
        let mut mac = Hmac::with_key(Box::new(Sha2256::new()), &key).unwrap();
        let mut first = vec![0u8; 32];
        mac.compute_into(b"Hi There", &mut first).unwrap();
        let mut second = vec![0u8; 32];
        mac.compute_into(b"Hi There", &mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn reset_discards_partial_input() {
        let key = [0x0Bu8; 20];
        let mut mac = Hmac::with_key(Box::new(Sha2256::new()), &key).unwrap();
        mac.update(b"garbage");
        mac.reset();
        let mut tag = vec![0u8; 32];
        mac.compute_into(b"Hi There", &mut tag).unwrap();
        assert_eq!(tag, tag256(&key, b"Hi There"));
    }

    #[test]
    fn unkeyed_mac_is_rejected() {
        let mut mac = Hmac::new(Box::new(Sha2256::new()));
        let mut out = vec![0u8; 32];
        assert!(matches!(
            mac.finalize_into(&mut out),
            Err(CryptoError::NotInitialized(_))
        ));
    }
}
