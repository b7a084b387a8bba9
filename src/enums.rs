//! Value-type tags for the primitive families.
//!
//! Every enumeration is a `#[repr(u8)]` tag with a stable string name, so
//! configurations can be serialized as single bytes and reported in logs
//! without ambiguity. Tags exist for families the library only interfaces
//! with (padding, cipher modes, stream ciphers); the implementations behind
//! those tags live outside this crate.

use serde::{Deserialize, Serialize};

macro_rules! tag_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $( $(#[$vmeta:meta])* $variant:ident = $value:literal => $string:literal ),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[repr(u8)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value, )+
        }

        impl $name {
            /// The stable string name of this tag.
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $string, )+
                }
            }

            /// Reconstruct a tag from its serialized byte form.
            pub fn from_raw(value: u8) -> Option<Self> {
                match value {
                    $( $value => Some(Self::$variant), )+
                    _ => None,
                }
            }

            /// Reconstruct a tag from its stable string name.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( $string => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }
    };
}

tag_enum! {
    /// Block cipher implementations.
    BlockCiphers {
        /// No cipher selected.
        None = 0 => "None",
        /// Rijndael with the standard key schedule (AES).
        Rijndael = 1 => "Rijndael",
        /// Serpent with the standard key schedule (interface tag only).
        Serpent = 2 => "Serpent",
        /// Rijndael with a KDF-driven extended key schedule.
        Rhx = 3 => "RHX",
        /// Serpent with a KDF-driven extended key schedule (interface tag only).
        Shx = 4 => "SHX",
    }
}

tag_enum! {
    /// Key-schedule extension engines for the HX cipher family.
    BlockCipherExtensions {
        /// Standard (non-extended) key schedule.
        None = 0 => "None",
        /// HKDF(HMAC(SHA2-256)) round-key expansion.
        Hkdf256 = 1 => "HKDF-SHA2-256",
        /// HKDF(HMAC(SHA2-512)) round-key expansion.
        Hkdf512 = 2 => "HKDF-SHA2-512",
        /// SHAKE-128 round-key expansion.
        Shake128 = 3 => "SHAKE-128",
        /// SHAKE-256 round-key expansion.
        Shake256 = 4 => "SHAKE-256",
    }
}

tag_enum! {
    /// Message digest implementations.
    Digests {
        /// No digest selected.
        None = 0 => "None",
        /// SHA3-256 (FIPS 202).
        Sha3256 = 7 => "SHA3-256",
        /// SHA3-512 (FIPS 202).
        Sha3512 = 8 => "SHA3-512",
        /// SHA2-256 (FIPS 180-4).
        Sha2256 = 9 => "SHA2-256",
        /// SHA2-512 (FIPS 180-4).
        Sha2512 = 10 => "SHA2-512",
    }
}

tag_enum! {
    /// The SHA2 sub-family, byte-compatible with [`Digests`].
    Sha2Digests {
        /// No digest selected.
        None = 0 => "None",
        /// SHA2-256.
        Sha256 = 9 => "SHA2-256",
        /// SHA2-512.
        Sha512 = 10 => "SHA2-512",
    }
}

tag_enum! {
    /// Key derivation functions.
    Kdfs {
        /// No KDF selected.
        None = 0 => "None",
        /// HKDF expand using HMAC(SHA2-256).
        Hkdf256 = 1 => "HKDF-SHA2-256",
        /// HKDF expand using HMAC(SHA2-512).
        Hkdf512 = 2 => "HKDF-SHA2-512",
        /// ISO-18033-2 KDF2 over SHA2-256.
        Kdf2256 = 3 => "KDF2256",
        /// ISO-18033-2 KDF2 over SHA2-512.
        Kdf2512 = 4 => "KDF2512",
        /// RFC 2898 PBKDF2 over HMAC(SHA2-256).
        Pbkdf2256 = 5 => "PBKDF2256",
        /// RFC 2898 PBKDF2 over HMAC(SHA2-512).
        Pbkdf2512 = 6 => "PBKDF2512",
        /// RFC 7914 SCRYPT over HMAC(SHA2-256).
        Scrypt256 = 7 => "SCRYPT256",
        /// SHAKE-128 extendable-output expansion.
        Shake128 = 8 => "SHAKE-128",
        /// SHAKE-256 extendable-output expansion.
        Shake256 = 9 => "SHAKE-256",
    }
}

tag_enum! {
    /// Message authentication codes.
    Macs {
        /// No MAC selected.
        None = 0 => "None",
        /// HMAC over SHA2-256.
        HmacSha256 = 1 => "HMAC-SHA2-256",
        /// HMAC over SHA2-512.
        HmacSha512 = 2 => "HMAC-SHA2-512",
    }
}

tag_enum! {
    /// Deterministic random bit generators.
    Drbgs {
        /// No generator selected.
        None = 0 => "None",
        /// Block-cipher counter generator.
        Bcg = 1 => "BCG",
    }
}

tag_enum! {
    /// Entropy providers.
    Providers {
        /// No provider attached.
        None = 0 => "None",
        /// Operating-system cryptographic service provider.
        Csp = 1 => "CSP",
    }
}

tag_enum! {
    /// Padding modes (interface tags only).
    PaddingModes {
        /// No padding.
        None = 0 => "None",
        /// Incrementing-byte padding.
        Esp = 1 => "ESP",
        /// PKCS#7 padding.
        Pkcs7 = 2 => "PKCS7",
        /// ANSI X9.23 padding.
        X923 = 3 => "X923",
        /// 0x80 + zeros padding.
        ZeroOne = 4 => "ZeroOne",
    }
}

tag_enum! {
    /// Cipher modes of operation (interface tags only).
    CipherModes {
        /// No mode selected.
        None = 0 => "None",
        /// Cipher block chaining.
        Cbc = 1 => "CBC",
        /// Cipher feedback.
        Cfb = 2 => "CFB",
        /// Segmented integer counter.
        Ctr = 3 => "CTR",
        /// Electronic codebook (testing only).
        Ecb = 4 => "ECB",
        /// Output feedback.
        Ofb = 5 => "OFB",
    }
}

tag_enum! {
    /// Stream ciphers (interface tags only).
    StreamCiphers {
        /// No cipher selected.
        None = 0 => "None",
        /// ChaCha with a 256-bit key.
        ChaCha256 = 1 => "ChaCha256",
        /// Threefish-256.
        Threefish256 = 2 => "Threefish256",
    }
}

impl From<Sha2Digests> for Digests {
    fn from(value: Sha2Digests) -> Self {
        match value {
            Sha2Digests::None => Digests::None,
            Sha2Digests::Sha256 => Digests::Sha2256,
            Sha2Digests::Sha512 => Digests::Sha2512,
        }
    }
}

impl From<BlockCipherExtensions> for Kdfs {
    fn from(value: BlockCipherExtensions) -> Self {
        match value {
            BlockCipherExtensions::None => Kdfs::None,
            BlockCipherExtensions::Hkdf256 => Kdfs::Hkdf256,
            BlockCipherExtensions::Hkdf512 => Kdfs::Hkdf512,
            BlockCipherExtensions::Shake128 => Kdfs::Shake128,
            BlockCipherExtensions::Shake256 => Kdfs::Shake256,
        }
    }
}
