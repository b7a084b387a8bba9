//! Rijndael lookup tables.
//!
//! The S-boxes and the eight 4x256 transformation tables are built at
//! compile time from the forward S-box and shared process-wide as
//! read-only statics.

/// GF(2^8) doubling modulo the Rijndael polynomial.
const fn xtime(x: u8) -> u8 {
    (x << 1) ^ (if x & 0x80 != 0 { 0x1B } else { 0 })
}

/// GF(2^8) multiplication modulo the Rijndael polynomial.
const fn gmul(mut a: u8, mut b: u8) -> u8 {
    let mut product = 0u8;
    while b != 0 {
        if b & 1 != 0 {
            product ^= a;
        }
        a = xtime(a);
        b >>= 1;
    }
    product
}

const SBOX_BYTES: [u8; 256] = [
    0x63, 0x7C, 0x77, 0x7B, 0xF2, 0x6B, 0x6F, 0xC5, 0x30, 0x01, 0x67, 0x2B, 0xFE, 0xD7, 0xAB,
    0x76, 0xCA, 0x82, 0xC9, 0x7D, 0xFA, 0x59, 0x47, 0xF0, 0xAD, 0xD4, 0xA2, 0xAF, 0x9C, 0xA4,
    0x72, 0xC0, 0xB7, 0xFD, 0x93, 0x26, 0x36, 0x3F, 0xF7, 0xCC, 0x34, 0xA5, 0xE5, 0xF1, 0x71,
    0xD8, 0x31, 0x15, 0x04, 0xC7, 0x23, 0xC3, 0x18, 0x96, 0x05, 0x9A, 0x07, 0x12, 0x80, 0xE2,
    0xEB, 0x27, 0xB2, 0x75, 0x09, 0x83, 0x2C, 0x1A, 0x1B, 0x6E, 0x5A, 0xA0, 0x52, 0x3B, 0xD6,
    0xB3, 0x29, 0xE3, 0x2F, 0x84, 0x53, 0xD1, 0x00, 0xED, 0x20, 0xFC, 0xB1, 0x5B, 0x6A, 0xCB,
    0xBE, 0x39, 0x4A, 0x4C, 0x58, 0xCF, 0xD0, 0xEF, 0xAA, 0xFB, 0x43, 0x4D, 0x33, 0x85, 0x45,
    0xF9, 0x02, 0x7F, 0x50, 0x3C, 0x9F, 0xA8, 0x51, 0xA3, 0x40, 0x8F, 0x92, 0x9D, 0x38, 0xF5,
    0xBC, 0xB6, 0xDA, 0x21, 0x10, 0xFF, 0xF3, 0xD2, 0xCD, 0x0C, 0x13, 0xEC, 0x5F, 0x97, 0x44,
    0x17, 0xC4, 0xA7, 0x7E, 0x3D, 0x64, 0x5D, 0x19, 0x73, 0x60, 0x81, 0x4F, 0xDC, 0x22, 0x2A,
    0x90, 0x88, 0x46, 0xEE, 0xB8, 0x14, 0xDE, 0x5E, 0x0B, 0xDB, 0xE0, 0x32, 0x3A, 0x0A, 0x49,
    0x06, 0x24, 0x5C, 0xC2, 0xD3, 0xAC, 0x62, 0x91, 0x95, 0xE4, 0x79, 0xE7, 0xC8, 0x37, 0x6D,
    0x8D, 0xD5, 0x4E, 0xA9, 0x6C, 0x56, 0xF4, 0xEA, 0x65, 0x7A, 0xAE, 0x08, 0xBA, 0x78, 0x25,
    0x2E, 0x1C, 0xA6, 0xB4, 0xC6, 0xE8, 0xDD, 0x74, 0x1F, 0x4B, 0xBD, 0x8B, 0x8A, 0x70, 0x3E,
    0xB5, 0x66, 0x48, 0x03, 0xF6, 0x0E, 0x61, 0x35, 0x57, 0xB9, 0x86, 0xC1, 0x1D, 0x9E, 0xE1,
    0xF8, 0x98, 0x11, 0x69, 0xD9, 0x8E, 0x94, 0x9B, 0x1E, 0x87, 0xE9, 0xCE, 0x55, 0x28, 0xDF,
    0x8C, 0xA1, 0x89, 0x0D, 0xBF, 0xE6, 0x42, 0x68, 0x41, 0x99, 0x2D, 0x0F, 0xB0, 0x54, 0xBB,
    0x16,
];

const fn invert_sbox(sbox: [u8; 256]) -> [u8; 256] {
    let mut inverse = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        inverse[sbox[i] as usize] = i as u8;
        i += 1;
    }
    inverse
}

const ISBOX_BYTES: [u8; 256] = invert_sbox(SBOX_BYTES);

/// Encryption table column `[02, 01, 01, 03] * S[x]`, byte-rotated by the
/// table index.
const fn build_enc_table(shift: u32) -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let s = SBOX_BYTES[i];
        let word = ((gmul(s, 2) as u32) << 24)
            | ((s as u32) << 16)
            | ((s as u32) << 8)
            | (gmul(s, 3) as u32);
        table[i] = word.rotate_right(8 * shift);
        i += 1;
    }
    table
}

/// Decryption table column `[0E, 09, 0D, 0B] * Si[x]`, byte-rotated by the
/// table index.
const fn build_dec_table(shift: u32) -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let si = ISBOX_BYTES[i];
        let word = ((gmul(si, 14) as u32) << 24)
            | ((gmul(si, 9) as u32) << 16)
            | ((gmul(si, 13) as u32) << 8)
            | (gmul(si, 11) as u32);
        table[i] = word.rotate_right(8 * shift);
        i += 1;
    }
    table
}

/// The forward S-box.
pub static SBOX: [u8; 256] = SBOX_BYTES;
/// The inverse S-box.
pub static ISBOX: [u8; 256] = ISBOX_BYTES;

/// Encryption tables.
pub static T0: [u32; 256] = build_enc_table(0);
/// Encryption tables.
pub static T1: [u32; 256] = build_enc_table(1);
/// Encryption tables.
pub static T2: [u32; 256] = build_enc_table(2);
/// Encryption tables.
pub static T3: [u32; 256] = build_enc_table(3);

/// Decryption tables.
pub static IT0: [u32; 256] = build_dec_table(0);
/// Decryption tables.
pub static IT1: [u32; 256] = build_dec_table(1);
/// Decryption tables.
pub static IT2: [u32; 256] = build_dec_table(2);
/// Decryption tables.
pub static IT3: [u32; 256] = build_dec_table(3);

/// Round constants for the standard key schedule, indexed from 1.
pub static RCON: [u32; 11] = [
    0x0000_0000,
    0x0100_0000,
    0x0200_0000,
    0x0400_0000,
    0x0800_0000,
    0x1000_0000,
    0x2000_0000,
    0x4000_0000,
    0x8000_0000,
    0x1B00_0000,
    0x3600_0000,
];
