//! RHX: Rijndael with a standard or KDF-extended key schedule.
//!
//! With no extension this is AES (10/12/14 rounds for 128/192/256-bit
//! keys, plus a fixed 22-round path for 512-bit keys). With an HKDF or
//! SHAKE extension the round-key array is filled from the KDF stream,
//! enabling 22/30/38 rounds for 256/512/1024-bit keys with
//! cryptographically derived round keys.

use zeroize::Zeroizing;

use crate::enums::{BlockCipherExtensions, BlockCiphers, Kdfs, Sha2Digests};
use crate::error::{CryptoError, Result};
use crate::kdf::{Hkdf, Kdf, ShakeKdf};
use crate::key::{SymmetricKey, SymmetricKeySize};

use super::tables::{IT0, IT1, IT2, IT3, ISBOX, RCON, SBOX, T0, T1, T2, T3};
use super::BlockCipher;

/// Cipher block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Working-state bytes to reserve in L1: the four encryption tables, the
/// S-box and the largest round-key array.
const STATE_PRECACHED: usize = 4 * 1024 + 256 + (38 + 1) * 16;

const DEF_INFO: &[u8] = b"information string RHX version 1";

/// The RHX block cipher.
pub struct Rhx {
    extension: BlockCipherExtensions,
    exp_key: Zeroizing<Vec<u32>>,
    kdf_info: Vec<u8>,
    kdf_info_max: usize,
    is_encryption: bool,
    is_initialized: bool,
    legal_key_sizes: Vec<SymmetricKeySize>,
    rounds: usize,
}

impl Rhx {
    /// A cipher with the standard Rijndael key schedule.
    pub fn new() -> Self {
        Self::with_extension(BlockCipherExtensions::None)
    }

    /// A cipher with the given key-schedule extension engine.
    pub fn with_extension(extension: BlockCipherExtensions) -> Self {
        let (kdf_info_max, legal_key_sizes) = match extension {
            BlockCipherExtensions::None => (
                0,
                vec![
                    SymmetricKeySize::new(16, BLOCK_SIZE, 0),
                    SymmetricKeySize::new(24, BLOCK_SIZE, 0),
                    SymmetricKeySize::new(32, BLOCK_SIZE, 0),
                    SymmetricKeySize::new(64, BLOCK_SIZE, 0),
                ],
            ),
            extension => {
                let max = match extension {
                    // digest block size minus the hmac padding and counter
                    BlockCipherExtensions::Hkdf256 => 64 - (9 + 1),
                    BlockCipherExtensions::Hkdf512 => 128 - (17 + 1),
                    // shake rate
                    BlockCipherExtensions::Shake128 => 168,
                    _ => 136,
                };
                (
                    max,
                    vec![
                        SymmetricKeySize::new(32, BLOCK_SIZE, max),
                        SymmetricKeySize::new(64, BLOCK_SIZE, max),
                        SymmetricKeySize::new(128, BLOCK_SIZE, max),
                    ],
                )
            }
        };

        Self {
            extension,
            exp_key: Zeroizing::new(Vec::new()),
            kdf_info: DEF_INFO.to_vec(),
            kdf_info_max,
            is_encryption: false,
            is_initialized: false,
            legal_key_sizes,
            rounds: 0,
        }
    }

    fn expand_key(&mut self, encryption: bool, key: &[u8]) -> Result<()> {
        if self.extension != BlockCipherExtensions::None {
            self.secure_expand(key)?;
        } else {
            self.standard_expand(key);
        }

        if !encryption {
            // reverse the schedule block-wise, then run the inverse
            // mix-columns transform over all but the outer blocks
            let blk = BLOCK_SIZE / 4;
            let mut i = 0;
            let mut k = self.exp_key.len() - blk;
            while i < k {
                for j in 0..blk {
                    self.exp_key.swap(i + j, k + j);
                }
                i += blk;
                k -= blk;
            }
            for idx in blk..self.exp_key.len() - blk {
                let w = self.exp_key[idx];
                self.exp_key[idx] = IT0[SBOX[(w >> 24) as usize] as usize]
                    ^ IT1[SBOX[((w >> 16) & 0xFF) as usize] as usize]
                    ^ IT2[SBOX[((w >> 8) & 0xFF) as usize] as usize]
                    ^ IT3[SBOX[(w & 0xFF) as usize] as usize];
            }
        }
        Ok(())
    }

    /// Round-key expansion through the extension KDF; the round keys are
    /// read little-endian from the derived stream.
    fn secure_expand(&mut self, key: &[u8]) -> Result<()> {
        // rounds: k256=22, k512=30, k1024=38
        self.rounds = if key.len() != 128 {
            key.len() / 4 + 14
        } else {
            38
        };
        let key_words = (BLOCK_SIZE / 4) * (self.rounds + 1);
        let mut raw = Zeroizing::new(vec![0u8; key_words * 4]);

        let mut kdf: Box<dyn Kdf> = match self.extension {
            BlockCipherExtensions::Hkdf256 => Box::new(Hkdf::new(Sha2Digests::Sha256)?),
            BlockCipherExtensions::Hkdf512 => Box::new(Hkdf::new(Sha2Digests::Sha512)?),
            BlockCipherExtensions::Shake128 => Box::new(ShakeKdf::new(Kdfs::Shake128)?),
            _ => Box::new(ShakeKdf::new(Kdfs::Shake256)?),
        };
        kdf.initialize(&SymmetricKey::with_info(
            key.to_vec(),
            Vec::new(),
            self.kdf_info.clone(),
        ))?;
        kdf.generate(&mut raw)?;

        let mut exp_key = Zeroizing::new(vec![0u32; key_words]);
        for (word, chunk) in exp_key.iter_mut().zip(raw.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        self.exp_key = exp_key;
        Ok(())
    }

    /// The standard Rijndael schedule, with the extra 22-round path for
    /// 512-bit keys.
    fn standard_expand(&mut self, key: &[u8]) {
        let nk = key.len() / 4;
        self.rounds = nk + 6;
        let total = (BLOCK_SIZE / 4) * (self.rounds + 1);
        let mut w = Zeroizing::new(vec![0u32; total]);

        for (word, chunk) in w.iter_mut().take(nk).zip(key.chunks_exact(4)) {
            *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        if nk == 16 {
            // 512-bit path: a rot word every 8, a sub word 4 later
            for i in nk..total {
                let mut temp = w[i - 1];
                if i % 8 == 0 {
                    temp = sub_word(temp.rotate_left(8)) ^ RCON[i / 8 - 1];
                } else if i % 8 == 4 {
                    temp = sub_word(temp);
                }
                w[i] = w[i - nk] ^ temp;
            }
        } else {
            for i in nk..total {
                let mut temp = w[i - 1];
                if i % nk == 0 {
                    temp = sub_word(temp.rotate_left(8)) ^ RCON[i / nk];
                } else if nk > 6 && i % nk == 4 {
                    temp = sub_word(temp);
                }
                w[i] = w[i - nk] ^ temp;
            }
        }

        self.exp_key = w;
    }

    fn encrypt128(&self, input: &[u8], output: &mut [u8]) {
        let rk = &self.exp_key;
        let rnd_cnt = rk.len() - 4;

        // round 0
        let x0 = be32(input, 0) ^ rk[0];
        let x1 = be32(input, 4) ^ rk[1];
        let x2 = be32(input, 8) ^ rk[2];
        let x3 = be32(input, 12) ^ rk[3];

        // round 1
        let mut y0 = te(x0, x1, x2, x3) ^ rk[4];
        let mut y1 = te(x1, x2, x3, x0) ^ rk[5];
        let mut y2 = te(x2, x3, x0, x1) ^ rk[6];
        let mut y3 = te(x3, x0, x1, x2) ^ rk[7];

        let mut ctr = 8;
        while ctr != rnd_cnt {
            let x0 = te(y0, y1, y2, y3) ^ rk[ctr];
            let x1 = te(y1, y2, y3, y0) ^ rk[ctr + 1];
            let x2 = te(y2, y3, y0, y1) ^ rk[ctr + 2];
            let x3 = te(y3, y0, y1, y2) ^ rk[ctr + 3];
            y0 = te(x0, x1, x2, x3) ^ rk[ctr + 4];
            y1 = te(x1, x2, x3, x0) ^ rk[ctr + 5];
            y2 = te(x2, x3, x0, x1) ^ rk[ctr + 6];
            y3 = te(x3, x0, x1, x2) ^ rk[ctr + 7];
            ctr += 8;
        }

        // final round substitutes through the raw S-box
        write_final(output, 0, y0, y1, y2, y3, rk[ctr], &SBOX);
        write_final(output, 4, y1, y2, y3, y0, rk[ctr + 1], &SBOX);
        write_final(output, 8, y2, y3, y0, y1, rk[ctr + 2], &SBOX);
        write_final(output, 12, y3, y0, y1, y2, rk[ctr + 3], &SBOX);
    }

    fn decrypt128(&self, input: &[u8], output: &mut [u8]) {
        let rk = &self.exp_key;
        let rnd_cnt = rk.len() - 4;

        // round 0
        let x0 = be32(input, 0) ^ rk[0];
        let x1 = be32(input, 4) ^ rk[1];
        let x2 = be32(input, 8) ^ rk[2];
        let x3 = be32(input, 12) ^ rk[3];

        // round 1
        let mut y0 = td(x0, x3, x2, x1) ^ rk[4];
        let mut y1 = td(x1, x0, x3, x2) ^ rk[5];
        let mut y2 = td(x2, x1, x0, x3) ^ rk[6];
        let mut y3 = td(x3, x2, x1, x0) ^ rk[7];

        let mut ctr = 8;
        while ctr != rnd_cnt {
            let x0 = td(y0, y3, y2, y1) ^ rk[ctr];
            let x1 = td(y1, y0, y3, y2) ^ rk[ctr + 1];
            let x2 = td(y2, y1, y0, y3) ^ rk[ctr + 2];
            let x3 = td(y3, y2, y1, y0) ^ rk[ctr + 3];
            y0 = td(x0, x3, x2, x1) ^ rk[ctr + 4];
            y1 = td(x1, x0, x3, x2) ^ rk[ctr + 5];
            y2 = td(x2, x1, x0, x3) ^ rk[ctr + 6];
            y3 = td(x3, x2, x1, x0) ^ rk[ctr + 7];
            ctr += 8;
        }

        write_final(output, 0, y0, y3, y2, y1, rk[ctr], &ISBOX);
        write_final(output, 4, y1, y0, y3, y2, rk[ctr + 1], &ISBOX);
        write_final(output, 8, y2, y1, y0, y3, rk[ctr + 2], &ISBOX);
        write_final(output, 12, y3, y2, y1, y0, rk[ctr + 3], &ISBOX);
    }

    /// Pre-load the active tables into cache to flatten first-block timing.
    fn prefetch(&self) {
        let mut sum = 0u32;
        if self.is_encryption {
            for i in 0..256 {
                sum ^= SBOX[i] as u32 ^ T0[i] ^ T1[i] ^ T2[i] ^ T3[i];
            }
        } else {
            for i in 0..256 {
                sum ^= ISBOX[i] as u32 ^ IT0[i] ^ IT1[i] ^ IT2[i] ^ IT3[i];
            }
        }
        core::hint::black_box(sum);
    }
}

impl Default for Rhx {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockCipher for Rhx {
    fn enumeral(&self) -> BlockCiphers {
        if self.extension == BlockCipherExtensions::None {
            BlockCiphers::Rijndael
        } else {
            BlockCiphers::Rhx
        }
    }

    fn cipher_extension(&self) -> BlockCipherExtensions {
        self.extension
    }

    fn name(&self) -> String {
        match self.extension {
            BlockCipherExtensions::None => "Rijndael".to_string(),
            ext => format!("RHX-{}", ext.name()),
        }
    }

    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    fn is_encryption(&self) -> bool {
        self.is_encryption
    }

    fn legal_key_sizes(&self) -> &[SymmetricKeySize] {
        &self.legal_key_sizes
    }

    fn rounds(&self) -> usize {
        self.rounds
    }

    fn distribution_code(&self) -> &[u8] {
        &self.kdf_info
    }

    fn distribution_code_max(&self) -> usize {
        self.kdf_info_max
    }

    fn set_distribution_code(&mut self, code: &[u8]) {
        let take = code.len().min(self.kdf_info_max);
        self.kdf_info = code[..take].to_vec();
    }

    fn state_cache_size(&self) -> usize {
        STATE_PRECACHED
    }

    fn initialize(&mut self, encryption: bool, params: &SymmetricKey) -> Result<()> {
        if !SymmetricKeySize::contains(&self.legal_key_sizes, params.key().len()) {
            return Err(CryptoError::InvalidKey(
                "the key must be one of the legal sizes",
            ));
        }
        if self.extension != BlockCipherExtensions::None
            && params.info().len() > self.kdf_info_max
        {
            return Err(CryptoError::InvalidSize(
                "the info must be no longer than the distribution code maximum",
            ));
        }

        if !params.info().is_empty() {
            self.kdf_info = params.info().to_vec();
        }

        self.is_encryption = encryption;
        self.expand_key(encryption, params.key())?;
        self.prefetch();
        self.is_initialized = true;
        Ok(())
    }

    fn encrypt_block(&self, input: &[u8], output: &mut [u8]) {
        self.encrypt128(input, output);
    }

    fn decrypt_block(&self, input: &[u8], output: &mut [u8]) {
        self.decrypt128(input, output);
    }

    fn transform(&self, input: &[u8], output: &mut [u8]) {
        if self.is_encryption {
            self.encrypt128(input, output);
        } else {
            self.decrypt128(input, output);
        }
    }

    fn transform_512(&self, input: &[u8], output: &mut [u8]) {
        for (src, dst) in input.chunks_exact(BLOCK_SIZE).zip(output.chunks_exact_mut(BLOCK_SIZE)) {
            self.transform(src, dst);
        }
    }

    fn transform_1024(&self, input: &[u8], output: &mut [u8]) {
        self.transform_512(&input[..64], &mut output[..64]);
        self.transform_512(&input[64..128], &mut output[64..128]);
    }

    fn transform_2048(&self, input: &[u8], output: &mut [u8]) {
        self.transform_1024(&input[..128], &mut output[..128]);
        self.transform_1024(&input[128..256], &mut output[128..256]);
    }
}

#[inline]
fn be32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// One encryption column: `T0[a3] ^ T1[b2] ^ T2[c1] ^ T3[d0]`.
#[inline]
fn te(a: u32, b: u32, c: u32, d: u32) -> u32 {
    T0[(a >> 24) as usize]
        ^ T1[((b >> 16) & 0xFF) as usize]
        ^ T2[((c >> 8) & 0xFF) as usize]
        ^ T3[(d & 0xFF) as usize]
}

/// One decryption column: `IT0[a3] ^ IT1[b2] ^ IT2[c1] ^ IT3[d0]`.
#[inline]
fn td(a: u32, b: u32, c: u32, d: u32) -> u32 {
    IT0[(a >> 24) as usize]
        ^ IT1[((b >> 16) & 0xFF) as usize]
        ^ IT2[((c >> 8) & 0xFF) as usize]
        ^ IT3[(d & 0xFF) as usize]
}

/// Final-round output: four bytes substituted through `sbox` and XOR'd
/// with one round-key word.
#[inline]
fn write_final(output: &mut [u8], offset: usize, a: u32, b: u32, c: u32, d: u32, rk: u32, sbox: &[u8; 256]) {
    output[offset] = sbox[(a >> 24) as usize] ^ (rk >> 24) as u8;
    output[offset + 1] = sbox[((b >> 16) & 0xFF) as usize] ^ (rk >> 16) as u8;
    output[offset + 2] = sbox[((c >> 8) & 0xFF) as usize] ^ (rk >> 8) as u8;
    output[offset + 3] = sbox[(d & 0xFF) as usize] ^ rk as u8;
}

/// Substitute each byte of a word through the forward S-box.
#[inline]
fn sub_word(word: u32) -> u32 {
    (u32::from(SBOX[(word >> 24) as usize]) << 24)
        | (u32::from(SBOX[((word >> 16) & 0xFF) as usize]) << 16)
        | (u32::from(SBOX[((word >> 8) & 0xFF) as usize]) << 8)
        | u32::from(SBOX[(word & 0xFF) as usize])
}
