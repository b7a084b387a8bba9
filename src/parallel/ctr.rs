//! Counter-mode keystream kernels and the parallel work dispatcher.
//!
//! The counter vector is a 16-byte big-endian integer; only the low eight
//! bytes are incremented (ripple-carry, wrapping). Workers receive cloned
//! counters offset by their chunk index, so output is byte-identical at
//! every degree, and the shared counter is only advanced after a fully
//! successful fan-out.

use std::panic::{catch_unwind, AssertUnwindSafe};

use rayon::prelude::*;
use tracing::trace;

use crate::cipher::BlockCipher;
use crate::error::{CryptoError, Result};

use super::SimdProfile;

const BLOCK_SIZE: usize = 16;

/// Add `value` block-counts to the low 64 bits of the counter vector.
pub(crate) fn be_add(counter: &mut [u8; 16], value: u64) {
    let mut low = [0u8; 8];
    low.copy_from_slice(&counter[8..16]);
    let sum = u64::from_be_bytes(low).wrapping_add(value);
    counter[8..16].copy_from_slice(&sum.to_be_bytes());
}

/// Advance the counter vector by one block.
pub(crate) fn be_increment(counter: &mut [u8; 16]) {
    be_add(counter, 1);
}

/// Fill `output` with CTR keystream, advancing `counter` one block per 16
/// bytes produced.
///
/// Whole batches of 16/8/4 consecutive counter blocks are staggered into a
/// scratch buffer and dispatched through the cipher's wide transform when
/// the SIMD profile allows; remaining whole blocks go one at a time, and a
/// final partial block is encrypted then truncated.
pub(crate) fn fill_keystream(
    cipher: &dyn BlockCipher,
    counter: &mut [u8; 16],
    output: &mut [u8],
    simd: SimdProfile,
) {
    let mut offset = 0;
    let lanes = simd.lane_count();

    if lanes > 1 {
        let wide = lanes * BLOCK_SIZE;
        if output.len() >= wide {
            let aligned = output.len() - output.len() % wide;
            let mut ctr_block = vec![0u8; wide];
            while offset != aligned {
                for slot in ctr_block.chunks_exact_mut(BLOCK_SIZE) {
                    slot.copy_from_slice(counter);
                    be_increment(counter);
                }
                let window = &mut output[offset..offset + wide];
                match lanes {
                    16 => cipher.transform_2048(&ctr_block, window),
                    8 => cipher.transform_1024(&ctr_block, window),
                    _ => cipher.transform_512(&ctr_block, window),
                }
                offset += wide;
            }
        }
    }

    let aligned = output.len() - output.len() % BLOCK_SIZE;
    while offset != aligned {
        cipher.encrypt_block(&counter[..], &mut output[offset..offset + BLOCK_SIZE]);
        be_increment(counter);
        offset += BLOCK_SIZE;
    }

    if offset != output.len() {
        let mut block = [0u8; BLOCK_SIZE];
        cipher.encrypt_block(&counter[..], &mut block);
        let remaining = output.len() - offset;
        output[offset..].copy_from_slice(&block[..remaining]);
        be_increment(counter);
    }
}

/// Fan one aligned work region out across `degree` workers.
///
/// `output.len()` must divide evenly into `degree` chunks of whole blocks.
/// Worker `i` derives its counter as `base + (chunk_blocks * i)` and fills
/// its own disjoint sub-slice; the cipher is shared read-only. On success
/// the shared counter advances to the last worker's final value; if any
/// worker panics the counter is left untouched and the failure is surfaced
/// as [`CryptoError::Poisoned`].
pub(crate) fn dispatch(
    cipher: &dyn BlockCipher,
    counter: &mut [u8; 16],
    output: &mut [u8],
    degree: usize,
    simd: SimdProfile,
) -> Result<()> {
    debug_assert!(degree > 0);
    debug_assert_eq!(output.len() % degree, 0);
    let chunk = output.len() / degree;
    debug_assert_eq!(chunk % BLOCK_SIZE, 0);

    let chunk_blocks = (chunk / BLOCK_SIZE) as u64;
    let base = *counter;
    trace!(degree, chunk, "dispatching ctr keystream workers");

    let finals = catch_unwind(AssertUnwindSafe(|| {
        output
            .par_chunks_exact_mut(chunk)
            .enumerate()
            .map(|(index, slice)| {
                let mut thread_ctr = base;
                be_add(&mut thread_ctr, chunk_blocks * index as u64);
                fill_keystream(cipher, &mut thread_ctr, slice, simd);
                thread_ctr
            })
            .collect::<Vec<_>>()
    }));

    match finals {
        Ok(finals) => {
            if let Some(last) = finals.last() {
                *counter = *last;
            }
            Ok(())
        }
        Err(_) => Err(CryptoError::Poisoned(
            "a worker failed during parallel generation",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::Rhx;
    use crate::key::SymmetricKey;

    fn test_cipher() -> Rhx {
        let mut cipher = Rhx::new();
        cipher
            .initialize(true, &SymmetricKey::new(vec![7u8; 32]))
            .unwrap();
        cipher
    }

    #[test]
    fn counter_ripples_big_endian() {
        let mut ctr = [0u8; 16];
        ctr[15] = 0xFF;
        be_increment(&mut ctr);
        assert_eq!(ctr[15], 0x00);
        assert_eq!(ctr[14], 0x01);

        // carry across all eight low bytes wraps to zero
        let mut ctr = [0u8; 16];
        ctr[8..16].fill(0xFF);
        be_increment(&mut ctr);
        assert_eq!(&ctr[8..16], &[0u8; 8]);
        assert_eq!(&ctr[0..8], &[0u8; 8], "the high half is never touched");
    }

    #[test]
    fn be_add_matches_repeated_increments() {
        let mut stepped = [3u8; 16];
        let mut jumped = [3u8; 16];
        for _ in 0..1000 {
            be_increment(&mut stepped);
        }
        be_add(&mut jumped, 1000);
        assert_eq!(stepped, jumped);
    }

    #[test]
    fn wide_and_narrow_paths_agree() {
        let cipher = test_cipher();
        let base = [9u8; 16];

        let mut narrow_ctr = base;
        let mut narrow = vec![0u8; 1000];
        fill_keystream(&cipher, &mut narrow_ctr, &mut narrow, SimdProfile::None);

        for simd in [SimdProfile::Avx, SimdProfile::Avx2, SimdProfile::Avx512] {
            let mut wide_ctr = base;
            let mut wide = vec![0u8; 1000];
            fill_keystream(&cipher, &mut wide_ctr, &mut wide, simd);
            assert_eq!(narrow, wide, "{simd:?} diverged from the scalar path");
            assert_eq!(narrow_ctr, wide_ctr);
        }
    }

    #[test]
    fn partial_block_is_a_truncated_whole_block() {
        let cipher = test_cipher();

        let mut full_ctr = [0u8; 16];
        let mut full = vec![0u8; 32];
        fill_keystream(&cipher, &mut full_ctr, &mut full, SimdProfile::None);

        let mut part_ctr = [0u8; 16];
        let mut part = vec![0u8; 20];
        fill_keystream(&cipher, &mut part_ctr, &mut part, SimdProfile::None);
        assert_eq!(part, full[..20]);
        assert_eq!(part_ctr, full_ctr, "a partial block still consumes a counter");
    }

    /// A cipher whose workers blow up, for the transactional-counter
    /// contract.
    struct PanickyCipher;

    impl BlockCipher for PanickyCipher {
        fn enumeral(&self) -> crate::enums::BlockCiphers {
            crate::enums::BlockCiphers::None
        }
        fn cipher_extension(&self) -> crate::enums::BlockCipherExtensions {
            crate::enums::BlockCipherExtensions::None
        }
        fn name(&self) -> String {
            "panicky".to_string()
        }
        fn block_size(&self) -> usize {
            16
        }
        fn is_initialized(&self) -> bool {
            true
        }
        fn is_encryption(&self) -> bool {
            true
        }
        fn legal_key_sizes(&self) -> &[crate::key::SymmetricKeySize] {
            &[]
        }
        fn rounds(&self) -> usize {
            0
        }
        fn distribution_code(&self) -> &[u8] {
            &[]
        }
        fn distribution_code_max(&self) -> usize {
            0
        }
        fn set_distribution_code(&mut self, _code: &[u8]) {}
        fn state_cache_size(&self) -> usize {
            0
        }
        fn initialize(
            &mut self,
            _encryption: bool,
            _params: &crate::key::SymmetricKey,
        ) -> Result<()> {
            Ok(())
        }
        fn encrypt_block(&self, _input: &[u8], _output: &mut [u8]) {
            panic!("worker failure");
        }
        fn decrypt_block(&self, _input: &[u8], _output: &mut [u8]) {
            panic!("worker failure");
        }
        fn transform(&self, _input: &[u8], _output: &mut [u8]) {
            panic!("worker failure");
        }
        fn transform_512(&self, _input: &[u8], _output: &mut [u8]) {
            panic!("worker failure");
        }
        fn transform_1024(&self, _input: &[u8], _output: &mut [u8]) {
            panic!("worker failure");
        }
        fn transform_2048(&self, _input: &[u8], _output: &mut [u8]) {
            panic!("worker failure");
        }
    }

    #[test]
    fn worker_panic_leaves_the_counter_untouched() {
        let cipher = PanickyCipher;
        let before = [0xA5u8; 16];
        let mut counter = before;
        let mut output = vec![0u8; 256];

        let result = dispatch(&cipher, &mut counter, &mut output, 2, SimdProfile::None);
        assert!(matches!(result, Err(CryptoError::Poisoned(_))));
        assert_eq!(counter, before);
    }

    #[test]
    fn dispatch_matches_serial_and_advances_the_counter() {
        let cipher = test_cipher();
        let base = [1u8; 16];

        let mut serial_ctr = base;
        let mut serial = vec![0u8; 4096];
        fill_keystream(&cipher, &mut serial_ctr, &mut serial, SimdProfile::None);

        for degree in [1usize, 2, 4, 8] {
            let mut par_ctr = base;
            let mut parallel = vec![0u8; 4096];
            dispatch(&cipher, &mut par_ctr, &mut parallel, degree, SimdProfile::None).unwrap();
            assert_eq!(serial, parallel, "degree {degree} diverged");
            assert_eq!(serial_ctr, par_ctr, "degree {degree} counter drifted");
        }
    }
}
