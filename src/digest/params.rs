//! Serializable tree-hash configuration blocks.
//!
//! These value objects describe how a digest is arranged in tree (parallel)
//! mode: node offset, tree version, output size, leaf size, depth, fan-out
//! and an optional distribution code. The byte layout is little-endian with
//! a 24-byte fixed header followed by the distribution code.

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::{CryptoError, Result};

const HEADER_SIZE: usize = 24;

fn write_header(
    out: &mut Vec<u8>,
    node_offset: u32,
    tree_version: u16,
    output_size: u64,
    leaf_size: u32,
    tree_depth: u8,
    tree_fanout: u8,
    reserved: u32,
) {
    out.extend_from_slice(&node_offset.to_le_bytes());
    out.extend_from_slice(&tree_version.to_le_bytes());
    out.extend_from_slice(&output_size.to_le_bytes());
    out.extend_from_slice(&leaf_size.to_le_bytes());
    out.push(tree_depth);
    out.push(tree_fanout);
    out.extend_from_slice(&reserved.to_le_bytes());
}

fn le32(bytes: &[u8], offset: usize) -> u32 {
    let mut tmp = [0u8; 4];
    tmp.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(tmp)
}

fn le16(bytes: &[u8], offset: usize) -> u16 {
    let mut tmp = [0u8; 2];
    tmp.copy_from_slice(&bytes[offset..offset + 2]);
    u16::from_le_bytes(tmp)
}

fn le64(bytes: &[u8], offset: usize) -> u64 {
    let mut tmp = [0u8; 8];
    tmp.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_le_bytes(tmp)
}

/// Tree-hash parameters for the Keccak (SHA3) digest family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
pub struct KeccakParams {
    node_offset: u32,
    tree_version: u16,
    output_size: u64,
    leaf_size: u32,
    tree_depth: u8,
    tree_fanout: u8,
    reserved: u32,
    dst_code: Vec<u8>,
}

impl KeccakParams {
    /// Sequential-mode parameters for the given output size, leaf size and
    /// fan-out.
    ///
    /// Errors when the output size is not 32, 64 or 128 bytes, or when the
    /// fan-out and leaf size disagree (one zero, the other not).
    pub fn new(output_size: u64, leaf_size: u32, tree_fanout: u8) -> Result<Self> {
        if output_size != 32 && output_size != 64 && output_size != 128 {
            return Err(CryptoError::IllegalOperation(
                "the tree output size must be 32, 64 or 128 bytes",
            ));
        }
        if (tree_fanout > 0 && leaf_size == 0) || (tree_fanout == 0 && leaf_size != 0) {
            return Err(CryptoError::IllegalOperation(
                "the fanout and leaf sizes must both be zero or both be set",
            ));
        }

        let mut params = Self {
            node_offset: 0,
            tree_version: 1,
            output_size,
            leaf_size,
            tree_depth: 0,
            tree_fanout,
            reserved: 0,
            dst_code: Vec::new(),
        };
        params.dst_code = vec![0u8; params.distribution_code_max()];
        Ok(params)
    }

    /// Deserialize a parameter block produced by [`KeccakParams::to_bytes`].
    pub fn from_bytes(tree_array: &[u8]) -> Result<Self> {
        if tree_array.len() < HEADER_SIZE {
            return Err(CryptoError::InvalidSize(
                "the tree parameter array is too short",
            ));
        }

        let mut params = Self {
            node_offset: le32(tree_array, 0),
            tree_version: le16(tree_array, 4),
            output_size: le64(tree_array, 6),
            leaf_size: le32(tree_array, 14),
            tree_depth: tree_array[18],
            tree_fanout: tree_array[19],
            reserved: le32(tree_array, 20),
            dst_code: Vec::new(),
        };
        let dst_len = params.distribution_code_max();
        if tree_array.len() < HEADER_SIZE + dst_len {
            return Err(CryptoError::InvalidSize(
                "the tree parameter array is too short for the distribution code",
            ));
        }
        params.dst_code = tree_array[HEADER_SIZE..HEADER_SIZE + dst_len].to_vec();
        Ok(params)
    }

    /// Serialize to the canonical little-endian layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.dst_code.len());
        write_header(
            &mut out,
            self.node_offset,
            self.tree_version,
            self.output_size,
            self.leaf_size,
            self.tree_depth,
            self.tree_fanout,
            self.reserved,
        );
        out.extend_from_slice(&self.dst_code);
        out
    }

    /// Maximum distribution-code length for this output size; the unused
    /// header space of one Keccak rate block.
    pub fn distribution_code_max(&self) -> usize {
        if self.output_size == 32 {
            112
        } else {
            48
        }
    }

    /// The distribution code bytes.
    pub fn distribution_code(&self) -> &[u8] {
        &self.dst_code
    }

    /// Replace the distribution code; truncated or zero-padded to
    /// [`KeccakParams::distribution_code_max`].
    pub fn set_distribution_code(&mut self, code: &[u8]) {
        let max = self.distribution_code_max();
        let mut dst = vec![0u8; max];
        let take = code.len().min(max);
        dst[..take].copy_from_slice(&code[..take]);
        self.dst_code = dst;
    }

    /// Node index inside the tree layer.
    pub fn node_offset(&self) -> u32 {
        self.node_offset
    }

    /// Set the node index.
    pub fn set_node_offset(&mut self, offset: u32) {
        self.node_offset = offset;
    }

    /// Tree layout version.
    pub fn tree_version(&self) -> u16 {
        self.tree_version
    }

    /// Digest output size in bytes.
    pub fn output_size(&self) -> u64 {
        self.output_size
    }

    /// Leaf (intrinsics block) size in bytes.
    pub fn leaf_size(&self) -> u32 {
        self.leaf_size
    }

    /// Tree depth; zero for sequential mode.
    pub fn tree_depth(&self) -> u8 {
        self.tree_depth
    }

    /// Fan-out (parallel lane count); zero for sequential mode.
    pub fn tree_fanout(&self) -> u8 {
        self.tree_fanout
    }

    /// Serialized size of this block in bytes.
    pub fn header_size(&self) -> usize {
        HEADER_SIZE + self.distribution_code_max()
    }

    /// Clear all fields to zero.
    pub fn reset(&mut self) {
        self.node_offset = 0;
        self.tree_version = 0;
        self.output_size = 0;
        self.leaf_size = 0;
        self.tree_depth = 0;
        self.tree_fanout = 0;
        self.reserved = 0;
        self.dst_code.zeroize();
    }
}

/// Tree-hash parameters for the SHA2 digest family.
///
/// Same header layout as [`KeccakParams`]; the distribution-code budget is
/// the unused space of one compression block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
pub struct Sha2Params {
    node_offset: u32,
    tree_version: u16,
    output_size: u64,
    leaf_size: u32,
    tree_depth: u8,
    tree_fanout: u8,
    reserved: u32,
    dst_code: Vec<u8>,
}

impl Sha2Params {
    /// Sequential-mode parameters for the given output size, leaf size and
    /// fan-out. Output size must be 32 or 64 bytes.
    pub fn new(output_size: u64, leaf_size: u32, tree_fanout: u8) -> Result<Self> {
        if output_size != 32 && output_size != 64 {
            return Err(CryptoError::IllegalOperation(
                "the tree output size must be 32 or 64 bytes",
            ));
        }
        if (tree_fanout > 0 && leaf_size == 0) || (tree_fanout == 0 && leaf_size != 0) {
            return Err(CryptoError::IllegalOperation(
                "the fanout and leaf sizes must both be zero or both be set",
            ));
        }

        let mut params = Self {
            node_offset: 0,
            tree_version: 1,
            output_size,
            leaf_size,
            tree_depth: 0,
            tree_fanout,
            reserved: 0,
            dst_code: Vec::new(),
        };
        params.dst_code = vec![0u8; params.distribution_code_max()];
        Ok(params)
    }

    /// Deserialize a parameter block produced by [`Sha2Params::to_bytes`].
    pub fn from_bytes(tree_array: &[u8]) -> Result<Self> {
        if tree_array.len() < HEADER_SIZE {
            return Err(CryptoError::InvalidSize(
                "the tree parameter array is too short",
            ));
        }

        let mut params = Self {
            node_offset: le32(tree_array, 0),
            tree_version: le16(tree_array, 4),
            output_size: le64(tree_array, 6),
            leaf_size: le32(tree_array, 14),
            tree_depth: tree_array[18],
            tree_fanout: tree_array[19],
            reserved: le32(tree_array, 20),
            dst_code: Vec::new(),
        };
        let dst_len = params.distribution_code_max();
        if tree_array.len() < HEADER_SIZE + dst_len {
            return Err(CryptoError::InvalidSize(
                "the tree parameter array is too short for the distribution code",
            ));
        }
        params.dst_code = tree_array[HEADER_SIZE..HEADER_SIZE + dst_len].to_vec();
        Ok(params)
    }

    /// Serialize to the canonical little-endian layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.dst_code.len());
        write_header(
            &mut out,
            self.node_offset,
            self.tree_version,
            self.output_size,
            self.leaf_size,
            self.tree_depth,
            self.tree_fanout,
            self.reserved,
        );
        out.extend_from_slice(&self.dst_code);
        out
    }

    /// Maximum distribution-code length for this output size.
    pub fn distribution_code_max(&self) -> usize {
        if self.output_size == 32 {
            112
        } else {
            48
        }
    }

    /// The distribution code bytes.
    pub fn distribution_code(&self) -> &[u8] {
        &self.dst_code
    }

    /// Replace the distribution code; truncated or zero-padded to
    /// [`Sha2Params::distribution_code_max`].
    pub fn set_distribution_code(&mut self, code: &[u8]) {
        let max = self.distribution_code_max();
        let mut dst = vec![0u8; max];
        let take = code.len().min(max);
        dst[..take].copy_from_slice(&code[..take]);
        self.dst_code = dst;
    }

    /// Node index inside the tree layer.
    pub fn node_offset(&self) -> u32 {
        self.node_offset
    }

    /// Set the node index.
    pub fn set_node_offset(&mut self, offset: u32) {
        self.node_offset = offset;
    }

    /// Digest output size in bytes.
    pub fn output_size(&self) -> u64 {
        self.output_size
    }

    /// Leaf (intrinsics block) size in bytes.
    pub fn leaf_size(&self) -> u32 {
        self.leaf_size
    }

    /// Fan-out (parallel lane count); zero for sequential mode.
    pub fn tree_fanout(&self) -> u8 {
        self.tree_fanout
    }

    /// Serialized size of this block in bytes.
    pub fn header_size(&self) -> usize {
        HEADER_SIZE + self.distribution_code_max()
    }

    /// Clear all fields to zero.
    pub fn reset(&mut self) {
        self.node_offset = 0;
        self.tree_version = 0;
        self.output_size = 0;
        self.leaf_size = 0;
        self.tree_depth = 0;
        self.tree_fanout = 0;
        self.reserved = 0;
        self.dst_code.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_round_trip() {
        let mut params = KeccakParams::new(32, 16384, 8).unwrap();
        params.set_node_offset(3);
        params.set_distribution_code(b"domain-separator");

        let bytes = params.to_bytes();
        assert_eq!(bytes.len(), params.header_size());
        let restored = KeccakParams::from_bytes(&bytes).unwrap();
        assert_eq!(restored, params);
    }

    #[test]
    fn sha2_round_trip() {
        let params = Sha2Params::new(64, 4096, 4).unwrap();
        let restored = Sha2Params::from_bytes(&params.to_bytes()).unwrap();
        assert_eq!(restored, params);
    }

    #[test]
    fn invalid_geometry_is_rejected() {
        assert!(KeccakParams::new(48, 0, 0).is_err());
        assert!(KeccakParams::new(32, 0, 8).is_err());
        assert!(KeccakParams::new(32, 1024, 0).is_err());
        assert!(Sha2Params::new(128, 0, 0).is_err());
    }

    #[test]
    fn short_buffer_is_rejected() {
        assert!(KeccakParams::from_bytes(&[0u8; 10]).is_err());
        let params = KeccakParams::new(32, 0, 0).unwrap();
        let bytes = params.to_bytes();
        assert!(KeccakParams::from_bytes(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn distribution_code_budget() {
        let p32 = KeccakParams::new(32, 0, 0).unwrap();
        let p64 = KeccakParams::new(64, 0, 0).unwrap();
        assert_eq!(p32.distribution_code_max(), 112);
        assert_eq!(p64.distribution_code_max(), 48);
    }

    #[test]
    fn long_distribution_code_is_truncated() {
        let mut params = Sha2Params::new(64, 0, 0).unwrap();
        params.set_distribution_code(&[0xAA; 200]);
        assert_eq!(params.distribution_code().len(), 48);
        assert!(params.distribution_code().iter().all(|&b| b == 0xAA));
    }
}
