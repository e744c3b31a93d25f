//! Keccak Merkle tree over whitelist entries.
//!
//! Leaves are `keccak256(claimant || amount_le)`, internal nodes hash the
//! sorted pair, and a node without a sibling is promoted to the next level
//! unchanged.

use crate::error::{Error, Result};
use solana_program::{keccak, pubkey::Pubkey};

pub type Hash32 = [u8; 32];

pub fn leaf_hash(claimant: &Pubkey, amount: u64) -> Hash32 {
    keccak::hashv(&[claimant.as_ref(), &amount.to_le_bytes()]).to_bytes()
}

pub fn hash_pair(a: &Hash32, b: &Hash32) -> Hash32 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    keccak::hashv(&[&lo[..], &hi[..]]).to_bytes()
}

/// Fold `proof` into `leaf` and compare against `root`.
pub fn verify_proof(leaf: &Hash32, proof: &[Hash32], root: &Hash32) -> bool {
    let hash = proof.iter().fold(*leaf, |hash, p| hash_pair(&hash, p));
    &hash == root
}

#[derive(Debug, Clone)]
pub struct MerkleTree {
    // layers[0] are the leaves, the last layer holds only the root
    layers: Vec<Vec<Hash32>>,
}

impl MerkleTree {
    pub fn new(leaves: Vec<Hash32>) -> Result<Self> {
        if leaves.is_empty() {
            return Err(Error::EmptyWhitelist);
        }
        let mut layers = vec![leaves];
        while let Some(level) = layers.last().filter(|l| l.len() > 1) {
            let next = level
                .chunks(2)
                .map(|pair| match pair.get(1) {
                    Some(b) => hash_pair(&pair[0], b),
                    None => pair[0],
                })
                .collect::<Vec<_>>();
            layers.push(next);
        }
        Ok(Self { layers })
    }

    pub fn from_entries<'a, I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a Pubkey, u64)>,
    {
        Self::new(
            entries
                .into_iter()
                .map(|(claimant, amount)| leaf_hash(claimant, amount))
                .collect(),
        )
    }

    pub fn root(&self) -> Hash32 {
        // `new` guarantees at least one layer with one node
        self.layers
            .last()
            .and_then(|l| l.first())
            .copied()
            .unwrap_or_default()
    }

    pub fn leaf_count(&self) -> usize {
        self.layers[0].len()
    }

    /// Sibling hashes from leaf `index` up to the root.
    pub fn proof(&self, mut index: usize) -> Option<Vec<Hash32>> {
        if index >= self.leaf_count() {
            return None;
        }
        let mut proof = Vec::with_capacity(self.layers.len());
        for level in &self.layers[..self.layers.len() - 1] {
            if let Some(sibling) = level.get(index ^ 1) {
                proof.push(*sibling);
            }
            index /= 2;
        }
        Some(proof)
    }
}
