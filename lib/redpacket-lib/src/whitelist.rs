use crate::{
    error::{Error, Result},
    merkle::{leaf_hash, verify_proof, Hash32, MerkleTree},
};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as, DisplayFromStr, PickFirst};
use solana_program::pubkey::Pubkey;

/// One whitelisted claimant and its fixed share in base units.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WhitelistEntry {
    #[serde_as(as = "DisplayFromStr")]
    pub claimant: Pubkey,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub amount: u64,
}

impl WhitelistEntry {
    pub fn leaf(&self) -> Hash32 {
        leaf_hash(&self.claimant, self.amount)
    }
}

/// Whitelist as published to content-addressed storage.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhitelistDocument {
    pub entries: Vec<WhitelistEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
    #[serde_as(as = "Option<Hex>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merkle_root: Option<Hash32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Entries(Vec<WhitelistEntry>),
    Document(WhitelistDocument),
}

impl WhitelistDocument {
    pub fn new(entries: Vec<WhitelistEntry>, decimals: Option<u8>) -> Result<Self> {
        let merkle_root = Some(merkle_root(&entries)?);
        Ok(Self {
            entries,
            decimals,
            merkle_root,
        })
    }

    /// Accepts either a bare array of entries or a document object.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let payload: Payload = serde_json::from_slice(bytes)
            .map_err(|error| Error::InvalidWhitelistPayload(error.to_string()))?;
        Ok(match payload {
            Payload::Entries(entries) => Self {
                entries,
                decimals: None,
                merkle_root: None,
            },
            Payload::Document(doc) => doc,
        })
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn total(&self) -> Option<u64> {
        self.entries
            .iter()
            .try_fold(0u64, |acc, e| acc.checked_add(e.amount))
    }
}

pub fn build_tree(entries: &[WhitelistEntry]) -> Result<MerkleTree> {
    MerkleTree::new(entries.iter().map(WhitelistEntry::leaf).collect())
}

pub fn merkle_root(entries: &[WhitelistEntry]) -> Result<Hash32> {
    Ok(build_tree(entries)?.root())
}

pub fn find_entry(entries: &[WhitelistEntry], claimant: &Pubkey) -> Option<(usize, WhitelistEntry)> {
    entries
        .iter()
        .position(|e| &e.claimant == claimant)
        .map(|index| (index, entries[index]))
}

/// What a claimant may withdraw from a whitelist packet, with its proof.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    #[serde_as(as = "DisplayFromStr")]
    pub claimant: Pubkey,
    pub amount: u64,
    #[serde_as(as = "Vec<Hex>")]
    pub proof: Vec<Hash32>,
}

impl Entitlement {
    /// Build the entitlement of `claimant` from the full ordered list.
    pub fn from_tree(
        tree: &MerkleTree,
        entries: &[WhitelistEntry],
        claimant: &Pubkey,
    ) -> Option<Self> {
        let (index, entry) = find_entry(entries, claimant)?;
        let proof = tree.proof(index)?;
        Some(Self {
            claimant: entry.claimant,
            amount: entry.amount,
            proof,
        })
    }

    pub fn leaf(&self) -> Hash32 {
        leaf_hash(&self.claimant, self.amount)
    }

    pub fn verify(&self, root: &Hash32) -> bool {
        verify_proof(&self.leaf(), &self.proof, root)
    }
}
