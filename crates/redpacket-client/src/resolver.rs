//! Resolve what a claimant may take from a whitelist packet.

use crate::{
    content::ContentStore,
    error::{Error, Result},
};
use redpacket_lib::{
    whitelist::build_tree, Entitlement, ErrorKind, Hash32, MerkleTree, PacketIdentity,
    WhitelistEntry,
};
use solana_sdk::pubkey::Pubkey;
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

/// A full whitelist with its tree, indexed by claimant.
#[derive(Debug)]
pub struct IndexedWhitelist {
    entries: Vec<WhitelistEntry>,
    tree: MerkleTree,
    index: HashMap<Pubkey, usize>,
}

impl IndexedWhitelist {
    pub fn new(entries: Vec<WhitelistEntry>) -> Result<Self> {
        let tree = build_tree(&entries)?;
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            index.entry(entry.claimant).or_insert(i);
        }
        Ok(Self {
            entries,
            tree,
            index,
        })
    }

    pub fn root(&self) -> Hash32 {
        self.tree.root()
    }

    pub fn entries(&self) -> &[WhitelistEntry] {
        &self.entries
    }

    pub fn entitlement(&self, claimant: &Pubkey) -> Option<Entitlement> {
        let index = *self.index.get(claimant)?;
        let entry = self.entries[index];
        Some(Entitlement {
            claimant: entry.claimant,
            amount: entry.amount,
            proof: self.tree.proof(index)?,
        })
    }
}

/// Whitelists by packet. Shared by clones; entries can be evicted at any time.
#[derive(Debug, Clone, Default)]
pub struct WhitelistCache {
    inner: Arc<RwLock<HashMap<PacketIdentity, Arc<IndexedWhitelist>>>>,
}

impl WhitelistCache {
    pub fn get(&self, packet: &PacketIdentity) -> Option<Arc<IndexedWhitelist>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(packet)
            .cloned()
    }

    pub fn insert(&self, packet: PacketIdentity, list: Arc<IndexedWhitelist>) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(packet, list);
    }

    pub fn evict(&self, packet: &PacketIdentity) -> bool {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(packet)
            .is_some()
    }

    pub fn clear(&self) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Entitled(Entitlement),
    NotFound,
}

#[derive(Clone)]
pub struct WhitelistResolver {
    store: Arc<dyn ContentStore>,
    cache: WhitelistCache,
}

impl WhitelistResolver {
    pub fn new(store: Arc<dyn ContentStore>, cache: WhitelistCache) -> Self {
        Self { store, cache }
    }

    pub fn cache(&self) -> &WhitelistCache {
        &self.cache
    }

    /// Look the claimant up in the payload behind `content_id`, falling back
    /// to the list cached for the packet. Only lists whose root equals
    /// `merkle_root` are used or cached.
    pub async fn resolve(
        &self,
        packet: &PacketIdentity,
        claimant: &Pubkey,
        content_id: Option<&str>,
        merkle_root: &Hash32,
    ) -> Result<Resolution> {
        if let Some(content_id) = content_id {
            match self.store.fetch_payload(content_id).await {
                Ok(Some(doc)) if doc.entries.is_empty() => {
                    tracing::warn!("whitelist {} is empty", content_id)
                }
                Ok(Some(doc)) => {
                    let list = IndexedWhitelist::new(doc.entries)?;
                    if list.root() != *merkle_root {
                        tracing::warn!(
                            "whitelist {} does not match the root of {}",
                            content_id,
                            packet
                        );
                        return Err(Error::rejected(ErrorKind::WhitelistIntegrityMismatch));
                    }
                    let list = Arc::new(list);
                    self.cache.insert(*packet, list.clone());
                    if let Some(entitlement) = list.entitlement(claimant) {
                        return Ok(Resolution::Entitled(entitlement));
                    }
                }
                Ok(None) => tracing::warn!("whitelist {} not found", content_id),
                Err(error) => tracing::warn!("fetching whitelist {} failed: {}", content_id, error),
            }
        }

        match self.cache.get(packet) {
            Some(list) if list.root() == *merkle_root => Ok(list
                .entitlement(claimant)
                .map_or(Resolution::NotFound, Resolution::Entitled)),
            Some(_) => {
                self.cache.evict(packet);
                Err(Error::rejected(ErrorKind::WhitelistIntegrityMismatch))
            }
            None => Ok(Resolution::NotFound),
        }
    }
}
