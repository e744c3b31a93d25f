//! Reading packet accounts.

use crate::{
    chain::Chain,
    error::{Error, Result},
};
use redpacket_lib::{
    pda::{derive_claimant_state_address, derive_creator_state_address},
    CreatorState, Operation, PacketIdentity, PacketRecord,
};
use solana_sdk::pubkey::Pubkey;

/// How a caller names a packet: by identity, or by an address obtained from
/// an index that still has to be checked against the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketRef {
    Identity(PacketIdentity),
    Supplied {
        identity: PacketIdentity,
        address: Pubkey,
    },
}

impl PacketRef {
    pub fn identity(&self) -> &PacketIdentity {
        match self {
            PacketRef::Identity(identity) => identity,
            PacketRef::Supplied { identity, .. } => identity,
        }
    }

    pub fn address(&self) -> Pubkey {
        match self {
            PacketRef::Identity(identity) => identity.address(),
            PacketRef::Supplied { address, .. } => *address,
        }
    }
}

impl From<PacketIdentity> for PacketRef {
    fn from(value: PacketIdentity) -> Self {
        Self::Identity(value)
    }
}

#[derive(Debug, Clone)]
pub struct LoadedPacket {
    pub identity: PacketIdentity,
    pub address: Pubkey,
    pub record: PacketRecord,
}

/// Read and decode a packet. The account must be owned by the program and
/// hold the creator and id of the identity it is loaded for.
pub async fn load_packet(chain: &dyn Chain, packet: &PacketRef) -> Result<LoadedPacket> {
    let identity = *packet.identity();
    let address = packet.address();
    let unverified = |reason| Error::UnverifiedAddress {
        address,
        identity,
        reason,
    };

    let account = chain
        .get_account(&address)
        .await
        .map_err(Error::solana(Operation::Read))?
        .ok_or(Error::AccountNotFound(address))?;
    if account.owner != identity.program_id {
        return Err(unverified("account is not owned by the program"));
    }
    let record = PacketRecord::decode(&account.data)?;
    if record.creator != identity.creator {
        return Err(unverified("creator does not match"));
    }
    if record.packet_id != identity.packet_id {
        return Err(unverified("packet id does not match"));
    }

    tracing::debug!(
        "loaded packet {} at {}: {}/{} claimed",
        identity,
        address,
        record.claimed_count,
        record.packet_count
    );
    Ok(LoadedPacket {
        identity,
        address,
        record,
    })
}

/// `None` until the creator made a first packet.
pub async fn load_creator_state(
    chain: &dyn Chain,
    program_id: &Pubkey,
    creator: &Pubkey,
) -> Result<Option<CreatorState>> {
    let address = derive_creator_state_address(program_id, creator).0;
    let account = chain
        .get_account(&address)
        .await
        .map_err(Error::solana(Operation::Read))?;
    match account {
        Some(account) if account.owner == *program_id => Ok(Some(CreatorState::decode(&account.data)?)),
        Some(_) => Err(Error::custom(anyhow::anyhow!(
            "creator state {} is not owned by the program",
            address
        ))),
        None => Ok(None),
    }
}

/// The claimant state exists once a claim was honored.
pub async fn has_claimed(chain: &dyn Chain, packet: &LoadedPacket, claimant: &Pubkey) -> Result<bool> {
    let (address, _) = derive_claimant_state_address(
        &packet.identity.program_id,
        &packet.address,
        claimant,
    );
    Ok(chain
        .get_account(&address)
        .await
        .map_err(Error::solana(Operation::Read))?
        .is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, MockChain};

    #[tokio::test]
    async fn test_load_by_identity() {
        let chain = MockChain::default();
        let identity = testing::identity(Pubkey::new_unique(), 7);
        let record = testing::record(&identity);
        chain.set_account(identity.address(), testing::packet_account(&record));

        let loaded = load_packet(&chain, &identity.into()).await.unwrap();
        assert_eq!(loaded.address, identity.address());
        assert_eq!(loaded.record, record);

        let missing = testing::identity(identity.creator, 8);
        assert!(matches!(
            load_packet(&chain, &missing.into()).await,
            Err(Error::AccountNotFound(a)) if a == missing.address()
        ));
    }

    #[tokio::test]
    async fn test_supplied_address_is_verified() {
        let chain = MockChain::default();
        let identity = testing::identity(Pubkey::new_unique(), 1);
        let address = Pubkey::new_unique();
        let supplied = PacketRef::Supplied { identity, address };

        // record of the right packet
        chain.set_account(address, testing::packet_account(&testing::record(&identity)));
        assert_eq!(load_packet(&chain, &supplied).await.unwrap().address, address);

        // another creator's packet
        let other = testing::identity(Pubkey::new_unique(), 1);
        chain.set_account(address, testing::packet_account(&testing::record(&other)));
        let error = load_packet(&chain, &supplied).await.unwrap_err();
        assert!(matches!(
            error,
            Error::UnverifiedAddress {
                reason: "creator does not match",
                ..
            }
        ));

        // same creator, another id
        let other = testing::identity(identity.creator, 2);
        chain.set_account(address, testing::packet_account(&testing::record(&other)));
        assert!(matches!(
            load_packet(&chain, &supplied).await,
            Err(Error::UnverifiedAddress {
                reason: "packet id does not match",
                ..
            })
        ));

        // right data, wrong owner
        let mut account = testing::packet_account(&testing::record(&identity));
        account.owner = Pubkey::new_unique();
        chain.set_account(address, account);
        assert!(matches!(
            load_packet(&chain, &supplied).await,
            Err(Error::UnverifiedAddress { .. })
        ));
    }

    #[tokio::test]
    async fn test_creator_state() {
        let chain = MockChain::default();
        let creator = Pubkey::new_unique();
        let program_id = redpacket_lib::consts::PROGRAM_ID;
        assert_eq!(
            load_creator_state(&chain, &program_id, &creator).await.unwrap(),
            None
        );
        chain.set_account(
            derive_creator_state_address(&program_id, &creator).0,
            testing::creator_state_account(creator, 5),
        );
        assert_eq!(
            load_creator_state(&chain, &program_id, &creator)
                .await
                .unwrap()
                .map(|s| s.next_packet_id),
            Some(5)
        );
    }

    #[tokio::test]
    async fn test_has_claimed() {
        let chain = MockChain::default();
        let identity = testing::identity(Pubkey::new_unique(), 0);
        chain.set_account(
            identity.address(),
            testing::packet_account(&testing::record(&identity)),
        );
        let packet = load_packet(&chain, &identity.into()).await.unwrap();
        let claimant = Pubkey::new_unique();
        assert!(!has_claimed(&chain, &packet, &claimant).await.unwrap());
        chain.set_account(
            identity.claimant_state(&claimant),
            testing::program_account(vec![0; 16]),
        );
        assert!(has_claimed(&chain, &packet, &claimant).await.unwrap());
    }
}
