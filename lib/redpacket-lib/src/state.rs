//! On-chain accounts of the red packet program.

use crate::{
    consts::{RED_PACKET_DISCRIMINATOR, USER_STATE_DISCRIMINATOR},
    error::{Error, Result},
    merkle::Hash32,
};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AllocationPolicy {
    Equal = 0,
    PseudoRandom = 1,
    WhitelistFixed = 2,
}

impl TryFrom<u8> for AllocationPolicy {
    type Error = Error;
    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Equal),
            1 => Ok(Self::PseudoRandom),
            2 => Ok(Self::WhitelistFixed),
            v => Err(Error::InvalidAllocationPolicy(v)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AssetType {
    Native = 0,
    Fungible = 1,
}

impl TryFrom<u8> for AssetType {
    type Error = Error;
    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Native),
            1 => Ok(Self::Fungible),
            v => Err(Error::InvalidAssetType(v)),
        }
    }
}

fn strip_discriminator<'a>(
    name: &'static str,
    data: &'a [u8],
    discriminator: &[u8; 8],
) -> Result<&'a [u8]> {
    match data.split_first_chunk::<8>() {
        Some((disc, rest)) if disc == discriminator => Ok(rest),
        Some(_) => Err(Error::account_data(name, "discriminator mismatch")),
        None => Err(Error::account_data(name, "account too short")),
    }
}

// Fixed part of the `RedPacket` account, in declaration order.
#[derive(BorshSerialize, BorshDeserialize)]
struct PacketRecordRepr {
    creator: [u8; 32],
    packet_id: u64,
    total_amount: u64,
    packet_count: u32,
    claimed_count: u32,
    claimed_amount: u64,
    allocation_policy: u8,
    asset_type: u8,
    mint: [u8; 32],
    expiry_unix_time: i64,
    merkle_root: Option<[u8; 32]>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketRecord {
    pub creator: Pubkey,
    pub packet_id: u64,
    pub total_amount: u64,
    pub packet_count: u32,
    pub claimed_count: u32,
    pub claimed_amount: u64,
    pub allocation_policy: AllocationPolicy,
    pub asset_type: AssetType,
    /// Default key for native packets.
    pub mint: Pubkey,
    pub expiry_unix_time: i64,
    pub merkle_root: Option<Hash32>,
    /// Not present in accounts written by older deployments.
    pub withdrawn: Option<bool>,
    pub bump: Option<u8>,
}

impl PacketRecord {
    pub const NAME: &'static str = "RedPacket";

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut rest = strip_discriminator(Self::NAME, data, &RED_PACKET_DISCRIMINATOR)?;
        let repr = PacketRecordRepr::deserialize(&mut rest)
            .map_err(|error| Error::account_data(Self::NAME, error))?;

        // Trailing fields. An older account has the bump right after the
        // merkle root, which can't be a valid bool.
        let (withdrawn, bump) = match rest {
            [flag @ (0 | 1), bump, ..] => (Some(*flag == 1), Some(*bump)),
            [flag @ (0 | 1)] => (Some(*flag == 1), None),
            [bump, ..] => (None, Some(*bump)),
            [] => (None, None),
        };

        Ok(Self {
            creator: Pubkey::new_from_array(repr.creator),
            packet_id: repr.packet_id,
            total_amount: repr.total_amount,
            packet_count: repr.packet_count,
            claimed_count: repr.claimed_count,
            claimed_amount: repr.claimed_amount,
            allocation_policy: repr.allocation_policy.try_into()?,
            asset_type: repr.asset_type.try_into()?,
            mint: Pubkey::new_from_array(repr.mint),
            expiry_unix_time: repr.expiry_unix_time,
            merkle_root: repr.merkle_root,
            withdrawn,
            bump,
        })
    }

    /// Account data as the program writes it.
    pub fn to_account_data(&self) -> Result<Vec<u8>> {
        let repr = PacketRecordRepr {
            creator: self.creator.to_bytes(),
            packet_id: self.packet_id,
            total_amount: self.total_amount,
            packet_count: self.packet_count,
            claimed_count: self.claimed_count,
            claimed_amount: self.claimed_amount,
            allocation_policy: self.allocation_policy as u8,
            asset_type: self.asset_type as u8,
            mint: self.mint.to_bytes(),
            expiry_unix_time: self.expiry_unix_time,
            merkle_root: self.merkle_root,
        };
        let mut data = RED_PACKET_DISCRIMINATOR.to_vec();
        data.extend(borsh::to_vec(&repr)?);
        if let Some(withdrawn) = self.withdrawn {
            data.push(withdrawn as u8);
        }
        if let Some(bump) = self.bump {
            data.push(bump);
        }
        Ok(data)
    }

    pub fn is_fully_claimed(&self) -> bool {
        self.claimed_count >= self.packet_count
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expiry_unix_time
    }

    pub fn is_withdrawn(&self) -> bool {
        self.withdrawn.unwrap_or(false)
    }

    pub fn remaining_amount(&self) -> u64 {
        self.total_amount.saturating_sub(self.claimed_amount)
    }

    pub fn refund_eligibility(&self, now: i64) -> RefundEligibility {
        refund_eligibility(self, now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefundEligibility {
    Eligible { amount: u64 },
    NotYetExpired { expires_at: i64 },
    NothingLeft,
    AlreadyWithdrawn,
}

/// Derived from the record every time, never cached.
pub fn refund_eligibility(record: &PacketRecord, now: i64) -> RefundEligibility {
    if !record.is_expired(now) {
        RefundEligibility::NotYetExpired {
            expires_at: record.expiry_unix_time,
        }
    } else if record.is_fully_claimed() {
        RefundEligibility::NothingLeft
    } else if record.is_withdrawn() {
        RefundEligibility::AlreadyWithdrawn
    } else {
        RefundEligibility::Eligible {
            amount: record.remaining_amount(),
        }
    }
}

#[derive(BorshSerialize, BorshDeserialize)]
struct CreatorStateRepr {
    creator: [u8; 32],
    next_packet_id: u64,
}

/// Per-creator packet counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatorState {
    pub creator: Pubkey,
    pub next_packet_id: u64,
}

impl CreatorState {
    pub const NAME: &'static str = "UserState";

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut rest = strip_discriminator(Self::NAME, data, &USER_STATE_DISCRIMINATOR)?;
        let repr = CreatorStateRepr::deserialize(&mut rest)
            .map_err(|error| Error::account_data(Self::NAME, error))?;
        Ok(Self {
            creator: Pubkey::new_from_array(repr.creator),
            next_packet_id: repr.next_packet_id,
        })
    }

    pub fn to_account_data(&self) -> Result<Vec<u8>> {
        let mut data = USER_STATE_DISCRIMINATOR.to_vec();
        data.extend(borsh::to_vec(&CreatorStateRepr {
            creator: self.creator.to_bytes(),
            next_packet_id: self.next_packet_id,
        })?);
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PacketRecord {
        PacketRecord {
            creator: Pubkey::new_from_array([1; 32]),
            packet_id: 3,
            total_amount: 1_000,
            packet_count: 4,
            claimed_count: 1,
            claimed_amount: 250,
            allocation_policy: AllocationPolicy::Equal,
            asset_type: AssetType::Native,
            mint: Pubkey::default(),
            expiry_unix_time: 1_700_000_000,
            merkle_root: None,
            withdrawn: Some(false),
            bump: Some(254),
        }
    }

    #[test]
    fn test_layout() {
        let r = PacketRecord {
            merkle_root: Some([7; 32]),
            ..record()
        };
        let data = r.to_account_data().unwrap();
        // disc + creator + id + total + count + claimed + amount + policy + asset
        // + mint + expiry + option + root + withdrawn + bump
        assert_eq!(data.len(), 8 + 32 + 8 + 8 + 4 + 4 + 8 + 1 + 1 + 32 + 8 + 1 + 32 + 1 + 1);
        assert_eq!(&data[..8], &RED_PACKET_DISCRIMINATOR);
        assert_eq!(&data[40..48], &3u64.to_le_bytes());
        assert_eq!(PacketRecord::decode(&data).unwrap(), r);
    }

    #[test]
    fn test_older_layouts() {
        let mut r = record();
        r.withdrawn = None;
        r.bump = None;
        let data = r.to_account_data().unwrap();
        let decoded = PacketRecord::decode(&data).unwrap();
        assert_eq!(decoded.withdrawn, None);
        assert!(!decoded.is_withdrawn());

        r.bump = Some(255);
        let data = r.to_account_data().unwrap();
        let decoded = PacketRecord::decode(&data).unwrap();
        assert_eq!(decoded.withdrawn, None);
        assert_eq!(decoded.bump, Some(255));
    }

    #[test]
    fn test_padding_is_ignored() {
        let r = PacketRecord {
            withdrawn: Some(true),
            ..record()
        };
        let mut data = r.to_account_data().unwrap();
        data.extend([0u8; 32]);
        let decoded = PacketRecord::decode(&data).unwrap();
        assert_eq!(decoded, r);
        assert!(decoded.is_withdrawn());
    }

    #[test]
    fn test_invalid_accounts() {
        let mut data = record().to_account_data().unwrap();
        assert!(matches!(
            PacketRecord::decode(&data[..20]),
            Err(Error::InvalidAccountData { .. })
        ));
        assert!(matches!(
            PacketRecord::decode(&data[..4]),
            Err(Error::InvalidAccountData { .. })
        ));
        assert!(CreatorState::decode(&data).is_err());
        // allocation_policy byte
        data[8 + 32 + 8 + 8 + 4 + 4 + 8] = 9;
        assert!(matches!(
            PacketRecord::decode(&data),
            Err(Error::InvalidAllocationPolicy(9))
        ));
    }

    #[test]
    fn test_refund_eligibility() {
        let r = record();
        let expiry = r.expiry_unix_time;
        assert_eq!(
            r.refund_eligibility(expiry - 1),
            RefundEligibility::NotYetExpired { expires_at: expiry }
        );
        assert_eq!(
            r.refund_eligibility(expiry),
            RefundEligibility::Eligible { amount: 750 }
        );
        let withdrawn = PacketRecord {
            withdrawn: Some(true),
            ..r.clone()
        };
        assert_eq!(
            withdrawn.refund_eligibility(expiry),
            RefundEligibility::AlreadyWithdrawn
        );
        let full = PacketRecord {
            claimed_count: 4,
            ..r
        };
        assert_eq!(full.refund_eligibility(expiry + 10), RefundEligibility::NothingLeft);
    }

    #[test]
    fn test_creator_state() {
        let s = CreatorState {
            creator: Pubkey::new_from_array([2; 32]),
            next_packet_id: 17,
        };
        let data = s.to_account_data().unwrap();
        assert_eq!(data.len(), 8 + 32 + 8);
        assert_eq!(CreatorState::decode(&data).unwrap(), s);
        assert!(PacketRecord::decode(&data).is_err());
    }
}
