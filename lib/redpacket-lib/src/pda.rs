//! Program derived addresses of the red packet program.

use crate::{
    consts::{SEED_CLAIMER, SEED_RED_PACKET, SEED_USER_STATE},
    error::{Error, Result},
};
use solana_program::pubkey::Pubkey;
use std::fmt;

/// Identity of a packet: which program, which creator, which counter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PacketIdentity {
    pub program_id: Pubkey,
    pub creator: Pubkey,
    pub packet_id: u64,
}

impl PacketIdentity {
    pub fn new(program_id: Pubkey, creator: Pubkey, packet_id: u64) -> Self {
        Self {
            program_id,
            creator,
            packet_id,
        }
    }

    pub fn address(&self) -> Pubkey {
        derive_packet_address(&self.program_id, &self.creator, self.packet_id).0
    }

    pub fn claimant_state(&self, claimant: &Pubkey) -> Pubkey {
        derive_claimant_state_address(&self.program_id, &self.address(), claimant).0
    }
}

impl fmt::Display for PacketIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.creator, self.packet_id)
    }
}

/// Packet id seed: low 32 bits little-endian, then high 32 bits little-endian.
///
/// The byte layout is a compatibility contract with deployed packets and
/// coincides with `u64::to_le_bytes`.
pub fn encode_packet_id(packet_id: u64) -> [u8; 8] {
    let low = (packet_id & 0xFFFF_FFFF) as u32;
    let high = (packet_id >> 32) as u32;
    let mut bytes = [0u8; 8];
    bytes[..4].copy_from_slice(&low.to_le_bytes());
    bytes[4..].copy_from_slice(&high.to_le_bytes());
    bytes
}

/// Derive packet PDA: `["red_packet", creator, packet_id]`
pub fn derive_packet_address(program_id: &Pubkey, creator: &Pubkey, packet_id: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[SEED_RED_PACKET, creator.as_ref(), &encode_packet_id(packet_id)],
        program_id,
    )
}

/// Derive claimant state PDA: `["claimer", packet, claimant]`
pub fn derive_claimant_state_address(
    program_id: &Pubkey,
    packet: &Pubkey,
    claimant: &Pubkey,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[SEED_CLAIMER, packet.as_ref(), claimant.as_ref()],
        program_id,
    )
}

/// Derive creator counter PDA: `["user_state", creator]`
pub fn derive_creator_state_address(program_id: &Pubkey, creator: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[SEED_USER_STATE, creator.as_ref()], program_id)
}

/// Associated token account of `owner` for `mint` under `token_program`.
pub fn token_account_address(owner: &Pubkey, mint: &Pubkey, token_program: &Pubkey) -> Pubkey {
    spl_associated_token_account::get_associated_token_address_with_program_id(
        owner,
        mint,
        token_program,
    )
}

pub fn parse_identity(s: &str) -> Result<Pubkey> {
    let bytes = bs58::decode(s.trim())
        .into_vec()
        .map_err(|error| Error::InvalidIdentity(format!("{s}: {error}")))?;
    identity_from_bytes(&bytes)
}

pub fn identity_from_bytes(bytes: &[u8]) -> Result<Pubkey> {
    let array: [u8; 32] = bytes
        .try_into()
        .map_err(|_| Error::InvalidIdentity(format!("expected 32 bytes, got {}", bytes.len())))?;
    Ok(Pubkey::new_from_array(array))
}
