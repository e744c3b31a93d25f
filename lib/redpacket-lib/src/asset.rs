use crate::{
    consts::{NATIVE_DECIMALS, TOKEN_2022_PROGRAM_ID, TOKEN_PROGRAM_ID},
    error::{Error, Result},
    pda::token_account_address,
};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use solana_program::{program_pack::Pack, pubkey::Pubkey};
use spl_token::state::{Account as TokenAccount, Mint};

/// The two token programs a fungible mint can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenProgram {
    Token,
    Token2022,
}

impl TokenProgram {
    pub fn id(&self) -> Pubkey {
        match self {
            TokenProgram::Token => TOKEN_PROGRAM_ID,
            TokenProgram::Token2022 => TOKEN_2022_PROGRAM_ID,
        }
    }

    pub fn from_owner(owner: &Pubkey) -> Option<Self> {
        if *owner == TOKEN_PROGRAM_ID {
            Some(TokenProgram::Token)
        } else if *owner == TOKEN_2022_PROGRAM_ID {
            Some(TokenProgram::Token2022)
        } else {
            None
        }
    }
}

/// Asset held by a packet, resolved once per mint.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AssetKind {
    Native,
    Fungible {
        #[serde_as(as = "DisplayFromStr")]
        mint: Pubkey,
        program: TokenProgram,
        decimals: u8,
    },
}

impl AssetKind {
    pub fn decimals(&self) -> u8 {
        match self {
            AssetKind::Native => NATIVE_DECIMALS,
            AssetKind::Fungible { decimals, .. } => *decimals,
        }
    }

    pub fn mint(&self) -> Option<Pubkey> {
        match self {
            AssetKind::Native => None,
            AssetKind::Fungible { mint, .. } => Some(*mint),
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, AssetKind::Native)
    }

    /// Where `owner` holds this asset: the wallet itself for SOL, its
    /// associated token account otherwise.
    pub fn holding_account(&self, owner: &Pubkey) -> Pubkey {
        match self {
            AssetKind::Native => *owner,
            AssetKind::Fungible { mint, program, .. } => {
                token_account_address(owner, mint, &program.id())
            }
        }
    }
}

// Token-2022 accounts carry extensions after the base layout.
fn base<'a>(data: &'a [u8], len: usize, name: &'static str) -> Result<&'a [u8]> {
    data.get(..len)
        .ok_or_else(|| Error::account_data(name, format!("expected at least {len} bytes")))
}

pub fn mint_decimals(data: &[u8]) -> Result<u8> {
    Ok(Mint::unpack(base(data, Mint::LEN, "Mint")?)?.decimals)
}

pub fn token_account_amount(data: &[u8]) -> Result<u64> {
    Ok(TokenAccount::unpack(base(data, TokenAccount::LEN, "TokenAccount")?)?.amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_program::program_option::COption;
    use spl_token::state::AccountState;

    #[test]
    fn test_program_from_owner() {
        assert_eq!(
            TokenProgram::from_owner(&TOKEN_PROGRAM_ID),
            Some(TokenProgram::Token)
        );
        assert_eq!(
            TokenProgram::from_owner(&TOKEN_2022_PROGRAM_ID),
            Some(TokenProgram::Token2022)
        );
        assert_eq!(TokenProgram::from_owner(&Pubkey::default()), None);
        assert_eq!(TokenProgram::Token2022.id(), TOKEN_2022_PROGRAM_ID);
    }

    #[test]
    fn test_holding_account() {
        let owner = Pubkey::new_from_array([1; 32]);
        let mint = Pubkey::new_from_array([2; 32]);
        assert_eq!(AssetKind::Native.holding_account(&owner), owner);
        let classic = AssetKind::Fungible {
            mint,
            program: TokenProgram::Token,
            decimals: 6,
        };
        let t22 = AssetKind::Fungible {
            mint,
            program: TokenProgram::Token2022,
            decimals: 6,
        };
        assert_ne!(classic.holding_account(&owner), t22.holding_account(&owner));
        assert_eq!(
            classic.holding_account(&owner),
            spl_associated_token_account::get_associated_token_address(&owner, &mint)
        );
        assert_eq!(AssetKind::Native.decimals(), 9);
        assert_eq!(t22.decimals(), 6);
    }

    #[test]
    fn test_unpack_with_extensions() {
        let mint = Mint {
            mint_authority: COption::None,
            supply: 1_000,
            decimals: 6,
            is_initialized: true,
            freeze_authority: COption::None,
        };
        let mut data = vec![0u8; Mint::LEN];
        Mint::pack(mint, &mut data).unwrap();
        assert_eq!(mint_decimals(&data).unwrap(), 6);
        data.extend([0u8; 100]);
        assert_eq!(mint_decimals(&data).unwrap(), 6);
        assert!(mint_decimals(&data[..10]).is_err());

        let account = TokenAccount {
            mint: Pubkey::new_from_array([2; 32]),
            owner: Pubkey::new_from_array([1; 32]),
            amount: 42,
            delegate: COption::None,
            state: AccountState::Initialized,
            is_native: COption::None,
            delegated_amount: 0,
            close_authority: COption::None,
        };
        let mut data = vec![0u8; TokenAccount::LEN];
        TokenAccount::pack(account, &mut data).unwrap();
        assert_eq!(token_account_amount(&data).unwrap(), 42);
    }
}
