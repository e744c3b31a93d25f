use crate::{
    chain::Chain,
    error::{Error, Result},
};
use redpacket_lib::{
    asset::{mint_decimals, token_account_amount},
    AssetKind, AssetType, Operation, PacketRecord, TokenProgram,
};
use solana_sdk::pubkey::Pubkey;
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

/// Detects the token program and decimals of mints. Each mint is read once.
#[derive(Debug, Clone, Default)]
pub struct AssetResolver {
    cache: Arc<RwLock<HashMap<Pubkey, AssetKind>>>,
}

impl AssetResolver {
    pub async fn resolve(&self, chain: &dyn Chain, record: &PacketRecord) -> Result<AssetKind> {
        match record.asset_type {
            AssetType::Native => Ok(AssetKind::Native),
            AssetType::Fungible => self.resolve_mint(chain, &record.mint).await,
        }
    }

    pub async fn resolve_mint(&self, chain: &dyn Chain, mint: &Pubkey) -> Result<AssetKind> {
        let cached = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(mint)
            .copied();
        if let Some(asset) = cached {
            return Ok(asset);
        }

        let account = chain
            .get_account(mint)
            .await
            .map_err(Error::solana(Operation::Read))?
            .ok_or(Error::AccountNotFound(*mint))?;
        let program = TokenProgram::from_owner(&account.owner).ok_or(Error::UnsupportedMint {
            mint: *mint,
            owner: account.owner,
        })?;
        let asset = AssetKind::Fungible {
            mint: *mint,
            program,
            decimals: mint_decimals(&account.data)?,
        };
        tracing::debug!("mint {} resolved to {:?}", mint, asset);

        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(*mint, asset);
        Ok(asset)
    }
}

/// Amount of `asset` held by `owner`, in base units. A token account that
/// does not exist yet holds nothing.
pub async fn balance(chain: &dyn Chain, owner: &Pubkey, asset: &AssetKind) -> Result<u64> {
    let read = Error::solana(Operation::Read);
    match asset {
        AssetKind::Native => chain.get_balance(owner).await.map_err(read),
        AssetKind::Fungible { .. } => {
            let account = chain
                .get_account(&asset.holding_account(owner))
                .await
                .map_err(read)?;
            match account {
                Some(account) => Ok(token_account_amount(&account.data)?),
                None => Ok(0),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, MockChain};
    use redpacket_lib::{
        consts::{TOKEN_2022_PROGRAM_ID, TOKEN_PROGRAM_ID},
        ErrorKind,
    };

    #[tokio::test]
    async fn test_resolve_mint() {
        let chain = MockChain::default();
        let classic = Pubkey::new_unique();
        let extended = Pubkey::new_unique();
        chain.set_account(classic, testing::mint_account(6, TOKEN_PROGRAM_ID));
        let mut account = testing::mint_account(2, TOKEN_2022_PROGRAM_ID);
        // extension data after the base layout
        account.data.extend([0; 83]);
        chain.set_account(extended, account);

        let resolver = AssetResolver::default();
        assert_eq!(
            resolver.resolve_mint(&chain, &classic).await.unwrap(),
            AssetKind::Fungible {
                mint: classic,
                program: TokenProgram::Token,
                decimals: 6
            }
        );
        assert_eq!(
            resolver.resolve_mint(&chain, &extended).await.unwrap(),
            AssetKind::Fungible {
                mint: extended,
                program: TokenProgram::Token2022,
                decimals: 2
            }
        );

        let requests = chain.requests();
        resolver.resolve_mint(&chain, &classic).await.unwrap();
        assert_eq!(chain.requests(), requests);
    }

    #[tokio::test]
    async fn test_unsupported_mint() {
        let chain = MockChain::default();
        let mint = Pubkey::new_unique();
        chain.set_account(mint, testing::wallet_account(1));
        let error = AssetResolver::default()
            .resolve_mint(&chain, &mint)
            .await
            .unwrap_err();
        assert!(matches!(error, Error::UnsupportedMint { .. }));
        assert_eq!(error.kind(), ErrorKind::InvalidInput);

        let missing = Pubkey::new_unique();
        let error = AssetResolver::default()
            .resolve_mint(&chain, &missing)
            .await
            .unwrap_err();
        assert!(matches!(error, Error::AccountNotFound(m) if m == missing));
    }

    #[tokio::test]
    async fn test_native_record() {
        let chain = MockChain::default();
        let record = testing::record(&testing::identity(Pubkey::new_unique(), 0));
        let asset = AssetResolver::default().resolve(&chain, &record).await.unwrap();
        assert_eq!(asset, AssetKind::Native);
        assert_eq!(chain.requests(), 0);
    }

    #[tokio::test]
    async fn test_balance() {
        let chain = MockChain::default();
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        chain.script_balances(owner, vec![5_000]);
        assert_eq!(balance(&chain, &owner, &AssetKind::Native).await.unwrap(), 5_000);

        let asset = AssetKind::Fungible {
            mint,
            program: TokenProgram::Token2022,
            decimals: 6,
        };
        assert_eq!(balance(&chain, &owner, &asset).await.unwrap(), 0);
        chain.script_token_amounts(
            asset.holding_account(&owner),
            mint,
            owner,
            TOKEN_2022_PROGRAM_ID,
            vec![42],
        );
        assert_eq!(balance(&chain, &owner, &asset).await.unwrap(), 42);
    }
}
