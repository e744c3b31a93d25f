use solana_sdk::{
    pubkey::Pubkey,
    signature::Keypair,
    signer::Signer,
};
use std::fmt;

/// A wallet is either a local keypair or an adapter that signs through the
/// external [`signer`][crate::signer] service.
pub enum Wallet {
    Keypair(Keypair),
    Adapter { public_key: Pubkey },
}

impl Wallet {
    pub fn adapter(public_key: Pubkey) -> Self {
        Self::Adapter { public_key }
    }

    pub fn pubkey(&self) -> Pubkey {
        match self {
            Wallet::Keypair(keypair) => keypair.pubkey(),
            Wallet::Adapter { public_key } => *public_key,
        }
    }

    pub fn is_adapter(&self) -> bool {
        matches!(self, Wallet::Adapter { .. })
    }

    pub fn keypair(&self) -> Option<&Keypair> {
        match self {
            Wallet::Keypair(keypair) => Some(keypair),
            Wallet::Adapter { .. } => None,
        }
    }
}

impl Clone for Wallet {
    fn clone(&self) -> Self {
        match self {
            Self::Keypair(keypair) => Self::Keypair(keypair.insecure_clone()),
            Self::Adapter { public_key } => Self::Adapter {
                public_key: *public_key,
            },
        }
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Wallet::Keypair(keypair) => f.debug_tuple("Keypair").field(&keypair.pubkey()).finish(),
            Wallet::Adapter { public_key } => f
                .debug_struct("Adapter")
                .field("public_key", public_key)
                .finish(),
        }
    }
}

impl From<Keypair> for Wallet {
    fn from(value: Keypair) -> Self {
        Self::Keypair(value)
    }
}
