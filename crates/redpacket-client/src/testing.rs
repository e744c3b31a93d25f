//! In-memory [`Chain`] and account fixtures for tests.

use crate::{
    chain::{Chain, SignatureState},
    content::ContentStore,
    error::{Error, Result as ClientResult},
};
use async_trait::async_trait;
use redpacket_lib::{
    consts::{PROGRAM_ID, SYSTEM_PROGRAM_ID},
    whitelist::WhitelistDocument,
    AllocationPolicy, AssetType, CreatorState, PacketIdentity, PacketRecord, WhitelistEntry,
};
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_sdk::{
    account::Account,
    hash::Hash,
    program_option::COption,
    program_pack::Pack,
    pubkey::Pubkey,
    signature::Signature,
    transaction::{Transaction, TransactionError},
};
use spl_token::state::{Account as TokenAccount, AccountState, Mint};
use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
};

pub const NOW: i64 = 1_700_000_000;

#[derive(Default)]
struct State {
    accounts: HashMap<Pubkey, VecDeque<Option<Account>>>,
    balances: HashMap<Pubkey, VecDeque<u64>>,
    statuses: VecDeque<SignatureState>,
    now: i64,
    sent: Vec<Transaction>,
    requests: usize,
    send_error: Option<TransactionError>,
}

/// Scripted values are consumed front to back, the last one repeats.
fn next<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

pub struct MockChain {
    state: Mutex<State>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                now: NOW,
                ..<_>::default()
            }),
        }
    }
}

impl MockChain {
    fn with<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn set_account(&self, address: Pubkey, account: Account) {
        self.with(|s| s.accounts.insert(address, VecDeque::from([Some(account)])));
    }

    /// Successive reads of `address` return these accounts.
    pub fn script_accounts(&self, address: Pubkey, accounts: Vec<Option<Account>>) {
        self.with(|s| s.accounts.insert(address, accounts.into()));
    }

    pub fn script_balances(&self, address: Pubkey, balances: Vec<u64>) {
        self.with(|s| s.balances.insert(address, balances.into()));
    }

    /// Successive reads of the token account return these amounts.
    pub fn script_token_amounts(
        &self,
        address: Pubkey,
        mint: Pubkey,
        owner: Pubkey,
        token_program: Pubkey,
        amounts: Vec<u64>,
    ) {
        let accounts = amounts
            .into_iter()
            .map(|amount| Some(token_account(mint, owner, amount, token_program)))
            .collect();
        self.script_accounts(address, accounts);
    }

    pub fn script_statuses(&self, statuses: Vec<SignatureState>) {
        self.with(|s| s.statuses = statuses.into());
    }

    pub fn fail_send(&self, error: TransactionError) {
        self.with(|s| s.send_error = Some(error));
    }

    pub fn clear_send_error(&self) {
        self.with(|s| s.send_error = None);
    }

    pub fn set_now(&self, now: i64) {
        self.with(|s| s.now = now);
    }

    pub fn sent(&self) -> Vec<Transaction> {
        self.with(|s| s.sent.clone())
    }

    pub fn requests(&self) -> usize {
        self.with(|s| s.requests)
    }
}

#[async_trait]
impl Chain for MockChain {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>, ClientError> {
        Ok(self.with(|s| {
            s.requests += 1;
            s.accounts.get_mut(address).and_then(next).flatten()
        }))
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, ClientError> {
        Ok(self.with(|s| {
            s.requests += 1;
            match s.balances.get_mut(address).and_then(next) {
                Some(balance) => balance,
                None => s
                    .accounts
                    .get_mut(address)
                    .and_then(next)
                    .flatten()
                    .map_or(0, |a| a.lamports),
            }
        }))
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, ClientError> {
        self.with(|s| s.requests += 1);
        Ok(Hash::new_from_array([9; 32]))
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, ClientError> {
        self.with(|s| -> Result<Signature, ClientError> {
            s.requests += 1;
            if let Some(error) = s.send_error.clone() {
                return Err(ClientErrorKind::TransactionError(error).into());
            }
            tx.verify()
                .map_err(|error| ClientError::from(ClientErrorKind::TransactionError(error)))?;
            s.sent.push(tx.clone());
            Ok(tx.signatures[0])
        })
    }

    async fn get_signature_state(
        &self,
        _: &Signature,
    ) -> Result<SignatureState, ClientError> {
        Ok(self.with(|s| {
            s.requests += 1;
            next(&mut s.statuses).unwrap_or(SignatureState::Confirmed)
        }))
    }

    async fn unix_timestamp(&self) -> Result<i64, ClientError> {
        Ok(self.with(|s| s.now))
    }
}

/// Whitelist payloads kept in memory.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<String, WhitelistDocument>>,
    pub offline: AtomicBool,
    pub fetches: AtomicUsize,
}

impl MemoryStore {
    pub fn insert(&self, content_id: &str, entries: Vec<WhitelistEntry>) {
        // may be empty, so no root
        let doc = WhitelistDocument {
            entries,
            decimals: None,
            merkle_root: None,
        };
        self.docs
            .lock()
            .unwrap()
            .insert(content_id.to_owned(), doc);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn fetch_payload(&self, content_id: &str) -> ClientResult<Option<WhitelistDocument>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::custom(anyhow::anyhow!("gateway unreachable")));
        }
        Ok(self.docs.lock().unwrap().get(content_id).cloned())
    }
}

pub fn whitelist(n: u8) -> Vec<WhitelistEntry> {
    (1..=n)
        .map(|b| WhitelistEntry {
            claimant: Pubkey::new_from_array([b; 32]),
            amount: b as u64 * 1000,
        })
        .collect()
}

pub fn identity(creator: Pubkey, packet_id: u64) -> PacketIdentity {
    PacketIdentity::new(PROGRAM_ID, creator, packet_id)
}

/// Open native packet with an equal split, expiring one day after [`NOW`].
pub fn record(identity: &PacketIdentity) -> PacketRecord {
    PacketRecord {
        creator: identity.creator,
        packet_id: identity.packet_id,
        total_amount: 1_000_000_000,
        packet_count: 10,
        claimed_count: 0,
        claimed_amount: 0,
        allocation_policy: AllocationPolicy::Equal,
        asset_type: AssetType::Native,
        mint: Pubkey::default(),
        expiry_unix_time: NOW + 86400,
        merkle_root: None,
        withdrawn: Some(false),
        bump: Some(255),
    }
}

pub fn program_account(data: Vec<u8>) -> Account {
    Account {
        lamports: 1_000_000,
        data,
        owner: PROGRAM_ID,
        executable: false,
        rent_epoch: 0,
    }
}

pub fn packet_account(record: &PacketRecord) -> Account {
    program_account(record.to_account_data().unwrap())
}

pub fn creator_state_account(creator: Pubkey, next_packet_id: u64) -> Account {
    program_account(
        CreatorState {
            creator,
            next_packet_id,
        }
        .to_account_data()
        .unwrap(),
    )
}

pub fn wallet_account(lamports: u64) -> Account {
    Account {
        lamports,
        owner: SYSTEM_PROGRAM_ID,
        ..<_>::default()
    }
}

pub fn mint_account(decimals: u8, token_program: Pubkey) -> Account {
    let mut data = vec![0; Mint::LEN];
    Mint::pack(
        Mint {
            mint_authority: COption::None,
            supply: 1_000_000_000_000,
            decimals,
            is_initialized: true,
            freeze_authority: COption::None,
        },
        &mut data,
    )
    .unwrap();
    Account {
        lamports: 1_000_000,
        data,
        owner: token_program,
        executable: false,
        rent_epoch: 0,
    }
}

pub fn token_account(mint: Pubkey, owner: Pubkey, amount: u64, token_program: Pubkey) -> Account {
    let mut data = vec![0; TokenAccount::LEN];
    TokenAccount::pack(
        TokenAccount {
            mint,
            owner,
            amount,
            delegate: COption::None,
            state: AccountState::Initialized,
            is_native: COption::None,
            delegated_amount: 0,
            close_authority: COption::None,
        },
        &mut data,
    )
    .unwrap();
    Account {
        lamports: 2_039_280,
        data,
        owner: token_program,
        executable: false,
        rent_epoch: 0,
    }
}
