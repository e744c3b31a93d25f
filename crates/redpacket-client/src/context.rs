use crate::{
    chain::Chain,
    config::ClientConfig,
    error::{Error, Result},
    execute::Instructions,
    signer,
};
use redpacket_lib::Operation;
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use std::sync::Arc;

/// Everything an operation needs to talk to the network. Passed explicitly to
/// every orchestrator.
#[derive(Clone)]
pub struct Context {
    pub chain: Arc<dyn Chain>,
    pub signer: signer::Svc,
    pub config: Arc<ClientConfig>,
}

impl Context {
    pub fn new(chain: Arc<dyn Chain>, signer: signer::Svc, config: ClientConfig) -> Self {
        Self {
            chain,
            signer,
            config: Arc::new(config),
        }
    }

    /// Context backed by a JSON RPC client. Every wallet has to be a local
    /// keypair unless a signer service is set with [`Context::with_signer`].
    pub fn from_config(config: ClientConfig) -> Self {
        let rpc = Arc::new(config.rpc_client());
        Self::new(rpc, signer::unimplemented(), config)
    }

    pub fn with_signer(mut self, signer: signer::Svc) -> Self {
        self.signer = signer;
        self
    }

    pub fn program_id(&self) -> Pubkey {
        self.config.program_id
    }

    pub async fn now(&self) -> Result<i64> {
        self.chain
            .unix_timestamp()
            .await
            .map_err(Error::solana(Operation::Read))
    }

    pub async fn execute(&self, ins: Instructions, operation: Operation) -> Result<Signature> {
        ins.execute(self.chain.as_ref(), &self.signer, &self.config, operation)
            .await
    }
}
