use crate::{
    chain::Chain,
    config::ClientConfig,
    error::{Error, Result},
    signer::{self, SignatureRequest},
    wallet::Wallet,
};
use bytes::Bytes;
use futures::future::try_join_all;
use redpacket_lib::Operation;
use solana_sdk::{
    instruction::Instruction,
    message::Message,
    pubkey::Pubkey,
    signature::{Presigner, Signature},
    signer::Signer,
    transaction::Transaction,
};

#[derive(Debug)]
pub struct Instructions {
    pub fee_payer: Pubkey,
    pub signers: Vec<Wallet>,
    pub instructions: Vec<Instruction>,
}

impl Instructions {
    /// Instructions paid for and signed by a single wallet.
    pub fn new(payer: Wallet, instructions: Vec<Instruction>) -> Self {
        Self {
            fee_payer: payer.pubkey(),
            signers: vec![payer],
            instructions,
        }
    }

    /// Sign with local keypairs and the signer service, then submit once.
    /// Does not wait for confirmation.
    pub async fn execute(
        self,
        chain: &dyn Chain,
        signer: &signer::Svc,
        config: &ClientConfig,
        operation: Operation,
    ) -> Result<Signature> {
        let recent_blockhash = chain
            .get_latest_blockhash()
            .await
            .map_err(Error::solana(operation))?;

        let message = Message::new_with_blockhash(
            &self.instructions,
            Some(&self.fee_payer),
            &recent_blockhash,
        );

        let mut tx = Transaction::new_unsigned(message);

        let msg: Bytes = tx.message_data().into();

        let mut wallets = self
            .signers
            .iter()
            .filter(|w| w.is_adapter())
            .map(Wallet::pubkey)
            .collect::<Vec<_>>();
        wallets.sort();
        wallets.dedup();

        let reqs = wallets.iter().map(|&pubkey| {
            signer.call_ref(SignatureRequest {
                time: chrono::Utc::now(),
                pubkey,
                message: msg.clone(),
                timeout: config.signature_timeout,
            })
        });

        let sigs = tokio::time::timeout(config.signature_timeout, try_join_all(reqs))
            .await
            .map_err(|_| signer::Error::Timeout)??;

        {
            let mut presigners = Vec::with_capacity(sigs.len());
            for (pk, resp) in wallets.iter().zip(sigs) {
                if resp.new_message.is_some_and(|new| new != msg) {
                    return Err(signer::Error::MessageChanged.into());
                }
                presigners.push(Presigner::new(pk, &resp.signature));
            }

            let mut signers = Vec::<&dyn Signer>::with_capacity(self.signers.len());

            for p in &presigners {
                signers.push(p);
            }

            for k in self.signers.iter().filter_map(Wallet::keypair) {
                signers.push(k);
            }

            tx.try_sign(&signers, recent_blockhash)?;
        }

        tracing::info!(
            "submitting {:?} transaction, fee payer {}",
            operation,
            self.fee_payer
        );
        let sig = chain
            .send_transaction(&tx)
            .await
            .map_err(Error::solana(operation))?;
        tracing::info!("submitted {}", sig);

        Ok(sig)
    }
}
