//! Thin async RPC driver: the only place this crate talks to the cluster.
//! Everything above this module treats the RPC as an opaque
//! send-transaction / fetch-account interface, per the system's explicit
//! out-of-scope boundary on RPC transport details.

use solana_client::client_error::ClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

pub struct RpcDriver {
    client: RpcClient,
}

impl RpcDriver {
    pub fn new(url: &str, commitment: CommitmentConfig) -> Self {
        Self { client: RpcClient::new_with_commitment(url.to_string(), commitment) }
    }

    pub async fn get_latest_blockhash(&self) -> Result<Hash, ClientError> {
        self.client.get_latest_blockhash().await
    }

    pub async fn get_account_data(&self, pubkey: &Pubkey) -> Result<Vec<u8>, ClientError> {
        self.client.get_account_data(pubkey).await
    }

    pub async fn account_exists(&self, pubkey: &Pubkey) -> bool {
        self.client.get_account(pubkey).await.is_ok()
    }

    pub async fn send_and_confirm(&self, tx: &Transaction) -> Result<Signature, ClientError> {
        self.client.send_and_confirm_transaction(tx).await
    }
}
