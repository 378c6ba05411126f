//! Chain client abstraction using subxt.
//!
//! Supports WebSocket RPC connections to a Subtensor node.

use crate::error::ChainError;
use taostake_core::ConnectionStatus;

use subxt::backend::rpc::RpcClient;
use subxt::{OnlineClient, PolkadotConfig};
use tokio::sync::mpsc;

/// Chain metadata reported at connection time.
#[derive(Debug, Clone)]
pub struct ChainInfo {
    /// Chain name as reported by system_chain RPC.
    pub chain_name: String,
    /// Runtime spec version.
    pub spec_version: u32,
    /// Transaction version.
    pub tx_version: u32,
    pub genesis_hash: [u8; 32],
}

/// Chain client for a single Subtensor RPC endpoint.
pub struct ChainClient {
    chain_name: String,
    client: OnlineClient<PolkadotConfig>,
}

impl ChainClient {
    /// Connect to `endpoint` using WebSocket RPC, reporting progress on `status_tx`.
    pub async fn connect(
        endpoint: &str,
        status_tx: mpsc::Sender<ConnectionStatus>,
    ) -> Result<Self, ChainError> {
        let _ = status_tx.send(ConnectionStatus::Connecting).await;
        tracing::info!("Connecting to {}", endpoint);

        match Self::dial(endpoint).await {
            Ok(client) => {
                let _ = status_tx.send(ConnectionStatus::Connected).await;
                Ok(client)
            }
            Err(e) => {
                tracing::warn!("Failed to connect to {}: {}", endpoint, e);
                let _ = status_tx.send(ConnectionStatus::Error(e.to_string())).await;
                Err(e)
            }
        }
    }

    async fn dial(endpoint: &str) -> Result<Self, ChainError> {
        let rpc_client = RpcClient::from_url(endpoint)
            .await
            .map_err(|e| ChainError::Connection(format!("{}: {}", endpoint, e)))?;
        let client = OnlineClient::<PolkadotConfig>::from_rpc_client(rpc_client.clone())
            .await
            .map_err(|e| ChainError::Connection(format!("{}: {}", endpoint, e)))?;

        // Log chain name to verify we reached the expected network
        let chain_name = match rpc_client
            .request::<String>("system_chain", subxt::ext::subxt_rpcs::rpc_params![])
            .await
        {
            Ok(name) => {
                tracing::info!("Chain reported name: {}", name);
                name
            }
            Err(e) => {
                tracing::warn!("system_chain unavailable on {}: {}", endpoint, e);
                String::from("unknown")
            }
        };

        tracing::info!("Connected to {} via {}", chain_name, endpoint);
        Ok(Self {
            chain_name,
            client,
        })
    }

    /// Get the underlying subxt client.
    pub fn client(&self) -> &OnlineClient<PolkadotConfig> {
        &self.client
    }

    /// Get the genesis hash.
    pub fn genesis_hash(&self) -> [u8; 32] {
        self.client.genesis_hash().0
    }

    /// Get the latest block number and hash to verify connection.
    pub async fn get_latest_block(&self) -> Result<(u32, [u8; 32]), ChainError> {
        let block = self.client.blocks().at_latest().await?;
        let number = block.number();
        let hash: [u8; 32] = block.hash().0;
        Ok((number, hash))
    }

    pub fn get_chain_info(&self) -> ChainInfo {
        let runtime = self.client.runtime_version();
        ChainInfo {
            chain_name: self.chain_name.clone(),
            spec_version: runtime.spec_version,
            tx_version: runtime.transaction_version,
            genesis_hash: self.genesis_hash(),
        }
    }
}
