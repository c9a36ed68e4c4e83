// Chain access: receipt lookup over JSON-RPC and transfer verification

use std::time::Duration;

use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::{Address, TransactionReceipt, H256, U256, U64};
use tracing::debug;

use super::usdc::{format_tx_hash, transfer_event_topic};
use crate::types::{AppError, AppResult};

pub const EXPLORER_TX_BASE: &str = "https://basescan.org/tx";

pub fn explorer_tx_url(tx_hash: &str) -> String {
    format!("{}/{}", EXPLORER_TX_BASE, tx_hash)
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// `None` while the transaction is not yet mined
    async fn transaction_receipt(&self, tx_hash: H256) -> AppResult<Option<TransactionReceipt>>;
}

pub struct EthersChainClient {
    provider: Provider<Http>,
}

impl EthersChainClient {
    pub fn new(rpc_url: &str) -> AppResult<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| AppError::Chain(format!("invalid RPC url {}: {}", rpc_url, e)))?;
        Ok(Self { provider })
    }
}

#[async_trait]
impl ChainClient for EthersChainClient {
    async fn transaction_receipt(&self, tx_hash: H256) -> AppResult<Option<TransactionReceipt>> {
        self.provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| AppError::Chain(format!("receipt lookup failed: {}", e)))
    }
}

/// Poll for a receipt every `poll_interval`; `timeout: None` waits forever
pub async fn wait_for_receipt(
    chain: &dyn ChainClient,
    tx_hash: H256,
    poll_interval: Duration,
    timeout: Option<Duration>,
) -> AppResult<TransactionReceipt> {
    let poll = async {
        let mut attempts: u64 = 0;
        loop {
            attempts += 1;
            match chain.transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => return Ok::<TransactionReceipt, AppError>(receipt),
                Ok(None) => {
                    debug!(tx_hash = %format_tx_hash(&tx_hash), attempts, "Receipt not available yet");
                }
                Err(e) => return Err(e),
            }
            tokio::time::sleep(poll_interval).await;
        }
    };

    match timeout {
        Some(limit) => tokio::time::timeout(limit, poll).await.map_err(|_| {
            AppError::Chain(format!(
                "no receipt for {} after {}s",
                format_tx_hash(&tx_hash),
                limit.as_secs()
            ))
        })?,
        None => poll.await,
    }
}

/// Check that a mined receipt moved `expected` units of `token` to `recipient`.
///
/// Returns the payer taken from the matching `Transfer` log.
pub fn verify_transfer(
    receipt: &TransactionReceipt,
    token: Address,
    recipient: Address,
    expected: U256,
) -> AppResult<Address> {
    if receipt.status != Some(U64::from(1)) {
        return Err(AppError::Chain(format!(
            "transaction {} reverted",
            format_tx_hash(&receipt.transaction_hash)
        )));
    }

    let topic = transfer_event_topic();
    receipt
        .logs
        .iter()
        .filter(|log| log.address == token && log.topics.len() == 3 && log.topics[0] == topic)
        .find_map(|log| {
            let to = topic_address(&log.topics[2]);
            let value = (log.data.len() >= 32).then(|| U256::from_big_endian(&log.data[..32]))?;
            (to == recipient && value == expected).then(|| topic_address(&log.topics[1]))
        })
        .ok_or_else(|| {
            AppError::InvalidRequest(format!(
                "transaction {} does not transfer {} units to the invoice creator",
                format_tx_hash(&receipt.transaction_hash),
                expected
            ))
        })
}

fn topic_address(topic: &H256) -> Address {
    Address::from_slice(&topic.as_bytes()[12..])
}


#[cfg(test)]
mod tests {
    use super::fake::*;
    use super::*;
    use std::sync::Arc;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn test_verify_transfer_returns_payer() {
        let receipt = transfer_receipt(H256::repeat_byte(1), addr(0xcc), addr(0xaa), addr(0xbb), U256::from(500u64));
        let payer = verify_transfer(&receipt, addr(0xcc), addr(0xbb), U256::from(500u64)).unwrap();
        assert_eq!(payer, addr(0xaa));
    }

    #[test]
    fn test_verify_transfer_rejects_mismatches() {
        let receipt = transfer_receipt(H256::repeat_byte(1), addr(0xcc), addr(0xaa), addr(0xbb), U256::from(500u64));
        // wrong amount
        assert!(verify_transfer(&receipt, addr(0xcc), addr(0xbb), U256::from(501u64)).is_err());
        // wrong recipient
        assert!(verify_transfer(&receipt, addr(0xcc), addr(0xdd), U256::from(500u64)).is_err());
        // wrong token
        assert!(verify_transfer(&receipt, addr(0xee), addr(0xbb), U256::from(500u64)).is_err());

        let mut reverted = receipt.clone();
        reverted.status = Some(U64::from(0));
        assert!(verify_transfer(&reverted, addr(0xcc), addr(0xbb), U256::from(500u64)).is_err());
    }

    #[tokio::test]
    async fn test_wait_for_receipt_polls_until_mined() {
        let chain = Arc::new(FakeChainClient::default());
        let hash = H256::repeat_byte(7);

        let waiter = {
            let chain = chain.clone();
            tokio::spawn(async move {
                wait_for_receipt(chain.as_ref(), hash, Duration::from_millis(1), None).await
            })
        };

        while chain.lookup_count() < 3 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert!(!waiter.is_finished());

        chain.publish(transfer_receipt(hash, addr(1), addr(2), addr(3), U256::from(1u64)));
        let receipt = waiter.await.unwrap().unwrap();
        assert_eq!(receipt.transaction_hash, hash);
    }

    #[tokio::test]
    async fn test_wait_for_receipt_times_out() {
        let chain = FakeChainClient::default();
        let err = wait_for_receipt(
            &chain,
            H256::repeat_byte(9),
            Duration::from_millis(1),
            Some(Duration::from_millis(20)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Chain(_)));
    }

    #[test]
    fn test_explorer_url() {
        assert_eq!(explorer_tx_url("0xabc"), "https://basescan.org/tx/0xabc");
    }
}
