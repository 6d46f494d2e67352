//! Pending-transaction-aware nonce tracking for concurrent EVM transaction submission.

use std::sync::Arc;

use alloy_network::Network;
use alloy_primitives::Address;
use alloy_provider::Provider;
use alloy_provider::fillers::NonceManager;
use alloy_transport::TransportResult;
use dashmap::DashMap;
use futures::lock::Mutex;

const NONCE_UNSET: u64 = u64::MAX;

/// Nonce manager that queries pending transactions for the initial nonce.
///
/// Unlike alloy's default `CachedNonceManager`, which uses the `latest`
/// transaction count, this manager queries with `.pending()` on first use,
/// which includes transactions still in the mempool. This prevents
/// "nonce too low" errors when the application restarts while transactions
/// are still pending.
///
/// - **First call per address**: queries with `.pending()` from RPC
/// - **Subsequent calls**: increments cached nonce locally
/// - **On failure**: [`reset_nonce`](Self::reset_nonce) forces re-query
#[derive(Clone, Debug, Default)]
pub struct PendingNonceManager {
    nonces: Arc<DashMap<Address, Arc<Mutex<u64>>>>,
}

#[cfg_attr(target_family = "wasm", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_family = "wasm"), async_trait::async_trait)]
impl NonceManager for PendingNonceManager {
    async fn get_next_nonce<P, N>(&self, provider: &P, address: Address) -> TransportResult<u64>
    where
        P: Provider<N>,
        N: Network,
    {
        let slot = {
            let entry = self
                .nonces
                .entry(address)
                .or_insert_with(|| Arc::new(Mutex::new(NONCE_UNSET)));
            Arc::clone(entry.value())
        };

        let mut nonce = slot.lock().await;
        let new_nonce = if *nonce == NONCE_UNSET {
            provider.get_transaction_count(address).pending().await?
        } else {
            *nonce + 1
        };
        *nonce = new_nonce;
        Ok(new_nonce)
    }
}

impl PendingNonceManager {
    /// Resets the cached nonce for an address, forcing a fresh RPC query on next use.
    ///
    /// Call this when a transaction fails, as the on-chain state may be
    /// uncertain (the transaction may or may not have reached the mempool).
    pub async fn reset_nonce(&self, address: Address) {
        if let Some(nonce_lock) = self.nonces.get(&address) {
            let mut nonce = nonce_lock.lock().await;
            *nonce = NONCE_UNSET;
        }
    }
}
