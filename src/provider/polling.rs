use std::{sync::Arc, time::Duration};

use serde_json::{Value, json};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tokio_util::sync::CancellationToken;

use crate::{ProviderError, Result, provider::RpcApi};

// Beyond this many missed blocks only the newest ones are emitted
const MAX_CATCH_UP: u64 = 64;
const CHANNEL_CAPACITY: usize = 128;
const MIN_POLLING_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockUpdate {
    Number(u64),
    Hash(String),
}

/// A running block subscription. Dropping it stops the background task.
#[derive(Debug)]
pub struct BlockSubscription {
    updates: mpsc::Receiver<BlockUpdate>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl BlockSubscription {
    pub async fn next(&mut self) -> Option<BlockUpdate> {
        self.updates.recv().await
    }

    /// Like [`next`](Self::next) but treats a finished subscription as an error.
    pub async fn expect_next(&mut self) -> Result<BlockUpdate> {
        self.next().await.ok_or(ProviderError::SubscriptionClosed)
    }

    /// Stops polling and waits for the background task, including filter cleanup.
    pub async fn unsubscribe(mut self) {
        self.cancel.cancel();
        // Unblocks a task waiting on a full channel
        self.updates.close();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for BlockSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Subscribes to new blocks on `provider`.
///
/// Providers created with `polling` poll `eth_blockNumber` and yield numbers;
/// others install a block filter and yield hashes from `eth_getFilterChanges`.
pub async fn subscribe_blocks(provider: Arc<dyn RpcApi>) -> Result<BlockSubscription> {
    let options = provider.core().options().clone();
    // tokio intervals panic on a zero period
    let period = options.polling_interval.max(MIN_POLLING_INTERVAL);
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let cancel = CancellationToken::new();

    let handle = if options.polling {
        tokio::spawn(poll_block_numbers(provider, period, tx, cancel.clone()))
    } else {
        let filter_id = provider.send("eth_newBlockFilter", json!([])).await?;
        tokio::spawn(poll_block_filter(provider, filter_id, period, tx, cancel.clone()))
    };

    Ok(BlockSubscription {
        updates: rx,
        cancel,
        handle: Some(handle),
    })
}

async fn poll_block_numbers(
    provider: Arc<dyn RpcApi>,
    period: Duration,
    tx: mpsc::Sender<BlockUpdate>,
    cancel: CancellationToken,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last: Option<u64> = None;

    loop {
        let polled = tokio::select! {
            _ = cancel.cancelled() => break,
            polled = async {
                ticker.tick().await;
                provider.get_block_number().await
            } => polled,
        };

        let current = match polled {
            Ok(number) => number,
            Err(e) => {
                tracing::warn!(network = %provider.core().network().name, error = %e, "Block number poll failed");
                continue;
            }
        };

        let start = match last {
            None => current,
            Some(previous) if current <= previous => continue,
            Some(previous) => (previous + 1).max(current.saturating_sub(MAX_CATCH_UP - 1)),
        };

        for number in start..=current {
            if tx.send(BlockUpdate::Number(number)).await.is_err() {
                return;
            }
        }
        last = Some(current);
    }
}

async fn poll_block_filter(
    provider: Arc<dyn RpcApi>,
    filter_id: Value,
    period: Duration,
    tx: mpsc::Sender<BlockUpdate>,
    cancel: CancellationToken,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let polled = tokio::select! {
            _ = cancel.cancelled() => break,
            polled = async {
                ticker.tick().await;
                provider.send("eth_getFilterChanges", json!([filter_id])).await
            } => polled,
        };

        let hashes = match polled {
            Ok(Value::Array(hashes)) => hashes,
            Ok(other) => {
                tracing::warn!(response = %other, "Unexpected eth_getFilterChanges response");
                continue;
            }
            Err(e) => {
                tracing::warn!(network = %provider.core().network().name, error = %e, "Block filter poll failed");
                continue;
            }
        };

        for hash in hashes.into_iter().filter_map(|hash| hash.as_str().map(str::to_string)) {
            if tx.send(BlockUpdate::Hash(hash)).await.is_err() {
                cancel.cancel();
                break;
            }
        }
        if cancel.is_cancelled() {
            break;
        }
    }

    if let Err(e) = provider.send("eth_uninstallFilter", json!([filter_id])).await {
        tracing::debug!(error = %e, "Failed to uninstall block filter");
    }
}
