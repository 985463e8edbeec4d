//! Confirmation polling
//!
//! Polls the node once per round until the transaction is committed, evicted
//! from the pool, or the round budget runs out. There is no backoff: the node's
//! wait-for-block call paces the loop.

use crate::error::{Error, Result};
use crate::node::{NodeClient, PendingTransactionInfo};
use crate::types::TxId;

/// Rounds to wait before giving up on a transaction
pub const DEFAULT_TIMEOUT_ROUNDS: u64 = 10;

/// Wait until `txid` is confirmed.
///
/// Fails with [`Error::PoolRejected`] as soon as the node reports a pool error,
/// and with [`Error::Timeout`] after `timeout_rounds` polls without an outcome.
pub fn wait_for_transaction<C: NodeClient + ?Sized>(
    client: &C,
    txid: &TxId,
    timeout_rounds: u64,
) -> Result<PendingTransactionInfo> {
    let mut last_round = client.status()?.last_round;

    for _ in 0..timeout_rounds {
        let pending = client.pending_transaction_info(txid)?;

        if pending.is_confirmed() {
            log::debug!(
                "Transaction {} confirmed in round {}",
                txid,
                pending.confirmed_round.unwrap_or_default()
            );
            return Ok(pending);
        }

        if pending.is_rejected() {
            log::warn!("Transaction {} rejected: {}", txid, pending.pool_error);
            return Err(Error::PoolRejected {
                txid: *txid,
                reason: pending.pool_error,
            });
        }

        log::debug!("Transaction {} pending at round {}", txid, last_round);
        last_round = last_round.saturating_add(1);
        client.status_after_block(last_round)?;
    }

    log::warn!(
        "Transaction {} not confirmed after {} rounds",
        txid,
        timeout_rounds
    );
    Err(Error::Timeout {
        txid: *txid,
        rounds: timeout_rounds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockNode;
    use proptest::prelude::*;

    fn txid() -> TxId {
        TxId([1u8; 32])
    }

    #[test]
    fn test_never_confirmed_times_out_after_budget() {
        let node = MockNode::new().never_confirm();
        let err = wait_for_transaction(&node, &txid(), DEFAULT_TIMEOUT_ROUNDS).unwrap_err();

        assert!(matches!(err, Error::Timeout { rounds: 10, .. }));
        assert_eq!(node.poll_count(&txid()), 10);
        assert_eq!(node.current_round(), MockNode::START_ROUND + 10);
    }

    #[test]
    fn test_pool_error_fails_on_first_poll() {
        let node = MockNode::new().reject_with("overspend");
        let err = wait_for_transaction(&node, &txid(), DEFAULT_TIMEOUT_ROUNDS).unwrap_err();

        match err {
            Error::PoolRejected { reason, .. } => assert_eq!(reason, "overspend"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(node.poll_count(&txid()), 1);
        assert_eq!(node.current_round(), MockNode::START_ROUND);
    }

    #[test]
    fn test_confirmed_on_third_poll() {
        let node = MockNode::new().confirm_on_poll(3);
        let info = wait_for_transaction(&node, &txid(), DEFAULT_TIMEOUT_ROUNDS).unwrap();

        assert!(info.is_confirmed());
        assert_eq!(node.poll_count(&txid()), 3);
    }

    #[test]
    fn test_zero_budget_never_polls() {
        let node = MockNode::new();
        let err = wait_for_transaction(&node, &txid(), 0).unwrap_err();

        assert!(matches!(err, Error::Timeout { rounds: 0, .. }));
        assert_eq!(node.poll_count(&txid()), 0);
    }

    #[test]
    fn test_unbounded_budget_near_round_limit() {
        let node = MockNode::new().at_round(u64::MAX - 1).confirm_on_poll(3);
        let info = wait_for_transaction(&node, &txid(), u64::MAX).unwrap();

        assert!(info.is_confirmed());
        assert_eq!(node.poll_count(&txid()), 3);
        assert_eq!(node.current_round(), u64::MAX);
    }

    #[test]
    fn test_status_failure_propagates() {
        let node = MockNode::new().fail_status();
        let err = wait_for_transaction(&node, &txid(), 5).unwrap_err();
        assert!(matches!(err, Error::Node(_)));
    }

    proptest! {
        #[test]
        fn prop_confirmation_polls_at_most_n_times(n in 1u32..20, budget in 1u64..30) {
            let node = MockNode::new().confirm_on_poll(n);
            let result = wait_for_transaction(&node, &txid(), budget);

            if (n as u64) <= budget {
                prop_assert!(result.is_ok());
                prop_assert_eq!(node.poll_count(&txid()), n);
            } else {
                let timed_out = matches!(result, Err(Error::Timeout { .. }));
                prop_assert!(timed_out);
                prop_assert_eq!(node.poll_count(&txid()) as u64, budget);
            }
        }
    }
}
