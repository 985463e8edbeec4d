//! AMM Orchestrator Integration Tests
//!
//! Runs the full deployment and liquidity flow against the in-memory node.
//! Nothing here needs a running network.

pub use amm_orchestrator::testing::MockNode;

/// Approval program used by the flow tests
pub const APPROVAL_SOURCE: &str =
    "txn ApplicationID\nint 0\n==\nbnz create\nint 1\nreturn\ncreate:\nint 1\nreturn";

/// Clear-state program used by the flow tests
pub const CLEAR_SOURCE: &str = "int 1\nreturn";

/// Node pre-loaded with the global state a successful setup leaves behind
pub fn initialized_pool_node(token_a: u64, token_b: u64, pool_token: u64) -> MockNode {
    MockNode::new()
        .with_global_uint("token_a_key", token_a)
        .with_global_uint("token_b_key", token_b)
        .with_global_uint("pool_token_key", pool_token)
}
