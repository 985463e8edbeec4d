//! AMM Orchestrator
//!
//! Off-chain driver for a constant-product AMM application. It compiles the
//! contract programs through the node, creates the application, funds and
//! initializes its escrow, and submits liquidity operations as atomic groups.
//!
//! Every node interaction is a blocking call on a caller-held [`NodeClient`].
//! The reserve arithmetic lives in the on-chain program; this crate only
//! builds, signs, submits and confirms transactions.

pub mod amm;
pub mod compiler;
pub mod config;
pub mod confirm;
pub mod encoding;
pub mod error;
pub mod global_state;
pub mod http;
pub mod node;
pub mod types;
pub mod wallet;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use amm::{AmmParams, FundingPolicy, Orchestrator, PoolAssets};
pub use compiler::ContractPrograms;
pub use confirm::{wait_for_transaction, DEFAULT_TIMEOUT_ROUNDS};
pub use error::{Error, NodeError, Result};
pub use global_state::{GlobalState, PoolState, StateValue};
pub use http::AlgodClient;
pub use node::NodeClient;
pub use types::{
    app_address, Address, AppId, AssetId, AtomicGroup, GroupId, SignedTransaction,
    SuggestedParams, Transaction, TxId,
};
