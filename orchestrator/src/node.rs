//! Node boundary
//!
//! The orchestrator talks to a single remote node through [`NodeClient`].
//! Every method is a blocking request/response call.

use crate::error::NodeError;
use crate::types::{AppId, SignedTransaction, SuggestedParams, TxId};
use serde::{Deserialize, Serialize};

/// Remote node API used by the orchestrator
pub trait NodeClient {
    /// Compile program source text to bytecode
    fn compile(&self, source: &str) -> Result<Vec<u8>, NodeError>;

    /// Fee, validity window and genesis hash for new transactions
    fn suggested_params(&self) -> Result<SuggestedParams, NodeError>;

    /// Submit one signed transaction
    fn send_transaction(&self, txn: &SignedTransaction) -> Result<TxId, NodeError>;

    /// Submit a signed atomic group in order. Returns the id of the first member.
    fn send_transactions(&self, txns: &[SignedTransaction]) -> Result<TxId, NodeError>;

    /// Current node status
    fn status(&self) -> Result<NodeStatus, NodeError>;

    /// Block until `round` has closed, then report status
    fn status_after_block(&self, round: u64) -> Result<NodeStatus, NodeError>;

    /// Pool or ledger view of a submitted transaction
    fn pending_transaction_info(&self, txid: &TxId) -> Result<PendingTransactionInfo, NodeError>;

    /// Application parameters including global state
    fn application_info(&self, app_id: AppId) -> Result<ApplicationInfo, NodeError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeStatus {
    pub last_round: u64,
}

/// Node-reported outcome of a submitted transaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PendingTransactionInfo {
    /// Round the transaction was committed in; absent or 0 while pending
    #[serde(default)]
    pub confirmed_round: Option<u64>,

    /// Non-empty when the node evicted the transaction from its pool
    #[serde(default)]
    pub pool_error: String,

    /// Set for application creation transactions
    #[serde(default)]
    pub application_index: Option<u64>,

    /// Set for asset creation transactions
    #[serde(default)]
    pub asset_index: Option<u64>,
}

impl PendingTransactionInfo {
    pub fn is_confirmed(&self) -> bool {
        self.confirmed_round.unwrap_or(0) > 0
    }

    pub fn is_rejected(&self) -> bool {
        !self.pool_error.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApplicationInfo {
    pub id: AppId,
    #[serde(default)]
    pub params: ApplicationParams,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApplicationParams {
    #[serde(default)]
    pub global_state: Vec<TealKeyValue>,
}

/// One global state entry; `key` and byte values are base64 encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TealKeyValue {
    pub key: String,
    pub value: TealValue,
}

pub const TEAL_BYTES_TYPE: u8 = 1;
pub const TEAL_UINT_TYPE: u8 = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TealValue {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub bytes: String,
    #[serde(default)]
    pub uint: u64,
}
