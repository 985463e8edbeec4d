//! In-memory node for tests
//!
//! Rounds advance only when the waiter asks for the next block, so confirmation
//! timing is fully scripted.

use crate::error::NodeError;
use crate::node::{
    ApplicationInfo, ApplicationParams, NodeClient, NodeStatus, PendingTransactionInfo,
    TealKeyValue, TealValue, TEAL_BYTES_TYPE, TEAL_UINT_TYPE,
};
use crate::types::{AppId, SignedTransaction, SuggestedParams, TransactionKind, TxId};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Simulated node
pub struct MockNode {
    round: Cell<u64>,
    confirm_on_poll: Option<u32>,
    pool_error: Option<String>,
    compile_error: Option<String>,
    status_fails: bool,
    application_index: Option<u64>,
    global_state: Vec<TealKeyValue>,
    polls: RefCell<HashMap<TxId, u32>>,
    submitted: RefCell<Vec<Vec<SignedTransaction>>>,
    compiled: RefCell<Vec<String>>,
}

impl Default for MockNode {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNode {
    pub const START_ROUND: u64 = 1_000;
    pub const APP_ID: AppId = 4_242;
    pub const FEE: u64 = 1_000;

    /// Node that confirms every transaction on the first poll
    pub fn new() -> Self {
        Self {
            round: Cell::new(Self::START_ROUND),
            confirm_on_poll: Some(1),
            pool_error: None,
            compile_error: None,
            status_fails: false,
            application_index: Some(Self::APP_ID),
            global_state: Vec::new(),
            polls: RefCell::new(HashMap::new()),
            submitted: RefCell::new(Vec::new()),
            compiled: RefCell::new(Vec::new()),
        }
    }

    /// Start the chain at `round` instead of [`Self::START_ROUND`]
    pub fn at_round(self, round: u64) -> Self {
        self.round.set(round);
        self
    }

    /// Confirm each transaction on its `n`th poll
    pub fn confirm_on_poll(mut self, n: u32) -> Self {
        self.confirm_on_poll = Some(n);
        self
    }

    pub fn never_confirm(mut self) -> Self {
        self.confirm_on_poll = None;
        self
    }

    /// Report a pool error for every transaction
    pub fn reject_with(mut self, reason: &str) -> Self {
        self.pool_error = Some(reason.to_string());
        self
    }

    pub fn fail_compile(mut self, message: &str) -> Self {
        self.compile_error = Some(message.to_string());
        self
    }

    pub fn fail_status(mut self) -> Self {
        self.status_fails = true;
        self
    }

    /// Application index reported when a creation transaction confirms
    pub fn assign_application_index(mut self, index: Option<u64>) -> Self {
        self.application_index = index;
        self
    }

    pub fn with_global_uint(mut self, key: &str, value: u64) -> Self {
        self.global_state.push(TealKeyValue {
            key: BASE64.encode(key),
            value: TealValue {
                kind: TEAL_UINT_TYPE,
                bytes: String::new(),
                uint: value,
            },
        });
        self
    }

    pub fn with_global_bytes(mut self, key: &str, value: &[u8]) -> Self {
        self.global_state.push(TealKeyValue {
            key: BASE64.encode(key),
            value: TealValue {
                kind: TEAL_BYTES_TYPE,
                bytes: BASE64.encode(value),
                uint: 0,
            },
        });
        self
    }

    pub fn current_round(&self) -> u64 {
        self.round.get()
    }

    pub fn poll_count(&self, txid: &TxId) -> u32 {
        self.polls.borrow().get(txid).copied().unwrap_or(0)
    }

    /// Every submission, one entry per send call
    pub fn submitted(&self) -> Vec<Vec<SignedTransaction>> {
        self.submitted.borrow().clone()
    }

    pub fn compiled_sources(&self) -> Vec<String> {
        self.compiled.borrow().clone()
    }

    fn find_submitted(&self, txid: &TxId) -> Option<SignedTransaction> {
        self.submitted
            .borrow()
            .iter()
            .flatten()
            .find(|stx| stx.txid == *txid)
            .cloned()
    }

    fn accept(&self, txns: &[SignedTransaction]) -> Result<TxId, NodeError> {
        let first = txns.first().ok_or_else(|| NodeError::Api {
            status: 400,
            message: "empty submission".to_string(),
        })?;

        if let Some(bad) = txns.iter().find(|stx| !stx.verify()) {
            return Err(NodeError::Api {
                status: 400,
                message: format!("invalid signature on {}", bad.txid),
            });
        }

        if txns.len() > 1 {
            let group = first.txn.group;
            if group.is_none() || txns.iter().any(|stx| stx.txn.group != group) {
                return Err(NodeError::Api {
                    status: 400,
                    message: "incomplete group".to_string(),
                });
            }
        }

        self.submitted.borrow_mut().push(txns.to_vec());
        Ok(first.txid)
    }
}

impl NodeClient for MockNode {
    fn compile(&self, source: &str) -> Result<Vec<u8>, NodeError> {
        if let Some(message) = &self.compile_error {
            return Err(NodeError::Api {
                status: 400,
                message: message.clone(),
            });
        }
        self.compiled.borrow_mut().push(source.to_string());
        Ok(source.as_bytes().to_vec())
    }

    fn suggested_params(&self) -> Result<SuggestedParams, NodeError> {
        let round = self.round.get();
        Ok(SuggestedParams {
            fee: Self::FEE,
            first_valid: round,
            last_valid: round.saturating_add(1_000),
            genesis_id: "mocknet-v1".to_string(),
            genesis_hash: [8u8; 32],
        })
    }

    fn send_transaction(&self, txn: &SignedTransaction) -> Result<TxId, NodeError> {
        self.accept(std::slice::from_ref(txn))
    }

    fn send_transactions(&self, txns: &[SignedTransaction]) -> Result<TxId, NodeError> {
        self.accept(txns)
    }

    fn status(&self) -> Result<NodeStatus, NodeError> {
        if self.status_fails {
            return Err(NodeError::Api {
                status: 503,
                message: "node catching up".to_string(),
            });
        }
        Ok(NodeStatus {
            last_round: self.round.get(),
        })
    }

    fn status_after_block(&self, round: u64) -> Result<NodeStatus, NodeError> {
        self.round.set(self.round.get().max(round));
        self.status()
    }

    fn pending_transaction_info(&self, txid: &TxId) -> Result<PendingTransactionInfo, NodeError> {
        let polls = {
            let mut polls = self.polls.borrow_mut();
            let count = polls.entry(*txid).or_insert(0);
            *count += 1;
            *count
        };

        if let Some(reason) = &self.pool_error {
            return Ok(PendingTransactionInfo {
                pool_error: reason.clone(),
                ..Default::default()
            });
        }

        match self.confirm_on_poll {
            Some(n) if polls >= n => {
                let creates_app = matches!(
                    self.find_submitted(txid).map(|stx| stx.txn.kind),
                    Some(TransactionKind::ApplicationCall(call)) if call.app_id == 0
                );
                Ok(PendingTransactionInfo {
                    confirmed_round: Some(self.round.get()),
                    application_index: if creates_app {
                        self.application_index
                    } else {
                        None
                    },
                    ..Default::default()
                })
            }
            _ => Ok(PendingTransactionInfo::default()),
        }
    }

    fn application_info(&self, app_id: AppId) -> Result<ApplicationInfo, NodeError> {
        Ok(ApplicationInfo {
            id: app_id,
            params: ApplicationParams {
                global_state: self.global_state.clone(),
            },
        })
    }
}
