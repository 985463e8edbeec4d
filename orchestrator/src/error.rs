//! Error types for the orchestrator

use crate::types::{AppId, TxId};
use thiserror::Error;

/// Failures raised by a [`NodeClient`](crate::NodeClient) implementation.
#[derive(Error, Debug)]
pub enum NodeError {
    /// The request never produced a response
    #[error("Node transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The node answered with a non-success status
    #[error("Node returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body could not be decoded
    #[error("Malformed node response: {0}")]
    Decode(String),

    /// A request body could not be encoded
    #[error("Failed to encode request: {0}")]
    Encode(String),
}

/// Orchestrator error type
#[derive(Error, Debug)]
pub enum Error {
    /// The node dropped the transaction from its pool
    #[error("Pool error: {reason}")]
    PoolRejected { txid: TxId, reason: String },

    /// No confirmation or rejection within the round budget
    #[error("Transaction {txid} not confirmed after {rounds} rounds")]
    Timeout { txid: TxId, rounds: u64 },

    /// Compile, submit and status failures, passed through as-is
    #[error(transparent)]
    Node(#[from] NodeError),

    /// Application creation confirmed without a usable app index
    #[error("Transaction {0} confirmed without a positive application index")]
    MissingApplicationIndex(TxId),

    /// Setup finished but the pool token key is absent from global state
    #[error("Pool token not found in global state of application {0}")]
    PoolTokenNotFound(AppId),

    /// Program source declares a different version than requested
    #[error("Program version mismatch: expected {expected}, source declares {found}")]
    ProgramVersionMismatch { expected: u8, found: String },

    /// Group size out of bounds
    #[error("Invalid atomic group: {0}")]
    InvalidGroup(String),

    /// Canonical transaction bytes could not be produced
    #[error("Transaction encoding failed: {0}")]
    Encoding(#[from] rmp_serde::encode::Error),

    /// An address or id string is not valid base32 or fails its checksum
    #[error("Invalid {kind}: {reason}")]
    InvalidIdentifier { kind: &'static str, reason: String },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_txid_and_rounds() {
        let txid = TxId([7u8; 32]);
        let err = Error::Timeout { txid, rounds: 10 };
        let msg = err.to_string();

        assert!(msg.contains(&txid.to_string()));
        assert!(msg.ends_with("after 10 rounds"));
    }

    #[test]
    fn test_node_error_is_transparent() {
        let err: Error = NodeError::Api {
            status: 400,
            message: "bad program".to_string(),
        }
        .into();

        assert_eq!(err.to_string(), "Node returned 400: bad program");
    }
}
