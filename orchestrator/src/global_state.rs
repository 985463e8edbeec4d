//! Typed view of an application's global state

use crate::error::{Error, NodeError, Result};
use crate::node::{NodeClient, TealKeyValue, TEAL_BYTES_TYPE, TEAL_UINT_TYPE};
use crate::types::{AppId, AssetId};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::collections::HashMap;

pub const TOKEN_A_KEY: &[u8] = b"token_a_key";
pub const TOKEN_B_KEY: &[u8] = b"token_b_key";
pub const POOL_TOKEN_KEY: &[u8] = b"pool_token_key";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateValue {
    Uint(u64),
    Bytes(Vec<u8>),
}

/// Decoded global state, keyed by raw key bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalState {
    entries: HashMap<Vec<u8>, StateValue>,
}

impl GlobalState {
    /// Decode the base64 key/value list returned by the node
    pub fn from_key_values(pairs: &[TealKeyValue]) -> std::result::Result<Self, NodeError> {
        let mut entries = HashMap::with_capacity(pairs.len());

        for pair in pairs {
            let key = BASE64
                .decode(&pair.key)
                .map_err(|e| NodeError::Decode(format!("global state key {}: {e}", pair.key)))?;

            let value = match pair.value.kind {
                TEAL_UINT_TYPE => StateValue::Uint(pair.value.uint),
                TEAL_BYTES_TYPE => StateValue::Bytes(BASE64.decode(&pair.value.bytes).map_err(
                    |e| NodeError::Decode(format!("global state value {}: {e}", pair.key)),
                )?),
                other => {
                    return Err(NodeError::Decode(format!(
                        "global state value {} has unknown type {other}",
                        pair.key
                    )))
                }
            };

            entries.insert(key, value);
        }

        Ok(Self { entries })
    }

    /// Read and decode the current global state of `app_id`
    pub fn fetch<C: NodeClient + ?Sized>(client: &C, app_id: AppId) -> Result<Self> {
        let info = client.application_info(app_id)?;
        Ok(Self::from_key_values(&info.params.global_state)?)
    }

    pub fn get(&self, key: &[u8]) -> Option<&StateValue> {
        self.entries.get(key)
    }

    pub fn uint(&self, key: &[u8]) -> Option<u64> {
        match self.entries.get(key)? {
            StateValue::Uint(v) => Some(*v),
            StateValue::Bytes(_) => None,
        }
    }

    pub fn bytes(&self, key: &[u8]) -> Option<&[u8]> {
        match self.entries.get(key)? {
            StateValue::Bytes(b) => Some(b),
            StateValue::Uint(_) => None,
        }
    }

    /// Asset id stored under `key`; zero means unset
    pub fn asset(&self, key: &[u8]) -> Option<AssetId> {
        self.uint(key).filter(|id| *id > 0)
    }

    /// Pool token created by the setup call
    pub fn pool_token(&self) -> Option<AssetId> {
        self.asset(POOL_TOKEN_KEY)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Asset ids of an initialized pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolState {
    pub token_a: AssetId,
    pub token_b: AssetId,
    pub pool_token: AssetId,
}

impl PoolState {
    pub fn from_global(app_id: AppId, state: &GlobalState) -> Result<Self> {
        let pool_token = state.pool_token().ok_or(Error::PoolTokenNotFound(app_id))?;
        let token_a = state.asset(TOKEN_A_KEY).ok_or_else(|| missing(TOKEN_A_KEY))?;
        let token_b = state.asset(TOKEN_B_KEY).ok_or_else(|| missing(TOKEN_B_KEY))?;

        Ok(Self {
            token_a,
            token_b,
            pool_token,
        })
    }
}

fn missing(key: &[u8]) -> Error {
    Error::Node(NodeError::Decode(format!(
        "global state has no {}",
        String::from_utf8_lossy(key)
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockNode;

    #[test]
    fn test_fetch_decodes_uints_and_bytes() {
        let node = MockNode::new()
            .with_global_uint("pool_token_key", 99)
            .with_global_bytes("creator_key", &[1, 2, 3]);

        let state = GlobalState::fetch(&node, 7).unwrap();

        assert_eq!(state.len(), 2);
        assert_eq!(state.pool_token(), Some(99));
        assert_eq!(state.bytes(b"creator_key"), Some(&[1u8, 2, 3][..]));
        assert_eq!(state.uint(b"creator_key"), None);
    }

    #[test]
    fn test_zero_pool_token_counts_as_unset() {
        let node = MockNode::new().with_global_uint("pool_token_key", 0);
        let state = GlobalState::fetch(&node, 7).unwrap();

        assert_eq!(state.uint(POOL_TOKEN_KEY), Some(0));
        assert_eq!(state.pool_token(), None);
    }

    #[test]
    fn test_invalid_base64_key_rejected() {
        let pairs = vec![TealKeyValue {
            key: "***".to_string(),
            value: Default::default(),
        }];
        assert!(matches!(
            GlobalState::from_key_values(&pairs),
            Err(NodeError::Decode(_))
        ));
    }

    #[test]
    fn test_pool_state_requires_all_assets() {
        let node = MockNode::new()
            .with_global_uint("token_a_key", 10)
            .with_global_uint("token_b_key", 20)
            .with_global_uint("pool_token_key", 30);
        let state = GlobalState::fetch(&node, 5).unwrap();

        let pool = PoolState::from_global(5, &state).unwrap();
        assert_eq!(
            pool,
            PoolState {
                token_a: 10,
                token_b: 20,
                pool_token: 30
            }
        );

        let empty = GlobalState::default();
        assert!(matches!(
            PoolState::from_global(5, &empty),
            Err(Error::PoolTokenNotFound(5))
        ));
    }
}
