//! REST client for the node API

use crate::error::{Error, NodeError};
use crate::node::{ApplicationInfo, NodeClient, NodeStatus, PendingTransactionInfo};
use crate::types::{AppId, SignedTransaction, SuggestedParams, TxId};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const API_TOKEN_HEADER: &str = "X-Algo-API-Token";

/// Rounds a suggested transaction stays valid for
const VALIDITY_WINDOW: u64 = 1_000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking HTTP client for a node's v2 REST API
pub struct AlgodClient {
    http: Client,
    base_url: String,
    api_token: String,
}

#[derive(Deserialize)]
struct CompileResponse {
    result: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TransactionParamsResponse {
    fee: u64,
    min_fee: u64,
    last_round: u64,
    genesis_id: String,
    genesis_hash: String,
}

impl TransactionParamsResponse {
    fn into_params(self) -> Result<SuggestedParams, NodeError> {
        Ok(SuggestedParams {
            fee: self.fee.max(self.min_fee),
            first_valid: self.last_round,
            last_valid: self.last_round + VALIDITY_WINDOW,
            genesis_hash: decode_hash(&self.genesis_hash)?,
            genesis_id: self.genesis_id,
        })
    }
}

#[derive(Deserialize)]
struct SubmitResponse {
    #[serde(rename = "txId")]
    tx_id: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    message: String,
}

impl AlgodClient {
    pub fn new(base_url: &str, api_token: &str) -> Result<Self, NodeError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(http, base_url, api_token))
    }

    /// Use a preconfigured HTTP client
    pub fn with_client(http: Client, base_url: &str, api_token: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, NodeError> {
        let response = request.header(API_TOKEN_HEADER, &self.api_token).send()?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(NodeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text()?;
        serde_json::from_str(&body).map_err(|e| NodeError::Decode(e.to_string()))
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, NodeError> {
        log::debug!("GET {}", path);
        self.execute(self.http.get(self.url(path)))
    }

    fn post_raw<T: DeserializeOwned>(
        &self,
        path: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<T, NodeError> {
        log::debug!("POST {} ({} bytes)", path, body.len());
        self.execute(
            self.http
                .post(self.url(path))
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(body),
        )
    }

    fn submit(&self, txns: &[SignedTransaction]) -> Result<TxId, NodeError> {
        let mut body = Vec::new();
        for txn in txns {
            let bytes = txn
                .to_bytes()
                .map_err(|e| NodeError::Encode(e.to_string()))?;
            body.extend_from_slice(&bytes);
        }

        let response: SubmitResponse =
            self.post_raw("/v2/transactions", "application/x-binary", body)?;
        parse_txid(&response.tx_id)
    }
}

fn parse_txid(raw: &str) -> Result<TxId, NodeError> {
    raw.parse().map_err(|e: Error| NodeError::Decode(e.to_string()))
}

fn decode_hash(raw: &str) -> Result<[u8; 32], NodeError> {
    let bytes = BASE64
        .decode(raw)
        .map_err(|e| NodeError::Decode(format!("genesis hash: {e}")))?;
    let array: [u8; 32] = bytes
        .try_into()
        .map_err(|_| NodeError::Decode("genesis hash is not 32 bytes".to_string()))?;
    Ok(array)
}

impl NodeClient for AlgodClient {
    fn compile(&self, source: &str) -> Result<Vec<u8>, NodeError> {
        let response: CompileResponse = self.post_raw(
            "/v2/teal/compile",
            "text/plain",
            source.as_bytes().to_vec(),
        )?;

        BASE64
            .decode(response.result)
            .map_err(|e| NodeError::Decode(format!("compiled program: {e}")))
    }

    fn suggested_params(&self) -> Result<SuggestedParams, NodeError> {
        let response: TransactionParamsResponse = self.get("/v2/transactions/params")?;
        response.into_params()
    }

    fn send_transaction(&self, txn: &SignedTransaction) -> Result<TxId, NodeError> {
        self.submit(std::slice::from_ref(txn))
    }

    fn send_transactions(&self, txns: &[SignedTransaction]) -> Result<TxId, NodeError> {
        self.submit(txns)
    }

    fn status(&self) -> Result<NodeStatus, NodeError> {
        self.get("/v2/status")
    }

    fn status_after_block(&self, round: u64) -> Result<NodeStatus, NodeError> {
        self.get(&format!("/v2/status/wait-for-block-after/{round}"))
    }

    fn pending_transaction_info(&self, txid: &TxId) -> Result<PendingTransactionInfo, NodeError> {
        self.get(&format!("/v2/transactions/pending/{txid}?format=json"))
    }

    fn application_info(&self, app_id: AppId) -> Result<ApplicationInfo, NodeError> {
        self.get(&format!("/v2/applications/{app_id}"))
    }
}
