//! Transaction model
//!
//! Transactions are built from node-supplied [`SuggestedParams`], optionally
//! bound into an [`AtomicGroup`], and signed with an ed25519 [`Keypair`].
//! Transaction and group ids are SHA-512/256 digests over the canonical msgpack
//! bytes produced by [`crate::encoding`].

use crate::encoding;
use crate::error::{Error, Result};
use data_encoding::BASE32_NOPAD;
use sha2::{Digest, Sha512_256};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
};
use std::fmt;
use std::str::FromStr;

/// Asset (token) identifier
pub type AssetId = u64;

/// Application identifier, assigned by the node on creation
pub type AppId = u64;

/// Largest number of transactions the node accepts in one group
pub const MAX_GROUP_SIZE: usize = 16;

const TXID_PREFIX: &[u8] = b"TX";
const GROUP_PREFIX: &[u8] = b"TG";
const APP_ADDRESS_PREFIX: &[u8] = b"appID";
const CHECKSUM_LEN: usize = 4;

fn sha512_256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha512_256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

fn decode_base32(kind: &'static str, raw: &str, len: usize) -> Result<Vec<u8>> {
    let bytes = BASE32_NOPAD
        .decode(raw.as_bytes())
        .map_err(|e| Error::InvalidIdentifier {
            kind,
            reason: format!("{raw}: {e}"),
        })?;
    if bytes.len() != len {
        return Err(Error::InvalidIdentifier {
            kind,
            reason: format!("{raw}: decodes to {} bytes, expected {len}", bytes.len()),
        });
    }
    Ok(bytes)
}

/// Account address: a 32-byte ed25519 public key.
///
/// The text form is base32 (no padding) over the key followed by the last four
/// bytes of its SHA-512/256 digest, 58 characters in all.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 32]);

impl Address {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Address that signs for `keypair`
    pub fn of(keypair: &Keypair) -> Self {
        Self::from(keypair.pubkey())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    fn checksum(&self) -> [u8; CHECKSUM_LEN] {
        let digest = sha512_256(&[&self.0]);
        let mut checksum = [0u8; CHECKSUM_LEN];
        checksum.copy_from_slice(&digest[32 - CHECKSUM_LEN..]);
        checksum
    }
}

impl From<Pubkey> for Address {
    fn from(pubkey: Pubkey) -> Self {
        Self(pubkey.to_bytes())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut raw = [0u8; 32 + CHECKSUM_LEN];
        raw[..32].copy_from_slice(&self.0);
        raw[32..].copy_from_slice(&self.checksum());
        f.write_str(&BASE32_NOPAD.encode(&raw))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let raw = decode_base32("address", s, 32 + CHECKSUM_LEN)?;
        let mut key = [0u8; 32];
        key.copy_from_slice(&raw[..32]);
        let address = Self(key);

        if raw[32..] != address.checksum() {
            return Err(Error::InvalidIdentifier {
                kind: "address",
                reason: format!("{s}: checksum mismatch"),
            });
        }
        Ok(address)
    }
}

/// Escrow address controlled by an application
pub fn app_address(app_id: AppId) -> Address {
    Address(sha512_256(&[APP_ADDRESS_PREFIX, &app_id.to_be_bytes()]))
}

/// Transaction identifier, shown as 52 base32 characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxId(pub [u8; 32]);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&BASE32_NOPAD.encode(&self.0))
    }
}

impl FromStr for TxId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let raw = decode_base32("transaction id", s, 32)?;
        let mut id = [0u8; 32];
        id.copy_from_slice(&raw);
        Ok(Self(id))
    }
}

/// Identifier shared by every member of an atomic group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub [u8; 32]);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&BASE32_NOPAD.encode(&self.0))
    }
}

/// Network parameters the node suggests for new transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedParams {
    /// Flat fee in micro-units
    pub fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    pub genesis_hash: [u8; 32],
}

/// Storage an application reserves for its state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateSchema {
    pub num_uints: u64,
    pub num_byte_slices: u64,
}

impl StateSchema {
    pub fn new(num_uints: u64, num_byte_slices: u64) -> Self {
        Self {
            num_uints,
            num_byte_slices,
        }
    }
}

/// Action taken after an application call runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnComplete {
    #[default]
    NoOp,
    OptIn,
    CloseOut,
    ClearState,
    UpdateApplication,
    DeleteApplication,
}

/// Application call payload. `app_id == 0` creates a new application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationCall {
    pub app_id: AppId,
    pub on_complete: OnComplete,
    pub app_args: Vec<Vec<u8>>,
    pub foreign_assets: Vec<AssetId>,
    pub approval_program: Vec<u8>,
    pub clear_program: Vec<u8>,
    pub global_schema: StateSchema,
    pub local_schema: StateSchema,
}

/// What a transaction does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionKind {
    Payment {
        receiver: Address,
        amount: u64,
    },
    AssetTransfer {
        asset_id: AssetId,
        receiver: Address,
        amount: u64,
    },
    ApplicationCall(ApplicationCall),
}

/// Unsigned transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub sender: Address,
    pub fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    pub genesis_hash: [u8; 32],
    pub group: Option<GroupId>,
    pub kind: TransactionKind,
}

impl Transaction {
    fn with_params(sender: Address, params: &SuggestedParams, kind: TransactionKind) -> Self {
        Self {
            sender,
            fee: params.fee,
            first_valid: params.first_valid,
            last_valid: params.last_valid,
            genesis_id: params.genesis_id.clone(),
            genesis_hash: params.genesis_hash,
            group: None,
            kind,
        }
    }

    /// Native currency payment
    pub fn payment(
        sender: Address,
        receiver: Address,
        amount: u64,
        params: &SuggestedParams,
    ) -> Self {
        Self::with_params(sender, params, TransactionKind::Payment { receiver, amount })
    }

    /// Asset transfer
    pub fn asset_transfer(
        sender: Address,
        receiver: Address,
        asset_id: AssetId,
        amount: u64,
        params: &SuggestedParams,
    ) -> Self {
        Self::with_params(
            sender,
            params,
            TransactionKind::AssetTransfer {
                asset_id,
                receiver,
                amount,
            },
        )
    }

    /// Zero-amount transfer to self, registering the sender as a holder of `asset_id`
    pub fn asset_opt_in(sender: Address, asset_id: AssetId, params: &SuggestedParams) -> Self {
        Self::asset_transfer(sender, sender, asset_id, 0, params)
    }

    /// Application call (or creation when `call.app_id` is 0)
    pub fn application_call(
        sender: Address,
        call: ApplicationCall,
        params: &SuggestedParams,
    ) -> Self {
        Self::with_params(sender, params, TransactionKind::ApplicationCall(call))
    }

    /// `TX` followed by the canonical msgpack encoding; this is what gets signed
    pub fn bytes_to_sign(&self) -> Result<Vec<u8>> {
        let mut bytes = TXID_PREFIX.to_vec();
        bytes.extend(encoding::encode_transaction(self)?);
        Ok(bytes)
    }

    /// Digest of the signed bytes
    pub fn id(&self) -> Result<TxId> {
        Ok(TxId(sha512_256(&[self.bytes_to_sign()?.as_slice()])))
    }

    pub fn sign(&self, keypair: &Keypair) -> Result<SignedTransaction> {
        let bytes = self.bytes_to_sign()?;
        let signature = keypair.sign_message(&bytes);
        let txid = TxId(sha512_256(&[bytes.as_slice()]));

        Ok(SignedTransaction {
            txn: self.clone(),
            signature,
            txid,
        })
    }
}

/// Transaction ready for submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub txn: Transaction,
    pub signature: Signature,
    pub txid: TxId,
}

impl SignedTransaction {
    pub fn txid(&self) -> TxId {
        self.txid
    }

    /// Msgpack `{sig, txn}` map sent to the node
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encoding::encode_signed(&self.txn, &self.signature)
    }

    /// Check the signature against the sender address
    pub fn verify(&self) -> bool {
        match self.txn.bytes_to_sign() {
            Ok(bytes) => self.signature.verify(self.txn.sender.as_bytes(), &bytes),
            Err(_) => false,
        }
    }
}

/// Ordered transactions that commit or fail together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomicGroup {
    id: GroupId,
    txns: Vec<Transaction>,
}

impl AtomicGroup {
    /// Compute the group id from the members and stamp it on each of them
    pub fn new(mut txns: Vec<Transaction>) -> Result<Self> {
        if txns.is_empty() {
            return Err(Error::InvalidGroup("group has no transactions".to_string()));
        }
        if txns.len() > MAX_GROUP_SIZE {
            return Err(Error::InvalidGroup(format!(
                "group has {} transactions, limit is {}",
                txns.len(),
                MAX_GROUP_SIZE
            )));
        }

        let mut ids = Vec::with_capacity(txns.len());
        for txn in txns.iter_mut() {
            txn.group = None;
            ids.push(txn.id()?);
        }

        let txlist = encoding::encode_group(&ids)?;
        let id = GroupId(sha512_256(&[GROUP_PREFIX, txlist.as_slice()]));

        for txn in txns.iter_mut() {
            txn.group = Some(id);
        }

        Ok(Self { id, txns })
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.txns
    }

    pub fn len(&self) -> usize {
        self.txns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txns.is_empty()
    }

    /// Sign every member with the same key, preserving order
    pub fn sign(&self, keypair: &Keypair) -> Result<Vec<SignedTransaction>> {
        self.txns.iter().map(|txn| txn.sign(keypair)).collect()
    }
}

/// Genesis hash of the public test network
#[cfg(test)]
pub(crate) const TESTNET_GENESIS_HASH: [u8; 32] = [
    72, 99, 181, 24, 164, 179, 200, 78, 200, 16, 242, 45, 79, 16, 129, 203, 15, 113, 240, 89, 167,
    172, 32, 222, 198, 47, 127, 112, 229, 9, 58, 34,
];

#[cfg(test)]
pub(crate) fn test_params() -> SuggestedParams {
    SuggestedParams {
        fee: 1_000,
        first_valid: 100,
        last_valid: 1_100,
        genesis_id: "testnet-v1.0".to_string(),
        genesis_hash: TESTNET_GENESIS_HASH,
    }
}
