//! Canonical msgpack wire format
//!
//! Maps carry their keys in sorted order and omit zero or empty values, so the
//! field order of each wire struct below is the encoding order.

use crate::error::Result;
use crate::types::{Address, OnComplete, StateSchema, Transaction, TransactionKind, TxId};
use serde::Serialize;
use serde_bytes::Bytes;
use solana_sdk::signature::Signature;

fn is_zero(v: &u64) -> bool {
    *v == 0
}

fn nonzero_address(address: &Address) -> Option<&Bytes> {
    if address.is_zero() {
        None
    } else {
        Some(Bytes::new(address.as_bytes()))
    }
}

fn nonempty(bytes: &[u8]) -> Option<&Bytes> {
    if bytes.is_empty() {
        None
    } else {
        Some(Bytes::new(bytes))
    }
}

#[derive(Serialize)]
struct WireSchema {
    #[serde(skip_serializing_if = "is_zero")]
    nbs: u64,
    #[serde(skip_serializing_if = "is_zero")]
    nui: u64,
}

impl WireSchema {
    fn from_schema(schema: &StateSchema) -> Option<Self> {
        if schema.num_uints == 0 && schema.num_byte_slices == 0 {
            return None;
        }
        Some(Self {
            nbs: schema.num_byte_slices,
            nui: schema.num_uints,
        })
    }
}

#[derive(Serialize, Default)]
struct WireTransaction<'a> {
    #[serde(skip_serializing_if = "is_zero")]
    aamt: u64,
    #[serde(skip_serializing_if = "is_zero")]
    amt: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    apaa: Vec<&'a Bytes>,
    #[serde(skip_serializing_if = "is_zero")]
    apan: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    apap: Option<&'a Bytes>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    apas: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    apgs: Option<WireSchema>,
    #[serde(skip_serializing_if = "is_zero")]
    apid: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    apls: Option<WireSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    apsu: Option<&'a Bytes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    arcv: Option<&'a Bytes>,
    #[serde(skip_serializing_if = "is_zero")]
    fee: u64,
    #[serde(skip_serializing_if = "is_zero")]
    fv: u64,
    #[serde(skip_serializing_if = "str::is_empty")]
    gen: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    gh: Option<&'a Bytes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    grp: Option<&'a Bytes>,
    #[serde(skip_serializing_if = "is_zero")]
    lv: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    rcv: Option<&'a Bytes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    snd: Option<&'a Bytes>,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "is_zero")]
    xaid: u64,
}

fn on_complete_code(on_complete: OnComplete) -> u64 {
    match on_complete {
        OnComplete::NoOp => 0,
        OnComplete::OptIn => 1,
        OnComplete::CloseOut => 2,
        OnComplete::ClearState => 3,
        OnComplete::UpdateApplication => 4,
        OnComplete::DeleteApplication => 5,
    }
}

impl<'a> WireTransaction<'a> {
    fn from_transaction(txn: &'a Transaction) -> Self {
        let mut wire = Self {
            fee: txn.fee,
            fv: txn.first_valid,
            gen: &txn.genesis_id,
            gh: Some(Bytes::new(&txn.genesis_hash)),
            grp: txn.group.as_ref().map(|g| Bytes::new(&g.0)),
            lv: txn.last_valid,
            snd: nonzero_address(&txn.sender),
            ..Default::default()
        };

        match &txn.kind {
            TransactionKind::Payment { receiver, amount } => {
                wire.kind = "pay";
                wire.amt = *amount;
                wire.rcv = nonzero_address(receiver);
            }
            TransactionKind::AssetTransfer {
                asset_id,
                receiver,
                amount,
            } => {
                wire.kind = "axfer";
                wire.aamt = *amount;
                wire.arcv = nonzero_address(receiver);
                wire.xaid = *asset_id;
            }
            TransactionKind::ApplicationCall(call) => {
                wire.kind = "appl";
                wire.apid = call.app_id;
                wire.apan = on_complete_code(call.on_complete);
                wire.apaa = call.app_args.iter().map(|a| Bytes::new(a)).collect();
                wire.apas = call.foreign_assets.clone();
                wire.apap = nonempty(&call.approval_program);
                wire.apsu = nonempty(&call.clear_program);
                wire.apgs = WireSchema::from_schema(&call.global_schema);
                wire.apls = WireSchema::from_schema(&call.local_schema);
            }
        }

        wire
    }
}

#[derive(Serialize)]
struct WireSignedTransaction<'a> {
    sig: &'a Bytes,
    txn: WireTransaction<'a>,
}

#[derive(Serialize)]
struct WireTxGroup<'a> {
    txlist: Vec<&'a Bytes>,
}

/// Canonical encoding of an unsigned transaction
pub fn encode_transaction(txn: &Transaction) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(&WireTransaction::from_transaction(txn))?)
}

/// Canonical encoding of a signed transaction, as posted to the node
pub fn encode_signed(txn: &Transaction, signature: &Signature) -> Result<Vec<u8>> {
    let wire = WireSignedTransaction {
        sig: Bytes::new(signature.as_ref()),
        txn: WireTransaction::from_transaction(txn),
    };
    Ok(rmp_serde::to_vec_named(&wire)?)
}

/// Canonical encoding of the id list a group id is computed over
pub fn encode_group(ids: &[TxId]) -> Result<Vec<u8>> {
    let wire = WireTxGroup {
        txlist: ids.iter().map(|id| Bytes::new(&id.0)).collect(),
    };
    Ok(rmp_serde::to_vec_named(&wire)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{test_params, Address};

    // Reference bytes for a 403_000 payment from [1; 32] to [2; 32] on testnet
    const PAYMENT_HEX: &str = "89a3616d74ce00062638a3666565cd03e8a2667664a367656eac746573746e65742d76312e30a26768c4204863b518a4b3c84ec810f22d4f1081cb0f71f059a7ac20dec62f7f70e5093a22a26c76cd044ca3726376c4200202020202020202020202020202020202020202020202020202020202020202a3736e64c4200101010101010101010101010101010101010101010101010101010101010101a474797065a3706179";

    fn to_hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn test_payment_matches_reference_bytes() {
        let txn = Transaction::payment(
            Address::new([1u8; 32]),
            Address::new([2u8; 32]),
            403_000,
            &test_params(),
        );

        assert_eq!(to_hex(&encode_transaction(&txn).unwrap()), PAYMENT_HEX);
    }

    #[test]
    fn test_opt_in_omits_zero_amount() {
        let sender = Address::new([1u8; 32]);
        let bytes = encode_transaction(&Transaction::asset_opt_in(sender, 77, &test_params()))
            .unwrap();

        // fixmap with arcv, fee, fv, gen, gh, lv, snd, type, xaid
        assert_eq!(bytes[0], 0x89);
        assert!(!bytes.windows(4).any(|w| w == b"aamt"));
        assert!(bytes.windows(4).any(|w| w == b"arcv"));
    }

    #[test]
    fn test_create_call_encodes_schema_and_programs() {
        let sender = Address::new([1u8; 32]);
        let call = crate::types::ApplicationCall {
            app_args: vec![b"setup".to_vec()],
            approval_program: vec![6, 129, 1],
            clear_program: vec![6, 129, 1],
            global_schema: StateSchema::new(7, 1),
            ..Default::default()
        };
        let bytes =
            encode_transaction(&Transaction::application_call(sender, call, &test_params()))
                .unwrap();

        // apaa, apap, apgs, apsu, fee, fv, gen, gh, lv, snd, type; no apid or apls
        assert_eq!(bytes[0], 0x8b);
        assert!(bytes.windows(4).any(|w| w == b"apgs"));
        assert!(!bytes.windows(4).any(|w| w == b"apid"));
        assert!(!bytes.windows(4).any(|w| w == b"apls"));
        // "type": "appl"
        assert!(bytes.windows(5).any(|w| w == b"\xa4appl"));
    }

    #[test]
    fn test_signed_wraps_sig_then_txn() {
        let txn = Transaction::payment(
            Address::new([1u8; 32]),
            Address::new([2u8; 32]),
            403_000,
            &test_params(),
        );
        let signature = Signature::from([3u8; 64]);
        let bytes = encode_signed(&txn, &signature).unwrap();

        assert_eq!(&bytes[..7], b"\x82\xa3sig\xc4\x40");
        assert_eq!(&bytes[7..71], &[3u8; 64][..]);
        assert_eq!(&bytes[71..75], b"\xa3txn");
        assert_eq!(to_hex(&bytes[75..]), PAYMENT_HEX);
    }
}
