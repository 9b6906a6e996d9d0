//! Immutable transaction snapshot
//!
//! A `TransactionSnapshot` is everything the reconstruction needs from a
//! single `getTransaction` response, fully materialized before any of the
//! decoding passes run. It is built from the JSON-RPC payload
//! (`encoding = "json"`, `maxSupportedTransactionVersion = 0`).

use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;
use solana_sdk::{
    instruction::CompiledInstruction,
    message::{v0::LoadedAddresses, MessageHeader},
    pubkey::Pubkey,
    signature::Signature,
    transaction::TransactionError,
};

use crate::error::SnapshotError;

// ============================================================================
// Account Key Table
// ============================================================================

/// The logical account list of a versioned message: static keys followed by
/// the writable and then the readonly addresses loaded from lookup tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountKeyTable {
    static_keys: Vec<Pubkey>,
    loaded: LoadedAddresses,
}

impl AccountKeyTable {
    pub fn new(static_keys: Vec<Pubkey>, loaded: LoadedAddresses) -> Self {
        Self { static_keys, loaded }
    }

    /// Table for a legacy message (no lookup tables).
    pub fn from_static(static_keys: Vec<Pubkey>) -> Self {
        Self::new(static_keys, LoadedAddresses::default())
    }

    pub fn static_keys(&self) -> &[Pubkey] {
        &self.static_keys
    }

    pub fn static_len(&self) -> usize {
        self.static_keys.len()
    }

    pub fn lookup_writable_len(&self) -> usize {
        self.loaded.writable.len()
    }

    pub fn len(&self) -> usize {
        self.static_len() + self.lookup_writable_len() + self.loaded.readonly.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve an index into the static ++ writable ++ readonly concatenation.
    pub fn get(&self, index: usize) -> Option<&Pubkey> {
        let mut index = index;
        for segment in [
            &self.static_keys,
            &self.loaded.writable,
            &self.loaded.readonly,
        ] {
            if index < segment.len() {
                return segment.get(index);
            }
            index -= segment.len();
        }
        None
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pubkey> {
        self.static_keys
            .iter()
            .chain(self.loaded.writable.iter())
            .chain(self.loaded.readonly.iter())
    }
}

// ============================================================================
// Snapshot Types
// ============================================================================

/// Inner instructions recorded for one top-level instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerInstructionGroup {
    pub index: u8,
    pub instructions: Vec<CompiledInstruction>,
}

/// One entry of `preTokenBalances` / `postTokenBalances`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBalance {
    pub account_index: u8,
    pub mint: Pubkey,
    pub owner: Option<Pubkey>,
    pub program_id: Option<Pubkey>,
    /// Raw integer amount as reported by the node.
    pub amount: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSnapshot {
    pub signature: Signature,
    pub slot: u64,
    pub block_time: Option<i64>,
    pub header: MessageHeader,
    pub account_keys: AccountKeyTable,
    pub instructions: Vec<CompiledInstruction>,
    pub inner_instructions: Vec<InnerInstructionGroup>,
    pub log_messages: Vec<String>,
    pub pre_token_balances: Vec<TokenBalance>,
    pub post_token_balances: Vec<TokenBalance>,
    pub err: Option<TransactionError>,
    pub fee: u64,
    pub compute_units_consumed: Option<u64>,
}

impl TransactionSnapshot {
    pub fn from_rpc_json(raw_json: &str) -> Result<Self, SnapshotError> {
        let response: RpcTransactionResponse = serde_json::from_str(raw_json)?;
        response.try_into()
    }

    pub fn from_rpc_value(value: Value) -> Result<Self, SnapshotError> {
        let response: RpcTransactionResponse = serde_json::from_value(value)?;
        response.try_into()
    }

    /// The first static key always pays the fee.
    pub fn fee_payer(&self) -> Option<&Pubkey> {
        self.account_keys.static_keys().first()
    }

    pub fn is_success(&self) -> bool {
        self.err.is_none()
    }
}

// ============================================================================
// JSON-RPC Shapes
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcTransactionResponse {
    slot: u64,
    block_time: Option<i64>,
    transaction: RpcTransaction,
    meta: Option<RpcTransactionMeta>,
}

#[derive(Debug, Deserialize)]
struct RpcTransaction {
    signatures: Vec<String>,
    message: RpcMessage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcMessage {
    header: RpcMessageHeader,
    account_keys: Vec<String>,
    instructions: Vec<RpcCompiledInstruction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcMessageHeader {
    num_required_signatures: u8,
    num_readonly_signed_accounts: u8,
    num_readonly_unsigned_accounts: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcCompiledInstruction {
    program_id_index: u8,
    accounts: Vec<u8>,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcTransactionMeta {
    err: Option<TransactionError>,
    #[serde(default)]
    fee: u64,
    inner_instructions: Option<Vec<RpcInnerInstructions>>,
    log_messages: Option<Vec<String>>,
    pre_token_balances: Option<Vec<RpcTokenBalance>>,
    post_token_balances: Option<Vec<RpcTokenBalance>>,
    loaded_addresses: Option<RpcLoadedAddresses>,
    compute_units_consumed: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RpcInnerInstructions {
    index: u8,
    instructions: Vec<RpcCompiledInstruction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcTokenBalance {
    account_index: u8,
    mint: String,
    owner: Option<String>,
    program_id: Option<String>,
    ui_token_amount: RpcUiTokenAmount,
}

#[derive(Debug, Deserialize)]
struct RpcUiTokenAmount {
    amount: String,
    decimals: u8,
}

#[derive(Debug, Default, Deserialize)]
struct RpcLoadedAddresses {
    #[serde(default)]
    writable: Vec<String>,
    #[serde(default)]
    readonly: Vec<String>,
}

fn parse_pubkey(value: &str) -> Result<Pubkey, SnapshotError> {
    Pubkey::from_str(value).map_err(|e| SnapshotError::InvalidPubkey {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_pubkeys(values: &[String]) -> Result<Vec<Pubkey>, SnapshotError> {
    values.iter().map(|v| parse_pubkey(v)).collect()
}

impl TryFrom<RpcCompiledInstruction> for CompiledInstruction {
    type Error = SnapshotError;

    fn try_from(ix: RpcCompiledInstruction) -> Result<Self, Self::Error> {
        Ok(CompiledInstruction {
            program_id_index: ix.program_id_index,
            accounts: ix.accounts,
            data: bs58::decode(&ix.data).into_vec()?,
        })
    }
}

impl TryFrom<RpcTokenBalance> for TokenBalance {
    type Error = SnapshotError;

    fn try_from(balance: RpcTokenBalance) -> Result<Self, Self::Error> {
        Ok(TokenBalance {
            account_index: balance.account_index,
            mint: parse_pubkey(&balance.mint)?,
            owner: balance.owner.as_deref().map(parse_pubkey).transpose()?,
            program_id: balance.program_id.as_deref().map(parse_pubkey).transpose()?,
            amount: balance.ui_token_amount.amount,
            decimals: balance.ui_token_amount.decimals,
        })
    }
}

fn convert_balances(
    balances: Option<Vec<RpcTokenBalance>>,
) -> Result<Vec<TokenBalance>, SnapshotError> {
    balances
        .unwrap_or_default()
        .into_iter()
        .map(TokenBalance::try_from)
        .collect()
}

impl TryFrom<RpcTransactionResponse> for TransactionSnapshot {
    type Error = SnapshotError;

    fn try_from(response: RpcTransactionResponse) -> Result<Self, Self::Error> {
        let RpcTransactionResponse {
            slot,
            block_time,
            transaction,
            meta,
        } = response;

        let signature_str = transaction
            .signatures
            .first()
            .ok_or(SnapshotError::MissingSignature)?;
        let signature = Signature::from_str(signature_str)
            .map_err(|_| SnapshotError::InvalidSignature(signature_str.clone()))?;

        let message = transaction.message;
        let header = MessageHeader {
            num_required_signatures: message.header.num_required_signatures,
            num_readonly_signed_accounts: message.header.num_readonly_signed_accounts,
            num_readonly_unsigned_accounts: message.header.num_readonly_unsigned_accounts,
        };
        let static_keys = parse_pubkeys(&message.account_keys)?;
        let instructions = message
            .instructions
            .into_iter()
            .map(CompiledInstruction::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let Some(meta) = meta else {
            // Nodes omit meta for very old or pruned transactions.
            return Ok(TransactionSnapshot {
                signature,
                slot,
                block_time,
                header,
                account_keys: AccountKeyTable::from_static(static_keys),
                instructions,
                inner_instructions: Vec::new(),
                log_messages: Vec::new(),
                pre_token_balances: Vec::new(),
                post_token_balances: Vec::new(),
                err: None,
                fee: 0,
                compute_units_consumed: None,
            });
        };

        let loaded = meta.loaded_addresses.unwrap_or_default();
        let loaded = LoadedAddresses {
            writable: parse_pubkeys(&loaded.writable)?,
            readonly: parse_pubkeys(&loaded.readonly)?,
        };

        let inner_instructions = meta
            .inner_instructions
            .unwrap_or_default()
            .into_iter()
            .map(|group| {
                Ok(InnerInstructionGroup {
                    index: group.index,
                    instructions: group
                        .instructions
                        .into_iter()
                        .map(CompiledInstruction::try_from)
                        .collect::<Result<Vec<_>, SnapshotError>>()?,
                })
            })
            .collect::<Result<Vec<_>, SnapshotError>>()?;

        Ok(TransactionSnapshot {
            signature,
            slot,
            block_time,
            header,
            account_keys: AccountKeyTable::new(static_keys, loaded),
            instructions,
            inner_instructions,
            log_messages: meta.log_messages.unwrap_or_default(),
            pre_token_balances: convert_balances(meta.pre_token_balances)?,
            post_token_balances: convert_balances(meta.post_token_balances)?,
            err: meta.err,
            fee: meta.fee,
            compute_units_consumed: meta.compute_units_consumed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGNATURE: &str =
        "3KktLw5mbmiVW7733zpAy5sVZg8EA6oDZ6nRWSWSPqDh3zDr7tzuCT6gxHj9vDh2jJHdXtMnex2sstnwdh1xvGFA";

    fn sample_json() -> String {
        format!(
            r#"{{
                "slot": 200,
                "blockTime": 1700000000,
                "transaction": {{
                    "signatures": ["{SIGNATURE}"],
                    "message": {{
                        "header": {{
                            "numRequiredSignatures": 1,
                            "numReadonlySignedAccounts": 0,
                            "numReadonlyUnsignedAccounts": 1
                        }},
                        "accountKeys": [
                            "7cVfgArCheMR6Cs4t6vz5rfnqd56vZq4ndaBrY5xkxXy",
                            "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA"
                        ],
                        "recentBlockhash": "11111111111111111111111111111111",
                        "instructions": [
                            {{ "programIdIndex": 1, "accounts": [0, 2, 3], "data": "3Bxs4Bc3VYuGVB19", "stackHeight": null }}
                        ],
                        "addressTableLookups": []
                    }}
                }},
                "meta": {{
                    "err": null,
                    "fee": 5000,
                    "innerInstructions": [
                        {{ "index": 0, "instructions": [ {{ "programIdIndex": 1, "accounts": [2], "data": "", "stackHeight": 2 }} ] }}
                    ],
                    "logMessages": ["Program TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA invoke [1]"],
                    "preTokenBalances": [],
                    "postTokenBalances": [
                        {{
                            "accountIndex": 3,
                            "mint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
                            "owner": "oreV2ZymfyeXgNgBdqMkumTqqAprVqgBWQfoYkrtKWQ",
                            "programId": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
                            "uiTokenAmount": {{ "amount": "1000000", "decimals": 6, "uiAmount": 1.0, "uiAmountString": "1" }}
                        }}
                    ],
                    "loadedAddresses": {{
                        "writable": ["So11111111111111111111111111111111111111112"],
                        "readonly": ["11111111111111111111111111111111"]
                    }},
                    "computeUnitsConsumed": 4645
                }}
            }}"#
        )
    }

    #[test]
    fn test_parses_rpc_transaction() {
        let snapshot = TransactionSnapshot::from_rpc_json(&sample_json()).unwrap();

        assert_eq!(snapshot.signature.to_string(), SIGNATURE);
        assert_eq!(snapshot.slot, 200);
        assert_eq!(snapshot.block_time, Some(1_700_000_000));
        assert_eq!(snapshot.header.num_readonly_unsigned_accounts, 1);
        assert_eq!(snapshot.account_keys.len(), 4);
        assert_eq!(snapshot.account_keys.lookup_writable_len(), 1);
        assert_eq!(snapshot.instructions.len(), 1);
        assert_eq!(snapshot.instructions[0].accounts, vec![0, 2, 3]);
        assert!(!snapshot.instructions[0].data.is_empty());
        assert_eq!(snapshot.inner_instructions.len(), 1);
        assert!(snapshot.inner_instructions[0].instructions[0].data.is_empty());
        assert_eq!(snapshot.post_token_balances[0].decimals, 6);
        assert_eq!(snapshot.post_token_balances[0].amount, "1000000");
        assert_eq!(snapshot.fee, 5000);
        assert_eq!(snapshot.compute_units_consumed, Some(4645));
        assert!(snapshot.is_success());
    }

    #[test]
    fn test_key_table_concatenates_lookups() {
        let snapshot = TransactionSnapshot::from_rpc_json(&sample_json()).unwrap();
        let keys = &snapshot.account_keys;

        assert_eq!(
            keys.get(2).unwrap().to_string(),
            "So11111111111111111111111111111111111111112"
        );
        assert_eq!(
            keys.get(3).unwrap().to_string(),
            "11111111111111111111111111111111"
        );
        assert!(keys.get(4).is_none());
        assert_eq!(keys.iter().count(), 4);
    }

    #[test]
    fn test_parses_instruction_error() {
        let json = sample_json().replace(
            r#""err": null"#,
            r#""err": {"InstructionError": [0, {"Custom": 1}]}"#,
        );
        let snapshot = TransactionSnapshot::from_rpc_json(&json).unwrap();

        assert!(!snapshot.is_success());
        assert!(matches!(
            snapshot.err,
            Some(TransactionError::InstructionError(0, _))
        ));
    }

    #[test]
    fn test_rejects_invalid_pubkey() {
        let json = sample_json().replace(
            "7cVfgArCheMR6Cs4t6vz5rfnqd56vZq4ndaBrY5xkxXy",
            "not-a-key",
        );
        let err = TransactionSnapshot::from_rpc_json(&json).unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidPubkey { .. }));
    }

    #[test]
    fn test_missing_meta_yields_empty_execution_data() {
        let mut value: Value = serde_json::from_str(&sample_json()).unwrap();
        value["meta"] = Value::Null;
        let snapshot = TransactionSnapshot::from_rpc_value(value).unwrap();

        assert!(snapshot.inner_instructions.is_empty());
        assert!(snapshot.log_messages.is_empty());
        assert_eq!(snapshot.account_keys.len(), 2);
    }
}
