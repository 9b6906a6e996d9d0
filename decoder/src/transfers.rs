//! Asset-transfer extraction
//!
//! Collects every SPL Token `transfer` / `transferChecked` in the tree and
//! resolves who received the tokens by looking the destination token account
//! up in the post-transaction balances. Tokens always end up in some account,
//! so the final balances are the one place where the mint is guaranteed to be
//! visible.
//!
//! Net per-account token movement comes from diffing pre and post balances.

use std::collections::HashMap;

use num_bigint::BigUint;
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

use crate::{
    amount::format_ui_amount,
    interpret::TokenProgramInstruction,
    programs::TOKEN_PROGRAM_ID,
    snapshot::{AccountKeyTable, TokenBalance},
    tree::InstructionTreeNode,
};

/// Balance facts about one token account after execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAccountInfo {
    pub mint: Pubkey,
    pub owner: Option<Pubkey>,
    pub decimals: u8,
}

/// Post-transaction token balances keyed by token account address.
#[derive(Debug, Clone, Default)]
pub struct TokenBalanceIndex {
    accounts: HashMap<Pubkey, TokenAccountInfo>,
}

impl TokenBalanceIndex {
    pub fn new(balances: &[TokenBalance], keys: &AccountKeyTable) -> Self {
        let mut accounts = HashMap::with_capacity(balances.len());
        for balance in balances {
            let Some(address) = keys.get(balance.account_index as usize) else {
                tracing::debug!(
                    account_index = balance.account_index,
                    "TokenBalanceIndex: balance references unknown account index"
                );
                continue;
            };
            accounts.insert(
                *address,
                TokenAccountInfo {
                    mint: balance.mint,
                    owner: balance.owner,
                    decimals: balance.decimals,
                },
            );
        }
        Self { accounts }
    }

    pub fn get(&self, account: &Pubkey) -> Option<&TokenAccountInfo> {
        self.accounts.get(account)
    }

}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransfer {
    #[serde(serialize_with = "crate::serialize::display")]
    pub amount: BigUint,
    #[serde(serialize_with = "crate::serialize::display")]
    pub source: Pubkey,
    #[serde(serialize_with = "crate::serialize::display")]
    pub destination: Pubkey,
    /// Authority that signed the transfer.
    #[serde(serialize_with = "crate::serialize::display")]
    pub source_owner: Pubkey,
    #[serde(serialize_with = "crate::serialize::option_display")]
    pub destination_owner: Option<Pubkey>,
    #[serde(serialize_with = "crate::serialize::option_display")]
    pub mint: Option<Pubkey>,
    pub decimals: Option<u8>,
}

impl AssetTransfer {
    /// Unit amount when the mint's decimals are known, the raw integer
    /// otherwise.
    pub fn display_amount(&self) -> String {
        match self.decimals {
            Some(decimals) => format_ui_amount(&self.amount, decimals),
            None => self.amount.to_string(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.mint.is_some()
    }
}

/// Every token transfer in `forest`, depth-first and left to right.
pub fn extract_asset_transfers(
    forest: &[InstructionTreeNode],
    balances: &TokenBalanceIndex,
) -> Vec<AssetTransfer> {
    forest
        .iter()
        .flat_map(|root| root.walk())
        .filter(|node| node.instruction.program_id == TOKEN_PROGRAM_ID)
        .filter_map(|node| TokenProgramInstruction::decode(&node.instruction).as_transfer())
        .map(|transfer| {
            let destination = balances.get(&transfer.destination);
            AssetTransfer {
                amount: BigUint::from(transfer.amount),
                source: transfer.source,
                destination: transfer.destination,
                source_owner: transfer.owner,
                destination_owner: destination.and_then(|info| info.owner),
                mint: destination.map(|info| info.mint),
                decimals: destination.map(|info| info.decimals),
            }
        })
        .collect()
}

// ============================================================================
// Balance Changes
// ============================================================================

/// Net movement of one token account over the transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalanceChange {
    #[serde(serialize_with = "crate::serialize::display")]
    pub account: Pubkey,
    #[serde(serialize_with = "crate::serialize::display")]
    pub mint: Pubkey,
    #[serde(serialize_with = "crate::serialize::option_display")]
    pub owner: Option<Pubkey>,
    #[serde(serialize_with = "crate::serialize::option_display")]
    pub program_id: Option<Pubkey>,
    #[serde(serialize_with = "crate::serialize::display")]
    pub pre_amount: BigUint,
    #[serde(serialize_with = "crate::serialize::display")]
    pub post_amount: BigUint,
    pub decimals: u8,
}

impl TokenBalanceChange {
    /// Signed unit change, e.g. `+1.5` or `-0.25`.
    pub fn display_change(&self) -> String {
        if self.post_amount >= self.pre_amount {
            let delta = &self.post_amount - &self.pre_amount;
            format!("+{}", format_ui_amount(&delta, self.decimals))
        } else {
            let delta = &self.pre_amount - &self.post_amount;
            format!("-{}", format_ui_amount(&delta, self.decimals))
        }
    }
}

fn raw_amount(balance: &TokenBalance) -> Option<BigUint> {
    match balance.amount.parse::<BigUint>() {
        Ok(amount) => Some(amount),
        Err(e) => {
            tracing::warn!(
                account_index = balance.account_index,
                amount = %balance.amount,
                error = %e,
                "token_balance_changes: unparseable token amount"
            );
            None
        }
    }
}

/// Non-zero token balance deltas, accounts present before execution first.
///
/// An account missing from `post` was closed and ends at zero; one missing
/// from `pre` was opened and starts at zero.
pub fn token_balance_changes(
    pre: &[TokenBalance],
    post: &[TokenBalance],
    keys: &AccountKeyTable,
) -> Vec<TokenBalanceChange> {
    let find = |balances: &[TokenBalance], account_index: u8| {
        balances
            .iter()
            .find(|balance| balance.account_index == account_index)
            .cloned()
    };

    let pairs = pre
        .iter()
        .map(|before| (Some(before.clone()), find(post, before.account_index)))
        .chain(
            post.iter()
                .filter(|after| find(pre, after.account_index).is_none())
                .map(|after| (None, Some(after.clone()))),
        );

    let mut changes = Vec::new();
    for (before, after) in pairs {
        let Some(reference) = after.as_ref().or(before.as_ref()) else {
            continue;
        };
        let Some(account) = keys.get(reference.account_index as usize) else {
            tracing::debug!(
                account_index = reference.account_index,
                "token_balance_changes: balance references unknown account index"
            );
            continue;
        };
        let pre_amount = match &before {
            Some(balance) => match raw_amount(balance) {
                Some(amount) => amount,
                None => continue,
            },
            None => BigUint::default(),
        };
        let post_amount = match &after {
            Some(balance) => match raw_amount(balance) {
                Some(amount) => amount,
                None => continue,
            },
            None => BigUint::default(),
        };
        if pre_amount == post_amount {
            continue;
        }

        changes.push(TokenBalanceChange {
            account: *account,
            mint: reference.mint,
            owner: reference.owner,
            program_id: reference.program_id,
            pre_amount,
            post_amount,
            decimals: reference.decimals,
        });
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::programs::TOKEN_2022_PROGRAM_ID;
    use solana_sdk::instruction::{AccountMeta, Instruction};

    struct Accounts {
        source: Pubkey,
        destination: Pubkey,
        authority: Pubkey,
    }

    fn accounts() -> Accounts {
        Accounts {
            source: Pubkey::new_unique(),
            destination: Pubkey::new_unique(),
            authority: Pubkey::new_unique(),
        }
    }

    fn transfer(program_id: Pubkey, accounts: &Accounts, amount: u64) -> Instruction {
        let mut data = vec![3];
        data.extend_from_slice(&amount.to_le_bytes());
        Instruction::new_with_bytes(
            program_id,
            &data,
            vec![
                AccountMeta::new(accounts.source, false),
                AccountMeta::new(accounts.destination, false),
                AccountMeta::new_readonly(accounts.authority, true),
            ],
        )
    }

    fn index_with(account: Pubkey, mint: Pubkey, owner: Pubkey, decimals: u8) -> TokenBalanceIndex {
        let keys = AccountKeyTable::from_static(vec![Pubkey::new_unique(), account]);
        TokenBalanceIndex::new(
            &[TokenBalance {
                account_index: 1,
                mint,
                owner: Some(owner),
                program_id: Some(TOKEN_PROGRAM_ID),
                amount: "0".to_string(),
                decimals,
            }],
            &keys,
        )
    }

    #[test]
    fn test_destination_resolved_from_post_balances() {
        let accts = accounts();
        let mint = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let index = index_with(accts.destination, mint, owner, 6);
        let forest = vec![InstructionTreeNode::new(
            transfer(TOKEN_PROGRAM_ID, &accts, 1_000_000),
            0,
        )];

        let transfers = extract_asset_transfers(&forest, &index);

        assert_eq!(transfers.len(), 1);
        let t = &transfers[0];
        assert_eq!(t.mint, Some(mint));
        assert_eq!(t.destination_owner, Some(owner));
        assert_eq!(t.source_owner, accts.authority);
        assert_eq!(t.display_amount(), "1.0");
        assert!(t.is_resolved());
    }

    #[test]
    fn test_missing_destination_keeps_raw_amount() {
        let accts = accounts();
        let forest = vec![InstructionTreeNode::new(
            transfer(TOKEN_PROGRAM_ID, &accts, 1_000_000),
            0,
        )];

        let transfers = extract_asset_transfers(&forest, &TokenBalanceIndex::default());

        assert_eq!(transfers.len(), 1);
        let t = &transfers[0];
        assert!(t.destination_owner.is_none());
        assert!(t.mint.is_none());
        assert_eq!(t.display_amount(), "1000000");
    }

    #[test]
    fn test_nested_transfers_in_preorder() {
        let first = accounts();
        let second = accounts();
        let mut root = InstructionTreeNode::new(
            Instruction::new_with_bytes(Pubkey::new_unique(), &[], vec![]),
            0,
        );
        let mut child = InstructionTreeNode::new(transfer(TOKEN_PROGRAM_ID, &first, 1), 1);
        child
            .children
            .push(InstructionTreeNode::new(transfer(TOKEN_PROGRAM_ID, &second, 2), 2));
        root.children.push(child);
        root.children
            .push(InstructionTreeNode::new(transfer(TOKEN_PROGRAM_ID, &first, 3), 1));

        let amounts: Vec<String> = extract_asset_transfers(&[root], &TokenBalanceIndex::default())
            .iter()
            .map(|t| t.amount.to_string())
            .collect();

        assert_eq!(amounts, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_other_token_programs_are_ignored() {
        let accts = accounts();
        let forest = vec![InstructionTreeNode::new(
            transfer(TOKEN_2022_PROGRAM_ID, &accts, 5),
            0,
        )];

        assert!(extract_asset_transfers(&forest, &TokenBalanceIndex::default()).is_empty());
    }

    fn balance(account_index: u8, mint: Pubkey, amount: &str) -> TokenBalance {
        TokenBalance {
            account_index,
            mint,
            owner: Some(Pubkey::new_unique()),
            program_id: Some(TOKEN_PROGRAM_ID),
            amount: amount.to_string(),
            decimals: 6,
        }
    }

    #[test]
    fn test_balance_changes_skip_unchanged_accounts() {
        let keys = AccountKeyTable::from_static(vec![
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
        ]);
        let mint = Pubkey::new_unique();
        let pre = vec![balance(1, mint, "2500000"), balance(2, mint, "7")];
        let post = vec![balance(1, mint, "1000000"), balance(2, mint, "7")];

        let changes = token_balance_changes(&pre, &post, &keys);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].account, *keys.get(1).unwrap());
        assert_eq!(changes[0].program_id, Some(TOKEN_PROGRAM_ID));
        assert_eq!(changes[0].display_change(), "-1.5");
    }

    #[test]
    fn test_balance_changes_cover_opened_and_closed_accounts() {
        let keys = AccountKeyTable::from_static(vec![
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
        ]);
        let mint = Pubkey::new_unique();
        let pre = vec![balance(1, mint, "500000")];
        let post = vec![balance(2, mint, "2000000")];

        let changes = token_balance_changes(&pre, &post, &keys);

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].account, *keys.get(1).unwrap());
        assert_eq!(changes[0].post_amount, BigUint::default());
        assert_eq!(changes[0].display_change(), "-0.5");
        assert_eq!(changes[1].account, *keys.get(2).unwrap());
        assert_eq!(changes[1].display_change(), "+2.0");
    }

    #[test]
    fn test_balance_changes_skip_unparseable_amounts() {
        let keys = AccountKeyTable::from_static(vec![Pubkey::new_unique(), Pubkey::new_unique()]);
        let mint = Pubkey::new_unique();

        let changes =
            token_balance_changes(&[balance(1, mint, "n/a")], &[balance(1, mint, "5")], &keys);

        assert!(changes.is_empty());
    }

    #[test]
    fn test_serializes_amount_as_string() {
        let accts = accounts();
        let forest = vec![InstructionTreeNode::new(
            transfer(TOKEN_PROGRAM_ID, &accts, u64::MAX),
            0,
        )];

        let transfers = extract_asset_transfers(&forest, &TokenBalanceIndex::default());
        let json = serde_json::to_value(&transfers[0]).unwrap();

        assert_eq!(json["amount"], "18446744073709551615");
        assert_eq!(json["mint"], serde_json::Value::Null);
        assert_eq!(json["destination"], accts.destination.to_string());
    }
}
