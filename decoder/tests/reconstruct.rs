use ixtree::{
    interpret::InstructionView, logs::LogStyle, programs::JUPITER_V4_PROGRAM_ID, reconstruct,
    Cluster, ReconstructError, TransactionAnalyzer, TransactionSnapshot,
};
use serde_json::Value;

const PAYER: &str = "AWxggjuZRmWULwxwPeM6ZZxRtdDdekVq22mFRx2QbW7U";
const USER_USDC: &str = "AJoqgDBZ6UfZUMojXaxD98FFgmPkFgj78oNBdfFCEPaN";
const RESERVE_USDC: &str = "2wrh68Mrxh1DZKH4NuLw2ig266DZuFpBmPrzYQi41zEM";
const RESERVE_WSOL: &str = "B9oa8D1QnjZkGvp6PDBCTfwTbQcRMUYRGNaX45ej9dn";
const USER_WSOL: &str = "vHniyvUv7puv2hnqk6QaZsv5bKQHXetdC6Mz59BkJQk";
const RESERVE_AUTHORITY: &str = "EUhErz5NJcQuz9MA3YBmYynrXot1MTvdTBvLQ1kLkgxn";
const RESERVE_OWNER: &str = "CKz3m2kqS74KzoWKkCQaPibwsZcZMu45Fav1CyHVVWj1";
const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
const WSOL_MINT: &str = "So11111111111111111111111111111111111111112";
const TOKEN: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
const JUPITER: &str = "JUP4Fb2cqiRUcaTHdrPC8h2gNsA2ETXiPDD33WcGuJB";
const SIGNATURE: &str =
    "1XTRN2RJN5MfCYf2UTVo8dcmei94CvVB2BBWvvograKBRzTW7RaDH79KZ4NSHQNUNLf3DwSbhdsgmDYptsM2d21";

/// A Jupiter route that swaps USDC for wSOL through two token transfers.
///
/// Static keys: `[payer, user_usdc, reserve_usdc, reserve_wsol, user_wsol,
/// reserve_authority, token_program, jupiter]`, the last three readonly.
fn swap_fixture() -> Value {
    serde_json::json!({
        "slot": 250_000_000u64,
        "blockTime": 1_700_000_000i64,
        "transaction": {
            "signatures": [SIGNATURE],
            "message": {
                "header": {
                    "numRequiredSignatures": 1,
                    "numReadonlySignedAccounts": 0,
                    "numReadonlyUnsignedAccounts": 3
                },
                "accountKeys": [
                    PAYER, USER_USDC, RESERVE_USDC, RESERVE_WSOL, USER_WSOL,
                    RESERVE_AUTHORITY, TOKEN, JUPITER
                ],
                "recentBlockhash": "11111111111111111111111111111111",
                "instructions": [
                    {
                        "programIdIndex": 7,
                        "accounts": [0, 1, 2, 3, 4, 5, 6],
                        "data": "AW83Rj1ozdCyUJEF6V2jRz9Xm",
                        "stackHeight": null
                    }
                ]
            }
        },
        "meta": {
            "err": null,
            "fee": 5000,
            "innerInstructions": [
                {
                    "index": 0,
                    "instructions": [
                        { "programIdIndex": 6, "accounts": [1, 2, 0], "data": "3xCmQKvvkCKy", "stackHeight": 2 },
                        { "programIdIndex": 6, "accounts": [3, 4, 5], "data": "3Dacfv7Skxgf", "stackHeight": 2 }
                    ]
                }
            ],
            "logMessages": [
                format!("Program {JUPITER} invoke [1]"),
                "Program log: Instruction: Route",
                format!("Program {TOKEN} invoke [2]"),
                "Program log: Instruction: Transfer",
                format!("Program {TOKEN} consumed 4645 of 180000 compute units"),
                format!("Program {TOKEN} success"),
                format!("Program {TOKEN} invoke [2]"),
                "Program log: Instruction: Transfer",
                format!("Program {TOKEN} consumed 4736 of 170000 compute units"),
                format!("Program {TOKEN} success"),
                format!("Program {JUPITER} consumed 61234 of 200000 compute units"),
                format!("Program {JUPITER} success")
            ],
            "preTokenBalances": [],
            "postTokenBalances": [
                token_balance(1, USDC_MINT, PAYER, 6),
                token_balance(2, USDC_MINT, RESERVE_OWNER, 6),
                token_balance(3, WSOL_MINT, RESERVE_OWNER, 9),
                token_balance(4, WSOL_MINT, PAYER, 9)
            ],
            "computeUnitsConsumed": 61234
        }
    })
}

fn token_balance(account_index: u8, mint: &str, owner: &str, decimals: u8) -> Value {
    serde_json::json!({
        "accountIndex": account_index,
        "mint": mint,
        "owner": owner,
        "programId": TOKEN,
        "uiTokenAmount": { "amount": "0", "decimals": decimals, "uiAmount": 0.0, "uiAmountString": "0" }
    })
}

#[test]
fn test_routing_program_nests_two_transfers() {
    let snapshot = TransactionSnapshot::from_rpc_value(swap_fixture()).unwrap();

    let reconstruction = reconstruct(&snapshot, Cluster::MainnetBeta).unwrap();

    assert_eq!(reconstruction.logs.inner_stack_heights.as_slice(), &[1, 1]);
    assert_eq!(reconstruction.forest.len(), 1);
    let root = &reconstruction.forest[0];
    assert_eq!(root.instruction.program_id, JUPITER_V4_PROGRAM_ID);
    assert_eq!(root.children.len(), 2);
    assert!(root.children.iter().all(|child| child.children.is_empty()));
    assert!(root.children.iter().all(|child| child.stack_height == 1));
}

#[test]
fn test_analysis_reports_transfers_in_emission_order() {
    let snapshot = TransactionSnapshot::from_rpc_value(swap_fixture()).unwrap();

    let analysis = TransactionAnalyzer::new(Cluster::MainnetBeta)
        .analyze(&snapshot)
        .unwrap();

    assert_eq!(analysis.transfers.len(), 2);

    let usdc = &analysis.transfers[0];
    assert_eq!(usdc.mint.map(|m| m.to_string()).as_deref(), Some(USDC_MINT));
    assert_eq!(usdc.source_owner.to_string(), PAYER);
    assert_eq!(
        usdc.destination_owner.map(|o| o.to_string()).as_deref(),
        Some(RESERVE_OWNER)
    );
    assert_eq!(usdc.display_amount(), "3390.279423");

    let wsol = &analysis.transfers[1];
    assert_eq!(wsol.mint.map(|m| m.to_string()).as_deref(), Some(WSOL_MINT));
    assert_eq!(wsol.source_owner.to_string(), RESERVE_AUTHORITY);
    assert_eq!(wsol.display_amount(), "25.0");

    assert_eq!(analysis.summary.top_level_instructions, 1);
    assert_eq!(analysis.summary.inner_instructions, 2);
    assert_eq!(analysis.summary.programs.len(), 2);
    assert_eq!(analysis.summary.programs[1].invocation_count, 2);
}

#[test]
fn test_analysis_describes_route_and_flags() {
    let snapshot = TransactionSnapshot::from_rpc_value(swap_fixture()).unwrap();

    let analysis = TransactionAnalyzer::new(Cluster::MainnetBeta)
        .analyze(&snapshot)
        .unwrap();

    let root = &analysis.instructions[0];
    match &root.view {
        InstructionView::HighLevel(summary) => {
            assert_eq!(summary.program, "Jupiter Aggregator v4");
            assert_eq!(summary.method, "route");
            assert!(summary.args[0].value.starts_with("0xe517cb977ae3ad2a"));
        }
        other => panic!("expected route summary, got {other:?}"),
    }

    let flags: Vec<(bool, bool)> = root
        .accounts
        .iter()
        .map(|a| (a.is_signer, a.is_writable))
        .collect();
    assert_eq!(
        flags,
        vec![
            (true, true),
            (false, true),
            (false, true),
            (false, true),
            (false, true),
            (false, false),
            (false, false),
        ]
    );

    let record = &analysis.logs[0];
    assert_eq!(record.invoked_program.as_deref(), Some(JUPITER));
    assert!(record
        .logs
        .iter()
        .any(|line| line.style == LogStyle::Info && line.text == "Program invoked: Token Program"));
    assert_eq!(analysis.compute_units_consumed, Some(61234));
}

#[test]
fn test_destination_missing_from_balances_stays_raw() {
    let mut fixture = swap_fixture();
    // Drop the wSOL destination balance.
    fixture["meta"]["postTokenBalances"]
        .as_array_mut()
        .unwrap()
        .retain(|balance| balance["accountIndex"] != 4);
    let snapshot = TransactionSnapshot::from_rpc_value(fixture).unwrap();

    let analysis = TransactionAnalyzer::new(Cluster::MainnetBeta)
        .analyze(&snapshot)
        .unwrap();

    assert_eq!(analysis.transfers.len(), 2);
    let wsol = &analysis.transfers[1];
    assert!(wsol.mint.is_none());
    assert!(wsol.destination_owner.is_none());
    assert_eq!(wsol.display_amount(), "25000000000");
    assert_eq!(analysis.summary.unresolved_transfers, 1);
}

#[test]
fn test_missing_invoke_logs_abort_reconstruction() {
    let mut fixture = swap_fixture();
    fixture["meta"]["logMessages"] = serde_json::json!([
        format!("Program {JUPITER} invoke [1]"),
        format!("Program {TOKEN} invoke [2]"),
        format!("Program {TOKEN} success"),
        format!("Program {JUPITER} success")
    ]);
    let snapshot = TransactionSnapshot::from_rpc_value(fixture).unwrap();

    let err = reconstruct(&snapshot, Cluster::MainnetBeta).unwrap_err();

    assert_eq!(
        err,
        ReconstructError::StackHeightExhausted {
            top_level_index: 0,
            inner_index: 1,
            consumed: 1,
        }
    );
}

#[test]
fn test_analysis_serializes_to_json() {
    let snapshot = TransactionSnapshot::from_rpc_value(swap_fixture()).unwrap();
    let analysis = TransactionAnalyzer::new(Cluster::MainnetBeta)
        .analyze(&snapshot)
        .unwrap();

    let json = serde_json::to_value(&analysis).unwrap();

    assert_eq!(json["signature"], SIGNATURE);
    assert_eq!(json["cluster"], "mainnet-beta");
    assert_eq!(json["instructions"][0]["view"]["kind"], "highLevel");
    assert_eq!(json["instructions"][0]["children"][0]["view"]["method"], "transfer");
    assert_eq!(json["transfers"][0]["amount"], "3390279423");
}

#[test]
fn test_balance_changes_diff_pre_and_post_balances() {
    let mut fixture = swap_fixture();
    let mut spent = token_balance(1, USDC_MINT, PAYER, 6);
    spent["uiTokenAmount"]["amount"] = Value::from("3390279423");
    fixture["meta"]["preTokenBalances"] = serde_json::json!([spent]);
    let snapshot = TransactionSnapshot::from_rpc_value(fixture).unwrap();

    let analysis = TransactionAnalyzer::new(Cluster::MainnetBeta)
        .analyze(&snapshot)
        .unwrap();

    assert_eq!(analysis.token_balance_changes.len(), 1);
    let change = &analysis.token_balance_changes[0];
    assert_eq!(change.account.to_string(), USER_USDC);
    assert_eq!(change.owner.map(|owner| owner.to_string()).as_deref(), Some(PAYER));
    assert_eq!(change.display_change(), "-3390.279423");

    let json = serde_json::to_value(&analysis).unwrap();
    assert_eq!(json["tokenBalanceChanges"][0]["preAmount"], "3390279423");
    assert_eq!(json["tokenBalanceChanges"][0]["postAmount"], "0");
}
