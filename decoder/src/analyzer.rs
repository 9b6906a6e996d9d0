//! Transaction analyzer
//!
//! Runs the full pipeline over one snapshot: log parsing, instruction
//! resolution, tree reconstruction, interpretation and transfer extraction.
//! The result is a plain serializable value for whatever renders it.

use std::time::Instant;

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

use crate::{
    error::ReconstructError,
    interpret::{describe, InstructionView},
    logs::{parse_program_logs, InstructionLogRecord, ParsedProgramLogs},
    programs::{program_name, Cluster},
    snapshot::TransactionSnapshot,
    transfers::{
        extract_asset_transfers, token_balance_changes, AssetTransfer, TokenBalanceChange,
        TokenBalanceIndex,
    },
    tree::{build_instruction_forest, InstructionTreeNode},
};

const SLOW_ANALYSIS_MS: u128 = 100;

// ============================================================================
// Reconstruction
// ============================================================================

/// The nested call tree of a transaction plus the logs it was built from.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub forest: Vec<InstructionTreeNode>,
    pub logs: ParsedProgramLogs,
}

/// Parse the logs of `snapshot` and nest its inner instructions.
pub fn reconstruct(
    snapshot: &TransactionSnapshot,
    cluster: Cluster,
) -> Result<Reconstruction, ReconstructError> {
    let logs = parse_program_logs(&snapshot.log_messages, snapshot.err.as_ref(), cluster);
    let forest = build_instruction_forest(snapshot, &logs.inner_stack_heights)?;
    Ok(Reconstruction { forest, logs })
}

// ============================================================================
// Analysis Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedAccount {
    pub pubkey: String,
    pub is_signer: bool,
    pub is_writable: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedInstruction {
    pub program_id: String,
    pub program_name: String,
    pub accounts: Vec<AnalyzedAccount>,
    pub data_hex: String,
    pub view: InstructionView,
    pub stack_height: usize,
    pub children: Vec<AnalyzedInstruction>,
}

impl AnalyzedInstruction {
    fn from_node(node: &InstructionTreeNode, cluster: Cluster) -> Self {
        let ix = &node.instruction;
        Self {
            program_id: ix.program_id.to_string(),
            program_name: program_name(&ix.program_id, cluster),
            accounts: ix
                .accounts
                .iter()
                .map(|meta| AnalyzedAccount {
                    pubkey: meta.pubkey.to_string(),
                    is_signer: meta.is_signer,
                    is_writable: meta.is_writable,
                })
                .collect(),
            data_hex: hex::encode(&ix.data),
            view: describe(ix, cluster),
            stack_height: node.stack_height,
            children: node
                .children
                .iter()
                .map(|child| Self::from_node(child, cluster))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramInfo {
    pub pubkey: String,
    pub name: String,
    pub invocation_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummaryInfo {
    pub top_level_instructions: usize,
    pub inner_instructions: usize,
    pub transfer_count: usize,
    pub unresolved_transfers: usize,
    /// Distinct programs in first-invocation order.
    pub programs: Vec<ProgramInfo>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionAnalysis {
    pub signature: String,
    pub cluster: Cluster,
    pub slot: u64,
    pub block_time: Option<i64>,
    pub block_time_formatted: String,
    pub success: bool,
    pub error: Option<String>,
    pub fee: u64,
    pub compute_units_consumed: Option<u64>,
    pub fee_payer: Option<String>,
    pub instructions: Vec<AnalyzedInstruction>,
    /// One record per top-level instruction.
    pub logs: Vec<InstructionLogRecord>,
    pub transfers: Vec<AssetTransfer>,
    pub token_balance_changes: Vec<TokenBalanceChange>,
    pub summary: TransactionSummaryInfo,
}

/// Block time as a UTC timestamp, `Unknown` when the node did not report one.
pub fn format_block_time(block_time: Option<i64>) -> String {
    match block_time {
        Some(block_time) => chrono::DateTime::from_timestamp(block_time, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "Invalid".to_string()),
        None => "Unknown".to_string(),
    }
}

// ============================================================================
// Analyzer
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionAnalyzer {
    cluster: Cluster,
}

impl TransactionAnalyzer {
    pub fn new(cluster: Cluster) -> Self {
        Self { cluster }
    }

    pub fn analyze(
        &self,
        snapshot: &TransactionSnapshot,
    ) -> Result<TransactionAnalysis, ReconstructError> {
        let analyze_start = Instant::now();
        let signature = snapshot.signature.to_string();

        tracing::debug!(
            signature = %signature,
            instructions = snapshot.instructions.len(),
            log_lines = snapshot.log_messages.len(),
            "analyze: START"
        );

        let Reconstruction { forest, logs } = reconstruct(snapshot, self.cluster)?;

        tracing::trace!(
            signature = %signature,
            elapsed_us = analyze_start.elapsed().as_micros(),
            inner_stack_heights = logs.inner_stack_heights.len(),
            "analyze: tree reconstructed"
        );

        let program_ids: Vec<Pubkey> = forest
            .iter()
            .map(|root| root.instruction.program_id)
            .collect();
        let aligned_logs = logs.align_to_instructions(&program_ids);

        let balances = TokenBalanceIndex::new(&snapshot.post_token_balances, &snapshot.account_keys);
        let transfers = extract_asset_transfers(&forest, &balances);
        let balance_changes = token_balance_changes(
            &snapshot.pre_token_balances,
            &snapshot.post_token_balances,
            &snapshot.account_keys,
        );

        tracing::trace!(
            signature = %signature,
            elapsed_us = analyze_start.elapsed().as_micros(),
            transfers = transfers.len(),
            balance_changes = balance_changes.len(),
            "analyze: transfers extracted"
        );

        let instructions: Vec<AnalyzedInstruction> = forest
            .iter()
            .map(|root| AnalyzedInstruction::from_node(root, self.cluster))
            .collect();

        let summary = self.summarize(&forest, &transfers);

        let block_time_formatted = format_block_time(snapshot.block_time);

        let compute_units_consumed = snapshot.compute_units_consumed.or_else(|| {
            let logged: u64 = aligned_logs.iter().map(|record| record.compute_units).sum();
            (logged > 0).then_some(logged)
        });

        let total_ms = analyze_start.elapsed().as_millis();
        if total_ms > SLOW_ANALYSIS_MS {
            tracing::warn!(
                signature = %signature,
                total_ms,
                instructions = summary.top_level_instructions,
                inner = summary.inner_instructions,
                "analyze: SLOW"
            );
        } else {
            tracing::debug!(
                signature = %signature,
                total_us = analyze_start.elapsed().as_micros(),
                "analyze: COMPLETE"
            );
        }

        Ok(TransactionAnalysis {
            signature,
            cluster: self.cluster,
            slot: snapshot.slot,
            block_time: snapshot.block_time,
            block_time_formatted,
            success: snapshot.is_success(),
            error: snapshot.err.as_ref().map(|err| err.to_string()),
            fee: snapshot.fee,
            compute_units_consumed,
            fee_payer: snapshot.fee_payer().map(|payer| payer.to_string()),
            instructions,
            logs: aligned_logs,
            transfers,
            token_balance_changes: balance_changes,
            summary,
        })
    }

    fn summarize(
        &self,
        forest: &[InstructionTreeNode],
        transfers: &[AssetTransfer],
    ) -> TransactionSummaryInfo {
        let mut programs: Vec<ProgramInfo> = Vec::new();
        for node in forest.iter().flat_map(|root| root.walk()) {
            let pubkey = node.instruction.program_id.to_string();
            match programs.iter_mut().find(|p| p.pubkey == pubkey) {
                Some(program) => program.invocation_count += 1,
                None => programs.push(ProgramInfo {
                    name: program_name(&node.instruction.program_id, self.cluster),
                    pubkey,
                    invocation_count: 1,
                }),
            }
        }

        TransactionSummaryInfo {
            top_level_instructions: forest.len(),
            inner_instructions: forest.iter().map(|root| root.descendant_count()).sum(),
            transfer_count: transfers.len(),
            unresolved_transfers: transfers.iter().filter(|t| !t.is_resolved()).count(),
            programs,
        }
    }
}
