//! Plain-text rendering of a transaction analysis.

use std::fmt::Write;

use ixtree::{
    analyzer::{format_block_time, AnalyzedInstruction},
    interpret::InstructionView,
    programs::shorten_address,
    transfers::AssetTransfer,
    TransactionAnalysis,
};
use solana_client::rpc_response::RpcConfirmedTransactionStatusWithSignature;

const INDENT: &str = "    ";

const KNOWN_MINTS: &[(&str, &str)] = &[
    ("So11111111111111111111111111111111111111112", "wSOL"),
    ("mSoLzYCxHdYgdzU16g5QSh3i5K3z3KZK7ytfqcJm7So", "mSOL"),
    ("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", "USDC"),
    ("Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB", "USDT"),
];

/// Short human labels for account addresses.
pub struct AccountLabeler<'a> {
    fee_payer: Option<&'a str>,
}

impl<'a> AccountLabeler<'a> {
    pub fn new(fee_payer: Option<&'a str>) -> Self {
        Self { fee_payer }
    }

    pub fn label(&self, address: &str) -> String {
        if self.fee_payer == Some(address) {
            return "[feePayer]".to_string();
        }
        KNOWN_MINTS
            .iter()
            .find(|(mint, _)| *mint == address)
            .map(|(_, symbol)| symbol.to_string())
            .unwrap_or_else(|| shorten_address(address, 4))
    }
}

/// One-line call form of an instruction.
pub fn format_call(view: &InstructionView, labeler: &AccountLabeler) -> String {
    match view {
        InstructionView::HighLevel(summary) => {
            let params: Vec<String> = summary
                .args
                .iter()
                .map(|arg| format!("{}={}", arg.name, arg.value))
                .chain(summary.accounts_of_interest.iter().map(|aoi| {
                    format!("{}={}", aoi.role, labeler.label(&aoi.account.to_string()))
                }))
                .collect();
            format!("[{}].{}({})", summary.program, summary.method, params.join(", "))
        }
        InstructionView::Raw { program, data_hex } => {
            format!("[{program}].unknown(ixData=0x{data_hex})")
        }
    }
}

pub fn format_transfer(transfer: &AssetTransfer, labeler: &AccountLabeler) -> String {
    let amount = if transfer.is_resolved() {
        transfer.display_amount()
    } else {
        format!("{} raw", transfer.display_amount())
    };
    let mint = transfer
        .mint
        .map(|mint| labeler.label(&mint.to_string()))
        .unwrap_or_else(|| "?".to_string());
    let to = transfer
        .destination_owner
        .unwrap_or(transfer.destination)
        .to_string();

    format!(
        "Transfer {amount} {mint} from {} to {}",
        labeler.label(&transfer.source_owner.to_string()),
        labeler.label(&to)
    )
}

fn write_instruction(
    out: &mut String,
    ix: &AnalyzedInstruction,
    depth: usize,
    labeler: &AccountLabeler,
) {
    let _ = writeln!(out, "{}{}", INDENT.repeat(depth), format_call(&ix.view, labeler));
    for child in &ix.children {
        write_instruction(out, child, depth + 1, labeler);
    }
}

pub fn render_text(analysis: &TransactionAnalysis) -> String {
    let labeler = AccountLabeler::new(analysis.fee_payer.as_deref());
    let mut out = String::new();

    let status = match &analysis.error {
        None => "Success".to_string(),
        Some(err) => format!("Failed: {err}"),
    };
    let _ = writeln!(out, "Signature: {}", analysis.signature);
    let _ = writeln!(
        out,
        "Slot: {} | Time: {} | Status: {}",
        analysis.slot, analysis.block_time_formatted, status
    );
    let _ = writeln!(
        out,
        "Fee: {} lamports | Compute units: {}",
        analysis.fee,
        analysis
            .compute_units_consumed
            .map(|cu| cu.to_string())
            .unwrap_or_else(|| "-".to_string())
    );

    let _ = writeln!(out, "\nInstructions:");
    for (index, ix) in analysis.instructions.iter().enumerate() {
        let _ = write!(out, "#{} ", index + 1);
        write_instruction(&mut out, ix, 0, &labeler);
    }

    if !analysis.transfers.is_empty() {
        let _ = writeln!(out, "\nTransfers:");
        for transfer in &analysis.transfers {
            let _ = writeln!(out, "{INDENT}{}", format_transfer(transfer, &labeler));
        }
    }

    if !analysis.token_balance_changes.is_empty() {
        let _ = writeln!(out, "\nToken balance changes:");
        for change in &analysis.token_balance_changes {
            let holder = change.owner.unwrap_or(change.account).to_string();
            let _ = writeln!(
                out,
                "{INDENT}{} {} {}",
                labeler.label(&holder),
                change.display_change(),
                labeler.label(&change.mint.to_string())
            );
        }
    }

    let _ = writeln!(out, "\nProgram logs:");
    for (index, (record, ix)) in analysis
        .logs
        .iter()
        .zip(&analysis.instructions)
        .enumerate()
    {
        let marker = if record.failed { " (failed)" } else { "" };
        let _ = writeln!(out, "#{} {}{}", index + 1, ix.program_name, marker);
        for line in &record.logs {
            let _ = writeln!(out, "{INDENT}{}{}", line.prefix, line.text);
        }
        if record.truncated {
            let _ = writeln!(out, "{INDENT}Log truncated");
        }
    }

    out
}

/// `<time> <Err|Success> <signature>` for one account history entry.
pub fn format_signature_line(entry: &RpcConfirmedTransactionStatusWithSignature) -> String {
    let status = if entry.err.is_some() { "Err" } else { "Success" };
    format!(
        "{} {status} {}",
        format_block_time(entry.block_time),
        entry.signature
    )
}

pub fn render_account_history(
    address: &str,
    entries: &[RpcConfirmedTransactionStatusWithSignature],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Account: {address}");
    let _ = writeln!(out, "\nRecent transactions ({}):", entries.len());
    for entry in entries {
        let _ = writeln!(out, "{INDENT}{}", format_signature_line(entry));
    }
    out
}
