//! Program log parsing
//!
//! Turns the flat `logMessages` of a transaction into one record per
//! top-level invocation and recovers the call depth of every inner
//! invocation. The runtime emits no explicit nesting markers besides the
//! `invoke [n]` / `success` / `failed` bracket lines, so depth is tracked as a
//! running counter over those.

use std::{str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::Serialize;
use solana_sdk::{pubkey::Pubkey, transaction::TransactionError};

use crate::{
    programs::{program_name, shorten_address, Cluster},
    tree::StackHeightSequence,
};

// Program ids in runtime logs are base58.
static INVOKE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Program ([1-9A-HJ-NP-Za-km-z]+) invoke \[(\d+)\]$")
        .expect("Invalid invoke log regex")
});

static SUCCESS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Program [1-9A-HJ-NP-Za-km-z]+ success$").expect("Invalid success log regex")
});

static FAILED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Program [1-9A-HJ-NP-Za-km-z]+ failed: (.*)$").expect("Invalid failed log regex")
});

static CONSUMED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Program [1-9A-HJ-NP-Za-km-z]+ consumed (\d+) (.*)$")
        .expect("Invalid consumed log regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStyle {
    Muted,
    Info,
    Success,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub prefix: String,
    pub text: String,
    pub style: LogStyle,
}

impl LogLine {
    fn new(depth: usize, text: impl Into<String>, style: LogStyle) -> Self {
        Self {
            prefix: prefix_for_depth(depth),
            text: text.into(),
            style,
        }
    }
}

fn prefix_for_depth(depth: usize) -> String {
    format!("{}> ", "  ".repeat(depth.saturating_sub(1)))
}

/// Log span of a single top-level instruction, nested invocations included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstructionLogRecord {
    /// `None` when the span did not open with an explicit invoke line.
    pub invoked_program: Option<String>,
    pub failed: bool,
    pub truncated: bool,
    pub compute_units: u64,
    pub logs: Vec<LogLine>,
}

impl InstructionLogRecord {
    fn invoked(program: String) -> Self {
        Self {
            invoked_program: Some(program),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedProgramLogs {
    pub records: Vec<InstructionLogRecord>,
    /// Depth of every inner invocation, in emission order across all
    /// top-level instructions.
    pub inner_stack_heights: StackHeightSequence,
}

impl ParsedProgramLogs {
    /// Exactly one record per top-level instruction.
    ///
    /// A record is consumed when its invoked program matches the
    /// instruction's program, or when it has no explicit invoke but does carry
    /// lines. Instructions without a matching record get an empty one.
    pub fn align_to_instructions(&self, program_ids: &[Pubkey]) -> Vec<InstructionLogRecord> {
        let mut remaining = self.records.iter().peekable();
        program_ids
            .iter()
            .map(|program_id| {
                let consume = match remaining.peek() {
                    Some(record) => match &record.invoked_program {
                        Some(invoked) => *invoked == program_id.to_string(),
                        None => !record.logs.is_empty(),
                    },
                    None => false,
                };
                if consume {
                    remaining.next().cloned().unwrap_or_default()
                } else {
                    InstructionLogRecord::default()
                }
            })
            .collect()
    }
}

fn current_record(records: &mut Vec<InstructionLogRecord>) -> &mut InstructionLogRecord {
    if records.is_empty() {
        records.push(InstructionLogRecord::default());
    }
    let last = records.len() - 1;
    &mut records[last]
}

fn display_program(address: &str, cluster: Cluster) -> String {
    match Pubkey::from_str(address) {
        Ok(program_id) => program_name(&program_id, cluster),
        Err(_) => shorten_address(address, 4),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Parse raw program logs.
///
/// `error` is the top-level transaction error, used to flag the failing
/// instruction when the runtime aborted without logging it.
pub fn parse_program_logs(
    logs: &[String],
    error: Option<&TransactionError>,
    cluster: Cluster,
) -> ParsedProgramLogs {
    let mut depth: usize = 0;
    let mut records: Vec<InstructionLogRecord> = Vec::new();
    let mut stack_heights: Vec<usize> = Vec::new();

    for log in logs {
        if let Some(message) = log.strip_prefix("Program log: ") {
            current_record(&mut records).logs.push(LogLine::new(
                depth,
                format!("Program logged: \"{message}\""),
                LogStyle::Muted,
            ));
        } else if log.starts_with("Log truncated") {
            current_record(&mut records).truncated = true;
        } else if let Some(caps) = INVOKE_REGEX.captures(log) {
            let program = caps[1].to_string();
            let logged_height: Option<usize> = caps[2].parse().ok();
            if logged_height != Some(depth + 1) {
                tracing::debug!(
                    program = %program,
                    logged_height = ?logged_height,
                    tracked_depth = depth,
                    "parse_program_logs: invoke height disagrees with tracked depth"
                );
            }

            if depth == 0 {
                records.push(InstructionLogRecord::invoked(program));
            } else {
                stack_heights.push(depth);
                let name = display_program(&program, cluster);
                current_record(&mut records).logs.push(LogLine::new(
                    depth,
                    format!("Program invoked: {name}"),
                    LogStyle::Info,
                ));
            }
            depth += 1;
        } else if SUCCESS_REGEX.is_match(log) {
            current_record(&mut records).logs.push(LogLine::new(
                depth,
                "Program returned success",
                LogStyle::Success,
            ));
            depth = depth.saturating_sub(1);
        } else if let Some(caps) = FAILED_REGEX.captures(log) {
            let record = current_record(&mut records);
            record.failed = true;
            record.logs.push(LogLine::new(
                depth,
                format!("Program returned error: \"{}\"", &caps[1]),
                LogStyle::Warning,
            ));
            depth = depth.saturating_sub(1);
        } else if log.starts_with("failed") {
            // Verification failure of the previous program; shown one level in.
            let record = current_record(&mut records);
            record.failed = true;
            record
                .logs
                .push(LogLine::new(depth + 1, capitalize(log), LogStyle::Warning));
        } else {
            if depth == 0 {
                records.push(InstructionLogRecord::default());
                depth += 1;
            }
            let record = current_record(&mut records);
            let text = match CONSUMED_REGEX.captures(log) {
                Some(caps) => {
                    record.compute_units = caps[1].parse().unwrap_or(record.compute_units);
                    format!("Program consumed: {} {}", &caps[1], &caps[2])
                }
                None => log.clone(),
            };
            record.logs.push(LogLine::new(depth, text, LogStyle::Muted));
        }
    }

    if records.is_empty() && matches!(error, Some(TransactionError::InstructionError(..))) {
        records.push(InstructionLogRecord {
            failed: true,
            ..Default::default()
        });
    }

    if let Some(TransactionError::InstructionError(index, instruction_error)) = error {
        if *index as usize + 1 == records.len() {
            let record = current_record(&mut records);
            record.failed = true;
            record.logs.push(LogLine::new(
                1,
                format!("Runtime error: {instruction_error}"),
                LogStyle::Warning,
            ));
        }
    }

    tracing::trace!(
        records = records.len(),
        inner_invocations = stack_heights.len(),
        "parse_program_logs: COMPLETE"
    );

    ParsedProgramLogs {
        records,
        inner_stack_heights: StackHeightSequence::new(stack_heights),
    }
}
