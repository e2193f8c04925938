use std::fmt::Write as _;

use serde::Serialize;
use shared::domain::{IndexedRecord, RegistrySnapshot, TransactionReceipt};

/// The single JSON document `create --json` prints. `registry` is null when the
/// follow-up refresh failed.
#[derive(Debug, Serialize)]
pub struct SubmissionReport<'a> {
    pub receipt: &'a TransactionReceipt,
    pub registry: Option<&'a RegistrySnapshot>,
}

pub fn render_snapshot(snapshot: &RegistrySnapshot) -> String {
    let mut out = String::new();
    render_section(&mut out, "Forward swaps", &snapshot.bilateral);
    out.push('\n');
    render_section(&mut out, "Other contracts", &snapshot.other);
    out
}

fn render_section(out: &mut String, title: &str, entries: &[IndexedRecord]) {
    let _ = writeln!(out, "== {title} ({}) ==", entries.len());
    if entries.is_empty() {
        out.push_str("(none)\n");
    }
    for entry in entries {
        render_record(out, entry);
    }
}

fn render_record(out: &mut String, entry: &IndexedRecord) {
    let record = &entry.record;
    let _ = writeln!(out, "Contract {}", entry.index);
    let _ = writeln!(out, "  Party A: {}", record.party_a);
    let _ = writeln!(out, "  Party B: {}", record.party_b);
    let _ = writeln!(out, "  ETH Notional: {}", record.eth_notional);
    let _ = writeln!(out, "  USDC Notional: {}", record.usdc_notional);
    let _ = writeln!(out, "  ETH Rate: {}%", record.eth_rate);
    let _ = writeln!(out, "  USDC Rate: {}%", record.usdc_rate);
    let _ = writeln!(out, "  Payment Interval: {}s", record.payment_interval);
    let _ = writeln!(out, "  Total Duration: {}s", record.total_duration);
}

pub fn render_receipt(receipt: &TransactionReceipt) -> String {
    match receipt.block_number {
        Some(block) => format!(
            "transaction {} included in block {block} (gas used {})",
            receipt.transaction_hash, receipt.gas_used
        ),
        None => format!(
            "transaction {} acknowledged (gas used {})",
            receipt.transaction_hash, receipt.gas_used
        ),
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
