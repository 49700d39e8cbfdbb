//! Best-effort reply synthesis for capped or aborted turns.
//!
//! When the loop runs out of iterations or wall-clock budget without a model
//! answer, the turn still gets a reply built from whatever the tools
//! gathered. The synthesis honors the same contract as live replies: an
//! infrastructure failure is "could not check", never "does not exist".

use patter_types::commerce::currency_symbol;
use patter_types::conversation::{ToolCallRecord, ToolOutcome};
use patter_types::search::{SearchReport, SearchResult};
use serde_json::Value;

/// How many results a synthesized reply lists before truncating.
const MAX_LISTED: usize = 3;

/// Build a reply from the tool results gathered across all iterations.
pub fn synthesize_reply(records: &[ToolCallRecord]) -> String {
    let mut reports: Vec<SearchReport> = Vec::new();
    let mut order_status: Option<String> = None;
    let mut any_failure = false;

    for record in records {
        match &record.outcome {
            ToolOutcome::Success { value } => match record.name.as_str() {
                "search_products" | "get_product_details" => {
                    if let Ok(report) = serde_json::from_value::<SearchReport>(value.clone()) {
                        reports.push(report);
                    }
                }
                "check_order_status" => {
                    if let Some(line) = order_line(value) {
                        order_status = Some(line);
                    }
                }
                _ => {}
            },
            ToolOutcome::Failure { .. } => any_failure = true,
        }
    }

    if let Some(report) = reports.iter().filter(|r| !r.results.is_empty()).next_back() {
        return list_reply(report);
    }
    if let Some(line) = order_status {
        return line;
    }
    if any_failure || reports.iter().any(SearchReport::infrastructure_failure) {
        return "I'm having trouble reaching the store systems right now, so I \
                couldn't check that for you. Please try again in a moment."
            .to_string();
    }
    if let Some(report) = reports.last() {
        return format!(
            "I searched the catalog for \"{}\" and couldn't find a match. \
             Could you try different wording?",
            report.query
        );
    }
    "I couldn't put together a full answer this time. Could you rephrase or \
     narrow down what you're looking for?"
        .to_string()
}

fn list_reply(report: &SearchReport) -> String {
    let mut reply = format!(
        "I didn't get to a full answer in time, but here's what the search \
         found for \"{}\":",
        report.query
    );
    for (i, result) in report.results.iter().take(MAX_LISTED).enumerate() {
        reply.push_str(&format!("\n{}. {}", i + 1, display_line(result)));
    }
    let remaining = report.results.len().saturating_sub(MAX_LISTED);
    if remaining > 0 {
        reply.push_str(&format!("\n...and {remaining} more."));
    }
    reply
}

fn display_line(result: &SearchResult) -> String {
    let name = result
        .payload
        .get("name")
        .and_then(Value::as_str)
        .or_else(|| result.payload.get("title").and_then(Value::as_str))
        .unwrap_or(&result.product_id);
    match money(&result.payload, "price") {
        Some(price) => format!("{name} ({price})"),
        None => name.to_string(),
    }
}

fn order_line(value: &Value) -> Option<String> {
    let order_ref = value.get("order_ref").and_then(Value::as_str)?;
    if value.get("found").and_then(Value::as_bool) == Some(false) {
        return Some(format!("I couldn't find an order matching #{order_ref}."));
    }
    let status = value.get("status").and_then(Value::as_str)?;
    let mut line = format!("Order #{order_ref} is {status}.");
    if let Some(total) = money(value, "total") {
        line.push_str(&format!(" Total: {total}."));
    }
    Some(line)
}

/// Format a numeric amount under `key` with its currency.
fn money(payload: &Value, key: &str) -> Option<String> {
    let amount = payload.get(key).and_then(Value::as_f64)?;
    let code = payload
        .get("currency")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if code.is_empty() {
        return Some(format!("{amount:.2}"));
    }
    Some(format!("{}{amount:.2}", currency_symbol(code)))
}
