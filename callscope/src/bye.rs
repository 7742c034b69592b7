use itertools::Itertools;

use crate::analysis::CallFilter;
use crate::classify::SipMethod;
use crate::config::AnalyzerConfig;
use crate::correlation;
use crate::extract;
use crate::model::ByeAnalysis;
use crate::parser::{self, Block};
use crate::tables;

pub const USER_HANGUP_NOTE: &str = "No Reason header - likely user-initiated hang-up";

/// First BYE in the log. With caller/callee hints it must also name one of
/// the hinted parties: a number in any dialing format, or a hinted IMSI as a
/// From/To/P-Asserted-Identity user part.
pub fn find_bye<'a>(blocks: &'a [Block], filter: &CallFilter, config: &AnalyzerConfig) -> Option<&'a Block> {
    let numbers = filter.numbers();
    let imsis = filter.imsis();
    blocks.iter().find(|b| {
        if !b.kind.is_request(SipMethod::Bye) {
            return false;
        }
        let body = parser::bounded(&b.body, config.max_block_bytes);
        numbers.is_empty()
            || extract::mentions_number(body, &numbers, &config.national_prefix)
            || [extract::from_digits(body), extract::to_digits(body), extract::asserted_digits(body)]
                .into_iter()
                .flatten()
                .any(|d| imsis.contains(&d))
    })
}

fn sender_label(from_raw: Option<&str>, sender: &str, filter: &CallFilter) -> String {
    let is = |norm: &Option<String>, imsi: &Option<String>| {
        norm.as_deref() == Some(sender) || (imsi.is_some() && imsi.as_deref() == from_raw)
    };
    if is(&filter.caller_norm, &filter.caller_imsi) {
        format!("Caller ({})", filter.caller.as_deref().unwrap_or(sender))
    } else if is(&filter.callee_norm, &filter.callee_imsi) {
        format!("Callee ({})", filter.callee.as_deref().unwrap_or(sender))
    } else {
        format!("+{sender}")
    }
}

/// A de-registration marker in any block that also names one of `parties`.
fn deregistered(blocks: &[Block], parties: &[&str], config: &AnalyzerConfig) -> bool {
    blocks.iter().any(|b| {
        let body = parser::bounded(&b.body, config.max_block_bytes);
        config.deregistration_markers.iter().any(|m| body.contains(m.as_str()))
            && extract::mentions_number(body, parties, &config.national_prefix)
    })
}

/// Who hung up and why. Evidence is gathered in a fixed priority order and
/// falls back to a user hang-up note when nothing explains the BYE.
pub fn analyze_bye(blocks: &[Block], text: &str, filter: &CallFilter, config: &AnalyzerConfig) -> Option<ByeAnalysis> {
    let bye = find_bye(blocks, filter, config)?;
    let body = parser::bounded(&bye.body, config.max_block_bytes);

    let from_raw = extract::from_digits(body);
    let sender = from_raw
        .map(|d| extract::normalize_number(d, &config.national_prefix))
        .unwrap_or_else(|| "unknown".to_string());
    let reason = extract::reason(body).map(str::to_string);

    let mut evidence = Vec::new();
    if let Some(r) = &reason {
        evidence.push(format!("Reason header: {r}"));
    }
    if let Some(ua) = extract::user_agent(body) {
        evidence.push(format!("Sent by device: {ua}"));
    }

    let own: Vec<String> = [extract::from_digits(body), extract::to_digits(body)]
        .into_iter()
        .flatten()
        .filter(|d| extract::is_phone_number(d))
        .map(|d| extract::normalize_number(d, &config.national_prefix))
        .collect();
    let parties: Vec<&str> = match filter.numbers() {
        hinted if hinted.is_empty() => own.iter().map(String::as_str).collect(),
        hinted => hinted,
    };
    if deregistered(blocks, &parties, config) {
        evidence.push("Device de-registered immediately after BYE".to_string());
    }

    if let Some(cause) = extract::hangup_cause(body, config) {
        evidence.push(format!("Hangup cause: {cause}"));
    }
    let code = extract::hangup_cause_code(body, config)
        .or_else(|| reason.as_deref().and_then(extract::q850_cause_in));
    if let Some(code) = code {
        evidence.push(format!("Q.850 cause {code}: {}", tables::q850_cause(code)));
    }

    evidence.extend(correlation::teardown_evidence(text, bye.at, &filter.imsis()));

    if evidence.is_empty() {
        evidence.push(USER_HANGUP_NOTE.to_string());
    }

    Some(ByeAnalysis {
        sender: sender_label(from_raw, &sender, filter),
        sender_number: format!("+{sender}"),
        reason,
        raw_snippet: parser::truncate_chars(&bye.body, config.snippet_len),
        evidence: evidence.into_iter().unique().collect(),
    })
}
