use ahash::AHashMap;
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::classify::{EventKind, SipMethod};
use crate::config::AnalyzerConfig;
use crate::extract;
use crate::parser::{self, Block};

/// Requests whose repeats under one branch count as retransmissions.
pub const RETRANSMITTED_METHODS: [SipMethod; 3] = [SipMethod::Invite, SipMethod::Bye, SipMethod::Cancel];

static RE_TEARDOWN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2}_\d{2}:\d{2}:\d{2}\.\d+).*?pgw/session/delete.*?(\d{15,})").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retransmission {
    pub method: SipMethod,
    pub branch: String,
    pub count: usize,
}

/// Counts requests per (method, branch) and reports every pair seen more
/// than once, in order of first sighting.
pub fn detect_retransmissions(blocks: &[Block], config: &AnalyzerConfig) -> Vec<Retransmission> {
    let mut index: AHashMap<(SipMethod, String), usize> = AHashMap::new();
    let mut seen: Vec<Retransmission> = Vec::new();

    for block in blocks {
        let body = parser::bounded(&block.body, config.max_block_bytes);
        let EventKind::Request(method) = block.kind else { continue };
        if !RETRANSMITTED_METHODS.contains(&method) {
            continue;
        }
        let Some(branch) = extract::branch(body) else { continue };
        match index.get(&(method, branch.to_string())) {
            Some(&i) => seen[i].count += 1,
            None => {
                index.insert((method, branch.to_string()), seen.len());
                seen.push(Retransmission { method, branch: branch.to_string(), count: 1 });
            }
        }
    }

    seen.retain(|r| r.count > 1);
    if !seen.is_empty() {
        tracing::debug!(transactions = seen.len(), "retransmitted requests found");
    }
    seen
}

/// A `pgw/session/delete` line with its timestamp and subscriber identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownMarker {
    pub timestamp: String,
    pub at: Option<NaiveDateTime>,
    pub imsi: String,
}

pub fn teardown_markers(text: &str) -> Vec<TeardownMarker> {
    text.lines()
        .filter_map(|line| {
            let caps = RE_TEARDOWN.captures(line)?;
            Some(TeardownMarker {
                timestamp: caps[1].to_string(),
                at: parser::parse_timestamp(&caps[1]),
                imsi: caps[2].to_string(),
            })
        })
        .collect()
}

/// Session teardowns logged at or before the BYE. With an IMSI filter only
/// the filtered subscribers count. Unparseable timestamps never match.
pub fn teardown_evidence(text: &str, bye_at: Option<NaiveDateTime>, imsi_filter: &[&str]) -> Vec<String> {
    let Some(bye_at) = bye_at else { return Vec::new() };
    teardown_markers(text)
        .into_iter()
        .filter(|m| m.at.is_some_and(|t| t <= bye_at))
        .filter(|m| imsi_filter.is_empty() || imsi_filter.contains(&m.imsi.as_str()))
        .map(|m| format!("PGW session for IMSI {} torn down before/at BYE", m.imsi))
        .collect()
}
