use ahash::AHashMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::classify::EventKind;
use crate::config::AnalyzerConfig;
use crate::diameter::{self, UsageCounters};
use crate::model::{DataUsage, PgwAction, PgwEvent, SessionStatus};
use crate::parser::{self, Block};

static RE_PGW_EVENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)pgw/session/(create|delete).*?pgw_session["\s:]+([^,"}\s]+)"#).unwrap()
});

/// PGW session create/delete notifications, one per marker, stamped with
/// the record they were logged in. Single-line records count.
pub fn pgw_events(records: &[Block], config: &AnalyzerConfig) -> Vec<PgwEvent> {
    let mut out = Vec::new();
    for rec in records {
        let body = parser::bounded(&rec.body, config.max_block_bytes);
        let text = format!("{}\n{}", rec.preamble, body);
        for caps in RE_PGW_EVENT.captures_iter(&text) {
            let action = match &caps[1] {
                "create" => PgwAction::Create,
                _ => PgwAction::Delete,
            };
            out.push(PgwEvent {
                timestamp: rec.timestamp.clone(),
                action,
                session: caps[2].to_string(),
            });
        }
    }
    out
}

struct SessionAcc {
    usage: DataUsage,
    counters: UsageCounters,
}

impl SessionAcc {
    fn new(key: String, timestamp: &str) -> Self {
        Self {
            usage: DataUsage {
                session_id: key,
                imsi: None,
                msisdn: None,
                apn: None,
                service: None,
                ip: None,
                start_ts: timestamp.to_string(),
                end_ts: timestamp.to_string(),
                in_bytes: 0,
                out_bytes: 0,
                total_bytes: 0,
                voice_secs: 0,
                request_count: 0,
                last_result: None,
                status: SessionStatus::Active,
            },
            counters: UsageCounters::default(),
        }
    }

    fn finish(mut self) -> DataUsage {
        let c = self.counters;
        self.usage.in_bytes = c.input_octets;
        self.usage.out_bytes = c.output_octets;
        self.usage.total_bytes = if c.total_octets > 0 {
            c.total_octets
        } else {
            c.input_octets.saturating_add(c.output_octets)
        };
        self.usage.voice_secs = c.time_secs;
        self.usage
    }
}

fn fill(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value;
    }
}

/// Credit-control traffic folded per charging session: keyed by SessionId,
/// else IMSI, else its position among sessions.
pub fn data_usage(blocks: &[Block], config: &AnalyzerConfig) -> Vec<DataUsage> {
    let mut index: AHashMap<String, usize> = AHashMap::new();
    let mut sessions: Vec<SessionAcc> = Vec::new();

    for block in blocks {
        let body = parser::bounded(&block.body, config.max_block_bytes);
        let is_diameter = matches!(block.kind, EventKind::Diameter(_));
        let id = diameter::extract_identity(body);
        let usage = diameter::extract_usage(body);
        let relevant = diameter::is_charging_body(body)
            || (is_diameter && (id.session_id.is_some() || usage != UsageCounters::default()));
        if !relevant {
            continue;
        }

        let key = id
            .session_id
            .clone()
            .or_else(|| id.imsi.clone())
            .unwrap_or_else(|| format!("session-{}", sessions.len() + 1));
        let i = *index.entry(key.clone()).or_insert_with(|| {
            sessions.push(SessionAcc::new(key, &block.timestamp));
            sessions.len() - 1
        });

        let acc = &mut sessions[i];
        let u = &mut acc.usage;
        u.end_ts = block.timestamp.clone();
        if id.request_type.is_some() {
            u.request_count += 1;
        }
        if id.is_termination() {
            u.status = SessionStatus::Terminated;
        }
        if let Some(result) = diameter::extract_result(body) {
            u.last_result = Some(result.to_string());
        }
        fill(&mut u.imsi, id.imsi);
        fill(&mut u.msisdn, id.msisdn);
        fill(&mut u.apn, id.apn);
        fill(&mut u.service, id.service);
        fill(&mut u.ip, id.framed_ip);

        acc.counters = UsageCounters {
            input_octets: acc.counters.input_octets.saturating_add(usage.input_octets),
            output_octets: acc.counters.output_octets.saturating_add(usage.output_octets),
            total_octets: acc.counters.total_octets.saturating_add(usage.total_octets),
            time_secs: acc.counters.time_secs.saturating_add(usage.time_secs),
        };
    }

    let out: Vec<DataUsage> = sessions.into_iter().map(SessionAcc::finish).collect();
    tracing::debug!(sessions = out.len(), "folded charging sessions");
    out
}

/// `512 B`, `1.5 KB`, `3.2 MB`, `1.0 GB` (binary units).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
