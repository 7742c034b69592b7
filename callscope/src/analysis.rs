use rayon::prelude::*;
use serde::Deserialize;

use crate::anomaly;
use crate::bye;
use crate::charging;
use crate::config::AnalyzerConfig;
use crate::extract;
use crate::headers;
use crate::model::{
    AnalysisResult, Anomaly, DataUsage, Event, Participant, PgwEvent, Role, RoutingEntry, RtpStat, SdpSummary,
};
use crate::parser::{self, Block};
use crate::participants::{self, Roster};
use crate::routing;
use crate::rtp::{self, CodecTimeline};
use crate::sdp;
use crate::temporal;
use crate::timeline;

/// One analysis request: the log plus optional call hints and feature flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AnalyzeRequest {
    pub log: String,
    pub caller: Option<String>,
    pub callee: Option<String>,
    pub caller_imsi: Option<String>,
    pub callee_imsi: Option<String>,
    pub flags: Vec<String>,
}

impl AnalyzeRequest {
    pub fn new(log: impl Into<String>) -> Self {
        Self { log: log.into(), ..Self::default() }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    pub sdp: bool,
    pub pgw: bool,
    pub routing: bool,
}

impl Flags {
    /// `+sdp`, `+pgw`, `+routing` and the umbrella `+full`, case-insensitive.
    /// Unknown tokens are ignored.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        let mut flags = Flags::default();
        for token in tokens {
            match token.as_ref().trim().to_lowercase().as_str() {
                "+sdp" => flags.sdp = true,
                "+pgw" => flags.pgw = true,
                "+routing" => flags.routing = true,
                "+full" => flags = Flags { sdp: true, pgw: true, routing: true },
                other => tracing::debug!(flag = other, "ignoring unknown flag"),
            }
        }
        flags
    }
}

/// Caller/callee hints, normalized once. Blank hints count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallFilter {
    pub caller: Option<String>,
    pub callee: Option<String>,
    pub caller_norm: Option<String>,
    pub callee_norm: Option<String>,
    pub caller_imsi: Option<String>,
    pub callee_imsi: Option<String>,
}

fn present(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

impl CallFilter {
    pub fn from_request(req: &AnalyzeRequest, config: &AnalyzerConfig) -> Self {
        let norm = |hint: &Option<String>| {
            hint.as_deref()
                .map(|h| extract::normalize_number(h, &config.national_prefix))
                .filter(|n| !n.is_empty())
        };
        let caller = present(&req.caller);
        let callee = present(&req.callee);
        Self {
            caller_norm: norm(&caller),
            callee_norm: norm(&callee),
            caller,
            callee,
            caller_imsi: present(&req.caller_imsi),
            callee_imsi: present(&req.callee_imsi),
        }
    }

    /// Normalized caller and callee numbers that were supplied.
    pub fn numbers(&self) -> Vec<&str> {
        [&self.caller_norm, &self.callee_norm].into_iter().flatten().map(String::as_str).collect()
    }

    pub fn imsis(&self) -> Vec<&str> {
        [&self.caller_imsi, &self.callee_imsi].into_iter().flatten().map(String::as_str).collect()
    }

    /// Values an event must mention to survive timeline filtering.
    pub fn relevant(&self) -> Vec<String> {
        self.numbers()
            .into_iter()
            .chain(self.imsis())
            .map(str::to_string)
            .collect()
    }

    pub fn is_active(&self) -> bool {
        !self.relevant().is_empty()
    }

    pub fn has_parties(&self) -> bool {
        self.caller.is_some() || self.callee.is_some()
    }
}

/// Everything extracted from a log before any caller-specific view is
/// applied. Flag-gated sections are computed here regardless of flags.
#[derive(Debug, Clone)]
pub struct ParsedLog {
    pub text: String,
    pub blocks: Vec<Block>,
    pub timeline: Vec<Event>,
    pub participants: Roster,
    pub rtp_stats: Vec<RtpStat>,
    pub anomalies: Vec<Anomaly>,
    pub sdp: SdpSummary,
    pub pgw_events: Vec<PgwEvent>,
    pub data_usage: Vec<DataUsage>,
    pub routing: Vec<RoutingEntry>,
}

pub fn parse_log(log: &str, config: &AnalyzerConfig) -> ParsedLog {
    let _span = tracing::debug_span!("parse_log", bytes = log.len()).entered();
    let text = headers::normalize_headers(log);
    let records = parser::records(&text);
    let blocks: Vec<Block> = records.iter().filter(|b| !b.is_blank()).cloned().collect();
    tracing::debug!(records = records.len(), blocks = blocks.len(), "split log");

    let codecs = CodecTimeline::from_records(&records, config);
    ParsedLog {
        timeline: timeline::build_timeline(&blocks, config),
        participants: participants::resolve(&blocks, config),
        rtp_stats: rtp::collect_rtp_stats(&blocks, &codecs, config),
        anomalies: anomaly::detect_anomalies(&blocks, config),
        sdp: sdp::summarize_sdp(&blocks, config),
        pgw_events: charging::pgw_events(&records, config),
        data_usage: charging::data_usage(&blocks, config),
        routing: routing::routing_trace(&blocks, config),
        blocks,
        text,
    }
}

fn hinted(role: Role, hint: &str, norm: Option<&str>, imsi: Option<&String>, detected: &Roster) -> Participant {
    let norm = norm.unwrap_or_default();
    let seen = detected.get(norm);
    Participant {
        role,
        number: if hint.starts_with('+') { hint.to_string() } else { format!("+{norm}") },
        imsi: imsi.cloned().or_else(|| seen.and_then(|p| p.imsi.clone())),
        device: seen.and_then(|p| p.device.clone()),
        ip: seen.and_then(|p| p.ip.clone()),
    }
}

/// Hinted parties first with their roles fixed; bystanders only when no
/// party was named.
pub fn assemble_participants(detected: &Roster, filter: &CallFilter) -> Vec<Participant> {
    let mut out = Vec::new();
    if let Some(caller) = &filter.caller {
        out.push(hinted(Role::Caller, caller, filter.caller_norm.as_deref(), filter.caller_imsi.as_ref(), detected));
    }
    if let Some(callee) = &filter.callee {
        out.push(hinted(Role::Callee, callee, filter.callee_norm.as_deref(), filter.callee_imsi.as_ref(), detected));
    }
    if !filter.has_parties() {
        out.extend(detected.participants().iter().cloned());
    }
    out
}

/// Caller-specific view over an already parsed log.
pub fn analyze_parsed(parsed: &ParsedLog, req: &AnalyzeRequest, config: &AnalyzerConfig) -> AnalysisResult {
    let filter = CallFilter::from_request(req, config);
    let flags = Flags::from_tokens(&req.flags);

    let timeline = timeline::filter_timeline(&parsed.timeline, &filter.relevant());
    let timing = temporal::compute_timing(&timeline, config.max_plausible_secs);

    AnalysisResult {
        participants: assemble_participants(&parsed.participants, &filter),
        bye_analysis: bye::analyze_bye(&parsed.blocks, &parsed.text, &filter, config),
        rtp_stats: parsed.rtp_stats.clone(),
        anomalies: parsed.anomalies.clone(),
        timing,
        sdp: flags.sdp.then(|| parsed.sdp.clone()),
        pgw_events: flags.pgw.then(|| parsed.pgw_events.clone()),
        data_usage: flags.pgw.then(|| parsed.data_usage.clone()),
        routing: flags.routing.then(|| parsed.routing.clone()),
        timeline,
    }
}

pub fn analyze(req: &AnalyzeRequest, config: &AnalyzerConfig) -> AnalysisResult {
    let parsed = parse_log(&req.log, config);
    analyze_parsed(&parsed, req, config)
}

/// Independent requests analysed on the rayon pool, results in input order.
pub fn analyze_many(reqs: &[AnalyzeRequest], config: &AnalyzerConfig) -> Vec<AnalysisResult> {
    reqs.par_iter().map(|r| analyze(r, config)).collect()
}
