use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::classify::EventKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Caller,
    Callee,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    pub role: Role,
    /// `+`-prefixed normalized number.
    pub number: String,
    pub imsi: Option<String>,
    pub device: Option<String>,
    pub ip: Option<String>,
}

/// A number as it appeared in a header, plus its normalized form when the
/// digit run is a plausible phone number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyRef {
    pub raw: String,
    pub normalized: Option<String>,
}

impl PartyRef {
    fn mentions(&self, value: &str) -> bool {
        self.raw.contains(value) || self.normalized.as_deref().is_some_and(|n| n.contains(value))
    }
}

impl fmt::Display for PartyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 15+ digit runs are subscriber identities and shown bare.
        if self.raw.len() >= 15 {
            f.write_str(&self.raw)
        } else {
            write!(f, "+{}", self.raw)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberKind {
    Imsi,
    Msisdn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    From(PartyRef),
    To(PartyRef),
    CallId(String),
    CSeq { seq: u32, method: String },
    Subscriber { kind: SubscriberKind, value: String },
    Result(String),
    Summary(String),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::From(p) => write!(f, "From: {p}"),
            Segment::To(p) => write!(f, "To: {p}"),
            Segment::CallId(id) => write!(f, "Call-ID: {id}"),
            Segment::CSeq { seq, method } => write!(f, "CSeq: {seq} {method}"),
            Segment::Subscriber { kind: SubscriberKind::Imsi, value } => write!(f, "IMSI: {value}"),
            Segment::Subscriber { kind: SubscriberKind::Msisdn, value } => write!(f, "MSISDN: +{value}"),
            Segment::Result(label) => write!(f, "Result: {label}"),
            Segment::Summary(s) => f.write_str(s),
        }
    }
}

/// Structured timeline description, rendered to text only when serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Description {
    pub segments: Vec<Segment>,
}

impl Description {
    /// Whether any identifying field carries `value` (a number or IMSI).
    pub fn mentions(&self, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }
        self.segments.iter().any(|s| match s {
            Segment::From(p) | Segment::To(p) => p.mentions(value),
            Segment::CallId(id) => id.contains(value),
            Segment::Subscriber { value: v, .. } => v.contains(value),
            Segment::Summary(text) => text.contains(value),
            Segment::CSeq { .. } | Segment::Result(_) => false,
        })
    }

    pub fn call_id(&self) -> Option<&str> {
        self.segments.iter().find_map(|s| match s {
            Segment::CallId(id) => Some(id.as_str()),
            _ => None,
        })
    }

    pub fn cseq_method(&self) -> Option<&str> {
        self.segments.iter().find_map(|s| match s {
            Segment::CSeq { method, .. } => Some(method.as_str()),
            _ => None,
        })
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, s) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{s}")?;
        }
        Ok(())
    }
}

impl Serialize for Description {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One timeline entry, derived 1:1 from a block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub timestamp: String,
    #[serde(skip)]
    pub at: Option<NaiveDateTime>,
    pub direction: Direction,
    pub method: EventKind,
    pub description: Description,
    pub raw_excerpt: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RtpCounters {
    pub sent_packets: u64,
    pub sent_bytes: u64,
    pub received_packets: u64,
    pub received_bytes: u64,
    pub lost: u64,
    pub discarded: u64,
    pub jitter: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RtpStat {
    pub leg: String,
    #[serde(flatten)]
    pub counters: RtpCounters,
    pub codec: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ByeAnalysis {
    pub sender: String,
    pub sender_number: String,
    pub reason: Option<String>,
    pub raw_snippet: String,
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    SsrcMismatch,
    ServerError,
    TransportDown,
    ChargingFailure,
    AuthFailure,
    Retransmission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl AnomalyKind {
    pub fn severity(self) -> Severity {
        match self {
            AnomalyKind::ServerError | AnomalyKind::TransportDown => Severity::High,
            AnomalyKind::SsrcMismatch | AnomalyKind::ChargingFailure => Severity::Medium,
            AnomalyKind::AuthFailure | AnomalyKind::Retransmission => Severity::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Anomaly {
    pub timestamp: Option<String>,
    pub kind: AnomalyKind,
    pub severity: Severity,
    pub message: String,
}

impl Anomaly {
    pub fn new(kind: AnomalyKind, timestamp: Option<&str>, detail: &str) -> Self {
        let message = match timestamp {
            Some(ts) => format!("[{ts}] {detail}"),
            None => detail.to_string(),
        };
        Self {
            timestamp: timestamp.map(str::to_string),
            kind,
            severity: kind.severity(),
            message,
        }
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SdpEntry {
    pub ua: String,
    pub codecs: Vec<String>,
    pub media_addr: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SdpSummary {
    pub offered: Vec<SdpEntry>,
    pub answered: Vec<SdpEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PgwAction {
    Create,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PgwEvent {
    pub timestamp: String,
    pub action: PgwAction,
    pub session: String,
}

impl fmt::Display for PgwEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self.action {
            PgwAction::Create => "CREATE",
            PgwAction::Delete => "DELETE",
        };
        write!(f, "[{}] PGW session {}: {}", self.timestamp, action, self.session)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Terminated,
}

/// Diameter credit-control usage folded per charging session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataUsage {
    pub session_id: String,
    pub imsi: Option<String>,
    pub msisdn: Option<String>,
    pub apn: Option<String>,
    pub service: Option<String>,
    pub ip: Option<String>,
    pub start_ts: String,
    pub end_ts: String,
    pub in_bytes: u64,
    pub out_bytes: u64,
    pub total_bytes: u64,
    pub voice_secs: u64,
    pub request_count: usize,
    pub last_result: Option<String>,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingEntry {
    pub timestamp: String,
    pub request: String,
    pub vias: Vec<String>,
    pub routes: Vec<String>,
    pub record_routes: Vec<String>,
}

impl fmt::Display for RoutingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp, self.request)?;
        for v in &self.vias {
            write!(f, "\n  Via: {v}")?;
        }
        for r in &self.routes {
            write!(f, "\n  Route: {r}")?;
        }
        for r in &self.record_routes {
            write!(f, "\n  Record-Route: {r}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CallTiming {
    pub call_duration: Option<String>,
    pub answer_time: Option<String>,
    pub ring_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub participants: Vec<Participant>,
    pub timeline: Vec<Event>,
    pub bye_analysis: Option<ByeAnalysis>,
    pub rtp_stats: Vec<RtpStat>,
    pub anomalies: Vec<Anomaly>,
    #[serde(flatten)]
    pub timing: CallTiming,
    pub sdp: Option<SdpSummary>,
    pub pgw_events: Option<Vec<PgwEvent>>,
    pub data_usage: Option<Vec<DataUsage>>,
    pub routing: Option<Vec<RoutingEntry>>,
}
