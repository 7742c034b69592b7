use crate::classify::EventKind;
use crate::config::AnalyzerConfig;
use crate::diameter;
use crate::extract;
use crate::model::{Description, Direction, Event, PartyRef, Segment, SubscriberKind};
use crate::parser::{self, Block};

const CALL_ID_LEN: usize = 30;
const SUMMARY_LEN: usize = 120;
const DIRECTION_WINDOW: usize = 200;

/// `sending` / `received` in the record's opening line or early body.
pub fn direction(block: &Block) -> Direction {
    let head = parser::bounded(&block.body, DIRECTION_WINDOW);
    for text in [block.preamble.as_str(), head] {
        let lower = text.to_ascii_lowercase();
        if lower.contains("sending") {
            return Direction::Outbound;
        }
        if lower.contains("received") {
            return Direction::Inbound;
        }
    }
    Direction::Internal
}

fn party(raw: &str, config: &AnalyzerConfig) -> PartyRef {
    PartyRef {
        raw: raw.to_string(),
        normalized: extract::is_phone_number(raw)
            .then(|| extract::normalize_number(raw, &config.national_prefix)),
    }
}

pub fn describe(body: &str, kind: &EventKind, config: &AnalyzerConfig) -> Description {
    let mut segments = Vec::new();

    if let Some(d) = extract::from_digits(body) {
        segments.push(Segment::From(party(d, config)));
    }
    if let Some(d) = extract::to_digits(body) {
        segments.push(Segment::To(party(d, config)));
    }
    if let Some(id) = extract::call_id(body) {
        segments.push(Segment::CallId(parser::truncate_chars(id, CALL_ID_LEN)));
    }
    if kind.is_sip() {
        if let Some((seq, method)) = extract::cseq(body) {
            segments.push(Segment::CSeq { seq, method });
        }
    }

    if matches!(kind, EventKind::Diameter(_)) || diameter::is_charging_body(body) {
        let id = diameter::extract_identity(body);
        if let Some(imsi) = id.imsi {
            segments.push(Segment::Subscriber { kind: SubscriberKind::Imsi, value: imsi });
        }
        if let Some(msisdn) = id.msisdn {
            segments.push(Segment::Subscriber { kind: SubscriberKind::Msisdn, value: msisdn });
        }
        if let Some(result) = diameter::extract_result(body) {
            segments.push(Segment::Result(result.to_string()));
        }
    }

    if segments.is_empty() {
        segments.push(Segment::Summary(parser::truncate_chars(
            parser::first_line(body),
            SUMMARY_LEN,
        )));
    }
    Description { segments }
}

pub fn build_event(block: &Block, config: &AnalyzerConfig) -> Event {
    let body = parser::bounded(&block.body, config.max_block_bytes);
    let method = block.kind.clone();
    let description = describe(body, &method, config);
    Event {
        timestamp: block.timestamp.clone(),
        at: block.at,
        direction: direction(block),
        method,
        description,
        raw_excerpt: Some(parser::truncate_chars(&block.body, config.raw_excerpt_len)),
    }
}

pub fn build_timeline(blocks: &[Block], config: &AnalyzerConfig) -> Vec<Event> {
    let events: Vec<Event> = blocks.iter().map(|b| build_event(b, config)).collect();
    let internal = events.iter().filter(|e| e.method == EventKind::Internal).count();
    tracing::debug!(events = events.len(), internal, "built timeline");
    events
}

/// Events mentioning any of `relevant`, plus every internal event. An empty
/// filter keeps everything.
pub fn filter_timeline(events: &[Event], relevant: &[String]) -> Vec<Event> {
    if relevant.is_empty() {
        return events.to_vec();
    }
    events
        .iter()
        .filter(|e| {
            e.method == EventKind::Internal
                || relevant.iter().any(|r| e.description.mentions(r))
        })
        .cloned()
        .collect()
}
