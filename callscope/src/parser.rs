use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::classify::{self, EventKind};
use crate::multiline::RecordAggregator;

/// Softswitch timestamps: `2024-03-01_10:15:02.123456`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H:%M:%S%.f";

static RE_RECORD_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}_\d{2}:\d{2}:\d{2}\.\d+)\s+<([^<>]+)>(.*)$").unwrap()
});

static RE_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}_\d{2}:\d{2}:\d{2}\.\d+").unwrap()
});

/// The parts of a line that opens a new record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    pub timestamp: String,
    pub source_module: String,
    pub preamble: String,
}

/// One raw log record. `preamble` is whatever followed the module tag on the
/// opening line; `body` is every following line up to the next record.
/// `kind` is classified once here and read by every later pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    pub offset: usize,
    pub timestamp: String,
    #[serde(skip)]
    pub at: Option<NaiveDateTime>,
    pub source_module: String,
    pub preamble: String,
    pub body: String,
    pub kind: EventKind,
}

impl Block {
    pub fn new(offset: usize, header: RecordHeader, body: String) -> Self {
        let at = parse_timestamp(&header.timestamp);
        let kind = classify::classify(&body);
        Self {
            offset,
            timestamp: header.timestamp,
            at,
            source_module: header.source_module,
            preamble: header.preamble,
            body,
            kind,
        }
    }

    pub fn first_line(&self) -> &str {
        first_line(&self.body)
    }

    /// True when the body holds nothing but blank or separator lines.
    pub fn is_blank(&self) -> bool {
        self.body.lines().all(is_decoration)
    }

    /// Preamble followed by body lines, for scans over the whole record.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.preamble.as_str()).chain(self.body.lines())
    }
}

pub fn parse_record_start(line: &str) -> Option<RecordHeader> {
    let caps = RE_RECORD_START.captures(line.trim_end_matches('\r'))?;
    Some(RecordHeader {
        timestamp: caps[1].to_string(),
        source_module: caps[2].to_string(),
        preamble: caps[3].trim().to_string(),
    })
}

/// Every record in `text`, including single-line records with an empty body.
pub fn records(text: &str) -> Vec<Block> {
    let mut agg = RecordAggregator::default();
    let mut out = Vec::new();
    for line in text.split('\n') {
        if let Some(b) = agg.push(line) {
            out.push(b);
        }
    }
    if let Some(b) = agg.finish() {
        out.push(b);
    }
    out
}

/// Records whose body carries content, in source order.
pub fn split_blocks(text: &str) -> Vec<Block> {
    let blocks: Vec<Block> = records(text).into_iter().filter(|b| !b.is_blank()).collect();
    tracing::debug!(blocks = blocks.len(), "split log into blocks");
    blocks
}

pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT).ok()
}

pub fn find_timestamp(s: &str) -> Option<&str> {
    RE_TIMESTAMP.find(s).map(|m| m.as_str())
}

pub fn is_decoration(line: &str) -> bool {
    let t = line.trim();
    t.is_empty() || t.chars().all(|c| c == '-' || c == '=')
}

/// First line that is neither blank nor a `-----` separator, trimmed.
pub fn first_line(body: &str) -> &str {
    body.lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with("-----"))
        .unwrap_or("")
}

/// Longest prefix of `s` no larger than `max` bytes ending on a char boundary.
pub fn bounded(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

pub fn truncate_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}
