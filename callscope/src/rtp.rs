use ahash::AHashSet;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::AnalyzerConfig;
use crate::extract;
use crate::model::{RtpCounters, RtpStat};
use crate::parser::{self, Block};

static RE_RTP_STAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)P-RTP-Stat:\s*PS=?(\d+),\s*OS=?(\d+),\s*PR=?(\d+),\s*OR=?(\d+),\s*PL=?(\d+),\s*PD=?(\d+),\s*JI=?(\d+)").unwrap()
});

/// Every complete seven-counter `P-RTP-Stat` report in `body`.
pub fn rtp_samples(body: &str) -> Vec<RtpCounters> {
    RE_RTP_STAT
        .captures_iter(body)
        .filter_map(|c| {
            let n = |i: usize| c[i].parse::<u64>().ok();
            Some(RtpCounters {
                sent_packets: n(1)?,
                sent_bytes: n(2)?,
                received_packets: n(3)?,
                received_bytes: n(4)?,
                lost: n(5)?,
                discarded: n(6)?,
                jitter: n(7)?,
            })
        })
        .collect()
}

/// Codec negotiation points in log order: `format changed` markers and SDP
/// bodies. A sample takes the codec of the latest point at or before it.
#[derive(Debug, Default, Clone)]
pub struct CodecTimeline {
    marks: Vec<(usize, String)>,
}

impl CodecTimeline {
    pub fn from_records(records: &[Block], config: &AnalyzerConfig) -> Self {
        let mut marks = Vec::new();
        for rec in records {
            let body = parser::bounded(&rec.body, config.max_block_bytes);
            let marker = rec.lines().filter_map(extract::format_change_codec).last();
            let sdp = extract::rtpmap_codecs(body).into_iter().next();
            if let Some(codec) = marker.or(sdp) {
                marks.push((rec.offset, codec));
            }
        }
        marks.sort_by_key(|(offset, _)| *offset);
        Self { marks }
    }

    pub fn codec_at(&self, offset: usize) -> Option<&str> {
        let idx = self.marks.partition_point(|(o, _)| *o <= offset);
        idx.checked_sub(1).map(|i| self.marks[i].1.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

/// RTP quality reports with legs and codecs attached. Identical counter
/// tuples are one reading, whichever leg reported them.
pub fn collect_rtp_stats(blocks: &[Block], codecs: &CodecTimeline, config: &AnalyzerConfig) -> Vec<RtpStat> {
    let mut seen: AHashSet<RtpCounters> = AHashSet::new();
    let mut stats = Vec::new();

    for block in blocks {
        let body = parser::bounded(&block.body, config.max_block_bytes);
        let samples = rtp_samples(body);
        if samples.is_empty() {
            continue;
        }
        let party = extract::from_digits(body)
            .or_else(|| extract::to_digits(body))
            .map(|d| format!("+{}", extract::normalize_number(d, &config.national_prefix)));

        for counters in samples {
            if !seen.insert(counters) {
                continue;
            }
            let leg = party.clone().unwrap_or_else(|| format!("Leg {}", stats.len() + 1));
            stats.push(RtpStat {
                leg,
                counters,
                codec: codecs.codec_at(block.offset).map(str::to_string),
            });
        }
    }
    tracing::debug!(samples = stats.len(), "collected rtp stats");
    stats
}
