use std::io::Write;
use thiserror::Error;

use crate::model::{AnalysisResult, Direction, Role};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv flush failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv output is not utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

const NA: &str = "N/A";

fn role(r: Role) -> &'static str {
    match r {
        Role::Caller => "caller",
        Role::Callee => "callee",
        Role::Unknown => "unknown",
    }
}

fn direction(d: Direction) -> &'static str {
    match d {
        Direction::Inbound => "inbound",
        Direction::Outbound => "outbound",
        Direction::Internal => "internal",
    }
}

fn opt(v: &Option<String>) -> &str {
    v.as_deref().unwrap_or("")
}

/// Labeled CSV sections: timing, participants, timeline, BYE analysis, RTP
/// stats and anomalies. The last three are omitted when empty.
pub fn write_csv<W: Write>(result: &AnalysisResult, out: W) -> Result<(), ExportError> {
    let mut w = csv::WriterBuilder::new().flexible(true).from_writer(out);
    let t = &result.timing;

    w.write_record(["=== CALL TIMING ==="])?;
    w.write_record(["Post-Dial Delay", t.answer_time.as_deref().unwrap_or(NA)])?;
    w.write_record(["Ring Time", t.ring_time.as_deref().unwrap_or(NA)])?;
    w.write_record(["Call Duration", t.call_duration.as_deref().unwrap_or(NA)])?;

    w.write_record([""])?;
    w.write_record(["=== PARTICIPANTS ==="])?;
    w.write_record(["Role", "Number", "IMSI", "Device", "IP"])?;
    for p in &result.participants {
        w.write_record([role(p.role), p.number.as_str(), opt(&p.imsi), opt(&p.device), opt(&p.ip)])?;
    }

    w.write_record([""])?;
    w.write_record(["=== CALL FLOW TIMELINE ==="])?;
    w.write_record(["Timestamp", "Direction", "Method", "Description"])?;
    for ev in &result.timeline {
        w.write_record([
            ev.timestamp.as_str(),
            direction(ev.direction),
            ev.method.to_string().as_str(),
            ev.description.to_string().as_str(),
        ])?;
    }

    if let Some(b) = &result.bye_analysis {
        w.write_record([""])?;
        w.write_record(["=== BYE ANALYSIS ==="])?;
        w.write_record(["Sender", b.sender.as_str()])?;
        w.write_record(["Number", b.sender_number.as_str()])?;
        w.write_record(["Reason", b.reason.as_deref().unwrap_or("None")])?;
        for e in &b.evidence {
            w.write_record(["Evidence", e.as_str()])?;
        }
    }

    if !result.rtp_stats.is_empty() {
        w.write_record([""])?;
        w.write_record(["=== RTP STATS ==="])?;
        w.write_record([
            "Leg", "Sent Pkts", "Sent Bytes", "Recv Pkts", "Recv Bytes", "Lost", "Discarded", "Jitter", "Codec",
        ])?;
        for r in &result.rtp_stats {
            let c = r.counters;
            let mut row = vec![r.leg.clone()];
            row.extend(
                [c.sent_packets, c.sent_bytes, c.received_packets, c.received_bytes, c.lost, c.discarded, c.jitter]
                    .iter()
                    .map(u64::to_string),
            );
            row.push(r.codec.clone().unwrap_or_default());
            w.write_record(&row)?;
        }
    }

    if !result.anomalies.is_empty() {
        w.write_record([""])?;
        w.write_record(["=== ANOMALIES ==="])?;
        for a in &result.anomalies {
            w.write_record([a.message.as_str()])?;
        }
    }

    w.flush()?;
    Ok(())
}

pub fn to_csv(result: &AnalysisResult) -> Result<String, ExportError> {
    let mut buf = Vec::new();
    write_csv(result, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}
