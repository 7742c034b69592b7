use chrono::NaiveDateTime;

use crate::classify::{EventKind, SipMethod};
use crate::model::{CallTiming, Event};

/// Milestones of one call, all belonging to the same Call-ID.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Milestones {
    pub call_id: Option<String>,
    pub invite: Option<NaiveDateTime>,
    pub ringing: Option<NaiveDateTime>,
    pub answer: Option<NaiveDateTime>,
    pub bye: Option<NaiveDateTime>,
}

fn is_answer(event: &Event) -> bool {
    event.method.status_code() == Some(200) && event.description.cseq_method() == Some("INVITE")
}

/// Anchors on the first INVITE's Call-ID. Events that carry a different
/// Call-ID are skipped; events without one still count.
pub fn find_milestones(events: &[Event]) -> Milestones {
    let mut m = Milestones::default();
    if let Some(first) = events.iter().find(|e| e.method.is_request(SipMethod::Invite)) {
        m.call_id = first.description.call_id().map(str::to_string);
        m.invite = first.at;
    }

    for event in events {
        let Some(at) = event.at else { continue };
        if let (Some(anchor), Some(id)) = (m.call_id.as_deref(), event.description.call_id()) {
            if anchor != id {
                continue;
            }
        }
        match &event.method {
            EventKind::Request(SipMethod::Invite) if m.invite.is_none() => m.invite = Some(at),
            EventKind::Request(SipMethod::Bye) if m.bye.is_none() => m.bye = Some(at),
            EventKind::Response { code: 180, .. } if m.ringing.is_none() => m.ringing = Some(at),
            _ if m.answer.is_none() && is_answer(event) => m.answer = Some(at),
            _ => {}
        }
    }
    m
}

/// Seconds from `start` to `end`, or `None` when either is missing, the span
/// is negative, or it exceeds `ceiling`.
pub fn plausible_span(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>, ceiling: f64) -> Option<f64> {
    let (start, end) = (start?, end?);
    let micros = (end - start).num_microseconds()?;
    let secs = micros as f64 / 1_000_000.0;
    (secs >= 0.0 && secs <= ceiling).then_some(secs)
}

/// `42.0s` under a minute, `1m 5.4s` from a minute on. Rounds to tenths
/// before splitting, so 59.97 reads `1m 0.0s`.
pub fn format_duration(secs: f64) -> String {
    let tenths = (secs.max(0.0) * 10.0).round() as u64;
    let (minutes, rest) = (tenths / 600, tenths % 600);
    if minutes > 0 {
        format!("{minutes}m {}.{}s", rest / 10, rest % 10)
    } else {
        format!("{}.{}s", rest / 10, rest % 10)
    }
}

pub fn compute_timing(events: &[Event], ceiling: f64) -> CallTiming {
    let m = find_milestones(events);
    let render = |start, end| plausible_span(start, end, ceiling).map(format_duration);
    let timing = CallTiming {
        call_duration: render(m.answer, m.bye),
        answer_time: render(m.invite, m.answer),
        ring_time: render(m.invite, m.ringing),
    };
    tracing::debug!(call_id = ?m.call_id, ?timing, "computed call timing");
    timing
}
