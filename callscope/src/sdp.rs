use crate::classify::{EventKind, SipMethod};
use crate::config::AnalyzerConfig;
use crate::extract;
use crate::model::{SdpEntry, SdpSummary};
use crate::parser::{self, Block};

/// Offers and answers kept per side.
pub const MAX_ENTRIES: usize = 2;

/// RTP address from the `c=` and `m=audio` lines; a zero port means the
/// stream is disabled.
pub fn media_addr(sdp: &str) -> Option<String> {
    let mut ip = None;
    let mut port = None;
    for line in sdp.lines().map(str::trim) {
        if line.starts_with("c=IN IP4 ") || line.starts_with("c=IN IP6 ") {
            ip = line.split_whitespace().last();
        }
        if line.starts_with("m=audio ") {
            port = line.split_whitespace().nth(1);
        }
    }
    match (ip, port) {
        (Some(i), Some(p)) if p != "0" => Some(format!("{i}:{p}")),
        _ => None,
    }
}

pub fn sdp_entry(body: &str, config: &AnalyzerConfig) -> SdpEntry {
    let ua = match extract::user_agent(body) {
        Some(ua) if config.is_proxy(ua) => config.proxy_label.clone(),
        Some(ua) => ua.to_string(),
        None => "unknown".to_string(),
    };
    SdpEntry {
        ua,
        codecs: extract::rtpmap_codecs(body),
        media_addr: media_addr(body),
    }
}

/// SDP bodies on INVITE/180/183 count as offers and on 200 as answers.
pub fn summarize_sdp(blocks: &[Block], config: &AnalyzerConfig) -> SdpSummary {
    let mut summary = SdpSummary::default();
    for block in blocks {
        let body = parser::bounded(&block.body, config.max_block_bytes);
        if !body.contains("v=0") {
            continue;
        }
        let side = match block.kind {
            EventKind::Request(SipMethod::Invite) | EventKind::Response { code: 180 | 183, .. } => {
                &mut summary.offered
            }
            EventKind::Response { code: 200, .. } => &mut summary.answered,
            _ => continue,
        };
        if side.len() < MAX_ENTRIES {
            side.push(sdp_entry(body, config));
        }
    }
    summary
}
