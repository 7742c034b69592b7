use itertools::Itertools;

use crate::classify::EventKind;
use crate::config::AnalyzerConfig;
use crate::correlation::{self, Retransmission};
use crate::diameter;
use crate::model::{Anomaly, AnomalyKind};
use crate::parser::{self, Block};

const SERVER_ERROR_LEN: usize = 80;

/// Independent checks on one block, in a fixed order.
pub fn block_anomalies(block: &Block, config: &AnalyzerConfig) -> Vec<Anomaly> {
    let body = parser::bounded(&block.body, config.max_block_bytes);
    let ts = Some(block.timestamp.as_str());
    let mut out = Vec::new();

    if body.contains("SSRC") && body.contains("expecting") {
        out.push(Anomaly::new(AnomalyKind::SsrcMismatch, ts, "RTCP SSRC mismatch"));
    }

    if let EventKind::Response { code: 500..=599, .. } = block.kind {
        let first = parser::truncate_chars(parser::first_line(body), SERVER_ERROR_LEN);
        out.push(Anomaly::new(AnomalyKind::ServerError, ts, &first));
    }

    for marker in &config.transport_down_markers {
        if body.contains(marker.as_str()) {
            out.push(Anomaly::new(AnomalyKind::TransportDown, ts, &format!("Transport {marker}")));
        }
    }

    let lower = body.to_lowercase();
    if config
        .charging_failure_markers
        .iter()
        .any(|m| lower.contains(&m.to_lowercase()))
    {
        let detail = match diameter::extract_identity(body).detail() {
            Some(d) => format!("Charging/quota failure - {d}"),
            None => "Charging/quota failure".to_string(),
        };
        out.push(Anomaly::new(AnomalyKind::ChargingFailure, ts, &detail));
    }

    for marker in &config.auth_failure_markers {
        if body.contains(marker.as_str()) {
            out.push(Anomaly::new(AnomalyKind::AuthFailure, ts, &format!("AuC {marker} (auth failure)")));
        }
    }
    out
}

pub fn retransmission_anomaly(r: &Retransmission) -> Anomaly {
    Anomaly::new(
        AnomalyKind::Retransmission,
        None,
        &format!("{} retransmitted {}x for branch {}", r.method.as_str(), r.count, r.branch),
    )
}

/// Per-block anomalies in log order, then retransmissions. Repeated
/// messages keep only their first occurrence.
pub fn detect_anomalies(blocks: &[Block], config: &AnalyzerConfig) -> Vec<Anomaly> {
    let per_block = blocks.iter().flat_map(|b| block_anomalies(b, config));
    let retransmitted = correlation::detect_retransmissions(blocks, config);
    let anomalies: Vec<Anomaly> = per_block
        .chain(retransmitted.iter().map(retransmission_anomaly))
        .unique_by(|a| a.message.clone())
        .collect();
    tracing::debug!(anomalies = anomalies.len(), "anomaly scan finished");
    anomalies
}
