use crate::classify::{EventKind, SipMethod};
use crate::config::AnalyzerConfig;
use crate::extract;
use crate::model::RoutingEntry;
use crate::parser::{self, Block};

const REQUEST_LEN: usize = 70;

/// Via/Route/Record-Route trace of every INVITE, BYE and CANCEL that carries
/// at least one of those headers.
pub fn routing_trace(blocks: &[Block], config: &AnalyzerConfig) -> Vec<RoutingEntry> {
    blocks
        .iter()
        .filter_map(|block| {
            let body = parser::bounded(&block.body, config.max_block_bytes);
            match block.kind {
                EventKind::Request(SipMethod::Invite | SipMethod::Bye | SipMethod::Cancel) => {}
                _ => return None,
            }
            let entry = RoutingEntry {
                timestamp: block.timestamp.clone(),
                request: parser::truncate_chars(parser::first_line(body), REQUEST_LEN),
                vias: owned(extract::header_lines(body, "Via")),
                routes: owned(extract::header_lines(body, "Route")),
                record_routes: owned(extract::header_lines(body, "Record-Route")),
            };
            let empty = entry.vias.is_empty() && entry.routes.is_empty() && entry.record_routes.is_empty();
            (!empty).then_some(entry)
        })
        .collect()
}

fn owned(values: Vec<&str>) -> Vec<String> {
    values.into_iter().map(str::to_string).collect()
}
