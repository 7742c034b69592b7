use crate::parser::{self, Block, RecordHeader};

struct Pending {
    offset: usize,
    header: RecordHeader,
    body: Vec<String>,
}

/// Folds physical lines into records: a timestamp + `<module>` line opens a
/// record, every other line continues the open one. Lines before the first
/// record are dropped.
#[derive(Default)]
pub struct RecordAggregator {
    pending: Option<Pending>,
    offset: usize,
}

impl RecordAggregator {
    pub fn push(&mut self, line: &str) -> Option<Block> {
        let line_offset = self.offset;
        self.offset += line.len() + 1;

        if let Some(header) = parser::parse_record_start(line) {
            let done = self.pending.take().map(finalize);
            self.pending = Some(Pending { offset: line_offset, header, body: Vec::new() });
            return done;
        }

        if let Some(p) = self.pending.as_mut() {
            p.body.push(line.trim_end_matches('\r').to_string());
        }
        None
    }

    pub fn finish(&mut self) -> Option<Block> {
        self.pending.take().map(finalize)
    }
}

fn finalize(p: Pending) -> Block {
    let body = p.body.join("\n").trim().to_string();
    Block::new(p.offset, p.header, body)
}
