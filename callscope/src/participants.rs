use ahash::AHashMap;

use crate::classify::EventKind;
use crate::config::AnalyzerConfig;
use crate::diameter;
use crate::extract;
use crate::model::{Participant, Role};
use crate::parser::{self, Block};

/// Participants keyed by normalized number, in first-sighting order.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: Vec<Participant>,
    index: AHashMap<String, usize>,
}

impl Roster {
    /// Records a sighting. Device and IP are filled only while still unknown.
    pub fn observe(&mut self, normalized: &str, device: Option<&str>, ip: Option<&str>) {
        match self.index.get(normalized) {
            Some(&i) => {
                let p = &mut self.entries[i];
                if p.device.is_none() {
                    p.device = device.map(str::to_string);
                }
                if p.ip.is_none() {
                    p.ip = ip.map(str::to_string);
                }
            }
            None => {
                self.index.insert(normalized.to_string(), self.entries.len());
                self.entries.push(Participant {
                    role: Role::Unknown,
                    number: format!("+{normalized}"),
                    imsi: None,
                    device: device.map(str::to_string),
                    ip: ip.map(str::to_string),
                });
            }
        }
    }

    pub fn attach_imsi(&mut self, normalized: &str, imsi: &str) {
        if let Some(&i) = self.index.get(normalized) {
            let p = &mut self.entries[i];
            if p.imsi.is_none() {
                p.imsi = Some(imsi.to_string());
            }
        }
    }

    pub fn get(&self, normalized: &str) -> Option<&Participant> {
        self.index.get(normalized).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn participants(&self) -> &[Participant] {
        &self.entries
    }

    pub fn into_vec(self) -> Vec<Participant> {
        self.entries
    }
}

fn fold_sip(mut roster: Roster, block: &Block, config: &AnalyzerConfig) -> Roster {
    let body = parser::bounded(&block.body, config.max_block_bytes);
    if !block.kind.is_sip() {
        return roster;
    }
    // User-Agent and Contact describe the sender: From on requests, To on responses.
    let sender = match block.kind {
        EventKind::Request(_) => extract::from_digits(body),
        _ => extract::to_digits(body),
    }
    .filter(|d| extract::is_phone_number(d))
    .map(|d| extract::normalize_number(d, &config.national_prefix));
    let device = extract::device(body, config);
    let ip = extract::contact_ip(body);
    for digits in extract::party_numbers(body) {
        let norm = extract::normalize_number(digits, &config.national_prefix);
        if sender.as_deref() == Some(norm.as_str()) {
            roster.observe(&norm, device.as_deref(), ip);
        } else {
            roster.observe(&norm, None, None);
        }
    }
    roster
}

fn fold_charging(mut roster: Roster, block: &Block, config: &AnalyzerConfig) -> Roster {
    let body = parser::bounded(&block.body, config.max_block_bytes);
    if !diameter::is_charging_body(body) {
        return roster;
    }
    let id = diameter::extract_identity(body);
    if let (Some(imsi), Some(msisdn)) = (id.imsi.as_deref(), id.msisdn.as_deref()) {
        let norm = extract::normalize_number(msisdn, &config.national_prefix);
        roster.attach_imsi(&norm, imsi);
    }
    roster
}

/// Folds SIP sightings into a roster, then pairs charging identities
/// (IMSI + MSISDN) onto known numbers. The proxy's own User-Agent never
/// becomes a participant's device.
pub fn resolve(blocks: &[Block], config: &AnalyzerConfig) -> Roster {
    let roster = blocks
        .iter()
        .fold(Roster::default(), |r, b| fold_sip(r, b, config));
    let roster = blocks.iter().fold(roster, |r, b| fold_charging(r, b, config));
    tracing::debug!(participants = roster.len(), "resolved participants");
    roster
}

pub fn resolve_participants(blocks: &[Block], config: &AnalyzerConfig) -> Vec<Participant> {
    resolve(blocks, config).into_vec()
}
