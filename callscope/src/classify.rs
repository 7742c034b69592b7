use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::parser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SipMethod {
    Invite,
    Bye,
    Cancel,
    Register,
    Prack,
    Ack,
    Notify,
    Options,
    Update,
    Info,
    Message,
    Subscribe,
}

impl SipMethod {
    pub const ALL: [SipMethod; 12] = [
        SipMethod::Invite,
        SipMethod::Bye,
        SipMethod::Cancel,
        SipMethod::Register,
        SipMethod::Prack,
        SipMethod::Ack,
        SipMethod::Notify,
        SipMethod::Options,
        SipMethod::Update,
        SipMethod::Info,
        SipMethod::Message,
        SipMethod::Subscribe,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SipMethod::Invite => "INVITE",
            SipMethod::Bye => "BYE",
            SipMethod::Cancel => "CANCEL",
            SipMethod::Register => "REGISTER",
            SipMethod::Prack => "PRACK",
            SipMethod::Ack => "ACK",
            SipMethod::Notify => "NOTIFY",
            SipMethod::Options => "OPTIONS",
            SipMethod::Update => "UPDATE",
            SipMethod::Info => "INFO",
            SipMethod::Message => "MESSAGE",
            SipMethod::Subscribe => "SUBSCRIBE",
        }
    }

    pub fn parse(token: &str) -> Option<SipMethod> {
        SipMethod::ALL.into_iter().find(|m| m.as_str() == token)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiameterCommand {
    CreditControlRequest,
    CreditControlAnswer,
    AaRequest,
    AaAnswer,
    ReAuthRequest,
    ReAuthAnswer,
    SessionTerminationRequest,
    SessionTerminationAnswer,
    AbortSessionRequest,
    AbortSessionAnswer,
}

impl DiameterCommand {
    pub fn abbrev(self) -> &'static str {
        match self {
            DiameterCommand::CreditControlRequest => "CCR",
            DiameterCommand::CreditControlAnswer => "CCA",
            DiameterCommand::AaRequest => "AAR",
            DiameterCommand::AaAnswer => "AAA",
            DiameterCommand::ReAuthRequest => "RAR",
            DiameterCommand::ReAuthAnswer => "RAA",
            DiameterCommand::SessionTerminationRequest => "STR",
            DiameterCommand::SessionTerminationAnswer => "STA",
            DiameterCommand::AbortSessionRequest => "ASR",
            DiameterCommand::AbortSessionAnswer => "ASA",
        }
    }

    pub fn is_answer(self) -> bool {
        matches!(
            self,
            DiameterCommand::CreditControlAnswer
                | DiameterCommand::AaAnswer
                | DiameterCommand::ReAuthAnswer
                | DiameterCommand::SessionTerminationAnswer
                | DiameterCommand::AbortSessionAnswer
        )
    }
}

/// Spellings seen across log sources, longest first within each command.
const DIAMETER_TOKENS: &[(&str, DiameterCommand)] = &[
    ("Credit-Control-Request", DiameterCommand::CreditControlRequest),
    ("CreditControlRequest", DiameterCommand::CreditControlRequest),
    ("Credit-Control-Answer", DiameterCommand::CreditControlAnswer),
    ("CreditControlAnswer", DiameterCommand::CreditControlAnswer),
    ("Session-Termination-Request", DiameterCommand::SessionTerminationRequest),
    ("Session-Termination-Answer", DiameterCommand::SessionTerminationAnswer),
    ("Abort-Session-Request", DiameterCommand::AbortSessionRequest),
    ("Abort-Session-Answer", DiameterCommand::AbortSessionAnswer),
    ("Re-Auth-Request", DiameterCommand::ReAuthRequest),
    ("Re-Auth-Answer", DiameterCommand::ReAuthAnswer),
    ("AA-Request", DiameterCommand::AaRequest),
    ("AA-Answer", DiameterCommand::AaAnswer),
    ("CCR", DiameterCommand::CreditControlRequest),
    ("CCA", DiameterCommand::CreditControlAnswer),
    ("STR", DiameterCommand::SessionTerminationRequest),
    ("STA", DiameterCommand::SessionTerminationAnswer),
    ("ASR", DiameterCommand::AbortSessionRequest),
    ("ASA", DiameterCommand::AbortSessionAnswer),
    ("RAR", DiameterCommand::ReAuthRequest),
    ("RAA", DiameterCommand::ReAuthAnswer),
    ("AAR", DiameterCommand::AaRequest),
    ("AAA", DiameterCommand::AaAnswer),
];

static RE_DIAMETER: Lazy<Regex> = Lazy::new(|| {
    let alt = DIAMETER_TOKENS
        .iter()
        .map(|(t, _)| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alt})\b")).unwrap()
});

static RE_STATUS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^SIP/2\.0\s+(\d{3})\s+(.+)$").unwrap()
});

/// How far into a body a Diameter command token is looked for.
const DIAMETER_WINDOW: usize = 120;
const PHRASE_LEN: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Request(SipMethod),
    Response { code: u16, phrase: String },
    Diameter(DiameterCommand),
    Internal,
}

impl EventKind {
    pub fn is_sip(&self) -> bool {
        matches!(self, EventKind::Request(_) | EventKind::Response { .. })
    }

    pub fn is_request(&self, method: SipMethod) -> bool {
        matches!(self, EventKind::Request(m) if *m == method)
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            EventKind::Response { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Request(m) => f.write_str(m.as_str()),
            EventKind::Response { code, phrase } => write!(f, "{code} {phrase}"),
            EventKind::Diameter(c) => f.write_str(c.abbrev()),
            EventKind::Internal => f.write_str("internal"),
        }
    }
}

impl Serialize for EventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Labels a block body: SIP request, SIP status line, Diameter command, or
/// `Internal` when nothing matches.
pub fn classify(body: &str) -> EventKind {
    let first = parser::first_line(body);

    if let Some(method) = request_method(first) {
        return EventKind::Request(method);
    }
    if let Some(caps) = RE_STATUS_LINE.captures(first) {
        if let Ok(code) = caps[1].parse::<u16>() {
            let phrase = parser::truncate_chars(caps[2].trim(), PHRASE_LEN);
            return EventKind::Response { code, phrase };
        }
    }
    if let Some(cmd) = diameter_command(first) {
        return EventKind::Diameter(cmd);
    }
    if let Some(cmd) = diameter_command(parser::bounded(body, DIAMETER_WINDOW)) {
        return EventKind::Diameter(cmd);
    }
    EventKind::Internal
}

fn request_method(line: &str) -> Option<SipMethod> {
    let (token, rest) = line.split_once(char::is_whitespace)?;
    if rest.trim().is_empty() {
        return None;
    }
    SipMethod::parse(token)
}

fn diameter_command(text: &str) -> Option<DiameterCommand> {
    let m = RE_DIAMETER.find(text)?;
    DIAMETER_TOKENS
        .iter()
        .find(|(t, _)| *t == m.as_str())
        .map(|(_, c)| *c)
}
