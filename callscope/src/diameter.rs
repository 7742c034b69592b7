use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

use crate::tables;

static RE_ROOT_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<([A-Za-z][\w.:-]*)(\s[^<>]*)?/?>").unwrap()
});
static RE_RESULT_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b(?i:result(?:[-_]?code)?)\s*=\s*["']([A-Za-z][A-Za-z0-9_]+)["']"#).unwrap()
});
static RE_RESULT_KV: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b(?i:result(?:[-_]?code)?)\s*[=:]\s*["']?([A-Z][A-Z0-9_]{3,})"#).unwrap()
});
static RE_RESULT_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(?:ResultCode|Result-Code)>\s*(\d{4})\s*</(?:ResultCode|Result-Code)>").unwrap()
});

static RE_SUBSCRIPTION_TYPE_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<SubscriptionIdType>\s*([\w-]+)\s*</SubscriptionIdType>\s*<SubscriptionIdData>\s*(\d+)\s*</SubscriptionIdData>").unwrap()
});
static RE_SUBSCRIPTION_DATA_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<SubscriptionIdData>\s*(\d+)\s*</SubscriptionIdData>\s*<SubscriptionIdType>\s*([\w-]+)\s*</SubscriptionIdType>").unwrap()
});
static RE_PGW_IMSI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"pgw_session["\s:]+(\d{15})"#).unwrap()
});
static RE_REQUEST_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<CcRequestType>\s*(\w+)\s*</CcRequestType>").unwrap()
});
static RE_SERVICE_CONTEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<ServiceContextId>\s*(\d+)@").unwrap()
});
static RE_APN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<CalledStationId>\s*([^<\s]+)\s*</CalledStationId>").unwrap()
});
static RE_SESSION_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<SessionId>\s*([^<]+?)\s*</SessionId>").unwrap()
});
static RE_FRAMED_IP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<FramedIpAddress>\s*([^<\s]+)\s*</FramedIpAddress>").unwrap()
});
static RE_INPUT_OCTETS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<CcInputOctets>\s*(\d+)\s*</CcInputOctets>").unwrap()
});
static RE_OUTPUT_OCTETS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<CcOutputOctets>\s*(\d+)\s*</CcOutputOctets>").unwrap()
});
static RE_TOTAL_OCTETS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<CcTotalOctets>\s*(\d+)\s*</CcTotalOctets>").unwrap()
});
static RE_CC_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<CcTime>\s*(\d+)\s*</CcTime>").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiameterResult {
    pub symbol: Option<String>,
    pub code: Option<u32>,
    pub label: String,
    pub success: bool,
    /// Name of the strategy that produced this result.
    pub source: &'static str,
}

impl fmt::Display for DiameterResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.success { "[OK]" } else { "[ERROR]" };
        match self.code {
            Some(code) => write!(f, "{marker} {} ({code})", self.label),
            None => write!(f, "{marker} {}", self.label),
        }
    }
}

impl DiameterResult {
    fn from_symbol(symbol: &str, source: &'static str) -> Self {
        let label = tables::diameter_symbolic(symbol)
            .map(str::to_string)
            .unwrap_or_else(|| humanize_symbol(symbol));
        Self {
            symbol: Some(symbol.to_string()),
            code: None,
            label,
            success: symbol.to_ascii_uppercase().contains("SUCCESS"),
            source,
        }
    }

    fn from_code(code: u32, source: &'static str) -> Self {
        let label = tables::diameter_numeric(code)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Result-Code {code}"));
        Self {
            symbol: None,
            code: Some(code),
            label,
            success: (2000..3000).contains(&code),
            source,
        }
    }
}

/// Ways a result shows up in charging logs, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStrategy {
    /// `<CreditControlAnswer result="DIAMETER_SUCCESS">`
    RootAttribute,
    /// `result=DIAMETER_CREDIT_LIMIT_REACHED`
    KeyValue,
    /// `<ResultCode>4012</ResultCode>`
    ResultCodeElement,
}

pub const RESULT_STRATEGIES: [ResultStrategy; 3] = [
    ResultStrategy::RootAttribute,
    ResultStrategy::KeyValue,
    ResultStrategy::ResultCodeElement,
];

impl ResultStrategy {
    pub fn name(self) -> &'static str {
        match self {
            ResultStrategy::RootAttribute => "root-attribute",
            ResultStrategy::KeyValue => "key-value",
            ResultStrategy::ResultCodeElement => "result-code-element",
        }
    }

    pub fn apply(self, body: &str) -> Option<DiameterResult> {
        match self {
            ResultStrategy::RootAttribute => {
                let root = RE_ROOT_TAG.captures(body)?;
                let attrs = root.get(2)?.as_str();
                let symbol = RE_RESULT_ATTR.captures(attrs)?.get(1)?.as_str();
                Some(DiameterResult::from_symbol(symbol, self.name()))
            }
            ResultStrategy::KeyValue => {
                let symbol = RE_RESULT_KV.captures(body)?.get(1)?.as_str();
                Some(DiameterResult::from_symbol(symbol, self.name()))
            }
            ResultStrategy::ResultCodeElement => {
                let code = RE_RESULT_CODE.captures(body)?[1].parse().ok()?;
                Some(DiameterResult::from_code(code, self.name()))
            }
        }
    }
}

pub fn extract_result(body: &str) -> Option<DiameterResult> {
    RESULT_STRATEGIES.iter().find_map(|s| s.apply(body))
}

fn humanize_symbol(symbol: &str) -> String {
    let trimmed = symbol.strip_prefix("DIAMETER_").unwrap_or(symbol);
    let words = trimmed.to_ascii_lowercase().replace('_', " ");
    let mut chars = words.chars();
    match chars.next() {
        Some(c) => c.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Subscriber and session identity carried by a credit-control message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChargingIdentity {
    pub imsi: Option<String>,
    pub msisdn: Option<String>,
    pub request_type: Option<String>,
    pub service: Option<String>,
    pub apn: Option<String>,
    pub session_id: Option<String>,
    pub framed_ip: Option<String>,
}

impl ChargingIdentity {
    pub fn is_termination(&self) -> bool {
        self.request_type
            .as_deref()
            .is_some_and(|t| t.to_ascii_uppercase().starts_with("TERMINATION") || t == "3")
    }

    /// `IMSI: x | MSISDN: +y | type: t | service: s`, for anomaly details.
    pub fn detail(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(i) = &self.imsi {
            parts.push(format!("IMSI: {i}"));
        }
        if let Some(m) = &self.msisdn {
            parts.push(format!("MSISDN: +{m}"));
        }
        if let Some(t) = &self.request_type {
            parts.push(format!("type: {t}"));
        }
        if let Some(s) = &self.service {
            parts.push(format!("service: {s}"));
        }
        (!parts.is_empty()).then(|| parts.join(" | "))
    }
}

enum SubscriptionType {
    Imsi,
    E164,
}

fn subscription_type(token: &str) -> Option<SubscriptionType> {
    match token.to_ascii_lowercase().as_str() {
        "imsi" | "end_user_imsi" | "1" => Some(SubscriptionType::Imsi),
        "e164" | "end_user_e164" | "0" => Some(SubscriptionType::E164),
        _ => None,
    }
}

pub fn extract_identity(body: &str) -> ChargingIdentity {
    let mut id = ChargingIdentity::default();

    let typed = RE_SUBSCRIPTION_TYPE_FIRST
        .captures_iter(body)
        .map(|c| (c[1].to_string(), c[2].to_string()))
        .chain(
            RE_SUBSCRIPTION_DATA_FIRST
                .captures_iter(body)
                .map(|c| (c[2].to_string(), c[1].to_string())),
        );
    for (kind, data) in typed {
        match subscription_type(&kind) {
            Some(SubscriptionType::Imsi) if id.imsi.is_none() => id.imsi = Some(data),
            Some(SubscriptionType::E164) if id.msisdn.is_none() => id.msisdn = Some(data),
            _ => {}
        }
    }
    if id.imsi.is_none() {
        id.imsi = capture(&RE_PGW_IMSI, body);
    }

    id.request_type = capture(&RE_REQUEST_TYPE, body);
    id.service = capture(&RE_SERVICE_CONTEXT, body).map(|c| tables::service_context(&c));
    id.apn = capture(&RE_APN, body);
    id.session_id = capture(&RE_SESSION_ID, body);
    id.framed_ip = capture(&RE_FRAMED_IP, body);
    id
}

fn capture(re: &Regex, body: &str) -> Option<String> {
    re.captures(body).and_then(|c| c.get(1)).map(|m| m.as_str().to_string())
}

/// Used-service-unit counters, summed over every occurrence in the body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageCounters {
    pub input_octets: u64,
    pub output_octets: u64,
    pub total_octets: u64,
    pub time_secs: u64,
}

pub fn extract_usage(body: &str) -> UsageCounters {
    UsageCounters {
        input_octets: sum_all(&RE_INPUT_OCTETS, body),
        output_octets: sum_all(&RE_OUTPUT_OCTETS, body),
        total_octets: sum_all(&RE_TOTAL_OCTETS, body),
        time_secs: sum_all(&RE_CC_TIME, body),
    }
}

fn sum_all(re: &Regex, body: &str) -> u64 {
    re.captures_iter(body)
        .filter_map(|c| c[1].parse::<u64>().ok())
        .fold(0u64, u64::saturating_add)
}

/// Whether a block carries credit-control content worth folding.
pub fn is_charging_body(body: &str) -> bool {
    body.contains("<CcRequestType>")
        || body.contains("<SubscriptionIdType>")
        || body.contains("<SubscriptionIdData>")
}
