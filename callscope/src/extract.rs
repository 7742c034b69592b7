use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::AnalyzerConfig;
use crate::headers;

/// A named pattern whose first capture group is the extracted value.
pub struct Strategy {
    pub name: &'static str,
    re: &'static Lazy<Regex>,
}

impl Strategy {
    pub fn capture<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
    }
}

/// Tries strategies in order; the first one that captures wins.
pub fn first_match<'a>(strategies: &[Strategy], text: &'a str) -> Option<(&'static str, &'a str)> {
    strategies
        .iter()
        .find_map(|s| s.capture(text).map(|v| (s.name, v)))
}

// `(?:^|[^\w-])` keeps `Reply-To:` and friends from reading as `To:`.
static RE_FROM_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(?:^|[^\w-])[Ff]rom:\s*<?(?:sip:|tel:)?\+?(\d+)").unwrap()
});
static RE_FROM_NAMED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)(?:^|[^\w-])[Ff]rom:\s*"[^"\n]*"\s*<(?:sip:|tel:)?\+?(\d+)"#).unwrap()
});
static RE_TO_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(?:^|[^\w-])[Tt]o:\s*<?(?:sip:|tel:)?\+?(\d+)").unwrap()
});
static RE_TO_NAMED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)(?:^|[^\w-])[Tt]o:\s*"[^"\n]*"\s*<(?:sip:|tel:)?\+?(\d+)"#).unwrap()
});
static RE_PAI_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)[Pp]-[Aa]sserted-[Ii]dentity:\s*<?(?:sip:|tel:)?\+?(\d+)").unwrap()
});
static RE_PAI_NAMED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)[Pp]-[Aa]sserted-[Ii]dentity:\s*"[^"\n]*"\s*<(?:sip:|tel:)?\+?(\d+)"#).unwrap()
});

pub static FROM_STRATEGIES: &[Strategy] = &[
    Strategy { name: "from-uri", re: &RE_FROM_URI },
    Strategy { name: "from-display-name", re: &RE_FROM_NAMED },
];
pub static TO_STRATEGIES: &[Strategy] = &[
    Strategy { name: "to-uri", re: &RE_TO_URI },
    Strategy { name: "to-display-name", re: &RE_TO_NAMED },
];
pub static ASSERTED_STRATEGIES: &[Strategy] = &[
    Strategy { name: "pai-uri", re: &RE_PAI_URI },
    Strategy { name: "pai-display-name", re: &RE_PAI_NAMED },
];

static RE_USER_AGENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)[Uu]ser-[Aa]gent:\s*([^\r\n,;]+)").unwrap()
});
static RE_CONTACT_IP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)[Cc]ontact:\s*(?:"[^"\n]*"\s*)?<?sips?:[^@\s>]+@(\d{1,3}(?:\.\d{1,3}){3})"#).unwrap()
});
static RE_CALL_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[Cc]all-[Ii][Dd]:\s*(\S+)").unwrap()
});
static RE_CSEQ: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i:cseq):\s*(\d+)\s+([A-Za-z]+)").unwrap()
});
static RE_REASON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(?:^|[^\w-])[Rr]eason:\s*([^\r\n]+)").unwrap()
});
static RE_Q850_CAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Q\.850\s*;\s*cause\s*=\s*(\d{1,3})").unwrap()
});
static RE_BRANCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"branch=(z9hG4bK[^\s;,>"]+)"#).unwrap()
});
static RE_RTPMAP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"a=rtpmap:\d+\s+([^\r\n/]+)").unwrap()
});
static RE_DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());
static RE_FORMAT_CHANGED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[Ff]ormats?\s+(?:for\s+\S+\s+)?changed\s+to\s+['"]?([^\s'"]+)"#).unwrap()
});

/// Shortest and longest digit runs accepted as dialable numbers. Longer runs
/// are subscriber identities, shorter ones extensions or counters.
pub const MIN_NUMBER_DIGITS: usize = 7;
pub const MAX_NUMBER_DIGITS: usize = 15;

pub fn from_digits(body: &str) -> Option<&str> {
    first_match(FROM_STRATEGIES, body).map(|(_, v)| v)
}

pub fn to_digits(body: &str) -> Option<&str> {
    first_match(TO_STRATEGIES, body).map(|(_, v)| v)
}

pub fn asserted_digits(body: &str) -> Option<&str> {
    first_match(ASSERTED_STRATEGIES, body).map(|(_, v)| v)
}

pub fn is_phone_number(digits: &str) -> bool {
    (MIN_NUMBER_DIGITS..=MAX_NUMBER_DIGITS).contains(&digits.len())
}

/// Best-effort E.164 digits (no `+`): drop formatting and leading zeros, and
/// prefix 9-digit national numbers with `national_prefix`.
pub fn normalize_number(raw: &str, national_prefix: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let stripped = digits.trim_start_matches('0');
    if stripped.len() == 9 {
        format!("{national_prefix}{stripped}")
    } else {
        stripped.to_string()
    }
}

/// From, To and P-Asserted-Identity digit runs that look like phone numbers.
pub fn party_numbers(body: &str) -> Vec<&str> {
    [from_digits(body), to_digits(body), asserted_digits(body)]
        .into_iter()
        .flatten()
        .filter(|d| is_phone_number(d))
        .collect()
}

/// True when `text` carries one of `numbers` (already normalized), either
/// verbatim or as a phone-like digit run that normalizes to it.
pub fn mentions_number(text: &str, numbers: &[&str], national_prefix: &str) -> bool {
    if numbers.iter().any(|n| text.contains(n)) {
        return true;
    }
    RE_DIGIT_RUN
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|d| is_phone_number(d))
        .any(|d| numbers.contains(&normalize_number(d, national_prefix).as_str()))
}

pub fn user_agent(body: &str) -> Option<&str> {
    RE_USER_AGENT
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

/// User-Agent of a call party; the proxy's own identity reads as `None`.
pub fn device(body: &str, config: &AnalyzerConfig) -> Option<String> {
    user_agent(body)
        .filter(|ua| !config.is_proxy(ua))
        .map(str::to_string)
}

pub fn contact_ip(body: &str) -> Option<&str> {
    RE_CONTACT_IP.captures(body).and_then(|c| c.get(1)).map(|m| m.as_str())
}

pub fn call_id(body: &str) -> Option<&str> {
    RE_CALL_ID.captures(body).and_then(|c| c.get(1)).map(|m| m.as_str())
}

pub fn cseq(body: &str) -> Option<(u32, String)> {
    let caps = RE_CSEQ.captures(body)?;
    let seq = caps[1].parse().ok()?;
    Some((seq, caps[2].to_ascii_uppercase()))
}

pub fn reason(body: &str) -> Option<&str> {
    RE_REASON
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

pub fn q850_cause_in(text: &str) -> Option<u16> {
    RE_Q850_CAUSE.captures(text).and_then(|c| c[1].parse().ok())
}

pub fn branch(body: &str) -> Option<&str> {
    RE_BRANCH.captures(body).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Codec names from SDP `a=rtpmap` lines, first-seen order, no repeats.
pub fn rtpmap_codecs(body: &str) -> Vec<String> {
    RE_RTPMAP
        .captures_iter(body)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unique()
        .collect()
}

/// Codec named by a `Format(s) ... changed to 'x'` media marker.
pub fn format_change_codec(text: &str) -> Option<String> {
    RE_FORMAT_CHANGED
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim_matches(|c: char| c == '\'' || c == '"' || c == ' ').to_string())
        .filter(|s| !s.is_empty())
}

pub fn hangup_cause<'a>(body: &'a str, config: &AnalyzerConfig) -> Option<&'a str> {
    config
        .hangup_cause_headers
        .iter()
        .find_map(|h| headers::header_value(body, h))
}

pub fn hangup_cause_code(body: &str, config: &AnalyzerConfig) -> Option<u16> {
    config
        .hangup_cause_code_headers
        .iter()
        .find_map(|h| headers::header_value(body, h))
        .and_then(|v| {
            let digits: String = v.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        })
}

/// Full `Via:` / `Route:` / `Record-Route:` header values, line-anchored.
pub fn header_lines<'a>(body: &'a str, name: &str) -> Vec<&'a str> {
    body.lines()
        .map(str::trim_start)
        .filter_map(|l| {
            let (n, v) = l.split_once(':')?;
            n.eq_ignore_ascii_case(name).then(|| v.trim())
        })
        .filter(|v| !v.is_empty())
        .collect()
}
