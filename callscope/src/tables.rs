//! Fixed lookup tables. Each is a plain slice so it is built at compile time
//! and searched linearly; none has more than a few dozen rows.

/// ITU-T Q.850 release causes that show up in softswitch hangup headers.
pub const Q850_CAUSES: &[(u16, &str)] = &[
    (16, "Normal call clearing"),
    (17, "User busy"),
    (18, "No user responding"),
    (19, "No answer from user"),
    (21, "Call rejected"),
    (31, "Normal, unspecified"),
];

pub const UNKNOWN_CAUSE: &str = "Unknown cause";

/// RFC 6733 / RFC 4006 symbolic Result-Code names.
pub const DIAMETER_SYMBOLIC_RESULTS: &[(&str, &str)] = &[
    ("DIAMETER_SUCCESS", "Success"),
    ("DIAMETER_LIMITED_SUCCESS", "Limited success"),
    ("DIAMETER_UNABLE_TO_DELIVER", "Unable to deliver"),
    ("DIAMETER_TOO_BUSY", "Peer too busy"),
    ("DIAMETER_END_USER_SERVICE_DENIED", "End user service denied"),
    ("DIAMETER_CREDIT_CONTROL_NOT_APPLICABLE", "Credit control not applicable"),
    ("DIAMETER_CREDIT_LIMIT_REACHED", "Credit limit reached (quota exhausted)"),
    ("DIAMETER_AUTHORIZATION_REJECTED", "Authorization rejected"),
    ("DIAMETER_UNABLE_TO_COMPLY", "Unable to comply"),
    ("DIAMETER_USER_UNKNOWN", "User unknown"),
    ("DIAMETER_RATING_FAILED", "Rating failed"),
    ("DIAMETER_MISSING_AVP", "Missing AVP"),
    ("DIAMETER_UNKNOWN_SESSION_ID", "Unknown session"),
    ("REJECTED_INITIAL", "Initial request rejected"),
];

/// Numeric Result-Code values for the same outcomes.
pub const DIAMETER_NUMERIC_RESULTS: &[(u32, &str)] = &[
    (2001, "Success"),
    (2002, "Limited success"),
    (3002, "Unable to deliver"),
    (3004, "Peer too busy"),
    (4010, "End user service denied"),
    (4011, "Credit control not applicable"),
    (4012, "Credit limit reached (quota exhausted)"),
    (5002, "Unknown session"),
    (5003, "Authorization rejected"),
    (5005, "Missing AVP"),
    (5012, "Unable to comply"),
    (5030, "User unknown"),
    (5031, "Rating failed"),
];

/// 3GPP Service-Context-Id prefixes (`<code>@3gpp.org`).
pub const SERVICE_CONTEXTS: &[(&str, &str)] = &[
    ("32251", "data"),
    ("32276", "voice/SMS"),
    ("32274", "MMS"),
];

pub fn q850_cause(code: u16) -> &'static str {
    Q850_CAUSES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, d)| *d)
        .unwrap_or(UNKNOWN_CAUSE)
}

pub fn diameter_symbolic(symbol: &str) -> Option<&'static str> {
    DIAMETER_SYMBOLIC_RESULTS
        .iter()
        .find(|(s, _)| s.eq_ignore_ascii_case(symbol))
        .map(|(_, l)| *l)
}

pub fn diameter_numeric(code: u32) -> Option<&'static str> {
    DIAMETER_NUMERIC_RESULTS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, l)| *l)
}

/// Falls back to the raw code when the context is not in the table.
pub fn service_context(code: &str) -> String {
    SERVICE_CONTEXTS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, l)| (*l).to_string())
        .unwrap_or_else(|| code.to_string())
}
