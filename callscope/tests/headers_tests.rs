use callscope::headers::{header_value, normalize_headers};
use proptest::prelude::*;

#[test]
fn splits_concatenated_headers_onto_lines() {
    let glued = "INVITE sip:x SIP/2.0 Via: SIP/2.0/UDP 10.0.0.1 From: <sip:+41791234567@a> To: <sip:+41447654321@a> Call-ID: abc123 CSeq: 1 INVITE";
    let out = normalize_headers(glued);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "INVITE sip:x SIP/2.0 ");
    assert!(lines[1].starts_with("Via: "));
    assert!(lines[2].starts_with("From: "));
    assert!(lines[3].starts_with("To: "));
    assert!(lines[4].starts_with("Call-ID: abc123"));
    assert!(lines[5].starts_with("CSeq: 1 INVITE"));
}

#[test]
fn leaves_hyphenated_tails_alone() {
    let out = normalize_headers("x Record-Route: <sip:p1> Reply-To: someone");
    assert!(out.contains("\nRecord-Route: <sip:p1>"));
    assert!(!out.contains("\nRoute:"));
    assert!(out.contains("Reply-To: someone"));
}

#[test]
fn already_normalized_text_is_unchanged() {
    let text = "BYE sip:x SIP/2.0\nFrom: <sip:1@a>\nTo: <sip:2@a>\n";
    assert_eq!(normalize_headers(text), text);
}

#[test]
fn header_value_is_case_insensitive_and_bounded() {
    let body = "SIP/2.0 200 OK\nx-asterisk-hangupcause: Normal Clearing\nX-Asterisk-HangupCauseCode: 16\n";
    assert_eq!(header_value(body, "X-Asterisk-HangupCause"), Some("Normal Clearing"));
    assert_eq!(header_value(body, "X-Asterisk-HangupCauseCode"), Some("16"));
    assert_eq!(header_value(body, "Reason"), None);
}

#[test]
fn header_value_accepts_missing_colon() {
    assert_eq!(header_value("X-Asterisk-HangupCauseCode 17", "X-Asterisk-HangupCauseCode"), Some("17"));
}

proptest! {
    #[test]
    fn normalization_is_idempotent(parts in proptest::collection::vec(
        prop_oneof![
            Just("Via: "), Just("From: "), Just("To: "), Just("Call-ID: "), Just("Reply-To: "),
            Just("Record-Route: "), Just("x"), Just(" "), Just("\n"), Just("-"), Just("sip:1@a"),
        ],
        0..24,
    )) {
        let text: String = parts.concat();
        let once = normalize_headers(&text);
        prop_assert_eq!(normalize_headers(&once), once);
    }
}
