use callscope::classify::{classify, DiameterCommand, EventKind, SipMethod};

#[test]
fn request_line_yields_method() {
    assert_eq!(classify("INVITE sip:+41447654321@ims SIP/2.0\nVia: x"), EventKind::Request(SipMethod::Invite));
    assert_eq!(classify("------\nBYE sip:a@b SIP/2.0"), EventKind::Request(SipMethod::Bye));
}

#[test]
fn method_token_needs_a_request_uri() {
    assert_eq!(classify("INVITE"), EventKind::Internal);
    assert_eq!(classify("INVITED sip:x SIP/2.0"), EventKind::Internal);
}

#[test]
fn status_line_yields_code_and_phrase() {
    let kind = classify("SIP/2.0 180 Ringing\nCall-ID: abc");
    assert_eq!(kind.status_code(), Some(180));
    assert_eq!(kind.to_string(), "180 Ringing");
}

#[test]
fn long_phrases_are_truncated() {
    let kind = classify("SIP/2.0 503 Service Unavailable because the upstream trunk is congested");
    let label = kind.to_string();
    assert!(label.starts_with("503 Service Unavailable"));
    assert!(label.len() <= "503 ".len() + 30);
}

#[test]
fn diameter_token_in_first_line_or_window() {
    assert_eq!(
        classify("Sending CCR to ocs.example\n<xml/>"),
        EventKind::Diameter(DiameterCommand::CreditControlRequest)
    );
    assert_eq!(
        classify("diameter message\npeer=ocs CCA result follows"),
        EventKind::Diameter(DiameterCommand::CreditControlAnswer)
    );
}

#[test]
fn diameter_token_past_window_is_internal() {
    let body = format!("header\n{}\nCCR", "x".repeat(200));
    assert_eq!(classify(&body), EventKind::Internal);
}

#[test]
fn unmatched_bodies_are_internal() {
    let kind = classify("pgw/session/create {\"pgw_session\": \"228011234567890\"}");
    assert_eq!(kind, EventKind::Internal);
    assert_eq!(kind.to_string(), "internal");
    assert!(!kind.is_sip());
}

#[test]
fn serializes_as_label() {
    let v = serde_json::to_value(EventKind::Request(SipMethod::Cancel)).unwrap();
    assert_eq!(v, serde_json::json!("CANCEL"));
}
