use callscope::analysis::{AnalyzeRequest, CallFilter};
use callscope::bye::{self, USER_HANGUP_NOTE};
use callscope::config::AnalyzerConfig;
use callscope::headers;
use callscope::parser;

fn bye_block(ts: &str, from: &str, to: &str, extra: &str) -> String {
    format!(
        "{ts} <sip:info> Received message\nBYE sip:{to}@ims SIP/2.0\nFrom: <sip:+{from}@ims>;tag=1\nTo: <sip:+{to}@ims>;tag=2\nCall-ID: abc123\nCSeq: 2 BYE\n{extra}"
    )
}

fn filter(caller: Option<&str>, callee: Option<&str>, caller_imsi: Option<&str>) -> CallFilter {
    let req = AnalyzeRequest {
        caller: caller.map(str::to_string),
        callee: callee.map(str::to_string),
        caller_imsi: caller_imsi.map(str::to_string),
        ..AnalyzeRequest::default()
    };
    CallFilter::from_request(&req, &AnalyzerConfig::default())
}

#[test]
fn evidence_follows_fixed_priority() {
    let log = [
        "2024-03-01_10:15:00.000000 <pgw:info> pgw/session/delete {\"pgw_session\": \"228011234567890\"}\n".to_string(),
        bye_block(
            "2024-03-01_10:15:35.000000",
            "41791234567",
            "41447654321",
            "Reason: Q.850;cause=16\nUser-Agent: Phone-A/1.0\nX-Asterisk-HangupCause: Normal Clearing\nX-Asterisk-HangupCauseCode: 16\n",
        ),
        "2024-03-01_10:15:36.000000 <reg:info> registrar\nUnregistered user +41791234567\n".to_string(),
    ]
    .concat();
    let text = headers::normalize_headers(&log);
    let blocks = parser::split_blocks(&text);
    let config = AnalyzerConfig::default();
    let f = filter(Some("+41791234567"), Some("0447654321"), None);

    let b = bye::analyze_bye(&blocks, &text, &f, &config).unwrap();
    assert_eq!(b.sender, "Caller (+41791234567)");
    assert_eq!(b.sender_number, "+41791234567");
    assert_eq!(b.reason.as_deref(), Some("Q.850;cause=16"));
    assert_eq!(
        b.evidence,
        vec![
            "Reason header: Q.850;cause=16",
            "Sent by device: Phone-A/1.0",
            "Device de-registered immediately after BYE",
            "Hangup cause: Normal Clearing",
            "Q.850 cause 16: Normal call clearing",
            "PGW session for IMSI 228011234567890 torn down before/at BYE",
        ]
    );
    assert!(b.raw_snippet.starts_with("BYE sip:"));
}

#[test]
fn bye_must_belong_to_hinted_parties() {
    let log = [
        bye_block("2024-03-01_10:15:10.000000", "41790000001", "41790000002", ""),
        bye_block("2024-03-01_10:15:20.000000", "41447654321", "41791234567", ""),
    ]
    .concat();
    let blocks = parser::split_blocks(&log);
    let config = AnalyzerConfig::default();

    let f = filter(Some("41791234567"), None, None);
    let b = bye::analyze_bye(&blocks, &log, &f, &config).unwrap();
    assert_eq!(b.sender, "+41447654321");
    assert_eq!(b.evidence, vec![USER_HANGUP_NOTE]);

    let unhinted = bye::analyze_bye(&blocks, &log, &CallFilter::default(), &config).unwrap();
    assert_eq!(unhinted.sender_number, "+41790000001");

    let stranger = filter(Some("41799999999"), None, None);
    assert!(bye::analyze_bye(&blocks, &log, &stranger, &config).is_none());
}

#[test]
fn sender_matches_caller_imsi() {
    let log = "2024-03-01_10:15:10.000000 <sip:info> Received message\nBYE sip:x SIP/2.0\nFrom: <sip:228011234567890@ims>\nTo: <sip:+41447654321@ims>\n";
    let blocks = parser::split_blocks(log);
    let f = filter(Some("+41791234567"), Some("+41447654321"), Some("228011234567890"));
    let b = bye::analyze_bye(&blocks, log, &f, &AnalyzerConfig::default()).unwrap();
    assert_eq!(b.sender, "Caller (+41791234567)");
}

#[test]
fn teardown_after_bye_or_other_imsi_is_ignored() {
    let log = [
        bye_block("2024-03-01_10:15:10.000000", "41791234567", "41447654321", ""),
        "2024-03-01_10:15:11.000000 <pgw:info> pgw/session/delete {\"pgw_session\": \"228011234567890\"}\n".to_string(),
    ]
    .concat();
    let blocks = parser::split_blocks(&log);
    let b = bye::analyze_bye(&blocks, &log, &CallFilter::default(), &AnalyzerConfig::default()).unwrap();
    assert_eq!(b.evidence, vec![USER_HANGUP_NOTE]);
}

#[test]
fn unknown_cause_code_renders_generic_text() {
    let log = bye_block("2024-03-01_10:15:10.000000", "41791234567", "41447654321", "Reason: Q.850;cause=99\n");
    let blocks = parser::split_blocks(&log);
    let b = bye::analyze_bye(&blocks, &log, &CallFilter::default(), &AnalyzerConfig::default()).unwrap();
    assert!(b.evidence.contains(&"Q.850 cause 99: Unknown cause".to_string()));
}

#[test]
fn national_format_log_matches_international_hints() {
    let sip = |ts: &str, first: &str, cseq: &str, extra: &str| {
        format!(
            "{ts} <sip:info> Received message\n{first}\nFrom: <sip:0791234567@ims>;tag=1\nTo: <sip:0447654321@ims>\nCall-ID: nat-1\nCSeq: {cseq}\n{extra}"
        )
    };
    let log = [
        sip("2024-03-01_10:15:00.000000", "INVITE sip:0447654321@ims SIP/2.0", "1 INVITE", ""),
        sip("2024-03-01_10:15:05.000000", "SIP/2.0 200 OK", "1 INVITE", ""),
        sip("2024-03-01_10:15:35.000000", "BYE sip:0791234567@ims SIP/2.0", "2 BYE", "Reason: Q.850;cause=16\n"),
        "2024-03-01_10:15:36.000000 <reg:info> registrar\nUnregistered user 0791234567\n".to_string(),
    ]
    .concat();
    let config = AnalyzerConfig::default();
    let blocks = parser::split_blocks(&log);
    let f = filter(Some("+41791234567"), None, None);

    let b = bye::analyze_bye(&blocks, &log, &f, &config).unwrap();
    assert_eq!(b.sender, "Caller (+41791234567)");
    assert_eq!(b.sender_number, "+41791234567");
    assert!(b.evidence.contains(&"Device de-registered immediately after BYE".to_string()));
    assert!(b.evidence.contains(&"Q.850 cause 16: Normal call clearing".to_string()));

    let req = AnalyzeRequest { caller: Some("+41791234567".to_string()), ..AnalyzeRequest::new(log) };
    let result = callscope::analysis::analyze(&req, &config);
    assert_eq!(result.timing.call_duration.as_deref(), Some("30.0s"));
    assert!(result.bye_analysis.is_some());
}

#[test]
fn bye_from_hinted_imsi_is_accepted() {
    let log = "2024-03-01_10:15:10.000000 <sip:info> Received message\nBYE sip:x SIP/2.0\nFrom: <sip:228011234567890@ims>\nTo: <sip:voicemail@ims>\n";
    let blocks = parser::split_blocks(log);
    let f = filter(Some("+41791234567"), None, Some("228011234567890"));
    let b = bye::analyze_bye(&blocks, log, &f, &AnalyzerConfig::default()).unwrap();
    assert_eq!(b.sender, "Caller (+41791234567)");
}
