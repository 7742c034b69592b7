use callscope::analysis::{self, AnalyzeRequest};
use callscope::config::AnalyzerConfig;
use callscope::export;

const LOG: &str = "\
2024-03-01_10:15:00.000000 <sip:info> Sending message
INVITE sip:+41447654321@ims SIP/2.0
From: <sip:+41791234567@ims>;tag=1
To: <sip:+41447654321@ims>
Call-ID: abc123
CSeq: 1 INVITE
2024-03-01_10:15:10.000000 <sip:info> Received message
BYE sip:+41791234567@ims SIP/2.0
From: <sip:+41447654321@ims>;tag=2
To: <sip:+41791234567@ims>
Call-ID: abc123
CSeq: 2 BYE
Reason: Q.850;cause=16
2024-03-01_10:15:10.500000 <sip:info> Received message
SIP/2.0 503 Service Unavailable
Call-ID: abc123
";

fn position(lines: &[&str], needle: &str) -> usize {
    lines.iter().position(|l| *l == needle).unwrap_or_else(|| panic!("missing {needle}"))
}

#[test]
fn sections_appear_in_order() {
    let result = analysis::analyze(&AnalyzeRequest::new(LOG), &AnalyzerConfig::default());
    let csv = export::to_csv(&result).unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    let order = [
        "=== CALL TIMING ===",
        "=== PARTICIPANTS ===",
        "=== CALL FLOW TIMELINE ===",
        "=== BYE ANALYSIS ===",
        "=== ANOMALIES ===",
    ]
    .map(|h| position(&lines, h));
    assert!(order.windows(2).all(|w| w[0] < w[1]));

    assert!(lines.contains(&"Reason,Q.850;cause=16"));
    assert!(lines.contains(&"Evidence,Q.850 cause 16: Normal call clearing"));
    assert!(lines.iter().any(|l| l.starts_with("2024-03-01_10:15:00.000000,outbound,INVITE,")));
    assert!(!csv.contains("=== RTP STATS ==="));
}

#[test]
fn missing_timing_reads_na() {
    let result = analysis::analyze(&AnalyzeRequest::new(""), &AnalyzerConfig::default());
    let csv = export::to_csv(&result).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "=== CALL TIMING ===");
    assert_eq!(lines[1], "Post-Dial Delay,N/A");
    assert_eq!(lines[2], "Ring Time,N/A");
    assert_eq!(lines[3], "Call Duration,N/A");
    assert!(!csv.contains("BYE ANALYSIS"));
    assert!(!csv.contains("ANOMALIES"));
}
