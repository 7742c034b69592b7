use callscope::multiline::RecordAggregator;

#[test]
fn folds_continuation_lines_into_one_record() {
    let lines = vec![
        "stray line before any record",
        "2024-03-01_10:15:00.000000 <sip:info> Sending message",
        "INVITE sip:a SIP/2.0\r",
        "Call-ID: abc123",
        "2024-03-01_10:15:01.000000 <vlr:info> housekeeping",
    ];
    let mut agg = RecordAggregator::default();
    let mut out = Vec::new();
    for l in &lines { if let Some(b) = agg.push(l) { out.push(b); } }
    if let Some(b) = agg.finish() { out.push(b); }

    assert_eq!(out.len(), 2);
    assert_eq!(out[0].offset, lines[0].len() + 1);
    assert_eq!(out[0].source_module, "sip:info");
    assert_eq!(out[0].body, "INVITE sip:a SIP/2.0\nCall-ID: abc123");
    assert!(out[0].preamble.contains("Sending message"));
    assert!(out[1].body.is_empty());
    assert!(out[1].is_blank());
}

#[test]
fn finish_is_empty_without_records() {
    let mut agg = RecordAggregator::default();
    assert!(agg.push("no timestamp here").is_none());
    assert!(agg.finish().is_none());
}
