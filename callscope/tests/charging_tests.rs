use callscope::charging::{self, format_bytes};
use callscope::config::AnalyzerConfig;
use callscope::model::{PgwAction, SessionStatus};
use callscope::parser;

const LOG: &str = r#"2024-03-01_10:14:00.000000 <pgw:info> pgw/session/create {"pgw_session": "228011234567890", "apn": "internet"}
2024-03-01_10:14:00.100000 <ocs:debug> Sending CCR
<CreditControlRequest>
<SessionId>pgw;1;1</SessionId>
<SubscriptionIdType>END_USER_IMSI</SubscriptionIdType><SubscriptionIdData>228011234567890</SubscriptionIdData>
<SubscriptionIdType>END_USER_E164</SubscriptionIdType><SubscriptionIdData>41791234567</SubscriptionIdData>
<CcRequestType>INITIAL_REQUEST</CcRequestType>
<ServiceContextId>32251@3gpp.org</ServiceContextId>
<CalledStationId>internet</CalledStationId>
<FramedIpAddress>10.45.0.7</FramedIpAddress>
</CreditControlRequest>
2024-03-01_10:14:00.200000 <ocs:debug> Received CCA
<CreditControlAnswer result="DIAMETER_SUCCESS">
<SessionId>pgw;1;1</SessionId>
</CreditControlAnswer>
2024-03-01_10:20:00.000000 <ocs:debug> Sending CCR
<CreditControlRequest>
<SessionId>pgw;1;1</SessionId>
<CcRequestType>TERMINATION_REQUEST</CcRequestType>
<UsedServiceUnit><CcInputOctets>1048576</CcInputOctets><CcOutputOctets>524288</CcOutputOctets><CcTime>360</CcTime></UsedServiceUnit>
</CreditControlRequest>
2024-03-01_10:20:00.100000 <pgw:info> pgw/session/delete {"pgw_session": "228011234567890"}
"#;

#[test]
fn pgw_events_include_single_line_records() {
    let config = AnalyzerConfig::default();
    let events = charging::pgw_events(&parser::records(LOG), &config);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].action, PgwAction::Create);
    assert_eq!(events[0].session, "228011234567890");
    assert_eq!(
        events[1].to_string(),
        "[2024-03-01_10:20:00.100000] PGW session DELETE: 228011234567890"
    );
}

#[test]
fn usage_folds_per_session() {
    let config = AnalyzerConfig::default();
    let usage = charging::data_usage(&parser::split_blocks(LOG), &config);
    assert_eq!(usage.len(), 1);
    let s = &usage[0];
    assert_eq!(s.session_id, "pgw;1;1");
    assert_eq!(s.imsi.as_deref(), Some("228011234567890"));
    assert_eq!(s.msisdn.as_deref(), Some("41791234567"));
    assert_eq!(s.apn.as_deref(), Some("internet"));
    assert_eq!(s.service.as_deref(), Some("data"));
    assert_eq!(s.ip.as_deref(), Some("10.45.0.7"));
    assert_eq!(s.start_ts, "2024-03-01_10:14:00.100000");
    assert_eq!(s.end_ts, "2024-03-01_10:20:00.000000");
    assert_eq!(s.in_bytes, 1_048_576);
    assert_eq!(s.out_bytes, 524_288);
    assert_eq!(s.total_bytes, 1_572_864);
    assert_eq!(s.voice_secs, 360);
    assert_eq!(s.request_count, 2);
    assert_eq!(s.last_result.as_deref(), Some("[OK] Success"));
    assert_eq!(s.status, SessionStatus::Terminated);
}

#[test]
fn sip_blocks_are_not_charging_sessions() {
    let log = "2024-03-01_10:15:00.0 <sip:info> x\nINVITE sip:a SIP/2.0\nCall-ID: 1\n";
    assert!(charging::data_usage(&parser::split_blocks(log), &AnalyzerConfig::default()).is_empty());
}

#[test]
fn byte_sizes_render_in_binary_units() {
    assert_eq!(format_bytes(512), "512 B");
    assert_eq!(format_bytes(1536), "1.5 KB");
    assert_eq!(format_bytes(1_572_864), "1.5 MB");
    assert_eq!(format_bytes(1 << 30), "1.0 GB");
    assert_eq!(format_bytes(5 << 40), "5120.0 GB");
}
