use callscope::config::AnalyzerConfig;
use callscope::model::Role;
use callscope::parser;
use callscope::participants::{self, Roster};

const LOG: &str = "\
2024-03-01_10:15:00.000000 <sip:info> Received message
INVITE sip:0447654321@ims SIP/2.0
From: <sip:+41791234567@ims>;tag=1
To: <sip:0447654321@ims>
Contact: <sip:+41791234567@10.0.0.1:5060>
User-Agent: YATE/6.4.0
2024-03-01_10:15:01.000000 <sip:info> Sending message
SIP/2.0 200 OK
From: <sip:0791234567@ims>;tag=1
To: <sip:+41447654321@ims>;tag=2
Contact: <sip:+41447654321@10.0.0.9:5060>
User-Agent: Phone-B/2.0
2024-03-01_10:15:02.000000 <sip:info> Received message
PRACK sip:0447654321@ims SIP/2.0
From: <sip:41791234567@ims>
To: <sip:0447654321@ims>
User-Agent: Phone-A/1.0
Contact: <sip:+41791234567@10.9.9.9:5060>
2024-03-01_10:15:03.000000 <cdr:debug> charging
CCR
<SubscriptionIdType>END_USER_E164</SubscriptionIdType><SubscriptionIdData>447654321</SubscriptionIdData>
<SubscriptionIdType>END_USER_IMSI</SubscriptionIdType><SubscriptionIdData>228011234567890</SubscriptionIdData>
";

#[test]
fn sightings_merge_on_normalized_number() {
    let blocks = parser::split_blocks(LOG);
    let roster = participants::resolve(&blocks, &AnalyzerConfig::default());
    assert_eq!(roster.len(), 2);
    let list = roster.participants();
    assert_eq!(list[0].number, "+41791234567");
    assert_eq!(list[1].number, "+41447654321");
    assert!(list.iter().all(|p| p.role == Role::Unknown));
}

#[test]
fn first_sighting_wins_and_proxy_is_no_device() {
    let blocks = parser::split_blocks(LOG);
    let roster = participants::resolve(&blocks, &AnalyzerConfig::default());
    let caller = roster.get("41791234567").unwrap();
    // The INVITE came through the proxy, so the device is filled later.
    assert_eq!(caller.device.as_deref(), Some("Phone-A/1.0"));
    assert_eq!(caller.ip.as_deref(), Some("10.0.0.1"));
}

#[test]
fn device_and_contact_belong_to_the_sender_only() {
    let blocks = parser::split_blocks(LOG);
    let roster = participants::resolve(&blocks, &AnalyzerConfig::default());
    let callee = roster.get("41447654321").unwrap();
    assert_eq!(callee.device.as_deref(), Some("Phone-B/2.0"));
    assert_eq!(callee.ip.as_deref(), Some("10.0.0.9"));

    let text = "2024-03-01_10:15:00.0 <sip:info> x
INVITE sip:0447654321@ims SIP/2.0
From: <sip:+41791234567@ims>
To: <sip:+41447654321@ims>
User-Agent: Phone-A/1.0
Contact: <sip:+41791234567@10.0.0.1>
";
    let roster = participants::resolve(&parser::split_blocks(text), &AnalyzerConfig::default());
    assert_eq!(roster.len(), 2);
    let callee = roster.get("41447654321").unwrap();
    assert_eq!(callee.device, None);
    assert_eq!(callee.ip, None);
    assert_eq!(roster.get("41791234567").unwrap().device.as_deref(), Some("Phone-A/1.0"));
}

#[test]
fn charging_identity_attaches_imsi() {
    let blocks = parser::split_blocks(LOG);
    let roster = participants::resolve(&blocks, &AnalyzerConfig::default());
    let callee = roster.get("41447654321").unwrap();
    assert_eq!(callee.imsi.as_deref(), Some("228011234567890"));
    assert!(roster.get("41791234567").unwrap().imsi.is_none());
}

#[test]
fn roster_observe_never_overwrites() {
    let mut roster = Roster::default();
    roster.observe("41791234567", None, Some("10.0.0.1"));
    roster.observe("41791234567", Some("Phone-A"), Some("10.0.0.2"));
    roster.observe("41791234567", Some("Phone-C"), None);
    let p = roster.get("41791234567").unwrap();
    assert_eq!(p.device.as_deref(), Some("Phone-A"));
    assert_eq!(p.ip.as_deref(), Some("10.0.0.1"));
    assert_eq!(roster.len(), 1);
}

#[test]
fn non_sip_blocks_are_ignored() {
    let text = "2024-03-01_10:15:00.0 <x> y\nFrom: <sip:+41791234567@a>\n";
    let blocks = parser::split_blocks(text);
    assert!(participants::resolve_participants(&blocks, &AnalyzerConfig::default()).is_empty());
}
