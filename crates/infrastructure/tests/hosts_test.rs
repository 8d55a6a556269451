mod helpers;

use helpers::mock_executor::{a, ScriptedExecutor};
use std::sync::Arc;
use tern_application::ports::DnsExecutor;
use tern_domain::{DnsQuery, HostsTable, RecordClass, RecordData, RecordType};
use tern_infrastructure::dns::HostsFileExecutor;

const HOSTS: &str = "\
127.0.0.1   localhost
::1         localhost ip6-localhost
192.168.1.10 nas.lan nas   # storage
";

fn executor() -> (HostsFileExecutor, Arc<ScriptedExecutor>) {
    let inner = ScriptedExecutor::answering(vec![a("example.com", "93.184.216.34", 60)]);
    let hosts = Arc::new(HostsTable::parse(HOSTS));
    (HostsFileExecutor::new(hosts, inner.clone()), inner)
}

#[tokio::test]
async fn test_a_answered_locally_with_zero_ttl() {
    let (executor, inner) = executor();

    let response = executor.query(&DnsQuery::new("NAS.lan", RecordType::A)).await.unwrap();

    assert_eq!(inner.calls(), 0);
    assert_eq!(response.answers.len(), 1);
    assert_eq!(response.answers[0].ttl, 0);
    assert_eq!(response.answers[0].data, RecordData::A("192.168.1.10".parse().unwrap()));
}

#[tokio::test]
async fn test_aaaa_uses_matching_family_only() {
    let (executor, inner) = executor();

    let response = executor
        .query(&DnsQuery::new("localhost", RecordType::AAAA))
        .await
        .unwrap();
    assert_eq!(response.answers[0].data, RecordData::Aaaa("::1".parse().unwrap()));

    // nas.lan has no IPv6 entry
    executor.query(&DnsQuery::new("nas.lan", RecordType::AAAA)).await.unwrap();
    assert_eq!(inner.calls(), 1);
}

#[tokio::test]
async fn test_ptr_answered_from_reverse_table() {
    let (executor, inner) = executor();

    let response = executor
        .query(&DnsQuery::new("10.1.168.192.in-addr.arpa", RecordType::PTR))
        .await
        .unwrap();

    assert_eq!(inner.calls(), 0);
    let names: Vec<_> = response.answers.iter().filter_map(|r| r.data.as_name()).collect();
    assert_eq!(names, vec!["nas.lan", "nas"]);
}

#[tokio::test]
async fn test_other_queries_delegate() {
    let (executor, inner) = executor();

    executor.query(&DnsQuery::new("example.com", RecordType::A)).await.unwrap();
    executor.query(&DnsQuery::new("nas.lan", RecordType::MX)).await.unwrap();
    executor
        .query(&DnsQuery::new("nas.lan", RecordType::A).with_class(RecordClass::CH))
        .await
        .unwrap();

    assert_eq!(inner.calls(), 3);
}
