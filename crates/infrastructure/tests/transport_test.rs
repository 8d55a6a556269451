mod helpers;

use helpers::dns_server_mock::{datagram, framed, reply, Handler, MockDnsServer};
use helpers::mock_executor::a;
use std::sync::Arc;
use tern_application::ports::DnsExecutor;
use tern_domain::wire;
use tern_domain::{DnsQuery, DomainError, Message, RecordType};
use tern_infrastructure::dns::{SelectiveTransportExecutor, TcpExecutor, UdpExecutor};

fn query() -> DnsQuery {
    DnsQuery::new("example.com", RecordType::A)
}

fn answering(ip: &'static str) -> Handler {
    Arc::new(move |request: &Message| vec![datagram(&reply(request, vec![a("example.com", ip, 60)]))])
}

fn truncating() -> Handler {
    Arc::new(|request: &Message| {
        let mut response = reply(request, Vec::new());
        response.header.tc = true;
        vec![datagram(&response)]
    })
}

#[tokio::test]
async fn test_udp_round_trip() {
    let server = MockDnsServer::udp(answering("1.2.3.4")).await.unwrap();
    let executor = UdpExecutor::new(server.addr());

    let response = executor.query(&query()).await.unwrap();

    assert!(response.is_response());
    assert_eq!(response.answers[0].data.to_string(), "1.2.3.4");
    assert_eq!(server.requests(), 1);
}

#[tokio::test]
async fn test_udp_truncated_response_is_reported() {
    let server = MockDnsServer::udp(truncating()).await.unwrap();
    let executor = UdpExecutor::new(server.addr());

    let err = executor.query(&query()).await.unwrap_err();
    assert!(matches!(err, DomainError::TruncatedResponse { .. }));
    assert!(err.wants_stream_transport());
}

#[tokio::test]
async fn test_udp_ignores_garbage_and_foreign_ids() {
    let handler: Handler = Arc::new(|request: &Message| {
        let mut spoofed = reply(request, vec![a("example.com", "6.6.6.6", 60)]);
        spoofed.header.id = request.id().wrapping_add(1);
        vec![
            vec![0xde, 0xad, 0xbe, 0xef],
            datagram(&spoofed),
            datagram(&reply(request, vec![a("example.com", "1.2.3.4", 60)])),
        ]
    });
    let server = MockDnsServer::udp(handler).await.unwrap();
    let executor = UdpExecutor::new(server.addr());

    let response = executor.query(&query()).await.unwrap();
    assert_eq!(response.answers[0].data.to_string(), "1.2.3.4");
}

#[tokio::test]
async fn test_tcp_round_trip() {
    let handler: Handler = Arc::new(|request: &Message| {
        vec![framed(&reply(request, vec![a("example.com", "5.6.7.8", 60)]))]
    });
    let server = MockDnsServer::tcp(handler).await.unwrap();
    let executor = TcpExecutor::tcp(server.addr());

    let response = executor.query(&query()).await.unwrap();
    assert_eq!(response.answers[0].data.to_string(), "5.6.7.8");
}

#[tokio::test]
async fn test_tcp_id_mismatch_is_invalid() {
    let handler: Handler = Arc::new(|request: &Message| {
        let mut response = reply(request, Vec::new());
        response.header.id = request.id().wrapping_add(7);
        vec![framed(&response)]
    });
    let server = MockDnsServer::tcp(handler).await.unwrap();
    let executor = TcpExecutor::tcp(server.addr());

    let err = executor.query(&query()).await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidResponse { .. }), "{err}");
}

#[tokio::test]
async fn test_tcp_truncated_bit_is_invalid() {
    let handler: Handler = Arc::new(|request: &Message| {
        let mut response = reply(request, Vec::new());
        response.header.tc = true;
        vec![framed(&response)]
    });
    let server = MockDnsServer::tcp(handler).await.unwrap();
    let executor = TcpExecutor::tcp(server.addr());

    let err = executor.query(&query()).await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidResponse { .. }), "{err}");
}

#[tokio::test]
async fn test_tcp_short_body_is_connection_failure() {
    let handler: Handler = Arc::new(|request: &Message| {
        let mut bytes = framed(&reply(request, Vec::new()));
        bytes.truncate(bytes.len() - 3);
        vec![bytes]
    });
    let server = MockDnsServer::tcp(handler).await.unwrap();
    let executor = TcpExecutor::tcp(server.addr());

    let err = executor.query(&query()).await.unwrap_err();
    assert!(matches!(err, DomainError::ConnectionFailed { .. }), "{err}");
}

#[tokio::test]
async fn test_tcp_connection_refused() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = TcpExecutor::tcp(addr).query(&query()).await.unwrap_err();
    assert!(matches!(err, DomainError::ConnectionFailed { .. }));
}

#[tokio::test]
async fn test_selective_falls_back_to_tcp_on_truncation() {
    let udp = MockDnsServer::udp(truncating()).await.unwrap();
    let tcp_handler: Handler = Arc::new(|request: &Message| {
        vec![framed(&reply(request, vec![a("example.com", "9.9.9.9", 60)]))]
    });
    let tcp = MockDnsServer::tcp(tcp_handler).await.unwrap();

    let executor = SelectiveTransportExecutor::new(
        Arc::new(UdpExecutor::new(udp.addr())),
        Arc::new(TcpExecutor::tcp(tcp.addr())),
    );

    let response = executor.query(&query()).await.unwrap();
    assert_eq!(response.answers[0].data.to_string(), "9.9.9.9");
    assert_eq!(udp.requests(), 1);
    assert_eq!(tcp.requests(), 1);
}

#[tokio::test]
async fn test_selective_keeps_udp_answer() {
    let udp = MockDnsServer::udp(answering("1.2.3.4")).await.unwrap();
    let tcp = MockDnsServer::tcp(answering("9.9.9.9")).await.unwrap();

    let executor = SelectiveTransportExecutor::new(
        Arc::new(UdpExecutor::new(udp.addr())),
        Arc::new(TcpExecutor::tcp(tcp.addr())),
    );

    executor.query(&query()).await.unwrap();
    assert_eq!(tcp.requests(), 0);
}

#[test]
fn test_reply_helper_keeps_question() {
    let request = Message::request(42, query());
    let bytes = datagram(&reply(&request, Vec::new()));
    let decoded = wire::decode(&bytes).unwrap();
    assert_eq!(decoded.id(), 42);
    assert_eq!(decoded.questions, request.questions);
}
