use crate::common::closed_port;
use netpath::core::network::checkers::{
    classify_tcp_failure, TcpChecker, TcpFailure, TcpFailureKind, TokioTcpChecker,
};
use netpath::core::network::{ContextError, Endpoint, EndpointClass, ProbeContext, Status};
use std::time::Duration;

fn endpoint(target: &str) -> Endpoint {
    Endpoint::must_tcp(target, EndpointClass::Public, "loopback")
}

#[tokio::test]
async fn test_connect_to_listener_passes() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let probe = TokioTcpChecker::default()
        .check(&ProbeContext::background(), &endpoint(&addr.to_string()))
        .await;

    assert_eq!(probe.status(), Status::Pass);
    assert!(probe.error().is_empty());
    assert!(probe.latency_ms() >= 0.0);
}

#[tokio::test]
async fn test_closed_port_is_refused() {
    let addr = closed_port();

    let probe = TokioTcpChecker::default()
        .check(&ProbeContext::background(), &endpoint(&addr.to_string()))
        .await;

    assert_eq!(probe.status(), Status::ConnectionRefused);
    assert!(probe.error().starts_with(&format!("dial {}", addr)));
}

#[tokio::test]
async fn test_cancelled_context_skips_dial() {
    let ctx = ProbeContext::background();
    ctx.cancel();

    let probe = TokioTcpChecker::new(Duration::from_secs(3))
        .check(&ctx, &endpoint("127.0.0.1:9"))
        .await;

    assert_eq!(probe.status(), Status::Timeout);
    assert_eq!(probe.error(), "context canceled");
}

#[test]
fn test_tcp_classification_table() {
    let cases = [
        (TcpFailureKind::Refused, None, Status::ConnectionRefused),
        (TcpFailureKind::DialTimeout, None, Status::Timeout),
        (TcpFailureKind::Other, None, Status::Fail),
        (
            TcpFailureKind::Refused,
            Some(ContextError::DeadlineExceeded),
            Status::Timeout,
        ),
    ];

    for (kind, context, expected) in cases {
        let failure = TcpFailure {
            kind,
            message: "dial example.com:443: failure".to_string(),
            context,
        };
        assert_eq!(classify_tcp_failure(&failure), expected, "{:?}", kind);
    }
}

/// Listener whose accept queue is full, so further SYNs go unanswered
#[cfg(target_os = "linux")]
async fn saturated_listener() -> (tokio::net::TcpListener, Vec<tokio::net::TcpStream>) {
    let socket = tokio::net::TcpSocket::new_v4().unwrap();
    socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let listener = socket.listen(0).unwrap();
    let addr = listener.local_addr().unwrap();

    let mut fillers = Vec::new();
    for _ in 0..3 {
        if let Ok(Ok(stream)) =
            tokio::time::timeout(Duration::from_millis(100), tokio::net::TcpStream::connect(addr)).await
        {
            fillers.push(stream);
        }
    }
    (listener, fillers)
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_cancel_during_dial_fails_fast() {
    let (listener, _fillers) = saturated_listener().await;
    let target = listener.local_addr().unwrap().to_string();
    let ctx = ProbeContext::background();

    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        canceller.cancel();
    });

    let start = std::time::Instant::now();
    let probe = TokioTcpChecker::new(Duration::from_secs(30))
        .check(&ctx, &endpoint(&target))
        .await;

    assert_eq!(probe.status(), Status::Timeout);
    assert_eq!(probe.error(), "context canceled");
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_expiring_context_bounds_dial() {
    let (listener, _fillers) = saturated_listener().await;
    let target = listener.local_addr().unwrap().to_string();
    let ctx = ProbeContext::with_timeout(Duration::from_millis(200));

    let start = std::time::Instant::now();
    let probe = TokioTcpChecker::new(Duration::from_secs(30))
        .check(&ctx, &endpoint(&target))
        .await;

    assert_eq!(probe.status(), Status::Timeout);
    assert!(start.elapsed() < Duration::from_secs(5));
}
