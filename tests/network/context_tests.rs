use netpath::core::network::{ContextError, ProbeContext};
use std::time::Duration;
use tokio::time::{sleep, timeout};

#[tokio::test]
async fn test_background_context_stays_live() {
    let ctx = ProbeContext::background();

    assert!(ctx.err().is_none());
    assert!(ctx.deadline().is_none());
    assert_eq!(ctx.bounded(Duration::from_secs(3)), Duration::from_secs(3));
    assert!(timeout(Duration::from_millis(20), ctx.done()).await.is_err());
}

#[tokio::test]
async fn test_cancel_reaches_every_clone() {
    let ctx = ProbeContext::background();
    let clone = ctx.clone();

    let waiter = tokio::spawn(async move { clone.done().await });
    ctx.cancel();

    assert_eq!(waiter.await.unwrap(), ContextError::Cancelled);
    assert_eq!(ctx.err(), Some(ContextError::Cancelled));
}

#[tokio::test]
async fn test_deadline_expires() {
    let ctx = ProbeContext::with_timeout(Duration::from_millis(30));
    assert!(ctx.err().is_none());

    assert_eq!(ctx.done().await, ContextError::DeadlineExceeded);
    assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
    assert_eq!(ctx.remaining(), Some(Duration::ZERO));
}

#[tokio::test]
async fn test_bounded_never_outlives_deadline() {
    let ctx = ProbeContext::with_timeout(Duration::from_millis(200));
    assert!(ctx.bounded(Duration::from_secs(10)) <= Duration::from_millis(200));
    assert_eq!(ctx.bounded(Duration::from_millis(5)), Duration::from_millis(5));
}

#[tokio::test]
async fn test_cancellation_wins_over_expired_deadline() {
    let ctx = ProbeContext::with_timeout(Duration::from_millis(1));
    sleep(Duration::from_millis(10)).await;
    ctx.cancel();

    assert_eq!(ctx.err(), Some(ContextError::Cancelled));
    assert_eq!(ContextError::Cancelled.to_string(), "context canceled");
    assert_eq!(
        ContextError::DeadlineExceeded.to_string(),
        "context deadline exceeded"
    );
}

#[tokio::test]
async fn test_unrepresentable_timeout_means_no_deadline() {
    let ctx = ProbeContext::with_timeout(Duration::from_secs(u64::MAX));

    assert!(ctx.deadline().is_none());
    assert!(ctx.err().is_none());
    assert_eq!(ctx.bounded(Duration::from_secs(3)), Duration::from_secs(3));

    ctx.cancel();
    assert_eq!(ctx.done().await, ContextError::Cancelled);
}
