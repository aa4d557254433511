use netpath::core::network::checkers::{
    classify_ping_failure, is_ping_successful, IcmpChecker, PingFailure, PingPlatform,
    SystemIcmpChecker,
};
use netpath::core::network::{ContextError, Endpoint, EndpointClass, ProbeContext, Status};

const LINUX_REPLY: &str = "PING 1.1.1.1 (1.1.1.1) 56(84) bytes of data.
64 bytes from 1.1.1.1: icmp_seq=1 ttl=57 time=11.2 ms

--- 1.1.1.1 ping statistics ---
1 packets transmitted, 1 received, 0% packet loss, time 0ms
rtt min/avg/max/mdev = 11.214/11.214/11.214/0.000 ms";

const LINUX_LOSS: &str = "PING 10.255.0.1 (10.255.0.1) 56(84) bytes of data.

--- 10.255.0.1 ping statistics ---
1 packets transmitted, 0 received, 100% packet loss, time 0ms";

const MACOS_LOSS: &str = "PING 10.255.0.1 (10.255.0.1): 56 data bytes
Request timeout for icmp_seq 0

--- 10.255.0.1 ping statistics ---
1 packets transmitted, 0 packets received, 100.0% packet loss";

const WINDOWS_REPLY: &str = "Pinging 1.1.1.1 with 32 bytes of data:
Reply from 1.1.1.1: bytes=32 time=12ms TTL=57

Ping statistics for 1.1.1.1:
    Packets: Sent = 1, Received = 1, Lost = 0 (0% loss),";

const WINDOWS_LOSS: &str = "Pinging 10.255.0.1 with 32 bytes of data:
Request timed out.

Ping statistics for 10.255.0.1:
    Packets: Sent = 1, Received = 0, Lost = 1 (100% loss),";

fn failure(output: &str) -> PingFailure {
    PingFailure {
        output: output.to_string(),
        launch_error: None,
        context: None,
    }
}

#[test]
fn test_address_family_flag_follows_target() {
    assert!(PingPlatform::Windows.args("1.1.1.1", 1).contains(&"-4".to_string()));
    assert!(PingPlatform::Windows.args("one.one.one.one", 1).contains(&"-4".to_string()));
    assert!(!PingPlatform::Windows.args("2606:4700:4700::1111", 1).contains(&"-4".to_string()));
    assert!(!PingPlatform::Posix.args("::1", 1).contains(&"-4".to_string()));
    assert_eq!(PingPlatform::Posix.args("::1", 1).last().map(String::as_str), Some("::1"));
}

#[test]
fn test_posix_output_parsing() {
    assert!(is_ping_successful(LINUX_REPLY, PingPlatform::Posix, 1));
    assert!(!is_ping_successful(LINUX_LOSS, PingPlatform::Posix, 1));
    assert!(!is_ping_successful(MACOS_LOSS, PingPlatform::Posix, 1));
    assert!(!is_ping_successful("", PingPlatform::Posix, 1));
}

#[test]
fn test_windows_output_parsing() {
    assert!(is_ping_successful(WINDOWS_REPLY, PingPlatform::Windows, 1));
    assert!(!is_ping_successful(WINDOWS_LOSS, PingPlatform::Windows, 1));
    assert!(is_ping_successful(
        "Reply from 1.1.1.1: bytes=32 time=12ms TTL=57",
        PingPlatform::Windows,
        1
    ));
}

#[test]
fn test_ping_failure_classification() {
    assert_eq!(classify_ping_failure(&failure(LINUX_LOSS)), Status::Timeout);
    assert_eq!(classify_ping_failure(&failure(MACOS_LOSS)), Status::Timeout);
    assert_eq!(classify_ping_failure(&failure(WINDOWS_LOSS)), Status::Timeout);
    assert_eq!(
        classify_ping_failure(&failure("ping: unknown host nope.invalid")),
        Status::DnsFailure
    );
    assert_eq!(
        classify_ping_failure(&failure(
            "ping: nope.invalid: Name or service not known"
        )),
        Status::DnsFailure
    );
    assert_eq!(
        classify_ping_failure(&failure("From 10.0.0.1 icmp_seq=1 Destination Host Unreachable")),
        Status::Timeout
    );
    assert_eq!(
        classify_ping_failure(&failure("ping: socket: Operation not permitted")),
        Status::Invalid
    );
}

#[test]
fn test_context_error_classifies_as_timeout() {
    let mut f = failure("ping: unknown host nope.invalid");
    f.context = Some(ContextError::DeadlineExceeded);
    assert_eq!(classify_ping_failure(&f), Status::Timeout);
}

#[tokio::test]
async fn test_missing_ping_binary_is_a_failed_probe() {
    let checker = SystemIcmpChecker::new("netpath-test-no-such-ping", PingPlatform::current(), 1);
    let endpoint = Endpoint::must_icmp("127.0.0.1", EndpointClass::Public, "loopback");

    let probe = checker
        .check_ping(&ProbeContext::background(), &endpoint)
        .await;

    assert_eq!(probe.status(), Status::Invalid);
    assert!(probe.error().starts_with("launch netpath-test-no-such-ping"));
}

#[tokio::test]
async fn test_cancelled_context_never_spawns_ping() {
    let checker = SystemIcmpChecker::new("netpath-test-no-such-ping", PingPlatform::current(), 1);
    let endpoint = Endpoint::must_icmp("127.0.0.1", EndpointClass::Public, "loopback");
    let ctx = ProbeContext::background();
    ctx.cancel();

    let probe = checker.check_ping(&ctx, &endpoint).await;

    assert_eq!(probe.status(), Status::Timeout);
    assert_eq!(probe.error(), "context canceled");
}

#[cfg(target_os = "linux")]
mod in_flight {
    use crate::common::create_temp_dir;
    use netpath::core::network::checkers::{IcmpChecker, PingPlatform, SystemIcmpChecker};
    use netpath::core::network::{Endpoint, EndpointClass, ProbeContext, Status};
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use std::time::{Duration, Instant};

    /// Stand-in for `ping` that records its pid and never answers
    fn write_hanging_ping(dir: &Path) -> String {
        let script = dir.join("hanging-ping");
        fs::write(
            &script,
            "#!/bin/sh\necho $$ > \"$(dirname \"$0\")/pid\"\nexec sleep 30\n",
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        script.to_string_lossy().into_owned()
    }

    fn is_terminated(pid: &str) -> bool {
        match fs::read_to_string(format!("/proc/{}/stat", pid)) {
            // Killed but not yet reaped shows up as a zombie
            Ok(stat) => stat
                .rsplit(')')
                .next()
                .map_or(true, |rest| rest.trim_start().starts_with('Z')),
            Err(_) => true,
        }
    }

    #[tokio::test]
    async fn test_expiring_context_kills_running_ping() {
        let dir = create_temp_dir();
        let checker = SystemIcmpChecker::new(write_hanging_ping(dir.path()), PingPlatform::Posix, 1);
        let endpoint = Endpoint::must_icmp("192.0.2.1", EndpointClass::Public, "blackhole");
        let ctx = ProbeContext::with_timeout(Duration::from_millis(300));

        let start = Instant::now();
        let probe = checker.check_ping(&ctx, &endpoint).await;

        assert_eq!(probe.status(), Status::Timeout);
        assert_eq!(probe.error(), "context deadline exceeded");
        assert!(start.elapsed() < Duration::from_secs(5));

        tokio::time::sleep(Duration::from_millis(200)).await;
        let pid = fs::read_to_string(dir.path().join("pid")).unwrap();
        assert!(is_terminated(pid.trim()), "ping stand-in {} still running", pid.trim());
    }

    #[tokio::test]
    async fn test_cancel_during_ping_fails_fast() {
        let dir = create_temp_dir();
        let checker = SystemIcmpChecker::new(write_hanging_ping(dir.path()), PingPlatform::Posix, 1);
        let endpoint = Endpoint::must_icmp("192.0.2.1", EndpointClass::Public, "blackhole");
        let ctx = ProbeContext::background();

        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            canceller.cancel();
        });

        let start = Instant::now();
        let probe = checker.check_ping(&ctx, &endpoint).await;

        assert_eq!(probe.status(), Status::Timeout);
        assert_eq!(probe.error(), "context canceled");
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
