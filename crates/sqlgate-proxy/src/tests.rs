#[cfg(test)]
mod tests {
    use crate::supervisor::ProxyHandle;
    use sqlgate_core::GateError;
    use std::time::{Duration, Instant};
    use tokio::process::Command;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("/bin/sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[tokio::test]
    async fn ready_marker_returns_before_deadline() {
        let mut proxy = ProxyHandle::spawn(
            sh("echo 'The proxy has started successfully and is ready for new connections!'; sleep 10"),
            Duration::from_secs(5),
        )
        .expect("spawn");
        let started = Instant::now();
        proxy.await_ready().await.expect("ready");
        assert!(started.elapsed() < Duration::from_secs(2));
        proxy.shutdown().await;
    }

    #[tokio::test]
    async fn ready_marker_on_stderr_counts() {
        let mut proxy = ProxyHandle::spawn(
            sh("echo 'is ready for new connections!' >&2; sleep 10"),
            Duration::from_secs(5),
        )
        .expect("spawn");
        proxy.await_ready().await.expect("ready");
        proxy.shutdown().await;
    }

    #[tokio::test]
    async fn error_marker_aborts_without_waiting_for_deadline() {
        let mut proxy = ProxyHandle::spawn(
            sh("echo 'warming up'; echo 'dial error: connection refused'; sleep 10"),
            Duration::from_secs(5),
        )
        .expect("spawn");
        let started = Instant::now();
        let err = proxy.await_ready().await.expect_err("error marker");
        assert!(started.elapsed() < Duration::from_secs(2));
        match err {
            GateError::Readiness { line, transcript } => {
                assert!(line.contains("dial error"));
                assert!(transcript.contains("warming up"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn silent_child_times_out() {
        let mut proxy =
            ProxyHandle::spawn(sh("sleep 10"), Duration::from_millis(300)).expect("spawn");
        let started = Instant::now();
        let err = proxy.await_ready().await.expect_err("timeout");
        assert!(matches!(err, GateError::ReadyTimeout { .. }));
        assert!(started.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test]
    async fn closed_output_is_a_readiness_failure() {
        let mut proxy = ProxyHandle::spawn(sh("echo 'starting up'"), Duration::from_secs(5))
            .expect("spawn");
        let err = proxy.await_ready().await.expect_err("eof");
        match err {
            GateError::OutputClosed { transcript } => {
                assert!(transcript.contains("starting up"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn timed_out_child_receives_exactly_one_signal() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let marker = dir.path().join("signals");
        // `wait` on a background child is interruptible by the trap, unlike
        // a foreground command.
        let script = format!(
            "trap 'echo signaled >> {}; exit 0' INT; sleep 10 & wait $!",
            marker.display()
        );
        let mut proxy =
            ProxyHandle::spawn(sh(&script), Duration::from_millis(300)).expect("spawn");
        let err = proxy.await_ready().await.expect_err("timeout");
        assert!(matches!(err, GateError::ReadyTimeout { .. }));
        proxy.shutdown().await;
        let recorded = std::fs::read_to_string(&marker).expect("marker file");
        assert_eq!(recorded, "signaled\n");
    }

    #[tokio::test]
    async fn timeout_transcript_includes_pre_deadline_output() {
        let mut proxy = ProxyHandle::spawn(
            sh("echo 'still starting'; sleep 10"),
            Duration::from_millis(300),
        )
        .expect("spawn");
        let err = proxy.await_ready().await.expect_err("timeout");
        match err {
            GateError::ReadyTimeout { transcript } => {
                assert!(transcript.contains("still starting"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let mut proxy = ProxyHandle::spawn(sh("sleep 10"), Duration::from_secs(5)).expect("spawn");
        proxy.shutdown().await;
        proxy.shutdown().await;
    }

    #[tokio::test]
    async fn launch_failure_reports_launch_error() {
        let err = ProxyHandle::spawn(
            Command::new("/nonexistent/proxy-binary"),
            Duration::from_secs(5),
        )
        .expect_err("spawn should fail");
        assert!(matches!(err, GateError::Launch(_)));
    }
}
