//! Unit tests for the generic poll loop

#[cfg(test)]
mod tests {
    use crate::config::PollSettings;
    use crate::error::ReconcileError;
    use crate::lifecycle::{Goal, Handle, LifecycleState, ObservedState};
    use crate::poll::{PollRequest, poll_until};
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    type Step = Option<(&'static str, LifecycleState)>;

    fn settings(tolerance: u32) -> PollSettings {
        PollSettings {
            interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(10),
            not_found_tolerance: tolerance,
        }
    }

    /// Observation closure replaying `script`; the last step repeats
    fn scripted(
        script: Vec<Step>,
        calls: Arc<AtomicUsize>,
    ) -> impl FnMut() -> std::future::Ready<Result<Option<ObservedState<()>>, ReconcileError>> {
        let mut script: VecDeque<Step> = script.into();
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            let step = if script.len() > 1 {
                script.pop_front().flatten()
            } else {
                script.front().copied().flatten()
            };
            std::future::ready(Ok(step.map(|(status, state)| ObservedState {
                handle: Handle::new("812345"),
                status: status.to_string(),
                state,
                resource: (),
            })))
        }
    }

    async fn run(
        script: Vec<Step>,
        goal: Goal,
        timeout: Duration,
        tolerance: u32,
    ) -> (Result<Option<ObservedState<()>>, ReconcileError>, usize) {
        let handle = Handle::new("812345");
        let settings = settings(tolerance);
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let request = PollRequest {
            kind: "server",
            handle: &handle,
            goal,
            timeout,
            settings: &settings,
            cancel: &cancel,
        };
        let result = poll_until(request, scripted(script, Arc::clone(&calls))).await;
        (result, calls.load(Ordering::SeqCst))
    }

    const MINUTE: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn test_reaches_ready_after_pending_statuses() {
        let start = Instant::now();
        let (result, calls) = run(
            vec![
                Some(("INIT", LifecycleState::Pending)),
                Some(("CREAT", LifecycleState::Pending)),
                Some(("RUN", LifecycleState::Ready)),
            ],
            Goal::Ready,
            MINUTE,
            20,
        )
        .await;

        let observed = result.expect("ready").expect("resource present");
        assert_eq!(observed.status, "RUN");
        assert_eq!(calls, 3);
        // Two sleeps of the Fibonacci sequence: 1s + 1s
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_reports_last_status() {
        let (result, _) = run(
            vec![Some(("CREAT", LifecycleState::Pending))],
            Goal::Ready,
            Duration::from_secs(5),
            20,
        )
        .await;

        match result {
            Err(ReconcileError::ReconciliationTimeout { last_status, goal, .. }) => {
                assert_eq!(last_status.as_deref(), Some("CREAT"));
                assert_eq!(goal, Goal::Ready);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_message_includes_status() {
        let (result, _) = run(
            vec![Some(("CREAT", LifecycleState::Pending))],
            Goal::Ready,
            Duration::ZERO,
            20,
        )
        .await;
        let err = result.expect_err("zero deadline");
        assert!(err.to_string().contains("last status: CREAT"), "{}", err);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_status_ends_immediately() {
        let (result, calls) = run(
            vec![
                Some(("INIT", LifecycleState::Pending)),
                Some(("FAIL", LifecycleState::Failed)),
            ],
            Goal::Ready,
            MINUTE,
            20,
        )
        .await;

        assert!(matches!(
            result,
            Err(ReconcileError::RemoteResourceFailed { ref status, .. }) if status == "FAIL"
        ));
        assert_eq!(calls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminated_while_awaiting_ready_is_failure() {
        let (result, _) = run(
            vec![Some(("TERMT", LifecycleState::Absent))],
            Goal::Ready,
            MINUTE,
            20,
        )
        .await;
        assert!(matches!(result, Err(ReconcileError::RemoteResourceFailed { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_absence_goal_accepts_disappearance_and_termination() {
        let (gone, _) = run(
            vec![Some(("TERMTING", LifecycleState::Pending)), None],
            Goal::Absent,
            MINUTE,
            20,
        )
        .await;
        assert!(gone.expect("absent").is_none());

        let (terminated, _) = run(
            vec![Some(("TERMT", LifecycleState::Absent))],
            Goal::Absent,
            MINUTE,
            20,
        )
        .await;
        assert_eq!(
            terminated.expect("absent").map(|o| o.status),
            Some("TERMT".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_status_does_not_end_a_deletion_wait() {
        let (gone, calls) = run(
            vec![
                Some(("ERROR", LifecycleState::Failed)),
                Some(("DELETING", LifecycleState::Pending)),
                None,
            ],
            Goal::Absent,
            MINUTE,
            20,
        )
        .await;
        assert!(gone.expect("absent").is_none());
        assert_eq!(calls, 3);

        let (stuck, _) = run(
            vec![Some(("ERROR", LifecycleState::Failed))],
            Goal::Absent,
            MINUTE,
            20,
        )
        .await;
        assert!(matches!(
            stuck,
            Err(ReconcileError::ReconciliationTimeout { ref last_status, .. })
                if last_status.as_deref() == Some("ERROR")
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_tolerance_is_bounded() {
        let (result, calls) = run(vec![None], Goal::Ready, Duration::from_secs(3600), 2).await;
        assert!(matches!(result, Err(ReconcileError::NotFound { .. })));
        // Two tolerated misses, the third ends the wait
        assert_eq!(calls, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_then_visible_is_tolerated() {
        let (result, _) = run(
            vec![None, None, Some(("RUN", LifecycleState::Ready))],
            Goal::Ready,
            MINUTE,
            5,
        )
        .await;
        assert!(result.expect("ready").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_during_wait() {
        let handle = Handle::new("812345");
        let settings = settings(20);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        let request = PollRequest {
            kind: "server",
            handle: &handle,
            goal: Goal::Ready,
            timeout: MINUTE,
            settings: &settings,
            cancel: &cancel,
        };
        let result = poll_until(request, move || {
            // Cancel right after the first observation
            trigger.cancel();
            std::future::ready(Ok(Some(ObservedState {
                handle: Handle::new("812345"),
                status: "CREAT".to_string(),
                state: LifecycleState::Pending,
                resource: (),
            })))
        })
        .await;

        match result {
            Err(ReconcileError::Cancelled { handle, last_status, .. }) => {
                assert_eq!(handle.as_str(), "812345");
                assert_eq!(last_status.as_deref(), Some("CREAT"));
            }
            other => panic!("expected cancellation, got {:?}", other),
        }
    }
}
