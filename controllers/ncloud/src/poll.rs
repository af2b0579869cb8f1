//! Generic status polling.
//!
//! `poll_until` drives every wait in the reconciler (create, update,
//! stop/start, delete). The caller supplies one describe step; this module
//! owns the state machine, the Fibonacci interval, the deadline and
//! cancellation.

use crate::backoff::PollBackoff;
use crate::config::PollSettings;
use crate::error::ReconcileError;
use crate::lifecycle::{Goal, Handle, LifecycleState, ObservedState};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// What to wait for and for how long
#[derive(Debug, Clone, Copy)]
pub struct PollRequest<'a> {
    pub kind: &'static str,
    pub handle: &'a Handle,
    pub goal: Goal,
    pub timeout: Duration,
    pub settings: &'a PollSettings,
    pub cancel: &'a CancellationToken,
}

/// Poll `observe` until the goal is reached.
///
/// `observe` returns `Ok(None)` when the handle does not resolve. The result
/// is `None` only for [`Goal::Absent`] when the resource disappeared; a
/// terminated-but-listed resource is returned as `Some`.
pub async fn poll_until<T, F, Fut>(
    request: PollRequest<'_>,
    mut observe: F,
) -> Result<Option<ObservedState<T>>, ReconcileError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<ObservedState<T>>, ReconcileError>>,
{
    let PollRequest {
        kind,
        handle,
        goal,
        timeout,
        settings,
        cancel,
    } = request;

    let deadline = Instant::now() + timeout;
    let mut backoff = PollBackoff::new(settings.interval, settings.max_interval);
    let mut last_status: Option<String> = None;
    let mut last_state = LifecycleState::Submitted;
    let mut misses: u32 = 0;

    let cancelled = |last_status: Option<String>| ReconcileError::Cancelled {
        kind,
        handle: handle.clone(),
        last_status,
    };

    loop {
        if cancel.is_cancelled() {
            return Err(cancelled(last_status));
        }

        match observe().await? {
            None if goal == Goal::Absent => {
                debug!("{} {} no longer resolves", kind, handle);
                return Ok(None);
            }
            None => {
                misses += 1;
                debug!(
                    "{} {} not visible yet ({}/{})",
                    kind, handle, misses, settings.not_found_tolerance
                );
                if misses > settings.not_found_tolerance {
                    return Err(ReconcileError::not_found(kind, handle.as_str()));
                }
            }
            Some(observed) => {
                misses = 0;
                if observed.state != last_state {
                    info!(
                        "{} {} is {} (status {})",
                        kind, handle, observed.state, observed.status
                    );
                    last_state = observed.state;
                }
                last_status = Some(observed.status.clone());

                // A failed resource can still be deleted; keep waiting for absence
                let failed = match observed.state {
                    LifecycleState::Failed | LifecycleState::Absent => goal != Goal::Absent,
                    _ => false,
                };
                if failed {
                    return Err(ReconcileError::RemoteResourceFailed {
                        kind,
                        handle: handle.clone(),
                        status: observed.status,
                    });
                }
                if goal.is_reached_by(observed.state) {
                    return Ok(Some(observed));
                }
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(ReconcileError::ReconciliationTimeout {
                kind,
                handle: handle.clone(),
                goal,
                last_status,
                waited: timeout,
            });
        }

        let delay = backoff.next_delay().min(deadline - now);
        debug!("{} {} waiting {:?} before next poll", kind, handle, delay);
        tokio::select! {
            () = cancel.cancelled() => return Err(cancelled(last_status)),
            () = tokio::time::sleep(delay) => {}
        }
    }
}
