//! Lifecycle model shared by every resource kind.
//!
//! Vendor status codes differ per API (`RUN`, `RUNNING`, `NSTOP`, ...). Each
//! kind classifies its codes into a [`LifecycleState`]; the poll loop only
//! ever reasons about states and [`Goal`]s.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Vendor-assigned identifier of a remote resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Classified state of a remote resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Create was accepted, nothing observed yet
    Submitted,
    /// Transitional (creating, booting, upgrading, terminating, ...)
    Pending,
    Ready,
    /// Deliberately stopped; servers only
    Stopped,
    Failed,
    /// Terminated or no longer resolvable
    Absent,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Submitted => "submitted",
            LifecycleState::Pending => "pending",
            LifecycleState::Ready => "ready",
            LifecycleState::Stopped => "stopped",
            LifecycleState::Failed => "failed",
            LifecycleState::Absent => "absent",
        };
        f.write_str(name)
    }
}

/// Terminal state a wait is aiming for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    Ready,
    Stopped,
    Absent,
}

impl Goal {
    pub fn is_reached_by(self, state: LifecycleState) -> bool {
        matches!(
            (self, state),
            (Goal::Ready, LifecycleState::Ready)
                | (Goal::Stopped, LifecycleState::Stopped)
                | (Goal::Absent, LifecycleState::Absent)
        )
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Goal::Ready => f.write_str("ready"),
            Goal::Stopped => f.write_str("stopped"),
            Goal::Absent => f.write_str("absent"),
        }
    }
}

/// Status code table of one resource kind
///
/// Codes not listed classify as [`LifecycleState::Pending`].
#[derive(Debug, Clone, Copy)]
pub struct StatusTable {
    pub ready: &'static [&'static str],
    pub stopped: &'static [&'static str],
    pub failed: &'static [&'static str],
    pub terminated: &'static [&'static str],
}

impl StatusTable {
    pub fn classify(&self, code: &str) -> LifecycleState {
        if self.ready.contains(&code) {
            LifecycleState::Ready
        } else if self.stopped.contains(&code) {
            LifecycleState::Stopped
        } else if self.failed.contains(&code) {
            LifecycleState::Failed
        } else if self.terminated.contains(&code) {
            LifecycleState::Absent
        } else {
            LifecycleState::Pending
        }
    }
}

/// One describe result: the resource plus its raw and classified status
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedState<T> {
    pub handle: Handle,
    pub status: String,
    pub state: LifecycleState,
    pub resource: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: StatusTable = StatusTable {
        ready: &["RUN"],
        stopped: &["NSTOP"],
        failed: &["FAIL"],
        terminated: &["TERMT"],
    };

    #[test]
    fn test_status_table_classification() {
        assert_eq!(TABLE.classify("RUN"), LifecycleState::Ready);
        assert_eq!(TABLE.classify("NSTOP"), LifecycleState::Stopped);
        assert_eq!(TABLE.classify("FAIL"), LifecycleState::Failed);
        assert_eq!(TABLE.classify("TERMT"), LifecycleState::Absent);
        assert_eq!(TABLE.classify("CREAT"), LifecycleState::Pending);
        assert_eq!(TABLE.classify(""), LifecycleState::Pending);
    }

    #[test]
    fn test_goal_reached_only_by_matching_state() {
        assert!(Goal::Ready.is_reached_by(LifecycleState::Ready));
        assert!(!Goal::Ready.is_reached_by(LifecycleState::Stopped));
        assert!(Goal::Absent.is_reached_by(LifecycleState::Absent));
        assert!(!Goal::Stopped.is_reached_by(LifecycleState::Pending));
    }

    #[test]
    fn test_handle_serializes_as_plain_string() {
        let json = serde_json::to_string(&Handle::new("812345")).expect("serializable");
        assert_eq!(json, "\"812345\"");
    }
}
