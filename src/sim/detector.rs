/// Completion detector: tells a batch caller when everything it asked for
/// has drained.
///
/// A heuristic, not a proof. While armed it polls every `poll_interval_ms`
/// and fires once when the scheduler is idle and either
///   - the caller set the explicit completion marker, or
///   - nothing has happened for longer than `grace_ms`.
///
/// Independently, if no activity at all is seen for longer than
/// `failsafe_ms` it fires even when the scheduler still looks busy, so a
/// stuck run cannot leave the caller waiting forever. After firing it
/// disarms until the next `arm()`.

use tracing::{debug, info};

use crate::config::DetectorConfig;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CompletionReason {
    Marked,
    GraceElapsed,
    Failsafe,
}

#[derive(Clone, Debug)]
pub struct CompletionDetector {
    armed: bool,
    completed_marker: bool,
    last_activity_ms: u64,
    next_poll_ms: u64,
    poll_interval_ms: u64,
    grace_ms: u64,
    failsafe_ms: u64,
}

impl CompletionDetector {
    pub fn new(cfg: &DetectorConfig) -> Self {
        CompletionDetector {
            armed: false,
            completed_marker: false,
            last_activity_ms: 0,
            next_poll_ms: 0,
            poll_interval_ms: cfg.poll_interval_ms,
            grace_ms: cfg.grace_ms,
            failsafe_ms: cfg.failsafe_ms,
        }
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Start watching a new batch.
    pub fn arm(&mut self, now_ms: u64) {
        self.armed = true;
        self.completed_marker = false;
        self.last_activity_ms = now_ms;
        self.next_poll_ms = now_ms + self.poll_interval_ms;
        debug!(now_ms, "completion detector armed");
    }

    pub fn disarm(&mut self) {
        self.armed = false;
        self.completed_marker = false;
    }

    /// Any caller-visible activity: enqueue, move completion, console output.
    pub fn note_activity(&mut self, now_ms: u64) {
        self.last_activity_ms = self.last_activity_ms.max(now_ms);
    }

    /// The caller declares it has issued everything it will issue.
    pub fn mark_completed(&mut self) {
        self.completed_marker = true;
    }

    pub fn poll(&mut self, now_ms: u64, busy: bool) -> Option<CompletionReason> {
        if !self.armed || now_ms < self.next_poll_ms {
            return None;
        }
        self.next_poll_ms = now_ms + self.poll_interval_ms;

        let quiet_for = now_ms.saturating_sub(self.last_activity_ms);
        let reason = if quiet_for > self.failsafe_ms {
            Some(CompletionReason::Failsafe)
        } else if busy {
            None
        } else if self.completed_marker {
            Some(CompletionReason::Marked)
        } else if quiet_for > self.grace_ms {
            Some(CompletionReason::GraceElapsed)
        } else {
            None
        };

        if let Some(reason) = reason {
            info!(?reason, quiet_for, "batch complete");
            self.disarm();
        }
        reason
    }
}
