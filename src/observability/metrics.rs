//! Metrics collection.
//!
//! # Metrics
//! - `console_requests_total` (counter): requests by method and outcome
//! - `console_session_refresh_total` (counter): refresh calls by outcome
//! - `console_forced_logouts_total` (counter): forced logouts by failed phase
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; the host installs an exporter
//! - Without an installed recorder every call is a no-op

use crate::http::request::Method;
use crate::session::events::RecoveryPhase;

/// Outcome label for a completed client call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Recovered,
    Failed,
    LoggedOut,
}

impl Outcome {
    /// Metric label value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Recovered => "recovered",
            Outcome::Failed => "failed",
            Outcome::LoggedOut => "logged_out",
        }
    }
}

/// Count a finished client call.
pub fn record_request(method: Method, outcome: Outcome) {
    metrics::counter!(
        "console_requests_total",
        "method" => method.as_str(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Count a refresh call by outcome (`success` or `failure`).
pub fn record_refresh(outcome: &'static str) {
    metrics::counter!("console_session_refresh_total", "outcome" => outcome).increment(1);
}

/// Count a forced logout by the phase that failed.
pub fn record_forced_logout(phase: RecoveryPhase) {
    let phase = match phase {
        RecoveryPhase::Refreshing => "refreshing",
        RecoveryPhase::Retrying => "retrying",
    };
    metrics::counter!("console_forced_logouts_total", "phase" => phase).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_request(Method::Get, Outcome::Recovered);
        record_refresh("success");
        record_forced_logout(RecoveryPhase::Retrying);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::LoggedOut.as_str(), "logged_out");
        assert_eq!(Outcome::Recovered.as_str(), "recovered");
    }
}
