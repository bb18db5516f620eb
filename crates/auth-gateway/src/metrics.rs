//! Counters for the authenticated request path
//!
//! Recorded through the `metrics` facade; without an installed recorder
//! these are no-ops.

/// Every response received from the base transport, labelled by status.
pub fn record_request(status: u16) {
    metrics::counter!("authgate_requests_total", "status" => status.to_string()).increment(1);
}

/// Requests that produced no response at all.
pub fn record_transport_error() {
    metrics::counter!("authgate_transport_errors_total").increment(1);
}

/// Renewal outcomes: `success`, `joined`, `reused` or `failure`.
pub fn record_renewal(outcome: &'static str) {
    metrics::counter!("authgate_renewals_total", "outcome" => outcome).increment(1);
}

/// Sessions ended by a terminal authentication failure.
pub fn record_termination(reason: &'static str) {
    metrics::counter!("authgate_session_terminations_total", "reason" => reason).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_recorder_is_a_noop() {
        record_request(200);
        record_transport_error();
        record_renewal("success");
        record_termination("forbidden");
    }
}
