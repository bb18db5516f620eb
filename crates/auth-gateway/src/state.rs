//! Per-request authentication state machine
//!
//! Pure: receives events, returns (new_state, action). The gateway executes
//! the I/O implied by each action. The machine makes the at-most-one-replay
//! rule structural: the only path to `Replay` is `AwaitingRenewal`, and the
//! only path there is a 401 while `Fresh`.
//!
//! Transitions:
//! - Fresh → Fresh (non-auth status: deliver)
//! - Fresh → AwaitingRenewal (401: renew)
//! - Fresh → Terminal (403: forbidden, renewal cannot help)
//! - AwaitingRenewal → Replayed (renewal succeeded: replay)
//! - AwaitingRenewal → Terminal (renewal failed)
//! - Replayed → Replayed (non-auth status: deliver)
//! - Replayed → Terminal (401/403 on the replay)
//! - Terminal → Terminal (absorbing)

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// Dispatched once, no renewal attempted
    Fresh,
    /// Got a 401; waiting for the renewal outcome
    AwaitingRenewal,
    /// Re-dispatched with a renewed token; no further renewal allowed
    Replayed,
    /// Authentication failed for good
    Terminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestEvent {
    /// A response arrived with this status code
    Responded(u16),
    RenewalSucceeded,
    RenewalFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestAction {
    /// Hand the last response to the caller unchanged
    Deliver,
    /// Obtain a new access token
    Renew,
    /// Dispatch the request again with the renewed token
    Replay,
    /// Clear credentials, redirect to login, fail the call
    Terminate,
}

/// Handle a state transition. Pure function: no I/O.
pub fn handle_event(state: RequestState, event: RequestEvent) -> (RequestState, RequestAction) {
    use RequestAction::*;
    use RequestEvent::*;
    use RequestState::*;

    match (state, event) {
        (Fresh, Responded(401)) => (AwaitingRenewal, Renew),
        (Fresh, Responded(403)) => (Terminal, Terminate),
        (Fresh, Responded(_)) => (Fresh, Deliver),

        (AwaitingRenewal, RenewalSucceeded) => (Replayed, Replay),
        (AwaitingRenewal, RenewalFailed) => (Terminal, Terminate),

        (Replayed, Responded(401 | 403)) => (Terminal, Terminate),
        (Replayed, Responded(_)) => (Replayed, Deliver),

        (Terminal, _) => (Terminal, Terminate),

        // Out-of-order events (a response while awaiting renewal, a renewal
        // outcome for a request that never asked) cannot come from the
        // gateway; fail closed.
        (Fresh | Replayed, RenewalSucceeded | RenewalFailed) | (AwaitingRenewal, Responded(_)) => {
            (Terminal, Terminate)
        }
    }
}
