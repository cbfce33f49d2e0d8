//! Request coordination: validation, the busy guard, and dispatch of the
//! backend's answer into [`AppState`].
//!
//! [`begin_submission`] and [`complete_submission`] are split so the caller
//! can run the backend call elsewhere (the window loop uses a worker thread);
//! [`submit`] chains them for callers that can block.

use tracing::{info, warn};

use crate::request::{Backend, BackendError, FormInput, ProcessResponse, RewriteRequest, ValidationIssue};
use crate::state::{Alert, AppState, Presentation};
use crate::variants::parse_with_tier;

/// Why a submission never reached the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Invalid(ValidationIssue),
    /// A request is already in flight.
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Rejected(Rejection),
    Revealed,
    Failed,
}

/// Validates the form and moves the state to `Busy`. On rejection the
/// state only gains an alert; no request may be sent.
pub fn begin_submission(state: &mut AppState, form: &FormInput) -> Result<RewriteRequest, Rejection> {
    if state.is_busy() {
        warn!("submission ignored, a request is already in flight");
        state.raise(Alert::Busy);
        return Err(Rejection::Busy);
    }

    let request = match form.validate() {
        Ok(request) => request,
        Err(issue) => {
            info!(%issue, "form rejected before sending");
            state.raise(Alert::Validation(issue));
            return Err(Rejection::Invalid(issue));
        }
    };

    state.enter_busy(request.clone());
    Ok(request)
}

/// Applies the backend's answer. `Busy` is always cleared, whatever the branch.
pub fn complete_submission(
    state: &mut AppState,
    outcome: Result<ProcessResponse, BackendError>,
) -> SubmitOutcome {
    let next = match outcome {
        Ok(ProcessResponse::Success { result }) => {
            let parsed = parse_with_tier(&result);
            info!(tier = ?parsed.tier, "rewrite variants ready");
            state.store_variants(parsed.variants);
            Presentation::Revealed
        }
        Ok(ProcessResponse::Failure { status, error }) => {
            warn!(status, "backend refused the request");
            state.raise(Alert::Server(error));
            Presentation::Idle
        }
        Err(BackendError::Transport(err)) => {
            warn!(%err, "network error");
            state.raise(Alert::Network);
            Presentation::Idle
        }
        Err(err @ BackendError::Contract { .. }) => {
            warn!(%err, "unusable backend response");
            state.raise(Alert::Server(None));
            Presentation::Idle
        }
    };

    let outcome = match next {
        Presentation::Revealed => SubmitOutcome::Revealed,
        Presentation::Idle | Presentation::Busy => SubmitOutcome::Failed,
    };
    state.settle(next);
    outcome
}

pub fn submit<B: Backend + ?Sized>(state: &mut AppState, form: &FormInput, backend: &B) -> SubmitOutcome {
    match begin_submission(state, form) {
        Ok(request) => {
            let response = backend.process(&request);
            complete_submission(state, response)
        }
        Err(rejection) => SubmitOutcome::Rejected(rejection),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::variants::OptionSlot;

    struct CountingBackend {
        calls: AtomicUsize,
        reply: ProcessResponse,
    }

    impl CountingBackend {
        fn new(reply: ProcessResponse) -> Self {
            Self { calls: AtomicUsize::new(0), reply }
        }
    }

    impl Backend for CountingBackend {
        fn process(&self, _request: &RewriteRequest) -> Result<ProcessResponse, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    fn valid_form() -> FormInput {
        FormInput::new("今天天氣很好", "幽默", "廣東話")
    }

    #[test]
    fn empty_field_never_reaches_backend() {
        let backend = CountingBackend::new(ProcessResponse::Success { result: String::new() });
        let mut state = AppState::new();
        let outcome = submit(&mut state, &FormInput::new("", "幽默", "廣東話"), &backend);
        assert_eq!(outcome, SubmitOutcome::Rejected(Rejection::Invalid(ValidationIssue::MissingFields)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert_eq!(state.alert(), Some(&Alert::Validation(ValidationIssue::MissingFields)));
        assert_eq!(state.presentation(), Presentation::Idle);
    }

    #[test]
    fn success_reveals_parsed_variants() {
        let backend = CountingBackend::new(ProcessResponse::Success {
            result: "Option 1: Hi there\nOption 2: Hello\nOption 3: Hey".to_string(),
        });
        let mut state = AppState::new();
        assert_eq!(submit(&mut state, &valid_form(), &backend), SubmitOutcome::Revealed);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.presentation(), Presentation::Revealed);
        let variants = state.revealed_variants().unwrap();
        assert_eq!(variants.get(OptionSlot::Third), "Hey");
        assert!(state.alert().is_none());
    }

    #[test]
    fn second_submission_while_busy_is_rejected() {
        let mut state = AppState::new();
        begin_submission(&mut state, &valid_form()).unwrap();
        assert_eq!(begin_submission(&mut state, &valid_form()), Err(Rejection::Busy));
        assert_eq!(state.alert(), Some(&Alert::Busy));
        assert!(state.is_busy());
    }

    #[test]
    fn server_failure_uses_server_message_and_clears_busy() {
        let mut state = AppState::new();
        begin_submission(&mut state, &valid_form()).unwrap();
        let outcome = complete_submission(
            &mut state,
            Ok(ProcessResponse::Failure { status: 400, error: Some("無效的語調選項".to_string()) }),
        );
        assert_eq!(outcome, SubmitOutcome::Failed);
        assert_eq!(state.presentation(), Presentation::Idle);
        assert_eq!(state.alert().map(Alert::message), Some("無效的語調選項"));
        assert!(state.revealed_variants().is_none());
    }

    #[test]
    fn contract_violation_shows_generic_message() {
        let mut state = AppState::new();
        begin_submission(&mut state, &valid_form()).unwrap();
        complete_submission(
            &mut state,
            Err(BackendError::Contract { status: 200, reason: "missing field `result`".to_string() }),
        );
        assert!(!state.is_busy());
        assert_eq!(state.alert(), Some(&Alert::Server(None)));
    }

    #[test]
    fn failure_after_success_hides_previous_output() {
        let mut state = AppState::new();
        begin_submission(&mut state, &valid_form()).unwrap();
        complete_submission(&mut state, Ok(ProcessResponse::Success { result: "選項1：a".to_string() }));
        assert!(state.revealed_variants().is_some());

        begin_submission(&mut state, &valid_form()).unwrap();
        assert!(state.revealed_variants().is_none());
        complete_submission(&mut state, Ok(ProcessResponse::Failure { status: 500, error: None }));
        assert_eq!(state.presentation(), Presentation::Idle);
        assert!(state.revealed_variants().is_none());
    }
}
