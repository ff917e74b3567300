use crate::catalog::core;
use crate::common::RequestContext;
use crate::exception::{
    ApiException, DynError, HttpStatusException, ValidationFailure, find_in_chain,
};
use crate::listener::{ErrorRef, Listener, ListenerOutcome};
use std::sync::Arc;

/// The framework's listeners, in the order they are consulted.
pub fn default_listeners() -> Vec<Arc<dyn Listener>> {
    vec![
        Arc::new(ApiExceptionListener),
        Arc::new(ValidationListener),
        Arc::new(StatusListener),
    ]
}

/// Claims [`ApiException`]s anywhere in the source chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiExceptionListener;

impl Listener for ApiExceptionListener {
    fn attempt(&self, error: &DynError, _context: &RequestContext) -> ListenerOutcome {
        match find_in_chain::<ApiException>(error) {
            Some(api) => ListenerOutcome::Handled {
                errors: api.errors().to_vec(),
                status_override: api.status_override(),
            },
            None => ListenerOutcome::NotHandled,
        }
    }

    fn name(&self) -> &str {
        "ApiExceptionListener"
    }
}

/// Claims [`ValidationFailure`]s, one catalog error per violation.
///
/// Violations sharing a code collapse into a single payload entry further
/// down the pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationListener;

impl Listener for ValidationListener {
    fn attempt(&self, error: &DynError, _context: &RequestContext) -> ListenerOutcome {
        match find_in_chain::<ValidationFailure>(error) {
            Some(failure) if failure.is_empty() => {
                ListenerOutcome::handled([core::GENERIC_BAD_REQUEST])
            }
            Some(failure) => ListenerOutcome::handled(
                failure
                    .violations()
                    .iter()
                    .map(|v| v.to_error_ref()),
            ),
            None => ListenerOutcome::NotHandled,
        }
    }

    fn name(&self) -> &str {
        "ValidationListener"
    }
}

/// Claims [`HttpStatusException`]s, mapping the status to a core error.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusListener;

impl Listener for StatusListener {
    fn attempt(&self, error: &DynError, _context: &RequestContext) -> ListenerOutcome {
        match find_in_chain::<HttpStatusException>(error) {
            Some(status_error) => ListenerOutcome::handled_with_status(
                [ErrorRef::new(core::code_for_status(status_error.status()))],
                status_error.status(),
            ),
            None => ListenerOutcome::NotHandled,
        }
    }

    fn name(&self) -> &str {
        "StatusListener"
    }
}
