use super::HandlingOutcome;
use crate::common::{ErrorContractPayload, RequestContext};
use crate::engine::ExceptionHandlingResult;
use crate::exception::DynError;
use std::panic::{self, AssertUnwindSafe};

/// One summary line per failed request, keyed by the returned error id.
pub(crate) fn log_handled(
    result: &ExceptionHandlingResult<'_>,
    payload: &ErrorContractPayload,
    context: &RequestContext,
    outcome: HandlingOutcome,
) {
    let contributing_errors = payload.codes().join(",");
    let exception = render(result.origin());
    let listener = result.listener().unwrap_or("-");

    if result.http_status() >= 500 {
        tracing::error!(
            error_id = %payload.error_id(),
            status = result.http_status(),
            contributing_errors = %contributing_errors,
            method = %context.method(),
            path = %context.path(),
            listener = %listener,
            outcome = %outcome,
            exception = %exception,
            "Caught exception mapped to error response"
        );
    } else {
        tracing::warn!(
            error_id = %payload.error_id(),
            status = result.http_status(),
            contributing_errors = %contributing_errors,
            method = %context.method(),
            path = %context.path(),
            listener = %listener,
            outcome = %outcome,
            exception = %exception,
            "Caught exception mapped to error response"
        );
    }
}

fn render(error: &DynError) -> String {
    panic::catch_unwind(AssertUnwindSafe(|| error.to_string()))
        .unwrap_or_else(|_| "<exception could not be rendered>".to_string())
}
