use crate::catalog::core;
use crate::common::RequestContext;
use crate::exception::{DynError, find_in_chain};
use crate::listener::{Listener, ListenerOutcome};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};

/// Claims axum extractor rejections raised through a
/// [`Failure`](super::Failure).
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectionListener;

impl Listener for RejectionListener {
    fn attempt(&self, error: &DynError, _context: &RequestContext) -> ListenerOutcome {
        if let Some(rejection) = find_in_chain::<JsonRejection>(error) {
            let code = match rejection {
                JsonRejection::MissingJsonContentType(_) => core::UNSUPPORTED_MEDIA_TYPE,
                JsonRejection::JsonSyntaxError(_) | JsonRejection::JsonDataError(_) => {
                    core::MALFORMED_REQUEST
                }
                other => core::code_for_status(other.status().as_u16()),
            };
            return ListenerOutcome::handled([code]);
        }

        if let Some(rejection) = find_in_chain::<QueryRejection>(error) {
            let code = match rejection {
                QueryRejection::FailedToDeserializeQueryString(_) => core::MALFORMED_REQUEST,
                other => core::code_for_status(other.status().as_u16()),
            };
            return ListenerOutcome::handled([code]);
        }

        if let Some(rejection) = find_in_chain::<PathRejection>(error) {
            return ListenerOutcome::handled([core::code_for_status(rejection.status().as_u16())]);
        }

        ListenerOutcome::NotHandled
    }

    fn name(&self) -> &str {
        "RejectionListener"
    }
}
