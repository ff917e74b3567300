//! Internal pipeline failures

use std::any::Any;
use thiserror::Error;

/// The resolution machinery itself malfunctioned.
///
/// This is never a property of the request. It means a listener or the
/// catalog is broken, e.g. a listener names a code the catalog does not
/// define. The handler recovers by handing the original failure to the
/// unhandled-exception handler; the client sees the generic error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unexpected major error while handling exception (listener {listener}): {kind}")]
pub struct UnexpectedMajorExceptionHandlingError {
    /// Name of the listener involved.
    pub listener: String,
    pub kind: InternalFailureKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalFailureKind {
    /// A listener referenced a code missing from the catalog.
    #[error("listener referenced unknown error code `{0}`")]
    UnknownErrorCode(String),

    /// A listener claimed the failure without naming any error.
    #[error("listener claimed the exception without naming any errors")]
    EmptyHandledOutcome,

    /// A listener asked for a status outside 400..=599.
    #[error("listener supplied out-of-range status override {0}")]
    InvalidStatusOverride(u16),

    #[error("listener panicked: {0}")]
    ListenerPanicked(String),

    /// Building the result panicked after a listener claimed the failure.
    #[error("resolution panicked: {0}")]
    ResolutionPanicked(String),
}

impl UnexpectedMajorExceptionHandlingError {
    pub fn new(listener: impl Into<String>, kind: InternalFailureKind) -> Self {
        Self {
            listener: listener.into(),
            kind,
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = UnexpectedMajorExceptionHandlingError::new(
            "OrderListener",
            InternalFailureKind::UnknownErrorCode("ORDER_GONE".into()),
        );
        assert_eq!(
            err.to_string(),
            "Unexpected major error while handling exception (listener OrderListener): listener referenced unknown error code `ORDER_GONE`"
        );
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(payload.as_ref()), "owned message");

        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
