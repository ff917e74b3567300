use std::borrow::Cow;
use uuid::Uuid;

/// Read-only snapshot of the request that failed.
///
/// Built by the framework adapter and passed by reference through the
/// pipeline. Listeners may read it to make request-scoped decisions; nothing
/// in the pipeline mutates it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    method: String,
    path: String,
    correlation_id: Option<String>,
}

impl RequestContext {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            correlation_id: None,
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        let correlation_id = correlation_id.into();
        self.correlation_id = if correlation_id.trim().is_empty() {
            None
        } else {
            Some(correlation_id)
        };
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// Borrow this context if it already carries a correlation id, otherwise
    /// return a copy with a freshly generated one.
    pub fn ensure_correlation_id(&self) -> Cow<'_, RequestContext> {
        if self.correlation_id.is_some() {
            Cow::Borrowed(self)
        } else {
            Cow::Owned(self.clone().with_correlation_id(new_correlation_id()))
        }
    }
}

/// Generate a fresh opaque correlation identifier.
pub fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}
