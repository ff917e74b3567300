use crate::listener::ErrorRef;
use std::borrow::Cow;
use thiserror::Error;

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    field: String,
    code: Cow<'static, str>,
    detail: Option<String>,
}

impl FieldViolation {
    /// `code` must be a catalog code; `field` is exposed to the message
    /// template as `{field}` and in the entry metadata.
    pub fn new(field: impl Into<String>, code: impl Into<Cow<'static, str>>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            detail: None,
        }
    }

    /// Free-form explanation for the log line only.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub(crate) fn to_error_ref(&self) -> ErrorRef {
        ErrorRef::new(self.code.clone())
            .with_arg("field", self.field.clone())
            .with_metadata("field", self.field.clone())
    }
}

/// Input validation rejected the request.
#[derive(Debug, Clone, Error)]
#[error("validation failed: {}", describe(.violations))]
pub struct ValidationFailure {
    violations: Vec<FieldViolation>,
}

impl ValidationFailure {
    pub fn new(violations: impl IntoIterator<Item = FieldViolation>) -> Self {
        Self {
            violations: violations.into_iter().collect(),
        }
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}

fn describe(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| match v.detail() {
            Some(detail) => format!("{}={} ({})", v.field, v.code, detail),
            None => format!("{}={}", v.field, v.code),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
