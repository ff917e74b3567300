use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Lowest and highest HTTP status codes an error may map to.
pub const MIN_HTTP_STATUS: u16 = 100;
pub const MAX_HTTP_STATUS: u16 = 599;

/// Returns true if `status` is a usable HTTP status code.
pub fn is_valid_status(status: u16) -> bool {
    (MIN_HTTP_STATUS..=MAX_HTTP_STATUS).contains(&status)
}

/// Returns true if `status` is in the 4xx or 5xx class.
pub fn is_error_status(status: u16) -> bool {
    (400..=MAX_HTTP_STATUS).contains(&status)
}

/// Returns true if `status` is in the 5xx class.
pub fn is_server_error(status: u16) -> bool {
    (500..=MAX_HTTP_STATUS).contains(&status)
}

/// A known error the service may return to clients.
///
/// Definitions are created when the catalog is loaded and never change
/// afterwards. Two definitions are the same error if their codes match.
///
/// The `message` may contain `{name}` placeholders which are filled from
/// per-request arguments (see [`ErrorRef::with_arg`](crate::listener::ErrorRef::with_arg)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDefinition {
    code: String,
    message: String,
    #[serde(alias = "status")]
    http_status: u16,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, Value>,
}

impl ErrorDefinition {
    /// Create a definition. Validation happens when the catalog is built.
    pub fn new(code: impl Into<String>, message: impl Into<String>, http_status: u16) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            http_status,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn http_status(&self) -> u16 {
        self.http_status
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    /// Render the catalog message, substituting `{name}` placeholders.
    ///
    /// Placeholders without a matching argument are left as written.
    pub fn render_message(&self, args: &BTreeMap<String, String>) -> Cow<'_, str> {
        if args.is_empty() || !self.message.contains('{') {
            return Cow::Borrowed(&self.message);
        }

        let mut rendered = String::with_capacity(self.message.len());
        let mut rest = self.message.as_str();
        while let Some(open) = rest.find('{') {
            rendered.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) => {
                    let name = &after[..close];
                    match args.get(name) {
                        Some(value) => rendered.push_str(value),
                        None => {
                            rendered.push('{');
                            rendered.push_str(name);
                            rendered.push('}');
                        }
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    rendered.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }
        rendered.push_str(rest);
        Cow::Owned(rendered)
    }
}
