//! Listeners
//!
//! A listener looks at a failure and either claims it, naming the catalog
//! errors that describe it, or passes. Listeners run in a fixed order and the
//! first one to claim a failure wins; see [`ListenerChain`].
//!
//! # Example
//!
//! ```
//! use faultline::prelude::*;
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("resource {0} missing")]
//! struct ResourceMissing(String);
//!
//! struct ResourceMissingListener;
//!
//! impl Listener for ResourceMissingListener {
//!     fn attempt(&self, error: &DynError, _context: &RequestContext) -> ListenerOutcome {
//!         match error.downcast_ref::<ResourceMissing>() {
//!             Some(_) => ListenerOutcome::handled(["NOT_FOUND"]),
//!             None => ListenerOutcome::NotHandled,
//!         }
//!     }
//! }
//! ```

use crate::common::RequestContext;
use crate::exception::DynError;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;

pub mod builtins;
mod chain;

pub use chain::{ChainClaim, ListenerChain, ListenerChainBuilder};

/// A reference to a catalog error, produced by a listener.
///
/// Besides the code it may carry per-request arguments for the catalog
/// message template and extra metadata for the payload entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRef {
    code: Cow<'static, str>,
    args: BTreeMap<String, String>,
    metadata: BTreeMap<String, Value>,
}

impl ErrorRef {
    pub fn new(code: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code: code.into(),
            args: BTreeMap::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Value for a `{name}` placeholder in the catalog message.
    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn args(&self) -> &BTreeMap<String, String> {
        &self.args
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    pub(crate) fn into_parts(self) -> (Cow<'static, str>, BTreeMap<String, String>, BTreeMap<String, Value>) {
        (self.code, self.args, self.metadata)
    }
}

impl From<&'static str> for ErrorRef {
    fn from(code: &'static str) -> Self {
        Self::new(code)
    }
}

impl From<String> for ErrorRef {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

/// What a listener decided about a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ListenerOutcome {
    /// Not recognized; the next listener gets a turn.
    NotHandled,
    /// Recognized. `errors` must name at least one catalog code.
    Handled {
        errors: Vec<ErrorRef>,
        status_override: Option<u16>,
    },
}

impl ListenerOutcome {
    pub fn handled<I, E>(errors: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<ErrorRef>,
    {
        Self::Handled {
            errors: errors.into_iter().map(Into::into).collect(),
            status_override: None,
        }
    }

    pub fn handled_with_status<I, E>(errors: I, status: u16) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<ErrorRef>,
    {
        Self::Handled {
            errors: errors.into_iter().map(Into::into).collect(),
            status_override: Some(status),
        }
    }

    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Handled { .. })
    }
}

/// Attempts to translate a failure into catalog errors.
///
/// Implementations must not touch shared state beyond logging. They are
/// shared across every request for the lifetime of the process.
pub trait Listener: Send + Sync + 'static {
    fn attempt(&self, error: &DynError, context: &RequestContext) -> ListenerOutcome;

    /// Name used in logs and internal-failure reports.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> Listener for F
where
    F: Fn(&DynError, &RequestContext) -> ListenerOutcome + Send + Sync + 'static,
{
    fn attempt(&self, error: &DynError, context: &RequestContext) -> ListenerOutcome {
        self(error, context)
    }
}
