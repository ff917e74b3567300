use super::{ErrorRef, Listener, ListenerOutcome};
use crate::common::RequestContext;
use crate::engine::{InternalFailureKind, UnexpectedMajorExceptionHandlingError, panic_message};
use crate::exception::DynError;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// The listener that claimed a failure, and what it claimed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainClaim {
    pub listener: String,
    pub errors: Vec<ErrorRef>,
    pub status_override: Option<u16>,
}

/// An ordered, immutable sequence of listeners.
///
/// Order is part of the public contract: listeners are consulted front to
/// back and the first one returning [`ListenerOutcome::Handled`] wins. The
/// usual composition puts application listeners ahead of the framework
/// defaults, so an application rule always beats a generic one for the same
/// failure.
///
/// # Example
///
/// ```
/// use faultline::listener::{ListenerChain, ListenerOutcome};
/// use faultline::prelude::*;
///
/// let chain = ListenerChain::builder()
///     .listener(|_: &DynError, _: &RequestContext| ListenerOutcome::NotHandled)
///     .with_default_listeners()
///     .build();
/// assert_eq!(chain.len(), 4);
/// ```
#[derive(Clone, Default)]
pub struct ListenerChain {
    listeners: Arc<[Arc<dyn Listener>]>,
}

impl ListenerChain {
    pub fn builder() -> ListenerChainBuilder {
        ListenerChainBuilder::new()
    }

    /// `application ++ defaults`.
    pub fn compose(
        application: impl IntoIterator<Item = Arc<dyn Listener>>,
        defaults: impl IntoIterator<Item = Arc<dyn Listener>>,
    ) -> Self {
        Self {
            listeners: application.into_iter().chain(defaults).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.listeners.iter().map(|l| l.name()).collect()
    }

    /// Consult listeners in order until one claims the failure.
    ///
    /// `Ok(None)` means no listener recognized it. A panicking listener is an
    /// internal failure, reported as `Err`.
    pub fn walk(
        &self,
        error: &DynError,
        context: &RequestContext,
    ) -> Result<Option<ChainClaim>, UnexpectedMajorExceptionHandlingError> {
        for listener in self.listeners.iter() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                listener.attempt(error, context)
            }))
            .map_err(|payload| {
                UnexpectedMajorExceptionHandlingError::new(
                    listener.name(),
                    InternalFailureKind::ListenerPanicked(panic_message(payload.as_ref())),
                )
            })?;

            if let ListenerOutcome::Handled {
                errors,
                status_override,
            } = outcome
            {
                tracing::trace!("Listener {} claimed the exception", listener.name());
                return Ok(Some(ChainClaim {
                    listener: listener.name().to_string(),
                    errors,
                    status_override,
                }));
            }
        }
        Ok(None)
    }
}

impl fmt::Debug for ListenerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerChain")
            .field("listeners", &self.names())
            .finish()
    }
}

/// Collects application and default listeners at startup.
#[derive(Default)]
pub struct ListenerChainBuilder {
    application: Vec<Arc<dyn Listener>>,
    defaults: Vec<Arc<dyn Listener>>,
}

impl ListenerChainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an application listener. Application listeners always run
    /// before defaults, in the order they were added.
    pub fn listener(mut self, listener: impl Listener) -> Self {
        self.application.push(Arc::new(listener));
        self
    }

    pub fn shared_listener(mut self, listener: Arc<dyn Listener>) -> Self {
        self.application.push(listener);
        self
    }

    /// Append a default listener, consulted after every application listener.
    pub fn default_listener(mut self, listener: impl Listener) -> Self {
        self.defaults.push(Arc::new(listener));
        self
    }

    /// Append the framework's [default listeners](super::builtins::default_listeners).
    pub fn with_default_listeners(mut self) -> Self {
        self.defaults.extend(super::builtins::default_listeners());
        self
    }

    pub fn build(self) -> ListenerChain {
        ListenerChain::compose(self.application, self.defaults)
    }
}
