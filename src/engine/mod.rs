//! Resolution engine
//!
//! Walks the listener chain for a failure, checks every error the claiming
//! listener named against the catalog, and settles on one HTTP status.
//!
//! The engine distinguishes three results statically:
//!
//! ```text
//! Ok(ResolveOutcome::Resolved(..))   a listener claimed the failure
//! Ok(ResolveOutcome::NotHandled)     nobody recognized it
//! Err(UnexpectedMajorExceptionHandlingError)
//!                                    the machinery itself is broken
//! ```

mod error;
mod precedence;

pub use error::{InternalFailureKind, UnexpectedMajorExceptionHandlingError};
pub use precedence::StatusPrecedence;

pub(crate) use error::panic_message;

use crate::catalog::{ErrorCatalog, ErrorDefinition, is_error_status};
use crate::common::RequestContext;
use crate::exception::DynError;
use crate::listener::{ChainClaim, ListenerChain};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// A catalog error instantiated for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedError {
    definition: Arc<ErrorDefinition>,
    args: BTreeMap<String, String>,
    extra_metadata: BTreeMap<String, Value>,
}

impl ResolvedError {
    pub fn new(definition: Arc<ErrorDefinition>) -> Self {
        Self {
            definition,
            args: BTreeMap::new(),
            extra_metadata: BTreeMap::new(),
        }
    }

    pub(crate) fn with_overrides(
        mut self,
        args: BTreeMap<String, String>,
        extra_metadata: BTreeMap<String, Value>,
    ) -> Self {
        self.args = args;
        self.extra_metadata = extra_metadata;
        self
    }

    pub fn definition(&self) -> &ErrorDefinition {
        &self.definition
    }

    pub fn code(&self) -> &str {
        self.definition.code()
    }

    pub fn http_status(&self) -> u16 {
        self.definition.http_status()
    }

    /// The catalog message with this request's arguments filled in.
    pub fn message(&self) -> Cow<'_, str> {
        self.definition.render_message(&self.args)
    }

    /// Catalog metadata overlaid with this request's extra metadata.
    pub fn metadata(&self) -> BTreeMap<String, Value> {
        let mut merged = self.definition.metadata().clone();
        merged.extend(
            self.extra_metadata
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        merged
    }
}

/// A fully resolved failure: status plus the errors to report.
///
/// Keeps a reference to the original failure for logging. It is never
/// serialized.
pub struct ExceptionHandlingResult<'e> {
    http_status: u16,
    errors: Vec<ResolvedError>,
    origin: &'e DynError,
    listener: Option<String>,
}

impl<'e> ExceptionHandlingResult<'e> {
    pub(crate) fn new(
        http_status: u16,
        errors: Vec<ResolvedError>,
        origin: &'e DynError,
        listener: Option<String>,
    ) -> Self {
        Self {
            http_status,
            errors,
            origin,
            listener,
        }
    }

    pub fn http_status(&self) -> u16 {
        self.http_status
    }

    /// Errors in resolution order, deduplicated by code.
    pub fn errors(&self) -> &[ResolvedError] {
        &self.errors
    }

    pub fn codes(&self) -> Vec<&str> {
        self.errors.iter().map(ResolvedError::code).collect()
    }

    pub fn origin(&self) -> &'e DynError {
        self.origin
    }

    /// The claiming listener, or `None` when the fallback produced this.
    pub fn listener(&self) -> Option<&str> {
        self.listener.as_deref()
    }
}

impl fmt::Debug for ExceptionHandlingResult<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionHandlingResult")
            .field("http_status", &self.http_status)
            .field("errors", &self.codes())
            .field("origin", &self.origin.to_string())
            .field("listener", &self.listener)
            .finish()
    }
}

#[derive(Debug)]
pub enum ResolveOutcome<'e> {
    Resolved(ExceptionHandlingResult<'e>),
    /// No listener recognized the failure. Not an error.
    NotHandled,
}

/// Turns failures into [`ExceptionHandlingResult`]s.
///
/// Built once at startup and shared by every request.
#[derive(Debug, Clone)]
pub struct ResolutionEngine {
    catalog: Arc<ErrorCatalog>,
    chain: ListenerChain,
    precedence: StatusPrecedence,
}

impl ResolutionEngine {
    pub fn new(catalog: Arc<ErrorCatalog>, chain: ListenerChain) -> Self {
        Self {
            catalog,
            chain,
            precedence: StatusPrecedence::default(),
        }
    }

    pub fn with_precedence(mut self, precedence: StatusPrecedence) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn catalog(&self) -> &Arc<ErrorCatalog> {
        &self.catalog
    }

    pub fn chain(&self) -> &ListenerChain {
        &self.chain
    }

    pub fn precedence(&self) -> &StatusPrecedence {
        &self.precedence
    }

    /// Resolve a failure against the chain and catalog.
    pub fn resolve<'e>(
        &self,
        error: &'e DynError,
        context: &RequestContext,
    ) -> Result<ResolveOutcome<'e>, UnexpectedMajorExceptionHandlingError> {
        let Some(claim) = self.chain.walk(error, context)? else {
            return Ok(ResolveOutcome::NotHandled);
        };

        let listener = claim.listener.clone();
        panic::catch_unwind(AssertUnwindSafe(|| self.build_result(error, claim)))
            .map_err(|payload| {
                UnexpectedMajorExceptionHandlingError::new(
                    listener,
                    InternalFailureKind::ResolutionPanicked(panic_message(payload.as_ref())),
                )
            })?
            .map(ResolveOutcome::Resolved)
    }

    fn build_result<'e>(
        &self,
        error: &'e DynError,
        claim: ChainClaim,
    ) -> Result<ExceptionHandlingResult<'e>, UnexpectedMajorExceptionHandlingError> {
        let ChainClaim {
            listener,
            errors,
            status_override,
        } = claim;
        let fail = |kind| UnexpectedMajorExceptionHandlingError::new(listener.as_str(), kind);

        if errors.is_empty() {
            return Err(fail(InternalFailureKind::EmptyHandledOutcome));
        }

        let mut seen = HashSet::with_capacity(errors.len());
        let mut resolved = Vec::with_capacity(errors.len());
        for error_ref in errors {
            let (code, args, metadata) = error_ref.into_parts();
            let definition = self
                .catalog
                .lookup(&code)
                .ok_or_else(|| fail(InternalFailureKind::UnknownErrorCode(code.to_string())))?;
            if seen.insert(code) {
                resolved.push(ResolvedError::new(Arc::clone(definition)).with_overrides(args, metadata));
            }
        }

        let http_status = match status_override {
            Some(status) if is_error_status(status) => status,
            Some(status) => return Err(fail(InternalFailureKind::InvalidStatusOverride(status))),
            None => {
                let statuses: Vec<u16> = resolved.iter().map(ResolvedError::http_status).collect();
                self.precedence
                    .select(&statuses)
                    .ok_or_else(|| fail(InternalFailureKind::EmptyHandledOutcome))?
            }
        };

        Ok(ExceptionHandlingResult::new(
            http_status,
            resolved,
            error,
            Some(listener.clone()),
        ))
    }
}
