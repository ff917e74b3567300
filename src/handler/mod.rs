//! Exception handler
//!
//! Drives one failed request through the whole pipeline:
//!
//! ```text
//! RECEIVED
//!    ↓
//! RESOLVING ──────────────┬───────────────┐
//!    ↓                    ↓               ↓
//! RESOLVED            UNHANDLED     ENGINE_FAILURE
//!    │                    └───────┬───────┘
//!    │                         FALLBACK
//!    └──────────┬─────────────────┘
//!          ASSEMBLING
//!               ↓
//!          RESPONDED
//! ```
//!
//! Every path ends in `RESPONDED`.
//!
//! # Example
//!
//! ```
//! use faultline::prelude::*;
//! use faultline::adapter::RawAdapter;
//! use std::sync::Arc;
//!
//! let catalog = ErrorCatalog::builder().with_core_errors().build().unwrap();
//! let chain = ListenerChain::builder().with_default_listeners().build();
//! let handler = ApiExceptionHandler::new(Arc::new(catalog), chain, RawAdapter);
//!
//! let failure: BoxError = Box::new(ApiException::new("NOT_FOUND"));
//! let info = handler.handle(failure.as_ref(), &RequestContext::new("GET", "/orders/7"));
//! assert_eq!(info.http_status, 404);
//! assert_eq!(info.payload.codes(), vec!["NOT_FOUND"]);
//! ```

mod logging;

use crate::adapter::FrameworkAdapter;
use crate::assembler::ResponseAssembler;
use crate::catalog::ErrorCatalog;
use crate::common::{ErrorContractPayload, RequestContext};
use crate::config::PipelineConfig;
use crate::engine::{ExceptionHandlingResult, ResolutionEngine, ResolveOutcome};
use crate::exception::DynError;
use crate::fallback::UnhandledExceptionHandler;
use crate::listener::ListenerChain;
use std::sync::Arc;
use strum_macros::{Display, IntoStaticStr};

/// States a failed request passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum HandlingState {
    Received,
    Resolving,
    Resolved,
    Unhandled,
    EngineFailure,
    Fallback,
    Assembling,
    Responded,
}

/// Which branch of the state machine produced the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum HandlingOutcome {
    /// A listener claimed the failure.
    Resolved,
    /// No listener claimed it; the fallback answered.
    Unhandled,
    /// Resolution broke; the fallback answered.
    EngineFailure,
}

/// Everything produced for one failed request.
#[derive(Debug)]
pub struct ErrorResponseInfo<R> {
    pub framework_representation: R,
    pub http_status: u16,
    pub payload: ErrorContractPayload,
    pub outcome: HandlingOutcome,
}

/// Entry point the framework adapter calls from its catch-all.
pub struct ApiExceptionHandler<A: FrameworkAdapter> {
    engine: ResolutionEngine,
    fallback: UnhandledExceptionHandler,
    assembler: ResponseAssembler,
    adapter: A,
}

impl<A: FrameworkAdapter> ApiExceptionHandler<A> {
    pub fn new(catalog: Arc<ErrorCatalog>, chain: ListenerChain, adapter: A) -> Self {
        Self {
            engine: ResolutionEngine::new(Arc::clone(&catalog), chain),
            fallback: UnhandledExceptionHandler::new(catalog),
            assembler: ResponseAssembler::new(),
            adapter,
        }
    }

    /// Apply the parts of the configuration the core uses.
    pub fn with_config(mut self, config: &PipelineConfig) -> Self {
        self.engine = self
            .engine
            .with_precedence(config.status_precedence.clone());
        self
    }

    pub fn with_fallback(mut self, fallback: UnhandledExceptionHandler) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn engine(&self) -> &ResolutionEngine {
        &self.engine
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Translate `error` into a response. Total: every input yields one.
    pub fn handle(&self, error: &DynError, context: &RequestContext) -> ErrorResponseInfo<A::Output> {
        transition(HandlingState::Received);
        let context = context.ensure_correlation_id();

        let (result, outcome) = self.resolve_or_fallback(error, &context);

        transition(HandlingState::Assembling);
        let payload = self.assembler.assemble(&result, &context);
        logging::log_handled(&result, &payload, &context, outcome);

        let http_status = result.http_status();
        let framework_representation =
            self.adapter
                .prepare(&payload, http_status, &result, &context);

        transition(HandlingState::Responded);
        ErrorResponseInfo {
            framework_representation,
            http_status,
            payload,
            outcome,
        }
    }

    fn resolve_or_fallback<'e>(
        &self,
        error: &'e DynError,
        context: &RequestContext,
    ) -> (ExceptionHandlingResult<'e>, HandlingOutcome) {
        transition(HandlingState::Resolving);
        match self.engine.resolve(error, context) {
            Ok(ResolveOutcome::Resolved(result)) => {
                transition(HandlingState::Resolved);
                (result, HandlingOutcome::Resolved)
            }
            Ok(ResolveOutcome::NotHandled) => {
                transition(HandlingState::Unhandled);
                tracing::debug!(
                    "No suitable listener found for exception; the unhandled exception handler will take it"
                );
                transition(HandlingState::Fallback);
                (
                    self.fallback.handle_unhandled(error, context),
                    HandlingOutcome::Unhandled,
                )
            }
            Err(internal) => {
                transition(HandlingState::EngineFailure);
                tracing::error!(
                    internal_error = %internal,
                    listener = %internal.listener,
                    "Unexpected major error while handling exception; the unhandled exception handler will take it"
                );
                transition(HandlingState::Fallback);
                (
                    self.fallback.handle_unhandled(error, context),
                    HandlingOutcome::EngineFailure,
                )
            }
        }
    }
}

fn transition(state: HandlingState) {
    tracing::trace!(state = %state, "Exception handling state");
}
