//! # Faultline
//!
//! Turns every failure raised while serving an HTTP request into exactly one
//! well-formed error response with a stable contract.
//!
//! Failures flow through a fixed pipeline:
//!
//! 1. An ordered [`ListenerChain`](listener::ListenerChain) is consulted;
//!    the first listener that recognises the failure names the catalog
//!    errors it represents.
//! 2. The [`ResolutionEngine`](engine::ResolutionEngine) turns those names
//!    into [`ErrorDefinition`](catalog::ErrorDefinition)s from the
//!    [`ErrorCatalog`](catalog::ErrorCatalog) and picks one HTTP status.
//! 3. Unclaimed failures, and failures whose handling itself broke, go to
//!    the [`UnhandledExceptionHandler`](fallback::UnhandledExceptionHandler),
//!    which answers with the catalog's generic 5xx error.
//! 4. The [`ResponseAssembler`](assembler::ResponseAssembler) builds the
//!    client payload from catalog data only, and a
//!    [`FrameworkAdapter`](adapter::FrameworkAdapter) hands it to the web
//!    framework.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use faultline::adapter::{ErrorTranslationLayer, Failure};
//! use faultline::config::PipelineConfig;
//! use faultline::prelude::*;
//! use axum::{Router, routing::get};
//! use std::sync::Arc;
//!
//! #[derive(Debug, Clone, Copy, ApiErrors)]
//! enum ShopError {
//!     #[api_error(status = 404, message = "Order was not found")]
//!     OrderNotFound,
//!     #[api_error(status = 500, message = "Something went wrong", fallback)]
//!     GenericServerError,
//! }
//!
//! async fn show_order() -> Result<String, Failure> {
//!     Err(ApiException::new(ShopError::OrderNotFound).into())
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let catalog = Arc::new(ErrorCatalog::from_set::<ShopError>().unwrap());
//!     let layer = ErrorTranslationLayer::from_config(catalog, vec![], &PipelineConfig::default())
//!         .unwrap();
//!
//!     let app: Router = Router::new()
//!         .route("/orders/{id}", get(show_order))
//!         .layer(layer);
//!
//!     // Serve your app...
//! }
//! ```

pub mod adapter;
pub mod assembler;
pub mod catalog;
pub mod common;
pub mod config;
pub mod engine;
pub mod error;
pub mod exception;
pub mod fallback;
pub mod handler;
pub mod listener;

// Re-export core types
pub use catalog::{ApiErrorSet, ErrorCatalog, ErrorDefinition};
pub use common::{ErrorContractPayload, ErrorEntry, RequestContext};
pub use error::{FaultlineError, Result};
pub use handler::{ApiExceptionHandler, ErrorResponseInfo, HandlingOutcome};

// Re-export macros
pub use faultline_macro::ApiErrors;

pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use faultline::prelude::*;
/// ```
pub mod prelude {
    pub use crate::ApiErrors;
    pub use crate::catalog::{ApiErrorSet, ErrorCatalog, ErrorDefinition};
    pub use crate::common::{ErrorContractPayload, RequestContext};
    pub use crate::engine::{ExceptionHandlingResult, StatusPrecedence};
    pub use crate::error::FaultlineError;
    pub use crate::exception::{
        ApiException, BoxError, DynError, FieldViolation, HttpStatusException,
        ValidationFailure,
    };
    pub use crate::handler::{ApiExceptionHandler, ErrorResponseInfo, HandlingOutcome};
    pub use crate::listener::{ErrorRef, Listener, ListenerChain, ListenerOutcome};
}
