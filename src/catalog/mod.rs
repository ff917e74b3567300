//! Error catalog
//!
//! The catalog is the registry of every error a service may return to its
//! clients, plus exactly one fallback definition used whenever no specific
//! error applies. It is built once at startup and shared read-only across
//! all requests afterwards.
//!
//! # Example
//!
//! ```
//! use faultline::catalog::{ErrorCatalog, ErrorDefinition};
//!
//! let catalog = ErrorCatalog::builder()
//!     .define(ErrorDefinition::new("NOT_FOUND", "Resource not found", 404))
//!     .fallback(ErrorDefinition::new("GENERIC_SERVER_ERROR", "Something went wrong", 500))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(catalog.lookup("NOT_FOUND").unwrap().http_status(), 404);
//! assert_eq!(catalog.fallback().code(), "GENERIC_SERVER_ERROR");
//! ```

pub mod core;
mod definition;

pub use definition::{
    ErrorDefinition, MAX_HTTP_STATUS, MIN_HTTP_STATUS, is_error_status, is_server_error,
    is_valid_status,
};

use crate::error::{FaultlineError, Result};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

/// A fixed set of errors declared in code, usually through
/// `#[derive(ApiErrors)]`.
pub trait ApiErrorSet: Sized + 'static {
    /// Every member of the set, in declaration order.
    fn all() -> Vec<Self>;

    /// The member used as the catalog's fallback.
    fn fallback() -> Self;

    fn code(&self) -> &'static str;

    fn definition(&self) -> ErrorDefinition;
}

/// Immutable registry of error definitions.
#[derive(Debug, Clone)]
pub struct ErrorCatalog {
    definitions: Vec<Arc<ErrorDefinition>>,
    by_code: HashMap<String, usize>,
    fallback: usize,
}

impl ErrorCatalog {
    pub fn builder() -> ErrorCatalogBuilder {
        ErrorCatalogBuilder::new()
    }

    /// Build a catalog from a code-declared error set.
    ///
    /// The [core errors](core) are added for every code the set does not
    /// define itself, so the default listeners always resolve. The set's
    /// fallback stays the catalog fallback.
    pub fn from_set<S: ApiErrorSet>() -> Result<Self> {
        Self::builder()
            .definitions(S::all().iter().map(ApiErrorSet::definition))
            .fallback_code(S::fallback().code())
            .with_core_errors()
            .build()
    }

    /// Codes out of `codes` that this catalog does not define, in input order.
    pub fn missing_codes<'a>(&self, codes: &[&'a str]) -> Vec<&'a str> {
        codes
            .iter()
            .copied()
            .filter(|code| !self.contains(code))
            .collect()
    }

    pub fn lookup(&self, code: &str) -> Option<&Arc<ErrorDefinition>> {
        self.by_code.get(code).map(|&index| &self.definitions[index])
    }

    pub fn contains(&self, code: &str) -> bool {
        self.by_code.contains_key(code)
    }

    /// The generic fallback definition. Always present, always 5xx.
    pub fn fallback(&self) -> &Arc<ErrorDefinition> {
        &self.definitions[self.fallback]
    }

    /// Definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ErrorDefinition>> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Collects definitions and validates them into an [`ErrorCatalog`].
#[derive(Debug, Default)]
pub struct ErrorCatalogBuilder {
    definitions: Vec<ErrorDefinition>,
    fallback: Option<String>,
    include_core: bool,
}

impl ErrorCatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition.
    pub fn define(mut self, definition: ErrorDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    pub fn definitions(mut self, definitions: impl IntoIterator<Item = ErrorDefinition>) -> Self {
        self.definitions.extend(definitions);
        self
    }

    /// Register a definition and mark it as the fallback.
    pub fn fallback(mut self, definition: ErrorDefinition) -> Self {
        self.fallback = Some(definition.code().to_string());
        self.definitions.push(definition);
        self
    }

    /// Mark an already (or later) registered code as the fallback.
    pub fn fallback_code(mut self, code: impl Into<String>) -> Self {
        self.fallback = Some(code.into());
        self
    }

    /// Add the framework's [core errors](core) for every code the
    /// application did not define itself. If no fallback was chosen,
    /// `GENERIC_SERVICE_ERROR` becomes the fallback.
    pub fn with_core_errors(mut self) -> Self {
        self.include_core = true;
        self
    }

    pub fn build(self) -> Result<ErrorCatalog> {
        let ErrorCatalogBuilder {
            mut definitions,
            fallback,
            include_core,
        } = self;

        let fallback = if include_core {
            for core_def in core::core_definitions() {
                if !definitions.iter().any(|d| d.code() == core_def.code()) {
                    definitions.push(core_def);
                }
            }
            fallback.unwrap_or_else(|| core::GENERIC_SERVICE_ERROR.to_string())
        } else {
            fallback.ok_or(FaultlineError::MissingFallback)?
        };

        let mut by_code = HashMap::with_capacity(definitions.len());
        for (index, definition) in definitions.iter().enumerate() {
            if definition.code().trim().is_empty() {
                return Err(FaultlineError::BlankCode);
            }
            if !is_valid_status(definition.http_status()) {
                return Err(FaultlineError::InvalidStatus {
                    code: definition.code().to_string(),
                    status: definition.http_status(),
                });
            }
            match by_code.entry(definition.code().to_string()) {
                Entry::Occupied(_) => {
                    return Err(FaultlineError::DuplicateCode {
                        code: definition.code().to_string(),
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(index);
                }
            }
        }

        let fallback_index = *by_code
            .get(&fallback)
            .ok_or_else(|| FaultlineError::UnknownFallback {
                code: fallback.clone(),
            })?;
        let fallback_status = definitions[fallback_index].http_status();
        if !is_server_error(fallback_status) {
            return Err(FaultlineError::FallbackNotServerError {
                code: fallback,
                status: fallback_status,
            });
        }

        tracing::debug!(
            "Error catalog built ({} definitions, fallback {})",
            definitions.len(),
            fallback
        );

        Ok(ErrorCatalog {
            definitions: definitions.into_iter().map(Arc::new).collect(),
            by_code,
            fallback: fallback_index,
        })
    }
}
