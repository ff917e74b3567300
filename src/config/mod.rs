//! Pipeline configuration
//!
//! Everything here is plain data deserialized with `serde`. The embedding
//! application decides where it comes from (a file, a config service, a
//! literal in `main`); the pipeline itself never reads the environment.

use crate::catalog::{ErrorCatalog, ErrorDefinition};
use crate::engine::StatusPrecedence;
use crate::error::Result;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONTENT_TYPE: &str = "application/json";
pub const DEFAULT_CORRELATION_HEADER: &str = "x-correlation-id";

/// Field names of the wire contract.
///
/// Names are configuration; the pairing of code and message and the order of
/// the errors array are not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    pub error_id_field: String,
    pub errors_field: String,
    pub code_field: String,
    pub message_field: String,
    pub metadata_field: String,
    pub include_metadata: bool,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            error_id_field: "error_id".to_string(),
            errors_field: "errors".to_string(),
            code_field: "code".to_string(),
            message_field: "message".to_string(),
            metadata_field: "metadata".to_string(),
            include_metadata: true,
        }
    }
}

/// Settings shared by the handler and the framework adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub contract: ContractConfig,
    pub content_type: String,
    pub status_precedence: StatusPrecedence,
    pub correlation_header: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            contract: ContractConfig::default(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            status_precedence: StatusPrecedence::default(),
            correlation_header: DEFAULT_CORRELATION_HEADER.to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// The application's error catalog as configuration data.
///
/// ```json
/// {
///   "fallback": "GENERIC_SERVER_ERROR",
///   "include_core_errors": false,
///   "errors": [
///     { "code": "NOT_FOUND", "message": "Not found", "http_status": 404 },
///     { "code": "GENERIC_SERVER_ERROR", "message": "Something went wrong", "http_status": 500 }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub fallback: Option<String>,
    #[serde(default)]
    pub include_core_errors: bool,
    #[serde(default)]
    pub errors: Vec<ErrorDefinition>,
}

impl CatalogConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate the configuration into a catalog.
    pub fn into_catalog(self) -> Result<ErrorCatalog> {
        let mut builder = ErrorCatalog::builder().definitions(self.errors);
        if let Some(code) = self.fallback {
            builder = builder.fallback_code(code);
        }
        if self.include_core_errors {
            builder = builder.with_core_errors();
        }
        builder.build()
    }
}
