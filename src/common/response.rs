use crate::config::ContractConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The error contract returned to clients.
///
/// Every failed request produces exactly one payload: an error id that links
/// the response to server-side logs and the ordered list of catalog errors.
/// Only catalog-approved codes and messages ever appear here.
///
/// The derived serialization uses the default field names:
///
/// ```json
/// {
///   "error_id": "6a0e6f6e-...",
///   "errors": [
///     { "code": "NOT_FOUND", "message": "The requested resource was not found" }
///   ]
/// }
/// ```
///
/// Use [`ErrorContractPayload::to_json`] to apply configured field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorContractPayload {
    error_id: String,
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub code: String,
    pub message: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl ErrorContractPayload {
    pub(crate) fn new(error_id: String, errors: Vec<ErrorEntry>) -> Self {
        Self { error_id, errors }
    }

    pub fn error_id(&self) -> &str {
        &self.error_id
    }

    pub fn errors(&self) -> &[ErrorEntry] {
        &self.errors
    }

    /// Codes in payload order.
    pub fn codes(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.code.as_str()).collect()
    }

    /// Render the payload as JSON using the configured field names.
    pub fn to_json(&self, contract: &ContractConfig) -> Value {
        let errors = self
            .errors
            .iter()
            .map(|entry| {
                let mut obj = Map::new();
                obj.insert(
                    contract.code_field.clone(),
                    Value::String(entry.code.clone()),
                );
                obj.insert(
                    contract.message_field.clone(),
                    Value::String(entry.message.clone()),
                );
                if contract.include_metadata && !entry.metadata.is_empty() {
                    let metadata = entry
                        .metadata
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect();
                    obj.insert(contract.metadata_field.clone(), Value::Object(metadata));
                }
                Value::Object(obj)
            })
            .collect();

        let mut root = Map::new();
        root.insert(
            contract.error_id_field.clone(),
            Value::String(self.error_id.clone()),
        );
        root.insert(contract.errors_field.clone(), Value::Array(errors));
        Value::Object(root)
    }
}
