//! Response assembly
//!
//! The security boundary of the pipeline: the payload is built exclusively
//! from resolved catalog errors. Nothing from the failure itself (message,
//! type name, source chain) is read here.

use crate::common::{ErrorContractPayload, ErrorEntry, RequestContext, new_correlation_id};
use crate::engine::ExceptionHandlingResult;

#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseAssembler;

impl ResponseAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Build the client payload.
    ///
    /// The error id is the context's correlation id, or a fresh one if the
    /// request had none. Entries keep resolution order.
    pub fn assemble(
        &self,
        result: &ExceptionHandlingResult<'_>,
        context: &RequestContext,
    ) -> ErrorContractPayload {
        let error_id = context
            .correlation_id()
            .map(str::to_string)
            .unwrap_or_else(new_correlation_id);

        let errors = result
            .errors()
            .iter()
            .map(|resolved| ErrorEntry {
                code: resolved.code().to_string(),
                message: resolved.message().into_owned(),
                metadata: resolved.metadata(),
            })
            .collect();

        ErrorContractPayload::new(error_id, errors)
    }
}
