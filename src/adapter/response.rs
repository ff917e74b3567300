use super::FrameworkAdapter;
use crate::common::{ErrorContractPayload, RequestContext};
use crate::config::{ContractConfig, DEFAULT_CONTENT_TYPE, PipelineConfig};
use crate::engine::ExceptionHandlingResult;
use crate::error::{FaultlineError, Result};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Picks the content type per response, e.g. `application/problem+json`
/// for some routes.
pub type ContentTypeResolver =
    Arc<dyn Fn(&ExceptionHandlingResult<'_>, &RequestContext) -> HeaderValue + Send + Sync>;

/// Response extension marking a response already rendered in the error
/// contract.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ErrorContractResponse;

/// Writes the payload as a JSON body with the resolved status.
#[derive(Clone)]
pub struct AxumAdapter {
    contract: ContractConfig,
    content_type: HeaderValue,
    resolver: Option<ContentTypeResolver>,
}

impl AxumAdapter {
    pub fn new() -> Self {
        Self {
            contract: ContractConfig::default(),
            content_type: HeaderValue::from_static(DEFAULT_CONTENT_TYPE),
            resolver: None,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let content_type = HeaderValue::from_str(&config.content_type).map_err(|e| {
            FaultlineError::config(format!(
                "invalid content type {:?}: {e}",
                config.content_type
            ))
        })?;
        Ok(Self {
            contract: config.contract.clone(),
            content_type,
            resolver: None,
        })
    }

    pub fn with_content_type_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&ExceptionHandlingResult<'_>, &RequestContext) -> HeaderValue + Send + Sync + 'static,
    {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn contract(&self) -> &ContractConfig {
        &self.contract
    }

    // The resolver is user code; a panic in it falls back to the configured type.
    fn resolve_content_type(
        &self,
        result: &ExceptionHandlingResult<'_>,
        context: &RequestContext,
    ) -> HeaderValue {
        let Some(resolve) = &self.resolver else {
            return self.content_type.clone();
        };
        match panic::catch_unwind(AssertUnwindSafe(|| resolve(result, context))) {
            Ok(content_type) => content_type,
            Err(_) => {
                tracing::warn!(
                    path = %context.path(),
                    "Content type resolver panicked; using the configured content type"
                );
                self.content_type.clone()
            }
        }
    }
}

impl Default for AxumAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AxumAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AxumAdapter")
            .field("contract", &self.contract)
            .field("content_type", &self.content_type)
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

impl FrameworkAdapter for AxumAdapter {
    type Output = Response;

    fn prepare(
        &self,
        payload: &ErrorContractPayload,
        http_status: u16,
        result: &ExceptionHandlingResult<'_>,
        context: &RequestContext,
    ) -> Response {
        let status = StatusCode::from_u16(http_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let content_type = self.resolve_content_type(result, context);
        let body = payload.to_json(&self.contract).to_string();

        let mut response = (status, [(CONTENT_TYPE, content_type)], body).into_response();
        response.extensions_mut().insert(ErrorContractResponse);
        response
    }
}
