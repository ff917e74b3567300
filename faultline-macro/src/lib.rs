use proc_macro::TokenStream;

mod api_errors;

/// Derive macro declaring a fixed set of API errors
///
/// Every variant becomes one catalog definition. The code defaults to the
/// variant name in `SCREAMING_SNAKE_CASE`. Exactly one variant must be
/// marked `fallback`, and it must map to a 5xx status.
///
/// # Example
/// ```ignore
/// use faultline::ApiErrors;
///
/// #[derive(Debug, Clone, Copy, ApiErrors)]
/// pub enum OrderError {
///     #[api_error(status = 404, message = "Order {id} was not found")]
///     OrderNotFound,
///
///     #[api_error(code = "ORDER_CONFLICT", status = 409, message = "Order was modified concurrently")]
///     Conflict,
///
///     #[api_error(status = 500, message = "Something went wrong", fallback)]
///     GenericServerError,
/// }
/// ```
#[proc_macro_derive(ApiErrors, attributes(api_error))]
pub fn derive_api_errors(input: TokenStream) -> TokenStream {
    api_errors::derive_api_errors(input)
}
