//! Framework-level errors referenced by the default listeners.
//!
//! Applications can pull these into their catalog with
//! [`ErrorCatalogBuilder::with_core_errors`](super::ErrorCatalogBuilder::with_core_errors).
//! Any definition the application supplies under the same code takes
//! precedence over the one listed here.

use super::ErrorDefinition;

pub const GENERIC_SERVICE_ERROR: &str = "GENERIC_SERVICE_ERROR";
pub const GENERIC_BAD_REQUEST: &str = "GENERIC_BAD_REQUEST";
pub const MALFORMED_REQUEST: &str = "MALFORMED_REQUEST";
pub const MISSING_FIELD: &str = "MISSING_FIELD";
pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
pub const FORBIDDEN: &str = "FORBIDDEN";
pub const NOT_FOUND: &str = "NOT_FOUND";
pub const METHOD_NOT_ALLOWED: &str = "METHOD_NOT_ALLOWED";
pub const UNSUPPORTED_MEDIA_TYPE: &str = "UNSUPPORTED_MEDIA_TYPE";
pub const SERVICE_UNAVAILABLE: &str = "SERVICE_UNAVAILABLE";

/// Message used for the generic service error, both in the core set and in
/// the fallback handler's hardcoded definition.
pub const GENERIC_SERVICE_ERROR_MESSAGE: &str = "An error occurred while fulfilling the request";

pub fn core_definitions() -> Vec<ErrorDefinition> {
    vec![
        ErrorDefinition::new(GENERIC_SERVICE_ERROR, GENERIC_SERVICE_ERROR_MESSAGE, 500),
        ErrorDefinition::new(GENERIC_BAD_REQUEST, "Invalid request", 400),
        ErrorDefinition::new(
            MALFORMED_REQUEST,
            "Request body is missing or could not be parsed",
            400,
        ),
        ErrorDefinition::new(MISSING_FIELD, "A required field is missing", 400),
        ErrorDefinition::new(
            UNAUTHORIZED,
            "Authentication is required to access this resource",
            401,
        ),
        ErrorDefinition::new(FORBIDDEN, "Access to this resource is forbidden", 403),
        ErrorDefinition::new(NOT_FOUND, "The requested resource was not found", 404),
        ErrorDefinition::new(
            METHOD_NOT_ALLOWED,
            "The request method is not supported for this resource",
            405,
        ),
        ErrorDefinition::new(
            UNSUPPORTED_MEDIA_TYPE,
            "The request content type is not supported",
            415,
        ),
        ErrorDefinition::new(
            SERVICE_UNAVAILABLE,
            "The service is temporarily unavailable",
            503,
        ),
    ]
}

/// Every code the default listeners can name. A catalog serving those
/// listeners must define all of them.
pub const DEFAULT_LISTENER_CODES: &[&str] = &[
    GENERIC_SERVICE_ERROR,
    GENERIC_BAD_REQUEST,
    MALFORMED_REQUEST,
    UNAUTHORIZED,
    FORBIDDEN,
    NOT_FOUND,
    METHOD_NOT_ALLOWED,
    UNSUPPORTED_MEDIA_TYPE,
    SERVICE_UNAVAILABLE,
];

/// Pick the core error code that best describes a bare HTTP status.
pub fn code_for_status(status: u16) -> &'static str {
    match status {
        401 => UNAUTHORIZED,
        403 => FORBIDDEN,
        404 => NOT_FOUND,
        405 => METHOD_NOT_ALLOWED,
        415 => UNSUPPORTED_MEDIA_TYPE,
        503 => SERVICE_UNAVAILABLE,
        400..=499 => GENERIC_BAD_REQUEST,
        _ => GENERIC_SERVICE_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_core_codes_are_unique() {
        let defs = core_definitions();
        let codes: HashSet<_> = defs.iter().map(|d| d.code()).collect();
        assert_eq!(codes.len(), defs.len());
    }

    #[test]
    fn test_code_for_status() {
        assert_eq!(code_for_status(404), NOT_FOUND);
        assert_eq!(code_for_status(422), GENERIC_BAD_REQUEST);
        assert_eq!(code_for_status(502), GENERIC_SERVICE_ERROR);
        assert_eq!(code_for_status(302), GENERIC_SERVICE_ERROR);
    }

    #[test]
    fn test_default_listener_codes_cover_status_mapping() {
        let core_codes: HashSet<_> = core_definitions().iter().map(|d| d.code().to_string()).collect();
        for status in 100..=599 {
            assert!(DEFAULT_LISTENER_CODES.contains(&code_for_status(status)));
        }
        for code in DEFAULT_LISTENER_CODES {
            assert!(core_codes.contains(*code));
        }
    }
}
