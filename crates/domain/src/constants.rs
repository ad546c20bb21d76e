//! Wire-level constants
//!
//! Centralized location for header names, placeholders and form field names
//! used across the request and error model.

// Header names
pub const AUTHORIZATION: &str = "Authorization";
pub const CONTENT_TYPE: &str = "Content-Type";

// Content types
pub const APPLICATION_JSON: &str = "application/json";

/// Replaces the value of a sensitive header that has no mask
pub const FILTERED_PLACEHOLDER: &str = "[filtered]";

/// Form field carrying the raw body when it is sent alongside files
pub const MULTIPART_BODY_FIELD: &str = "data";

// Auth schemes
pub const AUTH_SID_SCHEME: &str = "auth.sid";
pub const BEARER_SCHEME: &str = "Bearer";
pub const BASIC_SCHEME: &str = "Basic";

/// Status code treated as a bad request by error helpers
pub const HTTP_BAD_REQUEST: u16 = 400;
