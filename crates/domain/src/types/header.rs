//! Request headers with sensitivity-aware rendering
//!
//! A header is rendered through [`Header::filtered_value`] everywhere it can
//! end up in logs or error messages. Sensitive headers, and headers whose name
//! is in the process-wide [`KnownSensitiveHeaders`] registry, never show their
//! raw value there.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::constants::{
    AUTHORIZATION, AUTH_SID_SCHEME, BASIC_SCHEME, BEARER_SCHEME, FILTERED_PLACEHOLDER,
};
use crate::errors::{CourierError, Result};

/// Renders a sensitive value for display
pub type MaskFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

static KNOWN_SENSITIVE_HEADERS: Lazy<KnownSensitiveHeaders> =
    Lazy::new(|| KnownSensitiveHeaders::new([AUTHORIZATION]));

/// Case-insensitive set of header names that are always filtered
#[derive(Debug, Default)]
pub struct KnownSensitiveHeaders {
    items: RwLock<HashSet<String>>,
}

impl KnownSensitiveHeaders {
    /// Registry seeded with `items`
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let registry = Self::default();
        registry.extend(items);
        registry
    }

    /// Process-wide registry, seeded with `Authorization`
    pub fn global() -> &'static Self {
        &KNOWN_SENSITIVE_HEADERS
    }

    /// Register one name
    pub fn add(&self, name: &str) -> &Self {
        self.extend([name])
    }

    /// Register several names
    pub fn extend<I, S>(&self, names: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut items = self.items.write();
        items.extend(names.into_iter().map(|name| name.as_ref().to_lowercase()));
        drop(items);
        self
    }

    /// Whether `name` is registered, ignoring case
    pub fn contains(&self, name: &str) -> bool {
        self.items.read().contains(&name.to_lowercase())
    }
}

/// One HTTP header
#[derive(Clone)]
pub struct Header {
    name: String,
    value: String,
    is_sensitive: bool,
    mask: Option<MaskFn>,
}

impl Header {
    /// Plain header, shown as-is unless its name is known to be sensitive
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into(), is_sensitive: false, mask: None }
    }

    /// Header whose value is never shown
    pub fn sensitive(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { is_sensitive: true, ..Self::new(name, value) }
    }

    /// Header with explicit sensitivity, as reconstructed from the wire
    pub fn with_sensitivity(
        name: impl Into<String>,
        value: impl Into<String>,
        is_sensitive: bool,
    ) -> Self {
        Self { is_sensitive, ..Self::new(name, value) }
    }

    /// `Authorization: auth.sid <sid>`
    pub fn auth_sid(sid: &str) -> Self {
        Self::sensitive(AUTHORIZATION, format!("{AUTH_SID_SCHEME} {sid}"))
    }

    /// `Authorization: Bearer <token>`
    pub fn bearer(token: &str) -> Self {
        Self::sensitive(AUTHORIZATION, format!("{BEARER_SCHEME} {token}"))
    }

    /// `Authorization: Basic base64(<username>:<password>)`
    pub fn basic(username: &str, password: &str) -> Self {
        let credentials = STANDARD.encode(format!("{username}:{password}"));
        Self::sensitive(AUTHORIZATION, format!("{BASIC_SCHEME} {credentials}"))
    }

    /// Attach a mask used instead of the `[filtered]` placeholder.
    ///
    /// # Errors
    ///
    /// Returns [`CourierError::InvalidRequest`] when the header is neither
    /// sensitive nor known to be sensitive, since the mask would never apply.
    pub fn with_mask<F>(mut self, mask: F) -> Result<Self>
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        if !self.is_filtered() {
            return Err(CourierError::InvalidRequest(format!(
                "a mask may only be set on a sensitive header or one named in the known \
                 sensitive headers, got '{}'",
                self.name
            )));
        }
        self.mask = Some(Arc::new(mask));
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub const fn is_sensitive(&self) -> bool {
        self.is_sensitive
    }

    /// Whether the value is hidden when rendered
    pub fn is_filtered(&self) -> bool {
        self.is_sensitive || KnownSensitiveHeaders::global().contains(&self.name)
    }

    /// Value safe to log: masked, `[filtered]`, or raw for ordinary headers
    pub fn filtered_value(&self) -> String {
        if !self.is_filtered() {
            return self.value.clone();
        }
        match &self.mask {
            Some(mask) => mask(&self.value),
            None => FILTERED_PLACEHOLDER.to_string(),
        }
    }
}

impl PartialEq for Header {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.value == other.value
            && self.is_sensitive == other.is_sensitive
    }
}

impl Eq for Header {}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.filtered_value())
    }
}

// Debug goes through the filter too so `{:?}` never leaks a secret
impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Header")
            .field("name", &self.name)
            .field("value", &self.filtered_value())
            .field("is_sensitive", &self.is_sensitive)
            .field("masked", &self.mask.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_header_shows_value() {
        let header = Header::new("X-Request-Id", "abc");

        assert_eq!(header.filtered_value(), "abc");
        assert_eq!(header.to_string(), "X-Request-Id: abc");
    }

    #[test]
    fn sensitive_header_is_filtered() {
        let header = Header::sensitive("X-Api-Key", "secret");

        assert_eq!(header.filtered_value(), "[filtered]");
        assert_eq!(header.to_string(), "X-Api-Key: [filtered]");
        assert!(!format!("{header:?}").contains("secret"));
    }

    #[test]
    fn authorization_is_known_sensitive_in_any_case() {
        let header = Header::new("authorization", "token");
        assert_eq!(header.filtered_value(), "[filtered]");

        let header = Header::new("AUTHORIZATION", "token");
        assert_eq!(header.filtered_value(), "[filtered]");
    }

    #[test]
    fn registry_can_be_extended() {
        let header = Header::new("X-Courier-Test-Session", "value");
        assert_eq!(header.filtered_value(), "value");

        KnownSensitiveHeaders::global().add("x-courier-test-session");

        assert_eq!(header.filtered_value(), "[filtered]");
    }

    #[test]
    fn local_registry_is_case_insensitive() {
        let registry = KnownSensitiveHeaders::new(["Cookie"]);
        registry.extend(["X-Secret"]);

        assert!(registry.contains("cookie"));
        assert!(registry.contains("x-SECRET"));
        assert!(!registry.contains("accept"));
    }

    #[test]
    fn mask_applies_to_sensitive_header() {
        let header = Header::sensitive("X-Api-Key", "secret-1234")
            .with_mask(|value| format!("***{}", &value[value.len() - 4..]))
            .unwrap();

        assert_eq!(header.filtered_value(), "***1234");
        assert_eq!(header.value(), "secret-1234");
    }

    #[test]
    fn mask_on_known_sensitive_name_is_allowed() {
        let header = Header::new("Authorization", "x").with_mask(|_| "masked".to_string());
        assert_eq!(header.unwrap().filtered_value(), "masked");
    }

    #[test]
    fn mask_on_plain_header_is_rejected() {
        let result = Header::new("Accept", "*/*").with_mask(|_| "masked".to_string());
        assert!(matches!(result, Err(CourierError::InvalidRequest(_))));
    }

    #[test]
    fn auth_constructors() {
        assert_eq!(Header::auth_sid("sid").value(), "auth.sid sid");
        assert_eq!(Header::bearer("tok").value(), "Bearer tok");
        assert_eq!(Header::basic("user", "pass").value(), "Basic dXNlcjpwYXNz");

        let header = Header::bearer("tok");
        assert_eq!(header.name(), "Authorization");
        assert!(header.is_sensitive());
        assert_eq!(header.to_string(), "Authorization: [filtered]");
    }
}
