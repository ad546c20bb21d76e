//! Macro for implementing Display and FromStr for wire token enums
//!
//! HTTP tokens such as methods have one canonical spelling on the wire but
//! are commonly written in any case by callers. This macro generates both
//! conversions from a single variant table.
//!
//! # Example
//!
//! ```rust
//! use courier_domain::impl_wire_token_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Scheme {
//!     Http,
//!     Https,
//! }
//!
//! impl_wire_token_conversions!(Scheme {
//!     Http => "http",
//!     Https => "https",
//! });
//!
//! assert_eq!(Scheme::Https.to_string(), "https");
//! assert_eq!("HTTP".parse::<Scheme>(), Ok(Scheme::Http));
//! ```

/// Implements Display and FromStr for token enums
///
/// - Display writes the canonical spelling
/// - FromStr matches any ASCII case and names the enum in its error
#[macro_export]
macro_rules! impl_wire_token_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Canonical wire spelling
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(if s.eq_ignore_ascii_case($str) {
                    return Ok(Self::$variant);
                })+
                Err(format!("Invalid {}: {}", stringify!($enum_name), s))
            }
        }
    };
}
