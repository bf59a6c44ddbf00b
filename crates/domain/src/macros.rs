//! Macro for implementing Display and FromStr for keyword enums
//!
//! Configuration descriptors carry a handful of keyword fields (source type,
//! report format). This macro provides both conversions in one place with
//! case-insensitive parsing.
//!
//! # Example
//!
//! ```rust
//! use dsr_domain::impl_keyword_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Channel {
//!     Mail,
//!     Spool,
//! }
//!
//! impl_keyword_conversions!(Channel {
//!     Mail => "mail",
//!     Spool => "spool",
//! });
//!
//! assert_eq!("MAIL".parse::<Channel>().unwrap(), Channel::Mail);
//! ```

/// Implements Display and FromStr traits for keyword enums
///
/// - Display writes the canonical lowercase keyword
/// - FromStr accepts any casing of the keyword and reports the enum name on
///   failure
#[macro_export]
macro_rules! impl_keyword_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
