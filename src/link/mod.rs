//! Link parsing subsystem.
//!
//! # Data Flow
//! ```text
//! link string ("vless://uuid@host:port?params")
//!     → LinkRegistry (scheme lookup)
//!     → protocol parser (vless.rs)
//!     → ConnectionDescriptor (validated, normalized)
//! ```
//!
//! # Design Decisions
//! - Parsers register per URI scheme; adding a protocol means adding a
//!   variant, not growing a conditional
//! - Parsing is pure: no file system or network access
//! - Transport parameters beyond the selectors stay in an open map, read
//!   back with an empty-string default

pub mod vless;

use std::collections::HashMap;

use thiserror::Error;
use url::Url;

pub use vless::VlessParser;

/// Errors produced while parsing a connection link.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The input could not be decomposed as a URI at all.
    #[error("failed to parse link: {0}")]
    MalformedUri(url::ParseError),

    /// The URI scheme names a protocol with no registered parser.
    #[error("unsupported protocol: {0}")]
    UnsupportedScheme(String),

    /// The userinfo component (the VLESS user id) is absent or empty.
    #[error("link has no user id")]
    MissingIdentity,

    /// The authority has no host.
    #[error("link has no host")]
    MissingHost,

    /// The authority has no port.
    #[error("link has no port")]
    MissingPort,

    /// The port text is not a valid base-10 port number.
    #[error("invalid port: {0}")]
    InvalidPort(String),
}

/// Parsed, normalized connection attributes from a link.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionDescriptor {
    /// URI scheme, lowercase (`"vless"`).
    pub scheme: String,

    /// User id from the userinfo component, percent-decoded, never empty.
    pub identity: String,

    /// Upstream host; IPv6 addresses are bare, without brackets.
    pub host: String,

    /// Upstream port, 1-65535.
    pub port: u16,

    /// Stream network kind (query `type`, then `network`, then `"xhttp"`).
    pub network: String,

    /// Security layer kind (query `security`, default `"reality"`).
    pub security: String,

    /// Transport mode (query `mode`, default `"auto"`).
    pub mode: String,

    /// All query parameters as written, for transport-specific lookups.
    pub params: HashMap<String, String>,
}

impl ConnectionDescriptor {
    /// Transport parameter by query key, empty string when absent.
    pub fn param(&self, key: &str) -> &str {
        self.params.get(key).map(String::as_str).unwrap_or("")
    }
}

/// A protocol-specific link parser.
pub trait LinkParser: Send + Sync {
    /// URI scheme this parser handles, lowercase.
    fn scheme(&self) -> &'static str;

    /// Parses a link of this parser's scheme into a descriptor.
    fn parse(&self, uri: &str) -> Result<ConnectionDescriptor, ParseError>;
}

/// Scheme-keyed lookup of link parsers.
pub struct LinkRegistry {
    parsers: HashMap<&'static str, Box<dyn LinkParser>>,
}

impl LinkRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Creates a registry with every built-in protocol parser.
    pub fn with_builtin_parsers() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(VlessParser));
        registry
    }

    /// Registers a parser under its scheme, replacing any previous one.
    pub fn register(&mut self, parser: Box<dyn LinkParser>) {
        self.parsers.insert(parser.scheme(), parser);
    }

    /// Parses a link by dispatching on its scheme, case-insensitively.
    pub fn parse(&self, uri: &str) -> Result<ConnectionDescriptor, ParseError> {
        let scheme = match uri.split_once(':') {
            Some((scheme, _)) if !scheme.is_empty() => scheme.to_ascii_lowercase(),
            _ => {
                // No scheme separator; surface the canonical URI error.
                return match Url::parse(uri) {
                    Ok(url) => Err(ParseError::UnsupportedScheme(url.scheme().to_string())),
                    Err(err) => Err(ParseError::MalformedUri(err)),
                };
            }
        };

        match self.parsers.get(scheme.as_str()) {
            Some(parser) => parser.parse(uri),
            None => Err(ParseError::UnsupportedScheme(scheme)),
        }
    }
}

impl Default for LinkRegistry {
    fn default() -> Self {
        Self::with_builtin_parsers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_case_insensitively() {
        let registry = LinkRegistry::with_builtin_parsers();
        let descriptor = registry.parse("VLESS://uuid@example.com:443").unwrap();
        assert_eq!(descriptor.scheme, "vless");
    }

    #[test]
    fn rejects_unknown_scheme() {
        let registry = LinkRegistry::with_builtin_parsers();
        let err = registry.parse("http://x@host:80").unwrap_err();
        match err {
            ParseError::UnsupportedScheme(scheme) => assert_eq!(scheme, "http"),
            other => panic!("expected UnsupportedScheme, got {other:?}"),
        }
    }

    #[test]
    fn rejects_input_without_scheme() {
        let registry = LinkRegistry::with_builtin_parsers();
        assert!(matches!(
            registry.parse("not-a-uri"),
            Err(ParseError::MalformedUri(_))
        ));
    }
}
