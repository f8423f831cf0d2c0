//! VLESS link parser.
//!
//! Format: `vless://uuid@host:port?params`
//!
//! # Design Decisions
//! - Generic URI decomposition is delegated to the `url` crate; its
//!   `EmptyHost`/`InvalidPort` failures are refined into the matching
//!   descriptor errors so callers see the offending value
//! - Query defaulting follows the selector chain `type` → `network` →
//!   `"xhttp"` (an empty value falls through like an absent key)
//! - A duplicated query key resolves to its first value

use std::collections::HashMap;

use percent_encoding::percent_decode_str;
use url::{Host, Url};

use super::{ConnectionDescriptor, LinkParser, ParseError};

const DEFAULT_NETWORK: &str = "xhttp";
const DEFAULT_SECURITY: &str = "reality";
const DEFAULT_MODE: &str = "auto";

/// Parser for `vless://` links.
pub struct VlessParser;

impl LinkParser for VlessParser {
    fn scheme(&self) -> &'static str {
        "vless"
    }

    fn parse(&self, uri: &str) -> Result<ConnectionDescriptor, ParseError> {
        let url = Url::parse(uri).map_err(|err| refine_url_error(uri, err))?;

        if url.username().is_empty() {
            return Err(ParseError::MissingIdentity);
        }
        let identity = percent_decode_str(url.username())
            .decode_utf8_lossy()
            .into_owned();

        // IPv6 addresses lose their brackets: the engine expects the bare
        // address in vnext entries.
        let host = match url.host() {
            Some(Host::Ipv6(addr)) => addr.to_string(),
            _ => url.host_str().unwrap_or("").to_string(),
        };
        if host.is_empty() {
            return Err(ParseError::MissingHost);
        }

        let port = url.port().ok_or(ParseError::MissingPort)?;
        if port == 0 {
            return Err(ParseError::InvalidPort("0".to_string()));
        }

        // First value wins for duplicated keys.
        let mut params: HashMap<String, String> = HashMap::new();
        for (key, value) in url.query_pairs() {
            params
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }

        let network = lookup(&params, &["type", "network"]).unwrap_or(DEFAULT_NETWORK);
        let security = lookup(&params, &["security"]).unwrap_or(DEFAULT_SECURITY);
        let mode = lookup(&params, &["mode"]).unwrap_or(DEFAULT_MODE);

        Ok(ConnectionDescriptor {
            scheme: url.scheme().to_string(),
            identity,
            host,
            port,
            network: network.to_string(),
            security: security.to_string(),
            mode: mode.to_string(),
            params,
        })
    }
}

/// First non-empty value among the given keys.
fn lookup<'a>(params: &'a HashMap<String, String>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| params.get(*key))
        .map(String::as_str)
        .find(|value| !value.is_empty())
}

fn refine_url_error(uri: &str, err: url::ParseError) -> ParseError {
    match err {
        url::ParseError::EmptyHost => ParseError::MissingHost,
        url::ParseError::InvalidPort => {
            ParseError::InvalidPort(raw_port_text(uri).unwrap_or_default())
        }
        other => ParseError::MalformedUri(other),
    }
}

/// Recovers the literal port text from the authority, for error reporting.
fn raw_port_text(uri: &str) -> Option<String> {
    let (_, rest) = uri.split_once("://")?;
    let authority = rest
        .find(|c| matches!(c, '/' | '?' | '#'))
        .map_or(rest, |end| &rest[..end]);
    let hostport = authority
        .rsplit_once('@')
        .map_or(authority, |(_, hostport)| hostport);
    if hostport.starts_with('[') {
        let (_, tail) = hostport.split_once(']')?;
        tail.strip_prefix(':').map(str::to_string)
    } else {
        hostport
            .rsplit_once(':')
            .map(|(_, port)| port.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(uri: &str) -> Result<ConnectionDescriptor, ParseError> {
        VlessParser.parse(uri)
    }

    #[test]
    fn parses_full_reality_link() {
        let descriptor = parse(
            "vless://abc-123@example.com:443?pbk=PK1&sid=S1&sni=example.com&fp=chrome",
        )
        .unwrap();

        assert_eq!(descriptor.scheme, "vless");
        assert_eq!(descriptor.identity, "abc-123");
        assert_eq!(descriptor.host, "example.com");
        assert_eq!(descriptor.port, 443);
        assert_eq!(descriptor.network, "xhttp");
        assert_eq!(descriptor.security, "reality");
        assert_eq!(descriptor.mode, "auto");
        assert_eq!(descriptor.param("pbk"), "PK1");
        assert_eq!(descriptor.param("sid"), "S1");
        assert_eq!(descriptor.param("sni"), "example.com");
        assert_eq!(descriptor.param("fp"), "chrome");
    }

    #[test]
    fn defaults_apply_when_selectors_absent() {
        let descriptor = parse("vless://uuid@example.com:443").unwrap();
        assert_eq!(descriptor.network, "xhttp");
        assert_eq!(descriptor.security, "reality");
        assert_eq!(descriptor.mode, "auto");
    }

    #[test]
    fn network_falls_back_to_alternate_key() {
        let descriptor = parse("vless://uuid@example.com:443?network=grpc").unwrap();
        assert_eq!(descriptor.network, "grpc");

        let descriptor = parse("vless://uuid@example.com:443?type=ws&network=grpc").unwrap();
        assert_eq!(descriptor.network, "ws");
    }

    #[test]
    fn empty_selector_value_falls_through() {
        let descriptor = parse("vless://uuid@example.com:443?type=&security=").unwrap();
        assert_eq!(descriptor.network, "xhttp");
        assert_eq!(descriptor.security, "reality");
    }

    #[test]
    fn absent_params_read_as_empty() {
        let descriptor = parse("vless://uuid@example.com:443").unwrap();
        assert_eq!(descriptor.param("sni"), "");
        assert_eq!(descriptor.param("path"), "");
    }

    #[test]
    fn missing_identity() {
        assert!(matches!(
            parse("vless://@host:80"),
            Err(ParseError::MissingIdentity)
        ));
        assert!(matches!(
            parse("vless://host:80"),
            Err(ParseError::MissingIdentity)
        ));
    }

    #[test]
    fn missing_host() {
        assert!(matches!(
            parse("vless://uuid@:443"),
            Err(ParseError::MissingHost)
        ));
    }

    #[test]
    fn missing_port() {
        assert!(matches!(
            parse("vless://uuid@example.com"),
            Err(ParseError::MissingPort)
        ));
    }

    #[test]
    fn invalid_port_carries_raw_text() {
        match parse("vless://uuid@example.com:abc") {
            Err(ParseError::InvalidPort(raw)) => assert_eq!(raw, "abc"),
            other => panic!("expected InvalidPort, got {other:?}"),
        }
        match parse("vless://uuid@example.com:70000") {
            Err(ParseError::InvalidPort(raw)) => assert_eq!(raw, "70000"),
            other => panic!("expected InvalidPort, got {other:?}"),
        }
    }

    #[test]
    fn port_zero_is_invalid() {
        match parse("vless://uuid@example.com:0") {
            Err(ParseError::InvalidPort(raw)) => assert_eq!(raw, "0"),
            other => panic!("expected InvalidPort, got {other:?}"),
        }
    }

    #[test]
    fn ipv6_host_drops_brackets() {
        let descriptor = parse("vless://uuid@[::1]:443").unwrap();
        assert_eq!(descriptor.host, "::1");
        assert_eq!(descriptor.port, 443);

        let descriptor = parse("vless://uuid@[2001:db8::1]:8443").unwrap();
        assert_eq!(descriptor.host, "2001:db8::1");
    }

    #[test]
    fn identity_is_percent_decoded() {
        let descriptor = parse("vless://abc%2D123@example.com:443").unwrap();
        assert_eq!(descriptor.identity, "abc-123");
    }

    #[test]
    fn duplicated_query_key_keeps_first_value() {
        let descriptor = parse("vless://uuid@example.com:443?type=ws&type=grpc").unwrap();
        assert_eq!(descriptor.network, "ws");

        // An empty first value still falls through the selector chain.
        let descriptor = parse("vless://uuid@example.com:443?type=&type=grpc").unwrap();
        assert_eq!(descriptor.network, "xhttp");
    }

    #[test]
    fn raw_port_text_handles_shapes() {
        assert_eq!(
            raw_port_text("vless://uuid@example.com:abc?x=1"),
            Some("abc".to_string())
        );
        assert_eq!(
            raw_port_text("vless://uuid@[::1]:xyz"),
            Some("xyz".to_string())
        );
        assert_eq!(raw_port_text("vless://uuid@example.com"), None);
    }
}
