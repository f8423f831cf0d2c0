//! Configuration document construction.
//!
//! # Responsibilities
//! - Emit the fixed management sections (api, log, policy, routing, stats)
//! - Derive the proxy outbound from a parsed descriptor
//! - Emit the local socks inbound with the caller's port override
//!
//! # Design Decisions
//! - Total function: all fallible validation happens in the link parser
//! - Deterministic: identical descriptor + port yields a byte-identical
//!   serialized document
//! - Engine-variant decisions (allowInsecure, show, encryption) are named
//!   constants so another variant can override them deliberately

use std::collections::BTreeMap;

use crate::config::schema::{
    Api, BlackholeOutboundSettings, BlackholeResponse, ConfigDocument, FieldRule,
    FreedomOutboundSettings, Inbound, InboundSettings, Log, Outbound, OutboundSettings, Policy,
    RealitySettings, RouteRule, Routing, Sniffing, SocksInboundSettings, StreamSettings,
    VlessOutboundSettings, VnextServer, VnextUser, XhttpSettings, XtlsSettings,
};
use crate::link::ConnectionDescriptor;

/// Tag of the proxy outbound; routing rules reference outbounds by tag.
pub const PROXY_TAG: &str = "proxy";
/// Tag of the direct-egress outbound.
pub const DIRECT_TAG: &str = "DIRECT";
/// Tag of the black-hole outbound.
pub const BLACKHOLE_TAG: &str = "BLACKHOLE";

/// Local socks port used when the CLI gives no override.
pub const DEFAULT_SOCKS_PORT: u16 = 10808;

const API_TAG: &str = "xray-cli_API";
const API_SERVICES: [&str; 4] = [
    "ReflectionService",
    "HandlerService",
    "LoggerService",
    "StatsService",
];
const LOG_LEVEL: &str = "warning";

const INBOUND_LISTEN: &str = "127.0.0.1";
const SOCKS_TAG: &str = "socks";
const SOCKS_AUTH: &str = "noauth";
const SNIFF_OVERRIDES: [&str; 3] = ["http", "tls", "quic"];

// Engine-variant decisions, not user-configurable here.
const USER_ENCRYPTION: &str = "none";
const REALITY_ALLOW_INSECURE: bool = true;
const REALITY_SHOW: bool = false;
const REALITY_DEST_PORT: u16 = 443;
const SEND_THROUGH: &str = "0.0.0.0";

const DOMAIN_MATCHER: &str = "mph";
const DOMAIN_STRATEGY: &str = "AsIs";
const API_ROUTE_INBOUND: &str = "XRayGUI_API_inBOUND";
const API_ROUTE_OUTBOUND: &str = "XRayGUI_API";
const GEOIP_PRIVATE: &str = "geoip:private";
const GEOIP_DIRECT_REGION: &str = "geoip:by";
const DIRECT_REGION_DOMAIN: &str = "by";

const STATS_FLAGS: [&str; 4] = [
    "statsInboundDownlink",
    "statsInboundUplink",
    "statsOutboundDownlink",
    "statsOutboundUplink",
];

/// Builds the full configuration document for a parsed link.
pub fn build(descriptor: &ConnectionDescriptor, socks_port: u16) -> ConfigDocument {
    ConfigDocument {
        api: Api {
            services: strings(&API_SERVICES),
            tag: API_TAG.to_string(),
        },
        inbounds: vec![socks_inbound(socks_port)],
        log: Log {
            loglevel: LOG_LEVEL.to_string(),
        },
        outbounds: vec![
            proxy_outbound(descriptor),
            direct_outbound(),
            blackhole_outbound(),
        ],
        policy: Policy {
            system: STATS_FLAGS.iter().map(|flag| (flag.to_string(), true)).collect(),
        },
        routing: Routing {
            domain_matcher: DOMAIN_MATCHER.to_string(),
            domain_strategy: DOMAIN_STRATEGY.to_string(),
            rules: routing_rules(),
        },
        stats: BTreeMap::new(),
    }
}

fn socks_inbound(port: u16) -> Inbound {
    Inbound {
        listen: INBOUND_LISTEN.to_string(),
        port,
        protocol: "socks".to_string(),
        settings: InboundSettings::Socks(SocksInboundSettings {
            auth: SOCKS_AUTH.to_string(),
            ip: INBOUND_LISTEN.to_string(),
            udp: true,
        }),
        sniffing: Sniffing {
            enabled: true,
            dest_override: strings(&SNIFF_OVERRIDES),
            route_only: true,
        },
        tag: SOCKS_TAG.to_string(),
    }
}

fn proxy_outbound(descriptor: &ConnectionDescriptor) -> Outbound {
    let sni = descriptor.param("sni");
    Outbound {
        protocol: descriptor.scheme.clone(),
        settings: OutboundSettings::Vless(VlessOutboundSettings {
            vnext: vec![VnextServer {
                address: descriptor.host.clone(),
                port: descriptor.port,
                users: vec![VnextUser {
                    encryption: USER_ENCRYPTION.to_string(),
                    flow: String::new(),
                    id: descriptor.identity.clone(),
                }],
            }],
        }),
        stream_settings: StreamSettings {
            network: Some(descriptor.network.clone()),
            security: Some(descriptor.security.clone()),
            reality_settings: Some(RealitySettings {
                network: descriptor.network.clone(),
                show: REALITY_SHOW,
                fingerprint: descriptor.param("fp").to_string(),
                allow_insecure: REALITY_ALLOW_INSECURE,
                public_key: descriptor.param("pbk").to_string(),
                short_id: descriptor.param("sid").to_string(),
                spider_x: descriptor.param("spx").to_string(),
                server_name: sni.to_string(),
                // Destination is coupled to the server name in this variant.
                dest: format!("{sni}:{REALITY_DEST_PORT}"),
            }),
            xhttp_settings: Some(XhttpSettings {
                path: descriptor.param("path").to_string(),
                host: descriptor.param("host").to_string(),
                mode: descriptor.mode.clone(),
            }),
            xtls_settings: Some(XtlsSettings {
                disable_system_root: false,
            }),
        },
        tag: PROXY_TAG.to_string(),
        send_through: None,
    }
}

fn direct_outbound() -> Outbound {
    Outbound {
        protocol: "freedom".to_string(),
        settings: OutboundSettings::Freedom(FreedomOutboundSettings {
            domain_strategy: DOMAIN_STRATEGY.to_string(),
            redirect: ":0".to_string(),
        }),
        stream_settings: StreamSettings::default(),
        tag: DIRECT_TAG.to_string(),
        send_through: Some(SEND_THROUGH.to_string()),
    }
}

fn blackhole_outbound() -> Outbound {
    Outbound {
        protocol: "blackhole".to_string(),
        settings: OutboundSettings::Blackhole(BlackholeOutboundSettings {
            response: BlackholeResponse {
                kind: "none".to_string(),
            },
        }),
        stream_settings: StreamSettings::default(),
        tag: BLACKHOLE_TAG.to_string(),
        send_through: Some(SEND_THROUGH.to_string()),
    }
}

fn routing_rules() -> Vec<RouteRule> {
    vec![
        RouteRule::Field(FieldRule {
            inbound_tag: vec![API_ROUTE_INBOUND.to_string()],
            outbound_tag: API_ROUTE_OUTBOUND.to_string(),
            ..Default::default()
        }),
        RouteRule::Field(FieldRule {
            ip: vec![GEOIP_PRIVATE.to_string()],
            outbound_tag: DIRECT_TAG.to_string(),
            ..Default::default()
        }),
        RouteRule::Field(FieldRule {
            ip: vec![GEOIP_DIRECT_REGION.to_string()],
            outbound_tag: DIRECT_TAG.to_string(),
            ..Default::default()
        }),
        RouteRule::Field(FieldRule {
            domain: vec![DIRECT_REGION_DOMAIN.to_string()],
            outbound_tag: DIRECT_TAG.to_string(),
            ..Default::default()
        }),
    ]
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::LinkRegistry;

    fn descriptor(link: &str) -> ConnectionDescriptor {
        LinkRegistry::with_builtin_parsers().parse(link).unwrap()
    }

    #[test]
    fn outbound_order_and_tags_are_fixed() {
        let document = build(&descriptor("vless://uuid@example.com:443"), 1080);
        let tags: Vec<&str> = document
            .outbounds
            .iter()
            .map(|outbound| outbound.tag.as_str())
            .collect();
        assert_eq!(tags, vec![PROXY_TAG, DIRECT_TAG, BLACKHOLE_TAG]);
    }

    #[test]
    fn inbound_uses_port_override() {
        let document = build(&descriptor("vless://uuid@example.com:443"), 1080);
        assert_eq!(document.inbounds.len(), 1);
        assert_eq!(document.inbounds[0].port, 1080);
        assert_eq!(document.inbounds[0].listen, "127.0.0.1");
        assert_eq!(document.inbounds[0].protocol, "socks");
    }

    #[test]
    fn proxy_outbound_carries_upstream_entry() {
        let document = build(
            &descriptor("vless://abc-123@example.com:443?sni=example.com"),
            1080,
        );
        let proxy = &document.outbounds[0];
        assert_eq!(proxy.protocol, "vless");

        let OutboundSettings::Vless(settings) = &proxy.settings else {
            panic!("expected vless settings");
        };
        assert_eq!(settings.vnext.len(), 1);
        assert_eq!(settings.vnext[0].address, "example.com");
        assert_eq!(settings.vnext[0].port, 443);
        assert_eq!(settings.vnext[0].users.len(), 1);
        assert_eq!(settings.vnext[0].users[0].id, "abc-123");
        assert_eq!(settings.vnext[0].users[0].encryption, "none");
        assert_eq!(settings.vnext[0].users[0].flow, "");
    }

    #[test]
    fn ipv6_upstream_address_is_bare() {
        let document = build(&descriptor("vless://uuid@[::1]:443"), 1080);
        let OutboundSettings::Vless(settings) = &document.outbounds[0].settings else {
            panic!("expected vless settings");
        };
        assert_eq!(settings.vnext[0].address, "::1");
    }

    #[test]
    fn reality_dest_joins_sni_with_443() {
        let document = build(
            &descriptor("vless://uuid@example.com:443?sni=cdn.example.net"),
            1080,
        );
        let reality = document.outbounds[0]
            .stream_settings
            .reality_settings
            .as_ref()
            .unwrap();
        assert_eq!(reality.server_name, "cdn.example.net");
        assert_eq!(reality.dest, "cdn.example.net:443");
        assert!(reality.allow_insecure);
        assert!(!reality.show);
    }

    #[test]
    fn reality_dest_with_empty_sni() {
        let document = build(&descriptor("vless://uuid@example.com:443"), 1080);
        let reality = document.outbounds[0]
            .stream_settings
            .reality_settings
            .as_ref()
            .unwrap();
        assert_eq!(reality.dest, ":443");
    }

    #[test]
    fn xhttp_settings_carry_descriptor_values() {
        let document = build(
            &descriptor("vless://uuid@example.com:443?path=/ws&host=h.example&mode=packet-up"),
            1080,
        );
        let xhttp = document.outbounds[0]
            .stream_settings
            .xhttp_settings
            .as_ref()
            .unwrap();
        assert_eq!(xhttp.path, "/ws");
        assert_eq!(xhttp.host, "h.example");
        assert_eq!(xhttp.mode, "packet-up");
    }

    #[test]
    fn routing_has_four_fixed_rules() {
        let document = build(&descriptor("vless://uuid@example.com:443"), 1080);
        assert_eq!(document.routing.domain_matcher, "mph");
        assert_eq!(document.routing.domain_strategy, "AsIs");
        assert_eq!(document.routing.rules.len(), 4);

        let RouteRule::Field(first) = &document.routing.rules[0];
        assert_eq!(first.inbound_tag, vec!["XRayGUI_API_inBOUND"]);
        assert_eq!(first.outbound_tag, "XRayGUI_API");

        let RouteRule::Field(last) = &document.routing.rules[3];
        assert_eq!(last.domain, vec!["by"]);
        assert_eq!(last.outbound_tag, DIRECT_TAG);
    }

    #[test]
    fn policy_flags_all_true() {
        let document = build(&descriptor("vless://uuid@example.com:443"), 1080);
        assert_eq!(document.policy.system.len(), 4);
        assert!(document.policy.system.values().all(|flag| *flag));
    }
}
