//! Xray configuration document schema.
//!
//! This module mirrors the JSON shape consumed by the Xray engine. Struct
//! field declaration order is the serialization order: the engine tolerates
//! any order, but diffs and tooling assume this canonical one, so fields
//! must not be reordered casually.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Root configuration document consumed by the Xray engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigDocument {
    /// Management API surface.
    pub api: Api,

    /// Local listeners, in priority order.
    pub inbounds: Vec<Inbound>,

    /// Engine log settings.
    pub log: Log,

    /// Egress paths. Order is fixed: proxy, DIRECT, BLACKHOLE.
    pub outbounds: Vec<Outbound>,

    /// Traffic-accounting policy.
    pub policy: Policy,

    /// Routing rules binding inbounds to outbound tags.
    pub routing: Routing,

    /// Stats placeholder; the engine only requires the key to exist.
    pub stats: BTreeMap<String, Value>,
}

/// Management API descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Api {
    pub services: Vec<String>,
    pub tag: String,
}

/// A local listener definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Inbound {
    pub listen: String,
    pub port: u16,
    pub protocol: String,
    pub settings: InboundSettings,
    pub sniffing: Sniffing,
    pub tag: String,
}

/// Protocol-specific inbound settings, one variant per inbound protocol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum InboundSettings {
    Socks(SocksInboundSettings),
}

/// Settings for a local socks listener.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SocksInboundSettings {
    pub auth: String,
    pub ip: String,
    pub udp: bool,
}

/// Traffic sniffing policy for an inbound.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sniffing {
    pub enabled: bool,
    pub dest_override: Vec<String>,
    pub route_only: bool,
}

/// Engine log settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Log {
    pub loglevel: String,
}

/// An egress path definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Outbound {
    pub protocol: String,
    pub settings: OutboundSettings,
    pub stream_settings: StreamSettings,
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_through: Option<String>,
}

/// Protocol-specific outbound settings, one variant per outbound shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum OutboundSettings {
    /// Upstream server list for proxy protocols.
    Vless(VlessOutboundSettings),
    /// Direct-egress policy.
    Freedom(FreedomOutboundSettings),
    /// Black-hole reply policy.
    Blackhole(BlackholeOutboundSettings),
}

/// Upstream servers of a VLESS outbound.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VlessOutboundSettings {
    pub vnext: Vec<VnextServer>,
}

/// One upstream server entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VnextServer {
    pub address: String,
    pub port: u16,
    pub users: Vec<VnextUser>,
}

/// A user credential on an upstream server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VnextUser {
    pub encryption: String,
    pub flow: String,
    pub id: String,
}

/// Direct-egress outbound settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FreedomOutboundSettings {
    pub domain_strategy: String,
    pub redirect: String,
}

/// Black-hole outbound settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlackholeOutboundSettings {
    pub response: BlackholeResponse,
}

/// Reply policy of the black-hole outbound.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlackholeResponse {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Transport layer settings of an outbound. Every section is optional;
/// DIRECT and BLACKHOLE carry an empty object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reality_settings: Option<RealitySettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xhttp_settings: Option<XhttpSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xtls_settings: Option<XtlsSettings>,
}

/// REALITY security layer settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RealitySettings {
    pub network: String,
    pub show: bool,
    pub fingerprint: String,
    pub allow_insecure: bool,
    pub public_key: String,
    pub short_id: String,
    pub spider_x: String,
    pub server_name: String,
    pub dest: String,
}

/// XHTTP transport-mode settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct XhttpSettings {
    pub path: String,
    pub host: String,
    pub mode: String,
}

/// XTLS settings carried on the proxy outbound.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct XtlsSettings {
    pub disable_system_root: bool,
}

/// Traffic-accounting policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Policy {
    pub system: BTreeMap<String, bool>,
}

/// Routing block: matcher, strategy, and the ordered rule list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Routing {
    pub domain_matcher: String,
    pub domain_strategy: String,
    pub rules: Vec<RouteRule>,
}

/// A routing rule; the engine dispatches on the `type` discriminant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RouteRule {
    Field(FieldRule),
}

/// A field-match rule. Empty match lists are omitted from the output.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldRule {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inbound_tag: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ip: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub domain: Vec<String>,
    pub outbound_tag: String,
}
