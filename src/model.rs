//! In-memory model of one parsed nmap run: scan-level metadata, the hosts
//! that were reported, and the port observations recorded against them.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Fill-in state for a host that has no observation for a given port key.
pub const UNDEFINED_STATE: &str = "undefined";

/// Scan-level metadata recovered from the report header and footer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanInfo {
    pub start_time: Option<String>,
    pub source_host: Option<String>,
    pub command: Option<String>,
    pub total_ips: u64,
    pub hosts_up: u64,
}

impl ScanInfo {
    /// Merge counts parsed from a report file into metadata seeded by a
    /// live scan run. Only the file-authoritative fields are overwritten;
    /// `command` and `source_host` stay with the driving context.
    pub fn merge_counts(&mut self, parsed: &ScanInfo) {
        self.start_time = parsed.start_time.clone();
        self.total_ips = parsed.total_ips;
        self.hosts_up = parsed.hosts_up;
    }
}

/// One scanned endpoint and its port observations. States are free-text,
/// lowercased; nmap vocabulary like "open|filtered" passes through as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub ip: String,
    pub hostname: Option<String>,
    pub ports: HashMap<PortKey, String>,
}

impl Host {
    pub fn new(ip: impl Into<String>, hostname: Option<String>) -> Self {
        Self {
            ip: ip.into(),
            hostname,
            ports: HashMap::new(),
        }
    }

    /// State recorded for `key`, or the undefined fill-in.
    pub fn state_for(&self, key: &PortKey) -> &str {
        self.ports.get(key).map(String::as_str).unwrap_or(UNDEFINED_STATE)
    }
}

/// Identity of one report column: port, protocol and detected service.
/// The service name is part of the key, so the same port/protocol with a
/// different service is a distinct column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortKey {
    pub port: String,
    pub protocol: String,
    pub service: String,
}

impl PortKey {
    pub fn new(
        port: impl Into<String>,
        protocol: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            port: port.into(),
            protocol: protocol.into(),
            service: service.into(),
        }
    }

    /// Port number for ordering purposes; non-numeric ports sort as 0.
    fn port_number(&self) -> u64 {
        self.port.parse().unwrap_or(0)
    }

    /// `port/protocol` label used by the transposed view header.
    pub fn port_proto_label(&self) -> String {
        format!("{}/{}", self.port, self.protocol)
    }
}

impl Ord for PortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.port_number()
            .cmp(&other.port_number())
            .then_with(|| self.protocol.cmp(&other.protocol))
            .then_with(|| self.service.cmp(&other.service))
    }
}

impl PartialOrd for PortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Union of all port keys observed across `hosts`, deduplicated and in
/// canonical order. Both report views share this as their fixed template.
pub fn canonical_port_keys(hosts: &[Host]) -> Vec<PortKey> {
    let mut keys: Vec<PortKey> = hosts
        .iter()
        .flat_map(|host| host.ports.keys().cloned())
        .collect();
    keys.sort();
    keys.dedup();
    keys
}
