//! Best-effort parser for nmap's human-readable (`-oN`) report format.
//!
//! The format varies between nmap versions and scan options, so total
//! failure on a malformed line would be more disruptive than partial loss:
//! unrecognized lines are skipped, and only an unreadable input file is an
//! error.

use std::fs;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use crate::error::{Error, Result};
use crate::model::{Host, PortKey, ScanInfo};

lazy_static! {
    /// "Nmap scan report for <hostname> (<ip>)", hostname optional.
    static ref HOST_RE: Regex =
        Regex::new(r"^Nmap scan report for (?:([\w\-. ]+)\s)?\(?((?:\d{1,3}\.){3}\d{1,3})\)?")
            .unwrap();
    /// "Nmap done: 256 IP addresses (3 hosts up) scanned in ..."
    static ref DONE_RE: Regex =
        Regex::new(r"Nmap done: (\d+) IP addresses \((\d+) hosts? up\)").unwrap();
    static ref FIELD_SPLIT_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// Read and parse one report file. Fails only if the file itself cannot
/// be read.
pub fn parse_file(path: &Path) -> Result<(Vec<Host>, ScanInfo)> {
    let text = fs::read_to_string(path).map_err(|source| Error::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_report(&text))
}

/// Parse report text into the scan model. Single left-to-right pass over
/// the lines; a host stays under construction until the next host marker
/// (or end of input) finalizes it, so the returned host count equals the
/// number of host markers seen, not the summary's `hosts_up`.
pub fn parse_report(text: &str) -> (Vec<Host>, ScanInfo) {
    let mut hosts = Vec::new();
    let mut info = ScanInfo::default();
    let mut current_host: Option<Host> = None;
    let mut in_ports_section = false;

    for raw in text.lines() {
        let line = raw.trim();

        if info.start_time.is_none() && line.starts_with("Starting Nmap") {
            if let Some((_, timestamp)) = line.rsplit_once(" at ") {
                info.start_time = Some(timestamp.to_string());
            }
        } else if let Some(caps) = DONE_RE.captures(line) {
            // Counts are digit-only captures, so the parses cannot fail.
            info.total_ips = caps[1].parse().unwrap_or(0);
            info.hosts_up = caps[2].parse().unwrap_or(0);
        }

        if let Some(caps) = HOST_RE.captures(line) {
            if let Some(finished) = current_host.take() {
                hosts.push(finished);
            }
            let hostname = caps
                .get(1)
                .map(|m| m.as_str().trim().to_string())
                .filter(|name| !name.is_empty());
            current_host = Some(Host::new(&caps[2], hostname));
            in_ports_section = false;
            continue;
        }

        let Some(host) = current_host.as_mut() else {
            continue;
        };

        if line.starts_with("PORT") && line.contains("STATE") && line.contains("SERVICE") {
            in_ports_section = true;
            continue;
        }

        if in_ports_section && (line.is_empty() || line.starts_with("Nmap scan")) {
            in_ports_section = false;
        }

        if in_ports_section && !line.is_empty() {
            if let Some((key, state)) = parse_port_row(line) {
                host.ports.insert(key, state);
            } else {
                trace!(line, "skipping unrecognized port-section line");
            }
        }
    }

    if let Some(finished) = current_host {
        hosts.push(finished);
    }

    (hosts, info)
}

/// One row of the port table, e.g. `22/tcp   open   ssh OpenSSH 8.9`.
/// Footer lines ("Not shown: ...", "All 1000 scanned ports ...") and rows
/// without a `port/protocol` first token are rejected.
fn parse_port_row(line: &str) -> Option<(PortKey, String)> {
    if line.starts_with("Not shown:") || line.starts_with("All ") {
        return None;
    }

    let fields: Vec<&str> = FIELD_SPLIT_RE.splitn(line, 3).collect();
    if fields.len() < 2 {
        return None;
    }

    let (port, protocol) = fields[0].split_once('/')?;
    let state = fields[1].to_lowercase();
    let service = fields
        .get(2)
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap_or("unknown");

    Some((PortKey::new(port, protocol, service), state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::canonical_port_keys;

    fn key(port: &str, proto: &str, service: &str) -> PortKey {
        PortKey::new(port, proto, service)
    }

    #[test]
    fn input_without_host_markers_yields_empty_model() {
        let (hosts, info) = parse_report("nothing to see\njust noise\n");
        assert!(hosts.is_empty());
        assert_eq!(info, ScanInfo::default());
    }

    #[test]
    fn start_line_sets_timestamp_once() {
        let text = "Starting Nmap 7.94 ( https://nmap.org ) at 2025-03-03 10:00 MSK\n\
                    Starting Nmap 7.94 ( https://nmap.org ) at 2025-03-03 11:00 MSK\n";
        let (_, info) = parse_report(text);
        assert_eq!(info.start_time.as_deref(), Some("2025-03-03 10:00 MSK"));
    }

    #[test]
    fn done_line_sets_counts() {
        let text = "Nmap done: 256 IP addresses (3 hosts up) scanned in 12.41 seconds\n";
        let (_, info) = parse_report(text);
        assert_eq!(info.total_ips, 256);
        assert_eq!(info.hosts_up, 3);
    }

    #[test]
    fn done_line_singular_host_up() {
        let text = "Nmap done: 1 IP addresses (1 host up) scanned in 0.5 seconds\n";
        let (_, info) = parse_report(text);
        assert_eq!(info.total_ips, 1);
        assert_eq!(info.hosts_up, 1);
    }

    #[test]
    fn bare_ip_host_with_one_port_row() {
        let text = "Nmap scan report for (10.0.0.5)\n\
                    PORT   STATE SERVICE\n\
                    22/tcp   open   ssh\n";
        let (hosts, _) = parse_report(text);
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].ip, "10.0.0.5");
        assert_eq!(hosts[0].hostname, None);
        assert_eq!(
            hosts[0].ports.get(&key("22", "tcp", "ssh")).map(String::as_str),
            Some("open")
        );
    }

    #[test]
    fn hostname_is_captured_and_trimmed() {
        let text = "Nmap scan report for router.local (192.168.1.1)\n";
        let (hosts, _) = parse_report(text);
        assert_eq!(hosts[0].ip, "192.168.1.1");
        assert_eq!(hosts[0].hostname.as_deref(), Some("router.local"));
    }

    #[test]
    fn second_host_marker_finalizes_previous_host() {
        let text = "Nmap scan report for (10.0.0.1)\n\
                    PORT   STATE SERVICE\n\
                    80/tcp open  http\n\
                    Nmap scan report for (10.0.0.2)\n\
                    PORT   STATE SERVICE\n\
                    443/tcp open  https\n";
        let (hosts, _) = parse_report(text);
        assert_eq!(hosts.len(), 2);
        assert!(hosts[0].ports.contains_key(&key("80", "tcp", "http")));
        assert!(!hosts[0].ports.contains_key(&key("443", "tcp", "https")));
        assert!(hosts[1].ports.contains_key(&key("443", "tcp", "https")));
    }

    #[test]
    fn host_count_follows_markers_not_summary() {
        let text = "Nmap scan report for (10.0.0.1)\n\
                    Nmap scan report for (10.0.0.2)\n\
                    Nmap done: 256 IP addresses (5 hosts up) scanned in 9.01 seconds\n";
        let (hosts, info) = parse_report(text);
        assert_eq!(hosts.len(), 2);
        assert_eq!(info.hosts_up, 5);
    }

    #[test]
    fn blank_line_closes_ports_section() {
        let text = "Nmap scan report for (10.0.0.1)\n\
                    PORT   STATE SERVICE\n\
                    80/tcp open  http\n\
                    \n\
                    53/udp open  domain\n";
        let (hosts, _) = parse_report(text);
        // The row after the blank line is outside the section and dropped.
        assert_eq!(hosts[0].ports.len(), 1);
    }

    #[test]
    fn rows_before_header_are_ignored() {
        let text = "Nmap scan report for (10.0.0.1)\n\
                    Host is up (0.0010s latency).\n\
                    80/tcp open  http\n";
        let (hosts, _) = parse_report(text);
        assert!(hosts[0].ports.is_empty());
    }

    #[test]
    fn footer_lines_are_skipped() {
        let text = "Nmap scan report for (10.0.0.1)\n\
                    PORT   STATE SERVICE\n\
                    Not shown: 998 closed tcp ports (conn-refused)\n\
                    All 1000 scanned ports on 10.0.0.1 are in ignored states.\n\
                    80/tcp open  http\n";
        let (hosts, _) = parse_report(text);
        assert_eq!(hosts[0].ports.len(), 1);
    }

    #[test]
    fn individually_filtered_rows_are_kept() {
        let text = "Nmap scan report for (10.0.0.1)\n\
                    PORT     STATE    SERVICE\n\
                    135/tcp  filtered msrpc\n";
        let (hosts, _) = parse_report(text);
        assert_eq!(
            hosts[0]
                .ports
                .get(&key("135", "tcp", "msrpc"))
                .map(String::as_str),
            Some("filtered")
        );
    }

    #[test]
    fn missing_service_defaults_to_unknown() {
        let text = "Nmap scan report for (10.0.0.1)\n\
                    PORT   STATE SERVICE\n\
                    8081/tcp open\n";
        let (hosts, _) = parse_report(text);
        assert!(hosts[0].ports.contains_key(&key("8081", "tcp", "unknown")));
    }

    #[test]
    fn service_is_first_word_of_remainder() {
        let text = "Nmap scan report for (10.0.0.1)\n\
                    PORT   STATE SERVICE VERSION\n\
                    22/tcp open  ssh OpenSSH 8.9p1 Ubuntu\n";
        let (hosts, _) = parse_report(text);
        assert!(hosts[0].ports.contains_key(&key("22", "tcp", "ssh")));
    }

    #[test]
    fn row_without_slash_is_skipped() {
        let text = "Nmap scan report for (10.0.0.1)\n\
                    PORT   STATE SERVICE\n\
                    Device type: general purpose\n";
        let (hosts, _) = parse_report(text);
        assert!(hosts[0].ports.is_empty());
    }

    #[test]
    fn duplicate_key_overwrites_state() {
        let text = "Nmap scan report for (10.0.0.1)\n\
                    PORT   STATE SERVICE\n\
                    80/tcp closed http\n\
                    80/tcp open   http\n";
        let (hosts, _) = parse_report(text);
        assert_eq!(hosts[0].ports.len(), 1);
        assert_eq!(
            hosts[0].ports.get(&key("80", "tcp", "http")).map(String::as_str),
            Some("open")
        );
    }

    #[test]
    fn states_are_lowercased() {
        let text = "Nmap scan report for (10.0.0.1)\n\
                    PORT   STATE SERVICE\n\
                    80/tcp OPEN  http\n";
        let (hosts, _) = parse_report(text);
        assert_eq!(
            hosts[0].ports.get(&key("80", "tcp", "http")).map(String::as_str),
            Some("open")
        );
    }

    #[test]
    fn full_report_round_trip() {
        let text = "\
Starting Nmap 7.94 ( https://nmap.org ) at 2025-03-03 10:00 MSK
Nmap scan report for gateway (192.168.1.1)
Host is up (0.0010s latency).
PORT    STATE  SERVICE
22/tcp  open   ssh
80/tcp  open   http

Nmap scan report for (192.168.1.7)
Host is up (0.0042s latency).
PORT    STATE  SERVICE
443/tcp closed https

Nmap done: 256 IP addresses (2 hosts up) scanned in 14.2 seconds
";
        let (hosts, info) = parse_report(text);
        assert_eq!(hosts.len(), 2);
        assert_eq!(info.start_time.as_deref(), Some("2025-03-03 10:00 MSK"));
        assert_eq!((info.total_ips, info.hosts_up), (256, 2));
        assert_eq!(
            canonical_port_keys(&hosts),
            vec![
                key("22", "tcp", "ssh"),
                key("80", "tcp", "http"),
                key("443", "tcp", "https"),
            ]
        );
    }

    #[test]
    fn unreadable_file_is_a_file_access_error() {
        let err = parse_file(Path::new("/nonexistent/scan.txt")).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }
}
