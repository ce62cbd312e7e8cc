//! Scan invocation adapter: runs nmap as a blocking child process with a
//! configured argument template, writing its normal-output report to a
//! file for the parser to consume afterwards.

use std::net::UdpSocket;
use std::path::Path;
use std::process::Command;

use chrono::Local;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};

/// Run one scan of `target` with the named profile, capturing the report
/// to `output_file`. The child runs to completion before this returns;
/// nonzero exit or a launch failure aborts the run.
pub fn run_scan(target: &str, profile: &str, output_file: &Path, config: &Config) -> Result<()> {
    let template = config
        .profiles
        .get(profile)
        .ok_or_else(|| Error::UnknownProfile(profile.to_string()))?;

    let mut command = Command::new(&config.nmap_path);
    command
        .args(template)
        .arg("-oN")
        .arg(output_file)
        .arg(target);

    info!(profile, target, "running {:?}", command);

    let output = command.output().map_err(|err| {
        Error::ScanInvocation(format!(
            "could not launch '{}': {err}",
            config.nmap_path.display()
        ))
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::ScanInvocation(format!(
            "nmap exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    debug!(path = %output_file.display(), "scan capture written");
    Ok(())
}

/// Capture file name for one profile run, timestamped so repeated runs
/// never clobber each other.
pub fn capture_file_name(profile: &str) -> String {
    format!(
        "nmap_scan_{}_{}.txt",
        profile,
        Local::now().format("%Y%m%d-%H%M%S")
    )
}

/// Address of the issuing host, discovered via a connected UDP socket.
/// No packet is sent; the OS just picks the outbound interface.
pub fn local_ip() -> Option<String> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    Some(socket.local_addr().ok()?.ip().to_string())
}
