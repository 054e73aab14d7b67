//! Invoke-time URL guard
//!
//! Second line of defense behind the planner's pattern-based gate: parses
//! the URL, rejects non-HTTPS schemes and blocked hostnames, resolves the
//! host, and checks every resolved address against the blocked ranges. A
//! hostname that resolves to a private address is blocked even when its name
//! looks public.

use reqwest::Url;
use sdk::types::ToolError;
use std::net::IpAddr;
use tokio::net::lookup_host;

const BLOCKED_HOSTNAMES: &[&str] = &["localhost", "localhost.localdomain"];

/// Check whether an IP address falls in a blocked range: loopback, RFC 1918
/// private, link-local, unspecified, IPv6 unique-local.
pub fn is_ip_blocked(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.octets()[0] == 0
        }
        IpAddr::V6(v6) => {
            // fc00::/7 unique-local, fe80::/10 link-local
            v6.is_loopback()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

/// Validate a URL and resolve its host against the blocked ranges.
///
/// Returns the parsed URL when every resolved address is acceptable.
pub async fn resolve_and_validate(url: &str) -> Result<Url, ToolError> {
    let parsed = Url::parse(url).map_err(|e| ToolError::InvalidParameter {
        name: "url".to_string(),
        reason: e.to_string(),
    })?;

    if parsed.scheme() != "https" {
        return Err(ToolError::UrlBlocked(
            "Only HTTPS URLs are allowed".to_string(),
        ));
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| ToolError::UrlBlocked("Invalid URL: no hostname".to_string()))?;

    if BLOCKED_HOSTNAMES.contains(&host.to_ascii_lowercase().as_str()) {
        return Err(ToolError::UrlBlocked(format!("Blocked hostname: {}", host)));
    }

    // Literal addresses skip DNS
    if let Ok(ip) = host.trim_matches(['[', ']']).parse::<IpAddr>() {
        if is_ip_blocked(ip) {
            return Err(ToolError::UrlBlocked(format!("Blocked IP address: {}", ip)));
        }
        return Ok(parsed);
    }

    let port = parsed.port().unwrap_or(443);
    let addrs = lookup_host((host, port))
        .await
        .map_err(|e| ToolError::UrlBlocked(format!("DNS resolution failed: {}", e)))?;

    for addr in addrs {
        if is_ip_blocked(addr.ip()) {
            return Err(ToolError::UrlBlocked(format!(
                "Blocked IP address for hostname: {}",
                host
            )));
        }
    }

    Ok(parsed)
}
