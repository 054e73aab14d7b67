//! Plan security gate
//!
//! Stateless validation applied to every plan regardless of its source: tool
//! allowlist membership, network-destination policy, and the step-count
//! bound. The LLM planner runs all of these over the parsed structure, so a
//! plan's own claims about safety are irrelevant — every gate is re-derived
//! programmatically here.
//!
//! The URL policy is pattern-based (it never resolves hostnames). The tool
//! layer applies a second, resolution-based guard at invocation time.

use regex::Regex;
use sdk::types::ToolId;
use std::fmt;
use std::sync::LazyLock;

/// Destinations a plan is never allowed to target: loopback, RFC 1918
/// ranges, link-local, unspecified, and their IPv6 equivalents.
static PRIVATE_DESTINATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^https?://127\.",
        r"^https?://localhost",
        r"^https?://192\.168\.",
        r"^https?://10\.",
        r"^https?://172\.(1[6-9]|2[0-9]|3[0-1])\.",
        r"^https?://169\.254\.",
        r"^https?://0\.0\.0\.0",
        r"^https?://\[::1\]",
        r"^https?://\[f[cd]",
        r"^https?://\[fe80",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){}", p)).expect("static pattern compiles"))
    .collect()
});

/// Why a URL failed the network-destination policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlPolicyViolation {
    /// Scheme is not `https`
    NotHttps,

    /// Destination matches a private/loopback/link-local pattern
    PrivateDestination,
}

impl fmt::Display for UrlPolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlPolicyViolation::NotHttps => write!(f, "URL must use the https scheme"),
            UrlPolicyViolation::PrivateDestination => {
                write!(f, "URL targets a private or local network")
            }
        }
    }
}

/// Check a URL against the network-destination policy.
pub fn check_url(url: &str) -> Result<(), UrlPolicyViolation> {
    if !url.to_ascii_lowercase().starts_with("https://") {
        return Err(UrlPolicyViolation::NotHttps);
    }

    for pattern in PRIVATE_DESTINATION_PATTERNS.iter() {
        if pattern.is_match(url) {
            return Err(UrlPolicyViolation::PrivateDestination);
        }
    }

    Ok(())
}

/// Check tool allowlist membership.
pub fn is_tool_allowed(tool: ToolId, allowed_tools: &[ToolId]) -> bool {
    allowed_tools.contains(&tool)
}

/// Check the step-count bound.
pub fn step_count_ok(count: usize, max_steps: usize) -> bool {
    count <= max_steps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_https_url_passes() {
        assert!(check_url("https://example.com/page").is_ok());
        assert!(check_url("https://docs.rs/regex/latest").is_ok());
    }

    #[test]
    fn test_http_scheme_rejected() {
        assert_eq!(
            check_url("http://example.com"),
            Err(UrlPolicyViolation::NotHttps)
        );
        assert_eq!(check_url("file:///etc/passwd"), Err(UrlPolicyViolation::NotHttps));
        assert_eq!(check_url("ftp://example.com"), Err(UrlPolicyViolation::NotHttps));
    }

    #[test]
    fn test_scheme_check_is_case_insensitive() {
        assert!(check_url("HTTPS://example.com").is_ok());
    }

    #[test]
    fn test_loopback_rejected() {
        assert_eq!(
            check_url("https://127.0.0.1/admin"),
            Err(UrlPolicyViolation::PrivateDestination)
        );
        assert_eq!(
            check_url("https://localhost:8080/"),
            Err(UrlPolicyViolation::PrivateDestination)
        );
        assert_eq!(
            check_url("https://[::1]/"),
            Err(UrlPolicyViolation::PrivateDestination)
        );
    }

    #[test]
    fn test_private_ranges_rejected() {
        assert_eq!(
            check_url("https://192.168.1.1/x"),
            Err(UrlPolicyViolation::PrivateDestination)
        );
        assert_eq!(
            check_url("https://10.0.0.5/"),
            Err(UrlPolicyViolation::PrivateDestination)
        );
        assert_eq!(
            check_url("https://172.16.0.1/"),
            Err(UrlPolicyViolation::PrivateDestination)
        );
        assert_eq!(
            check_url("https://172.31.255.255/"),
            Err(UrlPolicyViolation::PrivateDestination)
        );
        assert_eq!(
            check_url("https://169.254.169.254/latest/meta-data"),
            Err(UrlPolicyViolation::PrivateDestination)
        );
        assert_eq!(
            check_url("https://0.0.0.0/"),
            Err(UrlPolicyViolation::PrivateDestination)
        );
    }

    #[test]
    fn test_172_public_range_allowed() {
        // 172.15.* and 172.32.* are outside the 172.16.0.0/12 private block
        assert!(check_url("https://172.15.0.1/").is_ok());
        assert!(check_url("https://172.32.0.1/").is_ok());
    }

    #[test]
    fn test_ipv6_private_rejected() {
        assert_eq!(
            check_url("https://[fc00::1]/"),
            Err(UrlPolicyViolation::PrivateDestination)
        );
        assert_eq!(
            check_url("https://[fd12:3456::1]/"),
            Err(UrlPolicyViolation::PrivateDestination)
        );
        assert_eq!(
            check_url("https://[fe80::1]/"),
            Err(UrlPolicyViolation::PrivateDestination)
        );
    }

    #[test]
    fn test_allowlist_membership() {
        let allowed = vec![ToolId::Echo, ToolId::WebSearch];
        assert!(is_tool_allowed(ToolId::Echo, &allowed));
        assert!(!is_tool_allowed(ToolId::HttpFetch, &allowed));
    }

    #[test]
    fn test_step_count_bound() {
        assert!(step_count_ok(3, 3));
        assert!(step_count_ok(0, 3));
        assert!(!step_count_ok(4, 3));
    }
}
