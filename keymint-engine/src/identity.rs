//! Client identity (HWID) resolution.
//!
//! Resolution order, first present wins:
//! 1. explicit `hwid` query parameter
//! 2. explicit `x-hwid` request header
//! 3. fallback computed from the declared user-agent and network address
//!
//! The fallback is a weak identity, not a hardware fingerprint: it changes
//! whenever either signal changes (browser update, NAT rotation), so it
//! only approximates "same client" for callers that declare nothing.

/// Resolves the client identity from the request's signals.
///
/// Empty query or header values are treated as absent, matching clients
/// that send `?hwid=` with no value.
#[must_use]
pub fn resolve_hwid(
    query: Option<&str>,
    header: Option<&str>,
    user_agent: &str,
    remote_addr: &str,
) -> String {
    if let Some(hwid) = query.filter(|s| !s.is_empty()) {
        return hwid.to_string();
    }
    if let Some(hwid) = header.filter(|s| !s.is_empty()) {
        return hwid.to_string();
    }
    fallback_identity(user_agent, remote_addr)
}

/// Weak fallback identity: user-agent and network address concatenated.
#[must_use]
pub fn fallback_identity(user_agent: &str, remote_addr: &str) -> String {
    format!("{user_agent}_{remote_addr}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_wins_over_header_and_fallback() {
        let hwid = resolve_hwid(Some("q-hwid"), Some("h-hwid"), "ua", "1.2.3.4");
        assert_eq!(hwid, "q-hwid");
    }

    #[test]
    fn header_wins_over_fallback() {
        let hwid = resolve_hwid(None, Some("h-hwid"), "ua", "1.2.3.4");
        assert_eq!(hwid, "h-hwid");
    }

    #[test]
    fn empty_values_are_treated_as_absent() {
        let hwid = resolve_hwid(Some(""), Some(""), "ua", "1.2.3.4");
        assert_eq!(hwid, "ua_1.2.3.4");
    }

    #[test]
    fn fallback_is_pure_in_both_signals() {
        assert_eq!(fallback_identity("ua", "addr"), "ua_addr");
        assert_ne!(
            fallback_identity("ua-v2", "addr"),
            fallback_identity("ua", "addr")
        );
        assert_ne!(
            fallback_identity("ua", "addr-2"),
            fallback_identity("ua", "addr")
        );
    }
}
