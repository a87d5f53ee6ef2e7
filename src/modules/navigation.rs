// Pure navigation logic - no Tauri imports allowed.
// This module contains address-bar parsing helpers that can be unit tested.

use std::net::Ipv4Addr;

use crate::settings::SearchEngine;

/// Pseudo-URL of the new-tab / home surface. Never handed to a content view.
pub const HOME_URL: &str = "mix://home";

const INTERNAL_SCHEME: &str = "mix://";

pub fn is_internal_url(url: &str) -> bool {
    url.starts_with(INTERNAL_SCHEME)
}

/// Logic for turning address-bar input into a navigable URL.
///
/// PRIVACY NOTICE:
/// This function performs purely local string manipulation and heuristics.
/// It does NOT resolve DNS or contact a suggestion service; the only request
/// happens once the caller commits the returned URL to a view.
///
/// Returns `None` for blank input.
pub fn resolve_input(input: &str, engine: SearchEngine) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    // 1. Explicit scheme: taken verbatim
    if ["http://", "https://", INTERNAL_SCHEME]
        .iter()
        .any(|scheme| trimmed.starts_with(scheme))
    {
        return Some(trimmed.to_string());
    }

    // 2. Domain, localhost or IPv4 (optional port and path) -> https
    if looks_like_address(trimmed) {
        return Some(format!("https://{}", trimmed));
    }

    // 3. Fallback to configured Search Engine
    Some(engine.query_url(trimmed))
}

fn looks_like_address(input: &str) -> bool {
    let authority = input.split('/').next().unwrap_or_default();
    if authority.is_empty() || authority.chars().any(char::is_whitespace) {
        return false;
    }

    let host = match authority.split_once(':') {
        Some((host, port)) => {
            if port.is_empty() || !port.chars().all(|c| c.is_ascii_digit()) {
                return false;
            }
            host
        }
        None => authority,
    };

    host == "localhost" || host.parse::<Ipv4Addr>().is_ok() || is_domain(host)
}

fn is_domain(host: &str) -> bool {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let (tld, rest) = match labels.split_last() {
        Some(parts) => parts,
        None => return false,
    };
    let tld_ok = tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic());
    let labels_ok = rest.iter().all(|label| {
        !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    tld_ok && labels_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    // Explicit schemes are kept as typed
    #[case("https://example.com", "https://example.com")]
    #[case("http://example.com/path?q=1", "http://example.com/path?q=1")]
    #[case("mix://home", "mix://home")]
    // Domain-like strings get https://
    #[case("google.com", "https://google.com")]
    #[case("sub.domain.co.uk", "https://sub.domain.co.uk")]
    #[case("docs.rs/my-crate", "https://docs.rs/my-crate")]
    #[case("example.com:8080/x", "https://example.com:8080/x")]
    // Localhost and IPs
    #[case("localhost", "https://localhost")]
    #[case("localhost:3000/app", "https://localhost:3000/app")]
    #[case("192.168.1.10", "https://192.168.1.10")]
    #[case("  example.org  ", "https://example.org")]
    fn test_address_input(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(
            resolve_input(input, SearchEngine::Google).as_deref(),
            Some(expected)
        );
    }

    #[rstest]
    #[case("hello world", "https://www.google.com/search?q=hello%20world")]
    #[case("rust", "https://www.google.com/search?q=rust")]
    #[case("file.", "https://www.google.com/search?q=file.")]
    #[case("version 1.2", "https://www.google.com/search?q=version%201.2")]
    #[case("a.b1", "https://www.google.com/search?q=a.b1")]
    fn test_search_fallback(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(
            resolve_input(input, SearchEngine::Google).as_deref(),
            Some(expected)
        );
    }

    #[test]
    fn test_blank_input_is_ignored() {
        assert_eq!(resolve_input("", SearchEngine::Google), None);
        assert_eq!(resolve_input("   ", SearchEngine::Bing), None);
    }

    #[test]
    fn test_internal_urls() {
        assert!(is_internal_url(HOME_URL));
        assert!(!is_internal_url("https://mix.com"));
    }
}
