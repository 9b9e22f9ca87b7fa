//! HTTP client helper with native-tls support.
//!
//! All outbound requests (metadata lookup, icon artwork) go through the
//! shared agent and the host allowlist below.

use std::time::Duration;
use ureq::Agent;
use ureq::tls::{RootCerts, TlsConfig, TlsProvider};

/// Global timeout for all HTTP operations (30 seconds).
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum response body size for lookup responses (1 MB).
pub const MAX_LOOKUP_RESPONSE_SIZE: u64 = 1024 * 1024;

/// Maximum response body size for icon artwork (5 MB).
pub const MAX_ICON_SIZE: u64 = 5 * 1024 * 1024;

/// Host serving the catalog lookup endpoint.
const LOOKUP_HOST: &str = "itunes.apple.com";

/// CDN suffix the lookup service hands out artwork URLs under
/// (`is1-ssl.mzstatic.com` and siblings).
const ARTWORK_HOST_SUFFIX: &str = ".mzstatic.com";

/// Validate that a URL is safe for the monitor to fetch.
///
/// Enforces HTTPS and restricts the host to the lookup service or its
/// artwork CDN. Returns `Ok(())` if acceptable, or an error string
/// describing why it was rejected.
pub fn validate_lookup_url(url: &str) -> Result<(), String> {
    let parsed = url::Url::parse(url).map_err(|e| format!("Invalid URL '{}': {}", url, e))?;

    match parsed.scheme() {
        "https" => {}
        scheme => {
            return Err(format!(
                "Insecure URL scheme '{}' rejected; only HTTPS is allowed. URL: {}",
                scheme, url
            ));
        }
    }

    let host = parsed.host_str().unwrap_or("");
    if host != LOOKUP_HOST && !host.ends_with(ARTWORK_HOST_SUFFIX) {
        return Err(format!(
            "URL host '{}' is neither the lookup service nor its artwork CDN. URL: {}",
            host, url
        ));
    }

    Ok(())
}

/// Create a new HTTP agent configured with native-tls and a global timeout.
pub fn agent() -> Agent {
    let tls_config = TlsConfig::builder()
        .provider(TlsProvider::NativeTls)
        .root_certs(RootCerts::PlatformVerifier)
        .build();

    Agent::config_builder()
        .tls_config(tls_config)
        .timeout_global(Some(HTTP_TIMEOUT))
        .build()
        .into()
}

/// Download a file from a URL and return its bytes.
///
/// Validates the URL against the allowlist before making any request; the
/// response body is capped at `limit` bytes.
///
/// # Errors
///
/// Returns an error string if validation, the request, or reading the body
/// fails.
pub fn download_file(url: &str, limit: u64) -> Result<Vec<u8>, String> {
    validate_lookup_url(url)?;

    let bytes = agent()
        .get(url)
        .header("User-Agent", "vpp-monitor")
        .call()
        .map_err(|e| format!("Request to '{}' failed: {}", url, e))?
        .into_body()
        .with_config()
        .limit(limit)
        .read_to_vec()
        .map_err(|e| format!("Failed to read response from '{}': {}", url, e))?;

    Ok(bytes)
}
