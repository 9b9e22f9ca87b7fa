//! App metadata lookup.
//!
//! Each accepted lifecycle transition is enriched with display metadata
//! fetched from the iTunes lookup service. Results are fetched fresh per
//! transition and never cached; a failed lookup drops the transition (no
//! retry, logged by the caller).

use crate::http;

/// Lookup endpoint, templated with the catalog identifier.
const LOOKUP_URL_BASE: &str = "https://itunes.apple.com/lookup?id=";

/// Metadata describing one app in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppMetadata {
    /// Catalog identifier the lookup was issued for.
    pub catalog_id: u64,
    /// Display name of the app.
    pub display_name: String,
    /// Vendor/artist name; empty when the catalog omits it.
    pub vendor_name: String,
    /// Icon artwork URL, when the catalog provides one.
    pub icon_url: Option<String>,
    /// Bundle identifier used to locate the install on disk.
    pub package_id: String,
}

/// Seam between the pipeline and the network.
///
/// The production implementation is [`ItunesCatalog`]; tests inject scripted
/// sources.
pub trait MetadataSource: Send + Sync {
    /// Fetch metadata for one catalog identifier.
    fn lookup(&self, catalog_id: u64) -> Result<AppMetadata, String>;
}

/// Production [`MetadataSource`] backed by the iTunes lookup endpoint.
pub struct ItunesCatalog;

impl MetadataSource for ItunesCatalog {
    fn lookup(&self, catalog_id: u64) -> Result<AppMetadata, String> {
        let url = format!("{}{}", LOOKUP_URL_BASE, catalog_id);
        // Validate at call time so any future change to LOOKUP_URL_BASE is caught.
        http::validate_lookup_url(&url)?;

        log::debug!("Fetching app details from {}", url);

        let mut body = http::agent()
            .get(&url)
            .header("User-Agent", "vpp-monitor")
            .call()
            .map_err(|e| format!("Lookup request for {} failed: {}", catalog_id, e))?
            .into_body();

        let body_str = body
            .with_config()
            .limit(http::MAX_LOOKUP_RESPONSE_SIZE)
            .read_to_string()
            .map_err(|e| format!("Failed to read lookup response: {}", e))?;

        parse_lookup_response(catalog_id, &body_str)
    }
}

/// Parse a lookup response body into [`AppMetadata`].
///
/// The service returns `{ "resultCount": n, "results": [ … ] }`; only the
/// first result entry is consumed. Split from the network call so the decode
/// path is testable against canned bodies.
pub fn parse_lookup_response(catalog_id: u64, body: &str) -> Result<AppMetadata, String> {
    let json: serde_json::Value =
        serde_json::from_str(body).map_err(|e| format!("Failed to parse lookup JSON: {}", e))?;

    let entry = json
        .get("results")
        .and_then(|results| results.as_array())
        .and_then(|results| results.first())
        .ok_or_else(|| format!("Lookup for {} returned no results", catalog_id))?;

    let display_name = entry
        .get("trackName")
        .and_then(|v| v.as_str())
        .unwrap_or("Unknown App")
        .to_string();

    let vendor_name = entry
        .get("artistName")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let icon_url = entry
        .get("artworkUrl512")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    let package_id = entry
        .get("bundleId")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    Ok(AppMetadata {
        catalog_id,
        display_name,
        vendor_name,
        icon_url,
        package_id,
    })
}
