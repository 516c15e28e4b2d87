//! Node ingestion: local directory scanning and remote graph exports.
//!
//! This is the node-classification layer in front of the node store. It turns
//! files and exports into `ContentNode`s carrying the origin label that the
//! source adapters later filter on.

pub mod local;
mod parser;

use std::path::Path;

use notegarden_shared::{GardenError, Result};
use reqwest::Client;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};
use url::Url;

pub use local::{ensure_content_dir, resolve_content_dir, scan_local_dir};
pub use parser::{GraphExport, parse_graph_export};

/// Maximum number of redirects to follow when fetching an export.
const MAX_REDIRECTS: usize = 3;

/// Default timeout in seconds for fetching an export.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum export size we accept (64 MB).
const MAX_EXPORT_SIZE: u64 = 64 * 1024 * 1024;

/// User-Agent string for export requests.
const USER_AGENT: &str = concat!("notegarden/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Fetch options
// ---------------------------------------------------------------------------

/// Configuration for fetching remote exports.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Timeout for HTTP requests in seconds.
    pub timeout_secs: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// ---------------------------------------------------------------------------
// Main entry points
// ---------------------------------------------------------------------------

/// Load and parse a graph export from a file path or `http(s)` URL, labeling
/// every node with `origin` (the configured remote graph endpoint).
#[instrument(skip_all, fields(location = %location, origin = %origin))]
pub async fn ingest_graph_export(
    location: &str,
    origin: &str,
    opts: &FetchOptions,
) -> Result<GraphExport> {
    let raw = load_graph_export(location, opts).await?;
    let export = parse_graph_export(&raw, origin)?;

    info!(
        pages = export.pages.len(),
        blocks = export.blocks.len(),
        "graph export parsed"
    );

    Ok(export)
}

/// Read the raw export text.
pub async fn load_graph_export(location: &str, opts: &FetchOptions) -> Result<String> {
    match Url::parse(location) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            let client = build_client(opts)?;
            fetch_export(&client, &url).await
        }
        _ => {
            let path = Path::new(location);
            debug!(path = %path.display(), "reading graph export from disk");
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| GardenError::io(path, e))
        }
    }
}

/// Derive a short, stable node id from a prefix and key parts.
pub(crate) fn stable_id(prefix: &str, parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    let digest = format!("{:x}", hasher.finalize());
    format!("{prefix}-{}", &digest[..16])
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a reqwest client with appropriate settings.
fn build_client(opts: &FetchOptions) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(std::time::Duration::from_secs(opts.timeout_secs))
        .build()
        .map_err(|e| GardenError::Network(format!("failed to build HTTP client: {e}")))
}

/// Fetch an export over HTTP.
async fn fetch_export(client: &Client, url: &Url) -> Result<String> {
    info!(%url, "fetching graph export");

    let response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|e| GardenError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(GardenError::Network(format!("{url}: HTTP {status}")));
    }

    if let Some(len) = response.content_length() {
        if len > MAX_EXPORT_SIZE {
            return Err(GardenError::validation(format!(
                "{url}: export too large ({len} bytes, max {MAX_EXPORT_SIZE})"
            )));
        }
    }

    response
        .text()
        .await
        .map_err(|e| GardenError::Network(format!("{url}: failed to read body: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"[{ "title": "Hello World!", "children": [{ "string": "a", "uid": "b1" }] }]"#;

    #[test]
    fn stable_id_is_deterministic() {
        assert_eq!(stable_id("file", &["a", "b"]), stable_id("file", &["a", "b"]));
        assert_ne!(stable_id("file", &["ab", ""]), stable_id("file", &["a", "b"]));
        assert!(stable_id("page", &["x"]).starts_with("page-"));
    }

    #[tokio::test]
    async fn ingest_from_file() {
        let path = std::env::temp_dir().join(format!("ng-export-{}.json", uuid::Uuid::now_v7()));
        std::fs::write(&path, EXPORT).unwrap();

        let export = ingest_graph_export(path.to_str().unwrap(), "graph", &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(export.pages.len(), 1);
        assert_eq!(export.blocks.len(), 1);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let err = load_graph_export("/definitely/not/here.json", &FetchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GardenError::Io { .. }));
    }

    #[tokio::test]
    async fn ingest_with_mock_server() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/export.json"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(EXPORT))
            .mount(&server)
            .await;

        let location = format!("{}/export.json", server.uri());
        let export = ingest_graph_export(&location, "graph", &FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(export.pages[0].title, "Hello World!");
        assert_eq!(export.blocks[0].uid.as_deref(), Some("b1"));
    }

    #[tokio::test]
    async fn http_error_is_network_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/export.json"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let location = format!("{}/export.json", server.uri());
        let err = load_graph_export(&location, &FetchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GardenError::Network(_)));
        assert!(err.to_string().contains("404"));
    }
}
