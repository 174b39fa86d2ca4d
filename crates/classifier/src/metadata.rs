//! Off-chain NFT metadata lookup.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;
use tx_explorer_telemetry::Metrics;

use crate::error::ClassifyError;

/// Public gateway used to resolve `ipfs://` URIs.
pub const DEFAULT_IPFS_GATEWAY: &str = "https://ipfs.io/ipfs/";

/// Resolves a token's metadata URI to the image URL it advertises.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Fetch the JSON document at `token_uri` and return its `image` field.
    async fn image_url(&self, token_uri: &str) -> Result<String, ClassifyError>;
}

/// Metadata fetcher backed by plain HTTP GETs.
pub struct HttpMetadataFetcher {
    client: Client,
    ipfs_gateway: String,
    metrics: Metrics,
}

impl HttpMetadataFetcher {
    /// Create a new fetcher.
    ///
    /// # Arguments
    /// * `timeout` - Per-request timeout
    /// * `ipfs_gateway` - Prefix substituted for `ipfs://`
    /// * `metrics` - Metrics collector
    pub fn new(timeout: Duration, ipfs_gateway: &str, metrics: Metrics) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let mut ipfs_gateway = ipfs_gateway.to_string();
        if !ipfs_gateway.ends_with('/') {
            ipfs_gateway.push('/');
        }
        Ok(Self {
            client,
            ipfs_gateway,
            metrics,
        })
    }

    async fn fetch_document(&self, url: &str) -> Result<Value, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.without_url().to_string())?;

        if !response.status().is_success() {
            return Err(format!("status {}", response.status()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| format!("body is not JSON: {}", e.without_url()))
    }
}

#[async_trait]
impl MetadataFetcher for HttpMetadataFetcher {
    async fn image_url(&self, token_uri: &str) -> Result<String, ClassifyError> {
        let url = resolve_uri(token_uri, &self.ipfs_gateway);
        let start = Instant::now();
        let document = self.fetch_document(&url).await;
        self.metrics
            .observe_metadata_latency(start.elapsed().as_secs_f64());

        let image = document
            .and_then(|doc| image_field(&doc))
            .map_err(|reason| ClassifyError::MetadataFetch {
                url: url.clone(),
                reason,
            })?;

        debug!("Resolved metadata {} to image {}", url, image);
        Ok(resolve_uri(&image, &self.ipfs_gateway))
    }
}

/// Pull the `image` string out of a metadata document.
pub fn image_field(document: &Value) -> Result<String, String> {
    match document.get("image") {
        Some(Value::String(image)) => Ok(image.clone()),
        Some(other) => Err(format!("image field is not a string: {}", other)),
        None => Err("document has no image field".to_string()),
    }
}

/// Rewrite `ipfs://` URIs onto an HTTP gateway; other URIs pass through.
pub fn resolve_uri(uri: &str, ipfs_gateway: &str) -> String {
    match uri.strip_prefix("ipfs://") {
        Some(path) => format!("{}{}", ipfs_gateway, path.trim_start_matches("ipfs/")),
        None => uri.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    // Metadata host serving one good document and the usual broken ones.
    async fn spawn_metadata_host() -> String {
        let app = Router::new()
            .route("/42.json", get(|| async { Json(json!({"name": "Flower #42", "image": "https://x/42.png"})) }))
            .route("/ipfs.json", get(|| async { Json(json!({"image": "ipfs://QmHash/7.png"})) }))
            .route("/no-image.json", get(|| async { Json(json!({"name": "Flower #1"})) }))
            .route("/page.html", get(|| async { "<html>not metadata</html>" }))
            .route("/broken.json", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn fetcher(metrics: Metrics) -> HttpMetadataFetcher {
        HttpMetadataFetcher::new(Duration::from_secs(5), "https://gateway.example/ipfs", metrics).unwrap()
    }

    fn fetch_reason(err: ClassifyError) -> String {
        match err {
            ClassifyError::MetadataFetch { reason, .. } => reason,
            other => panic!("expected a metadata fetch error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn fetches_image_from_metadata_document() {
        let host = spawn_metadata_host().await;
        let metrics = Metrics::new().unwrap();

        let image = fetcher(metrics.clone())
            .image_url(&format!("{}/42.json", host))
            .await
            .unwrap();

        assert_eq!(image, "https://x/42.png");
        assert!(metrics
            .gather()
            .unwrap()
            .contains("tx_explorer_metadata_fetch_latency_seconds_count 1"));
    }

    #[tokio::test]
    async fn ipfs_images_are_resolved_through_the_gateway() {
        let host = spawn_metadata_host().await;

        let image = fetcher(Metrics::new().unwrap())
            .image_url(&format!("{}/ipfs.json", host))
            .await
            .unwrap();

        assert_eq!(image, "https://gateway.example/ipfs/QmHash/7.png");
    }

    #[tokio::test]
    async fn error_statuses_are_fetch_errors() {
        let host = spawn_metadata_host().await;
        let fetcher = fetcher(Metrics::new().unwrap());

        let missing = fetcher.image_url(&format!("{}/missing.json", host)).await.unwrap_err();
        assert!(fetch_reason(missing).contains("status 404"));

        let broken = fetcher.image_url(&format!("{}/broken.json", host)).await.unwrap_err();
        assert!(fetch_reason(broken).contains("status 500"));
    }

    #[tokio::test]
    async fn non_json_and_imageless_documents_are_fetch_errors() {
        let host = spawn_metadata_host().await;
        let fetcher = fetcher(Metrics::new().unwrap());

        let html = fetcher.image_url(&format!("{}/page.html", host)).await.unwrap_err();
        assert!(fetch_reason(html).contains("body is not JSON"));

        let url = format!("{}/no-image.json", host);
        let err = fetcher.image_url(&url).await.unwrap_err();
        assert_eq!(
            err,
            ClassifyError::MetadataFetch {
                url,
                reason: "document has no image field".to_string(),
            }
        );
    }

    #[test]
    fn reads_image_field() {
        let doc = json!({"name": "Flower #42", "image": "https://x/42.png"});
        assert_eq!(image_field(&doc).unwrap(), "https://x/42.png");
    }

    #[test]
    fn missing_or_mistyped_image_is_an_error() {
        assert!(image_field(&json!({"name": "Flower"})).is_err());
        assert!(image_field(&json!({"image": 42})).is_err());
        assert!(image_field(&json!(["image"])).is_err());
    }

    #[test]
    fn resolves_ipfs_uris() {
        let gateway = DEFAULT_IPFS_GATEWAY;
        assert_eq!(
            resolve_uri("ipfs://QmHash/42.json", gateway),
            "https://ipfs.io/ipfs/QmHash/42.json"
        );
        assert_eq!(
            resolve_uri("ipfs://ipfs/QmHash/42.png", gateway),
            "https://ipfs.io/ipfs/QmHash/42.png"
        );
        assert_eq!(resolve_uri("https://x/42.png", gateway), "https://x/42.png");
    }

    #[test]
    fn gateway_gets_trailing_slash() {
        let fetcher = HttpMetadataFetcher::new(
            Duration::from_secs(1),
            "https://gateway.example/ipfs",
            Metrics::new().unwrap(),
        )
        .unwrap();
        assert_eq!(fetcher.ipfs_gateway, "https://gateway.example/ipfs/");
    }

    #[tokio::test]
    async fn unreachable_metadata_host_is_a_fetch_error() {
        let fetcher = HttpMetadataFetcher::new(
            Duration::from_millis(500),
            DEFAULT_IPFS_GATEWAY,
            Metrics::new().unwrap(),
        )
        .unwrap();

        let err = fetcher.image_url("http://127.0.0.1:9/42.json").await.unwrap_err();

        assert!(matches!(err, ClassifyError::MetadataFetch { ref url, .. } if url == "http://127.0.0.1:9/42.json"));
    }
}
