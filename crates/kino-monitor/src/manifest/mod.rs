//! Master playlist loading and parsing

mod attributes;
mod codecs;
mod hls;

pub use attributes::AttributeList;
pub use codecs::{guess_codecs, looks_like_audio, looks_like_video, split_codecs, CodecAssignment};
pub use hls::{parse_master_playlist, STREAM_INF_TAG};

use crate::{error::Error, types::ManifestTable, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Source of master playlist text
#[async_trait]
pub trait ManifestLoader: Send + Sync {
    /// Fetch the playlist body. A non-success response is an error.
    async fn load(&self, url: &str) -> Result<String>;
}

/// Loads playlists over HTTP(S)
#[derive(Debug, Clone, Default)]
pub struct HttpManifestLoader {
    client: Client,
}

impl HttpManifestLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Loader whose requests give up after `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ManifestLoader for HttpManifestLoader {
    #[instrument(skip(self))]
    async fn load(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url).map_err(|e| Error::InvalidManifestUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        debug!("Fetching HLS manifest: {}", parsed);

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| Error::ManifestFetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ManifestStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| Error::ManifestFetch(e.to_string()))
    }
}

/// Fetch and parse a master playlist.
///
/// Every failure degrades to an empty table; the cause is logged, never
/// returned.
#[instrument(skip(loader))]
pub async fn load_manifest_table(loader: &dyn ManifestLoader, url: &str) -> ManifestTable {
    match loader.load(url).await {
        Ok(content) => {
            let table = parse_master_playlist(&content);
            info!(levels = table.len(), "Manifest parsed");
            table
        }
        Err(e) => {
            warn!(code = e.error_code(), error = %e, "Manifest unavailable");
            ManifestTable::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLoader(Result<String>);

    #[async_trait]
    impl ManifestLoader for FixedLoader {
        async fn load(&self, _url: &str) -> Result<String> {
            match &self.0 {
                Ok(body) => Ok(body.clone()),
                Err(_) => Err(Error::ManifestStatus {
                    url: "https://cdn.example.com/master.m3u8".into(),
                    status: 500,
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_load_parses_body() {
        let loader = FixedLoader(Ok(
            "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=1000\nlow.m3u8\n".to_string()
        ));
        let table = load_manifest_table(&loader, "https://cdn.example.com/master.m3u8").await;
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn test_load_failure_is_empty_table() {
        let loader = FixedLoader(Err(Error::config("unused")));
        let table = load_manifest_table(&loader, "https://cdn.example.com/master.m3u8").await;
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_http_loader_rejects_bad_url() {
        let loader = HttpManifestLoader::new();
        let err = loader.load("not a url").await.unwrap_err();
        assert_eq!(err.error_code(), "MANIFEST_URL");
    }
}
