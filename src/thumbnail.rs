//! Thumbnail download and storage.
//!
//! Fetches cover images over plain HTTP and streams them into the asset
//! store in bounded chunks, so a large or slow response never buffers the
//! whole body in memory.

use crate::error::{Result, SalvadorError};
use crate::store::AssetStore;
use futures::StreamExt;
use std::io::Write;
use tracing::{debug, instrument};

/// Thumbnail fetcher over a shared HTTP client.
pub struct ThumbnailFetcher {
    client: reqwest::Client,
}

impl ThumbnailFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch `url` and store it as `<sanitized title>.jpg`.
    ///
    /// The body goes to a staged file first and is renamed into place once
    /// complete. Errors here are for the caller to log; a failed thumbnail
    /// never fails the surrounding download.
    #[instrument(skip(self, store))]
    pub async fn fetch_and_store(
        &self,
        store: &AssetStore,
        url: &str,
        title: &str,
    ) -> Result<()> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SalvadorError::Fetch(format!("GET {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(SalvadorError::Fetch(format!(
                "GET {url}: status {}",
                response.status()
            )));
        }

        let mut staged = store.stage_thumbnail()?;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| SalvadorError::Fetch(format!("read body: {e}")))?;
            staged.write_all(&chunk)?;
        }
        staged.flush()?;

        let filename = AssetStore::thumbnail_filename(title);
        let dest = store.thumbnail_path(&filename);
        store.commit(staged, &dest)?;

        debug!("Thumbnail saved to {:?}", dest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, AssetStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path().join("audio"), dir.path().join("thumbs")).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_unreachable_host_is_fetch_error() {
        let (_dir, store) = store();
        let fetcher = ThumbnailFetcher::new(reqwest::Client::new());

        let err = fetcher
            .fetch_and_store(&store, "http://127.0.0.1:1/thumb.jpg", "Song")
            .await
            .unwrap_err();
        assert!(matches!(err, SalvadorError::Fetch(_)));

        // No partial file left behind under the final name.
        assert!(store.lookup_thumbnail("Song.jpg").is_none());
    }
}
