//! Media pipeline: the orchestration behind every HTTP operation.
//!
//! Sequences Search, Download -> Thumbnail-Save, and Upload -> Pitch-Shift ->
//! Store. Each operation is stateless; the only side effects are files
//! committed to the [`AssetStore`].

use crate::config::Settings;
use crate::error::{Result, SalvadorError};
use crate::store::AssetStore;
use crate::thumbnail::ThumbnailFetcher;
use crate::tools::{Ffmpeg, ToolRunner, TrackCandidate, YtDlp};
use std::path::Path;
use tracing::{info, instrument, warn};

/// A file now owned by the asset store, referenced by filename only.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAsset {
    pub filename: String,
}

/// Pipeline over the asset store and external tools.
pub struct MediaPipeline {
    store: AssetStore,
    ytdlp: YtDlp,
    ffmpeg: Ffmpeg,
    thumbnails: ThumbnailFetcher,
    search_limit: usize,
}

impl MediaPipeline {
    pub fn new(settings: &Settings) -> Result<Self> {
        let store = AssetStore::new(settings.audio_dir(), settings.thumbnail_dir())?;
        let runner = ToolRunner::new(&settings.tools);

        Ok(Self {
            store,
            ytdlp: YtDlp::new(runner.clone()),
            ffmpeg: Ffmpeg::new(runner, settings.tools.base_sample_rate),
            thumbnails: ThumbnailFetcher::new(reqwest::Client::new()),
            search_limit: settings.tools.search_limit,
        })
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    /// Search for track candidates matching a query.
    ///
    /// Any failure, including malformed or empty tool output, surfaces as a
    /// single `SearchFailed`; a partial list is never returned.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<TrackCandidate>> {
        self.ytdlp
            .search(query, self.search_limit)
            .await
            .map_err(|e| SalvadorError::SearchFailed(e.to_string()))
    }

    /// Download a track's audio, convert it to MP3, and save its thumbnail.
    ///
    /// The thumbnail is best-effort: a fetch failure is logged and the
    /// download still reports success.
    #[instrument(skip(self))]
    pub async fn download_and_store(&self, url: &str) -> Result<StoredAsset> {
        url::Url::parse(url)
            .map_err(|e| SalvadorError::InvalidInput(format!("invalid url: {e}")))?;

        let metadata = self
            .ytdlp
            .fetch_metadata(url)
            .await
            .map_err(|e| SalvadorError::DownloadFailed(e.to_string()))?;

        let filename = AssetStore::audio_filename(&metadata.title);
        let dest = self.store.audio_path(&filename);

        // yt-dlp picks its own working extension, so it writes into a scratch
        // directory on the same filesystem and the result is renamed into
        // place once complete.
        let scratch = tempfile::tempdir_in(self.store.audio_dir())?;
        let template = scratch.path().join("audio.%(ext)s");

        self.ytdlp
            .download_audio(url, &template)
            .await
            .map_err(|e| SalvadorError::DownloadFailed(e.to_string()))?;

        let downloaded = find_downloaded_file(scratch.path())?;
        std::fs::rename(&downloaded, &dest)?;
        info!("Stored audio as {}", filename);

        if let Err(e) = self
            .thumbnails
            .fetch_and_store(&self.store, &metadata.thumbnail_url, &metadata.title)
            .await
        {
            warn!("Thumbnail fetch failed (ignored): {}", e);
        }

        Ok(StoredAsset { filename })
    }

    /// Apply a pitch+tempo shift to uploaded audio and store the result.
    ///
    /// The output name carries a `(Speed Up)` suffix; an existing file of
    /// that name is overwritten silently.
    #[instrument(skip(self, input), fields(bytes = input.len()))]
    pub async fn shift_pitch(
        &self,
        input: &[u8],
        pitch_factor: f64,
        upload_filename: &str,
    ) -> Result<StoredAsset> {
        if !pitch_factor.is_finite() || pitch_factor <= 0.0 {
            return Err(SalvadorError::InvalidInput(format!(
                "pitch factor must be a positive number, got {pitch_factor}"
            )));
        }

        let title = file_stem_of(upload_filename);
        let filename = AssetStore::pitched_filename(title);
        let dest = self.store.audio_path(&filename);

        let staged = self.store.stage_audio()?;
        self.ffmpeg
            .shift_pitch(input, pitch_factor, staged.path())
            .await?;
        self.store.commit(staged, &dest)?;

        info!("Stored pitched audio as {}", filename);
        Ok(StoredAsset { filename })
    }
}

/// Title portion of an uploaded filename: everything before the last dot.
fn file_stem_of(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => filename,
    }
}

/// Locate the file yt-dlp produced in the scratch directory.
fn find_downloaded_file(dir: &Path) -> Result<std::path::PathBuf> {
    let mp3 = dir.join("audio.mp3");
    if mp3.exists() {
        return Ok(mp3);
    }

    for entry in std::fs::read_dir(dir)?.flatten() {
        if entry.path().is_file() {
            return Ok(entry.path());
        }
    }

    Err(SalvadorError::DownloadFailed(
        "audio file not found after download".to_string(),
    ))
}
