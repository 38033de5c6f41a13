//! yt-dlp invocation: search and audio download.

use super::ToolRunner;
use crate::error::{Result, SalvadorError};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::process::Command;
use tracing::info;

/// Lines per search record: title, video id, thumbnail URL.
const SEARCH_STRIDE: usize = 3;

/// One search result.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrackCandidate {
    pub title: String,
    pub url: String,
    pub thumbnail: String,
}

/// Header metadata printed by yt-dlp before a download.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadMetadata {
    pub title: String,
    pub thumbnail_url: String,
}

/// yt-dlp front-end.
pub struct YtDlp {
    runner: Arc<ToolRunner>,
}

impl YtDlp {
    pub fn new(runner: Arc<ToolRunner>) -> Self {
        Self { runner }
    }

    /// Search for tracks matching a query.
    ///
    /// Requests exactly `limit` results via the `ytsearchN:` prefix. The
    /// query travels as a single argv element, so shell-special characters
    /// need no quoting.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<TrackCandidate>> {
        let mut cmd = Command::new(self.runner.ytdlp_bin());
        cmd.arg(format!("ytsearch{limit}:{query}"))
            .arg("--get-title")
            .arg("--get-id")
            .arg("--get-thumbnail")
            .arg("--no-check-certificate");

        let output = self.runner.run("yt-dlp", cmd).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_search_output(&stdout)
    }

    /// Resolve the title and thumbnail URL of a video without downloading.
    pub async fn fetch_metadata(&self, url: &str) -> Result<DownloadMetadata> {
        let mut cmd = Command::new(self.runner.ytdlp_bin());
        cmd.arg("--get-title")
            .arg("--get-thumbnail")
            .arg("--no-playlist")
            .arg(url);

        let output = self.runner.run("yt-dlp", cmd).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_download_metadata(&stdout)
    }

    /// Download best-available audio and extract it to MP3 at the given path.
    pub async fn download_audio(&self, url: &str, output_path: &Path) -> Result<()> {
        info!("Downloading audio from {}", url);

        let mut cmd = Command::new(self.runner.ytdlp_bin());
        cmd.arg("-f")
            .arg("bestaudio")
            .arg("--extract-audio")
            .arg("--audio-format")
            .arg("mp3")
            .arg("--audio-quality")
            .arg("0")
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--no-warnings")
            .arg("-o")
            .arg(output_path)
            .arg(url);

        self.runner.run("yt-dlp", cmd).await?;
        Ok(())
    }
}

/// Group search output lines in a strict stride of three.
fn parse_search_output(stdout: &str) -> Result<Vec<TrackCandidate>> {
    let lines: Vec<&str> = stdout.lines().filter(|l| !l.trim().is_empty()).collect();

    if lines.is_empty() || lines.len() % SEARCH_STRIDE != 0 {
        return Err(SalvadorError::Parse(format!(
            "expected a positive multiple of {} search output lines, got {}",
            SEARCH_STRIDE,
            lines.len()
        )));
    }

    Ok(lines
        .chunks(SEARCH_STRIDE)
        .map(|record| TrackCandidate {
            title: record[0].to_string(),
            url: watch_url(record[1]),
            thumbnail: record[2].to_string(),
        })
        .collect())
}

/// Parse the two header lines printed before a download.
fn parse_download_metadata(stdout: &str) -> Result<DownloadMetadata> {
    let mut lines = stdout.lines().filter(|l| !l.trim().is_empty());
    let title = lines.next();
    let thumbnail = lines.next();

    match (title, thumbnail) {
        (Some(title), Some(thumbnail)) => Ok(DownloadMetadata {
            title: title.to_string(),
            thumbnail_url: thumbnail.to_string(),
        }),
        _ => Err(SalvadorError::Parse(
            "expected at least two metadata lines (title, thumbnail)".to_string(),
        )),
    }
}

fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_output_stride_of_three() {
        let stdout = "First Song\naaa11111111\nhttp://img/1.jpg\n\
                      Second Song\nbbb22222222\nhttp://img/2.jpg\n";
        let candidates = parse_search_output(stdout).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].title, "First Song");
        assert_eq!(
            candidates[0].url,
            "https://www.youtube.com/watch?v=aaa11111111"
        );
        assert_eq!(candidates[1].thumbnail, "http://img/2.jpg");
    }

    #[test]
    fn test_parse_search_output_preserves_order() {
        let stdout = (0..5)
            .map(|i| format!("Title {i}\nid{i}\nhttp://img/{i}.jpg\n"))
            .collect::<String>();
        let candidates = parse_search_output(&stdout).unwrap();
        assert_eq!(candidates.len(), 5);
        for (i, c) in candidates.iter().enumerate() {
            assert_eq!(c.title, format!("Title {i}"));
        }
    }

    #[test]
    fn test_parse_search_output_rejects_bad_line_counts() {
        assert!(matches!(
            parse_search_output(""),
            Err(SalvadorError::Parse(_))
        ));
        assert!(matches!(
            parse_search_output("only-title\n"),
            Err(SalvadorError::Parse(_))
        ));
        assert!(matches!(
            parse_search_output("title\nid\nthumb\nextra\n"),
            Err(SalvadorError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_download_metadata() {
        let meta = parse_download_metadata("My Song\nhttp://x/thumb.jpg\n").unwrap();
        assert_eq!(meta.title, "My Song");
        assert_eq!(meta.thumbnail_url, "http://x/thumb.jpg");
    }

    #[test]
    fn test_parse_download_metadata_requires_two_lines() {
        assert!(matches!(
            parse_download_metadata("My Song\n"),
            Err(SalvadorError::Parse(_))
        ));
        assert!(matches!(
            parse_download_metadata(""),
            Err(SalvadorError::Parse(_))
        ));
    }
}
