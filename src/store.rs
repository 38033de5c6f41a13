//! Filesystem-backed asset store.
//!
//! Holds the two flat directories that own all produced files: one for
//! converted audio, one for cover thumbnails. Files are keyed by sanitized
//! filename only; no path ever leaves this module except through the
//! `*_path` accessors.

use crate::error::{Result, SalvadorError};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Characters that must never appear in a stored filename.
const FORBIDDEN: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replace filesystem-unsafe characters in a title with underscores.
///
/// Deterministic: the same title always maps to the same filename stem.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect()
}

/// The asset store's two directories.
#[derive(Debug, Clone)]
pub struct AssetStore {
    audio_dir: PathBuf,
    thumbnail_dir: PathBuf,
}

impl AssetStore {
    /// Open the store, creating both directories if needed.
    pub fn new(audio_dir: PathBuf, thumbnail_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&audio_dir)?;
        std::fs::create_dir_all(&thumbnail_dir)?;
        Ok(Self {
            audio_dir,
            thumbnail_dir,
        })
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    pub fn thumbnail_dir(&self) -> &Path {
        &self.thumbnail_dir
    }

    /// Filename for a downloaded/converted track.
    pub fn audio_filename(title: &str) -> String {
        format!("{}.mp3", sanitize_title(title))
    }

    /// Filename for a pitch-shifted track.
    pub fn pitched_filename(title: &str) -> String {
        format!("{} (Speed Up).mp3", sanitize_title(title))
    }

    /// Filename for a cover thumbnail.
    pub fn thumbnail_filename(title: &str) -> String {
        format!("{}.jpg", sanitize_title(title))
    }

    pub fn audio_path(&self, filename: &str) -> PathBuf {
        self.audio_dir.join(filename)
    }

    pub fn thumbnail_path(&self, filename: &str) -> PathBuf {
        self.thumbnail_dir.join(filename)
    }

    /// Resolve a client-supplied filename against the audio directory.
    ///
    /// Rejects anything that could escape the directory; returns None if the
    /// file does not exist.
    pub fn lookup_audio(&self, filename: &str) -> Option<PathBuf> {
        lookup(&self.audio_dir, filename)
    }

    /// Resolve a client-supplied filename against the thumbnail directory.
    pub fn lookup_thumbnail(&self, filename: &str) -> Option<PathBuf> {
        lookup(&self.thumbnail_dir, filename)
    }

    /// Create a staging file in the audio directory.
    ///
    /// Writers produce the whole file under a temporary name, then `commit`
    /// renames it over the final name. Readers never observe a partial file;
    /// concurrent writers to the same name keep last-writer-wins semantics.
    pub fn stage_audio(&self) -> Result<NamedTempFile> {
        NamedTempFile::new_in(&self.audio_dir).map_err(SalvadorError::Io)
    }

    /// Create a staging file in the thumbnail directory.
    pub fn stage_thumbnail(&self) -> Result<NamedTempFile> {
        NamedTempFile::new_in(&self.thumbnail_dir).map_err(SalvadorError::Io)
    }

    /// Atomically move a staged file into place, overwriting any existing
    /// file of the same name.
    pub fn commit(&self, staged: NamedTempFile, dest: &Path) -> Result<()> {
        let temp_path = staged.into_temp_path();
        temp_path
            .persist(dest)
            .map_err(|e| SalvadorError::Io(e.error))?;
        Ok(())
    }
}

/// Safe directory lookup for serving routes.
fn lookup(dir: &Path, filename: &str) -> Option<PathBuf> {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
    {
        return None;
    }
    let path = dir.join(filename);
    if path.is_file() {
        Some(path)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sanitize_replaces_all_forbidden_chars() {
        let title = r#"a<b>c:d"e/f\g|h?i*j"#;
        let sanitized = sanitize_title(title);
        assert_eq!(sanitized, "a_b_c_d_e_f_g_h_i_j");
        for c in FORBIDDEN {
            assert!(!sanitized.contains(c));
        }
    }

    #[test]
    fn test_sanitize_is_deterministic() {
        let title = "AC/DC: Back In Black?";
        assert_eq!(sanitize_title(title), sanitize_title(title));
        assert_eq!(sanitize_title(title), "AC_DC_ Back In Black_");
    }

    #[test]
    fn test_sanitize_keeps_safe_titles_intact() {
        assert_eq!(sanitize_title("Plain Title"), "Plain Title");
        assert_eq!(sanitize_title(""), "");
    }

    #[test]
    fn test_filenames() {
        assert_eq!(AssetStore::audio_filename("Test/Song"), "Test_Song.mp3");
        assert_eq!(
            AssetStore::pitched_filename("Song"),
            "Song (Speed Up).mp3"
        );
        assert_eq!(AssetStore::thumbnail_filename("Test/Song"), "Test_Song.jpg");
    }

    #[test]
    fn test_lookup_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(
            dir.path().join("audio"),
            dir.path().join("thumbs"),
        )
        .unwrap();

        assert!(store.lookup_audio("../escape.mp3").is_none());
        assert!(store.lookup_audio("sub/dir.mp3").is_none());
        assert!(store.lookup_audio(r"sub\dir.mp3").is_none());
        assert!(store.lookup_audio("").is_none());
        assert!(store.lookup_audio("missing.mp3").is_none());
    }

    #[test]
    fn test_stage_and_commit_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(
            dir.path().join("audio"),
            dir.path().join("thumbs"),
        )
        .unwrap();

        let dest = store.audio_path("track.mp3");

        let mut staged = store.stage_audio().unwrap();
        staged.write_all(b"first").unwrap();
        store.commit(staged, &dest).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"first");

        let mut staged = store.stage_audio().unwrap();
        staged.write_all(b"second").unwrap();
        store.commit(staged, &dest).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"second");

        assert!(store.lookup_audio("track.mp3").is_some());
    }
}
