//! ffmpeg invocation: pitch+tempo shifting.

use super::ToolRunner;
use crate::error::Result;
use std::path::Path;
use std::sync::Arc;
use tokio::process::Command;
use tracing::info;

/// Audio filter that shifts both pitch and tempo by `factor`.
///
/// The stream is retimed to `rate * factor` and resampled back to `rate`,
/// so a factor of 1.5 plays half again as fast and proportionally higher.
pub fn pitch_filter(rate: u32, factor: f64) -> String {
    format!("asetrate={rate}*{factor},aresample={rate}")
}

/// ffmpeg front-end.
pub struct Ffmpeg {
    runner: Arc<ToolRunner>,
    sample_rate: u32,
}

impl Ffmpeg {
    pub fn new(runner: Arc<ToolRunner>, sample_rate: u32) -> Self {
        Self {
            runner,
            sample_rate,
        }
    }

    /// Re-encode `input` with the pitch filter applied, writing MP3 to
    /// `output_path`. The input arrives over the child's stdin; callers
    /// validate `factor` before getting here.
    pub async fn shift_pitch(&self, input: &[u8], factor: f64, output_path: &Path) -> Result<()> {
        info!("Shifting pitch by {} into {:?}", factor, output_path);

        let mut cmd = Command::new(self.runner.ffmpeg_bin());
        cmd.arg("-i")
            .arg("pipe:0")
            .arg("-filter:a")
            .arg(pitch_filter(self.sample_rate, factor))
            .arg("-f")
            .arg("mp3")
            .arg("-y")
            .arg("-loglevel")
            .arg("error")
            .arg(output_path);

        self.runner.run_with_stdin("ffmpeg", cmd, input).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_filter() {
        assert_eq!(
            pitch_filter(44100, 1.5),
            "asetrate=44100*1.5,aresample=44100"
        );
        assert_eq!(pitch_filter(48000, 0.8), "asetrate=48000*0.8,aresample=48000");
    }
}
