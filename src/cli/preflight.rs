//! Pre-flight checks before starting the service.
//!
//! Validates that the external tools are available before the server
//! accepts requests that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, SalvadorError};
use std::process::Command;

/// Verify that yt-dlp and ffmpeg can be invoked.
///
/// Returns Ok(()) if both respond to their version flag, or an error naming
/// the first missing tool.
pub fn check(settings: &Settings) -> Result<()> {
    check_tool(&settings.tools.ytdlp_bin, "--version")?;
    check_tool(&settings.tools.ffmpeg_bin, "-version")?;
    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str, version_arg: &str) -> Result<()> {
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(SalvadorError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SalvadorError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(SalvadorError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_is_reported() {
        let err = check_tool("salvador-no-such-tool", "--version").unwrap_err();
        assert!(matches!(err, SalvadorError::ToolNotFound(_)));
    }
}
