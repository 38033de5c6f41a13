//! Init command - interactive first-run setup.

use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::io::{self, Write};

/// Simple check result for init command.
struct CheckIssue {
    name: String,
    hint: String,
}

/// Run the init command for first-time setup.
pub fn run_init(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Salvador Setup");
    println!();
    println!("Welcome to Salvador! Let's make sure everything is configured correctly.\n");

    // Step 1: Check prerequisites
    println!("{}", style("Step 1: Checking prerequisites").bold().cyan());
    println!();

    let tool_issues = check_prerequisites(settings);

    if !tool_issues.is_empty() {
        Output::warning("Some tools are missing. Please install them:");
        println!();
        for issue in &tool_issues {
            println!(
                "  {} {} - not found",
                style("✗").red(),
                style(&issue.name).bold()
            );
            println!("    {} {}", style("→").dim(), style(&issue.hint).dim());
        }
        println!();

        if !prompt_continue("Continue anyway?")? {
            println!();
            Output::info("Setup cancelled. Install the missing tools and run 'salvador init' again.");
            return Ok(());
        }
    } else {
        Output::success("All required tools are installed!");
    }

    println!();

    // Step 2: Create asset directories
    println!("{}", style("Step 2: Setting up directories").bold().cyan());
    println!();

    for dir in [settings.audio_dir(), settings.thumbnail_dir()] {
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
            Output::success(&format!("Created directory: {}", dir.display()));
        } else {
            Output::info(&format!("Directory exists: {}", dir.display()));
        }
    }

    println!();

    // Step 3: Create config file
    println!("{}", style("Step 3: Configuration file").bold().cyan());
    println!();

    let config_path = Settings::default_config_path();
    if config_path.exists() {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else if prompt_continue("Create default configuration file?")? {
        settings.save_to(&config_path)?;
        Output::success(&format!("Created config file: {}", config_path.display()));
    } else {
        Output::info("Skipped config file creation. Using defaults.");
    }

    println!();

    // Summary
    println!("{}", style("Setup Complete!").bold().green());
    println!();
    println!("Next steps:");
    println!("  {} Check system status", style("salvador doctor").cyan());
    println!("  {} Start the service", style("salvador serve").cyan());
    println!();
    println!("For more help: {}", style("salvador --help").cyan());

    Ok(())
}

/// Check prerequisites and return any issues.
fn check_prerequisites(settings: &Settings) -> Vec<CheckIssue> {
    use std::process::Command;

    let mut issues = Vec::new();

    if Command::new(&settings.tools.ytdlp_bin)
        .arg("--version")
        .output()
        .is_err()
    {
        issues.push(CheckIssue {
            name: settings.tools.ytdlp_bin.clone(),
            hint: install_hint("yt-dlp").to_string(),
        });
    }

    if Command::new(&settings.tools.ffmpeg_bin)
        .arg("-version")
        .output()
        .is_err()
    {
        issues.push(CheckIssue {
            name: settings.tools.ffmpeg_bin.clone(),
            hint: install_hint("ffmpeg").to_string(),
        });
    }

    issues
}

/// Get platform-specific install hint.
fn install_hint(tool: &str) -> &'static str {
    match tool {
        "yt-dlp" => {
            if cfg!(target_os = "macos") {
                "Install with: brew install yt-dlp"
            } else if cfg!(target_os = "linux") {
                "Install with: pip install yt-dlp"
            } else {
                "Install from: https://github.com/yt-dlp/yt-dlp"
            }
        }
        "ffmpeg" => {
            if cfg!(target_os = "macos") {
                "Install with: brew install ffmpeg"
            } else if cfg!(target_os = "linux") {
                "Install with: sudo apt install ffmpeg"
            } else {
                "Install from: https://ffmpeg.org/download.html"
            }
        }
        _ => "Check the documentation for installation instructions",
    }
}

/// Prompt user for yes/no confirmation.
fn prompt_continue(message: &str) -> io::Result<bool> {
    print!("{} {} ", style("?").cyan(), message);
    print!("{} ", style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().to_lowercase() == "y" || input.trim().to_lowercase() == "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_hint_ytdlp() {
        let hint = install_hint("yt-dlp");
        assert!(hint.contains("yt-dlp"));
    }

    #[test]
    fn test_install_hint_ffmpeg() {
        let hint = install_hint("ffmpeg");
        assert!(hint.contains("ffmpeg"));
    }
}
