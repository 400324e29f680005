use std::path::Path;

use anyhow::anyhow;
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::settings::Settings;
use crate::Result;

/// Makes sure yt-dlp is runnable before the menu loop starts.
///
/// When the configured binary is the bare default, a failed probe triggers a
/// one-time pip install attempt; a custom configured path is never installed
/// over. Returns an error when yt-dlp stays unavailable, which aborts startup.
pub async fn ensure_ytdlp(settings: &Settings) -> Result<()> {
    if let Some(version) = probe(settings).await {
        info!("Found yt-dlp {}", version);
        return Ok(());
    }

    if settings.ytdlp_path != Path::new("yt-dlp") {
        return Err(anyhow!(
            "yt-dlp is not runnable at the configured path {}",
            settings.ytdlp_path.display()
        )
        .into());
    }

    warn!("yt-dlp not found, attempting to install it via pip");
    for pip in ["pip3", "pip"] {
        match Command::new(pip)
            .args(["install", "--user", "yt-dlp"])
            .status()
            .await
        {
            Ok(status) if status.success() => {
                return match probe(settings).await {
                    Some(version) => {
                        info!("Installed yt-dlp {}", version);
                        Ok(())
                    }
                    None => Err(anyhow!(
                        "yt-dlp was installed but is still not runnable; check your PATH"
                    )
                    .into()),
                };
            }
            Ok(status) => warn!("{} exited with status: {}", pip, status),
            Err(e) => warn!("Failed to run {}: {}", pip, e),
        }
    }

    Err(anyhow!("Could not install yt-dlp; install it manually with 'pip install yt-dlp'").into())
}

/// Returns the yt-dlp version string, or None when the binary cannot be run.
async fn probe(settings: &Settings) -> Option<String> {
    let output = Command::new(&settings.ytdlp_path)
        .arg("--version")
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
