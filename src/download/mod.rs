pub mod info;
pub mod options;
pub mod ytdlp;

use crate::config::cli::QuickMode;
use crate::config::settings::Settings;
use crate::Result;

use options::{DownloadOptions, DownloadRequest, Mode};

/// Runs a single request to completion: build options, make sure the
/// destination exists, invoke yt-dlp once. Errors are returned to the caller,
/// which decides whether they end the process (quick) or just the operation
/// (menu).
pub async fn dispatch(settings: &Settings, request: &DownloadRequest) -> Result<()> {
    if request.mode == Mode::Info {
        return info::inspect(settings, &request.url).await;
    }

    let options = DownloadOptions::build(request, settings);
    options.prepare().await?;
    ytdlp::download(settings, &options, &request.url).await?;
    println!("Download finished: {}", request.url);
    Ok(())
}

/// One-shot entry point: a single URL with default quality and destination,
/// no interaction.
pub async fn run_quick(settings: &Settings, url: &str, mode: QuickMode) -> Result<()> {
    let request = match mode {
        QuickMode::Video => DownloadRequest::video(url, None, None),
        QuickMode::Audio => DownloadRequest::audio(url, None, None),
    };
    dispatch(settings, &request).await
}
