use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::fs;

use crate::config::settings::Settings;
use crate::Result;

/// Bitrate (kbps) requested for extracted audio
pub const AUDIO_BITRATE: &str = "192";
/// Codec used when the user does not pick one
pub const DEFAULT_AUDIO_FORMAT: &str = "mp3";
/// Resolution cap applied to playlist downloads to bound their total size
const PLAYLIST_FORMAT: &str = "best[height<=720]";

/// What a single user interaction asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Video,
    Audio,
    Playlist,
    Info,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Video => "Video",
            Mode::Audio => "Audio",
            Mode::Playlist => "Playlist",
            Mode::Info => "Info",
        }
    }
}

/// One download (or inspection) as requested by the user, before defaults
/// are applied. Built fresh per interaction, never persisted.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub mode: Mode,
    /// Destination folder; empty or None falls back to the configured default
    pub destination: Option<String>,
    /// Quality expression for video mode; empty or None means "best"
    pub quality: Option<String>,
    /// Audio codec for audio mode; empty or None means mp3
    pub audio_format: Option<String>,
}

impl DownloadRequest {
    pub fn video(url: &str, quality: Option<String>, destination: Option<String>) -> Self {
        Self {
            url: url.to_string(),
            mode: Mode::Video,
            destination,
            quality,
            audio_format: None,
        }
    }

    pub fn audio(url: &str, audio_format: Option<String>, destination: Option<String>) -> Self {
        Self {
            url: url.to_string(),
            mode: Mode::Audio,
            destination,
            quality: None,
            audio_format,
        }
    }

    pub fn playlist(url: &str, destination: Option<String>) -> Self {
        Self {
            url: url.to_string(),
            mode: Mode::Playlist,
            destination,
            quality: None,
            audio_format: None,
        }
    }

    pub fn info(url: &str) -> Self {
        Self {
            url: url.to_string(),
            mode: Mode::Info,
            destination: None,
            quality: None,
            audio_format: None,
        }
    }
}

/// Post-download audio extraction, performed by yt-dlp through ffmpeg
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioExtraction {
    pub codec: String,
    pub bitrate: String,
}

/// A request translated into what the yt-dlp invocation needs. Built
/// immediately before each call, discarded after.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Folder that must exist before the download starts
    pub destination: PathBuf,
    /// yt-dlp output template (-o), parameterized by title/extension
    pub output_template: PathBuf,
    /// Format selector (-f)
    pub format_selector: String,
    /// Audio extraction directive, when audio was requested
    pub extract_audio: Option<AudioExtraction>,
    /// Directory containing ffmpeg; None leaves the lookup to yt-dlp
    pub ffmpeg_location: Option<PathBuf>,
}

/// Quality presets of the form "720p" / "480p"
static HEIGHT_PRESET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{3,4})p$").expect("invalid preset regex"));

/// Maps a user quality expression to a yt-dlp format selector.
///
/// "best" and "worst" pass through, "NNNp" becomes a height cap, and anything
/// else is handed to yt-dlp verbatim as a raw selector.
fn video_format_selector(quality: &str) -> String {
    match quality {
        "" | "best" => "best".to_string(),
        "worst" => "worst".to_string(),
        other => match HEIGHT_PRESET.captures(other) {
            Some(caps) => format!("best[height<={}]", &caps[1]),
            None => other.to_string(),
        },
    }
}

fn chosen_or<'a>(value: &'a Option<String>, default: &'a str) -> &'a str {
    match value {
        Some(value) if !value.trim().is_empty() => value.trim(),
        _ => default,
    }
}

impl DownloadOptions {
    /// Translates a request into download options, applying the documented
    /// defaults. Info requests carry no options and never reach this point.
    pub fn build(request: &DownloadRequest, settings: &Settings) -> Self {
        let default_dir = match request.mode {
            Mode::Playlist => &settings.playlist_dir,
            _ => &settings.download_dir,
        };
        let destination = match chosen_or(&request.destination, "") {
            "" => default_dir.clone(),
            chosen => PathBuf::from(chosen),
        };

        match request.mode {
            Mode::Audio => {
                let codec = chosen_or(&request.audio_format, DEFAULT_AUDIO_FORMAT);
                Self {
                    output_template: destination.join("%(title)s.%(ext)s"),
                    destination,
                    format_selector: "bestaudio/best".to_string(),
                    extract_audio: Some(AudioExtraction {
                        codec: codec.to_string(),
                        bitrate: AUDIO_BITRATE.to_string(),
                    }),
                    ffmpeg_location: settings.ffmpeg_location(),
                }
            }
            Mode::Playlist => Self {
                // Per-playlist subfolder, created by yt-dlp itself
                output_template: destination.join("%(playlist)s").join("%(title)s.%(ext)s"),
                destination,
                format_selector: PLAYLIST_FORMAT.to_string(),
                extract_audio: None,
                ffmpeg_location: None,
            },
            _ => Self {
                output_template: destination.join("%(title)s.%(ext)s"),
                destination,
                format_selector: video_format_selector(chosen_or(&request.quality, "")),
                extract_audio: None,
                ffmpeg_location: None,
            },
        }
    }

    /// Ensures the destination folder (including parents) exists before the
    /// download call is attempted.
    pub async fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.destination).await?;
        Ok(())
    }
}
