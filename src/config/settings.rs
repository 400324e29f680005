use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing::debug;

use crate::Result;

/// Top-level settings structure
///
/// Every field has a usable default, so running without a config file works.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Path (or bare name, resolved via the search path) of the yt-dlp binary
    pub ytdlp_path: PathBuf,
    /// Extra arguments appended to every yt-dlp call
    pub ytdlp_params: Vec<String>,
    /// Directory containing the ffmpeg binaries; None means yt-dlp searches the path itself
    pub ffmpeg_location: Option<PathBuf>,
    /// Default destination for single video/audio downloads
    pub download_dir: PathBuf,
    /// Default destination for playlist downloads
    pub playlist_dir: PathBuf,
    /// Optional session log file, appended to on exit
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ytdlp_path: PathBuf::from("yt-dlp"),
            ytdlp_params: Vec::new(),
            ffmpeg_location: None,
            download_dir: PathBuf::from("./downloads"),
            playlist_dir: PathBuf::from("./downloads/playlist"),
            log_file: None,
        }
    }
}

impl Settings {
    /// Reads settings from the given path, falling back to defaults when the
    /// file does not exist. A present but malformed file is an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Settings> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Settings::default());
        }
        let contents = fs::read_to_string(path).with_context(|| "Failed to read config file")?;
        let settings: Settings = serde_yml::from_str(&contents)
            .with_context(|| "Could not parse config (There is most likely an error in the config)")?;
        debug!("Read config: {:?}", settings);
        Ok(settings)
    }

    /// Resolves the ffmpeg directory: the FFMPEG_LOCATION environment variable
    /// wins over the config file; None leaves the lookup to yt-dlp.
    pub fn ffmpeg_location(&self) -> Option<PathBuf> {
        env::var_os("FFMPEG_LOCATION")
            .map(PathBuf::from)
            .or_else(|| self.ffmpeg_location.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let settings = Settings::load_or_default("./no-such-config.yml").unwrap();
        assert_eq!(settings.ytdlp_path, PathBuf::from("yt-dlp"));
        assert_eq!(settings.download_dir, PathBuf::from("./downloads"));
        assert_eq!(settings.playlist_dir, PathBuf::from("./downloads/playlist"));
        assert!(settings.ffmpeg_location.is_none());
        assert!(settings.log_file.is_none());
    }

    #[test]
    fn parses_partial_config() {
        let settings: Settings = serde_yml::from_str(
            r#"
ytdlp_path: /opt/yt-dlp
ytdlp_params:
  - -N
  - "4"
ffmpeg_location: /opt/ffmpeg/bin
"#,
        )
        .unwrap();
        assert_eq!(settings.ytdlp_path, PathBuf::from("/opt/yt-dlp"));
        assert_eq!(settings.ytdlp_params, vec!["-N".to_string(), "4".to_string()]);
        assert_eq!(settings.ffmpeg_location, Some(PathBuf::from("/opt/ffmpeg/bin")));
        // Unset fields keep their defaults
        assert_eq!(settings.download_dir, PathBuf::from("./downloads"));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yml");
        fs::write(&path, "ytdlp_path: [not, a, path").unwrap();
        assert!(Settings::load_or_default(&path).is_err());
    }
}
