use std::process::Stdio;

use anyhow::{anyhow, Context};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use indicatif::ProgressStyle;
use tracing::{debug, instrument, Span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

use crate::config::settings::Settings;
use crate::Result;

use super::options::DownloadOptions;

/// Translates the options into the yt-dlp argument list for a single URL.
///
/// The first arguments force line-buffered JSON progress blocks so the
/// progress bar can be driven from stdout.
pub(crate) fn build_args(
    settings: &Settings,
    options: &DownloadOptions,
    url: &str,
) -> Result<Vec<String>> {
    let mut args: Vec<String> = vec![
        // Force new lines
        "--newline".to_string(),
        // Get all available variables using: yt-dlp --progress-template '%(progress)#j'
        "--progress-template".to_string(),
        "%(progress)#j".to_string(),
        // Disable colors for easier parsing
        "--color".to_string(),
        "no_color".to_string(),
    ];
    args.extend(settings.ytdlp_params.iter().cloned());

    args.push("-o".to_string());
    args.push(
        options
            .output_template
            .to_str()
            .context("Invalid output path")?
            .to_string(),
    );
    args.push("-f".to_string());
    args.push(options.format_selector.clone());

    if let Some(audio) = &options.extract_audio {
        args.push("--extract-audio".to_string());
        args.push("--audio-format".to_string());
        args.push(audio.codec.clone());
        args.push("--audio-quality".to_string());
        args.push(format!("{}K", audio.bitrate));
    }
    if let Some(ffmpeg) = &options.ffmpeg_location {
        args.push("--ffmpeg-location".to_string());
        args.push(ffmpeg.to_str().context("Invalid ffmpeg location")?.to_string());
    }

    args.push(url.to_string());
    Ok(args)
}

/// Runs yt-dlp for a single URL and displays a progress bar.
///
/// The child is spawned with kill_on_drop, so it is reaped on every exit
/// path, including the future being dropped.
#[instrument(skip(settings, options, url))]
pub async fn download(settings: &Settings, options: &DownloadOptions, url: &str) -> Result<()> {
    let args = build_args(settings, options, url)?;

    let mut cmd = Command::new(&settings.ytdlp_path);
    cmd.args(&args);
    debug!("yt-dlp params: {:?}", cmd);

    // Spawn the process
    let mut child = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .context("Failed to start yt-dlp")?;

    // Prepare template
    let mut template =
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% ({eta})  Url: "
            .to_string();
    template.push_str(url);
    Span::current().pb_set_style(
        &ProgressStyle::default_bar()
            .template(&template)?
            .progress_chars("#>-"),
    );
    Span::current().pb_set_length(1000);
    Span::current().pb_set_position(0);

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    // Process yt-dlp's stdout line by line, driving the progress bar.
    let progress = async {
        if let Some(stdout) = stdout {
            let mut lines = BufReader::new(stdout).lines();
            let mut parser = ProgressParser::default();
            while let Some(line) = lines.next_line().await? {
                parser.push_line(&line);
                Span::current().pb_set_position((parser.percentage * 10.0) as u64);
            }
        }
        Ok::<(), std::io::Error>(())
    };
    // Keep the tail of stderr around for error reporting.
    let errors = async {
        let mut tail: Vec<String> = Vec::new();
        if let Some(stderr) = stderr {
            let mut lines = BufReader::new(stderr).lines();
            while let Some(line) = lines.next_line().await? {
                if tail.len() == 8 {
                    tail.remove(0);
                }
                tail.push(line);
            }
        }
        Ok::<Vec<String>, std::io::Error>(tail)
    };
    let (progress, tail) = tokio::join!(progress, errors);
    progress?;
    let tail = tail?;

    // Wait for yt-dlp to finish
    let status = child
        .wait()
        .await
        .context("yt-dlp process encountered an error")?;
    if !status.success() {
        let detail = tail.join("\n");
        if detail.is_empty() {
            return Err(anyhow!("yt-dlp exited with status: {}", status).into());
        }
        return Err(anyhow!("yt-dlp exited with status: {}\n{}", status, detail).into());
    }

    Ok(())
}

/// Extracts the download percentage from yt-dlp's progress output.
///
/// `%(progress)#j` prints one indented JSON object per progress tick, so
/// lines are collected between the opening "{" and closing "}".
#[derive(Debug, Default)]
struct ProgressParser {
    percentage: f32,
    buffer: String,
}

impl ProgressParser {
    fn push_line(&mut self, line: &str) {
        if line == "{" {
            self.buffer.clear();
        }
        self.buffer.push_str(line);
        if line != "}" {
            return;
        }

        let Ok(value) = serde_json::from_str::<Value>(&self.buffer) else {
            return;
        };
        let Some(percent) = value.get("_percent_str").and_then(Value::as_str) else {
            return;
        };
        if let Ok(percent) = percent.trim().trim_end_matches('%').parse() {
            self.percentage = percent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::options::DownloadRequest;
    use std::path::PathBuf;

    #[test]
    fn quick_defaults_argv() {
        let settings = Settings::default();
        let request = DownloadRequest::video("https://example.com/video", None, None);
        let options = DownloadOptions::build(&request, &settings);
        let args = build_args(&settings, &options, &request.url).unwrap();

        // Default selector
        let f = args.iter().position(|a| a == "-f").unwrap();
        assert_eq!(args[f + 1], "best");
        // Output template under the default folder
        let o = args.iter().position(|a| a == "-o").unwrap();
        assert!(args[o + 1].starts_with("./downloads/"));
        // The single URL appears exactly once, as the final argument
        assert_eq!(args.last().unwrap(), "https://example.com/video");
        assert_eq!(args.iter().filter(|a| *a == &request.url).count(), 1);
    }

    #[test]
    fn audio_argv_requests_extraction() {
        let settings = Settings::default();
        let request = DownloadRequest::audio("https://example.com/video", None, None);
        let options = DownloadOptions::build(&request, &settings);
        let args = build_args(&settings, &options, &request.url).unwrap();

        let f = args.iter().position(|a| a == "-f").unwrap();
        assert_eq!(args[f + 1], "bestaudio/best");
        let codec = args.iter().position(|a| a == "--audio-format").unwrap();
        assert_eq!(args[codec + 1], "mp3");
        let quality = args.iter().position(|a| a == "--audio-quality").unwrap();
        assert_eq!(args[quality + 1], "192K");
        assert!(args.contains(&"--extract-audio".to_string()));
    }

    #[test]
    fn ffmpeg_location_is_forwarded() {
        let settings = Settings::default();
        let request = DownloadRequest::audio("https://example.com/video", None, None);
        let mut options = DownloadOptions::build(&request, &settings);
        options.ffmpeg_location = Some(PathBuf::from("/opt/ffmpeg/bin"));
        let args = build_args(&settings, &options, &request.url).unwrap();

        let loc = args.iter().position(|a| a == "--ffmpeg-location").unwrap();
        assert_eq!(args[loc + 1], "/opt/ffmpeg/bin");
    }

    #[test]
    fn extra_params_are_appended() {
        let mut settings = Settings::default();
        settings.ytdlp_params = vec!["-N".to_string(), "4".to_string()];
        let request = DownloadRequest::video("https://example.com/video", None, None);
        let options = DownloadOptions::build(&request, &settings);
        let args = build_args(&settings, &options, &request.url).unwrap();

        let n = args.iter().position(|a| a == "-N").unwrap();
        assert_eq!(args[n + 1], "4");
    }

    #[test]
    fn progress_parser_reads_percent_blocks() {
        let mut parser = ProgressParser::default();
        for line in ["{", "  \"_percent_str\": \" 42.3%\",", "  \"status\": \"downloading\"", "}"] {
            parser.push_line(line);
        }
        assert!((parser.percentage - 42.3).abs() < f32::EPSILON);

        // Garbage between blocks is ignored
        parser.push_line("[download] Destination: ./downloads/video.mp4");
        assert!((parser.percentage - 42.3).abs() < f32::EPSILON);
    }
}
