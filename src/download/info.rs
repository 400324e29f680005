use anyhow::{anyhow, Context};
use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use crate::config::settings::Settings;
use crate::Result;

/// Resolves a URL to metadata without downloading anything and prints a
/// fixed-format report. Extraction failures carry yt-dlp's own error text.
pub async fn inspect(settings: &Settings, url: &str) -> Result<()> {
    let value = fetch_metadata(settings, url).await?;
    print!("{}", render_report(&value));
    Ok(())
}

/// Runs yt-dlp in extract-only mode (no download) and parses the JSON it
/// prints on stdout.
async fn fetch_metadata(settings: &Settings, url: &str) -> Result<Value> {
    let mut cmd = Command::new(&settings.ytdlp_path);
    cmd.args(["--dump-single-json", "--quiet", "--no-warnings"])
        .args(&settings.ytdlp_params)
        .arg(url)
        .kill_on_drop(true);
    debug!("yt-dlp params: {:?}", cmd);

    let output = cmd.output().await.context("Failed to start yt-dlp")?;
    if !output.status.success() {
        let detail = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if detail.is_empty() {
            return Err(anyhow!("yt-dlp exited with status: {}", output.status).into());
        }
        return Err(anyhow!("yt-dlp exited with status: {}\n{}", output.status, detail).into());
    }

    let value = serde_json::from_slice(&output.stdout).context("Invalid metadata JSON")?;
    Ok(value)
}

fn field<'a>(value: &'a Value, key: &str) -> std::borrow::Cow<'a, str> {
    match value.get(key) {
        Some(Value::String(s)) => s.as_str().into(),
        Some(Value::Null) | None => "N/A".into(),
        Some(other) => other.to_string().into(),
    }
}

/// Renders the human-readable report; absent fields fall back to "N/A".
fn render_report(value: &Value) -> String {
    let formats = value
        .get("formats")
        .and_then(Value::as_array)
        .map(|formats| formats.len())
        .unwrap_or(0);

    format!(
        "\nVIDEO INFORMATION:\n\
         Title: {}\n\
         Duration: {} seconds\n\
         Uploader: {}\n\
         Views: {}\n\
         URL: {}\n\
         \n\
         Available formats: {}\n",
        field(value, "title"),
        field(value, "duration"),
        field(value, "uploader"),
        field(value, "view_count"),
        field(value, "webpage_url"),
        formats,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn full_metadata_report() {
        let value = json!({
            "title": "Some Video",
            "duration": 212,
            "uploader": "Some Channel",
            "view_count": 123456,
            "webpage_url": "https://www.youtube.com/watch?v=abc123def45",
            "formats": [{}, {}, {}],
        });
        let report = render_report(&value);
        assert!(report.contains("Title: Some Video"));
        assert!(report.contains("Duration: 212 seconds"));
        assert!(report.contains("Uploader: Some Channel"));
        assert!(report.contains("Views: 123456"));
        assert!(report.contains("URL: https://www.youtube.com/watch?v=abc123def45"));
        assert!(report.contains("Available formats: 3"));
    }

    #[test]
    fn absent_fields_fall_back_to_na() {
        let report = render_report(&json!({ "title": "Bare" }));
        assert!(report.contains("Title: Bare"));
        assert!(report.contains("Duration: N/A seconds"));
        assert!(report.contains("Uploader: N/A"));
        assert!(report.contains("Views: N/A"));
        assert!(report.contains("URL: N/A"));
        assert!(report.contains("Available formats: 0"));
    }

    #[tokio::test]
    async fn missing_binary_surfaces_error_text() {
        let mut settings = Settings::default();
        settings.ytdlp_path = "./no-such-yt-dlp".into();
        let err = fetch_metadata(&settings, "https://example.com/video")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to start yt-dlp"));
    }
}
