use std::io::{self, BufRead, Write};

use crate::config::settings::Settings;
use crate::download::{self, options::DownloadRequest};
use crate::status_bar::StatusBar;
use crate::Result;

/// Outcome of one round of the main menu
#[derive(Debug)]
enum MenuStep {
    Request(DownloadRequest),
    /// Invalid option or URL, already reported to the user
    Invalid,
    Quit,
}

/// Runs the interactive menu over stdin/stdout until the user quits.
pub async fn run(settings: &Settings) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    let summary = run_loop(settings, &mut input, &mut output).await?;
    println!("Session: {}", summary);
    if let Some(log_file) = &settings.log_file {
        summary.write_log_to_file(log_file).await?;
    }
    Ok(())
}

/// The read-eval loop. Every dispatch failure is caught here: it is reported
/// to the user, tallied, and the menu comes back up.
async fn run_loop<R: BufRead, W: Write>(
    settings: &Settings,
    input: &mut R,
    output: &mut W,
) -> Result<StatusBar> {
    let mut summary = StatusBar::default();
    loop {
        match next_step(settings, input, output)? {
            MenuStep::Quit => break,
            MenuStep::Invalid => continue,
            MenuStep::Request(request) => {
                let label = format!("{}: {}", request.mode.label(), request.url);
                match download::dispatch(settings, &request).await {
                    Ok(()) => summary.register_done(&label),
                    Err(e) => {
                        writeln!(output, "Error: {}", e)?;
                        summary.register_err(&format!("{} ({})", label, e));
                    }
                }
            }
        }
    }
    Ok(summary)
}

/// Shows the main menu once and gathers everything needed for one operation.
fn next_step<R: BufRead, W: Write>(
    settings: &Settings,
    input: &mut R,
    output: &mut W,
) -> Result<MenuStep> {
    write!(
        output,
        "\nOptions:\n  \
         1. Download video\n  \
         2. Download audio (mp3)\n  \
         3. Download playlist\n  \
         4. Show video info\n  \
         5. Quit\n\n\
         Select an option (1-5): "
    )?;
    output.flush()?;
    // EOF anywhere counts as quitting; the loop has no other way out
    let Some(option) = read_trimmed(input)? else {
        return Ok(MenuStep::Quit);
    };

    if option == "5" {
        writeln!(output, "Goodbye!")?;
        return Ok(MenuStep::Quit);
    }
    if !matches!(option.as_str(), "1" | "2" | "3" | "4") {
        writeln!(output, "Invalid option")?;
        return Ok(MenuStep::Invalid);
    }

    write!(output, "Enter a URL: ")?;
    output.flush()?;
    let Some(url) = read_trimmed(input)? else {
        return Ok(MenuStep::Quit);
    };
    if url.is_empty() {
        writeln!(output, "Invalid URL")?;
        return Ok(MenuStep::Invalid);
    }

    let request = match option.as_str() {
        "1" => {
            writeln!(
                output,
                "\nAvailable qualities:\n \
                 - best: best available quality\n \
                 - worst: worst available quality\n \
                 - 720p / 480p: capped resolution\n \
                 - anything else is passed to yt-dlp as a raw format selector"
            )?;
            let quality = prompt(input, output, "Quality (press Enter for 'best')")?;
            let folder = prompt(
                input,
                output,
                &format!(
                    "Download folder (press Enter for '{}')",
                    settings.download_dir.display()
                ),
            )?;
            DownloadRequest::video(&url, quality, folder)
        }
        "2" => {
            let format = prompt(
                input,
                output,
                "Audio format (mp3/m4a/wav, press Enter for 'mp3')",
            )?;
            let folder = prompt(
                input,
                output,
                &format!(
                    "Download folder (press Enter for '{}')",
                    settings.download_dir.display()
                ),
            )?;
            DownloadRequest::audio(&url, format, folder)
        }
        "3" => {
            let folder = prompt(
                input,
                output,
                &format!(
                    "Download folder (press Enter for '{}')",
                    settings.playlist_dir.display()
                ),
            )?;
            DownloadRequest::playlist(&url, folder)
        }
        _ => DownloadRequest::info(&url),
    };
    Ok(MenuStep::Request(request))
}

/// Reads one line and trims it; None means end of input.
fn read_trimmed<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Asks for one value; an empty answer (or end of input) means "use the
/// stated default", expressed as None.
fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    text: &str,
) -> Result<Option<String>> {
    write!(output, "{}: ", text)?;
    output.flush()?;
    let answer = read_trimmed(input)?.unwrap_or_default();
    if answer.is_empty() {
        Ok(None)
    } else {
        Ok(Some(answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::options::Mode;
    use std::io::Cursor;

    fn step(lines: &str) -> (MenuStep, String) {
        let settings = Settings::default();
        let mut input = Cursor::new(lines.as_bytes().to_vec());
        let mut output: Vec<u8> = Vec::new();
        let step = next_step(&settings, &mut input, &mut output).unwrap();
        (step, String::from_utf8(output).unwrap())
    }

    #[test]
    fn quit_immediately() {
        let (step, output) = step("5\n");
        assert!(matches!(step, MenuStep::Quit));
        assert!(output.contains("Goodbye!"));
        // No URL prompt was shown
        assert!(!output.contains("Enter a URL"));
    }

    #[test]
    fn empty_url_returns_to_menu() {
        let (step, output) = step("1\n\n");
        assert!(matches!(step, MenuStep::Invalid));
        assert!(output.contains("Invalid URL"));
    }

    #[test]
    fn unknown_option_is_rejected() {
        let (step, output) = step("9\n");
        assert!(matches!(step, MenuStep::Invalid));
        assert!(output.contains("Invalid option"));
    }

    #[test]
    fn video_request_with_defaults() {
        let (step, _) = step("1\nhttps://example.com/video\n\n\n");
        let MenuStep::Request(request) = step else {
            panic!("expected a request");
        };
        assert_eq!(request.url, "https://example.com/video");
        assert_eq!(request.mode, Mode::Video);
        assert!(request.quality.is_none());
        assert!(request.destination.is_none());
    }

    #[test]
    fn audio_request_with_choices() {
        let (step, _) = step("2\nhttps://example.com/video\nwav\n./elsewhere\n");
        let MenuStep::Request(request) = step else {
            panic!("expected a request");
        };
        assert_eq!(request.mode, Mode::Audio);
        assert_eq!(request.audio_format.as_deref(), Some("wav"));
        assert_eq!(request.destination.as_deref(), Some("./elsewhere"));
    }

    #[test]
    fn info_dispatches_without_further_prompts() {
        let (step, output) = step("4\nhttps://example.com/video\n");
        let MenuStep::Request(request) = step else {
            panic!("expected a request");
        };
        assert_eq!(request.mode, Mode::Info);
        assert!(!output.contains("Download folder"));
    }

    #[tokio::test]
    async fn dispatch_error_is_reported_and_loop_continues() {
        let mut settings = Settings::default();
        settings.ytdlp_path = "./no-such-yt-dlp".into();

        let script = "4\nhttps://example.com/video\n5\n";
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut output: Vec<u8> = Vec::new();

        let summary = run_loop(&settings, &mut input, &mut output).await.unwrap();
        let output = String::from_utf8(output).unwrap();

        // The failure text reached the user and the menu came back up
        assert!(output.contains("Error:"));
        assert!(output.contains("Failed to start yt-dlp"));
        assert_eq!(output.matches("Select an option").count(), 2);
        assert!(output.contains("Goodbye!"));
        assert!(summary.to_string().contains("\x1b[31m1\x1b[0m"));
    }
}
