use dialoguer::Input;
use tokio::fs;

use crate::Result;

const CONFIG_PATH: &str = ".tube-dl-config.yml";

/// Asks for the few values worth asking for and writes an annotated starter
/// config next to the current directory.
pub async fn generate_config() -> Result<()> {
    let ytdlp_path: String = Input::new()
        .with_prompt("Path of the yt-dlp binary")
        .default("yt-dlp".to_string())
        .interact_text()?;

    let ffmpeg_location: String = Input::new()
        .with_prompt("Directory containing ffmpeg (leave empty to rely on the search path)")
        .allow_empty(true)
        .interact_text()?;

    let download_dir: String = Input::new()
        .with_prompt("Default download folder")
        .default("./downloads".to_string())
        .interact_text()?;

    let mut conf = format!(
        r#"# Path of the yt-dlp binary
ytdlp_path: {}

# Extra arguments appended to every yt-dlp call
#ytdlp_params:
#  - -N
#  - "4"

"#,
        ytdlp_path
    );

    match ffmpeg_location.trim() {
        "" => conf.push_str(
            r#"# Directory containing the ffmpeg binaries
# Leave unset to let yt-dlp search the path (the FFMPEG_LOCATION
# environment variable overrides this either way)
#ffmpeg_location: /usr/lib/ffmpeg

"#,
        ),
        location => conf.push_str(&format!(
            r#"# Directory containing the ffmpeg binaries (the FFMPEG_LOCATION
# environment variable overrides this)
ffmpeg_location: {}

"#,
            location
        )),
    }

    conf.push_str(&format!(
        r#"# Default destination folders
download_dir: {}
playlist_dir: {}/playlist

# Optional: session log, appended to when the menu exits
#log_file: tube-dl.log
"#,
        download_dir, download_dir
    ));

    fs::write(CONFIG_PATH, conf).await?;

    println!("Successfully written config to: {}", CONFIG_PATH);
    println!("You may now modify it to your liking!");

    Ok(())
}
