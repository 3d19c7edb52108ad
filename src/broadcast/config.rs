use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the HLS index the encoder maintains inside the output directory
pub const PLAYLIST_NAME: &str = "index.m3u8";

/// Arguments handed to the external encoder.
///
/// Listeners depend on the segmenting behaviour these produce (a bounded
/// rolling window with old segments deleted), so changing the HLS fields
/// changes what players see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    /// Container format of the bytes arriving on stdin (browsers send webm/opus)
    pub input_format: String,

    /// Output audio codec
    pub audio_codec: String,

    /// Output bitrate, ffmpeg notation (e.g. "192k")
    pub bitrate: String,

    /// Output channel count
    pub channels: u16,

    /// Target duration of each HLS segment in seconds
    pub segment_secs: u32,

    /// Number of segments kept in the playlist
    pub list_size: u32,

    /// Remove segments that fall out of the rolling window
    pub delete_segments: bool,

    /// Playlist file name inside the output directory
    pub playlist_name: String,

    /// Optional ffmpeg `-loglevel` (e.g. "error"); unset keeps ffmpeg's default
    pub log_level: Option<String>,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            input_format: "webm".to_string(),
            audio_codec: "aac".to_string(),
            bitrate: "192k".to_string(),
            channels: 2,
            segment_secs: 4,
            list_size: 5,
            delete_segments: true,
            playlist_name: PLAYLIST_NAME.to_string(),
            log_level: None,
        }
    }
}

impl EncoderSettings {
    /// Render the full argument vector for one session writing into `output_dir`
    pub fn args(&self, output_dir: &Path) -> Vec<String> {
        let mut args = vec!["-y".to_string()];

        if let Some(level) = &self.log_level {
            args.push("-loglevel".to_string());
            args.push(level.clone());
        }

        args.extend(
            [
                "-f",
                self.input_format.as_str(),
                "-i",
                "pipe:0",
                "-c:a",
                self.audio_codec.as_str(),
                "-b:a",
                self.bitrate.as_str(),
            ]
            .map(String::from),
        );
        args.push("-ac".to_string());
        args.push(self.channels.to_string());

        args.push("-f".to_string());
        args.push("hls".to_string());
        args.push("-hls_time".to_string());
        args.push(self.segment_secs.to_string());
        args.push("-hls_list_size".to_string());
        args.push(self.list_size.to_string());
        if self.delete_segments {
            args.push("-hls_flags".to_string());
            args.push("delete_segments".to_string());
        }

        args.push(self.playlist_path(output_dir).to_string_lossy().into_owned());
        args
    }

    pub fn playlist_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.playlist_name)
    }
}

/// Configuration for the broadcast session manager
#[derive(Debug, Clone)]
pub struct BroadcastConfig {
    /// Directory the encoder writes the playlist and segments into
    pub output_dir: PathBuf,

    /// Path to the encoder binary
    pub encoder_path: PathBuf,

    /// Encoder arguments
    pub encoder: EncoderSettings,

    /// How long `stop` waits for the encoder to exit before killing it
    /// Default: 2 seconds
    pub stop_timeout: Duration,
}

impl BroadcastConfig {
    /// Standard layout under a web root: `<root>/live` for output and
    /// `<root>/ffmpeg/ffmpeg` for the encoder.
    pub fn from_web_root(web_root: impl AsRef<Path>) -> Self {
        let web_root = web_root.as_ref();
        Self {
            output_dir: web_root.join("live"),
            encoder_path: web_root
                .join("ffmpeg")
                .join(format!("ffmpeg{}", std::env::consts::EXE_SUFFIX)),
            encoder: EncoderSettings::default(),
            stop_timeout: Duration::from_secs(2),
        }
    }
}
