use std::sync::LazyLock;

use clap::{CommandFactory, Parser, error::ErrorKind};
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(name = "media-player")]
#[command(about = "Demuxes and decodes a media file through a module graph")]
struct Args {
    /// Input file or URL; overrides `input` from the config file
    input: Option<String>,

    /// Force the container format (e.g. "h264" for a raw elementary stream)
    #[arg(short, long)]
    format: Option<String>,

    /// Discard video streams instead of decoding them
    #[arg(long)]
    no_video: bool,

    /// Discard audio streams instead of decoding them
    #[arg(long)]
    no_audio: bool,

    /// Log level: off, error, warn, info, debug or trace
    #[arg(short, long)]
    log_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    input: String,
    /// Forced container format, e.g. "h264" for a raw elementary stream.
    format: Option<String>,
    decode_video: bool,
    decode_audio: bool,
    log_level: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            input: String::new(),
            format: None,
            decode_video: true,
            decode_audio: true,
            log_level: "info".to_string(),
        }
    }
}

impl PlayerConfig {
    /// Defaults, then the JSON file named by `MEDIA_PLAYER_CONFIG`, then the
    /// command line.
    fn load(args: Args) -> anyhow::Result<Self> {
        let config = match std::env::var("MEDIA_PLAYER_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        Ok(config.merge(args))
    }

    fn merge(mut self, args: Args) -> Self {
        if let Some(input) = args.input {
            self.input = input;
        }
        if args.format.is_some() {
            self.format = args.format;
        }
        if args.no_video {
            self.decode_video = false;
        }
        if args.no_audio {
            self.decode_audio = false;
        }
        if let Some(level) = args.log_level {
            self.log_level = level;
        }
        self
    }

    fn from_file(path: &str) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path, e))?;
        Self::from_json(&text).map_err(|e| anyhow::anyhow!("parsing config {}: {}", path, e))
    }

    fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    #[cfg(test)]
    pub fn for_input(input: &str, format: Option<&str>) -> Self {
        Self {
            input: input.to_string(),
            format: format.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn decode_video(&self) -> bool {
        self.decode_video
    }

    pub fn decode_audio(&self) -> bool {
        self.decode_audio
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

pub fn config() -> &'static PlayerConfig {
    static CONFIG: LazyLock<PlayerConfig> = LazyLock::new(|| {
        let config = PlayerConfig::load(Args::parse())
            .unwrap_or_else(|e| Args::command().error(ErrorKind::Io, e).exit());
        if config.input().is_empty() {
            Args::command()
                .error(
                    ErrorKind::MissingRequiredArgument,
                    "no input given on the command line or in MEDIA_PLAYER_CONFIG",
                )
                .exit();
        }
        config
    });
    &CONFIG
}
