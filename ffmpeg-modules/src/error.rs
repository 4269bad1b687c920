//! Error types shared by every module of the graph.

use std::fmt;

use ffmpeg_next::{codec, format::Pixel, media};
use thiserror::Error;

use crate::data::DataKind;

pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a module refuses to be constructed.
///
/// These are fatal: the module never exists when one of them is returned.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported media type {0:?}: must be audio or video")]
    UnsupportedMediaType(media::Type),

    #[error("decoder not found for codec {0:?}")]
    DecoderNotFound(codec::Id),

    #[error("couldn't open decoder for codec {codec:?}: {source}")]
    OpenFailed {
        codec: codec::Id,
        #[source]
        source: ffmpeg_next::Error,
    },

    #[error(
        "unsupported colorspace {pixel:?} for codec \"{codec}\": only planar YUV 4:2:0 is supported"
    )]
    UnsupportedColorspace { codec: String, pixel: Pixel },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A payload of the wrong kind was handed to `process`.
    #[error("[{module}] invalid payload type: expected {expected}, got {found}")]
    ContractViolation {
        module: &'static str,
        expected: DataKind,
        found: DataKind,
    },

    /// One unit failed to decode. Never escapes `process`.
    #[error("decode failed: {0}")]
    Decode(String),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error("sink panicked: {0}")]
    SinkPanicked(String),

    /// The downstream module was destroyed while still wired.
    #[error("sink module is gone")]
    SinkGone,

    /// Delivery re-entered a module that is already processing.
    #[error("module is already processing a payload (cycle in graph?)")]
    Reentrant,

    #[error("no output pin at index {index} (module has {count})")]
    NoSuchPin { index: usize, count: usize },

    /// End of stream. Part of control flow, not a fault.
    #[error("end of stream")]
    Eof,

    #[error("ffmpeg: {0}")]
    Ffmpeg(#[from] ffmpeg_next::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::ContractViolation { .. })
    }

    /// Returns the aggregated sink failures if this is a delivery error.
    pub fn as_delivery(&self) -> Option<&DeliveryError> {
        match self {
            Self::Delivery(e) => Some(e),
            _ => None,
        }
    }
}

/// A single sink failure captured during `emit`.
#[derive(Debug)]
pub struct SinkFailure {
    /// Registration index of the sink on its signal.
    pub index: usize,
    pub error: Error,
}

/// Every sink failure of one `emit` call, reported after all sinks were attempted.
#[derive(Debug)]
pub struct DeliveryError {
    pub attempted: usize,
    pub failures: Vec<SinkFailure>,
}

impl DeliveryError {
    pub fn failed_indices(&self) -> Vec<usize> {
        self.failures.iter().map(|f| f.index).collect()
    }
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} sinks failed",
            self.failures.len(),
            self.attempted
        )?;
        for failure in &self.failures {
            write!(f, "; sink #{}: {}", failure.index, failure.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for DeliveryError {}
