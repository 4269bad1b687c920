use ffmpeg_next::media;

use crate::{
    data::Data,
    error::Result,
    frame::{PcmFormat, PictureFormat},
    signal::Signal,
    stream::AvStream,
};

/// Stream properties negotiated when a pin is created. Never changed afterwards.
#[derive(Clone, Debug)]
pub enum PinProps {
    /// Encoded elementary stream, with the configuration needed to decode it.
    Encoded(AvStream),
    Pcm(PcmFormat),
    Picture(PictureFormat),
}

impl PinProps {
    pub fn medium(&self) -> media::Type {
        match self {
            PinProps::Encoded(stream) => stream.medium(),
            PinProps::Pcm(_) => media::Type::Audio,
            PinProps::Picture(_) => media::Type::Video,
        }
    }

    pub fn stream(&self) -> Option<&AvStream> {
        match self {
            PinProps::Encoded(stream) => Some(stream),
            _ => None,
        }
    }
}

/// Named output port of a module.
#[derive(Debug, Default)]
pub struct Pin {
    signal: Signal,
    props: Option<PinProps>,
}

impl Pin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_props(props: PinProps) -> Self {
        Self {
            signal: Signal::new(),
            props: Some(props),
        }
    }

    pub fn props(&self) -> Option<&PinProps> {
        self.props.as_ref()
    }

    pub fn signal(&self) -> &Signal {
        &self.signal
    }

    pub fn signal_mut(&mut self) -> &mut Signal {
        &mut self.signal
    }

    pub fn emit(&mut self, data: Data) -> Result<usize> {
        self.signal.emit(data)
    }
}
