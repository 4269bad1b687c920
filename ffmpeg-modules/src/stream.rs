use ffmpeg_next::{
    Rational,
    codec::{self, Parameters},
    format::{Pixel, Sample, stream},
    media,
};

unsafe impl Send for AvStream {}
unsafe impl Sync for AvStream {}

/// Codec configuration of one elementary stream.
///
/// The demultiplexer publishes one per stream on its pins; a decode module is
/// constructed from it.
pub struct AvStream {
    index: usize,
    parameters: Parameters,
    time_base: Rational,
    rate: Rational,
}

impl AvStream {
    /// Bare configuration for `codec_id`, as a test harness or a raw
    /// elementary-stream reader would build it.
    pub fn new(index: usize, medium: media::Type, codec_id: codec::Id) -> Self {
        let mut parameters = Parameters::new();
        unsafe {
            let ptr = parameters.as_mut_ptr();
            (*ptr).codec_type = medium.into();
            (*ptr).codec_id = codec_id.into();
        }
        Self {
            index,
            parameters,
            time_base: Rational::new(0, 1),
            rate: Rational::new(0, 1),
        }
    }

    /// Configuration for `codec_id` with the medium of its registered decoder.
    pub fn for_codec(codec_id: codec::Id) -> Self {
        let medium = ffmpeg_next::decoder::find(codec_id)
            .map(|codec| codec.medium())
            .unwrap_or(media::Type::Unknown);
        Self::new(0, medium, codec_id)
    }

    /// Sets the negotiated picture geometry and pixel format.
    pub fn with_picture(mut self, width: u32, height: u32, pixel: Pixel) -> Self {
        unsafe {
            let ptr = self.parameters.as_mut_ptr();
            (*ptr).width = width as i32;
            (*ptr).height = height as i32;
            (*ptr).format = ffmpeg_next::ffi::AVPixelFormat::from(pixel) as i32;
        }
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn rate(&self) -> Rational {
        self.rate
    }

    pub fn medium(&self) -> media::Type {
        self.parameters.medium()
    }

    pub fn codec_id(&self) -> codec::Id {
        self.parameters.id()
    }

    pub fn is_video(&self) -> bool {
        self.medium() == media::Type::Video
    }

    pub fn is_audio(&self) -> bool {
        self.medium() == media::Type::Audio
    }

    pub fn width(&self) -> u32 {
        unsafe { (*self.parameters.as_ptr()).width.max(0) as u32 }
    }

    pub fn height(&self) -> u32 {
        unsafe { (*self.parameters.as_ptr()).height.max(0) as u32 }
    }

    /// Negotiated pixel format; `Pixel::None` for non-video or unknown.
    pub fn pixel_format(&self) -> Pixel {
        if !self.is_video() {
            return Pixel::None;
        }
        unsafe {
            let format = (*self.parameters.as_ptr()).format;
            if format < 0 {
                return Pixel::None;
            }
            Pixel::from(std::mem::transmute::<i32, ffmpeg_next::ffi::AVPixelFormat>(format))
        }
    }

    /// Negotiated sample format; `Sample::None` for non-audio or unknown.
    pub fn sample_format(&self) -> Sample {
        if !self.is_audio() {
            return Sample::None;
        }
        unsafe {
            let format = (*self.parameters.as_ptr()).format;
            if format < 0 {
                return Sample::None;
            }
            Sample::from(std::mem::transmute::<i32, ffmpeg_next::ffi::AVSampleFormat>(format))
        }
    }
}

impl From<stream::Stream<'_>> for AvStream {
    fn from(stream: stream::Stream<'_>) -> Self {
        Self {
            index: stream.index(),
            parameters: stream.parameters(),
            time_base: stream.time_base(),
            rate: stream.avg_frame_rate(),
        }
    }
}

impl Clone for AvStream {
    fn clone(&self) -> Self {
        Self {
            index: self.index,
            parameters: self.parameters.clone(),
            time_base: self.time_base,
            rate: self.rate,
        }
    }
}

impl std::fmt::Debug for AvStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvStream")
            .field("index", &self.index)
            .field("medium", &self.medium())
            .field("codec_id", &self.codec_id())
            .field("time_base", &self.time_base)
            .finish_non_exhaustive()
    }
}
