use ffmpeg_next::{
    Dictionary,
    format::{Pixel, Sample},
    media,
};

use crate::{
    error::{ConfigError, Error, Result},
    frame::{PcmFormat, PictureFormat},
    pin::PinProps,
    stream::AvStream,
};

/// One plane of a decoded picture as the engine laid it out.
#[derive(Clone, Copy, Debug)]
pub struct Plane<'a> {
    pub data: &'a [u8],
    /// Bytes between the starts of two consecutive rows.
    pub stride: usize,
}

#[derive(Debug)]
pub struct AudioUnit<'a> {
    pub format: Sample,
    pub rate: u32,
    pub channels: u16,
    /// Samples per channel.
    pub samples: usize,
    /// One plane per channel when `format` is planar, a single interleaved plane otherwise.
    pub planes: Vec<&'a [u8]>,
}

#[derive(Debug)]
pub struct PictureUnit<'a> {
    pub width: u32,
    pub height: u32,
    pub format: Pixel,
    /// Y, U and V, each with its own stride.
    pub planes: [Plane<'a>; 3],
}

/// A completed unit borrowed from the engine until the next call into it.
#[derive(Debug)]
pub enum DecodedUnit<'a> {
    Audio(AudioUnit<'a>),
    Video(PictureUnit<'a>),
}

/// Open decode state of an external codec engine.
pub trait DecodeEngine {
    fn medium(&self) -> media::Type;

    fn codec_name(&self) -> &str;

    /// Properties of the decoded stream, as known when the engine was opened.
    fn output_props(&self) -> Option<PinProps>;

    /// Feeds one packet, or signals end of input with `None`.
    fn send_packet(&mut self, packet: Option<&ffmpeg_next::Packet>) -> Result<()>;

    /// Next completed unit; `None` when the engine needs more input.
    fn receive_unit(&mut self) -> Result<Option<DecodedUnit<'_>>>;

    /// Drops buffered state so the engine accepts new input after a drain.
    fn reset(&mut self);
}

enum DecoderType {
    Video(ffmpeg_next::codec::decoder::Video),
    Audio(ffmpeg_next::codec::decoder::Audio),
}

/// FFmpeg decode state, opened single-threaded so units come out in input order.
pub struct LibavDecoder {
    inner: DecoderType,
    codec_name: String,
    output_props: PinProps,
    video_frame: ffmpeg_next::frame::Video,
    audio_frame: ffmpeg_next::frame::Audio,
}

impl LibavDecoder {
    pub fn open(stream: &AvStream) -> std::result::Result<Self, ConfigError> {
        let medium = stream.medium();
        if medium != media::Type::Video && medium != media::Type::Audio {
            log::warn!("[LibavDecoder] codec type {:?} not supported, must be audio or video", medium);
            return Err(ConfigError::UnsupportedMediaType(medium));
        }

        let codec_id = stream.codec_id();
        let Some(codec) = ffmpeg_next::decoder::find(codec_id) else {
            log::warn!("[LibavDecoder] codec {:?} not found", codec_id);
            return Err(ConfigError::DecoderNotFound(codec_id));
        };
        let codec_name = codec.name().to_string();

        let open_failed = |source: ffmpeg_next::Error| {
            log::warn!("[LibavDecoder] couldn't open {}: {}", codec_name, source);
            ConfigError::OpenFailed {
                codec: codec_id,
                source,
            }
        };

        let mut decoder_ctx = ffmpeg_next::codec::Context::from_parameters(stream.parameters().clone())
            .map_err(open_failed)?;
        unsafe {
            (*decoder_ctx.as_mut_ptr()).time_base = stream.time_base().into();
        }

        let mut options = Dictionary::new();
        options.set("threads", "1");
        let opened = decoder_ctx
            .decoder()
            .open_as_with(codec, options)
            .map_err(open_failed)?;

        let (inner, output_props) = if medium == media::Type::Video {
            let video = opened.video().map_err(open_failed)?;
            let pixel = negotiated_pixel(video.format(), stream.pixel_format());
            check_colorspace(&codec_name, pixel)?;
            let props = PinProps::Picture(PictureFormat::new(
                stream.width(),
                stream.height(),
                pixel,
            ));
            (DecoderType::Video(video), props)
        } else {
            let audio = opened.audio().map_err(open_failed)?;
            let props = PinProps::Pcm(PcmFormat::new(
                audio.format(),
                audio.rate(),
                audio.channels(),
            ));
            (DecoderType::Audio(audio), props)
        };

        log::debug!("[LibavDecoder] opened {} for stream #{}", codec_name, stream.index());
        Ok(Self {
            inner,
            codec_name,
            output_props,
            video_frame: ffmpeg_next::frame::Video::empty(),
            audio_frame: ffmpeg_next::frame::Audio::empty(),
        })
    }
}

/// Format the opened context settled on, else the one the stream asked for.
fn negotiated_pixel(opened: Pixel, requested: Pixel) -> Pixel {
    if opened != Pixel::None { opened } else { requested }
}

/// `Pixel::None` passes: the format is then checked on every picture.
fn check_colorspace(codec_name: &str, pixel: Pixel) -> std::result::Result<(), ConfigError> {
    if pixel == Pixel::None || PictureFormat::is_yuv420p(pixel) {
        return Ok(());
    }
    log::warn!(
        "[LibavDecoder] unsupported colorspace {:?} for codec \"{}\", only planar YUV 4:2:0 is supported",
        pixel,
        codec_name
    );
    Err(ConfigError::UnsupportedColorspace {
        codec: codec_name.to_string(),
        pixel,
    })
}

fn is_again_or_eof(err: &ffmpeg_next::Error) -> bool {
    match err {
        ffmpeg_next::Error::Eof => true,
        ffmpeg_next::Error::Other { errno } => *errno == ffmpeg_next::util::error::EAGAIN,
        _ => false,
    }
}

impl DecodeEngine for LibavDecoder {
    fn medium(&self) -> media::Type {
        match self.inner {
            DecoderType::Video(_) => media::Type::Video,
            DecoderType::Audio(_) => media::Type::Audio,
        }
    }

    fn codec_name(&self) -> &str {
        &self.codec_name
    }

    fn output_props(&self) -> Option<PinProps> {
        Some(self.output_props.clone())
    }

    fn send_packet(&mut self, packet: Option<&ffmpeg_next::Packet>) -> Result<()> {
        let result = match (&mut self.inner, packet) {
            (DecoderType::Video(decoder), Some(packet)) => decoder.send_packet(packet),
            (DecoderType::Audio(decoder), Some(packet)) => decoder.send_packet(packet),
            (DecoderType::Video(decoder), None) => decoder.send_eof(),
            (DecoderType::Audio(decoder), None) => decoder.send_eof(),
        };
        result.map_err(|e| Error::decode(e.to_string()))
    }

    fn receive_unit(&mut self) -> Result<Option<DecodedUnit<'_>>> {
        match &mut self.inner {
            DecoderType::Video(decoder) => match decoder.receive_frame(&mut self.video_frame) {
                Ok(()) => {
                    let frame = &self.video_frame;
                    if frame.planes() < 3 {
                        return Err(Error::decode(format!(
                            "{:?} picture has {} planes, 3 expected",
                            frame.format(),
                            frame.planes()
                        )));
                    }
                    let plane = move |index: usize| Plane {
                        data: frame.data(index),
                        stride: frame.stride(index),
                    };
                    Ok(Some(DecodedUnit::Video(PictureUnit {
                        width: frame.width(),
                        height: frame.height(),
                        format: frame.format(),
                        planes: [plane(0), plane(1), plane(2)],
                    })))
                }
                Err(err) if is_again_or_eof(&err) => Ok(None),
                Err(err) => Err(Error::decode(err.to_string())),
            },
            DecoderType::Audio(decoder) => match decoder.receive_frame(&mut self.audio_frame) {
                Ok(()) => {
                    let frame = &self.audio_frame;
                    Ok(Some(DecodedUnit::Audio(AudioUnit {
                        format: frame.format(),
                        rate: frame.rate(),
                        channels: frame.channels(),
                        samples: frame.samples(),
                        planes: (0..frame.planes()).map(|index| frame.data(index)).collect(),
                    })))
                }
                Err(err) if is_again_or_eof(&err) => Ok(None),
                Err(err) => Err(Error::decode(err.to_string())),
            },
        }
    }

    fn reset(&mut self) {
        match &mut self.inner {
            DecoderType::Video(decoder) => decoder.flush(),
            DecoderType::Audio(decoder) => decoder.flush(),
        }
    }
}

impl Drop for LibavDecoder {
    fn drop(&mut self) {
        log::debug!("[LibavDecoder] closing {}", self.codec_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opened_format_wins() {
        assert_eq!(negotiated_pixel(Pixel::RGB24, Pixel::None), Pixel::RGB24);
        assert_eq!(negotiated_pixel(Pixel::RGB24, Pixel::YUV420P), Pixel::RGB24);
        assert_eq!(negotiated_pixel(Pixel::None, Pixel::YUVJ420P), Pixel::YUVJ420P);
    }

    #[test]
    fn test_format_fixed_at_open_is_checked() {
        let pixel = negotiated_pixel(Pixel::RGB24, Pixel::None);
        match check_colorspace("h264", pixel) {
            Err(ConfigError::UnsupportedColorspace { codec, pixel }) => {
                assert_eq!(codec, "h264");
                assert_eq!(pixel, Pixel::RGB24);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(check_colorspace("h264", Pixel::YUVJ420P).is_ok());
        assert!(check_colorspace("h264", Pixel::None).is_ok());
    }
}
