use std::ffi::CString;
use std::path::Path;

use ffmpeg_next::{Dictionary, Rational, media};

use crate::{
    data::{Data, Payload},
    error::{Error, Result},
    module::Module,
    packet::PacketData,
    pin::{Pin, PinProps},
    stream::AvStream,
};

/// Source module reading a container through FFmpeg.
///
/// Exposes one pin per elementary stream, in stream order, each carrying the
/// stream's [`AvStream`]. Every call to `process` reads one packet and emits it
/// on the pin of its stream; the input payload is only a tick.
pub struct LibavDemux {
    input: ffmpeg_next::format::context::Input,
    time_bases: Vec<Rational>,
    pins: Vec<Pin>,
    packets: u64,
}

impl LibavDemux {
    pub fn open(url: &str) -> Result<Self> {
        Self::open_with(url, None, None)
    }

    /// Opens `url`, optionally forcing the input format by name (e.g. "h264").
    pub fn open_with(url: &str, format: Option<&str>, options: Option<Dictionary>) -> Result<Self> {
        use ffmpeg_next::format::format::Format;

        let path = Path::new(url);
        let options = options.unwrap_or_else(Dictionary::new);
        let input = match format {
            Some(name) => {
                let format = find_input_format(name)?;
                ffmpeg_next::format::open_with(path, &Format::Input(format), options)?.input()
            }
            None => ffmpeg_next::format::input_with_dictionary(path, options)?,
        };

        let mut time_bases = Vec::new();
        let mut pins = Vec::new();
        for stream in input.streams() {
            let stream = AvStream::from(stream);
            log::info!(
                "[LibavDemux] {}: stream #{} {:?} {:?}",
                url,
                stream.index(),
                stream.medium(),
                stream.codec_id()
            );
            time_bases.push(stream.time_base());
            pins.push(Pin::with_props(PinProps::Encoded(stream)));
        }

        Ok(Self {
            input,
            time_bases,
            pins,
            packets: 0,
        })
    }

    /// Configuration of every stream, indexed like the pins.
    pub fn streams(&self) -> impl Iterator<Item = &AvStream> {
        self.pins
            .iter()
            .filter_map(|pin| pin.props().and_then(PinProps::stream))
    }

    /// Index of the first pin carrying a stream of `medium`.
    pub fn find_pin(&self, medium: media::Type) -> Option<usize> {
        self.pins
            .iter()
            .position(|pin| pin.props().is_some_and(|props| props.medium() == medium))
    }

    pub fn packets(&self) -> u64 {
        self.packets
    }
}

/// Resolves an input format by name via av_find_input_format.
fn find_input_format(name: &str) -> Result<ffmpeg_next::format::format::Input> {
    let cname =
        CString::new(name).map_err(|e| anyhow::anyhow!("invalid format name {:?}: {}", name, e))?;
    let ptr = unsafe { ffmpeg_next::ffi::av_find_input_format(cname.as_ptr()) };
    if ptr.is_null() {
        return Err(anyhow::anyhow!("input format not found: {}", name).into());
    }
    Ok(unsafe { ffmpeg_next::format::format::Input::wrap(ptr as *mut _) })
}

impl Module for LibavDemux {
    fn name(&self) -> &'static str {
        "LibavDemux"
    }

    /// Returns [`Error::Eof`] once the input is exhausted.
    fn process(&mut self, _tick: Data) -> Result<()> {
        let mut packet = ffmpeg_next::Packet::empty();
        match packet.read(&mut self.input) {
            Ok(()) => {}
            Err(ffmpeg_next::Error::Eof) => {
                log::debug!("[LibavDemux] end of input after {} packets", self.packets);
                return Err(Error::Eof);
            }
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffmpeg_next::util::error::EAGAIN => {
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        let index = packet.stream();
        let Some(time_base) = self.time_bases.get(index).copied() else {
            log::warn!("[LibavDemux] packet for unknown stream #{}", index);
            return Ok(());
        };
        self.packets += 1;
        let payload = Payload::from(PacketData::from((packet, time_base)));
        self.pins[index].emit(payload.share())?;
        Ok(())
    }

    fn pins(&self) -> &[Pin] {
        &self.pins
    }

    fn pins_mut(&mut self) -> &mut [Pin] {
        &mut self.pins
    }
}
