//! Decode module: encoded packets in, PCM or planar pictures out.
//!
//! ```text
//!   packet payload ──► DecodeEngine ──► reassembly ──► pin 0
//!                      (send/receive)    audio: channel-contiguous PCM
//!                                        video: tight Y | U | V, strides stripped
//! ```
//!
//! A unit that fails to decode is logged and dropped; the engine keeps its
//! state and the next packet is decoded normally. A payload of any other kind
//! than a packet is a contract violation and is reported to the caller.

use ffmpeg_next::media;

use crate::{
    data::{Data, DataKind, Payload},
    decoder::{AudioUnit, DecodeEngine, DecodedUnit, LibavDecoder, PictureUnit, Plane},
    error::{Error, Result},
    frame::{PcmData, PcmFormat, PictureData, PictureFormat, PlaneLayout},
    module::Module,
    pin::Pin,
    stream::AvStream,
};

pub struct Decode {
    engine: Box<dyn DecodeEngine>,
    pins: Vec<Pin>,
}

impl Decode {
    /// Opens an FFmpeg decoder for `stream`. Fails if the stream can't be decoded.
    pub fn new(stream: &AvStream) -> Result<Self> {
        let engine = LibavDecoder::open(stream)?;
        Ok(Self::with_engine(Box::new(engine)))
    }

    pub fn with_engine(engine: Box<dyn DecodeEngine>) -> Self {
        let pin = match engine.output_props() {
            Some(props) => Pin::with_props(props),
            None => Pin::new(),
        };
        Self {
            engine,
            pins: vec![pin],
        }
    }

    pub fn medium(&self) -> media::Type {
        self.engine.medium()
    }

    pub fn codec_name(&self) -> &str {
        self.engine.codec_name()
    }

    /// Feeds `packet` (or end of input) and emits every unit it completes.
    fn decode(&mut self, packet: Option<&ffmpeg_next::Packet>) -> Result<()> {
        let medium = self.engine.medium();
        if let Err(e) = self.engine.send_packet(packet) {
            log::warn!("[Decode] error encountered while decoding {:?}: {}", medium, e);
            return Ok(());
        }

        let mut delivery = Ok(());
        loop {
            let payload = match self.engine.receive_unit() {
                Ok(Some(unit)) => match reassemble(&unit) {
                    Ok(payload) => payload,
                    Err(e) => {
                        log::warn!("[Decode] dropping decoded unit: {}", e);
                        continue;
                    }
                },
                Ok(None) => break,
                Err(e) => {
                    log::warn!("[Decode] error encountered while decoding {:?}: {}", medium, e);
                    break;
                }
            };

            log::trace!("[Decode] emitting {}", payload);
            if let Err(e) = self.pins[0].emit(payload.share()) {
                if delivery.is_ok() {
                    delivery = Err(e);
                } else {
                    log::warn!("[Decode] further delivery failure: {}", e);
                }
            }
        }
        delivery
    }
}

impl Module for Decode {
    fn name(&self) -> &'static str {
        "Decode"
    }

    fn process(&mut self, data: Data) -> Result<()> {
        let Some(packet) = data.as_packet() else {
            log::warn!("[Decode] invalid packet type: {}", data.kind());
            return Err(Error::ContractViolation {
                module: self.name(),
                expected: DataKind::Packet,
                found: data.kind(),
            });
        };
        self.decode(Some(packet.packet()))
    }

    /// Drains the engine, emits what it held back, and leaves it ready for
    /// new packets.
    fn flush(&mut self) -> Result<()> {
        let result = self.decode(None);
        self.engine.reset();
        result
    }

    fn pins(&self) -> &[Pin] {
        &self.pins
    }

    fn pins_mut(&mut self) -> &mut [Pin] {
        &mut self.pins
    }
}

fn reassemble(unit: &DecodedUnit<'_>) -> Result<Payload> {
    match unit {
        DecodedUnit::Audio(audio) => audio_payload(audio).map(Payload::from),
        DecodedUnit::Video(picture) => picture_payload(picture).map(Payload::from),
    }
}

fn audio_payload(unit: &AudioUnit<'_>) -> Result<PcmData> {
    if unit.samples == 0 || unit.channels == 0 {
        return Err(Error::decode("audio unit has no samples"));
    }
    let format = PcmFormat::new(unit.format, unit.rate, unit.channels);
    let channel_size = format.channel_size(unit.samples);
    let mut out = PcmData::new(format, unit.samples);

    if format.is_planar() {
        let channels = unit.channels as usize;
        if unit.planes.len() < channels {
            return Err(Error::decode(format!(
                "expected {} audio planes, engine returned {}",
                channels,
                unit.planes.len()
            )));
        }
        for (channel, dst) in out.data_mut().chunks_exact_mut(channel_size).enumerate() {
            let src = unit.planes[channel]
                .get(..channel_size)
                .ok_or_else(|| Error::decode(format!("audio plane {} is short", channel)))?;
            dst.copy_from_slice(src);
        }
    } else {
        let size = out.size();
        let src = unit
            .planes
            .first()
            .and_then(|plane| plane.get(..size))
            .ok_or_else(|| Error::decode("interleaved audio plane is short"))?;
        out.data_mut().copy_from_slice(src);
    }
    Ok(out)
}

fn picture_payload(unit: &PictureUnit<'_>) -> Result<PictureData> {
    if !PictureFormat::is_yuv420p(unit.format) {
        return Err(Error::decode(format!(
            "unsupported colorspace {:?}, only planar YUV 4:2:0 is supported",
            unit.format
        )));
    }
    let mut out = PictureData::new(PictureFormat::new(unit.width, unit.height, unit.format));
    for (index, plane) in unit.planes.iter().enumerate() {
        let Some(layout) = out.layout(index) else {
            break;
        };
        let Some(dst) = out.plane_mut(index) else {
            return Err(Error::decode(format!("picture plane {} out of bounds", index)));
        };
        copy_plane(plane, layout, dst).map_err(|e| Error::decode(format!("plane {}: {}", index, e)))?;
    }
    Ok(out)
}

/// Copies `layout.rows` rows of `layout.width` bytes, dropping the stride padding.
fn copy_plane(src: &Plane<'_>, layout: PlaneLayout, dst: &mut [u8]) -> Result<()> {
    if layout.rows == 0 || layout.width == 0 {
        return Ok(());
    }
    if src.stride < layout.width {
        return Err(Error::decode(format!(
            "stride {} is narrower than row width {}",
            src.stride, layout.width
        )));
    }
    let needed = (layout.rows - 1) * src.stride + layout.width;
    if src.data.len() < needed {
        return Err(Error::decode(format!(
            "plane holds {} bytes, {} needed",
            src.data.len(),
            needed
        )));
    }
    for row in 0..layout.rows {
        let from = row * src.stride;
        let to = row * layout.width;
        dst[to..to + layout.width].copy_from_slice(&src.data[from..from + layout.width]);
    }
    Ok(())
}

#[cfg(test)]
#[path = "decode_test.rs"]
mod decode_test;
