//! The payload family moved between modules.
//!
//! A [`Payload`] is created per processing call and handed to [`Signal::emit`]
//! wrapped in an `Arc`, so every sink of a pin shares the same instance. Once
//! emitted it must be treated as immutable; producers mutate it through
//! [`Payload::data_mut`] only while they are still the sole owner.
//!
//! [`Signal::emit`]: crate::signal::Signal::emit

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use bytes::BytesMut;

use crate::frame::{PcmData, PictureData};
use crate::packet::PacketData;

/// Shared handle to a payload. Lives as long as its longest holder.
pub type Data = Arc<Payload>;

/// Tag of a payload variant, checked at the start of `process`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataKind {
    Raw,
    Packet,
    Pcm,
    Picture,
}

impl Display for DataKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        let name = match self {
            DataKind::Raw => "raw",
            DataKind::Packet => "packet",
            DataKind::Pcm => "pcm",
            DataKind::Picture => "picture",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub enum Payload {
    Raw(RawData),
    Packet(PacketData),
    Pcm(PcmData),
    Picture(PictureData),
}

impl Payload {
    pub fn kind(&self) -> DataKind {
        match self {
            Payload::Raw(_) => DataKind::Raw,
            Payload::Packet(_) => DataKind::Packet,
            Payload::Pcm(_) => DataKind::Pcm,
            Payload::Picture(_) => DataKind::Picture,
        }
    }

    /// Exact byte size, fixed at construction.
    pub fn size(&self) -> usize {
        match self {
            Payload::Raw(raw) => raw.size(),
            Payload::Packet(packet) => packet.size(),
            Payload::Pcm(pcm) => pcm.size(),
            Payload::Picture(pic) => pic.size(),
        }
    }

    pub fn data(&self) -> &[u8] {
        match self {
            Payload::Raw(raw) => raw.data(),
            Payload::Packet(packet) => packet.data(),
            Payload::Pcm(pcm) => pcm.data(),
            Payload::Picture(pic) => pic.data(),
        }
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        match self {
            Payload::Raw(raw) => raw.data_mut(),
            Payload::Packet(packet) => packet.data_mut(),
            Payload::Pcm(pcm) => pcm.data_mut(),
            Payload::Picture(pic) => pic.data_mut(),
        }
    }

    pub fn as_packet(&self) -> Option<&PacketData> {
        match self {
            Payload::Packet(packet) => Some(packet),
            _ => None,
        }
    }

    pub fn as_pcm(&self) -> Option<&PcmData> {
        match self {
            Payload::Pcm(pcm) => Some(pcm),
            _ => None,
        }
    }

    pub fn as_picture(&self) -> Option<&PictureData> {
        match self {
            Payload::Picture(pic) => Some(pic),
            _ => None,
        }
    }

    /// Wraps the payload for delivery.
    pub fn share(self) -> Data {
        Arc::new(self)
    }
}

impl Display for Payload {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{} payload {{ size: {} }}", self.kind(), self.size())
    }
}

impl From<RawData> for Payload {
    fn from(value: RawData) -> Self {
        Payload::Raw(value)
    }
}

impl From<PacketData> for Payload {
    fn from(value: PacketData) -> Self {
        Payload::Packet(value)
    }
}

impl From<PcmData> for Payload {
    fn from(value: PcmData) -> Self {
        Payload::Pcm(value)
    }
}

impl From<PictureData> for Payload {
    fn from(value: PictureData) -> Self {
        Payload::Picture(value)
    }
}

/// Plain bytes with no media semantics.
#[derive(Debug, Default)]
pub struct RawData {
    buf: BytesMut,
}

impl RawData {
    /// Zero-filled buffer of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            buf: BytesMut::zeroed(size),
        }
    }

    pub fn copy(bytes: &[u8]) -> Self {
        Self {
            buf: BytesMut::from(bytes),
        }
    }

    pub fn size(&self) -> usize {
        self.buf.len()
    }

    pub fn data(&self) -> &[u8] {
        &self.buf
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_payload_size_and_kind() {
        let mut payload = Payload::from(RawData::new(16));
        assert_eq!(payload.kind(), DataKind::Raw);
        assert_eq!(payload.size(), 16);
        assert!(payload.data().iter().all(|b| *b == 0));

        payload.data_mut()[3] = 7;
        assert_eq!(payload.data()[3], 7);
        assert_eq!(payload.size(), 16);
        assert!(payload.as_packet().is_none());
    }

    #[test]
    fn test_shared_payload_is_same_instance() {
        let data = Payload::from(RawData::copy(b"abc")).share();
        let other = Arc::clone(&data);
        assert!(Arc::ptr_eq(&data, &other));
        assert_eq!(other.data(), b"abc");
        assert_eq!(format!("{data}"), "raw payload { size: 3 }");
    }
}
