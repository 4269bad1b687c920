use std::fmt;

use ffmpeg_next::Rational;

/// Encoded packet payload produced by a demultiplexer.
///
/// Owns an FFmpeg packet reference for as long as the payload lives, so the
/// packet stays valid for every sink the payload is delivered to.
pub struct PacketData {
    packet: ffmpeg_next::codec::packet::Packet,
    time_base: Rational,
}

impl PacketData {
    /// Packet with an uninitialized buffer of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            packet: ffmpeg_next::codec::packet::Packet::new(size),
            time_base: Rational::new(0, 1),
        }
    }

    /// Packet holding a copy of `bytes`.
    pub fn copy(bytes: &[u8]) -> Self {
        Self {
            packet: ffmpeg_next::codec::packet::Packet::copy(bytes),
            time_base: Rational::new(0, 1),
        }
    }

    pub fn pts(&self) -> Option<i64> {
        self.packet.pts()
    }

    pub fn dts(&self) -> Option<i64> {
        self.packet.dts()
    }

    pub fn size(&self) -> usize {
        self.packet.size()
    }

    /// Index of the elementary stream this packet was read from.
    pub fn index(&self) -> usize {
        self.packet.stream()
    }

    pub fn data(&self) -> &[u8] {
        self.packet.data().unwrap_or_default()
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        self.packet.data_mut().unwrap_or_default()
    }

    pub fn is_key(&self) -> bool {
        self.packet.is_key()
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn packet(&self) -> &ffmpeg_next::codec::packet::Packet {
        &self.packet
    }
}

impl From<(ffmpeg_next::codec::packet::Packet, Rational)> for PacketData {
    fn from((packet, time_base): (ffmpeg_next::codec::packet::Packet, Rational)) -> Self {
        Self { packet, time_base }
    }
}

impl fmt::Debug for PacketData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PacketData")
            .field("index", &self.index())
            .field("size", &self.size())
            .field("pts", &self.pts())
            .field("dts", &self.dts())
            .field("time_base", &self.time_base)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_copy() {
        let packet = PacketData::copy(&[0, 0, 0, 1, 0x67]);
        assert_eq!(packet.size(), 5);
        assert_eq!(packet.data(), &[0, 0, 0, 1, 0x67]);
        assert_eq!(packet.pts(), None);
    }

    #[test]
    fn test_packet_new_is_writable() {
        let mut packet = PacketData::new(4);
        assert_eq!(packet.size(), 4);
        packet.data_mut().copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(packet.data(), &[1, 2, 3, 4]);
        assert_eq!(packet.size(), 4);
    }
}
