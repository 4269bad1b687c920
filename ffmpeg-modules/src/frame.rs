use std::fmt::{Display, Formatter};

use bytes::BytesMut;
use ffmpeg_next::format::{Pixel, Sample};

/// Negotiated layout of a PCM stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample: Sample,
    pub rate: u32,
    pub channels: u16,
}

impl PcmFormat {
    pub fn new(sample: Sample, rate: u32, channels: u16) -> Self {
        Self {
            sample,
            rate,
            channels,
        }
    }

    pub fn is_planar(&self) -> bool {
        self.sample.is_planar()
    }

    /// Bytes one channel occupies for `samples` samples.
    pub fn channel_size(&self, samples: usize) -> usize {
        samples * self.sample.bytes()
    }
}

/// Decoded audio.
///
/// Planar formats keep each channel contiguous, channel `i` starting at
/// `i * channel_size`. Interleaved formats keep the engine's packed layout.
#[derive(Debug)]
pub struct PcmData {
    format: PcmFormat,
    samples: usize,
    buf: BytesMut,
}

impl PcmData {
    pub fn new(format: PcmFormat, samples: usize) -> Self {
        let size = format.channels as usize * format.channel_size(samples);
        Self {
            format,
            samples,
            buf: BytesMut::zeroed(size),
        }
    }

    pub fn format(&self) -> PcmFormat {
        self.format
    }

    /// Samples per channel.
    pub fn samples(&self) -> usize {
        self.samples
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

    /// Bytes of channel `index`. Only meaningful for planar formats.
    pub fn channel(&self, index: usize) -> Option<&[u8]> {
        if !self.format.is_planar() || index >= self.format.channels as usize {
            return None;
        }
        let size = self.format.channel_size(self.samples);
        self.buf.get(index * size..(index + 1) * size)
    }
}

/// Negotiated geometry of a picture stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PictureFormat {
    pub width: u32,
    pub height: u32,
    pub pixel: Pixel,
}

impl PictureFormat {
    pub fn new(width: u32, height: u32, pixel: Pixel) -> Self {
        Self {
            width,
            height,
            pixel,
        }
    }

    /// Planar YUV 4:2:0, in either range.
    pub fn is_yuv420p(pixel: Pixel) -> bool {
        matches!(pixel, Pixel::YUV420P | Pixel::YUVJ420P)
    }

    /// Tightly packed 4:2:0 buffer size: `width * height * 3 / 2`.
    pub fn frame_size(&self) -> usize {
        (self.width as usize * self.height as usize * 3) / 2
    }

    /// Tight layout of the three planes inside a frame buffer.
    pub fn planes(&self) -> [PlaneLayout; 3] {
        let w = self.width as usize;
        let h = self.height as usize;
        let luma = w * h;
        [
            PlaneLayout {
                offset: 0,
                width: w,
                rows: h,
            },
            PlaneLayout {
                offset: luma,
                width: w / 2,
                rows: h / 2,
            },
            PlaneLayout {
                offset: luma * 5 / 4,
                width: w / 2,
                rows: h / 2,
            },
        ]
    }
}

impl Display for PictureFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}x{} {:?}", self.width, self.height, self.pixel)
    }
}

/// Position of one plane in a tightly packed picture buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaneLayout {
    pub offset: usize,
    /// Bytes per row.
    pub width: usize,
    pub rows: usize,
}

impl PlaneLayout {
    pub fn size(&self) -> usize {
        self.width * self.rows
    }
}

/// Decoded planar 4:2:0 picture.
#[derive(Debug)]
pub struct PictureData {
    format: PictureFormat,
    planes: [PlaneLayout; 3],
    buf: BytesMut,
}

impl PictureData {
    pub fn new(format: PictureFormat) -> Self {
        Self {
            format,
            planes: format.planes(),
            buf: BytesMut::zeroed(format.frame_size()),
        }
    }

    pub fn format(&self) -> PictureFormat {
        self.format
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

    pub fn layout(&self, index: usize) -> Option<PlaneLayout> {
        self.planes.get(index).copied()
    }

    pub fn plane(&self, index: usize) -> Option<&[u8]> {
        let layout = self.planes.get(index)?;
        self.buf.get(layout.offset..layout.offset + layout.size())
    }

    pub fn plane_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        let layout = *self.planes.get(index)?;
        self.buf.get_mut(layout.offset..layout.offset + layout.size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffmpeg_next::format::sample::Type;

    #[test]
    fn test_picture_layout_16x16() {
        let pic = PictureData::new(PictureFormat::new(16, 16, Pixel::YUV420P));
        assert_eq!(pic.size(), 384);
        let [y, u, v] = pic.format().planes();
        assert_eq!((y.offset, y.size()), (0, 256));
        assert_eq!((u.offset, u.size()), (256, 64));
        assert_eq!((v.offset, v.size()), (320, 64));
        assert_eq!(pic.plane(2).map(<[u8]>::len), Some(64));
        assert!(pic.plane(3).is_none());
    }

    #[test]
    fn test_picture_layout_non_square() {
        let format = PictureFormat::new(8, 4, Pixel::YUVJ420P);
        assert_eq!(format.frame_size(), 48);
        let [_, u, v] = format.planes();
        assert_eq!((u.offset, u.width, u.rows), (32, 4, 2));
        assert_eq!(v.offset, 40);
        assert!(PictureFormat::is_yuv420p(format.pixel));
        assert!(!PictureFormat::is_yuv420p(Pixel::RGB24));
    }

    #[test]
    fn test_pcm_planar_channels() {
        let format = PcmFormat::new(Sample::I16(Type::Planar), 44100, 2);
        let mut pcm = PcmData::new(format, 4);
        assert_eq!(pcm.size(), 16);
        pcm.data_mut()[8..].fill(0xAB);
        assert_eq!(pcm.channel(0), Some(&[0u8; 8][..]));
        assert_eq!(pcm.channel(1), Some(&[0xABu8; 8][..]));
        assert!(pcm.channel(2).is_none());
    }

    #[test]
    fn test_pcm_interleaved_has_no_channel_view() {
        let format = PcmFormat::new(Sample::F32(Type::Packed), 48000, 2);
        let pcm = PcmData::new(format, 10);
        assert_eq!(pcm.size(), 80);
        assert!(pcm.channel(0).is_none());
    }
}
