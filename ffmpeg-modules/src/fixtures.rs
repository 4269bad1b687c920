//! Encoded byte fixtures shared by the tests.

/// First frame of an MP3 sine wave, Xing "Info" header included.
pub const MP3_SINE_FRAME: &[u8] = include_bytes!("../testdata/sine.mp3");

/// One 16x16 mid-gray IDR picture, Annex-B framed.
pub const H264_GRAY_FRAME: &[u8] = include_bytes!("../testdata/gray16.h264");
