//! Drives a demux → decode → sink graph from one thread until end of input.

use ffmpeg_modules::{
    Decode, LibavDemux, Module, ModuleRef, Null, Payload, Print, RawData, connect_modules, create,
    data::Data,
};
use ffmpeg_next::media;
use tokio_util::sync::CancellationToken;

use crate::config::PlayerConfig;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlayStats {
    pub packets: u64,
    pub decoded: u64,
    pub bytes: u64,
    pub delivery_failures: u64,
}

struct Branch {
    pin: usize,
    decode: ModuleRef<Decode>,
    print: ModuleRef<Print>,
}

fn tick() -> Data {
    Payload::from(RawData::new(0)).share()
}

fn wants(config: &PlayerConfig, medium: media::Type) -> bool {
    match medium {
        media::Type::Video => config.decode_video(),
        media::Type::Audio => config.decode_audio(),
        _ => false,
    }
}

/// Runs the whole graph on the calling thread. Returns once the input is
/// exhausted or `cancel` fires.
pub fn play(config: &PlayerConfig, cancel: CancellationToken) -> anyhow::Result<PlayStats> {
    let demux = create(LibavDemux::open_with(config.input(), config.format(), None)?);

    let streams: Vec<_> = demux.borrow().streams().cloned().collect();
    let mut branches = Vec::new();
    let mut nulls = Vec::new();
    for (pin, stream) in streams.iter().enumerate() {
        if wants(config, stream.medium()) {
            match Decode::new(stream) {
                Ok(decode) => {
                    log::info!("[Player] stream #{}: decoding with {}", pin, decode.codec_name());
                    let decode = create(decode);
                    let print = create(Print::new());
                    connect_modules(&demux, pin, &decode)?;
                    connect_modules(&decode, 0, &print)?;
                    branches.push(Branch { pin, decode, print });
                    continue;
                }
                Err(e) => log::warn!("[Player] stream #{}: {}, discarding", pin, e),
            }
        }
        let null = create(Null::new());
        connect_modules(&demux, pin, &null)?;
        nulls.push(null);
    }

    let mut stats = PlayStats::default();
    loop {
        if cancel.is_cancelled() {
            log::info!("[Player] cancelled");
            break;
        }
        let result = demux.borrow_mut().process(tick());
        match result {
            Ok(()) => {}
            Err(e) if e.is_eof() => break,
            Err(e) if e.as_delivery().is_some() => {
                stats.delivery_failures += 1;
                log::warn!("[Player] {}", e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    // Source first, so what it still holds reaches the decoders before they drain.
    if let Err(e) = demux.borrow_mut().flush() {
        log::warn!("[Player] flushing demux: {}", e);
    }
    for branch in &branches {
        if let Err(e) = branch.decode.borrow_mut().flush() {
            stats.delivery_failures += 1;
            log::warn!("[Player] flushing stream #{}: {}", branch.pin, e);
        }
    }

    stats.packets = demux.borrow().packets();
    for branch in &branches {
        let print = branch.print.borrow();
        stats.decoded += print.received();
        stats.bytes += print.bytes();
    }

    drop(demux);
    drop(branches);
    drop(nulls);
    log::info!("[Player] done: {:?}", stats);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One 16x16 mid-gray IDR picture, shared with the library tests.
    const H264_GRAY_FRAME: &[u8] = include_bytes!("../ffmpeg-modules/testdata/gray16.h264");

    #[test]
    fn test_fixture_is_annex_b() {
        assert_eq!(H264_GRAY_FRAME.len(), 45);
        assert_eq!(&H264_GRAY_FRAME[..5], &[0x00, 0x00, 0x00, 0x01, 0x67]);
    }

    #[test]
    fn test_play_raw_h264() -> anyhow::Result<()> {
        ffmpeg_modules::init()?;
        let path = std::env::temp_dir().join(format!("player-{}.h264", std::process::id()));
        std::fs::write(&path, [H264_GRAY_FRAME, H264_GRAY_FRAME].concat())?;

        let config = PlayerConfig::for_input(&path.to_string_lossy(), Some("h264"));
        let stats = play(&config, CancellationToken::new())?;
        let _ = std::fs::remove_file(&path);

        assert!(stats.packets >= 1);
        assert!(stats.decoded >= 1);
        assert_eq!(stats.bytes, stats.decoded * 16 * 16 * 3 / 2);
        assert_eq!(stats.delivery_failures, 0);
        Ok(())
    }

    #[test]
    fn test_cancelled_before_start() -> anyhow::Result<()> {
        ffmpeg_modules::init()?;
        let path = std::env::temp_dir().join(format!("player-cancel-{}.h264", std::process::id()));
        std::fs::write(&path, H264_GRAY_FRAME)?;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let config = PlayerConfig::for_input(&path.to_string_lossy(), Some("h264"));
        let stats = play(&config, cancel)?;
        let _ = std::fs::remove_file(&path);

        assert_eq!(stats.packets, 0);
        Ok(())
    }

    #[test]
    fn test_missing_input() -> anyhow::Result<()> {
        ffmpeg_modules::init()?;
        let config = PlayerConfig::for_input("/nonexistent/clip.mp4", None);
        assert!(play(&config, CancellationToken::new()).is_err());
        Ok(())
    }
}
