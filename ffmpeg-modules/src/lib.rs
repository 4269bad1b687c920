//! Synchronous media processing graph: modules wired pin to entrypoint,
//! payloads pushed through in emission order.
//!
//! ```text
//!  LibavDemux ─pin 0─► Decode ─► Print
//!             ─pin 1─► Decode ─► Null
//! ```

use std::ffi::{CStr, c_char, c_int, c_void};
use std::sync::OnceLock;

use ffmpeg_next::ffi;

/// Registers FFmpeg components, aligns FFmpeg's log level with the `log` max
/// level and routes FFmpeg's own messages through `log` under the `ffmpeg`
/// target. Safe to call more than once.
pub fn init() -> anyhow::Result<()> {
    static INIT: OnceLock<Result<(), ffmpeg_next::Error>> = OnceLock::new();
    let result = INIT.get_or_init(|| {
        ffmpeg_next::init()?;
        ffmpeg_next::util::log::set_level(ffmpeg_log_level(log::max_level()));
        unsafe { ffi::av_log_set_callback(Some(forward_ffmpeg_log)) };
        Ok(())
    });
    result
        .clone()
        .map_err(|e| anyhow::anyhow!("ffmpeg_next init: {}", e))
}

fn ffmpeg_log_level(level: log::LevelFilter) -> ffmpeg_next::util::log::Level {
    use ffmpeg_next::util::log::Level;

    match level {
        log::LevelFilter::Off => Level::Quiet,
        log::LevelFilter::Error => Level::Error,
        log::LevelFilter::Warn => Level::Warning,
        log::LevelFilter::Info => Level::Info,
        log::LevelFilter::Debug => Level::Verbose,
        log::LevelFilter::Trace => Level::Debug,
    }
}

/// Maps an `AV_LOG_*` value onto a `log` level.
fn log_level_of(level: c_int) -> log::Level {
    match level {
        l if l <= ffi::AV_LOG_ERROR as c_int => log::Level::Error,
        l if l <= ffi::AV_LOG_WARNING as c_int => log::Level::Warn,
        l if l <= ffi::AV_LOG_INFO as c_int => log::Level::Info,
        l if l <= ffi::AV_LOG_VERBOSE as c_int => log::Level::Debug,
        _ => log::Level::Trace,
    }
}

unsafe extern "C" fn forward_ffmpeg_log(
    avcl: *mut c_void,
    level: c_int,
    fmt: *const c_char,
    args: ffi::va_list,
) {
    if level > unsafe { ffi::av_log_get_level() } {
        return;
    }
    let target = log_level_of(level);
    if !log::log_enabled!(target: "ffmpeg", target) {
        return;
    }

    let mut line = [0 as c_char; 1024];
    let mut print_prefix: c_int = 1;
    let written = unsafe {
        ffi::av_log_format_line2(
            avcl,
            level,
            fmt,
            args,
            line.as_mut_ptr(),
            line.len() as c_int,
            &mut print_prefix,
        )
    };
    if written < 0 {
        return;
    }
    let text = unsafe { CStr::from_ptr(line.as_ptr()) }.to_string_lossy();
    let text = text.trim_end();
    if !text.is_empty() {
        log::log!(target: "ffmpeg", target, "{}", text);
    }
}

pub mod connect;
pub mod data;
pub mod decode;
pub mod decoder;
pub mod demux;
pub mod error;
pub mod frame;
pub mod module;
pub mod packet;
pub mod pin;
pub mod signal;
pub mod sink;
pub mod stream;

#[cfg(test)]
mod fixtures;

pub use connect::{connect, connect_modules, connect_output_to_input};
pub use data::{Data, DataKind, Payload, RawData};
pub use decode::Decode;
pub use demux::LibavDemux;
pub use error::{ConfigError, DeliveryError, Error, Result};
pub use module::{Module, ModuleRef, create};
pub use pin::{Pin, PinProps};
pub use sink::{Null, Print};
pub use stream::AvStream;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice() -> anyhow::Result<()> {
        init()?;
        init()?;
        Ok(())
    }

    #[test]
    fn test_ffmpeg_levels_map_onto_log() {
        assert_eq!(log_level_of(ffi::AV_LOG_FATAL as c_int), log::Level::Error);
        assert_eq!(log_level_of(ffi::AV_LOG_ERROR as c_int), log::Level::Error);
        assert_eq!(log_level_of(ffi::AV_LOG_WARNING as c_int), log::Level::Warn);
        assert_eq!(log_level_of(ffi::AV_LOG_INFO as c_int), log::Level::Info);
        assert_eq!(log_level_of(ffi::AV_LOG_VERBOSE as c_int), log::Level::Debug);
        assert_eq!(log_level_of(ffi::AV_LOG_DEBUG as c_int), log::Level::Trace);
    }

    #[test]
    fn test_ffmpeg_log_after_init() -> anyhow::Result<()> {
        init()?;
        // Delivered through the installed callback.
        unsafe {
            ffi::av_log(
                std::ptr::null_mut(),
                ffi::AV_LOG_ERROR as c_int,
                c"forwarded %d\n".as_ptr(),
                7 as c_int,
            )
        };
        Ok(())
    }

    #[test]
    fn test_log_level_mapping() {
        use ffmpeg_next::util::log::Level;
        assert!(matches!(ffmpeg_log_level(log::LevelFilter::Off), Level::Quiet));
        assert!(matches!(ffmpeg_log_level(log::LevelFilter::Warn), Level::Warning));
    }
}
