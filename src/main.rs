use tokio_util::sync::CancellationToken;

mod config;
mod player;

fn init_logging(level: log::LevelFilter) {
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .filter_module("ffmpeg_modules", level)
        .filter_module("media_player", level)
        .filter_module("ffmpeg", level)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::config();
    init_logging(config.log_level());
    ffmpeg_modules::init()?;

    let cancel = CancellationToken::new();
    let mut handle = {
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || player::play(config, cancel))
    };

    let stats = tokio::select! {
        joined = &mut handle => joined??,
        _ = tokio::signal::ctrl_c() => {
            log::info!("interrupted, stopping");
            cancel.cancel();
            handle.await??
        },
    };

    println!(
        "{} packets, {} decoded payloads ({} bytes)",
        stats.packets, stats.decoded, stats.bytes
    );
    Ok(())
}
