use crate::media::MediaStream;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Логирование с временными метками.
///
/// `filter` в формате `EnvFilter` ("info", "peercall_lib=debug" и т.п.).
/// Повторный вызов ничего не делает.
pub fn init(filter: &str) {
    // Проверяем конфигурацию логирования
    if !crate::config::LOGGING_ENABLED || !crate::config::dev::ENABLE_LOGGING {
        return;
    }

    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
        .with_target(false)
        // stdout занят консолью
        .with_writer(std::io::stderr)
        .try_init();
}

/// Печать дорожек потока при появлении
pub fn dump_stream(label: &str, stream: &MediaStream) {
    for track in &stream.tracks {
        tracing::debug!(
            "{label} stream={} track={} kind={:?} label={:?}",
            stream.id,
            track.id,
            track.kind,
            track.label
        );
    }
}
