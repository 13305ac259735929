use tracing::{
    Level,
    subscriber::{SetGlobalDefaultError, set_global_default},
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::Targets, fmt::format::FmtSpan, layer::SubscriberExt};

/// Name of the log file written in the working directory.
const LOG_FILE: &str = "frame-grabber.log";

/// Installs the global logger writing to stdout and the log file.
///
/// The returned guards flush the writers when dropped and must be held until exit.
pub fn setup_logger(debug: bool) -> Result<[WorkerGuard; 2], SetGlobalDefaultError> {
    let default_level = if debug { Level::TRACE } else { Level::INFO };

    let filter = Targets::new()
        .with_default(default_level)
        .with_target("winit", Level::WARN);

    // stdout logger
    let (std_writer, std_guard) = tracing_appender::non_blocking(std::io::stdout());
    let std_logger = tracing_subscriber::fmt::layer()
        .with_writer(std_writer)
        .with_ansi(false)
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE);

    // file logger
    let file_appender = tracing_appender::rolling::never(".", LOG_FILE);
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
    let file_logger = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE);

    // Register loggers
    let collector = tracing_subscriber::registry()
        .with(std_logger)
        .with(file_logger)
        .with(filter);

    set_global_default(collector)?;

    Ok([std_guard, file_guard])
}
