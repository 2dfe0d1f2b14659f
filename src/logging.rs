//!
//! src/logging.rs
//!
//! Initializes the tracing subscriber stack for applications that
//! embed the client. Library code only emits events; installing a
//! subscriber stays the caller's choice.
//!

use tracing_appender::non_blocking;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::{LogFormat, LoggingConfig};
use crate::errors::ApiError;

pub struct LoggingGuard(tracing_appender::non_blocking::WorkerGuard);

pub fn init_logging(cfg: &LoggingConfig) -> Result<LoggingGuard, ApiError> {
    let (writer, guard) = non_blocking(std::io::stdout());
    let filter = std::env::var("RUST_LOG")
        .ok()
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new(cfg.filter_directives.clone()));

    let time = fmt::time::UtcTime::rfc_3339();
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(ErrorLayer::default());

    let init = match cfg.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_timer(time)
                    .with_target(cfg.include_target)
                    .with_file(cfg.include_file_line)
                    .with_line_number(cfg.include_file_line)
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_timer(time)
                    .with_ansi(cfg.with_ansi)
                    .with_target(cfg.include_target)
                    .with_file(cfg.include_file_line)
                    .with_line_number(cfg.include_file_line),
            )
            .try_init(),
    };

    init.map_err(|e| ApiError::Config(format!("install subscriber: {e}")))?;
    Ok(LoggingGuard(guard))
}
