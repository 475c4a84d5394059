use std::sync::Once;

/// Logger configuration.
///
/// `env_filter`, when set, overrides `RUST_LOG` and uses the `env_logger`
/// filter syntax (e.g. "info", "cubist_engine=debug,wgpu=warn").
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

static INIT: Once = Once::new();

/// Installs the global logger. Safe to call more than once; only the first
/// call takes effect. Call it before creating the runtime so device and
/// surface setup problems are visible.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        match config.env_filter.or_else(|| std::env::var("RUST_LOG").ok()) {
            Some(filter) => {
                builder.parse_filters(&filter);
            }
            None => {
                // Engine logs at info; wgpu internals only when they complain.
                builder.filter_level(log::LevelFilter::Info);
                builder.filter_module("wgpu_core", log::LevelFilter::Warn);
                builder.filter_module("wgpu_hal", log::LevelFilter::Warn);
            }
        }

        builder.write_style(config.write_style);
        builder.init();

        log::debug!("logging initialized");
    });
}
