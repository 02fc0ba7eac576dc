use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

/// Most verbose enabled level wins; `off` when everything is disabled.
pub fn level_for(config: &LoggingConfig) -> &'static str {
    let levels = &config.levels;
    if levels.debug {
        "debug"
    } else if levels.info {
        "info"
    } else if levels.warning {
        "warn"
    } else if levels.error {
        "error"
    } else {
        "off"
    }
}

/// Install the global subscriber. Output goes to stderr so stdout stays
/// clean for results. `RUST_LOG` overrides the configured level.
pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_for(config)));

    let format = &config.format;

    // Use Layer::boxed() to unify the types of the if/else branches
    let fmt_layer = if !format.show_time {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(format.show_target)
            .with_file(format.show_file)
            .with_line_number(format.show_line)
            .without_time()
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(format.show_target)
            .with_file(format.show_file)
            .with_line_number(format.show_line)
            .boxed()
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggingLevelsConfig;

    #[test]
    fn test_level_selection() {
        let mut config = LoggingConfig::default();
        assert_eq!(level_for(&config), "warn");

        config.levels.debug = true;
        assert_eq!(level_for(&config), "debug");

        config.levels = LoggingLevelsConfig {
            debug: false,
            info: false,
            warning: false,
            error: false,
        };
        assert_eq!(level_for(&config), "off");
    }
}
