//! Logging setup for BreachDesk services.
//!
//! Thin wrapper over tracing-subscriber: an env filter scoped to the
//! workspace crates unless `RUST_LOG` overrides it, and one fmt layer
//! that is human-readable text in development and JSON lines in
//! production.

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level applied to the filter targets.
    pub level: Level,
    /// Emit JSON lines instead of human-readable text.
    pub json_format: bool,
    /// Record span open/close events.
    pub include_spans: bool,
    /// Include file and line of the call site.
    pub include_location: bool,
    /// Include thread ids.
    pub include_thread_ids: bool,
    /// Include the module path target.
    pub include_target: bool,
    /// Crate targets the fallback filter applies `level` to. `RUST_LOG`
    /// takes precedence when set.
    pub filter_targets: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            include_spans: true,
            include_location: true,
            include_thread_ids: false,
            include_target: true,
            filter_targets: workspace_targets(),
        }
    }
}

fn workspace_targets() -> Vec<String> {
    ["bd_core", "bd_connectors", "bd_api"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl LoggingConfig {
    /// Development preset: debug level, thread ids on.
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            include_thread_ids: true,
            ..Self::default()
        }
    }

    /// Production preset: JSON lines, no span events or call sites.
    pub fn production() -> Self {
        Self {
            json_format: true,
            include_spans: false,
            include_location: false,
            ..Self::default()
        }
    }

    /// Directive string for the fallback env filter, e.g.
    /// `bd_core=info,bd_api=info`.
    fn filter_directives(&self) -> String {
        let level = self.level.to_string().to_lowercase();
        self.filter_targets
            .iter()
            .map(|target| format!("{target}={level}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Initializes logging with the default configuration.
pub fn init_logging() {
    init_logging_with_config(LoggingConfig::default());
}

/// Initializes logging with the given configuration.
pub fn init_logging_with_config(config: LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directives()));

    let span_events = if config.include_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let fmt_layer = fmt::layer()
        .with_span_events(span_events)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_thread_ids(config.include_thread_ids)
        .with_target(config.include_target);

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.json_format {
        registry.with(fmt_layer.json()).init();
    } else {
        registry.with(fmt_layer).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_presets() {
        let dev = LoggingConfig::development();
        assert_eq!(dev.level, Level::DEBUG);
        assert!(!dev.json_format);
        assert!(dev.include_thread_ids);

        let prod = LoggingConfig::production();
        assert_eq!(prod.level, Level::INFO);
        assert!(prod.json_format);
        assert!(!prod.include_spans);
    }

    #[test]
    fn test_filter_directives_cover_workspace_crates() {
        assert_eq!(
            LoggingConfig::default().filter_directives(),
            "bd_core=info,bd_connectors=info,bd_api=info"
        );

        let custom = LoggingConfig {
            level: Level::WARN,
            filter_targets: vec!["bd_api".to_string()],
            ..LoggingConfig::default()
        };
        assert_eq!(custom.filter_directives(), "bd_api=warn");
    }
}
