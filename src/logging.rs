//! Log setup.
//!
//! Logs go to stderr so command output on stdout stays parseable. Levels
//! come from the `[logging]` config section:
//!
//! ```toml
//! [logging]
//! default = "warn"
//!
//! [logging.modules]
//! positron_core = "debug"
//! ```
//!
//! `RUST_LOG` takes precedence over config:
//!
//! ```bash
//! RUST_LOG=positron_core::retrieval=debug positron ask "what is a tide?"
//! ```

use std::sync::Once;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Filter directive string built from config, e.g. `"warn,positron_core=debug"`.
pub fn filter_directives(config: &LoggingConfig) -> String {
    let mut modules: Vec<_> = config.modules.iter().collect();
    modules.sort();
    let mut directives = config.default.clone();
    for (module, level) in modules {
        directives.push_str(&format!(",{module}={level}"));
    }
    directives
}

/// Check that every level in `[logging]` is a real level and that the
/// combined directives parse.
///
/// A bare word such as `"verbose"` would otherwise be read as a target
/// name and silently enable nothing useful.
pub fn check_config(config: &LoggingConfig) -> Result<(), String> {
    config
        .default
        .parse::<LevelFilter>()
        .map_err(|_| format!("logging.default: unknown level '{}'", config.default))?;

    for (module, level) in &config.modules {
        if module.trim().is_empty() {
            return Err("logging.modules: empty module name".to_string());
        }
        level
            .parse::<LevelFilter>()
            .map_err(|_| format!("logging.modules.{}: unknown level '{}'", module, level))?;
    }

    EnvFilter::try_new(filter_directives(config))
        .map(|_| ())
        .map_err(|e| format!("logging: {}", e))
}

/// Install the global subscriber. Only the first call takes effect.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::try_new(filter_directives(config))
                .unwrap_or_else(|_| EnvFilter::new("warn"))
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_timer(CompactTime)
            .with_level(true)
            .with_filter(filter);

        // A subscriber installed by an embedding application wins.
        let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_directives_default_only() {
        assert_eq!(filter_directives(&LoggingConfig::default()), "warn");
    }

    #[test]
    fn test_check_config_accepts_levels() {
        let mut modules = HashMap::new();
        modules.insert("positron_core::retrieval".to_string(), "debug".to_string());
        let config = LoggingConfig {
            default: "INFO".to_string(),
            modules,
        };
        assert!(check_config(&config).is_ok());
        assert!(check_config(&LoggingConfig::default()).is_ok());
    }

    #[test]
    fn test_check_config_rejects_unknown_levels() {
        let config = LoggingConfig {
            default: "verbose".to_string(),
            modules: HashMap::new(),
        };
        assert!(check_config(&config).unwrap_err().contains("verbose"));

        let mut modules = HashMap::new();
        modules.insert("positron_core".to_string(), "loud".to_string());
        let config = LoggingConfig {
            default: "warn".to_string(),
            modules,
        };
        assert!(check_config(&config).unwrap_err().contains("loud"));
    }

    #[test]
    fn test_directives_with_modules_sorted() {
        let mut modules = HashMap::new();
        modules.insert("positron_core".to_string(), "debug".to_string());
        modules.insert("positron::embedding".to_string(), "trace".to_string());
        let config = LoggingConfig {
            default: "info".to_string(),
            modules,
        };
        assert_eq!(
            filter_directives(&config),
            "info,positron::embedding=trace,positron_core=debug"
        );
    }
}
