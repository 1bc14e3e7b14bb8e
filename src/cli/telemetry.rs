use std::fs::{self, File};
use std::sync::Arc;

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

use crate::poller::options::Options;

/// Map the numeric loglevel to a tracing level. Levels 4 (error) and
/// 5 (critical) both map to ERROR, the most severe level tracing has.
const fn get_log_level(loglevel: u8) -> Level {
    match loglevel {
        0 => Level::TRACE,
        1 => Level::DEBUG,
        2 => Level::INFO,
        3 => Level::WARN,
        _ => Level::ERROR,
    }
}

fn filter(loglevel: u8) -> Result<EnvFilter> {
    // RUST_LOG=
    Ok(EnvFilter::builder()
        .with_default_directive(get_log_level(loglevel).into())
        .from_env_lossy()
        .add_directive("hyper=error".parse()?)
        .add_directive("tokio=error".parse()?)
        .add_directive("reqwest=error".parse()?))
}

/// Start the telemetry layer. In daemon mode the output goes to
/// `poller_<name>.log` under the log path instead of stderr.
///
/// # Errors
///
/// Will return an error if the log file cannot be opened or the
/// subscriber is already set
pub fn init(options: &Options) -> Result<()> {
    let filter = filter(options.loglevel)?;

    if options.daemon {
        fs::create_dir_all(&options.log_path)?;
        let file = File::create(
            options
                .log_path
                .join(format!("poller_{}.log", options.poller)),
        )?;
        let fmt_layer = fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .with_writer(Arc::new(file));
        let subscriber = Registry::default().with(fmt_layer).with(filter);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let fmt_layer = fmt::layer().with_target(false);
        let subscriber = Registry::default().with(fmt_layer).with(filter);
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_log_level_trace() {
        assert_eq!(get_log_level(0), Level::TRACE);
    }

    #[test]
    fn test_get_log_level_debug() {
        assert_eq!(get_log_level(1), Level::DEBUG);
    }

    #[test]
    fn test_get_log_level_info() {
        assert_eq!(get_log_level(2), Level::INFO);
    }

    #[test]
    fn test_get_log_level_warn() {
        assert_eq!(get_log_level(3), Level::WARN);
    }

    #[test]
    fn test_get_log_level_error_and_critical() {
        assert_eq!(get_log_level(4), Level::ERROR);
        assert_eq!(get_log_level(5), Level::ERROR);
    }
}
