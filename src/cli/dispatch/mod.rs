use std::path::PathBuf;

use anyhow::Result;

use crate::cli::actions::Action;
use crate::poller::options::Options;

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let path = |key: &str, fallback: &str| {
        matches
            .get_one::<String>(key)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(fallback))
    };

    let options = Options {
        poller: matches
            .get_one::<String>("poller")
            .map(String::to_string)
            .unwrap_or_default(),
        daemon: matches.get_flag("daemon"),
        debug: matches.get_flag("debug"),
        loglevel: matches.get_one::<u8>("loglevel").copied().unwrap_or(2),
        prometheus_port: None,
        home_path: path("home", "/opt/harvest/"),
        conf_path: path("conf", "/etc/harvest/"),
        log_path: path("logs", "/var/log/harvest/"),
        pid_path: path("pids", "/var/run/harvest/"),
        hostname: sysinfo::System::host_name().unwrap_or_default(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    Ok(Action::Run { options })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    #[test]
    fn test_handler_builds_options() {
        temp_env::with_var("HARVEST_CONF", None::<String>, || {
            let matches = commands::new().get_matches_from(vec![
                "poller", "--poller", "p1", "--daemon", "-l", "1",
            ]);
            let Action::Run { options } = handler(&matches).unwrap();
            assert_eq!(options.poller, "p1");
            assert!(options.daemon);
            assert_eq!(options.loglevel, 1);
            assert_eq!(options.conf_path, PathBuf::from("/etc/harvest/"));
            assert_eq!(options.prometheus_port, None);
        });
    }
}
