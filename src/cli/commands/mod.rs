use clap::{
    Arg, ArgAction, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("poller")
        .about("Runs collectors and exporters for a target system")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("poller")
                .short('p')
                .long("poller")
                .help("Poller name as defined in config")
                .required(true)
                .value_name("NAME"),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .help("Debug mode, collect but ship nothing")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("daemon")
                .long("daemon")
                .help("Start as daemon: log to file, write pid file")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("loglevel")
                .short('l')
                .long("loglevel")
                .help("Logging level (0=trace, 1=debug, 2=info, 3=warning, 4=error, 5=critical)")
                .default_value("2")
                .value_parser(clap::value_parser!(u8).range(0..=5)),
        )
        .arg(
            Arg::new("home")
                .long("home")
                .help("Harvest install directory")
                .env("HARVEST_HOME")
                .default_value("/opt/harvest/")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("conf")
                .long("conf")
                .help("Directory holding harvest.yml and collector templates")
                .env("HARVEST_CONF")
                .default_value("/etc/harvest/")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("logs")
                .long("logs")
                .help("Log directory used in daemon mode")
                .env("HARVEST_LOGS")
                .default_value("/var/log/harvest/")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("pids")
                .long("pids")
                .help("PID file directory used in daemon mode")
                .env("HARVEST_PIDS")
                .default_value("/var/run/harvest/")
                .value_name("PATH"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "poller");
        assert_eq!(
            command.get_version().unwrap().to_string(),
            env!("CARGO_PKG_VERSION")
        );
    }

    #[test]
    fn test_defaults() {
        temp_env::with_vars(
            [
                ("HARVEST_HOME", None::<String>),
                ("HARVEST_CONF", None),
                ("HARVEST_LOGS", None),
                ("HARVEST_PIDS", None),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["poller", "--poller", "p1"]);

                assert_eq!(
                    matches.get_one::<String>("poller").map(String::as_str),
                    Some("p1")
                );
                assert_eq!(matches.get_one::<u8>("loglevel").copied(), Some(2));
                assert!(!matches.get_flag("daemon"));
                assert!(!matches.get_flag("debug"));
                assert_eq!(
                    matches.get_one::<String>("conf").map(String::as_str),
                    Some("/etc/harvest/")
                );
            },
        );
    }

    #[test]
    fn test_poller_is_required() {
        let command = new();
        assert!(command.try_get_matches_from(vec!["poller"]).is_err());
    }

    #[test]
    fn test_env_overrides_paths() {
        temp_env::with_var("HARVEST_CONF", Some("/tmp/conf"), || {
            let command = new();
            let matches = command.get_matches_from(vec!["poller", "-p", "p1"]);
            assert_eq!(
                matches.get_one::<String>("conf").map(String::as_str),
                Some("/tmp/conf")
            );
        });
    }

    #[test]
    fn test_loglevel_range() {
        let command = new();
        assert!(
            command
                .try_get_matches_from(vec!["poller", "-p", "p1", "-l", "7"])
                .is_err()
        );
    }
}
