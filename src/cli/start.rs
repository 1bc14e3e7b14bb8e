use anyhow::Result;
use clap::error::ErrorKind;

use crate::cli::{actions::Action, commands, dispatch::handler, telemetry};

/// Start the CLI: parse options, initialize telemetry and return the
/// action to run.
///
/// Argument errors exit the process with code 1 directly; help and
/// version keep clap's usual behavior.
///
/// # Errors
///
/// Returns an error if telemetry initialization or command handling fails
pub fn start() -> Result<Action> {
    let matches = match commands::new().try_get_matches() {
        Ok(matches) => matches,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    let action = handler(&matches)?;

    let Action::Run { options } = &action;
    telemetry::init(options)?;

    Ok(action)
}
