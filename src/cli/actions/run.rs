use anyhow::Result;

use crate::cli::actions::Action;
use crate::poller::Poller;

/// Handle the run action: boot the poller and block until shutdown. A
/// boot failure still runs cleanup so no PID file outlives the process.
pub async fn handle(action: Action) -> Result<()> {
    let Action::Run { options } = action;

    let mut poller = Poller::new(options);
    if let Err(err) = poller.init().await {
        poller.stop();
        return Err(err.into());
    }
    poller.start().await;

    Ok(())
}
