use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Waits for INT, TERM, QUIT or HUP and cancels the stop token. The loop
/// keeps draining signals so a second one after shutdown has no effect
/// beyond a log line.
pub(super) async fn handle_signals(token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut interrupt = match signal(SignalKind::interrupt()) {
            Ok(stream) => stream,
            Err(e) => {
                error!("installing SIGINT handler: {e}");
                return;
            }
        };
        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(e) => {
                error!("installing SIGTERM handler: {e}");
                return;
            }
        };
        let mut quit = match signal(SignalKind::quit()) {
            Ok(stream) => stream,
            Err(e) => {
                error!("installing SIGQUIT handler: {e}");
                return;
            }
        };
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(stream) => stream,
            Err(e) => {
                error!("installing SIGHUP handler: {e}");
                return;
            }
        };

        loop {
            let name = tokio::select! {
                _ = interrupt.recv() => "SIGINT",
                _ = terminate.recv() => "SIGTERM",
                _ = quit.recv() => "SIGQUIT",
                _ = hangup.recv() => "SIGHUP",
            };
            if token.is_cancelled() {
                info!(signal = name, "caught signal, already stopping");
            } else {
                info!(signal = name, "caught signal");
                token.cancel();
            }
        }
    }

    #[cfg(not(unix))]
    {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("installing Ctrl+C handler: {e}");
                return;
            }
            if token.is_cancelled() {
                info!("caught Ctrl+C, already stopping");
            } else {
                info!("caught Ctrl+C");
                token.cancel();
            }
        }
    }
}
