//! Termination signals for [`ConnectionSupervisor::run_until_signal`](super::ConnectionSupervisor::run_until_signal).
//!
//! Unix: SIGINT, SIGTERM (systemd, Kubernetes), SIGQUIT. Elsewhere: Ctrl-C.

/// Completes on the first termination signal. `Err` if a handler cannot be installed.
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigquit = signal(SignalKind::quit())?;

        let name = tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
            _ = sigquit.recv() => "SIGQUIT",
        };
        tracing::info!(signal = name, "termination signal received");
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        tracing::info!(signal = "ctrl_c", "termination signal received");
        Ok(())
    }
}
