// SPDX-FileCopyrightText: 2026 fwdd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signal handling for the `serve` command.

use std::io;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Install SIGINT and SIGTERM handlers.
///
/// Returns a token that is cancelled when either signal arrives. A signal
/// whose listener cannot be installed is logged and never fires; it does not
/// trigger a shutdown.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            tokio::select! {
                _ = sigint() => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            sigint().await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

async fn sigint() {
    signal_received("SIGINT", tokio::signal::ctrl_c().await).await
}

#[cfg(unix)]
async fn sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            let received = sigterm.recv().await;
            if received.is_none() {
                error!("SIGTERM listener closed, SIGTERM will not stop fwdd");
                std::future::pending::<()>().await;
            }
        }
        Err(e) => signal_received("SIGTERM", Err(e)).await,
    }
}

/// Return once `result` reports a delivered signal.
///
/// A listener error is logged and parks forever, so that signal can no longer
/// shut the daemon down.
async fn signal_received(name: &str, result: io::Result<()>) {
    if let Err(e) = result {
        error!(signal = name, error = %e, "failed to listen for signal, it will not stop fwdd");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn install_signal_handler_returns_token() {
        let token = install_signal_handler();
        assert!(!token.is_cancelled());
        token.cancel();
    }

    #[tokio::test]
    async fn delivered_signal_returns() {
        tokio::time::timeout(Duration::from_secs(1), signal_received("SIGINT", Ok(())))
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn listener_error_never_resolves() {
        let failed = signal_received("SIGINT", Err(io::Error::other("no signal driver")));
        assert!(
            tokio::time::timeout(Duration::from_secs(60), failed)
                .await
                .is_err()
        );
    }
}
