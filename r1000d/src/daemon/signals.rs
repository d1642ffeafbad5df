//! Signal handling for graceful shutdown

use embedded_hal::digital::OutputPin;
use std::io::Write;
use tracing::{info, warn};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use juicyboard_common::error::AppError;

use crate::i2c::RegisterBus;
use crate::manager::SlotBusManager;

/// Wait for SIGINT or SIGTERM signal
pub async fn wait_for_signal() {
    #[cfg(unix)]
    {
        let mut sigint =
            signal(SignalKind::interrupt()).expect("Failed to register SIGINT handler");
        let mut sigterm =
            signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");

        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
        }
    }

    #[cfg(not(unix))]
    {
        // On non-Unix platforms, wait for Ctrl+C
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        info!("Received Ctrl+C");
    }
}

/// Cleanup to run before exit
///
/// Releases the module reset line so the slot modules keep running after
/// the daemon is gone.
pub fn cleanup<B, P, W>(manager: &mut SlotBusManager<B, P, W>)
where
    B: RegisterBus,
    P: OutputPin,
    W: Write,
    AppError: From<P::Error>,
{
    info!("Running cleanup before shutdown");

    if let Err(e) = manager.release_reset_line() {
        warn!("Failed to release module reset line: {}", e);
    } else {
        info!("Module reset line released");
    }

    info!("Cleanup complete");
}
