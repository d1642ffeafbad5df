//! Console line loop and process lifecycle

pub mod signals;

use anyhow::Context;
use embedded_hal::digital::OutputPin;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::info;

use juicyboard_common::error::AppError;

use crate::i2c::RegisterBus;
use crate::manager::SlotBusManager;

/// Feed console lines to the manager until input ends or a shutdown signal
/// arrives
///
/// Each line is dispatched to completion before the next one is read, so
/// the manager never sees overlapping commands.
pub async fn run_console<R, B, P, W>(
    input: R,
    manager: &mut SlotBusManager<B, P, W>,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    B: RegisterBus,
    P: OutputPin,
    W: Write,
    AppError: From<P::Error>,
{
    let mut lines = input.split(b'\n');
    let shutdown = signals::wait_for_signal();
    tokio::pin!(shutdown);

    info!("Listening for console commands");

    loop {
        tokio::select! {
            line = lines.next_segment() => {
                match line.context("Failed to read console input")? {
                    Some(bytes) => {
                        // Undecodable bytes become U+FFFD
                        let line = String::from_utf8_lossy(&bytes);
                        manager
                            .handle_line(&line)
                            .context("Console command failed")?;
                    }
                    None => {
                        info!("Console input closed");
                        break;
                    }
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}

/// Run the startup sequence and then either one command or the console
/// loop, releasing the reset line on every exit path
pub async fn run_session<R, B, P, W>(
    input: R,
    manager: &mut SlotBusManager<B, P, W>,
    startup: bool,
    command: &[String],
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    B: RegisterBus,
    P: OutputPin,
    W: Write,
    AppError: From<P::Error>,
{
    let result = serve(input, manager, startup, command).await;
    signals::cleanup(manager);
    result
}

async fn serve<R, B, P, W>(
    input: R,
    manager: &mut SlotBusManager<B, P, W>,
    startup: bool,
    command: &[String],
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    B: RegisterBus,
    P: OutputPin,
    W: Write,
    AppError: From<P::Error>,
{
    if startup {
        manager.start().context("Startup sequence failed")?;
    } else {
        info!("Skipping startup sequence");
    }

    if command.is_empty() {
        run_console(input, manager).await
    } else {
        manager
            .handle_line(&command.join(" "))
            .context("Console command failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingWriter, Harness, MockBus, RecordingPin};
    use juicyboard_common::config::Config;
    use juicyboard_common::protocol;

    #[tokio::test]
    async fn test_run_console_dispatches_until_eof() {
        let bus = MockBus::default().with_register(
            protocol::slot_address(4),
            protocol::REG_TEMPERATURE,
            &[22],
        );
        let mut h = Harness::new(bus);
        let input: &[u8] = b"mod temp 4\r\nG28\r\nmod temp 0\r\n";
        {
            let mut manager = h.manager();
            run_console(input, &mut manager).await.unwrap();
        }

        assert_eq!(h.lines(), vec!["Slot 4 Temp : 22", "Invalid slot 0"]);
    }

    #[tokio::test]
    async fn test_run_console_survives_invalid_utf8() {
        let bus = MockBus::default().with_register(
            protocol::slot_address(4),
            protocol::REG_TEMPERATURE,
            &[22],
        );
        let mut h = Harness::new(bus);
        let input: &[u8] = b"\xff\xfe garbage\r\nmod temp 4\r\nmod \xc3temp 4\r\n";
        {
            let mut manager = h.manager();
            run_console(input, &mut manager).await.unwrap();
        }

        assert_eq!(h.lines(), vec!["Slot 4 Temp : 22"]);
    }

    #[tokio::test]
    async fn test_run_session_releases_reset_line_when_startup_fails() {
        let mut bus = MockBus::default();
        let mut pin = RecordingPin::default();
        let input: &[u8] = b"mod reset\r\n";
        {
            let mut manager =
                SlotBusManager::new(&mut bus, &mut pin, FailingWriter, Config::default()).unwrap();
            let err = run_session(input, &mut manager, true, &[]).await.unwrap_err();
            assert!(err.to_string().contains("Startup sequence failed"));
        }

        // Idle level from construction, then the release from cleanup
        assert_eq!(pin.levels(), vec![true, true]);
    }

    #[tokio::test]
    async fn test_run_session_one_shot_command() {
        let mut h = Harness::new(MockBus::default());
        let input: &[u8] = b"mod scan\r\n";
        {
            let mut manager = h.manager();
            let command = vec!["mod".to_string(), "reset".to_string()];
            run_session(input, &mut manager, false, &command).await.unwrap();
        }

        assert_eq!(h.lines(), vec!["Resetting Mods..."]);
        assert_eq!(h.pin.levels(), vec![true, false, true, true]);
    }
}
