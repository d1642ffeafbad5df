pub mod daemon;
pub mod gpio;
pub mod i2c;
pub mod manager;

#[cfg(test)]
mod testing;

use clap::Parser;
use std::path::PathBuf;
#[cfg(target_os = "linux")]
use tracing::{error, info};
#[cfg(target_os = "linux")]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(target_os = "linux")]
use anyhow::Context;
#[cfg(target_os = "linux")]
use juicyboard_common::config::{Config, DEFAULT_CONFIG_FILE};

#[cfg(target_os = "linux")]
use gpio::SysfsResetLine;
#[cfg(target_os = "linux")]
use i2c::LinuxSlotBus;
#[cfg(target_os = "linux")]
use manager::SlotBusManager;

/// JuicyBoard R1000A slot bus manager
#[derive(Parser)]
#[command(name = "r1000d")]
#[command(about = "JuicyBoard R1000A slot bus manager", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    conf: Option<PathBuf>,

    /// I2C bus number
    #[arg(long)]
    i2c_bus: Option<u8>,

    /// sysfs GPIO number of the module reset line
    #[arg(long)]
    reset_gpio: Option<u32>,

    /// Skip the scan/reset/power monitor startup sequence
    #[arg(long)]
    no_startup: bool,

    /// Run a single console command (e.g. `mod readpmon`) and exit
    #[arg(trailing_var_arg = true, value_name = "COMMAND")]
    command: Vec<String>,
}

#[cfg(target_os = "linux")]
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Logs go to stderr; stdout carries the console responses
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "r1000d=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("r1000d - JuicyBoard R1000A slot bus manager");
    info!("Version: {}", juicyboard_common::VERSION);

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }

    info!("Daemon shutdown complete");
}

#[cfg(target_os = "linux")]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(&cli)?;

    // Apply CLI overrides
    if let Some(i2c_bus) = cli.i2c_bus {
        config.i2c_bus = i2c_bus;
    }
    if let Some(reset_gpio) = cli.reset_gpio {
        config.reset_gpio = reset_gpio;
    }
    config.validate()?;

    info!(
        "Configuration: I2C bus {}, power monitor 0x{:02X}, reset GPIO {}",
        config.i2c_bus, config.power_monitor_addr, config.reset_gpio
    );

    let bus = LinuxSlotBus::new(config.i2c_bus, config.power_monitor_addr)
        .context("Failed to open I2C bus")?;
    info!("Opened I2C bus {}", bus.bus());

    let reset_line = SysfsResetLine::open(config.reset_gpio)
        .context("Failed to set up module reset line")?;
    info!("Module reset line on GPIO {}", reset_line.line());

    let mut manager = SlotBusManager::new(bus, reset_line, std::io::stdout(), config)?;

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    daemon::run_session(stdin, &mut manager, !cli.no_startup, &cli.command).await
}

#[cfg(target_os = "linux")]
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    match &cli.conf {
        Some(path) => {
            let config = Config::from_file(path)?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        None => Ok(Config::from_file_or_default(DEFAULT_CONFIG_FILE)?),
    }
}

#[cfg(not(target_os = "linux"))]
fn main() {
    let _ = Cli::parse();
    eprintln!("r1000d requires Linux for I2C and GPIO access");
    std::process::exit(1);
}
