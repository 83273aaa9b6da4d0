//! `celltime` — set the system clock from a cellular modem's network time.
//!
//! Usage: celltime -p /dev/ttyUSB2 [-b 115200] [-d 60] [-v]

use std::thread;
use std::time::Duration;

use clap::Parser;
use eyre::{Result, WrapErr};
use tracing::{error, info};

use celltime::{perform_timesync, SyncConfig, SystemClock};

/// Minimum daemon poll interval, seconds.
const MIN_INTERVAL_SECS: u64 = 10;

/// Per-read timeout on the serial port; reads past it count as "no data"
/// and are retried by the scan loop.
const PORT_READ_TIMEOUT: Duration = Duration::from_millis(10);

#[derive(Parser, Debug)]
#[command(name = "celltime", version)]
#[command(about = "Set the system clock from a cellular modem's network time")]
struct Cli {
    /// Serial device the modem answers AT commands on
    #[arg(short = 'p', long = "port", value_name = "DEVICE")]
    port: String,

    /// Baud rate for the serial device
    #[arg(short = 'b', long = "baud", default_value_t = 115_200)]
    baud: u32,

    /// Keep running, syncing every INTERVAL seconds
    #[arg(short = 'd', long = "interval", value_name = "INTERVAL")]
    interval: Option<u64>,

    /// Log each protocol step
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    if let Some(interval) = cli.interval
        && interval < MIN_INTERVAL_SECS
    {
        eyre::bail!("invalid daemon interval {interval}, minimum: {MIN_INTERVAL_SECS}");
    }

    let config = SyncConfig::default();

    match cli.interval {
        None => sync_once(&cli, &config),
        Some(interval) => loop {
            // Each attempt opens the port fresh and shares nothing with the
            // previous one; a failure only costs this attempt.
            if let Err(e) = sync_once(&cli, &config) {
                error!("sync attempt failed: {e:#}");
            }
            thread::sleep(Duration::from_secs(interval));
        },
    }
}

/// Open the serial port, run one sync attempt, drop the port.
fn sync_once(cli: &Cli, config: &SyncConfig) -> Result<()> {
    let mut port = serialport::new(&cli.port, cli.baud)
        .timeout(PORT_READ_TIMEOUT)
        .open()
        .wrap_err_with(|| format!("could not open serial port {}", cli.port))?;

    let fields = perform_timesync(&mut port, &mut SystemClock, config)
        .wrap_err("unable to read network time from modem")?;
    info!("modem reported {fields}");
    Ok(())
}
