/*
 *  main.rs
 *
 *  RoboFace - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  JSON-lines command front end for the robot face display
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal::unix::{signal, SignalKind};

use roboface::config::{self, BackendKind, Cli, DisplayConfig};
use roboface::display::{BusTransport, RecordingTransport, TransportError, UnavailableTransport};
use roboface::Dispatcher;

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

type Driver = Dispatcher<Box<dyn BusTransport>>;

/// Waits for SIGINT, SIGTERM or SIGHUP and logs which one arrived.
async fn signal_handler() -> Result<(), std::io::Error> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn open_spi(config: &DisplayConfig) -> Result<Box<dyn BusTransport>, TransportError> {
    Ok(Box::new(roboface::display::LinuxTransport::open_linux(config)?))
}

#[cfg(not(target_os = "linux"))]
fn open_spi(_config: &DisplayConfig) -> Result<Box<dyn BusTransport>, TransportError> {
    Err(TransportError::Unavailable("the SPI backend needs Linux spidev".to_string()))
}

/// An unopenable bus still yields a transport, so the driver comes up in
/// the failed state and answers every command with "not ready".
fn open_transport(backend: BackendKind, config: &DisplayConfig) -> Box<dyn BusTransport> {
    match backend {
        BackendKind::Headless => {
            info!("Headless backend, bus traffic is discarded");
            Box::new(RecordingTransport::discarding())
        }
        BackendKind::Spi => match open_spi(config) {
            Ok(transport) => transport,
            Err(e) => {
                error!("Cannot open display bus: {}", e);
                Box::new(UnavailableTransport::new(e))
            }
        },
    }
}

/// One JSON request per stdin line, one JSON reply per stdout line
async fn serve(driver: Driver) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("reading command stream")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let reply = match serde_json::from_str::<Value>(line) {
            Ok(request) => driver.handle_json(&request).await,
            Err(e) => {
                warn!("Malformed request {:?}: {}", line, e);
                json!({ "success": false, "error": format!("Malformed request: {}", e), "kind": "malformed_request" })
            }
        };
        let mut out = reply.to_string();
        out.push('\n');
        stdout.write_all(out.as_bytes()).await.context("writing reply")?;
        stdout.flush().await.context("writing reply")?;
    }

    info!("Command stream closed");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli).context("loading configuration")?;

    if cli.dump_config {
        print!("{}", serde_yaml::to_string(&cfg)?);
        return Ok(());
    }

    let level = if cli.debug {
        "debug".to_string()
    } else {
        cfg.log_level.clone().unwrap_or_else(|| "info".to_string())
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    info!("This {} worth the Squeeze", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let display = cfg.display_config()?;
    let startup_face = cfg.startup_face()?;
    let transport = open_transport(cfg.backend(), &display);
    let driver: Driver = Dispatcher::new(display, transport);

    match driver.initialize().await {
        Ok(()) => {
            if let Some(face) = startup_face {
                if let Err(e) = driver.set_face(face.as_str()).await {
                    warn!("Startup face {} not shown: {}", face, e);
                }
            }
        }
        Err(e) => error!("Display unavailable, every command will report not ready: {}", e),
    }

    tokio::select! {
        res = signal_handler() => {
            if let Err(e) = res {
                error!("Signal handler failed: {}", e);
            }
        }
        res = serve(driver.clone()) => {
            if let Err(e) = res {
                error!("Command loop stopped: {:#}", e);
            }
        }
    }

    if let Err(e) = driver.shutdown().await {
        warn!("Shutdown did not complete: {}", e);
    }
    info!("Bye");
    Ok(())
}
