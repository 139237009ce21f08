// Copyright 2024 the Waypost authors.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implements the `run` command (i.e., running the server).

use std::fmt::Write;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::{anyhow, Context, Result};
use env_logger::Env;
use log::{error, info};
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

use waypost::io::UdpTransport;
use waypost::zone::StaticZone;

use crate::args::RunArgs;
use crate::config;

/// The specific [`Server`](waypost::server::Server) type we use.
pub type Server = waypost::server::Server<StaticZone>;

/// Runs the server.
pub fn run(args: RunArgs) {
    env_logger::init_from_env(Env::new().default_filter_or("warn"));

    if let Err(e) = try_running(args) {
        let mut message = String::from("Failed to run:");
        for (i, cause) in e.chain().enumerate() {
            write!(message, "\n[{}] {}", i + 1, cause).unwrap();
        }
        message.push_str("\nExiting with failure.");
        error!("{}", message);
        process::exit(1);
    }
    info!("Exiting with success.");
}

fn try_running(run_args: RunArgs) -> Result<()> {
    info!(
        "Waypost daemon v{}.{}.{} starting.",
        env!("CARGO_PKG_VERSION_MAJOR"),
        env!("CARGO_PKG_VERSION_MINOR"),
        env!("CARGO_PKG_VERSION_PATCH"),
    );

    // Get the configuration, either from the file system or from the
    // command line arguments, as appropriate.
    let config = if let Some(ref config_path) = run_args.config {
        info!("Loading the configuration from {}.", config_path.display());
        config::load_from_path(config_path).context("failed to load the configuration")?
    } else {
        info!("Loading the configuration from the command line.");
        config::load_from_args(run_args)
    };

    // Build the zone and the server.
    if config.records.len() == 1 {
        info!("Loading 1 record.");
    } else {
        info!("Loading {} records.", config.records.len());
    }
    let zone = StaticZone::new(config.records).context("failed to build the zone")?;
    let mut server = Server::new(zone);
    server.set_answer_ttl(config.ttl);

    // Bind before installing signal handlers: a bad address should
    // fail fast.
    let transport = UdpTransport::bind(config.bind).context("failed to bind the UDP socket")?;
    info!(
        "Listening on {}.",
        transport
            .local_addr()
            .context("failed to read the bound address")?,
    );

    // Set up signal handling.
    let mut signals = set_up_signal_handling().context("failed to set up signal handling")?;

    // Start the receive loop on its own thread; this thread waits for
    // signals.
    info!("Set-up is complete; starting the server.");
    let server = Arc::new(server);
    let shutdown = Arc::new(AtomicBool::new(false));
    let worker = {
        let server = server.clone();
        let shutdown = shutdown.clone();
        thread::Builder::new()
            .name("udp".to_owned())
            .spawn(move || {
                if let Err(e) = transport.serve(&server, &shutdown) {
                    error!("I/O error in the UDP worker: {}", e);
                }
            })
            .context("failed to start the UDP worker")?
    };

    // Process incoming signals.
    for signal in signals.forever() {
        match signal {
            s @ (SIGINT | SIGTERM) => {
                let name = match s {
                    SIGINT => "SIGINT",
                    SIGTERM => "SIGTERM",
                    _ => unreachable!(),
                };
                info!("Received {}; shutting down.", name);
                break;
            }
            _ => unreachable!(),
        }
    }

    // Shut down the server.
    shutdown.store(true, Ordering::Relaxed);
    worker
        .join()
        .map_err(|_| anyhow!("the UDP worker panicked"))?;
    info!("Shutdown complete.");
    Ok(())
}

fn set_up_signal_handling() -> Result<Signals> {
    let term_signals = &[SIGINT, SIGTERM];
    let already_terminating = Arc::new(AtomicBool::new(false));

    // This sets up signal handlers to exit immediately if a second
    // termination signal arrives before the process finishes shutting
    // down gracefully.
    for sig in term_signals {
        signal_hook::flag::register_conditional_shutdown(*sig, 1, already_terminating.clone())?;
        signal_hook::flag::register(*sig, already_terminating.clone())?;
    }

    Signals::new(term_signals).map_err(Into::into)
}
