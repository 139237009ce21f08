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

//! Implements the `query` command: a one-shot client for checking a
//! running server.

use std::fmt::Write;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::process;
use std::time::Duration;

use anyhow::{Context, Result};
use env_logger::Env;
use log::error;

use waypost::client;
use waypost::message::{Header, Qtype};

use crate::args::QueryArgs;

/// Runs the query.
pub fn run(args: QueryArgs) {
    env_logger::init_from_env(Env::new().default_filter_or("warn"));

    if let Err(e) = try_querying(args) {
        let mut message = String::from("Query failed:");
        for (i, cause) in e.chain().enumerate() {
            write!(message, "\n[{}] {}", i + 1, cause).unwrap();
        }
        error!("{}", message);
        process::exit(1);
    }
}

fn try_querying(args: QueryArgs) -> Result<()> {
    let id = rand::random();
    let query =
        client::build_query(&args.name, Qtype::A, id).context("failed to build the query")?;

    // Bind an ephemeral port in the server's address family.
    let local: SocketAddr = match args.server {
        SocketAddr::V4(_) => "0.0.0.0:0".parse().unwrap(),
        SocketAddr::V6(_) => "[::]:0".parse().unwrap(),
    };
    let socket = UdpSocket::bind(local).context("failed to bind a local socket")?;
    socket
        .set_read_timeout(Some(Duration::from_secs(args.timeout)))
        .context("failed to set the receive timeout")?;
    socket
        .send_to(&query, args.server)
        .context("failed to send the query")?;

    // Read replies until one matches our transaction ID or the
    // timeout runs out.
    let mut buf = [0; 2048];
    loop {
        let (len, _) = socket
            .recv_from(&mut buf)
            .context("no reply before the timeout")?;
        let reply = &buf[..len];

        let header = match Header::decode(reply) {
            Ok(header) => header,
            Err(_) => continue,
        };
        if header.id != id || !header.qr() {
            continue;
        }

        match client::extract_first_a_record(reply) {
            Some(address) => {
                println!("{} has address {}", args.name, Ipv4Addr::from(address));
            }
            None => {
                println!("{}: no answer ({})", args.name, header.rcode());
            }
        }
        return Ok(());
    }
}
