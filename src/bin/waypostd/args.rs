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

//! Implements command-line argument parsing.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::anyhow;
use clap::{ArgGroup, Parser, Subcommand};

/// Parses the command line arguments.
pub fn parse() -> Args {
    Args::parse()
}

/// The Waypost authoritative DNS responder
#[derive(Debug, Parser)]
#[clap(version)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve a static zone over UDP
    Run(RunArgs),

    /// Send one A query to a server and print the answer
    Query(QueryArgs),
}

#[derive(Debug, Parser)]
#[clap(group(ArgGroup::new("required").required(true).args(["config", "records"])))]
pub struct RunArgs {
    /// Set the configuration file to use
    #[clap(long, conflicts_with_all = ["bind", "ttl"], value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Set the bind IP address and port
    #[clap(long, value_name = "IP:PORT")]
    pub bind: Option<SocketAddr>,

    /// Set the TTL returned with answers
    #[clap(long, value_name = "SECONDS")]
    pub ttl: Option<u32>,

    /// Add records to serve
    #[clap(long, value_delimiter = ',', value_name = "NAME=IPV4")]
    pub records: Vec<RecordDescription>,
}

#[derive(Debug, Parser)]
pub struct QueryArgs {
    /// The server to query
    #[clap(long, default_value = "127.0.0.1:5353", value_name = "IP:PORT")]
    pub server: SocketAddr,

    /// How long to wait for a reply, in seconds
    #[clap(long, default_value = "5", value_name = "SECONDS")]
    pub timeout: u64,

    /// The domain name to look up
    #[clap(value_name = "NAME")]
    pub name: String,
}

/// One record provided on the command line with the `--records`
/// option, e.g. `example.com=93.184.216.34`. Parsed with its
/// [`FromStr`] implementation.
#[derive(Clone, Debug)]
pub struct RecordDescription {
    pub name: String,
    pub address: Ipv4Addr,
}

impl FromStr for RecordDescription {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, address) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("records must have the form NAME=IPV4"))?;
        waypost::name::encode(name).map_err(|e| anyhow!("invalid record name: {}", e))?;
        Ok(Self {
            name: name.to_owned(),
            address: address
                .parse()
                .map_err(|e| anyhow!("invalid record address: {}", e))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_description_from_str_parses_both_halves() {
        let record: RecordDescription = "example.com=93.184.216.34".parse().unwrap();
        assert_eq!(record.name, "example.com");
        assert_eq!(record.address, Ipv4Addr::new(93, 184, 216, 34));
    }

    #[test]
    fn record_description_from_str_rejects_bad_input() {
        assert!("example.com".parse::<RecordDescription>().is_err());
        assert!("bad..name=192.0.2.1".parse::<RecordDescription>().is_err());
        assert!("example.com=not-an-ip".parse::<RecordDescription>().is_err());
    }
}
