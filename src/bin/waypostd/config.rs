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

//! Implements the server configuration file.
//!
//! The file is TOML:
//!
//! ```toml
//! bind = "127.0.0.1:5353"
//! ttl = 60
//!
//! [records]
//! "example.com" = "93.184.216.34"
//! "www.example.com" = "93.184.216.34"
//! ```
//!
//! `bind` and `ttl` are optional. The same settings can be given on
//! the command line instead; see [`load_from_args`].

use std::collections::HashMap;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

use anyhow::{Context, Result};
use log::Level::Debug;
use log::{debug, log_enabled};
use serde::Deserialize;

use waypost::server::DEFAULT_ANSWER_TTL;

use crate::args::RunArgs;

/// The bind address used when none is configured.
const DEFAULT_BIND: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 5353);

////////////////////////////////////////////////////////////////////////
// CONFIGURATION LOADING                                              //
////////////////////////////////////////////////////////////////////////

/// Loads the server configuration from the file given by `path`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let raw_config = fs::read(path.as_ref()).context("failed to read the configuration file")?;
    let config: Config =
        toml::from_slice(&raw_config).context("failed to parse the configuration file")?;
    log_config_summary(&config);
    Ok(config)
}

/// Loads the server configuration from the parsed command line
/// arguments given by `args`.
pub fn load_from_args(args: RunArgs) -> Config {
    let config = Config {
        bind: args.bind.unwrap_or(DEFAULT_BIND),
        ttl: args.ttl.unwrap_or(DEFAULT_ANSWER_TTL),
        records: args
            .records
            .into_iter()
            .map(|record| (record.name, record.address))
            .collect(),
    };
    log_config_summary(&config);
    config
}

/// Summarizes the configuration in the log, if the debug log level is
/// enabled.
fn log_config_summary(config: &Config) {
    if !log_enabled!(Debug) {
        // Don't compute the message if it will never be printed.
        return;
    }
    debug!(
        "Configuration loaded:\n\
         Bind address: {}\n\
         Answer TTL:   {}\n\
         Records:      {}",
        config.bind,
        config.ttl,
        config.records.len(),
    );
}

////////////////////////////////////////////////////////////////////////
// CONFIGURATION STRUCTURES                                           //
////////////////////////////////////////////////////////////////////////

/// The server configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// The address and port to bind.
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// The TTL returned with answer records.
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// The zone table: dotted names to IPv4 addresses.
    #[serde(default)]
    pub records: HashMap<String, Ipv4Addr>,
}

fn default_bind() -> SocketAddr {
    DEFAULT_BIND
}

fn default_ttl() -> u32 {
    DEFAULT_ANSWER_TTL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_full_configuration_parses() {
        let config: Config = toml::from_str(
            r#"
                bind = "0.0.0.0:5300"
                ttl = 300

                [records]
                "example.com" = "93.184.216.34"
                "www.example.com" = "93.184.216.34"
            "#,
        )
        .unwrap();
        assert_eq!(config.bind, "0.0.0.0:5300".parse().unwrap());
        assert_eq!(config.ttl, 300);
        assert_eq!(config.records.len(), 2);
        assert_eq!(
            config.records["example.com"],
            Ipv4Addr::new(93, 184, 216, 34),
        );
    }

    #[test]
    fn omitted_settings_take_defaults() {
        let config: Config = toml::from_str(
            r#"
                [records]
                "example.com" = "93.184.216.34"
            "#,
        )
        .unwrap();
        assert_eq!(config.bind, DEFAULT_BIND);
        assert_eq!(config.ttl, DEFAULT_ANSWER_TTL);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(toml::from_str::<Config>("nonsense = true").is_err());
    }
}
