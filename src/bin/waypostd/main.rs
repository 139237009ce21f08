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

//! The `waypostd` binary: serves a static zone over UDP, or sends a
//! check query to a running server.

mod args;
mod config;
mod probe;
mod run;

fn main() {
    let args = args::parse();
    match args.command {
        args::Command::Run(run_args) => run::run(run_args),
        args::Command::Query(query_args) => probe::run(query_args),
    }
}
