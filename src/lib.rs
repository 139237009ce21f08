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

//! Waypost is a minimal authoritative DNS responder: it answers A
//! queries over UDP from a small static zone, and refuses everything
//! else with the appropriate RCODE.
//!
//! The crate is organized around a hand-written codec for the slice
//! of the DNS wire format this server speaks:
//!
//! * [`name`] encodes and decodes domain names in the label-sequence
//!   format (and rejects compression pointers outright);
//! * [`message`] covers the fixed header, questions, and the RCODE
//!   and QTYPE/QCLASS values;
//! * [`server`] parses received datagrams and builds replies against
//!   a [`zone`] lookup table;
//! * [`io`] is the blocking UDP driver that connects a
//!   [`Server`](server::Server) to a socket; and
//! * [`client`] builds queries and extracts answers for callers that
//!   want to verify a running server.
//!
//! The codec's contract is that no input, however malformed, causes a
//! panic, an out-of-bounds read, or an infinite loop. Every length
//! taken from the wire is checked before use, and the decode path
//! refuses compression pointers rather than following them.

pub mod client;
pub mod io;
pub mod message;
pub mod name;
pub mod server;
pub mod zone;
