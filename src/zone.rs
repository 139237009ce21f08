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

//! The zone data that the [`Server`](crate::server::Server) answers
//! from.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use crate::name;

////////////////////////////////////////////////////////////////////////
// ZONE LOOKUP                                                        //
////////////////////////////////////////////////////////////////////////

/// A source of A records for the server.
///
/// `resolve` is an exact-match, case-insensitive lookup from a dotted
/// domain name to an IPv4 address. Implementations must be immutable
/// for the life of the server: the lookup table is the one resource
/// shared between concurrent handlers, and it requires no
/// synchronization only because nothing writes to it.
pub trait ZoneLookup {
    /// Looks up the address for `name`, which is compared without
    /// regard to ASCII case.
    fn resolve(&self, name: &str) -> Option<[u8; 4]>;
}

////////////////////////////////////////////////////////////////////////
// STATIC ZONES                                                       //
////////////////////////////////////////////////////////////////////////

/// A fixed table of names and addresses, loaded once at startup.
///
/// Names are validated with the [name codec](crate::name) when the
/// table is built—a name that cannot be encoded could never match a
/// decoded question—and stored lower-cased, so lookups are a single
/// hash probe over the lower-cased query name.
pub struct StaticZone {
    records: HashMap<String, [u8; 4]>,
}

impl StaticZone {
    /// Builds a zone from `(name, address)` pairs. Fails if any name
    /// is not a valid domain name; a repeated name keeps the last
    /// address given.
    pub fn new<I>(records: I) -> Result<Self, name::Error>
    where
        I: IntoIterator<Item = (String, Ipv4Addr)>,
    {
        let mut map = HashMap::new();
        for (record_name, address) in records {
            name::encode(&record_name)?;
            map.insert(record_name.to_ascii_lowercase(), address.octets());
        }
        Ok(Self { records: map })
    }

    /// Returns the number of records in the zone.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether the zone has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ZoneLookup for StaticZone {
    fn resolve(&self, name: &str) -> Option<[u8; 4]> {
        self.records.get(&name.to_ascii_lowercase()).copied()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
