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

//! Implementation of reading and writing of DNS messages.

use std::fmt;

use crate::name;

pub mod constants;
mod header;
mod question;
mod rcode;
pub use header::Header;
pub use question::{Qclass, Qtype, Question};
pub use rcode::{IntoRcodeError, Rcode};

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error signaling that a [`Header`] or [`Question`] could not be
/// read.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    /// The buffer does not contain a full 12-octet header.
    HeaderTooShort,

    /// The buffer ended in the middle of a fixed field.
    UnexpectedEom,

    /// The question name could not be decoded.
    BadName(name::Error),
}

impl From<name::Error> for Error {
    fn from(err: name::Error) -> Self {
        Self::BadName(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::HeaderTooShort => f.write_str("header too short"),
            Self::UnexpectedEom => f.write_str("unexpected end of message in field"),
            Self::BadName(err) => write!(f, "bad name: {}", err),
        }
    }
}

impl std::error::Error for Error {}
