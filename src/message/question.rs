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

//! Implementation of types relating to DNS questions.

use std::fmt;

use crate::name;

////////////////////////////////////////////////////////////////////////
// QUESTIONS                                                          //
////////////////////////////////////////////////////////////////////////

/// The question of a DNS query.
///
/// Defined in [RFC 1035 § 4.1.2], a DNS question includes
///
/// * the QNAME, which is the domain name whose records are being
///   queried;
/// * the [QTYPE](Qtype), which specifies what type of records are
///   desired; and
/// * the [QCLASS](Qclass), which specifies which DNS class to search.
///
/// The name is held in its dotted string form with wire case
/// preserved; zone lookup compares it case-insensitively.
///
/// [RFC 1035 § 4.1.2]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.2
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Question {
    pub name: String,
    pub qtype: Qtype,
    pub qclass: Qclass,
}

impl Question {
    /// Serializes the question: the name's wire form followed by the
    /// QTYPE and QCLASS as big-endian 16-bit integers.
    pub fn encode(&self) -> Result<Vec<u8>, name::Error> {
        let mut wire = name::encode(&self.name)?;
        wire.extend_from_slice(&u16::from(self.qtype).to_be_bytes());
        wire.extend_from_slice(&u16::from(self.qclass).to_be_bytes());
        Ok(wire)
    }

    /// Deserializes a question starting at index `offset` of `buf`.
    /// On success, returns the question and the index of the first
    /// octet past it.
    pub fn decode(buf: &[u8], offset: usize) -> Result<(Self, usize), super::Error> {
        let (name, name_end) = name::decode(buf, offset)?;
        let qtype = read_u16(buf, name_end)?.into();
        let qclass = read_u16(buf, name_end + 2)?.into();
        let question = Self {
            name,
            qtype,
            qclass,
        };
        Ok((question, name_end + 4))
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.qclass, self.qtype)
    }
}

/// Reads a network-byte-order `u16` at index `offset` of `buf`.
fn read_u16(buf: &[u8], offset: usize) -> Result<u16, super::Error> {
    let array = buf
        .get(offset..offset + 2)
        .ok_or(super::Error::UnexpectedEom)?
        .try_into()
        .unwrap();
    Ok(u16::from_be_bytes(array))
}

////////////////////////////////////////////////////////////////////////
// QTYPES                                                             //
////////////////////////////////////////////////////////////////////////

/// The QTYPE of a DNS [question](Question).
///
/// A QTYPE is represented on the wire as an unsigned 16-bit integer,
/// so this is a wrapper around [`u16`] with [`Display`](fmt::Display)
/// and [`Debug`](fmt::Debug) implementations and constants for the
/// types this crate deals in. [A](Qtype::A) is the only QTYPE the
/// server answers; anything else earns a NOTIMP response.
#[derive(Copy, Clone, Eq, Hash, PartialEq)]
pub struct Qtype(u16);

impl Qtype {
    pub const A: Self = Self(1);
    pub const AAAA: Self = Self(28);
}

impl From<u16> for Qtype {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<Qtype> for u16 {
    fn from(qtype: Qtype) -> Self {
        qtype.0
    }
}

impl fmt::Display for Qtype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::A => f.write_str("A"),
            Self::AAAA => f.write_str("AAAA"),
            Self(value) => write!(f, "TYPE{}", value), // RFC 3597 § 5
        }
    }
}

impl fmt::Debug for Qtype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

////////////////////////////////////////////////////////////////////////
// QCLASSES                                                           //
////////////////////////////////////////////////////////////////////////

/// The QCLASS of a DNS [question](Question).
///
/// Like [`Qtype`], a wrapper around the raw wire integer.
/// [IN](Qclass::IN) is the only QCLASS the server accepts; anything
/// else earns a NOTIMP response.
#[derive(Copy, Clone, Eq, Hash, PartialEq)]
pub struct Qclass(u16);

impl Qclass {
    pub const IN: Self = Self(1);
}

impl From<u16> for Qclass {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<Qclass> for u16 {
    fn from(qclass: Qclass) -> Self {
        qclass.0
    }
}

impl fmt::Display for Qclass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::IN => f.write_str("IN"),
            Self(value) => write!(f, "CLASS{}", value), // RFC 3597 § 5
        }
    }
}

impl fmt::Debug for Qclass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::super::Error;
    use super::*;

    #[test]
    fn encode_appends_qtype_and_qclass() {
        let question = Question {
            name: "example.com".to_owned(),
            qtype: Qtype::A,
            qclass: Qclass::IN,
        };
        assert_eq!(
            question.encode().unwrap(),
            b"\x07example\x03com\x00\x00\x01\x00\x01",
        );
    }

    #[test]
    fn decode_round_trips() {
        let question = Question {
            name: "example.com".to_owned(),
            qtype: Qtype::AAAA,
            qclass: Qclass::IN,
        };
        let wire = question.encode().unwrap();
        assert_eq!(Question::decode(&wire, 0), Ok((question, wire.len())));
    }

    #[test]
    fn decode_starts_at_the_given_offset() {
        let buf = b"xxxx\x01a\x00\x00\x01\x00\x01";
        let (question, end) = Question::decode(buf, 4).unwrap();
        assert_eq!(question.name, "a");
        assert_eq!(end, buf.len());
    }

    #[test]
    fn decode_rejects_missing_fixed_fields() {
        // The name is fine, but QTYPE/QCLASS are cut short.
        assert_eq!(
            Question::decode(b"\x01a\x00\x00\x01\x00", 0),
            Err(Error::UnexpectedEom),
        );
        assert_eq!(
            Question::decode(b"\x01a\x00", 0),
            Err(Error::UnexpectedEom),
        );
    }

    #[test]
    fn decode_propagates_name_errors() {
        assert_eq!(
            Question::decode(b"\x07exam", 0),
            Err(Error::BadName(name::Error::Truncated)),
        );
    }

    #[test]
    fn qtype_and_qclass_display_unknown_values_per_rfc3597() {
        assert_eq!(Qtype::from(0xff00).to_string(), "TYPE65280");
        assert_eq!(Qclass::from(0xff00).to_string(), "CLASS65280");
        assert_eq!(Qtype::A.to_string(), "A");
        assert_eq!(Qclass::IN.to_string(), "IN");
    }
}
