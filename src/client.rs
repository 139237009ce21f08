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

//! The client-side half: building queries and verifying replies.
//!
//! These functions are transport-agnostic; callers send the query
//! bytes over whatever socket they own and hand the reply bytes back.

use std::fmt;

use crate::message::constants::{HEADER_SIZE, MAX_UDP_MESSAGE};
use crate::message::{Header, Qclass, Qtype, Question};
use crate::name;

////////////////////////////////////////////////////////////////////////
// QUERY BUILDING                                                     //
////////////////////////////////////////////////////////////////////////

/// Assembles a complete query message: a header with the given
/// transaction ID, the RD bit set, and QDCOUNT 1, followed by the one
/// question with QCLASS IN.
///
/// Fails with [`BuildError::InvalidQtype`] if the raw QTYPE value is
/// 0 (reserved), with [`BuildError::InvalidName`] if `name` cannot be
/// encoded, and with [`BuildError::TooLarge`] if the assembled
/// message would exceed the 512-octet UDP ceiling.
pub fn build_query(name: &str, qtype: Qtype, id: u16) -> Result<Vec<u8>, BuildError> {
    if u16::from(qtype) == 0 {
        return Err(BuildError::InvalidQtype);
    }

    let mut header = Header {
        id,
        qdcount: 1,
        ..Header::default()
    };
    header.set_rd(true);
    let question = Question {
        name: name.to_owned(),
        qtype,
        qclass: Qclass::IN,
    };

    let mut message = header.encode().to_vec();
    message.extend_from_slice(&question.encode()?);
    if message.len() > MAX_UDP_MESSAGE {
        return Err(BuildError::TooLarge);
    }
    Ok(message)
}

////////////////////////////////////////////////////////////////////////
// REPLY VERIFICATION                                                 //
////////////////////////////////////////////////////////////////////////

/// Extracts the address from the first answer record of a reply.
///
/// Returns the 4-octet RDATA only if the reply has at least one
/// answer, the echoed question (when present) can be skipped, and
/// the first answer is an A record in class IN with RDLENGTH 4. The
/// answer's owner may be a compression pointer (as this crate's
/// responder always emits) or a literal name; a pointer is accepted
/// without following it. Any structural problem—truncation included—
/// yields [`None`]; this function never panics on hostile input.
pub fn extract_first_a_record(resp: &[u8]) -> Option<[u8; 4]> {
    let header = Header::decode(resp).ok()?;
    if header.ancount == 0 {
        return None;
    }

    let mut cursor = HEADER_SIZE;
    match header.qdcount {
        0 => (),
        1 => {
            cursor = name::skip(resp, cursor).ok()?;
            cursor += 4; // QTYPE + QCLASS
        }
        // More questions than this crate's responder ever echoes.
        _ => return None,
    }

    // The answer's owner field: a two-octet pointer or a literal
    // name.
    let first = *resp.get(cursor)?;
    if first & 0xc0 == 0xc0 {
        cursor += 2;
    } else {
        cursor = name::skip(resp, cursor).ok()?;
    }

    let rr_type = read_u16(resp, cursor)?;
    let class = read_u16(resp, cursor + 2)?;
    let rdlength = read_u16(resp, cursor + 8)?;
    if rr_type != u16::from(Qtype::A) || class != u16::from(Qclass::IN) || rdlength != 4 {
        return None;
    }
    resp.get(cursor + 10..cursor + 14)?.try_into().ok()
}

/// Reads a network-byte-order `u16` at index `offset` of `resp`, if
/// it is all there.
fn read_u16(resp: &[u8], offset: usize) -> Option<u16> {
    let array = resp.get(offset..offset + 2)?.try_into().ok()?;
    Some(u16::from_be_bytes(array))
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error signaling that a query could not be built.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BuildError {
    /// The name could not be encoded.
    InvalidName(name::Error),

    /// The QTYPE value 0 is reserved and never valid in a query.
    InvalidQtype,

    /// The assembled message would not fit in an unextended UDP
    /// payload.
    TooLarge,
}

impl From<name::Error> for BuildError {
    fn from(err: name::Error) -> Self {
        Self::InvalidName(err)
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::InvalidName(err) => write!(f, "invalid name: {}", err),
            Self::InvalidQtype => f.write_str("QTYPE 0 is reserved"),
            Self::TooLarge => f.write_str("message exceeds 512 bytes"),
        }
    }
}

impl std::error::Error for BuildError {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_query_produces_the_documented_wire_form() {
        let query = build_query("example.com", Qtype::A, 0xbeef).unwrap();
        assert_eq!(
            query,
            b"\xbe\xef\x01\x00\x00\x01\x00\x00\x00\x00\x00\x00\
              \x07example\x03com\x00\x00\x01\x00\x01",
        );
    }

    #[test]
    fn build_query_sets_only_rd() {
        let query = build_query("example.com", Qtype::AAAA, 1).unwrap();
        let header = Header::decode(&query).unwrap();
        assert!(!header.qr());
        assert_eq!(header.opcode_bits(), 0);
        assert!(header.rd());
        assert!(!header.ra());
        assert_eq!(header.qdcount, 1);
        assert_eq!(header.ancount, 0);
    }

    #[test]
    fn build_query_rejects_qtype_zero() {
        assert_eq!(
            build_query("example.com", Qtype::from(0), 1),
            Err(BuildError::InvalidQtype),
        );
    }

    #[test]
    fn build_query_rejects_bad_names() {
        assert_eq!(
            build_query("", Qtype::A, 1),
            Err(BuildError::InvalidName(name::Error::EmptyName)),
        );
    }

    /// A full NOERROR reply as the responder builds it: ID 0x1234,
    /// question example.com IN A echoed, one answer via the pointer,
    /// TTL 60, address 93.184.216.34.
    const NOERROR_REPLY: &[u8] =
        b"\x12\x34\x85\x00\x00\x01\x00\x01\x00\x00\x00\x00\
          \x07example\x03com\x00\x00\x01\x00\x01\
          \xc0\x0c\x00\x01\x00\x01\x00\x00\x00\x3c\x00\x04\x5d\xb8\xd8\x22";

    #[test]
    fn extract_reads_a_pointer_owned_answer() {
        assert_eq!(
            extract_first_a_record(NOERROR_REPLY),
            Some([93, 184, 216, 34]),
        );
    }

    #[test]
    fn extract_reads_a_literal_owned_answer() {
        // The same reply with the answer's owner written out in full
        // instead of compressed.
        let mut reply = NOERROR_REPLY.to_vec();
        reply.splice(29..31, b"\x07example\x03com\x00".iter().copied());
        assert_eq!(extract_first_a_record(&reply), Some([93, 184, 216, 34]));
    }

    #[test]
    fn extract_requires_an_answer() {
        // An NXDOMAIN reply: header + echoed question only.
        let reply =
            b"\x12\x34\x85\x03\x00\x01\x00\x00\x00\x00\x00\x00\x07example\x03com\x00\x00\x01\x00\x01";
        assert_eq!(extract_first_a_record(reply), None);
    }

    #[test]
    fn extract_requires_type_a_class_in_rdlength_4() {
        // TYPE patched to AAAA.
        let mut reply = NOERROR_REPLY.to_vec();
        reply[32] = 28;
        assert_eq!(extract_first_a_record(&reply), None);

        // CLASS patched to CH.
        let mut reply = NOERROR_REPLY.to_vec();
        reply[34] = 3;
        assert_eq!(extract_first_a_record(&reply), None);

        // RDLENGTH patched to 5.
        let mut reply = NOERROR_REPLY.to_vec();
        reply[40] = 5;
        assert_eq!(extract_first_a_record(&reply), None);
    }

    #[test]
    fn extract_never_panics_on_truncation() {
        for len in 0..NOERROR_REPLY.len() {
            assert_eq!(extract_first_a_record(&NOERROR_REPLY[..len]), None);
        }
    }

    #[test]
    fn extract_rejects_multi_question_replies() {
        let mut reply = NOERROR_REPLY.to_vec();
        reply[5] = 2; // QDCOUNT
        assert_eq!(extract_first_a_record(&reply), None);
    }
}
