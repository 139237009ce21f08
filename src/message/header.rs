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

//! Implementation of the [`Header`] type for the fixed 12-octet DNS
//! message header.

use super::constants::*;
use super::Rcode;

////////////////////////////////////////////////////////////////////////
// HEADER                                                             //
////////////////////////////////////////////////////////////////////////

/// The fixed header that begins every DNS message ([RFC 1035 §
/// 4.1.1]): the 16-bit transaction ID, the flags word, and the four
/// section counts.
///
/// Each count field must equal the number of entries actually
/// serialized in the corresponding section of the message the header
/// precedes.
///
/// The flags word is kept intact rather than exploded into fields;
/// the accessor methods mask out the individual bits. This makes
/// copying a request's opcode into a response a plain bit operation
/// and keeps [`Header::encode`] and [`Header::decode`] exact
/// inverses.
///
/// [RFC 1035 § 4.1.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.1
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Header {
    pub id: u16,
    pub flags: u16,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

impl Header {
    /// Serializes the header into its 12-octet wire form.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut octets = [0; HEADER_SIZE];
        octets[ID_START..ID_END].copy_from_slice(&self.id.to_be_bytes());
        octets[FLAGS_START..FLAGS_END].copy_from_slice(&self.flags.to_be_bytes());
        octets[QDCOUNT_START..QDCOUNT_END].copy_from_slice(&self.qdcount.to_be_bytes());
        octets[ANCOUNT_START..ANCOUNT_END].copy_from_slice(&self.ancount.to_be_bytes());
        octets[NSCOUNT_START..NSCOUNT_END].copy_from_slice(&self.nscount.to_be_bytes());
        octets[ARCOUNT_START..ARCOUNT_END].copy_from_slice(&self.arcount.to_be_bytes());
        octets
    }

    /// Deserializes a header from the first 12 octets of `buf`,
    /// failing if `buf` is shorter than that.
    pub fn decode(buf: &[u8]) -> Result<Self, super::Error> {
        if buf.len() < HEADER_SIZE {
            return Err(super::Error::HeaderTooShort);
        }
        Ok(Self {
            id: field(buf, ID_START),
            flags: field(buf, FLAGS_START),
            qdcount: field(buf, QDCOUNT_START),
            ancount: field(buf, ANCOUNT_START),
            nscount: field(buf, NSCOUNT_START),
            arcount: field(buf, ARCOUNT_START),
        })
    }

    /// Returns whether the QR (query response) bit is set.
    pub fn qr(&self) -> bool {
        self.flags & QR_MASK != 0
    }

    /// Sets or clears the QR bit.
    pub fn set_qr(&mut self, qr: bool) {
        self.set_bit(QR_MASK, qr);
    }

    /// Returns the raw four-bit opcode field. This server never
    /// interprets the opcode; it is copied verbatim from request to
    /// response.
    pub fn opcode_bits(&self) -> u8 {
        ((self.flags & OPCODE_MASK) >> OPCODE_SHIFT) as u8
    }

    /// Sets the opcode field. Bits of `bits` above the low four are
    /// discarded.
    pub fn set_opcode_bits(&mut self, bits: u8) {
        self.flags = (self.flags & !OPCODE_MASK) | (((bits & 0xf) as u16) << OPCODE_SHIFT);
    }

    /// Returns whether the AA (authoritative answer) bit is set.
    pub fn aa(&self) -> bool {
        self.flags & AA_MASK != 0
    }

    /// Sets or clears the AA bit.
    pub fn set_aa(&mut self, aa: bool) {
        self.set_bit(AA_MASK, aa);
    }

    /// Returns whether the TC (truncation) bit is set.
    pub fn tc(&self) -> bool {
        self.flags & TC_MASK != 0
    }

    /// Returns whether the RD (recursion desired) bit is set.
    pub fn rd(&self) -> bool {
        self.flags & RD_MASK != 0
    }

    /// Sets or clears the RD bit.
    pub fn set_rd(&mut self, rd: bool) {
        self.set_bit(RD_MASK, rd);
    }

    /// Returns whether the RA (recursion available) bit is set.
    pub fn ra(&self) -> bool {
        self.flags & RA_MASK != 0
    }

    /// Returns the RCODE field.
    pub fn rcode(&self) -> Rcode {
        // The mask keeps the value within the four-bit range that
        // Rcode covers in full, so the conversion cannot fail.
        ((self.flags & RCODE_MASK) as u8).try_into().unwrap()
    }

    /// Sets the RCODE field.
    pub fn set_rcode(&mut self, rcode: Rcode) {
        self.flags = (self.flags & !RCODE_MASK) | (u8::from(rcode) as u16 & RCODE_MASK);
    }

    fn set_bit(&mut self, mask: u16, value: bool) {
        if value {
            self.flags |= mask;
        } else {
            self.flags &= !mask;
        }
    }
}

/// Reads the big-endian `u16` field at `start`. The caller has
/// already checked that the full header is present.
fn field(buf: &[u8], start: usize) -> u16 {
    u16::from_be_bytes([buf[start], buf[start + 1]])
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
