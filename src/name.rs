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

//! Encoding and decoding of domain names in the on-the-wire
//! label-sequence format of [RFC 1035 § 3.1].
//!
//! Names are handled here as dotted ASCII strings (`example.com`).
//! The wire form is a sequence of labels, each preceded by a length
//! octet, ending with a null label. Case is preserved in both
//! directions; comparison (for zone lookup) is the caller's concern.
//!
//! Compressed names ([RFC 1035 § 4.1.4]) are deliberately not decoded:
//! a length octet with both high bits set fails with
//! [`Error::CompressionUnsupported`] rather than being followed. This
//! codec never needs to read a pointer—the only name this server
//! parses is the question name, which precedes any possible pointer
//! target—and refusing them removes the pointer-chasing loop as a
//! class of bugs outright.
//!
//! [RFC 1035 § 3.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.1
//! [RFC 1035 § 4.1.4]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.4

use std::fmt;

use arrayvec::ArrayVec;

/// The maximum length of the wire representation of a domain name,
/// including all length octets and the null terminator.
pub const MAX_WIRE_LEN: usize = 255;

/// The maximum length of a single label (not counting its length
/// octet).
pub const MAX_LABEL_LEN: usize = 63;

/// The label-length octet tag bits that mark a compression pointer.
const POINTER_TAG: u8 = 0xc0;

////////////////////////////////////////////////////////////////////////
// ENCODING                                                           //
////////////////////////////////////////////////////////////////////////

/// Encodes a dotted domain name into its wire representation,
/// including the terminating null label.
///
/// The name must be non-empty, each dot-separated label must be 1 to
/// 63 octets of non-control ASCII, and the complete wire form must fit
/// in 255 octets. A trailing dot is rejected like any other empty
/// label; the undotted form is canonical throughout this crate.
pub fn encode(name: &str) -> Result<Vec<u8>, Error> {
    if name.is_empty() {
        return Err(Error::EmptyName);
    }

    // Accumulating into a capacity-limited buffer makes the 255-octet
    // bound fall out of the container rather than a running counter.
    let mut wire = ArrayVec::<u8, MAX_WIRE_LEN>::new();
    for label in name.split('.') {
        if label.is_empty() {
            return Err(Error::EmptyLabel);
        } else if label.len() > MAX_LABEL_LEN {
            return Err(Error::LabelTooLong);
        }
        for &octet in label.as_bytes() {
            if !octet.is_ascii() || octet.is_ascii_control() {
                return Err(Error::InvalidByte);
            }
        }
        wire.try_push(label.len() as u8)
            .or(Err(Error::NameTooLong))?;
        wire.try_extend_from_slice(label.as_bytes())
            .or(Err(Error::NameTooLong))?;
    }
    wire.try_push(0).or(Err(Error::NameTooLong))?;
    Ok(wire.to_vec())
}

////////////////////////////////////////////////////////////////////////
// DECODING                                                           //
////////////////////////////////////////////////////////////////////////

/// Decodes a wire-format name starting at index `offset` of `buf`.
///
/// On success, returns the dotted string form (wire case preserved)
/// and the index of the first octet past the null terminator. Label
/// octets must be non-control ASCII; a length octet with both high
/// bits set fails with [`Error::CompressionUnsupported`] (see the
/// module documentation). Running off the end of `buf`, and a name
/// whose wire form would exceed 255 octets, both fail with
/// [`Error::Truncated`].
pub fn decode(buf: &[u8], offset: usize) -> Result<(String, usize), Error> {
    let mut text = String::new();
    let mut cursor = offset;
    let mut wire_len = 0;

    loop {
        let len = label_len(buf, cursor, &mut wire_len)?;
        if len == 0 {
            return Ok((text, cursor + 1));
        }
        let label = buf
            .get(cursor + 1..cursor + 1 + len)
            .ok_or(Error::Truncated)?;
        if !text.is_empty() {
            text.push('.');
        }
        for &octet in label {
            if !octet.is_ascii() || octet.is_ascii_control() {
                return Err(Error::InvalidByte);
            }
            text.push(octet as char);
        }
        cursor += 1 + len;
    }
}

/// Advances past a wire-format name starting at index `offset` of
/// `buf`, without building the string form. Returns the index of the
/// first octet past the null terminator. The failure rules are those
/// of [`decode`], except that label octets are not inspected.
pub fn skip(buf: &[u8], offset: usize) -> Result<usize, Error> {
    let mut cursor = offset;
    let mut wire_len = 0;

    loop {
        let len = label_len(buf, cursor, &mut wire_len)?;
        if len == 0 {
            return Ok(cursor + 1);
        }
        cursor += 1 + len;
        if cursor > buf.len() {
            return Err(Error::Truncated);
        }
    }
}

/// Reads and validates the label-length octet at `cursor`, charging it
/// and its label against the running wire length.
fn label_len(buf: &[u8], cursor: usize, wire_len: &mut usize) -> Result<usize, Error> {
    let len = *buf.get(cursor).ok_or(Error::Truncated)?;
    if len & POINTER_TAG == POINTER_TAG {
        return Err(Error::CompressionUnsupported);
    } else if len as usize > MAX_LABEL_LEN {
        // The remaining tag patterns (0x40 and 0x80) are not valid
        // label lengths either; they fall in this range.
        return Err(Error::LabelTooLong);
    }
    *wire_len += len as usize + 1;
    if *wire_len > MAX_WIRE_LEN {
        return Err(Error::Truncated);
    }
    Ok(len as usize)
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error type used to report problems encoding and decoding domain
/// names.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    /// A compression pointer was encountered while decoding. This
    /// codec does not follow pointers.
    CompressionUnsupported,

    /// A label between dots was empty when encoding.
    EmptyLabel,

    /// The string provided for encoding was empty.
    EmptyName,

    /// A label octet was not ASCII, or was an ASCII control octet.
    InvalidByte,

    /// A label was longer than 63 octets.
    LabelTooLong,

    /// The name would be longer than 255 octets on the wire when
    /// encoding.
    NameTooLong,

    /// The buffer ended in the middle of the name while decoding, or
    /// the decoded name would exceed 255 octets on the wire.
    Truncated,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::CompressionUnsupported => f.write_str("compressed names are not supported"),
            Self::EmptyLabel => f.write_str("label is empty"),
            Self::EmptyName => f.write_str("name is empty"),
            Self::InvalidByte => f.write_str("label contains a non-ASCII or control byte"),
            Self::LabelTooLong => f.write_str("label is longer than 63 bytes"),
            Self::NameTooLong => f.write_str("name is longer than 255 bytes on the wire"),
            Self::Truncated => f.write_str("name is truncated"),
        }
    }
}

impl std::error::Error for Error {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
