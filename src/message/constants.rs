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

//! Constants related to DNS messages.

pub const HEADER_SIZE: usize = 12;
pub const ID_START: usize = 0;
pub const ID_END: usize = 2;
pub const FLAGS_START: usize = 2;
pub const FLAGS_END: usize = 4;
pub const QDCOUNT_START: usize = 4;
pub const QDCOUNT_END: usize = 6;
pub const ANCOUNT_START: usize = 6;
pub const ANCOUNT_END: usize = 8;
pub const NSCOUNT_START: usize = 8;
pub const NSCOUNT_END: usize = 10;
pub const ARCOUNT_START: usize = 10;
pub const ARCOUNT_END: usize = 12;

// Masks and shifts within the 16-bit flags word.
pub const QR_MASK: u16 = 0x8000;
pub const OPCODE_MASK: u16 = 0x7800;
pub const OPCODE_SHIFT: usize = 11;
pub const AA_MASK: u16 = 0x0400;
pub const TC_MASK: u16 = 0x0200;
pub const RD_MASK: u16 = 0x0100;
pub const RA_MASK: u16 = 0x0080;
pub const Z_MASK: u16 = 0x0070;
pub const RCODE_MASK: u16 = 0x000f;

/// The offset of the question section; the answer record's owner is
/// always written as a compression pointer to this offset.
pub const QUESTION_START: usize = 12;

/// The wire form of that pointer.
pub const POINTER_TO_QUESTION: [u8; 2] = [0xc0, QUESTION_START as u8];

/// The maximum size of a DNS message over UDP without EDNS
/// ([RFC 1035 § 4.2.1]), which this server does not implement.
///
/// [RFC 1035 § 4.2.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.2.1
pub const MAX_UDP_MESSAGE: usize = 512;
