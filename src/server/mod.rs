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

//! The processing logic of the authoritative responder.
//!
//! The [`Server`] structure is the heart of this module; see its
//! documentation for details.

use crate::message::constants::POINTER_TO_QUESTION;
use crate::message::{Header, Qclass, Qtype, Rcode};
use crate::zone::ZoneLookup;

pub mod request;

use request::{Outcome, RejectReason, Request};

/// The TTL returned with answer records when none is configured.
pub const DEFAULT_ANSWER_TTL: u32 = 60;

////////////////////////////////////////////////////////////////////////
// SERVER PUBLIC API AND CORE MESSAGE-HANDLING LOGIC                  //
////////////////////////////////////////////////////////////////////////

/// An authoritative responder for A queries against a static zone,
/// abstracted from any underlying network I/O.
///
/// The `Server` implements the message-processing half of the
/// responder: [`Server::handle`] takes one received datagram and
/// produces the reply to send, if any. An I/O driver (such as
/// [`UdpTransport`](crate::io::UdpTransport)) is responsible for
/// receiving datagrams from the network and sending the replies back.
///
/// Replies are produced from the server's [`ZoneLookup`] source,
/// which is immutable for the life of the `Server`; handling takes
/// `&self` and keeps no other state, so a `Server` can be shared
/// freely across threads.
pub struct Server<Z> {
    zone: Z,
    answer_ttl: u32,
}

impl<Z> Server<Z> {
    /// Creates a new `Server` answering from the provided zone, with
    /// an answer TTL of [`DEFAULT_ANSWER_TTL`].
    pub fn new(zone: Z) -> Self {
        Self {
            zone,
            answer_ttl: DEFAULT_ANSWER_TTL,
        }
    }

    /// Returns the TTL returned with answer records.
    pub fn answer_ttl(&self) -> u32 {
        self.answer_ttl
    }

    /// Sets the TTL returned with answer records.
    pub fn set_answer_ttl(&mut self, ttl: u32) {
        self.answer_ttl = ttl;
    }
}

impl<Z> Server<Z>
where
    Z: ZoneLookup,
{
    /// Handles one received datagram. This is the API through which
    /// I/O drivers submit messages.
    ///
    /// Returns the serialized reply to send back to the datagram's
    /// source, or [`None`] if the datagram is to be dropped without a
    /// reply (it was under 12 or over 512 octets, leaving nothing
    /// trustworthy to echo). The reply, when there is one, carries
    /// the request's ID, opcode, and RD bit; QR set; RA, TC, and Z
    /// clear; and the RCODE and answer section determined by the
    /// outcome:
    ///
    /// * an unparseable question or a QDCOUNT other than 1 earns
    ///   FORMERR with no question echoed;
    /// * a class other than IN, or a QTYPE other than A, earns NOTIMP;
    /// * an A query for a name absent from the zone earns NXDOMAIN;
    /// * an A query for a name in the zone earns NOERROR with one
    ///   answer record.
    ///
    /// Replies that echo the question also set AA: this server is the
    /// authority for everything it serves. The echo reuses the raw
    /// question octets of `datagram`, so it is byte-exact even where
    /// the name's case is mixed.
    ///
    /// `handle` is deterministic: the same datagram and zone yield
    /// byte-identical output.
    pub fn handle(&self, datagram: &[u8]) -> Option<Vec<u8>> {
        match request::parse(datagram) {
            Outcome::Rejected(RejectReason::SizeOutOfBounds) => None,
            Outcome::Rejected(
                RejectReason::WrongQuestionCount(header)
                | RejectReason::MalformedQuestion(header),
            ) => Some(error_reply(&header, Rcode::FormErr)),
            Outcome::Rejected(RejectReason::UnsupportedClass(request)) => {
                Some(self.negative_reply(datagram, &request, Rcode::NotImp))
            }
            Outcome::Accepted(request) => {
                if request.question.qtype != Qtype::A {
                    Some(self.negative_reply(datagram, &request, Rcode::NotImp))
                } else if let Some(address) = self.zone.resolve(&request.question.name) {
                    Some(self.answer_reply(datagram, &request, address))
                } else {
                    Some(self.negative_reply(datagram, &request, Rcode::NxDomain))
                }
            }
        }
    }

    /// Builds a reply that echoes the question with the given error
    /// RCODE and an empty answer section.
    fn negative_reply(&self, datagram: &[u8], request: &Request, rcode: Rcode) -> Vec<u8> {
        let mut header = response_header(&request.header);
        header.set_aa(true);
        header.set_rcode(rcode);
        header.qdcount = 1;

        let mut reply = header.encode().to_vec();
        reply.extend_from_slice(request.question_octets(datagram));
        reply
    }

    /// Builds a NOERROR reply: the echoed question plus one A record
    /// whose owner is a compression pointer back to the question
    /// name.
    fn answer_reply(&self, datagram: &[u8], request: &Request, address: [u8; 4]) -> Vec<u8> {
        let mut header = response_header(&request.header);
        header.set_aa(true);
        header.qdcount = 1;
        header.ancount = 1;

        let mut reply = header.encode().to_vec();
        reply.extend_from_slice(request.question_octets(datagram));
        reply.extend_from_slice(&POINTER_TO_QUESTION);
        reply.extend_from_slice(&u16::from(Qtype::A).to_be_bytes());
        reply.extend_from_slice(&u16::from(Qclass::IN).to_be_bytes());
        reply.extend_from_slice(&self.answer_ttl.to_be_bytes());
        reply.extend_from_slice(&(address.len() as u16).to_be_bytes());
        reply.extend_from_slice(&address);
        reply
    }
}

/// Builds a header-only FORMERR (or other error) reply for a request
/// whose question could not be used. AA is left clear: with no
/// question echoed there is nothing to be authoritative for.
fn error_reply(request_header: &Header, rcode: Rcode) -> Vec<u8> {
    let mut header = response_header(request_header);
    header.set_rcode(rcode);
    header.encode().to_vec()
}

/// Starts a response header from a request header: ID and opcode
/// copied verbatim, RD copied, QR set, everything else clear.
fn response_header(request_header: &Header) -> Header {
    let mut header = Header {
        id: request_header.id,
        ..Header::default()
    };
    header.set_qr(true);
    header.set_opcode_bits(request_header.opcode_bits());
    header.set_rd(request_header.rd());
    header
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client;
    use crate::message::constants::{HEADER_SIZE, QUESTION_START};
    use crate::zone::StaticZone;

    fn test_server() -> Server<StaticZone> {
        let zone = StaticZone::new([
            ("example.com".to_owned(), "93.184.216.34".parse().unwrap()),
            ("www.example.com".to_owned(), "93.184.216.34".parse().unwrap()),
        ])
        .unwrap();
        Server::new(zone)
    }

    fn query(name: &str, qtype: Qtype, id: u16) -> Vec<u8> {
        client::build_query(name, qtype, id).unwrap()
    }

    #[test]
    fn known_name_resolves() {
        let server = test_server();
        let request = query("example.com", Qtype::A, 0x4242);
        let reply = server.handle(&request).unwrap();

        let header = Header::decode(&reply).unwrap();
        assert_eq!(header.id, 0x4242);
        assert!(header.qr());
        assert!(header.aa());
        assert!(header.rd());
        assert!(!header.ra());
        assert!(!header.tc());
        assert_eq!(header.rcode(), Rcode::NoError);
        assert_eq!(header.qdcount, 1);
        assert_eq!(header.ancount, 1);
        assert_eq!(
            client::extract_first_a_record(&reply),
            Some([93, 184, 216, 34]),
        );
    }

    #[test]
    fn lookup_is_case_insensitive_and_the_echo_is_byte_exact() {
        let server = test_server();
        let request = query("WWW.Example.COM", Qtype::A, 7);
        let reply = server.handle(&request).unwrap();

        let header = Header::decode(&reply).unwrap();
        assert_eq!(header.rcode(), Rcode::NoError);
        assert_eq!(header.ancount, 1);
        // The question comes back with its case untouched.
        assert_eq!(
            &reply[QUESTION_START..QUESTION_START + 21],
            b"\x03WWW\x07Example\x03COM\x00\x00\x01\x00\x01",
        );
    }

    #[test]
    fn unknown_name_earns_nxdomain() {
        let server = test_server();
        let request = query("nosuchname.invalid", Qtype::A, 9);
        let reply = server.handle(&request).unwrap();

        let header = Header::decode(&reply).unwrap();
        assert_eq!(header.rcode(), Rcode::NxDomain);
        assert_eq!(header.ancount, 0);
        assert!(header.aa());
        assert_eq!(client::extract_first_a_record(&reply), None);
    }

    #[test]
    fn unsupported_qtype_earns_notimp() {
        let server = test_server();
        let request = query("example.com", Qtype::AAAA, 11);
        let reply = server.handle(&request).unwrap();

        let header = Header::decode(&reply).unwrap();
        assert_eq!(header.rcode(), Rcode::NotImp);
        assert_eq!(header.ancount, 0);
        assert_eq!(header.qdcount, 1);
    }

    #[test]
    fn unsupported_qclass_earns_notimp() {
        let server = test_server();
        let mut request = query("example.com", Qtype::A, 13);
        *request.last_mut().unwrap() = 3; // QCLASS = CH
        let reply = server.handle(&request).unwrap();

        let header = Header::decode(&reply).unwrap();
        assert_eq!(header.rcode(), Rcode::NotImp);
        assert_eq!(header.ancount, 0);
    }

    #[test]
    fn garbage_sizes_produce_no_reply() {
        let server = test_server();
        assert_eq!(server.handle(&[]), None);
        assert_eq!(server.handle(&[0; 11]), None);
        assert_eq!(server.handle(&[0; 600]), None);
    }

    #[test]
    fn truncated_question_earns_formerr_without_an_echo() {
        let server = test_server();
        let mut request = query("example.com", Qtype::A, 0xbeef);
        request.truncate(16); // mid-label
        let reply = server.handle(&request).unwrap();

        let header = Header::decode(&reply).unwrap();
        assert_eq!(header.id, 0xbeef);
        assert_eq!(header.rcode(), Rcode::FormErr);
        assert_eq!(header.qdcount, 0);
        assert!(!header.aa());
        assert!(header.rd());
        assert_eq!(reply.len(), HEADER_SIZE);
    }

    #[test]
    fn wrong_question_count_earns_formerr() {
        let server = test_server();
        let mut request = query("example.com", Qtype::A, 5);
        request[5] = 0; // QDCOUNT = 0
        let reply = server.handle(&request).unwrap();
        assert_eq!(Header::decode(&reply).unwrap().rcode(), Rcode::FormErr);

        request[5] = 2;
        let reply = server.handle(&request).unwrap();
        assert_eq!(Header::decode(&reply).unwrap().rcode(), Rcode::FormErr);
    }

    #[test]
    fn opcode_is_copied_verbatim() {
        let server = test_server();
        let mut request = query("example.com", Qtype::A, 21);
        // Patch opcode 2 (STATUS) into the flags word.
        request[2] |= 2 << 3;
        let reply = server.handle(&request).unwrap();
        assert_eq!(Header::decode(&reply).unwrap().opcode_bits(), 2);
    }

    #[test]
    fn handle_is_idempotent() {
        let server = test_server();
        for request in [
            query("example.com", Qtype::A, 1),
            query("nosuchname.invalid", Qtype::A, 2),
            query("example.com", Qtype::AAAA, 3),
        ] {
            assert_eq!(server.handle(&request), server.handle(&request));
        }
    }

    #[test]
    fn answer_record_has_the_documented_wire_form() {
        let mut server = test_server();
        server.set_answer_ttl(300);
        let request = query("example.com", Qtype::A, 1);
        let reply = server.handle(&request).unwrap();

        let answer_start = request.len(); // header + echoed question
        assert_eq!(
            &reply[answer_start..],
            b"\xc0\x0c\x00\x01\x00\x01\x00\x00\x01\x2c\x00\x04\x5d\xb8\xd8\x22",
        );
    }
}
