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

//! Validation and decoding of received datagrams.

use crate::message::constants::{HEADER_SIZE, MAX_UDP_MESSAGE, QUESTION_START};
use crate::message::{Header, Qclass, Question};

////////////////////////////////////////////////////////////////////////
// REQUEST PARSING                                                    //
////////////////////////////////////////////////////////////////////////

/// Validates and decodes one received datagram.
///
/// This is a pure function of the input octets: no lookup, no I/O.
/// The checks run in a fixed order and the first failure wins:
///
/// 1. The datagram must be at least a full header (12 octets) and at
///    most 512 octets. Outside that range there is not enough
///    trustworthy information to echo, and the datagram is dropped
///    without a reply.
/// 2. QDCOUNT must be exactly 1.
/// 3. The question at offset 12 must decode.
/// 4. The question's class must be IN.
///
/// Each rejection carries whatever was decoded before the failure so
/// the responder can copy the ID, opcode, and RD bit, and echo the
/// question where one exists.
pub fn parse(datagram: &[u8]) -> Outcome {
    if datagram.len() < HEADER_SIZE || datagram.len() > MAX_UDP_MESSAGE {
        return Outcome::Rejected(RejectReason::SizeOutOfBounds);
    }

    let header = match Header::decode(datagram) {
        Ok(header) => header,
        // Unreachable after the length gate, but a parser of hostile
        // input does not get to assume that.
        Err(_) => return Outcome::Rejected(RejectReason::SizeOutOfBounds),
    };

    if header.qdcount != 1 {
        return Outcome::Rejected(RejectReason::WrongQuestionCount(header));
    }

    let (question, question_end) = match Question::decode(datagram, QUESTION_START) {
        Ok(decoded) => decoded,
        Err(_) => return Outcome::Rejected(RejectReason::MalformedQuestion(header)),
    };

    let request = Request {
        header,
        question,
        question_len: question_end - QUESTION_START,
    };
    if request.question.qclass != Qclass::IN {
        return Outcome::Rejected(RejectReason::UnsupportedClass(request));
    }
    Outcome::Accepted(request)
}

/// The terminal state of [`parse`] for one datagram.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    Accepted(Request),
    Rejected(RejectReason),
}

/// A decoded request. Constructed per incoming datagram and discarded
/// once the matching reply has been produced; never persisted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Request {
    pub header: Header,
    pub question: Question,

    /// The wire length of the question section. The responder echoes
    /// the question by slicing the original datagram, not by
    /// re-encoding, so the echo is byte-exact.
    pub question_len: usize,
}

impl Request {
    /// Returns the raw question section of the datagram this request
    /// was parsed from.
    pub fn question_octets<'a>(&self, datagram: &'a [u8]) -> &'a [u8] {
        &datagram[QUESTION_START..QUESTION_START + self.question_len]
    }
}

/// Why [`parse`] rejected a datagram.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RejectReason {
    /// Shorter than a header or longer than 512 octets. No reply is
    /// ever sent for this; see [`parse`].
    SizeOutOfBounds,

    /// QDCOUNT was not 1.
    WrongQuestionCount(Header),

    /// The question did not decode.
    MalformedQuestion(Header),

    /// The question decoded but its class was not IN.
    UnsupportedClass(Request),
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Qtype;

    /// A well-formed query for example.com. IN A with ID 0x1234 and RD
    /// set.
    const EXAMPLE_COM_A_QUERY: &[u8] =
        b"\x12\x34\x01\x00\x00\x01\x00\x00\x00\x00\x00\x00\x07example\x03com\x00\x00\x01\x00\x01";

    #[test]
    fn parse_accepts_a_well_formed_query() {
        let request = match parse(EXAMPLE_COM_A_QUERY) {
            Outcome::Accepted(request) => request,
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(request.header.id, 0x1234);
        assert!(request.header.rd());
        assert_eq!(request.question.name, "example.com");
        assert_eq!(request.question.qtype, Qtype::A);
        assert_eq!(request.question.qclass, Qclass::IN);
        assert_eq!(request.question_len, 17);
        assert_eq!(
            request.question_octets(EXAMPLE_COM_A_QUERY),
            b"\x07example\x03com\x00\x00\x01\x00\x01",
        );
    }

    #[test]
    fn parse_drops_undersized_and_oversized_datagrams() {
        assert_eq!(
            parse(&[]),
            Outcome::Rejected(RejectReason::SizeOutOfBounds),
        );
        assert_eq!(
            parse(&[0; 11]),
            Outcome::Rejected(RejectReason::SizeOutOfBounds),
        );
        assert_eq!(
            parse(&[0; 600]),
            Outcome::Rejected(RejectReason::SizeOutOfBounds),
        );
        // The boundary sizes themselves are within bounds.
        assert!(!matches!(
            parse(&[0; 12]),
            Outcome::Rejected(RejectReason::SizeOutOfBounds),
        ));
        assert!(!matches!(
            parse(&[0; 512]),
            Outcome::Rejected(RejectReason::SizeOutOfBounds),
        ));
    }

    #[test]
    fn parse_rejects_wrong_question_counts() {
        // A bare header: QDCOUNT = 0.
        let mut datagram = EXAMPLE_COM_A_QUERY.to_vec();
        datagram[5] = 0;
        match parse(&datagram) {
            Outcome::Rejected(RejectReason::WrongQuestionCount(header)) => {
                assert_eq!(header.id, 0x1234);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        datagram[5] = 2;
        assert!(matches!(
            parse(&datagram),
            Outcome::Rejected(RejectReason::WrongQuestionCount(_)),
        ));
    }

    #[test]
    fn parse_rejects_truncated_questions() {
        // Cut the datagram in the middle of the name.
        let truncated = &EXAMPLE_COM_A_QUERY[..16];
        match parse(truncated) {
            Outcome::Rejected(RejectReason::MalformedQuestion(header)) => {
                assert_eq!(header.id, 0x1234);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn parse_rejects_label_lengths_past_the_end() {
        // The first label claims 0x3f octets; only a few remain.
        let datagram =
            b"\x12\x34\x01\x00\x00\x01\x00\x00\x00\x00\x00\x00\x3fexam\x00\x00\x01\x00\x01";
        assert!(matches!(
            parse(datagram),
            Outcome::Rejected(RejectReason::MalformedQuestion(_)),
        ));
    }

    #[test]
    fn parse_rejects_compression_pointers_in_the_question() {
        let datagram = b"\x12\x34\x01\x00\x00\x01\x00\x00\x00\x00\x00\x00\xc0\x0c\x00\x01\x00\x01";
        assert!(matches!(
            parse(datagram),
            Outcome::Rejected(RejectReason::MalformedQuestion(_)),
        ));
    }

    #[test]
    fn parse_rejects_classes_other_than_in() {
        // Same query, QCLASS = CH (3).
        let mut datagram = EXAMPLE_COM_A_QUERY.to_vec();
        *datagram.last_mut().unwrap() = 3;
        match parse(&datagram) {
            Outcome::Rejected(RejectReason::UnsupportedClass(request)) => {
                assert_eq!(request.question.name, "example.com");
                assert_eq!(u16::from(request.question.qclass), 3);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
