//! Answer-section extraction
//!
//! CNAME records in front of the address are skipped; the first remaining
//! answer must carry the requested type.

use hickory_proto::op::Message;
use hickory_proto::rr::{RData, RecordType};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Why an answer section did not yield an address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AnswerError {
    /// No answer records besides aliases
    Empty,
    /// The first non-alias answer has another type
    Unexpected(RecordType),
}

impl fmt::Display for AnswerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerError::Empty => f.write_str("empty answer section"),
            AnswerError::Unexpected(rtype) => write!(f, "unexpected {} answer record", rtype),
        }
    }
}

/// First address answer, skipping aliases
fn first_address(message: &Message) -> Result<&RData, AnswerError> {
    let record = message
        .answers()
        .iter()
        .find(|r| r.record_type() != RecordType::CNAME)
        .ok_or(AnswerError::Empty)?;

    record
        .data()
        .ok_or(AnswerError::Unexpected(record.record_type()))
}

/// Extract the IPv4 address from an A answer
pub(crate) fn first_ipv4(message: &Message) -> Result<Ipv4Addr, AnswerError> {
    match first_address(message)? {
        RData::A(a) => Ok(a.0),
        other => Err(AnswerError::Unexpected(other.record_type())),
    }
}

/// Extract the IPv6 address from an AAAA answer
pub(crate) fn first_ipv6(message: &Message) -> Result<Ipv6Addr, AnswerError> {
    match first_address(message)? {
        RData::AAAA(aaaa) => Ok(aaaa.0),
        other => Err(AnswerError::Unexpected(other.record_type())),
    }
}
