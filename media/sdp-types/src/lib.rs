#![warn(unreachable_pub)]
//! The subset of SDP ([RFC8866](https://www.rfc-editor.org/rfc/rfc8866.html)) a SIP call
//! exchanges in its offer/answer negotiation.

use nom::character::complete::space0;
use nom::error::VerboseError;
use nom::sequence::preceded;

mod attributes;
mod connection;
mod media;
mod media_description;
mod origin;
mod parser;
mod session_description;
mod tagged_address;
mod time;

pub use attributes::{Candidate, Direction, RtpMap, UnknownAttribute};
pub use connection::Connection;
pub use media::{Media, MediaType, TransportProtocol};
pub use media_description::MediaDescription;
pub use origin::Origin;
pub use parser::ParseSessionDescriptionError;
pub use session_description::SessionDescription;
pub use tagged_address::TaggedAddress;
pub use time::Time;

type IResult<I, O> = nom::IResult<I, O, VerboseError<I>>;

/// Skip leading spaces before running `parser`
fn ws<'i, O, F>(parser: F) -> impl FnMut(&'i str) -> IResult<&'i str, O>
where
    F: nom::Parser<&'i str, O, VerboseError<&'i str>>,
{
    preceded(space0, parser)
}

fn verbose_error_to_owned(i: VerboseError<&str>) -> VerboseError<String> {
    VerboseError {
        errors: i
            .errors
            .into_iter()
            .map(|(i, kind)| (i.into(), kind))
            .collect(),
    }
}

fn not_whitespace(c: char) -> bool {
    !c.is_ascii_whitespace()
}

fn ice_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '/')
}

fn is_host_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

fn is_host6_char(c: char) -> bool {
    is_host_char(c) || c == ':'
}
