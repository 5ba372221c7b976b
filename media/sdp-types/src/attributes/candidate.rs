//! ICE Candidate (`a=candidate:...`)

use crate::{IResult, ice_char, is_host6_char, not_whitespace, ws};
use bytes::Bytes;
use bytesstr::BytesStr;
use nom::bytes::complete::{tag, take_while1};
use nom::character::complete::digit1;
use nom::combinator::{map, map_res};
use nom::error::context;
use nom::sequence::{preceded, tuple};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// SDP ICE Candidate
///
/// Only the mandatory part of the attribute is kept, extensions like `raddr`/`rport` are skipped.
///
/// [RFC5245](https://tools.ietf.org/html/rfc5245#section-15.1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Session unique ID assigned to the candidate
    pub foundation: BytesStr,

    /// RTP is 1 and RTCP is 2
    pub component: u32,

    /// Usually UDP or TCP
    pub transport: BytesStr,

    pub priority: u64,

    pub address: IpAddr,

    pub port: u16,

    /// `host`, `srflx`, `prflx`, `relay` or something entirely else
    pub typ: BytesStr,
}

impl Candidate {
    pub fn parse<'i>(src: &Bytes, i: &'i str) -> IResult<&'i str, Self> {
        context(
            "parsing candidate",
            map(
                tuple((
                    take_while1(ice_char),
                    ws(map_res(digit1, u32::from_str)),
                    ws(take_while1(not_whitespace)),
                    ws(map_res(digit1, u64::from_str)),
                    ws(map_res(take_while1(is_host6_char), IpAddr::from_str)),
                    ws(map_res(digit1, u16::from_str)),
                    ws(preceded(tag("typ"), ws(take_while1(not_whitespace)))),
                )),
                |(foundation, component, transport, priority, address, port, typ)| Candidate {
                    foundation: BytesStr::from_parse(src, foundation),
                    component,
                    transport: BytesStr::from_parse(src, transport),
                    priority,
                    address,
                    port,
                    typ: BytesStr::from_parse(src, typ),
                },
            ),
        )(i)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} typ {}",
            self.foundation,
            self.component,
            self.transport,
            self.priority,
            self.address,
            self.port,
            self.typ
        )
    }
}
