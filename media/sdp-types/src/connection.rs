use crate::{IResult, TaggedAddress};
use bytes::Bytes;
use nom::combinator::map;
use nom::error::context;
use std::fmt;
use std::net::IpAddr;

/// Connection field (`c=`)
///
/// Multicast TTL and address ranges are not used by calls and are not parsed.
///
/// [RFC8866](https://www.rfc-editor.org/rfc/rfc8866.html#section-5.7)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub address: TaggedAddress,
}

impl Connection {
    pub fn parse<'i>(src: &Bytes, i: &'i str) -> IResult<&'i str, Self> {
        context(
            "parsing connection",
            map(TaggedAddress::parse(src), |address| Connection { address }),
        )(i)
    }
}

impl From<IpAddr> for Connection {
    fn from(ip: IpAddr) -> Self {
        Connection {
            address: ip.into(),
        }
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "c={}", self.address)
    }
}
