use crate::{IResult, TaggedAddress, not_whitespace, ws};
use bytes::Bytes;
use bytesstr::BytesStr;
use nom::bytes::complete::take_while1;
use nom::character::complete::digit1;
use nom::combinator::{map, map_res};
use nom::error::context;
use nom::sequence::tuple;
use std::fmt;
use std::str::FromStr;

/// Origin field (`o=`)
///
/// [RFC8866](https://www.rfc-editor.org/rfc/rfc8866.html#section-5.2)
#[derive(Debug, Clone)]
pub struct Origin {
    /// Username of the origin
    pub username: BytesStr,

    /// Globally unique session identifier
    pub session_id: u64,

    /// The version of the session, must be incremented with every modification
    pub session_version: u64,

    /// The source address of the message
    pub address: TaggedAddress,
}

impl Origin {
    pub fn parse<'i>(src: &Bytes, i: &'i str) -> IResult<&'i str, Self> {
        context(
            "parsing origin",
            map(
                tuple((
                    take_while1(not_whitespace),
                    ws(map_res(digit1, u64::from_str)),
                    ws(map_res(digit1, u64::from_str)),
                    ws(TaggedAddress::parse(src)),
                )),
                |(username, session_id, session_version, address)| Origin {
                    username: BytesStr::from_parse(src, username),
                    session_id,
                    session_version,
                    address,
                },
            ),
        )(i)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "o={} {} {} {}",
            self.username, self.session_id, self.session_version, self.address
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn origin() {
        let input = BytesStr::from_static("- 123456789 987654321 IN IP4 192.168.123.222");

        let (rem, origin) = Origin::parse(input.as_ref(), &input).unwrap();

        assert!(rem.is_empty());

        assert_eq!(origin.username, "-");
        assert_eq!(origin.session_id, 123456789);
        assert_eq!(origin.session_version, 987654321);
        assert_eq!(
            origin.address,
            TaggedAddress::IP4(Ipv4Addr::new(192, 168, 123, 222))
        );
    }

    #[test]
    fn origin_print() {
        let origin = Origin {
            username: BytesStr::from_static("-"),
            session_id: 1,
            session_version: 2,
            address: TaggedAddress::IP4(Ipv4Addr::new(10, 0, 0, 1)),
        };

        assert_eq!(origin.to_string(), "o=- 1 2 IN IP4 10.0.0.1");
    }
}
