use crate::{IResult, is_host_char, is_host6_char};
use bytes::Bytes;
use bytesstr::BytesStr;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_while1};
use nom::combinator::map;
use nom::error::context;
use nom::sequence::preceded;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Network type and address type prefixed address (`IN IP4 192.0.2.1`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaggedAddress {
    IP4(Ipv4Addr),
    IP4FQDN(BytesStr),

    IP6(Ipv6Addr),
    IP6FQDN(BytesStr),
}

impl TaggedAddress {
    pub fn parse(src: &Bytes) -> impl Fn(&str) -> IResult<&str, Self> + '_ {
        move |i| {
            context(
                "parsing tagged address",
                alt((
                    preceded(
                        tag("IN IP4 "),
                        map(take_while1(is_host_char), |host: &str| match host.parse() {
                            Ok(ip) => TaggedAddress::IP4(ip),
                            Err(_) => TaggedAddress::IP4FQDN(BytesStr::from_parse(src, host)),
                        }),
                    ),
                    preceded(
                        tag("IN IP6 "),
                        map(take_while1(is_host6_char), |host: &str| match host.parse() {
                            Ok(ip) => TaggedAddress::IP6(ip),
                            Err(_) => TaggedAddress::IP6FQDN(BytesStr::from_parse(src, host)),
                        }),
                    ),
                )),
            )(i)
        }
    }

    /// Returns the IP address, if the address isn't a FQDN
    pub fn ip(&self) -> Option<IpAddr> {
        match self {
            TaggedAddress::IP4(ip) => Some(IpAddr::V4(*ip)),
            TaggedAddress::IP6(ip) => Some(IpAddr::V6(*ip)),
            TaggedAddress::IP4FQDN(..) | TaggedAddress::IP6FQDN(..) => None,
        }
    }
}

impl From<IpAddr> for TaggedAddress {
    fn from(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(ip) => Self::IP4(ip),
            IpAddr::V6(ip) => Self::IP6(ip),
        }
    }
}

impl fmt::Display for TaggedAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaggedAddress::IP4(addr) => write!(f, "IN IP4 {addr}"),
            TaggedAddress::IP4FQDN(fqdn) => write!(f, "IN IP4 {fqdn}"),
            TaggedAddress::IP6(addr) => write!(f, "IN IP6 {addr}"),
            TaggedAddress::IP6FQDN(fqdn) => write!(f, "IN IP6 {fqdn}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn address_ip4() {
        let input = BytesStr::from_static("IN IP4 192.168.123.222");

        let (rem, addr) = TaggedAddress::parse(input.as_ref())(&input).unwrap();

        assert!(rem.is_empty());
        assert_eq!(addr, TaggedAddress::IP4(Ipv4Addr::new(192, 168, 123, 222)));
        assert_eq!(addr.ip(), Some(IpAddr::V4(Ipv4Addr::new(192, 168, 123, 222))));
    }

    #[test]
    fn address_ip6_host() {
        let input = BytesStr::from_static("IN IP6 example.com");

        let (rem, addr) = TaggedAddress::parse(input.as_ref())(&input).unwrap();

        assert!(rem.is_empty());

        match addr {
            TaggedAddress::IP6FQDN(host) => assert_eq!(host, "example.com"),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn address_print() {
        let addr = TaggedAddress::from(IpAddr::V4(Ipv4Addr::LOCALHOST));

        assert_eq!(addr.to_string(), "IN IP4 127.0.0.1");
    }
}
