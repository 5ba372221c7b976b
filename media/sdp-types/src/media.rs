use crate::{IResult, not_whitespace, ws};
use bytes::Bytes;
use bytesstr::BytesStr;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_while1};
use nom::character::complete::digit1;
use nom::combinator::{map, map_res};
use nom::error::context;
use nom::multi::many0;
use nom::sequence::tuple;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Audio,
    Video,
    Text,
    App,
}

impl MediaType {
    pub fn parse(i: &str) -> IResult<&str, Self> {
        context(
            "parsing media type",
            alt((
                map(tag("audio"), |_| MediaType::Audio),
                map(tag("video"), |_| MediaType::Video),
                map(tag("text"), |_| MediaType::Text),
                map(tag("application"), |_| MediaType::App),
            )),
        )(i)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MediaType::Audio => f.write_str("audio"),
            MediaType::Video => f.write_str("video"),
            MediaType::Text => f.write_str("text"),
            MediaType::App => f.write_str("application"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportProtocol {
    /// RTP over UDP
    RtpAvp,

    /// RTP with [RFC4585](https://www.rfc-editor.org/rfc/rfc4585.html) feedback
    RtpAvpf,

    /// SRTP over UDP
    RtpSavp,

    /// Other unknown
    Other(BytesStr),
}

impl TransportProtocol {
    pub fn parse(src: &Bytes) -> impl Fn(&str) -> IResult<&str, Self> + '_ {
        move |i| {
            map(take_while1(not_whitespace), |proto: &str| match proto {
                "RTP/AVP" => TransportProtocol::RtpAvp,
                "RTP/AVPF" => TransportProtocol::RtpAvpf,
                "RTP/SAVP" => TransportProtocol::RtpSavp,
                _ => TransportProtocol::Other(BytesStr::from_parse(src, proto)),
            })(i)
        }
    }
}

impl fmt::Display for TransportProtocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TransportProtocol::RtpAvp => f.write_str("RTP/AVP"),
            TransportProtocol::RtpAvpf => f.write_str("RTP/AVPF"),
            TransportProtocol::RtpSavp => f.write_str("RTP/SAVP"),
            TransportProtocol::Other(other) => f.write_str(other),
        }
    }
}

/// Media field (`m=`)
///
/// [RFC8866](https://www.rfc-editor.org/rfc/rfc8866.html#section-5.14)
#[derive(Debug, Clone)]
pub struct Media {
    pub media_type: MediaType,
    /// A port of zero marks the media as rejected or removed
    pub port: u16,
    pub proto: TransportProtocol,
    pub fmts: Vec<u8>,
}

impl Media {
    pub fn parse<'i>(src: &Bytes, i: &'i str) -> IResult<&'i str, Self> {
        context(
            "parsing media field",
            map(
                tuple((
                    MediaType::parse,
                    ws(map_res(digit1, u16::from_str)),
                    ws(TransportProtocol::parse(src)),
                    many0(ws(map_res(digit1, u8::from_str))),
                )),
                |(media_type, port, proto, fmts)| Media {
                    media_type,
                    port,
                    proto,
                    fmts,
                },
            ),
        )(i)
    }
}

impl fmt::Display for Media {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "m={} {} {}", self.media_type, self.port, self.proto)?;

        for fmt in &self.fmts {
            write!(f, " {fmt}")?;
        }

        Ok(())
    }
}
