//! RtpMap attribute (`a=rtpmap:...`)

use crate::{IResult, ws};
use bytes::Bytes;
use bytesstr::BytesStr;
use nom::bytes::complete::{tag, take_while1};
use nom::character::complete::digit1;
use nom::combinator::{map, map_res, opt, rest};
use nom::error::context;
use nom::sequence::{preceded, terminated, tuple};
use std::fmt;
use std::str::FromStr;

/// Rtpmap attribute (`a=rtpmap`)
///
/// Map a RTP payload number specified in the media description to a encoding.
///
/// [RFC8866](https://www.rfc-editor.org/rfc/rfc8866.html#section-6.6)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpMap {
    /// The number used in the media description which this maps a description to
    pub payload: u8,

    /// Name of the encoding
    pub encoding: BytesStr,

    /// Clock rate of the encoding
    pub clock_rate: u32,

    /// Channel count for audio encodings
    pub channels: Option<u32>,
}

impl RtpMap {
    pub fn parse<'i>(src: &Bytes, i: &'i str) -> IResult<&'i str, Self> {
        context(
            "parsing rtpmap",
            map(
                tuple((
                    map_res(digit1, u8::from_str),
                    ws(terminated(take_while1(|c: char| c != '/'), tag("/"))),
                    map_res(digit1, u32::from_str),
                    opt(preceded(tag("/"), map_res(rest, u32::from_str))),
                )),
                |(payload, encoding, clock_rate, channels)| RtpMap {
                    payload,
                    encoding: BytesStr::from_parse(src, encoding),
                    clock_rate,
                    channels,
                },
            ),
        )(i)
    }
}

impl fmt::Display for RtpMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}/{}", self.payload, self.encoding, self.clock_rate)?;

        if let Some(channels) = self.channels {
            write!(f, "/{channels}")?;
        }

        Ok(())
    }
}
