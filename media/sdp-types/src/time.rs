use crate::{IResult, ws};
use nom::character::complete::digit1;
use nom::combinator::{map, map_res};
use nom::error::context;
use nom::sequence::tuple;
use std::fmt;
use std::str::FromStr;

/// Time field (`t=`)
///
/// Calls always use `t=0 0`, the session is bounded by the SIP dialog.
///
/// [RFC8866](https://www.rfc-editor.org/rfc/rfc8866.html#section-5.9)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Time {
    pub start: u64,
    pub stop: u64,
}

impl Time {
    pub fn parse(i: &str) -> IResult<&str, Self> {
        context(
            "parsing time field",
            map(
                tuple((
                    map_res(digit1, u64::from_str),
                    ws(map_res(digit1, u64::from_str)),
                )),
                |(start, stop)| Time { start, stop },
            ),
        )(i)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "t={} {}", self.start, self.stop)
    }
}
