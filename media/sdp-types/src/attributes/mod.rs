use bytesstr::BytesStr;
use std::fmt;

mod candidate;
mod direction;
mod rtpmap;

pub use candidate::Candidate;
pub use direction::Direction;
pub use rtpmap::RtpMap;

/// Attribute which is kept as is, `a=name` or `a=name:value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAttribute {
    pub name: BytesStr,
    pub value: Option<BytesStr>,
}

impl UnknownAttribute {
    pub(crate) fn new(src: &BytesStr, name: &str, value: Option<&str>) -> Self {
        Self {
            name: src.slice_ref(name),
            value: value.map(|value| src.slice_ref(value)),
        }
    }
}

impl fmt::Display for UnknownAttribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "a={}:{value}", self.name),
            None => write!(f, "a={}", self.name),
        }
    }
}
