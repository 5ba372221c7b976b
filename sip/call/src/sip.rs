//! Minimal SIP message model exchanged with the transport layer
//!
//! Transactions, dialogs and headers belong to the transport. A call only sees the
//! CSeq number, the method, the status code and the SDP body.

use bytes::Bytes;
use bytesstr::BytesStr;
use sdp_types::SessionDescription;
use std::fmt;

/// Represents a SIP-Method.
///
/// Well known methods are available as constants, others can be created using [`From<&str>`].
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Method(Repr);

macro_rules! methods {
    ($($print:literal, $ident:ident;)+) => {
        #[derive(Debug, Clone, Eq, PartialEq, Hash)]
        #[allow(clippy::upper_case_acronyms)]
        enum Repr {
            $($ident,)+
            Other(BytesStr),
        }

        impl Method {
            $(pub const $ident: Self = Self(Repr::$ident);)+
        }

        impl From<&str> for Method {
            fn from(s: &str) -> Self {
                $(
                if s.eq_ignore_ascii_case($print) {
                    return Self(Repr::$ident);
                }
                )+

                Self(Repr::Other(BytesStr::from(s)))
            }
        }

        impl fmt::Display for Method {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match &self.0 {
                    $(Repr::$ident => f.write_str($print),)+
                    Repr::Other(other) => f.write_str(other),
                }
            }
        }
    };
}

methods! {
    "INVITE",  INVITE;
    "ACK",     ACK;
    "CANCEL",  CANCEL;
    "BYE",     BYE;
    "OPTIONS", OPTIONS;
}

/// SIP response status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatusCode(pub u16);

macro_rules! status_codes {
    ($($code:literal, $ident:ident, $text:literal;)+) => {
        impl StatusCode {
            $(pub const $ident: Self = Self($code);)+

            /// Default reason phrase of known codes
            pub fn text(self) -> Option<&'static str> {
                match self.0 {
                    $($code => Some($text),)+
                    _ => None,
                }
            }
        }
    };
}

status_codes! {
    180, RINGING, "Ringing";
    182, QUEUED, "Queued";
    183, SESSION_PROGRESS, "Session Progress";
    200, OK, "OK";
    400, BAD_REQUEST, "Bad Request";
    408, REQUEST_TIMEOUT, "Request Timeout";
    480, TEMPORARILY_UNAVAILABLE, "Temporarily Unavailable";
    481, CALL_OR_TRANSACTION_DOES_NOT_EXIST, "Call/Transaction Does Not Exist";
    486, BUSY_HERE, "Busy Here";
    487, REQUEST_TERMINATED, "Request Terminated";
    488, NOT_ACCEPTABLE_HERE, "Not Acceptable Here";
    491, REQUEST_PENDING, "Request Pending";
    500, SERVER_INTERNAL_ERROR, "Server Internal Error";
    501, NOT_IMPLEMENTED, "Not Implemented";
    603, DECLINE, "Decline";
}

impl StatusCode {
    pub fn is_provisional(self) -> bool {
        (100..200).contains(&self.0)
    }

    pub fn is_success(self) -> bool {
        (200..300).contains(&self.0)
    }

    pub fn is_server_error(self) -> bool {
        (500..600).contains(&self.0)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;

        if let Some(text) = self.text() {
            write!(f, " {text}")?;
        }

        Ok(())
    }
}

/// Request received from the peer
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub cseq: u32,
    pub method: Method,
    /// Raw message body, empty if none
    pub body: Bytes,
}

/// Response to a request previously sent by the call
#[derive(Debug, Clone)]
pub struct IncomingResponse {
    pub cseq: u32,
    pub method: Method,
    pub code: StatusCode,
    /// Raw message body, empty if none
    pub body: Bytes,
}

/// Request the transport must send to the peer
///
/// `ACK` and `CANCEL` carry the CSeq number of the INVITE they belong to.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub cseq: u32,
    pub method: Method,
    pub sdp: Option<SessionDescription>,
}

/// Response the transport must send for the request identified by `cseq` and `method`
#[derive(Debug, Clone)]
pub struct Response {
    pub cseq: u32,
    pub method: Method,
    pub code: StatusCode,
    pub sdp: Option<SessionDescription>,
}

/// Outcome of parsing the body of a message which may contain SDP
pub(crate) enum SdpBody {
    Empty,
    Invalid,
    Sdp(SessionDescription),
}

pub(crate) fn parse_sdp_body(body: Bytes) -> SdpBody {
    if body.is_empty() {
        return SdpBody::Empty;
    }

    let Ok(body) = BytesStr::from_utf8_bytes(body) else {
        return SdpBody::Invalid;
    };

    match SessionDescription::parse(&body) {
        Ok(sdp) => SdpBody::Sdp(sdp),
        Err(e) => {
            log::warn!("Failed to parse SDP body, {e}");
            SdpBody::Invalid
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn method_from_str() {
        assert_eq!(Method::from("invite"), Method::INVITE);
        assert_eq!(Method::from("BYE"), Method::BYE);
        assert_eq!(Method::from("INFO").to_string(), "INFO");
    }

    #[test]
    fn status_code_print() {
        assert_eq!(StatusCode::REQUEST_PENDING.to_string(), "491 Request Pending");
        assert_eq!(StatusCode(499).to_string(), "499");
        assert!(StatusCode(503).is_server_error());
    }

    #[test]
    fn empty_and_invalid_bodies() {
        assert!(matches!(parse_sdp_body(Bytes::new()), SdpBody::Empty));
        assert!(matches!(
            parse_sdp_body(Bytes::from_static(b"v=0\r\ns=-\r\n")),
            SdpBody::Invalid
        ));
    }
}
