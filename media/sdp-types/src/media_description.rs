use crate::{
    Candidate, Connection, Direction, Media, MediaType, RtpMap, TransportProtocol,
    UnknownAttribute,
};
use bytesstr::BytesStr;
use std::fmt;

/// Part of the [`SessionDescription`](crate::SessionDescription) describes a single media session
///
/// [RFC8866](https://www.rfc-editor.org/rfc/rfc8866.html#section-5.14)
#[derive(Debug, Clone)]
pub struct MediaDescription {
    /// Media description's media field (m=)
    pub media: Media,

    /// Optional connection (c field)
    pub connection: Option<Connection>,

    /// Media direction attribute, written only if it differs from the implicit `sendrecv`
    pub direction: Direction,

    /// Media ID (a=mid)
    pub mid: Option<BytesStr>,

    /// RTP Payload mappings
    pub rtpmap: Vec<RtpMap>,

    /// ICE candidates
    pub candidates: Vec<Candidate>,

    /// Additional attributes
    pub attributes: Vec<UnknownAttribute>,
}

impl MediaDescription {
    pub fn new(media: Media) -> Self {
        Self {
            media,
            connection: None,
            direction: Direction::SendRecv,
            mid: None,
            rtpmap: vec![],
            candidates: vec![],
            attributes: vec![],
        }
    }

    /// Create a media description with port zero, which rejects or removes a media line
    pub fn rejected(media_type: MediaType) -> Self {
        Self::new(Media {
            media_type,
            port: 0,
            proto: TransportProtocol::RtpAvp,
            fmts: vec![0],
        })
    }

    pub fn is_rejected(&self) -> bool {
        self.media.port == 0
    }
}

impl fmt::Display for MediaDescription {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\r\n", self.media)?;

        if let Some(conn) = &self.connection {
            write!(f, "{conn}\r\n")?;
        }

        if self.direction != Direction::SendRecv {
            write!(f, "a={}\r\n", self.direction)?;
        }

        if let Some(mid) = &self.mid {
            write!(f, "a=mid:{mid}\r\n")?;
        }

        for rtpmap in &self.rtpmap {
            write!(f, "a=rtpmap:{rtpmap}\r\n")?;
        }

        for candidate in &self.candidates {
            write!(f, "a=candidate:{candidate}\r\n")?;
        }

        for attr in &self.attributes {
            write!(f, "{attr}\r\n")?;
        }

        Ok(())
    }
}
