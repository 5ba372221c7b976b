use crate::parser::{ParseSessionDescriptionError, Parser};
use crate::{Connection, Direction, MediaDescription, Origin, Time, UnknownAttribute};
use bytesstr::BytesStr;
use std::fmt;

/// The Session Description message. Can be serialized to valid SDP using the [`fmt::Display`] implementation and
/// parse SDP using [`SessionDescription::parse`].
#[derive(Debug, Clone)]
pub struct SessionDescription {
    /// Origin (o field)
    pub origin: Origin,

    /// The name of the sdp session (s field)
    pub name: BytesStr,

    /// Optional connection (c field)
    pub connection: Option<Connection>,

    /// Session start/stop time (t field)
    pub time: Time,

    /// Session level direction, inherited by media descriptions which do not specify their own
    pub direction: Direction,

    /// All attributes not parsed directly
    pub attributes: Vec<UnknownAttribute>,

    /// Media descriptions
    pub media_descriptions: Vec<MediaDescription>,
}

impl SessionDescription {
    pub fn parse(src: &BytesStr) -> Result<Self, ParseSessionDescriptionError> {
        let lines = src.split(['\n', '\r']).filter(|line| !line.is_empty());

        let mut parser = Parser::default();

        for complete_line in lines {
            parser.parse_line(src, complete_line)?;
        }

        parser.finish()
    }

    /// Connection of the media description, falling back to the session level connection
    pub fn media_connection<'s>(&'s self, media: &'s MediaDescription) -> Option<&'s Connection> {
        media.connection.as_ref().or(self.connection.as_ref())
    }
}

impl fmt::Display for SessionDescription {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "v=0\r\n")?;
        write!(f, "{}\r\n", self.origin)?;
        write!(f, "s={}\r\n", self.name)?;

        if let Some(conn) = &self.connection {
            write!(f, "{conn}\r\n")?;
        }

        write!(f, "{}\r\n", self.time)?;

        // omit direction here, since it is always written in media descriptions

        for attr in &self.attributes {
            write!(f, "{attr}\r\n")?;
        }

        for media_description in &self.media_descriptions {
            write!(f, "{media_description}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{MediaType, TaggedAddress};
    use std::net::{IpAddr, Ipv4Addr};

    const OFFER: &str = "v=0\r
o=- 3724394400 3724394405 IN IP4 198.51.100.1\r
s=-\r
c=IN IP4 198.51.100.1\r
t=0 0\r
a=sendonly\r
m=audio 49170 RTP/AVP 0 101\r
a=rtpmap:0 PCMU/8000\r
a=rtpmap:101 telephone-event/8000\r
a=candidate:1 1 UDP 2130706431 198.51.100.1 49170 typ host\r
m=video 0 RTP/AVP 96\r
a=recvonly\r
a=rtpmap:96 H264/90000\r
a=fmtp:96 profile-level-id=42e01f\r
";

    #[test]
    fn parse_offer() {
        let sdp = SessionDescription::parse(&BytesStr::from_static(OFFER)).unwrap();

        assert_eq!(sdp.origin.session_version, 3724394405);
        assert_eq!(
            sdp.connection.as_ref().map(|c| &c.address),
            Some(&TaggedAddress::IP4(Ipv4Addr::new(198, 51, 100, 1)))
        );
        assert_eq!(sdp.media_descriptions.len(), 2);

        let audio = &sdp.media_descriptions[0];
        assert_eq!(audio.media.media_type, MediaType::Audio);
        assert_eq!(audio.direction, Direction::SendOnly);
        assert_eq!(audio.rtpmap.len(), 2);
        assert_eq!(audio.candidates.len(), 1);
        assert_eq!(
            sdp.media_connection(audio).and_then(|c| c.address.ip()),
            Some(IpAddr::V4(Ipv4Addr::new(198, 51, 100, 1)))
        );

        let video = &sdp.media_descriptions[1];
        assert!(video.is_rejected());
        assert_eq!(video.direction, Direction::RecvOnly);
        assert_eq!(video.attributes.len(), 1);
        assert_eq!(video.attributes[0].name, "fmtp");
    }

    #[test]
    fn print_omits_sendrecv() {
        let mut sdp = SessionDescription::parse(&BytesStr::from_static(OFFER)).unwrap();

        sdp.media_descriptions[0].direction = Direction::SendRecv;

        let printed = sdp.to_string();

        assert!(!printed.contains("a=sendrecv"));
        assert!(printed.contains("a=recvonly\r\n"));
        assert!(printed.contains("m=video 0 RTP/AVP 96\r\n"));
        assert!(printed.contains("a=fmtp:96 profile-level-id=42e01f\r\n"));

        let reparsed = SessionDescription::parse(&BytesStr::from(printed)).unwrap();
        assert_eq!(reparsed.media_descriptions[0].direction, Direction::SendRecv);
    }

    #[test]
    fn missing_origin() {
        let result = SessionDescription::parse(&BytesStr::from_static("v=0\r\ns=-\r\nt=0 0\r\n"));

        assert!(matches!(
            result,
            Err(ParseSessionDescriptionError::MissingOrigin)
        ));
    }
}
