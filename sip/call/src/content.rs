use crate::dtmf::DtmfEngine;
use crate::stream::Stream;
use crate::{ContentId, Handle};
use bytesstr::BytesStr;
use sdp_types::{
    Candidate, Connection, Direction, Media, MediaDescription, MediaType, RtpMap,
    TransportProtocol,
};
use std::net::IpAddr;

/// Whether a content existed since the call was set up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Lives as long as the call, can't be removed
    Initial,
    /// Added during the call, can be removed by either party
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferOrigin {
    Local,
    Remote,
}

/// Outstanding media description offer, answered by the media layer
#[derive(Debug, Clone)]
pub struct MediaDescriptionOffer {
    pub origin: OfferOrigin,
    pub remote_codecs: Vec<Codec>,
}

/// Normalized RTP payload description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Codec {
    pub payload: u8,
    pub name: BytesStr,
    pub clock_rate: u32,
    pub channels: Option<u32>,
}

impl Codec {
    pub fn new(payload: u8, name: &str, clock_rate: u32) -> Self {
        Self {
            payload,
            name: BytesStr::from(name),
            clock_rate,
            channels: None,
        }
    }

    /// Payload types which may be used without `a=rtpmap`
    fn from_static_payload(payload: u8) -> Option<Self> {
        let (name, clock_rate) = match payload {
            0 => ("PCMU", 8000),
            8 => ("PCMA", 8000),
            9 => ("G722", 8000),
            _ => return None,
        };

        Some(Self::new(payload, name, clock_rate))
    }

    fn to_rtpmap(&self) -> RtpMap {
        RtpMap {
            payload: self.payload,
            encoding: self.name.clone(),
            clock_rate: self.clock_rate,
            channels: self.channels,
        }
    }
}

impl From<&RtpMap> for Codec {
    fn from(rtpmap: &RtpMap) -> Self {
        Self {
            payload: rtpmap.payload,
            name: rtpmap.encoding.clone(),
            clock_rate: rtpmap.clock_rate,
            channels: rtpmap.channels,
        }
    }
}

/// Codecs of a media description in the order of its format list
pub(crate) fn codecs_of(desc: &MediaDescription) -> Vec<Codec> {
    desc.media
        .fmts
        .iter()
        .filter_map(|fmt| {
            desc.rtpmap
                .iter()
                .find(|rtpmap| rtpmap.payload == *fmt)
                .map(Codec::from)
                .or_else(|| Codec::from_static_payload(*fmt))
        })
        .collect()
}

/// The peer's latest description of a content's media
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteMediaDescription {
    pub codecs: Vec<Codec>,
    pub address: Option<IpAddr>,
    pub port: u16,
    /// Direction from the peer's perspective
    pub direction: Direction,
    pub candidates: Vec<Candidate>,
}

/// A named media content of the call
#[derive(Debug)]
pub struct Content {
    pub(crate) id: ContentId,
    pub(crate) name: String,
    pub(crate) media_type: MediaType,
    pub(crate) disposition: Disposition,
    pub(crate) stream: Stream,

    pub(crate) pending_offer: Option<MediaDescriptionOffer>,
    pub(crate) local_codecs: Option<Vec<Codec>>,
    pub(crate) remote: Option<RemoteMediaDescription>,

    /// Direction the flows are started with once the call runs
    pub(crate) requested: Direction,

    /// Direction we last agreed on with the peer, `None` until announced
    pub(crate) announced: Option<Direction>,
    /// Direction contained in the offer currently in flight
    pub(crate) offered: Option<Direction>,

    /// Waiting for the negotiation which removes it
    pub(crate) removing: bool,

    pub(crate) dtmf: Option<DtmfEngine>,
}

impl Content {
    pub(crate) fn new(
        id: ContentId,
        name: String,
        media_type: MediaType,
        disposition: Disposition,
        requested: Direction,
        peer: Handle,
    ) -> Self {
        Self {
            id,
            name,
            media_type,
            disposition,
            stream: Stream::new(peer),
            pending_offer: None,
            local_codecs: None,
            remote: None,
            requested,
            announced: None,
            offered: None,
            removing: false,
            dtmf: (media_type == MediaType::Audio).then(DtmfEngine::default),
        }
    }

    pub fn id(&self) -> ContentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn disposition(&self) -> Disposition {
        self.disposition
    }

    pub fn stream(&self) -> &Stream {
        &self.stream
    }

    pub fn pending_offer(&self) -> Option<&MediaDescriptionOffer> {
        self.pending_offer.as_ref()
    }

    pub fn local_codecs(&self) -> &[Codec] {
        self.local_codecs.as_deref().unwrap_or_default()
    }

    pub fn remote_media_description(&self) -> Option<&RemoteMediaDescription> {
        self.remote.as_ref()
    }

    /// Content can be written into an offer or answer without waiting for the media layer
    pub(crate) fn settled(&self) -> bool {
        self.removing
            || (self.pending_offer.is_none()
                && self.local_codecs.is_some()
                && self.stream.initial_candidates_done
                && !self.stream.flows_unconfirmed())
    }

    /// Direction derived from the confirmed flow states
    pub(crate) fn confirmed_direction(&self) -> Direction {
        Direction::new(
            self.stream.sending_state() == crate::SendingState::Sending,
            self.stream.receiving_state() == crate::SendingState::Sending,
        )
    }
}

/// Mapping between a content and its media line
pub(crate) trait Negotiable {
    /// Create the local media description announcing `direction`
    fn local_media_description(&self, direction: Direction, with_candidates: bool)
    -> MediaDescription;

    /// Store the peer's media description, returns if it changed
    fn apply_remote(&mut self, desc: &MediaDescription, session: Option<&Connection>) -> bool;
}

impl Negotiable for Content {
    fn local_media_description(
        &self,
        direction: Direction,
        with_candidates: bool,
    ) -> MediaDescription {
        let codecs = self.local_codecs();
        let rtp_candidate = self.stream.rtp_candidate();

        let mut fmts: Vec<u8> = codecs.iter().map(|codec| codec.payload).collect();

        if fmts.is_empty() {
            fmts.push(0);
        }

        let mut desc = MediaDescription::new(Media {
            media_type: self.media_type,
            // discard port until a candidate is known
            port: rtp_candidate.map(|c| c.port).unwrap_or(9),
            proto: TransportProtocol::RtpAvp,
            fmts,
        });

        desc.connection = rtp_candidate.map(|c| Connection::from(c.address));
        desc.direction = direction;
        desc.rtpmap = codecs.iter().map(Codec::to_rtpmap).collect();

        if with_candidates {
            desc.candidates = self.stream.local_candidates.clone();
        }

        desc
    }

    fn apply_remote(&mut self, desc: &MediaDescription, session: Option<&Connection>) -> bool {
        let remote = RemoteMediaDescription {
            codecs: codecs_of(desc),
            address: desc
                .connection
                .as_ref()
                .or(session)
                .and_then(|c| c.address.ip()),
            port: desc.media.port,
            direction: desc.direction,
            candidates: desc.candidates.clone(),
        };

        self.stream.remote_candidates = remote.candidates.clone();

        let changed = self.remote.as_ref() != Some(&remote);
        self.remote = Some(remote);
        changed
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use bytesstr::BytesStr;
    use sdp_types::SessionDescription;
    use slotmap::KeyData;

    fn content() -> Content {
        Content::new(
            ContentId::from(KeyData::from_ffi(1)),
            "audio".into(),
            MediaType::Audio,
            Disposition::Initial,
            Direction::SendRecv,
            Handle(2),
        )
    }

    #[test]
    fn static_payloads_without_rtpmap() {
        let sdp = SessionDescription::parse(&BytesStr::from_static(
            "v=0\r\no=- 1 1 IN IP4 10.0.0.2\r\ns=-\r\nc=IN IP4 10.0.0.2\r\nt=0 0\r\nm=audio 4000 RTP/AVP 8 101\r\na=rtpmap:101 telephone-event/8000\r\n",
        ))
        .unwrap();

        let codecs = codecs_of(&sdp.media_descriptions[0]);

        assert_eq!(codecs.len(), 2);
        assert_eq!(codecs[0].name, "PCMA");
        assert_eq!(codecs[1].name, "telephone-event");

        let mut content = content();
        assert!(content.apply_remote(&sdp.media_descriptions[0], sdp.connection.as_ref()));
        assert!(!content.apply_remote(&sdp.media_descriptions[0], sdp.connection.as_ref()));

        let remote = content.remote_media_description().unwrap();
        assert_eq!(remote.port, 4000);
        assert_eq!(remote.address, "10.0.0.2".parse().ok());
    }

    #[test]
    fn local_description_uses_rtp_candidate() {
        let mut content = content();

        content.local_codecs = Some(vec![Codec::new(0, "PCMU", 8000)]);
        content.stream.local_candidates.push(Candidate {
            foundation: "1".into(),
            component: 1,
            transport: "UDP".into(),
            priority: 1,
            address: "192.0.2.10".parse().unwrap(),
            port: 5004,
            typ: "host".into(),
        });

        let desc = content.local_media_description(Direction::SendOnly, false);

        assert_eq!(desc.media.port, 5004);
        assert_eq!(desc.media.fmts, vec![0]);
        assert_eq!(desc.direction, Direction::SendOnly);
        assert!(desc.candidates.is_empty());
        assert_eq!(
            desc.to_string(),
            "m=audio 5004 RTP/AVP 0\r\nc=IN IP4 192.0.2.10\r\na=sendonly\r\na=rtpmap:0 PCMU/8000\r\n"
        );
    }
}
