use bytes::Bytes;
use sipcall::{
    CallConfig, CallSession, Candidate, Codec, ContentId, Direction, Event, Handle,
    IncomingRequest, IncomingResponse, MediaRequest, MediaType, Method, OutgoingRequest, Response,
    SendingState, SessionDescription, Signal, SipAction, StatusCode, Timer,
};
use std::collections::VecDeque;
use std::time::Duration;

pub(crate) const LOCAL: Handle = Handle(1);
pub(crate) const PEER: Handle = Handle(2);

/// Drives a [`CallSession`] with a fake media layer
///
/// The media layer accepts every media description offer, provides one candidate and completes
/// flow changes immediately, unless disabled.
pub(crate) struct Harness {
    pub(crate) call: CallSession,

    pub(crate) auto_offers: bool,
    pub(crate) auto_flows: bool,

    pub(crate) signals: Vec<Signal>,
    pub(crate) media: Vec<MediaRequest>,
    pub(crate) sip: Vec<SipAction>,
    pub(crate) timers: VecDeque<(Timer, Duration)>,

    next_port: u16,
    peer_cseq: u32,
}

impl Harness {
    pub(crate) fn new(call: CallSession) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut this = Self {
            call,
            auto_offers: true,
            auto_flows: true,
            signals: vec![],
            media: vec![],
            sip: vec![],
            timers: VecDeque::new(),
            next_port: 5000,
            peer_cseq: 100,
        };

        this.pump();
        this
    }

    pub(crate) fn outgoing(config: CallConfig) -> Self {
        Self::new(CallSession::outgoing(config, LOCAL, PEER))
    }

    pub(crate) fn incoming(config: CallConfig, offer: &str) -> Self {
        let invite = IncomingRequest {
            cseq: 1,
            method: Method::INVITE,
            body: Bytes::from(offer.to_owned()),
        };

        Self::new(CallSession::incoming(config, LOCAL, PEER, invite))
    }

    /// Take all events of the session and let the fake media layer react to them
    pub(crate) fn pump(&mut self) {
        loop {
            let mut offers = vec![];
            let mut flows = vec![];

            while let Some(event) = self.call.pop_event() {
                match event {
                    Event::Signal(signal) => {
                        if let Signal::NewMediaDescriptionOffer { content, .. } = &signal {
                            offers.push(*content);
                        }

                        self.signals.push(signal);
                    }
                    Event::Media(request) => {
                        flows.push(request.clone());
                        self.media.push(request);
                    }
                    Event::Sip(action) => self.sip.push(action),
                    Event::Timer { timer, after } => self.timers.push_back((timer, after)),
                }
            }

            let mut progressed = false;

            if self.auto_offers {
                for id in offers {
                    self.satisfy_offer(id);
                    progressed = true;
                }
            }

            if self.auto_flows {
                for request in flows {
                    progressed |= self.complete(request);
                }
            }

            if !progressed {
                return;
            }
        }
    }

    fn satisfy_offer(&mut self, id: ContentId) {
        let Some(media_type) = self.call.content(id).map(|c| c.media_type()) else {
            return;
        };

        let codecs = match media_type {
            MediaType::Video => vec![Codec::new(96, "H264", 90000)],
            _ => vec![Codec::new(0, "PCMU", 8000), Codec::new(8, "PCMA", 8000)],
        };

        let port = self.next_port;
        self.next_port += 2;

        let _ = self.call.accept_media_description(id, codecs);
        let _ = self.call.add_local_candidates(id, vec![host_candidate(port)]);
        let _ = self.call.finish_initial_candidates(id);
    }

    fn complete(&mut self, request: MediaRequest) -> bool {
        let result = match request {
            MediaRequest::StartSending(id) => self
                .call
                .complete_sending_state_change(id, SendingState::Sending),
            MediaRequest::StopSending(id) => self
                .call
                .complete_sending_state_change(id, SendingState::Stopped),
            MediaRequest::StartReceiving(id) => self
                .call
                .complete_receiving_state_change(id, SendingState::Sending),
            MediaRequest::StopReceiving(id) => self
                .call
                .complete_receiving_state_change(id, SendingState::Stopped),
            _ => return false,
        };

        result.is_ok()
    }

    /// All SIP actions since the last call
    pub(crate) fn take_sip(&mut self) -> Vec<SipAction> {
        std::mem::take(&mut self.sip)
    }

    pub(crate) fn take_signals(&mut self) -> Vec<Signal> {
        std::mem::take(&mut self.signals)
    }

    pub(crate) fn requests(&self, method: Method) -> Vec<&OutgoingRequest> {
        self.sip
            .iter()
            .filter_map(|action| match action {
                SipAction::Request(request) if request.method == method => Some(request),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn responses(&self, code: StatusCode) -> Vec<&Response> {
        self.sip
            .iter()
            .filter_map(|action| match action {
                SipAction::Response(response) if response.code == code => Some(response),
                _ => None,
            })
            .collect()
    }

    /// The last INVITE sent by the call
    pub(crate) fn last_invite(&self) -> OutgoingRequest {
        self.requests(Method::INVITE)
            .last()
            .map(|request| (*request).clone())
            .expect("no INVITE has been sent")
    }

    pub(crate) fn respond_invite(&mut self, cseq: u32, code: StatusCode, body: Bytes) {
        self.call.handle_response(IncomingResponse {
            cseq,
            method: Method::INVITE,
            code,
            body,
        });
        self.pump();
    }

    /// Answer the last INVITE with 200 accepting every non-rejected media line
    pub(crate) fn answer_last_invite(&mut self) {
        let invite = self.last_invite();
        let answer = answer_for(invite.sdp.as_ref().expect("INVITE without offer"), |_| true);

        self.respond_invite(invite.cseq, StatusCode::OK, answer);
    }

    /// Send a request from the peer, returns its CSeq
    pub(crate) fn peer_request(&mut self, method: Method, body: Bytes) -> u32 {
        self.peer_cseq += 1;

        self.call.handle_request(IncomingRequest {
            cseq: self.peer_cseq,
            method,
            body,
        });
        self.pump();

        self.peer_cseq
    }

    /// Send an offer from the peer and return the answer
    pub(crate) fn peer_reinvite(&mut self, offer: String) -> SessionDescription {
        let cseq = self.peer_request(Method::INVITE, Bytes::from(offer));

        let answer = self
            .responses(StatusCode::OK)
            .into_iter()
            .rev()
            .find(|response| response.cseq == cseq && response.method == Method::INVITE)
            .and_then(|response| response.sdp.clone())
            .expect("re-INVITE has not been answered");

        self.peer_ack(cseq);

        answer
    }

    pub(crate) fn peer_ack(&mut self, cseq: u32) {
        self.call.handle_request(IncomingRequest {
            cseq,
            method: Method::ACK,
            body: Bytes::new(),
        });
        self.pump();
    }

    pub(crate) fn fire_next_timer(&mut self) -> Option<Timer> {
        let (timer, _) = self.timers.pop_front()?;

        self.call.timer_expired(timer);
        self.pump();

        Some(timer)
    }

    /// Outgoing call with one audio content, answered by the peer
    pub(crate) fn established(config: CallConfig) -> (Self, ContentId) {
        let mut harness = Self::outgoing(config);

        let audio = harness
            .call
            .add_content("audio", MediaType::Audio, Direction::SendRecv)
            .unwrap();
        harness.pump();

        harness.call.accept().unwrap();
        harness.pump();

        harness.answer_last_invite();

        (harness, audio)
    }

    /// Add a video content to an established call, answered by the peer
    pub(crate) fn add_video(&mut self) -> ContentId {
        let video = self
            .call
            .add_content("video", MediaType::Video, Direction::SendRecv)
            .unwrap();
        self.pump();

        self.answer_last_invite();

        video
    }
}

pub(crate) fn host_candidate(port: u16) -> Candidate {
    Candidate {
        foundation: "1".into(),
        component: 1,
        transport: "UDP".into(),
        priority: 2130706431,
        address: "192.0.2.1".parse().unwrap(),
        port,
        typ: "host".into(),
    }
}

/// Build the peer's answer to `offer`, `accept` decides per media line index
pub(crate) fn answer_for(offer: &SessionDescription, accept: impl Fn(usize) -> bool) -> Bytes {
    let mut sdp = session_header();

    for (i, desc) in offer.media_descriptions.iter().enumerate() {
        let media_type = desc.media.media_type;

        if desc.is_rejected() || !accept(i) {
            sdp.push_str(&format!("m={media_type} 0 RTP/AVP 0\r\n"));
            continue;
        }

        sdp.push_str(&media_line(media_type, 6000 + i as u16 * 2, desc.direction.flipped()));
    }

    Bytes::from(sdp)
}

/// Build an offer of the peer with the given media lines
pub(crate) fn offer(lines: &[(MediaType, u16, Direction)]) -> String {
    let mut sdp = session_header();

    for (media_type, port, direction) in lines {
        if *port == 0 {
            sdp.push_str(&format!("m={media_type} 0 RTP/AVP 0\r\n"));
        } else {
            sdp.push_str(&media_line(*media_type, *port, *direction));
        }
    }

    sdp
}

fn session_header() -> String {
    "v=0\r\no=- 4711 1 IN IP4 198.51.100.7\r\ns=-\r\nc=IN IP4 198.51.100.7\r\nt=0 0\r\n".into()
}

fn media_line(media_type: MediaType, port: u16, direction: Direction) -> String {
    match media_type {
        MediaType::Video => format!(
            "m=video {port} RTP/AVP 96\r\na={direction}\r\na=rtpmap:96 H264/90000\r\n"
        ),
        _ => format!(
            "m={media_type} {port} RTP/AVP 0\r\na={direction}\r\na=rtpmap:0 PCMU/8000\r\n"
        ),
    }
}
