use crate::content::{Content, Disposition, MediaDescriptionOffer, OfferOrigin};
use crate::events::{Event, MediaRequest, SipAction, Signal, Timer};
use crate::hold::{HoldController, HoldState};
use crate::negotiation::{Change, NegotiationPipeline};
use crate::sip::{
    IncomingRequest, IncomingResponse, Method, OutgoingRequest, Response, SdpBody, StatusCode,
    parse_sdp_body,
};
use crate::stream::{EndpointState, FlowKind, FlowOrigin, SendingState};
use crate::{CallConfig, Codec, ContentId, Error, Handle};
use sdp_types::{Candidate, Direction, MediaType};
use slotmap::SlotMap;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// Outgoing call which has not been accepted by the local user yet
    PendingInitiator,
    Initialising,
    Initialised,
    Accepted,
    Active,
    Ended,
}

/// Local call flags
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallFlags {
    pub locally_queued: bool,
    pub locally_ringing: bool,
}

/// Flags of the remote member
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemberFlags {
    pub ringing: bool,
    /// The peer stopped receiving media on every content
    pub held: bool,
}

/// Machine readable reason of a state change
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    #[default]
    Unknown,
    UserRequested,
    Busy,
    Rejected,
    NoAnswer,
    InvalidContact,
    PermissionDenied,
    ServiceError,
}

impl Reason {
    /// Reason of a call which ended with a failure response to its INVITE
    pub fn from_status(code: StatusCode) -> Self {
        match code.0 {
            486 | 600 => Reason::Busy,
            603 => Reason::Rejected,
            408 | 480 => Reason::NoAnswer,
            404 | 410 | 484 | 604 => Reason::InvalidContact,
            401 | 403 | 407 => Reason::PermissionDenied,
            500..=599 => Reason::ServiceError,
            _ => Reason::Unknown,
        }
    }

    /// Response to an unanswered INVITE when hanging up with this reason
    fn decline_code(self) -> StatusCode {
        match self {
            Reason::Busy => StatusCode::BUSY_HERE,
            Reason::Rejected => StatusCode::DECLINE,
            _ => StatusCode::TEMPORARILY_UNAVAILABLE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndedReason {
    /// Who ended the call
    pub actor: Handle,
    pub reason: Reason,
    pub message: String,
}

/// Sans-IO state of a single call
///
/// Inputs are passed using the methods of this type. All resulting outputs must be taken from
/// [`CallSession::pop_event`] after every input.
pub struct CallSession {
    pub(crate) config: CallConfig,
    pub(crate) outgoing: bool,
    pub(crate) self_handle: Handle,
    pub(crate) peer: Handle,

    pub(crate) state: CallState,
    pub(crate) flags: CallFlags,
    pub(crate) member_flags: MemberFlags,
    pub(crate) ended_reason: Option<EndedReason>,
    /// The local user accepted the call, flows may run
    pub(crate) accepted: bool,

    pub(crate) contents: SlotMap<ContentId, Content>,
    pub(crate) order: Vec<ContentId>,

    pub(crate) pipeline: NegotiationPipeline,
    pub(crate) hold: HoldController,
    /// CSeq of the INVITE cancelled by a hangup, a crossing 2xx must still be ACKed
    cancelled_invite: Option<u32>,

    pub(crate) events: VecDeque<Event>,
}

impl CallSession {
    fn new(config: CallConfig, outgoing: bool, self_handle: Handle, peer: Handle) -> Self {
        Self {
            config,
            outgoing,
            self_handle,
            peer,
            state: if outgoing {
                CallState::PendingInitiator
            } else {
                CallState::Initialising
            },
            flags: CallFlags::default(),
            member_flags: MemberFlags::default(),
            ended_reason: None,
            accepted: false,
            contents: SlotMap::with_key(),
            order: vec![],
            pipeline: NegotiationPipeline::new(),
            hold: HoldController::default(),
            cancelled_invite: None,
            events: VecDeque::new(),
        }
    }

    /// Create a call to `peer`
    ///
    /// Contents added before [`accept`](Self::accept) are the initial contents of the call.
    pub fn outgoing(config: CallConfig, self_handle: Handle, peer: Handle) -> Self {
        Self::new(config, true, self_handle, peer)
    }

    /// Create a call from a received INVITE
    ///
    /// An INVITE without a usable SDP offer is rejected and the returned call has already ended.
    pub fn incoming(
        config: CallConfig,
        self_handle: Handle,
        peer: Handle,
        invite: IncomingRequest,
    ) -> Self {
        let mut this = Self::new(config, false, self_handle, peer);

        let offer = match parse_sdp_body(invite.body) {
            SdpBody::Sdp(offer) => Some(offer),
            SdpBody::Empty | SdpBody::Invalid => None,
        };

        let offer = offer.filter(|offer| {
            offer.media_descriptions.iter().any(|desc| {
                !desc.is_rejected()
                    && matches!(desc.media.media_type, MediaType::Audio | MediaType::Video)
            })
        });

        let Some(offer) = offer else {
            log::warn!("Rejecting INVITE without usable SDP offer");

            this.respond(invite.cseq, Method::INVITE, StatusCode::NOT_ACCEPTABLE_HERE);
            this.end(self_handle, Reason::Unknown, "missing SDP offer");

            return this;
        };

        this.apply_offer(invite.cseq, &offer, true);
        this.progress();

        this
    }

    /// Returns the next event to handle
    pub fn pop_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn flags(&self) -> CallFlags {
        self.flags
    }

    pub fn member_flags(&self) -> MemberFlags {
        self.member_flags
    }

    pub fn ended_reason(&self) -> Option<&EndedReason> {
        self.ended_reason.as_ref()
    }

    pub fn is_outgoing(&self) -> bool {
        self.outgoing
    }

    pub fn self_handle(&self) -> Handle {
        self.self_handle
    }

    pub fn peer(&self) -> Handle {
        self.peer
    }

    /// All contents in the order they were added
    pub fn contents(&self) -> impl Iterator<Item = &Content> + '_ {
        self.order.iter().map(|id| &self.contents[*id])
    }

    pub fn content(&self, id: ContentId) -> Option<&Content> {
        self.contents.get(id)
    }

    /// Accept the call
    ///
    /// Outgoing calls send their INVITE once all contents are ready. Incoming calls are answered
    /// once all contents are ready.
    pub fn accept(&mut self) -> Result<(), Error> {
        self.ensure_not_ended()?;

        match (self.outgoing, self.state) {
            (true, CallState::PendingInitiator) => {
                self.accepted = true;
                self.set_state(CallState::Initialising);
                self.start_all_flows();
            }
            (false, CallState::Initialised) => {
                self.accepted = true;
                self.flags = CallFlags::default();
                self.set_state(CallState::Accepted);
                self.set_state(CallState::Active);
                self.start_all_flows();
                self.play_initial_tones();
            }
            _ => return Err(self.invalid_state("accept")),
        }

        self.progress();

        Ok(())
    }

    /// Signal the peer that the call is queued (182)
    pub fn set_queued(&mut self) -> Result<(), Error> {
        let cseq = self.unanswered_invite("set queued")?;

        if self.flags.locally_ringing {
            return Err(self.invalid_state("set queued after ringing"));
        }

        if self.flags.locally_queued {
            return Ok(());
        }

        self.flags.locally_queued = true;
        self.respond(cseq, Method::INVITE, StatusCode::QUEUED);
        self.emit_call_state();

        Ok(())
    }

    /// Signal the peer that the call is ringing (180)
    pub fn set_ringing(&mut self) -> Result<(), Error> {
        let cseq = self.unanswered_invite("set ringing")?;

        if self.flags.locally_ringing {
            return Ok(());
        }

        self.flags.locally_ringing = true;
        self.flags.locally_queued = false;
        self.respond(cseq, Method::INVITE, StatusCode::RINGING);
        self.emit_call_state();

        Ok(())
    }

    fn unanswered_invite(&self, operation: &'static str) -> Result<u32, Error> {
        self.ensure_not_ended()?;

        if self.outgoing || !matches!(self.state, CallState::Initialising | CallState::Initialised)
        {
            return Err(self.invalid_state(operation));
        }

        self.pipeline
            .inbound
            .as_ref()
            .filter(|inbound| inbound.initial)
            .map(|inbound| inbound.cseq)
            .ok_or_else(|| self.invalid_state(operation))
    }

    /// End the call
    pub fn hangup(&mut self, reason: Reason, message: &str) -> Result<(), Error> {
        self.ensure_not_ended()?;

        let unanswered = self
            .pipeline
            .inbound
            .as_ref()
            .filter(|inbound| !inbound.answered)
            .map(|inbound| (inbound.cseq, inbound.initial));

        match unanswered {
            Some((cseq, true)) => {
                self.respond(cseq, Method::INVITE, reason.decline_code());
            }
            unanswered => {
                if let Some((cseq, _)) = unanswered {
                    self.respond(cseq, Method::INVITE, StatusCode::TEMPORARILY_UNAVAILABLE);
                }

                if let Some(cseq) = self.pipeline.unanswered_invite() {
                    self.send_request(cseq, Method::CANCEL);
                    self.cancelled_invite = Some(cseq);
                } else if matches!(self.state, CallState::Accepted | CallState::Active) {
                    self.send_bye();
                }
            }
        }

        self.end(self.self_handle, reason, message);

        Ok(())
    }

    /// Add a new content to the call
    ///
    /// The content is announced to the peer with the next offer.
    pub fn add_content(
        &mut self,
        name: &str,
        media_type: MediaType,
        direction: Direction,
    ) -> Result<ContentId, Error> {
        self.ensure_not_ended()?;

        if !matches!(media_type, MediaType::Audio | MediaType::Video) {
            return Err(Error::NotCapable);
        }

        let disposition = if self.state == CallState::PendingInitiator {
            Disposition::Initial
        } else {
            Disposition::None
        };

        let peer = self.peer;
        let id = self.contents.insert_with_key(|id| {
            Content::new(id, name.into(), media_type, disposition, direction, peer)
        });

        self.order.push(id);
        self.contents[id].pending_offer = Some(MediaDescriptionOffer {
            origin: OfferOrigin::Local,
            remote_codecs: vec![],
        });

        log::debug!("Added content {name:?} ({media_type}, {disposition:?})");

        self.events.push_back(Event::Signal(Signal::ContentAdded(id)));
        self.events.push_back(Event::Signal(Signal::NewMediaDescriptionOffer {
            content: id,
            origin: OfferOrigin::Local,
            remote_codecs: vec![],
        }));

        if disposition == Disposition::None {
            self.pipeline.schedule_change(Change::AddContent(id));
        }

        if self.accepted {
            if self.hold.state == HoldState::None {
                self.start_requested_flows(id);
            } else {
                self.contents[id].stream.held_flows = (direction.sends(), direction.receives());
            }
        }

        self.progress();

        Ok(id)
    }

    /// Remove a content added during the call
    pub fn remove_content(&mut self, id: ContentId) -> Result<(), Error> {
        self.ensure_not_ended()?;

        let content = self.content_mut(id)?;

        if content.disposition == Disposition::Initial {
            return Err(Error::NotRemovable);
        }

        if content.removing {
            return Ok(());
        }

        if self.pipeline.slot_of(id).is_none() {
            log::debug!("Removing content which has never been announced");
            self.destroy_content(id);
            return Ok(());
        }

        self.close_content(id);
        self.pipeline.schedule_change(Change::RemoveContent(id));
        self.progress();

        Ok(())
    }

    /// The media layer accepted the media description offer of a content with its local codecs
    pub fn accept_media_description(
        &mut self,
        id: ContentId,
        codecs: Vec<Codec>,
    ) -> Result<(), Error> {
        self.ensure_not_ended()?;

        let content = self.content_mut(id)?;

        if content.pending_offer.take().is_none() {
            log::debug!("Content has no pending media description offer");
            return Ok(());
        }

        content.local_codecs = Some(codecs.clone());

        self.events.push_back(Event::Signal(Signal::MediaDescriptionOfferDone(id)));
        self.events.push_back(Event::Signal(Signal::LocalMediaDescriptionChanged {
            content: id,
            codecs,
        }));

        if self.accepted && self.hold.state == HoldState::None {
            self.start_requested_flows(id);
        }

        self.progress();

        Ok(())
    }

    /// The media layer rejected the media description offer, the content is removed
    pub fn reject_media_description(&mut self, id: ContentId) -> Result<(), Error> {
        self.ensure_not_ended()?;
        self.content_mut(id)?;

        log::debug!("Media layer rejected media description, removing content");

        self.destroy_content(id);
        self.progress();

        Ok(())
    }

    pub fn add_local_candidates(
        &mut self,
        id: ContentId,
        candidates: Vec<Candidate>,
    ) -> Result<(), Error> {
        self.ensure_not_ended()?;

        let content = self.content_mut(id)?;
        content
            .stream
            .local_candidates
            .extend(candidates.iter().cloned());

        self.events.push_back(Event::Signal(Signal::LocalCandidatesAdded {
            content: id,
            candidates,
        }));

        Ok(())
    }

    /// All candidates required for the first offer or answer have been added
    pub fn finish_initial_candidates(&mut self, id: ContentId) -> Result<(), Error> {
        self.ensure_not_ended()?;

        self.content_mut(id)?.stream.initial_candidates_done = true;
        self.progress();

        Ok(())
    }

    pub fn set_endpoint_state(&mut self, id: ContentId, state: EndpointState) -> Result<(), Error> {
        self.ensure_not_ended()?;

        let stream = &mut self.content_mut(id)?.stream;

        if stream.endpoint_state == state {
            return Ok(());
        }

        stream.endpoint_state = state;

        self.events.push_back(Event::Signal(Signal::EndpointStateChanged { content: id, state }));

        Ok(())
    }

    /// Start or stop sending media on a content
    pub fn set_sending(&mut self, id: ContentId, sending: bool) -> Result<(), Error> {
        self.check_flow_request(id)?;

        if !self.accepted {
            let content = &mut self.contents[id];
            content.requested = Direction::new(sending, content.requested.receives());
            return Ok(());
        }

        self.request_flow(id, FlowKind::Sending, sending, FlowOrigin::Local);
        self.progress();

        Ok(())
    }

    /// Ask `member` to start or stop sending media on a content
    pub fn request_receiving(
        &mut self,
        id: ContentId,
        member: Handle,
        receive: bool,
    ) -> Result<(), Error> {
        self.check_flow_request(id)?;

        if member != self.peer {
            return Err(Error::UnknownMember(member));
        }

        if !self.accepted {
            let content = &mut self.contents[id];
            content.requested = Direction::new(content.requested.sends(), receive);
            return Ok(());
        }

        self.request_flow(id, FlowKind::Receiving, receive, FlowOrigin::Local);

        let current = self.contents[id].stream.remote_member(member);

        let pending = match (receive, current) {
            (true, Some(SendingState::Sending | SendingState::PendingSend)) => None,
            (true, _) => Some(SendingState::PendingSend),
            (false, Some(SendingState::Sending | SendingState::PendingSend)) => {
                Some(SendingState::PendingStop)
            }
            (false, _) => None,
        };

        if let Some(state) = pending {
            let content = &mut self.contents[id];
            content.stream.remote_members.insert(member, state);

            if content.announced.is_some() {
                self.pipeline.schedule_change(Change::Member(id));
            }

            self.emit_remote_members_changed(id, state, self.self_handle, Reason::UserRequested);
        }

        self.progress();

        Ok(())
    }

    fn check_flow_request(&mut self, id: ContentId) -> Result<(), Error> {
        self.ensure_not_ended()?;

        if self.content_mut(id)?.removing {
            return Err(Error::UnknownContent);
        }

        if self.hold.state != HoldState::None {
            return Err(Error::HoldInProgress);
        }

        Ok(())
    }

    /// The media layer completed the pending sending state change
    pub fn complete_sending_state_change(
        &mut self,
        id: ContentId,
        state: SendingState,
    ) -> Result<(), Error> {
        self.complete_flow(id, FlowKind::Sending, state)
    }

    /// The media layer completed the pending receiving state change
    pub fn complete_receiving_state_change(
        &mut self,
        id: ContentId,
        state: SendingState,
    ) -> Result<(), Error> {
        self.complete_flow(id, FlowKind::Receiving, state)
    }

    pub fn report_sending_failure(&mut self, id: ContentId) -> Result<(), Error> {
        self.fail_flow(id, FlowKind::Sending)
    }

    pub fn report_receiving_failure(&mut self, id: ContentId) -> Result<(), Error> {
        self.fail_flow(id, FlowKind::Receiving)
    }

    fn complete_flow(
        &mut self,
        id: ContentId,
        kind: FlowKind,
        state: SendingState,
    ) -> Result<(), Error> {
        self.ensure_not_ended()?;

        if !matches!(state, SendingState::Sending | SendingState::Stopped) {
            return Err(Error::InvalidSendingState(state));
        }

        let content = self.content_mut(id)?;

        if content.removing {
            log::debug!("Ignoring flow completion of removed content");
            return Ok(());
        }

        let Some(completed) = content.stream.flow_mut(kind).complete(state) else {
            log::debug!("Ignoring stray {kind:?} completion {state:?}");
            return Ok(());
        };

        let announced = content.announced.is_some();

        self.events.push_back(Event::Signal(flow_signal(id, kind, state)));

        if completed.origin == FlowOrigin::Local && announced {
            self.pipeline.schedule_change(Change::Direction(id));
        }

        if let Some(next) = completed.next {
            self.flow_step_started(id, kind, next);
        }

        self.progress();

        Ok(())
    }

    fn fail_flow(&mut self, id: ContentId, kind: FlowKind) -> Result<(), Error> {
        self.ensure_not_ended()?;

        let content = self.content_mut(id)?;

        if content.removing || !content.stream.flow_mut(kind).fail() {
            return Ok(());
        }

        let announced = content.announced.is_some_and(|direction| match kind {
            FlowKind::Sending => direction.sends(),
            FlowKind::Receiving => direction.receives(),
        });

        log::warn!("{kind:?} flow failed");

        self.events.push_back(Event::Signal(flow_signal(id, kind, SendingState::Stopped)));

        match self.hold.state {
            HoldState::PendingUnhold => self.unhold_failed(),
            HoldState::PendingHold | HoldState::Held => {}
            HoldState::None => {
                if announced {
                    self.pipeline.schedule_change(Change::Direction(id));
                }
            }
        }

        self.progress();

        Ok(())
    }

    /// Notify the session about an expired timer
    pub fn timer_expired(&mut self, timer: Timer) {
        if self.state == CallState::Ended {
            return;
        }

        match timer {
            Timer::GlareRetry => self.glare_timer_expired(),
            Timer::Tone(id, generation) => self.tone_timer_expired(id, generation),
        }
    }

    /// Handle a request received from the peer
    pub fn handle_request(&mut self, request: IncomingRequest) {
        if self.state == CallState::Ended {
            if request.method != Method::ACK {
                self.respond(
                    request.cseq,
                    request.method,
                    StatusCode::CALL_OR_TRANSACTION_DOES_NOT_EXIST,
                );
            }

            return;
        }

        if request.method == Method::INVITE {
            self.receive_reinvite(request.cseq, request.body);
        } else if request.method == Method::ACK {
            self.receive_ack(request.cseq);
        } else if request.method == Method::BYE {
            self.respond(request.cseq, Method::BYE, StatusCode::OK);
            self.end(self.peer, Reason::UserRequested, "");
        } else if request.method == Method::CANCEL {
            self.receive_cancel(request.cseq);
        } else if request.method == Method::OPTIONS {
            self.respond(request.cseq, Method::OPTIONS, StatusCode::OK);
        } else {
            self.respond(request.cseq, request.method, StatusCode::NOT_IMPLEMENTED);
        }

        self.progress();
    }

    fn receive_cancel(&mut self, cseq: u32) {
        let cancels_invite = self
            .pipeline
            .inbound
            .as_ref()
            .is_some_and(|inbound| inbound.initial && !inbound.answered && inbound.cseq == cseq);

        if !cancels_invite {
            self.respond(
                cseq,
                Method::CANCEL,
                StatusCode::CALL_OR_TRANSACTION_DOES_NOT_EXIST,
            );
            return;
        }

        self.respond(cseq, Method::CANCEL, StatusCode::OK);
        self.respond(cseq, Method::INVITE, StatusCode::REQUEST_TERMINATED);
        self.end(self.peer, Reason::UserRequested, "");
    }

    /// Handle a response to a request sent by the call
    pub fn handle_response(&mut self, response: IncomingResponse) {
        if self.state == CallState::Ended {
            let crossed_cancel = response.method == Method::INVITE
                && response.code.is_success()
                && self.cancelled_invite == Some(response.cseq);

            if crossed_cancel {
                log::debug!("INVITE succeeded after CANCEL, terminating the dialog");

                self.cancelled_invite = None;
                self.send_request(response.cseq, Method::ACK);
                self.send_bye();
            } else {
                log::debug!("Ignoring response {} to {}", response.code, response.method);
            }

            return;
        }

        if response.method == Method::INVITE {
            self.receive_offer_response(response);
        } else {
            log::debug!("Got response {} to {}", response.code, response.method);
        }

        self.progress();
    }

    /// Drive everything forward which may have been waiting on the last input
    pub(crate) fn progress(&mut self) {
        if self.state == CallState::Ended {
            return;
        }

        if !self.outgoing && self.state == CallState::Initialising && self.all_settled() {
            self.set_state(CallState::Initialised);
        }

        self.advance_hold();
        self.try_answer();
        self.flush();
    }

    fn all_settled(&self) -> bool {
        self.contents().all(Content::settled)
    }

    pub(crate) fn set_state(&mut self, state: CallState) {
        if self.state == state {
            return;
        }

        log::debug!("Call state {:?} -> {state:?}", self.state);

        self.state = state;
        self.emit_call_state();
    }

    fn emit_call_state(&mut self) {
        self.events.push_back(Event::Signal(Signal::CallStateChanged {
            state: self.state,
            flags: self.flags,
            reason: self.ended_reason.clone(),
        }));
    }

    pub(crate) fn set_member_flags(&mut self, flags: MemberFlags) {
        if self.member_flags == flags {
            return;
        }

        self.member_flags = flags;
        self.events.push_back(Event::Signal(Signal::CallMembersChanged {
            member: self.peer,
            flags,
        }));
    }

    /// Terminate the call, discarding all pending changes
    pub(crate) fn end(&mut self, actor: Handle, reason: Reason, message: &str) {
        if self.state == CallState::Ended {
            return;
        }

        log::debug!("Call ended by {actor:?}, {reason:?} {message:?}");

        self.pipeline.reset();

        for id in self.order.clone() {
            let content = &mut self.contents[id];

            if let Some(dtmf) = &mut content.dtmf {
                dtmf.cancel();
            }

            if !content.removing {
                content.removing = true;
                self.events.push_back(Event::Media(MediaRequest::Close(id)));
            }
        }

        self.ended_reason = Some(EndedReason {
            actor,
            reason,
            message: message.into(),
        });

        self.set_state(CallState::Ended);
    }

    pub(crate) fn respond(&mut self, cseq: u32, method: Method, code: StatusCode) {
        self.events.push_back(Event::Sip(SipAction::Response(Response {
            cseq,
            method,
            code,
            sdp: None,
        })));
    }

    pub(crate) fn send_request(&mut self, cseq: u32, method: Method) {
        self.events.push_back(Event::Sip(SipAction::Request(OutgoingRequest {
            cseq,
            method,
            sdp: None,
        })));
    }

    pub(crate) fn send_bye(&mut self) {
        let cseq = self.pipeline.next_cseq();
        self.send_request(cseq, Method::BYE);
    }

    /// Stop the media of a content which is about to be removed
    pub(crate) fn close_content(&mut self, id: ContentId) {
        let Some(content) = self.contents.get_mut(id) else {
            return;
        };

        if content.removing {
            return;
        }

        content.removing = true;

        if let Some(dtmf) = &mut content.dtmf {
            dtmf.cancel();
        }

        self.events.push_back(Event::Media(MediaRequest::Close(id)));
    }

    /// Remove the content from the call
    pub(crate) fn destroy_content(&mut self, id: ContentId) {
        self.close_content(id);

        if self.contents.remove(id).is_none() {
            return;
        }

        self.order.retain(|other| *other != id);
        self.pipeline.forget_content(id);

        self.events.push_back(Event::Signal(Signal::ContentRemoved(id)));
    }

    /// Contents which are not being removed
    pub(crate) fn live_contents(&self) -> Vec<ContentId> {
        self.contents()
            .filter(|content| !content.removing)
            .map(Content::id)
            .collect()
    }

    fn start_all_flows(&mut self) {
        for id in self.live_contents() {
            self.start_requested_flows(id);
        }
    }

    /// Start the flows of a content which has not started any yet
    fn start_requested_flows(&mut self, id: ContentId) {
        let content = &self.contents[id];

        if content.stream.sending_state() != SendingState::None
            || content.stream.receiving_state() != SendingState::None
        {
            return;
        }

        let requested = content.requested;

        if requested.sends() {
            self.request_flow(id, FlowKind::Sending, true, FlowOrigin::Local);
        }

        if requested.receives() {
            self.request_flow(id, FlowKind::Receiving, true, FlowOrigin::Local);
        }
    }

    pub(crate) fn request_flow(
        &mut self,
        id: ContentId,
        kind: FlowKind,
        on: bool,
        origin: FlowOrigin,
    ) {
        let Some(content) = self.contents.get_mut(id) else {
            return;
        };

        if let Some(state) = content.stream.flow_mut(kind).request(on, origin) {
            self.flow_step_started(id, kind, state);
        }
    }

    fn flow_step_started(&mut self, id: ContentId, kind: FlowKind, state: SendingState) {
        let request = match (kind, state) {
            (FlowKind::Sending, SendingState::PendingSend) => MediaRequest::StartSending(id),
            (FlowKind::Sending, _) => MediaRequest::StopSending(id),
            (FlowKind::Receiving, SendingState::PendingSend) => MediaRequest::StartReceiving(id),
            (FlowKind::Receiving, _) => MediaRequest::StopReceiving(id),
        };

        self.events.push_back(Event::Signal(flow_signal(id, kind, state)));
        self.events.push_back(Event::Media(request));
    }

    /// Update the state of the remote member after a negotiation
    pub(crate) fn set_remote_member(&mut self, id: ContentId, sending: bool) {
        let new = if sending {
            SendingState::Sending
        } else {
            SendingState::Stopped
        };

        let Some(content) = self.contents.get_mut(id) else {
            return;
        };

        let previous = content.stream.remote_members.insert(self.peer, new);

        let (actor, reason) = match (previous, sending) {
            (Some(state), _) if state == new => return,
            (Some(SendingState::PendingSend), true) | (Some(SendingState::PendingStop), false) => {
                (self.self_handle, Reason::UserRequested)
            }
            (Some(SendingState::PendingSend | SendingState::PendingStop), _) => {
                (self.peer, Reason::Rejected)
            }
            _ => (self.peer, Reason::UserRequested),
        };

        self.emit_remote_members_changed(id, new, actor, reason);
    }

    pub(crate) fn emit_remote_members_changed(
        &mut self,
        id: ContentId,
        state: SendingState,
        actor: Handle,
        reason: Reason,
    ) {
        if self.hold.state != HoldState::None {
            log::debug!("Suppressing remote member change to {state:?} during hold");
            return;
        }

        self.events.push_back(Event::Signal(Signal::RemoteMembersChanged {
            content: id,
            member: self.peer,
            state,
            actor,
            reason,
        }));
    }

    pub(crate) fn ensure_not_ended(&self) -> Result<(), Error> {
        if self.state == CallState::Ended {
            Err(Error::CallEnded)
        } else {
            Ok(())
        }
    }

    pub(crate) fn invalid_state(&self, operation: &'static str) -> Error {
        Error::InvalidState {
            operation,
            state: self.state,
        }
    }

    pub(crate) fn content_mut(&mut self, id: ContentId) -> Result<&mut Content, Error> {
        self.contents.get_mut(id).ok_or(Error::UnknownContent)
    }
}

fn flow_signal(content: ContentId, kind: FlowKind, state: SendingState) -> Signal {
    match kind {
        FlowKind::Sending => Signal::SendingStateChanged { content, state },
        FlowKind::Receiving => Signal::ReceivingStateChanged { content, state },
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use bytes::Bytes;

    fn drain(call: &mut CallSession) -> Vec<Event> {
        std::iter::from_fn(|| call.pop_event()).collect()
    }

    #[test]
    fn reason_from_status() {
        assert_eq!(Reason::from_status(StatusCode(486)), Reason::Busy);
        assert_eq!(Reason::from_status(StatusCode(603)), Reason::Rejected);
        assert_eq!(Reason::from_status(StatusCode(480)), Reason::NoAnswer);
        assert_eq!(Reason::from_status(StatusCode(404)), Reason::InvalidContact);
        assert_eq!(Reason::from_status(StatusCode(407)), Reason::PermissionDenied);
        assert_eq!(Reason::from_status(StatusCode(503)), Reason::ServiceError);
        assert_eq!(Reason::from_status(StatusCode(420)), Reason::Unknown);
    }

    #[test]
    fn incoming_without_offer_is_rejected() {
        let mut call = CallSession::incoming(
            CallConfig::default(),
            Handle(1),
            Handle(2),
            IncomingRequest {
                cseq: 1,
                method: Method::INVITE,
                body: Bytes::new(),
            },
        );

        assert_eq!(call.state(), CallState::Ended);

        let events = drain(&mut call);

        assert!(events.iter().any(|event| matches!(
            event,
            Event::Sip(SipAction::Response(Response {
                code: StatusCode::NOT_ACCEPTABLE_HERE,
                ..
            }))
        )));
    }

    #[test]
    fn initial_contents_are_not_removable() {
        let mut call = CallSession::outgoing(CallConfig::default(), Handle(1), Handle(2));

        let id = call
            .add_content("audio", MediaType::Audio, Direction::SendRecv)
            .unwrap();

        assert_eq!(
            call.content(id).map(Content::disposition),
            Some(Disposition::Initial)
        );
        assert!(matches!(call.remove_content(id), Err(Error::NotRemovable)));
    }

    #[test]
    fn hangup_before_accept_ends_silently() {
        let mut call = CallSession::outgoing(CallConfig::default(), Handle(1), Handle(2));

        call.hangup(Reason::UserRequested, "bye").unwrap();

        assert_eq!(call.state(), CallState::Ended);
        assert!(matches!(call.accept(), Err(Error::CallEnded)));
        assert!(
            !drain(&mut call)
                .iter()
                .any(|event| matches!(event, Event::Sip(..)))
        );
    }

    #[test]
    fn unknown_requests() {
        let mut call = CallSession::outgoing(CallConfig::default(), Handle(1), Handle(2));

        call.handle_request(IncomingRequest {
            cseq: 7,
            method: Method::from("INFO"),
            body: Bytes::new(),
        });

        let events = drain(&mut call);

        assert!(matches!(
            events.as_slice(),
            [Event::Sip(SipAction::Response(Response {
                cseq: 7,
                code: StatusCode::NOT_IMPLEMENTED,
                ..
            }))]
        ));
    }
}
