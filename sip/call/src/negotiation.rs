//! Serialized SDP offer/answer renegotiation
//!
//! Every change which must be reflected in SDP is queued as a [`Change`]. At most one offer is in
//! flight at any time; changes queued meanwhile are folded into the next offer. Offers received
//! from the peer are applied first, the local queue is flushed once their answer has been ACKed.

use crate::content::{
    Content, Disposition, MediaDescriptionOffer, Negotiable, OfferOrigin, codecs_of,
};
use crate::events::{Event, SipAction, Signal, Timer};
use crate::hold::HoldState;
use crate::sip::{
    IncomingResponse, Method, OutgoingRequest, Response, SdpBody, StatusCode, parse_sdp_body,
};
use crate::stream::{FlowKind, FlowOrigin, SendingState};
use crate::{CallSession, CallState, ContentId, Reason};
use bytes::Bytes;
use bytesstr::BytesStr;
use rand::Rng;
use sdp_types::{
    Connection, Direction, MediaDescription, MediaType, Origin, SessionDescription, Time,
};
use std::collections::VecDeque;
use std::time::Duration;

/// Change of the local state which must be announced to the peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Change {
    AddContent(ContentId),
    RemoveContent(ContentId),
    Direction(ContentId),
    /// Ask the peer to start or stop sending, re-offers the current direction
    Member(ContentId),
    Hold,
    Unhold,
}

impl Change {
    fn content(&self) -> Option<ContentId> {
        match self {
            Change::AddContent(id)
            | Change::RemoveContent(id)
            | Change::Direction(id)
            | Change::Member(id) => Some(*id),
            Change::Hold | Change::Unhold => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OfferKind {
    /// The INVITE creating the call
    Invite,
    ReInvite,
}

#[derive(Debug)]
pub(crate) struct InFlight {
    pub(crate) cseq: u32,
    pub(crate) kind: OfferKind,
    pub(crate) changes: Vec<Change>,
    /// Number of media lines before the offer added new ones
    slots_before: usize,
}

/// Media line of an offer received from the peer
#[derive(Debug)]
struct OfferedLine {
    /// Direction from the peer's perspective, `inactive` for rejected lines
    direction: Direction,
    rejected: bool,
}

/// Offer received from the peer which is being answered or waits for its ACK
#[derive(Debug)]
pub(crate) struct InboundOffer {
    pub(crate) cseq: u32,
    /// The INVITE which created the call
    pub(crate) initial: bool,
    pub(crate) answered: bool,
    lines: Vec<OfferedLine>,
    /// Contents removed by the offer, destroyed with the ACK
    removed: Vec<ContentId>,
}

/// Media line of the session, keeps its index for the whole call
#[derive(Debug, Clone, Copy)]
pub(crate) struct Slot {
    /// `None` if rejected or removed, written with port zero
    content: Option<ContentId>,
    media_type: MediaType,
}

#[derive(Debug)]
pub(crate) struct NegotiationPipeline {
    pub(crate) in_flight: Option<InFlight>,
    pub(crate) pending_changes: VecDeque<Change>,
    pub(crate) inbound: Option<InboundOffer>,
    /// Waiting for the retry timer after a glare
    glare_wait: bool,

    slots: Vec<Slot>,
    invite_sent: bool,

    cseq: u32,
    session_id: u64,
    session_version: u64,
}

impl NegotiationPipeline {
    pub(crate) fn new() -> Self {
        let session_id = rand::rng().random_range(1..u32::MAX) as u64;

        Self {
            in_flight: None,
            pending_changes: VecDeque::new(),
            inbound: None,
            glare_wait: false,
            slots: vec![],
            invite_sent: false,
            cseq: 0,
            session_id,
            session_version: session_id,
        }
    }

    pub(crate) fn schedule_change(&mut self, change: Change) {
        if self.pending_changes.contains(&change) {
            return;
        }

        log::debug!("Scheduled {change:?}");

        self.pending_changes.push_back(change);
    }

    /// Returns if a change matching `f` is queued or in flight
    pub(crate) fn has_change(&self, f: impl Fn(&Change) -> bool) -> bool {
        self.pending_changes.iter().any(&f)
            || self
                .in_flight
                .as_ref()
                .is_some_and(|in_flight| in_flight.changes.iter().any(&f))
    }

    pub(crate) fn discard_changes(&mut self, f: impl Fn(&Change) -> bool) {
        self.pending_changes.retain(|change| !f(change));
    }

    pub(crate) fn slot_of(&self, id: ContentId) -> Option<usize> {
        self.slots.iter().position(|slot| slot.content == Some(id))
    }

    /// CSeq of our INVITE which has not received a final response yet
    pub(crate) fn unanswered_invite(&self) -> Option<u32> {
        self.in_flight
            .as_ref()
            .filter(|in_flight| in_flight.kind == OfferKind::Invite)
            .map(|in_flight| in_flight.cseq)
    }

    pub(crate) fn next_cseq(&mut self) -> u32 {
        self.cseq += 1;
        self.cseq
    }

    pub(crate) fn reset(&mut self) {
        self.in_flight = None;
        self.pending_changes.clear();
        self.inbound = None;
        self.glare_wait = false;
    }

    /// Remove all references to a destroyed content
    pub(crate) fn forget_content(&mut self, id: ContentId) {
        for slot in &mut self.slots {
            if slot.content == Some(id) {
                slot.content = None;
            }
        }

        self.discard_changes(|change| change.content() == Some(id));
    }

    fn idle(&self) -> bool {
        self.in_flight.is_none() && self.inbound.is_none() && !self.glare_wait
    }
}

impl CallSession {
    /// Direction to announce for a content, depends on the hold state
    fn offer_direction(&self, content: &Content) -> Direction {
        match self.hold.state {
            HoldState::PendingHold | HoldState::Held => {
                if content.stream.held_flows.0 {
                    Direction::SendOnly
                } else {
                    Direction::Inactive
                }
            }
            HoldState::None | HoldState::PendingUnhold => content.confirmed_direction(),
        }
    }

    fn content_settled(&self, id: ContentId) -> bool {
        self.contents.get(id).is_none_or(Content::settled)
    }

    fn session_description(
        &mut self,
        media_descriptions: Vec<MediaDescription>,
    ) -> SessionDescription {
        self.pipeline.session_version += 1;

        SessionDescription {
            origin: Origin {
                username: BytesStr::from_static("-"),
                session_id: self.pipeline.session_id,
                session_version: self.pipeline.session_version,
                address: self.config.local_address.into(),
            },
            name: BytesStr::from(self.config.session_name.as_str()),
            connection: Some(Connection::from(self.config.local_address)),
            time: Time::default(),
            direction: Direction::SendRecv,
            attributes: vec![],
            media_descriptions,
        }
    }

    /// Send the next offer if nothing else is being negotiated
    pub(crate) fn flush(&mut self) {
        if !self.pipeline.idle() {
            return;
        }

        match self.state {
            CallState::Initialising if self.outgoing && self.accepted => {
                self.send_initial_invite();
                return;
            }
            CallState::Active => {}
            _ => return,
        }

        if self.pipeline.pending_changes.is_empty() {
            return;
        }

        let hold_pending = matches!(
            self.hold.state,
            HoldState::PendingHold | HoldState::PendingUnhold
        );
        let eligible =
            |change: &Change| !hold_pending || matches!(change, Change::Hold | Change::Unhold);

        let added = self
            .pipeline
            .pending_changes
            .iter()
            .filter(|change| eligible(*change))
            .filter_map(|change| match change {
                Change::AddContent(id) => Some(*id),
                _ => None,
            });

        let settled = self
            .pipeline
            .slots
            .iter()
            .filter_map(|slot| slot.content)
            .chain(added)
            .all(|id| self.content_settled(id));

        if !settled {
            log::debug!("Waiting for contents to settle before sending offer");
            return;
        }

        let pending = std::mem::take(&mut self.pipeline.pending_changes);
        let mut changes = vec![];

        for change in pending {
            if !eligible(&change) {
                self.pipeline.pending_changes.push_back(change);
                continue;
            }

            let keep = match change {
                Change::AddContent(id) => self
                    .contents
                    .get(id)
                    .is_some_and(|c| !c.removing && self.pipeline.slot_of(id).is_none()),
                Change::RemoveContent(id) => self.contents.contains_key(id),
                Change::Direction(id) => self.contents.get(id).is_some_and(|c| {
                    !c.removing
                        && c.announced.is_some()
                        && c.announced != Some(self.offer_direction(c))
                }),
                Change::Member(id) => self.contents.get(id).is_some_and(|c| {
                    !c.removing
                        && c.announced.is_some()
                        && c.stream
                            .remote_member(self.peer)
                            .is_some_and(SendingState::is_pending)
                }),
                Change::Hold | Change::Unhold => true,
            };

            if keep && !changes.contains(&change) {
                changes.push(change);
            } else {
                log::debug!("Dropping {change:?}, nothing to announce");
            }
        }

        if changes.is_empty() {
            return;
        }

        self.send_offer(OfferKind::ReInvite, changes);
    }

    fn send_initial_invite(&mut self) {
        if self.pipeline.invite_sent {
            return;
        }

        let initial: Vec<ContentId> = self
            .contents()
            .filter(|c| !c.removing && c.disposition == Disposition::Initial)
            .map(Content::id)
            .collect();

        if !initial.iter().all(|id| self.content_settled(*id)) {
            return;
        }

        self.pipeline.invite_sent = true;

        let changes = initial.into_iter().map(Change::AddContent).collect();

        self.send_offer(OfferKind::Invite, changes);
        self.set_state(CallState::Initialised);
    }

    fn send_offer(&mut self, kind: OfferKind, changes: Vec<Change>) {
        let slots_before = self.pipeline.slots.len();

        for change in &changes {
            if let Change::AddContent(id) = change {
                self.pipeline.slots.push(Slot {
                    content: Some(*id),
                    media_type: self.contents[*id].media_type,
                });
            }
        }

        let mut media_descriptions = vec![];
        let mut offered = vec![];

        for slot in &self.pipeline.slots {
            let content = slot.content.and_then(|id| self.contents.get(id));

            let desc = match content {
                Some(content) if !changes.contains(&Change::RemoveContent(content.id)) => {
                    let direction = if content.removing {
                        Direction::Inactive
                    } else {
                        self.offer_direction(content)
                    };

                    offered.push((content.id, direction));

                    content.local_media_description(direction, self.config.offer_candidates)
                }
                _ => MediaDescription::rejected(slot.media_type),
            };

            media_descriptions.push(desc);
        }

        for (id, direction) in offered {
            self.contents[id].offered = Some(direction);
        }

        let sdp = self.session_description(media_descriptions);
        let cseq = self.pipeline.next_cseq();

        log::debug!("Sending {kind:?} offer with {changes:?}");

        self.pipeline.in_flight = Some(InFlight {
            cseq,
            kind,
            changes,
            slots_before,
        });

        self.events.push_back(Event::Sip(SipAction::Request(OutgoingRequest {
            cseq,
            method: Method::INVITE,
            sdp: Some(sdp),
        })));
    }

    pub(crate) fn receive_offer_response(&mut self, response: IncomingResponse) {
        let Some(in_flight) = &self.pipeline.in_flight else {
            log::debug!("Ignoring INVITE response without offer in flight");
            return;
        };

        if in_flight.cseq != response.cseq {
            log::debug!("Ignoring response to INVITE with unexpected CSeq");
            return;
        }

        let kind = in_flight.kind;

        if response.code.is_provisional() {
            if kind == OfferKind::Invite
                && matches!(response.code, StatusCode::RINGING | StatusCode::SESSION_PROGRESS)
            {
                let flags = crate::MemberFlags {
                    ringing: true,
                    ..self.member_flags
                };
                self.set_member_flags(flags);
            }

            return;
        }

        let Some(in_flight) = self.pipeline.in_flight.take() else {
            return;
        };

        if response.code.is_success() {
            self.send_request(in_flight.cseq, Method::ACK);
            self.receive_answer(in_flight, response.body);
            return;
        }

        log::warn!("{kind:?} failed with {}", response.code);

        match (kind, response.code) {
            (OfferKind::Invite, code) => {
                self.end(self.peer, Reason::from_status(code), &code.to_string());
            }
            (OfferKind::ReInvite, StatusCode::REQUEST_PENDING) => self.glare(in_flight),
            (OfferKind::ReInvite, StatusCode::CALL_OR_TRANSACTION_DOES_NOT_EXIST) => {
                self.end(self.peer, Reason::ServiceError, "call does not exist");
            }
            (OfferKind::ReInvite, code)
                if code == StatusCode::REQUEST_TIMEOUT || code.is_server_error() =>
            {
                self.send_bye();
                self.end(self.peer, Reason::ServiceError, &code.to_string());
            }
            (OfferKind::ReInvite, _) => self.rollback(in_flight),
        }
    }

    fn receive_answer(&mut self, in_flight: InFlight, body: Bytes) {
        let answer = match parse_sdp_body(body) {
            SdpBody::Sdp(answer)
                if answer.media_descriptions.len() == self.pipeline.slots.len() =>
            {
                answer
            }
            _ => {
                log::warn!("Got invalid SDP answer, terminating call");

                self.send_bye();
                self.end(self.peer, Reason::ServiceError, "invalid SDP answer");
                return;
            }
        };

        for (i, desc) in answer.media_descriptions.iter().enumerate() {
            let Some(id) = self.pipeline.slots[i].content else {
                continue;
            };

            if in_flight.changes.contains(&Change::RemoveContent(id)) {
                self.destroy_content(id);
                continue;
            }

            let Some(content) = self.contents.get_mut(id) else {
                continue;
            };

            let Some(offered) = content.offered.take() else {
                continue;
            };

            if content.removing {
                continue;
            }

            let rejected = desc.is_rejected();

            if rejected && content.disposition == Disposition::None {
                log::debug!("Peer rejected content {:?}", content.name);
                self.destroy_content(id);
                continue;
            }

            let answered = if rejected {
                Direction::Inactive
            } else {
                desc.direction
            };

            self.apply_remote_description(id, desc, answer.connection.as_ref(), rejected);

            let mut announced = offered;

            if offered.sends() && !answered.receives() {
                log::debug!("Peer refused to receive media, stopping to send");

                announced = Direction::new(false, offered.receives());
                self.request_flow(id, FlowKind::Sending, false, FlowOrigin::Remote);
            }

            if let Some(content) = self.contents.get_mut(id) {
                content.announced = Some(announced);
            }

            if !self.pipeline.has_change(|c| *c == Change::Member(id)) {
                self.set_remote_member(id, answered.sends() && offered.receives());
            }
        }

        for change in &in_flight.changes {
            self.hold_negotiated(change);
        }

        if in_flight.kind == OfferKind::Invite {
            let flags = crate::MemberFlags {
                ringing: false,
                ..self.member_flags
            };
            self.set_member_flags(flags);
            self.set_state(CallState::Accepted);
            self.set_state(CallState::Active);
            self.play_initial_tones();
        }
    }

    /// Store the peer's media description of a content and emit the change
    fn apply_remote_description(
        &mut self,
        id: ContentId,
        desc: &MediaDescription,
        session: Option<&Connection>,
        rejected: bool,
    ) {
        let Some(content) = self.contents.get_mut(id) else {
            return;
        };

        let changed = content.apply_remote(desc, session);

        if rejected {
            if let Some(remote) = &mut content.remote {
                remote.direction = Direction::Inactive;
            }
        }

        if changed {
            let codecs = content
                .remote
                .as_ref()
                .map(|remote| remote.codecs.clone())
                .unwrap_or_default();

            self.events.push_back(Event::Signal(Signal::RemoteMediaDescriptionChanged {
                content: id,
                codecs,
            }));
        }
    }

    /// Undo the media line changes of a failed offer
    fn revert_offer(&mut self, in_flight: &InFlight) {
        self.pipeline.slots.truncate(in_flight.slots_before);

        for content in self.contents.values_mut() {
            content.offered = None;
        }
    }

    fn glare(&mut self, in_flight: InFlight) {
        self.revert_offer(&in_flight);

        let queued = !self.pipeline.pending_changes.is_empty();

        for change in in_flight.changes.into_iter().rev() {
            self.pipeline.pending_changes.push_front(change);
        }

        let after = if queued {
            Duration::ZERO
        } else {
            let range = if self.outgoing {
                &self.config.glare_owner_interval
            } else {
                &self.config.glare_non_owner_interval
            };

            // intervals are chosen in units of 10ms
            let start = range.start().as_millis() as u64 / 10;
            let end = (range.end().as_millis() as u64 / 10).max(start);

            Duration::from_millis(rand::rng().random_range(start..=end) * 10)
        };

        log::debug!("Glare, retrying offer in {after:?}");

        self.pipeline.glare_wait = true;
        self.events.push_back(Event::Timer {
            timer: Timer::GlareRetry,
            after,
        });
    }

    pub(crate) fn glare_timer_expired(&mut self) {
        if !self.pipeline.glare_wait {
            return;
        }

        self.pipeline.glare_wait = false;
        self.progress();
    }

    fn rollback(&mut self, in_flight: InFlight) {
        self.revert_offer(&in_flight);

        for change in &in_flight.changes {
            match change {
                Change::AddContent(id) | Change::RemoveContent(id) => self.destroy_content(*id),
                Change::Hold | Change::Unhold => self.hold_rejected(change),
                Change::Member(id) => {
                    let member = self
                        .contents
                        .get(*id)
                        .and_then(|c| c.stream.remote_member(self.peer));

                    match member {
                        Some(SendingState::PendingSend) => self.set_remote_member(*id, false),
                        Some(SendingState::PendingStop) => self.set_remote_member(*id, true),
                        _ => {}
                    }
                }
                Change::Direction(..) => {}
            }
        }
    }

    /// Handle an INVITE received during the call
    pub(crate) fn receive_reinvite(&mut self, cseq: u32, body: Bytes) {
        if self.pipeline.in_flight.is_some() {
            log::debug!("Got re-INVITE while offer is in flight, responding 491");
            self.respond(cseq, Method::INVITE, StatusCode::REQUEST_PENDING);
            return;
        }

        if self.pipeline.inbound.is_some()
            || !matches!(self.state, CallState::Accepted | CallState::Active)
        {
            self.respond(cseq, Method::INVITE, StatusCode::SERVER_INTERNAL_ERROR);
            return;
        }

        let offer = match parse_sdp_body(body) {
            SdpBody::Sdp(offer) => offer,
            SdpBody::Invalid => {
                self.respond(cseq, Method::INVITE, StatusCode::BAD_REQUEST);
                return;
            }
            SdpBody::Empty => {
                log::warn!("re-INVITE without offer is not supported");
                self.respond(cseq, Method::INVITE, StatusCode::NOT_ACCEPTABLE_HERE);
                return;
            }
        };

        if !self.offer_applicable(&offer) {
            log::warn!("Got offer which doesn't match the session's media lines");
            self.respond(cseq, Method::INVITE, StatusCode::NOT_ACCEPTABLE_HERE);
            return;
        }

        self.apply_offer(cseq, &offer, false);
    }

    fn offer_applicable(&self, offer: &SessionDescription) -> bool {
        offer.media_descriptions.len() >= self.pipeline.slots.len()
            && self
                .pipeline
                .slots
                .iter()
                .zip(&offer.media_descriptions)
                .all(|(slot, desc)| slot.media_type == desc.media.media_type)
    }

    /// Apply an offer from the peer to the contents, the answer is sent once all are settled
    pub(crate) fn apply_offer(&mut self, cseq: u32, offer: &SessionDescription, initial: bool) {
        let mut lines = vec![];
        let mut removed = vec![];

        for (i, desc) in offer.media_descriptions.iter().enumerate() {
            let rejected = desc.is_rejected();
            let direction = if rejected {
                Direction::Inactive
            } else {
                desc.direction
            };

            lines.push(OfferedLine {
                direction,
                rejected,
            });

            if i >= self.pipeline.slots.len() {
                let media_type = desc.media.media_type;

                let content = (!rejected
                    && matches!(media_type, MediaType::Audio | MediaType::Video))
                .then(|| self.add_remote_content(desc, offer.connection.as_ref(), initial));

                self.pipeline.slots.push(Slot {
                    content,
                    media_type,
                });

                continue;
            }

            let Some(id) = self.pipeline.slots[i].content else {
                continue;
            };

            let Some(content) = self.contents.get(id) else {
                continue;
            };

            if content.removing {
                continue;
            }

            if rejected && content.disposition == Disposition::None {
                log::debug!("Peer removed content {:?}", content.name);
                self.close_content(id);
                removed.push(id);
                continue;
            }

            self.apply_remote_description(id, desc, offer.connection.as_ref(), rejected);

            let sending = self.contents[id].stream.sending_state();

            if !direction.receives() && sending == SendingState::Sending {
                log::debug!("Peer stopped receiving media");
                self.request_flow(id, FlowKind::Sending, false, FlowOrigin::Remote);
            } else if direction.receives() && sending == SendingState::Stopped {
                self.events.push_back(Event::Signal(Signal::SendingRequested {
                    content: id,
                    actor: self.peer,
                }));
            }
        }

        self.pipeline.inbound = Some(InboundOffer {
            cseq,
            initial,
            answered: false,
            lines,
            removed,
        });

        if !initial {
            self.update_remote_hold();
        }
    }

    fn add_remote_content(
        &mut self,
        desc: &MediaDescription,
        session: Option<&Connection>,
        initial: bool,
    ) -> ContentId {
        let media_type = desc.media.media_type;

        let name = match &desc.mid {
            Some(mid) => mid.to_string(),
            None if self.contents().any(|c| c.name == media_type.to_string()) => {
                format!("{media_type}{}", self.pipeline.slots.len())
            }
            None => media_type.to_string(),
        };

        let disposition = if initial {
            Disposition::Initial
        } else {
            Disposition::None
        };

        let peer = self.peer;
        let id = self.contents.insert_with_key(|id| {
            Content::new(
                id,
                name,
                media_type,
                disposition,
                desc.direction.flipped(),
                peer,
            )
        });

        let content = &mut self.contents[id];
        content.apply_remote(desc, session);

        let remote_codecs = codecs_of(desc);

        content.pending_offer = Some(MediaDescriptionOffer {
            origin: OfferOrigin::Remote,
            remote_codecs: remote_codecs.clone(),
        });

        self.order.push(id);

        self.events.push_back(Event::Signal(Signal::ContentAdded(id)));
        self.events.push_back(Event::Signal(Signal::NewMediaDescriptionOffer {
            content: id,
            origin: OfferOrigin::Remote,
            remote_codecs,
        }));

        id
    }

    /// The peer is holding the call if it stopped receiving media on every content
    fn update_remote_hold(&mut self) {
        let held = {
            let mut directions = self
                .contents()
                .filter(|c| !c.removing)
                .filter_map(|c| c.remote.as_ref().map(|remote| remote.direction))
                .peekable();

            directions.peek().is_some() && directions.all(|d| !d.receives())
        };

        let flags = crate::MemberFlags {
            held,
            ..self.member_flags
        };

        self.set_member_flags(flags);
    }

    /// Send the answer to the inbound offer once all contents are settled
    pub(crate) fn try_answer(&mut self) {
        let Some(inbound) = &self.pipeline.inbound else {
            return;
        };

        if inbound.answered || (inbound.initial && self.state != CallState::Active) {
            return;
        }

        let settled = self
            .pipeline
            .slots
            .iter()
            .filter_map(|slot| slot.content)
            .all(|id| self.content_settled(id));

        if !settled {
            return;
        }

        let mut media_descriptions = vec![];
        let mut answered = vec![];

        for (slot, line) in self.pipeline.slots.iter().zip(&inbound.lines) {
            let content = slot.content.and_then(|id| self.contents.get(id));

            let desc = match content {
                Some(content) if !content.removing && !line.rejected => {
                    let willing = self.offer_direction(content);
                    let direction = willing.intersect(line.direction.flipped());

                    answered.push((content.id, willing, direction, line.direction));

                    content.local_media_description(direction, self.config.offer_candidates)
                }
                _ => MediaDescription::rejected(slot.media_type),
            };

            media_descriptions.push(desc);
        }

        let cseq = inbound.cseq;

        for (id, willing, direction, offered) in answered {
            self.contents[id].announced = Some(willing);

            if !self.pipeline.has_change(|c| *c == Change::Member(id)) {
                self.set_remote_member(id, offered.sends() && direction.receives());
            }
        }

        let sdp = self.session_description(media_descriptions);

        if let Some(inbound) = &mut self.pipeline.inbound {
            inbound.answered = true;
        }

        self.events.push_back(Event::Sip(SipAction::Response(Response {
            cseq,
            method: Method::INVITE,
            code: StatusCode::OK,
            sdp: Some(sdp),
        })));
    }

    pub(crate) fn receive_ack(&mut self, cseq: u32) {
        let acked = self
            .pipeline
            .inbound
            .as_ref()
            .is_some_and(|inbound| inbound.answered && inbound.cseq == cseq);

        if !acked {
            log::debug!("Ignoring unexpected ACK");
            return;
        }

        if let Some(inbound) = self.pipeline.inbound.take() {
            for id in inbound.removed {
                self.destroy_content(id);
            }
        }
    }
}
