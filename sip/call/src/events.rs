use crate::call::{CallFlags, CallState, EndedReason, MemberFlags, Reason};
use crate::content::{Codec, OfferOrigin};
use crate::dtmf::DtmfEvent;
use crate::hold::{HoldReason, HoldState};
use crate::sip::{OutgoingRequest, Response};
use crate::stream::{EndpointState, SendingState};
use crate::{ContentId, Handle};
use sdp_types::Candidate;
use std::time::Duration;

/// Observable change of the call, its contents or streams
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    CallStateChanged {
        state: CallState,
        flags: CallFlags,
        /// Set once the call has ended
        reason: Option<EndedReason>,
    },
    /// Flags of the remote member changed
    CallMembersChanged { member: Handle, flags: MemberFlags },

    ContentAdded(ContentId),
    ContentRemoved(ContentId),

    /// The media layer must accept or reject the offer using
    /// [`CallSession::accept_media_description`](crate::CallSession::accept_media_description) or
    /// [`CallSession::reject_media_description`](crate::CallSession::reject_media_description)
    NewMediaDescriptionOffer {
        content: ContentId,
        origin: OfferOrigin,
        remote_codecs: Vec<Codec>,
    },
    MediaDescriptionOfferDone(ContentId),
    LocalMediaDescriptionChanged {
        content: ContentId,
        codecs: Vec<Codec>,
    },
    RemoteMediaDescriptionChanged {
        content: ContentId,
        codecs: Vec<Codec>,
    },

    SendingStateChanged {
        content: ContentId,
        state: SendingState,
    },
    ReceivingStateChanged {
        content: ContentId,
        state: SendingState,
    },
    /// Sending state of a remote member changed, suppressed while a hold is in progress
    RemoteMembersChanged {
        content: ContentId,
        member: Handle,
        state: SendingState,
        actor: Handle,
        reason: Reason,
    },
    /// The peer asked us to start sending on a content we stopped sending on
    SendingRequested { content: ContentId, actor: Handle },
    HoldStateChanged { state: HoldState, reason: HoldReason },

    /// Started playing the given tones
    SendingTones { content: ContentId, tones: String },
    /// Played all tones up to a `w`, the remaining tones must be requested again
    TonesDeferred { content: ContentId, tones: String },
    StoppedTones { content: ContentId, cancelled: bool },

    LocalCandidatesAdded {
        content: ContentId,
        candidates: Vec<Candidate>,
    },
    EndpointStateChanged {
        content: ContentId,
        state: EndpointState,
    },
}

/// Request to the media layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRequest {
    StartSending(ContentId),
    StopSending(ContentId),
    StartReceiving(ContentId),
    StopReceiving(ContentId),
    StartTelephonyEvent { content: ContentId, event: DtmfEvent },
    StopTelephonyEvent(ContentId),
    /// Release all media resources of the content
    Close(ContentId),
}

/// Message to send using the SIP transport
#[derive(Debug, Clone)]
pub enum SipAction {
    Request(OutgoingRequest),
    Response(Response),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timer {
    /// Retry the renegotiation rejected because of glare
    GlareRetry,
    /// The current tone or pause of a content finished
    Tone(ContentId, u32),
}

/// Session event returned by [`CallSession::pop_event`](crate::CallSession::pop_event)
#[derive(Debug, Clone)]
pub enum Event {
    Signal(Signal),
    Sip(SipAction),
    Media(MediaRequest),
    /// Call [`CallSession::timer_expired`](crate::CallSession::timer_expired) after the given
    /// duration
    Timer { timer: Timer, after: Duration },
}
