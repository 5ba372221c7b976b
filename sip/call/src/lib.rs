//! # SIP call session controller
//!
//! Drives a single SIP call between the local user and one remote member. A call consists of
//! named media contents (audio or video), each carrying a stream with a sending and a receiving
//! flow. Every local change which affects the media is serialized into SDP offer/answer exchanges
//! over INVITE and re-INVITE.
//!
//! Notable types are
//!
//! - [`CallSession`] the sans-IO state machine of a call, fed with user commands, SIP messages,
//!   media layer completions and timers, returning [`Event`]s
//! - [`async_wrapper::spawn_call`] which runs a [`CallSession`] on a tokio task, connected to a
//!   [`SipTransport`] and a [`MediaLayer`]
//!
//! Hold, DTMF tone playback and glare handling are part of the session.

mod call;
mod config;
mod content;
mod dtmf;
mod events;
mod hold;
mod media_layer;
mod negotiation;
mod sip;
mod stream;
mod transport;

pub mod async_wrapper;

pub use call::{CallFlags, CallSession, CallState, EndedReason, MemberFlags, Reason};
pub use config::CallConfig;
pub use content::{
    Codec, Content, Disposition, MediaDescriptionOffer, OfferOrigin, RemoteMediaDescription,
};
pub use dtmf::DtmfEvent;
pub use events::{Event, MediaRequest, SipAction, Signal, Timer};
pub use hold::{HoldReason, HoldState};
pub use media_layer::MediaLayer;
pub use sdp_types::{Candidate, Direction, MediaType, SessionDescription};
pub use sip::{IncomingRequest, IncomingResponse, Method, OutgoingRequest, Response, StatusCode};
pub use stream::{EndpointState, SendingState, Stream};
pub use transport::SipTransport;

slotmap::new_key_type! {
    /// Identifies a content of a call
    pub struct ContentId;
}

/// Identifies a member of the call, the local user or the peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub u32);

/// Error returned by the operations of a [`CallSession`]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown content")]
    UnknownContent,
    #[error("cannot {operation} in call state {state:?}")]
    InvalidState {
        operation: &'static str,
        state: CallState,
    },
    #[error("initial contents cannot be removed")]
    NotRemovable,
    #[error("flows cannot be changed while a hold is in progress")]
    HoldInProgress,
    #[error("content does not support the operation")]
    NotCapable,
    #[error("invalid tone {0:?}")]
    InvalidTone(char),
    #[error("{0:?} is not a valid completion state")]
    InvalidSendingState(SendingState),
    #[error("call has ended")]
    CallEnded,
    #[error("unknown member {0:?}")]
    UnknownMember(Handle),
}
