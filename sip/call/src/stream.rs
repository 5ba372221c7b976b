use crate::Handle;
use sdp_types::Candidate;
use std::collections::HashMap;

/// State of a media flow
///
/// A flow only ever advances `None -> PendingSend -> Sending -> PendingStop -> Stopped ->
/// PendingSend ...`, except for media failures which force it into `Stopped`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SendingState {
    #[default]
    None,
    PendingSend,
    Sending,
    PendingStop,
    Stopped,
}

impl SendingState {
    pub fn is_pending(self) -> bool {
        matches!(self, SendingState::PendingSend | SendingState::PendingStop)
    }
}

/// Connectivity state of a stream's transport endpoint, reported by the media layer
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
    #[default]
    New,
    Connecting,
    Connected,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FlowKind {
    Sending,
    Receiving,
}

/// Who started the current step of a flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FlowOrigin {
    /// The local user, the resulting direction must be renegotiated
    Local,
    /// The peer, the resulting direction is already agreed on
    Remote,
    /// The hold controller, which renegotiates all streams at once
    Hold,
}

/// Result of a completed flow step
pub(crate) struct Completed {
    pub(crate) origin: FlowOrigin,
    /// Step started right after the completion to reach the queued target
    pub(crate) next: Option<SendingState>,
}

#[derive(Debug)]
pub(crate) struct Flow {
    state: SendingState,
    /// Requested after the current pending step completes
    target: Option<bool>,
    origin: FlowOrigin,
}

impl Flow {
    fn new() -> Self {
        Self {
            state: SendingState::None,
            target: None,
            origin: FlowOrigin::Local,
        }
    }

    pub(crate) fn state(&self) -> SendingState {
        self.state
    }

    /// Where the flow ends up once all pending steps completed
    pub(crate) fn heading(&self) -> bool {
        self.target.unwrap_or(matches!(
            self.state,
            SendingState::PendingSend | SendingState::Sending
        ))
    }

    /// Request the flow to be started or stopped
    ///
    /// Returns the new pending state if a step has been started.
    pub(crate) fn request(&mut self, on: bool, origin: FlowOrigin) -> Option<SendingState> {
        match (self.state, on) {
            (SendingState::PendingSend, _) | (SendingState::PendingStop, _) => {
                let leads_to = self.state == SendingState::PendingSend;

                self.target = if leads_to == on { None } else { Some(on) };
                self.origin = origin;

                None
            }
            (SendingState::None | SendingState::Stopped, true) => {
                self.state = SendingState::PendingSend;
                self.origin = origin;
                Some(self.state)
            }
            (SendingState::Sending, false) => {
                self.state = SendingState::PendingStop;
                self.origin = origin;
                Some(self.state)
            }
            _ => None,
        }
    }

    /// Complete the pending step
    ///
    /// Returns `None` if the completion doesn't match the pending step.
    pub(crate) fn complete(&mut self, state: SendingState) -> Option<Completed> {
        match (self.state, state) {
            (SendingState::PendingSend, SendingState::Sending)
            | (SendingState::PendingStop, SendingState::Stopped) => {}
            _ => return None,
        }

        self.state = state;

        let origin = self.origin;

        let next = match self.target.take() {
            Some(on) => self.request(on, origin),
            None => None,
        };

        Some(Completed { origin, next })
    }

    /// Force the flow into `Stopped`, returns if the state changed
    pub(crate) fn fail(&mut self) -> bool {
        self.target = None;

        if matches!(self.state, SendingState::None | SendingState::Stopped) {
            return false;
        }

        self.state = SendingState::Stopped;
        true
    }
}

/// Media transport endpoint of a content
#[derive(Debug)]
pub struct Stream {
    pub(crate) sending: Flow,
    pub(crate) receiving: Flow,
    pub(crate) remote_members: HashMap<Handle, SendingState>,

    pub(crate) local_candidates: Vec<Candidate>,
    pub(crate) initial_candidates_done: bool,
    pub(crate) remote_candidates: Vec<Candidate>,
    pub(crate) endpoint_state: EndpointState,

    /// Flows which were active when the hold was requested
    pub(crate) held_flows: (bool, bool),
}

impl Stream {
    pub(crate) fn new(peer: Handle) -> Self {
        Self {
            sending: Flow::new(),
            receiving: Flow::new(),
            remote_members: HashMap::from([(peer, SendingState::None)]),
            local_candidates: vec![],
            initial_candidates_done: false,
            remote_candidates: vec![],
            endpoint_state: EndpointState::New,
            held_flows: (false, false),
        }
    }

    pub fn sending_state(&self) -> SendingState {
        self.sending.state()
    }

    pub fn receiving_state(&self) -> SendingState {
        self.receiving.state()
    }

    pub fn remote_member(&self, member: Handle) -> Option<SendingState> {
        self.remote_members.get(&member).copied()
    }

    pub fn local_candidates(&self) -> &[Candidate] {
        &self.local_candidates
    }

    pub fn remote_candidates(&self) -> &[Candidate] {
        &self.remote_candidates
    }

    pub fn endpoint_state(&self) -> EndpointState {
        self.endpoint_state
    }

    pub(crate) fn flow_mut(&mut self, kind: FlowKind) -> &mut Flow {
        match kind {
            FlowKind::Sending => &mut self.sending,
            FlowKind::Receiving => &mut self.receiving,
        }
    }

    pub(crate) fn flows_pending(&self) -> bool {
        self.sending.state().is_pending() || self.receiving.state().is_pending()
    }

    /// A pending step which the media layer must confirm before it can be announced
    ///
    /// A receiving flow which is stopping is announced right away.
    pub(crate) fn flows_unconfirmed(&self) -> bool {
        self.sending.state().is_pending() || self.receiving.state() == SendingState::PendingSend
    }

    /// The RTP candidate which provides the port and address of the media line
    pub(crate) fn rtp_candidate(&self) -> Option<&Candidate> {
        self.local_candidates.iter().find(|c| c.component == 1)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flow_steps_in_order() {
        let mut flow = Flow::new();

        assert_eq!(
            flow.request(true, FlowOrigin::Local),
            Some(SendingState::PendingSend)
        );
        assert!(flow.complete(SendingState::Sending).is_some());
        assert_eq!(
            flow.request(false, FlowOrigin::Local),
            Some(SendingState::PendingStop)
        );
        assert!(flow.complete(SendingState::Stopped).is_some());
        assert_eq!(
            flow.request(true, FlowOrigin::Local),
            Some(SendingState::PendingSend)
        );
    }

    #[test]
    fn request_while_pending_is_queued() {
        let mut flow = Flow::new();

        flow.request(true, FlowOrigin::Local);
        assert_eq!(flow.request(false, FlowOrigin::Local), None);
        assert!(!flow.heading());

        let completed = flow.complete(SendingState::Sending).unwrap();
        assert_eq!(completed.next, Some(SendingState::PendingStop));
        assert_eq!(flow.state(), SendingState::PendingStop);
    }

    #[test]
    fn request_reverted_while_pending() {
        let mut flow = Flow::new();

        flow.request(true, FlowOrigin::Local);
        flow.request(false, FlowOrigin::Local);
        flow.request(true, FlowOrigin::Local);

        let completed = flow.complete(SendingState::Sending).unwrap();
        assert_eq!(completed.next, None);
        assert_eq!(flow.state(), SendingState::Sending);
    }

    #[test]
    fn stray_completion() {
        let mut flow = Flow::new();

        assert!(flow.complete(SendingState::Sending).is_none());

        flow.request(true, FlowOrigin::Local);
        assert!(flow.complete(SendingState::Stopped).is_none());
        assert_eq!(flow.state(), SendingState::PendingSend);
    }

    #[test]
    fn failure_skips_pending_phase() {
        let mut flow = Flow::new();

        flow.request(true, FlowOrigin::Local);
        assert!(flow.fail());
        assert_eq!(flow.state(), SendingState::Stopped);
        assert!(!flow.fail());
    }
}
