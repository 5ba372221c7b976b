use crate::events::{Event, Signal};
use crate::negotiation::Change;
use crate::stream::{FlowKind, FlowOrigin, SendingState, Stream};
use crate::{CallSession, CallState, Error};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum HoldState {
    #[default]
    None,
    PendingHold,
    Held,
    PendingUnhold,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum HoldReason {
    #[default]
    Requested,
    /// Media resources couldn't be acquired or the peer rejected the change
    ResourceNotAvailable,
}

#[derive(Debug, Default)]
pub(crate) struct HoldController {
    pub(crate) state: HoldState,
    pub(crate) reason: HoldReason,
    /// The peer was told that the call is on hold
    pub(crate) wire_held: bool,
}

/// Flows of a stream moved together by a hold
pub(crate) trait Holdable {
    /// Remember which flows must be restarted on unhold
    fn remember_flows(&mut self);
    fn flows_stopped(&self) -> bool;
}

impl Holdable for Stream {
    fn remember_flows(&mut self) {
        self.held_flows = (self.sending.heading(), self.receiving.heading());
    }

    fn flows_stopped(&self) -> bool {
        let stopped = |state| matches!(state, SendingState::None | SendingState::Stopped);

        stopped(self.sending_state()) && stopped(self.receiving_state())
    }
}

impl CallSession {
    /// Put the call on hold or resume it
    pub fn request_hold(&mut self, hold: bool) -> Result<(), Error> {
        self.ensure_not_ended()?;

        if self.state != CallState::Active {
            return Err(self.invalid_state("request hold"));
        }

        match (self.hold.state, hold) {
            (HoldState::None, true) => {
                for id in self.live_contents() {
                    self.contents[id].stream.remember_flows();
                }

                self.begin_hold(HoldReason::Requested);
            }
            (HoldState::PendingUnhold, true) => self.begin_hold(HoldReason::Requested),
            (HoldState::Held | HoldState::PendingHold, false) => {
                self.begin_unhold(HoldReason::Requested)
            }
            _ => {
                log::debug!("Hold state is already heading towards hold={hold}");
                return Ok(());
            }
        }

        self.progress();

        Ok(())
    }

    pub fn hold_state(&self) -> (HoldState, HoldReason) {
        (self.hold.state, self.hold.reason)
    }

    pub(crate) fn set_hold_state(&mut self, state: HoldState, reason: HoldReason) {
        if self.hold.state == state && self.hold.reason == reason {
            return;
        }

        log::debug!("Hold state {:?} -> {state:?} ({reason:?})", self.hold.state);

        self.hold.state = state;
        self.hold.reason = reason;

        self.events.push_back(Event::Signal(Signal::HoldStateChanged { state, reason }));
    }

    /// Enter `PendingHold` and stop all flows
    pub(crate) fn begin_hold(&mut self, reason: HoldReason) {
        self.set_hold_state(HoldState::PendingHold, reason);
        self.pipeline.discard_changes(|c| matches!(c, Change::Unhold));

        for id in self.live_contents() {
            self.request_flow(id, FlowKind::Sending, false, FlowOrigin::Hold);
            self.request_flow(id, FlowKind::Receiving, false, FlowOrigin::Hold);
        }
    }

    /// Enter `PendingUnhold` and restart the remembered flows
    pub(crate) fn begin_unhold(&mut self, reason: HoldReason) {
        self.set_hold_state(HoldState::PendingUnhold, reason);
        self.resume_held_flows();
    }

    fn resume_held_flows(&mut self) {
        self.pipeline.discard_changes(|c| matches!(c, Change::Hold));

        for id in self.live_contents() {
            let (sending, receiving) = self.contents[id].stream.held_flows;

            if sending {
                self.request_flow(id, FlowKind::Sending, true, FlowOrigin::Hold);
            }

            if receiving {
                self.request_flow(id, FlowKind::Receiving, true, FlowOrigin::Hold);
            }
        }
    }

    /// A flow failed while resuming, go back to hold
    pub(crate) fn unhold_failed(&mut self) {
        log::warn!("Failed to resume media, returning to hold");
        self.begin_hold(HoldReason::ResourceNotAvailable);
    }

    /// Move to the next hold state once all flows reached their target
    pub(crate) fn advance_hold(&mut self) {
        match self.hold.state {
            HoldState::PendingHold => {
                let stopped = self
                    .live_contents()
                    .into_iter()
                    .all(|id| self.contents[id].stream.flows_stopped());

                if !stopped {
                    return;
                }

                if self.hold.wire_held {
                    self.set_hold_state(HoldState::Held, self.hold.reason);
                } else if !self.pipeline.has_change(|c| matches!(c, Change::Hold)) {
                    self.pipeline.schedule_change(Change::Hold);
                }
            }
            HoldState::PendingUnhold => {
                let settled = self
                    .live_contents()
                    .into_iter()
                    .all(|id| !self.contents[id].stream.flows_pending());

                if !settled {
                    return;
                }

                if !self.hold.wire_held {
                    self.set_hold_state(HoldState::None, self.hold.reason);
                } else if !self.pipeline.has_change(|c| matches!(c, Change::Unhold)) {
                    self.pipeline.schedule_change(Change::Unhold);
                }
            }
            HoldState::None | HoldState::Held => {}
        }
    }

    /// The peer accepted a hold or unhold offer
    pub(crate) fn hold_negotiated(&mut self, change: &Change) {
        match change {
            Change::Hold => self.hold.wire_held = true,
            Change::Unhold => self.hold.wire_held = false,
            _ => {}
        }
    }

    /// The peer rejected a hold or unhold offer
    pub(crate) fn hold_rejected(&mut self, change: &Change) {
        match change {
            Change::Hold => {
                log::warn!("Peer rejected hold, resuming media");
                self.set_hold_state(HoldState::None, HoldReason::ResourceNotAvailable);
                self.resume_held_flows();
            }
            Change::Unhold => {
                log::warn!("Peer rejected unhold, returning to hold");
                self.begin_hold(HoldReason::ResourceNotAvailable);
            }
            _ => {}
        }
    }
}
