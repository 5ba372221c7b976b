use bytes::Bytes;
use common::Harness;
use sipcall::{
    CallConfig, Direction, Error, HoldReason, HoldState, MediaRequest, MediaType, Method,
    SendingState, Signal, StatusCode,
};

mod common;

fn hold(harness: &mut Harness) {
    harness.call.request_hold(true).unwrap();
    harness.pump();
    harness.answer_last_invite();
}

#[test]
fn hold_and_unhold() {
    let (mut harness, audio) = Harness::established(CallConfig::default());

    harness.take_sip();
    harness.call.request_hold(true).unwrap();
    harness.pump();

    assert_eq!(
        harness.call.hold_state(),
        (HoldState::PendingHold, HoldReason::Requested)
    );
    assert!(harness.media.contains(&MediaRequest::StopSending(audio)));
    assert!(harness.media.contains(&MediaRequest::StopReceiving(audio)));

    let offer = harness.last_invite().sdp.unwrap();
    assert_eq!(offer.media_descriptions[0].direction, Direction::SendOnly);

    harness.answer_last_invite();

    assert_eq!(
        harness.call.hold_state(),
        (HoldState::Held, HoldReason::Requested)
    );

    harness.call.request_hold(false).unwrap();
    harness.pump();

    let offer = harness.last_invite().sdp.unwrap();
    assert_eq!(offer.media_descriptions[0].direction, Direction::SendRecv);
    assert_eq!(
        harness.call.hold_state(),
        (HoldState::PendingUnhold, HoldReason::Requested)
    );

    harness.answer_last_invite();

    assert_eq!(
        harness.call.hold_state(),
        (HoldState::None, HoldReason::Requested)
    );
    assert_eq!(harness.requests(Method::INVITE).len(), 2);

    let stream = harness.call.content(audio).unwrap().stream();
    assert_eq!(stream.sending_state(), SendingState::Sending);
    assert_eq!(stream.receiving_state(), SendingState::Sending);
}

#[test]
fn hold_state_changes_are_signalled() {
    let (mut harness, _audio) = Harness::established(CallConfig::default());

    harness.take_signals();
    hold(&mut harness);

    let states: Vec<HoldState> = harness
        .signals
        .iter()
        .filter_map(|signal| match signal {
            Signal::HoldStateChanged { state, .. } => Some(*state),
            _ => None,
        })
        .collect();

    assert_eq!(states, [HoldState::PendingHold, HoldState::Held]);
    assert!(
        !harness
            .signals
            .iter()
            .any(|signal| matches!(signal, Signal::RemoteMembersChanged { .. }))
    );
}

#[test]
fn flows_cannot_change_during_hold() {
    let (mut harness, audio) = Harness::established(CallConfig::default());

    hold(&mut harness);

    assert!(matches!(
        harness.call.set_sending(audio, true),
        Err(Error::HoldInProgress)
    ));
}

#[test]
fn hold_requires_active_call() {
    let mut harness = Harness::outgoing(CallConfig::default());

    harness
        .call
        .add_content("audio", MediaType::Audio, Direction::SendRecv)
        .unwrap();

    assert!(matches!(
        harness.call.request_hold(true),
        Err(Error::InvalidState { .. })
    ));
}

#[test]
fn unhold_failure_returns_to_hold() {
    let (mut harness, audio) = Harness::established(CallConfig::default());

    hold(&mut harness);

    harness.take_sip();
    harness.auto_flows = false;
    harness.call.request_hold(false).unwrap();
    harness.pump();

    assert!(harness.media.contains(&MediaRequest::StartSending(audio)));

    harness.call.report_sending_failure(audio).unwrap();
    harness.pump();

    assert_eq!(
        harness.call.hold_state(),
        (HoldState::PendingHold, HoldReason::ResourceNotAvailable)
    );

    harness
        .call
        .complete_receiving_state_change(audio, SendingState::Sending)
        .unwrap();
    harness.pump();

    assert!(harness.media.contains(&MediaRequest::StopReceiving(audio)));

    harness
        .call
        .complete_receiving_state_change(audio, SendingState::Stopped)
        .unwrap();
    harness.pump();

    assert_eq!(
        harness.call.hold_state(),
        (HoldState::Held, HoldReason::ResourceNotAvailable)
    );
    assert!(harness.requests(Method::INVITE).is_empty());
}

#[test]
fn rejected_hold_resumes_media() {
    let (mut harness, audio) = Harness::established(CallConfig::default());

    harness.call.request_hold(true).unwrap();
    harness.pump();

    let invite = harness.last_invite();
    harness.respond_invite(invite.cseq, StatusCode::NOT_ACCEPTABLE_HERE, Bytes::new());

    assert_eq!(
        harness.call.hold_state(),
        (HoldState::None, HoldReason::ResourceNotAvailable)
    );

    let stream = harness.call.content(audio).unwrap().stream();
    assert_eq!(stream.sending_state(), SendingState::Sending);
    assert_eq!(stream.receiving_state(), SendingState::Sending);
}

#[test]
fn content_added_during_hold_joins_unhold() {
    let (mut harness, _audio) = Harness::established(CallConfig::default());

    hold(&mut harness);

    let video = harness
        .call
        .add_content("video", MediaType::Video, Direction::SendRecv)
        .unwrap();
    harness.pump();

    // the content is announced once the hold is settled
    let offer = harness.last_invite().sdp.unwrap();
    assert_eq!(offer.media_descriptions.len(), 2);
    assert_eq!(offer.media_descriptions[1].direction, Direction::SendOnly);
    harness.answer_last_invite();

    harness.call.request_hold(false).unwrap();
    harness.pump();
    harness.answer_last_invite();

    assert_eq!(harness.call.hold_state().0, HoldState::None);
    assert_eq!(
        harness
            .call
            .content(video)
            .unwrap()
            .stream()
            .sending_state(),
        SendingState::Sending
    );
}

#[test]
fn immediate_unhold_failure_stays_pending_hold() {
    let (mut harness, audio) = Harness::established(CallConfig::default());

    harness.take_sip();
    harness.auto_flows = false;

    harness.call.request_hold(true).unwrap();
    harness.pump();
    harness.call.request_hold(false).unwrap();
    harness.pump();

    assert_eq!(
        harness.call.hold_state(),
        (HoldState::PendingUnhold, HoldReason::Requested)
    );

    harness.call.report_sending_failure(audio).unwrap();
    harness.pump();

    assert_eq!(
        harness.call.hold_state(),
        (HoldState::PendingHold, HoldReason::ResourceNotAvailable)
    );
    assert!(harness.requests(Method::INVITE).is_empty());

    harness
        .call
        .complete_receiving_state_change(audio, SendingState::Stopped)
        .unwrap();
    harness.pump();

    // hold is announced once every flow stopped
    assert_eq!(
        harness.call.hold_state(),
        (HoldState::PendingHold, HoldReason::ResourceNotAvailable)
    );

    let offer = harness.last_invite().sdp.unwrap();
    assert_eq!(offer.media_descriptions[0].direction, Direction::SendOnly);

    harness.answer_last_invite();

    assert_eq!(
        harness.call.hold_state(),
        (HoldState::Held, HoldReason::ResourceNotAvailable)
    );
}
