use common::Harness;
use sipcall::{CallConfig, Error, MediaRequest, Signal, Timer};
use std::time::Duration;

mod common;

fn played_tones(harness: &Harness) -> String {
    harness
        .media
        .iter()
        .filter_map(|request| match request {
            MediaRequest::StartTelephonyEvent { event, .. } => Some(event.as_char()),
            _ => None,
        })
        .collect()
}

#[test]
fn tones_are_played_in_order() {
    let (mut harness, audio) = Harness::established(CallConfig::default());

    harness.call.multiple_tones(audio, "12#").unwrap();
    harness.pump();

    assert!(harness.call.currently_sending_tones(audio));
    assert!(harness.signals.contains(&Signal::SendingTones {
        content: audio,
        tones: "12#".into()
    }));
    assert_eq!(
        harness.timers.front().copied(),
        Some((Timer::Tone(audio, 1), Duration::from_millis(250)))
    );

    while harness.fire_next_timer().is_some() {}

    assert_eq!(played_tones(&harness), "12#");
    assert_eq!(
        harness
            .media
            .iter()
            .filter(|request| **request == MediaRequest::StopTelephonyEvent(audio))
            .count(),
        3
    );
    assert!(harness.signals.contains(&Signal::StoppedTones {
        content: audio,
        cancelled: false
    }));
    assert!(!harness.call.currently_sending_tones(audio));
}

#[test]
fn tones_after_w_are_deferred() {
    let (mut harness, audio) = Harness::established(CallConfig::default());

    harness.call.multiple_tones(audio, "56w78").unwrap();
    harness.pump();

    while harness.fire_next_timer().is_some() {}

    assert_eq!(played_tones(&harness), "56");
    assert!(harness.signals.contains(&Signal::TonesDeferred {
        content: audio,
        tones: "78".into()
    }));
    assert_eq!(harness.call.deferred_tones(audio), Some("78"));

    harness.call.multiple_tones(audio, "78").unwrap();
    harness.pump();

    while harness.fire_next_timer().is_some() {}

    assert_eq!(played_tones(&harness), "5678");
    assert_eq!(harness.call.deferred_tones(audio), Some(""));
}

#[test]
fn pause_waits_without_tone() {
    let config = CallConfig {
        dtmf_pause_duration: Duration::from_secs(2),
        ..CallConfig::default()
    };

    let (mut harness, audio) = Harness::established(config);

    harness.call.multiple_tones(audio, "1p2").unwrap();
    harness.pump();

    harness.fire_next_timer();

    assert_eq!(played_tones(&harness), "1");
    assert_eq!(
        harness.timers.front().map(|(_, after)| *after),
        Some(Duration::from_secs(2))
    );

    harness.fire_next_timer();

    assert_eq!(played_tones(&harness), "12");
}

#[test]
fn tones_requested_while_playing_are_appended() {
    let (mut harness, audio) = Harness::established(CallConfig::default());

    harness.call.multiple_tones(audio, "1").unwrap();
    harness.call.multiple_tones(audio, "2").unwrap();
    harness.pump();

    while harness.fire_next_timer().is_some() {}

    assert_eq!(played_tones(&harness), "12");
    assert_eq!(
        harness
            .signals
            .iter()
            .filter(|signal| matches!(signal, Signal::SendingTones { .. }))
            .count(),
        1
    );
}

#[test]
fn stop_tones_cancels_queue() {
    let (mut harness, audio) = Harness::established(CallConfig::default());

    harness.call.multiple_tones(audio, "123").unwrap();
    harness.pump();

    harness.call.stop_tones(audio).unwrap();
    harness.pump();

    assert!(
        harness
            .media
            .contains(&MediaRequest::StopTelephonyEvent(audio))
    );
    assert!(harness.signals.contains(&Signal::StoppedTones {
        content: audio,
        cancelled: true
    }));

    // the timer of the cancelled tone is stale
    while harness.fire_next_timer().is_some() {}

    assert_eq!(played_tones(&harness), "1");
    assert!(!harness.call.currently_sending_tones(audio));
}

#[test]
fn invalid_tones_are_rejected() {
    let (mut harness, audio) = Harness::established(CallConfig::default());

    assert!(matches!(
        harness.call.multiple_tones(audio, "12x"),
        Err(Error::InvalidTone('x'))
    ));

    let video = harness.add_video();

    assert!(matches!(
        harness.call.multiple_tones(video, "1"),
        Err(Error::NotCapable)
    ));
}

#[test]
fn initial_tones_are_played_once_active() {
    let config = CallConfig {
        initial_tones: Some("9".into()),
        ..CallConfig::default()
    };

    let (harness, audio) = Harness::established(config);

    assert!(harness.media.contains(&MediaRequest::StartTelephonyEvent {
        content: audio,
        event: sipcall::DtmfEvent::from_char('9').unwrap(),
    }));
}
