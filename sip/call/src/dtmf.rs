//! DTMF tone playback
//!
//! Every audio content owns a [`DtmfEngine`] which plays one tone at a time. Tones requested while
//! playing are appended to the queue. A `w` inside a tone string defers the remaining tones until
//! they are requested again.

use crate::events::{Event, MediaRequest, Signal, Timer};
use crate::{CallSession, ContentId, Error};
use sdp_types::MediaType;
use std::collections::VecDeque;
use std::fmt;

/// Telephony event as defined in [RFC4733](https://www.rfc-editor.org/rfc/rfc4733#section-3.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DtmfEvent(u8);

impl DtmfEvent {
    pub fn from_char(c: char) -> Option<Self> {
        let code = match c.to_ascii_uppercase() {
            c @ '0'..='9' => c as u8 - b'0',
            '*' => 10,
            '#' => 11,
            c @ 'A'..='D' => c as u8 - b'A' + 12,
            _ => return None,
        };

        Some(Self(code))
    }

    /// Event code used in the RTP payload
    pub fn code(self) -> u8 {
        self.0
    }

    pub fn as_char(self) -> char {
        match self.0 {
            0..=9 => (b'0' + self.0) as char,
            10 => '*',
            11 => '#',
            _ => (b'A' + self.0 - 12) as char,
        }
    }
}

impl fmt::Display for DtmfEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Item {
    Tone(DtmfEvent),
    Pause,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum State {
    #[default]
    Idle,
    Playing(Item),
}

/// Next step of the engine
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Step {
    Play(DtmfEvent),
    Pause,
    /// Queue is empty, contains the deferred tones if any
    Exhausted(Option<String>),
}

#[derive(Debug, Default)]
pub(crate) struct DtmfEngine {
    state: State,
    queue: VecDeque<Item>,
    deferred_tail: String,
    /// Incremented for every tone or pause to identify its timer
    generation: u32,
}

impl DtmfEngine {
    pub(crate) fn is_playing(&self) -> bool {
        matches!(self.state, State::Playing(..))
    }

    pub(crate) fn deferred_tones(&self) -> &str {
        &self.deferred_tail
    }

    pub(crate) fn generation(&self) -> u32 {
        self.generation
    }

    /// Validate and append `tones` to the queue
    pub(crate) fn enqueue(&mut self, tones: &str) -> Result<(), Error> {
        let (now, tail) = match tones.find(['w', 'W']) {
            Some(i) => (&tones[..i], Some(&tones[i + 1..])),
            None => (tones, None),
        };

        let mut items = Vec::with_capacity(now.len());

        for c in now.chars() {
            let item = match c {
                'p' | 'P' | ',' => Item::Pause,
                c => Item::Tone(DtmfEvent::from_char(c).ok_or(Error::InvalidTone(c))?),
            };

            items.push(item);
        }

        if let Some(tail) = tail {
            if let Some(invalid) = tail.chars().find(|c| !is_tone_char(*c)) {
                return Err(Error::InvalidTone(invalid));
            }
        }

        self.queue.extend(items);
        self.deferred_tail = tail.unwrap_or_default().into();

        Ok(())
    }

    pub(crate) fn advance(&mut self) -> Step {
        match self.queue.pop_front() {
            Some(item) => {
                self.generation = self.generation.wrapping_add(1);
                self.state = State::Playing(item);

                match item {
                    Item::Tone(event) => Step::Play(event),
                    Item::Pause => Step::Pause,
                }
            }
            None => {
                self.state = State::Idle;

                if self.deferred_tail.is_empty() {
                    Step::Exhausted(None)
                } else {
                    Step::Exhausted(Some(self.deferred_tail.clone()))
                }
            }
        }
    }

    /// Returns the tone currently played
    pub(crate) fn current_tone(&self) -> Option<DtmfEvent> {
        match self.state {
            State::Playing(Item::Tone(event)) => Some(event),
            _ => None,
        }
    }

    /// Clear everything, returns if anything was playing or queued
    pub(crate) fn cancel(&mut self) -> bool {
        let active =
            self.is_playing() || !self.queue.is_empty() || !self.deferred_tail.is_empty();

        self.state = State::Idle;
        self.queue.clear();
        self.deferred_tail.clear();
        self.generation = self.generation.wrapping_add(1);

        active
    }
}

fn is_tone_char(c: char) -> bool {
    DtmfEvent::from_char(c).is_some() || matches!(c, 'p' | 'P' | ',' | 'w' | 'W')
}

/// Access to the tone engine of a content
pub(crate) trait DtmfCapable {
    fn dtmf(&mut self) -> Result<&mut DtmfEngine, Error>;
}

impl DtmfCapable for crate::content::Content {
    fn dtmf(&mut self) -> Result<&mut DtmfEngine, Error> {
        if self.media_type != MediaType::Audio {
            return Err(Error::NotCapable);
        }

        self.dtmf.as_mut().ok_or(Error::NotCapable)
    }
}

impl CallSession {
    /// Play a single tone on an audio content
    pub fn start_tone(&mut self, content: ContentId, event: DtmfEvent) -> Result<(), Error> {
        self.multiple_tones(content, &event.as_char().to_string())
    }

    /// Play a tone string on an audio content
    ///
    /// Valid characters are `0-9 * # A-D`, `p`, `P` or `,` for a pause and `w` or `W` which defers
    /// the rest of the string.
    pub fn multiple_tones(&mut self, content: ContentId, tones: &str) -> Result<(), Error> {
        self.ensure_not_ended()?;

        let engine = self.content_mut(content)?.dtmf()?;

        engine.enqueue(tones)?;

        if engine.is_playing() {
            log::debug!("Appended tones {tones:?} to the playing queue");
            return Ok(());
        }

        self.events.push_back(Event::Signal(Signal::SendingTones {
            content,
            tones: tones.into(),
        }));

        self.play_next_tone(content);

        Ok(())
    }

    /// Stop the current tone and discard all queued tones
    pub fn stop_tones(&mut self, content: ContentId) -> Result<(), Error> {
        self.ensure_not_ended()?;

        let engine = self.content_mut(content)?.dtmf()?;

        let playing = engine.current_tone().is_some();

        if !engine.cancel() {
            return Ok(());
        }

        if playing {
            self.events.push_back(Event::Media(MediaRequest::StopTelephonyEvent(content)));
        }

        self.events.push_back(Event::Signal(Signal::StoppedTones {
            content,
            cancelled: true,
        }));

        Ok(())
    }

    pub fn currently_sending_tones(&self, content: ContentId) -> bool {
        self.contents
            .get(content)
            .and_then(|c| c.dtmf.as_ref())
            .is_some_and(DtmfEngine::is_playing)
    }

    /// Tones deferred by a `w`, waiting to be requested again
    pub fn deferred_tones(&self, content: ContentId) -> Option<&str> {
        self.contents
            .get(content)
            .and_then(|c| c.dtmf.as_ref())
            .map(DtmfEngine::deferred_tones)
    }

    pub(crate) fn tone_timer_expired(&mut self, content: ContentId, generation: u32) {
        let Some(engine) = self.contents.get_mut(content).and_then(|c| c.dtmf.as_mut()) else {
            return;
        };

        if !engine.is_playing() || engine.generation() != generation {
            log::debug!("Ignoring stale tone timer");
            return;
        }

        if engine.current_tone().is_some() {
            self.events.push_back(Event::Media(MediaRequest::StopTelephonyEvent(content)));
        }

        self.play_next_tone(content);
    }

    fn play_next_tone(&mut self, content: ContentId) {
        let Some(engine) = self.contents.get_mut(content).and_then(|c| c.dtmf.as_mut()) else {
            return;
        };

        let step = engine.advance();
        let generation = engine.generation();

        match step {
            Step::Play(event) => {
                self.events.push_back(Event::Media(MediaRequest::StartTelephonyEvent {
                    content,
                    event,
                }));
                self.events.push_back(Event::Timer {
                    timer: Timer::Tone(content, generation),
                    after: self.config.dtmf_tone_duration,
                });
            }
            Step::Pause => {
                self.events.push_back(Event::Timer {
                    timer: Timer::Tone(content, generation),
                    after: self.config.dtmf_pause_duration,
                });
            }
            Step::Exhausted(Some(tones)) => {
                self.events.push_back(Event::Signal(Signal::TonesDeferred { content, tones }));
            }
            Step::Exhausted(None) => {
                self.events.push_back(Event::Signal(Signal::StoppedTones {
                    content,
                    cancelled: false,
                }));
            }
        }
    }

    /// Play the configured initial tones on the first audio content
    pub(crate) fn play_initial_tones(&mut self) {
        let Some(tones) = self.config.initial_tones.clone() else {
            return;
        };

        let first_audio = self
            .order
            .iter()
            .copied()
            .find(|id| self.contents[*id].media_type == MediaType::Audio);

        if let Some(content) = first_audio {
            if let Err(e) = self.multiple_tones(content, &tones) {
                log::warn!("Failed to play initial tones {tones:?}, {e}");
            }
        }
    }
}
