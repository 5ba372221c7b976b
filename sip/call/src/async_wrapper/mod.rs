//! Runs a [`CallSession`] on a tokio task
//!
//! The task owns the session, the [`SipTransport`] and the [`MediaLayer`]. Inputs are passed
//! through a [`CallHandle`], signals are forwarded to an unbounded channel and the call state is
//! published through a watch channel. Dropping every [`CallHandle`] hangs up the call.

use crate::{
    CallSession, CallState, Codec, ContentId, Direction, DtmfEvent, EndpointState, Error, Event,
    Handle, IncomingRequest, IncomingResponse, MediaLayer, MediaType, Reason, SendingState, Signal,
    SipAction, SipTransport, Timer,
};
use sdp_types::Candidate;
use std::future::pending;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, sleep_until};
use tracing::Instrument;

type Command = Box<dyn FnOnce(&mut CallSession) + Send>;

#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("call task has terminated")]
    Terminated,
    #[error(transparent)]
    Session(#[from] Error),
}

/// Handle to a call running on its own task
#[derive(Clone)]
pub struct CallHandle {
    commands: mpsc::Sender<Command>,
}

/// Spawn `session` on a new task
///
/// Returns the handle to control the call, the receiver of all signals and a watch of the call
/// state. The task exits once the call has ended.
pub fn spawn_call<T, M>(
    session: CallSession,
    transport: T,
    media: M,
) -> (
    CallHandle,
    mpsc::UnboundedReceiver<Signal>,
    watch::Receiver<CallState>,
)
where
    T: SipTransport,
    M: MediaLayer,
{
    let (commands_tx, commands_rx) = mpsc::channel(session.config.command_buffer.max(1));
    let (signals_tx, signals_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(session.state());

    let span = tracing::info_span!("call", peer = session.peer().0);

    let task = CallTask {
        session,
        transport,
        media,
        commands: commands_rx,
        signals: signals_tx,
        state: state_tx,
        timers: vec![],
    };

    tokio::spawn(task.run().instrument(span));

    (
        CallHandle {
            commands: commands_tx,
        },
        signals_rx,
        state_rx,
    )
}

impl CallHandle {
    /// Run `f` on the task's call session and return its result
    pub async fn with<F, R>(&self, f: F) -> Result<R, CallError>
    where
        F: FnOnce(&mut CallSession) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();

        self.commands
            .send(Box::new(move |session| {
                let _ = tx.send(f(session));
            }))
            .await
            .map_err(|_| CallError::Terminated)?;

        rx.await.map_err(|_| CallError::Terminated)
    }

    pub async fn accept(&self) -> Result<(), CallError> {
        Ok(self.with(CallSession::accept).await??)
    }

    pub async fn set_ringing(&self) -> Result<(), CallError> {
        Ok(self.with(CallSession::set_ringing).await??)
    }

    pub async fn set_queued(&self) -> Result<(), CallError> {
        Ok(self.with(CallSession::set_queued).await??)
    }

    pub async fn hangup(&self, reason: Reason, message: String) -> Result<(), CallError> {
        Ok(self
            .with(move |session| session.hangup(reason, &message))
            .await??)
    }

    pub async fn add_content(
        &self,
        name: String,
        media_type: MediaType,
        direction: Direction,
    ) -> Result<ContentId, CallError> {
        Ok(self
            .with(move |session| session.add_content(&name, media_type, direction))
            .await??)
    }

    pub async fn remove_content(&self, id: ContentId) -> Result<(), CallError> {
        Ok(self.with(move |session| session.remove_content(id)).await??)
    }

    pub async fn set_sending(&self, id: ContentId, sending: bool) -> Result<(), CallError> {
        Ok(self
            .with(move |session| session.set_sending(id, sending))
            .await??)
    }

    /// Ask `member` to start or stop sending media on a content
    pub async fn request_receiving(
        &self,
        id: ContentId,
        member: Handle,
        receive: bool,
    ) -> Result<(), CallError> {
        Ok(self
            .with(move |session| session.request_receiving(id, member, receive))
            .await??)
    }

    pub async fn request_hold(&self, hold: bool) -> Result<(), CallError> {
        Ok(self.with(move |session| session.request_hold(hold)).await??)
    }

    pub async fn start_tone(&self, id: ContentId, event: DtmfEvent) -> Result<(), CallError> {
        Ok(self
            .with(move |session| session.start_tone(id, event))
            .await??)
    }

    pub async fn multiple_tones(&self, id: ContentId, tones: String) -> Result<(), CallError> {
        Ok(self
            .with(move |session| session.multiple_tones(id, &tones))
            .await??)
    }

    pub async fn stop_tones(&self, id: ContentId) -> Result<(), CallError> {
        Ok(self.with(move |session| session.stop_tones(id)).await??)
    }

    pub async fn accept_media_description(
        &self,
        id: ContentId,
        codecs: Vec<Codec>,
    ) -> Result<(), CallError> {
        Ok(self
            .with(move |session| session.accept_media_description(id, codecs))
            .await??)
    }

    pub async fn reject_media_description(&self, id: ContentId) -> Result<(), CallError> {
        Ok(self
            .with(move |session| session.reject_media_description(id))
            .await??)
    }

    pub async fn add_local_candidates(
        &self,
        id: ContentId,
        candidates: Vec<Candidate>,
        finished: bool,
    ) -> Result<(), CallError> {
        Ok(self
            .with(move |session| {
                session.add_local_candidates(id, candidates)?;

                if finished {
                    session.finish_initial_candidates(id)?;
                }

                Ok::<_, Error>(())
            })
            .await??)
    }

    pub async fn complete_sending_state_change(
        &self,
        id: ContentId,
        state: SendingState,
    ) -> Result<(), CallError> {
        Ok(self
            .with(move |session| session.complete_sending_state_change(id, state))
            .await??)
    }

    pub async fn complete_receiving_state_change(
        &self,
        id: ContentId,
        state: SendingState,
    ) -> Result<(), CallError> {
        Ok(self
            .with(move |session| session.complete_receiving_state_change(id, state))
            .await??)
    }

    pub async fn report_sending_failure(&self, id: ContentId) -> Result<(), CallError> {
        Ok(self
            .with(move |session| session.report_sending_failure(id))
            .await??)
    }

    pub async fn report_receiving_failure(&self, id: ContentId) -> Result<(), CallError> {
        Ok(self
            .with(move |session| session.report_receiving_failure(id))
            .await??)
    }

    pub async fn set_endpoint_state(
        &self,
        id: ContentId,
        state: EndpointState,
    ) -> Result<(), CallError> {
        Ok(self
            .with(move |session| session.set_endpoint_state(id, state))
            .await??)
    }

    /// Pass a request received by the SIP transport
    pub async fn handle_request(&self, request: IncomingRequest) -> Result<(), CallError> {
        self.with(move |session| session.handle_request(request))
            .await
    }

    /// Pass a response received by the SIP transport
    pub async fn handle_response(&self, response: IncomingResponse) -> Result<(), CallError> {
        self.with(move |session| session.handle_response(response))
            .await
    }
}

struct CallTask<T, M> {
    session: CallSession,
    transport: T,
    media: M,

    commands: mpsc::Receiver<Command>,
    signals: mpsc::UnboundedSender<Signal>,
    state: watch::Sender<CallState>,

    timers: Vec<(Instant, Timer)>,
}

impl<T: SipTransport, M: MediaLayer> CallTask<T, M> {
    async fn run(mut self) {
        loop {
            self.dispatch_events().await;

            if self.session.state() == CallState::Ended {
                log::debug!("Call ended, exiting call task");
                return;
            }

            let next_timer = self
                .timers
                .iter()
                .enumerate()
                .min_by_key(|(_, (deadline, _))| *deadline)
                .map(|(i, (deadline, _))| (i, *deadline));

            let timeout = async {
                match next_timer {
                    Some((_, deadline)) => sleep_until(deadline).await,
                    None => pending().await,
                }
            };

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => command(&mut self.session),
                    None => {
                        log::debug!("All call handles dropped, hanging up");

                        if let Err(e) = self.session.hangup(Reason::UserRequested, "") {
                            log::warn!("Failed to hang up call, {e}");
                            return;
                        }
                    }
                },
                _ = timeout => {
                    if let Some((i, _)) = next_timer {
                        let (_, timer) = self.timers.swap_remove(i);
                        self.session.timer_expired(timer);
                    }
                }
            }
        }
    }

    async fn dispatch_events(&mut self) {
        while let Some(event) = self.session.pop_event() {
            match event {
                Event::Signal(signal) => {
                    if let Signal::CallStateChanged { state, .. } = &signal {
                        self.state.send_replace(*state);
                    }

                    // receiver may be gone, the call keeps running
                    let _ = self.signals.send(signal);
                }
                Event::Sip(SipAction::Request(request)) => {
                    if let Err(e) = self.transport.send_request(request).await {
                        log::warn!("Failed to send request, {e:?}");
                    }
                }
                Event::Sip(SipAction::Response(response)) => {
                    if let Err(e) = self.transport.send_response(response).await {
                        log::warn!("Failed to send response, {e:?}");
                    }
                }
                Event::Media(request) => {
                    if let Err(e) = self.media.request(request).await {
                        log::warn!("Media request failed, {e:?}");
                    }
                }
                Event::Timer { timer, after } => {
                    self.timers.push((Instant::now() + after, timer));
                }
            }
        }
    }
}
