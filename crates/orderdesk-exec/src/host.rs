//! Async host that feeds actions into the reducer and carries out its effects.
//!
//! Requests and board reloads run on the blocking pool; timers are plain
//! spawned sleeps that are never cancelled. Every completion comes back
//! through one channel and is reduced like any other action, so the state is
//! only ever touched from the loop.

use std::io;
use std::sync::Arc;

use tokio::sync::mpsc;

use orderdesk_core::reduce;
use orderdesk_core::DeskAction;
use orderdesk_core::DeskEffect;
use orderdesk_core::DeskState;
use orderdesk_core::MutationRequest;
use orderdesk_core::Order;
use orderdesk_core::PushEvent;
use orderdesk_core::RequestOutcome;
use orderdesk_core::RequestTicket;
use orderdesk_core::RuntimeAction;
use orderdesk_core::TimerKind;

use crate::contracts::outcome_of;
use crate::transport::OrderTransport;
use crate::transport::TransportError;

/// Where frames go and sounds are played.
pub trait Presenter: Send {
    fn play_sound(&mut self) -> io::Result<()>;

    fn frame(&mut self, state: &DeskState);
}

/// Presenter with no output device; counts what it was asked to do.
#[derive(Debug, Default, Clone)]
pub struct HeadlessPresenter {
    pub muted: bool,
    pub frames: usize,
    pub sounds: usize,
}

impl Presenter for HeadlessPresenter {
    fn play_sound(&mut self) -> io::Result<()> {
        if self.muted {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "no audio output",
            ));
        }
        self.sounds += 1;
        Ok(())
    }

    fn frame(&mut self, _state: &DeskState) {
        self.frames += 1;
    }
}

#[derive(Debug)]
enum Completion {
    Request {
        ticket: RequestTicket,
        outcome: RequestOutcome,
    },
    Board(Result<Vec<Order>, String>),
    Timer(TimerKind),
}

pub struct DeskHost<T, P> {
    state: DeskState,
    transport: Arc<T>,
    presenter: P,
    feed: Option<mpsc::UnboundedReceiver<PushEvent>>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: Option<mpsc::UnboundedReceiver<Completion>>,
    /// Requests, reloads and reload timers not yet completed.
    outstanding: usize,
    /// Highlight and toast timers not yet fired.
    cosmetic_timers: usize,
    drain_timers: bool,
}

impl<T, P> DeskHost<T, P>
where
    T: OrderTransport + 'static,
    P: Presenter,
{
    pub fn new(state: DeskState, transport: Arc<T>, presenter: P) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            state,
            transport,
            presenter,
            feed: None,
            completions_tx,
            completions_rx: Some(completions_rx),
            outstanding: 0,
            cosmetic_timers: 0,
            drain_timers: false,
        }
    }

    /// Push events from the server. Delivered events are handled as they come;
    /// the feed never keeps the host alive on its own.
    pub fn with_feed(mut self, feed: mpsc::UnboundedReceiver<PushEvent>) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Wait for highlight and toast timers before returning from [`run`](Self::run).
    pub fn drain_timers(mut self, drain: bool) -> Self {
        self.drain_timers = drain;
        self
    }

    pub fn state(&self) -> &DeskState {
        &self.state
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn is_idle(&self) -> bool {
        self.outstanding == 0 && (!self.drain_timers || self.cosmetic_timers == 0)
    }

    pub fn dispatch(&mut self, action: impl Into<DeskAction>) {
        let effects = reduce(&mut self.state, action.into());
        self.perform(effects);
    }

    /// Runs until `inbound` is closed and nothing the host started is still
    /// pending. Returns the host so callers can inspect the final state.
    pub async fn run(mut self, mut inbound: mpsc::UnboundedReceiver<DeskAction>) -> Self {
        let Some(mut completions) = self.completions_rx.take() else {
            tracing::warn!("host loop already ran");
            return self;
        };
        let mut feed = self.feed.take();
        self.dispatch(RuntimeAction::Connected);

        let mut inbound_open = true;
        loop {
            if !inbound_open && self.is_idle() {
                if let Some(feed) = feed.as_mut() {
                    while let Ok(event) = feed.try_recv() {
                        self.dispatch(DeskAction::Push(event));
                    }
                }
                if self.is_idle() {
                    break;
                }
            }

            tokio::select! {
                biased;
                Some(event) = next_push(&mut feed) => {
                    self.dispatch(DeskAction::Push(event));
                }
                Some(completion) = completions.recv() => {
                    self.complete(completion);
                }
                action = inbound.recv(), if inbound_open => match action {
                    Some(action) => self.dispatch(action),
                    None => inbound_open = false,
                },
            }
        }

        self.completions_rx = Some(completions);
        tracing::info!(rows = self.state.board.len(), "host loop finished");
        self
    }

    pub fn into_state(self) -> DeskState {
        self.state
    }

    fn complete(&mut self, completion: Completion) {
        let action = match completion {
            Completion::Request { ticket, outcome } => {
                self.outstanding = self.outstanding.saturating_sub(1);
                RuntimeAction::RequestSettled { ticket, outcome }
            }
            Completion::Board(Ok(orders)) => {
                self.outstanding = self.outstanding.saturating_sub(1);
                RuntimeAction::BoardLoaded(orders)
            }
            Completion::Board(Err(error)) => {
                self.outstanding = self.outstanding.saturating_sub(1);
                RuntimeAction::BoardLoadFailed(error)
            }
            Completion::Timer(timer) => {
                if timer == TimerKind::Reload {
                    self.outstanding = self.outstanding.saturating_sub(1);
                } else {
                    self.cosmetic_timers = self.cosmetic_timers.saturating_sub(1);
                }
                RuntimeAction::TimerFired(timer)
            }
        };
        self.dispatch(action);
    }

    fn perform(&mut self, effects: Vec<DeskEffect>) {
        for effect in effects {
            match effect {
                DeskEffect::RequestFrame => self.presenter.frame(&self.state),
                DeskEffect::PlaySound => {
                    if let Err(err) = self.presenter.play_sound() {
                        tracing::debug!(%err, "notification sound not played");
                    }
                }
                DeskEffect::ScheduleTimer { after, timer } => {
                    if timer == TimerKind::Reload {
                        self.outstanding += 1;
                    } else {
                        self.cosmetic_timers += 1;
                    }
                    let tx = self.completions_tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(after).await;
                        let _ = tx.send(Completion::Timer(timer));
                    });
                }
                DeskEffect::SendRequest { ticket, request } => {
                    self.outstanding += 1;
                    self.spawn_request(ticket, request);
                }
                DeskEffect::ReloadBoard => {
                    self.outstanding += 1;
                    self.spawn_reload();
                }
            }
        }
    }

    fn spawn_request(&self, ticket: RequestTicket, request: MutationRequest) {
        let transport = Arc::clone(&self.transport);
        let tx = self.completions_tx.clone();
        tracing::debug!(%ticket, request = request.label(), order_id = %request.order_id(), "sending");
        tokio::spawn(async move {
            let joined = tokio::task::spawn_blocking(move || transport.send(&request)).await;
            let outcome = match joined {
                Ok(result) => outcome_of(result),
                Err(err) => RequestOutcome::Failed {
                    error: err.to_string(),
                },
            };
            let _ = tx.send(Completion::Request { ticket, outcome });
        });
    }

    fn spawn_reload(&self) {
        let transport = Arc::clone(&self.transport);
        let tx = self.completions_tx.clone();
        let role = self.state.role;
        tokio::spawn(async move {
            let joined = tokio::task::spawn_blocking(move || transport.fetch_board(role)).await;
            let result = match joined {
                Ok(result) => result.map_err(|err: TransportError| err.to_string()),
                Err(err) => Err(err.to_string()),
            };
            let _ = tx.send(Completion::Board(result));
        });
    }
}

async fn next_push(feed: &mut Option<mpsc::UnboundedReceiver<PushEvent>>) -> Option<PushEvent> {
    match feed {
        Some(feed) => feed.recv().await,
        None => std::future::pending().await,
    }
}
