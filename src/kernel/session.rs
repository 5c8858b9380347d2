use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::ArError;
use super::event::Event;
use crate::platform::{SessionHandle, SessionInit, XrPlatform};

/// Lifecycle of the immersive tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionState {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// Negotiation with the runtime in flight.
    Requesting,
    /// Tracking. Only state in which per-frame work runs.
    Active,
    /// Ended by the user or the runtime. Behaves like `Idle` for new requests.
    Ended,
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active)
    }
}

/// Transition requests. Validated by `SessionGraph`, never forced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRequest {
    Request,
    Granted,
    /// AR mode unsupported: back to the starting point.
    Unsupported,
    /// Runtime refused mid-negotiation.
    Denied,
    End,
}

pub struct SessionGraph;

impl SessionGraph {
    /// Pure function: (Current State, Request) -> New State.
    /// `None` means the request is ignored in this state.
    pub fn transition(current: SessionState, request: SessionRequest) -> Option<SessionState> {
        use SessionRequest::*;
        use SessionState::*;

        match (current, request) {
            (Idle, Request) | (Ended, Request) => Some(Requesting),

            (Requesting, Granted) => Some(Active),
            (Requesting, Unsupported) => Some(Idle),
            (Requesting, Denied) => Some(Ended),
            // user backed out before the runtime answered
            (Requesting, End) => Some(Ended),

            (Active, End) => Some(Ended),

            _ => None,
        }
    }
}

/// Bumped on every accepted `request_session`. Async results carry the generation
/// they were started under so results from a superseded attempt can be discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct SessionGeneration(pub u64);

impl SessionGeneration {
    pub fn next(&self) -> Self {
        SessionGeneration(self.0 + 1)
    }
}

/// What applying a negotiation result amounted to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionResolution {
    Started { handle: SessionHandle, session_id: Uuid },
    Failed(ArError),
    /// Result for a superseded or abandoned request. Already cleaned up.
    Stale,
}

/// Owns the session lifecycle. Sole writer of `SessionState`.
pub struct SessionController<P: XrPlatform> {
    platform: Arc<P>,
    init: SessionInit,
    tx: mpsc::Sender<Event>,
    state: watch::Sender<SessionState>,
    generation: SessionGeneration,
    handle: Option<SessionHandle>,
    session_id: Option<Uuid>,
    /// Generation whose platform request is still in flight after the user backed out.
    abandoned: Option<SessionGeneration>,
    /// Accepted request waiting for the abandoned one to settle.
    deferred: Option<SessionGeneration>,
}

impl<P: XrPlatform> SessionController<P> {
    pub fn new(platform: Arc<P>, init: SessionInit, tx: mpsc::Sender<Event>) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            platform,
            init,
            tx,
            state,
            generation: SessionGeneration::default(),
            handle: None,
            session_id: None,
            abandoned: None,
            deferred: None,
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Receiver lifetime is the subscription: dropping it unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Probe used to decide whether to offer a "start" affordance at all.
    /// Does not touch session state.
    pub async fn check_support(&self) -> Result<(), ArError> {
        if !self.platform.has_xr() {
            return Err(ArError::CapabilityUnavailable);
        }
        match self.platform.is_session_supported(self.init.mode).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(ArError::FeatureUnsupported { mode: self.init.mode }),
            Err(e) => {
                warn!(error = %e, "error checking AR support");
                Err(ArError::CapabilityUnavailable)
            }
        }
    }

    fn apply(&mut self, request: SessionRequest) -> Option<SessionState> {
        let current = self.state();
        let next = SessionGraph::transition(current, request)?;
        debug!(?current, ?request, ?next, "session transition");
        self.state.send_replace(next);
        Some(next)
    }

    /// Starts negotiation on a spawned task; the outcome arrives as
    /// `Event::SessionNegotiated` on the reactor channel. While an abandoned
    /// request is still with the platform the new one waits for it to settle.
    pub fn request_session(&mut self) -> Result<SessionGeneration, ArError> {
        if !self.platform.has_xr() {
            warn!("requestSession: no XR API on this platform");
            return Err(ArError::CapabilityUnavailable);
        }
        let current = self.state();
        if self.apply(SessionRequest::Request).is_none() {
            return Err(ArError::SessionBusy(current));
        }
        self.generation = self.generation.next();
        let generation = self.generation;

        match self.abandoned {
            Some(abandoned) => {
                debug!(?generation, ?abandoned, "session request deferred until abandoned request settles");
                self.deferred = Some(generation);
            }
            None => self.negotiate(generation),
        }

        info!(?generation, mode = ?self.init.mode, "session requested");
        Ok(generation)
    }

    fn negotiate(&self, generation: SessionGeneration) {
        let platform = Arc::clone(&self.platform);
        let init = self.init.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let mode = init.mode;
            let outcome = match platform.is_session_supported(mode).await {
                Ok(true) => platform.request_session(init).await.map_err(ArError::from_session_request),
                Ok(false) => Err(ArError::FeatureUnsupported { mode }),
                Err(e) => Err(ArError::SessionNegotiationFailed(e.to_string())),
            };
            report(tx, generation, outcome).await;
        });
    }

    pub fn resolve(
        &mut self,
        generation: SessionGeneration,
        outcome: Result<SessionHandle, ArError>,
    ) -> SessionResolution {
        if self.abandoned == Some(generation) {
            self.abandoned = None;
            if let Ok(handle) = outcome {
                // granted after the user backed out: hand it straight back
                self.platform.end_session(handle);
            }
            debug!(?generation, "abandoned session request settled");
            if let Some(next) = self.deferred.take() {
                self.negotiate(next);
            }
            return SessionResolution::Stale;
        }

        if generation != self.generation || self.state() != SessionState::Requesting {
            if let Ok(handle) = outcome {
                self.platform.end_session(handle);
            }
            debug!(?generation, current = ?self.generation, "discarded stale session negotiation");
            return SessionResolution::Stale;
        }

        match outcome {
            Ok(handle) => {
                self.apply(SessionRequest::Granted);
                let session_id = Uuid::new_v4();
                self.handle = Some(handle);
                self.session_id = Some(session_id);
                info!(%session_id, ?handle, "AR session started");
                SessionResolution::Started { handle, session_id }
            }
            Err(err) => {
                let request = match err {
                    ArError::FeatureUnsupported { .. } => SessionRequest::Unsupported,
                    _ => SessionRequest::Denied,
                };
                self.apply(request);
                warn!(error = %err, "AR session failed");
                SessionResolution::Failed(err)
            }
        }
    }

    /// User-initiated end. Returns the ended session's id, `None` if nothing was running.
    /// Idempotent.
    pub fn end_session(&mut self) -> Option<Option<Uuid>> {
        let current = self.state();
        self.apply(SessionRequest::End)?;
        if current == SessionState::Requesting {
            match self.deferred.take() {
                // never reached the platform; still reports once so every request settles
                Some(deferred) => {
                    let tx = self.tx.clone();
                    let outcome = Err(ArError::SessionNegotiationFailed("abandoned".to_string()));
                    tokio::spawn(report(tx, deferred, outcome));
                }
                None => self.abandoned = Some(self.generation),
            }
        }
        if let Some(handle) = self.handle.take() {
            self.platform.end_session(handle);
        }
        let session_id = self.session_id.take();
        info!(session_id = ?session_id, "AR session ended");
        Some(session_id)
    }

    /// Runtime-initiated end. Ignored unless `handle` is the running session.
    pub fn on_platform_ended(&mut self, handle: SessionHandle) -> Option<Option<Uuid>> {
        if self.handle != Some(handle) {
            return None;
        }
        self.apply(SessionRequest::End)?;
        self.handle = None;
        let session_id = self.session_id.take();
        info!(session_id = ?session_id, "AR session ended by platform");
        Some(session_id)
    }
}

async fn report(tx: mpsc::Sender<Event>, generation: SessionGeneration, outcome: Result<SessionHandle, ArError>) {
    if tx.send(Event::SessionNegotiated { generation, outcome }).await.is_err() {
        debug!(?generation, "reactor gone before session negotiation finished");
    }
}
