//! Deterministic stand-in for an XR runtime. Drives the demo binary and the tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use super::{
    HitTestSource, PlatformError, ReferenceSpace, ReferenceSpaceKind, SessionHandle, SessionInit, SessionMode,
    XrPlatform,
};
use crate::kernel::pose::Pose;
use crate::kernel::time::FrameToken;

#[derive(Debug, Default)]
struct MockState {
    next_id: u64,
    supported_modes: HashSet<SessionMode>,
    session_error: Option<PlatformError>,
    declined_spaces: HashSet<ReferenceSpaceKind>,
    hit_test_error: Option<PlatformError>,

    active_session: Option<SessionHandle>,
    ended_sessions: Vec<SessionHandle>,
    live_sources: HashSet<HitTestSource>,
    sources_registered: u64,

    /// Hits returned for any frame without a scripted entry.
    standing_hits: Vec<Pose>,
    scripted: HashMap<u64, Vec<Pose>>,
    tracking_lost: bool,
    frames_sampled: u64,
}

pub struct MockPlatform {
    has_xr: bool,
    negotiation_delay: Duration,
    state: Mutex<MockState>,
    // false = hit-test source negotiation parks until reopened
    hit_test_gate: watch::Sender<bool>,
}

impl MockPlatform {
    /// AR-capable device with `immersive-ar` supported.
    pub fn new() -> Self {
        let mut state = MockState::default();
        state.supported_modes.insert(SessionMode::ImmersiveAr);
        state.supported_modes.insert(SessionMode::Inline);
        let (hit_test_gate, _) = watch::channel(true);
        Self {
            has_xr: true,
            negotiation_delay: Duration::ZERO,
            state: Mutex::new(state),
            hit_test_gate,
        }
    }

    /// Browser without any XR API.
    pub fn without_xr() -> Self {
        Self { has_xr: false, ..Self::new() }
    }

    /// XR API present but AR mode unsupported.
    pub fn without_ar() -> Self {
        let platform = Self::new();
        platform.lock().supported_modes.remove(&SessionMode::ImmersiveAr);
        platform
    }

    pub fn with_negotiation_delay(mut self, delay: Duration) -> Self {
        self.negotiation_delay = delay;
        self
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn allocate(state: &mut MockState) -> u64 {
        state.next_id += 1;
        state.next_id
    }

    pub fn fail_next_session(&self, err: PlatformError) {
        self.lock().session_error = Some(err);
    }

    pub fn decline_space(&self, kind: ReferenceSpaceKind) {
        self.lock().declined_spaces.insert(kind);
    }

    pub fn fail_hit_test(&self, err: PlatformError) {
        self.lock().hit_test_error = Some(err);
    }

    /// Parks hit-test source negotiation until `release_hit_test` is called.
    pub fn hold_hit_test(&self) {
        self.hit_test_gate.send_replace(false);
    }

    pub fn release_hit_test(&self) {
        self.hit_test_gate.send_replace(true);
    }

    pub fn set_hits(&self, hits: Vec<Pose>) {
        self.lock().standing_hits = hits;
    }

    pub fn clear_hits(&self) {
        self.lock().standing_hits.clear();
    }

    pub fn script_frame(&self, frame: u64, hits: Vec<Pose>) {
        self.lock().scripted.insert(frame, hits);
    }

    pub fn set_tracking_lost(&self, lost: bool) {
        self.lock().tracking_lost = lost;
    }

    /// Runtime-initiated end (system back gesture etc). The caller is expected to
    /// forward `PlatformSignal::SessionEnded` to the reactor.
    pub fn drop_session(&self) -> Option<SessionHandle> {
        let mut state = self.lock();
        let session = state.active_session.take()?;
        state.ended_sessions.push(session);
        Some(session)
    }

    pub fn active_session(&self) -> Option<SessionHandle> {
        self.lock().active_session
    }

    pub fn ended_sessions(&self) -> Vec<SessionHandle> {
        self.lock().ended_sessions.clone()
    }

    pub fn live_hit_test_sources(&self) -> usize {
        self.lock().live_sources.len()
    }

    pub fn hit_test_sources_registered(&self) -> u64 {
        self.lock().sources_registered
    }

    pub fn frames_sampled(&self) -> u64 {
        self.lock().frames_sampled
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl XrPlatform for MockPlatform {
    fn has_xr(&self) -> bool {
        self.has_xr
    }

    async fn is_session_supported(&self, mode: SessionMode) -> Result<bool, PlatformError> {
        Ok(self.lock().supported_modes.contains(&mode))
    }

    async fn request_session(&self, init: SessionInit) -> Result<SessionHandle, PlatformError> {
        if !self.negotiation_delay.is_zero() {
            tokio::time::sleep(self.negotiation_delay).await;
        }
        let mut state = self.lock();
        if let Some(err) = state.session_error.take() {
            return Err(err);
        }
        if !state.supported_modes.contains(&init.mode) {
            return Err(PlatformError::NotSupported(format!("{:?}", init.mode)));
        }
        if state.active_session.is_some() {
            return Err(PlatformError::Rejected("a session is already running".to_string()));
        }
        let session = SessionHandle(Self::allocate(&mut state));
        state.active_session = Some(session);
        debug!(?session, features = ?init.required_features, "mock session granted");
        Ok(session)
    }

    fn end_session(&self, session: SessionHandle) {
        let mut state = self.lock();
        if state.active_session == Some(session) {
            state.active_session = None;
            state.ended_sessions.push(session);
        }
    }

    async fn request_reference_space(
        &self,
        session: SessionHandle,
        kind: ReferenceSpaceKind,
    ) -> Result<ReferenceSpace, PlatformError> {
        let mut state = self.lock();
        if state.active_session != Some(session) {
            return Err(PlatformError::InvalidHandle);
        }
        if state.declined_spaces.contains(&kind) {
            return Err(PlatformError::NotSupported(format!("{:?} reference space", kind)));
        }
        Ok(ReferenceSpace { id: Self::allocate(&mut state), kind })
    }

    async fn request_hit_test_source(
        &self,
        session: SessionHandle,
        space: ReferenceSpace,
    ) -> Result<HitTestSource, PlatformError> {
        let mut gate = self.hit_test_gate.subscribe();
        // Sender lives in self, so this only errors if self is gone.
        let _ = gate.wait_for(|open| *open).await;

        let mut state = self.lock();
        if state.active_session != Some(session) {
            return Err(PlatformError::InvalidHandle);
        }
        if let Some(err) = state.hit_test_error.take() {
            return Err(err);
        }
        if !state.live_sources.is_empty() {
            // Real runtimes reject a second registration until the first is cancelled.
            return Err(PlatformError::Rejected("hit-test source already registered".to_string()));
        }
        let source = HitTestSource(Self::allocate(&mut state));
        state.live_sources.insert(source);
        state.sources_registered += 1;
        debug!(?source, ?space, "mock hit-test source registered");
        Ok(source)
    }

    fn cancel_hit_test_source(&self, source: HitTestSource) {
        self.lock().live_sources.remove(&source);
    }

    fn hit_test_results(
        &self,
        frame: FrameToken,
        source: HitTestSource,
        _space: ReferenceSpace,
    ) -> Result<Vec<Pose>, PlatformError> {
        let mut state = self.lock();
        if !state.live_sources.contains(&source) {
            return Err(PlatformError::InvalidHandle);
        }
        state.frames_sampled += 1;
        if state.tracking_lost {
            return Err(PlatformError::TrackingLost);
        }
        Ok(state.scripted.get(&frame.frame).cloned().unwrap_or_else(|| state.standing_hits.clone()))
    }
}
