use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info};

use super::error::ArError;
use super::event::{ArEvent, Event, HitTestBinding, InputEvent, RejectionReason};
use super::hit_test::{HitSample, HitTestInstall, HitTestProvider};
use super::placement::{ObjectId, PlacedObject, PlacementController};
use super::pose::Pose;
use super::reticle::{ReticleController, ReticleState};
use super::session::{SessionController, SessionGeneration, SessionResolution, SessionState};
use super::telemetry::event::{SessionLifecycleEvent, TelemetryEvent};
use super::telemetry::recorder::TelemetryRecorder;
use super::time::FrameToken;
use crate::config::ArConfig;
use crate::platform::{PlatformSignal, XrPlatform};
use crate::scene::{EntityHandle, PrimitiveKind, SceneHost, StyleAttrs};

const CHANNEL_CAPACITY: usize = 100;

/// Owns the four components and is driven by the rendering host's frame callback.
///
/// **FRAME LAW**: queued events (taps, platform signals, negotiation results) are
/// applied at the START of `on_frame`, in arrival order. Within a frame, sampling
/// happens before the reticle update; nothing mutates session state mid-frame.
pub struct ArReactor<P: XrPlatform, S: SceneHost> {
    pub receiver: mpsc::Receiver<Event>,
    tx: mpsc::Sender<Event>,
    scene: S,
    session: SessionController<P>,
    hit_test: HitTestProvider<P>,
    reticle: ReticleController,
    placement: PlacementController,
    reticle_entity: EntityHandle,
    reticle_shown: bool,
    placed_entities: HashMap<ObjectId, EntityHandle>,
    events: broadcast::Sender<ArEvent>,
    telemetry: TelemetryRecorder,
    /// Last frame whose reticle update completed.
    frame: FrameToken,
    /// Spawned negotiations that have not reported back yet.
    pending: usize,
}

impl<P: XrPlatform, S: SceneHost> ArReactor<P, S> {
    pub fn new(platform: Arc<P>, mut scene: S, config: &ArConfig) -> Self {
        let (tx, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let (events, _) = broadcast::channel(config.event_capacity.max(1));

        let session = SessionController::new(Arc::clone(&platform), config.session.init(), tx.clone());
        let hit_test = HitTestProvider::new(platform, config.tracking_space, tx.clone());
        let reticle = ReticleController::new(session.subscribe());
        let placement = PlacementController::new(config.placement.clone());

        let r = &config.reticle;
        let reticle_entity = scene.create_primitive(
            PrimitiveKind::Ring { inner_radius: r.inner_radius, outer_radius: r.outer_radius },
            &Pose::IDENTITY,
            &StyleAttrs {
                color: r.color,
                opacity: r.opacity,
                roughness: 1.0,
                metalness: 0.0,
                flat: true,
                cast_shadow: false,
            },
        );
        scene.set_entity_visibility(reticle_entity, false);

        Self {
            receiver,
            tx,
            scene,
            session,
            hit_test,
            reticle,
            placement,
            reticle_entity,
            reticle_shown: false,
            placed_entities: HashMap::new(),
            events,
            telemetry: TelemetryRecorder::new(),
            frame: FrameToken::default(),
            pending: 0,
        }
    }

    /// For platform callbacks and input layers. Queued events apply at the next frame.
    pub fn sender(&self) -> mpsc::Sender<Event> {
        self.tx.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ArEvent> {
        self.events.subscribe()
    }

    pub fn subscribe_session(&self) -> watch::Receiver<SessionState> {
        self.session.subscribe()
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn reticle_state(&self) -> ReticleState {
        self.reticle.state()
    }

    pub fn reticle_entity(&self) -> EntityHandle {
        self.reticle_entity
    }

    pub fn placed_objects(&self) -> &[PlacedObject] {
        self.placement.log()
    }

    pub fn entity_for(&self, id: ObjectId) -> Option<EntityHandle> {
        self.placed_entities.get(&id).copied()
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn telemetry(&self) -> &TelemetryRecorder {
        &self.telemetry
    }

    pub fn hit_test_configured(&self) -> bool {
        self.hit_test.is_configured()
    }

    pub fn hit_test_binding(&self) -> Option<HitTestBinding> {
        self.hit_test.binding()
    }

    pub fn pending_negotiations(&self) -> usize {
        self.pending
    }

    pub async fn check_support(&self) -> Result<(), ArError> {
        self.session.check_support().await
    }

    /// Starts session negotiation. Fatal capability problems are reported here,
    /// once, as `SessionFailed`.
    pub fn request_session(&mut self) -> Result<SessionGeneration, ArError> {
        match self.session.request_session() {
            Ok(generation) => {
                self.pending += 1;
                self.telemetry.record(TelemetryEvent::SessionLifecycle(SessionLifecycleEvent::Requested));
                Ok(generation)
            }
            Err(ArError::SessionBusy(state)) => Err(ArError::SessionBusy(state)),
            Err(err) => {
                self.publish(ArEvent::SessionFailed(err.kind()), &mut Vec::new());
                Err(err)
            }
        }
    }

    /// User-initiated end. Idempotent: only the first call emits `SessionEnded`.
    pub fn end_session(&mut self) -> Vec<ArEvent> {
        let mut out = Vec::new();
        if let Some(session_id) = self.session.end_session() {
            self.teardown(session_id, &mut out);
        }
        out
    }

    /// Synthetic or direct select. Reads the reticle as of the last completed frame.
    pub fn select(&mut self, source: &str) -> Result<PlacedObject, RejectionReason> {
        let mut out = Vec::new();
        self.place(InputEvent::select(source), &mut out)
    }

    /// The per-frame callback. Returns every observability event produced in the step.
    pub fn on_frame(&mut self, frame: FrameToken) -> Vec<ArEvent> {
        let mut out = Vec::new();

        // === 1. APPLY (between frames) ===
        while let Ok(event) = self.receiver.try_recv() {
            self.apply(event, &mut out);
        }

        // === 2. SAMPLE ===
        let sample = if self.session.state().is_active() && self.hit_test.is_configured() {
            let sample = self.hit_test.sample_frame(frame);
            self.telemetry.record(TelemetryEvent::FrameSampled { frame, found: sample.found });
            sample
        } else {
            HitSample::miss(frame)
        };

        // === 3. RETICLE (whole state replaced) ===
        let state = self.reticle.on_frame(&sample);
        self.sync_reticle(state);
        self.frame = frame;

        out
    }

    /// Awaits every outstanding negotiation and applies its result.
    pub async fn resolve_pending(&mut self) -> Vec<ArEvent> {
        let mut out = Vec::new();
        while self.pending > 0 {
            match self.receiver.recv().await {
                Some(event) => self.apply(event, &mut out),
                None => break,
            }
        }
        out
    }

    fn apply(&mut self, event: Event, out: &mut Vec<ArEvent>) {
        match event {
            Event::Input(input) => {
                let _ = self.place(input, out);
            }
            Event::Platform(PlatformSignal::SessionEnded(handle)) => {
                if let Some(session_id) = self.session.on_platform_ended(handle) {
                    self.teardown(session_id, out);
                }
            }
            Event::SessionNegotiated { generation, outcome } => {
                self.pending = self.pending.saturating_sub(1);
                match self.session.resolve(generation, outcome) {
                    SessionResolution::Started { handle, session_id } => {
                        self.hit_test.on_session_active(handle, generation);
                        self.pending += 1;
                        self.publish(ArEvent::SessionStarted { session_id }, out);
                    }
                    SessionResolution::Failed(err) => {
                        self.publish(ArEvent::SessionFailed(err.kind()), out);
                    }
                    SessionResolution::Stale => {}
                }
            }
            Event::HitTestNegotiated { generation, outcome } => {
                self.pending = self.pending.saturating_sub(1);
                if let HitTestInstall::Unavailable(_) = self.hit_test.install(generation, outcome) {
                    self.publish(ArEvent::HitTestUnavailable, out);
                }
            }
        }
    }

    fn place(&mut self, input: InputEvent, out: &mut Vec<ArEvent>) -> Result<PlacedObject, RejectionReason> {
        debug!(source = %input.source, frame = self.frame.frame, "select");
        match self.placement.on_select(&self.reticle, self.frame) {
            Ok(object) => {
                let entity = self.scene.create_primitive(self.placement.primitive(), &object.pose, &object.style);
                self.placed_entities.insert(object.id, entity);
                self.publish(ArEvent::ObjectPlaced(object.clone()), out);
                Ok(object)
            }
            Err(reason) => {
                self.publish(ArEvent::PlacementRejected(reason), out);
                Err(reason)
            }
        }
    }

    /// Everything tied to the session goes dark in this same call.
    fn teardown(&mut self, session_id: Option<uuid::Uuid>, out: &mut Vec<ArEvent>) {
        self.hit_test.on_session_ended();
        let state = self.reticle.on_session_ended();
        self.sync_reticle(state);
        self.publish(ArEvent::SessionEnded { session_id }, out);
        let summary = self.telemetry.aggregate_session();
        info!(?summary, "session summary");
        self.telemetry.record(summary);
    }

    fn sync_reticle(&mut self, state: ReticleState) {
        if state.visible {
            self.scene.set_entity_pose(self.reticle_entity, &state.pose);
        }
        if state.visible != self.reticle_shown {
            self.scene.set_entity_visibility(self.reticle_entity, state.visible);
            self.reticle_shown = state.visible;
        }
    }

    fn publish(&mut self, event: ArEvent, out: &mut Vec<ArEvent>) {
        let record = match &event {
            ArEvent::SessionStarted { .. } => TelemetryEvent::SessionLifecycle(SessionLifecycleEvent::Started),
            ArEvent::SessionFailed(kind) => TelemetryEvent::SessionLifecycle(SessionLifecycleEvent::Failed(*kind)),
            ArEvent::SessionEnded { .. } => TelemetryEvent::SessionLifecycle(SessionLifecycleEvent::Ended),
            ArEvent::HitTestUnavailable => TelemetryEvent::HitTestUnavailable,
            ArEvent::ObjectPlaced(object) => TelemetryEvent::ObjectPlaced { id: object.id, frame: object.created_at },
            ArEvent::PlacementRejected(reason) => TelemetryEvent::PlacementRejected { reason: *reason },
        };
        self.telemetry.record(record);
        // no subscribers is fine
        let _ = self.events.send(event.clone());
        out.push(event);
    }
}
