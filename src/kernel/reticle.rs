use tokio::sync::watch;

use super::hit_test::HitSample;
use super::pose::Pose;
use super::session::SessionState;

/// Placement preview. Replaced as a whole once per frame, never field by field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReticleState {
    pub visible: bool,
    pub pose: Pose,
    /// True only while the session is Active.
    pub enabled_for_input: bool,
}

impl Default for ReticleState {
    fn default() -> Self {
        Self { visible: false, pose: Pose::IDENTITY, enabled_for_input: false }
    }
}

/// Derives reticle state from the latest hit sample and the session broadcast.
pub struct ReticleController {
    session: watch::Receiver<SessionState>,
    state: ReticleState,
}

impl ReticleController {
    pub fn new(session: watch::Receiver<SessionState>) -> Self {
        Self { session, state: ReticleState::default() }
    }

    fn session_active(&self) -> bool {
        self.session.borrow().is_active()
    }

    /// Latest sample wins, no smoothing. On a miss the pose is kept but hidden.
    pub fn on_frame(&mut self, sample: &HitSample) -> ReticleState {
        let active = self.session_active();
        let visible = sample.found && active;
        let pose = if visible { sample.pose } else { self.state.pose };
        self.state = ReticleState { visible, pose, enabled_for_input: active };
        self.state
    }

    /// Forces the hidden/default state. Called in the same turn the session ends.
    pub fn on_session_ended(&mut self) -> ReticleState {
        self.state = ReticleState { visible: false, pose: self.state.pose, enabled_for_input: false };
        self.state
    }

    pub fn state(&self) -> ReticleState {
        self.state
    }

    pub fn input_enabled(&self) -> bool {
        self.state.enabled_for_input && self.session_active()
    }

    /// The only read path for placement: a reticle-confirmed, session-gated pose.
    pub fn current_placement_pose(&self) -> Option<Pose> {
        let s = self.state;
        (s.visible && s.enabled_for_input && self.session_active()).then_some(s.pose)
    }
}
