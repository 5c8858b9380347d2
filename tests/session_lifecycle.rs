use std::sync::Arc;

use arplace::kernel::error::ErrorKind;
use arplace::kernel::time::FrameToken;
use arplace::platform::mock::MockPlatform;
use arplace::platform::{PlatformError, PlatformSignal};
use arplace::scene::recording::RecordingSceneHost;
use arplace::{ArConfig, ArError, ArEvent, ArReactor, Event, Pose, SessionState};

type Reactor = ArReactor<MockPlatform, RecordingSceneHost>;

fn reactor_on(platform: &Arc<MockPlatform>) -> Reactor {
    ArReactor::new(Arc::clone(platform), RecordingSceneHost::new(), &ArConfig::default())
}

fn count_ended(events: &[ArEvent]) -> usize {
    events.iter().filter(|e| matches!(e, ArEvent::SessionEnded { .. })).count()
}

#[tokio::test]
async fn test_no_xr_api_fails_synchronously() {
    let platform = Arc::new(MockPlatform::without_xr());
    let mut reactor = reactor_on(&platform);
    let mut events = reactor.subscribe_events();

    let result = reactor.request_session();
    assert_eq!(result, Err(ArError::CapabilityUnavailable));
    assert_eq!(reactor.session_state(), SessionState::Idle);
    assert_eq!(reactor.pending_negotiations(), 0);

    assert_eq!(events.try_recv().unwrap(), ArEvent::SessionFailed(ErrorKind::CapabilityUnavailable));
    assert!(events.try_recv().is_err(), "reported exactly once");
}

#[tokio::test]
async fn test_ar_unsupported_stays_idle_and_samples_nothing() {
    let platform = Arc::new(MockPlatform::without_ar());
    let mut reactor = reactor_on(&platform);
    platform.set_hits(vec![Pose::IDENTITY]);

    reactor.request_session().expect("XR API exists, request goes out");
    assert_eq!(reactor.session_state(), SessionState::Requesting);

    let events = reactor.resolve_pending().await;
    assert_eq!(events, vec![ArEvent::SessionFailed(ErrorKind::FeatureUnsupported)]);
    assert_eq!(reactor.session_state(), SessionState::Idle);

    for f in 1..=5 {
        reactor.on_frame(FrameToken::new(f));
    }
    assert_eq!(platform.frames_sampled(), 0);
    assert_eq!(platform.hit_test_sources_registered(), 0);
    assert!(!reactor.reticle_state().visible);
}

#[tokio::test]
async fn test_negotiation_failure_ends_and_allows_retry() {
    let platform = Arc::new(MockPlatform::new());
    let mut reactor = reactor_on(&platform);
    platform.fail_next_session(PlatformError::Rejected("user denied permission".to_string()));

    reactor.request_session().unwrap();
    let events = reactor.resolve_pending().await;
    assert_eq!(events, vec![ArEvent::SessionFailed(ErrorKind::SessionNegotiationFailed)]);
    assert_eq!(reactor.session_state(), SessionState::Ended);

    // retry from Ended
    reactor.request_session().unwrap();
    let events = reactor.resolve_pending().await;
    assert!(matches!(events[0], ArEvent::SessionStarted { .. }));
    assert_eq!(reactor.session_state(), SessionState::Active);
    assert!(reactor.hit_test_configured());
}

#[tokio::test]
async fn test_double_request_is_rejected_without_state_change() {
    let platform = Arc::new(MockPlatform::new());
    let mut reactor = reactor_on(&platform);

    let first = reactor.request_session().unwrap();
    assert_eq!(reactor.request_session(), Err(ArError::SessionBusy(SessionState::Requesting)));

    reactor.resolve_pending().await;
    assert_eq!(reactor.request_session(), Err(ArError::SessionBusy(SessionState::Active)));
    assert_eq!(reactor.session_state(), SessionState::Active);
    assert_eq!(first.0, 1);
    assert!(platform.active_session().is_some(), "the first session is untouched");
}

#[tokio::test]
async fn test_end_session_is_idempotent() {
    let platform = Arc::new(MockPlatform::new());
    let mut reactor = reactor_on(&platform);
    let mut subscriber = reactor.subscribe_events();

    reactor.request_session().unwrap();
    reactor.resolve_pending().await;

    let mut ended = reactor.end_session();
    ended.extend(reactor.end_session());
    assert_eq!(count_ended(&ended), 1);

    let mut broadcast = Vec::new();
    while let Ok(event) = subscriber.try_recv() {
        broadcast.push(event);
    }
    assert_eq!(count_ended(&broadcast), 1);

    assert_eq!(reactor.session_state(), SessionState::Ended);
    assert_eq!(platform.ended_sessions().len(), 1);
    assert_eq!(platform.live_hit_test_sources(), 0, "hit-test source released on end");
}

#[tokio::test]
async fn test_end_before_anything_started_is_a_no_op() {
    let platform = Arc::new(MockPlatform::new());
    let mut reactor = reactor_on(&platform);
    assert!(reactor.end_session().is_empty());
    assert_eq!(reactor.session_state(), SessionState::Idle);
}

#[tokio::test]
async fn test_session_broadcast_follows_transitions() {
    let platform = Arc::new(MockPlatform::new());
    let mut reactor = reactor_on(&platform);
    let watcher = reactor.subscribe_session();
    assert_eq!(*watcher.borrow(), SessionState::Idle);

    reactor.request_session().unwrap();
    assert_eq!(*watcher.borrow(), SessionState::Requesting);
    reactor.resolve_pending().await;
    assert_eq!(*watcher.borrow(), SessionState::Active);
    reactor.end_session();
    assert_eq!(*watcher.borrow(), SessionState::Ended);

    // dropping a subscriber is the unsubscribe; the writer does not care
    drop(watcher);
    reactor.request_session().unwrap();
    reactor.resolve_pending().await;
    assert_eq!(reactor.session_state(), SessionState::Active);
}

#[tokio::test]
async fn test_platform_initiated_end_applies_at_frame_boundary() {
    let platform = Arc::new(MockPlatform::new());
    let mut reactor = reactor_on(&platform);
    platform.set_hits(vec![Pose::IDENTITY]);

    reactor.request_session().unwrap();
    reactor.resolve_pending().await;
    reactor.on_frame(FrameToken::new(1));
    assert!(reactor.reticle_state().visible);

    let handle = platform.drop_session().expect("session running");
    reactor.sender().send(Event::Platform(PlatformSignal::SessionEnded(handle))).await.unwrap();

    // not applied mid-frame; the next frame boundary sees it
    assert_eq!(reactor.session_state(), SessionState::Active);
    let events = reactor.on_frame(FrameToken::new(2));
    assert_eq!(count_ended(&events), 1);
    assert_eq!(reactor.session_state(), SessionState::Ended);
    assert!(!reactor.reticle_state().visible);
    assert_eq!(platform.live_hit_test_sources(), 0);
}

#[tokio::test]
async fn test_platform_end_for_unknown_session_is_ignored() {
    let platform = Arc::new(MockPlatform::new());
    let mut reactor = reactor_on(&platform);
    reactor.request_session().unwrap();
    reactor.resolve_pending().await;

    let stale = arplace::platform::SessionHandle(9_999);
    reactor.sender().send(Event::Platform(PlatformSignal::SessionEnded(stale))).await.unwrap();
    let events = reactor.on_frame(FrameToken::new(1));
    assert!(events.is_empty());
    assert_eq!(reactor.session_state(), SessionState::Active);
}

#[tokio::test]
async fn test_end_while_requesting_hands_late_grant_back() {
    let platform = Arc::new(MockPlatform::new());
    let mut reactor = reactor_on(&platform);

    reactor.request_session().unwrap();
    let events = reactor.end_session();
    assert_eq!(events, vec![ArEvent::SessionEnded { session_id: None }]);
    assert_eq!(reactor.session_state(), SessionState::Ended);

    // the runtime still grants; the result is stale and released
    let late = reactor.resolve_pending().await;
    assert!(late.is_empty());
    assert_eq!(reactor.session_state(), SessionState::Ended);
    assert_eq!(platform.active_session(), None);
    assert_eq!(platform.ended_sessions().len(), 1);
    assert_eq!(platform.hit_test_sources_registered(), 0);
}

#[tokio::test]
async fn test_reentry_negotiates_fresh_capability() {
    let platform = Arc::new(MockPlatform::new());
    let mut reactor = reactor_on(&platform);

    reactor.request_session().unwrap();
    reactor.resolve_pending().await;
    let first = reactor.hit_test_binding().expect("configured");
    reactor.end_session();
    assert!(reactor.hit_test_binding().is_none());

    reactor.request_session().unwrap();
    reactor.resolve_pending().await;
    let second = reactor.hit_test_binding().expect("configured again");

    assert_ne!(first.source, second.source);
    assert_ne!(first.session, second.session);
    assert_eq!(platform.hit_test_sources_registered(), 2);
    assert_eq!(platform.live_hit_test_sources(), 1);
}

#[tokio::test]
async fn test_session_ids_are_unique_per_session() {
    let platform = Arc::new(MockPlatform::new());
    let mut reactor = reactor_on(&platform);

    let mut ids = Vec::new();
    for _ in 0..2 {
        reactor.request_session().unwrap();
        for event in reactor.resolve_pending().await {
            if let ArEvent::SessionStarted { session_id } = event {
                ids.push(session_id);
            }
        }
        let ended = reactor.end_session();
        assert_eq!(ended, vec![ArEvent::SessionEnded { session_id: Some(*ids.last().unwrap()) }]);
    }
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
}

#[tokio::test]
async fn test_support_probe_does_not_touch_state() {
    let capable = Arc::new(MockPlatform::new());
    let reactor = reactor_on(&capable);
    assert_eq!(reactor.check_support().await, Ok(()));
    assert_eq!(reactor.session_state(), SessionState::Idle);

    let no_xr = Arc::new(MockPlatform::without_xr());
    assert_eq!(reactor_on(&no_xr).check_support().await, Err(ArError::CapabilityUnavailable));

    let no_ar = Arc::new(MockPlatform::without_ar());
    let err = reactor_on(&no_ar).check_support().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FeatureUnsupported);
}

#[tokio::test]
async fn test_retry_right_after_backing_out_waits_for_abandoned_request() {
    let platform = Arc::new(MockPlatform::new());
    let mut reactor = reactor_on(&platform);

    reactor.request_session().unwrap();
    reactor.end_session();
    let retry = reactor.request_session().expect("Ended is a fresh start point");
    assert_eq!(retry.0, 2);
    assert_eq!(reactor.session_state(), SessionState::Requesting);

    let events = reactor.resolve_pending().await;
    assert!(matches!(events[..], [ArEvent::SessionStarted { .. }]), "got {:?}", events);
    assert_eq!(reactor.session_state(), SessionState::Active);
    assert!(reactor.hit_test_configured());
    // the abandoned grant went back before the retry reached the runtime
    assert_eq!(platform.ended_sessions().len(), 1);
    assert!(platform.active_session().is_some());
}

#[tokio::test]
async fn test_backing_out_of_a_deferred_retry_settles_everything() {
    let platform = Arc::new(MockPlatform::new());
    let mut reactor = reactor_on(&platform);

    reactor.request_session().unwrap();
    reactor.end_session();
    reactor.request_session().unwrap();
    reactor.end_session();
    assert_eq!(reactor.pending_negotiations(), 2);

    let events = reactor.resolve_pending().await;
    assert!(events.is_empty());
    assert_eq!(reactor.pending_negotiations(), 0);
    assert_eq!(reactor.session_state(), SessionState::Ended);
    assert_eq!(platform.active_session(), None);

    reactor.request_session().unwrap();
    reactor.resolve_pending().await;
    assert_eq!(reactor.session_state(), SessionState::Active);
}

#[tokio::test]
async fn test_zero_event_capacity_still_builds() {
    let platform = Arc::new(MockPlatform::new());
    let config = ArConfig { event_capacity: 0, ..ArConfig::default() };
    assert!(config.validate().is_err());

    let mut reactor = ArReactor::new(Arc::clone(&platform), RecordingSceneHost::new(), &config);
    let mut events = reactor.subscribe_events();
    reactor.request_session().unwrap();
    reactor.resolve_pending().await;
    assert!(matches!(events.try_recv(), Ok(ArEvent::SessionStarted { .. })));
}
