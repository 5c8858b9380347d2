//! Session instrumentation.
//!
//! # INVARIANT
//! Telemetry is a READ-ONLY side-effect layer. It is never read by the session,
//! hit-test, reticle or placement logic.
//!
//! Events carry ids, frame numbers, counts and enum tags only. No poses.

pub mod event;
pub mod metrics;
pub mod recorder;
